//! Core edit and inspect pipelines, extracted from the CLI.
//!
//! Documents are read and written through `walkmod_domain::DocumentStore`;
//! report artifacts go through the [`WritePort`].

use crate::ports::WritePort;
use crate::settings::{EditSettings, InspectSettings};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;
use walkmod_domain::{EditOutcome, FsDocumentStore, PropagateOptions, action_for, propagate};
use walkmod_edit::{EditError, detect_format, document_path, load_document, load_existing};
use walkmod_types::{Configuration, DocumentFormat, EditRequest};

/// Error type for pipeline results. Exit code 2 = rejected input, 1 = tool error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Edit(#[from] EditError),
    /// Rejected invocation: bad parameters, request files or tool config.
    #[error("{0:#}")]
    Usage(anyhow::Error),
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::Edit(e) => e.exit_code(),
            ToolError::Usage(_) => 2,
            ToolError::Internal(_) => 1,
        }
    }
}

/// Document a project directory resolves to.
///
/// An explicit format wins; otherwise the first existing document in
/// detection order, or XML when there is none.
pub fn resolve_document(
    project_dir: &Utf8Path,
    format: Option<DocumentFormat>,
) -> (Utf8PathBuf, DocumentFormat) {
    let format = format
        .or_else(|| detect_format(project_dir))
        .unwrap_or(DocumentFormat::Xml);
    (document_path(project_dir, format), format)
}

/// Outcome of `run_edit`.
#[derive(Debug, Clone, Serialize)]
pub struct EditRun {
    pub action: &'static str,
    pub document: Utf8PathBuf,
    pub format: DocumentFormat,
    pub dry_run: bool,
    #[serde(flatten)]
    pub outcome: EditOutcome,
    #[serde(skip)]
    pub patch: String,
}

/// Run one edit request against the project's document (or its modules).
pub fn run_edit(settings: &EditSettings, request: &EditRequest) -> Result<EditRun, ToolError> {
    let (document, format) = resolve_document(&settings.project_dir, settings.format);
    debug!(
        action = request.name(),
        %document,
        %format,
        recursive = settings.recursive,
        dry_run = settings.dry_run,
        "running edit"
    );

    let mut store = FsDocumentStore::new()
        .dry_run(settings.dry_run)
        .with_backup_suffix(settings.effective_backup_suffix());
    let options = PropagateOptions {
        recursive: settings.recursive,
    };
    let outcome = propagate(&mut store, &document, format, action_for(request), options)?;
    let patch = outcome.patch();

    Ok(EditRun {
        action: request.name(),
        document,
        format,
        dry_run: settings.dry_run,
        outcome,
        patch,
    })
}

/// Write `patch.diff` and `edit.json` to the output directory.
pub fn write_edit_artifacts(
    run: &EditRun,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;
    writer.write_file(&out_dir.join("patch.diff"), run.patch.as_bytes())?;

    let json = serde_json::to_string_pretty(run).context("serialize edit outcome")?;
    writer.write_file(&out_dir.join("edit.json"), json.as_bytes())?;
    Ok(())
}

/// One loaded document.
#[derive(Debug, Clone, Serialize)]
pub struct InspectedDocument {
    pub path: Utf8PathBuf,
    pub format: DocumentFormat,
    /// The document does not exist; `configuration` is empty.
    pub missing: bool,
    pub configuration: Configuration,
}

/// Outcome of `run_inspect`, in visit order (aggregators before their modules).
#[derive(Debug, Clone, Serialize)]
pub struct InspectOutcome {
    pub documents: Vec<InspectedDocument>,
}

/// Load the assembled configuration without modifying anything.
pub fn run_inspect(settings: &InspectSettings) -> Result<InspectOutcome, ToolError> {
    let (document, format) = resolve_document(&settings.project_dir, settings.format);
    let mut outcome = InspectOutcome {
        documents: Vec::new(),
    };
    let mut seen = BTreeSet::new();
    inspect_document(settings, &document, format, &mut seen, &mut outcome)?;
    Ok(outcome)
}

fn inspect_document(
    settings: &InspectSettings,
    path: &Utf8Path,
    format: DocumentFormat,
    seen: &mut BTreeSet<Utf8PathBuf>,
    outcome: &mut InspectOutcome,
) -> Result<(), ToolError> {
    if !seen.insert(path.to_path_buf()) {
        return Ok(());
    }

    let doc = if settings.error_if_missing {
        load_existing(path, format)?
    } else {
        load_document(path, format)?
    };
    let configuration = doc.configuration()?;
    let modules = configuration.modules.clone();
    outcome.documents.push(InspectedDocument {
        path: path.to_path_buf(),
        format,
        missing: doc.is_skeleton(),
        configuration,
    });

    if settings.recursive {
        let dir = path.parent().unwrap_or(Utf8Path::new(""));
        for module in &modules {
            let child = document_path(&dir.join(module), format);
            inspect_document(settings, &child, format, seen, outcome)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use walkmod_types::PluginConfig;
    use walkmod_types::ops::{AddModules, AddPlugin};

    #[derive(Default)]
    struct MemWritePort {
        files: Mutex<HashMap<String, Vec<u8>>>,
        dirs: Mutex<Vec<String>>,
    }

    impl WritePort for MemWritePort {
        fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
            let key = path.as_str().replace('\\', "/");
            self.files
                .lock()
                .expect("lock files")
                .insert(key, contents.to_vec());
            Ok(())
        }

        fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
            let key = path.as_str().replace('\\', "/");
            self.dirs.lock().expect("lock dirs").push(key);
            Ok(())
        }
    }

    fn project() -> (TempDir, Utf8PathBuf) {
        let td = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        (td, root)
    }

    fn add_plugin() -> EditRequest {
        EditRequest::AddPlugin(AddPlugin {
            plugin: PluginConfig::new("org.walkmod", "myplugin", "1.0"),
        })
    }

    #[test]
    fn exit_codes_separate_input_from_tool_failures() {
        assert_eq!(
            ToolError::Usage(anyhow::anyhow!("bad param")).exit_code(),
            2
        );
        assert_eq!(
            ToolError::Internal(anyhow::anyhow!("disk full")).exit_code(),
            1
        );
        let missing = EditError::MissingDocument(Utf8PathBuf::from("walkmod.xml"));
        assert_eq!(ToolError::from(missing).exit_code(), 2);
    }

    #[test]
    fn resolve_prefers_existing_documents_then_xml() {
        let (_td, root) = project();
        assert_eq!(resolve_document(&root, None).1, DocumentFormat::Xml);

        std::fs::write(root.join("walkmod.yml"), "").unwrap();
        assert_eq!(
            resolve_document(&root, None),
            (root.join("walkmod.yml"), DocumentFormat::Yaml)
        );
        assert_eq!(
            resolve_document(&root, Some(DocumentFormat::Json)).0,
            root.join("walkmod.json")
        );
    }

    #[test]
    fn dry_run_leaves_the_project_untouched() {
        let (_td, root) = project();
        std::fs::write(root.join("walkmod.yml"), "").unwrap();

        let settings = EditSettings {
            project_dir: root.clone(),
            dry_run: true,
            ..EditSettings::default()
        };
        let run = run_edit(&settings, &add_plugin()).unwrap();
        assert!(run.outcome.changed());
        assert!(
            run.patch.contains("+- \"org.walkmod:myplugin:1.0\""),
            "{}",
            run.patch
        );
        assert_eq!(
            std::fs::read_to_string(root.join("walkmod.yml")).unwrap(),
            ""
        );
    }

    #[test]
    fn edit_creates_a_missing_xml_document() {
        let (_td, root) = project();
        let settings = EditSettings {
            project_dir: root.clone(),
            ..EditSettings::default()
        };
        let run = run_edit(&settings, &add_plugin()).unwrap();
        assert_eq!(run.format, DocumentFormat::Xml);
        assert!(run.outcome.changes[0].created);
        let written = std::fs::read_to_string(root.join("walkmod.xml")).unwrap();
        assert!(written.contains("artifactId=\"myplugin\""), "{written}");
    }

    #[test]
    fn edit_artifacts_are_written_through_the_port() {
        let (_td, root) = project();
        let settings = EditSettings {
            project_dir: root.clone(),
            format: Some(DocumentFormat::Yaml),
            dry_run: true,
            ..EditSettings::default()
        };
        let run = run_edit(&settings, &add_plugin()).unwrap();

        let port = MemWritePort::default();
        write_edit_artifacts(&run, Utf8Path::new("out"), &port).unwrap();
        let files = port.files.lock().unwrap();
        assert_eq!(files["out/patch.diff"], run.patch.as_bytes());
        let json: serde_json::Value = serde_json::from_slice(&files["out/edit.json"]).unwrap();
        assert_eq!(json["action"], "add_plugin");
        assert_eq!(json["format"], "yaml");
        assert_eq!(json["changes"][0]["created"], true);
        assert_eq!(port.dirs.lock().unwrap().as_slice(), ["out"]);
    }

    #[test]
    fn inspect_honours_error_if_missing() {
        let (_td, root) = project();
        let strict = InspectSettings {
            project_dir: root.clone(),
            ..InspectSettings::default()
        };
        let err = run_inspect(&strict).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let lenient = InspectSettings {
            error_if_missing: false,
            ..strict
        };
        let outcome = run_inspect(&lenient).unwrap();
        assert_eq!(outcome.documents.len(), 1);
        assert!(outcome.documents[0].missing);
        assert!(outcome.documents[0].configuration.chains.is_empty());
    }

    #[test]
    fn recursive_inspect_lists_modules_after_their_aggregator() {
        let (_td, root) = project();
        let settings = EditSettings {
            project_dir: root.clone(),
            format: Some(DocumentFormat::Yaml),
            ..EditSettings::default()
        };
        run_edit(
            &settings,
            &EditRequest::AddModules(AddModules {
                modules: vec!["core".to_string()],
            }),
        )
        .unwrap();
        std::fs::create_dir_all(root.join("core")).unwrap();
        std::fs::write(
            root.join("core").join("walkmod.yml"),
            "transformations:\n- type: \"t\"\n",
        )
        .unwrap();

        let outcome = run_inspect(&InspectSettings {
            project_dir: root.clone(),
            recursive: true,
            ..InspectSettings::default()
        })
        .unwrap();
        let paths: Vec<&Utf8Path> = outcome
            .documents
            .iter()
            .map(|d| d.path.strip_prefix(&root).unwrap())
            .collect();
        assert_eq!(
            paths,
            vec![
                Utf8Path::new("walkmod.yml"),
                Utf8Path::new("core/walkmod.yml"),
            ]
        );
        assert_eq!(outcome.documents[1].configuration.chains[0].name, "default");
    }
}
