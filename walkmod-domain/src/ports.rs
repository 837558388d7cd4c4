use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use walkmod_edit::{ConfigDocument, EditResult, load_document, write_document};
use walkmod_types::DocumentFormat;

/// Where documents come from and go to.
///
/// The propagation driver only talks to this trait so it can run against an
/// in-memory store in tests.
pub trait DocumentStore {
    /// Loads `path`, or a skeleton when it does not exist.
    fn load(&self, path: &Utf8Path, format: DocumentFormat)
    -> EditResult<Box<dyn ConfigDocument>>;

    /// Persists the rendered text of `doc`.
    fn save(&mut self, doc: &dyn ConfigDocument, contents: &str) -> EditResult<()>;
}

/// File-system backed `DocumentStore`.
#[derive(Debug, Clone, Default)]
pub struct FsDocumentStore {
    dry_run: bool,
    backup_suffix: Option<String>,
}

impl FsDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip every write; documents are still loaded and rendered.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Copy an existing document to `<path><suffix>` before overwriting it.
    pub fn with_backup_suffix(mut self, suffix: Option<String>) -> Self {
        self.backup_suffix = suffix.filter(|s| !s.is_empty());
        self
    }

    fn backup_path(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        self.backup_suffix
            .as_deref()
            .map(|suffix| Utf8PathBuf::from(format!("{path}{suffix}")))
    }
}

impl DocumentStore for FsDocumentStore {
    fn load(
        &self,
        path: &Utf8Path,
        format: DocumentFormat,
    ) -> EditResult<Box<dyn ConfigDocument>> {
        load_document(path, format)
    }

    fn save(&mut self, doc: &dyn ConfigDocument, contents: &str) -> EditResult<()> {
        let path = doc.path();
        if self.dry_run {
            tracing::debug!(%path, "dry run, not writing");
            return Ok(());
        }

        if let Some(backup) = self.backup_path(path)
            && path.is_file()
        {
            fs::copy(path, &backup).with_context(|| format!("backup {} to {}", path, backup))?;
            tracing::debug!(%path, %backup, "backed up configuration");
        }

        write_document(path, contents)?;
        tracing::info!(%path, created = doc.is_skeleton(), "wrote configuration");
        Ok(())
    }
}
