//! The navigation and mutation contract shared by the XML and YAML adapters.
//!
//! Actions only ever talk to a `dyn ConfigDocument`; trees, DOCTYPEs and
//! indentation stay behind the adapter.

use crate::error::{EditError, EditResult};
use crate::xml::XmlDocument;
use crate::yaml::YamlDocument;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::collections::BTreeSet;
use walkmod_types::ops::ResourceUpdate;
use walkmod_types::{
    BeanCategory, ChainConfig, Configuration, DocumentFormat, FilterKind, PluginConfig,
    ProviderConfig, ResourceConfig, ResourceSlot, TransformationConfig,
};

/// Position of a chain inside its document.
///
/// Handles are invalidated by `insert_chain`/`remove_chain`; look the chain up
/// again by name after either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainHandle(pub(crate) usize);

impl ChainHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Where a transformation list lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The bare root-level list of a flat document.
    Root,
    Chain(ChainHandle),
}

/// A parameterizable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BeanRef {
    Resource(ChainHandle, ResourceSlot),
    Walker(ChainHandle),
    /// The n-th transformation of a scope.
    Transformation(Scope, usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeanInfo {
    pub bean: BeanRef,
    pub category: BeanCategory,
    /// Owning chain; `default` for the flat list.
    pub chain: String,
    pub type_name: Option<String>,
    pub name: Option<String>,
}

pub trait ConfigDocument {
    fn format(&self) -> DocumentFormat;

    fn path(&self) -> &Utf8Path;

    /// Text the document was loaded from; `None` when it did not exist on disk.
    fn original(&self) -> Option<&str>;

    fn is_skeleton(&self) -> bool {
        self.original().is_none()
    }

    fn chain_names(&self) -> Vec<String>;

    fn find_chain(&self, name: &str) -> Option<ChainHandle>;

    /// Inserts a chain ahead of `before`; appends when `before` is absent or unknown.
    fn insert_chain(&mut self, chain: &ChainConfig, before: Option<&str>)
    -> EditResult<ChainHandle>;

    fn remove_chain(&mut self, chain: ChainHandle) -> EditResult<()>;

    fn has_root_transformations(&self) -> bool;

    /// Detaches the bare root transformation list, leaving none behind.
    fn take_root_transformations(&mut self) -> EditResult<Vec<TransformationConfig>>;

    fn transformations(&self, scope: Scope) -> EditResult<Vec<TransformationConfig>>;

    /// Inserts at `order` when it is inside the list, appends otherwise.
    /// Missing walker/transformation containers are created.
    fn insert_transformation(
        &mut self,
        scope: Scope,
        transformation: &TransformationConfig,
        order: Option<usize>,
    ) -> EditResult<()>;

    /// Removes every transformation whose type is in `types` and returns how many went.
    /// A container emptied by the removal goes too; the root never does.
    fn remove_transformations(&mut self, scope: Scope, types: &BTreeSet<String>)
    -> EditResult<usize>;

    fn resource(&self, chain: ChainHandle, slot: ResourceSlot)
    -> EditResult<Option<ResourceConfig>>;

    /// Creates a reader at the default path, or a writer at the reader's path.
    /// Returns true when something was created.
    fn ensure_resource(&mut self, chain: ChainHandle, slot: ResourceSlot) -> EditResult<bool>;

    /// Applies the provided `type`, `path` and `params`, creating the resource if needed.
    fn update_resource(
        &mut self,
        chain: ChainHandle,
        slot: ResourceSlot,
        update: &ResourceUpdate,
    ) -> EditResult<bool>;

    /// Replaces one wildcard list; an empty list removes it.
    fn set_filters(
        &mut self,
        chain: ChainHandle,
        slot: ResourceSlot,
        kind: FilterKind,
        wildcards: &[String],
    ) -> EditResult<bool>;

    fn plugins(&self) -> EditResult<Vec<PluginConfig>>;
    fn push_plugin(&mut self, plugin: &PluginConfig) -> EditResult<()>;
    /// Removes the n-th plugin; the section goes with the last one.
    fn remove_plugin(&mut self, index: usize) -> EditResult<()>;

    fn providers(&self) -> EditResult<Vec<ProviderConfig>>;
    fn push_provider(&mut self, provider: &ProviderConfig) -> EditResult<()>;
    fn remove_provider(&mut self, index: usize) -> EditResult<()>;

    fn modules(&self) -> EditResult<Vec<String>>;
    fn push_module(&mut self, module: &str) -> EditResult<()>;
    fn remove_module(&mut self, index: usize) -> EditResult<()>;

    /// Every reader, walker, transformation and writer, in document order.
    fn beans(&self) -> EditResult<Vec<BeanInfo>>;

    /// Overwrites or appends one parameter. Returns false when the value was already there.
    fn set_param(&mut self, bean: BeanRef, key: &str, value: &serde_json::Value)
    -> EditResult<bool>;

    fn configuration(&self) -> EditResult<Configuration>;

    fn render(&self) -> EditResult<String>;

    fn persist(&self) -> EditResult<()> {
        let contents = self.render()?;
        write_document(self.path(), &contents)
    }
}

/// Canonical document path of a project directory.
pub fn document_path(dir: &Utf8Path, format: DocumentFormat) -> Utf8PathBuf {
    dir.join(format.file_name())
}

/// First configuration document present in `dir`, in detection order.
pub fn detect_format(dir: &Utf8Path) -> Option<DocumentFormat> {
    DocumentFormat::DETECTION_ORDER
        .into_iter()
        .find(|format| document_path(dir, *format).is_file())
}

/// Loads `path`, or a skeleton when it does not exist.
pub fn load_document(
    path: &Utf8Path,
    format: DocumentFormat,
) -> EditResult<Box<dyn ConfigDocument>> {
    let original = if path.exists() {
        let contents = fs::read_to_string(path).with_context(|| format!("read {}", path))?;
        Some(contents)
    } else {
        tracing::debug!(%path, "no configuration on disk, starting from a skeleton");
        None
    };

    Ok(match format {
        DocumentFormat::Xml => Box::new(XmlDocument::from_source(path, original)?),
        DocumentFormat::Yaml | DocumentFormat::Json => {
            Box::new(YamlDocument::from_source(path, format, original)?)
        }
    })
}

/// Like [`load_document`], but a missing file is an error.
pub fn load_existing(
    path: &Utf8Path,
    format: DocumentFormat,
) -> EditResult<Box<dyn ConfigDocument>> {
    if !path.is_file() {
        return Err(EditError::MissingDocument(path.to_path_buf()));
    }
    load_document(path, format)
}

/// Writes `contents` to `path`, creating parent directories.
pub fn write_document(path: &Utf8Path, contents: &str) -> EditResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent))?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8(td: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(td.path().to_path_buf()).expect("utf8 tempdir")
    }

    #[test]
    fn detect_prefers_xml_then_yaml_then_json() {
        let td = TempDir::new().unwrap();
        let dir = utf8(&td);
        assert_eq!(detect_format(&dir), None);

        std::fs::write(dir.join("walkmod.json"), "{}").unwrap();
        assert_eq!(detect_format(&dir), Some(DocumentFormat::Json));

        std::fs::write(dir.join("walkmod.yml"), "").unwrap();
        assert_eq!(detect_format(&dir), Some(DocumentFormat::Yaml));

        std::fs::write(dir.join("walkmod.xml"), "<walkmod/>").unwrap();
        assert_eq!(detect_format(&dir), Some(DocumentFormat::Xml));
    }

    #[test]
    fn missing_file_loads_as_skeleton() {
        let td = TempDir::new().unwrap();
        let path = utf8(&td).join("walkmod.yml");
        let doc = load_document(&path, DocumentFormat::Yaml).unwrap();
        assert!(doc.is_skeleton());
        assert!(doc.chain_names().is_empty());
    }

    #[test]
    fn load_existing_rejects_missing_file() {
        let td = TempDir::new().unwrap();
        let path = utf8(&td).join("walkmod.xml");
        let err = load_existing(&path, DocumentFormat::Xml).err().unwrap();
        assert!(matches!(err, EditError::MissingDocument(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn persist_creates_parent_directories() {
        let td = TempDir::new().unwrap();
        let path = utf8(&td).join("module-a").join("walkmod.yml");
        let mut doc = load_document(&path, DocumentFormat::Yaml).unwrap();
        doc.push_module("core").unwrap();
        doc.persist().unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "modules:\n- \"core\"\n"
        );
    }
}
