//! Document adapters for walkmod configuration.
//!
//! Responsibilities:
//! - Load `walkmod.xml` (validated against the 1.0 or 1.1 DTD tables) and
//!   `walkmod.yml` / `walkmod.json`, or synthesize a skeleton.
//! - Expose both through [`ConfigDocument`], the only surface actions use.
//! - Render and persist documents in their canonical layout.
//! - Generate a unified diff preview.

pub mod document;
pub mod error;
pub mod patch;
pub mod xml;
pub mod yaml;

pub use document::{
    BeanInfo, BeanRef, ChainHandle, ConfigDocument, Scope, detect_format, document_path,
    load_document, load_existing, write_document,
};
pub use error::{EditError, EditResult};
pub use patch::render_patch;
pub use xml::XmlDocument;
pub use yaml::YamlDocument;
