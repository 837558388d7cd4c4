//! Shared semantic model for walkmod configuration documents.
//!
//! # Design constraints
//! - Nothing in here knows about XML or YAML trees; the adapters in
//!   `walkmod-edit` translate between these values and their documents.
//! - [`ops::EditRequest`] is serialized (golden fixtures, embedders), so be
//!   conservative with breaking changes and prefer optional fields.

pub mod ident;
pub mod model;
pub mod ops;

pub use ident::{IdentifierError, PluginConfig, ProviderConfig};
pub use model::{
    BeanCategory, ChainConfig, Configuration, DocumentFormat, MergePolicyConfig, Params,
    ReaderConfig, ResourceConfig, TransformationConfig, WalkerConfig, WriterConfig,
};
pub use ops::{EditRequest, FilterKind, ResourceSlot};

/// Name of the chain implicitly created from a bare root transformation list.
pub const DEFAULT_CHAIN: &str = "default";

/// Reader path used whenever a reader is synthesized without an explicit one.
pub const DEFAULT_PATH: &str = "src/main/java";

/// Schema identifiers for the XML flavour of the configuration.
pub mod schema {
    pub const ROOT_ELEMENT: &str = "walkmod";

    pub const PUBLIC_ID_V1_0: &str = "-//WALKMOD//DTD//1.0";
    pub const PUBLIC_ID_V1_1: &str = "-//WALKMOD//DTD//1.1";
    /// Identifier written by the earliest releases, equivalent to 1.0.
    pub const PUBLIC_ID_LEGACY: &str = "-//WALKMOD//DTD";

    pub const SYSTEM_ID_V1_0: &str = "http://www.walkmod.com/dtd/walkmod-1.0.dtd";
    pub const SYSTEM_ID_V1_1: &str = "http://www.walkmod.com/dtd/walkmod-1.1.dtd";
}
