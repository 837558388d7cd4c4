//! `walkmod.xml` support: an owned DOM, the two DTD tables, and the adapter.

mod adapter;
pub mod dom;
pub mod schema;

pub use adapter::XmlDocument;
pub use schema::SchemaVersion;
