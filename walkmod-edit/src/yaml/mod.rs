//! `walkmod.yml` / `walkmod.json` support over `serde_yaml` nodes.

mod adapter;
pub mod convert;
pub mod emit;

pub use adapter::YamlDocument;
