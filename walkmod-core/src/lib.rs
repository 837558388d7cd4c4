//! Embeddable core library for walkmod configuration edits.
//!
//! Provides a clap-free entry point suitable for linking into a build tool
//! plugin or other host process.
//!
//! # Port traits
//!
//! Artifact output is abstracted behind [`ports::WritePort`]; the
//! [`adapters`] module provides the filesystem-backed implementation.
//! Configuration documents themselves go through
//! [`walkmod_domain::DocumentStore`].
//!
//! # Entry points
//!
//! - [`run_edit`](pipeline::run_edit) - run one edit request, optionally recursive
//! - [`run_inspect`](pipeline::run_inspect) - load the assembled configuration

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

// Re-export the request model so callers don't need walkmod-types directly.
pub use walkmod_types::{Configuration, DocumentFormat, EditRequest};

// Re-export the outcome types so embedders don't need walkmod-domain directly.
pub use walkmod_domain::{DocumentChange, EditOutcome};
