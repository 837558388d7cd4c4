//! Domain logic: semantic edits of walkmod configuration documents.
//!
//! This crate owns *what* an edit means: which chain it lands in, when a flat
//! document must become a chained one, and how a recursive edit reaches the
//! modules of an aggregator. It does not own *how* documents are parsed or
//! written; that's the `walkmod-edit` crate.

mod actions;
mod migrate;
mod ports;
mod propagate;

pub use actions::{Action, action_for, normalize_wildcard};
pub use migrate::{migrate_flat, wrap_flat};
pub use ports::{DocumentStore, FsDocumentStore};
pub use propagate::{DocumentChange, EditOutcome, PropagateOptions, propagate};
