//! Flat-to-chain migration.
//!
//! A document holding a bare transformation list implicitly owns a chain
//! called `default`. Before any other chain can live next to it, the list has
//! to be wrapped into an explicit `default` chain.

use walkmod_edit::{ChainHandle, ConfigDocument, EditError, EditResult};
use walkmod_types::{ChainConfig, DEFAULT_CHAIN, DEFAULT_PATH};

/// Moves the bare list into an explicit `default` chain whose reader and
/// writer sit at `path`, or the default source path.
pub fn wrap_flat(doc: &mut dyn ConfigDocument, path: Option<&str>) -> EditResult<ChainHandle> {
    let bare = doc.take_root_transformations()?;
    let path = path.unwrap_or(DEFAULT_PATH);
    tracing::debug!(
        document = %doc.path(),
        transformations = bare.len(),
        path,
        "wrapping flat transformation list into the default chain"
    );
    let chain = ChainConfig::with_path(DEFAULT_CHAIN, path).with_transformations(bare);
    doc.insert_chain(&chain, None)
}

/// Migrates a flat document and returns the handle of `target`.
///
/// An explicit `path` belongs to `target`: it reaches the `default` chain only
/// when `default` is the target. Any other target is created beside it, ahead
/// of `default` when `before` names it, after it otherwise.
pub fn migrate_flat(
    doc: &mut dyn ConfigDocument,
    target: &str,
    path: Option<&str>,
    before: Option<&str>,
) -> EditResult<ChainHandle> {
    if target == DEFAULT_CHAIN {
        return wrap_flat(doc, path);
    }

    wrap_flat(doc, None)?;
    let chain = ChainConfig::with_path(target, path.unwrap_or(DEFAULT_PATH));
    doc.insert_chain(&chain, before)?;
    doc.find_chain(target).ok_or_else(|| {
        EditError::Runtime(anyhow::anyhow!(
            "chain '{target}' missing right after insertion into {}",
            doc.path()
        ))
    })
}
