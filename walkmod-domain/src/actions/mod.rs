use crate::migrate;
use walkmod_edit::{ChainHandle, ConfigDocument, EditResult};
use walkmod_types::ops::EditRequest;
use walkmod_types::{ChainConfig, DEFAULT_CHAIN, DEFAULT_PATH};

mod chain;
mod filters;
mod module;
mod param;
mod plugin;
mod provider;
mod resource;
mod transformation;

pub use filters::normalize_wildcard;

/// One idempotent edit of a single configuration document.
pub trait Action {
    /// Rejects malformed input before any document is loaded.
    fn validate(&self) -> EditResult<()> {
        Ok(())
    }

    /// Applies the edit in memory. Returns false when the document already
    /// satisfied the request and nothing was touched.
    fn apply(&self, doc: &mut dyn ConfigDocument) -> EditResult<bool>;
}

/// The action behind a request.
pub fn action_for(request: &EditRequest) -> &dyn Action {
    match request {
        EditRequest::AddChain(a) => a,
        EditRequest::RemoveChains(a) => a,
        EditRequest::AddTransformation(a) => a,
        EditRequest::RemoveTransformations(a) => a,
        EditRequest::SetReader(a) => a,
        EditRequest::SetWriter(a) => a,
        EditRequest::AddIncludesOrExcludes(a) => a,
        EditRequest::RemoveIncludesOrExcludes(a) => a,
        EditRequest::AddPlugin(a) => a,
        EditRequest::RemovePlugin(a) => a,
        EditRequest::AddProvider(a) => a,
        EditRequest::RemoveProviders(a) => a,
        EditRequest::AddModules(a) => a,
        EditRequest::RemoveModules(a) => a,
        EditRequest::AddConfigurationParameter(a) => a,
    }
}

/// Finds `name`, creating it when missing.
///
/// A flat document is migrated first. A chain created here carries a reader
/// and writer at `path` (or the default source path). The flag reports
/// whether the document was changed.
pub(crate) fn resolve_chain(
    doc: &mut dyn ConfigDocument,
    name: &str,
    path: Option<&str>,
    before: Option<&str>,
) -> EditResult<(ChainHandle, bool)> {
    if let Some(handle) = doc.find_chain(name) {
        return Ok((handle, false));
    }

    let handle = if doc.has_root_transformations() {
        migrate::migrate_flat(doc, name, path, before)?
    } else {
        tracing::debug!(chain = name, "creating missing chain");
        let chain = ChainConfig::with_path(name, path.unwrap_or(DEFAULT_PATH));
        doc.insert_chain(&chain, before)?
    };
    Ok((handle, true))
}

/// Chain a request addresses when it names none.
pub(crate) fn chain_or_default(chain: Option<&str>) -> &str {
    chain.unwrap_or(DEFAULT_CHAIN)
}
