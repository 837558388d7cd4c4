use crate::actions::{Action, chain_or_default, resolve_chain};
use std::collections::BTreeSet;
use walkmod_edit::{ConfigDocument, EditResult};
use walkmod_types::ResourceConfig;
use walkmod_types::ops::{AddIncludesOrExcludes, FilterKind, RemoveIncludesOrExcludes};

/// Rewrites a wildcard that starts with the resource `path` relative to it.
///
/// The prefix and its separator go, then a trailing `**`, unless nothing
/// would be left. Wildcards outside `path` are kept verbatim.
pub fn normalize_wildcard(wildcard: &str, path: &str) -> String {
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        return wildcard.to_string();
    }
    let Some(rest) = wildcard.strip_prefix(path) else {
        return wildcard.to_string();
    };
    if !rest.is_empty() && !rest.starts_with('/') {
        // `src/main/javax` is not inside `src/main/java`.
        return wildcard.to_string();
    }

    let rest = rest.trim_start_matches('/');
    match rest.strip_suffix("**") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => rest.to_string(),
    }
}

fn current(resource: &ResourceConfig, kind: FilterKind) -> Vec<String> {
    let list = match kind {
        FilterKind::Includes => &resource.includes,
        FilterKind::Excludes => &resource.excludes,
    };
    list.clone().unwrap_or_default()
}

impl Action for AddIncludesOrExcludes {
    fn apply(&self, doc: &mut dyn ConfigDocument) -> EditResult<bool> {
        let filter = &self.filter;
        let name = chain_or_default(filter.chain.as_deref());
        let (handle, mut changed) = resolve_chain(doc, name, None, None)?;

        for slot in filter.slots() {
            changed |= doc.ensure_resource(handle, slot)?;
            let resource = doc.resource(handle, slot)?.unwrap_or_default();
            let base = resource.path.clone().unwrap_or_default();

            let mut list = current(&resource, filter.kind);
            for wildcard in &filter.wildcards {
                let wildcard = normalize_wildcard(wildcard, &base);
                if !list.contains(&wildcard) {
                    list.push(wildcard);
                }
            }
            changed |= doc.set_filters(handle, slot, filter.kind, &list)?;
        }
        Ok(changed)
    }
}

impl Action for RemoveIncludesOrExcludes {
    fn apply(&self, doc: &mut dyn ConfigDocument) -> EditResult<bool> {
        let filter = &self.filter;
        let name = chain_or_default(filter.chain.as_deref());
        let Some(handle) = doc.find_chain(name) else {
            tracing::debug!(chain = name, "no such chain, nothing to remove");
            return Ok(false);
        };

        let mut changed = false;
        for slot in filter.slots() {
            let Some(resource) = doc.resource(handle, slot)? else {
                continue;
            };
            let base = resource.path.clone().unwrap_or_default();
            let targets: BTreeSet<String> = filter
                .wildcards
                .iter()
                .flat_map(|w| [w.clone(), normalize_wildcard(w, &base)])
                .collect();

            let list = current(&resource, filter.kind);
            let kept: Vec<String> = list
                .iter()
                .filter(|w| !targets.contains(*w))
                .cloned()
                .collect();
            if kept.len() != list.len() {
                changed |= doc.set_filters(handle, slot, filter.kind, &kept)?;
            }
        }
        Ok(changed)
    }
}
