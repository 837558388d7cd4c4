use crate::actions::{Action, chain_or_default, resolve_chain};
use std::collections::BTreeSet;
use walkmod_edit::{ConfigDocument, EditResult, Scope};
use walkmod_types::DEFAULT_CHAIN;
use walkmod_types::ops::{AddTransformation, RemoveTransformations};

/// Whether the edit stays in the bare root list: no chain other than
/// `default` requested, no path, and no chains in the document.
fn targets_flat_list(request: &AddTransformation, doc: &dyn ConfigDocument) -> bool {
    let chain = request.chain.as_deref();
    let default_requested = chain.is_none_or(|c| c == DEFAULT_CHAIN);
    default_requested && request.path.is_none() && doc.chain_names().is_empty()
}

impl Action for AddTransformation {
    fn apply(&self, doc: &mut dyn ConfigDocument) -> EditResult<bool> {
        let scope = if targets_flat_list(self, doc) {
            Scope::Root
        } else {
            let name = chain_or_default(self.chain.as_deref());
            let (handle, _) =
                resolve_chain(doc, name, self.path.as_deref(), self.before.as_deref())?;
            Scope::Chain(handle)
        };

        tracing::debug!(
            transformation = %self.transformation.type_name,
            order = ?self.order,
            ?scope,
            "inserting transformation"
        );
        doc.insert_transformation(scope, &self.transformation, self.order)?;
        Ok(true)
    }
}

impl Action for RemoveTransformations {
    fn apply(&self, doc: &mut dyn ConfigDocument) -> EditResult<bool> {
        let types: BTreeSet<String> = self.types.iter().cloned().collect();
        if types.is_empty() {
            return Ok(false);
        }

        let mut removed = 0;
        match self.chain.as_deref() {
            Some(name) => {
                if let Some(handle) = doc.find_chain(name) {
                    removed += doc.remove_transformations(Scope::Chain(handle), &types)?;
                } else if name == DEFAULT_CHAIN {
                    removed += doc.remove_transformations(Scope::Root, &types)?;
                }
            }
            None => {
                for name in doc.chain_names() {
                    if let Some(handle) = doc.find_chain(&name) {
                        removed += doc.remove_transformations(Scope::Chain(handle), &types)?;
                    }
                }
                removed += doc.remove_transformations(Scope::Root, &types)?;
            }
        }

        tracing::debug!(removed, "removed transformations");
        Ok(removed > 0)
    }
}
