use crate::actions::Action;
use crate::migrate;
use walkmod_edit::{ConfigDocument, EditResult};
use walkmod_types::DEFAULT_CHAIN;
use walkmod_types::ops::{AddChain, RemoveChains};

impl Action for AddChain {
    fn apply(&self, doc: &mut dyn ConfigDocument) -> EditResult<bool> {
        let name = self.chain.name.as_str();
        if doc.find_chain(name).is_some() {
            tracing::debug!(chain = name, "chain already present");
            return Ok(false);
        }

        if doc.has_root_transformations() {
            if name == DEFAULT_CHAIN {
                tracing::debug!("flat document already provides the default chain");
                return Ok(false);
            }
            migrate::wrap_flat(doc, None)?;
        }

        doc.insert_chain(&self.chain, self.before.as_deref())?;
        Ok(true)
    }
}

impl Action for RemoveChains {
    fn apply(&self, doc: &mut dyn ConfigDocument) -> EditResult<bool> {
        let mut changed = false;
        for name in &self.names {
            if let Some(handle) = doc.find_chain(name) {
                doc.remove_chain(handle)?;
                changed = true;
            } else if name == DEFAULT_CHAIN && doc.has_root_transformations() {
                let dropped = doc.take_root_transformations()?;
                tracing::debug!(
                    transformations = dropped.len(),
                    "dropped flat default chain"
                );
                changed = true;
            }
        }
        Ok(changed)
    }
}
