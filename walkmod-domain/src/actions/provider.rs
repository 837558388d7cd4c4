use crate::actions::Action;
use std::collections::BTreeSet;
use walkmod_edit::{ConfigDocument, EditResult};
use walkmod_types::ProviderConfig;
use walkmod_types::ops::{AddProvider, RemoveProviders};

/// Normalized provider types named by the request.
fn identities(request: &RemoveProviders) -> EditResult<BTreeSet<String>> {
    let identities = request
        .providers
        .iter()
        .map(|raw| ProviderConfig::normalize_type(raw))
        .collect::<Result<_, _>>()?;
    Ok(identities)
}

impl Action for AddProvider {
    fn validate(&self) -> EditResult<()> {
        ProviderConfig::normalize_type(&self.provider.type_name)?;
        Ok(())
    }

    fn apply(&self, doc: &mut dyn ConfigDocument) -> EditResult<bool> {
        let identity = ProviderConfig::normalize_type(&self.provider.type_name)?;
        if doc.providers()?.iter().any(|p| p.identity() == identity) {
            tracing::debug!(provider = %identity, "provider already declared");
            return Ok(false);
        }

        let provider = ProviderConfig {
            type_name: identity,
            parameters: self.provider.parameters.clone(),
        };
        doc.push_provider(&provider)?;
        Ok(true)
    }
}

impl Action for RemoveProviders {
    fn validate(&self) -> EditResult<()> {
        identities(self).map(drop)
    }

    fn apply(&self, doc: &mut dyn ConfigDocument) -> EditResult<bool> {
        let targets = identities(self)?;
        let matching: Vec<usize> = doc
            .providers()?
            .iter()
            .enumerate()
            .filter(|(_, p)| targets.contains(&p.identity()))
            .map(|(index, _)| index)
            .collect();

        for index in matching.iter().rev() {
            doc.remove_provider(*index)?;
        }
        Ok(!matching.is_empty())
    }
}
