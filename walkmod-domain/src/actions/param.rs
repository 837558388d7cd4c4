use crate::actions::Action;
use walkmod_edit::{BeanInfo, ConfigDocument, EditResult};
use walkmod_types::ops::AddConfigurationParameter;

/// Every filter the request sets must agree with the bean.
fn matches(request: &AddConfigurationParameter, bean: &BeanInfo) -> bool {
    let by_type = request
        .type_name
        .as_deref()
        .is_none_or(|t| bean.type_name.as_deref() == Some(t));
    let by_name = request
        .name
        .as_deref()
        .is_none_or(|n| bean.name.as_deref() == Some(n));
    let by_category = request.category.is_none_or(|c| bean.category == c);
    let by_chain = request.chain.as_deref().is_none_or(|c| bean.chain == c);
    by_type && by_name && by_category && by_chain
}

impl Action for AddConfigurationParameter {
    fn apply(&self, doc: &mut dyn ConfigDocument) -> EditResult<bool> {
        let targets: Vec<BeanInfo> = doc
            .beans()?
            .into_iter()
            .filter(|bean| matches(self, bean))
            .collect();
        if targets.is_empty() {
            tracing::debug!(param = %self.param, "no bean matches the parameter filters");
        }

        let mut changed = false;
        for bean in &targets {
            changed |= doc.set_param(bean.bean, &self.param, &self.value)?;
        }
        Ok(changed)
    }
}
