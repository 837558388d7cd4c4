use crate::actions::Action;
use std::collections::BTreeSet;
use walkmod_edit::{ConfigDocument, EditResult};
use walkmod_types::ops::{AddModules, RemoveModules};

impl Action for AddModules {
    fn apply(&self, doc: &mut dyn ConfigDocument) -> EditResult<bool> {
        let mut present: BTreeSet<String> = doc.modules()?.into_iter().collect();
        let mut changed = false;
        for module in &self.modules {
            if present.insert(module.clone()) {
                doc.push_module(module)?;
                changed = true;
            }
        }
        Ok(changed)
    }
}

impl Action for RemoveModules {
    fn apply(&self, doc: &mut dyn ConfigDocument) -> EditResult<bool> {
        let targets: BTreeSet<&str> = self.modules.iter().map(String::as_str).collect();
        let matching: Vec<usize> = doc
            .modules()?
            .iter()
            .enumerate()
            .filter(|(_, m)| targets.contains(m.as_str()))
            .map(|(index, _)| index)
            .collect();
        for index in matching.iter().rev() {
            doc.remove_module(*index)?;
        }
        Ok(!matching.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::xml;
    use pretty_assertions::assert_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn adds_only_the_missing_modules() {
        let mut doc = xml("<walkmod><modules><module>a</module></modules></walkmod>");
        let add = AddModules {
            modules: names(&["a", "b", "b", "c"]),
        };
        assert!(add.apply(doc.as_mut()).unwrap());
        assert!(!add.apply(doc.as_mut()).unwrap());
        assert_eq!(doc.modules().unwrap(), names(&["a", "b", "c"]));
    }

    #[test]
    fn removing_the_last_module_drops_the_section() {
        let mut doc = xml(
            "<walkmod><modules><module>a</module><module>b</module></modules></walkmod>",
        );
        let remove = RemoveModules {
            modules: names(&["a", "b", "z"]),
        };
        assert!(remove.apply(doc.as_mut()).unwrap());
        assert!(!remove.apply(doc.as_mut()).unwrap());
        assert!(doc.modules().unwrap().is_empty());
        assert!(!doc.render().unwrap().contains("<modules"));
    }
}
