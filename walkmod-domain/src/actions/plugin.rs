use crate::actions::Action;
use walkmod_edit::{ConfigDocument, EditResult};
use walkmod_types::ops::{AddPlugin, RemovePlugin};

impl Action for AddPlugin {
    fn apply(&self, doc: &mut dyn ConfigDocument) -> EditResult<bool> {
        if doc
            .plugins()?
            .iter()
            .any(|p| p.same_identity(&self.plugin))
        {
            tracing::debug!(plugin = %self.plugin.coordinates(), "plugin already declared");
            return Ok(false);
        }
        doc.push_plugin(&self.plugin)?;
        Ok(true)
    }
}

impl Action for RemovePlugin {
    fn apply(&self, doc: &mut dyn ConfigDocument) -> EditResult<bool> {
        let index = doc
            .plugins()?
            .iter()
            .position(|p| p.same_identity(&self.plugin));
        match index {
            Some(index) => {
                doc.remove_plugin(index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::{xml, yaml};
    use pretty_assertions::assert_eq;
    use walkmod_types::PluginConfig;

    #[test]
    fn empty_yaml_gains_one_plugin() {
        let mut doc = yaml("");
        let request = AddPlugin {
            plugin: PluginConfig::new("org.walkmod", "myplugin", "1.0"),
        };
        assert!(request.apply(doc.as_mut()).unwrap());
        assert!(!request.apply(doc.as_mut()).unwrap());
        assert_eq!(
            doc.render().unwrap(),
            "plugins:\n- \"org.walkmod:myplugin:1.0\"\n"
        );
    }

    #[test]
    fn identity_ignores_version() {
        let mut doc = xml(
            r#"<walkmod><plugins><plugin groupId="org.walkmod" artifactId="p" version="1.0"/></plugins></walkmod>"#,
        );
        let add = AddPlugin {
            plugin: PluginConfig::new("org.walkmod", "p", "2.0"),
        };
        assert!(!add.apply(doc.as_mut()).unwrap());

        let remove = RemovePlugin {
            plugin: PluginConfig::new("org.walkmod", "p", "9"),
        };
        assert!(remove.apply(doc.as_mut()).unwrap());
        assert!(doc.plugins().unwrap().is_empty());
        assert!(!remove.apply(doc.as_mut()).unwrap());
    }
}
