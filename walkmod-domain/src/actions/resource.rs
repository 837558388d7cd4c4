use crate::actions::{Action, chain_or_default, resolve_chain};
use walkmod_edit::{ConfigDocument, EditResult};
use walkmod_types::ResourceSlot;
use walkmod_types::ops::{ResourceUpdate, SetReader, SetWriter};

fn set_resource(
    doc: &mut dyn ConfigDocument,
    slot: ResourceSlot,
    update: &ResourceUpdate,
) -> EditResult<bool> {
    let name = chain_or_default(update.chain.as_deref());
    let (handle, created) = resolve_chain(doc, name, update.path.as_deref(), None)?;
    let updated = doc.update_resource(handle, slot, update)?;
    tracing::debug!(
        chain = name,
        slot = slot.as_str(),
        created,
        updated,
        "resource update"
    );
    Ok(created || updated)
}

impl Action for SetReader {
    fn apply(&self, doc: &mut dyn ConfigDocument) -> EditResult<bool> {
        set_resource(doc, ResourceSlot::Reader, &self.update)
    }
}

impl Action for SetWriter {
    fn apply(&self, doc: &mut dyn ConfigDocument) -> EditResult<bool> {
        set_resource(doc, ResourceSlot::Writer, &self.update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::{xml, yaml};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn writer(chain: Option<&str>, path: &str) -> SetWriter {
        SetWriter {
            update: ResourceUpdate {
                chain: chain.map(str::to_string),
                path: Some(path.to_string()),
                ..ResourceUpdate::default()
            },
        }
    }

    #[test]
    fn flat_document_is_wrapped_before_the_reader_changes() {
        let mut doc = yaml("transformations:\n- type: \"t\"\n");
        let request = SetReader {
            update: ResourceUpdate {
                type_name: Some("walkmod:commons:file-reader".to_string()),
                ..ResourceUpdate::default()
            },
        };
        assert!(request.apply(doc.as_mut()).unwrap());
        assert!(!request.apply(doc.as_mut()).unwrap());

        let config = doc.configuration().unwrap();
        let chain = config.chain("default").unwrap();
        let reader = chain.reader.as_ref().unwrap();
        assert_eq!(
            reader.type_name.as_deref(),
            Some("walkmod:commons:file-reader")
        );
        assert_eq!(reader.path.as_deref(), Some("src/main/java"));
        assert_eq!(chain.transformations().len(), 1);
    }

    #[test]
    fn missing_chain_is_created_at_the_requested_path() {
        let mut doc = xml("<walkmod/>");
        let request = writer(Some("gen"), "target/gen");
        assert!(request.apply(doc.as_mut()).unwrap());
        assert!(!request.apply(doc.as_mut()).unwrap());

        let config = doc.configuration().unwrap();
        let chain = config.chain("gen").unwrap();
        assert_eq!(chain.reader_path(), "target/gen");
        assert_eq!(
            chain.writer.as_ref().and_then(|w| w.path.as_deref()),
            Some("target/gen")
        );
    }

    #[test]
    fn params_replace_the_existing_map() {
        let mut doc = yaml(
            "chains:\n- name: \"default\"\n  writer:\n    path: \"src\"\n    params:\n      old: 1\n",
        );
        let request = SetWriter {
            update: ResourceUpdate {
                params: [("encoding".to_string(), json!("UTF-8"))]
                    .into_iter()
                    .collect(),
                ..ResourceUpdate::default()
            },
        };
        assert!(request.apply(doc.as_mut()).unwrap());
        let config = doc.configuration().unwrap();
        let params = &config.chains[0].writer.as_ref().unwrap().parameters;
        assert_eq!(params.len(), 1);
        assert_eq!(params["encoding"], json!("UTF-8"));
    }
}
