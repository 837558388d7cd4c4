use pretty_assertions::assert_eq;
use walkmod_types::ops::{
    AddChain, AddConfigurationParameter, AddIncludesOrExcludes, AddPlugin, AddTransformation,
    FilterEdit, RemoveChains, ResourceUpdate, SetReader,
};
use walkmod_types::{
    BeanCategory, ChainConfig, EditRequest, FilterKind, PluginConfig, TransformationConfig,
};

#[test]
fn edit_request_is_tagged_by_action() {
    let req = EditRequest::RemoveChains(RemoveChains {
        names: vec!["default".to_string()],
    });
    let value = serde_json::to_value(&req).expect("serialize");
    assert_eq!(
        value,
        serde_json::json!({ "action": "remove_chains", "names": ["default"] })
    );
    assert_eq!(req.name(), "remove_chains");
}

#[test]
fn add_transformation_omits_unset_fields() {
    let req = EditRequest::AddTransformation(AddTransformation {
        chain: None,
        path: None,
        transformation: TransformationConfig::of_type("imports-cleaner"),
        order: None,
        before: None,
    });
    let value = serde_json::to_value(&req).expect("serialize");
    assert_eq!(
        value,
        serde_json::json!({
            "action": "add_transformation",
            "transformation": { "type": "imports-cleaner", "is_mergeable": false }
        })
    );
}

#[test]
fn set_reader_flattens_update_fields() {
    let json =
        r#"{ "action": "set_reader", "chain": "c", "type": "walkmod:reader", "path": "src" }"#;
    let req: EditRequest = serde_json::from_str(json).expect("parse");
    assert_eq!(
        req,
        EditRequest::SetReader(SetReader {
            update: ResourceUpdate {
                chain: Some("c".to_string()),
                type_name: Some("walkmod:reader".to_string()),
                path: Some("src".to_string()),
                params: Default::default(),
            }
        })
    );
}

#[test]
fn filter_edit_roundtrips_through_json() {
    let req = EditRequest::AddIncludesOrExcludes(AddIncludesOrExcludes {
        filter: FilterEdit {
            chain: None,
            wildcards: vec!["org/**".to_string()],
            kind: FilterKind::Excludes,
            reader: true,
            writer: false,
        },
    });
    let text = serde_json::to_string(&req).expect("serialize");
    let back: EditRequest = serde_json::from_str(&text).expect("parse");
    assert_eq!(back, req);
}

#[test]
fn plugin_and_chain_requests_parse_from_fixture_shape() {
    let json = r#"{
        "action": "add_plugin",
        "plugin": { "group_id": "org.walkmod", "artifact_id": "myplugin", "version": "1.0" }
    }"#;
    let req: EditRequest = serde_json::from_str(json).expect("parse");
    assert_eq!(
        req,
        EditRequest::AddPlugin(AddPlugin {
            plugin: PluginConfig::new("org.walkmod", "myplugin", "1.0")
        })
    );

    let json = r#"{ "action": "add_chain", "chain": { "name": "release" }, "before": "default" }"#;
    let req: EditRequest = serde_json::from_str(json).expect("parse");
    assert_eq!(
        req,
        EditRequest::AddChain(AddChain {
            chain: ChainConfig::new("release"),
            before: Some("default".to_string()),
        })
    );
}

#[test]
fn configuration_parameter_accepts_category_filter() {
    let json = r#"{
        "action": "add_configuration_parameter",
        "param": "limit",
        "value": 3,
        "category": "transformation"
    }"#;
    let req: EditRequest = serde_json::from_str(json).expect("parse");
    let EditRequest::AddConfigurationParameter(AddConfigurationParameter {
        param,
        value,
        category,
        ..
    }) = req
    else {
        panic!("expected add_configuration_parameter");
    };
    assert_eq!(param, "limit");
    assert_eq!(value, serde_json::json!(3));
    assert_eq!(category, Some(BeanCategory::Transformation));
}
