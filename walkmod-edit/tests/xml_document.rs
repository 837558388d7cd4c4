//! XML adapter behaviour: loading, schema checks, structural edits, rendering.

use camino::Utf8Path;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeSet;
use walkmod_edit::{BeanRef, ConfigDocument, EditError, Scope, XmlDocument};
use walkmod_types::ops::ResourceUpdate;
use walkmod_types::{
    BeanCategory, ChainConfig, FilterKind, PluginConfig, ResourceSlot, TransformationConfig,
};

const HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<!DOCTYPE walkmod PUBLIC \"-//WALKMOD//DTD//1.1\" \"http://www.walkmod.com/dtd/walkmod-1.1.dtd\">\n";

const LEGACY_CHAIN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE walkmod PUBLIC "-//WALKMOD//DTD" "http://www.walkmod.com/dtd/walkmod-1.0.dtd">
<walkmod>
  <!-- main chain -->
  <chain name="main">
    <reader path="src/main/java"/>
    <walker>
      <transformations>
        <transformation type="imports-cleaner"/>
      </transformations>
    </walker>
    <writer path="src/main/java"/>
  </chain>
</walkmod>
"#;

const TWO_CHAINS: &str = r#"<walkmod>
  <chain name="a">
    <reader path="src"/>
    <walker>
      <transformations>
        <transformation type="t1"/>
      </transformations>
    </walker>
    <writer path="src"/>
  </chain>
  <chain name="b">
    <reader path="lib"/>
  </chain>
</walkmod>
"#;

const FLAT: &str = r#"<walkmod>
  <transformation type="t1"/>
  <transformation type="t2" name="second">
    <param name="limit">3</param>
  </transformation>
</walkmod>
"#;

fn load(xml: &str) -> XmlDocument {
    XmlDocument::from_source(Utf8Path::new("walkmod.xml"), Some(xml.to_string()))
        .expect("valid document")
}

fn skeleton() -> XmlDocument {
    XmlDocument::from_source(Utf8Path::new("walkmod.xml"), None).expect("skeleton")
}

fn types(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|t| t.to_string()).collect()
}

#[test]
fn skeleton_with_plugin_renders_current_doctype() {
    let mut doc = skeleton();
    doc.push_plugin(&PluginConfig::new("org.walkmod", "myplugin", "1.0"))
        .unwrap();

    assert_eq!(
        doc.render().unwrap(),
        format!(
            "{HEADER}<walkmod>\n    <plugins>\n        <plugin groupId=\"org.walkmod\" artifactId=\"myplugin\" version=\"1.0\"/>\n    </plugins>\n</walkmod>\n"
        )
    );
}

#[test]
fn legacy_document_is_upgraded_and_keeps_comments() {
    let mut doc = load(LEGACY_CHAIN);
    doc.push_module("core").unwrap();

    let expected = format!(
        "{HEADER}<walkmod>
    <!-- main chain -->
    <chain name=\"main\">
        <reader path=\"src/main/java\"/>
        <walker>
            <transformations>
                <transformation type=\"imports-cleaner\"/>
            </transformations>
        </walker>
        <writer path=\"src/main/java\"/>
    </chain>
    <modules>
        <module>core</module>
    </modules>
</walkmod>
"
    );
    assert_eq!(doc.render().unwrap(), expected);
}

#[test]
fn root_sections_follow_schema_order() {
    let mut doc = load(TWO_CHAINS);
    doc.push_module("m").unwrap();
    doc.push_plugin(&PluginConfig::new("g", "a", "1")).unwrap();
    doc.push_provider(&walkmod_types::ProviderConfig::new("g:a:p"))
        .unwrap();

    let order: Vec<&str> = doc.root().elements().map(|e| e.name.as_str()).collect();
    assert_eq!(
        order,
        vec!["plugins", "conf-providers", "chain", "chain", "modules"]
    );
}

#[test]
fn missing_reader_path_is_a_schema_error() {
    let source = "<walkmod><chain name=\"a\"><reader/></chain></walkmod>";
    let err = XmlDocument::from_source(Utf8Path::new("walkmod.xml"), Some(source.to_string()))
        .unwrap_err();
    match err {
        EditError::Schema { message, .. } => {
            assert_eq!(message, "<reader> requires attribute 'path'")
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn unknown_element_and_broken_markup_are_rejected() {
    let unknown = XmlDocument::from_source(
        Utf8Path::new("walkmod.xml"),
        Some("<walkmod><wrapper/></walkmod>".to_string()),
    )
    .unwrap_err();
    assert!(matches!(unknown, EditError::Schema { .. }));

    let broken = XmlDocument::from_source(
        Utf8Path::new("walkmod.xml"),
        Some("<walkmod><chain name=\"a\">".to_string()),
    )
    .unwrap_err();
    assert!(matches!(broken, EditError::Parse { .. }));
    assert_eq!(broken.exit_code(), 2);
}

#[test]
fn modules_are_rejected_by_the_1_0_schema() {
    let xml = "<!DOCTYPE walkmod PUBLIC \"-//WALKMOD//DTD//1.0\" \
               \"http://www.walkmod.com/dtd/walkmod-1.0.dtd\">\n\
               <walkmod><modules><module>a</module></modules></walkmod>";
    let err = XmlDocument::from_source(Utf8Path::new("walkmod.xml"), Some(xml.to_string()))
        .unwrap_err();
    assert!(matches!(err, EditError::Schema { .. }));
}

#[test]
fn insert_chain_honours_before_and_appends_on_unknown_target() {
    let mut doc = load(TWO_CHAINS);
    let handle = doc
        .insert_chain(&ChainConfig::new("c"), Some("b"))
        .unwrap();
    assert_eq!(handle.index(), 1);
    assert_eq!(doc.chain_names(), vec!["a", "c", "b"]);

    let handle = doc
        .insert_chain(&ChainConfig::new("d"), Some("missing"))
        .unwrap();
    assert_eq!(handle.index(), 3);
    assert_eq!(doc.chain_names(), vec!["a", "c", "b", "d"]);
}

#[test]
fn chain_params_are_rejected_instead_of_dropped() {
    let mut doc = load(TWO_CHAINS);
    let mut chain = ChainConfig::with_path("c", "src");
    chain.parameters.insert("depth".to_string(), json!(2));

    let err = doc.insert_chain(&chain, None).unwrap_err();
    assert!(matches!(err, EditError::Schema { .. }), "{err}");
    assert_eq!(err.exit_code(), 2);
    assert_eq!(doc.chain_names(), vec!["a", "b"]);
}

#[test]
fn new_chain_writer_defaults_to_reader_path() {
    let mut doc = skeleton();
    let mut chain = ChainConfig::new("release")
        .with_transformations(vec![TransformationConfig::of_type("t3")]);
    chain.reader = Some(walkmod_types::ResourceConfig::at("lib"));
    chain.writer = Some(walkmod_types::ResourceConfig::default());
    doc.insert_chain(&chain, None).unwrap();

    assert_eq!(
        doc.render().unwrap(),
        format!(
            "{HEADER}<walkmod>
    <chain name=\"release\">
        <reader path=\"lib\"/>
        <walker>
            <transformations>
                <transformation type=\"t3\"/>
            </transformations>
        </walker>
        <writer path=\"lib\"/>
    </chain>
</walkmod>
"
        )
    );
}

#[test]
fn removing_last_transformation_drops_empty_walker() {
    let mut doc = load(TWO_CHAINS);
    let scope = Scope::Chain(doc.find_chain("a").unwrap());
    let t1 = types(&["t1"]);
    assert_eq!(doc.remove_transformations(scope, &t1).unwrap(), 1);

    let chain = doc.root().children_named("chain").next().unwrap();
    let children: Vec<&str> = chain.elements().map(|e| e.name.as_str()).collect();
    assert_eq!(children, vec!["reader", "writer"]);

    assert_eq!(doc.remove_transformations(scope, &t1).unwrap(), 0);
}

#[test]
fn insert_transformation_respects_order_and_creates_walker() {
    let mut doc = load(TWO_CHAINS);
    let scope = Scope::Chain(doc.find_chain("b").unwrap());
    doc.insert_transformation(scope, &TransformationConfig::of_type("x"), None)
        .unwrap();
    doc.insert_transformation(scope, &TransformationConfig::of_type("y"), Some(0))
        .unwrap();
    doc.insert_transformation(scope, &TransformationConfig::of_type("z"), Some(9))
        .unwrap();

    let listed: Vec<String> = doc
        .transformations(scope)
        .unwrap()
        .into_iter()
        .map(|t| t.type_name)
        .collect();
    assert_eq!(listed, vec!["y", "x", "z"]);
}

#[test]
fn flat_list_is_read_and_taken() {
    let mut doc = load(FLAT);
    assert!(doc.has_root_transformations());
    assert!(doc.chain_names().is_empty());

    let config = doc.configuration().unwrap();
    assert_eq!(config.chains.len(), 1);
    assert_eq!(config.chains[0].name, "default");
    assert_eq!(config.chains[0].transformations().len(), 2);

    let taken = doc.take_root_transformations().unwrap();
    assert_eq!(taken.len(), 2);
    assert_eq!(taken[1].name.as_deref(), Some("second"));
    assert_eq!(taken[1].parameters.get("limit"), Some(&json!("3")));
    assert!(!doc.has_root_transformations());
}

#[test]
fn filters_are_replaced_and_removed() {
    let mut doc = load(TWO_CHAINS);
    let a = doc.find_chain("a").unwrap();
    let wildcards = vec!["com/foo/**".to_string(), "Bar.java".to_string()];

    let (slot, excludes) = (ResourceSlot::Reader, FilterKind::Excludes);
    assert!(doc.set_filters(a, slot, excludes, &wildcards).unwrap());
    assert!(!doc.set_filters(a, slot, excludes, &wildcards).unwrap());
    let x = vec!["x".to_string()];
    assert!(doc.set_filters(a, slot, FilterKind::Includes, &x).unwrap());

    let reader = doc.resource(a, ResourceSlot::Reader).unwrap().unwrap();
    assert_eq!(reader.excludes, Some(wildcards));
    assert_eq!(reader.includes, Some(vec!["x".to_string()]));
    let tags: Vec<&str> = doc
        .root()
        .children_named("chain")
        .next()
        .unwrap()
        .child("reader")
        .unwrap()
        .elements()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(tags, vec!["include", "exclude", "exclude"]);

    assert!(doc.set_filters(a, slot, excludes, &[]).unwrap());
    let reader = doc.resource(a, ResourceSlot::Reader).unwrap().unwrap();
    assert_eq!(reader.excludes, None);
}

#[test]
fn update_resource_creates_writer_from_reader_path() {
    let mut doc = load(TWO_CHAINS);
    let b = doc.find_chain("b").unwrap();
    let update = ResourceUpdate {
        type_name: Some("javalang:string-writer".to_string()),
        ..ResourceUpdate::default()
    };
    let changed = doc.update_resource(b, ResourceSlot::Writer, &update);
    assert!(changed.unwrap());
    let changed_again = doc.update_resource(b, ResourceSlot::Writer, &update);
    assert!(!changed_again.unwrap());

    let writer = doc.resource(b, ResourceSlot::Writer).unwrap().unwrap();
    assert_eq!(writer.path.as_deref(), Some("lib"));
    assert_eq!(writer.type_name.as_deref(), Some("javalang:string-writer"));
}

#[test]
fn params_are_overwritten_or_appended() {
    let mut doc = load(FLAT);
    let bean = BeanRef::Transformation(Scope::Root, 1);
    assert!(!doc.set_param(bean, "limit", &json!("3")).unwrap());
    assert!(doc.set_param(bean, "limit", &json!(5)).unwrap());
    assert!(doc.set_param(bean, "mode", &json!("strict")).unwrap());

    let taken = doc.transformations(Scope::Root).unwrap();
    let keys: Vec<&String> = taken[1].parameters.keys().collect();
    assert_eq!(keys, vec!["limit", "mode"]);
    assert_eq!(taken[1].parameters["limit"], json!("5"));
}

#[test]
fn beans_are_listed_in_document_order() {
    let doc = load(TWO_CHAINS);
    let listed: Vec<(BeanCategory, String, Option<String>)> = doc
        .beans()
        .unwrap()
        .into_iter()
        .map(|b| (b.category, b.chain, b.type_name))
        .collect();
    assert_eq!(
        listed,
        vec![
            (BeanCategory::Reader, "a".to_string(), None),
            (BeanCategory::Walker, "a".to_string(), None),
            (BeanCategory::Transformation, "a".to_string(), Some("t1".to_string())),
            (BeanCategory::Writer, "a".to_string(), None),
            (BeanCategory::Reader, "b".to_string(), None),
        ]
    );
}

#[test]
fn removing_last_plugin_drops_section() {
    let mut doc = skeleton();
    doc.push_plugin(&PluginConfig::new("g", "a", "1")).unwrap();
    doc.remove_plugin(0).unwrap();
    assert!(doc.root().child("plugins").is_none());
    assert!(doc.remove_plugin(0).is_err());
}
