//! Embedded structure tables for the two published walkmod DTDs.
//!
//! Only what the edit engine relies on is checked: element placement,
//! required and permitted attributes, and where text may appear.

use super::dom::{DocType, Element};
use walkmod_types::schema::{
    PUBLIC_ID_LEGACY, PUBLIC_ID_V1_0, PUBLIC_ID_V1_1, ROOT_ELEMENT, SYSTEM_ID_V1_0, SYSTEM_ID_V1_1,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    V1_0,
    V1_1,
}

struct Rule {
    name: &'static str,
    children: &'static [&'static str],
    required: &'static [&'static str],
    optional: &'static [&'static str],
    text: bool,
}

const fn rule(
    name: &'static str,
    children: &'static [&'static str],
    required: &'static [&'static str],
    optional: &'static [&'static str],
) -> Rule {
    Rule {
        name,
        children,
        required,
        optional,
        text: false,
    }
}

const fn text_rule(name: &'static str, required: &'static [&'static str]) -> Rule {
    Rule {
        name,
        children: &[],
        required,
        optional: &[],
        text: true,
    }
}

const RESOURCE_CHILDREN: &[&str] = &["param", "include", "exclude"];

const SHARED: &[Rule] = &[
    rule("plugins", &["plugin"], &[], &[]),
    rule("plugin", &[], &["groupId", "artifactId", "version"], &[]),
    rule("merge-policies", &["policy"], &[], &[]),
    rule(
        "policy",
        &["policy-entry"],
        &["name"],
        &["default-object-policy", "default-type-policy"],
    ),
    rule("policy-entry", &[], &["object-type", "policy-type"], &[]),
    rule("reader", RESOURCE_CHILDREN, &["path"], &["type"]),
    rule("writer", RESOURCE_CHILDREN, &["path"], &["type"]),
    rule(
        "walker",
        &["param", "parser", "transformations"],
        &[],
        &["type", "root-namespace"],
    ),
    rule("parser", &["param"], &[], &["type"]),
    rule("transformations", &["transformation"], &[], &[]),
    rule("include", &[], &["wildcard"], &[]),
    rule("exclude", &[], &["wildcard"], &[]),
    text_rule("param", &["name"]),
];

const V1_0: &[Rule] = &[
    rule("walkmod", &["plugins", "merge-policies", "chain"], &[], &[]),
    rule("chain", &["reader", "walker", "writer"], &[], &["name"]),
    rule(
        "transformation",
        &["param"],
        &["type"],
        &["name", "merge-policy"],
    ),
];

const V1_1: &[Rule] = &[
    rule(
        "walkmod",
        &[
            "plugins",
            "conf-providers",
            "merge-policies",
            "chain",
            "transformation",
            "modules",
        ],
        &[],
        &[],
    ),
    rule(
        "chain",
        &["reader", "walker", "transformation", "writer"],
        &[],
        &["name"],
    ),
    rule(
        "transformation",
        &["param"],
        &["type"],
        &["name", "merge-policy", "isMergeable"],
    ),
    rule("conf-providers", &["conf-provider"], &[], &[]),
    rule("conf-provider", &["param"], &["type"], &[]),
    rule("modules", &["module"], &[], &[]),
    text_rule("module", &[]),
];

impl SchemaVersion {
    /// Public id first, then system id; a document without DOCTYPE is 1.1.
    pub fn resolve(doctype: Option<&DocType>) -> Result<Self, String> {
        let Some(doctype) = doctype else {
            return Ok(SchemaVersion::V1_1);
        };
        if doctype.name != ROOT_ELEMENT {
            return Err(format!(
                "DOCTYPE declares <{}>, expected <{ROOT_ELEMENT}>",
                doctype.name
            ));
        }
        match doctype.public_id.as_deref() {
            Some(PUBLIC_ID_LEGACY) | Some(PUBLIC_ID_V1_0) => return Ok(SchemaVersion::V1_0),
            Some(PUBLIC_ID_V1_1) => return Ok(SchemaVersion::V1_1),
            _ => {}
        }
        match doctype.system_id.as_deref() {
            Some(id) if id == SYSTEM_ID_V1_0 || id.ends_with("walkmod-1.0.dtd") => {
                Ok(SchemaVersion::V1_0)
            }
            Some(id) if id == SYSTEM_ID_V1_1 || id.ends_with("walkmod-1.1.dtd") => {
                Ok(SchemaVersion::V1_1)
            }
            None if doctype.public_id.is_none() => Ok(SchemaVersion::V1_1),
            _ => Err(format!(
                "unknown walkmod DTD (public '{}', system '{}')",
                doctype.public_id.as_deref().unwrap_or_default(),
                doctype.system_id.as_deref().unwrap_or_default()
            )),
        }
    }

    /// The DOCTYPE written on persist.
    pub fn current_doctype() -> DocType {
        DocType {
            name: ROOT_ELEMENT.to_string(),
            public_id: Some(PUBLIC_ID_V1_1.to_string()),
            system_id: Some(SYSTEM_ID_V1_1.to_string()),
        }
    }

    fn rule(self, name: &str) -> Option<&'static Rule> {
        let specific = match self {
            SchemaVersion::V1_0 => V1_0,
            SchemaVersion::V1_1 => V1_1,
        };
        specific
            .iter()
            .chain(SHARED.iter())
            .find(|rule| rule.name == name)
    }

    /// Checks the whole tree. The message names the first offending element.
    pub fn validate(self, root: &Element) -> Result<(), String> {
        if root.name != ROOT_ELEMENT {
            return Err(format!(
                "root element is <{}>, expected <{ROOT_ELEMENT}>",
                root.name
            ));
        }
        self.validate_element(root)
    }

    fn validate_element(self, el: &Element) -> Result<(), String> {
        let rule = self
            .rule(&el.name)
            .ok_or_else(|| format!("unknown element <{}>", el.name))?;

        for required in rule.required {
            if el.attr(required).is_none() {
                return Err(format!("<{}> requires attribute '{required}'", el.name));
            }
        }
        for (key, _) in &el.attributes {
            let key = key.as_str();
            let known = rule.required.contains(&key) || rule.optional.contains(&key);
            if !known && !key.starts_with("xmlns") {
                return Err(format!("<{}> does not allow attribute '{key}'", el.name));
            }
        }
        if !rule.text && el.has_text() {
            return Err(format!("<{}> does not allow text content", el.name));
        }
        for child in el.elements() {
            if !rule.children.contains(&child.name.as_str()) {
                let message = format!("<{}> is not allowed inside <{}>", child.name, el.name);
                return Err(message);
            }
            self.validate_element(child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctype(public: Option<&str>, system: Option<&str>) -> DocType {
        DocType {
            name: "walkmod".to_string(),
            public_id: public.map(str::to_string),
            system_id: system.map(str::to_string),
        }
    }

    #[test]
    fn resolves_by_public_id() {
        assert_eq!(
            SchemaVersion::resolve(Some(&doctype(Some("-//WALKMOD//DTD"), None))),
            Ok(SchemaVersion::V1_0)
        );
        assert_eq!(
            SchemaVersion::resolve(Some(&doctype(Some("-//WALKMOD//DTD//1.0"), None))),
            Ok(SchemaVersion::V1_0)
        );
        assert_eq!(
            SchemaVersion::resolve(Some(&doctype(
                Some("-//WALKMOD//DTD//1.1"),
                Some(SYSTEM_ID_V1_0)
            ))),
            Ok(SchemaVersion::V1_1)
        );
    }

    #[test]
    fn falls_back_to_system_id() {
        assert_eq!(
            SchemaVersion::resolve(Some(&doctype(Some("-//OTHER"), Some(SYSTEM_ID_V1_0)))),
            Ok(SchemaVersion::V1_0)
        );
        assert_eq!(
            SchemaVersion::resolve(Some(&doctype(None, Some("dtd/walkmod-1.1.dtd")))),
            Ok(SchemaVersion::V1_1)
        );
        let other = doctype(Some("-//OTHER"), Some("x.dtd"));
        assert!(SchemaVersion::resolve(Some(&other)).is_err());
    }

    #[test]
    fn missing_doctype_means_latest() {
        assert_eq!(SchemaVersion::resolve(None), Ok(SchemaVersion::V1_1));
    }

    #[test]
    fn reader_requires_path() {
        let root = Element::new("walkmod").with_child(
            Element::new("chain")
                .with_attr("name", "c")
                .with_child(Element::new("reader")),
        );
        let err = SchemaVersion::V1_1.validate(&root).unwrap_err();
        assert_eq!(err, "<reader> requires attribute 'path'");
    }

    #[test]
    fn modules_are_unknown_to_1_0() {
        let root = Element::new("walkmod").with_child(Element::new("modules"));
        assert!(SchemaVersion::V1_1.validate(&root).is_ok());
        assert_eq!(
            SchemaVersion::V1_0.validate(&root).unwrap_err(),
            "<modules> is not allowed inside <walkmod>"
        );
    }

    #[test]
    fn rejects_unknown_attribute_and_text() {
        let root = Element::new("walkmod")
            .with_child(Element::new("plugins").with_attr("color", "red"));
        assert!(SchemaVersion::V1_1.validate(&root).is_err());

        let root = Element::new("walkmod").with_child(Element::new("plugins").with_text("x"));
        assert_eq!(
            SchemaVersion::V1_1.validate(&root).unwrap_err(),
            "<plugins> does not allow text content"
        );
    }
}
