//! Block-style YAML printer.
//!
//! `serde_yaml` picks its own quoting, so documents are printed by hand:
//! no `---` marker, plain keys, double-quoted string scalars, and sequence
//! items flush with their parent key.

use serde_yaml::{Mapping, Sequence, Value};

const STEP: usize = 2;

pub fn to_yaml(root: &Mapping) -> String {
    let mut out = String::new();
    if root.is_empty() {
        out.push_str("{}\n");
    } else {
        write_mapping(&mut out, root, 0);
    }
    out
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn write_mapping(out: &mut String, map: &Mapping, indent: usize) {
    let pad = " ".repeat(indent);
    for (key, value) in map {
        out.push_str(&pad);
        out.push_str(&key_text(key));
        out.push(':');
        match untag(value) {
            Value::Mapping(inner) if !inner.is_empty() => {
                out.push('\n');
                write_mapping(out, inner, indent + STEP);
            }
            Value::Sequence(items) if !items.is_empty() => {
                out.push('\n');
                write_sequence(out, items, indent);
            }
            other => {
                out.push(' ');
                out.push_str(&scalar_text(other));
                out.push('\n');
            }
        }
    }
}

fn write_sequence(out: &mut String, items: &Sequence, indent: usize) {
    let pad = " ".repeat(indent);
    for item in items {
        let mut block = String::new();
        match untag(item) {
            Value::Mapping(inner) if !inner.is_empty() => {
                write_mapping(&mut block, inner, indent + STEP);
            }
            Value::Sequence(nested) if !nested.is_empty() => {
                write_sequence(&mut block, nested, indent + STEP);
            }
            other => {
                out.push_str(&pad);
                out.push_str("- ");
                out.push_str(&scalar_text(other));
                out.push('\n');
                continue;
            }
        }
        // The nested block starts with `indent + STEP` spaces; the dash takes their place.
        out.push_str(&pad);
        out.push_str("- ");
        out.push_str(&block[indent + STEP..]);
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Mapping(_) => "{}".to_string(),
        Value::Sequence(_) => "[]".to_string(),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
    }
}

fn key_text(key: &Value) -> String {
    match untag(key) {
        Value::String(s) if is_plain_key(s) => s.clone(),
        other => scalar_text(other),
    }
}

fn is_plain_key(s: &str) -> bool {
    const RESERVED: &[&str] = &["true", "false", "null", "yes", "no", "on", "off", "~"];
    let Some(first) = s.chars().next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'))
        && !RESERVED.contains(&s.to_ascii_lowercase().as_str())
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
