//! Minimal owned DOM over `quick-xml` events.
//!
//! Whitespace-only text is dropped on load; the printer re-indents with four
//! spaces, so round-tripping normalizes layout but keeps comments.

use anyhow::{Context, anyhow, bail};
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};

const INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true when the stored value changed.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) if *existing == value => false,
            Some((_, existing)) => {
                *existing = value;
                true
            }
            None => {
                self.attributes.push((key.to_string(), value));
                true
            }
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn children_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a Element> + use<'a, 'n> {
        self.elements().filter(move |el| el.name == name)
    }

    pub fn children_named_mut<'a, 'n>(
        &'a mut self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a mut Element> + use<'a, 'n> {
        self.elements_mut().filter(move |el| el.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|el| el.name == name)
    }

    /// Indices into `children` of the elements called `name`.
    pub fn positions(&self, name: &str) -> Vec<usize> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node {
                Node::Element(el) if el.name == name => Some(i),
                _ => None,
            })
            .collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions(name).into_iter().next()
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn insert(&mut self, index: usize, child: Element) {
        let index = index.min(self.children.len());
        self.children.insert(index, Node::Element(child));
    }

    /// First child called `name`, inserted empty at `index(self)` when missing.
    pub fn ensure_child_at(
        &mut self,
        name: &str,
        index: impl FnOnce(&Element) -> usize,
    ) -> &mut Element {
        let at = match self.position(name) {
            Some(at) => at,
            None => {
                let at = index(self).min(self.children.len());
                self.children.insert(at, Node::Element(Element::new(name)));
                at
            }
        };
        match &mut self.children[at] {
            Node::Element(el) => el,
            _ => unreachable!("positions only point at elements"),
        }
    }

    /// Removes the elements matching `pred` and returns how many went.
    pub fn remove_elements(&mut self, mut pred: impl FnMut(&Element) -> bool) -> usize {
        let before = self.children.len();
        self.children.retain(|node| match node {
            Node::Element(el) => !pred(el),
            _ => true,
        });
        before - self.children.len()
    }

    pub fn remove_named(&mut self, name: &str) -> usize {
        self.remove_elements(|el| el.name == name)
    }

    /// Concatenated, trimmed text content.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let Node::Text(t) = node {
                out.push_str(t);
            }
        }
        out.trim().to_string()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.retain(|node| !matches!(node, Node::Text(_)));
        let text = text.into();
        if !text.is_empty() {
            self.children.insert(0, Node::Text(text));
        }
    }

    pub fn has_text(&self) -> bool {
        self.children
            .iter()
            .any(|node| matches!(node, Node::Text(t) if !t.trim().is_empty()))
    }

    pub fn has_elements(&self) -> bool {
        self.elements().next().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocType {
    pub name: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

impl DocType {
    /// Parses the inside of `<!DOCTYPE ...>`. Internal subsets are ignored.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let raw = raw.split('[').next().unwrap_or_default().trim();
        let (name, rest) = raw
            .split_once(char::is_whitespace)
            .unwrap_or((raw, ""));
        if name.is_empty() {
            bail!("DOCTYPE without a root element name");
        }
        let rest = rest.trim_start();

        let mut doctype = DocType {
            name: name.to_string(),
            public_id: None,
            system_id: None,
        };
        if let Some(ids) = rest.strip_prefix("PUBLIC") {
            let mut literals = quoted_literals(ids)?;
            doctype.public_id = literals.next();
            doctype.system_id = literals.next();
        } else if let Some(ids) = rest.strip_prefix("SYSTEM") {
            doctype.system_id = quoted_literals(ids)?.next();
        }
        Ok(doctype)
    }

    pub fn render(&self) -> String {
        let mut out = format!("<!DOCTYPE {}", self.name);
        match (&self.public_id, &self.system_id) {
            (Some(public), Some(system)) => {
                out.push_str(&format!(" PUBLIC \"{public}\" \"{system}\""));
            }
            (Some(public), None) => out.push_str(&format!(" PUBLIC \"{public}\"")),
            (None, Some(system)) => out.push_str(&format!(" SYSTEM \"{system}\"")),
            (None, None) => {}
        }
        out.push('>');
        out
    }
}

fn quoted_literals(mut raw: &str) -> anyhow::Result<std::vec::IntoIter<String>> {
    let mut literals = Vec::new();
    loop {
        raw = raw.trim_start();
        let Some(quote) = raw.chars().next() else {
            break;
        };
        if quote != '"' && quote != '\'' {
            bail!("unexpected '{quote}' in DOCTYPE identifiers");
        }
        let body = &raw[1..];
        let end = body
            .find(quote)
            .ok_or_else(|| anyhow!("unterminated literal in DOCTYPE"))?;
        literals.push(body[..end].to_string());
        raw = &body[end + 1..];
    }
    Ok(literals.into_iter())
}

/// A parsed document: optional DOCTYPE, comments ahead of the root, the root.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlTree {
    pub doctype: Option<DocType>,
    pub prolog: Vec<String>,
    pub root: Element,
}

pub fn parse(src: &str) -> anyhow::Result<XmlTree> {
    let mut reader = Reader::from_str(src);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut doctype = None;
    let mut prolog = Vec::new();

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("at byte {}", reader.buffer_position()))?;
        match event {
            Event::Start(start) => stack.push(open_element(&start)?),
            Event::Empty(start) => {
                let el = open_element(&start)?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::End(_) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| anyhow!("closing tag without an open element"))?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::Text(text) => {
                let text = text.unescape()?.into_owned();
                if text.trim().is_empty() {
                    continue;
                }
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(text)),
                    None => bail!("text outside of the root element"),
                }
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data).into_owned();
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(text)),
                    None => bail!("CDATA outside of the root element"),
                }
            }
            Event::Comment(comment) => {
                let text = String::from_utf8_lossy(&comment).into_owned();
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Comment(text)),
                    None if root.is_none() => prolog.push(text),
                    None => {}
                }
            }
            Event::DocType(raw) => {
                let raw = String::from_utf8_lossy(&raw).into_owned();
                doctype = Some(DocType::parse(&raw)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        bail!("element <{}> is never closed", open.name);
    }
    let root = root.ok_or_else(|| anyhow!("document has no root element"))?;
    Ok(XmlTree {
        doctype,
        prolog,
        root,
    })
}

fn open_element(start: &BytesStart<'_>) -> anyhow::Result<Element> {
    let mut el = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        el.attributes.push((key, value));
    }
    Ok(el)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) -> anyhow::Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.push(el),
        None if root.is_none() => *root = Some(el),
        None => bail!("more than one root element"),
    }
    Ok(())
}

/// Prints a document with the XML declaration, `doctype`, and four-space indentation.
pub fn write(doctype: &DocType, prolog: &[String], root: &Element) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&doctype.render());
    out.push('\n');
    for comment in prolog {
        out.push_str(&format!("<!--{comment}-->\n"));
    }
    write_element(&mut out, root, 0);
    out
}

fn write_element(out: &mut String, el: &Element, depth: usize) {
    let pad = INDENT.repeat(depth);
    out.push_str(&pad);
    out.push('<');
    out.push_str(&el.name);
    for (key, value) in &el.attributes {
        out.push_str(&format!(" {key}=\"{}\"", escape(value.as_str())));
    }

    if el.children.is_empty() {
        out.push_str("/>\n");
        return;
    }

    if el.children.iter().all(|node| matches!(node, Node::Text(_))) {
        out.push('>');
        out.push_str(&escape(el.text().as_str()));
        out.push_str(&format!("</{}>\n", el.name));
        return;
    }

    out.push_str(">\n");
    let inner = INDENT.repeat(depth + 1);
    for node in &el.children {
        match node {
            Node::Element(child) => write_element(out, child, depth + 1),
            Node::Text(text) => {
                out.push_str(&inner);
                out.push_str(&escape(text.trim()));
                out.push('\n');
            }
            Node::Comment(comment) => {
                out.push_str(&format!("{inner}<!--{comment}-->\n"));
            }
        }
    }
    out.push_str(&pad);
    out.push_str(&format!("</{}>\n", el.name));
}
