//! Minimal owned XML document model.
//!
//! # Design
//! `XmlDocument::parse` reads a string with `quick-xml` into a tree of
//! `XmlElement`s. Names are stored exactly as written (`ns:Point`) and
//! namespace declarations stay in the attribute list, so a freshly parsed
//! tree is a faithful copy of the input. `strip_namespaces` is a separate
//! rewrite pass that reduces every element and attribute name to its local
//! part and drops the declarations; path lookups are then plain name
//! comparisons.
//!
//! Parsing, stripping, text collection and dropping all walk the tree with an
//! explicit stack, so deeply nested input does not grow the call stack. The
//! derived `Clone`, `PartialEq` and `Debug` impls still recurse once per
//! level; keep them to trees of ordinary depth.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Errors produced while reading an XML document.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML syntax error: {0}")]
    Syntax(String),

    #[error("document has no root element")]
    MissingRoot,

    #[error("document has more than one root element")]
    MultipleRoots,

    /// The input ended while elements were still open.
    #[error("unexpected end of document inside <{0}>")]
    UnexpectedEof(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

impl XmlDocument {
    /// Parse `input` into a document.
    ///
    /// Text is trimmed and unescaped, CDATA sections become text, and
    /// comments, processing instructions and the doctype are dropped.
    pub fn parse(input: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(true);

        let mut open: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event().map_err(syntax)? {
                Event::Start(start) => {
                    if open.is_empty() && root.is_some() {
                        return Err(XmlError::MultipleRoots);
                    }
                    open.push(element_from_start(&start)?);
                }
                Event::Empty(start) => {
                    if open.is_empty() && root.is_some() {
                        return Err(XmlError::MultipleRoots);
                    }
                    let element = element_from_start(&start)?;
                    close_element(element, &mut open, &mut root);
                }
                Event::End(_) => {
                    let element = open
                        .pop()
                        .ok_or_else(|| XmlError::Syntax("closing tag without an open element".into()))?;
                    close_element(element, &mut open, &mut root);
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(syntax)?;
                    push_text(&mut open, &text);
                }
                Event::CData(data) => {
                    let data = String::from_utf8(data.into_inner().into_owned()).map_err(syntax)?;
                    push_text(&mut open, &data);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(mut unclosed) = open.pop() {
            return Err(XmlError::UnexpectedEof(std::mem::take(&mut unclosed.name)));
        }
        root.map(|root| XmlDocument { root })
            .ok_or(XmlError::MissingRoot)
    }

    /// Rewrite every element and attribute name in the document to its local
    /// part and remove all namespace declarations.
    pub fn strip_namespaces(&mut self) {
        self.root.strip_namespaces();
    }

    /// All elements reachable through `path`, in document order.
    ///
    /// The first segment names the root element; each further segment
    /// selects every child of that name under every element matched so far.
    pub fn select(&self, path: &[&str]) -> Vec<&XmlElement> {
        let Some((first, rest)) = path.split_first() else {
            return Vec::new();
        };
        if self.root.name != *first {
            return Vec::new();
        }
        let mut matched = vec![&self.root];
        for segment in rest {
            matched = matched
                .into_iter()
                .flat_map(|element| element.elements().filter(move |child| child.name == *segment))
                .collect();
        }
        matched
    }
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Child elements, skipping text nodes.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |element| element.name == name)
    }

    /// First child element called `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|element| element.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }

    /// Concatenated text of this element and all its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut pending: Vec<&XmlNode> = self.children.iter().rev().collect();
        while let Some(node) = pending.pop() {
            match node {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => pending.extend(element.children.iter().rev()),
            }
        }
        out
    }

    /// Namespace stripping for this element and its whole subtree.
    pub fn strip_namespaces(&mut self) {
        let mut pending: Vec<&mut XmlElement> = vec![self];
        while let Some(element) = pending.pop() {
            element.strip_own_namespace();
            pending.extend(element.children.iter_mut().filter_map(|node| match node {
                XmlNode::Element(child) => Some(child),
                XmlNode::Text(_) => None,
            }));
        }
    }

    fn strip_own_namespace(&mut self) {
        self.name = local_name(&self.name).to_string();

        let mut kept: Vec<XmlAttribute> = Vec::with_capacity(self.attributes.len());
        for attribute in self.attributes.drain(..) {
            if is_namespace_declaration(&attribute.name) {
                continue;
            }
            let name = local_name(&attribute.name).to_string();
            // `a:id` and `b:id` both become `id`; the first one wins.
            if kept.iter().any(|existing| existing.name == name) {
                continue;
            }
            kept.push(XmlAttribute {
                name,
                value: attribute.value,
            });
        }
        self.attributes = kept;
    }
}

impl Drop for XmlElement {
    // Flatten the subtree so dropping a deep document never recurses.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(node) = pending.pop() {
            if let XmlNode::Element(mut element) = node {
                pending.append(&mut element.children);
            }
        }
    }
}

/// The part of a qualified name after the prefix, or the whole name.
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

fn syntax(err: impl std::fmt::Display) -> XmlError {
    XmlError::Syntax(err.to_string())
}

fn utf8(bytes: &[u8]) -> Result<String, XmlError> {
    std::str::from_utf8(bytes).map(str::to_string).map_err(syntax)
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let mut element = XmlElement::new(utf8(start.name().as_ref())?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(syntax)?;
        element.attributes.push(XmlAttribute {
            name: utf8(attribute.key.as_ref())?,
            value: attribute.unescape_value().map_err(syntax)?.into_owned(),
        });
    }
    Ok(element)
}

fn close_element(element: XmlElement, open: &mut [XmlElement], root: &mut Option<XmlElement>) {
    match open.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => *root = Some(element),
    }
}

// Text outside the root element is ignored.
fn push_text(open: &mut [XmlElement], text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(parent) = open.last_mut() {
        parent.children.push(XmlNode::Text(text.to_string()));
    }
}
