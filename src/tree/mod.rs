//! Owned XML tree used as both template input and expansion output.
//!
//! Parsing is delegated to `quick-xml` (see [`parse`]); this module only
//! holds the resulting nodes. Every node is owned by exactly one parent, so
//! putting a node in a second place always goes through [`Clone`], which is a
//! deep copy of the whole subtree.
//!
//! # Example
//!
//! ```rust
//! use xmlskin::templating::SourceId;
//! use xmlskin::tree::Document;
//!
//! let doc = Document::parse("<page><title>Hi</title></page>", &SourceId::from("page.xml"))?;
//! let root = doc.root_element().expect("parsed documents have a root");
//! assert_eq!(root.name().local(), "page");
//! assert_eq!(root.text(), "Hi");
//! # Ok::<(), xmlskin::core::TemplateError>(())
//! ```

pub mod parse;
pub mod write;

use std::fmt;

use crate::core::TemplateError;
use crate::templating::SourceId;

/// A possibly prefixed name with its resolved namespace URI.
///
/// The prefix is kept as written so output keeps the author's spelling; the
/// namespace is what directive detection compares against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    prefix: Option<String>,
    local: String,
    namespace: Option<String>,
}

impl QName {
    /// Name without prefix or namespace.
    pub fn local_only(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
            namespace: None,
        }
    }

    /// Split `prefix:local` as written, with no namespace attached.
    pub fn parse(qualified: &str) -> Self {
        match qualified.split_once(':') {
            Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => Self {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
                namespace: None,
            },
            _ => Self::local_only(qualified),
        }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The name as it appears in markup, `prefix:local` or `local`.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local),
            None => self.local.clone(),
        }
    }

    /// Textual comparison on the written name, ignoring namespaces.
    fn same_spelling(&self, other: &QName) -> bool {
        self.prefix == other.prefix && self.local == other.local
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

impl Attribute {
    pub fn new(name: QName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }

    /// `xmlns:foo="..."` style declaration. The default `xmlns="..."` is not
    /// prefixed and does not count.
    pub fn is_prefixed_namespace_declaration(&self) -> bool {
        self.name.prefix() == Some("xmlns")
    }
}

/// A single node in a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    /// Raw `target content` between `<?` and `?>`.
    ProcessingInstruction(String),
    /// Raw doctype body between `<!DOCTYPE` and `>`.
    DocType(String),
    Declaration(XmlDeclaration),
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    /// XPath-style string value: concatenated descendant text for elements,
    /// the content itself for character data.
    pub fn string_value(&self) -> String {
        match self {
            Node::Element(element) => element.text(),
            Node::Text(text) | Node::CData(text) => text.clone(),
            Node::Comment(text) | Node::ProcessingInstruction(text) => text.clone(),
            Node::DocType(_) | Node::Declaration(_) => String::new(),
        }
    }

    /// Serialized markup for this node alone.
    pub fn to_xml_string(&self) -> String {
        write::node_to_string(self)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml_string())
    }
}

/// The `<?xml ...?>` prolog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: QName,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Whether the element's resolved namespace is exactly `uri`.
    pub fn is_in_namespace(&self, uri: &str) -> bool {
        self.name.namespace() == Some(uri)
    }

    /// Value of the unprefixed attribute `local`.
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.prefix().is_none() && attr.name.local() == local)
            .map(|attr| attr.value.as_str())
    }

    /// Value of the attribute written as `qualified` (`id`, `xml:lang`, ...).
    pub fn attribute_qualified(&self, qualified: &str) -> Option<&str> {
        let wanted = QName::parse(qualified);
        self.attributes
            .iter()
            .find(|attr| attr.name.same_spelling(&wanted))
            .map(|attr| attr.value.as_str())
    }

    /// Append an attribute without checking for an existing one. Used while
    /// copying attributes that are already known to be distinct.
    pub fn push_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    /// Set `qualified` to `value`, replacing an attribute of the same written
    /// name in place or appending a new one.
    pub fn set_attribute(&mut self, qualified: &str, value: impl Into<String>) {
        let name = QName::parse(qualified);
        let value = value.into();
        match self.attributes.iter_mut().find(|attr| attr.name.same_spelling(&name)) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute::new(name, value)),
        }
    }

    /// Remove the attribute written as `qualified`, returning its old value.
    pub fn remove_attribute(&mut self, qualified: &str) -> Option<String> {
        let name = QName::parse(qualified);
        let index = self.attributes.iter().position(|attr| attr.name.same_spelling(&name))?;
        Some(self.attributes.remove(index).value)
    }

    pub fn append(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    /// Concatenated text of all descendant text and CDATA nodes.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    pub fn to_xml_string(&self) -> String {
        write::element_to_string(self)
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) | Node::CData(text) => out.push_str(text),
            Node::Element(element) => collect_text(&element.children, out),
            _ => {}
        }
    }
}

/// A whole document: prolog nodes plus exactly one root element when parsed
/// from source, or whatever expansion produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    children: Vec<Node>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a complete document. Fails with [`TemplateError::Parse`] when
    /// the markup is malformed or does not have exactly one root element.
    pub fn parse(text: &str, source: &SourceId) -> Result<Self, TemplateError> {
        parse::parse_document(text, source)
    }

    /// Parse a sequence of sibling nodes, e.g. a markup snippet from a
    /// bindings file.
    pub fn parse_fragment(text: &str, source: &SourceId) -> Result<Vec<Node>, TemplateError> {
        parse::parse_fragment(text, source)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn append(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    pub fn root_element(&self) -> Option<&Element> {
        self.children.iter().find_map(Node::as_element)
    }

    /// Nodes matching `selector`, in document order.
    pub fn select(&self, selector: &str) -> Result<Vec<&Node>, TemplateError> {
        crate::selector::select(self, selector)
    }

    pub fn to_xml_string(&self) -> String {
        write::document_to_string(self, false)
    }

    pub fn to_pretty_xml_string(&self) -> String {
        write::document_to_string(self, true)
    }

    pub(crate) fn from_children(children: Vec<Node>) -> Self {
        Self { children }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml_string())
    }
}
