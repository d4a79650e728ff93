//! Markup serialization for the tree.
//!
//! Escaping uses `quick-xml`'s escape helpers: attribute values get the full
//! set, text content only `<`, `>` and `&`. Compact output reproduces the
//! parsed text exactly, so unchanged input round-trips byte for byte modulo
//! escaping choices.

use quick_xml::escape::{escape, partial_escape};

use super::{Document, Element, Node, XmlDeclaration};

const INDENT: &str = "  ";

pub(crate) fn document_to_string(document: &Document, pretty: bool) -> String {
    let mut writer = MarkupWriter::new(pretty);
    writer.write_top_level(document.children());
    writer.out
}

pub(crate) fn element_to_string(element: &Element) -> String {
    let mut writer = MarkupWriter::new(false);
    writer.write_element(element, 0);
    writer.out
}

pub(crate) fn node_to_string(node: &Node) -> String {
    let mut writer = MarkupWriter::new(false);
    writer.write_node(node, 0);
    writer.out
}

fn is_blank(node: &Node) -> bool {
    matches!(node, Node::Text(text) if text.trim().is_empty())
}

/// Mixed content keeps its whitespace even when pretty printing.
fn has_significant_text(element: &Element) -> bool {
    element.children().iter().any(|child| match child {
        Node::Text(text) => !text.trim().is_empty(),
        Node::CData(_) => true,
        _ => false,
    })
}

struct MarkupWriter {
    out: String,
    pretty: bool,
}

impl MarkupWriter {
    fn new(pretty: bool) -> Self {
        Self {
            out: String::new(),
            pretty,
        }
    }

    fn newline(&mut self, depth: usize) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
    }

    fn write_top_level(&mut self, nodes: &[Node]) {
        for node in nodes {
            if self.pretty {
                if is_blank(node) {
                    continue;
                }
                self.newline(0);
            }
            self.write_node(node, 0);
        }
        if self.pretty && !self.out.is_empty() {
            self.out.push('\n');
        }
    }

    fn write_node(&mut self, node: &Node, depth: usize) {
        match node {
            Node::Element(element) => self.write_element(element, depth),
            Node::Text(text) => self.out.push_str(&partial_escape(text.as_str())),
            Node::CData(data) => {
                self.out.push_str("<![CDATA[");
                self.out.push_str(data);
                self.out.push_str("]]>");
            }
            Node::Comment(comment) => {
                self.out.push_str("<!--");
                self.out.push_str(comment);
                self.out.push_str("-->");
            }
            Node::ProcessingInstruction(raw) => {
                self.out.push_str("<?");
                self.out.push_str(raw);
                self.out.push_str("?>");
            }
            Node::DocType(raw) => {
                self.out.push_str("<!DOCTYPE ");
                self.out.push_str(raw);
                self.out.push('>');
            }
            Node::Declaration(declaration) => self.write_declaration(declaration),
        }
    }

    fn write_declaration(&mut self, declaration: &XmlDeclaration) {
        self.out.push_str("<?xml version=\"");
        self.out.push_str(&declaration.version);
        self.out.push('"');
        if let Some(encoding) = &declaration.encoding {
            self.out.push_str(" encoding=\"");
            self.out.push_str(encoding);
            self.out.push('"');
        }
        if let Some(standalone) = &declaration.standalone {
            self.out.push_str(" standalone=\"");
            self.out.push_str(standalone);
            self.out.push('"');
        }
        self.out.push_str("?>");
    }

    fn write_element(&mut self, element: &Element, depth: usize) {
        let name = element.name().qualified();
        self.out.push('<');
        self.out.push_str(&name);
        for attr in element.attributes() {
            self.out.push(' ');
            self.out.push_str(&attr.name.qualified());
            self.out.push_str("=\"");
            self.out.push_str(&escape(attr.value.as_str()));
            self.out.push('"');
        }

        if element.children().is_empty() {
            self.out.push_str("/>");
            return;
        }
        self.out.push('>');

        if self.pretty && !has_significant_text(element) {
            let mut wrote_child = false;
            for child in element.children().iter().filter(|child| !is_blank(child)) {
                self.newline(depth + 1);
                self.write_node(child, depth + 1);
                wrote_child = true;
            }
            if wrote_child {
                self.newline(depth);
            }
        } else {
            // inline: no indentation below this point
            let pretty = std::mem::replace(&mut self.pretty, false);
            for child in element.children() {
                self.write_node(child, depth + 1);
            }
            self.pretty = pretty;
        }

        self.out.push_str("</");
        self.out.push_str(&name);
        self.out.push('>');
    }
}
