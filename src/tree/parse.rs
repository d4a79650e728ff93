//! Build a [`Document`] from `quick-xml`'s namespace-aware event stream.
//!
//! `quick-xml` does the lexing, well-formedness checks and namespace scope
//! tracking; the builder only stacks open elements and attaches finished
//! nodes to their parent.

use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use super::{Attribute, Document, Element, Node, QName, XmlDeclaration};
use crate::core::TemplateError;
use crate::templating::SourceId;

pub(crate) fn parse_document(text: &str, source: &SourceId) -> Result<Document, TemplateError> {
    let built = TreeBuilder::new(text, source).build()?;

    match built.root_offsets.as_slice() {
        [_] => Ok(Document::from_children(built.nodes)),
        [] => Err(parse_error(source, text, text.len(), "document has no root element")),
        [_, second, ..] => {
            Err(parse_error(source, text, *second, "document has more than one root element"))
        }
    }
}

pub(crate) fn parse_fragment(text: &str, source: &SourceId) -> Result<Vec<Node>, TemplateError> {
    TreeBuilder::new(text, source).build().map(|built| built.nodes)
}

struct Built {
    nodes: Vec<Node>,
    /// Byte offset of each top-level element's start tag
    root_offsets: Vec<usize>,
}

/// 1-based line of byte offset `position` in `text`.
fn line_at(text: &str, position: usize) -> usize {
    let end = position.min(text.len());
    text.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

fn parse_error(
    source: &SourceId,
    text: &str,
    position: usize,
    message: impl Into<String>,
) -> TemplateError {
    TemplateError::Parse {
        source_id: source.clone(),
        line: line_at(text, position),
        message: message.into(),
    }
}

struct TreeBuilder<'a> {
    reader: NsReader<&'a [u8]>,
    text: &'a str,
    source: &'a SourceId,
    open: Vec<Element>,
    top_level: Vec<Node>,
}

impl<'a> TreeBuilder<'a> {
    fn new(text: &'a str, source: &'a SourceId) -> Self {
        Self {
            reader: NsReader::from_str(text),
            text,
            source,
            open: Vec::new(),
            top_level: Vec::new(),
        }
    }

    fn error(&self, message: impl Into<String>) -> TemplateError {
        let position = self.reader.buffer_position() as usize;
        parse_error(self.source, self.text, position, message)
    }

    fn build(mut self) -> Result<Built, TemplateError> {
        let mut root_offsets = Vec::new();
        loop {
            let offset = self.reader.buffer_position() as usize;
            let event = self.reader.read_event().map_err(|e| self.error(e.to_string()))?;
            if self.open.is_empty() && matches!(event, Event::Start(_) | Event::Empty(_)) {
                root_offsets.push(offset);
            }
            match event {
                Event::Start(start) => {
                    let element = self.open_element(&start)?;
                    self.open.push(element);
                }
                Event::Empty(start) => {
                    let element = self.open_element(&start)?;
                    self.attach(Node::Element(element));
                }
                Event::End(_) => {
                    // quick-xml already rejects mismatched end tags
                    let element =
                        self.open.pop().ok_or_else(|| self.error("unexpected closing tag"))?;
                    self.attach(Node::Element(element));
                }
                Event::Text(text) => {
                    let value = text.unescape().map_err(|e| self.error(e.to_string()))?;
                    self.attach(Node::Text(value.into_owned()));
                }
                Event::CData(data) => {
                    let value = self.utf8(&data)?;
                    self.attach(Node::CData(value));
                }
                Event::Comment(comment) => {
                    let value = self.utf8(&comment)?;
                    self.attach(Node::Comment(value));
                }
                Event::PI(pi) => {
                    let mut raw = self.utf8(pi.target())?;
                    raw.push_str(&self.utf8(pi.content())?);
                    self.attach(Node::ProcessingInstruction(raw));
                }
                Event::DocType(doctype) => {
                    let value = self.utf8(&doctype)?;
                    self.attach(Node::DocType(value.trim().to_string()));
                }
                Event::Decl(decl) => {
                    let declaration = self.declaration(&decl)?;
                    self.attach(Node::Declaration(declaration));
                }
                Event::Eof => break,
            }
        }

        if let Some(unclosed) = self.open.last() {
            return Err(self.error(format!("unclosed element <{}>", unclosed.name())));
        }

        Ok(Built {
            nodes: self.top_level,
            root_offsets,
        })
    }

    fn attach(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.append(node),
            None => self.top_level.push(node),
        }
    }

    fn utf8(&self, bytes: &[u8]) -> Result<String, TemplateError> {
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| self.error(format!("invalid UTF-8: {e}")))
    }

    fn namespace_of(&self, resolved: ResolveResult<'_>) -> Result<Option<String>, TemplateError> {
        match resolved {
            ResolveResult::Bound(namespace) => self.utf8(namespace.as_ref()).map(Some),
            ResolveResult::Unbound => Ok(None),
            ResolveResult::Unknown(prefix) => Err(self.error(format!(
                "undeclared namespace prefix '{}'",
                String::from_utf8_lossy(&prefix)
            ))),
        }
    }

    fn open_element(&self, start: &BytesStart<'_>) -> Result<Element, TemplateError> {
        let raw_name = start.name();
        let prefix = match raw_name.prefix() {
            Some(prefix) => Some(self.utf8(prefix.as_ref())?),
            None => None,
        };
        let local = self.utf8(raw_name.local_name().as_ref())?;
        let (resolved, _) = self.reader.resolve_element(raw_name);
        let namespace = self.namespace_of(resolved)?;

        let mut element = Element::new(QName {
            prefix,
            local,
            namespace,
        });

        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.error(e.to_string()))?;
            let key = attr.key;
            let prefix = match key.prefix() {
                Some(prefix) => Some(self.utf8(prefix.as_ref())?),
                None => None,
            };
            let local = self.utf8(key.local_name().as_ref())?;
            // Declarations live in their own reserved space and never match
            // the template namespace by name.
            let namespace = if key.as_namespace_binding().is_some() {
                None
            } else {
                let (resolved, _) = self.reader.resolve_attribute(key);
                self.namespace_of(resolved)?
            };
            let value = attr.unescape_value().map_err(|e| self.error(e.to_string()))?;

            element.push_attribute(Attribute::new(
                QName {
                    prefix,
                    local,
                    namespace,
                },
                value.into_owned(),
            ));
        }

        Ok(element)
    }

    fn declaration(&self, decl: &BytesDecl<'_>) -> Result<XmlDeclaration, TemplateError> {
        let version = decl.version().map_err(|e| self.error(e.to_string()))?;
        let encoding = match decl.encoding() {
            Some(encoding) => Some(self.utf8(&encoding.map_err(|e| self.error(e.to_string()))?)?),
            None => None,
        };
        let standalone = match decl.standalone() {
            Some(standalone) => {
                Some(self.utf8(&standalone.map_err(|e| self.error(e.to_string()))?)?)
            }
            None => None,
        };

        Ok(XmlDeclaration {
            version: self.utf8(&version)?,
            encoding,
            standalone,
        })
    }
}
