//! The expansion engine: a depth-first walk over a template tree.
//!
//! Structural elements are copied (minus templating attributes) and their
//! children expanded in turn. Directive elements are decoded and run; they
//! decide alone what, if anything, takes their place in the output.

use std::rc::Rc;

use super::bindings::Bindings;
use super::cache::IncludeCache;
use super::directive::{ATTR, AttrSpec, Directive, INCLUDE, Resolution};
use super::loader::{SourceId, SourceLoader};
use super::{DEFAULT_INCLUDE_SELECTOR, TEMPLATE_NAMESPACE};
use crate::core::TemplateError;
use crate::selector;
use crate::tree::{Document, Element, Node};

/// Where expanded nodes go: the document itself or an element under
/// construction.
pub(crate) trait OutputParent {
    fn append_node(&mut self, node: Node);

    /// The element `attr` directives write to, if this parent is one.
    fn as_element_mut(&mut self) -> Option<&mut Element>;
}

impl OutputParent for Document {
    fn append_node(&mut self, node: Node) {
        self.append(node);
    }

    fn as_element_mut(&mut self) -> Option<&mut Element> {
        None
    }
}

impl OutputParent for Element {
    fn append_node(&mut self, node: Node) {
        self.append(node);
    }

    fn as_element_mut(&mut self) -> Option<&mut Element> {
        Some(self)
    }
}

/// State for one top-level expansion. Dropped when the call returns, which
/// discards the include cache and any partial output along with it.
pub(crate) struct Expansion<'a> {
    loader: &'a dyn SourceLoader,
    bindings: &'a Bindings,
    cache: IncludeCache,
    /// Sources currently being expanded, outermost first.
    stack: Vec<SourceId>,
}

impl<'a> Expansion<'a> {
    pub(crate) fn new(loader: &'a dyn SourceLoader, bindings: &'a Bindings) -> Self {
        Self {
            loader,
            bindings,
            cache: IncludeCache::new(),
            stack: Vec::new(),
        }
    }

    pub(crate) fn run(
        mut self,
        source: &SourceId,
        template: &Document,
    ) -> Result<Document, TemplateError> {
        tracing::debug!("Expanding {} with {} binding(s)", source, self.bindings.len());
        let output = self.expand_document(source, template)?;

        let (hits, misses) = self.cache.stats();
        tracing::debug!(
            "Expanded {}: {} include(s) cached, {} hit(s), {} miss(es), {:.1}% hit rate",
            source,
            self.cache.len(),
            hits,
            misses,
            self.cache.hit_rate()
        );
        Ok(output)
    }

    fn expand_document(
        &mut self,
        source: &SourceId,
        template: &Document,
    ) -> Result<Document, TemplateError> {
        self.stack.push(source.clone());
        let mut output = Document::new();
        let result = self.expand_children(source, template.children(), &mut output);
        self.stack.pop();
        result.map(|()| output)
    }

    fn expand_children(
        &mut self,
        source: &SourceId,
        nodes: &[Node],
        out: &mut dyn OutputParent,
    ) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Element(element) if element.is_in_namespace(TEMPLATE_NAMESPACE) => {
                    self.expand_directive(source, element, out)?;
                }
                Node::Element(element) => {
                    let mut copy = copy_structural(element);
                    self.expand_children(source, element.children(), &mut copy)?;
                    out.append_node(Node::Element(copy));
                }
                other => out.append_node(other.clone()),
            }
        }
        Ok(())
    }

    fn expand_directive(
        &mut self,
        source: &SourceId,
        element: &Element,
        out: &mut dyn OutputParent,
    ) -> Result<(), TemplateError> {
        let directive = Directive::decode(element, source)?;
        tracing::trace!("Running <{}> directive in {}", directive.name(), source);

        match directive {
            Directive::When {
                var,
                value,
            } => {
                if self.is_active(var, &value) {
                    self.expand_children(source, element.children(), out)?;
                }
            }
            Directive::Include {
                src,
                elements,
            } => self.include(source, &src, &elements, out)?,
            Directive::Text {
                var,
            } => {
                let text = var
                    .and_then(|name| self.bindings.get(name))
                    .map(ToString::to_string)
                    .unwrap_or_default();
                out.append_node(Node::Text(text));
            }
            Directive::Attr {
                name,
                value,
            } => {
                let (_, attr_name) = name.require(self.bindings, ATTR, source)?;
                let attr_value = value.resolve(self.bindings).value;
                let parent = out.as_element_mut().ok_or_else(|| {
                    TemplateError::AttrOutsideElement {
                        source_id: source.clone(),
                    }
                })?;
                match attr_value {
                    Some(attr_value) => parent.set_attribute(&attr_name, attr_value),
                    None => {
                        parent.remove_attribute(&attr_name);
                    }
                }
            }
            Directive::Dynamic {
                var,
            } => match var.and_then(|name| self.bindings.get(name)) {
                Some(value) => {
                    for node in value.to_nodes() {
                        out.append_node(node);
                    }
                }
                None => {
                    tracing::debug!(
                        "No binding for dynamic var {:?} in {}; nothing injected",
                        var.unwrap_or_default(),
                        source
                    );
                }
            },
        }
        Ok(())
    }

    fn is_active(&self, var: Option<&str>, value: &AttrSpec<'_>) -> bool {
        let Some(actual) = var.and_then(|name| self.bindings.get(name)) else {
            return false;
        };
        match value.resolve(self.bindings).value {
            Some(guard) => actual.to_string() == guard,
            None => actual.is_truthy(),
        }
    }

    fn include(
        &mut self,
        source: &SourceId,
        src: &AttrSpec<'_>,
        elements: &AttrSpec<'_>,
        out: &mut dyn OutputParent,
    ) -> Result<(), TemplateError> {
        let (resolution, raw_src) = src.require(self.bindings, INCLUDE, source)?;
        let target = match resolution {
            // bound values are already usable identifiers
            Resolution::Indirect => SourceId::from(raw_src.as_str()),
            Resolution::Direct => self.loader.resolve(source, &raw_src),
        };
        let selector = elements
            .resolve(self.bindings)
            .value
            .unwrap_or_else(|| DEFAULT_INCLUDE_SELECTOR.to_string());

        let included = self.expanded_include(source, &raw_src, target)?;
        for node in selector::select(&included, &selector)? {
            out.append_node(node.clone());
        }
        Ok(())
    }

    fn expanded_include(
        &mut self,
        from: &SourceId,
        src: &str,
        target: SourceId,
    ) -> Result<Rc<Document>, TemplateError> {
        if self.stack.contains(&target) {
            let mut chain = self.stack.clone();
            chain.push(target);
            return Err(TemplateError::CyclicInclude {
                chain,
            });
        }

        if let Some(document) = self.cache.get(&target) {
            tracing::debug!("Include cache hit for {}", target);
            return Ok(document);
        }
        tracing::debug!("Include cache miss for {}, loading", target);

        let template =
            self.loader.load(&target).map_err(|cause| TemplateError::UnresolvableInclude {
                src: src.to_string(),
                from: from.clone(),
                cause: Box::new(cause),
            })?;
        let expanded = Rc::new(self.expand_document(&target, &template)?);
        self.cache.insert(target, Rc::clone(&expanded));
        Ok(expanded)
    }
}

/// Shallow copy of a structural element with templating attributes removed.
fn copy_structural(element: &Element) -> Element {
    let mut copy = Element::new(element.name().clone());
    for attr in element.attributes() {
        let templating = attr.name.namespace() == Some(TEMPLATE_NAMESPACE)
            || attr.is_prefixed_namespace_declaration()
            || attr.value == TEMPLATE_NAMESPACE;
        if !templating {
            copy.push_attribute(attr.clone());
        }
    }
    copy
}
