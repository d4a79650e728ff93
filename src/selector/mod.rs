//! Path-query selection over a [`Document`].
//!
//! Supports the subset of XPath 1.0 location paths that include selectors
//! need: absolute and relative paths, `//`, `.`, `..`, the node tests `*`,
//! `name`, `prefix:name`, `prefix:*`, `text()`, `comment()` and `node()`,
//! predicates `[n]`, `[last()]`, `[@a]`, `[@a='v']`, `[@a!='v']`, `[child]`
//! and `[child='v']`, and unions joined with `|`.
//!
//! An unprefixed name test matches the element's local name in any
//! namespace, so `/html/body` works on XHTML documents without binding a
//! prefix. Results come back deduplicated and in document order.

mod parser;

use crate::core::TemplateError;
use crate::tree::{Document, Element, Node};

/// Position of a node as child indices from the document down.
type NodePath = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Selector {
    paths: Vec<LocationPath>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LocationPath {
    #[allow(dead_code)] // relative paths also start at the document node
    absolute: bool,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

impl Step {
    fn new(axis: Axis, test: NodeTest) -> Self {
        Self {
            axis,
            test,
            predicates: Vec::new(),
        }
    }

    /// The implicit step that `//` stands for.
    fn descendant_or_self() -> Self {
        Self::new(Axis::DescendantOrSelf, NodeTest::AnyNode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    DescendantOrSelf,
    Parent,
    SelfNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    AnyElement,
    Name(String),
    Qualified { prefix: String, local: String },
    PrefixWildcard(String),
    Text,
    Comment,
    AnyNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    Last,
    HasAttribute(String),
    AttributeEquals { name: String, value: String, negate: bool },
    HasChild(String),
    ChildEquals { name: String, value: String },
}

/// Select the nodes of `document` matched by `selector`, in document order.
///
/// Selecting the document node itself (`/`) yields its top-level children.
pub fn select<'d>(document: &'d Document, selector: &str) -> Result<Vec<&'d Node>, TemplateError> {
    let parsed = parser::parse(selector)?;
    let paths = parsed.evaluate(document);

    let mut nodes = Vec::with_capacity(paths.len());
    for path in paths {
        if path.is_empty() {
            nodes.extend(document.children());
        } else if let Some(node) = node_at(document, &path) {
            nodes.push(node);
        }
    }
    tracing::trace!("Selector {:?} matched {} node(s)", selector, nodes.len());
    Ok(nodes)
}

impl Selector {
    fn evaluate(&self, document: &Document) -> Vec<NodePath> {
        let mut matched: Vec<NodePath> =
            self.paths.iter().flat_map(|path| path.evaluate(document)).collect();
        // lexicographic order on child indices is document order
        matched.sort();
        matched.dedup();
        matched
    }
}

impl LocationPath {
    fn evaluate(&self, document: &Document) -> Vec<NodePath> {
        // Relative paths are evaluated from the document node as well.
        let mut context: Vec<NodePath> = vec![Vec::new()];

        for step in &self.steps {
            let mut next = Vec::new();
            for path in &context {
                next.extend(step.evaluate(document, path));
            }
            next.sort();
            next.dedup();
            context = next;
        }
        context
    }
}

impl Step {
    fn evaluate(&self, document: &Document, context: &NodePath) -> Vec<NodePath> {
        let candidates: Vec<NodePath> = match self.axis {
            Axis::Child => children_of(document, context)
                .iter()
                .enumerate()
                .filter(|(_, child)| self.test.matches(child))
                .map(|(index, _)| child_path(context, index))
                .collect(),
            Axis::DescendantOrSelf => {
                let mut found = Vec::new();
                if self.test.matches_path(document, context) {
                    found.push(context.clone());
                }
                collect_descendants(document, context, &self.test, &mut found);
                found
            }
            Axis::Parent => match context.split_last() {
                Some((_, parent)) if self.test.matches_path(document, parent) => {
                    vec![parent.to_vec()]
                }
                _ => Vec::new(),
            },
            Axis::SelfNode => {
                if self.test.matches_path(document, context) {
                    vec![context.clone()]
                } else {
                    Vec::new()
                }
            }
        };

        self.predicates.iter().fold(candidates, |candidates, predicate| {
            let size = candidates.len();
            candidates
                .into_iter()
                .enumerate()
                .filter(|(index, path)| predicate.holds(document, path, index + 1, size))
                .map(|(_, path)| path)
                .collect()
        })
    }
}

impl NodeTest {
    fn matches(&self, node: &Node) -> bool {
        match (self, node) {
            (NodeTest::AnyNode, _) => true,
            (NodeTest::Text, Node::Text(_) | Node::CData(_)) => true,
            (NodeTest::Comment, Node::Comment(_)) => true,
            (NodeTest::AnyElement, Node::Element(_)) => true,
            (NodeTest::Name(name), Node::Element(element)) => element.name().local() == name,
            (
                NodeTest::Qualified {
                    prefix,
                    local,
                },
                Node::Element(element),
            ) => {
                element.name().prefix() == Some(prefix.as_str()) && element.name().local() == local
            }
            (NodeTest::PrefixWildcard(prefix), Node::Element(element)) => {
                element.name().prefix() == Some(prefix.as_str())
            }
            _ => false,
        }
    }

    /// Like [`matches`](Self::matches), but the empty path stands for the
    /// document node, which only `node()` matches.
    fn matches_path(&self, document: &Document, path: &[usize]) -> bool {
        match node_at(document, path) {
            Some(node) => self.matches(node),
            None => path.is_empty() && *self == NodeTest::AnyNode,
        }
    }
}

impl Predicate {
    fn holds(&self, document: &Document, path: &[usize], position: usize, size: usize) -> bool {
        match self {
            Predicate::Position(wanted) => position == *wanted,
            Predicate::Last => position == size,
            other => match node_at(document, path).and_then(Node::as_element) {
                Some(element) => other.holds_on(element),
                None => false,
            },
        }
    }

    fn holds_on(&self, element: &Element) -> bool {
        match self {
            Predicate::HasAttribute(name) => element.attribute_qualified(name).is_some(),
            Predicate::AttributeEquals {
                name,
                value,
                negate,
            } => match element.attribute_qualified(name) {
                Some(actual) => (actual == value) != *negate,
                None => false,
            },
            Predicate::HasChild(name) => element.element_children().any(|c| name_matches(c, name)),
            Predicate::ChildEquals {
                name,
                value,
            } => element.element_children().any(|c| name_matches(c, name) && c.text() == *value),
            Predicate::Position(_) | Predicate::Last => false,
        }
    }
}

fn name_matches(element: &Element, name: &str) -> bool {
    if name.contains(':') {
        element.name().qualified() == name
    } else {
        element.name().local() == name
    }
}

fn child_path(parent: &[usize], index: usize) -> NodePath {
    let mut path = Vec::with_capacity(parent.len() + 1);
    path.extend_from_slice(parent);
    path.push(index);
    path
}

fn children_of<'d>(document: &'d Document, path: &[usize]) -> &'d [Node] {
    if path.is_empty() {
        return document.children();
    }
    match node_at(document, path) {
        Some(Node::Element(element)) => element.children(),
        _ => &[],
    }
}

fn node_at<'d>(document: &'d Document, path: &[usize]) -> Option<&'d Node> {
    let (first, rest) = path.split_first()?;
    let mut node = document.children().get(*first)?;
    for index in rest {
        node = node.as_element()?.children().get(*index)?;
    }
    Some(node)
}

fn collect_descendants(
    document: &Document,
    path: &[usize],
    test: &NodeTest,
    found: &mut Vec<NodePath>,
) {
    for (index, child) in children_of(document, path).iter().enumerate() {
        let here = child_path(path, index);
        if test.matches(child) {
            found.push(here.clone());
        }
        collect_descendants(document, &here, test, found);
    }
}
