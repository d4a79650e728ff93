//! Directive decoding and attribute resolution.
//!
//! A directive element is decoded into a [`Directive`] before it is run.
//! Each variant carries the attribute schema for that directive, so the
//! engine never looks attributes up by string at expansion time.

use strsim::levenshtein;

use super::bindings::Bindings;
use super::{INDIRECT_SUFFIX, SourceId};
use crate::core::TemplateError;
use crate::tree::Element;

pub const WHEN: &str = "when";
pub const INCLUDE: &str = "include";
pub const TEXT: &str = "text";
pub const ATTR: &str = "attr";
pub const DYNAMIC: &str = "dynamic";

pub const DIRECTIVE_NAMES: [&str; 5] = [WHEN, INCLUDE, TEXT, ATTR, DYNAMIC];

const SRC: &str = "src";
const ELEMENTS: &str = "elements";
const VAR: &str = "var";
const NAME: &str = "name";
const VALUE: &str = "value";

/// Which form of an attribute supplied its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Written literally on the directive.
    Direct,
    /// Looked up through the variable named by the `<attr>var` sibling.
    Indirect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub source: Resolution,
    pub value: Option<String>,
}

/// The literal and indirect forms of one directive attribute, as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrSpec<'t> {
    pub name: &'static str,
    pub direct: Option<&'t str>,
    pub indirect: Option<&'t str>,
}

impl<'t> AttrSpec<'t> {
    pub fn read(element: &'t Element, name: &'static str) -> Self {
        Self {
            name,
            direct: element.attribute(name),
            indirect: element.attribute(&format!("{name}{INDIRECT_SUFFIX}")),
        }
    }

    /// Indirect form first; only an unbound variable falls through to the
    /// literal form.
    pub fn resolve(&self, bindings: &Bindings) -> Resolved {
        if let Some(value) = self.indirect.and_then(|variable| bindings.get(variable)) {
            return Resolved {
                source: Resolution::Indirect,
                value: Some(value.to_string()),
            };
        }
        Resolved {
            source: Resolution::Direct,
            value: self.direct.map(str::to_string),
        }
    }

    /// Like [`resolve`](Self::resolve) but a missing value is an error.
    pub fn require(
        &self,
        bindings: &Bindings,
        directive: &'static str,
        source_id: &SourceId,
    ) -> Result<(Resolution, String), TemplateError> {
        let resolved = self.resolve(bindings);
        match resolved.value {
            Some(value) => Ok((resolved.source, value)),
            None => Err(match self.indirect {
                Some(variable) => TemplateError::MissingIndirectVariable {
                    directive,
                    attribute: self.name,
                    variable: variable.to_string(),
                    source_id: source_id.clone(),
                },
                None => TemplateError::MissingAttribute {
                    directive,
                    attribute: self.name,
                    source_id: source_id.clone(),
                },
            }),
        }
    }
}

/// A decoded directive element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<'t> {
    /// Expand the children only if the guard holds.
    When { var: Option<&'t str>, value: AttrSpec<'t> },
    /// Splice selected nodes of another expanded template.
    Include { src: AttrSpec<'t>, elements: AttrSpec<'t> },
    /// Emit the variable as a text node.
    Text { var: Option<&'t str> },
    /// Set an attribute on the enclosing output element.
    Attr { name: AttrSpec<'t>, value: AttrSpec<'t> },
    /// Inject the node(s) bound to the variable.
    Dynamic { var: Option<&'t str> },
}

impl<'t> Directive<'t> {
    /// Decode a directive-namespaced element by its local name.
    pub fn decode(element: &'t Element, source_id: &SourceId) -> Result<Self, TemplateError> {
        let directive = match element.name().local() {
            WHEN => Directive::When {
                var: element.attribute(VAR),
                value: AttrSpec::read(element, VALUE),
            },
            INCLUDE => Directive::Include {
                src: AttrSpec::read(element, SRC),
                elements: AttrSpec::read(element, ELEMENTS),
            },
            TEXT => Directive::Text {
                var: element.attribute(VAR),
            },
            ATTR => Directive::Attr {
                name: AttrSpec::read(element, NAME),
                value: AttrSpec::read(element, VALUE),
            },
            DYNAMIC => Directive::Dynamic {
                var: element.attribute(VAR),
            },
            unknown => {
                return Err(TemplateError::UnknownDirective {
                    name: unknown.to_string(),
                    source_id: source_id.clone(),
                    suggestion: suggest_directive(unknown),
                });
            }
        };
        Ok(directive)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Directive::When { .. } => WHEN,
            Directive::Include { .. } => INCLUDE,
            Directive::Text { .. } => TEXT,
            Directive::Attr { .. } => ATTR,
            Directive::Dynamic { .. } => DYNAMIC,
        }
    }
}

/// Closest known directive within half the length of `unknown`.
fn suggest_directive(unknown: &str) -> Option<String> {
    let threshold = unknown.len().max(2) / 2;
    DIRECTIVE_NAMES
        .iter()
        .map(|candidate| (levenshtein(unknown, candidate), *candidate))
        .filter(|(distance, _)| *distance <= threshold)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate.to_string())
}
