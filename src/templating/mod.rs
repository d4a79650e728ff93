//! Namespace-driven XML templating.
//!
//! A template is an ordinary XML document in which some elements live in the
//! reserved [`TEMPLATE_NAMESPACE`]. Those elements are *directives*; every
//! other element is copied to the output as it is. Expanding a template with
//! a set of [`Bindings`] produces a new [`Document`] with every directive
//! resolved and removed.
//!
//! # Directives
//!
//! | Directive | Attributes | Effect |
//! |-----------|------------|--------|
//! | `when` | `var`, `value`/`valuevar` | expand children if the variable is truthy, or equals `value` |
//! | `include` | `src`/`srcvar`, `elements`/`elementsvar` | splice nodes selected from another expanded template |
//! | `text` | `var` | emit the variable as a text node |
//! | `attr` | `name`/`namevar`, `value`/`valuevar` | set an attribute on the enclosing output element |
//! | `dynamic` | `var` | inject the node(s) bound to the variable |
//!
//! Any attribute `X` that accepts an `Xvar` sibling is *indirect*: when the
//! variable named by `Xvar` is bound, its value replaces the literal `X`.
//!
//! # Includes
//!
//! An included source is itself a template, expanded with the same bindings
//! before `elements` (default `/*/*`, the children of the root element) is
//! applied to it. A literal `src` is resolved relative to the template that
//! contains the `include`; an indirect `src` is used as it is. Each source is
//! expanded at most once per [`Template::expand`] call, and a source that
//! includes itself, directly or through others, fails with
//! [`TemplateError::CyclicInclude`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use xmlskin::templating::{Bindings, InMemoryLoader, Template};
//!
//! let loader = InMemoryLoader::new()
//!     .with(
//!         "skin.html",
//!         r#"<html xmlns:t="http://www.b13media.com/xemplate/1.0">
//!   <title><t:text var="title"/></title>
//!   <t:when var="draft"><p class="banner">Draft</p></t:when>
//!   <t:include src="footer.html"/>
//! </html>"#,
//!     )
//!     .with("footer.html", "<footer><p>Built with xmlskin</p></footer>");
//!
//! let template = Template::load_with("skin.html", Arc::new(loader))?;
//! let page = template.expand(&Bindings::new().with("title", "Home").with("draft", false))?;
//!
//! assert_eq!(
//!     page.to_xml_string(),
//!     "<html>\n  <title>Home</title>\n  \n  <p>Built with xmlskin</p>\n</html>"
//! );
//! # Ok::<(), xmlskin::core::TemplateError>(())
//! ```

pub mod bindings;
mod cache;
pub mod directive;
mod engine;
pub mod loader;

#[cfg(test)]
mod engine_tests;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub use bindings::{Bindings, Value};
pub use directive::{Directive, Resolution, Resolved};
pub use loader::{FsLoader, InMemoryLoader, SourceId, SourceLoader};

use crate::core::TemplateError;
use crate::tree::Document;
use engine::Expansion;

/// Namespace URI that marks directive elements and attributes.
pub const TEMPLATE_NAMESPACE: &str = "http://www.b13media.com/xemplate/1.0";

/// Suffix of the attribute that names a variable holding an attribute's value.
pub const INDIRECT_SUFFIX: &str = "var";

/// Selector applied to included documents when `elements` is not given.
pub const DEFAULT_INCLUDE_SELECTOR: &str = "/*/*";

/// A parsed template together with where it came from.
///
/// The template is never modified by expansion, so one instance can be
/// expanded any number of times, from any number of threads.
#[derive(Clone)]
pub struct Template {
    document: Document,
    source: SourceId,
    loader: Arc<dyn SourceLoader + Send + Sync>,
}

impl Template {
    /// Load a template from the file system. Includes are read from disk too.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        Self::load_with(path.as_ref(), Arc::new(FsLoader))
    }

    /// Load a template through `loader`, which also serves its includes.
    pub fn load_with(
        source: impl Into<SourceId>,
        loader: Arc<dyn SourceLoader + Send + Sync>,
    ) -> Result<Self, TemplateError> {
        let source = source.into();
        let document = loader.load(&source)?;
        Ok(Self::from_document(document, source, loader))
    }

    /// Wrap an already parsed document. `source` anchors relative includes.
    pub fn from_document(
        document: Document,
        source: impl Into<SourceId>,
        loader: Arc<dyn SourceLoader + Send + Sync>,
    ) -> Self {
        Self {
            document,
            source: source.into(),
            loader,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Expand the template with `bindings` into a fresh document.
    ///
    /// Expansion is all-or-nothing: the first error aborts it and no partial
    /// output is returned.
    pub fn expand(&self, bindings: &Bindings) -> Result<Document, TemplateError> {
        Expansion::new(self.loader.as_ref(), bindings).run(&self.source, &self.document)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("source", &self.source)
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}
