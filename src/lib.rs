//! xmlskin - namespace-driven XML templating
//!
//! Templates are well-formed XML (typically XHTML) documents. Elements in the
//! `http://www.b13media.com/xemplate/1.0` namespace are directives; the rest
//! of the document is copied to the output unchanged. Expanding a template
//! with a set of variable bindings resolves every directive and produces a
//! plain document.
//!
//! ```xml
//! <html xmlns="http://www.w3.org/1999/xhtml"
//!       xmlns:t="http://www.b13media.com/xemplate/1.0">
//!   <head><title><t:text var="title"/></title></head>
//!   <body>
//!     <t:when var="isindex"><p>Welcome!</p></t:when>
//!     <t:include srcvar="content" elements="/html/body/*"/>
//!     <t:include src="footer.html"/>
//!   </body>
//! </html>
//! ```
//!
//! # Modules
//!
//! - [`tree`] - XML document model, parser and serializer
//! - [`selector`] - XPath-style node selection used by includes
//! - [`templating`] - Templates, bindings, directives and the expansion engine
//! - [`config`] - `xmlskin.toml` parsing
//! - [`cli`] - The `xmlskin` command line
//! - [`core`] - Error types and user-facing error reporting
//!
//! # Library usage
//!
//! ```rust,no_run
//! use xmlskin::templating::{Bindings, Template};
//!
//! let template = Template::load("templates/skin.html")?;
//! let page = template.expand(&Bindings::new().with("title", "Home"))?;
//! println!("{}", page.to_pretty_xml_string());
//! # Ok::<(), xmlskin::core::TemplateError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod selector;
pub mod templating;
pub mod tree;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
