//! Test utilities for xmlskin
//!
//! Helpers shared by unit tests and, through the `test-utils` feature, by
//! the integration tests:
//! - [`init_test_logging`] wires `tracing` output into the test harness
//! - [`TemplateFixture`] builds in-memory template sets
//! - [`ns`] wraps markup in an element declaring the `t:` template prefix
//!
//! # Example
//!
//! ```rust,no_run
//! use xmlskin::templating::Bindings;
//! use xmlskin::test_utils::TemplateFixture;
//!
//! let fixture = TemplateFixture::new()
//!     .source("page.xml", r#"<p xmlns:t="http://www.b13media.com/xemplate/1.0"><t:text var="x"/></p>"#);
//! let output = fixture.expand("page.xml", &Bindings::new().with("x", "hi")).unwrap();
//! assert_eq!(output, "<p>hi</p>");
//! ```

use std::sync::{Arc, Once};

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::core::TemplateError;
use crate::templating::{Bindings, InMemoryLoader, TEMPLATE_NAMESPACE, Template};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. `level` wins over `RUST_LOG`; with
/// neither, tests run silently.
///
/// ```bash
/// RUST_LOG=xmlskin=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Wrap `inner` in `<root>` with the `t:` prefix bound to the template
/// namespace.
pub fn ns(root: &str, inner: &str) -> String {
    format!(r#"<{root} xmlns:t="{TEMPLATE_NAMESPACE}">{inner}</{root}>"#)
}

/// A named set of in-memory sources with a shared loader.
#[derive(Debug, Default, Clone)]
pub struct TemplateFixture {
    loader: Arc<InMemoryLoader>,
}

impl TemplateFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source. Must be called before the loader is shared by
    /// [`template`](Self::template).
    pub fn source(mut self, id: &str, text: &str) -> Self {
        match Arc::get_mut(&mut self.loader) {
            Some(loader) => loader.add(id, text),
            None => panic!("add sources to a TemplateFixture before loading templates"),
        }
        self
    }

    pub fn loader(&self) -> &InMemoryLoader {
        &self.loader
    }

    pub fn template(&self, id: &str) -> Result<Template, TemplateError> {
        let loader: Arc<InMemoryLoader> = Arc::clone(&self.loader);
        Template::load_with(id, loader)
    }

    /// Load `id`, expand it and serialize the result compactly.
    pub fn expand(&self, id: &str, bindings: &Bindings) -> Result<String, TemplateError> {
        Ok(self.template(id)?.expand(bindings)?.to_xml_string())
    }
}
