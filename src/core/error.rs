//! Error handling for xmlskin
//!
//! Two types cover every failure:
//! - [`TemplateError`] - what went wrong while parsing, selecting or expanding
//! - [`ErrorContext`] - a user-facing wrapper adding details and a suggestion
//!
//! Library code returns [`TemplateError`] directly. The command line layer
//! works with [`anyhow::Error`], adds context with `with_context`, and turns
//! whatever reaches `main` into an [`ErrorContext`] through
//! [`user_friendly_error`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use xmlskin::core::{TemplateError, user_friendly_error};
//!
//! let error = TemplateError::CyclicInclude {
//!     chain: vec!["a.xml".into(), "b.xml".into(), "a.xml".into()],
//! };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display(); // colored, on stderr
//! ```

use std::fmt;

use colored::Colorize;
use thiserror::Error;

use crate::templating::SourceId;
use crate::templating::directive::DIRECTIVE_NAMES;

/// Everything that can go wrong while working with templates.
///
/// Expansion stops at the first error; there is no partial output.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// A template, include or markup binding is not well-formed XML
    #[error("{source_id}:{line}: {message}")]
    Parse {
        source_id: SourceId,
        /// 1-based line of the offending markup
        line: usize,
        message: String,
    },

    /// An element in the template namespace is not a known directive
    #[error("Unknown directive <{name}> in {source_id}")]
    UnknownDirective {
        name: String,
        source_id: SourceId,
        /// Closest known directive name, if any is close enough
        suggestion: Option<String>,
    },

    /// An include source could not be loaded or parsed
    #[error("Cannot include '{src}' from {from}")]
    UnresolvableInclude {
        /// `src` as written or bound
        src: String,
        from: SourceId,
        #[source]
        cause: Box<TemplateError>,
    },

    /// A `*var` attribute names a variable that is not bound and the
    /// directive has no literal to fall back on
    #[error(
        "<{directive}> in {source_id}: variable '{variable}' named by '{attribute}var' is not bound"
    )]
    MissingIndirectVariable {
        directive: &'static str,
        attribute: &'static str,
        variable: String,
        source_id: SourceId,
    },

    /// A directive lacks an attribute it cannot work without
    #[error("<{directive}> in {source_id} requires a '{attribute}' or '{attribute}var' attribute")]
    MissingAttribute {
        directive: &'static str,
        attribute: &'static str,
        source_id: SourceId,
    },

    /// An `attr` directive has no enclosing output element to modify
    #[error("<attr> in {source_id} has no enclosing element")]
    AttrOutsideElement { source_id: SourceId },

    /// A source includes itself, directly or through other sources
    #[error("Cyclic include: {}", format_chain(chain))]
    CyclicInclude { chain: Vec<SourceId> },

    /// A selector string is not valid
    #[error("Invalid selector '{selector}' at position {position}: {message}")]
    InvalidSelector { selector: String, position: usize, message: String },

    /// Reading a source failed
    #[error("Cannot read {source_id}")]
    Io {
        source_id: SourceId,
        #[source]
        cause: std::io::Error,
    },
}

fn format_chain(chain: &[SourceId]) -> String {
    chain.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> ")
}

impl TemplateError {
    /// Render the error together with its chain of causes, one per line.
    ///
    /// Nested include failures read from the outermost include inwards, so
    /// the last line names the root problem.
    pub fn format_with_context(&self) -> String {
        let mut message = self.to_string();
        let mut current: &dyn std::error::Error = self;
        while let Some(cause) = current.source() {
            message.push_str(&format!("\n  caused by: {cause}"));
            current = cause;
        }
        message
    }

    /// The innermost template error behind nested include failures.
    pub fn root_cause(&self) -> &TemplateError {
        match self {
            TemplateError::UnresolvableInclude {
                cause,
                ..
            } => cause.root_cause(),
            other => other,
        }
    }
}

/// A user-facing error: the message plus optional details and suggestion.
#[derive(Debug)]
pub struct ErrorContext {
    /// The error message, including its causes
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly format with contextual suggestions
///
/// Walks the error chain looking for a [`TemplateError`]; anything else is
/// reported with its full `anyhow` chain and no suggestion.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let mut current: &dyn std::error::Error = error.as_ref();
    loop {
        if let Some(template_error) = current.downcast_ref::<TemplateError>() {
            return create_error_context(&error, template_error);
        }
        if let Some(io_error) = current.downcast_ref::<std::io::Error>() {
            let context = ErrorContext::new(format!("{error:#}"));
            return match io_error.kind() {
                std::io::ErrorKind::NotFound => {
                    context.with_suggestion("Check that the path exists")
                }
                std::io::ErrorKind::PermissionDenied => {
                    context.with_suggestion("Check the file permissions")
                }
                _ => context,
            };
        }
        match current.source() {
            Some(source) => current = source,
            None => break,
        }
    }

    ErrorContext::new(format!("{error:#}"))
}

fn create_error_context(error: &anyhow::Error, template_error: &TemplateError) -> ErrorContext {
    let context = ErrorContext::new(format!("{error:#}"));
    match template_error.root_cause() {
        TemplateError::Parse {
            source_id,
            line,
            ..
        } => context
            .with_details(format!("{source_id} is not well-formed XML near line {line}"))
            .with_suggestion("Check for unclosed elements and undeclared namespace prefixes"),
        TemplateError::UnknownDirective {
            name,
            suggestion,
            ..
        } => {
            let context = context.with_details(format!(
                "Known directives are: {}",
                DIRECTIVE_NAMES.join(", ")
            ));
            match suggestion {
                Some(known) => context.with_suggestion(format!("Did you mean <{known}> instead of <{name}>?")),
                None => context,
            }
        }
        TemplateError::MissingIndirectVariable {
            variable,
            attribute,
            ..
        } => context.with_suggestion(format!(
            "Bind '{variable}' (for example with --var {variable}=...) or give a literal '{attribute}' attribute"
        )),
        TemplateError::MissingAttribute {
            attribute,
            ..
        } => context.with_suggestion(format!("Add a '{attribute}' attribute to the directive")),
        TemplateError::AttrOutsideElement {
            ..
        } => context.with_suggestion("Move the <attr> directive inside the element it should modify"),
        TemplateError::CyclicInclude {
            chain,
        } => context
            .with_details(format!("Include chain: {}", format_chain(chain)))
            .with_suggestion("Remove one of the includes to break the cycle"),
        TemplateError::InvalidSelector {
            ..
        } => context.with_suggestion(
            "Selectors are XPath location paths such as /*/* or //div[@id='content']",
        ),
        TemplateError::Io {
            cause,
            ..
        } if cause.kind() == std::io::ErrorKind::NotFound => {
            context.with_suggestion("Check that the path exists and is spelled correctly")
        }
        TemplateError::Io {
            ..
        }
        | TemplateError::UnresolvableInclude {
            ..
        } => context,
    }
}
