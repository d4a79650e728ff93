//! Core types shared by every layer of xmlskin
//!
//! At the moment this is error handling:
//! - [`TemplateError`] for precise handling in library code
//! - [`ErrorContext`] and [`user_friendly_error`] for reporting at the CLI
//!
//! # Examples
//!
//! ```rust
//! use xmlskin::core::{TemplateError, user_friendly_error};
//!
//! fn expand() -> anyhow::Result<()> {
//!     Err(TemplateError::AttrOutsideElement {
//!         source_id: "page.xml".into(),
//!     }
//!     .into())
//! }
//!
//! if let Err(e) = expand() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.suggestion.is_some());
//! }
//! ```

pub mod error;

pub use error::{ErrorContext, TemplateError, user_friendly_error};
