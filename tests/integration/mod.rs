//! Integration test suite for xmlskin
//!
//! End-to-end tests that drive the `xmlskin` binary in temporary project
//! directories, plus library-level tests built on `xmlskin::test_utils`.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **expand**: template expansion, config files and `--var` bindings
//! - **select**: the `select` debugging command
//! - **error_scenarios**: error reporting and exit codes
//! - **library**: the `Template` API shared across threads and include caching

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod error_scenarios;
mod expand;
mod library;
mod select;
