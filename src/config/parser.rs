//! Generic configuration parsing utilities.
//!
//! Reads a TOML file into any `DeserializeOwned` type, attaching the file
//! path to read and parse failures.
//!
//! ```rust,no_run
//! use xmlskin::config::parse_config;
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Deserialize)]
//! struct MyConfig {
//!     template: String,
//! }
//!
//! # fn example() -> anyhow::Result<()> {
//! let config: MyConfig = parse_config(Path::new("xmlskin.toml"))?;
//! println!("Template: {}", config.template);
//! # Ok(())
//! # }
//! ```
//!
//! Example error output:
//! ```text
//! Failed to parse config file: /path/to/xmlskin.toml
//! Caused by:
//!     invalid type: string "yes", expected a boolean
//! ```

use anyhow::{Context, Result};
use std::path::Path;

/// Parse the TOML file at `path` into `T`.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}
