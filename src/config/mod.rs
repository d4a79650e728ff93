//! Configuration for the `xmlskin` command line
//!
//! An optional `xmlskin.toml` names the template, the output file and a set of
//! bindings, so a page can be rebuilt without repeating `--var` flags.
//!
//! ```toml
//! template = "templates/skin.html"
//! output = "output/index.html"
//!
//! [bindings]
//! release = "1.0"
//! isindex = true
//! count = 3
//!
//! [bindings.sidebar]
//! markup = "<ul><li>a</li><li>b</li></ul>"
//! ```
//!
//! Scalars become scalar bindings. A table with a `markup` key is parsed as
//! an XML fragment and bound as a node sequence, ready for `dynamic`.
//! Relative `template` and `output` paths are taken relative to the
//! directory holding the config file.
//!
//! # Modules
//!
//! - `parser` - Generic TOML parsing utilities with error context

mod parser;

pub use parser::parse_config;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::templating::{Bindings, SourceId, Value};
use crate::tree::Document;

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "xmlskin.toml";

/// Parsed `xmlskin.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkinConfig {
    /// Template to expand
    #[serde(default)]
    pub template: Option<PathBuf>,

    /// Where to write the expanded document; stdout when absent
    #[serde(default)]
    pub output: Option<PathBuf>,

    #[serde(default)]
    pub bindings: BTreeMap<String, BindingValue>,
}

/// One `[bindings]` entry as written in TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BindingValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Markup { markup: String },
}

impl SkinConfig {
    /// Read `path` and anchor relative paths at its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config: SkinConfig = parse_config(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.template = config.template.map(|template| base.join(template));
        config.output = config.output.map(|output| base.join(output));
        tracing::debug!(
            "Loaded {} with {} binding(s)",
            path.display(),
            config.bindings.len()
        );
        Ok(config)
    }

    /// Load the config at `path`, or `xmlskin.toml` in the working directory
    /// when it exists. No file at all gives the empty config.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Convert the `[bindings]` table, parsing markup entries.
    pub fn to_bindings(&self) -> Result<Bindings> {
        let mut bindings = Bindings::new();
        for (name, value) in &self.bindings {
            let value = match value {
                BindingValue::Bool(value) => Value::Bool(*value),
                BindingValue::Integer(value) => Value::Integer(*value),
                BindingValue::Float(value) => Value::Float(*value),
                BindingValue::String(value) => Value::String(value.clone()),
                BindingValue::Markup {
                    markup,
                } => {
                    let source = SourceId::from(format!("bindings.{name}"));
                    let nodes = Document::parse_fragment(markup, &source)
                        .with_context(|| format!("Invalid markup in binding '{name}'"))?;
                    Value::Nodes(nodes)
                }
            };
            bindings.insert(name.clone(), value);
        }
        Ok(bindings)
    }
}
