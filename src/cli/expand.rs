//! `xmlskin expand`: expand one template into a document.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Args;
use colored::Colorize;

use crate::config::{DEFAULT_CONFIG_FILE, SkinConfig};
use crate::templating::{Bindings, Template};

/// Command to expand a template.
#[derive(Args, Debug)]
pub struct ExpandCommand {
    /// Template to expand
    ///
    /// Overrides `template` from the config file.
    #[arg(value_name = "TEMPLATE")]
    pub template: Option<PathBuf>,

    /// Config file to read instead of ./xmlskin.toml
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bind a string variable (repeatable)
    ///
    /// Overrides a binding of the same name from the config file.
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Write the document here instead of stdout
    ///
    /// Overrides `output` from the config file.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Indent element content
    #[arg(long)]
    pub pretty: bool,
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (name, value) =
        raw.split_once('=').ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

impl ExpandCommand {
    pub fn execute(self) -> Result<()> {
        let config = SkinConfig::discover(self.config.as_deref())?;

        let template_path = self.template.or_else(|| config.template.clone()).ok_or_else(|| {
            anyhow!("No template given: pass TEMPLATE or set `template` in {DEFAULT_CONFIG_FILE}")
        })?;
        let bindings = merge_bindings(config.to_bindings()?, self.vars);

        let template = Template::load(&template_path)
            .with_context(|| format!("Failed to load template {}", template_path.display()))?;
        let document = template
            .expand(&bindings)
            .with_context(|| format!("Failed to expand {}", template_path.display()))?;

        let mut text =
            if self.pretty { document.to_pretty_xml_string() } else { document.to_xml_string() };
        if !text.ends_with('\n') {
            text.push('\n');
        }

        match self.output.or(config.output) {
            Some(path) => {
                write_output(&path, &text)?;
                println!("{} {}", "Expanded".green().bold(), path.display());
            }
            None => print!("{text}"),
        }
        Ok(())
    }
}

/// Config bindings overlaid with `--var` values.
fn merge_bindings(mut bindings: Bindings, vars: Vec<(String, String)>) -> Bindings {
    for (name, value) in vars {
        if bindings.insert(name.clone(), value).is_some() {
            tracing::debug!("--var {} overrides the config binding", name);
        }
    }
    bindings
}

fn write_output(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write output file {}", path.display()))
}
