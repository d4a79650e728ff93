//! `xmlskin select`: run a selector against a document.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::templating::{FsLoader, SourceId, SourceLoader};
use crate::tree::Node;

/// Command to print the nodes a selector matches.
#[derive(Args, Debug)]
pub struct SelectCommand {
    /// Document to query
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,

    /// Selector, e.g. `/*/*` or `//div[@id='content']`
    #[arg(value_name = "SELECTOR")]
    pub selector: String,

    /// Output format: text or json
    ///
    /// - `text`: one matched node per line, as markup
    /// - `json`: a JSON array of markup strings
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl SelectCommand {
    pub fn execute(self) -> Result<()> {
        let source = SourceId::from(self.document.as_path());
        let document = FsLoader
            .load(&source)
            .with_context(|| format!("Failed to load document {}", self.document.display()))?;

        let matched = document.select(&self.selector)?;
        tracing::debug!("{} node(s) matched {:?}", matched.len(), self.selector);

        match self.format {
            OutputFormat::Text => {
                if matched.is_empty() {
                    eprintln!("{}: no nodes matched {}", "warning".yellow(), self.selector);
                }
                for node in matched {
                    println!("{}", render(node));
                }
            }
            OutputFormat::Json => {
                let rendered: Vec<String> = matched.into_iter().map(render).collect();
                println!("{}", serde_json::to_string_pretty(&rendered)?);
            }
        }
        Ok(())
    }
}

fn render(node: &Node) -> String {
    node.to_xml_string()
}
