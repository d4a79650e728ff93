//! Command-line interface for xmlskin.
//!
//! # Commands
//!
//! - `expand` - Expand a template with bindings from `xmlskin.toml` and `--var`
//! - `select` - Print the nodes of a document matched by a selector
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug logging
//! - `--quiet` - Only log errors
//! - `--no-color` - Disable colored output (also honors `NO_COLOR`)
//!
//! `RUST_LOG`, when set, takes precedence over `--verbose` and `--quiet`.
//!
//! # Examples
//!
//! ```bash
//! # Expand using xmlskin.toml in the current directory
//! xmlskin expand
//!
//! # Expand a specific template with extra bindings
//! xmlskin expand templates/skin.html --var title=Home --var isindex=yes --pretty
//!
//! # Check what an include selector picks from a file
//! xmlskin select content/about.html "//div[@id='content']/*"
//! ```

mod expand;
mod select;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub use expand::ExpandCommand;
pub use select::{OutputFormat, SelectCommand};

/// Runtime settings derived from the global flags.
///
/// Kept separate from [`Cli`] so tests can run commands without touching
/// global logging state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Default `tracing` filter when `RUST_LOG` is not set
    pub log_level: String,

    /// Disable ANSI colors in error and status output
    pub no_color: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            no_color: false,
        }
    }
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global `tracing` subscriber and color override.
    ///
    /// Logs go to stderr so they never mix with expanded output. Calling
    /// this more than once is harmless; later subscribers are ignored.
    pub fn apply(&self) {
        if self.no_color {
            colored::control::set_override(false);
        }

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(!self.no_color)
            .try_init();
    }
}

/// Main CLI structure for xmlskin.
#[derive(Parser, Debug)]
#[command(
    name = "xmlskin",
    about = "Namespace-driven XML templating",
    version,
    long_about = "xmlskin expands XML and XHTML templates whose directives live in the \
                  http://www.b13media.com/xemplate/1.0 namespace."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Expand a template and write the resulting document.
    ///
    /// Bindings come from the `[bindings]` table of the config file, then
    /// from `--var` flags, which win on conflicts.
    Expand(ExpandCommand),

    /// Print every node of a document matched by a selector.
    ///
    /// Useful for checking `elements` selectors before using them in an
    /// include.
    Select(SelectCommand),
}

impl Cli {
    /// Execute the CLI with configuration built from the global flags.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config)
    }

    /// Build a [`CliConfig`] from the parsed CLI arguments.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: log_level.to_string(),
            no_color: self.no_color || std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()),
        }
    }

    pub fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.apply();

        match self.command {
            Commands::Expand(cmd) => cmd.execute(),
            Commands::Select(cmd) => cmd.execute(),
        }
    }
}
