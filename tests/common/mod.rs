//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use assert_cmd::Command;
use tempfile::TempDir;

/// Namespace declaration for the `t:` directive prefix.
pub const NS_DECL: &str = r#"xmlns:t="http://www.b13media.com/xemplate/1.0""#;

/// A throwaway project directory the `xmlskin` binary runs in.
pub struct TestProject {
    temp_dir: TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new().context("Failed to create temp dir")?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.path().join(relative)
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.join(relative);
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    /// `xmlskin` with the project as working directory and colors off.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("xmlskin").unwrap();
        cmd.current_dir(self.path()).env("NO_COLOR", "1").env_remove("RUST_LOG");
        cmd
    }
}
