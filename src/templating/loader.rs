//! Template sources: identifiers, path resolution and loading.
//!
//! The engine never touches the file system directly. Everything it needs
//! from the outside world goes through [`SourceLoader`]: turning a relative
//! `src` into a [`SourceId`], and turning a [`SourceId`] into a parsed
//! [`Document`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::core::TemplateError;
use crate::tree::Document;

/// Identifies one template source. Include caching and cycle detection key
/// on this value, so two spellings of the same path must normalize to the
/// same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(PathBuf);

impl SourceId {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(normalize(&path.into()))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Resolve `relative` against the directory containing this source.
    /// Absolute paths are taken as they are.
    pub fn join_relative(&self, relative: &str) -> SourceId {
        let relative = Path::new(relative);
        if relative.is_absolute() {
            return SourceId::new(relative);
        }
        let base = self.0.parent().unwrap_or_else(|| Path::new(""));
        SourceId::new(base.join(relative))
    }
}

/// Lexical normalization: drops `.` and folds `dir/..` without touching the
/// file system.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else if !matches!(
                    out.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_))
                ) {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        SourceId::new(value)
    }
}

impl From<String> for SourceId {
    fn from(value: String) -> Self {
        SourceId::new(value)
    }
}

impl From<&Path> for SourceId {
    fn from(value: &Path) -> Self {
        SourceId::new(value)
    }
}

impl From<PathBuf> for SourceId {
    fn from(value: PathBuf) -> Self {
        SourceId::new(value)
    }
}

/// Parsing and source-resolution services consumed by the engine.
pub trait SourceLoader {
    /// Read and parse the source named by `source`.
    fn load(&self, source: &SourceId) -> Result<Document, TemplateError>;

    /// Turn a literal `src` written in template `base` into a loadable id.
    fn resolve(&self, base: &SourceId, relative: &str) -> SourceId {
        base.join_relative(relative)
    }
}

/// Loads sources from the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, source: &SourceId) -> Result<Document, TemplateError> {
        tracing::debug!("Reading template source {}", source);
        let text = std::fs::read_to_string(source.path()).map_err(|cause| TemplateError::Io {
            source_id: source.clone(),
            cause,
        })?;
        Document::parse(&text, source)
    }
}

/// Serves sources from memory and counts how often each one is loaded.
///
/// Useful for embedding templates in a binary and for checking include
/// caching in tests.
#[derive(Debug, Default)]
pub struct InMemoryLoader {
    sources: HashMap<SourceId, String>,
    loads: Mutex<HashMap<SourceId, usize>>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, source: impl Into<SourceId>, text: impl Into<String>) {
        self.sources.insert(source.into(), text.into());
    }

    #[must_use]
    pub fn with(mut self, source: impl Into<SourceId>, text: impl Into<String>) -> Self {
        self.add(source, text);
        self
    }

    /// Number of successful and failed load attempts for `source`.
    pub fn load_count(&self, source: impl Into<SourceId>) -> usize {
        self.counters().get(&source.into()).copied().unwrap_or(0)
    }

    pub fn total_loads(&self) -> usize {
        self.counters().values().sum()
    }

    // A panic elsewhere cannot leave a count half-written, so poisoning is ignored.
    fn counters(&self) -> MutexGuard<'_, HashMap<SourceId, usize>> {
        self.loads.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SourceLoader for InMemoryLoader {
    fn load(&self, source: &SourceId) -> Result<Document, TemplateError> {
        *self.counters().entry(source.clone()).or_insert(0) += 1;
        let text = self.sources.get(source).ok_or_else(|| TemplateError::Io {
            source_id: source.clone(),
            cause: std::io::Error::new(std::io::ErrorKind::NotFound, "no such in-memory source"),
        })?;
        Document::parse(text, source)
    }
}
