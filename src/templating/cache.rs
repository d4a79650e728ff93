//! Include cache for a single expansion.
//!
//! This module provides caching so that a source included from several
//! places is loaded and expanded only once per [`expand`] call.
//!
//! [`expand`]: super::Template::expand

use std::collections::HashMap;
use std::rc::Rc;

use super::SourceId;
use crate::tree::Document;

/// Cache of expanded include documents.
///
/// Keys are resolved source ids. The cache does not include bindings in the
/// key because every include in one expansion sees the same bindings. It
/// lives for the duration of one top-level expansion and is dropped with it,
/// so edits to included files are always picked up by the next call.
#[derive(Debug, Default)]
pub(crate) struct IncludeCache {
    /// Map from source id to the expanded document
    cache: HashMap<SourceId, Rc<Document>>,
    /// Cache statistics
    hits: usize,
    misses: usize,
}

impl IncludeCache {
    /// Create a new empty include cache
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Get the expanded document if available
    pub(crate) fn get(&mut self, key: &SourceId) -> Option<Rc<Document>> {
        if let Some(document) = self.cache.get(key) {
            self.hits += 1;
            Some(Rc::clone(document))
        } else {
            self.misses += 1;
            None
        }
    }

    /// Insert an expanded document into the cache
    pub(crate) fn insert(&mut self, key: SourceId, document: Rc<Document>) {
        self.cache.insert(key, document);
    }

    pub(crate) fn len(&self) -> usize {
        self.cache.len()
    }

    /// Get cache statistics as `(hits, misses)`
    pub(crate) fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    /// Calculate hit rate as a percentage
    pub(crate) fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}
