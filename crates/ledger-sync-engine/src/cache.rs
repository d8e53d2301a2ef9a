//! Run-scoped cache of parent collections.

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

/// Bounded cache owned by one run and dropped with it.
///
/// Only paths listed as admissible are stored (the parents of dependent
/// entities); the oldest entry is evicted once `capacity` is reached.
#[derive(Debug)]
pub struct RunCache {
    capacity: usize,
    admissible: Vec<&'static str>,
    entries: VecDeque<(String, Arc<Vec<Value>>)>,
    hits: usize,
}

impl RunCache {
    pub fn new(capacity: usize, admissible: Vec<&'static str>) -> Self {
        Self {
            capacity,
            admissible,
            entries: VecDeque::new(),
            hits: 0,
        }
    }

    /// A cache that stores nothing.
    pub fn disabled() -> Self {
        Self::new(0, Vec::new())
    }

    pub fn admits(&self, path: &str) -> bool {
        self.capacity > 0 && self.admissible.iter().any(|candidate| *candidate == path)
    }

    pub fn get(&mut self, path: &str) -> Option<Arc<Vec<Value>>> {
        let hit = self
            .entries
            .iter()
            .find(|(key, _)| key == path)
            .map(|(_, items)| Arc::clone(items));
        if hit.is_some() {
            self.hits += 1;
        }
        hit
    }

    /// Store `items` under `path` if the path is admissible.
    pub fn insert(&mut self, path: &str, items: Arc<Vec<Value>>) {
        if !self.admits(path) {
            return;
        }
        self.entries.retain(|(key, _)| key != path);
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((path.to_string(), items));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}
