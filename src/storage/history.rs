//! Capped gallery of past generations.

use crate::error::{Result, StudioError};
use crate::image::GenerationResult;
use crate::storage::kv::KeyValueStore;
use std::collections::VecDeque;

/// Storage key for the serialized gallery.
pub const HISTORY_KEY: &str = "freeai_gallery";

/// Maximum number of results kept in the gallery.
pub const HISTORY_LIMIT: usize = 50;

/// Loads and saves the gallery as a whole.
pub trait HistoryStore: Send + Sync {
    /// Reads the saved entries, oldest first. Nothing saved reads as empty.
    fn load_history(&self) -> Result<Vec<GenerationResult>>;

    /// Replaces the saved entries.
    fn save_history(&self, entries: &[GenerationResult]) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> HistoryStore for T {
    fn load_history(&self) -> Result<Vec<GenerationResult>> {
        match self.get(HISTORY_KEY)? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| StudioError::Storage(format!("gallery is unreadable: {}", e))),
            None => Ok(Vec::new()),
        }
    }

    fn save_history(&self, entries: &[GenerationResult]) -> Result<()> {
        self.set(HISTORY_KEY, &serde_json::to_string(entries)?)
    }
}

/// Insertion-ordered results, oldest first, evicting from the front once
/// the limit is exceeded.
#[derive(Debug, Clone)]
pub struct Gallery {
    entries: VecDeque<GenerationResult>,
    limit: usize,
}

impl Default for Gallery {
    fn default() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }
}

impl Gallery {
    /// Creates an empty gallery holding [`HISTORY_LIMIT`] entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty gallery holding at most `limit` entries.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.min(HISTORY_LIMIT)),
            limit,
        }
    }

    /// Rebuilds a gallery from persisted entries, keeping the newest.
    pub fn from_entries(entries: Vec<GenerationResult>) -> Self {
        let mut gallery = Self::new();
        for entry in entries {
            gallery.record(entry);
        }
        gallery
    }

    /// Appends a result, evicting the oldest entries past the limit.
    pub fn record(&mut self, result: GenerationResult) {
        self.entries.push_back(result);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent result.
    pub fn latest(&self) -> Option<&GenerationResult> {
        self.entries.back()
    }

    /// Iterates oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &GenerationResult> {
        self.entries.iter()
    }

    /// Copies the entries out, oldest first.
    pub fn to_vec(&self) -> Vec<GenerationResult> {
        self.entries.iter().cloned().collect()
    }
}
