//! Process-lifetime result cache keyed by content hash.

use std::collections::HashMap;
use std::sync::Mutex;

use sha2::{Digest, Sha256};

use crate::store::KnowledgeCard;

/// Hash of a raw submission, used to short-circuit reprocessing.
///
/// SHA-256 truncated to 16 hex characters.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    format!("{:x}", digest)[..16].to_string()
}

/// In-memory map from content hash to a finalized card list.
///
/// Lives for the process; no eviction. The mutex only guards the map
/// itself: two overlapping submissions of the same content can both
/// miss, both compute, and the later write wins.
#[derive(Default)]
pub struct ProcessingCache {
    entries: Mutex<HashMap<String, Vec<KnowledgeCard>>>,
}

impl ProcessingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a previously computed card list.
    pub fn get(&self, hash: &str) -> Option<Vec<KnowledgeCard>> {
        self.entries.lock().unwrap().get(hash).cloned()
    }

    /// Record the finalized cards for a content hash.
    pub fn insert(&self, hash: &str, cards: Vec<KnowledgeCard>) {
        self.entries.lock().unwrap().insert(hash.to_string(), cards);
    }
}
