use log::debug;
use mini_moka::sync::Cache;
use std::time::Duration;

/// Maximum cached replies
pub const MAX_CACHE_ENTRIES: u64 = 1_000;

/// In-process cache of model replies. Entries expire after the cache-wide
/// time to live and the least useful ones are evicted past `max_entries`.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Cache<String, String>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, MAX_CACHE_ENTRIES)
    }

    pub fn with_capacity(ttl: Duration, max_entries: u64) -> Self {
        let entries = Cache::builder().max_capacity(max_entries).time_to_live(ttl).build();
        Self { entries }
    }

    pub fn set(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let hit = self.entries.get(&key.to_string());
        if hit.is_none() {
            debug!("Cache miss ({} chars key)", key.len());
        }
        hit
    }

    pub fn delete(&self, key: &str) {
        self.entries.invalidate(&key.to_string());
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }
}

/// Key under which a prompt's reply is cached. Only surrounding whitespace
/// is ignored; the user's wording, case included, stays significant.
pub fn cache_key(prompt: &str) -> String {
    prompt.trim().to_string()
}
