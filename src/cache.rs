use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

pub(crate) const MAX_CACHE_ENTRIES: u64 = 1_000;

/// Response bodies keyed by request URL. Entries expire passively after `ttl`
/// and at most [`MAX_CACHE_ENTRIES`] are held; a zero ttl disables caching.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    entries: Option<Cache<String, Arc<str>>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        if ttl.is_zero() {
            return Self::disabled();
        }
        let entries = Cache::builder()
            .max_capacity(MAX_CACHE_ENTRIES)
            .time_to_live(ttl)
            .build();
        Self {
            entries: Some(entries),
        }
    }

    pub fn disabled() -> Self {
        Self { entries: None }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<str>> {
        self.entries.as_ref()?.get(key).await
    }

    pub async fn insert(&self, key: String, body: Arc<str>) {
        if let Some(entries) = &self.entries {
            entries.insert(key, body).await;
        }
    }

    /// Entry count after pending evictions have been applied.
    pub async fn len(&self) -> u64 {
        match &self.entries {
            Some(entries) => {
                entries.run_pending_tasks().await;
                entries.entry_count()
            }
            None => 0,
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
