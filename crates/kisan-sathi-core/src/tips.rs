//! Local tip cache: a bounded, append-only log of generated tips.
//!
//! The whole collection lives under one key as a JSON array, oldest
//! first. Every save rewrites the array and drops entries from the front
//! once it grows past the cap. Unreadable data reads as an empty cache.

use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::models::Tip;
use crate::store::{KvStore, Keyspace};

/// Default number of tips retained.
pub const MAX_TIPS: usize = 50;

pub struct TipCache {
    store: Arc<dyn KvStore>,
    key: String,
    max_tips: usize,
}

impl TipCache {
    pub fn new(store: Arc<dyn KvStore>, keys: &Keyspace) -> Self {
        Self::with_capacity(store, keys, MAX_TIPS)
    }

    /// A cache holding at most `max_tips` entries (minimum 1).
    pub fn with_capacity(store: Arc<dyn KvStore>, keys: &Keyspace, max_tips: usize) -> Self {
        Self {
            store,
            key: keys.tips(),
            max_tips: max_tips.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.max_tips
    }

    /// All cached tips, oldest first.
    ///
    /// Storage errors and corrupt payloads are logged and read as empty.
    pub async fn load(&self) -> Vec<Tip> {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "tip cache unavailable, treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Tip>>(&raw) {
            Ok(tips) => tips,
            Err(e) => {
                warn!(key = %self.key, error = %e, "tip cache corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    /// Append `tip` and keep only the newest `capacity()` entries.
    pub async fn save(&self, tip: Tip) -> Result<()> {
        let mut tips = self.load().await;
        tips.push(tip);
        if tips.len() > self.max_tips {
            let excess = tips.len() - self.max_tips;
            tips.drain(..excess);
        }
        let encoded = serde_json::to_string(&tips)?;
        self.store.set(&self.key, &encoded).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(&self.key).await
    }

    pub async fn count(&self) -> usize {
        self.load().await.len()
    }

    /// Texts of the newest `n` tips, oldest first.
    pub async fn recent_texts(&self, n: usize) -> Vec<String> {
        let tips = self.load().await;
        let skip = tips.len().saturating_sub(n);
        tips.into_iter().skip(skip).map(|t| t.text).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FarmProfile;
    use crate::store::memory::InMemoryKvStore;
    use chrono::Utc;

    fn tip(text: &str) -> Tip {
        Tip::new(&FarmProfile::new("rice", "transplanting"), text, Utc::now())
    }

    fn cache() -> (Arc<InMemoryKvStore>, TipCache) {
        let store = Arc::new(InMemoryKvStore::new());
        let cache = TipCache::new(store.clone(), &Keyspace::default());
        (store, cache)
    }

    #[tokio::test]
    async fn test_empty_store_loads_empty() {
        let (_, cache) = cache();
        assert!(cache.load().await.is_empty());
        assert_eq!(cache.count().await, 0);
    }

    #[tokio::test]
    async fn test_save_preserves_insertion_order() {
        let (_, cache) = cache();
        for t in ["one", "two", "three"] {
            cache.save(tip(t)).await.unwrap();
        }
        let texts: Vec<String> = cache.load().await.into_iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_cap_evicts_oldest_first() {
        let (_, cache) = cache();
        for i in 0..57 {
            cache.save(tip(&format!("tip {}", i))).await.unwrap();
        }
        let tips = cache.load().await;
        assert_eq!(tips.len(), MAX_TIPS);
        assert_eq!(tips[0].text, "tip 7");
        assert_eq!(tips[MAX_TIPS - 1].text, "tip 56");
    }

    #[tokio::test]
    async fn test_corrupt_payload_reads_empty_and_recovers() {
        let (store, cache) = cache();
        store
            .set(&Keyspace::default().tips(), "{not json")
            .await
            .unwrap();
        assert!(cache.load().await.is_empty());

        cache.save(tip("fresh")).await.unwrap();
        assert_eq!(cache.count().await, 1);
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let (store, cache) = cache();
        cache.save(tip("a")).await.unwrap();
        cache.clear().await.unwrap();
        assert_eq!(cache.count().await, 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_recent_texts_takes_newest() {
        let (_, cache) = cache();
        for i in 0..15 {
            cache.save(tip(&format!("{}", i))).await.unwrap();
        }
        let recent = cache.recent_texts(10).await;
        assert_eq!(recent.len(), 10);
        assert_eq!(recent.first().map(String::as_str), Some("5"));
        assert_eq!(recent.last().map(String::as_str), Some("14"));
        assert_eq!(cache.recent_texts(100).await.len(), 15);
    }

    #[tokio::test]
    async fn test_custom_capacity() {
        let store = Arc::new(InMemoryKvStore::new());
        let cache = TipCache::with_capacity(store, &Keyspace::default(), 3);
        for t in ["a", "b", "c", "d"] {
            cache.save(tip(t)).await.unwrap();
        }
        let texts: Vec<String> = cache.load().await.into_iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["b", "c", "d"]);
    }
}
