//! Provider name → documentation URL cache.
//!
//! Stored in its own file next to the spec manifest, with a fixed
//! seven-day expiry window.

use super::files::{read_json, remove_file, write_json};
use super::hash::normalize_source;
use super::store::expiry_from;
use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const DISCOVERY_FILE: &str = "discovery.json";

/// Fixed lifetime of discovery entries (7 days).
pub const DISCOVERY_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// A resolved provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryCacheEntry {
    pub provider_key: String,
    pub docs_url: String,
    /// Page the documentation link was extracted from.
    pub source_origin: String,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl DiscoveryCacheEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Discovery cache handle. Clones serialize their writes.
#[derive(Clone, Debug)]
pub struct DiscoveryCache {
    path: PathBuf,
    ttl: Duration,
    write_lock: Arc<Mutex<()>>,
}

impl DiscoveryCache {
    /// Discovery cache stored under `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { path: root.as_ref().join(DISCOVERY_FILE), ttl: DISCOVERY_TTL, write_lock: Arc::new(Mutex::new(())) }
    }

    /// Override the expiry window.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    async fn load(&self) -> Result<BTreeMap<String, DiscoveryCacheEntry>, Error> {
        Ok(read_json(&self.path).await?.unwrap_or_default())
    }

    /// Look up a provider, failing with `NotFound` or `Expired`.
    pub async fn get(&self, provider: &str) -> Result<DiscoveryCacheEntry, Error> {
        let key = normalize_source(provider);
        let entry = self
            .load()
            .await?
            .remove(&key)
            .ok_or_else(|| Error::NotFound(format!("no discovery entry for {key}")))?;

        if entry.is_expired_at(Utc::now()) {
            return Err(Error::Expired(format!("discovery entry for {key} expired")));
        }
        Ok(entry)
    }

    /// Record a resolution, overwriting any previous one.
    pub async fn put(&self, provider: &str, docs_url: &str, source_origin: &str) -> Result<DiscoveryCacheEntry, Error> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Io(format!("failed to create {}: {e}", parent.display())))?;
        }

        let now = Utc::now();
        let expires_at = expiry_from(now, Some(self.ttl))?.unwrap_or(now);
        let entry = DiscoveryCacheEntry {
            provider_key: normalize_source(provider),
            docs_url: docs_url.to_string(),
            source_origin: source_origin.to_string(),
            cached_at: now,
            expires_at,
        };

        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(entry.provider_key.clone(), entry.clone());
        write_json(&self.path, &entries).await?;
        Ok(entry)
    }

    /// All entries, including expired ones.
    pub async fn list(&self) -> Result<Vec<DiscoveryCacheEntry>, Error> {
        Ok(self.load().await?.into_values().collect())
    }

    /// Remove one provider. Returns the number removed (0 or 1).
    pub async fn delete(&self, provider: &str) -> Result<usize, Error> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(&normalize_source(provider)).is_none() {
            return Ok(0);
        }
        write_json(&self.path, &entries).await?;
        Ok(1)
    }

    /// Remove every entry. Returns the number removed.
    pub async fn clear(&self) -> Result<usize, Error> {
        let _guard = self.write_lock.lock().await;
        let count = self.load().await?.len();
        remove_file(&self.path).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiscoveryCache::new(dir.path());

        cache
            .put("  Stripe ", "https://docs.stripe.com/api", "https://apitracker.io/a/stripe")
            .await
            .unwrap();

        let entry = cache.get("stripe").await.unwrap();
        assert_eq!(entry.provider_key, "stripe");
        assert_eq!(entry.docs_url, "https://docs.stripe.com/api");
        assert_eq!((entry.expires_at - entry.cached_at).num_days(), 7);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiscoveryCache::new(dir.path());
        assert!(matches!(cache.get("nobody").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_expired_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiscoveryCache::new(dir.path()).with_ttl(Duration::from_millis(1));
        cache.put("acme", "https://acme.dev/docs", "https://apitracker.io/a/acme").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(matches!(cache.get("acme").await, Err(Error::Expired(_))));
        assert_eq!(cache.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_one_provider() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiscoveryCache::new(dir.path());
        cache.put("stripe", "https://docs.stripe.com", "https://apitracker.io/a/stripe").await.unwrap();
        cache.put("twilio", "https://www.twilio.com/docs", "https://apitracker.io/a/twilio").await.unwrap();

        assert_eq!(cache.delete(" STRIPE ").await.unwrap(), 1);
        assert_eq!(cache.delete("stripe").await.unwrap(), 0);
        assert!(matches!(cache.get("stripe").await, Err(Error::NotFound(_))));
        assert!(cache.get("twilio").await.is_ok());
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiscoveryCache::new(dir.path());
        cache.put("a", "https://a.dev/docs", "https://apitracker.io/a/a").await.unwrap();
        cache.put("b", "https://b.dev/docs", "https://apitracker.io/a/b").await.unwrap();

        assert_eq!(cache.clear().await.unwrap(), 2);
        assert!(cache.list().await.unwrap().is_empty());
    }
}
