//! Spec cache: one manifest file plus one blob file per entry.
//!
//! Provides functions for storing, reading, listing, and deleting cached
//! specifications. Expiry is evaluated lazily on read; nothing is swept
//! in the background.

use super::files::{read_json, remove_file, write_json};
use super::hash::{compute_cache_key, is_cache_key};
use crate::Error;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const MANIFEST_FILE: &str = "manifest.json";
const BLOB_DIR: &str = "blobs";
const MANIFEST_VERSION: u32 = 1;

/// Minimal description of the cached specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecInfo {
    pub title: String,
    pub version: String,
    #[serde(rename = "type")]
    pub spec_type: String,
}

/// A manifest entry pointing at one blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecCacheEntry {
    pub key: String,
    /// Source as given (trimmed); only the key is case-folded.
    pub source_url: String,
    /// Blob path relative to the cache root.
    pub blob_ref: String,
    pub cached_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub spec_info: SpecInfo,
}

impl SpecCacheEntry {
    /// Whether the entry is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }
}

/// A manifest entry annotated with its expiry state, as returned by `list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheListing {
    #[serde(flatten)]
    pub entry: SpecCacheEntry,
    pub expired: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, SpecCacheEntry>,
}

/// Compute an absolute expiry from a TTL. `None` never expires.
pub(crate) fn expiry_from(now: DateTime<Utc>, ttl: Option<Duration>) -> Result<Option<DateTime<Utc>>, Error> {
    ttl.map(|ttl| {
        chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(|| Error::InvalidInput(format!("ttl out of range: {ttl:?}")))
    })
    .transpose()
}

/// Cache store handle.
///
/// Cloning is cheap; clones share the same directory and serialize their
/// manifest updates. There is no cross-process locking: separate processes
/// race on the manifest and the last one wins.
#[derive(Clone, Debug)]
pub struct CacheStore {
    root: PathBuf,
    manifest_lock: Arc<Mutex<()>>,
}

impl CacheStore {
    /// Open (creating if needed) a cache rooted at `root`.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, Error> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(root.join(BLOB_DIR))
            .await
            .map_err(|e| Error::Io(format!("failed to create cache directory {}: {e}", root.display())))?;

        tracing::debug!(root = %root.display(), "opened spec cache");
        Ok(Self { root, manifest_lock: Arc::new(Mutex::new(())) })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    async fn load_manifest(&self) -> Result<Manifest, Error> {
        Ok(read_json(&self.manifest_path())
            .await?
            .unwrap_or(Manifest { version: MANIFEST_VERSION, entries: BTreeMap::new() }))
    }

    async fn save_manifest(&self, manifest: &Manifest) -> Result<(), Error> {
        write_json(&self.manifest_path(), manifest).await
    }

    /// Resolve user input to a manifest key. Accepts a raw cache key that is
    /// present in the manifest, otherwise derives the key from the input.
    fn key_for(manifest: &Manifest, input: &str) -> String {
        let trimmed = input.trim();
        if is_cache_key(trimmed) && manifest.entries.contains_key(trimmed) {
            trimmed.to_string()
        } else {
            compute_cache_key(input)
        }
    }

    /// Store `value` under the key derived from `source`.
    ///
    /// The blob is written before the manifest so a crash in between leaves
    /// only an orphaned blob, never an index entry without data.
    pub async fn put<T: Serialize>(
        &self, source: &str, value: &T, ttl: Option<Duration>, info: SpecInfo,
    ) -> Result<SpecCacheEntry, Error> {
        let key = compute_cache_key(source);
        let blob_ref = format!("{BLOB_DIR}/{key}.json");
        let now = Utc::now();

        write_json(&self.root.join(&blob_ref), value).await?;

        let entry = SpecCacheEntry {
            key: key.clone(),
            source_url: source.trim().to_string(),
            blob_ref,
            cached_at: now,
            expires_at: expiry_from(now, ttl)?,
            spec_info: info,
        };

        let _guard = self.manifest_lock.lock().await;
        let mut manifest = self.load_manifest().await?;
        manifest.version = MANIFEST_VERSION;
        manifest.entries.insert(key.clone(), entry.clone());
        self.save_manifest(&manifest).await?;

        tracing::debug!(%key, source, "cached spec");
        Ok(entry)
    }

    /// Metadata for `source`, failing with `NotFound` or `Expired`.
    pub async fn entry(&self, source: &str) -> Result<SpecCacheEntry, Error> {
        let manifest = self.load_manifest().await?;
        let key = Self::key_for(&manifest, source);
        let entry = manifest
            .entries
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no cache entry for {}", source.trim())))?;

        if entry.is_expired_at(Utc::now()) {
            return Err(Error::Expired(format!(
                "cache entry for {} expired at {}",
                entry.source_url,
                entry.expires_at.map(|e| e.to_rfc3339()).unwrap_or_default()
            )));
        }

        Ok(entry)
    }

    /// Read the cached value for `source`.
    ///
    /// A manifest entry whose blob is missing or unreadable is reported as
    /// `NotFound`, so the next successful acquisition overwrites it.
    pub async fn get<T: DeserializeOwned>(&self, source: &str) -> Result<T, Error> {
        let entry = self.entry(source).await?;
        let blob_path = self.root.join(&entry.blob_ref);

        match read_json::<T>(&blob_path).await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => {
                tracing::warn!(key = %entry.key, "manifest entry references missing blob");
                Err(Error::NotFound(format!("blob missing for {}", entry.source_url)))
            }
            Err(e) => {
                tracing::warn!(key = %entry.key, error = %e, "unreadable cache blob");
                Err(Error::NotFound(format!("blob unreadable for {}", entry.source_url)))
            }
        }
    }

    /// List entries, newest first. Expired entries are included only when
    /// `include_expired` is set.
    pub async fn list(&self, include_expired: bool) -> Result<Vec<CacheListing>, Error> {
        let now = Utc::now();
        let manifest = self.load_manifest().await?;

        let mut listings: Vec<CacheListing> = manifest
            .entries
            .into_values()
            .map(|entry| {
                let expired = entry.is_expired_at(now);
                CacheListing { entry, expired }
            })
            .filter(|listing| include_expired || !listing.expired)
            .collect();

        listings.sort_by(|a, b| b.entry.cached_at.cmp(&a.entry.cached_at));
        Ok(listings)
    }

    /// Delete the entry for `source`. Returns the number removed (0 or 1).
    pub async fn delete(&self, source: &str) -> Result<usize, Error> {
        let _guard = self.manifest_lock.lock().await;
        let mut manifest = self.load_manifest().await?;
        let key = Self::key_for(&manifest, source);

        let Some(entry) = manifest.entries.remove(&key) else {
            return Ok(0);
        };

        self.save_manifest(&manifest).await?;
        remove_file(&self.root.join(&entry.blob_ref)).await?;
        Ok(1)
    }

    /// Delete every entry. Returns the number removed.
    pub async fn clear(&self) -> Result<usize, Error> {
        let _guard = self.manifest_lock.lock().await;
        let mut manifest = self.load_manifest().await?;
        let entries = std::mem::take(&mut manifest.entries);

        self.save_manifest(&manifest).await?;
        for entry in entries.values() {
            remove_file(&self.root.join(&entry.blob_ref)).await?;
        }

        tracing::debug!(removed = entries.len(), "cleared spec cache");
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(title: &str) -> SpecInfo {
        SpecInfo { title: title.to_string(), version: "1.0.0".to_string(), spec_type: "openapi".to_string() }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path()).await.unwrap();
        let value = json!({"openapi": "3.0.0"});

        let entry = store
            .put("https://example.com/openapi.json", &value, None, info("Example"))
            .await
            .unwrap();
        assert_eq!(entry.key.len(), 64);
        assert!(entry.expires_at.is_none());

        let read: serde_json::Value = store.get("https://example.com/openapi.json").await.unwrap();
        assert_eq!(read, value);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path()).await.unwrap();
        let result: Result<serde_json::Value, _> = store.get("nonexistent").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_normalization_invariant() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path()).await.unwrap();
        store.put("foo", &json!(1), None, info("Foo")).await.unwrap();

        let a: i32 = store.get(" FOO ").await.unwrap();
        let b: i32 = store.get("foo").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path()).await.unwrap();
        store
            .put("short-lived", &json!("v"), Some(Duration::from_millis(200)), info("Short"))
            .await
            .unwrap();

        let before: String = store.get("short-lived").await.unwrap();
        assert_eq!(before, "v");

        tokio::time::sleep(Duration::from_millis(300)).await;

        let after: Result<String, _> = store.get("short-lived").await;
        assert!(matches!(after, Err(Error::Expired(_))));
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path()).await.unwrap();
        let entry = store.put("orphan", &json!({"a": 1}), None, info("Orphan")).await.unwrap();

        std::fs::remove_file(dir.path().join(&entry.blob_ref)).unwrap();

        let result: Result<serde_json::Value, _> = store.get("orphan").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_overwrite_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path()).await.unwrap();
        store.put("api", &json!(1), None, info("First")).await.unwrap();
        store.put("API", &json!(2), None, info("Second")).await.unwrap();

        let value: i32 = store.get("api").await.unwrap();
        assert_eq!(value, 2);
        assert_eq!(store.list(true).await.unwrap().len(), 1);
        assert_eq!(store.entry("api").await.unwrap().spec_info.title, "Second");
    }

    #[tokio::test]
    async fn test_list_flags_expired() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path()).await.unwrap();
        store.put("fresh", &json!(1), None, info("Fresh")).await.unwrap();
        store
            .put("stale", &json!(2), Some(Duration::from_millis(1)), info("Stale"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let live = store.list(false).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].entry.source_url, "fresh");

        let all = store.list(true).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|l| l.entry.source_url == "stale" && l.expired));
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path()).await.unwrap();
        let first = store.put("one", &json!(1), None, info("One")).await.unwrap();
        store.put("two", &json!(2), None, info("Two")).await.unwrap();
        store.put("three", &json!(3), None, info("Three")).await.unwrap();

        assert_eq!(store.delete("ONE").await.unwrap(), 1);
        assert_eq!(store.delete("one").await.unwrap(), 0);
        assert!(!dir.path().join(&first.blob_ref).exists());

        let by_key = store.entry("two").await.unwrap().key;
        assert_eq!(store.delete(&by_key).await.unwrap(), 1);

        assert_eq!(store.clear().await.unwrap(), 1);
        assert!(store.list(true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_source_url_keeps_case() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path()).await.unwrap();
        let entry = store
            .put("  https://example.com/Docs/OpenAPI.json ", &json!(1), None, info("Cased"))
            .await
            .unwrap();

        assert_eq!(entry.source_url, "https://example.com/Docs/OpenAPI.json");
        assert_eq!(entry.key, compute_cache_key("https://example.com/docs/openapi.json"));
        let listed = store.list(false).await.unwrap();
        assert_eq!(listed[0].entry.source_url, "https://example.com/Docs/OpenAPI.json");
    }

    #[tokio::test]
    async fn test_concurrent_puts_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path()).await.unwrap();

        let puts: Vec<_> = (0..12)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.put(&format!("spec-{i}"), &json!(i), None, info("Concurrent")).await })
            })
            .collect();
        for put in puts {
            put.await.unwrap().unwrap();
        }

        assert_eq!(store.list(true).await.unwrap().len(), 12);
        let value: i32 = store.get("spec-7").await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = CacheStore::open(dir.path()).await.unwrap();
            store.put("persisted", &json!({"k": "v"}), None, info("P")).await.unwrap();
        }
        let reopened = CacheStore::open(dir.path()).await.unwrap();
        let value: serde_json::Value = reopened.get("persisted").await.unwrap();
        assert_eq!(value["k"], "v");
    }
}
