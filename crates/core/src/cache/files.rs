//! JSON file persistence for the manifest, blobs, and discovery index.
//!
//! Writes go to a uniquely named sibling temporary file which is then
//! renamed over the target, so readers observe either the old or the new
//! content.

use crate::Error;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Read and deserialize a JSON file. A missing file yields `Ok(None)`.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, Error> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::Io(format!("failed to read {}: {e}", path.display()))),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| Error::Io(format!("failed to parse {}: {e}", path.display())))
}

/// Serialize a value and atomically replace the file at `path`.
pub(crate) async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    let bytes =
        serde_json::to_vec_pretty(value).map_err(|e| Error::Io(format!("failed to serialize {}: {e}", path.display())))?;

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|e| Error::Io(format!("failed to write {}: {e}", tmp.display())))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| Error::Io(format!("failed to replace {}: {e}", path.display())))
}

/// Remove a file, treating "already gone" as success.
pub(crate) async fn remove_file(path: &Path) -> Result<(), Error> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Io(format!("failed to remove {}: {e}", path.display()))),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("cache");
    let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{name}.{}.{seq}.tmp", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result: Option<BTreeMap<String, String>> = read_json(&dir.path().join("absent.json")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), "b".to_string());

        write_json(&path, &map).await.unwrap();
        let read: BTreeMap<String, String> = read_json(&path).await.unwrap().unwrap();
        assert_eq!(read, map);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_temp_paths_are_unique() {
        let path = Path::new("/cache/manifest.json");
        let first = temp_path(path);
        let second = temp_path(path);
        assert_ne!(first, second);
        assert_eq!(first.parent(), path.parent());
    }

    #[tokio::test]
    async fn test_concurrent_writes_to_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.json");

        let writes: Vec<_> = (0..16)
            .map(|i| {
                let path = path.clone();
                tokio::spawn(async move { write_json(&path, &i).await })
            })
            .collect();
        for write in writes {
            write.await.unwrap().unwrap();
        }

        let value: i32 = read_json(&path).await.unwrap().unwrap();
        assert!((0..16).contains(&value));
    }

    #[tokio::test]
    async fn test_read_corrupt_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{not json").unwrap();

        let result: Result<Option<BTreeMap<String, String>>, Error> = read_json(&path).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_file(&dir.path().join("gone.json")).await.is_ok());
    }
}
