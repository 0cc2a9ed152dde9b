//! Filesystem Driver
//!
//! Stores each key as `<root>/<directory>/<key>.<ext>`, one file per entry,
//! holding the encoded `{created_at, expires_at, value}` envelope.
//!
//! The storage directory is resolved (and created if missing) on every call,
//! so a directory removed behind the driver's back is recreated by the next
//! operation. Writes land in a temporary file in the same directory and are
//! renamed over the target, so readers never see a partial entry.
//!
//! Reading a key that has no file is an error ([`CacheError::NotFound`]),
//! while reading a key whose entry has expired evicts the file and returns
//! `Ok(None)`. Callers that only care about hit/miss should treat both as a
//! miss.
//!
//! Eviction moves the stale file aside before unlinking it. If a concurrent
//! `set` replaced the entry in the meantime, the fresh entry is put back
//! unless yet another write has already landed.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use super::{validate_key, CacheDriver};
use crate::codec::{self, CacheEntry, CacheValue, Format};
use crate::config::FileCacheConfig;
use crate::error::{CacheError, Result};
use crate::ttl::parse_ttl;

/// Prefix of in-flight temporary files.
const TEMP_PREFIX: &str = ".cachebox-";
/// Suffix of in-flight temporary files.
const TEMP_SUFFIX: &str = ".tmp";
/// Temporary files untouched for longer than this are leftovers of a failed
/// write and are removed by `clear`.
const STALE_TEMP_AGE: Duration = Duration::from_secs(60);

// == File Cache ==
/// Cache driver persisting entries as files on the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileCache {
    config: FileCacheConfig,
}

impl FileCache {
    // == Constructor ==
    /// Creates a driver from an explicit configuration.
    pub fn new(config: FileCacheConfig) -> Self {
        Self { config }
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &FileCacheConfig {
        &self.config
    }

    // == Configuration ==
    /// Sets the storage root. Not validated until the next operation.
    pub fn configure_path(&mut self, root: impl Into<PathBuf>) {
        self.config.path = Some(root.into());
    }

    /// Sets the subdirectory under the root.
    pub fn configure_directory(&mut self, name: impl Into<String>) {
        self.config.directory = name.into();
    }

    /// Selects the format by name (`json`, `serialize` or `txt`).
    ///
    /// On failure the previously selected format, if any, is kept.
    pub fn configure_format(&mut self, name: &str) -> Result<Format> {
        let format: Format = name.parse()?;
        self.config.format = Some(format);
        Ok(format)
    }

    // == Directory Resolution ==
    /// Resolves `root/directory`, creating it and any missing ancestors.
    ///
    /// # Errors
    /// - [`CacheError::UninitializedPath`] if no root was configured
    /// - [`CacheError::UninitializedDirectory`] if the directory name is empty
    /// - [`CacheError::DirectoryCreateFailed`] if creation fails
    pub fn create_cache_directory(&self) -> Result<PathBuf> {
        let root = self
            .config
            .path
            .as_deref()
            .filter(|root| !root.as_os_str().is_empty())
            .ok_or(CacheError::UninitializedPath)?;
        if self.config.directory.is_empty() {
            return Err(CacheError::UninitializedDirectory);
        }

        let dir = root.join(&self.config.directory);
        if !dir.is_dir() {
            match fs::create_dir_all(&dir) {
                Ok(()) => info!(path = %dir.display(), "Created cache directory"),
                // Another worker won the race
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => {}
                Err(source) => return Err(CacheError::DirectoryCreateFailed { path: dir, source }),
            }
        }
        Ok(dir)
    }

    fn format(&self) -> Result<Format> {
        self.config.format.ok_or(CacheError::UninitializedFormat)
    }

    /// Resolves the storage directory and the file for `key` inside it.
    fn entry_path(&self, key: &str) -> Result<(PathBuf, PathBuf, Format)> {
        let dir = self.create_cache_directory()?;
        let format = self.format()?;
        validate_key(key)?;
        let path = dir.join(format!("{key}.{}", format.extension()));
        Ok((dir, path, format))
    }

    fn temp_file(dir: &Path) -> io::Result<tempfile::NamedTempFile> {
        tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)
    }

    fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut temp = Self::temp_file(dir)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_data()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    // == Eviction ==
    /// Removes the expired entry at `path`.
    ///
    /// The file is first renamed to a private tombstone and decoded again. An
    /// entry that is no longer expired was written by a concurrent `set`
    /// after the caller's read; it is linked back into place unless a newer
    /// file already occupies `path`.
    fn evict_expired(dir: &Path, path: &Path, format: Format) -> Result<()> {
        let tombstone = Self::temp_file(dir)?.into_temp_path();

        match fs::rename(path, &tombstone) {
            Ok(()) => {}
            // Concurrent reader or delete already evicted it
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        let still_expired = fs::read(&tombstone)
            .ok()
            .and_then(|bytes| codec::decode(&bytes, format).ok())
            .map_or(false, |entry| entry.is_expired());
        if !still_expired {
            match fs::hard_link(&tombstone, path) {
                Ok(()) => debug!(path = %path.display(), "Restored entry replaced during eviction"),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e.into()),
            }
        }

        match tombstone.close() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl CacheDriver for FileCache {
    // == Set ==
    /// Writes the entry for `key`, fully replacing any previous file.
    fn set(&self, key: &str, value: CacheValue, ttl: Option<&str>) -> Result<()> {
        let (dir, path, format) = self.entry_path(key)?;
        let ttl_seconds = parse_ttl(ttl)?;

        let entry = CacheEntry::new(value, ttl_seconds);
        let bytes = codec::encode(&entry, format)?;
        Self::write_atomic(&dir, &path, &bytes)?;

        debug!(key, path = %path.display(), expires_at = ?entry.expires_at, "Stored cache entry");
        Ok(())
    }

    // == Get ==
    /// Reads the value for `key`.
    ///
    /// # Returns
    /// - `Ok(Some(value))` for a live entry
    /// - `Ok(None)` if the entry had expired; its file is removed
    /// - `Err(CacheError::NotFound)` if no file exists for `key`
    fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let (dir, path, format) = self.entry_path(key)?;

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CacheError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let entry = codec::decode(&bytes, format)?;

        if entry.is_expired() {
            Self::evict_expired(&dir, &path, format)?;
            debug!(key, "Evicted expired cache entry");
            return Ok(None);
        }

        debug!(key, ttl_remaining = ?entry.ttl_remaining(), "Cache hit");
        Ok(Some(entry.value))
    }

    // == Delete ==
    /// Removes the file for `key`.
    fn delete(&self, key: &str) -> Result<()> {
        let (_, path, _) = self.entry_path(key)?;

        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(key, "Deleted cache entry");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(CacheError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    // == Clear ==
    /// Removes every regular file directly inside the storage directory.
    ///
    /// Subdirectories are left alone, as are temporary files of writes that
    /// may still be in flight. Temporary files older than a minute are
    /// leftovers of failed writes and are removed. Files that vanish while
    /// clearing are skipped without error.
    fn clear(&self) -> Result<usize> {
        let dir = self.create_cache_directory()?;
        let mut removed = 0;

        for item in fs::read_dir(&dir)? {
            let item = item?;

            let is_file = match item.file_type() {
                Ok(file_type) => file_type.is_file(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !is_file {
                continue;
            }
            if is_temp_file(&item.file_name().to_string_lossy()) {
                match is_stale(&item) {
                    Ok(true) => {
                        warn!(path = %item.path().display(), "Removing abandoned temporary file");
                    }
                    Ok(false) => continue,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                    Err(e) => return Err(e.into()),
                }
            }

            match fs::remove_file(item.path()) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        info!(path = %dir.display(), removed, "Cleared cache directory");
        Ok(removed)
    }
}

fn is_temp_file(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}

fn is_stale(item: &fs::DirEntry) -> io::Result<bool> {
    let modified = item.metadata()?.modified()?;
    Ok(SystemTime::now()
        .duration_since(modified)
        .map_or(false, |age| age > STALE_TEMP_AGE))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::current_timestamp;
    use serde_json::json;
    use tempfile::TempDir;

    fn backdate(path: &Path, age: Duration) {
        let file = fs::OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    fn cache(format: &str) -> (TempDir, FileCache) {
        let root = tempfile::tempdir().unwrap();
        let config = FileCacheConfig::new()
            .with_path(root.path())
            .with_format(format)
            .unwrap();
        (root, FileCache::new(config))
    }

    #[test]
    fn test_set_and_get() {
        let (_root, cache) = cache("serialize");

        cache.set("key1", "value1".into(), None).unwrap();
        assert_eq!(cache.get("key1").unwrap(), Some("value1".into()));
    }

    #[test]
    fn test_set_writes_expected_file() {
        let (root, cache) = cache("json");

        cache.set("user", json!({"id": 7}).into(), Some("1h")).unwrap();

        let path = root.path().join("cacheBox").join("user.json");
        let doc: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        let created = doc["created_at"].as_i64().unwrap();
        assert_eq!(doc["expires_at"].as_i64(), Some(created + 3600));
        assert_eq!(doc["value"], json!({"id": 7}));
    }

    #[test]
    fn test_extension_follows_format() {
        for (format, ext) in [("json", "json"), ("serialize", "serialize"), ("txt", "txt")] {
            let (root, cache) = cache(format);
            cache.set("k", "v".into(), None).unwrap();
            assert!(root.path().join("cacheBox").join(format!("k.{ext}")).is_file());
        }
    }

    #[test]
    fn test_overwrite() {
        let (_root, cache) = cache("txt");

        cache.set("key1", "value1".into(), None).unwrap();
        cache.set("key1", "value2".into(), None).unwrap();

        assert_eq!(cache.get("key1").unwrap(), Some("value2".into()));
        assert_eq!(cache.clear().unwrap(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let (_root, cache) = cache("json");

        let result = cache.get("nonexistent");
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_delete() {
        let (_root, cache) = cache("json");

        cache.set("key1", "value1".into(), None).unwrap();
        cache.delete("key1").unwrap();

        assert!(matches!(cache.get("key1"), Err(CacheError::NotFound(_))));
        assert!(matches!(cache.delete("key1"), Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_expired_entry_is_evicted_on_read() {
        let (_root, cache) = cache("serialize");
        let dir = cache.create_cache_directory().unwrap();
        let path = dir.join("stale.serialize");

        let entry = CacheEntry::stamped("old".into(), Some(5), current_timestamp() - 60);
        fs::write(&path, codec::encode(&entry, Format::Serialized).unwrap()).unwrap();

        assert_eq!(cache.get("stale").unwrap(), None);
        assert!(!path.exists());
        // The key is now simply absent
        assert!(matches!(cache.get("stale"), Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_file_is_decode_error() {
        let (_root, cache) = cache("json");
        let dir = cache.create_cache_directory().unwrap();
        fs::write(dir.join("broken.json"), b"{ not json").unwrap();

        assert!(matches!(cache.get("broken"), Err(CacheError::Decode(_))));
    }

    #[test]
    fn test_clear_counts_only_regular_files() {
        let (_root, cache) = cache("json");
        let dir = cache.create_cache_directory().unwrap();

        cache.set("a", "1".into(), None).unwrap();
        cache.set("b", "2".into(), None).unwrap();
        fs::write(dir.join("foreign.dat"), b"x").unwrap();
        fs::create_dir(dir.join("nested")).unwrap();
        fs::write(dir.join(".cachebox-inflight.tmp"), b"partial").unwrap();

        assert_eq!(cache.clear().unwrap(), 3);
        assert!(dir.join("nested").is_dir());
        // A fresh temporary file may belong to a write in progress
        assert!(dir.join(".cachebox-inflight.tmp").is_file());
        assert_eq!(cache.clear().unwrap(), 0);
    }

    #[test]
    fn test_clear_removes_abandoned_temp_files() {
        let (_root, cache) = cache("json");
        let dir = cache.create_cache_directory().unwrap();

        cache.set("a", "1".into(), None).unwrap();
        let abandoned = dir.join(".cachebox-Ab12Cd.tmp");
        fs::write(&abandoned, b"partial").unwrap();
        backdate(&abandoned, STALE_TEMP_AGE + Duration::from_secs(60));

        assert_eq!(cache.clear().unwrap(), 2);
        assert_eq!(cache.clear().unwrap(), 0);
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_clear_fails_when_directory_cannot_be_listed() {
        use std::os::unix::fs::PermissionsExt;

        let (_root, cache) = cache("json");
        let dir = cache.create_cache_directory().unwrap();
        cache.set("a", "1".into(), None).unwrap();

        fs::set_permissions(&dir, fs::Permissions::from_mode(0o000)).unwrap();
        let listable = fs::read_dir(&dir).is_ok();
        let result = cache.clear();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();

        // Privileged users can list the directory regardless of its mode
        if !listable {
            assert!(matches!(result, Err(CacheError::Io(_))), "{result:?}");
            assert!(dir.join("a.json").is_file());
        }
    }

    #[test]
    fn test_eviction_keeps_entry_written_after_read() {
        let (_root, cache) = cache("serialize");
        let dir = cache.create_cache_directory().unwrap();

        // A reader decoded an expired entry, then a writer replaced it
        cache.set("k", "fresh".into(), Some("1h")).unwrap();
        let path = dir.join("k.serialize");
        FileCache::evict_expired(&dir, &path, Format::Serialized).unwrap();

        assert_eq!(cache.get("k").unwrap(), Some("fresh".into()));
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 1, "tombstone left behind");
    }

    #[test]
    fn test_eviction_of_missing_file_is_quiet() {
        let (_root, cache) = cache("json");
        let dir = cache.create_cache_directory().unwrap();

        FileCache::evict_expired(&dir, &dir.join("gone.json"), Format::Structured).unwrap();
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_uninitialized_path() {
        let cache = FileCache::new(FileCacheConfig::new().with_format("json").unwrap());
        assert!(matches!(
            cache.set("k", "v".into(), None),
            Err(CacheError::UninitializedPath)
        ));
        assert!(matches!(cache.clear(), Err(CacheError::UninitializedPath)));
    }

    #[test]
    fn test_uninitialized_directory() {
        let (_root, mut cache) = cache("json");
        cache.configure_directory("");
        assert!(matches!(
            cache.get("k"),
            Err(CacheError::UninitializedDirectory)
        ));
    }

    #[test]
    fn test_uninitialized_format() {
        let root = tempfile::tempdir().unwrap();
        let mut cache = FileCache::default();
        cache.configure_path(root.path());

        assert!(matches!(
            cache.configure_format("xml"),
            Err(CacheError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            cache.set("k", "v".into(), None),
            Err(CacheError::UninitializedFormat)
        ));

        assert_eq!(cache.configure_format("txt").unwrap(), Format::PlainText);
        assert!(cache.set("k", "v".into(), None).is_ok());
    }

    #[test]
    fn test_directory_is_recreated_each_call() {
        let (_root, cache) = cache("json");
        let dir = cache.create_cache_directory().unwrap();

        fs::remove_dir_all(&dir).unwrap();
        cache.set("k", "v".into(), None).unwrap();
        assert!(dir.join("k.json").is_file());
    }

    #[test]
    fn test_directory_create_failed() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        fs::write(&blocker, b"not a directory").unwrap();

        let cache = FileCache::new(
            FileCacheConfig::new()
                .with_path(&blocker)
                .with_format("json")
                .unwrap(),
        );
        assert!(matches!(
            cache.create_cache_directory(),
            Err(CacheError::DirectoryCreateFailed { .. })
        ));
    }

    #[test]
    fn test_invalid_ttl_leaves_no_file() {
        let (root, cache) = cache("json");

        assert!(matches!(
            cache.set("k", "v".into(), Some("10x")),
            Err(CacheError::InvalidTtlFormat(_))
        ));
        assert!(!root.path().join("cacheBox").join("k.json").exists());
    }

    #[test]
    fn test_invalid_key() {
        let (_root, cache) = cache("json");
        assert!(matches!(
            cache.set("../outside", "v".into(), None),
            Err(CacheError::InvalidKey(_))
        ));
    }
}
