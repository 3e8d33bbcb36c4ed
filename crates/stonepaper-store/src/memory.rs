use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::query::{QueryResult, Selector};
use crate::traits::{RichQuery, StateStore};
use crate::transaction::Transaction;

/// In-memory, `BTreeMap`-based world state.
///
/// Every committed write bumps a store-wide height and stamps the written key
/// with it, so transactions can detect keys that changed underneath them.
/// Direct [`StateStore`] calls on the store itself commit immediately; use
/// [`InMemoryStateStore::begin`] for optimistic transactions.
///
/// A store opened from a snapshot remembers the snapshot's height, and
/// [`save`](Self::save) refuses to overwrite a snapshot that moved on since.
pub struct InMemoryStateStore {
    state: RwLock<WorldState>,
}

#[derive(Default)]
pub(crate) struct WorldState {
    pub(crate) height: u64,
    pub(crate) entries: BTreeMap<String, VersionedValue>,
    /// Height of the on-disk snapshot this state was loaded from or last
    /// saved to. `None` if no snapshot is expected to exist yet.
    pub(crate) base: Option<u64>,
}

#[derive(Clone, Debug)]
pub(crate) struct VersionedValue {
    pub(crate) value: Vec<u8>,
    pub(crate) version: u64,
}

impl WorldState {
    pub(crate) fn version_of(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.version)
    }

    /// Apply a batch of writes as one commit. Returns the new height.
    pub(crate) fn apply<'a>(&mut self, writes: impl IntoIterator<Item = (&'a String, &'a Vec<u8>)>) -> u64 {
        self.height += 1;
        let version = self.height;
        for (key, value) in writes {
            self.entries.insert(
                key.clone(),
                VersionedValue {
                    value: value.clone(),
                    version,
                },
            );
        }
        version
    }
}

/// On-disk snapshot layout. Values are hex-encoded since the store does not
/// require them to be UTF-8.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    height: u64,
    entries: Vec<SnapshotEntry>,
}

#[derive(Deserialize)]
struct SnapshotHeader {
    height: u64,
}

#[derive(Serialize, Deserialize)]
struct SnapshotEntry {
    key: String,
    version: u64,
    value: String,
}

impl InMemoryStateStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(WorldState::default()),
        }
    }

    /// Start an optimistic transaction against this store.
    pub fn begin(self: &Arc<Self>) -> Transaction {
        Transaction::new(Arc::clone(self))
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read_state()?.entries.len())
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Number of commits applied so far.
    pub fn height(&self) -> StoreResult<u64> {
        Ok(self.read_state()?.height)
    }

    /// Commit height at which `key` was last written.
    pub fn version(&self, key: &str) -> StoreResult<Option<u64>> {
        Ok(self.read_state()?.version_of(key))
    }

    /// Sorted list of all keys.
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.read_state()?.entries.keys().cloned().collect())
    }

    /// Load a store from a JSON snapshot file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let bytes = std::fs::read(path)?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut entries = BTreeMap::new();
        for entry in snapshot.entries {
            if entry.version > snapshot.height {
                return Err(StoreError::Serialization(format!(
                    "version {} of {} is above snapshot height {}",
                    entry.version, entry.key, snapshot.height
                )));
            }
            let value = hex::decode(&entry.value).map_err(|e| {
                StoreError::Serialization(format!("value of {}: {e}", entry.key))
            })?;
            entries.insert(
                entry.key,
                VersionedValue {
                    value,
                    version: entry.version,
                },
            );
        }
        debug!(path = %path.display(), keys = entries.len(), "loaded world state snapshot");

        Ok(Self {
            state: RwLock::new(WorldState {
                height: snapshot.height,
                entries,
                base: Some(snapshot.height),
            }),
        })
    }

    /// Load from `path` if it exists, otherwise start empty.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Write a JSON snapshot to `path`.
    ///
    /// `path` must still hold the snapshot this store was opened from (or no
    /// snapshot at all, for a store that started empty). If another writer
    /// saved in between, nothing is written and
    /// [`StoreError::MvccConflict`] is returned.
    ///
    /// The snapshot is written to a temporary file in the same directory and
    /// renamed into place, so a crash never leaves a truncated snapshot.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let mut state = self.write_state()?;
        let on_disk = Self::snapshot_height(path)?;
        if on_disk != state.base {
            warn!(
                path = %path.display(),
                expected = ?state.base,
                found = ?on_disk,
                "world state snapshot changed since it was loaded"
            );
            return Err(StoreError::MvccConflict {
                key: path.display().to_string(),
            });
        }

        let snapshot = Snapshot {
            height: state.height,
            entries: state
                .entries
                .iter()
                .map(|(key, entry)| SnapshotEntry {
                    key: key.clone(),
                    version: entry.version,
                    value: hex::encode(&entry.value),
                })
                .collect(),
        };
        let data = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        let height = state.height;
        state.base = Some(height);
        debug!(path = %path.display(), keys = snapshot.entries.len(), "saved world state snapshot");
        Ok(())
    }

    /// Height recorded in the snapshot at `path`, or `None` if there is none.
    fn snapshot_height(path: &Path) -> StoreResult<Option<u64>> {
        if !path.exists() {
            return Ok(None);
        }
        let header: SnapshotHeader = serde_json::from_slice(&std::fs::read(path)?)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Some(header.height))
    }

    pub(crate) fn read_state(&self) -> StoreResult<RwLockReadGuard<'_, WorldState>> {
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    pub(crate) fn write_state(&self) -> StoreResult<RwLockWriteGuard<'_, WorldState>> {
        self.state.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for InMemoryStateStore {
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        Ok(self.read_state()?.entries.get(key).map(|e| e.value.clone()))
    }

    fn put_state(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        let key = key.to_string();
        let value = value.to_vec();
        let height = self.write_state()?.apply([(&key, &value)]);
        debug!(key = %key, height, "state committed");
        Ok(())
    }
}

impl RichQuery for InMemoryStateStore {
    fn query(&self, query: &str) -> StoreResult<Vec<u8>> {
        let selector = Selector::parse(query)?;
        let state = self.read_state()?;

        let results: Vec<QueryResult> = state
            .entries
            .iter()
            // Non-JSON values are invisible to rich queries.
            .filter_map(|(key, entry)| {
                let doc: serde_json::Value = serde_json::from_slice(&entry.value).ok()?;
                selector.matches(&doc).then(|| QueryResult {
                    key: key.clone(),
                    record: doc,
                })
            })
            .collect();
        debug!(conditions = selector.len(), matched = results.len(), "rich query executed");

        QueryResult::encode_set(&results)
    }
}

impl std::fmt::Debug for InMemoryStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.read_state() {
            Ok(state) => f
                .debug_struct("InMemoryStateStore")
                .field("key_count", &state.entries.len())
                .field("height", &state.height)
                .finish(),
            Err(_) => f
                .debug_struct("InMemoryStateStore")
                .field("state", &"<poisoned>")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(hash: &str, database: i64) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "docType": "stonePaper",
            "docHash": hash,
            "database": database,
        }))
        .unwrap()
    }

    // -----------------------------------------------------------------------
    // Key-value access
    // -----------------------------------------------------------------------

    #[test]
    fn put_and_get() {
        let store = InMemoryStateStore::new();
        store.put_state("k", b"v").unwrap();
        assert_eq!(store.get_state("k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn missing_key_is_none() {
        let store = InMemoryStateStore::new();
        assert_eq!(store.get_state("missing").unwrap(), None);
    }

    #[test]
    fn empty_value_is_distinct_from_absent() {
        let store = InMemoryStateStore::new();
        store.put_state("k", b"").unwrap();
        assert_eq!(store.get_state("k").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn empty_key_rejected() {
        let store = InMemoryStateStore::new();
        assert!(matches!(store.get_state(""), Err(StoreError::EmptyKey)));
        assert!(matches!(store.put_state("", b"v"), Err(StoreError::EmptyKey)));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn writes_bump_height_and_version() {
        let store = InMemoryStateStore::new();
        store.put_state("a", b"1").unwrap();
        store.put_state("b", b"2").unwrap();
        store.put_state("a", b"3").unwrap();
        assert_eq!(store.height().unwrap(), 3);
        assert_eq!(store.version("a").unwrap(), Some(3));
        assert_eq!(store.version("b").unwrap(), Some(2));
        assert_eq!(store.version("c").unwrap(), None);
    }

    #[test]
    fn keys_are_sorted() {
        let store = InMemoryStateStore::new();
        for key in ["c", "a", "b"] {
            store.put_state(key, b"x").unwrap();
        }
        assert_eq!(store.keys().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(store.len().unwrap(), 3);
    }

    // -----------------------------------------------------------------------
    // Rich queries
    // -----------------------------------------------------------------------

    #[test]
    fn query_matches_selector() {
        let store = InMemoryStateStore::new();
        store.put_state("h1", &doc("h1", 1)).unwrap();
        store.put_state("h2", &doc("h2", 2)).unwrap();

        let query = Selector::new()
            .field_eq("docType", "stonePaper")
            .field_eq("docHash", "h2")
            .to_query_string()
            .unwrap();
        let rows = QueryResult::decode_set(&store.query(&query).unwrap()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "h2");
        assert_eq!(rows[0].record["database"], 2);
    }

    #[test]
    fn query_without_match_is_empty_array() {
        let store = InMemoryStateStore::new();
        store.put_state("h1", &doc("h1", 1)).unwrap();
        let out = store
            .query(r#"{"selector":{"docHash":"nope"}}"#)
            .unwrap();
        assert_eq!(out, b"[]".to_vec());
    }

    #[test]
    fn query_skips_non_json_values() {
        let store = InMemoryStateStore::new();
        store.put_state("bin", &[0xff, 0x00]).unwrap();
        store.put_state("h1", &doc("h1", 1)).unwrap();
        let rows =
            QueryResult::decode_set(&store.query(r#"{"selector":{}}"#).unwrap()).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn query_results_ordered_by_key() {
        let store = InMemoryStateStore::new();
        for hash in ["z", "m", "a"] {
            store.put_state(hash, &doc(hash, 7)).unwrap();
        }
        let rows = QueryResult::decode_set(
            &store.query(r#"{"selector":{"database":7}}"#).unwrap(),
        )
        .unwrap();
        let keys: Vec<_> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "m", "z"]);
    }

    #[test]
    fn invalid_query_is_an_error() {
        let store = InMemoryStateStore::new();
        assert!(matches!(
            store.query("{"),
            Err(StoreError::InvalidQuery(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    #[test]
    fn snapshot_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = InMemoryStateStore::new();
        store.put_state("h1", &doc("h1", 1)).unwrap();
        store.put_state("raw", &[0xde, 0xad]).unwrap();
        store.save(&path).unwrap();

        let loaded = InMemoryStateStore::load(&path).unwrap();
        assert_eq!(loaded.height().unwrap(), 2);
        assert_eq!(loaded.get_state("raw").unwrap(), Some(vec![0xde, 0xad]));
        assert_eq!(loaded.version("h1").unwrap(), Some(1));
    }

    #[test]
    fn open_missing_path_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = InMemoryStateStore::open(&dir.path().join("absent.json")).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn load_corrupt_snapshot_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"not json").unwrap();
        assert!(matches!(
            InMemoryStateStore::load(&path),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn load_rejects_versions_above_height() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let snapshot = json!({
            "height": 1,
            "entries": [{ "key": "k", "version": 4, "value": hex::encode(b"v") }],
        });
        std::fs::write(&path, serde_json::to_vec(&snapshot).unwrap()).unwrap();
        assert!(matches!(
            InMemoryStateStore::load(&path),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn repeated_saves_from_one_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = InMemoryStateStore::open(&path).unwrap();
        store.put_state("a", b"1").unwrap();
        store.save(&path).unwrap();
        store.put_state("b", b"2").unwrap();
        store.save(&path).unwrap();

        let reopened = InMemoryStateStore::open(&path).unwrap();
        assert_eq!(reopened.height().unwrap(), 2);
        reopened.put_state("c", b"3").unwrap();
        reopened.save(&path).unwrap();
    }

    #[test]
    fn stale_store_cannot_overwrite_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        InMemoryStateStore::new().save(&path).unwrap();

        let first = InMemoryStateStore::open(&path).unwrap();
        let second = InMemoryStateStore::open(&path).unwrap();
        assert_eq!(first.get_state("h").unwrap(), None);
        assert_eq!(second.get_state("h").unwrap(), None);

        first.put_state("h", b"first").unwrap();
        second.put_state("h", b"second").unwrap();
        first.save(&path).unwrap();
        assert!(matches!(
            second.save(&path),
            Err(StoreError::MvccConflict { .. })
        ));

        let stored = InMemoryStateStore::load(&path).unwrap();
        assert_eq!(stored.get_state("h").unwrap(), Some(b"first".to_vec()));
    }

    #[test]
    fn fresh_store_cannot_clobber_existing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let first = InMemoryStateStore::open(&path).unwrap();
        let second = InMemoryStateStore::open(&path).unwrap();
        first.put_state("h", b"first").unwrap();
        second.put_state("h", b"second").unwrap();
        first.save(&path).unwrap();
        assert!(matches!(
            second.save(&path),
            Err(StoreError::MvccConflict { .. })
        ));
    }

    #[test]
    fn poisoned_lock_is_reported() {
        let store = Arc::new(InMemoryStateStore::new());
        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.write_state().unwrap();
            panic!("writer died");
        })
        .join();

        assert!(matches!(store.len(), Err(StoreError::LockPoisoned)));
        assert!(matches!(store.height(), Err(StoreError::LockPoisoned)));
        assert!(matches!(store.is_empty(), Err(StoreError::LockPoisoned)));
        assert!(format!("{store:?}").contains("poisoned"));
    }

    #[test]
    fn debug_format() {
        let store = InMemoryStateStore::new();
        store.put_state("x", b"1").unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryStateStore"));
        assert!(debug.contains("key_count"));
    }
}
