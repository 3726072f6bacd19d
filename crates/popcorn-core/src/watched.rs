use popcorn_models::{summarize, WatchedEntry, WatchedSummary};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::storage::{KeyValueStore, StorageError};

/// Fixed storage key for the watched list
pub const WATCHED_KEY: &str = "watched";

/// Where an unreadable payload is copied before it gets overwritten
const CORRUPT_BACKUP_KEY: &str = "watched-corrupt";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to serialize watched list: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// An entry with the same id exists; nothing changed
    AlreadyWatched,
}

/// The user's rated movies, mirrored to durable storage on every change.
pub struct WatchedStore<S: KeyValueStore> {
    storage: S,
    entries: Vec<WatchedEntry>,
    startup_diagnostic: Option<String>,
}

impl<S: KeyValueStore> WatchedStore<S> {
    /// Load the list from `storage`.
    ///
    /// Never fails. An absent key is seeded with an empty list. An
    /// unreadable payload is logged, kept as a diagnostic and treated as
    /// empty; unreadable entries inside a readable list are skipped.
    pub fn open(mut storage: S) -> Self {
        let (entries, startup_diagnostic) = match storage.get(WATCHED_KEY) {
            Ok(None) => {
                debug!("No watched list stored yet, writing an empty one");
                if let Err(e) = storage.set(WATCHED_KEY, "[]") {
                    warn!("Failed to initialize watched list: {}", e);
                }
                (Vec::new(), None)
            }
            Ok(Some(raw)) => match decode(&raw) {
                Ok((entries, skipped)) => {
                    let entries = dedupe(entries);
                    info!("Loaded watched list ({} entries)", entries.len());
                    let diagnostic = (skipped > 0).then(|| {
                        let diagnostic = format!("skipped {} unreadable watched entries", skipped);
                        warn!("{}", diagnostic);
                        backup(&mut storage, &raw);
                        diagnostic
                    });
                    (entries, diagnostic)
                }
                Err(e) => {
                    let diagnostic = format!("stored watched list is corrupt ({}); starting empty", e);
                    warn!("{}", diagnostic);
                    backup(&mut storage, &raw);
                    (Vec::new(), Some(diagnostic))
                }
            },
            Err(e) => {
                let diagnostic = format!("could not read stored watched list ({}); starting empty", e);
                warn!("{}", diagnostic);
                (Vec::new(), Some(diagnostic))
            }
        };

        Self {
            storage,
            entries,
            startup_diagnostic,
        }
    }

    /// Set when the stored payload could not be used at startup
    pub fn startup_diagnostic(&self) -> Option<&str> {
        self.startup_diagnostic.as_deref()
    }

    pub fn entries(&self) -> &[WatchedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&WatchedEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn summary(&self) -> WatchedSummary {
        summarize(&self.entries)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Append `entry` unless its id is already present.
    ///
    /// A duplicate is a no-op and does not touch storage. If the write
    /// fails the entry is not kept.
    pub fn add(&mut self, entry: WatchedEntry) -> Result<AddOutcome, StoreError> {
        if self.contains(&entry.id) {
            debug!("{} already in watched list, ignoring", entry.id);
            return Ok(AddOutcome::AlreadyWatched);
        }

        let id = entry.id.clone();
        self.entries.push(entry);
        if let Err(e) = self.persist() {
            self.entries.pop();
            return Err(e);
        }

        info!("Added {} to watched list ({} entries)", id, self.entries.len());
        Ok(AddOutcome::Added)
    }

    /// Remove the entry for `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> Result<bool, StoreError> {
        let Some(position) = self.entries.iter().position(|e| e.id == id) else {
            debug!("{} not in watched list, nothing to remove", id);
            return Ok(false);
        };

        let removed = self.entries.remove(position);
        if let Err(e) = self.persist() {
            self.entries.insert(position, removed);
            return Err(e);
        }

        info!("Removed {} from watched list ({} entries)", id, self.entries.len());
        Ok(true)
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.entries)?;
        self.storage.set(WATCHED_KEY, &json)?;
        Ok(())
    }
}

/// Parse the payload as a list, entry by entry. Returns the readable
/// entries and how many were skipped.
fn decode(raw: &str) -> Result<(Vec<WatchedEntry>, usize), serde_json::Error> {
    let values: Vec<Value> = serde_json::from_str(raw)?;
    let total = values.len();
    let entries: Vec<WatchedEntry> = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable watched entry: {}", e);
                None
            }
        })
        .collect();
    let skipped = total - entries.len();
    Ok((entries, skipped))
}

fn backup<S: KeyValueStore>(storage: &mut S, raw: &str) {
    if let Err(e) = storage.set(CORRUPT_BACKUP_KEY, raw) {
        warn!("Failed to back up unreadable watched list: {}", e);
    }
}

fn dedupe(entries: Vec<WatchedEntry>) -> Vec<WatchedEntry> {
    let total = entries.len();
    let mut seen = HashSet::new();
    let unique: Vec<WatchedEntry> = entries
        .into_iter()
        .filter(|e| seen.insert(e.id.clone()))
        .collect();
    if unique.len() != total {
        warn!(
            "Stored watched list had {} duplicate entries; keeping the first of each",
            total - unique.len()
        );
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileKeyValueStore, MemoryKeyValueStore};
    use chrono::Utc;

    fn entry(id: &str, imdb: Option<f64>, user: u8) -> WatchedEntry {
        WatchedEntry {
            id: id.to_string(),
            title: format!("Movie {}", id),
            poster_url: String::new(),
            year: "2014".to_string(),
            imdb_rating: imdb,
            user_rating: user,
            runtime_minutes: Some(120.0),
            rating_revision_count: 1,
            date_added: Utc::now(),
        }
    }

    fn payload<S: KeyValueStore>(store: &WatchedStore<S>) -> Option<String> {
        store.storage().get(WATCHED_KEY).unwrap()
    }

    #[test]
    fn test_open_empty_storage() {
        let store = WatchedStore::open(MemoryKeyValueStore::new());
        assert!(store.is_empty());
        assert_eq!(store.startup_diagnostic(), None);
        assert_eq!(payload(&store), Some("[]".to_string()));
        let summary = store.summary();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average_imdb_rating, 0.0);
        assert_eq!(summary.average_user_rating, 0.0);
        assert_eq!(summary.average_runtime_minutes, 0.0);
    }

    #[test]
    fn test_add_persists_before_returning() {
        let mut store = WatchedStore::open(MemoryKeyValueStore::new());
        assert_eq!(store.add(entry("tt1", Some(8.0), 9)).unwrap(), AddOutcome::Added);

        let persisted: Vec<WatchedEntry> = serde_json::from_str(&payload(&store).unwrap()).unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].id, "tt1");
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let mut store = WatchedStore::open(MemoryKeyValueStore::new());
        store.add(entry("tt1", Some(8.0), 9)).unwrap();
        let before = payload(&store);
        let writes = store.storage().write_count();

        assert_eq!(store.add(entry("tt1", Some(5.0), 2)).unwrap(), AddOutcome::AlreadyWatched);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("tt1").unwrap().user_rating, 9);
        assert_eq!(store.storage().write_count(), writes);
        assert_eq!(payload(&store), before);
    }

    fn assert_add_then_remove_restores<S: KeyValueStore>(store: &mut WatchedStore<S>) {
        let prior_entries = store.entries().to_vec();
        let prior_payload = payload(store);

        store.add(entry("tt2", Some(6.0), 4)).unwrap();
        assert!(store.remove("tt2").unwrap());

        assert_eq!(store.entries(), prior_entries.as_slice());
        assert_eq!(payload(store), prior_payload);
    }

    #[test]
    fn test_add_then_remove_restores_prior_state() {
        let mut store = WatchedStore::open(MemoryKeyValueStore::new());
        store.add(entry("tt1", Some(8.0), 9)).unwrap();
        assert_add_then_remove_restores(&mut store);
    }

    #[test]
    fn test_add_then_remove_on_fresh_store_restores_payload() {
        let mut store = WatchedStore::open(MemoryKeyValueStore::new());
        assert_add_then_remove_restores(&mut store);
        assert_eq!(payload(&store), Some("[]".to_string()));
    }

    #[test]
    fn test_open_survives_failed_seed_write() {
        let mut storage = MemoryKeyValueStore::new();
        storage.set_fail_writes(true);
        let store = WatchedStore::open(storage);
        assert!(store.is_empty());
        assert_eq!(payload(&store), None);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut store = WatchedStore::open(MemoryKeyValueStore::new());
        store.add(entry("tt1", None, 5)).unwrap();
        let writes = store.storage().write_count();
        assert!(!store.remove("tt404").unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(store.storage().write_count(), writes);
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let mut store = WatchedStore::open(MemoryKeyValueStore::new());
        store.add(entry("tt1", Some(7.0), 7)).unwrap();
        store.storage_mut().set_fail_writes(true);

        assert!(store.add(entry("tt2", Some(6.0), 6)).is_err());
        assert!(!store.contains("tt2"));

        assert!(store.remove("tt1").is_err());
        assert!(store.contains("tt1"));
    }

    #[test]
    fn test_summary_filters_each_average() {
        let mut store = WatchedStore::open(MemoryKeyValueStore::new());
        store.add(entry("tt1", Some(8.0), 10)).unwrap();
        store.add(entry("tt2", Some(f64::NAN), 6)).unwrap();
        store.add(entry("tt3", Some(6.0), 8)).unwrap();

        let summary = store.summary();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average_imdb_rating, 7.0);
        assert_eq!(summary.average_user_rating, 8.0);
        assert_eq!(summary.average_runtime_minutes, 120.0);
    }

    #[test]
    fn test_corrupt_payload_starts_empty() {
        let storage = MemoryKeyValueStore::new().with_value(WATCHED_KEY, "{not json");
        let mut store = WatchedStore::open(storage);

        assert!(store.is_empty());
        assert!(store.startup_diagnostic().unwrap().contains("corrupt"));
        assert_eq!(
            store.storage().get(CORRUPT_BACKUP_KEY).unwrap(),
            Some("{not json".to_string())
        );

        // The store is fully usable afterwards
        store.add(entry("tt1", Some(8.0), 9)).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_wrong_shape_payload_starts_empty() {
        let storage = MemoryKeyValueStore::new().with_value(WATCHED_KEY, r#"{"watched": []}"#);
        let store = WatchedStore::open(storage);
        assert!(store.is_empty());
        assert!(store.startup_diagnostic().is_some());
    }

    #[test]
    fn test_unreadable_entry_keeps_its_neighbours() {
        let raw = r#"[
            {"id":"tt1","title":"Interstellar","poster_url":"","year":"2014","imdb_rating":8.7,
             "user_rating":9,"runtime_minutes":169,"rating_revision_count":1},
            {"id":"tt2","title":"Dune","poster_url":"","year":"2021","imdb_rating":"N/A",
             "user_rating":7,"runtime_minutes":null,"rating_revision_count":2},
            {"id":"tt3","title":"Broken"}
        ]"#;
        let store = WatchedStore::open(MemoryKeyValueStore::new().with_value(WATCHED_KEY, raw));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("tt2").unwrap().imdb_rating, None);
        assert!(!store.contains("tt3"));
        assert!(store.startup_diagnostic().unwrap().contains("skipped 1"));
        assert_eq!(store.storage().get(CORRUPT_BACKUP_KEY).unwrap(), Some(raw.to_string()));

        let summary = store.summary();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average_imdb_rating, 8.7);
        assert_eq!(summary.average_user_rating, 8.0);
        assert_eq!(summary.average_runtime_minutes, 169.0);
    }

    #[test]
    fn test_duplicate_ids_in_payload_are_dropped() {
        let entries = vec![entry("tt1", Some(8.0), 9), entry("tt1", Some(5.0), 3), entry("tt2", None, 6)];
        let storage = MemoryKeyValueStore::new()
            .with_value(WATCHED_KEY, &serde_json::to_string(&entries).unwrap());
        let store = WatchedStore::open(storage);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("tt1").unwrap().user_rating, 9);
    }

    #[test]
    fn test_reopen_from_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = WatchedStore::open(FileKeyValueStore::new(dir.path()));
            store.add(entry("tt1", Some(8.5), 9)).unwrap();
            store.add(entry("tt2", None, 4)).unwrap();
            store.remove("tt1").unwrap();
        }

        let store = WatchedStore::open(FileKeyValueStore::new(dir.path()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].id, "tt2");
        assert_eq!(store.entries()[0].imdb_rating, None);
    }
}
