#![allow(dead_code)]
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use graph::GraphError;
use record::Record;

/// Emitted whenever a dataset is inserted or replaced. Consumers hold a
/// receiver instead of polling a shared flag; the dataset itself is always
/// an explicit request parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetEvent {
    pub dataset: String,
    pub revision: u64,
}

/// In-memory dataset store, optionally seeded from a directory of
/// `<dataset>.json` extraction records.
pub struct DatasetStore {
    data_dir: Option<PathBuf>,
    records: DashMap<String, Arc<Record>>,
    revision: AtomicU64,
    subscribers: Mutex<Vec<Sender<DatasetEvent>>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self {
            data_dir: None,
            records: DashMap::new(),
            revision: AtomicU64::new(0),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Open a store backed by a record directory, loading every readable
    /// `.json` file in it. A directory we cannot create or read means the
    /// deployment has no usable local data source.
    pub fn open(dir: &Path) -> Result<Self, GraphError> {
        std::fs::create_dir_all(dir).map_err(|e| GraphError::UnsupportedEnvironment {
            detail: format!("cannot create data directory {}: {}", dir.display(), e),
        })?;
        let store = Self {
            data_dir: Some(dir.to_path_buf()),
            ..Self::new()
        };

        let entries = std::fs::read_dir(dir).map_err(|e| GraphError::UnsupportedEnvironment {
            detail: format!("cannot read data directory {}: {}", dir.display(), e),
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match std::fs::read_to_string(&path) {
                Ok(json) => match record::parse_record(&json) {
                    Ok(parsed) => {
                        store.records.insert(name.to_string(), Arc::new(parsed));
                    }
                    Err(e) => {
                        tracing::warn!(file = %path.display(), error = %e, "skipping unparseable record");
                    }
                },
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "skipping unreadable record");
                }
            }
        }
        tracing::info!(
            datasets = store.records.len(),
            dir = %dir.display(),
            "dataset store loaded"
        );
        Ok(store)
    }

    pub fn get(&self, dataset: &str) -> Result<Arc<Record>, GraphError> {
        self.records
            .get(dataset)
            .map(|r| r.value().clone())
            .ok_or_else(|| GraphError::RecordMissing {
                dataset: dataset.to_string(),
            })
    }

    pub fn insert(&self, dataset: &str, parsed: Record) -> u64 {
        self.records.insert(dataset.to_string(), Arc::new(parsed));
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        self.notify(dataset, revision);
        revision
    }

    pub fn insert_json(&self, dataset: &str, json: &str) -> Result<u64, GraphError> {
        let parsed = record::parse_record(json).map_err(|e| GraphError::SchemaInvalid {
            detail: e.to_string(),
        })?;
        Ok(self.insert(dataset, parsed))
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.records.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Subscribe to dataset change events.
    pub fn subscribe(&self) -> Receiver<DatasetEvent> {
        let (tx, rx) = channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    fn notify(&self, dataset: &str, revision: u64) {
        let event = DatasetEvent {
            dataset: dataset.to_string(),
            revision,
        };
        // Drop subscribers whose receiver is gone.
        self.subscribers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dataset_is_a_not_found_error() {
        let store = DatasetStore::new();
        let err = store.get("nope").unwrap_err();
        assert_eq!(err.kind(), "record_missing");
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn insert_bumps_revision_and_notifies() {
        let store = DatasetStore::new();
        let rx = store.subscribe();

        store.insert_json("demo", r#"{"entities": []}"#).unwrap();
        assert_eq!(store.revision(), 1);
        assert_eq!(store.list(), vec!["demo".to_string()]);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.dataset, "demo");
        assert_eq!(event.revision, 1);
    }

    #[test]
    fn invalid_json_is_a_schema_error() {
        let store = DatasetStore::new();
        let err = store.insert_json("bad", "{not json").unwrap_err();
        assert_eq!(err.kind(), "schema_invalid");
    }

    #[test]
    fn open_loads_records_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("case_a.json"),
            r#"{"entities": [], "claims": []}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();

        let store = DatasetStore::open(dir.path()).unwrap();
        assert_eq!(store.list(), vec!["case_a".to_string()]);
        assert!(store.get("case_a").is_ok());
    }

    #[test]
    fn unreadable_data_dir_is_unsupported_environment() {
        // A file where the directory should be.
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("blocker");
        std::fs::write(&file, "x").unwrap();

        let err = match DatasetStore::open(&file) {
            Ok(_) => panic!("open should fail on a non-directory path"),
            Err(e) => e,
        };
        assert_eq!(err.kind(), "unsupported_environment");
        assert!(err.to_string().contains("persistent storage"));
    }
}
