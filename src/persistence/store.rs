//! Durable key-group storage backends

use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use tempfile::NamedTempFile;
use tracing::debug;

use super::Snapshot;
use crate::error::{Error, Result};

/// Storage of one [`Snapshot`] per namespace.
///
/// Implementations must write a snapshot atomically: a reader sees either the
/// previous snapshot or the new one, never a mix.
pub trait SnapshotStore: Send + Sync {
    fn read(&self, namespace: &str) -> Result<Option<Snapshot>>;
    fn write(&self, namespace: &str, snapshot: &Snapshot) -> Result<()>;
}

/// One JSON file per namespace inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn path_for(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{}.json", namespace))
    }
}

impl SnapshotStore for FileStore {
    fn read(&self, namespace: &str) -> Result<Option<Snapshot>> {
        let path = self.path_for(namespace);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(Error::StorageUnavailable { path, source }),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| Error::CorruptSnapshot {
                namespace: namespace.to_string(),
                source,
            })
    }

    fn write(&self, namespace: &str, snapshot: &Snapshot) -> Result<()> {
        let path = self.path_for(namespace);
        fs::create_dir_all(&self.dir).map_err(unavailable(&self.dir))?;
        let bytes = serde_json::to_vec_pretty(snapshot).map_err(|source| Error::CorruptSnapshot {
            namespace: namespace.to_string(),
            source,
        })?;

        // Each writer gets its own temp file; rename is atomic on the same filesystem
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(unavailable(&self.dir))?;
        tmp.write_all(&bytes).map_err(unavailable(tmp.path()))?;
        tmp.persist(&path).map_err(|e| unavailable(&path)(e.error))?;

        debug!("Wrote snapshot {}", path.display());
        Ok(())
    }
}

fn unavailable(path: &Path) -> impl FnOnce(io::Error) -> Error {
    let path = path.to_path_buf();
    move |source| Error::StorageUnavailable { path, source }
}

/// Process-local storage; shared between components through an `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Snapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, namespace: &str) -> Result<Option<Snapshot>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(namespace).cloned())
    }

    fn write(&self, namespace: &str, snapshot: &Snapshot) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(namespace.to_string(), snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(prior: i64) -> Snapshot {
        Snapshot {
            running: false,
            reset: false,
            start_time: 1_000,
            prior_elapsed: Some(prior),
            pause_delta: None,
            duration: 0,
            update_timestamp: 2_000,
        }
    }

    #[test]
    fn file_store_round_trips_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.read("tickwatch.stopwatch").unwrap(), None);

        store.write("tickwatch.stopwatch", &snapshot(10)).unwrap();
        store.write("tickwatch.stopwatch", &snapshot(20)).unwrap();
        assert_eq!(store.read("tickwatch.stopwatch").unwrap(), Some(snapshot(20)));
        let leftovers = fs::read_dir(dir.path().join("nested")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn file_store_namespaces_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.write("tickwatch.stopwatch", &snapshot(1)).unwrap();
        store.write("tickwatch.timer", &snapshot(2)).unwrap();
        assert_eq!(store.read("tickwatch.stopwatch").unwrap(), Some(snapshot(1)));
        assert_eq!(store.read("tickwatch.timer").unwrap(), Some(snapshot(2)));
    }

    #[test]
    fn file_store_reports_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        fs::write(store.path_for("tickwatch.timer"), b"{not json").unwrap();
        let err = store.read("tickwatch.timer").unwrap_err();
        assert_eq!(err.as_label(), "corrupt_snapshot");
    }

    #[test]
    fn concurrent_writers_sharing_a_directory_never_fail() {
        let dir = tempfile::tempdir().unwrap();
        let writers: Vec<_> = (0..2)
            .map(|n| {
                let store = FileStore::new(dir.path());
                std::thread::spawn(move || {
                    (0..300)
                        .filter(|i| store.write("tickwatch.stopwatch", &snapshot(n * 1_000 + i)).is_err())
                        .count()
                })
            })
            .collect();

        let reader = FileStore::new(dir.path());
        for _ in 0..100 {
            // a reader sees either nothing yet or a whole snapshot
            reader.read("tickwatch.stopwatch").unwrap();
        }

        let failures: usize = writers.into_iter().map(|w| w.join().unwrap()).sum();
        assert_eq!(failures, 0);
        let last = reader.read("tickwatch.stopwatch").unwrap().unwrap();
        assert_eq!(last.accumulated() % 1_000, 299);
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        store.write("a", &snapshot(5)).unwrap();
        assert_eq!(store.read("a").unwrap(), Some(snapshot(5)));
        assert_eq!(store.read("b").unwrap(), None);
    }
}
