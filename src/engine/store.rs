//! Versioned JSON records in the state directory.
//!
//! Each record kind lives in its own file as
//! `{ "version": 1, "kind": "...", "data": ... }`. Anything that does not
//! load cleanly is treated as absent.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::state::ShuffleState;
use crate::error::StoreError;
use crate::library::TrackInfo;

pub const FORMAT_VERSION: u64 = 1;

/// A type the store knows how to file.
pub trait Record: Serialize + DeserializeOwned {
    const KIND: &'static str;
    const FILE_NAME: &'static str;
}

impl Record for ShuffleState {
    const KIND: &'static str = "shuffle_state";
    const FILE_NAME: &'static str = "shuffle_state.json";
}

impl Record for TrackInfo {
    const KIND: &'static str = "track_info";
    const FILE_NAME: &'static str = "track_info.json";
}

#[derive(Serialize)]
struct EnvelopeOut<'a, T> {
    version: u64,
    kind: &'static str,
    data: &'a T,
}

#[derive(Deserialize)]
struct EnvelopeIn {
    version: u64,
    kind: String,
    data: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct PersistenceStore {
    dir: PathBuf,
}

impl PersistenceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of<T: Record>(&self) -> PathBuf {
        self.dir.join(T::FILE_NAME)
    }

    /// Write `value`, or delete the record when it is `None`.
    pub fn save<T: Record>(&self, value: Option<&T>) -> Result<(), StoreError> {
        let path = self.path_of::<T>();
        let Some(value) = value else {
            return match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(source) => Err(StoreError::Io { path, source }),
            };
        };

        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(&EnvelopeOut {
            version: FORMAT_VERSION,
            kind: T::KIND,
            data: value,
        })?;

        // Write beside the target and rename over it.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(kind = T::KIND, "saved record");
        Ok(())
    }

    /// The stored record, or `None` if it is missing or unreadable.
    pub fn load<T: Record>(&self) -> Option<T> {
        match self.try_load::<T>() {
            Ok(value) => value,
            Err(e) => {
                info!(kind = T::KIND, "cannot load record: {e}");
                None
            }
        }
    }

    fn try_load<T: Record>(&self) -> Result<Option<T>, StoreError> {
        let path = self.path_of::<T>();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let envelope: EnvelopeIn = serde_json::from_str(&content)?;
        if envelope.version != FORMAT_VERSION {
            return Err(StoreError::Version {
                found: envelope.version,
                expected: FORMAT_VERSION,
            });
        }
        if envelope.kind != T::KIND {
            return Err(StoreError::Kind {
                found: envelope.kind,
                expected: T::KIND,
            });
        }
        Ok(Some(serde_json::from_value(envelope.data)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn sample_info() -> TrackInfo {
        let mut info = TrackInfo::new(
            "/music/a/01.flac".into(),
            "Intro".into(),
            Duration::from_secs(200),
        );
        info.artist = Some("Band".into());
        info.track_number = 1;
        info.set_elapsed(Duration::from_millis(30_500));
        info
    }

    #[test]
    fn saved_record_loads_back() {
        let dir = tempdir().unwrap();
        let store = PersistenceStore::new(dir.path().join("nested"));
        store.save(Some(&sample_info())).unwrap();

        let back: TrackInfo = store.load().unwrap();
        assert_eq!(back.path, PathBuf::from("/music/a/01.flac"));
        assert_eq!(back.artist.as_deref(), Some("Band"));
        assert_eq!(back.elapsed(), Duration::from_millis(30_500));
        assert!(!dir.path().join("nested/track_info.json.tmp").exists());
    }

    #[test]
    fn saving_none_deletes_the_record() {
        let dir = tempdir().unwrap();
        let store = PersistenceStore::new(dir.path());
        store.save(Some(&ShuffleState::default())).unwrap();
        assert!(store.load::<ShuffleState>().is_some());

        store.save::<ShuffleState>(None).unwrap();
        assert!(store.load::<ShuffleState>().is_none());
        store.save::<ShuffleState>(None).unwrap();
    }

    #[test]
    fn missing_and_corrupt_records_are_absent() {
        let dir = tempdir().unwrap();
        let store = PersistenceStore::new(dir.path());
        assert!(store.load::<TrackInfo>().is_none());

        fs::write(dir.path().join("track_info.json"), "{ not json").unwrap();
        assert!(store.load::<TrackInfo>().is_none());
    }

    #[test]
    fn other_versions_are_absent() {
        let dir = tempdir().unwrap();
        let store = PersistenceStore::new(dir.path());
        store.save(Some(&sample_info())).unwrap();

        let path = dir.path().join("track_info.json");
        let bumped = fs::read_to_string(&path)
            .unwrap()
            .replace("\"version\": 1", "\"version\": 2");
        fs::write(&path, bumped).unwrap();

        assert!(matches!(
            store.try_load::<TrackInfo>(),
            Err(StoreError::Version {
                found: 2,
                expected: 1
            })
        ));
        assert!(store.load::<TrackInfo>().is_none());
    }

    #[test]
    fn kind_must_match_the_file() {
        let dir = tempdir().unwrap();
        let store = PersistenceStore::new(dir.path());
        store.save(Some(&ShuffleState::default())).unwrap();
        fs::copy(
            dir.path().join("shuffle_state.json"),
            dir.path().join("track_info.json"),
        )
        .unwrap();

        assert!(matches!(
            store.try_load::<TrackInfo>(),
            Err(StoreError::Kind { .. })
        ));
    }
}
