//! Record store: the persisted dataset plus the extraction snapshot slot.
//!
//! # Storage layout
//!
//! ```text
//! <base>/
//!   output/
//!     records.json    (persisted dataset, mode 0600)
//!     snapshot.json   (latest raw extraction batch; its mtime is the watermark)
//! ```
//!
//! Both paths are configurable. Writes go through [`crate::atomic`], so a
//! reader never observes a half-written file.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::atomic::{self, StagedFile};
use crate::error::{io_err, StoreError};
use crate::types::{RawRecord, Record};
use crate::watermark::Watermark;

/// Outcome of a tolerant dataset load.
#[derive(Debug)]
pub enum StoreLoad {
    /// No dataset file yet.
    Missing,
    /// The file holds an empty list.
    Empty,
    Loaded(Vec<Record>),
    /// The file exists but could not be used.
    Malformed(StoreError),
}

/// Handle on the two files that make up the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStore {
    dataset_path: PathBuf,
    snapshot_path: PathBuf,
}

impl RecordStore {
    pub fn new(dataset_path: impl Into<PathBuf>, snapshot_path: impl Into<PathBuf>) -> Self {
        RecordStore {
            dataset_path: dataset_path.into(),
            snapshot_path: snapshot_path.into(),
        }
    }

    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn exists(&self) -> bool {
        self.dataset_path.exists()
    }

    /// Current freshness of the snapshot slot.
    pub fn watermark(&self) -> Watermark {
        Watermark::of(&self.snapshot_path)
    }

    // -----------------------------------------------------------------------
    // Dataset
    // -----------------------------------------------------------------------

    /// Load the persisted dataset.
    ///
    /// Returns an empty list if the file does not exist yet,
    /// [`StoreError::Parse`] if it is not a JSON list of records and
    /// [`StoreError::Invalid`] if names are blank or repeated.
    pub fn load(&self) -> Result<Vec<Record>, StoreError> {
        let path = &self.dataset_path;
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_err(path, err)),
        };
        let records: Vec<Record> =
            serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?;
        validate(path, &records)?;
        Ok(records)
    }

    /// Load without failing: every problem is folded into [`StoreLoad`].
    pub fn load_or_empty(&self) -> StoreLoad {
        if !self.dataset_path.exists() {
            return StoreLoad::Missing;
        }
        match self.load() {
            Ok(records) if records.is_empty() => StoreLoad::Empty,
            Ok(records) => StoreLoad::Loaded(records),
            Err(err) => StoreLoad::Malformed(err),
        }
    }

    /// Atomically replace the persisted dataset.
    ///
    /// Output is pretty-printed JSON with a fixed field order and a trailing
    /// newline, so unchanged data saves byte-identically.
    pub fn save(&self, records: &[Record]) -> Result<(), StoreError> {
        Ok(self.stage_save(records)?.commit()?)
    }

    /// Validate and serialize `records` into a staged write of the dataset.
    /// Nothing changes on disk until the returned stage is committed.
    pub fn stage_save(&self, records: &[Record]) -> Result<StagedFile, StoreError> {
        validate(&self.dataset_path, records)?;
        let mut json = serde_json::to_string_pretty(records)?;
        json.push('\n');
        let staged = atomic::stage(&self.dataset_path, json.as_bytes())?;
        staged.restrict_to_owner()?;
        Ok(staged)
    }

    // -----------------------------------------------------------------------
    // Snapshot slot
    // -----------------------------------------------------------------------

    /// Parse the snapshot slot as a list of raw records.
    pub fn load_snapshot(&self) -> Result<Vec<RawRecord>, StoreError> {
        let path = &self.snapshot_path;
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
            path: path.clone(),
            source,
        })
    }

    /// Atomically replace the snapshot slot with `contents`. This advances the
    /// watermark.
    pub fn write_snapshot(&self, contents: &str) -> Result<(), StoreError> {
        Ok(atomic::replace(&self.snapshot_path, contents.as_bytes())?)
    }
}

/// Check invariant 1: every name is usable and unique.
pub fn validate(path: &Path, records: &[Record]) -> Result<(), StoreError> {
    let mut seen = HashSet::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        if record.name.trim().is_empty() {
            return Err(StoreError::Invalid {
                path: path.to_path_buf(),
                reason: format!("record #{index} has an empty name"),
            });
        }
        if !seen.insert(record.name.as_str()) {
            return Err(StoreError::Invalid {
                path: path.to_path_buf(),
                reason: format!("duplicate name '{}'", record.name),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> RecordStore {
        RecordStore::new(
            dir.path().join("output").join("records.json"),
            dir.path().join("output").join("snapshot.json"),
        )
    }

    #[test]
    fn missing_dataset_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        assert!(store.load().unwrap().is_empty());
        assert!(matches!(store.load_or_empty(), StoreLoad::Missing));
    }

    #[test]
    fn save_creates_parent_and_cleans_tmp() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store
            .save(&[Record::new("Alpha", "111", "2024-01-01")])
            .unwrap();
        assert!(store.dataset_path().exists());
        assert!(
            !atomic::tmp_path_for(store.dataset_path()).exists(),
            "tmp file must be gone after a successful save"
        );
    }

    #[test]
    #[cfg(unix)]
    fn saved_dataset_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.save(&[Record::new("A", "1", "d")]).unwrap();
        let mode = std::fs::metadata(store.dataset_path())
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn uncommitted_stage_keeps_previous_dataset() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.save(&[Record::new("A", "1", "d")]).unwrap();

        let staged = store.stage_save(&[Record::new("B", "2", "d")]).unwrap();
        assert_eq!(store.load().unwrap(), vec![Record::new("A", "1", "d")]);
        drop(staged);
        assert_eq!(store.load().unwrap(), vec![Record::new("A", "1", "d")]);
        assert!(!atomic::tmp_path_for(store.dataset_path()).exists());
    }

    #[test]
    fn save_rejects_duplicate_names() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let err = store
            .save(&[Record::new("A", "1", "d"), Record::new("A", "2", "d")])
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid { .. }), "got: {err}");
        assert!(!store.dataset_path().exists());
    }

    #[test]
    fn non_list_json_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        std::fs::create_dir_all(store.dataset_path().parent().unwrap()).unwrap();
        std::fs::write(store.dataset_path(), r#"{"name":"A"}"#).unwrap();
        assert!(matches!(store.load(), Err(StoreError::Parse { .. })));
        assert!(matches!(store.load_or_empty(), StoreLoad::Malformed(_)));
    }

    #[test]
    fn empty_list_is_reported_as_empty() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.save(&[]).unwrap();
        assert!(matches!(store.load_or_empty(), StoreLoad::Empty));
    }

    #[test]
    fn snapshot_write_advances_watermark() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        assert!(!store.watermark().is_present());
        store
            .write_snapshot(r#"[{"name":"A","secret":"1"}]"#)
            .unwrap();
        assert!(store.watermark().is_present());
        let raw = store.load_snapshot().unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].effective_date, None);
    }
}
