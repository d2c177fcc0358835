//! File-backed run record.
//!
//! Layout inside the data directory:
//! ```text
//! run.meta.json   - schema version, last start, launch count
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current schema version of `run.meta.json`.
pub const RUN_SCHEMA_VERSION: u32 = 1;

const META_FILE: &str = "run.meta.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("start time {0:?} is before the unix epoch")]
    BeforeEpoch(SystemTime),
}

/// Contents of `run.meta.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMeta {
    pub schema_version: u32,
    /// Start of the most recent run, unix milliseconds. `None` until the
    /// first start is recorded.
    pub last_start_unix_ms: Option<u64>,
    pub launch_count: u64,
}

impl Default for RunMeta {
    fn default() -> Self {
        Self {
            schema_version: RUN_SCHEMA_VERSION,
            last_start_unix_ms: None,
            launch_count: 0,
        }
    }
}

/// Remembers when the program last started.
#[derive(Debug)]
pub struct RunStore {
    root: PathBuf,
    meta: RunMeta,
}

impl RunMeta {
    /// Start of the last recorded run.
    pub fn last_start(&self) -> Option<SystemTime> {
        self.last_start_unix_ms
            .map(|ms| UNIX_EPOCH + Duration::from_millis(ms))
    }
}

impl RunStore {
    /// Open the store at `path`, creating the directory and an empty record
    /// if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;

        let meta_path = root.join(META_FILE);
        let meta = if let Some(meta) = Self::read_meta(&root)? {
            meta
        } else {
            let meta = RunMeta::default();
            serde_json::to_writer_pretty(std::fs::File::create(&meta_path)?, &meta)?;
            tracing::debug!(path = %meta_path.display(), "created run record");
            meta
        };

        Ok(Self { root, meta })
    }

    /// Read the record at `path` without creating anything. `None` if no
    /// run was ever recorded there.
    pub fn read_meta(path: impl AsRef<Path>) -> Result<Option<RunMeta>, StoreError> {
        let meta_path = path.as_ref().join(META_FILE);
        if !meta_path.exists() {
            return Ok(None);
        }
        let meta: RunMeta = serde_json::from_reader(std::fs::File::open(&meta_path)?)?;
        if meta.schema_version != RUN_SCHEMA_VERSION {
            return Err(StoreError::SchemaMismatch {
                file_version: meta.schema_version,
                expected_version: RUN_SCHEMA_VERSION,
            });
        }
        Ok(Some(meta))
    }

    /// Start of the previous run, if one was recorded.
    pub fn previous_start(&self) -> Option<SystemTime> {
        self.meta.last_start()
    }

    /// Record `start` as the latest run and persist it.
    pub fn record_start(&mut self, start: SystemTime) -> Result<(), StoreError> {
        let since_epoch = start
            .duration_since(UNIX_EPOCH)
            .map_err(|_| StoreError::BeforeEpoch(start))?;
        self.meta.last_start_unix_ms = Some(since_epoch.as_millis() as u64);
        self.meta.launch_count += 1;
        self.save_meta()?;
        tracing::info!(launch = self.meta.launch_count, "recorded program start");
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta(&self) -> &RunMeta {
        &self.meta
    }

    fn save_meta(&self) -> Result<(), StoreError> {
        let path = self.root.join(META_FILE);
        serde_json::to_writer_pretty(std::fs::File::create(path)?, &self.meta)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_meta_has_no_side_effects() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("never-opened");
        assert!(RunStore::read_meta(&root).unwrap().is_none());
        assert!(!root.exists());

        let start = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        RunStore::open(&root).unwrap().record_start(start).unwrap();
        let meta = RunStore::read_meta(&root).unwrap().unwrap();
        assert_eq!(meta.last_start(), Some(start));
        assert_eq!(meta.launch_count, 1);
    }

    #[test]
    fn open_creates_empty_record() {
        let tmp = tempfile::tempdir().unwrap();
        let store = RunStore::open(tmp.path().join("data")).unwrap();
        assert_eq!(store.meta(), &RunMeta::default());
        assert_eq!(store.previous_start(), None);
        assert!(store.root().join(META_FILE).is_file());
    }

    #[test]
    fn recorded_start_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data");
        let start = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);

        {
            let mut store = RunStore::open(&path).unwrap();
            store.record_start(start).unwrap();
        }

        let store = RunStore::open(&path).unwrap();
        assert_eq!(store.previous_start(), Some(start));
        assert_eq!(store.meta().launch_count, 1);
    }

    #[test]
    fn launch_count_increments() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = RunStore::open(tmp.path()).unwrap();
        store.record_start(SystemTime::now()).unwrap();
        store.record_start(SystemTime::now()).unwrap();
        assert_eq!(RunStore::open(tmp.path()).unwrap().meta().launch_count, 2);
    }

    #[test]
    fn sub_millisecond_precision_is_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = RunStore::open(tmp.path()).unwrap();
        let start = UNIX_EPOCH + Duration::from_micros(5_000_700);
        store.record_start(start).unwrap();
        assert_eq!(
            store.previous_start(),
            Some(UNIX_EPOCH + Duration::from_millis(5_000))
        );
    }

    #[test]
    fn schema_mismatch_fail_closed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data");
        let _store = RunStore::open(&path).unwrap();

        let meta_path = path.join(META_FILE);
        let mut meta: RunMeta =
            serde_json::from_reader(std::fs::File::open(&meta_path).unwrap()).unwrap();
        meta.schema_version = 999;
        serde_json::to_writer_pretty(std::fs::File::create(&meta_path).unwrap(), &meta).unwrap();

        match RunStore::open(&path) {
            Err(StoreError::SchemaMismatch {
                file_version,
                expected_version,
            }) => {
                assert_eq!(file_version, 999);
                assert_eq!(expected_version, RUN_SCHEMA_VERSION);
            }
            Err(e) => panic!("expected SchemaMismatch, got: {e}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
        // Left untouched.
        let on_disk: RunMeta =
            serde_json::from_reader(std::fs::File::open(&meta_path).unwrap()).unwrap();
        assert_eq!(on_disk.schema_version, 999);
    }

    #[test]
    fn corrupt_record_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(META_FILE), "not json").unwrap();
        assert!(matches!(RunStore::open(tmp.path()), Err(StoreError::Json(_))));
    }
}
