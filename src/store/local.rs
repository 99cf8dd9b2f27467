use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::StoreError;
use crate::models::record::DailyRecord;
use crate::models::settings::Settings;

pub const RECORDS_FILE: &str = "habitflow_data.json";
pub const SETTINGS_FILE: &str = "habitflow_settings.json";

pub type RecordCollection = BTreeMap<NaiveDate, DailyRecord>;

/// The records file as stored: entries stay raw so that one that no longer
/// decodes is carried through rewrites instead of being dropped.
type RawCollection = BTreeMap<String, Value>;

const COUNTER_FIELDS: [&str; 3] = ["waterMl", "runCalories", "gymCalories"];

/// On-disk cache: one JSON object mapping date to record, always available
/// and synchronous.
pub struct LocalTier {
    dir: PathBuf,
    // Serializes read-modify-write cycles on the files.
    lock: Mutex<()>,
}

impl LocalTier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn records_path(&self) -> PathBuf {
        self.dir.join(RECORDS_FILE)
    }

    fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    pub fn get(&self, date: NaiveDate) -> Option<DailyRecord> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut raw = load_raw(&self.records_path());
        let key = date.to_string();
        let value = raw.remove(&key)?;
        decode_entry(&key, value)
    }

    pub fn all(&self) -> Vec<DailyRecord> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        decode_collection(load_raw(&self.records_path()))
            .into_values()
            .collect()
    }

    pub fn put(&self, record: &DailyRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let path = self.records_path();
        let mut raw = load_raw(&path);
        raw.insert(record.date.to_string(), serde_json::to_value(record)?);
        write_json(&path, &raw)
    }

    pub fn settings(&self) -> Settings {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        load_or_default(&self.settings_path())
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        write_json(&self.settings_path(), settings)
    }

    /// Used by readiness checks: the data directory must exist and be writable.
    pub fn check_writable(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let marker = self.dir.join(".write_check");
        fs::write(&marker, b"ok").map_err(|e| StoreError::io(&marker, e))?;
        fs::remove_file(&marker).map_err(|e| StoreError::io(&marker, e))
    }
}

/// Reads the records file as raw entries. A file that is not a JSON object at
/// all is moved aside so the next write cannot destroy it.
fn load_raw(path: &Path) -> RawCollection {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return RawCollection::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Local cache unreadable, treating as empty");
            return RawCollection::new();
        }
    };
    match serde_json::from_slice(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            let aside = corrupt_path(path);
            match fs::rename(path, &aside) {
                Ok(()) => tracing::warn!(
                    path = %path.display(),
                    moved_to = %aside.display(),
                    error = %e,
                    "Local cache corrupt, moved aside"
                ),
                Err(rename_err) => tracing::error!(
                    path = %path.display(),
                    error = %e,
                    rename_error = %rename_err,
                    "Local cache corrupt and could not be moved aside"
                ),
            }
            RawCollection::new()
        }
    }
}

fn corrupt_path(path: &Path) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f");
    path.with_extension(format!("json.corrupt-{stamp}"))
}

fn decode_collection(raw: RawCollection) -> RecordCollection {
    raw.into_iter()
        .filter_map(|(key, value)| decode_entry(&key, value))
        .map(|record| (record.date, record))
        .collect()
}

/// Decodes one entry, clamping negative counters to zero the way remote rows
/// are. Entries that still fail are logged and skipped.
fn decode_entry(key: &str, mut value: Value) -> Option<DailyRecord> {
    if let Value::Object(fields) = &mut value {
        for field in COUNTER_FIELDS {
            if fields.get(field).and_then(Value::as_i64).is_some_and(|v| v < 0) {
                fields.insert(field.to_string(), Value::from(0));
            }
        }
        fields
            .entry("date")
            .or_insert_with(|| Value::String(key.to_string()));
    }

    match serde_json::from_value::<DailyRecord>(value) {
        Ok(record) if record.date.to_string() == key => Some(record.normalized()),
        Ok(record) => {
            tracing::warn!(key, date = %record.date, "Local entry keyed under the wrong date, skipped");
            None
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "Local entry undecodable, skipped");
            None
        }
    }
}

/// Missing or unparseable files read as the default value.
fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Settings unreadable, using defaults");
            return T::default();
        }
    };
    match serde_json::from_slice(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Settings corrupt, using defaults");
            T::default()
        }
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let encoded = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, encoded).map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))
}
