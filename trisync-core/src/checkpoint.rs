//! Last-import-date watermark and its JSON file store.
//!
//! Loading never fails: a missing or broken file falls back to
//! `today - initial_lookback_days`. Saving ignores the date it is given and
//! writes `today - rescan_lookback_days`, so every run re-scans a short
//! window behind "now" and relies on import ids to drop the overlap.

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Days behind today used when no checkpoint exists yet.
pub const DEFAULT_INITIAL_LOOKBACK_DAYS: u64 = 60;
/// Days behind today written on every save.
pub const DEFAULT_RESCAN_LOOKBACK_DAYS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointPolicy {
    pub initial_lookback_days: u64,
    pub rescan_lookback_days: u64,
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self {
            initial_lookback_days: DEFAULT_INITIAL_LOOKBACK_DAYS,
            rescan_lookback_days: DEFAULT_RESCAN_LOOKBACK_DAYS,
        }
    }
}

/// `today - days`, clamped at the earliest representable date.
pub fn create_last_import_date(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub last_import_date: NaiveDate,
    /// Unknown keys found in the file, written back untouched
    pub extra: Map<String, Value>,
}

impl Checkpoint {
    pub fn new(last_import_date: NaiveDate) -> Self {
        Self {
            last_import_date,
            extra: Map::new(),
        }
    }
}

/// On-disk shape: `{ "lastImportDate": "YYYY-MM-DD", ... }`
#[derive(Debug, Default, Serialize, Deserialize)]
struct CheckpointDoc {
    #[serde(rename = "lastImportDate", default, skip_serializing_if = "Option::is_none")]
    last_import_date: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
    policy: CheckpointPolicy,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>, policy: CheckpointPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> CheckpointPolicy {
        self.policy
    }

    pub fn load(&self, today: NaiveDate) -> Checkpoint {
        let doc = self.read_doc().unwrap_or_else(|e| {
            debug!(path = %self.path.display(), error = %e, "no usable checkpoint, using defaults");
            CheckpointDoc::default()
        });

        let parsed = doc
            .last_import_date
            .as_deref()
            .and_then(parse_stored_date);

        let last_import_date = match parsed {
            Some(d) => d,
            None => {
                if let Some(raw) = doc.last_import_date.as_deref() {
                    warn!(value = raw, "unparsable lastImportDate in checkpoint, using default");
                }
                create_last_import_date(today, self.policy.initial_lookback_days)
            }
        };

        Checkpoint {
            last_import_date,
            extra: doc.extra,
        }
    }

    /// Persist the checkpoint. The stored date is recomputed from `today`;
    /// `checkpoint.last_import_date` is deliberately not written.
    pub fn save(&self, checkpoint: &Checkpoint, today: NaiveDate) -> Result<NaiveDate> {
        let next = create_last_import_date(today, self.policy.rescan_lookback_days);
        let doc = CheckpointDoc {
            last_import_date: Some(next.format("%Y-%m-%d").to_string()),
            extra: checkpoint.extra.clone(),
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(&doc).context("serialize checkpoint")?;
        fs::write(&self.path, json).with_context(|| format!("write {}", self.path.display()))?;

        debug!(path = %self.path.display(), last_import_date = %next, "checkpoint saved");
        Ok(next)
    }

    /// Remove the checkpoint file so the next load starts from the default.
    pub fn reset(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).with_context(|| format!("remove {}", self.path.display()))?;
        Ok(true)
    }

    fn read_doc(&self) -> Result<CheckpointDoc> {
        let s = fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        serde_json::from_str(&s).context("parse checkpoint")
    }
}

/// Accept a plain ISO date, or an ISO timestamp and keep its date part.
fn parse_stored_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_create_last_import_date() {
        assert_eq!(create_last_import_date(day(2020, 3, 4), 3), day(2020, 3, 1));
        assert_eq!(create_last_import_date(day(2020, 3, 1), 60), day(2020, 1, 1));
    }

    #[test]
    fn test_missing_file_defaults_to_initial_lookback() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join(".sync-config"), CheckpointPolicy::default());
        let cp = store.load(day(2020, 3, 1));
        assert_eq!(cp.last_import_date, day(2020, 1, 1));
        assert!(cp.extra.is_empty());
    }

    #[test]
    fn test_malformed_file_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".sync-config");
        fs::write(&path, "{ not json").unwrap();
        let store = CheckpointStore::new(&path, CheckpointPolicy::default());
        assert_eq!(store.load(day(2020, 3, 1)).last_import_date, day(2020, 1, 1));

        fs::write(&path, r#"{"lastImportDate": "yesterday"}"#).unwrap();
        assert_eq!(store.load(day(2020, 3, 1)).last_import_date, day(2020, 1, 1));
    }

    #[test]
    fn test_loads_stored_date() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".sync-config");
        fs::write(&path, r#"{"lastImportDate": "2020-02-20", "note": "keep"}"#).unwrap();
        let store = CheckpointStore::new(&path, CheckpointPolicy::default());
        let cp = store.load(day(2020, 3, 1));
        assert_eq!(cp.last_import_date, day(2020, 2, 20));
        assert_eq!(cp.extra.get("note"), Some(&Value::String("keep".into())));
    }

    #[test]
    fn test_save_recomputes_and_round_trips() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("state/.sync-config"), CheckpointPolicy::default());

        // The passed-in date is ignored on save
        let written = store.save(&Checkpoint::new(day(1999, 1, 1)), day(2020, 3, 10)).unwrap();
        assert_eq!(written, day(2020, 3, 7));

        // Load on a later day still sees the saved watermark
        let cp = store.load(day(2020, 4, 1));
        assert_eq!(cp.last_import_date, day(2020, 3, 7));

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"lastImportDate\": \"2020-03-07\""));
    }

    #[test]
    fn test_save_keeps_extra_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".sync-config");
        fs::write(&path, r#"{"lastImportDate": "2020-02-20", "note": "keep"}"#).unwrap();
        let store = CheckpointStore::new(&path, CheckpointPolicy::default());
        let cp = store.load(day(2020, 3, 1));
        store.save(&cp, day(2020, 3, 1)).unwrap();
        let again = store.load(day(2020, 3, 1));
        assert_eq!(again.extra.get("note"), Some(&Value::String("keep".into())));
    }

    #[test]
    fn test_reset_removes_file() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join(".sync-config"), CheckpointPolicy::default());
        assert!(!store.reset().unwrap());
        store.save(&Checkpoint::new(day(2020, 1, 1)), day(2020, 3, 1)).unwrap();
        assert!(store.reset().unwrap());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_parse_stored_date_accepts_timestamp() {
        assert_eq!(parse_stored_date("2020-03-01T00:00:00.000Z"), Some(day(2020, 3, 1)));
        assert_eq!(parse_stored_date("Sun Mar 01 2020"), None);
    }
}
