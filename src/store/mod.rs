//! Local-first record store with an optional remote mirror.
//!
//! Reads try the remote tier first and fall back to the local cache; writes
//! always land locally before the remote tier is attempted. Remote failures
//! are logged and never reach the caller. Local file work runs on the
//! blocking pool.

mod local;
mod postgres;
mod remote;
mod rest;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use local::LocalTier;
pub use remote::{RemoteBackend, RemoteError, RemoteTier};

use crate::models::record::{DailyRecord, RecordPatch};
use crate::models::settings::Settings;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("local cache I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("local cache encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("local cache task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Which tier answered a point lookup.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    Remote,
    Local,
    Empty,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchedRecord {
    pub record: DailyRecord,
    pub source: RecordSource,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RemoteStatus {
    Unconfigured,
    Ok { backend: &'static str },
    Unreachable { backend: &'static str, error: String },
}

pub struct RecordStore<R = RemoteBackend> {
    local: Arc<LocalTier>,
    remote: Option<R>,
    remote_kind: &'static str,
}

impl<R: RemoteTier> RecordStore<R> {
    pub fn new(local: LocalTier, remote: Option<R>) -> Self {
        Self {
            local: Arc::new(local),
            remote,
            remote_kind: "remote",
        }
    }

    /// Label reported by readiness checks.
    pub fn with_remote_kind(mut self, kind: &'static str) -> Self {
        self.remote_kind = kind;
        self
    }

    pub fn local(&self) -> &LocalTier {
        &self.local
    }

    pub fn remote_configured(&self) -> bool {
        self.remote.is_some()
    }

    /// Remote first, then local cache, then the empty record. Never fails.
    pub async fn fetch_record(&self, date: NaiveDate) -> FetchedRecord {
        if let Some(remote) = &self.remote {
            match remote.fetch(date).await {
                Ok(Some(record)) => {
                    return FetchedRecord {
                        record,
                        source: RecordSource::Remote,
                    }
                }
                Ok(None) => tracing::debug!(%date, "No remote row, checking local cache"),
                Err(e) => {
                    tracing::warn!(%date, error = %e, "Remote fetch failed, using local cache")
                }
            }
        }

        let cached = match self.on_local(move |local| Ok(local.get(date))).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::error!(%date, error = %e, "Local cache lookup failed");
                None
            }
        };
        match cached {
            Some(record) => FetchedRecord {
                record,
                source: RecordSource::Local,
            },
            None => FetchedRecord {
                record: DailyRecord::empty(date),
                source: RecordSource::Empty,
            },
        }
    }

    /// Normalizes and writes locally, then mirrors best-effort. Only a local
    /// failure is returned.
    pub async fn save_record(&self, record: DailyRecord) -> Result<DailyRecord, StoreError> {
        let record = record.normalized();
        let stored = record.clone();
        self.on_local(move |local| local.put(&stored)).await?;
        tracing::debug!(date = %record.date, "Record saved locally");
        self.mirror(&record).await;
        Ok(record)
    }

    pub async fn update_record(
        &self,
        date: NaiveDate,
        patch: &RecordPatch,
    ) -> Result<DailyRecord, StoreError> {
        let current = self.fetch_record(date).await.record;
        self.save_record(current.apply(patch)).await
    }

    /// Resets `date` to the empty record in both tiers. The remote row cannot
    /// be deleted, so the local entry is overwritten the same way and history
    /// reads alike whichever tier answers.
    pub async fn clear_record(&self, date: NaiveDate) -> Result<(), StoreError> {
        self.save_record(DailyRecord::empty(date)).await?;
        tracing::info!(%date, "Record cleared");
        Ok(())
    }

    /// Remote history when it has any rows, otherwise the local cache.
    pub async fn fetch_all_records(&self, order: SortOrder) -> Vec<DailyRecord> {
        let mut records = Vec::new();
        if let Some(remote) = &self.remote {
            match remote.fetch_all().await {
                Ok(rows) => records = rows,
                Err(e) => tracing::warn!(error = %e, "Remote history unavailable, using local cache"),
            }
        }
        if records.is_empty() {
            records = match self.on_local(|local| Ok(local.all())).await {
                Ok(records) => records,
                Err(e) => {
                    tracing::error!(error = %e, "Local cache scan failed");
                    Vec::new()
                }
            };
        }

        match order {
            SortOrder::Asc => records.sort_by(|a, b| a.date.cmp(&b.date)),
            SortOrder::Desc => records.sort_by(|a, b| b.date.cmp(&a.date)),
        }
        records
    }

    pub async fn settings(&self) -> Result<Settings, StoreError> {
        self.on_local(|local| Ok(local.settings())).await
    }

    pub async fn save_settings(&self, settings: Settings) -> Result<(), StoreError> {
        self.on_local(move |local| local.save_settings(&settings)).await
    }

    pub async fn check_local(&self) -> Result<(), StoreError> {
        self.on_local(LocalTier::check_writable).await
    }

    pub async fn remote_status(&self) -> RemoteStatus {
        let Some(remote) = &self.remote else {
            return RemoteStatus::Unconfigured;
        };
        match remote.ping().await {
            Ok(()) => RemoteStatus::Ok {
                backend: self.remote_kind,
            },
            Err(e) => RemoteStatus::Unreachable {
                backend: self.remote_kind,
                error: e.to_string(),
            },
        }
    }

    async fn on_local<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&LocalTier) -> Result<T, StoreError> + Send + 'static,
    {
        let local = Arc::clone(&self.local);
        tokio::task::spawn_blocking(move || op(local.as_ref())).await?
    }

    async fn mirror(&self, record: &DailyRecord) {
        let Some(remote) = &self.remote else {
            return;
        };
        if let Err(e) = remote.upsert(record).await {
            tracing::warn!(date = %record.date, error = %e, "Remote upsert failed, local copy kept");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::models::record::MealStatus;

    /// In-memory remote that can be switched offline.
    #[derive(Default)]
    struct MemoryRemote {
        rows: Mutex<BTreeMap<NaiveDate, DailyRecord>>,
        offline: bool,
        upserts: AtomicUsize,
    }

    impl MemoryRemote {
        fn offline() -> Self {
            Self {
                offline: true,
                ..Default::default()
            }
        }

        fn seeded(records: &[DailyRecord]) -> Self {
            let remote = Self::default();
            for r in records {
                remote.rows.lock().unwrap().insert(r.date, r.clone());
            }
            remote
        }

        fn check(&self) -> Result<(), RemoteError> {
            if self.offline {
                Err(RemoteError::Status {
                    status: 503,
                    body: "offline".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    impl RemoteTier for MemoryRemote {
        async fn fetch(&self, date: NaiveDate) -> Result<Option<DailyRecord>, RemoteError> {
            self.check()?;
            Ok(self.rows.lock().unwrap().get(&date).cloned())
        }

        async fn upsert(&self, record: &DailyRecord) -> Result<(), RemoteError> {
            self.upserts.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            self.rows.lock().unwrap().insert(record.date, record.clone());
            Ok(())
        }

        async fn fetch_all(&self) -> Result<Vec<DailyRecord>, RemoteError> {
            self.check()?;
            Ok(self.rows.lock().unwrap().values().cloned().collect())
        }

        async fn ping(&self) -> Result<(), RemoteError> {
            self.check()
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn local_only(dir: &tempfile::TempDir) -> RecordStore<MemoryRemote> {
        RecordStore::new(LocalTier::new(dir.path()), None)
    }

    fn with_remote(dir: &tempfile::TempDir, remote: MemoryRemote) -> RecordStore<MemoryRemote> {
        RecordStore::new(LocalTier::new(dir.path()), Some(remote))
    }

    fn logged(date: &str) -> DailyRecord {
        let mut r = DailyRecord::empty(day(date));
        r.weight = Some(82.3);
        r.water_ml = 2400;
        r.did_run = true;
        r.run_calories = 510;
        r.sleep_hours = Some(7.25);
        r.meals.breakfast = MealStatus::OnDiet;
        r.meals.dinner = MealStatus::OffDiet;
        r.notes = Some("long run".into());
        r
    }

    #[tokio::test]
    async fn test_never_saved_date_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_only(&dir);
        let fetched = store.fetch_record(day("2024-06-01")).await;
        assert_eq!(fetched.record, DailyRecord::empty(day("2024-06-01")));
        assert_eq!(fetched.source, RecordSource::Empty);
    }

    #[tokio::test]
    async fn test_save_then_fetch_local_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_only(&dir);
        let record = logged("2024-06-02");
        store.save_record(record.clone()).await.unwrap();

        let fetched = store.fetch_record(record.date).await;
        assert_eq!(fetched.record, record);
        assert_eq!(fetched.source, RecordSource::Local);
    }

    #[tokio::test]
    async fn test_clear_then_fetch_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = with_remote(&dir, MemoryRemote::default());
        let record = logged("2024-06-03");
        store.save_record(record.clone()).await.unwrap();
        store.clear_record(record.date).await.unwrap();

        let fetched = store.fetch_record(record.date).await;
        assert_eq!(fetched.record, DailyRecord::empty(record.date));
        assert_eq!(store.local().get(record.date), Some(DailyRecord::empty(record.date)));
    }

    #[tokio::test]
    async fn test_cleared_day_reads_alike_in_both_modes() {
        let local_dir = tempfile::tempdir().unwrap();
        let remote_dir = tempfile::tempdir().unwrap();
        let local = local_only(&local_dir);
        let mirrored = with_remote(&remote_dir, MemoryRemote::default());

        for store in [&local, &mirrored] {
            store.save_record(logged("2024-06-20")).await.unwrap();
            store.save_record(logged("2024-06-21")).await.unwrap();
            store.clear_record(day("2024-06-20")).await.unwrap();
        }

        let from_local = local.fetch_all_records(SortOrder::Asc).await;
        let from_remote = mirrored.fetch_all_records(SortOrder::Asc).await;
        assert_eq!(from_local, from_remote);
        assert_eq!(from_local[0], DailyRecord::empty(day("2024-06-20")));
        assert_eq!(from_local[1].water_ml, 2400);
    }

    #[tokio::test]
    async fn test_settings_round_trip_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_only(&dir);
        assert_eq!(store.settings().await.unwrap(), Settings::default());
        store
            .save_settings(Settings { water_goal_ml: 2200 })
            .await
            .unwrap();
        assert_eq!(store.settings().await.unwrap().water_goal_ml, 2200);
        store.check_local().await.unwrap();
    }

    #[tokio::test]
    async fn test_save_forces_calories_off_when_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_only(&dir);
        let mut record = logged("2024-06-04");
        record.did_run = false;
        record.did_gym = false;
        record.gym_calories = 200;
        let saved = store.save_record(record).await.unwrap();
        assert_eq!(saved.run_calories, 0);
        assert_eq!(saved.gym_calories, 0);
        assert_eq!(store.fetch_record(saved.date).await.record.run_calories, 0);
    }

    #[tokio::test]
    async fn test_update_applies_patch_over_stored_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_only(&dir);
        store.save_record(logged("2024-06-05")).await.unwrap();

        let patch = RecordPatch {
            did_run: Some(false),
            water_delta_ml: Some(250),
            ..Default::default()
        };
        let updated = store.update_record(day("2024-06-05"), &patch).await.unwrap();
        assert_eq!(updated.water_ml, 2650);
        assert_eq!(updated.run_calories, 0);
        assert_eq!(updated.notes.as_deref(), Some("long run"));
    }

    #[tokio::test]
    async fn test_remote_wins_over_local() {
        let dir = tempfile::tempdir().unwrap();
        let mut remote_copy = logged("2024-06-06");
        remote_copy.water_ml = 3100;
        let store = with_remote(&dir, MemoryRemote::seeded(&[remote_copy.clone()]));
        store.local().put(&logged("2024-06-06")).unwrap();

        let fetched = store.fetch_record(day("2024-06-06")).await;
        assert_eq!(fetched.source, RecordSource::Remote);
        assert_eq!(fetched.record.water_ml, 3100);
    }

    #[tokio::test]
    async fn test_remote_miss_falls_back_to_local() {
        let dir = tempfile::tempdir().unwrap();
        let store = with_remote(&dir, MemoryRemote::default());
        store.local().put(&logged("2024-06-07")).unwrap();

        let fetched = store.fetch_record(day("2024-06-07")).await;
        assert_eq!(fetched.source, RecordSource::Local);
    }

    #[tokio::test]
    async fn test_remote_outage_keeps_local_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = with_remote(&dir, MemoryRemote::offline());
        let record = logged("2024-06-08");

        let saved = store.save_record(record.clone()).await.unwrap();
        assert_eq!(saved, record);
        assert_eq!(store.remote.as_ref().unwrap().upserts.load(Ordering::SeqCst), 1);

        let fetched = store.fetch_record(record.date).await;
        assert_eq!(fetched.record, record);
        assert_eq!(fetched.source, RecordSource::Local);
    }

    #[tokio::test]
    async fn test_save_mirrors_to_remote() {
        let dir = tempfile::tempdir().unwrap();
        let store = with_remote(&dir, MemoryRemote::default());
        let record = logged("2024-06-09");
        store.save_record(record.clone()).await.unwrap();

        let remote = store.remote.as_ref().unwrap();
        assert_eq!(remote.rows.lock().unwrap().get(&record.date), Some(&record));
    }

    #[tokio::test]
    async fn test_history_prefers_non_empty_remote() {
        let dir = tempfile::tempdir().unwrap();
        let store = with_remote(
            &dir,
            MemoryRemote::seeded(&[logged("2024-06-12"), logged("2024-06-10")]),
        );
        store.local().put(&logged("2024-06-11")).unwrap();

        let all = store.fetch_all_records(SortOrder::Asc).await;
        let dates: Vec<String> = all.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-06-10", "2024-06-12"]);
    }

    #[tokio::test]
    async fn test_history_falls_back_when_remote_empty_or_down() {
        for remote in [MemoryRemote::default(), MemoryRemote::offline()] {
            let dir = tempfile::tempdir().unwrap();
            let store = with_remote(&dir, remote);
            for date in ["2024-06-13", "2024-06-15", "2024-06-14"] {
                store.local().put(&logged(date)).unwrap();
            }

            let desc = store.fetch_all_records(SortOrder::Desc).await;
            let dates: Vec<String> = desc.iter().map(|r| r.date.to_string()).collect();
            assert_eq!(dates, vec!["2024-06-15", "2024-06-14", "2024-06-13"]);
        }
    }

    #[tokio::test]
    async fn test_remote_status() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(local_only(&dir).remote_status().await, RemoteStatus::Unconfigured);

        let up = with_remote(&dir, MemoryRemote::default()).with_remote_kind("memory");
        assert_eq!(up.remote_status().await, RemoteStatus::Ok { backend: "memory" });

        let down = with_remote(&dir, MemoryRemote::offline());
        assert!(matches!(down.remote_status().await, RemoteStatus::Unreachable { .. }));
    }
}
