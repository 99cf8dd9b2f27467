use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use super::postgres::PgRemote;
use super::rest::RestRemote;
use crate::config::RemoteConfig;
use crate::models::record::{DailyRecord, MealLog};

pub const TABLE: &str = "daily_logs";

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("remote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("remote database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Optional mirror of the record collection. Only point lookup, upsert by
/// date and an ascending scan are required.
pub trait RemoteTier: Send + Sync {
    fn fetch(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Option<DailyRecord>, RemoteError>> + Send;

    /// Replaces the whole row for `record.date`.
    fn upsert(&self, record: &DailyRecord) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn fetch_all(&self) -> impl Future<Output = Result<Vec<DailyRecord>, RemoteError>> + Send;

    fn ping(&self) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// Row shape of the remote `daily_logs` table (snake_case columns).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RemoteRow {
    pub date: NaiveDate,
    pub weight: Option<f64>,
    pub water_ml: Option<i32>,
    pub did_run: Option<bool>,
    pub run_calories: Option<i32>,
    pub did_gym: Option<bool>,
    pub gym_calories: Option<i32>,
    pub sleep_hours: Option<f64>,
    pub meals: Option<Json<MealLog>>,
    pub notes: Option<String>,
}

fn non_negative(value: Option<i32>) -> u32 {
    value.and_then(|v| u32::try_from(v).ok()).unwrap_or(0)
}

impl From<RemoteRow> for DailyRecord {
    fn from(row: RemoteRow) -> Self {
        DailyRecord {
            date: row.date,
            weight: row.weight,
            water_ml: non_negative(row.water_ml),
            did_run: row.did_run.unwrap_or(false),
            run_calories: non_negative(row.run_calories),
            did_gym: row.did_gym.unwrap_or(false),
            gym_calories: non_negative(row.gym_calories),
            sleep_hours: row.sleep_hours,
            meals: row.meals.map(|m| m.0).unwrap_or_default(),
            notes: row.notes,
        }
        .normalized()
    }
}

impl From<&DailyRecord> for RemoteRow {
    fn from(record: &DailyRecord) -> Self {
        let int = |v: u32| Some(i32::try_from(v).unwrap_or(i32::MAX));
        RemoteRow {
            date: record.date,
            weight: record.weight,
            water_ml: int(record.water_ml),
            did_run: Some(record.did_run),
            run_calories: int(record.run_calories),
            did_gym: Some(record.did_gym),
            gym_calories: int(record.gym_calories),
            sleep_hours: record.sleep_hours,
            meals: Some(Json(record.meals)),
            notes: record.notes.clone(),
        }
    }
}

/// The configured mirror backend.
pub enum RemoteBackend {
    Rest(RestRemote),
    Postgres(PgRemote),
}

impl RemoteBackend {
    pub async fn from_config(config: &RemoteConfig, timeout_secs: u64) -> Result<Self, RemoteError> {
        match config {
            RemoteConfig::Rest { url, api_key } => {
                Ok(RemoteBackend::Rest(RestRemote::new(url, api_key, timeout_secs)?))
            }
            RemoteConfig::Postgres { database_url } => {
                let pool = crate::db::create_pool(database_url, timeout_secs)?;
                crate::db::run_migrations(&pool).await;
                Ok(RemoteBackend::Postgres(PgRemote::new(pool)))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RemoteBackend::Rest(_) => "rest",
            RemoteBackend::Postgres(_) => "postgres",
        }
    }
}

impl RemoteTier for RemoteBackend {
    async fn fetch(&self, date: NaiveDate) -> Result<Option<DailyRecord>, RemoteError> {
        match self {
            RemoteBackend::Rest(r) => r.fetch(date).await,
            RemoteBackend::Postgres(p) => p.fetch(date).await,
        }
    }

    async fn upsert(&self, record: &DailyRecord) -> Result<(), RemoteError> {
        match self {
            RemoteBackend::Rest(r) => r.upsert(record).await,
            RemoteBackend::Postgres(p) => p.upsert(record).await,
        }
    }

    async fn fetch_all(&self) -> Result<Vec<DailyRecord>, RemoteError> {
        match self {
            RemoteBackend::Rest(r) => r.fetch_all().await,
            RemoteBackend::Postgres(p) => p.fetch_all().await,
        }
    }

    async fn ping(&self) -> Result<(), RemoteError> {
        match self {
            RemoteBackend::Rest(r) => r.ping().await,
            RemoteBackend::Postgres(p) => p.ping().await,
        }
    }
}
