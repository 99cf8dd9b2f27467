use chrono::NaiveDate;
use sqlx::PgPool;

use super::remote::{RemoteError, RemoteRow, RemoteTier};
use crate::models::record::DailyRecord;

const SELECT_BY_DATE: &str = r#"
    SELECT date, weight, water_ml, did_run, run_calories, did_gym,
           gym_calories, sleep_hours, meals, notes
    FROM daily_logs
    WHERE date = $1
"#;

const SELECT_ALL: &str = r#"
    SELECT date, weight, water_ml, did_run, run_calories, did_gym,
           gym_calories, sleep_hours, meals, notes
    FROM daily_logs
    ORDER BY date ASC
"#;

// Bind order must follow the column list.
const UPSERT: &str = r#"
    INSERT INTO daily_logs
        (date, weight, water_ml, did_run, run_calories, did_gym,
         gym_calories, sleep_hours, meals, notes)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
    ON CONFLICT (date) DO UPDATE SET
        weight = EXCLUDED.weight,
        water_ml = EXCLUDED.water_ml,
        did_run = EXCLUDED.did_run,
        run_calories = EXCLUDED.run_calories,
        did_gym = EXCLUDED.did_gym,
        gym_calories = EXCLUDED.gym_calories,
        sleep_hours = EXCLUDED.sleep_hours,
        meals = EXCLUDED.meals,
        notes = EXCLUDED.notes,
        updated_at = NOW()
"#;

/// Direct Postgres mirror of the `daily_logs` table.
pub struct PgRemote {
    pool: PgPool,
}

impl PgRemote {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl RemoteTier for PgRemote {
    async fn fetch(&self, date: NaiveDate) -> Result<Option<DailyRecord>, RemoteError> {
        let row = sqlx::query_as::<_, RemoteRow>(SELECT_BY_DATE)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(DailyRecord::from))
    }

    async fn upsert(&self, record: &DailyRecord) -> Result<(), RemoteError> {
        let row = RemoteRow::from(record);
        sqlx::query(UPSERT)
            .bind(row.date)
            .bind(row.weight)
            .bind(row.water_ml)
            .bind(row.did_run)
            .bind(row.run_calories)
            .bind(row.did_gym)
            .bind(row.gym_calories)
            .bind(row.sleep_hours)
            .bind(row.meals)
            .bind(row.notes)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<DailyRecord>, RemoteError> {
        let rows = sqlx::query_as::<_, RemoteRow>(SELECT_ALL)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(DailyRecord::from).collect())
    }

    async fn ping(&self) -> Result<(), RemoteError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
