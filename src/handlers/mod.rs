pub mod health;
pub mod insights;
pub mod records;
pub mod settings;
pub mod stats;

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};

/// Path dates must be `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date '{raw}', expected YYYY-MM-DD")))
}
