//! # HabitFlow — Request/Response DTOs
//!
//! Query and response shapes of the HTTP API that are not domain types.
//!
//! Conventions:
//! - `*Query`    → deserialized from query params
//! - `*Response` → serialized to client JSON
//! - Range validation is expressed via `validator` derive macros

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::analytics::DEFAULT_WINDOW;
use crate::store::SortOrder;

// ============================================================================
// Records
// ============================================================================

/// GET /api/records
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub order: SortOrder,
    /// Matches a date fragment or text in the notes.
    pub search: Option<String>,
}

/// DELETE /api/records/:date
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub date: NaiveDate,
    pub cleared: bool,
}

// ============================================================================
// Stats
// ============================================================================

/// GET /api/stats/summary, GET /api/stats/chart
#[derive(Debug, Deserialize, Validate)]
pub struct WindowQuery {
    #[validate(range(min = 1, max = 365, message = "window must be 1-365"))]
    pub window: Option<usize>,
}

impl WindowQuery {
    pub fn window(&self) -> usize {
        self.window.unwrap_or(DEFAULT_WINDOW)
    }
}

/// GET /api/stats/calendar
#[derive(Debug, Deserialize, Validate)]
pub struct CalendarQuery {
    #[validate(range(min = 1970, max = 2100, message = "year out of range"))]
    pub year: i32,

    #[validate(range(min = 1, max = 12, message = "month must be 1-12"))]
    pub month: u32,

    /// Falls back to the stored setting.
    #[validate(range(min = 1, max = 20000, message = "water_goal must be 1-20000 ml"))]
    pub water_goal: Option<u32>,
}
