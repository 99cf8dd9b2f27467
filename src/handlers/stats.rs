use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    Json,
};
use validator::Validate;

use crate::dto::{CalendarQuery, WindowQuery};
use crate::error::AppResult;
use crate::services::analytics::{self, ChartRow, DayCompletion, SummaryStats};
use crate::store::SortOrder;
use crate::AppState;

pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<SummaryStats>> {
    query.validate()?;
    let records = state.store.fetch_all_records(SortOrder::Asc).await;
    Ok(Json(analytics::summary_stats(&records, query.window())))
}

pub async fn get_chart(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<Vec<ChartRow>>> {
    query.validate()?;
    let records = state.store.fetch_all_records(SortOrder::Asc).await;
    Ok(Json(analytics::chart_series(&records, query.window())))
}

pub async fn get_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<BTreeMap<u32, DayCompletion>>> {
    query.validate()?;
    let water_goal = match query.water_goal {
        Some(goal) => goal,
        None => state.store.settings().await?.water_goal_ml,
    };
    let records = state.store.fetch_all_records(SortOrder::Asc).await;
    Ok(Json(analytics::calendar_completion(
        &records,
        query.year,
        query.month,
        water_goal,
    )))
}
