use axum::{
    extract::{Path, State},
    Json,
};

use super::parse_date;
use crate::error::AppResult;
use crate::services::insight::InsightResponse;
use crate::AppState;

pub async fn get_insight(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> AppResult<Json<InsightResponse>> {
    let date = parse_date(&date)?;
    let record = state.store.fetch_record(date).await.record;
    Ok(Json(state.insights.generate(&record).await))
}
