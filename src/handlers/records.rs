use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::parse_date;
use crate::dto::{ClearResponse, HistoryQuery};
use crate::error::{AppError, AppResult};
use crate::models::record::{DailyRecord, RecordPatch};
use crate::store::FetchedRecord;
use crate::AppState;

pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<DailyRecord>>> {
    let mut records = state.store.fetch_all_records(query.order).await;
    if let Some(term) = query.search.as_deref() {
        records.retain(|r| r.matches(term));
    }
    Ok(Json(records))
}

pub async fn get_record(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> AppResult<Json<FetchedRecord>> {
    let date = parse_date(&date)?;
    Ok(Json(state.store.fetch_record(date).await))
}

/// Full replacement of the day's record.
pub async fn put_record(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(record): Json<DailyRecord>,
) -> AppResult<Json<DailyRecord>> {
    let date = parse_date(&date)?;
    if record.date != date {
        return Err(AppError::Validation(format!(
            "Body date {} does not match path date {}",
            record.date, date
        )));
    }
    record.validate_ranges().map_err(AppError::Validation)?;

    let saved = state.store.save_record(record).await?;
    Ok(Json(saved))
}

/// Merge-patch of the day's record; returns the persisted result.
pub async fn patch_record(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(patch): Json<RecordPatch>,
) -> AppResult<Json<DailyRecord>> {
    let date = parse_date(&date)?;
    patch.validate_ranges().map_err(AppError::Validation)?;

    let updated = state.store.update_record(date, &patch).await?;
    Ok(Json(updated))
}

pub async fn clear_record(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> AppResult<Json<ClearResponse>> {
    let date = parse_date(&date)?;
    state.store.clear_record(date).await?;
    Ok(Json(ClearResponse {
        date,
        cleared: true,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::handlers::test_support::{app, send};

    #[tokio::test]
    async fn test_unvisited_day_is_empty() {
        let (app, _dir) = app();
        let (status, body) = send(&app, "GET", "/api/records/2024-08-01", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "empty");
        assert_eq!(body["record"]["date"], "2024-08-01");
        assert_eq!(body["record"]["waterMl"], 0);
        assert_eq!(body["record"]["meals"]["supper"], "skipped");
    }

    #[tokio::test]
    async fn test_invalid_date_is_rejected() {
        let (app, _dir) = app();
        let (status, body) = send(&app, "GET", "/api/records/08-01-2024", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], 422);
    }

    #[tokio::test]
    async fn test_put_then_get_round_trip() {
        let (app, _dir) = app();
        let record = json!({
            "date": "2024-08-02",
            "weight": 79.9,
            "waterMl": 2600,
            "didRun": true,
            "runCalories": 380,
            "didGym": false,
            "gymCalories": 0,
            "sleepHours": 7.5,
            "meals": {"breakfast": "on_diet", "lunch": "off_diet"},
            "notes": "rainy"
        });
        let (status, saved) = send(&app, "PUT", "/api/records/2024-08-02", Some(record)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, fetched) = send(&app, "GET", "/api/records/2024-08-02", None).await;
        assert_eq!(fetched["source"], "local");
        assert_eq!(fetched["record"], saved);
        assert_eq!(fetched["record"]["meals"]["lunch"], "off_diet");
    }

    #[tokio::test]
    async fn test_put_date_mismatch_rejected() {
        let (app, _dir) = app();
        let (status, _) = send(
            &app,
            "PUT",
            "/api/records/2024-08-03",
            Some(json!({"date": "2024-08-04"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_patch_turning_off_run_zeroes_calories() {
        let (app, _dir) = app();
        send(
            &app,
            "PATCH",
            "/api/records/2024-08-05",
            Some(json!({"didRun": true, "runCalories": 450, "waterDeltaMl": 500})),
        )
        .await;

        let (status, body) = send(
            &app,
            "PATCH",
            "/api/records/2024-08-05",
            Some(json!({"didRun": false, "waterDeltaMl": -250})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["runCalories"], 0);
        assert_eq!(body["waterMl"], 250);
    }

    #[tokio::test]
    async fn test_patch_out_of_range_sleep_rejected() {
        let (app, _dir) = app();
        let (status, _) = send(
            &app,
            "PATCH",
            "/api/records/2024-08-06",
            Some(json!({"sleepHours": 30})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_delete_resets_day() {
        let (app, _dir) = app();
        send(
            &app,
            "PATCH",
            "/api/records/2024-08-07",
            Some(json!({"weight": 81.0})),
        )
        .await;
        let (status, body) = send(&app, "DELETE", "/api/records/2024-08-07", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cleared"], true);

        let (_, fetched) = send(&app, "GET", "/api/records/2024-08-07", None).await;
        assert!(fetched["record"]["weight"].is_null());
        assert_eq!(fetched["record"]["waterMl"], 0);

        let (_, history) = send(&app, "GET", "/api/records", None).await;
        assert_eq!(history[0]["date"], "2024-08-07");
        assert!(history[0]["weight"].is_null());
    }

    #[tokio::test]
    async fn test_list_sorted_and_searchable() {
        let (app, _dir) = app();
        for (date, notes) in [
            ("2024-08-10", "Intervals"),
            ("2024-07-30", "rest day"),
            ("2024-08-01", "easy jog"),
        ] {
            send(
                &app,
                "PATCH",
                &format!("/api/records/{date}"),
                Some(json!({"notes": notes})),
            )
            .await;
        }

        let (_, desc) = send(&app, "GET", "/api/records?order=desc", None).await;
        let dates: Vec<&str> = desc
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["date"].as_str().unwrap())
            .collect();
        assert_eq!(dates, vec!["2024-08-10", "2024-08-01", "2024-07-30"]);

        let (_, found) = send(&app, "GET", "/api/records?search=INTERVAL", None).await;
        assert_eq!(found.as_array().unwrap().len(), 1);

        let (_, august) = send(&app, "GET", "/api/records?search=2024-08", None).await;
        assert_eq!(august.as_array().unwrap().len(), 2);
    }
}
