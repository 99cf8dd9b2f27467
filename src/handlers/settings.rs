use axum::{extract::State, Json};
use validator::Validate;

use crate::error::AppResult;
use crate::models::settings::{Settings, UpdateSettingsRequest};
use crate::AppState;

pub async fn get_settings(State(state): State<AppState>) -> AppResult<Json<Settings>> {
    Ok(Json(state.store.settings().await?))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(body): Json<UpdateSettingsRequest>,
) -> AppResult<Json<Settings>> {
    body.validate()?;

    let settings = Settings {
        water_goal_ml: body.water_goal_ml,
    };
    state.store.save_settings(settings).await?;
    tracing::info!(water_goal_ml = settings.water_goal_ml, "Settings updated");

    Ok(Json(settings))
}
