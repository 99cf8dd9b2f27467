use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_WATER_GOAL_ML: u32 = 3000;

/// User preferences kept beside the local record cache.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub water_goal_ml: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            water_goal_ml: DEFAULT_WATER_GOAL_ML,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[validate(range(min = 250, max = 10000, message = "Water goal must be 250-10000 ml"))]
    pub water_goal_ml: u32,
}
