use serde::Serialize;

use crate::models::record::{DailyRecord, MealLog, MealStatus};

pub const FALLBACK_UNCONFIGURED: &str =
    "Set CLAUDE_API_KEY to receive personalised feedback about your day.";
pub const FALLBACK_UNREACHABLE: &str =
    "Couldn't reach the virtual coach right now. Check your connection and try again.";
pub const FALLBACK_EMPTY: &str = "No insight could be generated at the moment.";

/// Daily water target the coach reminds about.
pub const COACH_WATER_TARGET_ML: u32 = 2500;

const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InsightSource {
    Claude,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct InsightResponse {
    pub date: chrono::NaiveDate,
    pub message: String,
    pub source: InsightSource,
}

/// Short motivational feedback for one day. Never fails: every problem turns
/// into a fixed fallback message.
pub struct InsightService {
    api_key: String,
    model: String,
    endpoint: String,
}

impl InsightService {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: ANTHROPIC_MESSAGES_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub async fn generate(&self, record: &DailyRecord) -> InsightResponse {
        let fallback = |message: &str| InsightResponse {
            date: record.date,
            message: message.to_string(),
            source: InsightSource::Fallback,
        };

        if !self.is_configured() {
            return fallback(FALLBACK_UNCONFIGURED);
        }

        match self.call_claude(&build_prompt(record)).await {
            Ok(text) if !text.trim().is_empty() => InsightResponse {
                date: record.date,
                message: text.trim().to_string(),
                source: InsightSource::Claude,
            },
            Ok(_) => fallback(FALLBACK_EMPTY),
            Err(e) => {
                tracing::warn!(date = %record.date, error = %e, "Claude API unavailable, using fallback insight");
                fallback(FALLBACK_UNREACHABLE)
            }
        }
    }

    async fn call_claude(&self, prompt: &str) -> Result<String, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let response = client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": self.model,
                "max_tokens": 300,
                "messages": [{
                    "role": "user",
                    "content": prompt
                }]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Claude API error {}: {}", status, body);
        }

        let claude_response: serde_json::Value = response.json().await?;
        Ok(claude_response["content"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }
}

fn activity(done: bool, calories: u32) -> String {
    if done {
        format!("Yes ({calories} kcal)")
    } else {
        "No".into()
    }
}

pub fn build_prompt(record: &DailyRecord) -> String {
    let weight = record
        .weight
        .map(|w| format!("{w}kg"))
        .unwrap_or_else(|| "Not recorded".into());
    let sleep = record
        .sleep_hours
        .map(|h| format!("{h:.1}h"))
        .unwrap_or_else(|| "Not recorded".into());

    format!(
        r#"Act as a world-class personal trainer and nutritionist. Look at my day and give me short, motivating and useful feedback (3 sentences at most).

Day data ({date}):
- Weight: {weight}
- Water: {water}ml
- Ran: {ran}
- Gym: {gym}
- Meals on plan: {on_diet} of {slots} planned meals ({off_diet} off plan)
- Sleep: {sleep}

If I missed the water target ({target}ml), remind me. If I trained, congratulate me."#,
        date = record.date,
        water = record.water_ml,
        ran = activity(record.did_run, record.run_calories),
        gym = activity(record.did_gym, record.gym_calories),
        on_diet = record.meals.count(MealStatus::OnDiet),
        off_diet = record.meals.count(MealStatus::OffDiet),
        slots = MealLog::SLOTS,
        target = COACH_WATER_TARGET_ML,
    )
}
