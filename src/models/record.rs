use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Status of a single meal slot.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MealStatus {
    #[default]
    Skipped,
    OffDiet,
    OnDiet,
}

// Older local data stored each slot as a plain "ate on plan" boolean.
impl<'de> Deserialize<'de> for MealStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Legacy(bool),
            Status(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Legacy(true) => Ok(MealStatus::OnDiet),
            Raw::Legacy(false) => Ok(MealStatus::Skipped),
            Raw::Status(s) => match s.as_str() {
                "skipped" => Ok(MealStatus::Skipped),
                "off_diet" => Ok(MealStatus::OffDiet),
                "on_diet" => Ok(MealStatus::OnDiet),
                other => Err(serde::de::Error::unknown_variant(
                    other,
                    &["skipped", "off_diet", "on_diet"],
                )),
            },
        }
    }
}

/// The six fixed meal slots of a day.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct MealLog {
    pub breakfast: MealStatus,
    pub morning_snack: MealStatus,
    pub lunch: MealStatus,
    pub afternoon_snack: MealStatus,
    pub dinner: MealStatus,
    pub supper: MealStatus,
}

impl MealLog {
    pub const SLOTS: usize = 6;

    pub fn statuses(&self) -> [MealStatus; Self::SLOTS] {
        [
            self.breakfast,
            self.morning_snack,
            self.lunch,
            self.afternoon_snack,
            self.dinner,
            self.supper,
        ]
    }

    pub fn count(&self, status: MealStatus) -> usize {
        self.statuses().iter().filter(|s| **s == status).count()
    }

    /// `(on_diet, off_diet)` counts; skipped meals are not counted.
    pub fn diet_summary(&self) -> (usize, usize) {
        (self.count(MealStatus::OnDiet), self.count(MealStatus::OffDiet))
    }

    fn apply(&mut self, patch: &MealsPatch) {
        let slots = [
            (&mut self.breakfast, patch.breakfast),
            (&mut self.morning_snack, patch.morning_snack),
            (&mut self.lunch, patch.lunch),
            (&mut self.afternoon_snack, patch.afternoon_snack),
            (&mut self.dinner, patch.dinner),
            (&mut self.supper, patch.supper),
        ];
        for (slot, value) in slots {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

/// One calendar day's health log. `date` is the unique key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub water_ml: u32,
    #[serde(default)]
    pub did_run: bool,
    #[serde(default)]
    pub run_calories: u32,
    #[serde(default)]
    pub did_gym: bool,
    #[serde(default)]
    pub gym_calories: u32,
    #[serde(default)]
    pub sleep_hours: Option<f64>,
    #[serde(default)]
    pub meals: MealLog,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DailyRecord {
    /// The record synthesized for a date that has never been written.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            weight: None,
            water_ml: 0,
            did_run: false,
            run_calories: 0,
            did_gym: false,
            gym_calories: 0,
            sleep_hours: None,
            meals: MealLog::default(),
            notes: None,
        }
    }

    /// Enforces the write-time invariants: calories follow their activity
    /// flag, zero sleep and non-positive weight mean "not logged".
    pub fn normalized(mut self) -> Self {
        if !self.did_run {
            self.run_calories = 0;
        }
        if !self.did_gym {
            self.gym_calories = 0;
        }
        self.weight = self.weight.filter(|w| w.is_finite() && *w > 0.0);
        self.sleep_hours = self
            .sleep_hours
            .filter(|h| h.is_finite() && *h > 0.0)
            .map(|h| h.min(24.0));
        self.notes = self.notes.filter(|n| !n.trim().is_empty());
        self
    }

    pub fn total_calories(&self) -> u32 {
        self.run_calories + self.gym_calories
    }

    pub fn is_active(&self) -> bool {
        self.did_run || self.did_gym
    }

    /// History search: date substring or case-insensitive notes substring.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return true;
        }
        if self.date.to_string().contains(term) {
            return true;
        }
        let needle = term.to_lowercase();
        self.notes
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(&needle))
    }

    /// Range checks for a full record, same rules as a patch.
    pub fn validate_ranges(&self) -> Result<(), String> {
        RecordPatch {
            weight: Some(self.weight),
            sleep_hours: Some(self.sleep_hours),
            run_calories: Some(self.run_calories),
            gym_calories: Some(self.gym_calories),
            ..Default::default()
        }
        .validate_ranges()
    }

    /// Merge-patch: fields absent from `patch` keep their current value.
    pub fn apply(mut self, patch: &RecordPatch) -> Self {
        if let Some(weight) = patch.weight {
            self.weight = weight;
        }
        if let Some(water_ml) = patch.water_ml {
            self.water_ml = water_ml;
        }
        if let Some(delta) = patch.water_delta_ml {
            self.water_ml = i64::from(self.water_ml)
                .saturating_add(delta)
                .clamp(0, i64::from(u32::MAX)) as u32;
        }
        if let Some(did_run) = patch.did_run {
            self.did_run = did_run;
        }
        if let Some(run_calories) = patch.run_calories {
            self.run_calories = run_calories;
        }
        if let Some(did_gym) = patch.did_gym {
            self.did_gym = did_gym;
        }
        if let Some(gym_calories) = patch.gym_calories {
            self.gym_calories = gym_calories;
        }
        if let Some(sleep_hours) = patch.sleep_hours {
            self.sleep_hours = sleep_hours;
        }
        if let Some(meals) = &patch.meals {
            self.meals.apply(meals);
        }
        if let Some(notes) = &patch.notes {
            self.notes = notes.clone();
        }
        self.normalized()
    }
}

/// Per-slot meal update; unspecified slots are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealsPatch {
    pub breakfast: Option<MealStatus>,
    pub morning_snack: Option<MealStatus>,
    pub lunch: Option<MealStatus>,
    pub afternoon_snack: Option<MealStatus>,
    pub dinner: Option<MealStatus>,
    pub supper: Option<MealStatus>,
}

/// Partial update of a record. For nullable fields, a missing key leaves the
/// value untouched while an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    #[serde(default, deserialize_with = "present")]
    pub weight: Option<Option<f64>>,
    pub water_ml: Option<u32>,
    /// Relative water adjustment; the result is clamped at zero.
    pub water_delta_ml: Option<i64>,
    pub did_run: Option<bool>,
    pub run_calories: Option<u32>,
    pub did_gym: Option<bool>,
    pub gym_calories: Option<u32>,
    #[serde(default, deserialize_with = "present")]
    pub sleep_hours: Option<Option<f64>>,
    pub meals: Option<MealsPatch>,
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,
}

pub const MAX_CALORIES: u32 = 10_000;

impl RecordPatch {
    pub fn validate_ranges(&self) -> Result<(), String> {
        if let Some(Some(weight)) = self.weight {
            if !(weight.is_finite() && (0.0..700.0).contains(&weight)) {
                return Err("Weight must be a positive number of kilograms".into());
            }
        }
        if let Some(Some(hours)) = self.sleep_hours {
            if !(0.0..=24.0).contains(&hours) {
                return Err("Sleep hours must be between 0 and 24".into());
            }
        }
        for calories in [self.run_calories, self.gym_calories].into_iter().flatten() {
            if calories > MAX_CALORIES {
                return Err(format!("Calories must be at most {MAX_CALORIES}"));
            }
        }
        Ok(())
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Sleep classification used in chart rows.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    None,
    Poor,
    Fair,
    Ideal,
    Excessive,
}

impl SleepQuality {
    pub fn from_hours(hours: Option<f64>) -> Self {
        match hours {
            None => Self::None,
            Some(h) if h <= 0.0 => Self::None,
            Some(h) if h < 5.0 => Self::Poor,
            Some(h) if h < 7.0 => Self::Fair,
            Some(h) if h <= 9.0 => Self::Ideal,
            Some(_) => Self::Excessive,
        }
    }
}
