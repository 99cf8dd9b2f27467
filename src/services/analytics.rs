//! Pure aggregation over the record history: summary cards, chart rows and
//! the monthly completion calendar.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use crate::models::record::{DailyRecord, MealStatus, SleepQuality};

/// Height used for the BMI column.
pub const ASSUMED_HEIGHT_M: f64 = 1.79;
pub const DEFAULT_WINDOW: usize = 30;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeightTrend {
    Loss,
    Gain,
    Stable,
    NoVariation,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub avg_weight: Option<f64>,
    pub total_calories: u64,
    pub avg_water: f64,
    pub record_count: usize,
    pub diet_adherence_pct: f64,
    pub active_days_pct: f64,
    pub weight_delta: Option<f64>,
    pub weight_trend: WeightTrend,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    pub date: chrono::NaiveDate,
    pub label: String,
    pub weight: Option<f64>,
    pub bmi: Option<f64>,
    pub bmi_category: Option<BmiCategory>,
    pub water: u32,
    pub calories: u32,
    pub diet_score: usize,
    pub sleep_hours: Option<f64>,
    pub sleep_quality: SleepQuality,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayCompletion {
    pub water_pct: f64,
    pub diet_pct: f64,
    pub did_run: bool,
    pub did_gym: bool,
}

fn chronological(records: &[DailyRecord]) -> Vec<&DailyRecord> {
    let mut sorted: Vec<&DailyRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.date);
    sorted
}

fn last_n<'a>(sorted: &'a [&'a DailyRecord], n: usize) -> &'a [&'a DailyRecord] {
    &sorted[sorted.len().saturating_sub(n)..]
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// on / (on + off) × 100; 0 when nothing was eaten.
fn adherence_pct(on_diet: usize, off_diet: usize) -> f64 {
    let realized = on_diet + off_diet;
    if realized == 0 {
        0.0
    } else {
        on_diet as f64 / realized as f64 * 100.0
    }
}

pub fn bmi(weight: Option<f64>) -> Option<f64> {
    weight
        .filter(|w| *w > 0.0)
        .map(|w| round2(w / (ASSUMED_HEIGHT_M * ASSUMED_HEIGHT_M)))
}

/// Rolling figures over the last `window` records; `weight_delta` and
/// `active_days_pct` always use the full history.
pub fn summary_stats(records: &[DailyRecord], window: usize) -> SummaryStats {
    let sorted = chronological(records);
    let recent = last_n(&sorted, window);

    let weights: Vec<f64> = recent
        .iter()
        .filter_map(|r| r.weight)
        .filter(|w| *w > 0.0)
        .collect();
    let avg_weight = if weights.is_empty() {
        None
    } else {
        Some(weights.iter().sum::<f64>() / weights.len() as f64)
    };

    let total_calories = recent.iter().map(|r| u64::from(r.total_calories())).sum();

    let avg_water = if recent.is_empty() {
        0.0
    } else {
        recent.iter().map(|r| f64::from(r.water_ml)).sum::<f64>() / recent.len() as f64
    };

    let (on_diet, off_diet) = recent.iter().fold((0, 0), |(on, off), r| {
        let (r_on, r_off) = r.meals.diet_summary();
        (on + r_on, off + r_off)
    });

    let active_days_pct = if sorted.is_empty() {
        0.0
    } else {
        sorted.iter().filter(|r| r.is_active()).count() as f64 / sorted.len() as f64 * 100.0
    };

    let weight_delta = weight_delta(&sorted);
    let weight_trend = match weight_delta {
        None => WeightTrend::NoVariation,
        Some(d) if d < 0.0 => WeightTrend::Loss,
        Some(d) if d > 0.0 => WeightTrend::Gain,
        Some(_) => WeightTrend::Stable,
    };

    SummaryStats {
        avg_weight,
        total_calories,
        avg_water,
        record_count: recent.len(),
        diet_adherence_pct: adherence_pct(on_diet, off_diet),
        active_days_pct,
        weight_delta,
        weight_trend,
    }
}

/// Last weighed value minus the first, by date. Needs two weighed days.
fn weight_delta(sorted: &[&DailyRecord]) -> Option<f64> {
    let mut weighed = sorted.iter().filter_map(|r| r.weight.filter(|w| *w > 0.0));
    let first = weighed.next()?;
    let last = weighed.last()?;
    Some(round2(last - first))
}

pub fn chart_series(records: &[DailyRecord], window: usize) -> Vec<ChartRow> {
    let sorted = chronological(records);
    last_n(&sorted, window)
        .iter()
        .map(|r| {
            let bmi = bmi(r.weight);
            ChartRow {
                date: r.date,
                label: r.date.format("%d/%m").to_string(),
                weight: r.weight,
                bmi,
                bmi_category: bmi.map(BmiCategory::from_bmi),
                water: r.water_ml,
                calories: r.total_calories(),
                diet_score: r.meals.count(MealStatus::OnDiet),
                sleep_hours: r.sleep_hours,
                sleep_quality: SleepQuality::from_hours(r.sleep_hours),
            }
        })
        .collect()
}

/// Day-of-month → completion for one month. Days without a record are absent;
/// water percentages above 100 are kept.
pub fn calendar_completion(
    records: &[DailyRecord],
    year: i32,
    month: u32,
    water_goal_ml: u32,
) -> BTreeMap<u32, DayCompletion> {
    records
        .iter()
        .filter(|r| r.date.year() == year && r.date.month() == month)
        .map(|r| {
            let water_pct = if water_goal_ml == 0 {
                0.0
            } else {
                f64::from(r.water_ml) / f64::from(water_goal_ml) * 100.0
            };
            let (on_diet, off_diet) = r.meals.diet_summary();
            (
                r.date.day(),
                DayCompletion {
                    water_pct,
                    diet_pct: adherence_pct(on_diet, off_diet),
                    did_run: r.did_run,
                    did_gym: r.did_gym,
                },
            )
        })
        .collect()
}
