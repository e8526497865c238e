//! Consumption analytics over one past day of tracked meal events.
//!
//! The summary produced here is advisory text for the next generation
//! prompt. It is recomputed fresh per request, never persisted, and never
//! validated after computation: a garbage target propagates uncorrected.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::MealType;

/// Recorded outcome of a planned meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    Ate,
    NotAte,
    ToBeHad,
    Skipped,
    #[default]
    Pending,
}

impl TrackingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ate => "ate",
            Self::NotAte => "not_ate",
            Self::ToBeHad => "to_be_had",
            Self::Skipped => "skipped",
            Self::Pending => "pending",
        }
    }
}

impl std::fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked meal event, merging plan fields with tracking fields.
///
/// `meal_type` is a free string: persisted rows may carry values outside
/// the four-category set, which the breakdown silently ignores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackedMeal {
    pub meal_type: String,
    pub dish_name: String,
    /// Calories the plan assigned to this meal.
    pub calories: Option<f64>,
    /// Calories actually consumed; falls back to the planned value.
    pub consumed_calories: Option<f64>,
    pub status: TrackingStatus,
    pub suggested_time: Option<String>,
    pub actual_time: Option<String>,
    pub modifications: Option<String>,
    pub portion_size: Option<String>,
}

/// Per-meal-type tally of the day's tracking outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MealTypeStats {
    pub ate: u32,
    pub skipped: u32,
    pub not_ate: u32,
    pub calories: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedMeal {
    pub meal_type: MealType,
    pub dish_name: String,
    pub suggested_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingPattern {
    pub meal_type: String,
    pub suggested_time: String,
    pub actual_time: String,
    pub difference_minutes: i64,
}

/// Per-event record merging plan and tracking fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionDetail {
    pub meal_type: String,
    pub dish_name: String,
    pub calories: Option<f64>,
    pub consumed_calories: f64,
    pub status: TrackingStatus,
    pub modifications: Option<String>,
    pub portion_size: Option<String>,
    pub suggested_time: Option<String>,
    pub actual_time: Option<String>,
}

/// Analytics over one past day, consumed by the next-day prompt builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionSummary {
    pub date: String,
    pub target_calories: f64,
    pub consumed_calories: f64,
    /// Target minus consumed; negative when the user over-ate.
    pub deficit: f64,
    /// `max(0, -deficit)`.
    pub surplus: f64,
    /// Rounded to one decimal; `0.0` when the target is not positive.
    pub percentage_of_target: f64,
    pub meal_breakdown: BTreeMap<MealType, MealTypeStats>,
    pub skipped_meals: Vec<SkippedMeal>,
    pub timing_patterns: Vec<TimingPattern>,
    pub consumption_details: Vec<ConsumptionDetail>,
}

/// Distill a day's tracked events into a `ConsumptionSummary`.
///
/// `ate` events add consumed calories to the meal-type and day totals,
/// `skipped` events land in the skipped list, `not_ate` is only counted;
/// `pending` and `to_be_had` are not tallied at all. Timing deltas are
/// recorded for any event carrying both times, regardless of status.
pub fn analyze_consumption(
    date: &str,
    events: &[TrackedMeal],
    target_calories: f64,
) -> ConsumptionSummary {
    let mut breakdown: BTreeMap<MealType, MealTypeStats> = MealType::ALL
        .iter()
        .map(|meal_type| (*meal_type, MealTypeStats::default()))
        .collect();
    let mut consumed_total = 0.0;
    let mut skipped_meals = Vec::new();
    let mut timing_patterns = Vec::new();
    let mut consumption_details = Vec::new();

    for event in events {
        let consumed = event.consumed_calories.or(event.calories).unwrap_or(0.0);

        match MealType::parse(&event.meal_type) {
            Some(meal_type) => {
                if let Some(stats) = breakdown.get_mut(&meal_type) {
                    match event.status {
                        TrackingStatus::Ate => {
                            stats.ate += 1;
                            stats.calories += consumed;
                            consumed_total += consumed;
                        }
                        TrackingStatus::Skipped => {
                            stats.skipped += 1;
                            skipped_meals.push(SkippedMeal {
                                meal_type,
                                dish_name: event.dish_name.clone(),
                                suggested_time: event.suggested_time.clone(),
                            });
                        }
                        TrackingStatus::NotAte => stats.not_ate += 1,
                        TrackingStatus::ToBeHad | TrackingStatus::Pending => {}
                    }
                }
            }
            None => {
                debug!(meal_type = %event.meal_type, "event outside meal-type set, not counted");
            }
        }

        if let (Some(suggested), Some(actual)) = (&event.suggested_time, &event.actual_time) {
            if let Some(minutes) = minutes_between(suggested, actual) {
                timing_patterns.push(TimingPattern {
                    meal_type: event.meal_type.clone(),
                    suggested_time: suggested.clone(),
                    actual_time: actual.clone(),
                    difference_minutes: minutes,
                });
            }
        }

        consumption_details.push(ConsumptionDetail {
            meal_type: event.meal_type.clone(),
            dish_name: event.dish_name.clone(),
            calories: event.calories,
            consumed_calories: consumed,
            status: event.status,
            modifications: event.modifications.clone(),
            portion_size: event.portion_size.clone(),
            suggested_time: event.suggested_time.clone(),
            actual_time: event.actual_time.clone(),
        });
    }

    let deficit = target_calories - consumed_total;
    let surplus = if deficit < 0.0 { -deficit } else { 0.0 };
    let percentage_of_target = if target_calories > 0.0 {
        (consumed_total / target_calories * 1000.0).round() / 10.0
    } else {
        0.0
    };

    ConsumptionSummary {
        date: date.to_string(),
        target_calories,
        consumed_calories: consumed_total,
        deficit,
        surplus,
        percentage_of_target,
        meal_breakdown: breakdown,
        skipped_meals,
        timing_patterns,
        consumption_details,
    }
}

fn parse_clock(value: &str) -> Option<NaiveTime> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .ok()
}

/// Absolute difference in whole minutes between two clock times.
fn minutes_between(suggested: &str, actual: &str) -> Option<i64> {
    let suggested = parse_clock(suggested)?;
    let actual = parse_clock(actual)?;
    Some((actual - suggested).num_minutes().abs())
}
