use chrono::NaiveDate;
use meal_pipeline::{MealPlanData, ParsingMethod, PresentationPlan, TrackingStatus};
use serde::{Deserialize, Serialize};

use crate::profile::HealthProfile;

/// How many days a single generation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlanType {
    #[default]
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "2_days")]
    TwoDays,
    #[serde(rename = "weekly")]
    Weekly,
}

impl PlanType {
    pub fn days_spanned(&self) -> u32 {
        match self {
            Self::Daily => 1,
            Self::TwoDays => 2,
            Self::Weekly => 7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::TwoDays => "2_days",
            Self::Weekly => "weekly",
        }
    }
}

/// Whether to generate for today or adapt from yesterday's consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateType {
    #[default]
    Today,
    NextDay,
}

/// Prior-day feedback a user left on a plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserFeedback {
    pub overall_satisfaction: Option<u8>,
    pub liked_meals: Option<String>,
    pub disliked_meals: Option<String>,
    pub suggestions: Option<String>,
    pub hunger_level_met: Option<bool>,
    pub energy_level: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratePlanRequest {
    pub user_id: String,
    pub plan_type: PlanType,
    #[serde(default)]
    pub date_type: DateType,
    pub profile: HealthProfile,
    #[serde(default)]
    pub feedback: Option<UserFeedback>,
}

#[derive(Debug, Serialize)]
pub struct GeneratePlanResponse {
    pub plan_id: String,
    pub date_type: DateType,
    pub meal_plan: MealPlanData,
    pub formatted_plan: PresentationPlan,
    pub target_calories: i64,
    pub llm_info: LlmInfo,
}

#[derive(Debug, Serialize)]
pub struct LlmInfo {
    pub model: String,
    pub parsing_method: ParsingMethod,
}

/// Body for recording a consumption event against a planned meal.
#[derive(Debug, Deserialize)]
pub struct TrackMealRequest {
    pub user_id: String,
    pub tracking_date: NaiveDate,
    pub meal_type: String,
    pub dish_name: String,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub consumed_calories: Option<f64>,
    #[serde(default)]
    pub status: TrackingStatus,
    #[serde(default)]
    pub suggested_time: Option<String>,
    #[serde(default)]
    pub actual_time: Option<String>,
    #[serde(default)]
    pub modifications: Option<String>,
    #[serde(default)]
    pub portion_size: Option<String>,
}
