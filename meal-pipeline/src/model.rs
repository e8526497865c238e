use serde::{Deserialize, Serialize};

/// Meal slot category. The model is asked for exactly these four; anything
/// else it emits folds to breakfast at formatting time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    #[default]
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// The fixed four-category set, in slot order.
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    /// Strict parse: `None` for anything outside the four categories.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "breakfast" => Some(Self::Breakfast),
            "lunch" => Some(Self::Lunch),
            "dinner" => Some(Self::Dinner),
            "snack" => Some(Self::Snack),
            _ => None,
        }
    }

    /// Lenient parse: unrecognized values become breakfast.
    pub fn parse_or_default(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which extraction strategy produced a plan. Callers may treat
/// `text_fallback` output as lower-confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsingMethod {
    Json,
    TextFallback,
    Empty,
}

/// Canonical output of the response-normalization pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanData {
    /// Days in the order the model emitted them, never re-sorted.
    pub days: Vec<DayPlan>,
    pub parsing_method: ParsingMethod,
}

impl MealPlanData {
    /// The empty structure returned for blank input or a days-less tree.
    pub fn empty() -> Self {
        Self {
            days: Vec::new(),
            parsing_method: ParsingMethod::Empty,
        }
    }
}

/// One day of a meal plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: String,
    /// Total declared by the model; presentation recomputes from meals.
    pub total_calories: Option<f64>,
    pub meals: Vec<MealEntry>,
}

/// One meal option. `(meal_type, option_number)` identifies the slot
/// alternative this entry belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub meal_type: MealType,
    pub option_number: u32,
    pub suggested_time: Option<String>,
    pub dish_name: String,
    pub description: Option<String>,
    pub image_prompt: Option<String>,
    pub ingredients: Vec<String>,
    pub food_preparation_materials: Vec<String>,
    pub sprouts_material: Vec<String>,
    pub bread_type: Option<String>,
    pub rice_type: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fats: Option<f64>,
    pub cooking_instructions: Option<String>,
    pub calorie_instructions: Option<String>,
}

/// Presentation view of a plan with recomputed calorie totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationPlan {
    pub plan_type: String,
    pub days: Vec<PresentationDay>,
    pub summary: PlanSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationDay {
    pub date: String,
    /// Sum of the day's meal calories; any declared total is ignored.
    pub total_calories: f64,
    pub meals: Vec<MealEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_days: usize,
    pub total_meals: usize,
    pub total_calories: f64,
}

/// Default for missing or unparseable dates.
pub(crate) fn current_date_string() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_type_parses_case_insensitively() {
        assert_eq!(MealType::parse("Lunch"), Some(MealType::Lunch));
        assert_eq!(MealType::parse(" DINNER "), Some(MealType::Dinner));
        assert_eq!(MealType::parse("brunch"), None);
    }

    #[test]
    fn unknown_meal_type_defaults_to_breakfast() {
        assert_eq!(MealType::parse_or_default("brunch"), MealType::Breakfast);
        assert_eq!(MealType::parse_or_default(""), MealType::Breakfast);
    }

    #[test]
    fn parsing_method_uses_snake_case_tags() {
        let tag = serde_json::to_value(ParsingMethod::TextFallback).unwrap();
        assert_eq!(tag, serde_json::json!("text_fallback"));
        let tag = serde_json::to_value(ParsingMethod::Json).unwrap();
        assert_eq!(tag, serde_json::json!("json"));
    }

    #[test]
    fn empty_plan_has_no_days() {
        let plan = MealPlanData::empty();
        assert!(plan.days.is_empty());
        assert_eq!(plan.parsing_method, ParsingMethod::Empty);
    }
}
