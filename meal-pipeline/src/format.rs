//! Formatting of raw extracted trees into the canonical plan structure,
//! slot grouping, and the presentation view.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::model::{
    DayPlan, MealEntry, MealPlanData, MealType, ParsingMethod, PlanSummary, PresentationDay,
    PresentationPlan, current_date_string,
};
use crate::normalize::{normalize_list, normalize_number};

/// Format a raw tree into `MealPlanData`, applying field defaults and the
/// normalizers. A missing or non-array `days` yields the empty structure.
pub fn format_plan(tree: &Value) -> MealPlanData {
    let Some(days) = tree.get("days").and_then(Value::as_array) else {
        return MealPlanData::empty();
    };

    MealPlanData {
        days: days.iter().map(format_day).collect(),
        parsing_method: ParsingMethod::Json,
    }
}

fn format_day(day: &Value) -> DayPlan {
    let meals = day
        .get("meals")
        .and_then(Value::as_array)
        .map(|meals| meals.iter().map(format_meal).collect())
        .unwrap_or_default();

    DayPlan {
        date: string_field(day, "date").unwrap_or_else(current_date_string),
        total_calories: day.get("total_calories").and_then(normalize_number),
        meals,
    }
}

fn format_meal(meal: &Value) -> MealEntry {
    MealEntry {
        meal_type: string_field(meal, "meal_type")
            .map(|s| MealType::parse_or_default(&s))
            .unwrap_or_default(),
        option_number: meal
            .get("option_number")
            .and_then(normalize_number)
            .map(|n| n as u32)
            .filter(|n| *n >= 1)
            .unwrap_or(1),
        suggested_time: string_field(meal, "suggested_time"),
        dish_name: string_field(meal, "dish_name").unwrap_or_else(|| "Meal".to_string()),
        description: string_field(meal, "description"),
        // Older prompts asked for image_description; accept both keys.
        image_prompt: string_field(meal, "image_prompt")
            .or_else(|| string_field(meal, "image_description")),
        ingredients: list_field(meal, "ingredients"),
        food_preparation_materials: list_field(meal, "food_preparation_materials"),
        sprouts_material: list_field(meal, "sprouts_material"),
        bread_type: string_field(meal, "bread_type"),
        rice_type: string_field(meal, "rice_type"),
        calories: meal.get("calories").and_then(normalize_number),
        protein: meal.get("protein").and_then(normalize_number),
        carbs: meal.get("carbs").and_then(normalize_number),
        fats: meal.get("fats").and_then(normalize_number),
        cooking_instructions: string_field(meal, "cooking_instructions"),
        calorie_instructions: string_field(meal, "calorie_instructions"),
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn list_field(value: &Value, key: &str) -> Vec<String> {
    value.get(key).map(normalize_list).unwrap_or_default()
}

/// Group meals into `meal_type -> option_number -> entry`, options sorted
/// ascending. Duplicate `(type, option)` keys overwrite: last write wins.
pub fn group_by_type_and_option(
    meals: &[MealEntry],
) -> BTreeMap<MealType, BTreeMap<u32, MealEntry>> {
    let mut grouped: BTreeMap<MealType, BTreeMap<u32, MealEntry>> = BTreeMap::new();
    for meal in meals {
        grouped
            .entry(meal.meal_type)
            .or_default()
            .insert(meal.option_number, meal.clone());
    }
    grouped
}

/// Build the presentation view: each day's calorie total is recomputed as
/// the sum of its meals' calories, ignoring any declared total.
pub fn format_for_presentation(plan: &MealPlanData, plan_type: &str) -> PresentationPlan {
    let mut total_meals = 0;
    let mut total_calories = 0.0;

    let days = plan
        .days
        .iter()
        .map(|day| {
            let day_calories: f64 = day.meals.iter().filter_map(|meal| meal.calories).sum();
            total_meals += day.meals.len();
            total_calories += day_calories;
            PresentationDay {
                date: day.date.clone(),
                total_calories: day_calories,
                meals: day.meals.clone(),
            }
        })
        .collect();

    PresentationPlan {
        plan_type: plan_type.to_string(),
        days,
        summary: PlanSummary {
            total_days: plan.days.len(),
            total_meals,
            total_calories,
        },
    }
}
