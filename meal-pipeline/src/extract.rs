//! Multi-strategy extraction of meal-plan data from raw model output.
//!
//! The completion text is unreliable: sometimes clean JSON, sometimes JSON
//! wrapped in prose or a markdown fence, sometimes plain text. Strategies
//! are tried in order and the first raw tree containing a `days` key wins;
//! if none succeed, a line-based heuristic accumulates whatever it can and
//! tags the result as low-confidence.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::format::format_plan;
use crate::model::{DayPlan, MealEntry, MealPlanData, MealType, ParsingMethod, current_date_string};

/// Extraction strategies in priority order.
const STRATEGIES: &[(&str, fn(&str) -> Option<Value>)] = &[
    ("brace_scan", brace_scan),
    ("whole_string", whole_string),
    ("fenced_block", fenced_block),
];

/// Parse a raw completion into the canonical plan structure.
///
/// Never fails: blank input short-circuits to the empty structure, JSON
/// strategies feed the formatter, and everything else lands in the text
/// fallback.
pub fn parse_meal_plan(raw: &str) -> MealPlanData {
    if raw.trim().is_empty() {
        return MealPlanData::empty();
    }
    if let Some(tree) = extract(raw) {
        return format_plan(&tree);
    }
    warn!("response could not be parsed as JSON, using text parsing fallback");
    text_fallback(raw)
}

/// Run the JSON strategies in order; first raw tree with a `days` key wins.
pub fn extract(raw: &str) -> Option<Value> {
    STRATEGIES.iter().find_map(|&(name, strategy)| {
        let tree = strategy(raw)?;
        debug!(strategy = name, "extracted meal plan tree");
        Some(tree)
    })
}

fn parse_with_days(candidate: &str) -> Option<Value> {
    let value: Value = serde_json::from_str(candidate).ok()?;
    value.get("days").is_some().then_some(value)
}

/// Substring between the first `{` and the last `}`. Stray braces in
/// surrounding prose can over- or under-capture; the parse failing is the
/// only guard.
fn brace_scan(raw: &str) -> Option<Value> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_with_days(&raw[start..=end])
}

fn whole_string(raw: &str) -> Option<Value> {
    parse_with_days(raw.trim())
}

fn json_fence_regex() -> &'static Regex {
    static JSON_FENCE_RE: OnceLock<Regex> = OnceLock::new();
    JSON_FENCE_RE.get_or_init(|| {
        Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("json fence regex must compile")
    })
}

fn bare_fence_regex() -> &'static Regex {
    static BARE_FENCE_RE: OnceLock<Regex> = OnceLock::new();
    BARE_FENCE_RE.get_or_init(|| {
        Regex::new(r"(?s)```\s*(\{.*?\})\s*```").expect("bare fence regex must compile")
    })
}

/// A ```json fence first, then a generic fence holding an object. Malformed
/// JSON inside a fence falls through silently.
fn fenced_block(raw: &str) -> Option<Value> {
    if let Some(caps) = json_fence_regex().captures(raw) {
        if let Some(tree) = parse_with_days(caps[1].trim()) {
            return Some(tree);
        }
    }
    if let Some(caps) = bare_fence_regex().captures(raw) {
        if let Some(tree) = parse_with_days(caps[1].trim()) {
            return Some(tree);
        }
    }
    None
}

fn day_line_regex() -> &'static Regex {
    static DAY_LINE_RE: OnceLock<Regex> = OnceLock::new();
    DAY_LINE_RE.get_or_init(|| {
        Regex::new(r"(?i)day\s*\d+|date[:\s]+(\d{4}-\d{2}-\d{2})")
            .expect("day line regex must compile")
    })
}

fn meal_type_regex() -> &'static Regex {
    static MEAL_TYPE_RE: OnceLock<Regex> = OnceLock::new();
    MEAL_TYPE_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(breakfast|lunch|dinner|snack)\b")
            .expect("meal type regex must compile")
    })
}

fn dish_label_regex() -> &'static Regex {
    static DISH_LABEL_RE: OnceLock<Regex> = OnceLock::new();
    DISH_LABEL_RE
        .get_or_init(|| Regex::new(r"(?i)^(dish|meal)[:\s]+").expect("dish label regex must compile"))
}

fn calorie_line_regex() -> &'static Regex {
    static CALORIE_LINE_RE: OnceLock<Regex> = OnceLock::new();
    CALORIE_LINE_RE
        .get_or_init(|| Regex::new(r"(?i)(\d+)\s*calories?").expect("calorie line regex must compile"))
}

/// Accumulator for the line fold: finished days plus the day and meal
/// currently being built.
#[derive(Default)]
struct FallbackState {
    days: Vec<DayPlan>,
    current_day: Option<DayPlan>,
    current_meal: Option<MealEntry>,
}

impl FallbackState {
    fn start_day(&mut self, date: String) {
        self.flush_day();
        self.current_day = Some(DayPlan {
            date,
            total_calories: None,
            meals: Vec::new(),
        });
    }

    fn start_meal(&mut self, meal_type: MealType) {
        self.flush_meal();
        // A meal line before any day line opens an implicit day.
        if self.current_day.is_none() {
            self.current_day = Some(DayPlan {
                date: current_date_string(),
                total_calories: None,
                meals: Vec::new(),
            });
        }
        self.current_meal = Some(MealEntry {
            meal_type,
            option_number: 1,
            ..MealEntry::default()
        });
    }

    fn flush_meal(&mut self) {
        if let Some(mut meal) = self.current_meal.take() {
            if meal.dish_name.is_empty() {
                meal.dish_name = "Meal".to_string();
            }
            if let Some(day) = self.current_day.as_mut() {
                day.meals.push(meal);
            }
        }
    }

    fn flush_day(&mut self) {
        self.flush_meal();
        if let Some(day) = self.current_day.take() {
            self.days.push(day);
        }
    }
}

/// Line-based heuristic for responses no JSON strategy could handle.
///
/// Day/date lines open a new day, meal-type keywords open a new meal,
/// `dish`/`meal` lines name the current meal, `<n> calories` lines set its
/// calorie value; everything else is ignored. Always returns, even with
/// zero accumulated days.
pub(crate) fn text_fallback(raw: &str) -> MealPlanData {
    let mut state = FallbackState::default();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = day_line_regex().captures(line) {
            let date = caps
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(current_date_string);
            state.start_day(date);
            continue;
        }

        if let Some(caps) = meal_type_regex().captures(line) {
            state.start_meal(MealType::parse_or_default(&caps[1]));
            continue;
        }

        let lowered = line.to_lowercase();
        if (lowered.contains("dish") || lowered.contains("meal"))
            && state
                .current_meal
                .as_ref()
                .is_some_and(|meal| meal.dish_name.is_empty())
        {
            if let Some(meal) = state.current_meal.as_mut() {
                meal.dish_name = dish_label_regex().replace(line, "").trim().to_string();
            }
            continue;
        }

        if let Some(caps) = calorie_line_regex().captures(line) {
            if let Some(meal) = state.current_meal.as_mut() {
                meal.calories = caps[1].parse().ok();
            }
        }
    }
    state.flush_day();

    MealPlanData {
        days: state.days,
        parsing_method: ParsingMethod::TextFallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParsingMethod;

    const PLAIN_PLAN: &str = r#"{"days":[{"date":"2026-08-06","meals":[]}]}"#;

    #[test]
    fn brace_scan_extracts_json_from_prose() {
        let raw = format!("Here is your plan: {PLAIN_PLAN} Enjoy!");
        let tree = extract(&raw).unwrap();
        assert!(tree.get("days").is_some());
    }

    #[test]
    fn whole_string_parse_accepts_pure_json() {
        let tree = extract(PLAIN_PLAN).unwrap();
        assert_eq!(tree["days"][0]["date"], "2026-08-06");
    }

    #[test]
    fn json_without_days_key_is_rejected() {
        assert!(extract(r#"{"meals": []}"#).is_none());
    }

    #[test]
    fn fenced_json_block_survives_unmatched_braces_in_prose() {
        let raw = format!(
            "The plan below {{with stray braces in the text\n```json\n{PLAIN_PLAN}\n```\nand a dangling }} here"
        );
        // Brace scan over-captures and fails to parse; the fence wins.
        let tree = extract(&raw).unwrap();
        assert_eq!(tree["days"][0]["date"], "2026-08-06");
    }

    #[test]
    fn generic_fence_is_second_choice() {
        let raw = format!("prose\n```\n{PLAIN_PLAN}\n```\nmore prose");
        assert!(extract(&raw).is_some());
    }

    #[test]
    fn malformed_fence_falls_through() {
        let raw = "```json\n{not valid json\n```";
        assert!(extract(raw).is_none());
    }

    #[test]
    fn empty_input_short_circuits() {
        let plan = parse_meal_plan("");
        assert_eq!(plan.parsing_method, ParsingMethod::Empty);
        assert!(plan.days.is_empty());

        let plan = parse_meal_plan("   \n  ");
        assert_eq!(plan.parsing_method, ParsingMethod::Empty);
    }

    #[test]
    fn text_fallback_accumulates_days_and_meals() {
        let plan = parse_meal_plan("Day 1\nBreakfast\nDish: Oats\n350 calories\n");
        assert_eq!(plan.parsing_method, ParsingMethod::TextFallback);
        assert_eq!(plan.days.len(), 1);
        let meal = &plan.days[0].meals[0];
        assert_eq!(meal.meal_type, MealType::Breakfast);
        assert_eq!(meal.dish_name, "Oats");
        assert_eq!(meal.calories, Some(350.0));
    }

    #[test]
    fn text_fallback_reads_explicit_dates() {
        let plan = parse_meal_plan("date: 2026-08-06\nLunch\nDish: Salad\n");
        assert_eq!(plan.days[0].date, "2026-08-06");
        assert_eq!(plan.days[0].meals[0].meal_type, MealType::Lunch);
    }

    #[test]
    fn text_fallback_flushes_between_days() {
        let raw = "Day 1\nBreakfast\nDish: Oats\nDay 2\nDinner\nDish: Stew\n";
        let plan = parse_meal_plan(raw);
        assert_eq!(plan.days.len(), 2);
        assert_eq!(plan.days[0].meals.len(), 1);
        assert_eq!(plan.days[1].meals[0].dish_name, "Stew");
    }

    #[test]
    fn unparseable_text_yields_empty_fallback() {
        let plan = parse_meal_plan("nothing to see here");
        assert_eq!(plan.parsing_method, ParsingMethod::TextFallback);
        assert!(plan.days.is_empty());
    }

    #[test]
    fn meal_without_dish_line_gets_default_name() {
        let plan = parse_meal_plan("Day 1\nBreakfast\n300 calories\n");
        assert_eq!(plan.days[0].meals[0].dish_name, "Meal");
    }
}
