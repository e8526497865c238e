//! Deterministic prompt construction.
//!
//! The templates here declare the exact JSON schema the response pipeline
//! expects back; changing the RESPONSE FORMAT block changes the extraction
//! contract.

use meal_pipeline::ConsumptionSummary;

use crate::profile::{HealthProfile, prompt_input};
use crate::types::{PlanType, UserFeedback};

/// Agent preamble: role plus the non-negotiable output rules.
pub const SYSTEM_PREAMBLE: &str = r#"You are an AI Food Decision Optimizer (FDO), certified nutritionist, and fitness diet planner.

STRICT RULES (DO NOT BREAK):
1. Output MUST be valid JSON ONLY.
2. breakfast, lunch, and dinner MUST each contain 3 to 4 meal options per day.
3. Each meal option MUST include: meal_type, option_number, suggested_time, dish_name, description, ingredients (ONLY ingredients used in that meal), calories (kcal), protein (g), carbs (g), fats (g), image_prompt, and image_url.
4. Avoid ALL allergens completely (e.g., peanuts).
5. Use ONLY the provided ingredients. Salt and water are allowed implicitly.
6. Nutrition values must be realistic and optimized for the given fitness goal.
7. image_url MUST represent the EXACT meal and its main ingredients.
8. image_url MUST be a SINGLE direct image URL (not an array) following public food image patterns (Pexels or Unsplash).
9. image_prompt MUST clearly describe the meal and ingredients for accurate image retrieval.
10. DO NOT reuse the same image_url for multiple meals.
11. DO NOT return placeholder or fake URLs.
12. DO NOT include explanation text outside JSON."#;

const RESPONSE_FORMAT: &str = r#"RESPONSE FORMAT (STRICT JSON ONLY):
{
  "days": [
    {
      "date": "YYYY-MM-DD",
      "total_calories": 0,
      "meals": [
        {
          "meal_type": "breakfast",
          "option_number": 1,
          "suggested_time": "08:00",
          "dish_name": "Meal Name",
          "description": "Short description of the meal",
          "ingredients": ["Ingredient 1", "Ingredient 2"],
          "calories": 0,
          "protein": 0,
          "carbs": 0,
          "fats": 0,
          "image_prompt": "High quality food photography of [meal name] made with [ingredients], clean background, realistic lighting",
          "image_url": "https://images.pexels.com/photos/XXXXXX/pexels-photo-XXXXXX.jpeg"
        }
      ]
    }
  ]
}"#;

const FINAL_WARNING: &str = r#"FINAL WARNING:
- Output ONLY JSON.
- image_url MUST clearly match the meal ingredients.
- No placeholders, no text outside JSON."#;

/// Base generation prompt: user input, day count, response schema.
pub fn build_meal_plan_prompt(profile: &HealthProfile, plan_type: PlanType) -> String {
    let input = serde_json::to_string_pretty(&prompt_input(profile))
        .unwrap_or_else(|_| "{}".to_string());
    let days = plan_type.days_spanned();

    let mut prompt = String::new();
    prompt.push_str("--------------------------------------------------\n");
    prompt.push_str("USER INPUT:\n");
    prompt.push_str(&input);
    prompt.push_str("\n--------------------------------------------------\n\n");
    prompt.push_str(&format!(
        "Generate a meal plan covering exactly {days} day(s), one entry per day in the days array.\n\n"
    ));
    prompt.push_str(RESPONSE_FORMAT);
    prompt.push_str("\n\n");
    prompt.push_str(FINAL_WARNING);
    prompt.push_str("\n\nResponse (JSON ONLY):");
    prompt
}

/// Base prompt plus prior feedback to steer meal selection.
pub fn build_feedback_prompt(
    profile: &HealthProfile,
    feedback: &UserFeedback,
    plan_type: PlanType,
) -> String {
    let mut prompt = build_meal_plan_prompt(profile, plan_type);
    prompt.push_str("\n\nIMPORTANT: Previous Day Feedback:\n");
    prompt.push_str(&render_feedback(feedback));
    prompt.push_str(
        "\nPlease adjust the meal plan based on this feedback. Include more of what the user liked and avoid what they disliked.\nResponse:",
    );
    prompt
}

/// Adaptive next-day prompt: base prompt, yesterday's consumption
/// analysis, optional feedback, and the closing adjustment directives.
pub fn build_next_day_prompt(
    profile: &HealthProfile,
    summary: &ConsumptionSummary,
    feedback: Option<&UserFeedback>,
    plan_type: PlanType,
) -> String {
    let mut prompt = build_meal_plan_prompt(profile, plan_type);
    prompt.push_str("\n\n");
    prompt.push_str(&render_consumption_analysis(summary));

    if let Some(feedback) = feedback {
        prompt.push_str("\n=== USER FEEDBACK ===\n");
        prompt.push_str(&render_feedback(feedback));
    }

    prompt.push_str(&render_adjustments(profile, summary, feedback));
    prompt
}

/// The "yesterday's consumption" section rendered from the summary.
pub fn render_consumption_analysis(summary: &ConsumptionSummary) -> String {
    let mut out = String::new();
    out.push_str("=== YESTERDAY'S CONSUMPTION ANALYSIS ===\n\n");

    out.push_str("CALORIE ANALYSIS:\n");
    out.push_str(&format!("- Target Calories: {}\n", summary.target_calories));
    out.push_str(&format!(
        "- Consumed Calories: {}\n",
        summary.consumed_calories
    ));
    out.push_str(&format!(
        "- Percentage of Target: {}%\n",
        summary.percentage_of_target
    ));
    if summary.deficit > 0.0 {
        out.push_str(&format!(
            "- Calorie Deficit: {} calories (user under-ate)\n",
            summary.deficit
        ));
        out.push_str("  -> ACTION: Increase calories in today's plan to compensate\n");
    } else if summary.surplus > 0.0 {
        out.push_str(&format!(
            "- Calorie Surplus: {} calories (user over-ate)\n",
            summary.surplus
        ));
        out.push_str("  -> ACTION: Reduce calories or suggest lighter meals today\n");
    } else {
        out.push_str("- Calories on target\n");
    }

    out.push_str("\nMEAL TYPE BREAKDOWN:\n");
    for (meal_type, stats) in &summary.meal_breakdown {
        out.push_str(&format!(
            "- {meal_type}: Ate: {}, Skipped: {}, Not Ate: {}, Calories: {}\n",
            stats.ate, stats.skipped, stats.not_ate, stats.calories
        ));
    }

    if !summary.skipped_meals.is_empty() {
        out.push_str("\nSKIPPED MEALS:\n");
        for skipped in &summary.skipped_meals {
            let time = skipped.suggested_time.as_deref().unwrap_or("unknown time");
            out.push_str(&format!(
                "- {}: {} (suggested at {time})\n",
                skipped.meal_type, skipped.dish_name
            ));
        }
        out.push_str("  -> ACTION: Suggest easier/quicker options or adjust meal times\n");
    }

    if !summary.timing_patterns.is_empty() {
        out.push_str("\nMEAL TIMING PATTERNS:\n");
        for pattern in &summary.timing_patterns {
            out.push_str(&format!(
                "- {}: Suggested {}, Actual {} (",
                pattern.meal_type, pattern.suggested_time, pattern.actual_time
            ));
            if pattern.difference_minutes > 0 {
                let direction = if pattern.actual_time > pattern.suggested_time {
                    "late"
                } else {
                    "early"
                };
                out.push_str(&format!("{} min {direction}", pattern.difference_minutes));
            } else {
                out.push_str("on time");
            }
            out.push_str(")\n");
        }
        if let Some(avg) = average_delay_minutes(summary) {
            out.push_str(&format!("  -> Average timing difference: {avg} minutes\n"));
            out.push_str(
                "  -> ACTION: Adjust suggested meal times based on user's actual eating patterns\n",
            );
        }
    }

    out.push_str("\nDETAILED CONSUMPTION:\n");
    for detail in &summary.consumption_details {
        out.push_str(&format!(
            "- {}: {} ({} calories) - Status: {}",
            detail.meal_type, detail.dish_name, detail.consumed_calories, detail.status
        ));
        if let (Some(actual), Some(suggested)) = (&detail.actual_time, &detail.suggested_time) {
            out.push_str(&format!(" - Time: {actual} (suggested: {suggested})"));
        }
        if let Some(modifications) = detail.modifications.as_deref().filter(|m| !m.is_empty()) {
            out.push_str(&format!(" - Modifications: {modifications}"));
        }
        if let Some(portion) = detail.portion_size.as_deref().filter(|p| *p != "full") {
            out.push_str(&format!(" - Portion: {portion}"));
        }
        out.push('\n');
    }

    out
}

/// Feedback lines with their steering actions.
pub fn render_feedback(feedback: &UserFeedback) -> String {
    let mut out = String::new();
    if let Some(satisfaction) = feedback.overall_satisfaction {
        out.push_str(&format!("Overall Satisfaction: {satisfaction}/5\n"));
    }
    if let Some(liked) = feedback.liked_meals.as_deref() {
        out.push_str(&format!("Liked Meals: {liked}\n"));
        out.push_str("  -> ACTION: Include similar meals in today's plan\n");
    }
    if let Some(disliked) = feedback.disliked_meals.as_deref() {
        out.push_str(&format!("Disliked Meals: {disliked}\n"));
        out.push_str("  -> ACTION: Avoid these meals completely\n");
    }
    if let Some(suggestions) = feedback.suggestions.as_deref() {
        out.push_str(&format!("User Suggestions: {suggestions}\n"));
    }
    if let Some(met) = feedback.hunger_level_met {
        out.push_str(&format!(
            "Hunger Level Met: {}\n",
            if met { "Yes" } else { "No" }
        ));
        if !met {
            out.push_str("  -> ACTION: Increase portion sizes or add more filling meals\n");
        }
    }
    if let Some(energy) = feedback.energy_level {
        out.push_str(&format!("Energy Level: {energy}/5\n"));
    }
    out
}

fn render_adjustments(
    profile: &HealthProfile,
    summary: &ConsumptionSummary,
    feedback: Option<&UserFeedback>,
) -> String {
    let mut out = String::new();
    out.push_str("\n=== INTELLIGENT ADJUSTMENTS FOR TODAY ===\n");
    out.push_str("Based on the analysis above, generate today's meal plan with these considerations:\n\n");

    if summary.deficit > 0.0 {
        out.push_str(&format!(
            "1. CALORIE ADJUSTMENT: User under-ate by {} calories. Increase today's total calories by approximately {} calories.\n",
            summary.deficit, summary.deficit
        ));
    } else if summary.surplus > 0.0 {
        out.push_str(&format!(
            "1. CALORIE ADJUSTMENT: User over-ate by {} calories. Reduce today's total calories or suggest lighter, lower-calorie meals.\n",
            summary.surplus
        ));
    }

    if !summary.skipped_meals.is_empty() {
        out.push_str(&format!(
            "2. SKIPPED MEALS: User skipped {} meal(s). Suggest easier-to-prepare or quicker options for those meal types.\n",
            summary.skipped_meals.len()
        ));
    }

    if !summary.timing_patterns.is_empty() {
        let avg = average_delay_minutes(summary).unwrap_or(0);
        out.push_str(&format!(
            "3. TIMING ADJUSTMENT: Adjust suggested meal times based on user's actual eating patterns (average difference: {avg} minutes).\n"
        ));
    }

    out.push_str("4. VARIETY: Avoid repeating the exact same meals from yesterday.\n");
    out.push_str("5. INGREDIENTS: Use remaining ingredients from user's available list.\n");
    out.push_str(&format!(
        "6. FITNESS GOAL: Maintain progress toward user's fitness goal ({}).\n",
        profile.fitness_plan.as_deref().unwrap_or("not specified")
    ));

    if let Some(liked) = feedback.and_then(|f| f.liked_meals.as_deref()) {
        out.push_str(&format!(
            "7. PREFERENCES: Include meals similar to what user liked: {liked}\n"
        ));
    }
    if let Some(disliked) = feedback.and_then(|f| f.disliked_meals.as_deref()) {
        out.push_str(&format!(
            "8. AVOID: Do not include meals similar to: {disliked}\n"
        ));
    }

    out.push_str(
        "\nGenerate today's meal plan following the same JSON format as specified in the main prompt.\nResponse (JSON ONLY):",
    );
    out
}

/// Average of the positive timing differences, rounded to whole minutes.
fn average_delay_minutes(summary: &ConsumptionSummary) -> Option<i64> {
    let delays: Vec<i64> = summary
        .timing_patterns
        .iter()
        .map(|pattern| pattern.difference_minutes)
        .filter(|minutes| *minutes > 0)
        .collect();
    if delays.is_empty() {
        return None;
    }
    let sum: i64 = delays.iter().sum();
    Some((sum as f64 / delays.len() as f64).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meal_pipeline::{TrackedMeal, TrackingStatus, analyze_consumption};

    fn summary_with(events: Vec<TrackedMeal>, target: f64) -> ConsumptionSummary {
        analyze_consumption("2026-08-06", &events, target)
    }

    #[test]
    fn base_prompt_declares_the_extraction_contract() {
        let prompt = build_meal_plan_prompt(&HealthProfile::default(), PlanType::Daily);
        assert!(prompt.contains(r#""days": ["#));
        assert!(prompt.contains(r#""meal_type": "breakfast""#));
        assert!(prompt.contains("Response (JSON ONLY):"));
        assert!(prompt.contains("exactly 1 day(s)"));
    }

    #[test]
    fn weekly_plan_asks_for_seven_days() {
        let prompt = build_meal_plan_prompt(&HealthProfile::default(), PlanType::Weekly);
        assert!(prompt.contains("exactly 7 day(s)"));
    }

    #[test]
    fn deficit_renders_increase_action() {
        let events = vec![TrackedMeal {
            meal_type: "breakfast".to_string(),
            dish_name: "Oats".to_string(),
            consumed_calories: Some(300.0),
            status: TrackingStatus::Ate,
            ..TrackedMeal::default()
        }];
        let section = render_consumption_analysis(&summary_with(events, 2000.0));
        assert!(section.contains("Calorie Deficit: 1700 calories"));
        assert!(section.contains("Increase calories in today's plan"));
        assert!(section.contains("- Oats") || section.contains("breakfast: Oats"));
    }

    #[test]
    fn surplus_renders_reduce_action() {
        let events = vec![TrackedMeal {
            meal_type: "dinner".to_string(),
            dish_name: "Feast".to_string(),
            consumed_calories: Some(2500.0),
            status: TrackingStatus::Ate,
            ..TrackedMeal::default()
        }];
        let section = render_consumption_analysis(&summary_with(events, 2000.0));
        assert!(section.contains("Calorie Surplus: 500 calories"));
        assert!(section.contains("Reduce calories or suggest lighter meals"));
    }

    #[test]
    fn skipped_meals_and_timing_sections_render() {
        let events = vec![
            TrackedMeal {
                meal_type: "lunch".to_string(),
                dish_name: "Salad".to_string(),
                status: TrackingStatus::Skipped,
                suggested_time: Some("13:00".to_string()),
                ..TrackedMeal::default()
            },
            TrackedMeal {
                meal_type: "breakfast".to_string(),
                dish_name: "Oats".to_string(),
                status: TrackingStatus::Ate,
                consumed_calories: Some(300.0),
                suggested_time: Some("08:00".to_string()),
                actual_time: Some("08:45".to_string()),
                ..TrackedMeal::default()
            },
        ];
        let section = render_consumption_analysis(&summary_with(events, 2000.0));
        assert!(section.contains("SKIPPED MEALS:"));
        assert!(section.contains("lunch: Salad (suggested at 13:00)"));
        assert!(section.contains("45 min late"));
        assert!(section.contains("Average timing difference: 45 minutes"));
    }

    #[test]
    fn next_day_prompt_includes_adjustments_and_feedback() {
        let events = vec![TrackedMeal {
            meal_type: "breakfast".to_string(),
            dish_name: "Oats".to_string(),
            consumed_calories: Some(300.0),
            status: TrackingStatus::Ate,
            ..TrackedMeal::default()
        }];
        let summary = summary_with(events, 2000.0);
        let feedback = UserFeedback {
            liked_meals: Some("Oats".to_string()),
            disliked_meals: Some("Liver".to_string()),
            hunger_level_met: Some(false),
            ..UserFeedback::default()
        };
        let prompt = build_next_day_prompt(
            &HealthProfile::default(),
            &summary,
            Some(&feedback),
            PlanType::Daily,
        );
        assert!(prompt.contains("=== YESTERDAY'S CONSUMPTION ANALYSIS ==="));
        assert!(prompt.contains("=== USER FEEDBACK ==="));
        assert!(prompt.contains("=== INTELLIGENT ADJUSTMENTS FOR TODAY ==="));
        assert!(prompt.contains("7. PREFERENCES: Include meals similar to what user liked: Oats"));
        assert!(prompt.contains("8. AVOID: Do not include meals similar to: Liver"));
        assert!(prompt.contains("Increase portion sizes or add more filling meals"));
    }

    #[test]
    fn feedback_prompt_appends_adjust_instruction() {
        let feedback = UserFeedback {
            overall_satisfaction: Some(4),
            ..UserFeedback::default()
        };
        let prompt =
            build_feedback_prompt(&HealthProfile::default(), &feedback, PlanType::Daily);
        assert!(prompt.contains("IMPORTANT: Previous Day Feedback:"));
        assert!(prompt.contains("Overall Satisfaction: 4/5"));
    }
}
