//! User health profile and the prompt-input shaping derived from it.

use meal_pipeline::normalize_number;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Health details supplied per request; every field is optional and the
/// prompt builder substitutes sensible wording for anything missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthProfile {
    pub age: Option<u32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub gender: Option<String>,
    pub fitness_plan: Option<String>,
    pub disease: Option<String>,
    pub lifestyle: Option<String>,
    pub workout_type: Option<String>,
    pub workout_intensity: Option<String>,
    /// Free text like "45 minutes"; only the number is forwarded.
    pub workout_time: Option<String>,
    pub meal_type: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// "veggies" or "mass" forces the bucket; anything else auto-splits.
    pub ingredient_category: Option<String>,
    #[serde(default)]
    pub food_preparation_materials: Vec<String>,
    pub bread_type: Option<String>,
    pub rice_type: Option<String>,
    #[serde(default)]
    pub sprouts_material: Vec<String>,
}

const COMMON_MEAT: &[&str] = &[
    "chicken", "beef", "pork", "fish", "egg", "eggs", "turkey", "lamb",
];

const COMMON_OILS: &[&str] = &[
    "oil", "olive", "coconut", "sunflower", "mustard", "sesame", "avocado",
];

/// Daily calorie target from the Mifflin-St Jeor BMR, a moderate activity
/// multiplier, and a fitness-goal adjustment. Seeds the analytics target;
/// the pipeline never computes this itself.
pub fn target_calories(profile: &HealthProfile) -> i64 {
    let age = f64::from(profile.age.unwrap_or(30));
    let weight = profile.weight.unwrap_or(70.0);
    let height = profile.height.unwrap_or(170.0);

    let bmr = match profile.gender.as_deref() {
        Some("male") | None => 10.0 * weight + 6.25 * height - 5.0 * age + 5.0,
        Some(_) => 10.0 * weight + 6.25 * height - 5.0 * age - 161.0,
    };

    let maintenance = bmr * 1.55;

    let adjustment = match profile.fitness_plan.as_deref().unwrap_or("weight_loss") {
        "weight_loss" => -500.0,
        "weight_gain" => 500.0,
        "muscle_building" => 300.0,
        "fat_burning" => -300.0,
        _ => 0.0,
    };

    (maintenance + adjustment) as i64
}

/// First embedded integer of a workout-time string ("45 minutes" -> 45).
pub fn workout_minutes(workout_time: Option<&str>) -> Option<i64> {
    let value = workout_time?;
    normalize_number(&Value::String(value.to_string())).map(|n| n as i64)
}

/// Split ingredients into vegetables/meat buckets. An explicit category
/// forces one bucket; otherwise common meat names are recognized.
pub fn categorize_ingredients(profile: &HealthProfile) -> Map<String, Value> {
    let mut buckets = Map::new();
    if profile.ingredients.is_empty() {
        return buckets;
    }

    match profile.ingredient_category.as_deref() {
        Some("veggies") => {
            buckets.insert("vegetables".to_string(), json!(profile.ingredients));
        }
        Some("mass") => {
            buckets.insert("meat".to_string(), json!(profile.ingredients));
        }
        _ => {
            let mut vegetables = Vec::new();
            let mut meat = Vec::new();
            for ingredient in &profile.ingredients {
                let lower = ingredient.to_lowercase();
                let is_meat = COMMON_MEAT.contains(&lower.as_str())
                    || lower.contains("chicken")
                    || lower.contains("fish")
                    || lower.contains("egg");
                if is_meat {
                    meat.push(ingredient.clone());
                } else {
                    vegetables.push(ingredient.clone());
                }
            }
            if !vegetables.is_empty() {
                buckets.insert("vegetables".to_string(), json!(vegetables));
            }
            if !meat.is_empty() {
                buckets.insert("meat".to_string(), json!(meat));
            }
        }
    }
    buckets
}

/// Split preparation materials into oils and spices.
pub fn split_preparation_materials(profile: &HealthProfile) -> Map<String, Value> {
    let mut buckets = Map::new();
    if profile.food_preparation_materials.is_empty() {
        return buckets;
    }

    let mut oils = Vec::new();
    let mut spices = Vec::new();
    for material in &profile.food_preparation_materials {
        let lower = material.to_lowercase();
        if COMMON_OILS.iter().any(|oil| lower.contains(oil)) {
            oils.push(material.clone());
        } else {
            spices.push(material.clone());
        }
    }
    if !oils.is_empty() {
        buckets.insert("oil".to_string(), json!(oils));
    }
    if !spices.is_empty() {
        buckets.insert("spices".to_string(), json!(spices));
    }
    buckets
}

/// The USER INPUT block serialized into every generation prompt.
pub fn prompt_input(profile: &HealthProfile) -> Value {
    json!({
        "age": profile.age,
        "weight": profile.weight,
        "height": profile.height,
        "gender": profile.gender,
        "fitness_plan": profile.fitness_plan,
        "disease": profile.disease.as_deref().unwrap_or("None"),
        "lifestyle": profile.lifestyle.as_deref().unwrap_or("Moderate"),
        "workout_type": profile.workout_type,
        "workout_intensity": profile.workout_intensity.as_deref().unwrap_or("High"),
        "workout_time_minutes": workout_minutes(profile.workout_time.as_deref()),
        "meal_type": profile.meal_type,
        "allergies": profile.allergies,
        "ingredients": categorize_ingredients(profile),
        "food_preparation": split_preparation_materials(profile),
        "bread_type": profile.bread_type,
        "rice_type": profile.rice_type,
        "sprouts_material": if profile.sprouts_material.is_empty() {
            Value::Null
        } else {
            json!(profile.sprouts_material)
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn profile() -> HealthProfile {
        HealthProfile {
            age: Some(30),
            weight: Some(70.0),
            height: Some(170.0),
            gender: Some("male".to_string()),
            fitness_plan: Some("muscle_building".to_string()),
            ..HealthProfile::default()
        }
    }

    #[test]
    fn target_calories_for_males_and_females_differ() {
        // BMR male: 700 + 1062.5 - 150 + 5 = 1617.5; x1.55 = 2507.125; +300
        assert_eq!(target_calories(&profile()), 2807);

        let female = HealthProfile {
            gender: Some("female".to_string()),
            ..profile()
        };
        // BMR female: 1617.5 - 166 = 1451.5; x1.55 = 2249.825; +300
        assert_eq!(target_calories(&female), 2549);
    }

    #[test]
    fn fitness_goal_adjusts_target() {
        let cutting = HealthProfile {
            fitness_plan: Some("weight_loss".to_string()),
            ..profile()
        };
        let bulking = HealthProfile {
            fitness_plan: Some("weight_gain".to_string()),
            ..profile()
        };
        assert_eq!(target_calories(&bulking) - target_calories(&cutting), 1000);
    }

    #[test]
    fn missing_fitness_plan_defaults_to_weight_loss() {
        let unspecified = HealthProfile {
            fitness_plan: None,
            ..profile()
        };
        let explicit = HealthProfile {
            fitness_plan: Some("weight_loss".to_string()),
            ..profile()
        };
        assert_eq!(target_calories(&unspecified), target_calories(&explicit));
    }

    #[test]
    fn workout_minutes_extracts_first_number() {
        assert_eq!(workout_minutes(Some("45 minutes")), Some(45));
        assert_eq!(workout_minutes(Some("about an hour")), None);
        assert_eq!(workout_minutes(None), None);
    }

    #[test]
    fn ingredients_auto_split_into_buckets() {
        let mixed = HealthProfile {
            ingredients: vec![
                "Spinach".to_string(),
                "Chicken breast".to_string(),
                "Eggs".to_string(),
                "Rice".to_string(),
            ],
            ..HealthProfile::default()
        };
        let buckets = categorize_ingredients(&mixed);
        assert_eq!(buckets["vegetables"], json!(["Spinach", "Rice"]));
        assert_eq!(buckets["meat"], json!(["Chicken breast", "Eggs"]));
    }

    #[test]
    fn explicit_category_forces_one_bucket() {
        let veggies = HealthProfile {
            ingredients: vec!["Chicken".to_string()],
            ingredient_category: Some("veggies".to_string()),
            ..HealthProfile::default()
        };
        let buckets = categorize_ingredients(&veggies);
        assert_eq!(buckets["vegetables"], json!(["Chicken"]));
        assert!(!buckets.contains_key("meat"));
    }

    #[test]
    fn preparation_materials_split_by_oil_keywords() {
        let materials = HealthProfile {
            food_preparation_materials: vec![
                "Olive oil".to_string(),
                "Cumin".to_string(),
                "Sesame Oil".to_string(),
                "Paprika".to_string(),
            ],
            ..HealthProfile::default()
        };
        let buckets = split_preparation_materials(&materials);
        assert_eq!(buckets["oil"], json!(["Olive oil", "Sesame Oil"]));
        assert_eq!(buckets["spices"], json!(["Cumin", "Paprika"]));
    }

    #[test]
    fn prompt_input_carries_defaults_for_missing_fields() {
        let input = prompt_input(&HealthProfile::default());
        assert_eq!(input["disease"], json!("None"));
        assert_eq!(input["lifestyle"], json!("Moderate"));
        assert_eq!(input["workout_intensity"], json!("High"));
        assert_eq!(input["sprouts_material"], Value::Null);
    }
}
