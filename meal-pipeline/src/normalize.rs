//! Coercion helpers for the loosely-typed values the model returns.
//!
//! The model regularly emits `"350 kcal"` where a number was asked for and
//! `"rice, beans"` where an array was asked for; these helpers absorb that
//! instead of erroring.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

fn embedded_number_regex() -> &'static Regex {
    static EMBEDDED_NUMBER_RE: OnceLock<Regex> = OnceLock::new();
    EMBEDDED_NUMBER_RE
        .get_or_init(|| Regex::new(r"(\d+\.?\d*)").expect("embedded number regex must compile"))
}

/// Coerce a value into a float. Numbers pass through; strings parse whole
/// or yield their first embedded number (`"350kcal"` -> `350.0`); anything
/// else is absent.
pub fn normalize_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(parsed) = trimmed.parse::<f64>() {
                return Some(parsed);
            }
            embedded_number_regex()
                .captures(trimmed)
                .and_then(|caps| caps[1].parse().ok())
        }
        _ => None,
    }
}

/// Coerce a value into a list of strings. Arrays are filtered of empty
/// entries; strings are tried as a JSON array first, then comma-split and
/// trimmed; anything else yields an empty list.
pub fn normalize_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => collect_entries(items),
        Value::String(s) => {
            if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(s) {
                return collect_entries(&items);
            }
            s.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        }
        _ => Vec::new(),
    }
}

fn collect_entries(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_pass_through() {
        assert_eq!(normalize_number(&json!(350)), Some(350.0));
        assert_eq!(normalize_number(&json!(12.5)), Some(12.5));
    }

    #[test]
    fn embedded_number_is_extracted() {
        assert_eq!(normalize_number(&json!("350 kcal")), Some(350.0));
        assert_eq!(normalize_number(&json!("350kcal")), Some(350.0));
        assert_eq!(normalize_number(&json!("about 12.5 g")), Some(12.5));
    }

    #[test]
    fn non_numeric_values_are_absent() {
        assert_eq!(normalize_number(&json!("none")), None);
        assert_eq!(normalize_number(&json!(null)), None);
        assert_eq!(normalize_number(&json!(true)), None);
        assert_eq!(normalize_number(&json!(["350"])), None);
    }

    #[test]
    fn negative_and_exponent_strings_parse_whole() {
        assert_eq!(normalize_number(&json!("-3.5")), Some(-3.5));
        assert_eq!(normalize_number(&json!("1e3")), Some(1000.0));
    }

    #[test]
    fn arrays_are_filtered_of_empty_entries() {
        assert_eq!(
            normalize_list(&json!(["oats", "", "  ", "milk"])),
            vec!["oats", "milk"]
        );
    }

    #[test]
    fn comma_separated_string_is_split_and_trimmed() {
        assert_eq!(
            normalize_list(&json!("a, b, , c")),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn json_array_string_is_parsed() {
        assert_eq!(
            normalize_list(&json!(r#"["rice", "beans"]"#)),
            vec!["rice", "beans"]
        );
    }

    #[test]
    fn scalars_yield_an_empty_list() {
        assert!(normalize_list(&json!(42)).is_empty());
        assert!(normalize_list(&json!(null)).is_empty());
    }
}
