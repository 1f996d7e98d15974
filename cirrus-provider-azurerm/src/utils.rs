//! Utility functions for value normalization and conversion

use std::collections::HashMap;

use cirrus_core::resource::Value;

/// Normalize location value (e.g., "West Europe" -> "westeurope")
pub fn normalize_location(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Convert a tags attribute into the API map
pub fn expand_tags(value: Option<&HashMap<String, Value>>) -> HashMap<String, String> {
    value
        .map(|tags| {
            tags.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Convert API tags into an attribute value
pub fn flatten_tags(tags: Option<&HashMap<String, String>>) -> Value {
    Value::Map(
        tags.map(|tags| {
            tags.iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect()
        })
        .unwrap_or_default(),
    )
}

/// Strings of a list attribute, skipping empty items
pub fn expand_string_list(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Value of an `Enabled`/`Disabled` switch
pub fn enabled_string(enabled: bool) -> String {
    if enabled { "Enabled" } else { "Disabled" }.to_string()
}

/// Whether an `Enabled`/`Disabled` switch is on
pub fn is_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("Enabled"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_location() {
        assert_eq!(normalize_location("West Europe"), "westeurope");
        assert_eq!(normalize_location("eastus2"), "eastus2");
        assert_eq!(normalize_location("  Japan East "), "japaneast");
    }

    #[test]
    fn test_tags_round_trip() {
        let attr = HashMap::from([
            ("env".to_string(), Value::from("prod")),
            ("team".to_string(), Value::from("db")),
        ]);
        let tags = expand_tags(Some(&attr));
        assert_eq!(tags.get("env").map(String::as_str), Some("prod"));
        assert_eq!(flatten_tags(Some(&tags)), Value::Map(attr));
        assert_eq!(flatten_tags(None), Value::Map(HashMap::new()));
    }

    #[test]
    fn test_expand_string_list_skips_empty() {
        let items = vec![Value::from("10.0.0.0/16"), Value::from(""), Value::Int(3)];
        assert_eq!(expand_string_list(&items), vec!["10.0.0.0/16".to_string()]);
    }

    #[test]
    fn test_enabled_switch() {
        assert_eq!(enabled_string(true), "Enabled");
        assert_eq!(enabled_string(false), "Disabled");
        assert!(is_enabled(Some("Enabled")));
        assert!(!is_enabled(Some("Disabled")));
        assert!(!is_enabled(None));
    }
}
