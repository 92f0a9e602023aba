//! Sandbox environment descriptor.
//!
//! The render program needs certain globals in place before any component
//! code loads: the DOM-like trio (`window`, `document`, `navigator`) plus
//! whatever the caller configured. The DOM globals are constructed inside the
//! synthesized program itself (they are not JSON-serializable); this type
//! carries only the serializable values and hands them to the sandbox as a
//! single JSON argument, so no ambient global state is mutated on this side.

use serde_json::{Map, Value};

/// Merged global-variable mapping for one run. Override wins on collision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    values: Map<String, Value>,
}

impl Environment {
    /// Merge a base mapping with caller overrides; overrides win.
    pub fn merged(base: Map<String, Value>, overrides: Map<String, Value>) -> Self {
        let mut values = base;
        for (key, value) in overrides {
            values.insert(key, value);
        }
        Self { values }
    }

    /// Build from the `[render.globals]` config table.
    pub fn from_globals(globals: &toml::Table) -> Self {
        // toml::Value serializes losslessly into JSON
        let overrides = match serde_json::to_value(globals) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self::merged(Map::new(), overrides)
    }

    /// Serialize to the JSON object passed to the sandbox process.
    pub fn to_json(&self) -> String {
        // A string-keyed map of JSON values cannot fail to serialize
        serde_json::to_string(&Value::Object(self.values.clone())).unwrap_or_else(|_| "{}".into())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn value(env: &Environment) -> Value {
        serde_json::from_str(&env.to_json()).unwrap()
    }

    #[test]
    fn test_override_wins_on_collision() {
        let base = map(&[("a", json!(1))]);
        let overrides = map(&[("a", json!(2)), ("b", json!(3))]);
        let env = Environment::merged(base, overrides);

        assert_eq!(value(&env), json!({"a": 2, "b": 3}));
    }

    #[test]
    fn test_empty_environment_serializes_to_empty_object() {
        assert_eq!(Environment::default().to_json(), "{}");
    }

    #[test]
    fn test_from_globals_table() {
        let table: toml::Table = toml::from_str(
            r#"
API_BASE = "https://api.example.com"
DEBUG = true
RETRIES = 3
"#,
        )
        .unwrap();
        let env = Environment::from_globals(&table);

        assert_eq!(
            value(&env),
            json!({
                "API_BASE": "https://api.example.com",
                "DEBUG": true,
                "RETRIES": 3,
            })
        );
    }

    #[test]
    fn test_json_round_trips() {
        let env = Environment::merged(Map::new(), map(&[("x", json!({"nested": [1, 2]}))]));
        let parsed: Value = serde_json::from_str(&env.to_json()).unwrap();
        assert_eq!(parsed, json!({"x": {"nested": [1, 2]}}));
    }
}
