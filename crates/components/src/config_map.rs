use crate::errors::ConfigMapError;
use common::diag;
use serde::Serialize;
use serde_json::{Map as JsonMap, Value as Json};
use std::collections::{BTreeMap, HashMap};

/// Flat `property -> value` view of a candidate connector configuration.
///
/// Keys are kept sorted so iteration (and anything derived from it) is
/// deterministic. Keys that no field declares are carried along untouched.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct ConfigMap(BTreeMap<String, String>);

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style insert, handy for assembling fixtures.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value.to_string());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Raw value as supplied, including blank strings.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Trimmed value, treating blank strings as absent.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn has_value(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Converts a JSON object into a config map.
    ///
    /// Strings are taken verbatim, numbers and booleans are rendered the way
    /// they appear in JSON and `null` means the key is absent. Arrays and
    /// nested objects have no flat representation and are rejected.
    pub fn from_json_object(object: JsonMap<String, Json>) -> Result<Self, ConfigMapError> {
        let mut config = ConfigMap::new();
        for (key, value) in object {
            let raw = match value {
                Json::String(s) => s,
                Json::Number(n) => n.to_string(),
                Json::Bool(b) => b.to_string(),
                Json::Null => continue,
                Json::Array(_) | Json::Object(_) => {
                    return Err(ConfigMapError::UnsupportedValue {
                        context: diag!("property '{}' must be a string, number or boolean", key),
                    })
                }
            };
            config.insert(key, raw);
        }
        Ok(config)
    }
}

impl TryFrom<Json> for ConfigMap {
    type Error = ConfigMapError;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        match value {
            Json::Object(object) => Self::from_json_object(object),
            other => Err(ConfigMapError::NotAnObject {
                context: diag!("request body must be a JSON object, got {}", json_kind(&other)),
            }),
        }
    }
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

impl<K, V> FromIterator<(K, V)> for ConfigMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<HashMap<String, String>> for ConfigMap {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_values_count_as_absent() {
        let config = ConfigMap::new().with("topic.prefix", "   ").with("name", " app ");
        assert_eq!(config.get("topic.prefix"), Some("   "));
        assert_eq!(config.value("topic.prefix"), None);
        assert_eq!(config.value("name"), Some("app"));
        assert!(!config.has_value("missing"));
    }

    #[test]
    fn scalar_json_values_are_stringified() {
        let config = ConfigMap::try_from(json!({
            "mongodb.server.selection.timeout.ms": 10000,
            "mongodb.ssl.enabled": false,
            "topic.prefix": "mongo1",
            "mongodb.user": null
        }))
        .expect("flat object");

        assert_eq!(config.get("mongodb.server.selection.timeout.ms"), Some("10000"));
        assert_eq!(config.get("mongodb.ssl.enabled"), Some("false"));
        assert_eq!(config.get("topic.prefix"), Some("mongo1"));
        assert_eq!(config.get("mongodb.user"), None);
        assert_eq!(config.len(), 3);
    }

    #[test]
    fn nested_values_are_rejected() {
        let err = ConfigMap::try_from(json!({ "transforms": ["a", "b"] })).expect_err("nested");
        assert!(matches!(err, ConfigMapError::UnsupportedValue { .. }));
        assert_eq!(
            err.message(),
            "property 'transforms' must be a string, number or boolean"
        );
    }

    #[test]
    fn non_objects_are_rejected() {
        let err = ConfigMap::try_from(json!(["connector.class"])).expect_err("array body");
        assert!(matches!(err, ConfigMapError::NotAnObject { .. }));
    }

    #[test]
    fn iteration_is_sorted() {
        let config: ConfigMap = [("b", "2"), ("a", "1"), ("c", "3")].into_iter().collect();
        let keys: Vec<&str> = config.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }
}
