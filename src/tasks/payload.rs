//! # Task payload: positional and keyword arguments.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Arguments handed to a handler on every attempt.
///
/// # Example
/// ```
/// use serde::Deserialize;
/// use taskpool::Payload;
///
/// #[derive(Deserialize)]
/// struct Email { to: String, subject: String }
///
/// let payload = Payload::new()
///     .arg("welcome")
///     .kwarg("to", "ops@example.com")
///     .kwarg("subject", "hello");
///
/// assert_eq!(payload.args[0], "welcome");
/// let email: Email = payload.kwargs_as().unwrap();
/// assert_eq!(email.to, "ops@example.com");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,
    /// Keyword arguments.
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl Payload {
    /// Empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Sets a keyword argument.
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Looks up a keyword argument.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.kwargs.get(key)
    }

    /// Deserializes the keyword arguments into `T`.
    pub fn kwargs_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.kwargs.clone()))
    }

    /// Deserializes the positional arguments (as a JSON array) into `T`.
    pub fn args_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Array(self.args.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn args_deserialize_as_tuple() {
        let p = Payload::new().arg(7).arg("sku-1");
        let (qty, sku): (u32, String) = p.args_as().unwrap();
        assert_eq!(qty, 7);
        assert_eq!(sku, "sku-1");
    }

    #[test]
    fn missing_fields_default_when_deserializing_payload() {
        let p: Payload = serde_json::from_value(json!({ "kwargs": { "a": 1 } })).unwrap();
        assert!(p.args.is_empty());
        assert_eq!(p.get("a"), Some(&json!(1)));
    }
}
