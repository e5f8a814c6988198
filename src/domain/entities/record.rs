use serde_json::{Map, Value};

/// A mirrored row: column name to JSON value. Opaque to the store beyond the
/// `id` primary key.
pub type Record = Map<String, Value>;

/// Exact-match conditions combined with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    conditions: Vec<(String, Value)>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|(column, expected)| {
            let stored = record.get(column).unwrap_or(&Value::Null);
            values_equal(stored, expected)
        })
    }
}

/// Equality that treats SQLite's integer booleans as equal to JSON booleans.
pub fn values_equal(stored: &Value, expected: &Value) -> bool {
    match (stored, expected) {
        (Value::Bool(b), Value::Number(n)) | (Value::Number(n), Value::Bool(b)) => {
            n.as_f64() == Some(if *b { 1.0 } else { 0.0 })
        }
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (a, b) => a == b,
    }
}

/// Reads the primary key of a record as text.
pub fn record_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Lenient deserializers for rows that may come from SQLite (integers for
/// booleans) or from the remote API (real booleans, numeric ids).
pub mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
            Value::String(s) => matches!(s.as_str(), "1" | "true" | "t"),
            _ => false,
        })
    }

    pub fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number id, got {other}"
            ))),
        }
    }

    pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number id, got {other}"
            ))),
        }
    }
}
