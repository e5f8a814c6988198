use super::MirroredTable;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Queue entry identifier, `{table}_{record_id}_{created_at_millis}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PendingChangeId(String);

impl PendingChangeId {
    pub fn generate(table: MirroredTable, record_id: &str, created_at_millis: i64) -> Self {
        Self(format!("{}_{}_{}", table.as_str(), record_id, created_at_millis))
    }

    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Pending change ID cannot be empty".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for PendingChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PendingChangeId> for String {
    fn from(id: PendingChangeId) -> Self {
        id.0
    }
}

impl FromStr for PendingChangeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}
