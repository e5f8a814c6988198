use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Per-table sync state. The ledger does not enforce transitions; any value may
/// follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Synced,
    #[default]
    Pending,
    /// Reserved for unresolved divergence. Stored and exposed, never produced here.
    Conflict,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Synced => "synced",
            SyncStatus::Pending => "pending",
            SyncStatus::Conflict => "conflict",
            SyncStatus::Error => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "synced" => Ok(SyncStatus::Synced),
            "pending" => Ok(SyncStatus::Pending),
            "conflict" => Ok(SyncStatus::Conflict),
            "error" => Ok(SyncStatus::Error),
            other => Err(format!("Unknown sync status: {other}")),
        }
    }
}
