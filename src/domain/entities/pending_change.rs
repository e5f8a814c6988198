use crate::domain::value_objects::{ChangeOperation, MirroredTable, PendingChangeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A queued local write. Only `synced` ever changes, and only from false to true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingChange {
    pub id: PendingChangeId,
    pub table_name: MirroredTable,
    pub record_id: String,
    pub operation: ChangeOperation,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub synced: bool,
}

impl PendingChange {
    pub fn new(
        table_name: MirroredTable,
        record_id: String,
        operation: ChangeOperation,
        data: Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PendingChangeId::generate(table_name, &record_id, created_at.timestamp_millis()),
            table_name,
            record_id,
            operation,
            data,
            created_at,
            synced: false,
        }
    }
}
