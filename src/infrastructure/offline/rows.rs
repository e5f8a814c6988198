use crate::domain::entities::{PendingChange, SyncMetadataRecord};
use crate::domain::value_objects::{ChangeOperation, MirroredTable, PendingChangeId, SyncStatus};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub(super) struct SyncMetadataRow {
    pub table_name: String,
    pub last_sync: i64,
    pub status: String,
    pub record_count: i64,
    pub error_message: Option<String>,
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub(super) struct PendingChangeRow {
    pub id: String,
    pub table_name: String,
    pub record_id: String,
    pub operation: String,
    pub data: String,
    pub created_at: i64,
    pub synced: bool,
}

fn millis_to_datetime(value: i64, field: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::<Utc>::from_timestamp_millis(value)
        .ok_or_else(|| AppError::DeserializationError(format!("Invalid {field} timestamp: {value}")))
}

impl TryFrom<SyncMetadataRow> for SyncMetadataRecord {
    type Error = AppError;

    fn try_from(row: SyncMetadataRow) -> Result<Self, Self::Error> {
        Ok(SyncMetadataRecord {
            table_name: row
                .table_name
                .parse::<MirroredTable>()
                .map_err(AppError::DeserializationError)?,
            last_sync: millis_to_datetime(row.last_sync, "last_sync")?,
            status: row
                .status
                .parse::<SyncStatus>()
                .map_err(AppError::DeserializationError)?,
            record_count: u64::try_from(row.record_count).map_err(|_| {
                AppError::DeserializationError(format!(
                    "Negative record_count for {}",
                    row.table_name
                ))
            })?,
            error_message: row.error_message,
            updated_at: row
                .updated_at
                .map(|value| millis_to_datetime(value, "updated_at"))
                .transpose()?,
        })
    }
}

impl TryFrom<PendingChangeRow> for PendingChange {
    type Error = AppError;

    fn try_from(row: PendingChangeRow) -> Result<Self, Self::Error> {
        Ok(PendingChange {
            id: PendingChangeId::new(row.id).map_err(AppError::DeserializationError)?,
            table_name: row
                .table_name
                .parse::<MirroredTable>()
                .map_err(AppError::DeserializationError)?,
            record_id: row.record_id,
            operation: row
                .operation
                .parse::<ChangeOperation>()
                .map_err(AppError::DeserializationError)?,
            data: serde_json::from_str(&row.data)?,
            created_at: millis_to_datetime(row.created_at, "created_at")?,
            synced: row.synced,
        })
    }
}
