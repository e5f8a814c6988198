use crate::domain::value_objects::{MirroredTable, SyncStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ledger row per mirrored table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMetadataRecord {
    pub table_name: MirroredTable,
    pub last_sync: DateTime<Utc>,
    pub status: SyncStatus,
    pub record_count: u64,
    pub error_message: Option<String>,
    /// Only tracked by the SQLite backing.
    pub updated_at: Option<DateTime<Utc>>,
}

impl SyncMetadataRecord {
    /// State written at store initialization.
    pub fn initial(table_name: MirroredTable) -> Self {
        Self {
            table_name,
            last_sync: DateTime::<Utc>::UNIX_EPOCH,
            status: SyncStatus::Pending,
            record_count: 0,
            error_message: None,
            updated_at: None,
        }
    }
}

/// Partial update. `None` leaves the stored field untouched; for
/// `error_message`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncMetadataUpdate {
    pub last_sync: Option<DateTime<Utc>>,
    pub status: Option<SyncStatus>,
    pub record_count: Option<u64>,
    pub error_message: Option<Option<String>>,
}

impl SyncMetadataUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_sync(mut self, at: DateTime<Utc>) -> Self {
        self.last_sync = Some(at);
        self
    }

    pub fn status(mut self, status: SyncStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn record_count(mut self, count: u64) -> Self {
        self.record_count = Some(count);
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(Some(message.into()));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.error_message = Some(None);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_distinguishes_set_from_clear() {
        let set = SyncMetadataUpdate::new()
            .status(SyncStatus::Error)
            .error_message("timeout");
        assert_eq!(set.error_message, Some(Some("timeout".to_string())));
        assert_eq!(set.record_count, None);

        let cleared = set.clear_error();
        assert_eq!(cleared.error_message, Some(None));
        assert_eq!(cleared.status, Some(SyncStatus::Error));
        assert_eq!(SyncMetadataUpdate::new().error_message, None);
    }
}
