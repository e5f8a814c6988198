use super::SyncMetadataRecord;
use crate::domain::value_objects::{MirroredTable, SyncStatus};
use serde::{Deserialize, Serialize};

/// Result of refreshing one mirrored table from the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSyncOutcome {
    pub table: MirroredTable,
    pub status: SyncStatus,
    pub record_count: u64,
    pub error_message: Option<String>,
    /// Set when the refresh was not attempted (offline, store not ready).
    pub skipped: bool,
}

impl TableSyncOutcome {
    pub fn synced(table: MirroredTable, record_count: u64) -> Self {
        Self {
            table,
            status: SyncStatus::Synced,
            record_count,
            error_message: None,
            skipped: false,
        }
    }

    pub fn failed(table: MirroredTable, message: String) -> Self {
        Self {
            table,
            status: SyncStatus::Error,
            record_count: 0,
            error_message: Some(message),
            skipped: false,
        }
    }

    pub fn skipped(table: MirroredTable) -> Self {
        Self {
            table,
            status: SyncStatus::Pending,
            record_count: 0,
            error_message: None,
            skipped: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub outcomes: Vec<TableSyncOutcome>,
}

impl SyncReport {
    pub fn synced_tables(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !o.skipped && o.status == SyncStatus::Synced)
            .count()
    }

    pub fn failed_tables(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == SyncStatus::Error)
            .count()
    }

    pub fn skipped_tables(&self) -> usize {
        self.outcomes.iter().filter(|o| o.skipped).count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayResult {
    pub synced_count: u32,
    pub failed_count: u32,
    pub pending_count: u32,
}

/// Aggregated view over the metadata ledger and the change queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStatusSummary {
    pub tables: Vec<SyncMetadataRecord>,
    pub synced_tables: usize,
    pub pending_tables: usize,
    pub conflict_tables: usize,
    pub error_tables: usize,
    pub mirrored_records: u64,
    pub pending_changes: usize,
}

impl SyncStatusSummary {
    pub fn from_parts(tables: Vec<SyncMetadataRecord>, pending_changes: usize) -> Self {
        let count = |status: SyncStatus| tables.iter().filter(|t| t.status == status).count();
        Self {
            synced_tables: count(SyncStatus::Synced),
            pending_tables: count(SyncStatus::Pending),
            conflict_tables: count(SyncStatus::Conflict),
            error_tables: count(SyncStatus::Error),
            mirrored_records: tables.iter().map(|t| t.record_count).sum(),
            pending_changes,
            tables,
        }
    }

    pub fn is_fully_synced(&self) -> bool {
        !self.tables.is_empty() && self.synced_tables == self.tables.len() && self.pending_changes == 0
    }
}
