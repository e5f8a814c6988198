pub mod pending_change;
pub mod printer;
pub mod record;
pub mod sync_metadata;
pub mod sync_report;

pub use pending_change::PendingChange;
pub use printer::{AssignedPrinter, ClientSummary, LocationSummary, Printer, PrinterAssignment};
pub use record::{Record, RecordFilter};
pub use sync_metadata::{SyncMetadataRecord, SyncMetadataUpdate};
pub use sync_report::{ReplayResult, SyncReport, SyncStatusSummary, TableSyncOutcome};
