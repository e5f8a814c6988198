pub mod change_operation;
pub mod mirrored_table;
pub mod pending_change_id;
pub mod sync_status;

pub use change_operation::ChangeOperation;
pub use mirrored_table::{ColumnDef, ColumnType, MirroredTable};
pub use pending_change_id::PendingChangeId;
pub use sync_status::SyncStatus;
