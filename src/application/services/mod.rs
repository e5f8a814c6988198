pub mod mirror_sync_service;
pub mod offline_printer_service;

pub use mirror_sync_service::MirrorSyncService;
pub use offline_printer_service::OfflinePrinterService;
