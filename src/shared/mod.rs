pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, StorageMode};
pub use error::AppError;
pub use logging::init_logging;
