pub mod network_monitor;

pub use network_monitor::NetworkMonitor;
