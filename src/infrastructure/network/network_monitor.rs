use crate::application::ports::ConnectivityProbe;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Connectivity flag flipped by whoever observes the network (OS events, a
/// failed health check). Readers see the latest value on every call.
#[derive(Debug)]
pub struct NetworkMonitor {
    online: AtomicBool,
}

impl NetworkMonitor {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous != online {
            info!("Network connectivity changed: online={}", online);
        }
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityProbe for NetworkMonitor {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflects_latest_state() {
        let monitor = NetworkMonitor::default();
        assert!(monitor.is_online());
        monitor.set_online(false);
        assert!(!monitor.is_online());
    }
}
