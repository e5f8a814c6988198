/// Reports whether the network is reachable. Read at call time, never cached.
pub trait ConnectivityProbe: Send + Sync {
    fn is_online(&self) -> bool;
}
