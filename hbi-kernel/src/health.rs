use hbi_core::Inventory;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Serialize, Deserialize)]
pub struct KernelHealth {
    pub uptime_seconds: u64,
    pub hosts_tracked: usize,
    pub version: String,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthTracker {
    pub fn new() -> Self {
        Self { start_time: Instant::now() }
    }

    pub fn get_health(&self, inventory: &Inventory) -> KernelHealth {
        KernelHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            hosts_tracked: inventory.len(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hbi_core::{Host, HostInventory};

    #[test]
    fn test_hosts_tracked() {
        let inventory = Inventory::new();
        let tracker = HealthTracker::new();
        assert_eq!(tracker.get_health(&inventory).hosts_tracked, 0);

        inventory
            .create_or_update(vec![Host::new().with_canonical_fact("hostname", "h.example.com")])
            .unwrap();
        let health = tracker.get_health(&inventory);
        assert_eq!(health.hosts_tracked, 1);
        assert_eq!(health.version, "0.1.0");
    }
}
