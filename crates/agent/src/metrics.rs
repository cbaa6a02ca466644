// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host metrics for heartbeats. Best effort: anything unreadable
//! reports as zero rather than failing the heartbeat.

use ap_core::AgentMetrics;
use sysinfo::{Disks, System};

/// Sample CPU, memory, and the largest free disk.
pub fn collect() -> AgentMetrics {
    let mut sys = System::new();
    sys.refresh_cpu();
    sys.refresh_memory();

    let cpu_percent = f64::from(sys.global_cpu_info().cpu_usage());
    let memory_percent = if sys.total_memory() > 0 {
        sys.used_memory() as f64 / sys.total_memory() as f64 * 100.0
    } else {
        0.0
    };

    let disks = Disks::new_with_refreshed_list();
    let disk_free_gb = disks
        .iter()
        .map(|disk| disk.available_space())
        .max()
        .unwrap_or(0) as f64
        / 1_000_000_000.0;

    AgentMetrics { cpu_percent, memory_percent, disk_free_gb }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_yields_sane_ranges() {
        let metrics = collect();
        assert!(metrics.cpu_percent >= 0.0);
        assert!((0.0..=100.0).contains(&metrics.memory_percent));
        assert!(metrics.disk_free_gb >= 0.0);
    }
}
