//! Host resource-usage passthrough.
//!
//! Direct snapshot of OS metrics for the front end's `resources` command;
//! nothing here feeds back into lifecycle decisions.

use serde::Serialize;
use sysinfo::{Disks, System};

const GB: f64 = (1024u64 * 1024 * 1024) as f64;

/// Point-in-time host usage numbers, all in GB except the CPU figures.
#[derive(Debug, Clone, Serialize)]
pub struct HostUsage {
    pub total_ram_gb: f64,
    pub used_ram_gb: f64,
    pub cpu_cores: usize,
    pub cpu_usage_percent: f32,
    pub disk_total_gb: f64,
    pub disk_used_gb: f64,
}

/// Reads current RAM, CPU and disk usage from the OS.
pub fn snapshot() -> HostUsage {
    let mut sys = System::new_all();
    sys.refresh_memory();
    sys.refresh_cpu_usage();

    let disks = Disks::new_with_refreshed_list();
    let mut disk_total = 0u64;
    let mut disk_available = 0u64;
    for disk in disks.list() {
        disk_total += disk.total_space();
        disk_available += disk.available_space();
    }

    HostUsage {
        total_ram_gb: round2(sys.total_memory() as f64 / GB),
        used_ram_gb: round2(sys.used_memory() as f64 / GB),
        cpu_cores: sys.cpus().len(),
        cpu_usage_percent: sys.global_cpu_info().cpu_usage(),
        disk_total_gb: round2(disk_total as f64 / GB),
        disk_used_gb: round2(disk_total.saturating_sub(disk_available) as f64 / GB),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
