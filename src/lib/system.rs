//! Host resource sampling shared by the health tools and the probe.

use serde::Serialize;
use sysinfo::{Disks, System};

#[derive(Debug, Clone, Serialize)]
pub struct DiskUsage {
    pub mount_point: String,
    pub total_gb: f64,
    pub free_gb: f64,
    pub percent: f64,
}

/// Point-in-time CPU, memory and disk usage.
#[derive(Debug, Clone, Serialize)]
pub struct SystemSnapshot {
    pub cpu_percent: f64,
    pub cpu_count: usize,
    pub memory_percent: f64,
    pub memory_total_gb: f64,
    pub memory_available_gb: f64,
    pub disk: Option<DiskUsage>,
    pub os: String,
}

impl SystemSnapshot {
    /// Sample the host. CPU usage needs two refreshes, so this blocks for
    /// about [`sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`]; call it from a
    /// blocking task.
    pub fn capture() -> Self {
        let mut system = System::new();
        system.refresh_cpu();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_cpu();
        system.refresh_memory();

        let total = system.total_memory();
        let available = system.available_memory();
        let memory_percent = if total == 0 {
            0.0
        } else {
            (total.saturating_sub(available)) as f64 / total as f64 * 100.0
        };

        Self {
            cpu_percent: f64::from(system.global_cpu_info().cpu_usage()),
            cpu_count: system.cpus().len(),
            memory_percent,
            memory_total_gb: bytes_to_gb(total),
            memory_available_gb: bytes_to_gb(available),
            disk: root_disk_usage(),
            os: System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string()),
        }
    }
}

/// The disk mounted at `/` or, failing that, the largest disk.
fn root_disk_usage() -> Option<DiskUsage> {
    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .find(|d| d.mount_point() == std::path::Path::new("/"))
        .or_else(|| disks.list().iter().max_by_key(|d| d.total_space()))?;
    let total = disk.total_space();
    let free = disk.available_space();
    let percent = if total == 0 {
        0.0
    } else {
        total.saturating_sub(free) as f64 / total as f64 * 100.0
    };
    Some(DiskUsage {
        mount_point: disk.mount_point().display().to_string(),
        total_gb: bytes_to_gb(total),
        free_gb: bytes_to_gb(free),
        percent: round2(percent),
    })
}

fn bytes_to_gb(bytes: u64) -> f64 {
    round2(bytes as f64 / 1024f64.powi(3))
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
