//! System performance tool definition.
//!
//! Reports CPU, memory and disk figures of the host, and memory usage per
//! application. Figures come from the local OS; nothing is proxied.

use std::collections::HashMap;

use axum::routing::get;
use chrono::Local;
use serde::Serialize;
use serde_json::{Value, json};
use sysinfo::{Disks, MINIMUM_CPU_UPDATE_INTERVAL, ProcessesToUpdate, System};
use tracing::{info, instrument};

use crate::domains::tools::{ApiError, ApiResult, RouteScope, ToolError, ToolPlugin, success};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Applications listed individually before the rest is folded into "Others".
pub const TOP_PROCESSES: usize = 10;

const WELCOME_MESSAGE: &str = "Welcome to Dev Tool System Info! \
     Your server status and system information are displayed below.";

// ============================================================================
// Memory Usage
// ============================================================================

/// One running process, as sampled.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSample {
    pub name: String,
    pub memory_mb: f64,
    pub cpu_percent: f64,
}

/// Processes sharing a name, summed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessGroup {
    pub name: String,
    pub memory_mb: f64,
    pub cpu_percent: f64,
    pub count: usize,
    pub percentage: f64,
}

/// Memory usage grouped by application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryUsage {
    pub processes: Vec<ProcessGroup>,
    pub total_memory_mb: f64,
    pub process_count: usize,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Group samples by process name, keep the largest [`TOP_PROCESSES`] groups
/// and fold the remainder into one "Others" entry.
///
/// `percentage` is each entry's share of the listed total. `process_count`
/// counts distinct names, not processes.
pub fn group_process_usage(samples: impl IntoIterator<Item = ProcessSample>) -> MemoryUsage {
    let mut groups: HashMap<String, ProcessGroup> = HashMap::new();
    for sample in samples {
        let group = groups
            .entry(sample.name.clone())
            .or_insert_with(|| ProcessGroup {
                name: sample.name,
                memory_mb: 0.0,
                cpu_percent: 0.0,
                count: 0,
                percentage: 0.0,
            });
        group.memory_mb += sample.memory_mb;
        group.cpu_percent += sample.cpu_percent;
        group.count += 1;
    }

    let mut grouped: Vec<ProcessGroup> = groups.into_values().collect();
    grouped.sort_by(|a, b| {
        b.memory_mb
            .total_cmp(&a.memory_mb)
            .then_with(|| a.name.cmp(&b.name))
    });
    let process_count = grouped.len();

    let rest = grouped.split_off(grouped.len().min(TOP_PROCESSES));
    let mut top = grouped;
    let others_memory: f64 = rest.iter().map(|g| g.memory_mb).sum();
    if others_memory > 0.0 {
        top.push(ProcessGroup {
            name: "Others".to_string(),
            memory_mb: others_memory,
            cpu_percent: rest.iter().map(|g| g.cpu_percent).sum(),
            count: rest.len(),
            percentage: 0.0,
        });
    }

    let total: f64 = top.iter().map(|g| g.memory_mb).sum();
    for group in &mut top {
        group.percentage = if total > 0.0 {
            round_to(group.memory_mb / total * 100.0, 1)
        } else {
            0.0
        };
        group.memory_mb = round_to(group.memory_mb, 2);
        group.cpu_percent = round_to(group.cpu_percent, 1);
    }

    MemoryUsage {
        processes: top,
        total_memory_mb: round_to(total, 2),
        process_count,
    }
}

/// Sample every process. Blocks for one CPU measurement interval.
fn sample_processes() -> Vec<ProcessSample> {
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::All, true);
    std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_processes(ProcessesToUpdate::All, true);

    sys.processes()
        .values()
        .map(|process| ProcessSample {
            name: process.name().to_string_lossy().into_owned(),
            memory_mb: process.memory() as f64 / BYTES_PER_MB,
            cpu_percent: f64::from(process.cpu_usage()),
        })
        .collect()
}

// ============================================================================
// System Info
// ============================================================================

fn usage_percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        round_to(used as f64 / total as f64 * 100.0, 2)
    }
}

fn gigabytes(bytes: u64) -> f64 {
    round_to(bytes as f64 / BYTES_PER_GB, 2)
}

/// Host figures. Blocks for one CPU measurement interval.
fn system_info() -> Value {
    let mut sys = System::new();
    sys.refresh_cpu_usage();
    std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();
    sys.refresh_memory();

    let (disk_total, disk_available) = Disks::new_with_refreshed_list()
        .list()
        .iter()
        .find(|disk| disk.mount_point() == std::path::Path::new("/"))
        .map(|disk| (disk.total_space(), disk.available_space()))
        .unwrap_or((0, 0));
    let disk_used = disk_total.saturating_sub(disk_available);

    let now = Local::now();
    json!({
        "welcome_message": WELCOME_MESSAGE,
        "server_time": now.format("%B %d, %Y at %I:%M %p").to_string(),
        "status": "Server running smoothly",
        "system_stats": {
            "cpu": {
                "usage_percent": round_to(f64::from(sys.global_cpu_usage()), 1),
                "core_count": sys.cpus().len(),
            },
            "memory": {
                "used_gb": gigabytes(sys.used_memory()),
                "total_gb": gigabytes(sys.total_memory()),
                "usage_percent": usage_percent(sys.used_memory(), sys.total_memory()),
            },
            "disk": {
                "used_gb": gigabytes(disk_used),
                "total_gb": gigabytes(disk_total),
                "usage_percent": usage_percent(disk_used, disk_total),
            },
        },
        "system_info": {
            "platform": System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
            "platform_release": System::kernel_version().unwrap_or_default(),
            "architecture": std::env::consts::ARCH,
            "hostname": System::host_name().unwrap_or_default(),
        },
    })
}

// ============================================================================
// Tool Definition
// ============================================================================

/// System performance tool - host metrics from the local OS.
pub struct SystemPerformanceTool;

impl SystemPerformanceTool {
    /// Directory name of the tool package.
    pub const TOOL_ID: &'static str = "dev-tool-system-performance";

    /// `GET /info`
    #[instrument]
    async fn get_system_info() -> ApiResult {
        let info = tokio::task::spawn_blocking(system_info)
            .await
            .map_err(ApiError::internal)?;
        Ok(success(json!({ "data": info })))
    }

    /// `GET /memory-usage`
    #[instrument]
    async fn get_memory_usage() -> ApiResult {
        let usage = tokio::task::spawn_blocking(|| group_process_usage(sample_processes()))
            .await
            .map_err(ApiError::internal)?;
        info!("Memory usage sampled: {} application(s)", usage.process_count);
        Ok(success(json!({ "data": usage })))
    }
}

impl ToolPlugin for SystemPerformanceTool {
    fn tool_id(&self) -> &'static str {
        Self::TOOL_ID
    }

    fn register_routes(&self, scope: &mut RouteScope) -> Result<(), ToolError> {
        scope
            .route("get_system_info", "/info", get(Self::get_system_info))?
            .route(
                "get_memory_usage",
                "/memory-usage",
                get(Self::get_memory_usage),
            )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, memory_mb: f64) -> ProcessSample {
        ProcessSample {
            name: name.to_string(),
            memory_mb,
            cpu_percent: 1.0,
        }
    }

    #[test]
    fn test_grouping_sums_by_name() {
        let usage = group_process_usage(vec![
            sample("chrome", 100.0),
            sample("chrome", 50.0),
            sample("bash", 50.0),
        ]);

        assert_eq!(usage.process_count, 2);
        assert_eq!(usage.total_memory_mb, 200.0);
        assert_eq!(usage.processes[0].name, "chrome");
        assert_eq!(usage.processes[0].count, 2);
        assert_eq!(usage.processes[0].memory_mb, 150.0);
        assert_eq!(usage.processes[0].cpu_percent, 2.0);
        assert_eq!(usage.processes[0].percentage, 75.0);
        assert_eq!(usage.processes[1].percentage, 25.0);
    }

    #[test]
    fn test_tail_folds_into_others() {
        let samples = (0..13).map(|i| sample(&format!("p{i:02}"), 100.0 - i as f64));
        let usage = group_process_usage(samples);

        assert_eq!(usage.process_count, 13);
        assert_eq!(usage.processes.len(), TOP_PROCESSES + 1);

        let others = usage.processes.last().unwrap();
        assert_eq!(others.name, "Others");
        assert_eq!(others.count, 3);
        assert_eq!(others.memory_mb, 90.0 + 89.0 + 88.0);

        let total: f64 = (0..13).map(|i| 100.0 - i as f64).sum();
        assert_eq!(usage.total_memory_mb, total);
    }

    #[test]
    fn test_no_others_entry_for_short_lists() {
        let usage = group_process_usage(vec![sample("a", 1.0)]);
        assert_eq!(usage.processes.len(), 1);
        assert_eq!(usage.processes[0].percentage, 100.0);
    }

    #[test]
    fn test_empty_sample() {
        let usage = group_process_usage(Vec::new());
        assert!(usage.processes.is_empty());
        assert_eq!(usage.total_memory_mb, 0.0);
        assert_eq!(usage.process_count, 0);
    }

    #[test]
    fn test_usage_percent() {
        assert_eq!(usage_percent(1, 4), 25.0);
        assert_eq!(usage_percent(1, 0), 0.0);
    }

    #[test]
    fn test_system_info_shape() {
        let info = system_info();
        assert!(info["system_stats"]["cpu"]["core_count"].as_u64().is_some());
        assert!(info["system_stats"]["memory"]["total_gb"].as_f64().is_some());
        assert_eq!(info["system_info"]["architecture"], std::env::consts::ARCH);
    }
}
