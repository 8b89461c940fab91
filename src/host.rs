//! Host system snapshot attached to every report.

use std::fmt;

use serde::{Deserialize, Serialize};
use sysinfo::System;

/// Point-in-time host information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostSnapshot {
    /// Operating system family (e.g. `linux`).
    pub platform: String,
    /// Operating system release, when the platform reports one.
    pub release: Option<String>,
    /// CPU architecture (e.g. `x86_64`).
    pub arch: String,
    /// System uptime in seconds.
    pub uptime_secs: u64,
    /// Available memory in bytes.
    pub free_memory_bytes: u64,
    /// Total memory in bytes.
    pub total_memory_bytes: u64,
    /// Distinct CPU model names.
    pub cpu_models: Vec<String>,
}

impl HostSnapshot {
    /// Capture the current host state.
    pub fn capture() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        system.refresh_cpu_all();

        let mut cpu_models: Vec<String> = Vec::new();
        for cpu in system.cpus() {
            let brand = cpu.brand().trim();
            if !brand.is_empty() && !cpu_models.iter().any(|m| m == brand) {
                cpu_models.push(brand.to_owned());
            }
        }

        Self {
            platform: std::env::consts::OS.to_owned(),
            release: System::os_version(),
            arch: std::env::consts::ARCH.to_owned(),
            uptime_secs: System::uptime(),
            free_memory_bytes: system.available_memory(),
            total_memory_bytes: system.total_memory(),
            cpu_models,
        }
    }
}

impl fmt::Display for HostSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let release = self.release.as_deref().unwrap_or("unknown");
        let cpus = if self.cpu_models.is_empty() {
            "unknown".to_owned()
        } else {
            self.cpu_models.join(", ")
        };
        writeln!(f, "Platform: {} {release}", self.platform)?;
        writeln!(f, "Architecture: {}", self.arch)?;
        writeln!(f, "Uptime: {}", format_uptime(self.uptime_secs))?;
        writeln!(f, "Free memory: {:.2} MB", bytes_to_mb(self.free_memory_bytes))?;
        writeln!(
            f,
            "Total memory: {:.2} MB",
            bytes_to_mb(self.total_memory_bytes)
        )?;
        write!(f, "CPU: {cpus}")
    }
}

/// Format uptime seconds as `"Nd Nh Nm Ns"`.
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;
    format!("{days}d {hours}h {minutes}m {seconds}s")
}

#[allow(clippy::cast_precision_loss)]
fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
