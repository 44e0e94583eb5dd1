use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the fixed metric domains served by the metrics API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Cpu,
    Ram,
    Disk,
    Network,
    SystemInfo,
    Processes,
    Alerts,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Cpu,
        Category::Ram,
        Category::Disk,
        Category::Network,
        Category::SystemInfo,
        Category::Processes,
        Category::Alerts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Ram => "ram",
            Self::Disk => "disk",
            Self::Network => "network",
            Self::SystemInfo => "system-info",
            Self::Processes => "processes",
            Self::Alerts => "alerts",
        }
    }

    /// Path of the endpoint serving this category.
    pub fn path(&self) -> String {
        format!("/api/{}", self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CpuFrequency {
    /// MHz
    pub current: f64,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CpuMetrics {
    pub percentage: f64,
    #[serde(default)]
    pub cores: Option<u32>,
    #[serde(default)]
    pub frequency: Option<CpuFrequency>,
    #[serde(default)]
    pub load_avg: Option<Vec<f64>>,
}

// Byte counts arrive as floats when the server simulates data.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RamMetrics {
    pub percentage: f64,
    pub total: f64,
    pub available: f64,
    #[serde(default)]
    pub used: Option<f64>,
    #[serde(default)]
    pub swap_total: Option<f64>,
    #[serde(default)]
    pub swap_used: Option<f64>,
    #[serde(default)]
    pub swap_percentage: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DiskMetrics {
    pub percentage: f64,
    pub total: f64,
    pub free: f64,
    #[serde(default)]
    pub used: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NetworkMetrics {
    /// Bytes per second.
    pub upload_speed: f64,
    /// Bytes per second.
    pub download_speed: f64,
    #[serde(default)]
    pub bytes_sent: Option<f64>,
    #[serde(default)]
    pub bytes_recv: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SystemInfo {
    pub uptime_formatted: String,
    pub boot_time: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    #[serde(default)]
    pub cpu_percent: Option<f64>,
    #[serde(default)]
    pub memory_percent: Option<f64>,
    pub status: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "critical" => Self::Critical,
            "warning" => Self::Warning,
            _ => Self::Info,
        }
    }
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Alert {
    pub id: i64,
    pub message: String,
    pub severity: Severity,
    pub created_at: String,
    #[serde(default)]
    pub resolved: bool,
    #[serde(rename = "type", default)]
    pub alert_type: Option<String>,
}

/// Parsed response of one category fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Cpu(CpuMetrics),
    Ram(RamMetrics),
    Disk(DiskMetrics),
    Network(NetworkMetrics),
    SystemInfo(SystemInfo),
    Processes(Vec<ProcessInfo>),
    Alerts(Vec<Alert>),
}

impl Payload {
    pub fn category(&self) -> Category {
        match self {
            Self::Cpu(_) => Category::Cpu,
            Self::Ram(_) => Category::Ram,
            Self::Disk(_) => Category::Disk,
            Self::Network(_) => Category::Network,
            Self::SystemInfo(_) => Category::SystemInfo,
            Self::Processes(_) => Category::Processes,
            Self::Alerts(_) => Category::Alerts,
        }
    }
}
