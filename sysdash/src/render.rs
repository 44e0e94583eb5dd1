//! Turns fetched payloads into view updates.
//!
//! Every mutation of the visual side goes through [`DashboardView`]; the
//! coordinator never holds chart state of its own beyond the per-category
//! sequence numbers used to drop out-of-order results.

use crate::alerts::AlertRegistry;
use crate::history::HistoryBuffer;
use crate::notify::{Notification, Notifier, Permission};
use crate::settings::Settings;
use crate::types::{
    Alert, Category, CpuMetrics, DiskMetrics, NetworkMetrics, Payload, ProcessInfo, RamMetrics,
    Severity, SystemInfo,
};
use chrono::{DateTime, NaiveDateTime};
use log::debug;
use std::collections::HashMap;
use std::time::Duration;

pub const NOTICE_DISMISS_AFTER: Duration = Duration::from_secs(5);

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistorySeries {
    Cpu,
    Ram,
    Disk,
}

impl HistorySeries {
    pub const ALL: [HistorySeries; 3] = [HistorySeries::Cpu, HistorySeries::Ram, HistorySeries::Disk];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Ram => "ram",
            Self::Disk => "disk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartId {
    CpuGauge,
    RamGauge,
    DiskGauge,
    Network,
    History(HistorySeries),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryField {
    CpuValue,
    CpuCores,
    CpuFrequency,
    RamValue,
    RamTotal,
    RamAvailable,
    DiskValue,
    DiskTotal,
    DiskFree,
    NetworkUpload,
    NetworkDownload,
    Uptime,
    BootTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeLevel {
    Normal,
    Warning,
    Critical,
}

impl GaugeLevel {
    /// `Warning` starts ten points below the threshold.
    pub fn for_percentage(pct: f64, threshold: u8) -> Self {
        let threshold = f64::from(threshold);
        if pct >= threshold {
            Self::Critical
        } else if pct >= threshold - 10.0 {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Success,
    Info,
    Secondary,
    Warning,
}

impl StatusTone {
    pub fn for_status(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "running" => Self::Success,
            "sleeping" => Self::Info,
            "idle" => Self::Secondary,
            _ => Self::Warning,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRow {
    pub pid: u32,
    pub name: String,
    pub cpu: String,
    pub memory: String,
    pub status: String,
    pub tone: StatusTone,
}

impl From<&ProcessInfo> for ProcessRow {
    fn from(p: &ProcessInfo) -> Self {
        Self {
            pid: p.pid,
            name: p.name.clone(),
            cpu: format_pct(p.cpu_percent),
            memory: format_pct(p.memory_percent),
            status: p.status.clone(),
            tone: StatusTone::for_status(&p.status),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertRow {
    pub id: i64,
    pub message: String,
    pub severity: Severity,
    pub icon: &'static str,
    pub time: String,
}

impl From<&Alert> for AlertRow {
    fn from(alert: &Alert) -> Self {
        Self {
            id: alert.id,
            message: alert.message.clone(),
            severity: alert.severity,
            icon: alert_icon(alert.severity),
            time: format_time(&alert.created_at),
        }
    }
}

/// The narrow update surface of whatever draws the dashboard.
pub trait DashboardView {
    fn set_series(&mut self, chart: ChartId, points: &[f64]);
    /// Shared label axis of the history chart.
    fn set_history_labels(&mut self, labels: &[String]);
    fn set_gauge_level(&mut self, chart: ChartId, level: GaugeLevel);
    fn set_summary(&mut self, field: SummaryField, text: &str);
    fn set_processes(&mut self, rows: &[ProcessRow]);
    /// An empty slice hides the alert list.
    fn set_alerts(&mut self, rows: &[AlertRow]);
    /// `None` hides the badge.
    fn set_badge(&mut self, count: Option<usize>);
    fn set_busy(&mut self, busy: bool);
    fn notice(&mut self, level: NoticeLevel, message: &str);
    fn set_last_update(&mut self, label: &str);
    fn apply_settings(&mut self, _settings: &Settings) {}
    /// Called after a batch of updates has been applied.
    fn flush(&mut self) {}
}

/// Everything a render update may touch.
pub struct RenderTargets<'a> {
    pub history: &'a mut HistoryBuffer,
    pub alerts: &'a mut AlertRegistry,
    pub settings: &'a Settings,
    pub view: &'a mut dyn DashboardView,
    pub notifier: &'a mut dyn Notifier,
}

#[derive(Debug, Default)]
pub struct RenderCoordinator {
    last_applied: HashMap<Category, u64>,
}

impl RenderCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_applied(&self, category: Category) -> Option<u64> {
        self.last_applied.get(&category).copied()
    }

    /// Applies `payload` fetched by cycle `seq`. Returns `false` when a newer
    /// cycle has already updated this category.
    pub fn apply(
        &mut self,
        seq: u64,
        payload: Payload,
        label: &str,
        targets: RenderTargets<'_>,
    ) -> bool {
        let category = payload.category();
        if self
            .last_applied
            .get(&category)
            .is_some_and(|&last| seq < last)
        {
            debug!("[render] dropping stale {category} result from cycle {seq}");
            return false;
        }
        self.last_applied.insert(category, seq);

        let RenderTargets {
            history,
            alerts,
            settings,
            view,
            notifier,
        } = targets;

        match payload {
            Payload::Cpu(cpu) => render_cpu(&cpu, label, settings, history, view),
            Payload::Ram(ram) => render_ram(&ram, label, settings, history, view),
            Payload::Disk(disk) => render_disk(&disk, label, settings, history, view),
            Payload::Network(net) => render_network(&net, view),
            Payload::SystemInfo(info) => render_system_info(&info, view),
            Payload::Processes(processes) => {
                let rows: Vec<ProcessRow> = processes.iter().map(ProcessRow::from).collect();
                view.set_processes(&rows);
            }
            Payload::Alerts(list) => render_alerts(list, settings, alerts, view, notifier),
        }
        view.flush();
        true
    }
}

#[allow(clippy::too_many_arguments)]
fn render_gauge(
    chart: ChartId,
    series: HistorySeries,
    value_field: SummaryField,
    pct: f64,
    threshold: u8,
    label: &str,
    history: &mut HistoryBuffer,
    view: &mut dyn DashboardView,
) {
    view.set_series(chart, &[pct, 100.0 - pct]);
    view.set_gauge_level(chart, GaugeLevel::for_percentage(pct, threshold));
    view.set_summary(value_field, &format!("{pct:.1}%"));

    if history.append(series.name(), label, pct) {
        view.set_history_labels(&history.labels());
        for s in HistorySeries::ALL {
            view.set_series(ChartId::History(s), &history.snapshot(s.name()));
        }
    }
}

fn render_cpu(
    cpu: &CpuMetrics,
    label: &str,
    settings: &Settings,
    history: &mut HistoryBuffer,
    view: &mut dyn DashboardView,
) {
    render_gauge(
        ChartId::CpuGauge,
        HistorySeries::Cpu,
        SummaryField::CpuValue,
        cpu.percentage,
        settings.cpu_threshold,
        label,
        history,
        view,
    );
    let cores = cpu
        .cores
        .map(|c| c.to_string())
        .unwrap_or_else(|| "-".to_string());
    view.set_summary(SummaryField::CpuCores, &cores);
    let frequency = cpu
        .frequency
        .as_ref()
        .map(|f| format!("{:.1} GHz", f.current / 1000.0))
        .unwrap_or_else(|| "-".to_string());
    view.set_summary(SummaryField::CpuFrequency, &frequency);
}

fn render_ram(
    ram: &RamMetrics,
    label: &str,
    settings: &Settings,
    history: &mut HistoryBuffer,
    view: &mut dyn DashboardView,
) {
    render_gauge(
        ChartId::RamGauge,
        HistorySeries::Ram,
        SummaryField::RamValue,
        ram.percentage,
        settings.ram_threshold,
        label,
        history,
        view,
    );
    view.set_summary(SummaryField::RamTotal, &format_bytes(ram.total));
    view.set_summary(SummaryField::RamAvailable, &format_bytes(ram.available));
}

fn render_disk(
    disk: &DiskMetrics,
    label: &str,
    settings: &Settings,
    history: &mut HistoryBuffer,
    view: &mut dyn DashboardView,
) {
    render_gauge(
        ChartId::DiskGauge,
        HistorySeries::Disk,
        SummaryField::DiskValue,
        disk.percentage,
        settings.disk_threshold,
        label,
        history,
        view,
    );
    view.set_summary(SummaryField::DiskTotal, &format_bytes(disk.total));
    view.set_summary(SummaryField::DiskFree, &format_bytes(disk.free));
}

fn render_network(net: &NetworkMetrics, view: &mut dyn DashboardView) {
    view.set_series(ChartId::Network, &[net.upload_speed, net.download_speed]);
    view.set_summary(
        SummaryField::NetworkUpload,
        &format!("{}/s", format_speed(net.upload_speed)),
    );
    view.set_summary(
        SummaryField::NetworkDownload,
        &format!("{}/s", format_speed(net.download_speed)),
    );
}

fn render_system_info(info: &SystemInfo, view: &mut dyn DashboardView) {
    view.set_summary(SummaryField::Uptime, &info.uptime_formatted);
    view.set_summary(SummaryField::BootTime, &info.boot_time);
}

fn render_alerts(
    list: Vec<Alert>,
    settings: &Settings,
    alerts: &mut AlertRegistry,
    view: &mut dyn DashboardView,
    notifier: &mut dyn Notifier,
) {
    let outcome = alerts.replace_all(list, settings.enable_notifications);
    let rows: Vec<AlertRow> = alerts.active().iter().map(AlertRow::from).collect();
    view.set_alerts(&rows);
    if rows.is_empty() {
        view.set_badge(None);
        return;
    }
    view.set_badge(Some(outcome.count));

    if notifier.permission() != Permission::Granted {
        return;
    }
    for alert in outcome.to_notify {
        notifier.notify(Notification::alert(&alert.message, settings.enable_sounds));
    }
}

/// Formats a byte count with 1024-based units and one decimal place.
pub fn format_bytes(bytes: f64) -> String {
    if !bytes.is_finite() || bytes <= 0.0 {
        return "0 B".to_string();
    }
    let exponent = (bytes.ln() / 1024f64.ln()).floor();
    let index = exponent.clamp(0.0, (BYTE_UNITS.len() - 1) as f64) as usize;
    let scaled = bytes / 1024f64.powi(index as i32);
    format!("{scaled:.1} {}", BYTE_UNITS[index])
}

pub fn format_speed(bytes_per_second: f64) -> String {
    format_bytes(bytes_per_second)
}

fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}%"),
        None => "-".to_string(),
    }
}

/// Time of day of a server timestamp, or the raw text when it cannot be
/// parsed.
pub fn format_time(raw: &str) -> String {
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return parsed.format("%H:%M:%S").to_string();
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%H:%M:%S").to_string();
    }
    raw.to_string()
}

pub fn alert_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "exclamation-circle",
        Severity::Warning => "exclamation-triangle",
        Severity::Info => "info-circle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::view::MemoryView;

    struct Harness {
        history: HistoryBuffer,
        alerts: AlertRegistry,
        settings: Settings,
        view: MemoryView,
        notifier: RecordingNotifier,
        render: RenderCoordinator,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                history: HistoryBuffer::default(),
                alerts: AlertRegistry::new(),
                settings: Settings::default(),
                view: MemoryView::default(),
                notifier: RecordingNotifier::new(Permission::Granted),
                render: RenderCoordinator::new(),
            }
        }

        fn apply(&mut self, seq: u64, payload: Payload, label: &str) -> bool {
            self.render.apply(
                seq,
                payload,
                label,
                RenderTargets {
                    history: &mut self.history,
                    alerts: &mut self.alerts,
                    settings: &self.settings,
                    view: &mut self.view,
                    notifier: &mut self.notifier,
                },
            )
        }
    }

    fn cpu(pct: f64) -> Payload {
        Payload::Cpu(CpuMetrics {
            percentage: pct,
            cores: Some(8),
            frequency: None,
            load_avg: None,
        })
    }

    fn critical(id: i64) -> Alert {
        Alert {
            id,
            message: "CPU usage critical".to_string(),
            severity: Severity::Critical,
            created_at: "2024-05-01 13:45:10".to_string(),
            resolved: false,
            alert_type: Some("cpu".to_string()),
        }
    }

    #[test]
    fn format_bytes_uses_binary_prefixes() {
        assert_eq!(format_bytes(0.0), "0 B");
        assert_eq!(format_bytes(1024.0), "1.0 KB");
        assert_eq!(format_bytes(1536.0), "1.5 KB");
        assert_eq!(format_bytes(512.0), "512.0 B");
        assert_eq!(format_bytes(16.0 * 1024.0 * 1024.0 * 1024.0), "16.0 GB");
        assert_eq!(format_bytes(3.0 * 1024f64.powi(5)), "3072.0 TB");
    }

    #[test]
    fn gauge_level_follows_threshold() {
        assert_eq!(GaugeLevel::for_percentage(90.0, 85), GaugeLevel::Critical);
        assert_eq!(GaugeLevel::for_percentage(80.0, 85), GaugeLevel::Warning);
        assert_eq!(GaugeLevel::for_percentage(10.0, 85), GaugeLevel::Normal);
    }

    #[test]
    fn cpu_update_feeds_gauge_summary_and_history() {
        let mut h = Harness::new();
        assert!(h.apply(1, cpu(42.0), "10:00:00"));
        assert_eq!(h.view.series[&ChartId::CpuGauge], vec![42.0, 58.0]);
        assert_eq!(h.view.summary[&SummaryField::CpuValue], "42.0%");
        assert_eq!(h.view.summary[&SummaryField::CpuCores], "8");
        assert_eq!(h.view.summary[&SummaryField::CpuFrequency], "-");
        assert_eq!(h.view.series[&ChartId::History(HistorySeries::Cpu)], vec![42.0]);
        assert_eq!(h.view.history_labels, vec!["10:00:00".to_string()]);
    }

    #[test]
    fn older_cycle_never_overwrites_newer_one() {
        let mut h = Harness::new();
        assert!(h.apply(5, cpu(70.0), "10:00:05"));
        assert!(!h.apply(4, cpu(10.0), "10:00:06"));
        assert_eq!(h.view.summary[&SummaryField::CpuValue], "70.0%");
        assert_eq!(h.history.snapshot("cpu"), vec![70.0]);
        assert_eq!(h.render.last_applied(Category::Cpu), Some(5));
        // other categories are tracked independently
        assert!(h.apply(
            1,
            Payload::SystemInfo(SystemInfo {
                uptime_formatted: "1 day".to_string(),
                boot_time: "2024-05-01 00:00:00".to_string(),
                hostname: None,
                platform: None,
            }),
            "10:00:06"
        ));
    }

    #[test]
    fn network_summary_uses_speed_formatting() {
        let mut h = Harness::new();
        h.apply(
            1,
            Payload::Network(NetworkMetrics {
                upload_speed: 1536.0,
                download_speed: 0.0,
                bytes_sent: None,
                bytes_recv: None,
            }),
            "10:00:00",
        );
        assert_eq!(h.view.summary[&SummaryField::NetworkUpload], "1.5 KB/s");
        assert_eq!(h.view.summary[&SummaryField::NetworkDownload], "0 B/s");
        assert_eq!(h.view.series[&ChartId::Network], vec![1536.0, 0.0]);
    }

    #[test]
    fn alerts_show_badge_and_notify_once() {
        let mut h = Harness::new();
        h.apply(1, Payload::Alerts(vec![critical(1)]), "10:00:00");
        assert_eq!(h.view.badge, Some(1));
        assert_eq!(h.view.alerts[0].time, "13:45:10");
        assert_eq!(h.view.alerts[0].icon, "exclamation-circle");
        h.apply(2, Payload::Alerts(vec![critical(1)]), "10:00:02");
        assert_eq!(h.notifier.sent.len(), 1);

        h.apply(3, Payload::Alerts(Vec::new()), "10:00:04");
        assert!(h.view.alerts.is_empty());
        assert_eq!(h.view.badge, None);
    }

    #[test]
    fn no_notification_without_permission() {
        let mut h = Harness::new();
        h.notifier = RecordingNotifier::new(Permission::Denied);
        h.apply(1, Payload::Alerts(vec![critical(9)]), "10:00:00");
        assert!(h.notifier.sent.is_empty());
        assert_eq!(h.view.badge, Some(1));
    }

    #[test]
    fn process_rows_carry_status_tone() {
        let mut h = Harness::new();
        h.apply(
            1,
            Payload::Processes(vec![ProcessInfo {
                pid: 42,
                name: "postgres".to_string(),
                cpu_percent: Some(3.27),
                memory_percent: None,
                status: "Sleeping".to_string(),
            }]),
            "10:00:00",
        );
        assert_eq!(h.view.processes[0].tone, StatusTone::Info);
        assert_eq!(h.view.processes[0].cpu, "3.3%");
        assert_eq!(h.view.processes[0].memory, "-");
    }

    #[test]
    fn unparseable_alert_time_is_shown_raw() {
        assert_eq!(format_time("yesterday"), "yesterday");
        assert_eq!(format_time("2024-05-01T08:09:10+00:00"), "08:09:10");
    }
}
