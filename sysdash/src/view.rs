use crate::render::{
    AlertRow, ChartId, DashboardView, GaugeLevel, NoticeLevel, ProcessRow, SummaryField,
};
use crate::settings::Settings;
use std::collections::HashMap;

/// A headless view that keeps the latest state it was handed.
///
/// The terminal frontend draws from one of these; tests inspect it directly.
#[derive(Debug, Default, Clone)]
pub struct MemoryView {
    pub series: HashMap<ChartId, Vec<f64>>,
    pub series_updates: HashMap<ChartId, usize>,
    pub history_labels: Vec<String>,
    pub levels: HashMap<ChartId, GaugeLevel>,
    pub summary: HashMap<SummaryField, String>,
    pub processes: Vec<ProcessRow>,
    pub alerts: Vec<AlertRow>,
    pub badge: Option<usize>,
    pub busy: bool,
    /// Every busy transition in order.
    pub busy_transitions: Vec<bool>,
    pub notices: Vec<(NoticeLevel, String)>,
    pub last_update: Option<String>,
    pub settings: Option<Settings>,
    pub flushes: usize,
}

impl MemoryView {
    pub fn summary(&self, field: SummaryField) -> Option<&str> {
        self.summary.get(&field).map(String::as_str)
    }

    pub fn alerts_visible(&self) -> bool {
        !self.alerts.is_empty()
    }

    pub fn last_notice(&self) -> Option<&(NoticeLevel, String)> {
        self.notices.last()
    }
}

impl DashboardView for MemoryView {
    fn set_series(&mut self, chart: ChartId, points: &[f64]) {
        self.series.insert(chart, points.to_vec());
        *self.series_updates.entry(chart).or_default() += 1;
    }

    fn set_history_labels(&mut self, labels: &[String]) {
        self.history_labels = labels.to_vec();
    }

    fn set_gauge_level(&mut self, chart: ChartId, level: GaugeLevel) {
        self.levels.insert(chart, level);
    }

    fn set_summary(&mut self, field: SummaryField, text: &str) {
        self.summary.insert(field, text.to_string());
    }

    fn set_processes(&mut self, rows: &[ProcessRow]) {
        self.processes = rows.to_vec();
    }

    fn set_alerts(&mut self, rows: &[AlertRow]) {
        self.alerts = rows.to_vec();
    }

    fn set_badge(&mut self, count: Option<usize>) {
        self.badge = count;
    }

    fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
        self.busy_transitions.push(busy);
    }

    fn notice(&mut self, level: NoticeLevel, message: &str) {
        self.notices.push((level, message.to_string()));
    }

    fn set_last_update(&mut self, label: &str) {
        self.last_update = Some(label.to_string());
    }

    fn apply_settings(&mut self, settings: &Settings) {
        self.settings = Some(settings.clone());
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}
