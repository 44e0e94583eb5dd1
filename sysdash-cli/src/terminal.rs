use colored::*;
use std::io::Write;
use std::time::Instant;
use sysdash::render::{AlertRow, NOTICE_DISMISS_AFTER, ProcessRow, StatusTone};
use sysdash::{
    ChartId, ChartType, DashboardView, GaugeLevel, HistorySeries, MemoryView, Notification,
    Notifier, NoticeLevel, Permission, Settings, Severity, SummaryField, Theme,
};

const GAUGE_WIDTH: usize = 20;
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const DOTS: [char; 4] = ['⣀', '⠤', '⠒', '⠉'];
const SPINNER: [char; 4] = ['|', '/', '-', '\\'];
const MAX_PROCESS_ROWS: usize = 15;

/// Draws the dashboard as a full-screen text frame.
///
/// In live mode the frame is redrawn after every batch of updates; otherwise
/// the caller prints [`TerminalView::frame`] when it wants to.
pub struct TerminalView {
    state: MemoryView,
    notices: Vec<(Instant, NoticeLevel, String)>,
    settings: Settings,
    live: bool,
    spinner: usize,
}

impl TerminalView {
    pub fn new(live: bool) -> Self {
        Self {
            state: MemoryView::default(),
            notices: Vec::new(),
            settings: Settings::default(),
            live,
            spinner: 0,
        }
    }

    fn accent(&self, text: &str) -> ColoredString {
        match self.settings.theme {
            Theme::Default => text.blue(),
            Theme::Dark => text.white(),
            Theme::Green => text.green(),
            Theme::Purple => text.magenta(),
        }
    }

    pub fn frame(&self) -> String {
        let mut out = String::new();
        let s = &self.state;

        let mut header = format!(
            "{}  every {}s  last update {}",
            self.accent("System Monitor").bold(),
            self.settings.refresh_interval_seconds,
            s.last_update.as_deref().unwrap_or("-"),
        );
        if s.busy {
            let indicator = if self.settings.show_animations {
                format!("{} refreshing", SPINNER[self.spinner % SPINNER.len()])
            } else {
                "refreshing…".to_string()
            };
            header.push_str(&format!("  {}", indicator.yellow()));
        }
        if let Some(count) = s.badge {
            header.push_str(&format!("  {}", format!("alerts ({count})").red().bold()));
        }
        out.push_str(&header);
        out.push_str("\n\n");

        out.push_str(&self.gauge_line(
            "CPU",
            ChartId::CpuGauge,
            SummaryField::CpuValue,
            &format!(
                "{} cores  {}",
                self.text(SummaryField::CpuCores),
                self.text(SummaryField::CpuFrequency)
            ),
        ));
        out.push_str(&self.gauge_line(
            "RAM",
            ChartId::RamGauge,
            SummaryField::RamValue,
            &format!(
                "{} total  {} available",
                self.text(SummaryField::RamTotal),
                self.text(SummaryField::RamAvailable)
            ),
        ));
        out.push_str(&self.gauge_line(
            "DISK",
            ChartId::DiskGauge,
            SummaryField::DiskValue,
            &format!(
                "{} total  {} free",
                self.text(SummaryField::DiskTotal),
                self.text(SummaryField::DiskFree)
            ),
        ));
        out.push_str(&format!(
            "{:<5} ↑ {}  ↓ {}\n",
            "NET",
            self.text(SummaryField::NetworkUpload),
            self.text(SummaryField::NetworkDownload)
        ));
        out.push_str(&format!(
            "{:<5} {}  (booted {})\n\n",
            "UP",
            self.text(SummaryField::Uptime),
            self.text(SummaryField::BootTime)
        ));

        out.push_str(&self.history_block());
        out.push_str(&alerts_block(&s.alerts));
        out.push_str(&processes_block(&s.processes));

        for (_, level, message) in &self.notices {
            out.push_str(&format!("{}\n", notice_line(*level, message)));
        }
        out
    }

    fn text(&self, field: SummaryField) -> &str {
        self.state.summary(field).unwrap_or("-")
    }

    fn gauge_line(&self, name: &str, chart: ChartId, value: SummaryField, detail: &str) -> String {
        let pct = self
            .state
            .series
            .get(&chart)
            .and_then(|points| points.first().copied())
            .unwrap_or(0.0);
        let filled = ((pct.clamp(0.0, 100.0) / 100.0) * GAUGE_WIDTH as f64).round() as usize;
        let bar = format!("{}{}", "#".repeat(filled), ".".repeat(GAUGE_WIDTH - filled));
        let level = self
            .state
            .levels
            .get(&chart)
            .copied()
            .unwrap_or(GaugeLevel::Normal);
        let color = level_color(level);
        format!(
            "{:<5} [{}] {:>6}  {}\n",
            name,
            bar.color(color),
            self.text(value).color(color),
            detail
        )
    }

    fn history_block(&self) -> String {
        let labels = &self.state.history_labels;
        let span = match (labels.first(), labels.last()) {
            (Some(first), Some(last)) => format!("{first} … {last}"),
            _ => "no samples yet".to_string(),
        };
        let mut out = format!("{} {}\n", self.accent("History").bold(), span.dimmed());
        for series in HistorySeries::ALL {
            let points = self
                .state
                .series
                .get(&ChartId::History(series))
                .cloned()
                .unwrap_or_default();
            out.push_str(&format!(
                "  {:<5} {}\n",
                series.name(),
                sparkline(&points, self.settings.chart_type)
            ));
        }
        out.push('\n');
        out
    }

    fn prune_notices(&mut self) {
        self.notices
            .retain(|(at, _, _)| at.elapsed() < NOTICE_DISMISS_AFTER);
    }
}

impl DashboardView for TerminalView {
    fn set_series(&mut self, chart: ChartId, points: &[f64]) {
        self.state.set_series(chart, points);
    }

    fn set_history_labels(&mut self, labels: &[String]) {
        self.state.set_history_labels(labels);
    }

    fn set_gauge_level(&mut self, chart: ChartId, level: GaugeLevel) {
        self.state.set_gauge_level(chart, level);
    }

    fn set_summary(&mut self, field: SummaryField, text: &str) {
        self.state.set_summary(field, text);
    }

    fn set_processes(&mut self, rows: &[ProcessRow]) {
        self.state.set_processes(rows);
    }

    fn set_alerts(&mut self, rows: &[AlertRow]) {
        self.state.set_alerts(rows);
    }

    fn set_badge(&mut self, count: Option<usize>) {
        self.state.set_badge(count);
    }

    fn set_busy(&mut self, busy: bool) {
        self.state.set_busy(busy);
    }

    fn notice(&mut self, level: NoticeLevel, message: &str) {
        self.notices
            .push((Instant::now(), level, message.to_string()));
    }

    fn set_last_update(&mut self, label: &str) {
        self.state.set_last_update(label);
    }

    fn apply_settings(&mut self, settings: &Settings) {
        self.settings = settings.clone();
    }

    fn flush(&mut self) {
        self.prune_notices();
        if self.state.busy && self.settings.show_animations {
            self.spinner = self.spinner.wrapping_add(1);
        }
        if !self.live {
            return;
        }
        let mut stdout = std::io::stdout().lock();
        // clear screen, cursor home
        let _ = write!(stdout, "\x1B[2J\x1B[H{}", self.frame());
        let _ = stdout.flush();
    }
}

fn level_color(level: GaugeLevel) -> Color {
    match level {
        GaugeLevel::Normal => Color::Green,
        GaugeLevel::Warning => Color::Yellow,
        GaugeLevel::Critical => Color::Red,
    }
}

fn tone_color(tone: StatusTone) -> Color {
    match tone {
        StatusTone::Success => Color::Green,
        StatusTone::Info => Color::Cyan,
        StatusTone::Secondary => Color::White,
        StatusTone::Warning => Color::Yellow,
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Info => Color::Blue,
    }
}

fn notice_line(level: NoticeLevel, message: &str) -> ColoredString {
    match level {
        NoticeLevel::Success => message.green(),
        NoticeLevel::Info => message.normal(),
        NoticeLevel::Warning => message.yellow(),
        NoticeLevel::Error => message.red(),
    }
}

fn alerts_block(alerts: &[AlertRow]) -> String {
    if alerts.is_empty() {
        return String::new();
    }
    let mut out = format!("{}\n", "Alerts".bold());
    for alert in alerts {
        let marker = match alert.icon {
            "exclamation-circle" => "!!",
            "exclamation-triangle" => "! ",
            _ => "i ",
        };
        out.push_str(&format!(
            "  {} #{:<5} {}  {}\n",
            marker.color(severity_color(alert.severity)),
            alert.id,
            alert.time.dimmed(),
            alert.message
        ));
    }
    out.push('\n');
    out
}

fn processes_block(rows: &[ProcessRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let mut out = format!(
        "{:<8} {:<20} {:<7} {:<7} STATUS\n",
        "PID", "NAME", "CPU%", "MEM%"
    );
    for row in rows.iter().take(MAX_PROCESS_ROWS) {
        out.push_str(&format!(
            "{:<8} {:<20} {:<7} {:<7} {}\n",
            row.pid,
            truncate(&row.name, 20),
            row.cpu,
            row.memory,
            row.status.color(tone_color(row.tone))
        ));
    }
    out.push('\n');
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max.saturating_sub(1)).chain(['…']).collect()
    }
}

/// Renders percentages (0-100) as one glyph per sample.
fn sparkline(points: &[f64], chart_type: ChartType) -> String {
    let glyphs: &[char] = match chart_type {
        ChartType::Line => &DOTS,
        ChartType::Bar | ChartType::Area => &BLOCKS,
    };
    points
        .iter()
        .map(|v| {
            let ratio = v.clamp(0.0, 100.0) / 100.0;
            let index = (ratio * (glyphs.len() - 1) as f64).round() as usize;
            glyphs[index]
        })
        .collect()
}

/// Announces notifications on stderr, ringing the bell when asked to.
pub struct TerminalNotifier {
    permission: Permission,
}

impl TerminalNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self {
            permission: Permission::Default,
        }
    }
}

impl Notifier for TerminalNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Permission {
        if self.permission == Permission::Default {
            self.permission = Permission::Granted;
        }
        self.permission
    }

    fn notify(&mut self, notification: Notification) {
        let bell = if notification.sound { "\x07" } else { "" };
        eprintln!(
            "{bell}{} {}",
            notification.title.red().bold(),
            notification.body
        );
    }
}
