//! The coordinating component: owns the settings, history, alerts, scheduler
//! and view, and drives refresh cycles on one logical thread.
//!
//! Fetches of a cycle run concurrently as futures polled by the dashboard
//! itself, so every state mutation happens between awaits on the same task.
//! Each category's result is rendered as soon as it arrives.

use crate::alerts::AlertRegistry;
use crate::client::MetricsClient;
use crate::error::Result;
use crate::history::HistoryBuffer;
use crate::notify::{Notifier, Permission};
use crate::render::{
    DashboardView, HistorySeries, NoticeLevel, RenderCoordinator, RenderTargets,
};
use crate::scheduler::{RefreshScheduler, SchedulerState};
use crate::settings::{ChartType, Settings, SettingsStore, Theme};
use crate::types::{Category, Payload};
use chrono::Local;
use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use std::collections::HashMap;
use tokio::sync::mpsc;

/// User intents the dashboard reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Refresh,
    RefreshProcesses,
    ToggleAutoRefresh,
    SetInterval(u32),
    SetThreshold(HistorySeries, u8),
    SetNotifications(bool),
    SetSounds(bool),
    SetTheme(Theme),
    SetChartType(ChartType),
    SetAnimations(bool),
    ToggleDarkMode,
    ResolveAlert(i64),
    ShowNotifications,
    SaveSettings,
    ResetSettings,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOrigin {
    Initial,
    Periodic,
    Manual,
    /// Alerts re-fetch after a successful resolve.
    AlertsOnly,
    /// Process table refresh on request.
    ProcessesOnly,
}

impl CycleOrigin {
    fn categories(self) -> &'static [Category] {
        match self {
            Self::AlertsOnly => &[Category::Alerts],
            Self::ProcessesOnly => &[Category::Processes],
            _ => &Category::ALL,
        }
    }

    /// Whether the cycle refreshes the whole dashboard.
    fn is_full(self) -> bool {
        !matches!(self, Self::AlertsOnly | Self::ProcessesOnly)
    }
}

#[derive(Debug)]
struct CycleState {
    origin: CycleOrigin,
    remaining: usize,
    failures: usize,
}

enum Completion {
    Fetched {
        seq: u64,
        category: Category,
        /// History label stamped when the cycle was issued.
        label: String,
        result: Result<Payload>,
    },
    Resolved {
        id: i64,
        result: Result<()>,
    },
}

pub struct Dashboard<V, N> {
    client: MetricsClient,
    settings: SettingsStore,
    history: HistoryBuffer,
    alerts: AlertRegistry,
    scheduler: RefreshScheduler,
    render: RenderCoordinator,
    view: V,
    notifier: N,
    next_seq: u64,
    cycles: HashMap<u64, CycleState>,
    in_flight: FuturesUnordered<LocalBoxFuture<'static, Completion>>,
}

impl<V: DashboardView, N: Notifier> Dashboard<V, N> {
    /// Loads persisted settings and asks for notification permission if it
    /// has not been decided yet. Nothing is fetched until a cycle starts.
    pub fn new(client: MetricsClient, mut settings: SettingsStore, mut view: V, mut notifier: N) -> Self {
        let loaded = settings.load();
        view.apply_settings(&loaded);
        if notifier.permission() == Permission::Default {
            let permission = notifier.request_permission();
            debug!("[dashboard] notification permission {permission:?}");
        }
        Self {
            client,
            scheduler: RefreshScheduler::new(loaded.refresh_interval_seconds),
            settings,
            history: HistoryBuffer::default(),
            alerts: AlertRegistry::new(),
            render: RenderCoordinator::new(),
            view,
            notifier,
            next_seq: 1,
            cycles: HashMap::new(),
            in_flight: FuturesUnordered::new(),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn settings(&self) -> &Settings {
        self.settings.settings()
    }

    pub fn alerts(&self) -> &AlertRegistry {
        &self.alerts
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn start(&mut self) {
        self.scheduler.start();
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn toggle_auto_refresh(&mut self) -> bool {
        let running = self.scheduler.toggle();
        let state = if running { "ON" } else { "OFF" };
        self.view
            .notice(NoticeLevel::Info, &format!("Auto Refresh: {state}"));
        running
    }

    /// Changes the cadence; a running schedule picks it up from now on.
    pub fn set_refresh_interval(&mut self, seconds: u32) {
        self.settings.set_refresh_interval(seconds);
        self.apply_interval();
        self.view.apply_settings(self.settings.settings());
    }

    fn apply_interval(&mut self) {
        self.scheduler
            .set_interval(self.settings.settings().refresh_interval_seconds);
        if self.scheduler.is_running() {
            self.scheduler.restart();
        }
    }

    /// Issues one cycle outside the periodic schedule and returns its
    /// sequence number. A busy indicator is shown until it settles.
    pub fn manual_trigger(&mut self) -> u64 {
        self.begin_cycle(CycleOrigin::Manual)
    }

    /// Re-fetches only the process table.
    pub fn refresh_processes(&mut self) -> u64 {
        self.begin_cycle(CycleOrigin::ProcessesOnly)
    }

    fn begin_cycle(&mut self, origin: CycleOrigin) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        // one history point per cycle, however long its responses take
        let label = time_label();

        let categories = origin.categories();
        for &category in categories {
            let client = self.client.clone();
            let label = label.clone();
            self.in_flight.push(
                async move {
                    let result = client.fetch(category).await;
                    Completion::Fetched {
                        seq,
                        category,
                        label,
                        result,
                    }
                }
                .boxed_local(),
            );
        }
        self.cycles.insert(
            seq,
            CycleState {
                origin,
                remaining: categories.len(),
                failures: 0,
            },
        );
        if matches!(origin, CycleOrigin::Manual | CycleOrigin::Initial) {
            self.view.set_busy(true);
            self.view.flush();
        }
        debug!("[dashboard] cycle {seq} ({origin:?}) issued");
        seq
    }

    /// Sends a resolve request for `id`; the outcome is handled when it
    /// completes.
    pub fn trigger_resolve(&mut self, id: i64) {
        let client = self.client.clone();
        self.in_flight.push(
            async move {
                let result = AlertRegistry::resolve(&client, id).await;
                Completion::Resolved { id, result }
            }
            .boxed_local(),
        );
    }

    /// Polls outstanding work until nothing is in flight.
    pub async fn settle(&mut self) {
        while let Some(done) = self.in_flight.next().await {
            self.on_completion(done);
        }
    }

    /// Runs one manual cycle to completion.
    pub async fn refresh_now(&mut self) {
        self.manual_trigger();
        self.settle().await;
    }

    /// Resolves an alert and waits for the follow-up alerts fetch.
    pub async fn resolve_alert(&mut self, id: i64) {
        self.trigger_resolve(id);
        self.settle().await;
    }

    fn on_completion(&mut self, done: Completion) {
        match done {
            Completion::Fetched {
                seq,
                category,
                label,
                result,
            } => self.on_fetched(seq, category, &label, result),
            Completion::Resolved { id, result } => match result {
                Ok(()) => {
                    self.view.notice(NoticeLevel::Success, "Alert resolved");
                    self.begin_cycle(CycleOrigin::AlertsOnly);
                }
                Err(err) => {
                    debug!("[dashboard] resolve of {id} failed: {err}");
                    self.view
                        .notice(NoticeLevel::Error, "Failed to resolve alert");
                    self.view.flush();
                }
            },
        }
    }

    fn on_fetched(&mut self, seq: u64, category: Category, label: &str, result: Result<Payload>) {
        let failed = match result {
            Ok(payload) => {
                self.render.apply(
                    seq,
                    payload,
                    label,
                    RenderTargets {
                        history: &mut self.history,
                        alerts: &mut self.alerts,
                        settings: self.settings.settings(),
                        view: &mut self.view,
                        notifier: &mut self.notifier,
                    },
                );
                false
            }
            // already logged by the client
            Err(_) => {
                debug!("[dashboard] cycle {seq}: no {category} update");
                true
            }
        };

        let Some(cycle) = self.cycles.get_mut(&seq) else {
            return;
        };
        cycle.remaining = cycle.remaining.saturating_sub(1);
        if failed {
            cycle.failures += 1;
        }
        if cycle.remaining > 0 {
            return;
        }
        if let Some(cycle) = self.cycles.remove(&seq) {
            self.finish_cycle(seq, cycle);
        }
    }

    fn finish_cycle(&mut self, seq: u64, cycle: CycleState) {
        if cycle.failures > 0 {
            warn!(
                "[dashboard] cycle {seq} settled with {} failed categories",
                cycle.failures
            );
        } else {
            debug!("[dashboard] cycle {seq} settled");
        }
        if cycle.origin.is_full() {
            self.view.set_last_update(&time_label());
        }
        if matches!(cycle.origin, CycleOrigin::Manual | CycleOrigin::Initial) {
            let busy_elsewhere = self
                .cycles
                .values()
                .any(|c| matches!(c.origin, CycleOrigin::Manual | CycleOrigin::Initial));
            if !busy_elsewhere {
                self.view.set_busy(false);
            }
            match cycle.origin {
                CycleOrigin::Manual => self
                    .view
                    .notice(NoticeLevel::Success, "Data refreshed successfully"),
                _ if cycle.failures == Category::ALL.len() => self
                    .view
                    .notice(NoticeLevel::Error, "Failed to load system metrics"),
                _ => {}
            }
        }
        self.view.flush();
    }

    pub fn save_settings(&mut self) {
        match self.settings.save_current() {
            Ok(()) => self
                .view
                .notice(NoticeLevel::Success, "Settings saved successfully"),
            Err(err) => {
                warn!("[dashboard] {err}");
                self.view
                    .notice(NoticeLevel::Error, "Failed to save settings");
            }
        }
        self.view.flush();
    }

    pub fn reset_settings(&mut self) {
        if let Err(err) = self.settings.reset() {
            warn!("[dashboard] {err}");
            self.view
                .notice(NoticeLevel::Error, "Failed to reset settings");
            return;
        }
        self.apply_interval();
        self.view.apply_settings(self.settings.settings());
        self.view
            .notice(NoticeLevel::Info, "Settings reset to defaults");
        self.view.flush();
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.settings.set_theme(theme);
        self.view.apply_settings(self.settings.settings());
        self.view.flush();
    }

    /// Flips dark mode and persists the choice immediately.
    pub fn toggle_dark_mode(&mut self) -> Theme {
        let theme = self.settings.toggle_dark_mode();
        self.view.apply_settings(self.settings.settings());
        self.save_settings();
        theme
    }

    pub fn set_threshold(&mut self, gauge: HistorySeries, pct: u8) {
        match gauge {
            HistorySeries::Cpu => self.settings.set_cpu_threshold(pct),
            HistorySeries::Ram => self.settings.set_ram_threshold(pct),
            HistorySeries::Disk => self.settings.set_disk_threshold(pct),
        }
        self.view.apply_settings(self.settings.settings());
    }

    /// Summarises the active alerts as a notice.
    pub fn show_notifications(&mut self) {
        let active = self.alerts.active();
        if active.is_empty() {
            self.view
                .notice(NoticeLevel::Info, "No active notifications");
        } else {
            let plural = if active.len() > 1 { "s" } else { "" };
            let mut message = format!("You have {} active alert{plural}:\n", active.len());
            for (index, alert) in active.iter().enumerate() {
                message.push_str(&format!("\n{}. {}", index + 1, alert.message));
            }
            self.view.notice(NoticeLevel::Warning, &message);
        }
        self.view.flush();
    }

    /// Applies one command. Returns `false` when the dashboard should quit.
    pub fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Refresh => {
                self.manual_trigger();
            }
            Command::RefreshProcesses => {
                self.refresh_processes();
            }
            Command::ToggleAutoRefresh => {
                self.toggle_auto_refresh();
            }
            Command::SetInterval(seconds) => self.set_refresh_interval(seconds),
            Command::SetThreshold(gauge, pct) => self.set_threshold(gauge, pct),
            Command::SetNotifications(enabled) => {
                self.settings.set_notifications(enabled);
                self.view.apply_settings(self.settings.settings());
            }
            Command::SetSounds(enabled) => {
                self.settings.set_sounds(enabled);
                self.view.apply_settings(self.settings.settings());
            }
            Command::SetTheme(theme) => self.set_theme(theme),
            Command::SetChartType(chart_type) => {
                self.settings.set_chart_type(chart_type);
                self.view.apply_settings(self.settings.settings());
                self.view.flush();
            }
            Command::SetAnimations(enabled) => {
                self.settings.set_show_animations(enabled);
                self.view.apply_settings(self.settings.settings());
                self.view.flush();
            }
            Command::ToggleDarkMode => {
                self.toggle_dark_mode();
            }
            Command::ResolveAlert(id) => self.trigger_resolve(id),
            Command::ShowNotifications => self.show_notifications(),
            Command::SaveSettings => self.save_settings(),
            Command::ResetSettings => self.reset_settings(),
            Command::Quit => return false,
        }
        true
    }

    /// Loads initial data, starts the periodic schedule and serves commands
    /// until `Quit`, a closed channel, or Ctrl-C. On the way out the schedule
    /// is stopped and outstanding fetches are allowed to finish.
    pub async fn run(&mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        self.begin_cycle(CycleOrigin::Initial);
        self.start();
        info!("[dashboard] running");

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                Some(done) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.on_completion(done);
                }
                _ = self.scheduler.tick() => {
                    self.begin_cycle(CycleOrigin::Periodic);
                }
                command = commands.recv() => {
                    match command {
                        Some(command) => {
                            if !self.handle(command) {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = &mut shutdown => {
                    info!("[dashboard] interrupted");
                    break;
                }
            }
        }

        self.stop();
        self.settle().await;
        info!("[dashboard] stopped");
    }
}

fn time_label() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
