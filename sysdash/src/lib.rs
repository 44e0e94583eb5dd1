//! Client-side refresh and render pipeline for a system-metrics dashboard.
//!
//! The [`Dashboard`] polls a remote metrics API, keeps a bounded rolling
//! history of resource usage, tracks the server's active alerts and pushes
//! every change through a [`DashboardView`].

pub mod alerts;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod history;
pub mod notify;
pub mod render;
pub mod scheduler;
pub mod settings;
pub mod types;
pub mod view;

pub use alerts::{AlertRegistry, ReplaceOutcome};
pub use client::MetricsClient;
pub use config::ClientConfig;
pub use dashboard::{Command, CycleOrigin, Dashboard};
pub use error::{DashboardError, Result};
pub use history::{HistoryBuffer, MetricSample};
pub use notify::{LogNotifier, Notification, Notifier, Permission, RecordingNotifier};
pub use render::{
    ChartId, DashboardView, GaugeLevel, HistorySeries, NoticeLevel, RenderCoordinator,
    SummaryField, format_bytes, format_speed,
};
pub use scheduler::{RefreshScheduler, SchedulerState};
pub use settings::{
    BlobStore, ChartType, FileBlobStore, MemoryBlobStore, Settings, SettingsStore, Theme,
};
pub use types::{Alert, Category, Payload, Severity};
pub use view::MemoryView;
