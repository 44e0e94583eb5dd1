use crate::client::MetricsClient;
use crate::error::Result;
use crate::types::{Alert, Severity};
use log::{info, warn};
use std::collections::HashSet;

/// Outcome of installing a new alert snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceOutcome {
    /// `current - previous` alert count.
    pub delta: isize,
    pub count: usize,
    /// Critical alerts that should be announced for this snapshot.
    pub to_notify: Vec<Alert>,
}

/// Holds the latest alert snapshot from the server.
///
/// The registry never flips `resolved` on its own; resolution is a server
/// round-trip followed by a fresh snapshot.
#[derive(Debug, Default)]
pub struct AlertRegistry {
    active: Vec<Alert>,
    announced: HashSet<i64>,
}

impl AlertRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &[Alert] {
        &self.active
    }

    pub fn get(&self, id: i64) -> Option<&Alert> {
        self.active.iter().find(|alert| alert.id == id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Replaces the active set wholesale.
    ///
    /// A critical alert is announced the first time its id shows up; it is
    /// not announced again while it stays in consecutive snapshots. Ids that
    /// drop out of a snapshot are forgotten, so a reappearing alert is
    /// announced again.
    pub fn replace_all(&mut self, alerts: Vec<Alert>, notifications_enabled: bool) -> ReplaceOutcome {
        let previous = self.active.len();
        let present: HashSet<i64> = alerts.iter().map(|alert| alert.id).collect();
        self.announced.retain(|id| present.contains(id));

        let mut to_notify = Vec::new();
        for alert in alerts.iter().filter(|a| a.severity == Severity::Critical) {
            if notifications_enabled && self.announced.insert(alert.id) {
                to_notify.push(alert.clone());
            }
        }

        self.active = alerts;
        ReplaceOutcome {
            delta: self.active.len() as isize - previous as isize,
            count: self.active.len(),
            to_notify,
        }
    }

    /// Asks the server to resolve `id`. Local state is left alone either
    /// way; on success the caller fetches a fresh snapshot.
    pub async fn resolve(client: &MetricsClient, id: i64) -> Result<()> {
        match client.resolve_alert(id).await {
            Ok(()) => {
                info!("[alerts] alert {id} resolved");
                Ok(())
            }
            Err(err) => {
                warn!("[alerts] {err}");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(id: i64, severity: Severity) -> Alert {
        Alert {
            id,
            message: format!("alert {id}"),
            severity,
            created_at: "2024-05-01 10:00:00".to_string(),
            resolved: false,
            alert_type: None,
        }
    }

    #[test]
    fn replace_reports_count_delta() {
        let mut registry = AlertRegistry::new();
        let first = registry.replace_all(vec![alert(1, Severity::Info), alert(2, Severity::Warning)], true);
        assert_eq!(first.delta, 2);
        let second = registry.replace_all(vec![alert(3, Severity::Info)], true);
        assert_eq!(second.delta, -1);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(1).is_none());
    }

    #[test]
    fn critical_alert_is_announced_once_while_present() {
        let mut registry = AlertRegistry::new();
        let first = registry.replace_all(vec![alert(1, Severity::Critical), alert(2, Severity::Info)], true);
        assert_eq!(first.to_notify.len(), 1);
        assert_eq!(first.to_notify[0].id, 1);

        let again = registry.replace_all(vec![alert(1, Severity::Critical)], true);
        assert!(again.to_notify.is_empty());

        registry.replace_all(Vec::new(), true);
        let back = registry.replace_all(vec![alert(1, Severity::Critical)], true);
        assert_eq!(back.to_notify.len(), 1);
    }

    #[test]
    fn nothing_is_announced_when_notifications_are_off() {
        let mut registry = AlertRegistry::new();
        let outcome = registry.replace_all(vec![alert(1, Severity::Critical)], false);
        assert!(outcome.to_notify.is_empty());
        let enabled = registry.replace_all(vec![alert(1, Severity::Critical)], true);
        assert_eq!(enabled.to_notify.len(), 1);
    }
}
