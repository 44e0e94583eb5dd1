//! Platform notification seam.

use log::warn;
use std::time::Duration;

pub const NOTIFICATION_TITLE: &str = "Network Monitor Alert";
pub const NOTIFICATION_DISMISS_AFTER: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Not decided yet; ask once at startup.
    Default,
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub dismiss_after: Duration,
    pub sound: bool,
}

impl Notification {
    pub fn alert(body: &str, sound: bool) -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            body: body.to_string(),
            dismiss_after: NOTIFICATION_DISMISS_AFTER,
            sound,
        }
    }
}

pub trait Notifier {
    fn permission(&self) -> Permission;
    fn request_permission(&mut self) -> Permission;
    fn notify(&mut self, notification: Notification);
}

/// Emits notifications through the log at `warn`.
#[derive(Debug)]
pub struct LogNotifier {
    permission: Permission,
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self {
            permission: Permission::Default,
        }
    }
}

impl Notifier for LogNotifier {
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
        warn!("[notify] {}: {}", notification.title, notification.body);
    }
}

/// Keeps every notification it is handed.
#[derive(Debug)]
pub struct RecordingNotifier {
    permission: Permission,
    pub sent: Vec<Notification>,
    pub permission_requests: usize,
}

impl RecordingNotifier {
    pub fn new(permission: Permission) -> Self {
        Self {
            permission,
            sent: Vec::new(),
            permission_requests: 0,
        }
    }
}

impl Notifier for RecordingNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Permission {
        self.permission_requests += 1;
        if self.permission == Permission::Default {
            self.permission = Permission::Granted;
        }
        self.permission
    }

    fn notify(&mut self, notification: Notification) {
        self.sent.push(notification);
    }
}
