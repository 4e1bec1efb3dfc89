use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A user-facing message. Display is up to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Fire-and-forget receiver for user-facing messages.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Cloneable handle over a sink with one helper per level.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    #[must_use]
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// A notifier that only writes to the tracing log.
    #[must_use]
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink))
    }

    fn send(&self, level: NotificationLevel, message: impl Into<String>) {
        self.sink.notify(Notification {
            level,
            message: message.into(),
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.send(NotificationLevel::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.send(NotificationLevel::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.send(NotificationLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(NotificationLevel::Error, message);
    }
}

/// Mirrors notifications into the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        let message = notification.message;
        match notification.level {
            NotificationLevel::Success | NotificationLevel::Info => info!(%message, "notification"),
            NotificationLevel::Warning => warn!(%message, "notification"),
            NotificationLevel::Error => error!(%message, "notification"),
        }
    }
}

/// Keeps every notification in memory; handy for tests and terminal front-ends.
#[derive(Debug, Default)]
pub struct RecordingSink {
    received: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return everything received so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.lock().unwrap_or_else(PoisonError::into_inner))
    }

    #[must_use]
    pub fn contains(&self, level: NotificationLevel, needle: &str) -> bool {
        self.notifications()
            .iter()
            .any(|n| n.level == level && n.message.contains(needle))
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifier_routes_levels_to_sink() {
        let sink = Arc::new(RecordingSink::new());
        let notifier = Notifier::new(sink.clone());

        notifier.success("saved");
        notifier.error(format!("failed at {}", 2));

        assert!(sink.contains(NotificationLevel::Success, "saved"));
        assert!(sink.contains(NotificationLevel::Error, "failed at 2"));
        assert_eq!(sink.drain().len(), 2);
        assert!(sink.notifications().is_empty());
    }
}
