//! Notification - Toast Messages for the Front-End

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local};
use crossbeam_channel::{Receiver, Sender};

use crate::error::Error;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Positive,
    Info,
    Warning,
    Negative,
}

impl NotificationLevel {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationLevel::Positive => "OK",
            NotificationLevel::Info => "INFO",
            NotificationLevel::Warning => "WARN",
            NotificationLevel::Negative => "ERROR",
        }
    }
}

/// A single user-visible message
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {:<5} {}",
            self.timestamp.format("%H:%M:%S"),
            self.level.label(),
            self.message
        )
    }
}

/// Cloneable sending side of the notification channel
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: Sender<Notification>,
    next_id: Arc<AtomicU64>,
}

impl Notifier {
    /// Create a notifier and the receiver the front-end drains
    pub fn channel() -> (Self, Receiver<Notification>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let notifier = Self {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
        };
        (notifier, rx)
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            level,
            message: message.into(),
            timestamp: Local::now(),
        };
        // The receiver is gone only while the process shuts down
        if self.tx.send(notification).is_err() {
            tracing::debug!("Notification dropped, receiver closed");
        }
    }

    pub fn positive(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Positive, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Warning, message);
    }

    pub fn negative(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Negative, message);
    }

    /// Report a failed gateway call
    pub fn api_error(&self, error: &Error) {
        self.negative(error.user_message());
    }
}
