//! Failure alerts raised by the note manager.
//!
//! Every surfaced failure leaves one alert behind until the user acts on it.
//! A failed load can be retried; anything else can only be acknowledged.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    /// Re-issue the load that failed.
    Retry,
    Dismiss,
}

impl NotificationAction {
    /// Front-end command that acts on the alert.
    pub fn command(self) -> &'static str {
        match self {
            NotificationAction::Retry => "retry",
            NotificationAction::Dismiss => "dismiss",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub action: NotificationAction,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(message: impl Into<String>, action: NotificationAction) -> Self {
        Self {
            message: message.into(),
            action,
            raised_at: Utc::now(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.action == NotificationAction::Retry
    }
}
