//! Transient user notifications ("toasts").
//!
//! Operations report their outcome through a [`Notifier`] rather than
//! returning display text, so a view decides how to show them. A failed
//! cart mutation produces exactly one error notification.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}

/// Notifier that keeps every notification and logs it.
///
/// Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct Toasts {
    entries: Arc<Mutex<Vec<Notification>>>,
}

impl Toasts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification so far, oldest first.
    #[must_use]
    pub fn all(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Notifications of one level.
    #[must_use]
    pub fn of_level(&self, level: Level) -> Vec<Notification> {
        self.all().into_iter().filter(|n| n.level == level).collect()
    }

    /// Remove and return every notification.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for Toasts {
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Error => warn!(message = %notification.message, "Notify error"),
            Level::Success | Level::Info => info!(message = %notification.message, "Notify"),
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}
