//! User-visible notifications
//!
//! Fire-and-forget success/info/warning/error messages. The reducer emits
//! them as effects; a `NotificationSink` decides how they reach the user.

use std::sync::Mutex;

use colored::Colorize;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: Option<String>,
}

impl Notification {
    pub fn new(level: NotificationLevel, title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description,
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, title, None)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, title, None)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, title, None)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, title, None)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Single-line rendering: `Title: description`
    pub fn text(&self) -> String {
        match &self.description {
            Some(d) => format!("{}: {}", self.title, d),
            None => self.title.clone(),
        }
    }
}

/// Receives notifications; no acknowledgment contract
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Writes notifications to the tracing log only
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, n: &Notification) {
        match n.level {
            NotificationLevel::Success | NotificationLevel::Info => info!(title = %n.title, description = ?n.description, "notification"),
            NotificationLevel::Warning => warn!(title = %n.title, description = ?n.description, "notification"),
            NotificationLevel::Error => error!(title = %n.title, description = ?n.description, "notification"),
        }
    }
}

/// Prints colored notifications to stdout/stderr for the headless runner
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&self, n: &Notification) {
        debug!(?n.level, %n.title, "ConsoleSink::notify: called");
        match n.level {
            NotificationLevel::Success => println!("{} {}", "✓".green(), n.text()),
            NotificationLevel::Info => println!("{} {}", "•".cyan(), n.text()),
            NotificationLevel::Warning => eprintln!("{} {}", "!".yellow(), n.text().yellow()),
            NotificationLevel::Error => eprintln!("{} {}", "✗".red(), n.text().red()),
        }
    }
}

/// Keeps notifications in memory (dashboard toasts, tests)
#[derive(Debug, Default)]
pub struct RecordingSink {
    items: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far
    pub fn snapshot(&self) -> Vec<Notification> {
        self.items.lock().map(|items| items.clone()).unwrap_or_default()
    }

    /// The `n` most recent notifications, oldest first
    pub fn latest(&self, n: usize) -> Vec<Notification> {
        self.items
            .lock()
            .map(|items| items[items.len().saturating_sub(n)..].to_vec())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut items) = self.items.lock() {
            items.clear();
        }
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: &Notification) {
        LogSink.notify(notification);
        if let Ok(mut items) = self.items.lock() {
            items.push(notification.clone());
        }
    }
}
