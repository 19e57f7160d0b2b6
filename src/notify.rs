use std::time::{Duration, Instant};

pub const TOAST_LIFETIME: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

/// Where user-facing messages go
pub trait Notifier {
    fn notify(&mut self, message: &str, level: Level);
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: Level,
    pub created: Instant,
}

/// Toasts shown in the corner of the window, oldest first
#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn push(&mut self, message: &str, level: Level, now: Instant) {
        match level {
            Level::Error => log::error!("{}", message),
            Level::Warning => log::warn!("{}", message),
            Level::Success | Level::Info => log::info!("{}", message),
        }
        self.items.push(Toast {
            message: message.to_string(),
            level,
            created: now,
        });
    }

    /// Drop expired toasts
    pub fn prune(&mut self, now: Instant) {
        self.items
            .retain(|t| now.saturating_duration_since(t.created) < TOAST_LIFETIME);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Notifier for Toasts {
    fn notify(&mut self, message: &str, level: Level) {
        self.push(message, level, Instant::now());
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub messages: Vec<(String, Level)>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn levels(&self) -> Vec<Level> {
        self.messages.iter().map(|(_, l)| *l).collect()
    }

    pub fn last(&self) -> Option<&(String, Level)> {
        self.messages.last()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn notify(&mut self, message: &str, level: Level) {
        self.messages.push((message.to_string(), level));
    }
}
