//! Notification type definitions.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

pub type NotificationId = u64;

/// Visual style of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStyle {
    Info,
    Warning,
    Error,
    Success,
    Message,
    Shutdown,
}

impl NotificationStyle {
    pub const ALL: [Self; 6] = [
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::Success,
        Self::Message,
        Self::Shutdown,
    ];

    pub fn icon(self) -> &'static str {
        match self {
            Self::Info => "💡",
            Self::Warning => "⚠️",
            Self::Error => "❌",
            Self::Success => "✅",
            Self::Message => "📨",
            Self::Shutdown => "🖥️",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Success => "success",
            Self::Message => "message",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Lifecycle of a notification. Ordered: a notification only moves to a later state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationState {
    Queued,
    /// Shown and animating its progress bar.
    Visible,
    Displayed,
    Closing,
    Destroyed,
}

/// A notification owned by the scheduler.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub style: NotificationStyle,
    pub created_at: Instant,
    pub state: NotificationState,
    /// Slot in the on-screen stack, 0 = top. `None` until shown.
    pub stack_index: Option<usize>,
    pub(crate) progress: u8,
    pub(crate) frames_done: u32,
}

impl Notification {
    pub(crate) fn advance(&mut self, to: NotificationState) {
        debug_assert!(
            to > self.state,
            "notification {} cannot move from {:?} to {:?}",
            self.id,
            self.state,
            to
        );
        tracing::debug!(id = self.id, from = ?self.state, to = ?to, "Notification state change");
        self.state = to;
    }

    /// Is the notification occupying a stack slot.
    pub fn is_on_stack(&self) -> bool {
        matches!(
            self.state,
            NotificationState::Visible | NotificationState::Displayed
        )
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }
}

/// What the renderer needs to draw a notification.
#[derive(Debug, Clone, Copy)]
pub struct NotificationView<'a> {
    pub title: &'a str,
    pub message: &'a str,
    pub style: NotificationStyle,
    pub label: &'a str,
}

/// Elapsed-time label shown under the message.
pub fn elapsed_label(elapsed_secs: u64) -> String {
    match elapsed_secs {
        0 => "Just now".to_string(),
        s if s < 60 => format!("{s}s ago"),
        s => format!("{}m ago", s / 60),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(elapsed_label(0), "Just now");
        assert_eq!(elapsed_label(1), "1s ago");
        assert_eq!(elapsed_label(59), "59s ago");
        assert_eq!(elapsed_label(61), "1m ago");
        assert_eq!(elapsed_label(3600), "60m ago");
    }

    #[test]
    fn states_are_ordered() {
        assert!(NotificationState::Queued < NotificationState::Visible);
        assert!(NotificationState::Closing < NotificationState::Destroyed);
    }

    #[test]
    fn style_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&NotificationStyle::Shutdown).unwrap(),
            "\"shutdown\""
        );
        assert_eq!(NotificationStyle::Message.as_str(), "message");
    }
}
