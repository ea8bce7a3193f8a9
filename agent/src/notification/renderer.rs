//! Drawing side of notifications.
//!
//! The scheduler drives a [`NotificationRenderer`] by notification id. The
//! shipped [`TracingRenderer`] writes each popup to the log, which is what the
//! agent uses when no desktop surface is attached.

use std::collections::HashMap;

use super::types::{NotificationId, NotificationView};

pub const POPUP_HEIGHT: u32 = 140;
pub const SCREEN_MARGIN: u32 = 20;
pub const STACK_GAP: u32 = 10;

/// Vertical offset of a stack slot from the top of the screen.
pub fn slot_offset(position: usize) -> u32 {
    SCREEN_MARGIN + position as u32 * (POPUP_HEIGHT + STACK_GAP)
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unknown notification handle {0}")]
    UnknownHandle(NotificationId),
    #[error("render backend failed: {0}")]
    Backend(String),
}

pub trait NotificationRenderer {
    fn show(
        &mut self,
        id: NotificationId,
        view: &NotificationView<'_>,
        position: usize,
    ) -> Result<(), RenderError>;
    fn update_progress(&mut self, id: NotificationId, percent: u8) -> Result<(), RenderError>;
    fn update_label(&mut self, id: NotificationId, text: &str) -> Result<(), RenderError>;
    fn move_to(&mut self, id: NotificationId, position: usize) -> Result<(), RenderError>;
    fn destroy(&mut self, id: NotificationId) -> Result<(), RenderError>;
}

/// Logs popups instead of painting them.
#[derive(Debug, Default)]
pub struct TracingRenderer {
    // handle -> stack slot
    shown: HashMap<NotificationId, usize>,
}

impl TracingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: NotificationId) -> Result<usize, RenderError> {
        self.shown
            .get(&id)
            .copied()
            .ok_or(RenderError::UnknownHandle(id))
    }
}

impl NotificationRenderer for TracingRenderer {
    fn show(
        &mut self,
        id: NotificationId,
        view: &NotificationView<'_>,
        position: usize,
    ) -> Result<(), RenderError> {
        self.shown.insert(id, position);
        tracing::info!(
            id,
            style = view.style.as_str(),
            slot = position,
            y = slot_offset(position),
            "[POPUP] {} {}: {}",
            view.style.icon(),
            view.title,
            view.message
        );
        Ok(())
    }

    fn update_progress(&mut self, id: NotificationId, percent: u8) -> Result<(), RenderError> {
        self.slot(id)?;
        tracing::trace!(id, percent, "popup progress");
        Ok(())
    }

    fn update_label(&mut self, id: NotificationId, text: &str) -> Result<(), RenderError> {
        self.slot(id)?;
        tracing::trace!(id, label = text, "popup label");
        Ok(())
    }

    fn move_to(&mut self, id: NotificationId, position: usize) -> Result<(), RenderError> {
        let from = self.slot(id)?;
        self.shown.insert(id, position);
        tracing::debug!(id, from, to = position, y = slot_offset(position), "popup moved");
        Ok(())
    }

    fn destroy(&mut self, id: NotificationId) -> Result<(), RenderError> {
        self.shown
            .remove(&id)
            .ok_or(RenderError::UnknownHandle(id))?;
        tracing::debug!(id, "popup closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationStyle;

    #[test]
    fn slots_stack_downwards() {
        assert_eq!(slot_offset(0), 20);
        assert_eq!(slot_offset(1), 170);
        assert_eq!(slot_offset(2), 320);
    }

    #[test]
    fn tracing_renderer_tracks_handles() {
        let mut r = TracingRenderer::new();
        let view = NotificationView {
            title: "t",
            message: "m",
            style: NotificationStyle::Info,
            label: "Just now",
        };
        r.show(1, &view, 0).unwrap();
        r.move_to(1, 2).unwrap();
        r.destroy(1).unwrap();
        assert!(matches!(r.update_progress(1, 10), Err(RenderError::UnknownHandle(1))));
    }
}
