//! Single-threaded notification lifecycle driver.
//!
//! Each `tick` runs three phases in order:
//! 1. destroy every `Closing` notification and compact the stack,
//! 2. promote `Queued` notifications to `Visible` in the next free slots,
//! 3. fire due timers (delayed release, animation frames, label refresh, expiry).
//!
//! A notification closed during tick N is therefore destroyed in tick N+1.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;

use super::NotificationSink;
use super::renderer::NotificationRenderer;
use super::types::{
    Notification, NotificationId, NotificationState, NotificationStyle, NotificationView,
    elapsed_label,
};

pub const FRAME_INTERVAL: Duration = Duration::from_millis(50);
pub const LABEL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Time from creation to automatic close.
    pub lifetime: Duration,
    /// Duration of the 0-100 progress animation.
    pub animation: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lifetime: Duration::from_secs(5),
            animation: Duration::from_secs(4),
        }
    }
}

#[derive(Debug)]
enum Timer {
    Release {
        title: String,
        message: String,
        style: NotificationStyle,
    },
    Frame(NotificationId),
    Label(NotificationId),
    Expire(NotificationId),
}

pub struct NotificationScheduler<R> {
    renderer: R,
    config: SchedulerConfig,
    next_id: NotificationId,
    /// Live notifications (not yet destroyed), in creation order.
    notifications: Vec<Notification>,
    /// Keyed by (due, sequence) so equal deadlines fire in scheduling order.
    timers: BTreeMap<(Instant, u64), Timer>,
    timer_seq: u64,
}

impl<R: NotificationRenderer> NotificationScheduler<R> {
    pub fn new(renderer: R, config: SchedulerConfig) -> Self {
        Self {
            renderer,
            config,
            next_id: 1,
            notifications: Vec::new(),
            timers: BTreeMap::new(),
            timer_seq: 0,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Create a notification in `Queued`; it is shown on the next tick.
    pub fn enqueue(
        &mut self,
        title: impl Into<String>,
        message: impl Into<String>,
        style: NotificationStyle,
    ) -> NotificationId {
        let id = self.next_id;
        self.next_id += 1;
        let notification = Notification {
            id,
            title: title.into(),
            message: message.into(),
            style,
            created_at: Instant::now(),
            state: NotificationState::Queued,
            stack_index: None,
            progress: 0,
            frames_done: 0,
        };
        tracing::debug!(id, title = %notification.title, "Notification queued");
        self.notifications.push(notification);
        id
    }

    /// Enqueue after `delay`. The notification gets its id when released.
    pub fn enqueue_delayed(
        &mut self,
        delay: Duration,
        title: impl Into<String>,
        message: impl Into<String>,
        style: NotificationStyle,
    ) {
        self.schedule(
            Instant::now() + delay,
            Timer::Release {
                title: title.into(),
                message: message.into(),
                style,
            },
        );
    }

    /// Request closing `id`. Returns `false` if it is already closing or gone.
    ///
    /// A queued notification is cancelled without ever being shown. A visible
    /// one completes its animation first so it passes through `Displayed`.
    pub fn close(&mut self, id: NotificationId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let state = self.notifications[idx].state;
        match state {
            NotificationState::Queued => {
                let mut n = self.notifications.remove(idx);
                n.advance(NotificationState::Destroyed);
                tracing::debug!(id, "Queued notification cancelled");
                true
            }
            NotificationState::Visible => {
                self.finish_animation(idx);
                self.notifications[idx].advance(NotificationState::Closing);
                true
            }
            NotificationState::Displayed => {
                self.notifications[idx].advance(NotificationState::Closing);
                true
            }
            NotificationState::Closing | NotificationState::Destroyed => false,
        }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.destroy_closing();
        self.promote_queued(now);
        self.fire_timers(now);
    }

    /// Tear down everything immediately. Used at shutdown.
    pub fn destroy_all(&mut self) -> usize {
        let ids: Vec<NotificationId> = self.notifications.iter().map(|n| n.id).collect();
        for id in &ids {
            self.close(*id);
        }
        self.destroy_closing();
        self.timers.clear();
        ids.len()
    }

    pub fn state(&self, id: NotificationId) -> Option<NotificationState> {
        self.index_of(id).map(|i| self.notifications[i].state)
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.index_of(id).map(|i| &self.notifications[i])
    }

    /// Stack slots of on-screen notifications, ordered top to bottom.
    pub fn stack(&self) -> Vec<(NotificationId, usize)> {
        let mut slots: Vec<(NotificationId, usize)> = self
            .notifications
            .iter()
            .filter_map(|n| n.stack_index.map(|i| (n.id, i)))
            .collect();
        slots.sort_by_key(|(_, slot)| *slot);
        slots
    }

    pub fn active_count(&self) -> usize {
        self.notifications.len()
    }

    fn index_of(&self, id: NotificationId) -> Option<usize> {
        self.notifications.iter().position(|n| n.id == id)
    }

    fn schedule(&mut self, due: Instant, timer: Timer) {
        self.timer_seq += 1;
        self.timers.insert((due, self.timer_seq), timer);
    }

    fn total_frames(&self) -> u32 {
        let frames = self.config.animation.as_millis() / FRAME_INTERVAL.as_millis();
        u32::try_from(frames).unwrap_or(u32::MAX).max(1)
    }

    fn destroy_closing(&mut self) {
        let mut destroyed = 0usize;
        let mut i = 0;
        while i < self.notifications.len() {
            if self.notifications[i].state != NotificationState::Closing {
                i += 1;
                continue;
            }
            let mut n = self.notifications.remove(i);
            if let Err(e) = self.renderer.destroy(n.id) {
                tracing::warn!(id = n.id, "Failed to destroy notification: {e}");
            }
            n.stack_index = None;
            n.advance(NotificationState::Destroyed);
            destroyed += 1;
        }
        if destroyed > 0 {
            self.compact();
        }
    }

    /// Close gaps left by destroyed notifications, keeping relative order.
    fn compact(&mut self) {
        let mut on_stack: Vec<usize> = (0..self.notifications.len())
            .filter(|&i| self.notifications[i].stack_index.is_some())
            .collect();
        on_stack.sort_by_key(|&i| self.notifications[i].stack_index);

        for (slot, idx) in on_stack.into_iter().enumerate() {
            let n = &mut self.notifications[idx];
            if n.stack_index == Some(slot) {
                continue;
            }
            n.stack_index = Some(slot);
            if let Err(e) = self.renderer.move_to(n.id, slot) {
                tracing::warn!(id = n.id, "Failed to move notification: {e}");
            }
        }
    }

    fn promote_queued(&mut self, now: Instant) {
        for idx in 0..self.notifications.len() {
            if self.notifications[idx].state != NotificationState::Queued {
                continue;
            }
            let position = self
                .notifications
                .iter()
                .filter(|n| n.is_on_stack())
                .count();

            let n = &mut self.notifications[idx];
            n.advance(NotificationState::Visible);
            n.stack_index = Some(position);
            let id = n.id;
            let expires_at = n.created_at + self.config.lifetime;

            let label = elapsed_label(now.saturating_duration_since(n.created_at).as_secs());
            let view = NotificationView {
                title: &n.title,
                message: &n.message,
                style: n.style,
                label: &label,
            };
            if let Err(e) = self.renderer.show(id, &view, position) {
                // Keep the lifecycle going so the slot is released on schedule.
                tracing::warn!(id, "Failed to show notification: {e}");
                tracing::info!("[POPUP] {}: {}", view.title, view.message);
            }

            self.schedule(now + FRAME_INTERVAL, Timer::Frame(id));
            self.schedule(now + LABEL_INTERVAL, Timer::Label(id));
            self.schedule(expires_at.max(now), Timer::Expire(id));
        }
    }

    fn fire_timers(&mut self, now: Instant) {
        loop {
            let due = match self.timers.first_key_value() {
                Some((&(at, _), _)) if at <= now => at,
                _ => break,
            };
            let Some((_, timer)) = self.timers.pop_first() else {
                break;
            };
            match timer {
                Timer::Release {
                    title,
                    message,
                    style,
                } => {
                    self.enqueue(title, message, style);
                }
                Timer::Frame(id) => self.on_frame(id, due),
                Timer::Label(id) => self.on_label(id, due, now),
                Timer::Expire(id) => {
                    if self.close(id) {
                        tracing::debug!(id, "Notification expired");
                    }
                }
            }
        }
    }

    fn on_frame(&mut self, id: NotificationId, due: Instant) {
        let Some(idx) = self.index_of(id) else {
            return;
        };
        if self.notifications[idx].state != NotificationState::Visible {
            return;
        }
        let total = self.total_frames();
        let n = &mut self.notifications[idx];
        n.frames_done += 1;
        let percent = (u64::from(n.frames_done) * 100 / u64::from(total)).min(100) as u8;
        n.progress = percent;
        if let Err(e) = self.renderer.update_progress(id, percent) {
            tracing::debug!(id, "Failed to update progress: {e}");
        }
        if percent >= 100 {
            self.notifications[idx].advance(NotificationState::Displayed);
        } else {
            self.schedule(due + FRAME_INTERVAL, Timer::Frame(id));
        }
    }

    fn on_label(&mut self, id: NotificationId, due: Instant, now: Instant) {
        let Some(idx) = self.index_of(id) else {
            return;
        };
        let n = &self.notifications[idx];
        if !n.is_on_stack() {
            return;
        }
        let label = elapsed_label(now.saturating_duration_since(n.created_at).as_secs());
        if let Err(e) = self.renderer.update_label(id, &label) {
            tracing::debug!(id, "Failed to update label: {e}");
        }
        self.schedule(due + LABEL_INTERVAL, Timer::Label(id));
    }

    fn finish_animation(&mut self, idx: usize) {
        let n = &mut self.notifications[idx];
        if n.progress < 100 {
            n.progress = 100;
            if let Err(e) = self.renderer.update_progress(n.id, 100) {
                tracing::debug!(id = n.id, "Failed to update progress: {e}");
            }
        }
        n.advance(NotificationState::Displayed);
    }
}

impl<R: NotificationRenderer> NotificationSink for NotificationScheduler<R> {
    fn enqueue(&mut self, title: &str, message: &str, style: NotificationStyle) -> NotificationId {
        NotificationScheduler::enqueue(self, title, message, style)
    }

    fn enqueue_delayed(&mut self, delay: Duration, title: &str, message: &str, style: NotificationStyle) {
        NotificationScheduler::enqueue_delayed(self, delay, title, message, style)
    }
}
