//! The cooperative loop: one task owning the dispatcher, the notification
//! scheduler and (through the dispatcher) the subscriber registry.
//!
//! Every tick advances the notification scheduler, then drains the inbox and
//! dispatches each update in order. Notifications a command enqueues are
//! promoted on the following tick.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::dispatch::{Dispatcher, replies};
use crate::inbox::InboxReceiver;
use crate::notification::{NotificationRenderer, NotificationScheduler, NotificationStyle};

pub struct EventLoop<R> {
    inbox: InboxReceiver,
    dispatcher: Dispatcher,
    scheduler: NotificationScheduler<R>,
    tick_interval: Duration,
    fetcher: Option<JoinHandle<()>>,
}

impl<R: NotificationRenderer> EventLoop<R> {
    pub fn new(
        inbox: InboxReceiver,
        dispatcher: Dispatcher,
        scheduler: NotificationScheduler<R>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            inbox,
            dispatcher,
            scheduler,
            tick_interval,
            fetcher: None,
        }
    }

    /// The update fetcher task; it is joined before the stop sequence runs.
    pub fn with_fetcher(mut self, fetcher: JoinHandle<()>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn scheduler(&self) -> &NotificationScheduler<R> {
        &self.scheduler
    }

    /// Local "started" banner plus the startup message with quick-action buttons to the admin.
    pub fn announce_startup(&mut self) {
        let device = telegram_client::escape_html(self.dispatcher.device_name());
        self.scheduler.enqueue(
            "🤖 BOT STARTED",
            format!(
                "{} is now active!\n\nUse /menu for button controls!",
                self.dispatcher.device_name()
            ),
            NotificationStyle::Info,
        );
        let (text, keyboard) = replies::startup(&device);
        let admin = self.dispatcher.admin_id().to_string();
        self.dispatcher
            .outbox()
            .send_with_keyboard(&admin, text, keyboard);
    }

    pub fn tick(&mut self) {
        self.scheduler.tick();
        for batch in self.inbox.drain_nonblocking() {
            self.dispatcher.dispatch_batch(batch, &mut self.scheduler);
        }
    }

    /// Tick until `shutdown` fires, then run the stop sequence.
    pub async fn run(&mut self, shutdown: &CancellationToken) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            tick_ms = self.tick_interval.as_millis() as u64,
            "Event loop running"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => self.tick(),
            }
        }

        if let Some(fetcher) = self.fetcher.take() {
            if let Err(e) = fetcher.await {
                tracing::warn!("Update fetcher task failed: {e}");
            }
        }
        self.stop();
    }

    /// Final status message, drop pending power action, tear down notifications.
    fn stop(&mut self) {
        let admin = self.dispatcher.admin_id().to_string();
        let device = telegram_client::escape_html(self.dispatcher.device_name());
        self.dispatcher
            .outbox()
            .send(&admin, format!("⏹️ Bot stopped: {device}"));

        if let Some(action) = self.dispatcher.power_mut().cancel() {
            tracing::warn!(action = action.as_str(), "Agent stopping with a pending power action");
        }

        let destroyed = self.scheduler.destroy_all();
        tracing::info!(
            destroyed,
            last_processed = self.dispatcher.last_processed(),
            "Event loop stopped"
        );
    }
}
