//! Command dispatcher.
//!
//! Consumes updates on the cooperative loop: dedups by id, auto-subscribes
//! the sender, authorizes, and turns commands and button presses into
//! outbound replies, notification requests and power requests. Nothing here
//! awaits; replies go through the [`Outbox`].

pub mod command;
pub mod replies;

use std::time::Duration;

use subscriber_store::SubscriberRegistry;
use telegram_client::{InlineKeyboard, Update, UpdateKind, escape_html};

use crate::notification::{NotificationSink, NotificationStyle};
use crate::outbox::Outbox;
use crate::power::{PowerAction, PowerScheduler};

use command::{Action, CallbackToken, Command};
use replies::PopupStep;

/// Where a request came from; typed commands and buttons word some replies differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Typed,
    Button,
}

pub struct Dispatcher {
    admin_id: String,
    device_name: String,
    /// `device_name`, escaped for HTML replies.
    device_html: String,
    registry: SubscriberRegistry,
    outbox: Outbox,
    power: PowerScheduler,
    last_processed: i64,
}

impl Dispatcher {
    pub fn new(
        admin_id: impl Into<String>,
        device_name: impl Into<String>,
        registry: SubscriberRegistry,
        outbox: Outbox,
        power: PowerScheduler,
    ) -> Self {
        let device_name = device_name.into();
        Self {
            admin_id: admin_id.into(),
            device_html: escape_html(&device_name),
            device_name,
            registry,
            outbox,
            power,
            last_processed: 0,
        }
    }

    pub fn last_processed(&self) -> i64 {
        self.last_processed
    }

    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    pub fn power(&self) -> &PowerScheduler {
        &self.power
    }

    pub fn power_mut(&mut self) -> &mut PowerScheduler {
        &mut self.power
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn admin_id(&self) -> &str {
        &self.admin_id
    }

    pub fn dispatch_batch<N: NotificationSink>(&mut self, batch: Vec<Update>, notifier: &mut N) {
        for update in batch {
            self.dispatch(update, notifier);
        }
    }

    pub fn dispatch<N: NotificationSink>(&mut self, update: Update, notifier: &mut N) {
        if update.id <= self.last_processed {
            tracing::debug!(
                update_id = update.id,
                last_processed = self.last_processed,
                "Skipping already processed update"
            );
            return;
        }
        self.last_processed = update.id;

        let Update {
            id,
            sender_id,
            kind,
        } = update;

        match kind {
            UpdateKind::Unsupported => {
                tracing::debug!(update_id = id, "Ignoring unsupported update");
            }
            UpdateKind::Message { text } => {
                self.subscribe(&sender_id);
                tracing::info!(update_id = id, sender = %sender_id, "Command: {text}");
                match Command::parse(&text) {
                    Some(cmd) => self.handle_command(&sender_id, cmd, notifier),
                    None => tracing::debug!(update_id = id, "Empty command"),
                }
            }
            UpdateKind::ButtonCallback { token, query_id } => {
                self.outbox.acknowledge(&query_id);
                self.subscribe(&sender_id);
                tracing::info!(update_id = id, sender = %sender_id, "Button pressed: {token}");
                match CallbackToken::parse(&token) {
                    Some(token) => self.handle_callback(&sender_id, token, notifier),
                    None => tracing::warn!(update_id = id, "Unknown callback token: {token}"),
                }
            }
        }
    }

    fn is_admin(&self, sender: &str) -> bool {
        sender == self.admin_id
    }

    fn subscribe(&mut self, sender: &str) {
        match self.registry.register(sender) {
            Ok(true) => tracing::info!(subscriber = %sender, "Subscribed new sender"),
            Ok(false) => {}
            Err(e) => tracing::warn!(subscriber = %sender, "Failed to persist subscriber: {e}"),
        }
    }

    fn handle_command<N: NotificationSink>(&mut self, sender: &str, cmd: Command, notifier: &mut N) {
        let admin = self.is_admin(sender);

        if cmd.action == Action::Start {
            self.outbox.send(sender, replies::SUBSCRIBED);
            if admin {
                self.send_menu(sender);
            }
            return;
        }
        if cmd.action == Action::Menu {
            if admin {
                self.send_menu(sender);
            } else {
                self.outbox.send(sender, replies::MENU_UNAUTHORIZED);
            }
            return;
        }

        if !admin {
            self.guest_request(sender, &cmd.action);
            return;
        }

        if cmd.action.is_per_device() && !cmd.targets(&self.device_name) {
            tracing::info!(
                action = ?cmd.action,
                target = cmd.target.as_deref().unwrap_or("<none>"),
                "Command not for this device"
            );
            return;
        }

        let device = self.device_html.clone();
        match &cmd.action {
            Action::Msg => self.message(sender, &cmd, notifier),
            Action::Warning => {
                self.outbox.send(sender, format!("⚠️ Warning on {device}"));
                notifier.enqueue(
                    "⚠️ SECURITY WARNING",
                    "Autoshutdown Turn On!",
                    NotificationStyle::Warning,
                );
            }
            Action::Alert => {
                self.outbox.send(sender, format!("🚨 Alert on {device}"));
                notifier.enqueue(
                    "🚨 EMERGENCY",
                    "URGENT ACTION REQUIRED!\nSystem security alert",
                    NotificationStyle::Error,
                );
            }
            Action::Test => self.popup_test(sender, Origin::Typed, notifier),
            Action::Demo => self.popup_demo(sender, Origin::Typed, notifier),
            Action::Status => self.outbox.send(sender, replies::admin_status(&device)),
            Action::Shutdown => self.power_request(sender, PowerAction::Shutdown, Origin::Typed, notifier),
            Action::Restart => self.power_request(sender, PowerAction::Restart, Origin::Typed, notifier),
            Action::Ping => self.outbox.send(sender, format!("🏓 Pong! {device} is alive!")),
            Action::Help => self.outbox.send(sender, replies::command_help(&device)),
            Action::Unknown(name) => {
                self.outbox
                    .send(sender, format!("❌ Unknown command: {}", escape_html(name)));
            }
            Action::Start | Action::Menu => {}
        }
    }

    fn handle_callback<N: NotificationSink>(
        &mut self,
        sender: &str,
        token: CallbackToken,
        notifier: &mut N,
    ) {
        if !self.is_admin(sender) {
            match token {
                CallbackToken::Status => self.guest_request(sender, &Action::Status),
                CallbackToken::Ping => self.guest_request(sender, &Action::Ping),
                CallbackToken::Help => self.guest_request(sender, &Action::Help),
                CallbackToken::Menu => self.outbox.send(sender, replies::MENU_UNAUTHORIZED),
                _ => self.outbox.send(sender, replies::UNAUTHORIZED),
            }
            return;
        }

        let device = self.device_html.clone();
        match token {
            CallbackToken::Menu => self.send_menu(sender),
            CallbackToken::Status => self.outbox.send(sender, replies::admin_status(&device)),
            CallbackToken::SendMsg => self.send_keyboard(sender, replies::send_msg_menu(&device)),
            CallbackToken::MsgInfo => {
                self.outbox.send(sender, format!("📨 Sending info message to {device}"));
                notifier.enqueue(
                    "ℹ️ INFO MESSAGE",
                    "This is an information message from Telegram!\nSent via buttons.",
                    NotificationStyle::Info,
                );
            }
            CallbackToken::MsgWarning => {
                self.outbox.send(sender, format!("⚠️ Sending warning to {device}"));
                notifier.enqueue(
                    "⚠️ WARNING MESSAGE",
                    "Warning! System check required!\nSent via buttons.",
                    NotificationStyle::Warning,
                );
            }
            CallbackToken::MsgSuccess => {
                self.outbox
                    .send(sender, format!("✅ Sending success message to {device}"));
                notifier.enqueue(
                    "✅ SUCCESS MESSAGE",
                    "Operation completed successfully!\nSent via buttons.",
                    NotificationStyle::Success,
                );
            }
            CallbackToken::MsgEmergency => {
                self.outbox
                    .send(sender, format!("🚨 Sending emergency alert to {device}"));
                notifier.enqueue(
                    "🚨 EMERGENCY ALERT",
                    "EMERGENCY! Immediate action required!\nSent via buttons.",
                    NotificationStyle::Error,
                );
            }
            CallbackToken::Warning => {
                self.outbox.send(sender, format!("⚠️ Warning on {device}"));
                notifier.enqueue(
                    "⚠️ SECURITY WARNING",
                    "Security alert triggered via button!\nAutoshutdown protocols active!",
                    NotificationStyle::Warning,
                );
            }
            CallbackToken::Alert => {
                self.outbox.send(sender, format!("🚨 Alert on {device}"));
                notifier.enqueue(
                    "🚨 EMERGENCY ALERT",
                    "URGENT ACTION REQUIRED!\nEmergency alert triggered via button!",
                    NotificationStyle::Error,
                );
            }
            CallbackToken::Test => self.popup_test(sender, Origin::Button, notifier),
            CallbackToken::Demo => self.popup_demo(sender, Origin::Button, notifier),
            CallbackToken::ShutdownConfirm => {
                self.send_keyboard(sender, replies::shutdown_confirm(&device))
            }
            CallbackToken::RestartConfirm => {
                self.send_keyboard(sender, replies::restart_confirm(&device))
            }
            CallbackToken::ShutdownNow => {
                self.power_request(sender, PowerAction::Shutdown, Origin::Button, notifier)
            }
            CallbackToken::RestartNow => {
                self.power_request(sender, PowerAction::Restart, Origin::Button, notifier)
            }
            CallbackToken::Ping => self.outbox.send(
                sender,
                format!("🏓 Pong! {device} is alive and responding to buttons!"),
            ),
            CallbackToken::Help => self.outbox.send(sender, replies::button_help(&device)),
        }
    }

    /// Read-only answers for senders other than the admin.
    fn guest_request(&self, sender: &str, action: &Action) {
        match action {
            Action::Ping => self.outbox.send(sender, replies::GUEST_PONG),
            Action::Help => self.outbox.send(sender, replies::GUEST_HELP),
            Action::Status => self
                .outbox
                .send(sender, replies::guest_status(&self.device_html)),
            other => {
                tracing::warn!(sender = %sender, action = ?other, "Unauthorized command");
                self.outbox.send(sender, replies::UNAUTHORIZED);
            }
        }
    }

    fn message<N: NotificationSink>(&mut self, sender: &str, cmd: &Command, notifier: &mut N) {
        let Some(text) = cmd.args.as_deref() else {
            self.outbox.send(
                sender,
                format!(
                    "ℹ️ Usage: <code>msg {} &lt;text&gt;</code> or <code>msg all &lt;text&gt;</code>",
                    self.device_html
                ),
            );
            return;
        };

        if cmd.is_broadcast() {
            let body = format!("📢 <b>Broadcast</b>\n{}", escape_html(text));
            let mut recipients = 0usize;
            for member in self.registry.members() {
                self.outbox.send(member, body.clone());
                recipients += 1;
            }
            tracing::info!(recipients, "Broadcast queued");
            self.outbox.send(
                sender,
                format!("✅ Broadcast sent to {recipients} subscriber(s)."),
            );
            notifier.enqueue("📢 BROADCAST", text, NotificationStyle::Message);
            return;
        }

        self.outbox
            .send(sender, format!("📨 Message sent to {}", self.device_html));
        notifier.enqueue(
            "📩 NEW MESSAGE",
            &format!("From Admin:\n{text}"),
            NotificationStyle::Message,
        );
    }

    fn popup_test<N: NotificationSink>(&self, sender: &str, origin: Origin, notifier: &mut N) {
        self.outbox
            .send(sender, format!("🧪 Testing popups on {}", self.device_html));
        let sequence: &[PopupStep] = match origin {
            Origin::Typed => {
                notifier.enqueue(
                    "✅ POPUP TEST",
                    "Testing popup system!\nPopups should appear in UPPER RIGHT CORNER\nIf you see this, it's working!",
                    NotificationStyle::Success,
                );
                &replies::COMMAND_TEST_SEQUENCE
            }
            Origin::Button => {
                notifier.enqueue(
                    "✅ BUTTON TEST",
                    "Testing popup system via buttons!\nPopups should appear in UPPER RIGHT CORNER",
                    NotificationStyle::Success,
                );
                &replies::BUTTON_TEST_SEQUENCE
            }
        };
        for (delay_ms, title, message, style) in sequence {
            notifier.enqueue_delayed(Duration::from_millis(*delay_ms), title, message, *style);
        }
    }

    fn popup_demo<N: NotificationSink>(&self, sender: &str, origin: Origin, notifier: &mut N) {
        self.outbox
            .send(sender, format!("🎬 Popup demo on {}", self.device_html));
        match origin {
            Origin::Typed => notifier.enqueue("🎬 DEMO START", "Showing popup demo...", NotificationStyle::Info),
            Origin::Button => notifier.enqueue(
                "🎬 BUTTON DEMO",
                "Showing popup demo via buttons...",
                NotificationStyle::Info,
            ),
        };
        for (i, style) in NotificationStyle::ALL.into_iter().enumerate() {
            let (title, message) = replies::demo_popup(style);
            let delay = Duration::from_millis(replies::DEMO_STEP_MS * i as u64);
            notifier.enqueue_delayed(delay, &title, &message, style);
        }
    }

    fn power_request<N: NotificationSink>(
        &mut self,
        sender: &str,
        action: PowerAction,
        origin: Origin,
        notifier: &mut N,
    ) {
        if let Err(e) = self.power.request(action) {
            tracing::warn!(action = action.as_str(), "Power request refused: {e}");
            self.outbox.send(sender, format!("⏳ Request refused: {e}"));
            return;
        }

        let secs = self.power.grace().as_secs();
        let suffix = match origin {
            Origin::Typed => "",
            Origin::Button => "\nTriggered via button.",
        };
        let device = &self.device_html;
        match action {
            PowerAction::Shutdown => {
                self.outbox
                    .send(sender, format!("🖥️ Shutdown command for {device}"));
                notifier.enqueue(
                    "🖥️ SHUTDOWN",
                    &format!("Computer will shutdown in {secs} seconds!\n\n⚠️ SAVE YOUR WORK NOW!{suffix}"),
                    NotificationStyle::Shutdown,
                );
            }
            PowerAction::Restart => {
                self.outbox
                    .send(sender, format!("🔄 Restart command for {device}"));
                notifier.enqueue(
                    "🔄 RESTART",
                    &format!("Computer will restart in {secs} seconds!\n\n⚠️ SAVE YOUR WORK NOW!{suffix}"),
                    NotificationStyle::Warning,
                );
            }
        }
    }

    fn send_menu(&self, chat_id: &str) {
        self.send_keyboard(chat_id, replies::menu(&self.device_html));
    }

    fn send_keyboard(&self, chat_id: &str, (text, keyboard): (String, InlineKeyboard)) {
        self.outbox.send_with_keyboard(chat_id, text, keyboard);
    }
}

#[cfg(test)]
mod tests;
