use std::sync::{Arc, Mutex};

use subscriber_store::MemoryStore;

use super::*;
use crate::notification::NotificationId;
use crate::outbox::{self, Outbound, OutboxReceiver};
use crate::power::{PowerError, PowerExecutor};

const ADMIN: &str = "100";
const DEVICE: &str = "Office";

#[derive(Default)]
struct RecordingSink {
    shown: Vec<(String, String, NotificationStyle)>,
    delayed: Vec<(Duration, String, NotificationStyle)>,
}

impl NotificationSink for RecordingSink {
    fn enqueue(&mut self, title: &str, message: &str, style: NotificationStyle) -> NotificationId {
        self.shown.push((title.to_string(), message.to_string(), style));
        self.shown.len() as NotificationId
    }

    fn enqueue_delayed(
        &mut self,
        delay: Duration,
        title: &str,
        _message: &str,
        style: NotificationStyle,
    ) {
        self.delayed.push((delay, title.to_string(), style));
    }
}

#[derive(Default)]
struct NoopExecutor {
    calls: Mutex<u32>,
}

impl PowerExecutor for NoopExecutor {
    fn execute(&self, _action: PowerAction) -> Result<(), PowerError> {
        *self.calls.lock().unwrap() += 1;
        Ok(())
    }
}

struct Harness {
    dispatcher: Dispatcher,
    rx: OutboxReceiver,
    sink: RecordingSink,
    store: MemoryStore,
}

impl Harness {
    fn new(subscribers: &[&str]) -> Self {
        let store = MemoryStore::with_subscribers(subscribers.iter().copied());
        let registry = SubscriberRegistry::open(Box::new(store.clone()), ADMIN).unwrap();
        let (outbox, rx) = outbox::channel();
        let power = PowerScheduler::new(Arc::new(NoopExecutor::default()), Duration::from_secs(5));
        Self {
            dispatcher: Dispatcher::new(ADMIN, DEVICE, registry, outbox, power),
            rx,
            sink: RecordingSink::default(),
            store,
        }
    }

    fn message(&mut self, id: i64, sender: &str, text: &str) {
        self.dispatcher
            .dispatch(Update::message(id, sender, text), &mut self.sink);
    }

    fn press(&mut self, id: i64, sender: &str, token: &str) {
        let query = format!("q{id}");
        self.dispatcher
            .dispatch(Update::callback(id, sender, token, query), &mut self.sink);
    }

    /// (chat_id, text) of queued messages; acks rendered as ("ack", query_id).
    fn sent(&mut self) -> Vec<(String, String)> {
        self.rx
            .drain_nonblocking()
            .into_iter()
            .map(|item| match item {
                Outbound::Message { chat_id, text, .. } => (chat_id, text),
                Outbound::Ack { query_id } => ("ack".to_string(), query_id),
            })
            .collect()
    }
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn guest_scenario_ping_unknown_start() {
    let mut h = Harness::new(&[]);
    h.dispatcher.dispatch_batch(
        vec![
            Update::message(101, "S", "ping"),
            Update::message(102, "S", "format office"),
            Update::message(103, "S", "/start"),
        ],
        &mut h.sink,
    );

    assert!(h.dispatcher.registry().contains("S"));
    assert_eq!(h.store.snapshot(), vec!["100", "S"]);
    assert_eq!(h.dispatcher.last_processed(), 103);
    assert_eq!(
        h.sent(),
        vec![
            ("S".to_string(), replies::GUEST_PONG.to_string()),
            ("S".to_string(), replies::UNAUTHORIZED.to_string()),
            ("S".to_string(), replies::SUBSCRIBED.to_string()),
        ]
    );
    assert!(h.sink.shown.is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn duplicate_and_older_ids_are_skipped() {
    let mut h = Harness::new(&[]);
    h.message(5, ADMIN, "ping");
    h.message(5, ADMIN, "ping");
    h.message(4, ADMIN, "ping");
    assert_eq!(h.sent().len(), 1);
    assert_eq!(h.dispatcher.last_processed(), 5);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn dispatch_order_follows_ids_across_batches() {
    let mut h = Harness::new(&[]);
    h.dispatcher.dispatch_batch(
        vec![Update::message(1, ADMIN, "ping"), Update::message(2, ADMIN, "help")],
        &mut h.sink,
    );
    h.dispatcher.dispatch_batch(
        vec![Update::message(2, ADMIN, "ping"), Update::message(3, ADMIN, "zzz")],
        &mut h.sink,
    );
    let texts: Vec<String> = h.sent().into_iter().map(|(_, t)| t).collect();
    assert_eq!(texts.len(), 3);
    assert!(texts[0].starts_with("🏓 Pong!"));
    assert!(texts[1].contains("Control Bot"));
    assert_eq!(texts[2], "❌ Unknown command: zzz");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn guest_shutdown_is_denied_without_power_action() {
    let mut h = Harness::new(&[]);
    h.message(1, "777", "shutdown office");
    assert_eq!(
        h.sent(),
        vec![("777".to_string(), replies::UNAUTHORIZED.to_string())]
    );
    assert_eq!(h.dispatcher.power().pending(), None);
    assert!(h.sink.shown.is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn guest_button_press_is_denied() {
    let mut h = Harness::new(&[]);
    h.press(1, "777", "shutdown_now");
    assert_eq!(
        h.sent(),
        vec![
            ("ack".to_string(), "q1".to_string()),
            ("777".to_string(), replies::UNAUTHORIZED.to_string()),
        ]
    );
    assert_eq!(h.dispatcher.power().pending(), None);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn admin_broadcast_reaches_every_subscriber_once() {
    let mut h = Harness::new(&["300", "200"]);
    h.message(1, ADMIN, "msg all hello <world>");

    let sent = h.sent();
    let broadcasts: Vec<&String> = sent
        .iter()
        .filter(|(_, text)| text.starts_with("📢"))
        .map(|(chat, _)| chat)
        .collect();
    assert_eq!(broadcasts, vec!["100", "200", "300"]);
    assert_eq!(sent[0].1, "📢 <b>Broadcast</b>\nhello &lt;world&gt;");

    let confirmations: Vec<&(String, String)> =
        sent.iter().filter(|(_, t)| t.starts_with("✅")).collect();
    assert_eq!(
        confirmations,
        vec![&(ADMIN.to_string(), "✅ Broadcast sent to 3 subscriber(s).".to_string())]
    );
    assert_eq!(sent.len(), 4);

    assert_eq!(h.sink.shown.len(), 1);
    assert_eq!(h.sink.shown[0].1, "hello <world>");
    assert_eq!(h.sink.shown[0].2, NotificationStyle::Message);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn admin_direct_message_shows_locally() {
    let mut h = Harness::new(&[]);
    h.message(1, ADMIN, "msg OFFICE see you at 5");
    assert_eq!(
        h.sent(),
        vec![(ADMIN.to_string(), "📨 Message sent to Office".to_string())]
    );
    assert_eq!(
        h.sink.shown,
        vec![(
            "📩 NEW MESSAGE".to_string(),
            "From Admin:\nsee you at 5".to_string(),
            NotificationStyle::Message
        )]
    );
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn msg_without_text_replies_with_usage() {
    let mut h = Harness::new(&[]);
    h.message(1, ADMIN, "msg office");
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("Usage"));
    assert!(h.sink.shown.is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn per_device_commands_need_matching_target() {
    let mut h = Harness::new(&[]);
    h.message(1, ADMIN, "warning laptop");
    h.message(2, ADMIN, "warning");
    h.message(3, ADMIN, "status");
    assert!(h.sent().is_empty());
    assert!(h.sink.shown.is_empty());

    h.message(4, ADMIN, "warning all");
    h.message(5, ADMIN, "alert office");
    assert_eq!(h.sent().len(), 2);
    let styles: Vec<NotificationStyle> = h.sink.shown.iter().map(|s| s.2).collect();
    assert_eq!(styles, vec![NotificationStyle::Warning, NotificationStyle::Error]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn ping_help_demo_need_no_target() {
    let mut h = Harness::new(&[]);
    h.message(1, ADMIN, "ping");
    h.message(2, ADMIN, "help");
    h.message(3, ADMIN, "demo");
    assert_eq!(h.sent().len(), 3);
    assert_eq!(h.sink.shown.len(), 1);
    assert_eq!(h.sink.delayed.len(), 6);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn unknown_admin_command_ignores_target_filter() {
    let mut h = Harness::new(&[]);
    h.message(1, ADMIN, "/<b>oops laptop");
    assert_eq!(
        h.sent(),
        vec![(ADMIN.to_string(), "❌ Unknown command: &lt;b&gt;oops".to_string())]
    );
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_command_schedules_staggered_popups() {
    let mut h = Harness::new(&[]);
    h.message(1, ADMIN, "test office");
    assert_eq!(h.sink.shown.len(), 1);
    assert_eq!(h.sink.shown[0].2, NotificationStyle::Success);
    let delayed: Vec<(u128, NotificationStyle)> = h
        .sink
        .delayed
        .iter()
        .map(|(d, _, s)| (d.as_millis(), *s))
        .collect();
    assert_eq!(
        delayed,
        vec![
            (500, NotificationStyle::Info),
            (1000, NotificationStyle::Warning),
            (1500, NotificationStyle::Success),
        ]
    );
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn demo_shows_every_style_every_800ms() {
    let mut h = Harness::new(&[]);
    h.press(1, ADMIN, "demo");
    let delays: Vec<u128> = h.sink.delayed.iter().map(|(d, _, _)| d.as_millis()).collect();
    assert_eq!(delays, vec![0, 800, 1600, 2400, 3200, 4000]);
    let styles: Vec<NotificationStyle> = h.sink.delayed.iter().map(|(_, _, s)| *s).collect();
    assert_eq!(styles, NotificationStyle::ALL.to_vec());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn admin_shutdown_schedules_once() {
    let mut h = Harness::new(&[]);
    h.message(1, ADMIN, "shutdown office");
    assert_eq!(h.dispatcher.power().pending(), Some(PowerAction::Shutdown));
    assert_eq!(h.sink.shown.len(), 1);
    assert_eq!(h.sink.shown[0].2, NotificationStyle::Shutdown);
    assert!(h.sink.shown[0].1.contains("in 5 seconds"));

    h.press(2, ADMIN, "restart_now");
    assert_eq!(h.dispatcher.power().pending(), Some(PowerAction::Shutdown));
    assert_eq!(h.sink.shown.len(), 1);
    let sent = h.sent();
    assert!(sent.last().unwrap().1.starts_with("⏳"));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn callbacks_are_acknowledged_before_handling() {
    let mut h = Harness::new(&[]);
    h.press(1, ADMIN, "ping");
    h.press(2, ADMIN, "self_destruct");
    assert_eq!(
        h.sent(),
        vec![
            ("ack".to_string(), "q1".to_string()),
            (
                ADMIN.to_string(),
                "🏓 Pong! Office is alive and responding to buttons!".to_string()
            ),
            ("ack".to_string(), "q2".to_string()),
        ]
    );
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn menu_navigation_sends_keyboards() {
    let mut h = Harness::new(&[]);
    h.message(1, ADMIN, "/start");
    h.press(2, ADMIN, "send_msg");
    h.press(3, ADMIN, "shutdown_confirm");

    let items = h.rx.drain_nonblocking();
    let keyboards: Vec<usize> = items
        .iter()
        .filter_map(|item| match item {
            Outbound::Message {
                keyboard: Some(k), ..
            } => Some(k.buttons().count()),
            _ => None,
        })
        .collect();
    assert_eq!(keyboards, vec![10, 5, 2]);
    assert_eq!(h.dispatcher.power().pending(), None);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn guest_menu_and_status() {
    let mut h = Harness::new(&[]);
    h.message(1, "555", "/menu");
    h.message(2, "555", "status");
    let sent = h.sent();
    assert_eq!(sent[0].1, replies::MENU_UNAUTHORIZED);
    assert!(sent[1].1.starts_with("<b>Office</b> is online."));
    assert!(!sent[1].1.contains("OS:"));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn unsupported_updates_only_advance_last_processed() {
    let mut h = Harness::new(&[]);
    h.dispatcher.dispatch(
        Update {
            id: 9,
            sender_id: "555".into(),
            kind: UpdateKind::Unsupported,
        },
        &mut h.sink,
    );
    assert_eq!(h.dispatcher.last_processed(), 9);
    assert!(h.sent().is_empty());
    assert!(!h.dispatcher.registry().contains("555"));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn failing_store_does_not_stop_dispatch() {
    let mut h = Harness::new(&[]);
    h.store.set_fail_saves(true);
    h.message(1, "555", "ping");
    assert!(h.dispatcher.registry().contains("555"));
    assert_eq!(h.sent().len(), 1);
}
