//! Outbound message queue and its delivery worker.
//!
//! The cooperative loop never awaits the network: replies, broadcasts and
//! callback acknowledgements are queued here and delivered in order by a single
//! worker task. A failed delivery is logged and the worker moves on.

use std::future::Future;

use telegram_client::{BotApiClient, BotError, InlineKeyboard};
use tokio::sync::mpsc;

/// Sending side of the messaging channel.
pub trait Messenger: Send + Sync + 'static {
    fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> impl Future<Output = Result<(), BotError>> + Send;

    fn acknowledge_callback(&self, query_id: &str)
    -> impl Future<Output = Result<(), BotError>> + Send;
}

impl Messenger for BotApiClient {
    fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> impl Future<Output = Result<(), BotError>> + Send {
        BotApiClient::send_message(self, chat_id, text, keyboard)
    }

    fn acknowledge_callback(
        &self,
        query_id: &str,
    ) -> impl Future<Output = Result<(), BotError>> + Send {
        self.answer_callback_query(query_id)
    }
}

/// One queued delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Message {
        chat_id: String,
        text: String,
        keyboard: Option<InlineKeyboard>,
    },
    Ack {
        query_id: String,
    },
}

/// Create a connected outbox pair.
pub fn channel() -> (Outbox, OutboxReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Outbox { tx }, OutboxReceiver { rx })
}

/// Cheap clonable handle for queuing deliveries.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl Outbox {
    pub fn send(&self, chat_id: &str, text: impl Into<String>) {
        self.enqueue(Outbound::Message {
            chat_id: chat_id.to_string(),
            text: text.into(),
            keyboard: None,
        });
    }

    pub fn send_with_keyboard(&self, chat_id: &str, text: impl Into<String>, keyboard: InlineKeyboard) {
        self.enqueue(Outbound::Message {
            chat_id: chat_id.to_string(),
            text: text.into(),
            keyboard: Some(keyboard),
        });
    }

    pub fn acknowledge(&self, query_id: &str) {
        self.enqueue(Outbound::Ack {
            query_id: query_id.to_string(),
        });
    }

    fn enqueue(&self, item: Outbound) {
        if self.tx.send(item).is_err() {
            tracing::warn!("Outbox worker has stopped, dropping outbound message");
        }
    }
}

#[derive(Debug)]
pub struct OutboxReceiver {
    rx: mpsc::UnboundedReceiver<Outbound>,
}

impl OutboxReceiver {
    pub async fn recv(&mut self) -> Option<Outbound> {
        self.rx.recv().await
    }

    /// Everything queued so far, oldest first.
    pub fn drain_nonblocking(&mut self) -> Vec<Outbound> {
        let mut items = Vec::new();
        while let Ok(item) = self.rx.try_recv() {
            items.push(item);
        }
        items
    }
}

/// Deliver queued items until every [`Outbox`] handle is dropped.
pub async fn run_outbox_worker<M: Messenger>(mut rx: OutboxReceiver, messenger: M) {
    let mut delivered: u64 = 0;
    let mut failed: u64 = 0;

    while let Some(item) = rx.recv().await {
        let result = match &item {
            Outbound::Message {
                chat_id,
                text,
                keyboard,
            } => messenger.send_message(chat_id, text, keyboard.as_ref()).await,
            Outbound::Ack { query_id } => messenger.acknowledge_callback(query_id).await,
        };
        match result {
            Ok(()) => delivered += 1,
            Err(e) => {
                failed += 1;
                match &item {
                    Outbound::Message { chat_id, .. } => {
                        tracing::warn!(chat_id = %chat_id, error = %e, "Failed to send message");
                    }
                    Outbound::Ack { query_id } => {
                        tracing::warn!(query_id = %query_id, error = %e, "Failed to acknowledge callback");
                    }
                }
            }
        }
    }
    tracing::info!(delivered, failed, "Outbox worker stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct RecordingMessenger {
        sent: Arc<Mutex<Vec<String>>>,
        fail_for: Option<String>,
    }

    impl Messenger for RecordingMessenger {
        async fn send_message(
            &self,
            chat_id: &str,
            text: &str,
            _keyboard: Option<&InlineKeyboard>,
        ) -> Result<(), BotError> {
            if self.fail_for.as_deref() == Some(chat_id) {
                return Err(BotError::Api {
                    code: 403,
                    description: "Forbidden: bot was blocked by the user".into(),
                    retry_after: None,
                });
            }
            self.sent.lock().unwrap().push(format!("{chat_id}:{text}"));
            Ok(())
        }

        async fn acknowledge_callback(&self, query_id: &str) -> Result<(), BotError> {
            self.sent.lock().unwrap().push(format!("ack:{query_id}"));
            Ok(())
        }
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn worker_delivers_in_order_and_survives_failures() {
        let messenger = RecordingMessenger {
            fail_for: Some("blocked".into()),
            ..Default::default()
        };
        let sent = messenger.sent.clone();
        let (outbox, rx) = channel();

        outbox.acknowledge("q1");
        outbox.send("1", "first");
        outbox.send("blocked", "lost");
        outbox.send("2", "second");
        drop(outbox);

        run_outbox_worker(rx, messenger).await;
        assert_eq!(
            *sent.lock().unwrap(),
            vec!["ack:q1", "1:first", "2:second"]
        );
    }

    #[test]
    fn drain_returns_queued_items() {
        let (outbox, mut rx) = channel();
        outbox.send_with_keyboard(
            "1",
            "menu",
            InlineKeyboard::from_buttons([telegram_client::Button::new("Ping", "ping")]),
        );
        let items = rx.drain_nonblocking();
        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], Outbound::Message { keyboard: Some(_), .. }));
    }

    #[test]
    fn enqueue_after_worker_exit_does_not_panic() {
        let (outbox, rx) = channel();
        drop(rx);
        outbox.send("1", "nobody listens");
    }
}
