//! Channel-agnostic view of an inbound update.

use crate::api::models::WireUpdate;

/// An inbound update. Immutable once received; `id` is the ordering key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub id: i64,
    pub sender_id: String,
    pub kind: UpdateKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    /// Free text typed by the sender.
    Message { text: String },
    /// An inline button press. `query_id` must be acknowledged.
    ButtonCallback { token: String, query_id: String },
    /// Anything without text or callback data (stickers, edits, joins).
    Unsupported,
}

impl Update {
    pub fn message(id: i64, sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            sender_id: sender_id.into(),
            kind: UpdateKind::Message { text: text.into() },
        }
    }

    pub fn callback(
        id: i64,
        sender_id: impl Into<String>,
        token: impl Into<String>,
        query_id: impl Into<String>,
    ) -> Self {
        Self {
            id,
            sender_id: sender_id.into(),
            kind: UpdateKind::ButtonCallback {
                token: token.into(),
                query_id: query_id.into(),
            },
        }
    }
}

impl From<WireUpdate> for Update {
    fn from(wire: WireUpdate) -> Self {
        let id = wire.update_id;

        if let Some(query) = wire.callback_query {
            // Replies go to the chat that carried the keyboard; the presser's
            // user id only identifies private chats.
            let sender_id = query
                .message
                .as_ref()
                .map(|m| m.chat.id)
                .unwrap_or(query.from.id)
                .to_string();
            return match query.data.filter(|d| !d.is_empty()) {
                Some(token) => Self {
                    id,
                    sender_id,
                    kind: UpdateKind::ButtonCallback {
                        token,
                        query_id: query.id,
                    },
                },
                None => Self {
                    id,
                    sender_id,
                    kind: UpdateKind::Unsupported,
                },
            };
        }

        if let Some(message) = wire.message {
            let sender_id = message.chat.id.to_string();
            let text = message.text.as_deref().map(str::trim).unwrap_or_default();
            if !text.is_empty() {
                return Self {
                    id,
                    sender_id,
                    kind: UpdateKind::Message {
                        text: text.to_string(),
                    },
                };
            }
            return Self {
                id,
                sender_id,
                kind: UpdateKind::Unsupported,
            };
        }

        Self {
            id,
            sender_id: String::new(),
            kind: UpdateKind::Unsupported,
        }
    }
}
