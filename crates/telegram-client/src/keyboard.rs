//! Inline keyboard markup attached to outgoing messages.

use serde::Serialize;

/// A single inline button. `data` comes back as the callback token when pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub text: String,
    #[serde(rename = "callback_data")]
    pub data: String,
}

impl Button {
    pub fn new(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: data.into(),
        }
    }
}

/// `reply_markup` payload for `sendMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<Button>>,
}

impl InlineKeyboard {
    pub const BUTTONS_PER_ROW: usize = 2;

    /// Lay buttons out left to right, two per row.
    pub fn from_buttons(buttons: impl IntoIterator<Item = Button>) -> Self {
        let mut rows: Vec<Vec<Button>> = Vec::new();
        for button in buttons {
            match rows.last_mut() {
                Some(row) if row.len() < Self::BUTTONS_PER_ROW => row.push(button),
                _ => rows.push(vec![button]),
            }
        }
        Self {
            inline_keyboard: rows,
        }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.inline_keyboard.iter().flatten()
    }
}
