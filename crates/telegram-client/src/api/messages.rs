use super::models::{AnswerCallbackQueryRequest, SendMessageRequest};
use super::*;
use crate::InlineKeyboard;

impl BotApiClient {
    /// Send an HTML-formatted message to a chat, optionally with inline buttons.
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), BotError> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "HTML",
            reply_markup: keyboard,
        };
        let _: serde_json::Value = self.call("sendMessage", &request, SEND_TIMEOUT).await?;
        Ok(())
    }

    /// Clear the loading state of a pressed inline button.
    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), BotError> {
        let request = AnswerCallbackQueryRequest { callback_query_id };
        let _: bool = self
            .call("answerCallbackQuery", &request, ACK_TIMEOUT)
            .await?;
        Ok(())
    }
}
