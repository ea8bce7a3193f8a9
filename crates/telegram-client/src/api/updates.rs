use super::models::{GetUpdatesRequest, WireUpdate};
use super::*;
use crate::Update;

const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

impl BotApiClient {
    /// Long-poll for updates with id strictly greater than `after_id`.
    ///
    /// The server holds the request open for up to `wait_secs` when no update
    /// is pending. Passing `after_id + 1` as offset also confirms everything up
    /// to `after_id` on the server side.
    pub async fn get_updates(&self, after_id: i64, wait_secs: u64) -> Result<Vec<Update>, BotError> {
        let request = GetUpdatesRequest {
            offset: after_id.saturating_add(1),
            timeout: wait_secs,
            allowed_updates: ALLOWED_UPDATES,
        };
        let timeout = Duration::from_secs(wait_secs) + POLL_TIMEOUT_SLACK;
        let wire: Vec<WireUpdate> = self.call("getUpdates", &request, timeout).await?;

        tracing::debug!(count = wire.len(), after_id, "getUpdates returned");
        Ok(wire.into_iter().map(Update::from).collect())
    }
}
