//! Background long-poll loop feeding the inbox.
//!
//! The watermark (highest update id handed to the inbox) lives only here.
//! Every request asks for updates strictly after it, and anything at or below
//! it that the channel returns anyway is dropped before the push.

use std::future::Future;
use std::time::Duration;

use telegram_client::{BotApiClient, BotError, Update};
use tokio_util::sync::CancellationToken;

use crate::background::sleep_or_cancel;
use crate::inbox::InboxSender;

const BASE_BACKOFF: Duration = Duration::from_secs(1);

/// Where updates come from. Implemented by the Bot API client; tests script it.
pub trait UpdateSource: Send + Sync + 'static {
    fn get_updates(
        &self,
        after_id: i64,
        wait_secs: u64,
    ) -> impl Future<Output = Result<Vec<Update>, BotError>> + Send;
}

impl UpdateSource for BotApiClient {
    fn get_updates(
        &self,
        after_id: i64,
        wait_secs: u64,
    ) -> impl Future<Output = Result<Vec<Update>, BotError>> + Send {
        BotApiClient::get_updates(self, after_id, wait_secs)
    }
}

pub struct UpdateFetcher<S> {
    source: S,
    watermark: i64,
    wait_secs: u64,
    max_backoff: Duration,
}

impl<S: UpdateSource> UpdateFetcher<S> {
    pub fn new(source: S, wait_secs: u64, max_backoff: Duration) -> Self {
        Self {
            source,
            watermark: 0,
            wait_secs,
            max_backoff: max_backoff.max(BASE_BACKOFF),
        }
    }

    pub fn with_watermark(mut self, watermark: i64) -> Self {
        self.watermark = watermark;
        self
    }

    pub fn watermark(&self) -> i64 {
        self.watermark
    }

    /// One poll: request updates after the watermark, drop stale ids, advance.
    ///
    /// Returns the accepted updates in received order.
    pub async fn fetch_batch(&mut self) -> Result<Vec<Update>, BotError> {
        let batch = self
            .source
            .get_updates(self.watermark, self.wait_secs)
            .await?;
        Ok(self.accept(batch))
    }

    fn accept(&mut self, batch: Vec<Update>) -> Vec<Update> {
        let floor = self.watermark;
        let (fresh, stale): (Vec<Update>, Vec<Update>) =
            batch.into_iter().partition(|u| u.id > floor);
        if !stale.is_empty() {
            tracing::debug!(dropped = stale.len(), watermark = floor, "Dropped already-seen updates");
        }
        if let Some(max_id) = fresh.iter().map(|u| u.id).max() {
            self.watermark = self.watermark.max(max_id);
        }
        fresh
    }

    /// Poll until `shutdown` fires or the inbox consumer goes away.
    pub async fn run(mut self, inbox: InboxSender, shutdown: CancellationToken) {
        let mut failures: u32 = 0;
        tracing::info!(watermark = self.watermark, "Update fetcher started");

        loop {
            let result = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.fetch_batch() => result,
            };

            match result {
                Ok(batch) => {
                    if failures > 0 {
                        tracing::info!(failures, "Update polling recovered");
                    }
                    failures = 0;
                    if batch.is_empty() {
                        continue;
                    }
                    tracing::debug!(
                        count = batch.len(),
                        watermark = self.watermark,
                        "Fetched updates"
                    );
                    if inbox.push(batch).is_err() {
                        tracing::info!("Inbox closed, stopping update fetcher");
                        return;
                    }
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let backoff = backoff_duration(failures, self.max_backoff);
                    tracing::warn!(
                        error = %e, attempt = failures,
                        backoff_secs = backoff.as_secs(),
                        "Polling updates failed, will retry"
                    );
                    if sleep_or_cancel(&shutdown, backoff).await {
                        break;
                    }
                }
            }
        }
        tracing::info!(watermark = self.watermark, "Update fetcher stopped");
    }
}

/// 1s, 2s, 4s, ... capped at `max`.
fn backoff_duration(failures: u32, max: Duration) -> Duration {
    let d = BASE_BACKOFF.saturating_mul(2u32.saturating_pow(failures.saturating_sub(1)));
    d.min(max)
}
