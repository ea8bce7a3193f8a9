use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::models::ApiResponse;
use super::*;

impl BotApiClient {
    /// Create a client for `token` against `api_base` (normally [`DEFAULT_API_BASE`]).
    pub fn new(api_base: &str, token: &str) -> Result<Self, BotError> {
        let base = Url::parse(api_base.trim().trim_end_matches('/'))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(BotError::InvalidBaseUrl(format!(
                "unsupported scheme '{}'",
                base.scheme()
            )));
        }
        if token.trim().is_empty() {
            return Err(BotError::InvalidBaseUrl("bot token is empty".into()));
        }
        // Built textually: the token contains ':' and would parse as a scheme via `join`.
        let endpoint = Url::parse(&format!(
            "{}/bot{}/",
            base.as_str().trim_end_matches('/'),
            token.trim()
        ))?;

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
        })
    }

    /// Call a Bot API method, retrying transient failures.
    pub(super) async fn call<B, T>(
        &self,
        method: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T, BotError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint.join(method)?;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.call_once(url.clone(), body, timeout).await {
                Ok(result) => return Ok(result),
                Err(err) if err.is_transient() && attempt < MAX_ATTEMPTS => {
                    let delay = err.retry_after().unwrap_or_else(|| retry_delay(attempt));
                    tracing::warn!(
                        method,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Telegram request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn call_once<B, T>(&self, url: Url, body: &B, timeout: Duration) -> Result<T, BotError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .http
            .post(url)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(BotError::http)?;

        let status = resp.status();
        let text = resp.text().await.map_err(BotError::http)?;
        parse_envelope(status.as_u16(), &text)
    }
}

/// Decode the `{ok, result, ...}` envelope, mapping failures to [`BotError::Api`].
pub(crate) fn parse_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, BotError> {
    let envelope: ApiResponse<T> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) if (200..300).contains(&status) => return Err(BotError::Json(e)),
        Err(_) => {
            return Err(BotError::Api {
                code: status,
                description: body.chars().take(200).collect(),
                retry_after: None,
            });
        }
    };

    match envelope {
        ApiResponse {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        other => Err(BotError::Api {
            code: other.error_code.unwrap_or(status),
            description: other
                .description
                .unwrap_or_else(|| "response without result".to_string()),
            retry_after: other.parameters.and_then(|p| p.retry_after),
        }),
    }
}
