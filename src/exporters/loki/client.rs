use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use super::transform::LokiPushRequest;

#[derive(Error, Debug)]
pub enum LokiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Loki returned error: {status} - {body}")]
    LokiResponse { status: u16, body: String },
}

/// Result of a push attempt. Never retried.
#[derive(Debug)]
pub enum PushOutcome {
    /// Loki answered 204
    Delivered,
    /// Nothing to send
    Empty,
    Failed(LokiError),
}

impl PushOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, PushOutcome::Delivered)
    }
}

pub struct LokiClient {
    client: Client,
    push_url: Url,
}

impl LokiClient {
    /// `push_url` is the full push endpoint, see [`crate::config::push_url`].
    pub fn new(client: Client, push_url: Url) -> Self {
        Self { client, push_url }
    }

    /// Send the request once. Failures are logged and returned, not raised.
    pub async fn push(&self, request: &LokiPushRequest) -> PushOutcome {
        if request.is_empty() {
            debug!("No streams to push");
            return PushOutcome::Empty;
        }

        let streams = request.streams.len();
        info!(url = %self.push_url, streams, "Pushing logs to Loki");

        match self.send_push_request(request).await {
            Ok(()) => {
                debug!(streams, "Loki accepted push");
                PushOutcome::Delivered
            }
            Err(e) => {
                error!(error = %e, streams, "Loki push failed, logs lost");
                PushOutcome::Failed(e)
            }
        }
    }

    async fn send_push_request(&self, request: &LokiPushRequest) -> Result<(), LokiError> {
        let response = self
            .client
            .post(self.push_url.clone())
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(LokiError::LokiResponse {
                status: status.as_u16(),
                body,
            })
        }
    }
}
