use reqwest::Client;
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::{Config, ConfigError};
use crate::exporters::loki::{assemble_streams, LokiClient, LokiPushRequest};
use crate::processors::logs::transform_batch;

use super::decode::{decode_batch, DecodeError};
use super::event::{CloudWatchLogsEvent, LogBatch};

/// Errors that fail the whole invocation.
#[derive(Error, Debug)]
pub enum ShipperError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSummary {
    pub log_group: String,
    pub received: usize,
    pub emitted: usize,
    pub skipped: usize,
    pub delivered: bool,
}

/// Decoded batch → Loki push request.
pub fn build_push_request(batch: &LogBatch, config: &Config) -> LokiPushRequest {
    let records = transform_batch(batch, config);
    assemble_streams(&records)
}

/// Lambda entry: read configuration from the environment, then ship the batch.
pub async fn run_invocation(
    http: &Client,
    event: CloudWatchLogsEvent,
) -> Result<InvocationSummary, ShipperError> {
    let config = Config::from_env()?;
    config.print_config();

    let client = LokiClient::new(http.clone(), config.loki_endpoint.clone());
    handle_logs(event, &config, &client).await
}

/// Process one subscription event.
///
/// Only a malformed envelope is an error; the push outcome does not affect
/// the result.
#[instrument(skip_all)]
pub async fn handle_logs(
    event: CloudWatchLogsEvent,
    config: &Config,
    client: &LokiClient,
) -> Result<InvocationSummary, ShipperError> {
    let batch = decode_batch(&event)?;
    let received = batch.log_events.len();

    if batch.is_control_message() {
        info!(records = received, "Received CloudWatch control message, nothing to push");
        return Ok(InvocationSummary {
            log_group: batch.log_group,
            received,
            emitted: 0,
            skipped: received,
            delivered: false,
        });
    }

    info!(log_group = %batch.log_group, records = received, "Processing log batch");

    let request = build_push_request(&batch, config);
    let emitted = request.streams.len();
    let delivered = client.push(&request).await.is_delivered();

    info!(
        log_group = %batch.log_group,
        received,
        emitted,
        skipped = received - emitted,
        delivered,
        "Log batch processing complete"
    );

    Ok(InvocationSummary {
        log_group: batch.log_group,
        received,
        emitted,
        skipped: received - emitted,
        delivered,
    })
}
