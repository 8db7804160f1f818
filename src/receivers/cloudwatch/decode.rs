use std::io::{Read, Write};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

use super::event::{AwsLogs, CloudWatchLogsEvent, LogBatch};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Failed to decompress payload: {0}")]
    Gzip(#[from] std::io::Error),

    #[error("Invalid log batch JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode the `awslogs.data` envelope: base64, then gzip, then JSON.
pub fn decode_batch(event: &CloudWatchLogsEvent) -> Result<LogBatch, DecodeError> {
    decode_data(&event.aws_logs.data)
}

pub fn decode_data(data: &str) -> Result<LogBatch, DecodeError> {
    let compressed = STANDARD.decode(data.trim())?;

    let mut json = Vec::new();
    GzDecoder::new(compressed.as_slice()).read_to_end(&mut json)?;

    Ok(serde_json::from_slice(&json)?)
}

/// Build an envelope the way CloudWatch does. Inverse of [`decode_batch`].
pub fn encode_batch(batch: &LogBatch) -> Result<CloudWatchLogsEvent, DecodeError> {
    let json = serde_json::to_vec(batch)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;

    Ok(CloudWatchLogsEvent {
        aws_logs: AwsLogs {
            data: STANDARD.encode(compressed),
        },
    })
}
