use serde::Serialize;

use crate::processors::logs::{StreamLabels, TransformedRecord};

/// Loki Push API request format.
/// POST /loki/api/v1/push
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct LokiPushRequest {
    pub streams: Vec<LokiStream>,
}

impl LokiPushRequest {
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

/// A label set with its timestamped values.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct LokiStream {
    pub stream: StreamLabels,
    pub values: Vec<[String; 2]>,
}

/// Convert a millisecond timestamp to Loki's nanosecond string.
pub fn timestamp_ns(timestamp_ms: i64) -> String {
    (i128::from(timestamp_ms) * 1_000_000).to_string()
}

/// Build the push request, one stream per record.
///
/// Records sharing a label set are not merged: each gets its own stream
/// entry holding a single value, in input order.
pub fn assemble_streams(records: &[TransformedRecord]) -> LokiPushRequest {
    LokiPushRequest {
        streams: records
            .iter()
            .map(|record| LokiStream {
                stream: record.labels.clone(),
                values: vec![[timestamp_ns(record.timestamp_ms), record.line.clone()]],
            })
            .collect(),
    }
}
