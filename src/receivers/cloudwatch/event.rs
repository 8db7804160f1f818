use serde::{Deserialize, Serialize};

/// CloudWatch Logs subscription event as delivered to the Lambda.
///
/// See: https://docs.aws.amazon.com/AmazonCloudWatch/latest/logs/SubscriptionFilters.html
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CloudWatchLogsEvent {
    #[serde(rename = "awslogs")]
    pub aws_logs: AwsLogs,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AwsLogs {
    /// Base64-encoded, gzip-compressed JSON [`LogBatch`]
    pub data: String,
}

/// Decoded payload of a subscription event.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogBatch {
    /// "DATA_MESSAGE" for log data, "CONTROL_MESSAGE" for reachability checks
    #[serde(default)]
    pub message_type: Option<String>,

    /// AWS account ID of the originating log data
    #[serde(default)]
    pub owner: Option<String>,

    pub log_group: String,

    #[serde(default)]
    pub log_stream: Option<String>,

    #[serde(default)]
    pub subscription_filters: Vec<String>,

    #[serde(default)]
    pub log_events: Vec<LogRecord>,
}

impl LogBatch {
    /// CloudWatch sends a control message when a subscription is created.
    pub fn is_control_message(&self) -> bool {
        self.message_type.as_deref() == Some("CONTROL_MESSAGE")
    }
}

/// A single CloudWatch log event.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LogRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Unix timestamp in milliseconds
    pub timestamp: i64,

    pub message: String,
}
