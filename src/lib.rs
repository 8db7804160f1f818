pub mod config;
pub mod exporters;
pub mod processors;
pub mod receivers;

// Re-exports for public API
pub use config::{Config, ConfigError};
pub use exporters::loki::{LokiClient, LokiError, LokiPushRequest, LokiStream, PushOutcome};
pub use processors::{RecordOutcome, SkipReason, StreamLabels, Template, TransformedRecord};
pub use receivers::cloudwatch::{
    CloudWatchLogsEvent, DecodeError, InvocationSummary, LogBatch, LogRecord, ShipperError,
};
