mod decode;
mod event;
mod handler;

pub use decode::{decode_batch, decode_data, encode_batch, DecodeError};
pub use event::{AwsLogs, CloudWatchLogsEvent, LogBatch, LogRecord};
pub use handler::{build_push_request, handle_logs, run_invocation, InvocationSummary, ShipperError};
