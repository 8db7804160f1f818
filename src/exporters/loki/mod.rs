mod client;
pub mod transform;

pub use client::{LokiClient, LokiError, PushOutcome};
pub use transform::{assemble_streams, LokiPushRequest, LokiStream};
