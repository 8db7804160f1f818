pub mod logs;
pub mod template;

pub use logs::{
    transform_batch, transform_record, RecordOutcome, SkipReason, StreamLabels, TransformedRecord,
};
pub use template::Template;
