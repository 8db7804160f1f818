use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::receivers::cloudwatch::{LogBatch, LogRecord};

/// Label name always present on every stream.
pub const LOG_GROUP_LABEL: &str = "logGroup";

/// Loki stream labels, accumulated across the records of one batch.
pub type StreamLabels = BTreeMap<String, String>;

/// A record ready to be placed in a Loki stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedRecord {
    /// Unix timestamp in milliseconds
    pub timestamp_ms: i64,

    /// Final log line
    pub line: String,

    /// Label set in effect when this record was processed
    pub labels: StreamLabels,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Message does not start with `{` and non-JSON records are ignored
    NotJson,
    /// Message starts with `{` but is not a JSON object
    MalformedJson(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Emit(TransformedRecord),
    Skip(SkipReason),
}

/// Seed label set for a batch.
pub fn initial_labels(log_group: &str) -> StreamLabels {
    let mut labels = StreamLabels::new();
    labels.insert(LOG_GROUP_LABEL.to_string(), log_group.to_string());
    labels
}

/// A message is treated as JSON iff its first character is `{`.
pub fn is_json_message(message: &str) -> bool {
    message.starts_with('{')
}

/// Transform one record.
///
/// Takes the current label set and returns it, possibly updated, together
/// with the outcome. Labels set here remain in effect for later records of
/// the same batch.
pub fn transform_record(
    record: &LogRecord,
    config: &Config,
    mut labels: StreamLabels,
) -> (StreamLabels, RecordOutcome) {
    if !is_json_message(&record.message) {
        if config.log_ignore_non_json {
            debug!(timestamp = record.timestamp, "Skipping non-JSON log record");
            return (labels, RecordOutcome::Skip(SkipReason::NotJson));
        }
        let outcome = emit(record, record.message.clone(), &labels);
        return (labels, outcome);
    }

    let nested = match parse_object(&record.message) {
        Ok(obj) => obj,
        Err(e) => {
            warn!(
                timestamp = record.timestamp,
                error = %e,
                "Skipping log record with malformed JSON"
            );
            return (labels, RecordOutcome::Skip(SkipReason::MalformedJson(e)));
        }
    };

    for key in &config.log_labels {
        match nested.get(key) {
            Some(value) => {
                labels.insert(key.clone(), value_to_string(value));
            }
            None => debug!(label = %key, "Label field missing from log record"),
        }
    }

    let line = match config.log_template {
        Some(ref template) if config.templating_enabled() => {
            let variables = collect_variables(&nested, &config.log_template_variables);
            template.render(&variables)
        }
        _ => record.message.clone(),
    };

    let outcome = emit(record, line, &labels);
    (labels, outcome)
}

/// Run [`transform_record`] over a batch, threading the label set through.
pub fn transform_batch(batch: &LogBatch, config: &Config) -> Vec<TransformedRecord> {
    let (_, records) = batch.log_events.iter().fold(
        (initial_labels(&batch.log_group), Vec::with_capacity(batch.log_events.len())),
        |(labels, mut records), record| {
            let (labels, outcome) = transform_record(record, config, labels);
            if let RecordOutcome::Emit(transformed) = outcome {
                records.push(transformed);
            }
            (labels, records)
        },
    );
    records
}

fn emit(record: &LogRecord, line: String, labels: &StreamLabels) -> RecordOutcome {
    RecordOutcome::Emit(TransformedRecord {
        timestamp_ms: record.timestamp,
        line,
        labels: labels.clone(),
    })
}

fn parse_object(message: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(message) {
        Ok(Value::Object(obj)) => Ok(obj),
        Ok(_) => Err("not a JSON object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn collect_variables(nested: &Map<String, Value>, names: &[String]) -> HashMap<String, String> {
    let mut variables = HashMap::with_capacity(names.len());
    for name in names {
        match nested.get(name) {
            Some(value) => {
                variables.insert(name.clone(), value_to_string(value));
            }
            None => debug!(variable = %name, "Template variable missing from log record"),
        }
    }
    variables
}

/// Strings are used verbatim, everything else as its JSON text.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
