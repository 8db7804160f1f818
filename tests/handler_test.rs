use std::collections::HashMap;

use cloudwatch_loki_shipper::config::{push_url, Config};
use cloudwatch_loki_shipper::receivers::cloudwatch::{
    build_push_request, decode_batch, encode_batch, handle_logs, AwsLogs, CloudWatchLogsEvent,
    LogBatch, LogRecord, ShipperError,
};
use cloudwatch_loki_shipper::LokiClient;
use mockito::Matcher;
use serde_json::json;

const LOG_GROUP: &str = "/aws/lambda/checkout";

fn config_from(pairs: &[(&str, &str)], endpoint: &str) -> Config {
    let mut env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    env.insert("LOKI_ENDPOINT".to_string(), endpoint.to_string());
    Config::from_lookup(|key| env.get(key).cloned()).expect("valid config")
}

fn make_batch(message_type: &str, messages: &[&str]) -> LogBatch {
    LogBatch {
        message_type: Some(message_type.to_string()),
        owner: Some("123456789012".to_string()),
        log_group: LOG_GROUP.to_string(),
        log_stream: Some("2024/01/01/[$LATEST]0001".to_string()),
        subscription_filters: vec!["loki".to_string()],
        log_events: messages
            .iter()
            .enumerate()
            .map(|(i, message)| LogRecord {
                id: Some(i.to_string()),
                timestamp: 1704067200000 + i as i64,
                message: message.to_string(),
            })
            .collect(),
    }
}

fn make_event(messages: &[&str]) -> CloudWatchLogsEvent {
    encode_batch(&make_batch("DATA_MESSAGE", messages)).expect("encode batch")
}

fn client_for(server: &mockito::ServerGuard) -> LokiClient {
    LokiClient::new(reqwest::Client::new(), push_url(&server.url()).unwrap())
}

#[test]
fn test_envelope_round_trip_keeps_group_and_count() {
    let batch = make_batch("DATA_MESSAGE", &["a", "{\"b\":1}", "c"]);
    let decoded = decode_batch(&encode_batch(&batch).unwrap()).unwrap();

    assert_eq!(decoded.log_group, batch.log_group);
    assert_eq!(decoded.log_events.len(), 3);
    assert_eq!(decoded.log_events, batch.log_events);
}

#[test]
fn test_two_records_two_streams_in_order() {
    let config = config_from(&[], "http://localhost:3100");
    let batch = make_batch("DATA_MESSAGE", &["first line", "second line"]);

    let request = build_push_request(&batch, &config);

    assert_eq!(request.streams.len(), 2);
    assert_eq!(request.streams[0].values.len(), 1);
    assert_eq!(request.streams[1].values.len(), 1);
    assert_eq!(request.streams[0].values[0][0], "1704067200000000000");
    assert_eq!(request.streams[0].values[0][1], "first line");
    assert_eq!(request.streams[1].values[0][0], "1704067200001000000");
    assert_eq!(request.streams[1].values[0][1], "second line");
    for stream in &request.streams {
        assert_eq!(stream.stream.get("logGroup").map(String::as_str), Some(LOG_GROUP));
    }
}

#[test]
fn test_non_json_ignored_when_configured() {
    let config = config_from(&[("LOG_IGNORE_NON_JSON", "true")], "http://localhost:3100");
    let batch = make_batch(
        "DATA_MESSAGE",
        &["START RequestId: 1", r#"{"message":"kept"}"#, "END RequestId: 1"],
    );

    let request = build_push_request(&batch, &config);

    assert_eq!(request.streams.len(), 1);
    assert_eq!(request.streams[0].values[0][1], r#"{"message":"kept"}"#);
}

#[test]
fn test_empty_labels_never_promote_fields() {
    let config = config_from(&[("LOG_TEMPLATE", "$message")], "http://localhost:3100");
    let raw = r#"{"message":"hello","level":"info"}"#;
    let batch = make_batch("DATA_MESSAGE", &[raw]);

    let request = build_push_request(&batch, &config);

    assert_eq!(request.streams[0].stream.len(), 1);
    assert_eq!(request.streams[0].values[0][1], raw);
}

#[tokio::test]
async fn test_labels_and_template_pushed_to_loki() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/loki/api/v1/push")
        .match_body(Matcher::Json(json!({
            "streams": [
                {
                    "stream": {"logGroup": LOG_GROUP, "level": "info"},
                    "values": [["1704067200000000000", "hello"]]
                },
                {
                    "stream": {"logGroup": LOG_GROUP, "level": "info"},
                    "values": [["1704067200001000000", "REPORT RequestId: 1"]]
                }
            ]
        })))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let config = config_from(
        &[
            ("LOG_LABELS", "level"),
            ("LOG_TEMPLATE", "$message"),
            ("LOG_TEMPLATE_VARIABLES", "message"),
        ],
        &server.url(),
    );
    let event = make_event(&[r#"{"message":"hello","level":"info"}"#, "REPORT RequestId: 1"]);

    let summary = handle_logs(event, &config, &client_for(&server))
        .await
        .expect("invocation succeeds");

    mock.assert_async().await;
    assert_eq!(summary.log_group, LOG_GROUP);
    assert_eq!(summary.received, 2);
    assert_eq!(summary.emitted, 2);
    assert_eq!(summary.skipped, 0);
    assert!(summary.delivered);
}

#[tokio::test]
async fn test_push_failure_does_not_fail_invocation() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/loki/api/v1/push")
        .with_status(500)
        .with_body("internal error")
        .expect(1)
        .create_async()
        .await;

    let config = config_from(&[], &server.url());
    let event = make_event(&["one", "two"]);

    let summary = handle_logs(event, &config, &client_for(&server))
        .await
        .expect("push failure is not an invocation failure");

    mock.assert_async().await;
    assert_eq!(summary.emitted, 2);
    assert!(!summary.delivered);
}

#[tokio::test]
async fn test_malformed_record_skipped_batch_continues() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/loki/api/v1/push")
        .match_body(Matcher::Json(json!({
            "streams": [{
                "stream": {"logGroup": LOG_GROUP, "level": "warn"},
                "values": [["1704067200001000000", "ok"]]
            }]
        })))
        .with_status(204)
        .create_async()
        .await;

    let config = config_from(&[("LOG_LABELS", "level")], &server.url());
    let event = make_event(&["{this is not json", r#"{"message":"ok","level":"warn"}"#]);

    let summary = handle_logs(event, &config, &client_for(&server)).await.unwrap();

    mock.assert_async().await;
    assert_eq!(summary.received, 2);
    assert_eq!(summary.emitted, 1);
    assert_eq!(summary.skipped, 1);
}

#[tokio::test]
async fn test_control_message_not_pushed() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/loki/api/v1/push")
        .expect(0)
        .create_async()
        .await;

    let config = config_from(&[], &server.url());
    let event = encode_batch(&make_batch(
        "CONTROL_MESSAGE",
        &["CWL CONTROL MESSAGE: Checking health of destination"],
    ))
    .unwrap();

    let summary = handle_logs(event, &config, &client_for(&server)).await.unwrap();

    mock.assert_async().await;
    assert_eq!(summary.emitted, 0);
    assert!(!summary.delivered);
}

#[tokio::test]
async fn test_all_records_dropped_sends_nothing() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/loki/api/v1/push")
        .expect(0)
        .create_async()
        .await;

    let config = config_from(&[("LOG_IGNORE_NON_JSON", "1")], &server.url());
    let event = make_event(&["plain", "text"]);

    let summary = handle_logs(event, &config, &client_for(&server)).await.unwrap();

    mock.assert_async().await;
    assert_eq!(summary.skipped, 2);
}

#[tokio::test]
async fn test_bad_envelope_fails_invocation() {
    let server = mockito::Server::new_async().await;
    let config = config_from(&[], &server.url());
    let event = CloudWatchLogsEvent {
        aws_logs: AwsLogs {
            data: "%%% definitely not base64 %%%".to_string(),
        },
    };

    let result = handle_logs(event, &config, &client_for(&server)).await;

    assert!(matches!(result, Err(ShipperError::Decode(_))));
}

#[test]
fn test_envelope_from_lambda_json() {
    let event = make_event(&["hello"]);
    let raw = json!({"awslogs": {"data": event.aws_logs.data}}).to_string();

    let parsed: CloudWatchLogsEvent = serde_json::from_str(&raw).unwrap();
    let batch = decode_batch(&parsed).unwrap();

    assert_eq!(batch.log_events[0].message, "hello");
}
