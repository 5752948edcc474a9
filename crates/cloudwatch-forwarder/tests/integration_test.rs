// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod common;

use cloudwatch_forwarder::clock::FixedClock;
use cloudwatch_forwarder::error::DecodeStage;
use cloudwatch_forwarder::{DispatchError, Forwarder, ForwarderError};
use common::{access_log_envelope, envelope_for, test_config, HEC_PATH, HEC_SUCCESS, HEC_TOKEN};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;

const NOW: i64 = 1_700_000_000_000;

fn forwarder(server_url: &str) -> Forwarder {
    Forwarder::with_clock(
        Arc::new(test_config(server_url)),
        reqwest::Client::new(),
        Arc::new(FixedClock(NOW)),
    )
}

#[tokio::test]
async fn forwards_access_log_batch_to_hec() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", HEC_PATH)
        .match_header("authorization", format!("Splunk {HEC_TOKEN}").as_str())
        .match_header("content-type", "application/json")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""time":1524866225\.337"#.to_string()),
            Matcher::Regex(r#""time":1524867442\.583"#.to_string()),
            Matcher::Regex(r#""host":"lambda:notes-app-api-prod-get""#.to_string()),
            Matcher::Regex(r#""source":"us-east-1:\$LATEST""#.to_string()),
            Matcher::Regex(r#""sourcetype":"_json""#.to_string()),
            Matcher::Regex(r#""response_code":"200""#.to_string()),
            Matcher::Regex(r#""awsRequestId":"c6af9ac6-7b61-11e6-9a41-93e8deadbeef""#.to_string()),
        ]))
        .with_status(200)
        .with_body(HEC_SUCCESS)
        .expect(1)
        .create_async()
        .await;

    let accepted = forwarder(&server.url())
        .forward(
            &access_log_envelope(),
            Some("c6af9ac6-7b61-11e6-9a41-93e8deadbeef"),
        )
        .await
        .expect("forwarding should succeed");

    assert_eq!(accepted, 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn plain_and_malformed_messages_are_forwarded_as_text() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", HEC_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""event":"START RequestId: 8b1f Version: \$LATEST\\n""#.to_string()),
            Matcher::Regex(r#""event":"ERROR: \{not json\}""#.to_string()),
            Matcher::Regex(r#""time":1700000000\.0"#.to_string()),
            Matcher::Regex(r#""host":"/ecs/orders""#.to_string()),
            Matcher::Regex(r#""source":"us-east-1:""#.to_string()),
        ]))
        .with_status(200)
        .with_body(HEC_SUCCESS)
        .expect(1)
        .create_async()
        .await;

    let envelope = envelope_for(&json!({
        "messageType": "DATA_MESSAGE",
        "owner": "1234567890",
        "logGroup": "/ecs/orders",
        "logStream": "orders/web/4f1c",
        "subscriptionFilters": ["orders-to-splunk"],
        "logEvents": [
            {"id": "1", "timestamp": 1524867451414_i64, "message": "START RequestId: 8b1f Version: $LATEST\n"},
            {"id": "2", "message": "ERROR: {not json}"}
        ]
    }));

    let accepted = forwarder(&server.url())
        .forward(&envelope, None)
        .await
        .expect("forwarding should succeed");

    assert_eq!(accepted, 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn missing_awslogs_data_fails_before_any_delivery() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", HEC_PATH).expect(0).create_async().await;

    let result = forwarder(&server.url())
        .forward(&json!({"awslogs": {}}), None)
        .await;

    assert!(matches!(result, Err(ForwarderError::Format(_))));
    mock.assert_async().await;
}

#[tokio::test]
async fn corrupt_payload_fails_before_any_delivery() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", HEC_PATH).expect(0).create_async().await;

    let result = forwarder(&server.url())
        .forward(&json!({"awslogs": {"data": "H4sIAAAAAAAAA-not-really"}}), None)
        .await;

    assert!(matches!(
        result,
        Err(ForwarderError::Decode {
            stage: DecodeStage::Base64 | DecodeStage::Decompress,
            ..
        })
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn failing_collector_yields_one_aggregate_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", HEC_PATH)
        .with_status(500)
        .with_body("Internal Server Error")
        .expect(3)
        .create_async()
        .await;

    let result = forwarder(&server.url())
        .forward(&access_log_envelope(), None)
        .await;

    match result {
        Err(ForwarderError::Dispatch(DispatchError::ServerError {
            status, attempts, ..
        })) => {
            assert_eq!(status, 500);
            assert_eq!(attempts, 3);
        }
        other => panic!("expected aggregate dispatch error, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn empty_batch_is_accepted_without_delivery() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", HEC_PATH).expect(0).create_async().await;

    let envelope = envelope_for(&json!({
        "messageType": "DATA_MESSAGE",
        "owner": "1234567890",
        "logGroup": "/aws/lambda/quiet",
        "logStream": "2018/04/27/[$LATEST]abc",
        "subscriptionFilters": [],
        "logEvents": []
    }));

    let accepted = forwarder(&server.url())
        .forward(&envelope, None)
        .await
        .expect("empty batch should succeed");

    assert_eq!(accepted, 0);
    mock.assert_async().await;
}
