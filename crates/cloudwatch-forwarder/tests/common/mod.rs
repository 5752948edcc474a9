// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for integration tests

use base64::Engine;
use cloudwatch_forwarder::dispatcher::RetryStrategy;
use cloudwatch_forwarder::ForwarderConfig;
use flate2::{write::GzEncoder, Compression};
use serde_json::{json, Value};
use std::io::Write;
use std::time::Duration;

pub const HEC_PATH: &str = "/services/collector";
pub const HEC_TOKEN: &str = "00000000-0000-0000-0000-000000000000";
pub const HEC_SUCCESS: &str = r#"{"text":"Success","code":0}"#;

/// Two ACCESS_LOG events captured from `/aws/lambda/notes-app-api-prod-get`.
pub fn access_log_envelope() -> Value {
    json!({
        "awslogs": {
            "data": include_str!("../fixtures/access_log_batch.b64").trim()
        }
    })
}

/// Wraps a batch the way a CloudWatch Logs subscription delivers it
pub fn envelope_for(batch: &Value) -> Value {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(batch.to_string().as_bytes())
        .expect("failed to compress batch");
    let compressed = encoder.finish().expect("failed to finish gzip stream");
    json!({
        "awslogs": {
            "data": base64::engine::general_purpose::STANDARD.encode(compressed)
        }
    })
}

pub fn test_config(server_url: &str) -> ForwarderConfig {
    ForwarderConfig {
        hec_url: format!("{server_url}{HEC_PATH}"),
        hec_token: HEC_TOKEN.to_string(),
        region: "us-east-1".to_string(),
        flush_timeout: Duration::from_secs(2),
        retry_strategy: RetryStrategy::Immediate(3),
        ..Default::default()
    }
}
