// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Decoding of CloudWatch Logs subscription envelopes.
//!
//! A subscription delivers `{"awslogs": {"data": "<base64>"}}` where the base64
//! text is a gzip stream holding the JSON batch:
//!
//! ```text
//!   awslogs.data ──base64──> gzip bytes ──gunzip──> JSON ──serde──> DecodedBatch
//! ```
//!
//! Every step is deterministic, so failures are returned immediately and never
//! retried.

use crate::error::{DecodeStage, ForwarderError};
use base64::Engine;
use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::io::Read;
use tracing::debug;

/// Mapping parsed from JSON embedded in a log line.
pub type StructuredMessage = Map<String, Value>;

/// Body of a log event: the raw line, or the JSON object extracted from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    PlainText(String),
    Structured(StructuredMessage),
    /// Any other JSON value (null, number, array...), forwarded untouched.
    Other(Value),
}

impl Message {
    #[must_use]
    pub fn as_structured(&self) -> Option<&StructuredMessage> {
        match self {
            Message::Structured(fields) => Some(fields),
            Message::PlainText(_) | Message::Other(_) => None,
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::PlainText(text.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    #[default]
    DataMessage,
    ControlMessage,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub id: String,
    #[serde(rename = "timestamp", default, skip_serializing_if = "Option::is_none")]
    pub raw_timestamp: Option<i64>,
    pub message: Message,
    /// Text preceding the embedded JSON object, set only once it was parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedBatch {
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_stream: Option<String>,
    #[serde(default)]
    pub subscription_filters: BTreeSet<String>,
    #[serde(default)]
    pub log_events: Vec<LogEvent>,
}

/// Decodes a subscription envelope into its batch of log events.
///
/// Returns [`ForwarderError::Format`] when `awslogs.data` is missing, before
/// any decoding is attempted, and [`ForwarderError::Decode`] naming the failed
/// stage otherwise.
pub fn decode(envelope: &Value) -> Result<DecodedBatch, ForwarderError> {
    let data = envelope
        .get("awslogs")
        .and_then(|awslogs| awslogs.get("data"))
        .and_then(Value::as_str)
        .filter(|data| !data.is_empty())
        .ok_or_else(|| ForwarderError::Format(describe_envelope(envelope)))?;

    let compressed = base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| ForwarderError::decode(DecodeStage::Base64, e))?;

    let mut decompressed = Vec::new();
    MultiGzDecoder::new(compressed.as_slice())
        .read_to_end(&mut decompressed)
        .map_err(|e| ForwarderError::decode(DecodeStage::Decompress, e))?;

    let batch: DecodedBatch = serde_json::from_slice(&decompressed)
        .map_err(|e| ForwarderError::decode(DecodeStage::Json, e))?;

    debug!(
        "DECODE | Decoded {} log event(s) from {:?}",
        batch.log_events.len(),
        batch.log_group
    );
    Ok(batch)
}

fn describe_envelope(envelope: &Value) -> String {
    let keys = match envelope {
        Value::Object(fields) => fields.keys().cloned().collect::<Vec<_>>().join(", "),
        other => return format!("expected an object with awslogs.data, got {}", kind(other)),
    };
    format!("expected awslogs.data to be a non-empty string, got object with keys [{keys}]")
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
