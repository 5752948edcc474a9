// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Splunk HTTP Event Collector wire format.

use crate::decoder::Message;
use serde::{Deserialize, Serialize};

pub const JSON_SOURCETYPE: &str = "_json";

/// HEC acknowledgement code meaning the whole batch was accepted.
pub const HEC_SUCCESS_CODE: i64 = 0;

/// One enriched event ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRecord {
    pub message: Message,
    /// Epoch milliseconds.
    pub time: i64,
    pub host: String,
    pub source: String,
    pub sourcetype: &'static str,
    pub index: Option<String>,
}

#[derive(Serialize)]
struct HecEvent<'a> {
    /// Epoch seconds with millisecond precision.
    time: f64,
    host: &'a str,
    source: &'a str,
    sourcetype: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<&'a str>,
    event: &'a Message,
}

impl<'a> From<&'a OutboundRecord> for HecEvent<'a> {
    #[allow(clippy::cast_precision_loss)]
    fn from(record: &'a OutboundRecord) -> Self {
        HecEvent {
            time: record.time as f64 / 1000.0,
            host: &record.host,
            source: &record.source,
            sourcetype: record.sourcetype,
            index: record.index.as_deref(),
            event: &record.message,
        }
    }
}

/// Serializes records as newline separated HEC event objects.
pub fn encode_batch(records: &[OutboundRecord]) -> Result<Vec<u8>, serde_json::Error> {
    let mut body = Vec::with_capacity(records.len() * 256);
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            body.push(b'\n');
        }
        serde_json::to_writer(&mut body, &HecEvent::from(record))?;
    }
    Ok(body)
}

/// Body returned by the collector, e.g. `{"text":"Success","code":0}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HecAcknowledgement {
    #[serde(default)]
    pub text: String,
    pub code: i64,
}

impl HecAcknowledgement {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.code == HEC_SUCCESS_CODE
    }
}
