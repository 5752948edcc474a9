// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-event enrichment of decoded batches into HEC records.
//!
//! For every event, in input order:
//!
//! ```text
//!   LogEvent
//!       │
//!       v
//!   ┌────────────────┐
//!   │ Prefix + JSON  │ ("ACCESS_LOG: {...}" -> prefix, Structured)
//!   └───────┬────────┘
//!           │
//!           v
//!   ┌────────────────┐
//!   │  Resolve time  │ (message field > event timestamp > clock)
//!   └───────┬────────┘
//!           │
//!           v
//!   OutboundRecord (+ batch host/source)
//! ```
//!
//! A message that looks like JSON but does not parse is logged and forwarded
//! untouched; enrichment never fails a batch.

use crate::clock::Clock;
use crate::config::ForwarderConfig;
use crate::decoder::{DecodedBatch, LogEvent, Message};
use crate::hec::{OutboundRecord, JSON_SOURCETYPE};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

const LAMBDA_LOG_GROUP_PREFIX: &str = "/aws/lambda/";
const DEFAULT_HOST: &str = "cloudwatch-logs";
const REQUEST_ID_FIELD: &str = "awsRequestId";

/// Settings that shape every record of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnricherConfig {
    pub time_field: String,
    pub region: String,
    pub index: Option<String>,
    /// Invocation request id stamped onto structured messages.
    pub request_id: Option<String>,
}

impl EnricherConfig {
    #[must_use]
    pub fn from_forwarder_config(config: &ForwarderConfig, request_id: Option<String>) -> Self {
        Self {
            time_field: config.time_field.clone(),
            region: config.region.clone(),
            index: config.index.clone(),
            request_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventEnricher {
    config: EnricherConfig,
    clock: Arc<dyn Clock>,
}

impl EventEnricher {
    #[must_use]
    pub fn new(config: EnricherConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    /// Turns every event of the batch into exactly one record, keeping order.
    #[must_use]
    pub fn enrich(&self, batch: DecodedBatch) -> Vec<OutboundRecord> {
        let host = derive_host(batch.log_group.as_deref());
        let source = derive_source(&self.config.region, batch.log_stream.as_deref());
        debug!(
            "ENRICH | Enriching {} event(s) with host={} source={}",
            batch.log_events.len(),
            host,
            source
        );

        batch
            .log_events
            .into_iter()
            .map(|mut event| {
                extract_structured_message(&mut event);
                if let Some(request_id) = &self.config.request_id {
                    stamp_request_id(&mut event.message, request_id);
                }
                let time = resolve_time(&event, &self.config.time_field, self.clock.as_ref());
                OutboundRecord {
                    message: event.message,
                    time,
                    host: host.clone(),
                    source: source.clone(),
                    sourcetype: JSON_SOURCETYPE,
                    index: self.config.index.clone(),
                }
            })
            .collect()
    }
}

/// Replaces a `"<prefix>{...}"` message by its JSON object and records the prefix.
///
/// Only the first `{` is considered and the tail must end with `}` once
/// trailing whitespace is dropped. Brace balance is left to the JSON parser.
/// Returns whether the message was converted.
pub fn extract_structured_message(event: &mut LogEvent) -> bool {
    let Message::PlainText(text) = &event.message else {
        return false;
    };
    let Some(first_brace) = text.find('{') else {
        return false;
    };
    let candidate = text[first_brace..].trim_end();
    if !candidate.ends_with('}') {
        return false;
    }

    match serde_json::from_str(candidate) {
        Ok(fields) => {
            let prefix = (first_brace > 0).then(|| text[..first_brace].to_string());
            event.message = Message::Structured(fields);
            event.prefix = prefix;
            true
        }
        Err(e) => {
            warn!(
                "ENRICH | Failed parsing message of event {} although it has a json pattern: {}: {:?}",
                event.id, e, text
            );
            false
        }
    }
}

fn stamp_request_id(message: &mut Message, request_id: &str) {
    if let Message::Structured(fields) = message {
        if !fields.contains_key(REQUEST_ID_FIELD) {
            fields.insert(
                REQUEST_ID_FIELD.to_string(),
                Value::String(request_id.to_string()),
            );
        }
    }
}

/// `/aws/lambda/<name>` becomes `lambda:<name>`; anything else is kept as is.
#[must_use]
pub fn derive_host(log_group: Option<&str>) -> String {
    match log_group {
        Some(group) if !group.is_empty() => match group.strip_prefix(LAMBDA_LOG_GROUP_PREFIX) {
            Some(function_name) => format!("lambda:{function_name}"),
            None => group.to_string(),
        },
        _ => DEFAULT_HOST.to_string(),
    }
}

/// `<region>:<token>` where token is the bracketed part of the stream name
/// (the function version for Lambda streams), or empty.
#[must_use]
pub fn derive_source(region: &str, log_stream: Option<&str>) -> String {
    let token = log_stream
        .and_then(|stream| log_stream_token().captures(stream))
        .and_then(|captures| captures.get(1))
        .map_or("", |token| token.as_str());
    format!("{region}:{token}")
}

#[allow(clippy::expect_used)]
fn log_stream_token() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r".+\[(.*)\].+").expect("log stream pattern is valid"))
}

/// Resolves the event time in epoch millis.
///
/// Precedence: `time_field` of a structured message when it holds a parsable
/// date, then the event timestamp, then `clock`.
pub fn resolve_time(event: &LogEvent, time_field: &str, clock: &dyn Clock) -> i64 {
    let from_message = event
        .message
        .as_structured()
        .and_then(|fields| fields.get(time_field))
        .and_then(Value::as_str)
        .and_then(parse_time);

    from_message
        .or(event.raw_timestamp)
        .unwrap_or_else(|| clock.now_millis())
}

fn parse_time(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time.timestamp_millis());
    }
    if let Ok(time) = DateTime::parse_from_rfc2822(raw) {
        return Some(time.timestamp_millis());
    }
    // No offset: read as UTC
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(time) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(time.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|time| time.and_utc().timestamp_millis())
}
