// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

/// Stage of envelope decoding that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    Base64,
    Decompress,
    Json,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            DecodeStage::Base64 => "base64",
            DecodeStage::Decompress => "decompress",
            DecodeStage::Json => "json",
        };
        f.write_str(stage)
    }
}

/// Errors that abort a forwarding invocation.
#[derive(Debug, thiserror::Error)]
pub enum ForwarderError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CloudWatch event not in expected format: {0}")]
    Format(String),

    #[error("Failed to decode CloudWatch payload at {stage} stage: {source}")]
    Decode {
        stage: DecodeStage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl ForwarderError {
    pub(crate) fn decode<E>(stage: DecodeStage, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ForwarderError::Decode {
            stage,
            source: Box::new(source),
        }
    }
}

/// Aggregate failure of one batch delivery. There is no per-record breakdown.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Failed to send batch of {batch_size} event(s) after {attempts} attempt(s): {source}")]
    Transport {
        batch_size: usize,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("Collector kept failing with status {status} after {attempts} attempt(s): {body}")]
    ServerError {
        status: u16,
        attempts: u32,
        body: String,
    },

    #[error("Collector rejected batch (status {status}, code {code}): {text}")]
    Rejected { status: u16, code: i64, text: String },

    #[error("Unreadable acknowledgement from collector (status {status}): {body}")]
    InvalidAcknowledgement { status: u16, body: String },

    #[error("Failed to serialize batch: {0}")]
    Payload(#[from] serde_json::Error),
}
