// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Single batched delivery of enriched records to Splunk HEC.
//!
//! ```text
//!   accumulate() ──> pending ──flush()──> POST (retry on network/5xx) ──> ack code 0?
//! ```
//!
//! A batch is accepted as a whole or fails as a whole: the only outcomes of
//! [`BatchDispatcher::flush`] are the number of records sent or one
//! [`DispatchError`].

use crate::config::ForwarderConfig;
use crate::error::DispatchError;
use crate::hec::{encode_batch, HecAcknowledgement, OutboundRecord};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// How failed delivery attempts are retried. The first value is the total
/// number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStrategy {
    Immediate(u32),
    /// Attempts, and delay in milliseconds multiplied by the attempt number.
    LinearBackoff(u32, u64),
}

impl RetryStrategy {
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        match self {
            RetryStrategy::Immediate(attempts) | RetryStrategy::LinearBackoff(attempts, _) => {
                (*attempts).max(1)
            }
        }
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        match self {
            RetryStrategy::Immediate(_) => Duration::ZERO,
            RetryStrategy::LinearBackoff(_, delay_ms) => {
                Duration::from_millis(delay_ms.saturating_mul(u64::from(attempt)))
            }
        }
    }
}

enum Attempt {
    Accepted,
    Retryable(DispatchError),
    Fatal(DispatchError),
}

pub struct BatchDispatcher {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    timeout: Duration,
    retry_strategy: RetryStrategy,
    pending: Vec<OutboundRecord>,
}

impl BatchDispatcher {
    #[must_use]
    pub fn new(client: reqwest::Client, config: &ForwarderConfig) -> Self {
        BatchDispatcher {
            client,
            endpoint: config.hec_url.clone(),
            token: config.hec_token.clone(),
            timeout: config.flush_timeout,
            retry_strategy: config.retry_strategy,
            pending: Vec::new(),
        }
    }

    pub fn accumulate(&mut self, record: OutboundRecord) {
        self.pending.push(record);
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Sends every pending record in one request and drains the pending list.
    pub async fn flush(&mut self) -> Result<usize, DispatchError> {
        let records = std::mem::take(&mut self.pending);
        let batch_size = records.len();
        if batch_size == 0 {
            debug!("DISPATCH | Nothing to flush");
            return Ok(0);
        }

        let body = encode_batch(&records)?;

        let max_attempts = self.retry_strategy.max_attempts();
        let start = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let outcome = Self::attempt(self.request(body.clone()), batch_size, attempts).await;
            match outcome {
                Attempt::Accepted => {
                    debug!(
                        "DISPATCH | Collector accepted {} event(s) after {} attempt(s) in {} ms",
                        batch_size,
                        attempts,
                        start.elapsed().as_millis()
                    );
                    return Ok(batch_size);
                }
                Attempt::Fatal(e) => {
                    error!("DISPATCH | Batch of {} event(s) failed: {}", batch_size, e);
                    return Err(e);
                }
                Attempt::Retryable(e) if attempts >= max_attempts => {
                    error!(
                        "DISPATCH | Failed to send batch after {} ms and {} attempts: {}",
                        start.elapsed().as_millis(),
                        attempts,
                        e
                    );
                    return Err(e);
                }
                Attempt::Retryable(e) => {
                    let delay = self.retry_strategy.delay_after(attempts);
                    warn!(
                        "DISPATCH | Attempt {}/{} failed, retrying in {} ms: {}",
                        attempts,
                        max_attempts,
                        delay.as_millis(),
                        e
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    fn request(&self, body: Vec<u8>) -> reqwest::RequestBuilder {
        self.client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header(AUTHORIZATION, format!("Splunk {}", self.token))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
    }

    async fn attempt(req: reqwest::RequestBuilder, batch_size: usize, attempts: u32) -> Attempt {
        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                let fatal = e.is_builder();
                let e = DispatchError::Transport {
                    batch_size,
                    attempts,
                    source: e,
                };
                return if fatal {
                    Attempt::Fatal(e)
                } else {
                    Attempt::Retryable(e)
                };
            }
        };

        let status = resp.status();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                return Attempt::Retryable(DispatchError::Transport {
                    batch_size,
                    attempts,
                    source: e,
                })
            }
        };

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Attempt::Retryable(DispatchError::ServerError {
                status: status.as_u16(),
                attempts,
                body,
            });
        }

        match serde_json::from_str::<HecAcknowledgement>(&body) {
            Ok(ack) if ack.is_accepted() && status.is_success() => Attempt::Accepted,
            Ok(ack) => Attempt::Fatal(DispatchError::Rejected {
                status: status.as_u16(),
                code: ack.code,
                text: ack.text,
            }),
            Err(_) => Attempt::Fatal(DispatchError::InvalidAcknowledgement {
                status: status.as_u16(),
                body,
            }),
        }
    }
}
