// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::clock::{Clock, SystemClock};
use crate::config::ForwarderConfig;
use crate::decoder::decode;
use crate::dispatcher::BatchDispatcher;
use crate::enricher::{EnricherConfig, EventEnricher};
use crate::error::ForwarderError;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs one invocation: decode the envelope, enrich its events and deliver
/// them to the collector as a single batch.
#[derive(Debug, Clone)]
pub struct Forwarder {
    config: Arc<ForwarderConfig>,
    client: reqwest::Client,
    clock: Arc<dyn Clock>,
}

impl Forwarder {
    #[must_use]
    pub fn new(config: Arc<ForwarderConfig>, client: reqwest::Client) -> Self {
        Self::with_clock(config, client, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(
        config: Arc<ForwarderConfig>,
        client: reqwest::Client,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Forwarder {
            config,
            client,
            clock,
        }
    }

    /// Returns the number of events accepted by the collector.
    pub async fn forward(
        &self,
        envelope: &Value,
        request_id: Option<&str>,
    ) -> Result<usize, ForwarderError> {
        let batch = decode(envelope)?;
        debug!(
            "Forwarding {} event(s) from log group {:?}, stream {:?}",
            batch.log_events.len(),
            batch.log_group,
            batch.log_stream
        );

        let enricher = EventEnricher::new(
            EnricherConfig::from_forwarder_config(&self.config, request_id.map(str::to_string)),
            Arc::clone(&self.clock),
        );
        let mut dispatcher = BatchDispatcher::new(self.client.clone(), &self.config);
        for record in enricher.enrich(batch) {
            dispatcher.accumulate(record);
        }

        let count = dispatcher.flush().await?;
        info!("Successfully processed {count} log event(s).");
        Ok(count)
    }
}
