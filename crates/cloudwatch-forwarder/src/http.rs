// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::config::ForwarderConfig;
use core::time::Duration;
use std::error::Error;
use tracing::{debug, error};

/// Creates the HTTP client used to reach the collector.
///
/// A misconfigured proxy is logged and the client falls back to a direct
/// connection, so a bad `HTTPS_PROXY` never blocks delivery.
#[must_use]
pub fn get_client(config: &ForwarderConfig) -> reqwest::Client {
    match build_client(config) {
        Ok(client) => client,
        Err(e) => {
            error!(
                "Unable to parse proxy configuration: {}, falling back to direct connection",
                e
            );
            match client_builder(config).build() {
                Ok(client) => client,
                Err(inner) => {
                    error!(
                        "Failed to build HTTP client without proxy: {}, using reqwest defaults",
                        inner
                    );
                    reqwest::Client::new()
                }
            }
        }
    }
}

fn build_client(config: &ForwarderConfig) -> Result<reqwest::Client, Box<dyn Error>> {
    let mut builder = client_builder(config);
    if let Some(proxy) = &config.https_proxy {
        debug!("Using HTTPS proxy {proxy} for collector requests");
        builder = builder.proxy(reqwest::Proxy::https(proxy)?);
    }
    Ok(builder.build()?)
}

fn client_builder(config: &ForwarderConfig) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(config.flush_timeout)
        .pool_idle_timeout(Duration::from_secs(270))
        .tcp_keepalive(Duration::from_secs(120))
}
