// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, sync::Arc};

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use cloudwatch_forwarder::{http, Forwarder, ForwarderConfig};

#[tokio::main(flavor = "current_thread")]
pub async fn main() -> Result<(), Error> {
    let log_level = env::var("FORWARDER_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,{log_level}");
    let filter = match EnvFilter::try_new(&env_filter) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("Invalid log level {log_level:?}: {e}, falling back to info");
            EnvFilter::new("h2=off,hyper=off,rustls=off,info")
        }
    };

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    debug!("Logging subsystem enabled");

    let config = match ForwarderConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Invalid forwarder configuration: {e}");
            return Err(e.into());
        }
    };

    // One client per container, reused across invocations.
    let client = http::get_client(&config);
    let forwarder = Forwarder::new(Arc::clone(&config), client);
    info!(
        "Forwarding CloudWatch Logs to {} (region {})",
        config.hec_url, config.region
    );

    let forwarder = &forwarder;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle(forwarder, event).await
    }))
    .await
}

async fn handle(forwarder: &Forwarder, event: LambdaEvent<Value>) -> Result<usize, Error> {
    let request_id = event.context.request_id.as_str();
    match forwarder.forward(&event.payload, Some(request_id)).await {
        Ok(count) => Ok(count),
        Err(e) => {
            error!("Failed to forward batch of request {request_id}: {e}");
            Err(e.into())
        }
    }
}
