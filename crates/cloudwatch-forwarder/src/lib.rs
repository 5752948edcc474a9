// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Forwards CloudWatch Logs subscription batches to a Splunk HTTP Event
//! Collector.
//!
//! ```text
//!   {"awslogs": {"data": ...}}
//!             │
//!             v
//!   ┌──────────────────┐
//!   │     decoder      │  base64 -> gunzip -> JSON batch
//!   └────────┬─────────┘
//!            │
//!            v
//!   ┌──────────────────┐
//!   │     enricher     │  prefix/JSON extraction, host, source, time
//!   └────────┬─────────┘
//!            │
//!            v
//!   ┌──────────────────┐
//!   │    dispatcher    │  one HEC request, bounded retries
//!   └──────────────────┘
//! ```
//!
//! [`forwarder::Forwarder`] runs the three stages for one invocation and
//! returns the number of accepted events.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod clock;
pub mod config;
pub mod decoder;
pub mod dispatcher;
pub mod enricher;
pub mod error;
pub mod forwarder;
pub mod hec;
pub mod http;

/// Total delivery attempts for one batch.
pub const FLUSH_RETRY_COUNT: u32 = 3;

pub use config::ForwarderConfig;
pub use error::{DispatchError, ForwarderError};
pub use forwarder::Forwarder;
