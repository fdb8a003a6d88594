// Tempo - A coalescing Statsd client for Rust!
//
// Copyright 2026 Tempo Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A coalescing Statsd client for Rust!
//!
//! Tempo sends counters, gauges and timers to a Statsd server over UDP while
//! keeping the cost of recording a metric low for the application.
//!
//! ## Features
//!
//! * Counter increments are coalesced by name in memory and written in the
//!   background at a fixed interval.
//! * Metrics can be handed to a background worker through a bounded queue,
//!   so callers never wait on the network.
//! * Optional sampling, with the sample rate sent along with each metric.
//! * Support for alternate backends via the `MetricSink` trait.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tempo::{StatsdClient, DEFAULT_PORT};
//!
//! let client = StatsdClient::from_udp_host("my.app", ("metrics.example.com", DEFAULT_PORT)).unwrap();
//!
//! // buffered, written every ten seconds by default
//! client.incr("requests", 1).unwrap();
//!
//! // written right away
//! client.gauge("connections", 42).unwrap();
//! client.timing("db.query", Duration::from_millis(13)).unwrap();
//!
//! // only sent for about one call out of ten
//! client.decr_with_sampling("cache.entries", 1, 0.1).unwrap();
//! ```
//!
//! ### Queued Metrics
//!
//! `StatsdClient::submit` never performs network I/O in the thread of the
//! caller. Gauges and timers submitted this way are written by a worker
//! thread, and dropped (with a warning logged) if the worker can't keep up.
//!
//! ```rust
//! use tempo::{MetricSample, NopMetricSink, StatsdClient};
//!
//! let client = StatsdClient::from_sink("my.app", NopMetricSink).unwrap();
//! client.submit(MetricSample::gauge("queue.depth", 12, 1.0)).unwrap();
//! ```
//!
//! ### Testing
//!
//! The `SpyMetricSink` writes every metric to a channel, which makes it easy
//! to check what a client sends.
//!
//! ```rust
//! use tempo::{SpyMetricSink, StatsdClient};
//!
//! let (rx, sink) = SpyMetricSink::new();
//! let client = StatsdClient::from_sink("my.app", sink).unwrap();
//!
//! client.decr("jobs", 2).unwrap();
//! assert_eq!(b"my.app.jobs:-2|c|@1.000000".to_vec(), rx.recv().unwrap());
//! ```
//!
//! ## Logging
//!
//! Problems that aren't returned to callers (dropped metrics, failed
//! background writes) are reported through the `log` crate. No logger is
//! installed by this library.

use std::time::Duration;

/// Default port of Statsd servers.
pub const DEFAULT_PORT: u16 = 8125;

/// Default time allowed to resolve the address of a Statsd server.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub use self::client::{ClientState, StatsdClient, StatsdClientBuilder};
pub use self::config::Config;
pub use self::dispatch::{DispatchStats, Submission, DEFAULT_QUEUE_CAPACITY};
pub use self::encode::{encode, SampleRate};
pub use self::flush::DEFAULT_FLUSH_INTERVAL;
pub use self::sampler::{check_sample_rate, AlwaysSample, Sampler, Sampling};
pub use self::sinks::{MetricSink, NopMetricSink, SpyMetricSink, UdpMetricSink};
pub use self::types::{ErrorKind, MetricError, MetricKind, MetricResult, MetricSample, MetricValue};

pub mod buffer;
mod client;
mod config;
pub mod dispatch;
pub mod encode;
pub mod flush;
pub mod sampler;
mod sinks;
mod types;
