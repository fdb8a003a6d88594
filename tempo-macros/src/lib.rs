// Tempo - A coalescing Statsd client for Rust!
//
// Copyright 2026 Tempo Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A process wide Statsd client and macros for Tempo
//!
//! This crate keeps a single `StatsdClient` for the whole process so that
//! metrics can be sent from anywhere without passing a client around.
//!
//! The client is either created from a `Config` given to `setup`, in which
//! case it is connected over UDP the first time a metric is sent, or set
//! explicitly with `set_global_default`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tempo::Config;
//! use tempo_macros::{statsd_fgauge, statsd_gauge, statsd_incr, statsd_timing};
//!
//! tempo_macros::setup(Config {
//!     host: "metrics.example.com".to_owned(),
//!     project: "my.app".to_owned(),
//!     ..Config::default()
//! });
//!
//! // "my.app.requests:1|c|@1.000000", coalesced and sent by the next flush
//! statsd_incr!("requests", 1);
//! // "my.app.cache.hits:1|c|@0.100000", for about one call out of ten
//! statsd_incr!("cache.hits", 1, 0.1);
//! statsd_gauge!("connections", 42);
//! statsd_fgauge!("load", 0.75);
//! statsd_timing!("db.query", Duration::from_millis(13));
//! ```
//!
//! ## Behavior
//!
//! Macros never block on the network and never panic. Gauges and timings are
//! handed to the background dispatcher of the client and counters to its
//! counter buffer (see `StatsdClient::submit`). Invalid arguments and failed
//! writes are logged through the `log` crate.
//!
//! When no client is available (no `setup` call yet, a disabled
//! configuration, or a failure to connect) the macros do nothing.

pub use crate::state::{
    get_global_default, is_global_default_set, set_global_default, setup, GlobalDefaultNotSet, SingletonHolder,
};

mod macros;
mod state;

#[doc(hidden)]
pub mod __private {
    use crate::state::global_client;
    use log::debug;
    use std::time::Duration;
    use tempo::{MetricResult, MetricSample, StatsdClient};

    fn with_client<F>(rate: Option<f32>, send: F)
    where
        F: FnOnce(&StatsdClient, f32) -> MetricResult<()>,
    {
        if let Some(client) = global_client() {
            let rate = rate.unwrap_or_else(|| client.sample_rate());
            if let Err(e) = send(&client, rate) {
                debug!("unable to send metric with the global client: {}", e);
            }
        }
    }

    pub fn incr(key: &str, count: i64, rate: Option<f32>) {
        with_client(rate, |client, rate| client.submit(MetricSample::count(key, count, rate)));
    }

    pub fn gauge(key: &str, value: i64, rate: Option<f32>) {
        with_client(rate, |client, rate| client.submit(MetricSample::gauge(key, value, rate)));
    }

    pub fn fgauge(key: &str, value: f64, rate: Option<f32>) {
        with_client(rate, |client, rate| client.submit(MetricSample::fgauge(key, value, rate)));
    }

    pub fn timing(key: &str, duration: Duration, rate: Option<f32>) {
        with_client(rate, |client, rate| match i64::try_from(duration.as_millis()) {
            Ok(millis) => client.submit(MetricSample::timer(key, millis, rate)),
            Err(_) => {
                debug!("timing {} is too large to be sent in milliseconds", key);
                Ok(())
            }
        });
    }
}
