// Tempo - A coalescing Statsd client for Rust!
//
// Copyright 2026 Tempo Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::DEFAULT_PORT;

/// Settings needed to connect a client to a Statsd server over UDP.
///
/// `project` is used as the prefix of every metric. A `sample_rate` of
/// exactly `0` means "not set" and is treated as `1`: to stop sending metrics
/// set `enable` to `false` instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub project: String,
    pub enable: bool,
    pub sample_rate: f32,
}

impl Config {
    /// Address of the Statsd server, as `host:port`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Default sample rate of clients built from this configuration.
    pub fn sample_rate(&self) -> f32 {
        if self.sample_rate == 0.0 {
            1.0
        } else {
            self.sample_rate
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_owned(),
            port: DEFAULT_PORT,
            project: String::new(),
            enable: true,
            sample_rate: 0.0,
        }
    }
}
