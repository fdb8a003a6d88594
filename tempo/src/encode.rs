// Tempo - A coalescing Statsd client for Rust!
//
// Copyright 2026 Tempo Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Formatting of metrics into the Statsd line protocol.
//!
//! Every metric is written as a single line without a trailing newline:
//!
//! ``` text
//! [<prefix>.]<bucket>:<value>|<type>|@<sample rate>
//! ```
//!
//! For example, `my.app.some.counter:3|c|@1.000000` or `mem:-5|g|@0.500000`.

mod byte_str;
mod sample_rate;

pub use self::sample_rate::SampleRate;

use crate::types::{MetricKind, MetricResult, MetricSample, MetricValue};
use std::fmt::Write;

/// Normalize a metric prefix so that it can be joined to a bucket name.
///
/// Trailing separators are removed, they are added back when formatting.
pub fn trim_prefix(prefix: &str) -> &str {
    prefix.trim_end_matches('.')
}

/// Format a single metric as a Statsd line, using the given prefix (if any).
///
/// # Errors
///
/// Fails with `ErrorKind::InvalidSampleRate` if the sample rate of the metric
/// is not within `[0, 1]`.
///
/// # Example
///
/// ```
/// use tempo::{encode, MetricSample};
///
/// let sample = MetricSample::gauge("mem", -5, 1.0);
/// assert_eq!("mem:-5|g|@1.000000", encode("", &sample).unwrap());
///
/// let sample = MetricSample::count("some.counter", 3, 0.5);
/// assert_eq!("my.app.some.counter:3|c|@0.500000", encode("my.app", &sample).unwrap());
/// ```
pub fn encode(prefix: &str, sample: &MetricSample) -> MetricResult<String> {
    let rate = SampleRate::try_from(sample.sample_rate())?;
    Ok(MetricFormatter::new(prefix, sample.name(), sample.value(), sample.kind(), rate).format())
}

#[derive(Debug, Clone)]
pub(crate) struct MetricFormatter<'a> {
    prefix: &'a str,
    key: &'a str,
    val: MetricValue,
    kind: MetricKind,
    rate: SampleRate,
    size_hint: usize,
}

impl<'a> MetricFormatter<'a> {
    #[rustfmt::skip]
    pub(crate) fn new(prefix: &'a str, key: &'a str, val: MetricValue, kind: MetricKind, rate: SampleRate) -> Self {
        let prefix = trim_prefix(prefix);
        MetricFormatter {
            prefix,
            key,
            val,
            kind,
            rate,
            size_hint: prefix.len() + 1 /* . */ + key.len() + 1 /* : */ + 20 /* value */
                + 1 /* | */ + 2 /* type */ + 1 /* | */ + rate.as_str().len(),
        }
    }

    fn write_base_metric(&self, out: &mut String) {
        if !self.prefix.is_empty() {
            out.push_str(self.prefix);
            out.push('.');
        }
        let _ = write!(out, "{}:{}|{}", self.key, self.val, self.kind);
    }

    fn write_sample_rate(&self, out: &mut String) {
        out.push('|');
        out.push_str(self.rate.as_str());
    }

    pub(crate) fn format(&self) -> String {
        let mut metric_string = String::with_capacity(self.size_hint);
        self.write_base_metric(&mut metric_string);
        self.write_sample_rate(&mut metric_string);
        metric_string
    }
}

#[cfg(test)]
mod tests {
    use super::{encode, trim_prefix};
    use crate::types::{ErrorKind, MetricKind, MetricSample, MetricValue};

    #[test]
    fn test_encode_counter_with_prefix() {
        let sample = MetricSample::count("some.counter", 4, 1.0);
        assert_eq!("prefix.some.counter:4|c|@1.000000", encode("prefix", &sample).unwrap());
    }

    #[test]
    fn test_encode_prefix_trailing_dots_trimmed() {
        let sample = MetricSample::count("some.counter", 4, 1.0);
        assert_eq!("prefix.some.counter:4|c|@1.000000", encode("prefix..", &sample).unwrap());
    }

    #[test]
    fn test_encode_empty_prefix() {
        let sample = MetricSample::gauge("mem", 0, 1.0);
        assert_eq!("mem:0|g|@1.000000", encode("", &sample).unwrap());
    }

    #[test]
    fn test_encode_timer() {
        let sample = MetricSample::timer("db.query", 1500, 0.25);
        assert_eq!("app.db.query:1500|ms|@0.250000", encode("app", &sample).unwrap());
    }

    #[test]
    fn test_encode_float_gauge_keeps_float_representation() {
        let sample = MetricSample::fgauge("load", 0.75, 1.0);
        assert_eq!("load:0.75|g|@1.000000", encode("", &sample).unwrap());

        let sample = MetricSample::fgauge("load", 2.0, 1.0);
        assert_eq!("load:2|g|@1.000000", encode("", &sample).unwrap());
    }

    #[test]
    fn test_encode_negative_counter() {
        let sample = MetricSample::new("jobs", MetricValue::Signed(-3), MetricKind::Count, 1.0);
        assert_eq!("jobs:-3|c|@1.000000", encode("", &sample).unwrap());
    }

    #[test]
    fn test_encode_invalid_sample_rate() {
        let sample = MetricSample::count("jobs", 1, 1.5);
        assert_eq!(ErrorKind::InvalidSampleRate, encode("", &sample).unwrap_err().kind());
    }

    #[test]
    fn test_trim_prefix() {
        assert_eq!("a.b", trim_prefix("a.b."));
        assert_eq!("", trim_prefix("."));
        assert_eq!("", trim_prefix(""));
    }
}
