// Tempo - A coalescing Statsd client for Rust!
//
// Copyright 2026 Tempo Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::error;
use std::fmt;
use std::io;

/// Kind of metric that knows its Statsd type code.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MetricKind {
    Count,
    Gauge,
    FloatGauge,
    Timer,
}

impl MetricKind {
    /// Type code used on the wire for this kind of metric.
    pub fn type_code(&self) -> &'static str {
        match *self {
            MetricKind::Count => "c",
            MetricKind::Gauge | MetricKind::FloatGauge => "g",
            MetricKind::Timer => "ms",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.type_code().fmt(f)
    }
}

/// Holder for primitive metric values that knows how to display itself
///
/// Integer values are written as-is and floating point values use their
/// shortest representation, so `2.0` is written as `2` and `1.5` as `1.5`.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum MetricValue {
    Signed(i64),
    Float(f64),
}

impl MetricValue {
    pub(crate) fn is_negative(&self) -> bool {
        match *self {
            MetricValue::Signed(v) => v < 0,
            MetricValue::Float(v) => v < 0.0,
        }
    }

    // Value of the same numeric type used to reset a gauge before a negative
    // value is sent.
    pub(crate) fn zero_like(&self) -> MetricValue {
        match *self {
            MetricValue::Signed(_) => MetricValue::Signed(0),
            MetricValue::Float(_) => MetricValue::Float(0.0),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MetricValue::Signed(v) => v.fmt(f),
            MetricValue::Float(v) => v.fmt(f),
        }
    }
}

/// A single observation to be sent to a Statsd server.
///
/// Samples are immutable once constructed. The sample rate is carried along
/// with the value so that the server can compensate for sampled-out calls.
#[derive(Debug, PartialEq, Clone)]
pub struct MetricSample {
    name: String,
    value: MetricValue,
    kind: MetricKind,
    sample_rate: f32,
}

impl MetricSample {
    pub fn new<S: Into<String>>(name: S, value: MetricValue, kind: MetricKind, sample_rate: f32) -> MetricSample {
        MetricSample {
            name: name.into(),
            value,
            kind,
            sample_rate,
        }
    }

    /// Counter increment (or decrement, when negative).
    pub fn count<S: Into<String>>(name: S, count: i64, sample_rate: f32) -> MetricSample {
        Self::new(name, MetricValue::Signed(count), MetricKind::Count, sample_rate)
    }

    /// Integer gauge value.
    pub fn gauge<S: Into<String>>(name: S, value: i64, sample_rate: f32) -> MetricSample {
        Self::new(name, MetricValue::Signed(value), MetricKind::Gauge, sample_rate)
    }

    /// Floating point gauge value.
    pub fn fgauge<S: Into<String>>(name: S, value: f64, sample_rate: f32) -> MetricSample {
        Self::new(name, MetricValue::Float(value), MetricKind::FloatGauge, sample_rate)
    }

    /// Timing in whole milliseconds.
    pub fn timer<S: Into<String>>(name: S, millis: i64, sample_rate: f32) -> MetricSample {
        Self::new(name, MetricValue::Signed(millis), MetricKind::Timer, sample_rate)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> MetricValue {
        self.value
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    // Same metric with a different value and rate, used for the gauge reset.
    pub(crate) fn with_value(&self, value: MetricValue, sample_rate: f32) -> MetricSample {
        MetricSample::new(self.name.clone(), value, self.kind, sample_rate)
    }
}

/// Potential categories an error from this library falls into.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    /// The transport is absent or the client has been closed.
    NotConnected,
    /// A non-positive count was given to a counter operation.
    InvalidCount,
    /// A sample rate outside of `[0, 1]` was given.
    InvalidSampleRate,
    InvalidInput,
    IoError,
}

/// Error generated by this library potentially wrapping another
/// type of error (exposed via the `Error` trait).
#[derive(Debug)]
pub struct MetricError {
    repr: ErrorRepr,
}

#[derive(Debug)]
enum ErrorRepr {
    WithDescription(ErrorKind, &'static str),
    IoError(io::Error),
}

impl MetricError {
    /// Return the kind of the error
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::IoError(ref err) if err.kind() == io::ErrorKind::NotConnected => ErrorKind::NotConnected,
            ErrorRepr::IoError(_) => ErrorKind::IoError,
            ErrorRepr::WithDescription(kind, _) => kind,
        }
    }

    pub(crate) fn not_connected() -> MetricError {
        MetricError::from((
            ErrorKind::NotConnected,
            "can't send stats, not connected to Statsd server",
        ))
    }
}

impl fmt::Display for MetricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr {
            ErrorRepr::IoError(ref err) => err.fmt(f),
            ErrorRepr::WithDescription(_, desc) => desc.fmt(f),
        }
    }
}

impl error::Error for MetricError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.repr {
            ErrorRepr::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for MetricError {
    fn from(err: io::Error) -> MetricError {
        MetricError {
            repr: ErrorRepr::IoError(err),
        }
    }
}

impl From<(ErrorKind, &'static str)> for MetricError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> MetricError {
        MetricError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

pub type MetricResult<T> = Result<T, MetricError>;
