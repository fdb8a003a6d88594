// Tempo - A coalescing Statsd client for Rust!
//
// Copyright 2026 Tempo Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::encode::SampleRate;
use crate::types::MetricResult;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Make sure a sample rate is within `[0, 1]`.
///
/// # Errors
///
/// Returns an `ErrorKind::InvalidSampleRate` error when `rate < 0`, `rate > 1`
/// or `rate` is not a number.
pub fn check_sample_rate(rate: f32) -> MetricResult<()> {
    SampleRate::try_from(rate).map(|_| ())
}

/// Decides whether a single call with the given sample rate is sent.
///
/// Implementations must always fire for a rate of `1` and never fire for
/// a rate of `0`.
pub trait Sampling {
    fn should_fire(&self, rate: f32) -> bool;
}

/// `Sampling` implementation backed by a single random source reused for
/// every decision.
///
/// The source is seeded from the operating system by default. Any other
/// `RngCore` can be supplied, which is mostly useful to get reproducible
/// sampling in tests.
pub struct Sampler {
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl Sampler {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn from_rng<R>(rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        Sampler {
            rng: Mutex::new(Box::new(rng)),
        }
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampling for Sampler {
    fn should_fire(&self, rate: f32) -> bool {
        if rate >= 1.0 {
            return true;
        }

        if rate.is_nan() || rate <= 0.0 {
            return false;
        }

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen::<f32>() <= rate
    }
}

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sampler {{ ... }}")
    }
}

/// `Sampling` implementation that fires for every non-zero rate.
///
/// Useful when the output of a client needs to be deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysSample;

impl Sampling for AlwaysSample {
    fn should_fire(&self, rate: f32) -> bool {
        rate > 0.0
    }
}
