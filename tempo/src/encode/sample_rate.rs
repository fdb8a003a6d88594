use super::byte_str::ByteStr;
use crate::types::{ErrorKind, MetricError};
use std::fmt::Write;

/// Sample rate of a metric, validated to be within `[0, 1]` and pre-rendered
/// in the `@<rate>` form used on the wire.
///
/// The rate is always written with six decimal places (`@1.000000`,
/// `@0.500000`) so every metric line carries it, including unsampled ones.
#[derive(Debug, Clone, Copy)]
pub struct SampleRate {
    value: f32,
    outbuf: ByteStr<16>, // "@0.000000" is 9 bytes, no allocation needed
}

impl SampleRate {
    fn new(value: f32) -> Self {
        let mut outbuf = ByteStr::<16>::new();
        let _ = write!(&mut outbuf, "@{:.6}", value);

        Self { value, outbuf }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        self.outbuf.as_str()
    }
}

impl TryFrom<f32> for SampleRate {
    type Error = MetricError;

    fn try_from(rate: f32) -> Result<Self, Self::Error> {
        if (0.0..=1.0).contains(&rate) {
            Ok(Self::new(rate))
        } else {
            Err(MetricError::from((
                ErrorKind::InvalidSampleRate,
                "sample rate larger than 1 or less than 0",
            )))
        }
    }
}
