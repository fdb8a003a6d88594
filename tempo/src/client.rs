// Tempo - A coalescing Statsd client for Rust!
//
// Copyright 2026 Tempo Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::buffer::CounterBuffer;
use crate::config::Config;
use crate::dispatch::{DispatchStats, Dispatcher, DEFAULT_QUEUE_CAPACITY};
use crate::encode::{encode, trim_prefix};
use crate::flush::{flush_buffer, write_counters, Flusher, DEFAULT_FLUSH_INTERVAL};
use crate::sampler::{check_sample_rate, Sampler, Sampling};
use crate::sinks::{MetricSink, UdpMetricSink};
use crate::types::{ErrorKind, MetricError, MetricKind, MetricResult, MetricSample, MetricValue};
use crate::DEFAULT_CONNECT_TIMEOUT;
use log::debug;
use rand::RngCore;
use std::fmt;
use std::net::ToSocketAddrs;
use std::panic::RefUnwindSafe;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

const CONNECTED: u8 = 0;
const CLOSED: u8 = 1;

/// Whether a client can still be used to send metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Connected,
    Closed,
}

/// How a metric that passed validation and sampling reaches the sink.
///
/// Each strategy has its own error contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    /// Coalesced into the counter buffer and written by the next flush.
    /// Write errors are logged, never returned.
    Buffered,
    /// Written in the thread of the caller. Write errors are returned.
    Immediate,
    /// Handed to the background dispatcher. Write errors are logged and a
    /// full queue drops the metric.
    Queued,
}

// State used by the caller threads as well as the flush and dispatch threads.
struct Shared {
    prefix: String,
    sink: Box<dyn MetricSink + Sync + Send + RefUnwindSafe>,
    buffer: CounterBuffer,
}

impl Shared {
    fn send(&self, sample: &MetricSample) -> MetricResult<()> {
        let line = encode(&self.prefix, sample)?;
        self.sink.emit(&line)?;
        Ok(())
    }

    // Statsd reads a leading "-" on a gauge as a decrement of the current
    // value, so a negative value is only set after resetting the gauge to 0.
    fn send_value(&self, sample: &MetricSample) -> MetricResult<()> {
        let value = sample.value();
        if matches!(sample.kind(), MetricKind::Gauge | MetricKind::FloatGauge) && value.is_negative() {
            self.send(&sample.with_value(value.zero_like(), 1.0))?;
        }
        self.send(sample)
    }

    fn flush(&self) -> usize {
        flush_buffer(&self.prefix, &self.buffer, &*self.sink)
    }

    // Final flush. Increments racing with it are rejected by the buffer.
    fn close_buffer(&self) -> usize {
        write_counters(&self.prefix, self.buffer.close(), &*self.sink)
    }
}

/// Builder for creating and customizing `StatsdClient` instances.
///
/// Instances of the builder should be created by calling the `::builder()`
/// method on the `StatsdClient` struct.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tempo::{NopMetricSink, StatsdClient};
///
/// let client = StatsdClient::builder("my.app", NopMetricSink)
///     .with_sample_rate(0.5)
///     .with_flush_interval(Duration::from_secs(5))
///     .with_queue_capacity(4096)
///     .build()
///     .unwrap();
///
/// client.incr("requests", 1).unwrap();
/// ```
pub struct StatsdClientBuilder {
    prefix: String,
    sink: Box<dyn MetricSink + Sync + Send + RefUnwindSafe>,
    sampler: Option<Box<dyn Sampling + Sync + Send + RefUnwindSafe>>,
    sample_rate: f32,
    flush_interval: Duration,
    queue_capacity: usize,
}

impl StatsdClientBuilder {
    // Set the required fields and defaults for optional fields
    fn new<T>(prefix: &str, sink: T) -> Self
    where
        T: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        StatsdClientBuilder {
            // required
            prefix: trim_prefix(prefix).to_owned(),
            sink: Box::new(sink),

            // optional with defaults
            sampler: None,
            sample_rate: 1.0,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Sample rate used by the recording methods that don't take one.
    pub fn with_sample_rate(mut self, rate: f32) -> Self {
        self.sample_rate = rate;
        self
    }

    /// Time between two writes of the buffered counters.
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Number of metrics that may wait to be written by the background
    /// dispatcher before new ones are dropped.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Use the given random source for sampling decisions instead of one
    /// seeded from the operating system.
    pub fn with_rng<R>(self, rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        self.with_sampler(Sampler::from_rng(rng))
    }

    /// Use a custom sampling policy.
    pub fn with_sampler<S>(mut self, sampler: S) -> Self
    where
        S: Sampling + Sync + Send + RefUnwindSafe + 'static,
    {
        self.sampler = Some(Box::new(sampler));
        self
    }

    /// Construct a new `StatsdClient` instance based on current settings.
    ///
    /// This starts the thread that periodically flushes buffered counters.
    ///
    /// # Failures
    ///
    /// * The default sample rate is not within `[0, 1]`
    ///   (`ErrorKind::InvalidSampleRate`).
    /// * The flush interval or the queue capacity is zero
    ///   (`ErrorKind::InvalidInput`).
    /// * The flush thread can't be spawned (`ErrorKind::IoError`).
    pub fn build(self) -> MetricResult<StatsdClient> {
        check_sample_rate(self.sample_rate)?;
        if self.flush_interval.is_zero() {
            return Err(MetricError::from((
                ErrorKind::InvalidInput,
                "flush interval must be greater than zero",
            )));
        }
        if self.queue_capacity == 0 {
            return Err(MetricError::from((
                ErrorKind::InvalidInput,
                "queue capacity must be greater than zero",
            )));
        }

        StatsdClient::from_builder(self)
    }
}

/// Client for Statsd that buffers, samples and sends metrics.
///
/// # Delivery
///
/// Metrics reach the Statsd server in one of three ways depending on the
/// method used to record them:
///
/// * Counter increments (`incr`) are coalesced in memory by name and written
///   by a background thread every flush interval (and when the client is
///   closed). Network errors are logged and never returned.
/// * Decrements, timings and gauges are written immediately in the thread of
///   the caller and network errors are returned.
/// * `submit` hands the metric to a background worker through a bounded queue.
///   It never waits on the network: when the queue is full the metric is
///   dropped and a warning is logged.
///
/// # Validation
///
/// Arguments are checked before anything else happens, so a call that fails
/// with `ErrorKind::InvalidSampleRate` or `ErrorKind::InvalidCount` has no
/// effect. Calls that are sampled out return `Ok(())`.
///
/// # Closing
///
/// `close()` stops the background threads, writes any buffered counters one
/// last time, and closes the sink. Afterwards every method fails with
/// `ErrorKind::NotConnected`. Dropping the client closes it.
///
/// # Threading
///
/// The client is `Send` and `Sync` and meant to be shared between threads,
/// typically by wrapping it in an `Arc`.
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use tempo::{NopMetricSink, StatsdClient};
///
/// let client = Arc::new(StatsdClient::from_sink("my.app", NopMetricSink).unwrap());
/// let local = Arc::clone(&client);
///
/// thread::spawn(move || {
///     local.incr("worker.started", 1).unwrap();
/// })
/// .join()
/// .unwrap();
/// ```
pub struct StatsdClient {
    shared: Arc<Shared>,
    sampler: Box<dyn Sampling + Sync + Send + RefUnwindSafe>,
    sample_rate: f32,
    dispatcher: Dispatcher,
    flusher: Flusher,
    state: AtomicU8,
}

impl StatsdClient {
    /// Create a new client instance that will use the given prefix for all
    /// metrics written to the given `MetricSink` implementation, with default
    /// settings.
    ///
    /// # Example
    ///
    /// ```
    /// use tempo::{NopMetricSink, StatsdClient};
    ///
    /// let client = StatsdClient::from_sink("my.stats", NopMetricSink).unwrap();
    /// ```
    pub fn from_sink<T>(prefix: &str, sink: T) -> MetricResult<Self>
    where
        T: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        Self::builder(prefix, sink).build()
    }

    /// Create a new client sending metrics over UDP to the given Statsd server.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tempo::{StatsdClient, DEFAULT_PORT};
    ///
    /// let client = StatsdClient::from_udp_host("my.stats", ("localhost", DEFAULT_PORT)).unwrap();
    /// ```
    ///
    /// # Failures
    ///
    /// Fails with `ErrorKind::NotConnected` if the address can't be resolved
    /// within `DEFAULT_CONNECT_TIMEOUT`.
    pub fn from_udp_host<A>(prefix: &str, host: A) -> MetricResult<Self>
    where
        A: ToSocketAddrs + Send + 'static,
    {
        let sink = UdpMetricSink::connect(host, DEFAULT_CONNECT_TIMEOUT)?;
        Self::from_sink(prefix, sink)
    }

    /// Create a new client from a `Config`, sending metrics over UDP using
    /// the project as prefix and the configured default sample rate.
    pub fn from_config(config: &Config) -> MetricResult<Self> {
        let sink = UdpMetricSink::connect(config.addr(), DEFAULT_CONNECT_TIMEOUT)?;
        Self::builder(&config.project, sink)
            .with_sample_rate(config.sample_rate())
            .build()
    }

    /// Create a new builder with the provided prefix and metric sink.
    ///
    /// The prefix may be empty, in which case metrics are written with only
    /// the names passed to the recording methods. Trailing dots are removed
    /// from the prefix.
    ///
    /// Defaults:
    ///
    /// * Sample rate of `1`.
    /// * Counters flushed every `DEFAULT_FLUSH_INTERVAL`.
    /// * Queue of `DEFAULT_QUEUE_CAPACITY` metrics for `submit`.
    /// * Sampling using a random source seeded from the operating system.
    pub fn builder<T>(prefix: &str, sink: T) -> StatsdClientBuilder
    where
        T: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        StatsdClientBuilder::new(prefix, sink)
    }

    /// Increment a counter by `count`, using the default sample rate.
    pub fn incr(&self, stat: &str, count: i64) -> MetricResult<()> {
        self.incr_with_sampling(stat, count, self.sample_rate)
    }

    /// Increment a counter by `count`.
    ///
    /// The increment is buffered and written by the next flush. Increments of
    /// a name that is already buffered add one to the buffered count.
    pub fn incr_with_sampling(&self, stat: &str, count: i64, rate: f32) -> MetricResult<()> {
        check_sample_rate(rate)?;
        check_count(count)?;
        if !self.admit(rate)? {
            return Ok(());
        }

        self.deliver(MetricSample::count(stat, count, rate), Delivery::Buffered)
    }

    /// Decrement a counter by `count`, using the default sample rate.
    pub fn decr(&self, stat: &str, count: i64) -> MetricResult<()> {
        self.decr_with_sampling(stat, count, self.sample_rate)
    }

    /// Decrement a counter by `count`, writing it immediately.
    pub fn decr_with_sampling(&self, stat: &str, count: i64, rate: f32) -> MetricResult<()> {
        check_sample_rate(rate)?;
        check_count(count)?;
        if !self.admit(rate)? {
            return Ok(());
        }

        self.deliver(MetricSample::count(stat, -count, rate), Delivery::Immediate)
    }

    /// Record a timing, using the default sample rate.
    pub fn timing(&self, stat: &str, duration: Duration) -> MetricResult<()> {
        self.timing_with_sampling(stat, duration, self.sample_rate)
    }

    /// Record a timing in whole milliseconds, writing it immediately.
    ///
    /// # Failures
    ///
    /// Fails with `ErrorKind::InvalidInput` if the duration in milliseconds
    /// doesn't fit in an `i64`.
    pub fn timing_with_sampling(&self, stat: &str, duration: Duration, rate: f32) -> MetricResult<()> {
        check_sample_rate(rate)?;
        let millis = to_millis(duration)?;
        if !self.admit(rate)? {
            return Ok(());
        }

        self.deliver(MetricSample::timer(stat, millis, rate), Delivery::Immediate)
    }

    /// Set a gauge, using the default sample rate.
    pub fn gauge(&self, stat: &str, value: i64) -> MetricResult<()> {
        self.gauge_with_sampling(stat, value, self.sample_rate)
    }

    /// Set a gauge, writing it immediately.
    ///
    /// A negative value is preceded by a reset of the gauge to `0`, sent
    /// with a sample rate of `1`. If the reset can't be written its error is
    /// returned and the value is not sent.
    pub fn gauge_with_sampling(&self, stat: &str, value: i64, rate: f32) -> MetricResult<()> {
        check_sample_rate(rate)?;
        if !self.admit(rate)? {
            return Ok(());
        }

        self.deliver(MetricSample::gauge(stat, value, rate), Delivery::Immediate)
    }

    /// Set a floating point gauge, using the default sample rate.
    pub fn fgauge(&self, stat: &str, value: f64) -> MetricResult<()> {
        self.fgauge_with_sampling(stat, value, self.sample_rate)
    }

    /// Set a floating point gauge, writing it immediately. Negative values are
    /// handled like they are for `gauge_with_sampling`.
    ///
    /// # Failures
    ///
    /// Fails with `ErrorKind::InvalidInput` if the value is NaN or infinite.
    pub fn fgauge_with_sampling(&self, stat: &str, value: f64, rate: f32) -> MetricResult<()> {
        check_sample_rate(rate)?;
        check_float(value)?;
        if !self.admit(rate)? {
            return Ok(());
        }

        self.deliver(MetricSample::fgauge(stat, value, rate), Delivery::Immediate)
    }

    /// Record a metric without waiting on the network.
    ///
    /// Counters are buffered like `incr` does. Everything else is queued for the
    /// background dispatcher which is started on the first call. Network
    /// errors and a full queue are logged but never returned: only invalid
    /// arguments and a closed client are.
    ///
    /// Samples with an empty name are ignored.
    pub fn submit(&self, sample: MetricSample) -> MetricResult<()> {
        if sample.name().is_empty() {
            return Ok(());
        }

        check_sample_rate(sample.sample_rate())?;
        match (sample.kind(), sample.value()) {
            (MetricKind::Count, MetricValue::Signed(count)) => check_count(count)?,
            (MetricKind::Count, MetricValue::Float(_)) => return Err(counter_not_integer()),
            (_, MetricValue::Float(value)) => check_float(value)?,
            (_, MetricValue::Signed(_)) => {}
        }
        if !self.admit(sample.sample_rate())? {
            return Ok(());
        }

        let delivery = if sample.kind() == MetricKind::Count {
            Delivery::Buffered
        } else {
            Delivery::Queued
        };
        self.deliver(sample, delivery)
    }

    /// Write the buffered counters now, returning how many were written.
    ///
    /// Network errors are logged and otherwise ignored, the counters that
    /// couldn't be written are lost.
    pub fn flush(&self) -> MetricResult<usize> {
        self.ensure_connected()?;
        Ok(self.shared.flush())
    }

    /// Stop the background threads, write the buffered counters one last time
    /// and close the sink.
    ///
    /// Metrics still queued for the dispatcher are given a short time to be
    /// written. Closing an already closed client does nothing and returns
    /// `Ok(())`.
    pub fn close(&self) -> MetricResult<()> {
        if self.state.swap(CLOSED, Ordering::AcqRel) == CLOSED {
            return Ok(());
        }

        self.flusher.stop();
        self.shared.close_buffer();
        self.dispatcher.stop();
        self.shared.sink.close()?;
        Ok(())
    }

    /// Whether the client still accepts metrics.
    pub fn state(&self) -> ClientState {
        match self.state.load(Ordering::Acquire) {
            CONNECTED => ClientState::Connected,
            _ => ClientState::Closed,
        }
    }

    /// Sample rate used by the recording methods that don't take one.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Counters of the background dispatcher used by `submit`.
    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    // Create a new StatsdClient by consuming the builder
    fn from_builder(builder: StatsdClientBuilder) -> MetricResult<Self> {
        let shared = Arc::new(Shared {
            prefix: builder.prefix,
            sink: builder.sink,
            buffer: CounterBuffer::new(),
        });

        let queued = Arc::clone(&shared);
        let dispatcher = Dispatcher::new(builder.queue_capacity, move |sample: MetricSample| {
            if let Err(e) = queued.send_value(&sample) {
                debug!("unable to send queued metric {}: {}", sample.name(), e);
            }
        });

        let flushed = Arc::clone(&shared);
        let flusher = Flusher::start(builder.flush_interval, move || {
            flushed.flush();
        })?;

        Ok(StatsdClient {
            shared,
            sampler: builder.sampler.unwrap_or_else(|| Box::new(Sampler::new())),
            sample_rate: builder.sample_rate,
            dispatcher,
            flusher,
            state: AtomicU8::new(CONNECTED),
        })
    }

    fn ensure_connected(&self) -> MetricResult<()> {
        match self.state() {
            ClientState::Connected => Ok(()),
            ClientState::Closed => Err(MetricError::not_connected()),
        }
    }

    // Connection check followed by the sampling gate, run after validation.
    fn admit(&self, rate: f32) -> MetricResult<bool> {
        self.ensure_connected()?;
        Ok(self.sampler.should_fire(rate))
    }

    fn deliver(&self, sample: MetricSample, delivery: Delivery) -> MetricResult<()> {
        match delivery {
            Delivery::Buffered => match sample.value() {
                MetricValue::Signed(count) => {
                    if self.shared.buffer.add(sample.name(), count, sample.sample_rate()) {
                        Ok(())
                    } else {
                        Err(MetricError::not_connected())
                    }
                }
                MetricValue::Float(_) => Err(counter_not_integer()),
            },
            Delivery::Immediate => self.shared.send_value(&sample),
            Delivery::Queued => {
                self.dispatcher.try_enqueue(sample);
                Ok(())
            }
        }
    }
}

impl Drop for StatsdClient {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            debug!("error closing client: {}", e);
        }
    }
}

impl fmt::Debug for StatsdClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StatsdClient {{ prefix: {:?}, sink: ..., sampler: ..., sample_rate: {}, state: {:?}, dispatcher: {:?} }}",
            self.shared.prefix,
            self.sample_rate,
            self.state(),
            self.dispatcher,
        )
    }
}

fn check_count(count: i64) -> MetricResult<()> {
    if count <= 0 {
        Err(MetricError::from((ErrorKind::InvalidCount, "count must be greater than zero")))
    } else {
        Ok(())
    }
}

fn check_float(value: f64) -> MetricResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MetricError::from((ErrorKind::InvalidInput, "value must be a finite number")))
    }
}

fn counter_not_integer() -> MetricError {
    MetricError::from((ErrorKind::InvalidInput, "counter values must be integers"))
}

fn to_millis(duration: Duration) -> MetricResult<i64> {
    i64::try_from(duration.as_millis())
        .map_err(|_| MetricError::from((ErrorKind::InvalidInput, "duration is too large to be sent in milliseconds")))
}

#[cfg(test)]
mod tests {
    use super::{ClientState, StatsdClient};
    use crate::sampler::AlwaysSample;
    use crate::sinks::{MetricSink, NopMetricSink, SpyMetricSink};
    use crate::types::{ErrorKind, MetricKind, MetricSample, MetricValue};
    use crossbeam_channel::Receiver;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::io;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);
    const NEVER: Duration = Duration::from_secs(3600);

    struct FailingSink;

    impl MetricSink for FailingSink {
        fn emit(&self, _metric: &str) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "unreachable"))
        }
    }

    fn spy_client(prefix: &str) -> (Receiver<Vec<u8>>, StatsdClient) {
        let (rx, sink) = SpyMetricSink::new();
        let client = StatsdClient::builder(prefix, sink)
            .with_sampler(AlwaysSample)
            .with_flush_interval(NEVER)
            .build()
            .unwrap();
        (rx, client)
    }

    fn next_line(rx: &Receiver<Vec<u8>>) -> String {
        String::from_utf8(rx.recv_timeout(WAIT).unwrap()).unwrap()
    }

    #[test]
    fn test_statsd_client_negative_gauge_resets_first() {
        let (rx, client) = spy_client("");
        client.gauge("mem", -5).unwrap();

        assert_eq!("mem:0|g|@1.000000", next_line(&rx));
        assert_eq!("mem:-5|g|@1.000000", next_line(&rx));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_statsd_client_negative_gauge_reset_unsampled() {
        let (rx, client) = spy_client("app");
        client.gauge_with_sampling("mem", -5, 0.5).unwrap();

        assert_eq!("app.mem:0|g|@1.000000", next_line(&rx));
        assert_eq!("app.mem:-5|g|@0.500000", next_line(&rx));
    }

    #[test]
    fn test_statsd_client_positive_gauge_no_reset() {
        let (rx, client) = spy_client("app");
        client.gauge("mem", 12).unwrap();

        assert_eq!("app.mem:12|g|@1.000000", next_line(&rx));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_statsd_client_negative_fgauge_resets_to_zero() {
        let (rx, client) = spy_client("");
        client.fgauge("load", -0.5).unwrap();

        assert_eq!("load:0|g|@1.000000", next_line(&rx));
        assert_eq!("load:-0.5|g|@1.000000", next_line(&rx));
    }

    #[test]
    fn test_statsd_client_fgauge_not_finite() {
        let (rx, client) = spy_client("");
        let res = client.fgauge("load", f64::NAN);

        assert_eq!(ErrorKind::InvalidInput, res.unwrap_err().kind());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_statsd_client_timing_whole_millis() {
        let (rx, client) = spy_client("");
        client.timing("req", Duration::from_nanos(1_500_000_000)).unwrap();

        assert_eq!("req:1500|ms|@1.000000", next_line(&rx));
    }

    #[test]
    fn test_statsd_client_timing_overflow() {
        let (_rx, client) = spy_client("");
        let res = client.timing("req", Duration::MAX);

        assert_eq!(ErrorKind::InvalidInput, res.unwrap_err().kind());
    }

    #[test]
    fn test_statsd_client_decr_sends_negative_count() {
        let (rx, client) = spy_client("app");
        client.decr("jobs", 3).unwrap();

        assert_eq!("app.jobs:-3|c|@1.000000", next_line(&rx));
    }

    #[test]
    fn test_statsd_client_incr_coalesced_until_flush() {
        let (rx, client) = spy_client("app");
        client.incr("foo", 1).unwrap();
        client.incr("foo", 1).unwrap();
        assert!(rx.try_recv().is_err());

        assert_eq!(1, client.flush().unwrap());
        assert_eq!("app.foo:2|c|@1.000000", next_line(&rx));
        assert!(rx.try_recv().is_err());
        assert_eq!(0, client.flush().unwrap());
    }

    #[test]
    fn test_statsd_client_incr_concurrent() {
        let (rx, client) = spy_client("");
        let client = Arc::new(client);

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let local = Arc::clone(&client);
                thread::spawn(move || {
                    for _ in 0..100 {
                        local.incr("hits", 1).unwrap();
                    }
                })
            })
            .collect();

        for t in threads {
            t.join().unwrap();
        }

        client.flush().unwrap();
        assert_eq!("hits:800|c|@1.000000", next_line(&rx));
    }

    #[test]
    fn test_statsd_client_incr_saturates_at_max() {
        let (rx, client) = spy_client("");
        client.incr("foo", i64::MAX).unwrap();
        client.incr("foo", 1).unwrap();

        client.flush().unwrap();
        assert_eq!(format!("foo:{}|c|@1.000000", i64::MAX), next_line(&rx));
    }

    #[test]
    fn test_statsd_client_invalid_sample_rate_no_side_effects() {
        let (rx, client) = spy_client("");

        let res = client.incr_with_sampling("foo", 1, 1.5);
        assert_eq!(ErrorKind::InvalidSampleRate, res.unwrap_err().kind());
        let res = client.gauge_with_sampling("foo", 1, -0.1);
        assert_eq!(ErrorKind::InvalidSampleRate, res.unwrap_err().kind());
        let res = client.timing_with_sampling("foo", Duration::from_millis(1), f32::NAN);
        assert_eq!(ErrorKind::InvalidSampleRate, res.unwrap_err().kind());
        let res = client.decr_with_sampling("foo", 1, 1.01);
        assert_eq!(ErrorKind::InvalidSampleRate, res.unwrap_err().kind());
        let res = client.fgauge_with_sampling("foo", 1.5, f32::INFINITY);
        assert_eq!(ErrorKind::InvalidSampleRate, res.unwrap_err().kind());

        assert_eq!(0, client.flush().unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_statsd_client_invalid_count_no_side_effects() {
        let (rx, client) = spy_client("");

        assert_eq!(ErrorKind::InvalidCount, client.incr("foo", 0).unwrap_err().kind());
        assert_eq!(ErrorKind::InvalidCount, client.incr("foo", -3).unwrap_err().kind());
        assert_eq!(ErrorKind::InvalidCount, client.decr("foo", 0).unwrap_err().kind());

        assert_eq!(0, client.flush().unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_statsd_client_invalid_rate_checked_before_closed() {
        let (_rx, client) = spy_client("");
        client.close().unwrap();

        let res = client.incr_with_sampling("foo", 1, 2.0);
        assert_eq!(ErrorKind::InvalidSampleRate, res.unwrap_err().kind());
    }

    #[test]
    fn test_statsd_client_sampled_out_sends_nothing() {
        let (rx, sink) = SpyMetricSink::new();
        let client = StatsdClient::builder("", sink)
            .with_rng(ChaCha8Rng::seed_from_u64(7))
            .with_flush_interval(NEVER)
            .build()
            .unwrap();

        assert!(client.gauge_with_sampling("foo", 1, 0.0).is_ok());
        assert!(client.incr_with_sampling("foo", 1, 0.0).is_ok());

        assert_eq!(0, client.flush().unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_statsd_client_default_sample_rate() {
        let (rx, sink) = SpyMetricSink::new();
        let client = StatsdClient::builder("", sink)
            .with_sampler(AlwaysSample)
            .with_sample_rate(0.25)
            .with_flush_interval(NEVER)
            .build()
            .unwrap();

        client.gauge("foo", 1).unwrap();
        assert_eq!("foo:1|g|@0.250000", next_line(&rx));
    }

    #[test]
    fn test_statsd_client_closed_not_connected() {
        let (rx, client) = spy_client("");
        client.close().unwrap();
        assert_eq!(ClientState::Closed, client.state());

        assert_eq!(ErrorKind::NotConnected, client.incr("foo", 1).unwrap_err().kind());
        assert_eq!(ErrorKind::NotConnected, client.decr("foo", 1).unwrap_err().kind());
        assert_eq!(ErrorKind::NotConnected, client.gauge("foo", 1).unwrap_err().kind());
        assert_eq!(ErrorKind::NotConnected, client.fgauge("foo", 1.0).unwrap_err().kind());
        assert_eq!(
            ErrorKind::NotConnected,
            client.timing("foo", Duration::from_millis(1)).unwrap_err().kind()
        );
        assert_eq!(
            ErrorKind::NotConnected,
            client.submit(MetricSample::gauge("foo", 1, 1.0)).unwrap_err().kind()
        );
        assert_eq!(ErrorKind::NotConnected, client.flush().unwrap_err().kind());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_statsd_client_close_idempotent() {
        let (_rx, client) = spy_client("");
        assert_eq!(ClientState::Connected, client.state());

        assert!(client.close().is_ok());
        assert!(client.close().is_ok());
        assert_eq!(ClientState::Closed, client.state());
    }

    #[test]
    fn test_statsd_client_close_flushes_counters() {
        let (rx, client) = spy_client("app");
        client.incr("foo", 4).unwrap();
        client.close().unwrap();

        assert_eq!("app.foo:4|c|@1.000000", next_line(&rx));
    }

    #[test]
    fn test_statsd_client_close_during_incr_keeps_accepted_counts() {
        let (rx, client) = spy_client("");
        let client = Arc::new(client);

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let local = Arc::clone(&client);
                thread::spawn(move || {
                    let mut accepted: i64 = 0;
                    while local.incr("hits", 1).is_ok() {
                        accepted += 1;
                    }
                    accepted
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        client.close().unwrap();
        let accepted: i64 = threads.into_iter().map(|t| t.join().unwrap()).sum();

        let written: i64 = rx
            .try_iter()
            .map(|line| {
                let line = String::from_utf8(line).unwrap();
                line.trim_start_matches("hits:").trim_end_matches("|c|@1.000000").parse::<i64>().unwrap()
            })
            .sum();
        assert_eq!(accepted, written);
    }

    #[test]
    fn test_statsd_client_drop_closes() {
        let (rx, client) = spy_client("app");
        client.incr("foo", 1).unwrap();
        drop(client);

        assert_eq!("app.foo:1|c|@1.000000", next_line(&rx));
    }

    #[test]
    fn test_statsd_client_flushes_on_interval() {
        let (rx, sink) = SpyMetricSink::new();
        let client = StatsdClient::builder("", sink)
            .with_flush_interval(Duration::from_millis(20))
            .build()
            .unwrap();

        client.incr("tick", 2).unwrap();
        assert_eq!("tick:2|c|@1.000000", next_line(&rx));
    }

    #[test]
    fn test_statsd_client_submit_queued() {
        let (rx, client) = spy_client("app");
        client.submit(MetricSample::gauge("mem", -2, 1.0)).unwrap();
        client.submit(MetricSample::timer("req", 15, 1.0)).unwrap();

        assert_eq!("app.mem:0|g|@1.000000", next_line(&rx));
        assert_eq!("app.mem:-2|g|@1.000000", next_line(&rx));
        assert_eq!("app.req:15|ms|@1.000000", next_line(&rx));
        assert_eq!(2, client.dispatch_stats().submitted);
    }

    #[test]
    fn test_statsd_client_submit_counter_buffered() {
        let (rx, client) = spy_client("");
        client.submit(MetricSample::count("jobs", 3, 1.0)).unwrap();
        assert!(rx.try_recv().is_err());

        client.flush().unwrap();
        assert_eq!("jobs:3|c|@1.000000", next_line(&rx));
        assert_eq!(0, client.dispatch_stats().submitted);
    }

    #[test]
    fn test_statsd_client_submit_empty_name_ignored() {
        let (rx, client) = spy_client("");
        client.submit(MetricSample::gauge("", 1, 1.0)).unwrap();
        client.close().unwrap();

        assert!(rx.try_recv().is_err());
        assert_eq!(0, client.dispatch_stats().submitted);
    }

    #[test]
    fn test_statsd_client_submit_invalid() {
        let (_rx, client) = spy_client("");

        let res = client.submit(MetricSample::count("jobs", 0, 1.0));
        assert_eq!(ErrorKind::InvalidCount, res.unwrap_err().kind());
        let res = client.submit(MetricSample::new("jobs", MetricValue::Float(1.5), MetricKind::Count, 1.0));
        assert_eq!(ErrorKind::InvalidInput, res.unwrap_err().kind());
        let res = client.submit(MetricSample::gauge("jobs", 1, 3.0));
        assert_eq!(ErrorKind::InvalidSampleRate, res.unwrap_err().kind());
    }

    #[test]
    fn test_statsd_client_immediate_errors_returned() {
        let client = StatsdClient::builder("", FailingSink)
            .with_flush_interval(NEVER)
            .build()
            .unwrap();

        assert_eq!(ErrorKind::IoError, client.gauge("foo", 1).unwrap_err().kind());
        assert_eq!(ErrorKind::IoError, client.gauge("foo", -1).unwrap_err().kind());
        assert_eq!(ErrorKind::IoError, client.decr("foo", 1).unwrap_err().kind());
        // buffered and queued paths never report write errors
        assert!(client.incr("foo", 1).is_ok());
        assert!(client.submit(MetricSample::gauge("foo", 1, 1.0)).is_ok());
        assert_eq!(0, client.flush().unwrap());
    }

    #[test]
    fn test_statsd_client_builder_invalid_settings() {
        let res = StatsdClient::builder("", NopMetricSink).with_sample_rate(1.5).build();
        assert_eq!(ErrorKind::InvalidSampleRate, res.unwrap_err().kind());

        let res = StatsdClient::builder("", NopMetricSink)
            .with_flush_interval(Duration::ZERO)
            .build();
        assert_eq!(ErrorKind::InvalidInput, res.unwrap_err().kind());

        let res = StatsdClient::builder("", NopMetricSink).with_queue_capacity(0).build();
        assert_eq!(ErrorKind::InvalidInput, res.unwrap_err().kind());
    }

    #[test]
    fn test_statsd_client_prefix_trailing_dot() {
        let (rx, client) = spy_client("my.app.");
        client.decr("jobs", 1).unwrap();

        assert_eq!("my.app.jobs:-1|c|@1.000000", next_line(&rx));
    }
}
