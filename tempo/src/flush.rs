// Tempo - A coalescing Statsd client for Rust!
//
// Copyright 2026 Tempo Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::buffer::{BufferedCounter, CounterBuffer};
use crate::encode::encode;
use crate::sinks::MetricSink;
use crate::types::{MetricError, MetricResult};
use crossbeam_channel::{self, select, Sender};
use log::{debug, trace};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default time between two flushes of buffered counters.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);

/// Drain `buffer` and write every entry to `sink` as a counter, returning the
/// number of metrics written successfully.
///
/// Errors are logged and otherwise ignored: whoever incremented the counters
/// has already been told the call succeeded.
pub fn flush_buffer(prefix: &str, buffer: &CounterBuffer, sink: &dyn MetricSink) -> usize {
    write_counters(prefix, buffer.drain(), sink)
}

/// Write already drained counters to `sink`, with the same error handling as
/// `flush_buffer`.
pub fn write_counters(prefix: &str, counters: Vec<BufferedCounter>, sink: &dyn MetricSink) -> usize {
    if counters.is_empty() {
        return 0;
    }

    trace!("flushing {} buffered counters", counters.len());
    let mut written = 0;
    for entry in counters {
        let res = encode(prefix, &entry.to_sample()).and_then(|line| sink.emit(&line).map_err(MetricError::from));
        match res {
            Ok(_) => written += 1,
            Err(e) => debug!("unable to flush counter {}: {}", entry.name(), e),
        }
    }

    written
}

/// Background thread that runs a flush function at a fixed interval until it
/// is stopped.
///
/// Once `.stop()` returns the thread has exited, so the flush function will not
/// be run again.
#[derive(Debug)]
pub struct Flusher {
    stop: Sender<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Flusher {
    /// Spawn the flushing thread, running `flush` every `interval`.
    ///
    /// # Failures
    ///
    /// Fails with `ErrorKind::IoError` if the thread can't be spawned.
    pub fn start<F>(interval: Duration, flush: F) -> MetricResult<Flusher>
    where
        F: Fn() + Send + 'static,
    {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let ticker = crossbeam_channel::tick(interval);

        let handle = thread::Builder::new().name("tempo-flush".to_owned()).spawn(move || loop {
            select! {
                recv(ticker) -> _ => flush(),
                recv(stop_rx) -> _ => break,
            }
        })?;

        Ok(Flusher {
            stop: stop_tx,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Stop the thread and wait for it to exit. Calling this more than once
    /// has no further effect.
    pub fn stop(&self) {
        let handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            let _ = self.stop.send(());
            if handle.join().is_err() {
                debug!("flush thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{flush_buffer, Flusher};
    use crate::buffer::CounterBuffer;
    use crate::sinks::{MetricSink, SpyMetricSink};
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    struct FailingSink;

    impl MetricSink for FailingSink {
        fn emit(&self, _metric: &str) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "no"))
        }
    }

    #[test]
    fn test_flush_buffer_writes_counters() {
        let (rx, sink) = SpyMetricSink::new();
        let buffer = CounterBuffer::new();
        buffer.add("foo", 1, 1.0);
        buffer.add("foo", 1, 1.0);

        assert_eq!(1, flush_buffer("app", &buffer, &sink));
        assert_eq!(b"app.foo:2|c|@1.000000".to_vec(), rx.try_recv().unwrap());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_flush_buffer_empty_sends_nothing() {
        let (rx, sink) = SpyMetricSink::new();
        let buffer = CounterBuffer::new();

        assert_eq!(0, flush_buffer("app", &buffer, &sink));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_flush_buffer_errors_swallowed() {
        let buffer = CounterBuffer::new();
        buffer.add("foo", 1, 1.0);
        buffer.add("bar", 1, 1.0);

        assert_eq!(0, flush_buffer("", &buffer, &FailingSink));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_flusher_emits_on_tick() {
        let (rx, sink) = SpyMetricSink::new();
        let buffer = Arc::new(CounterBuffer::new());
        buffer.add("ticks", 3, 1.0);

        let buffer_ref = Arc::clone(&buffer);
        let flusher = Flusher::start(Duration::from_millis(10), move || {
            flush_buffer("", &buffer_ref, &sink);
        })
        .unwrap();

        let line = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        flusher.stop();
        assert_eq!(b"ticks:3|c|@1.000000".to_vec(), line);
    }

    #[test]
    fn test_flusher_nothing_after_stop() {
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_ref = Arc::clone(&runs);
        let flusher = Flusher::start(Duration::from_millis(5), move || {
            runs_ref.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        thread::sleep(Duration::from_millis(30));
        assert!(flusher.is_running());
        flusher.stop();
        flusher.stop();
        assert!(!flusher.is_running());

        let after_stop = runs.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(after_stop, runs.load(Ordering::SeqCst));
    }
}
