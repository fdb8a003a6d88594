// Tempo - A coalescing Statsd client for Rust!
//
// Copyright 2026 Tempo Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::types::MetricSample;
use crossbeam_channel::{self, Receiver, Sender, TrySendError};
use log::{debug, error, warn};
use std::fmt;
use std::panic::RefUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once, PoisonError, RwLock};
use std::thread;
use std::time::{Duration, Instant};

/// Default number of metrics that may be waiting to be sent by the
/// background worker before new ones are dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

// Upper bound on how long stopping waits for queued metrics to be sent.
const STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// Result of handing a metric to a `Dispatcher`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The metric is queued and will be sent by the background worker.
    Queued,
    /// The queue was full (or the dispatcher stopped) and the metric was
    /// discarded.
    Dropped,
}

/// Snapshot of the counters kept by a `Dispatcher`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub submitted: u64,
    pub drained: u64,
    pub dropped: u64,
    pub panics: u64,
}

/// Bounded queue plus a single background worker that sends metrics
/// without making callers wait on the network.
///
/// The worker thread is started the first time a metric is submitted and
/// exactly one is started no matter how many threads submit concurrently.
/// Metrics are handed to the task the dispatcher was created with in the
/// order they were queued.
///
/// Submitting never blocks. When the queue is full the metric is dropped:
/// a warning naming the stat, value, type and sample rate is logged and the
/// `dropped` counter is incremented, but the caller is not given an error.
/// Overflow is an accepted way for metrics to be lost when the transport
/// can't keep up.
///
/// If the task panics, the worker is restarted in a new thread and the
/// remaining queued metrics are still sent.
///
/// Every metric counted as `submitted` is queued ahead of the stop signal,
/// so once `.stop()` returns it has either been sent or the stop timed out.
pub struct Dispatcher {
    worker: Arc<Worker<MetricSample>>,
    started: Once,
    // Held for reading while a metric is queued so that stopping waits for
    // in-flight submissions.
    stopped: RwLock<bool>,
}

impl Dispatcher {
    /// Create a dispatcher with a queue of the given size that runs `task`
    /// for every queued metric.
    pub fn new<F>(capacity: usize, task: F) -> Self
    where
        F: Fn(MetricSample) + Sync + Send + RefUnwindSafe + 'static,
    {
        Dispatcher {
            worker: Arc::new(Worker::new(capacity, task)),
            started: Once::new(),
            stopped: RwLock::new(false),
        }
    }

    /// Queue a metric to be sent by the background worker, without blocking.
    pub fn try_enqueue(&self, sample: MetricSample) -> Submission {
        let stopped = self.stopped.read().unwrap_or_else(PoisonError::into_inner);
        if *stopped {
            self.overflow(&sample, "dispatcher stopped");
            return Submission::Dropped;
        }

        self.start();
        match self.worker.submit(sample) {
            Ok(()) => Submission::Queued,
            Err(e) => {
                let reason = if e.is_full() { "queue full" } else { "queue closed" };
                if let Some(sample) = e.into_inner() {
                    self.overflow(&sample, reason);
                }
                Submission::Dropped
            }
        }
    }

    /// Stop accepting metrics and wait (briefly) for the ones already queued
    /// to be sent.
    ///
    /// Calling this more than once has no further effect.
    pub fn stop(&self) {
        {
            let mut stopped = self.stopped.write().unwrap_or_else(PoisonError::into_inner);
            if *stopped {
                return;
            }
            *stopped = true;
        }

        let deadline = Instant::now() + STOP_TIMEOUT;
        if !self.worker.stop(STOP_TIMEOUT) {
            debug!("timed out asking the dispatch worker to stop, queued metrics may be lost");
            return;
        }

        if self.is_started() && !self.worker.wait_finished(deadline.saturating_duration_since(Instant::now())) {
            debug!("timed out waiting for the dispatch worker to send queued metrics");
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.is_completed()
    }

    pub fn is_stopped(&self) -> bool {
        *self.stopped.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stats(&self) -> DispatchStats {
        self.worker.stats.snapshot()
    }

    fn start(&self) {
        self.started.call_once(|| {
            if let Err(e) = spawn_worker_in_thread(Arc::clone(&self.worker)) {
                error!("unable to start dispatch worker: {}", e);
            }
        });
    }

    // Metrics that can't be queued are dropped and logged, never retried.
    fn overflow(&self, sample: &MetricSample, reason: &str) {
        self.worker.stats.incr_dropped();
        warn!(
            "dropped metric ({}): stat:{}, value:{}, type:{}, sample_rate:{}",
            reason,
            sample.name(),
            sample.value(),
            sample.kind(),
            sample.sample_rate()
        );
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("started", &self.is_started())
            .field("stopped", &self.is_stopped())
            .field("stats", &self.stats())
            .finish()
    }
}

#[derive(Debug, Default)]
struct WorkerStats {
    panics: AtomicU64,
    submitted: AtomicU64,
    drained: AtomicU64,
    dropped: AtomicU64,
}

impl WorkerStats {
    fn incr_panic(&self) {
        self.panics.fetch_add(1, Ordering::Relaxed);
    }

    fn incr_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    fn incr_drained(&self) {
        self.drained.fetch_add(1, Ordering::Relaxed);
    }

    fn incr_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
        }
    }
}

/// Create a thread and run the worker in it to completion
///
/// This function uses a `Sentinel` struct to make sure that any panics from
/// running the worker result in another thread being spawned to start running
/// the worker again.
fn spawn_worker_in_thread<T>(worker: Arc<Worker<T>>) -> std::io::Result<thread::JoinHandle<()>>
where
    T: Send + 'static,
{
    thread::Builder::new().name("tempo-dispatch".to_owned()).spawn(move || {
        let mut sentinel = Sentinel::new(&worker);
        worker.run();
        sentinel.cancel();
    })
}

/// Struct for ensuring a worker runs to completion correctly, without
/// panicking.
///
/// The sentinel will spawn a new thread to continue running the worker
/// in its destructor unless the `.cancel()` method is called after the
/// worker completes (which won't happen if the worker panics).
struct Sentinel<'a, T>
where
    T: Send + 'static,
{
    worker: &'a Arc<Worker<T>>,
    active: bool,
}

impl<'a, T> Sentinel<'a, T>
where
    T: Send + 'static,
{
    fn new(worker: &'a Arc<Worker<T>>) -> Sentinel<'a, T> {
        Sentinel { worker, active: true }
    }

    fn cancel(&mut self) {
        self.active = false;
    }
}

impl<'a, T> Drop for Sentinel<'a, T>
where
    T: Send + 'static,
{
    fn drop(&mut self) {
        if self.active {
            // The worker panicked, keep consuming the queue from a new thread.
            self.worker.stats.incr_panic();
            if let Err(e) = spawn_worker_in_thread(Arc::clone(self.worker)) {
                error!("unable to restart dispatch worker: {}", e);
            }
        }
    }
}

/// Worker to repeatedly run a task consuming entries via a channel.
///
/// The `.run()` method is meant to be called from the background thread
/// while `.submit()` and `.stop()` are called from any other thread. The
/// worker is stopped by a `None` "poison pill" in the channel, so entries
/// queued before `.stop()` are processed before `.run()` returns.
struct Worker<T>
where
    T: Send + 'static,
{
    task: Box<dyn Fn(T) + Sync + Send + RefUnwindSafe + 'static>,
    sender: Sender<Option<T>>,
    receiver: Receiver<Option<T>>,
    finished_tx: Sender<()>,
    finished_rx: Receiver<()>,
    stats: WorkerStats,
}

impl<T> Worker<T>
where
    T: Send + 'static,
{
    fn new<F>(capacity: usize, task: F) -> Worker<T>
    where
        F: Fn(T) + Sync + Send + RefUnwindSafe + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        let (finished_tx, finished_rx) = crossbeam_channel::bounded(1);
        Worker {
            task: Box::new(task),
            sender: tx,
            receiver: rx,
            finished_tx,
            finished_rx,
            stats: WorkerStats::default(),
        }
    }

    fn submit(&self, v: T) -> Result<(), TrySendError<Option<T>>> {
        self.sender.try_send(Some(v))?;
        self.stats.incr_submitted();
        Ok(())
    }

    fn run(&self) {
        for opt in self.receiver.iter() {
            match opt {
                Some(v) => {
                    self.stats.incr_drained();
                    (self.task)(v);
                }
                None => break,
            }
        }

        let _ = self.finished_tx.try_send(());
    }

    // Send the poison pill, waiting up to `timeout` for room in the queue.
    fn stop(&self, timeout: Duration) -> bool {
        self.sender.send_timeout(None, timeout).is_ok()
    }

    fn wait_finished(&self, timeout: Duration) -> bool {
        self.finished_rx.recv_timeout(timeout).is_ok()
    }
}
