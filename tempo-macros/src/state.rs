// Tempo - A coalescing Statsd client for Rust!
//
// Copyright 2026 Tempo Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use log::error;
use std::cell::UnsafeCell;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tempo::{Config, StatsdClient};

const UNSET: usize = 0;
const LOADING: usize = 1;
const COMPLETE: usize = 2;
const FAILED: usize = 3;

/// Configuration recorded by `setup`
static CONFIG: SingletonHolder<Config> = SingletonHolder::new();

/// Global default StatsdClient to be used by macros
static HOLDER: SingletonHolder<StatsdClient> = SingletonHolder::new();

/// Holder to allow global reads of a value from multiple threads while
/// allowing the value to be written (set) a single time.
///
/// The value is either given directly with `.set()` or created on first use
/// with `.get_or_try_init()`. When creating it fails the holder stays empty
/// for good.
///
/// This type is public to allow it to be used in integration tests for
/// this crate but it is not part of the public API and may change at any
/// time.
#[doc(hidden)]
#[derive(Debug, Default)]
pub struct SingletonHolder<T> {
    value: UnsafeCell<Option<Arc<T>>>,
    state: AtomicUsize,
}

impl<T> SingletonHolder<T> {
    /// Create a new empty holder
    pub const fn new() -> Self {
        SingletonHolder {
            value: UnsafeCell::new(None),
            state: AtomicUsize::new(UNSET),
        }
    }

    /// Get a pointer to the contained value if set, None otherwise
    pub fn get(&self) -> Option<Arc<T>> {
        if !self.is_set() {
            return None;
        }

        // SAFETY: the state is "complete" so the value was written by the
        // thread that moved it to "loading" and won't be written again.
        unsafe { &*self.value.get() }.clone()
    }

    pub fn is_set(&self) -> bool {
        COMPLETE == self.state.load(Ordering::Acquire)
    }

    pub fn is_failed(&self) -> bool {
        FAILED == self.state.load(Ordering::Acquire)
    }

    /// Set the value if it has not already been set (or attempted to be),
    /// returning true if this call set it.
    pub fn set(&self, val: T) -> bool {
        if !self.begin() {
            return false;
        }

        self.complete(val);
        true
    }

    /// Get the value, creating it with `init` if this is the first use.
    ///
    /// `init` runs at most once over the lifetime of the holder. Threads that
    /// call this while another one is running `init` wait for it to finish. If
    /// `init` returns `None` the holder is marked as failed and every later call
    /// returns `None` without running anything.
    pub fn get_or_try_init<F>(&self, init: F) -> Option<Arc<T>>
    where
        F: FnOnce() -> Option<T>,
    {
        let mut init = Some(init);
        loop {
            match self.state.load(Ordering::Acquire) {
                COMPLETE => return self.get(),
                FAILED => return None,
                LOADING => thread::yield_now(),
                _ => {
                    if !self.begin() {
                        continue;
                    }

                    match init.take().and_then(|f| f()) {
                        Some(val) => self.complete(val),
                        None => self.state.store(FAILED, Ordering::Release),
                    }
                }
            }
        }
    }

    // Move from "unset" to "loading", giving the caller the exclusive right
    // to write the value.
    fn begin(&self) -> bool {
        self.state
            .compare_exchange(UNSET, LOADING, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    fn complete(&self, val: T) {
        // SAFETY: There are no readers at this point since we've guaranteed the
        // state could not have been "complete". There are no other writers since
        // we've ensured that the state was previously "unset" and we've been able
        // to compare-and-swap it to "loading".
        let ptr = self.value.get();
        unsafe {
            *ptr = Some(Arc::new(val));
        }

        self.state.store(COMPLETE, Ordering::Release);
    }
}

unsafe impl<T: Send> Send for SingletonHolder<T> {}

unsafe impl<T: Send + Sync> Sync for SingletonHolder<T> {}

/// Error indicating that no global default `StatsdClient` is available when
/// a call to `get_global_default` was made: neither `set_global_default` nor
/// `setup` (with an enabled configuration) was called, or the client could not
/// be connected.
#[derive(Debug)]
pub struct GlobalDefaultNotSet;

impl Display for GlobalDefaultNotSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt("global default StatsdClient instance not set", f)
    }
}

impl Error for GlobalDefaultNotSet {}

/// Record the configuration used to create the global default client.
///
/// Only the first call has any effect. The client itself is created (and
/// connected over UDP) the first time a metric is sent with one of the
/// macros, unless `set_global_default` provided one already. When the
/// configuration is disabled no client is ever created and the macros do
/// nothing.
///
/// # Example
///
/// ```
/// use tempo::Config;
///
/// tempo_macros::setup(Config {
///     project: "my.app".to_owned(),
///     enable: false,
///     ..Config::default()
/// });
///
/// // disabled, nothing is sent
/// tempo_macros::statsd_incr!("requests", 1);
/// assert!(tempo_macros::get_global_default().is_err());
/// ```
pub fn setup(config: Config) {
    CONFIG.set(config);
}

/// Set the global default `StatsdClient` instance
///
/// If the global default client has already been set (or created from the
/// configuration given to `setup`), this method does nothing.
///
/// # Example
///
/// ```
/// use tempo::{StatsdClient, NopMetricSink};
/// let client = StatsdClient::from_sink("my.prefix", NopMetricSink).unwrap();
///
/// tempo_macros::set_global_default(client);
/// ```
pub fn set_global_default(client: StatsdClient) {
    HOLDER.set(client);
}

/// Get a reference to the global default `StatsdClient` instance, creating
/// it from the configuration given to `setup` if needed.
///
/// # Errors
///
/// This method will return an error if there is no client to use: one was
/// never set, the configuration is missing or disabled, or connecting the
/// client failed.
///
/// # Example
///
/// ```
/// use tempo::{StatsdClient, NopMetricSink};
///
/// let global_client = tempo_macros::get_global_default();
/// assert!(global_client.is_err());
///
/// let client = StatsdClient::from_sink("my.prefix", NopMetricSink).unwrap();
/// tempo_macros::set_global_default(client);
///
/// let global_client = tempo_macros::get_global_default();
/// assert!(global_client.is_ok());
/// ```
pub fn get_global_default() -> Result<Arc<StatsdClient>, GlobalDefaultNotSet> {
    global_client().ok_or(GlobalDefaultNotSet)
}

/// Return true if the global default `StatsdClient` is set, false otherwise
///
/// # Example
///
/// ```
/// use tempo::{StatsdClient, NopMetricSink};
///
/// assert!(!tempo_macros::is_global_default_set());
///
/// let client = StatsdClient::from_sink("my.prefix", NopMetricSink).unwrap();
/// tempo_macros::set_global_default(client);
///
/// assert!(tempo_macros::is_global_default_set());
/// ```
pub fn is_global_default_set() -> bool {
    HOLDER.is_set()
}

pub(crate) fn global_client() -> Option<Arc<StatsdClient>> {
    if let Some(client) = HOLDER.get() {
        return Some(client);
    }

    // Nothing is attempted until an enabled configuration exists, so that a
    // metric sent before `setup` doesn't disable the global client for good.
    let config = CONFIG.get()?;
    if !config.enable {
        return None;
    }

    HOLDER.get_or_try_init(|| match StatsdClient::from_config(&config) {
        Ok(client) => Some(client),
        Err(e) => {
            error!("unable to connect to Statsd server at {}, metrics are disabled: {}", config.addr(), e);
            None
        }
    })
}
