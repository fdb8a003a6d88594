// Tempo - A coalescing Statsd client for Rust!
//
// Copyright 2026 Tempo Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

/// Increment a counter using the global client, optionally with a sample rate
///
/// The counter uses the prefix of the global client combined with the
/// provided key, and the default sample rate of the client when none is
/// given. Increments are coalesced by the client and sent by its next flush.
///
/// Does nothing when there is no global client. Invalid arguments are logged.
///
/// # Examples
///
/// ```
/// use tempo::{StatsdClient, NopMetricSink};
/// use tempo_macros::statsd_incr;
///
/// let client = StatsdClient::from_sink("my.prefix", NopMetricSink).unwrap();
/// tempo_macros::set_global_default(client);
///
/// // "my.prefix.some.counter:1|c|@1.000000"
/// statsd_incr!("some.counter", 1);
/// // "my.prefix.some.counter:1|c|@0.500000", half of the time
/// statsd_incr!("some.counter", 1, 0.5);
/// ```
#[macro_export]
macro_rules! statsd_incr {
    ($key:expr, $val:expr) => {
        $crate::__private::incr($key, $val, ::std::option::Option::None)
    };

    ($key:expr, $val:expr, $rate:expr) => {
        $crate::__private::incr($key, $val, ::std::option::Option::Some($rate))
    };
}

/// Set a gauge using the global client, optionally with a sample rate
///
/// Negative values are sent after a reset of the gauge to zero.
///
/// Does nothing when there is no global client.
///
/// # Examples
///
/// ```
/// use tempo::{StatsdClient, NopMetricSink};
/// use tempo_macros::statsd_gauge;
///
/// let client = StatsdClient::from_sink("my.prefix", NopMetricSink).unwrap();
/// tempo_macros::set_global_default(client);
///
/// // "my.prefix.some.gauge:42|g|@1.000000"
/// statsd_gauge!("some.gauge", 42);
/// statsd_gauge!("some.gauge", -3, 0.25);
/// ```
#[macro_export]
macro_rules! statsd_gauge {
    ($key:expr, $val:expr) => {
        $crate::__private::gauge($key, $val, ::std::option::Option::None)
    };

    ($key:expr, $val:expr, $rate:expr) => {
        $crate::__private::gauge($key, $val, ::std::option::Option::Some($rate))
    };
}

/// Set a floating point gauge using the global client, optionally with a
/// sample rate
///
/// # Examples
///
/// ```
/// use tempo::{StatsdClient, NopMetricSink};
/// use tempo_macros::statsd_fgauge;
///
/// let client = StatsdClient::from_sink("my.prefix", NopMetricSink).unwrap();
/// tempo_macros::set_global_default(client);
///
/// // "my.prefix.load:0.75|g|@1.000000"
/// statsd_fgauge!("load", 0.75);
/// ```
#[macro_export]
macro_rules! statsd_fgauge {
    ($key:expr, $val:expr) => {
        $crate::__private::fgauge($key, $val, ::std::option::Option::None)
    };

    ($key:expr, $val:expr, $rate:expr) => {
        $crate::__private::fgauge($key, $val, ::std::option::Option::Some($rate))
    };
}

/// Record a `Duration` as a timing in whole milliseconds using the global
/// client, optionally with a sample rate
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tempo::{StatsdClient, NopMetricSink};
/// use tempo_macros::statsd_timing;
///
/// let client = StatsdClient::from_sink("my.prefix", NopMetricSink).unwrap();
/// tempo_macros::set_global_default(client);
///
/// // "my.prefix.db.query:13|ms|@1.000000"
/// statsd_timing!("db.query", Duration::from_millis(13));
/// statsd_timing!("db.query", Duration::from_millis(13), 0.1);
/// ```
#[macro_export]
macro_rules! statsd_timing {
    ($key:expr, $val:expr) => {
        $crate::__private::timing($key, $val, ::std::option::Option::None)
    };

    ($key:expr, $val:expr, $rate:expr) => {
        $crate::__private::timing($key, $val, ::std::option::Option::Some($rate))
    };
}
