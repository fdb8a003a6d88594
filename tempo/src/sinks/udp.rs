// Tempo - A coalescing Statsd client for Rust!
//
// Copyright 2026 Tempo Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::{PoisonError, RwLock};
use std::thread;
use std::time::Duration;

use crate::sinks::core::MetricSink;
use crate::types::{ErrorKind, MetricError, MetricResult};

/// Resolve anything implementing `ToSocketAddrs` into the first concrete
/// `SocketAddr`, giving up after `timeout`.
///
/// Resolution may block on DNS for an unbounded amount of time so it runs
/// on a helper thread. If the timeout expires that thread is left to finish
/// on its own and its result is discarded.
fn get_addr<A>(addr: A, timeout: Duration) -> MetricResult<SocketAddr>
where
    A: ToSocketAddrs + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::Builder::new()
        .name("tempo-resolve".to_owned())
        .spawn(move || {
            let res = addr.to_socket_addrs().map(|mut addrs| addrs.next());
            let _ = tx.send(res);
        })?;

    match rx.recv_timeout(timeout) {
        Ok(Ok(Some(addr))) => Ok(addr),
        Ok(Ok(None)) => Err(MetricError::from((
            ErrorKind::NotConnected,
            "No socket addresses yielded",
        ))),
        Ok(Err(_)) => Err(MetricError::from((
            ErrorKind::NotConnected,
            "Unable to resolve Statsd server address",
        ))),
        Err(_) => Err(MetricError::from((
            ErrorKind::NotConnected,
            "Timed out resolving Statsd server address",
        ))),
    }
}

/// Implementation of a `MetricSink` that emits metrics over UDP.
///
/// Each metric is sent as its own datagram when the `.emit()` method is
/// called, in the thread of the caller. The socket is connected to the
/// Statsd server so that errors reported by the network stack (an ICMP
/// "port unreachable" for example) are surfaced on later writes.
///
/// The socket is released when the sink is closed, after which every write
/// fails with `io::ErrorKind::NotConnected`.
#[derive(Debug)]
pub struct UdpMetricSink {
    addr: SocketAddr,
    socket: RwLock<Option<UdpSocket>>,
}

impl UdpMetricSink {
    /// Construct a new `UdpMetricSink` connected to the given Statsd server.
    ///
    /// UDP is connectionless so this only validates that the address can be
    /// resolved (within `timeout`), not that a server is listening. A local
    /// socket is bound to an ephemeral port of the same address family as the
    /// server and put in non-blocking mode.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use tempo::{UdpMetricSink, DEFAULT_PORT};
    ///
    /// let host = ("metrics.example.com", DEFAULT_PORT);
    /// let sink = UdpMetricSink::connect(host, Duration::from_secs(10)).unwrap();
    /// ```
    ///
    /// # Failures
    ///
    /// This method may fail if:
    ///
    /// * It is unable to resolve the hostname of the metric server, or it
    ///   takes longer than `timeout` to do so (`ErrorKind::NotConnected`).
    /// * A local socket cannot be bound or configured (`ErrorKind::IoError`).
    pub fn connect<A>(to_addr: A, timeout: Duration) -> MetricResult<UdpMetricSink>
    where
        A: ToSocketAddrs + Send + 'static,
    {
        let addr = get_addr(to_addr, timeout)?;
        let local: SocketAddr = if addr.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };

        let socket = UdpSocket::bind(local)?;
        socket.connect(addr)?;
        socket.set_nonblocking(true)?;

        Ok(UdpMetricSink {
            addr,
            socket: RwLock::new(Some(socket)),
        })
    }

    /// Address of the Statsd server metrics are sent to.
    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl MetricSink for UdpMetricSink {
    fn emit(&self, metric: &str) -> io::Result<usize> {
        let socket = self.socket.read().unwrap_or_else(PoisonError::into_inner);
        match socket.as_ref() {
            Some(s) => s.send(metric.as_bytes()),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "socket closed")),
        }
    }

    fn close(&self) -> io::Result<()> {
        let mut socket = self.socket.write().unwrap_or_else(PoisonError::into_inner);
        // dropping the socket closes it
        socket.take();
        Ok(())
    }
}
