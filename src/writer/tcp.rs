// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`io::Write`] implementor transmitting over a TCP connection.

use std::{
    fmt, io,
    io::Write as _,
    mem,
    net::{Ipv4Addr, Shutdown, SocketAddr, TcpStream},
    sync::{Arc, Mutex, PoisonError},
    thread,
};

use futures::{
    channel::{mpsc, oneshot},
    executor,
    future::{FutureExt as _, Shared},
    StreamExt as _,
};

use crate::error::{TransportFault, TransportFaultKind};

/// Outcome of a connect or a send, as reported by the transport thread.
type Outcome = Result<(), TransportFault>;

/// Buffer to send along with the channel its [`Outcome`] is reported to.
type Request = (Vec<u8>, oneshot::Sender<Outcome>);

/// [`io::Write`] implementor buffering written bytes and transmitting them to
/// a remote listener on [`flush()`][0].
///
/// Connecting starts immediately on a dedicated transport thread. Bytes
/// written before the connection completes are buffered, never dropped.
///
/// # Flushing
///
/// [`flush()`][0] blocks until the connection completes, failing if it
/// didn't, then waits for any other in-flight send of the same connection,
/// then transmits the buffer and blocks until the transport reports back. The
/// buffer is cleared once transmitted. A failed send is remembered, failing
/// every subsequent [`flush()`][0] of the connection.
///
/// Cloning shares the connection, but not the buffer.
///
/// [0]: io::Write::flush
#[derive(Clone, Debug)]
pub struct TcpWriter {
    /// Connection shared between clones.
    connection: Arc<Connection>,

    /// Bytes written since the last transmission.
    buffer: Vec<u8>,
}

impl TcpWriter {
    /// Starts connecting to the given loopback `port`.
    #[must_use]
    pub fn loopback(port: u16) -> Self {
        Self::connect(SocketAddr::from((Ipv4Addr::LOCALHOST, port)))
    }

    /// Starts connecting to the given `endpoint`.
    #[must_use]
    pub fn connect(endpoint: SocketAddr) -> Self {
        Self {
            connection: Arc::new(Connection::open(endpoint)),
            buffer: Vec::new(),
        }
    }

    /// Remote endpoint of this [`TcpWriter`].
    #[must_use]
    pub fn endpoint(&self) -> SocketAddr {
        self.connection.endpoint
    }

    /// Blocks until the connection completes.
    ///
    /// # Errors
    ///
    /// If the connection failed.
    pub fn wait_connected(&self) -> Result<(), TransportFault> {
        self.connection.wait_connected()
    }
}

impl io::Write for TcpWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.connection.transmit(&mut self.buffer).map_err(Into::into)
    }
}

/// Connection state shared by clones of a [`TcpWriter`].
struct Connection {
    /// Remote endpoint.
    endpoint: SocketAddr,

    /// Resolves once the transport thread finishes connecting.
    connected: Shared<oneshot::Receiver<Outcome>>,

    /// Sends buffers to the transport thread.
    requests: mpsc::UnboundedSender<Request>,

    /// Guard allowing at most one send in flight.
    ///
    /// Holds the fault of the last failed send, if any.
    in_flight: Mutex<Option<TransportFault>>,

    /// Transport thread, joined on drop.
    transport: Mutex<Option<thread::JoinHandle<()>>>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.connected.peek())
            .field("closed", &self.requests.is_closed())
            .finish_non_exhaustive()
    }
}

impl Connection {
    fn open(endpoint: SocketAddr) -> Self {
        let (connected_tx, connected_rx) = oneshot::channel();
        let (requests_tx, requests_rx) = mpsc::unbounded();

        let transport = thread::Builder::new()
            .name("loopunit-transport".into())
            .spawn(move || run_transport(endpoint, connected_tx, requests_rx))
            .map_err(|e| {
                // Dropped channels make every flush fail as `Closed`.
                tracing::error!(error = %e, "failed to spawn transport thread");
            })
            .ok();

        Self {
            endpoint,
            connected: connected_rx.shared(),
            requests: requests_tx,
            in_flight: Mutex::new(None),
            transport: Mutex::new(transport),
        }
    }

    fn wait_connected(&self) -> Outcome {
        executor::block_on(self.connected.clone())
            .unwrap_or_else(|_| Err(TransportFault::closed()))
    }

    fn transmit(&self, buffer: &mut Vec<u8>) -> Outcome {
        if let Err(fault) = self.wait_connected() {
            buffer.clear();
            return Err(fault);
        }

        let mut last_fault =
            self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(fault) = last_fault.as_ref() {
            buffer.clear();
            return Err(fault.clone());
        }
        if buffer.is_empty() {
            return Ok(());
        }

        let (done_tx, done_rx) = oneshot::channel();
        let outcome = self
            .requests
            .unbounded_send((mem::take(buffer), done_tx))
            .map_err(|_| TransportFault::closed())
            .and_then(|()| {
                executor::block_on(done_rx)
                    .unwrap_or_else(|_| Err(TransportFault::closed()))
            });
        if let Err(fault) = &outcome {
            *last_fault = Some(fault.clone());
        }
        outcome
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.requests.close_channel();
        let transport = self
            .transport
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = transport {
            if handle.join().is_err() {
                tracing::error!("transport thread panicked");
            }
        }
    }
}

/// Body of the transport thread: connects, then sends requested buffers one
/// by one until every [`TcpWriter`] is dropped.
fn run_transport(
    endpoint: SocketAddr,
    connected: oneshot::Sender<Outcome>,
    mut requests: mpsc::UnboundedReceiver<Request>,
) {
    tracing::trace!(%endpoint, "transport thread started");

    let stream = match TcpStream::connect(endpoint) {
        Ok(stream) => {
            tracing::trace!(%endpoint, "transport connected");
            _ = connected.send(Ok(()));
            Some(stream)
        }
        Err(e) => {
            tracing::debug!(%endpoint, error = %e, "transport failed to connect");
            _ = connected.send(Err(TransportFault::from_io(
                TransportFaultKind::Connect,
                &e,
            )));
            None
        }
    };

    executor::block_on(async {
        while let Some((bytes, done)) = requests.next().await {
            let outcome = match &stream {
                Some(stream) => send(stream, &bytes),
                None => Err(TransportFault::closed()),
            };
            _ = done.send(outcome);
        }
    });

    if let Some(stream) = stream {
        _ = stream.shutdown(Shutdown::Both);
    }
    tracing::trace!(%endpoint, "transport thread stopped");
}

/// Transmits all the `bytes` over the `stream`.
fn send(mut stream: &TcpStream, bytes: &[u8]) -> Outcome {
    stream.write_all(bytes).map_err(|e| {
        if e.kind() == io::ErrorKind::WriteZero {
            TransportFault::disconnected()
        } else {
            TransportFault::from_io(TransportFaultKind::Send, &e)
        }
    })
}
