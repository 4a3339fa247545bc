// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Socket transport errors.

use std::io;

use derive_more::with_trait::{Display, Error};

/// Stage of the transport at which a [`TransportFault`] happened.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum TransportFaultKind {
    /// Connecting to the remote listener failed.
    #[display("connect")]
    Connect,

    /// Sending a buffer failed.
    #[display("send")]
    Send,

    /// Remote side stopped accepting bytes.
    #[display("disconnected")]
    Disconnected,

    /// Transport was already closed locally.
    #[display("closed")]
    Closed,
}

/// Connect or send failure of a socket transport.
///
/// Surfaced to the caller of a flush, but swallowed by the listener layer so
/// it never affects a test run.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("{kind} failed: {message}")]
pub struct TransportFault {
    /// Stage of the failure.
    #[error(not(source))]
    pub kind: TransportFaultKind,

    /// Description of the underlying I/O error.
    #[error(not(source))]
    pub message: String,

    /// Kind of the underlying I/O error.
    #[error(not(source))]
    pub io_kind: io::ErrorKind,
}

impl TransportFault {
    /// Creates a [`TransportFault`] of the given `kind` from an [`io::Error`].
    #[must_use]
    pub fn from_io(kind: TransportFaultKind, err: &io::Error) -> Self {
        Self {
            kind,
            message: err.to_string(),
            io_kind: err.kind(),
        }
    }

    /// Creates a [`TransportFaultKind::Disconnected`] fault.
    #[must_use]
    pub fn disconnected() -> Self {
        Self {
            kind: TransportFaultKind::Disconnected,
            message: "remote side accepted zero bytes".into(),
            io_kind: io::ErrorKind::WriteZero,
        }
    }

    /// Creates a [`TransportFaultKind::Closed`] fault.
    #[must_use]
    pub fn closed() -> Self {
        Self {
            kind: TransportFaultKind::Closed,
            message: "transport thread is gone".into(),
            io_kind: io::ErrorKind::NotConnected,
        }
    }
}

impl From<TransportFault> for io::Error {
    fn from(fault: TransportFault) -> Self {
        Self::new(fault.io_kind, fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_io_kind_through_conversion() {
        let fault = TransportFault::from_io(
            TransportFaultKind::Connect,
            &io::Error::from(io::ErrorKind::ConnectionRefused),
        );
        assert_eq!(fault.kind, TransportFaultKind::Connect);

        let err = io::Error::from(fault);
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
        assert!(err.to_string().starts_with("connect failed:"));
    }
}
