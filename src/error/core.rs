// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Top-level [`Error`] type.

use std::io;

use derive_more::with_trait::{Display, From};

use super::{DispatchError, InvocationFault, ToolkitUnavailable, TransportFault};

/// Top-level error type for all `loopunit` operations.
#[derive(Debug, Display, derive_more::with_trait::Error, From)]
pub enum Error {
    /// No dispatcher could be brought up.
    #[display("Main loop unavailable: {_0}")]
    Toolkit(ToolkitUnavailable),

    /// Dispatcher loop was misused.
    #[display("Main loop misuse: {_0}")]
    Dispatch(DispatchError),

    /// Work executed on the main thread failed.
    #[display("Main thread invocation failed: {_0}")]
    Invocation(InvocationFault),

    /// Streaming transport failed.
    #[display("Transport failed: {_0}")]
    Transport(TransportFault),

    /// I/O error while writing local output.
    #[display("I/O operation failed: {_0}")]
    Io(io::Error),
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
