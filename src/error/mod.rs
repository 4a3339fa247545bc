// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types of the crate, organized by the boundary they arise at.
//!
//! # Modules
//!
//! - [`core`] - Top-level [`Error`] consolidating everything below
//! - [`dispatch`] - Dispatcher selection, loop misuse and cross-thread calls
//! - [`transport`] - Socket transport of the streaming reporter
//!
//! Faults raised inside dispatched work never escape the dispatcher thread:
//! they are captured into an [`InvocationFault`] and only re-surfaced to the
//! thread awaiting that very work.

pub mod core;
pub mod dispatch;
pub mod transport;

pub use self::{
    core::{Error, Result},
    dispatch::{DispatchError, InvocationFault, ToolkitUnavailable, Unavailability},
    transport::{TransportFault, TransportFaultKind},
};
