// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tools for executing work on a single designated main thread.
//!
//! The main thread is whichever thread calls [`MainLoop::run_main_loop()`].
//! Other threads hand work to it with [`MainLoop::invoke_on_main_loop()`],
//! usually through a [`CrossThreadCall`] to get its result back.
//!
//! A native GUI runtime is plugged in by implementing [`MainLoop`] for it and
//! registering it in a [`Registry`]. When none is present, the self-hosted
//! [`WorkQueueLoop`] is used.

mod invocation;
mod registry;
mod work_queue;

use std::fmt;

use crate::error::{DispatchError, InvocationFault, ToolkitUnavailable};

#[doc(inline)]
pub use self::{
    invocation::{Completion, CrossThreadCall, Invocation},
    registry::{Probe, ProbePolicy, Registry},
    work_queue::{Phase, WorkQueueLoop},
};

/// Capability of executing work on a single main thread.
///
/// # Order guarantees
///
/// Implementors execute [`Invocation`]s one at a time, each to completion
/// before the next one starts, in the order they were submitted. An
/// [`Invocation`] is never executed concurrently with another one.
pub trait MainLoop: fmt::Debug + Send + Sync {
    /// Name of the toolkit this [`MainLoop`] drives.
    fn name(&self) -> &str;

    /// Acquires or creates the main thread's execution context.
    ///
    /// Called at most once per process by a [`Registry`].
    ///
    /// # Errors
    ///
    /// If the underlying runtime cannot be located or brought up.
    fn initialize_toolkit(&self) -> Result<(), ToolkitUnavailable>;

    /// Enqueues the given [`Invocation`] for execution on the main thread.
    ///
    /// Never blocks and never waits for the [`Invocation`] to complete.
    fn invoke_on_main_loop(&self, invocation: Invocation);

    /// Turns the calling thread into the main thread, executing queued work
    /// until [`MainLoop::shutdown()`] is both requested and observed.
    ///
    /// Must not be called from inside a work item.
    ///
    /// # Errors
    ///
    /// If the loop is already running or has already stopped.
    fn run_main_loop(&self) -> Result<(), DispatchError>;

    /// Requests termination of the loop.
    ///
    /// Callable from any thread, idempotent, never blocks, and doesn't
    /// guarantee an immediate return of [`MainLoop::run_main_loop()`].
    fn shutdown(&self);

    /// Indicates whether the current thread is the one running this loop.
    fn is_main_thread(&self) -> bool {
        false
    }
}

impl dyn MainLoop {
    /// Executes `f` on the main thread with the given `context`, blocking the
    /// current thread until it completes.
    ///
    /// # Errors
    ///
    /// - [`InvocationFault::Panicked`] if `f` panicked on the main thread;
    /// - [`InvocationFault::Discarded`] if the loop stopped before running it;
    /// - [`InvocationFault::WouldDeadlock`] if called from the main thread.
    pub fn execute<C, F, T>(&self, context: C, f: F) -> Result<T, InvocationFault>
    where
        C: Send + 'static,
        F: FnOnce(&C) -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.is_main_thread() {
            return Err(InvocationFault::WouldDeadlock);
        }
        let (invocation, completion) = CrossThreadCall::new(context, f).split();
        self.invoke_on_main_loop(invocation);
        completion.wait()
    }
}
