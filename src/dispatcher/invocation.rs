// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Synchronous calls executed on another thread.

use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
};

use futures::{channel::oneshot, executor};

use crate::error::InvocationFault;

/// Pending synchronous invocation of a function on the main thread.
///
/// Built from a function and the submitter's context, then split into the
/// [`Invocation`] handed to a [`MainLoop`] and the [`Completion`] the
/// submitter waits on.
///
/// [`MainLoop`]: super::MainLoop
#[derive(Debug)]
pub struct CrossThreadCall<T> {
    /// Type-erased part executed on the main thread.
    invocation: Invocation,

    /// Part the submitter waits on.
    completion: Completion<T>,
}

impl<T: Send + 'static> CrossThreadCall<T> {
    /// Creates a new [`CrossThreadCall`] of `f`, which receives the given
    /// `context` once executing on the main thread.
    #[must_use]
    pub fn new<C, F>(context: C, f: F) -> Self
    where
        C: Send + 'static,
        F: FnOnce(&C) -> T + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let job = move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(&context)))
                .map_err(InvocationFault::panicked);
            // Submitter may have stopped waiting already.
            _ = sender.send(outcome);
        };
        Self {
            invocation: Invocation(Box::new(job)),
            completion: Completion(receiver),
        }
    }
}

impl<T> CrossThreadCall<T> {
    /// Splits this [`CrossThreadCall`] into its [`Invocation`] and
    /// [`Completion`].
    #[must_use]
    pub fn split(self) -> (Invocation, Completion<T>) {
        (self.invocation, self.completion)
    }
}

/// Type-erased work to be executed on the main thread.
///
/// Executes at most once, since [`Invocation::invoke()`] consumes it. A panic
/// of the wrapped function is captured and delivered to the matching
/// [`Completion`], never escaping [`Invocation::invoke()`]. Dropping an
/// [`Invocation`] without invoking it resolves its [`Completion`] with
/// [`InvocationFault::Discarded`].
pub struct Invocation(Box<dyn FnOnce() + Send>);

impl Invocation {
    /// Executes this [`Invocation`] on the current thread and signals its
    /// [`Completion`].
    pub fn invoke(self) {
        (self.0)();
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Invocation").finish_non_exhaustive()
    }
}

/// Submitter's side of a [`CrossThreadCall`].
#[derive(Debug)]
pub struct Completion<T>(oneshot::Receiver<Result<T, InvocationFault>>);

impl<T> Completion<T> {
    /// Blocks the current thread until the [`Invocation`] completes.
    ///
    /// # Errors
    ///
    /// - [`InvocationFault::Panicked`] if the function panicked;
    /// - [`InvocationFault::Discarded`] if the [`Invocation`] was dropped
    ///   without being executed.
    pub fn wait(self) -> Result<T, InvocationFault> {
        executor::block_on(self.0).unwrap_or(Err(InvocationFault::Discarded))
    }

    /// Blocks the current thread until the [`Invocation`] completes,
    /// re-raising any panic of the function on the current thread.
    pub fn join(self) -> T {
        self.wait().unwrap_or_else(|fault| fault.resume())
    }
}
