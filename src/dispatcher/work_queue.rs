// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Self-hosted [`MainLoop`] used when no native toolkit is present.

use std::{
    collections::VecDeque,
    fmt, mem,
    panic::{self, AssertUnwindSafe},
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    thread::{self, ThreadId},
};

use futures::{channel::oneshot, executor};

use crate::error::{
    dispatch::coerce_info, DispatchError, InvocationFault, ToolkitUnavailable,
};

use super::{Invocation, MainLoop};

/// Lifecycle phase of a [`WorkQueueLoop`].
///
/// Only moves forward: `NotStarted → Running → Stopped`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Phase {
    /// [`MainLoop::run_main_loop()`] hasn't been called yet.
    #[default]
    NotStarted,

    /// Some thread is pumping the loop.
    Running,

    /// The loop observed a shutdown request and returned.
    Stopped,
}

/// [`MainLoop`] pumping two FIFO queues on the thread running it.
///
/// Typed [`Invocation`]s have strict priority over raw callbacks whenever
/// both queues are non-empty. Queued work is executed one item at a time.
/// Once [`MainLoop::shutdown()`] is requested, the item being executed is
/// allowed to finish, and everything still queued is discarded.
#[derive(Debug, Default)]
pub struct WorkQueueLoop {
    /// Queues and flags, all guarded together.
    state: Mutex<State>,

    /// Wakes the loop once [`State`] changes.
    wakeup: Condvar,
}

#[derive(Debug, Default)]
struct State {
    invocations: VecDeque<Invocation>,
    callbacks: VecDeque<RawCallback>,
    terminate: bool,
    phase: Phase,
    owner: Option<ThreadId>,
}

/// Callback posted together with its state.
struct RawCallback(Box<dyn FnOnce() + Send>);

impl fmt::Debug for RawCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawCallback").finish_non_exhaustive()
    }
}

enum Work {
    Invocation(Invocation),
    Callback(RawCallback),
}

impl WorkQueueLoop {
    /// Creates a new idle [`WorkQueueLoop`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current [`Phase`] of this loop.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// Enqueues `callback` with its `state` onto the raw queue.
    ///
    /// Never blocks. A panic of the `callback` is reported and contained
    /// inside the loop.
    pub fn post<S, F>(&self, callback: F, state: S)
    where
        S: Send + 'static,
        F: FnOnce(S) + Send + 'static,
    {
        let callback = RawCallback(Box::new(move || callback(state)));
        let mut guard = self.lock();
        if guard.phase == Phase::Stopped {
            drop(guard);
            tracing::debug!("dropping callback posted to a stopped loop");
            drop(callback);
            return;
        }
        guard.callbacks.push_back(callback);
        drop(guard);
        self.wakeup.notify_one();
    }

    /// Same as [`WorkQueueLoop::post()`], but blocks the current thread until
    /// the `callback` has been executed on the main thread.
    ///
    /// # Errors
    ///
    /// - [`InvocationFault::Panicked`] if the `callback` panicked;
    /// - [`InvocationFault::Discarded`] if the loop stopped before running it;
    /// - [`InvocationFault::WouldDeadlock`] if called from the main thread.
    pub fn send<S, F>(&self, callback: F, state: S) -> Result<(), InvocationFault>
    where
        S: Send + 'static,
        F: FnOnce(S) + Send + 'static,
    {
        if self.is_main_thread() {
            return Err(InvocationFault::WouldDeadlock);
        }
        let (done, completed) = oneshot::channel();
        self.post(
            move |state| {
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| callback(state)))
                        .map_err(InvocationFault::panicked);
                _ = done.send(outcome);
            },
            state,
        );
        executor::block_on(completed).unwrap_or(Err(InvocationFault::Discarded))
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // No user code ever runs while the lock is held.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until the next [`Work`] is available, or returns [`None`] once
    /// termination is observed.
    fn next_work(&self) -> Option<Work> {
        let mut state = self.lock();
        loop {
            if state.terminate {
                state.phase = Phase::Stopped;
                state.owner = None;
                let discarded = (
                    mem::take(&mut state.invocations),
                    mem::take(&mut state.callbacks),
                );
                drop(state);
                if !discarded.0.is_empty() || !discarded.1.is_empty() {
                    tracing::debug!(
                        invocations = discarded.0.len(),
                        callbacks = discarded.1.len(),
                        "discarding work queued after shutdown",
                    );
                }
                return None;
            }
            if let Some(invocation) = state.invocations.pop_front() {
                return Some(Work::Invocation(invocation));
            }
            if let Some(callback) = state.callbacks.pop_front() {
                return Some(Work::Callback(callback));
            }
            state = self.wakeup.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl MainLoop for WorkQueueLoop {
    fn name(&self) -> &str {
        "work-queue"
    }

    fn initialize_toolkit(&self) -> Result<(), ToolkitUnavailable> {
        Ok(())
    }

    fn invoke_on_main_loop(&self, invocation: Invocation) {
        let mut guard = self.lock();
        if guard.phase == Phase::Stopped {
            drop(guard);
            tracing::debug!("discarding invocation submitted to a stopped loop");
            drop(invocation);
            return;
        }
        guard.invocations.push_back(invocation);
        drop(guard);
        self.wakeup.notify_one();
    }

    fn run_main_loop(&self) -> Result<(), DispatchError> {
        {
            let mut state = self.lock();
            let current = thread::current().id();
            match state.phase {
                Phase::Running if state.owner == Some(current) => {
                    return Err(DispatchError::Reentrant);
                }
                Phase::Running => return Err(DispatchError::AlreadyRunning),
                Phase::Stopped => return Err(DispatchError::Stopped),
                Phase::NotStarted => {
                    state.phase = Phase::Running;
                    state.owner = Some(current);
                }
            }
        }
        tracing::debug!("work queue loop started");

        while let Some(work) = self.next_work() {
            match work {
                Work::Invocation(invocation) => invocation.invoke(),
                Work::Callback(RawCallback(callback)) => {
                    if let Err(info) =
                        panic::catch_unwind(AssertUnwindSafe(callback))
                    {
                        tracing::error!(
                            panic = %coerce_info(&info),
                            "callback panicked on the main loop",
                        );
                    }
                }
            }
        }

        tracing::debug!("work queue loop stopped");
        Ok(())
    }

    fn shutdown(&self) {
        self.lock().terminate = true;
        self.wakeup.notify_all();
    }

    fn is_main_thread(&self) -> bool {
        let state = self.lock();
        state.phase == Phase::Running
            && state.owner == Some(thread::current().id())
    }
}
