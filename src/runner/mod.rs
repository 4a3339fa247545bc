// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Orchestration of a [`Suite`] execution around a [`MainLoop`].
//!
//! # Topology
//!
//! Without any [`MainLoop`] available, a [`Suite`] is executed directly on the
//! calling thread. Otherwise it's executed on a dedicated worker thread, while
//! the calling thread becomes the main one, running the [`MainLoop`] until the
//! worker requests its shutdown.
//!
//! # Shutdown
//!
//! Once the [`Suite`] completes (whether its tests pass or fail, or a fault
//! escapes the worker), the worker submits a single [`CrossThreadCall`] which
//! runs the pre-shutdown notifications and then calls
//! [`MainLoop::shutdown()`]. As the loop only stops by executing that very
//! call, the notifications always run exactly once on the main thread before
//! [`MainLoop::run_main_loop()`] returns.
//!
//! The worker doesn't start the [`Suite`] until the calling thread has claimed
//! the [`MainLoop`] by running it. If the [`MainLoop`] is stopped already, or
//! pumped by another thread, the [`Suite`] falls back to the direct execution
//! and nothing is submitted to that [`MainLoop`].

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread,
};

use derive_more::with_trait::{Debug, Display};

use crate::{
    dispatcher::{CrossThreadCall, MainLoop, Registry},
    error::{dispatch::coerce_info, DispatchError, Error},
    event::TestResult,
    suite::{Executor, Filter, Suite},
    writer::Listener,
};

/// Notification executed on the main thread right before the [`MainLoop`]
/// shuts down.
pub type Hook = Arc<dyn Fn() + Send + Sync>;

/// Topology a [`Suite`] was executed in.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Topology {
    /// On the calling thread, without any [`MainLoop`].
    #[display("direct")]
    Direct,

    /// On a worker thread, with the calling thread running the named
    /// [`MainLoop`].
    #[display("dispatched({_0})")]
    Dispatched(String),
}

/// Outcome of an [`Orchestrator::execute()`] call.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    /// Result of the root [`Suite`], unless a fault prevented it.
    pub result: Option<TestResult>,

    /// Description of a fault which escaped the suite execution.
    pub worker_fault: Option<String>,

    /// Error of running the [`MainLoop`] itself.
    pub loop_error: Option<DispatchError>,

    /// Topology the [`Suite`] was executed in.
    pub topology: Topology,
}

impl RunOutcome {
    /// Indicates whether the run produced a [`TestResult`] without failures
    /// and no fault happened around it.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.worker_fault.is_none()
            && self.loop_error.is_none()
            && self.result.as_ref().is_some_and(|r| !r.has_failures())
    }

    /// Process exit code of this [`RunOutcome`].
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.passed())
    }
}

/// Executor of a [`Suite`] choosing its [`Topology`] by the [`MainLoop`]
/// selected from a [`Registry`].
#[derive(Debug)]
pub struct Orchestrator<'r> {
    /// Source of the [`MainLoop`].
    registry: &'r Registry,

    /// Selection of tests to run.
    filter: Filter,

    /// Pre-shutdown notifications, in registration order.
    #[debug(ignore)]
    before_shutdown: Vec<Hook>,
}

impl<'r> Orchestrator<'r> {
    /// Creates a new [`Orchestrator`] taking its [`MainLoop`] from the given
    /// [`Registry`].
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            filter: Filter::default(),
            before_shutdown: Vec::new(),
        }
    }

    /// Sets the [`Filter`] selecting tests to run.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Registers a notification to run on the main thread right before the
    /// [`MainLoop`] shuts down.
    ///
    /// A panicking notification is logged and doesn't prevent the shutdown.
    /// Notifications never run in the [`Topology::Direct`].
    #[must_use]
    pub fn before_shutdown<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.before_shutdown.push(Arc::new(hook));
        self
    }

    /// Executes the given `suite`, reporting to the given `listener`.
    ///
    /// Blocks until the `suite` completes and, in the [`Topology::Dispatched`],
    /// until the [`MainLoop`] stops.
    ///
    /// # Errors
    ///
    /// - [`Error::Toolkit`] if the [`Registry`] aborted its probing;
    /// - [`Error::Io`] if the worker thread cannot be spawned.
    pub fn execute<L>(&self, suite: &Suite, listener: &mut L) -> Result<RunOutcome, Error>
    where
        L: Listener + Send,
    {
        let main_loop = match self.registry.select()? {
            Some(l) if l.is_main_thread() => {
                tracing::debug!(
                    main_loop = l.name(),
                    "already on the main thread, running directly",
                );
                None
            }
            selected => selected,
        };
        let Some(main_loop) = main_loop else {
            tracing::info!(suite = %suite.name, "running suite directly");
            return Ok(self.run_directly(suite, listener));
        };

        let topology = Topology::Dispatched(main_loop.name().to_owned());
        tracing::info!(suite = %suite.name, %topology, "running suite on worker thread");

        // Executed by whichever thread pumps the `main_loop`, so tells whether
        // this very thread has claimed it.
        let caller = thread::current().id();
        let (claim, claimed) =
            CrossThreadCall::new(caller, |caller| thread::current().id() == *caller)
                .split();

        let dispatched = thread::scope(|scope| {
            let worker = thread::Builder::new()
                .name("loopunit-worker".into())
                .spawn_scoped(scope, || {
                    if !matches!(claimed.wait(), Ok(true)) {
                        return None;
                    }
                    let completed =
                        self.run_suite(Some(Arc::clone(&main_loop)), suite, listener);
                    self.request_shutdown(&main_loop);
                    Some(completed)
                })?;
            main_loop.invoke_on_main_loop(claim);

            let loop_error = main_loop.run_main_loop().err();
            if let Some(e) = &loop_error {
                tracing::warn!(error = %e, "main loop failed to run");
            }

            Ok::<_, Error>(match worker.join() {
                Ok(Some((result, worker_fault))) => {
                    Some(RunOutcome { result, worker_fault, loop_error, topology })
                }
                Ok(None) => None,
                Err(info) => Some(RunOutcome {
                    result: None,
                    worker_fault: Some(coerce_info(&info).into_owned()),
                    loop_error,
                    topology,
                }),
            })
        })?;

        Ok(dispatched.unwrap_or_else(|| {
            tracing::warn!(
                suite = %suite.name,
                main_loop = main_loop.name(),
                "main loop wasn't claimed by this run, running suite directly",
            );
            self.run_directly(suite, listener)
        }))
    }

    /// Runs the `suite` on the calling thread, without any [`MainLoop`].
    fn run_directly(&self, suite: &Suite, listener: &mut dyn Listener) -> RunOutcome {
        let (result, worker_fault) = self.run_suite(None, suite, listener);
        RunOutcome {
            result,
            worker_fault,
            loop_error: None,
            topology: Topology::Direct,
        }
    }

    /// Runs the `suite`, containing any fault escaping it.
    fn run_suite(
        &self,
        main_loop: Option<Arc<dyn MainLoop>>,
        suite: &Suite,
        listener: &mut dyn Listener,
    ) -> (Option<TestResult>, Option<String>) {
        let executor = Executor::new(main_loop, &self.filter);
        match panic::catch_unwind(AssertUnwindSafe(|| executor.run(suite, listener))) {
            Ok(result) => (Some(result), None),
            Err(info) => {
                let fault = coerce_info(&info).into_owned();
                tracing::error!(%fault, "unhandled fault escaped suite execution");
                (None, Some(fault))
            }
        }
    }

    /// Submits the shutdown sequence to the `main_loop` and waits until it's
    /// executed.
    fn request_shutdown(&self, main_loop: &Arc<dyn MainLoop>) {
        let hooks = self.before_shutdown.clone();
        let (invocation, completion) =
            CrossThreadCall::new(Arc::clone(main_loop), move |main_loop| {
                for hook in &hooks {
                    if let Err(info) = panic::catch_unwind(AssertUnwindSafe(|| hook())) {
                        tracing::error!(
                            panic = %coerce_info(&info),
                            "pre-shutdown notification panicked",
                        );
                    }
                }
                main_loop.shutdown();
            })
            .split();
        main_loop.invoke_on_main_loop(invocation);
        if let Err(fault) = completion.wait() {
            tracing::error!(
                main_loop = main_loop.name(),
                %fault,
                "shutdown sequence never completed on the main loop",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Barrier, Mutex,
    };

    use crate::{
        dispatcher::{ProbePolicy, WorkQueueLoop},
        error::ToolkitUnavailable,
        event::{ResultState, TestInfo},
        suite::{Test, Verdict},
        writer::Discard,
    };

    use super::*;

    fn passing_suite() -> Suite {
        Suite::new("root").with_test(Test::new("main_thread", |cx| {
            let here = thread::current().id();
            let there = cx.on_main_thread(|_| thread::current().id())?;
            if cx.is_dispatched() {
                assert_ne!(here, there);
            } else {
                assert_eq!(here, there);
            }
            Ok(())
        }))
    }

    #[test]
    fn runs_directly_without_main_loop() {
        let registry = Registry::direct();

        let outcome = Orchestrator::new(&registry)
            .execute(&passing_suite(), &mut Discard)
            .expect("executed");

        assert_eq!(outcome.topology, Topology::Direct);
        assert!(outcome.passed());
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn runs_on_worker_while_calling_thread_pumps_loop() {
        let registry = Registry::new();
        let main_thread = thread::current().id();
        let hook_threads = Arc::new(Mutex::new(Vec::new()));

        let outcome = Orchestrator::new(&registry)
            .before_shutdown({
                let hook_threads = Arc::clone(&hook_threads);
                move || {
                    hook_threads
                        .lock()
                        .expect("not poisoned")
                        .push(thread::current().id());
                }
            })
            .execute(&passing_suite(), &mut Discard)
            .expect("executed");

        assert_eq!(outcome.topology, Topology::Dispatched("work-queue".into()));
        assert!(outcome.passed(), "{outcome:?}");
        assert_eq!(*hook_threads.lock().expect("not poisoned"), [main_thread]);
    }

    #[test]
    fn shuts_down_despite_panicking_hook() {
        let registry = Registry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let outcome = Orchestrator::new(&registry)
            .before_shutdown(|| panic!("hook failed"))
            .before_shutdown({
                let calls = Arc::clone(&calls);
                move || {
                    _ = calls.fetch_add(1, Ordering::SeqCst);
                }
            })
            .execute(&passing_suite(), &mut Discard)
            .expect("executed");

        assert!(outcome.passed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn contains_fault_escaping_worker() {
        struct Exploding;
        impl Listener for Exploding {
            fn test_started(&mut self, _: &TestInfo) {}
            fn test_finished(&mut self, result: &TestResult) {
                if result.info.is_suite() {
                    panic!("listener exploded");
                }
            }
        }
        let registry = Registry::new();

        let outcome = Orchestrator::new(&registry)
            .execute(&passing_suite(), &mut Exploding)
            .expect("executed");

        assert!(outcome.result.is_none());
        assert_eq!(outcome.worker_fault.as_deref(), Some("listener exploded"));
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn reports_failures_in_exit_code() {
        let registry = Registry::new();
        let suite = Suite::new("root")
            .with_test(Test::new("fails", |_| Err(Verdict::failed("nope"))));

        let outcome = Orchestrator::new(&registry)
            .execute(&suite, &mut Discard)
            .expect("executed");

        let result = outcome.result.as_ref().expect("result");
        assert_eq!(result.state, ResultState::Failure);
        assert_eq!(outcome.exit_code(), 1);
        assert!(outcome.worker_fault.is_none());
    }

    fn counting_hook(calls: &Arc<AtomicUsize>) -> impl Fn() + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move || {
            _ = calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn falls_back_to_direct_run_once_loop_stopped() {
        let registry = Registry::new();
        let (first_hooks, second_hooks) =
            (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));

        let first = Orchestrator::new(&registry)
            .before_shutdown(counting_hook(&first_hooks))
            .execute(&passing_suite(), &mut Discard)
            .expect("executed");
        let second = Orchestrator::new(&registry)
            .before_shutdown(counting_hook(&second_hooks))
            .execute(&passing_suite(), &mut Discard)
            .expect("executed");

        assert_eq!(first.topology, Topology::Dispatched("work-queue".into()));
        assert!(first.passed(), "{first:?}");
        assert_eq!(second.topology, Topology::Direct);
        assert!(second.passed(), "{second:?}");
        assert!(second.loop_error.is_none());
        assert_eq!(first_hooks.load(Ordering::SeqCst), 1);
        assert_eq!(second_hooks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn concurrent_run_leaves_claimed_loop_alone() {
        let registry = Registry::new();
        let (a_hooks, b_hooks) =
            (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));
        let a_running = Arc::new(Barrier::new(2));
        let b_done = Arc::new(Barrier::new(2));

        let suite_a = Suite::new("a").with_test(Test::new("spans_other_run", {
            let (a_running, b_done) = (Arc::clone(&a_running), Arc::clone(&b_done));
            move |cx| {
                let first = cx.on_main_thread(|_| thread::current().id())?;
                _ = a_running.wait();
                _ = b_done.wait();
                let second = cx.on_main_thread(|_| thread::current().id())?;
                assert_eq!(first, second);
                Ok(())
            }
        }));

        let (a, b) = thread::scope(|s| {
            let a = s.spawn(|| {
                Orchestrator::new(&registry)
                    .before_shutdown(counting_hook(&a_hooks))
                    .execute(&suite_a, &mut Discard)
                    .expect("executed")
            });
            let b = s.spawn(|| {
                _ = a_running.wait();
                let outcome = Orchestrator::new(&registry)
                    .before_shutdown(counting_hook(&b_hooks))
                    .execute(&passing_suite(), &mut Discard)
                    .expect("executed");
                _ = b_done.wait();
                outcome
            });
            (
                a.join().expect("run A finished"),
                b.join().expect("run B finished"),
            )
        });

        assert_eq!(a.topology, Topology::Dispatched("work-queue".into()));
        assert!(a.passed(), "{a:?}");
        assert_eq!(a_hooks.load(Ordering::SeqCst), 1);
        assert_eq!(b.topology, Topology::Direct);
        assert!(b.passed(), "{b:?}");
        assert_eq!(b_hooks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn returns_when_shutdown_sequence_is_discarded() {
        let registry = Registry::direct();
        let calls = Arc::new(AtomicUsize::new(0));
        let stopped = Arc::new(WorkQueueLoop::new());
        stopped.shutdown();
        stopped.run_main_loop().expect("loop ran");
        let main_loop: Arc<dyn MainLoop> = stopped;

        Orchestrator::new(&registry)
            .before_shutdown(counting_hook(&calls))
            .request_shutdown(&main_loop);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn fails_on_strict_probe_abort() {
        let registry = Registry::new()
            .with_policy(ProbePolicy::Strict)
            .with_toolkit("broken", || {
                Err(ToolkitUnavailable::failed("broken", "no display"))
            });

        let err = Orchestrator::new(&registry)
            .execute(&passing_suite(), &mut Discard)
            .expect_err("should abort");

        assert!(matches!(err, Error::Toolkit(_)));
    }
}
