// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Depth-first execution of a [`Suite`] on the current thread.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Instant,
};

use crate::{
    error::dispatch::coerce_info,
    event::{Counts, Kind, ResultState, TestInfo, TestOutput, TestResult},
    writer::Listener,
    MainLoop,
};

use super::{ExecutionContext, Filter, Node, Suite, Test, TestContext, Verdict};

/// Message of a suite finished with failed descendants.
const CHILD_FAILURES: &str = "One or more child tests had errors";

/// Executes a [`Suite`] on the current thread, reporting to a [`Listener`].
///
/// Events are emitted in happened-before order: a node's `started` precedes
/// all events of its descendants, which all precede its `finished`. Tests
/// rejected by the [`Filter`], and suites without any selected tests, emit no
/// events and aren't counted. The root [`Suite`] is always reported.
#[derive(Debug)]
pub struct Executor<'f> {
    /// Dispatcher passed to [`TestContext`]s.
    main_loop: Option<Arc<dyn MainLoop>>,

    /// Selection of tests to run.
    filter: &'f Filter,
}

impl<'f> Executor<'f> {
    /// Creates a new [`Executor`].
    ///
    /// `main_loop` is [`None`] when tests run directly on the main thread.
    #[must_use]
    pub const fn new(main_loop: Option<Arc<dyn MainLoop>>, filter: &'f Filter) -> Self {
        Self { main_loop, filter }
    }

    /// Runs the given `suite`, returning its aggregated [`TestResult`].
    pub fn run(&self, suite: &Suite, listener: &mut dyn Listener) -> TestResult {
        self.run_suite(suite, None, &[], listener)
    }

    fn run_suite(
        &self,
        suite: &Suite,
        parent: Option<&str>,
        inherited: &[String],
        listener: &mut dyn Listener,
    ) -> TestResult {
        let categories = effective(inherited, &suite.categories);
        let info = TestInfo::new(
            parent,
            Arc::clone(&suite.name),
            Kind::Suite,
            categories.clone(),
        );
        let _span = tracing::debug_span!("suite", name = %info.full_name).entered();
        let started = Instant::now();
        listener.test_started(&info);

        let mut counts = Counts::default();
        for child in &suite.children {
            let result = match child {
                Node::Suite(s) => {
                    if !self.selects_any(s, &info.full_name, &categories) {
                        continue;
                    }
                    self.run_suite(s, Some(&*info.full_name), &categories, listener)
                }
                Node::Test(t) => {
                    let test_categories = effective(&categories, &t.categories);
                    let test_info = TestInfo::new(
                        Some(&*info.full_name),
                        Arc::clone(&t.name),
                        Kind::Test,
                        test_categories,
                    );
                    if !self.filter.matches(&test_info.full_name, &*test_info.categories) {
                        tracing::trace!(test = %test_info.full_name, "filtered out");
                        continue;
                    }
                    self.run_test(t, test_info, listener)
                }
            };
            counts += result.counts;
        }

        let mut result = TestResult::new(info, counts.suite_state());
        result.counts = counts;
        result.duration = started.elapsed();
        if result.state == ResultState::Failure {
            result.message = Some(CHILD_FAILURES.into());
        }
        listener.test_finished(&result);
        result
    }

    fn run_test(
        &self,
        test: &Test,
        info: TestInfo,
        listener: &mut dyn Listener,
    ) -> TestResult {
        let _span = tracing::info_span!("test", name = %info.full_name).entered();
        listener.test_started(&info);

        if let Some(reason) = &test.ignore {
            let mut result = TestResult::new(info, ResultState::Ignored);
            result.message = Some(reason.clone());
            listener.test_finished(&result);
            return result;
        }

        let execution = ExecutionContext::new(Arc::clone(&info.full_name));
        let cx = TestContext::new(execution.clone(), self.main_loop.clone());
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (test.body)(&cx)));
        let duration = started.elapsed();

        let (state, message, stack_trace) = match outcome {
            Ok(Ok(())) => (ResultState::Success, None, None),
            Ok(Err(Verdict::Failed { message, stack_trace })) => {
                (ResultState::Failure, Some(message), stack_trace)
            }
            Ok(Err(Verdict::Ignored(reason))) => {
                (ResultState::Ignored, Some(reason), None)
            }
            Ok(Err(Verdict::Inconclusive(reason))) => {
                (ResultState::Inconclusive, Some(reason), None)
            }
            Err(payload) => {
                (ResultState::Error, Some(coerce_info(&payload).into_owned()), None)
            }
        };
        tracing::debug!(state = %state, ?duration, "test finished");

        let output = execution.take_output();
        if !output.is_empty() {
            listener.test_output(&TestOutput {
                test_name: Arc::clone(&info.full_name),
                text: output.clone(),
            });
        }

        let mut result = TestResult::new(info, state);
        result.message = message;
        result.stack_trace = stack_trace;
        result.output = (!output.is_empty()).then_some(output);
        result.duration = duration;
        listener.test_finished(&result);
        result
    }

    /// Checks whether any test inside `suite` is selected by the [`Filter`].
    fn selects_any(&self, suite: &Suite, parent: &str, inherited: &[String]) -> bool {
        if self.filter.is_empty() {
            return true;
        }
        let full_name = format!("{parent}.{}", suite.name);
        let categories = effective(inherited, &suite.categories);
        suite.children.iter().any(|child| match child {
            Node::Suite(s) => self.selects_any(s, &full_name, &categories),
            Node::Test(t) => self.filter.matches(
                &format!("{full_name}.{}", t.name),
                effective(&categories, &t.categories).as_slice(),
            ),
        })
    }
}

/// Merges `inherited` categories with the `own` ones.
fn effective(inherited: &[String], own: &[String]) -> Vec<String> {
    let mut all = inherited.to_vec();
    all.extend(own.iter().filter(|c| !inherited.contains(c)).cloned());
    all
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;

    #[derive(Debug, Default)]
    struct Recorder(Vec<String>);

    impl Listener for Recorder {
        fn test_started(&mut self, info: &TestInfo) {
            self.0.push(format!("started {}", info.full_name));
        }

        fn test_output(&mut self, output: &TestOutput) {
            self.0.push(format!("output {} {}", output.test_name, output.text));
        }

        fn test_finished(&mut self, result: &TestResult) {
            self.0.push(format!(
                "finished {} {}",
                result.info.full_name, result.state,
            ));
        }
    }

    fn suite() -> Suite {
        Suite::new("root")
            .with_test(Test::new("passes", |cx| {
                cx.write("hello");
                Ok(())
            }))
            .with_suite(
                Suite::new("gui")
                    .with_category("gui")
                    .with_test(Test::new("fails", |_| Err(Verdict::failed("bad"))))
                    .with_test(Test::new("panics", |_| panic!("boom")))
                    .with_test(Test::new("skipped", |_| Ok(())).ignored("later")),
            )
    }

    #[test]
    fn emits_events_in_happened_before_order() {
        let filter = Filter::new();
        let mut recorder = Recorder::default();

        let result = Executor::new(None, &filter).run(&suite(), &mut recorder);

        assert_eq!(
            recorder.0,
            [
                "started root",
                "started root.passes",
                "output root.passes hello",
                "finished root.passes Success",
                "started root.gui",
                "started root.gui.fails",
                "finished root.gui.fails Failure",
                "started root.gui.panics",
                "finished root.gui.panics Error",
                "started root.gui.skipped",
                "finished root.gui.skipped Ignored",
                "finished root.gui Failure",
                "finished root Failure",
            ],
        );
        assert_eq!(
            result.counts,
            Counts { passed: 1, failures: 2, ignored: 1, inconclusive: 0 },
        );
        assert!(result.has_failures());
    }

    #[test]
    fn reports_panic_payload_as_message() {
        let filter = Filter::new().with_name(Regex::new("panics").expect("valid"));
        let mut results = Vec::new();

        struct Collect<'a>(&'a mut Vec<TestResult>);
        impl Listener for Collect<'_> {
            fn test_started(&mut self, _: &TestInfo) {}
            fn test_finished(&mut self, result: &TestResult) {
                self.0.push(result.clone());
            }
        }

        _ = Executor::new(None, &filter).run(&suite(), &mut Collect(&mut results));

        let panicked = results
            .iter()
            .find(|r| &*r.info.full_name == "root.gui.panics")
            .expect("reported");
        assert_eq!(panicked.state, ResultState::Error);
        assert_eq!(panicked.message.as_deref(), Some("boom"));
    }

    #[test]
    fn skips_filtered_subtrees() {
        let filter = Filter::new().excluding(["gui"]);
        let mut recorder = Recorder::default();

        let result = Executor::new(None, &filter).run(&suite(), &mut recorder);

        assert_eq!(
            recorder.0,
            [
                "started root",
                "started root.passes",
                "output root.passes hello",
                "finished root.passes Success",
                "finished root Success",
            ],
        );
        assert_eq!(result.counts.total(), 1);
    }

    #[test]
    fn reports_empty_suite_as_inconclusive() {
        let filter = Filter::new();
        let mut recorder = Recorder::default();

        let result = Executor::new(None, &filter).run(&Suite::new("empty"), &mut recorder);

        assert_eq!(result.state, ResultState::Inconclusive);
        assert_eq!(recorder.0, ["started empty", "finished empty Inconclusive"]);
    }
}
