// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [JUnit XML report][1] [`Listener`] implementation.
//!
//! [1]: https://llg.cubic.org/docs/junit

use std::{fs, io, path::Path};

use junit_report::{Duration, Report, TestCase, TestCaseBuilder, TestSuiteBuilder};

use crate::event::{ResultState, TestInfo, TestResult};

use super::Listener;

/// [JUnit XML report][1] [`Listener`] implementation outputting XML to an
/// [`io::Write`] implementor once the root suite finishes.
///
/// Every suite directly containing tests becomes a `<testsuite>` named by its
/// full name.
///
/// [1]: https://llg.cubic.org/docs/junit
#[derive(Debug)]
pub struct JUnit<Out: io::Write> {
    /// [`io::Write`] implementor to output XML report into.
    output: Out,

    /// [JUnit XML report][1].
    ///
    /// [1]: https://llg.cubic.org/docs/junit
    report: Report,

    /// Currently running suites along with their finished test cases.
    suites: Vec<(String, Vec<TestCase>)>,
}

impl JUnit<io::BufWriter<fs::File>> {
    /// Creates a new [`JUnit`] [`Listener`] writing into a file at `path`.
    ///
    /// # Errors
    ///
    /// If the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        fs::File::create(path).map(|f| Self::new(io::BufWriter::new(f)))
    }
}

impl<Out: io::Write> JUnit<Out> {
    /// Creates a new [`JUnit`] [`Listener`] outputting XML report into the
    /// given `output`.
    #[must_use]
    pub fn new(output: Out) -> Self {
        Self {
            output,
            report: Report::new(),
            suites: Vec::new(),
        }
    }

    /// Unwraps the inner [`io::Write`] implementor.
    #[must_use]
    pub fn into_inner(self) -> Out {
        self.output
    }

    fn test_case(result: &TestResult) -> TestCase {
        let name = &*result.info.name;
        let duration = Duration::try_from(result.duration).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "test duration out of range");
            Duration::ZERO
        });
        let message = result.message.as_deref().unwrap_or_default();

        let mut case = match result.state {
            ResultState::Success => TestCaseBuilder::success(name, duration),
            ResultState::Ignored | ResultState::Inconclusive => {
                TestCaseBuilder::skipped(name)
            }
            ResultState::Failure => {
                TestCaseBuilder::failure(name, duration, "Failure", message)
            }
            ResultState::Error => {
                TestCaseBuilder::error(name, duration, "Panic", message)
            }
        };
        if let Some(suite) = enclosing_suite(&result.info) {
            _ = case.set_classname(suite);
        }
        if let Some(out) = &result.output {
            _ = case.set_system_out(out);
        }
        case.build()
    }
}

/// Full name of the suite enclosing the given test, if any.
fn enclosing_suite(info: &TestInfo) -> Option<&str> {
    info.full_name.rsplit_once('.').map(|(suite, _)| suite)
}

impl<Out: io::Write> Listener for JUnit<Out> {
    fn test_started(&mut self, info: &TestInfo) {
        if info.is_suite() {
            self.suites.push((info.full_name.to_string(), Vec::new()));
        }
    }

    fn test_finished(&mut self, result: &TestResult) {
        if !result.info.is_suite() {
            let case = Self::test_case(result);
            match self.suites.last_mut() {
                Some((_, cases)) => cases.push(case),
                None => tracing::warn!(
                    test = %result.info.full_name,
                    "test finished outside of any suite",
                ),
            }
            return;
        }

        let Some((name, cases)) = self.suites.pop() else {
            return;
        };
        if !cases.is_empty() {
            self.report
                .add_testsuite(TestSuiteBuilder::new(&name).add_testcases(cases).build());
        }
        if self.suites.is_empty() {
            if let Err(e) = self
                .report
                .write_xml(&mut self.output)
                .map_err(|e| io::Error::other(e.to_string()))
                .and_then(|()| self.output.flush())
            {
                tracing::warn!(error = %e, "failed to write JUnit report");
            }
        }
    }
}
