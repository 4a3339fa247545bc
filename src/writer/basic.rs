// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Default human-readable [`Listener`] implementation.

use std::{io, str::FromStr, time::Duration};

use derive_more::with_trait::{Deref, DerefMut};
use itertools::Itertools as _;

use crate::event::{ResultState, TestInfo, TestOutput, TestResult};

use super::{
    out::{Styles, WriteStrExt as _},
    Listener,
};

/// Possible policies of a [`console`] output coloring.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Coloring {
    /// Letting [`console::colors_enabled()`] to decide, whether output should
    /// be colored.
    Auto,

    /// Forcing of a colored output.
    Always,

    /// Forcing of a non-colored output.
    Never,
}

impl FromStr for Coloring {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            _ => Err("possible options: auto, always, never"),
        }
    }
}

/// Default [`Listener`] implementation outputting to an [`io::Write`]
/// implementor ([`io::Stdout`] by default).
///
/// Prints a line per finished test, optionally a `***** <name>` label per
/// started one, and a summary with failure details once the root suite
/// finishes.
#[derive(Debug, Deref, DerefMut)]
pub struct Basic<Out: io::Write = io::Stdout> {
    /// [`io::Write`] implementor to write the output into.
    #[deref]
    #[deref_mut]
    output: Out,

    /// [`Styles`] for terminal output.
    styles: Styles,

    /// Whether to label every started test.
    labels: bool,

    /// Number of suites currently running.
    depth: usize,

    /// Failed tests to detail in the summary.
    failures: Vec<TestResult>,
}

impl Basic {
    /// Creates a new [`Basic`] [`Listener`] outputting to [`io::Stdout`].
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<Out: io::Write> Basic<Out> {
    /// Creates a new [`Basic`] [`Listener`] outputting to the given `output`.
    #[must_use]
    pub fn new(output: Out) -> Self {
        Self {
            output,
            styles: Styles::new(),
            labels: false,
            depth: 0,
            failures: Vec::new(),
        }
    }

    /// Applies the given [`Coloring`].
    #[must_use]
    pub fn with_coloring(mut self, color: Coloring) -> Self {
        self.styles.apply_coloring(color);
        self
    }

    /// Enables or disables `***** <name>` labels for started tests.
    #[must_use]
    pub const fn with_labels(mut self, labels: bool) -> Self {
        self.labels = labels;
        self
    }

    /// Unwraps the inner [`io::Write`] implementor.
    #[must_use]
    pub fn into_inner(self) -> Out {
        self.output
    }

    fn started(&mut self, info: &TestInfo) -> io::Result<()> {
        if info.is_suite() {
            self.depth += 1;
            return Ok(());
        }
        if self.labels {
            self.output.write_line(format!("***** {}", info.full_name))?;
        }
        Ok(())
    }

    fn write_output(&mut self, output: &TestOutput) -> io::Result<()> {
        self.output.write_str(&output.text)?;
        if !output.text.ends_with('\n') {
            self.output.write_str("\n")?;
        }
        Ok(())
    }

    fn finished(&mut self, result: &TestResult) -> io::Result<()> {
        if !result.info.is_suite() {
            let status = match result.state {
                ResultState::Success => "ok",
                ResultState::Inconclusive => "inconclusive",
                ResultState::Ignored => "ignored",
                ResultState::Failure => "FAILED",
                ResultState::Error => "ERROR",
            };
            self.output.write_line(format!(
                "test {} ... {}",
                result.info.full_name,
                self.styles.state(result.state, status),
            ))?;
            if result.state.is_failure() {
                self.failures.push(result.clone());
            }
            return Ok(());
        }

        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.summary(result)?;
        }
        Ok(())
    }

    fn summary(&mut self, root: &TestResult) -> io::Result<()> {
        self.output.write_str("\n")?;
        if !self.failures.is_empty() {
            self.output.write_line(self.styles.bold("Failures:"))?;
            for (n, failure) in self.failures.drain(..).enumerate() {
                self.output.write_line(format!(
                    "{}) {}",
                    n + 1,
                    self.styles.state(failure.state, &*failure.info.full_name),
                ))?;
                let details = failure
                    .message
                    .iter()
                    .chain(&failure.stack_trace)
                    .flat_map(|s| s.lines())
                    .map(|l| format!("    {l}"))
                    .join("\n");
                if !details.is_empty() {
                    self.output.write_line(details)?;
                }
            }
            self.output.write_str("\n")?;
        }

        let millis = u64::try_from(root.duration.as_millis()).unwrap_or(u64::MAX);
        let counts = root.counts;
        self.output.write_line(format!(
            "{} {}, Passed: {}, Failures: {}, Ignored: {}, Inconclusive: {}, \
             Time: {}",
            self.styles.bold("Tests run:"),
            counts.total(),
            counts.passed,
            counts.failures,
            counts.ignored,
            counts.inconclusive,
            humantime::format_duration(Duration::from_millis(millis)),
        ))?;
        self.output.flush()
    }
}

impl<Out: io::Write> Listener for Basic<Out> {
    fn test_started(&mut self, info: &TestInfo) {
        if let Err(e) = self.started(info) {
            tracing::warn!(error = %e, "failed to write console output");
        }
    }

    fn test_output(&mut self, output: &TestOutput) {
        if let Err(e) = self.write_output(output) {
            tracing::warn!(error = %e, "failed to write console output");
        }
    }

    fn test_finished(&mut self, result: &TestResult) {
        if let Err(e) = self.finished(result) {
            tracing::warn!(error = %e, "failed to write console output");
        }
    }
}
