// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Outcomes of finished tests.

use std::{ops, time::Duration};

use derive_more::with_trait::Display;

use super::TestInfo;

/// Outcome state of a finished suite or test.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ResultState {
    /// Test passed.
    Success,

    /// Test neither passed nor failed.
    Inconclusive,

    /// Test was not run on purpose.
    Ignored,

    /// Test failed an expectation.
    Failure,

    /// Test panicked.
    Error,
}

impl ResultState {
    /// Wire classification of this state.
    ///
    /// Anything not explicitly a success, inconclusive or ignored is a
    /// `Failure`.
    #[must_use]
    pub const fn classification(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Inconclusive => "Inconclusive",
            Self::Ignored => "Ignored",
            Self::Failure | Self::Error => "Failure",
        }
    }

    /// Indicates whether this state counts as a failure.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failure | Self::Error)
    }
}

/// Aggregate outcome counts of a suite or a test.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Counts {
    /// Number of passed tests.
    pub passed: usize,

    /// Number of failed or panicked tests.
    pub failures: usize,

    /// Number of ignored tests.
    pub ignored: usize,

    /// Number of inconclusive tests.
    pub inconclusive: usize,
}

impl Counts {
    /// Counts of a single test finished in the given `state`.
    #[must_use]
    pub fn of(state: ResultState) -> Self {
        let mut counts = Self::default();
        match state {
            ResultState::Success => counts.passed = 1,
            ResultState::Inconclusive => counts.inconclusive = 1,
            ResultState::Ignored => counts.ignored = 1,
            ResultState::Failure | ResultState::Error => counts.failures = 1,
        }
        counts
    }

    /// Total number of counted tests.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.failures + self.ignored + self.inconclusive
    }

    /// Derives the state of a suite having these counts.
    ///
    /// An empty suite is inconclusive.
    #[must_use]
    pub const fn suite_state(&self) -> ResultState {
        if self.failures > 0 {
            ResultState::Failure
        } else if self.passed > 0 {
            ResultState::Success
        } else if self.inconclusive > 0 || self.ignored == 0 {
            ResultState::Inconclusive
        } else {
            ResultState::Ignored
        }
    }
}

impl ops::Add for Counts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            passed: self.passed + rhs.passed,
            failures: self.failures + rhs.failures,
            ignored: self.ignored + rhs.ignored,
            inconclusive: self.inconclusive + rhs.inconclusive,
        }
    }
}

impl ops::AddAssign for Counts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Result of a finished suite or test.
#[derive(Clone, Debug, PartialEq)]
pub struct TestResult {
    /// Finished node.
    pub info: TestInfo,

    /// Outcome state.
    pub state: ResultState,

    /// Aggregate counts (a single test counts itself).
    pub counts: Counts,

    /// Failure, ignore or inconclusive reason.
    pub message: Option<String>,

    /// Location or trace of a failure.
    pub stack_trace: Option<String>,

    /// Output written since the node started.
    pub output: Option<String>,

    /// Wall-clock time spent.
    pub duration: Duration,
}

impl TestResult {
    /// Creates a bare [`TestResult`] with counts derived from `state`.
    #[must_use]
    pub fn new(info: TestInfo, state: ResultState) -> Self {
        Self {
            info,
            state,
            counts: Counts::of(state),
            message: None,
            stack_trace: None,
            output: None,
            duration: Duration::ZERO,
        }
    }

    /// Indicates whether this result contains any failures.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.counts.failures > 0 || self.state.is_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_unknown_states_as_failure() {
        assert_eq!(ResultState::Success.classification(), "Success");
        assert_eq!(ResultState::Inconclusive.classification(), "Inconclusive");
        assert_eq!(ResultState::Ignored.classification(), "Ignored");
        assert_eq!(ResultState::Failure.classification(), "Failure");
        assert_eq!(ResultState::Error.classification(), "Failure");
    }

    #[test]
    fn derives_suite_state_from_counts() {
        let empty = Counts::default();
        assert_eq!(empty.suite_state(), ResultState::Inconclusive);

        let ignored = Counts::of(ResultState::Ignored);
        assert_eq!(ignored.suite_state(), ResultState::Ignored);

        let mixed = Counts::of(ResultState::Success) + ignored;
        assert_eq!(mixed.suite_state(), ResultState::Success);
        assert_eq!(mixed.total(), 2);

        let mut failed = mixed;
        failed += Counts::of(ResultState::Error);
        assert_eq!(failed.suite_state(), ResultState::Failure);
        assert_eq!(failed.failures, 1);
    }
}
