// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Passing events to multiple [`Listener`]s simultaneously.

use crate::event::{TestInfo, TestOutput, TestResult};

use super::Listener;

/// Wrapper for passing events to multiple [`Listener`]s simultaneously.
///
/// The `left` [`Listener`] always receives an event before the `right` one.
#[derive(Clone, Debug)]
pub struct Tee<L, R> {
    /// Left [`Listener`].
    left: L,

    /// Right [`Listener`].
    right: R,
}

impl<L, R> Tee<L, R> {
    /// Creates a new [`Tee`] [`Listener`], which passes events both to the
    /// `left` and `right` [`Listener`]s.
    #[must_use]
    pub const fn new(left: L, right: R) -> Self {
        Self { left, right }
    }

    /// Splits this [`Tee`] back into its `left` and `right` [`Listener`]s.
    #[must_use]
    pub fn into_inner(self) -> (L, R) {
        (self.left, self.right)
    }
}

impl<L: Listener, R: Listener> Listener for Tee<L, R> {
    fn test_started(&mut self, info: &TestInfo) {
        self.left.test_started(info);
        self.right.test_started(info);
    }

    fn test_output(&mut self, output: &TestOutput) {
        self.left.test_output(output);
        self.right.test_output(output);
    }

    fn test_finished(&mut self, result: &TestResult) {
        self.left.test_finished(result);
        self.right.test_finished(result);
    }
}
