// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Wrappers providing no-op implementations.

use derive_more::with_trait::{Deref, DerefMut};

use crate::event::{TestInfo, TestOutput, TestResult};

use super::Listener;

/// [`Listener`] ignoring every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl Listener for Discard {
    fn test_started(&mut self, _: &TestInfo) {}

    fn test_finished(&mut self, _: &TestResult) {}
}

/// Wrapper ignoring [`TestOutput`]s, while passing every other event to the
/// wrapped [`Listener`].
#[derive(Clone, Copy, Debug, Deref, DerefMut)]
pub struct Output<L>(L);

impl<L> Output<L> {
    /// Wraps the given [`Listener`] into an [`Output`] one.
    #[must_use]
    pub const fn wrap(listener: L) -> Self {
        Self(listener)
    }

    /// Unwraps the inner [`Listener`].
    #[must_use]
    pub fn into_inner(self) -> L {
        self.0
    }
}

impl<L: Listener> Listener for Output<L> {
    fn test_started(&mut self, info: &TestInfo) {
        self.0.test_started(info);
    }

    fn test_output(&mut self, _: &TestOutput) {
        // Intentionally no-op.
    }

    fn test_finished(&mut self, result: &TestResult) {
        self.0.test_finished(result);
    }
}
