// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tools for outputting test lifecycle events.
//!
//! # Listeners
//!
//! - [`Basic`] - Human-readable console output with a final summary
//! - [`Stream`] - Newline-delimited elements mirrored to a remote listener
//! - `JUnit` - JUnit XML result file (requires `output-junit` feature)
//! - [`Discard`] - No-op sink
//!
//! Listeners are combined with [`Ext::tee()`], or chosen at runtime with
//! [`Either`] and [`Option`].
//!
//! [`Either`]: either::Either

pub mod basic;
pub mod discard;
#[cfg(feature = "output-junit")]
pub mod junit;
pub mod out;
pub mod stream;
pub mod tcp;
pub mod tee;

use either::Either;
use sealed::sealed;

use crate::event::{TestInfo, TestOutput, TestResult};

#[cfg(feature = "output-junit")]
#[doc(inline)]
pub use self::junit::JUnit;
#[doc(inline)]
pub use self::{
    basic::{Basic, Coloring},
    discard::Discard,
    stream::Stream,
    tcp::TcpWriter,
    tee::Tee,
};

/// Receiver of test lifecycle events.
///
/// Events arrive in happened-before order from a single thread at a time.
/// Implementors never fail the run: problems with their own output are
/// theirs to handle.
pub trait Listener {
    /// Handles a suite or a test being started.
    fn test_started(&mut self, info: &TestInfo);

    /// Handles text written by a running test.
    ///
    /// Delivered after the [`Listener::test_started()`] and before the
    /// [`Listener::test_finished()`] of that test.
    fn test_output(&mut self, output: &TestOutput) {
        _ = output;
    }

    /// Handles a suite or a test being finished.
    fn test_finished(&mut self, result: &TestResult);
}

impl<L: Listener + ?Sized> Listener for &mut L {
    fn test_started(&mut self, info: &TestInfo) {
        (**self).test_started(info);
    }

    fn test_output(&mut self, output: &TestOutput) {
        (**self).test_output(output);
    }

    fn test_finished(&mut self, result: &TestResult) {
        (**self).test_finished(result);
    }
}

impl<L: Listener + ?Sized> Listener for Box<L> {
    fn test_started(&mut self, info: &TestInfo) {
        (**self).test_started(info);
    }

    fn test_output(&mut self, output: &TestOutput) {
        (**self).test_output(output);
    }

    fn test_finished(&mut self, result: &TestResult) {
        (**self).test_finished(result);
    }
}

impl<L: Listener> Listener for Option<L> {
    fn test_started(&mut self, info: &TestInfo) {
        if let Some(l) = self {
            l.test_started(info);
        }
    }

    fn test_output(&mut self, output: &TestOutput) {
        if let Some(l) = self {
            l.test_output(output);
        }
    }

    fn test_finished(&mut self, result: &TestResult) {
        if let Some(l) = self {
            l.test_finished(result);
        }
    }
}

impl<L: Listener, R: Listener> Listener for Either<L, R> {
    fn test_started(&mut self, info: &TestInfo) {
        either::for_both!(self, l => l.test_started(info));
    }

    fn test_output(&mut self, output: &TestOutput) {
        either::for_both!(self, l => l.test_output(output));
    }

    fn test_finished(&mut self, result: &TestResult) {
        either::for_both!(self, l => l.test_finished(result));
    }
}

/// Extension of [`Listener`] allowing its composition.
#[sealed]
pub trait Ext: Listener + Sized {
    /// Passes events both to this and the `other` [`Listener`].
    ///
    /// See [`Tee`] for more information.
    #[must_use]
    fn tee<R: Listener>(self, other: R) -> Tee<Self, R>;

    /// Stops passing [`TestOutput`]s to this [`Listener`].
    ///
    /// See [`discard::Output`] for more information.
    #[must_use]
    fn discard_output(self) -> discard::Output<Self>;
}

#[sealed]
impl<T: Listener> Ext for T {
    fn tee<R: Listener>(self, other: R) -> Tee<Self, R> {
        Tee::new(self, other)
    }

    fn discard_output(self) -> discard::Output<Self> {
        discard::Output::wrap(self)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::event::{Kind, ResultState};

    use super::*;

    /// [`Listener`] appending `<label> <event>` lines into a shared log.
    #[derive(Clone, Debug)]
    struct Log(&'static str, Arc<Mutex<Vec<String>>>);

    impl Log {
        fn push(&self, event: &str) {
            let line = format!("{} {event}", self.0);
            self.1.lock().expect("not poisoned").push(line);
        }
    }

    impl Listener for Log {
        fn test_started(&mut self, _: &TestInfo) {
            self.push("started");
        }

        fn test_output(&mut self, _: &TestOutput) {
            self.push("output");
        }

        fn test_finished(&mut self, _: &TestResult) {
            self.push("finished");
        }
    }

    fn feed(listener: &mut impl Listener) {
        let info = TestInfo::new(None, "t", Kind::Test, Vec::<String>::new());
        listener.test_started(&info);
        listener.test_output(&TestOutput {
            test_name: Arc::clone(&info.full_name),
            text: "x".into(),
        });
        listener.test_finished(&TestResult::new(info, ResultState::Success));
    }

    #[test]
    fn tees_left_before_right() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut tee = Log("l", Arc::clone(&log))
            .tee(Log("r", Arc::clone(&log)).discard_output());

        feed(&mut tee);

        assert_eq!(
            *log.lock().expect("not poisoned"),
            ["l started", "r started", "l output", "l finished", "r finished"],
        );
    }

    #[test]
    fn forwards_through_option_and_either() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut none: Option<Log> = None;
        let mut right: Either<Discard, Log> = Either::Right(Log("e", Arc::clone(&log)));

        feed(&mut none);
        feed(&mut right);
        feed(&mut Box::new(Log("b", Arc::clone(&log))));

        assert_eq!(
            *log.lock().expect("not poisoned"),
            [
                "e started",
                "e output",
                "e finished",
                "b started",
                "b output",
                "b finished",
            ],
        );
    }
}
