// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Dispatcher errors.
//!
//! This module defines errors of bringing a [`MainLoop`] up, of misusing its
//! loop, and of work executed through it on the main thread.
//!
//! [`MainLoop`]: crate::MainLoop

use std::{any::Any, borrow::Cow, panic};

use derive_more::with_trait::{Display, Error};

/// Alias for a [`catch_unwind()`] error.
///
/// [`catch_unwind()`]: std::panic::catch_unwind()
pub type Info = Box<dyn Any + Send + 'static>;

/// Coerces a [`catch_unwind()`] payload into a readable message.
///
/// [`catch_unwind()`]: std::panic::catch_unwind()
#[must_use]
pub fn coerce_info(info: &Info) -> Cow<'static, str> {
    info.downcast_ref::<String>()
        .map(|s| s.clone().into())
        .or_else(|| info.downcast_ref::<&str>().map(|s| (*s).to_owned().into()))
        .unwrap_or_else(|| "(Could not resolve panic payload)".into())
}

/// Reason a toolkit adapter could not be brought up.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Unavailability {
    /// Underlying runtime isn't present in this process.
    #[display("runtime is not present")]
    Absent,

    /// Runtime is present, but failed to initialize.
    #[display("initialization failed: {_0}")]
    Failed(String),
}

impl std::error::Error for Unavailability {}

/// No dispatcher could be brought up for the named toolkit.
///
/// Non-fatal: the orchestrator falls back to direct execution.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("`{toolkit}` toolkit unavailable: {reason}")]
pub struct ToolkitUnavailable {
    /// Name of the toolkit adapter.
    #[error(not(source))]
    pub toolkit: Cow<'static, str>,

    /// Why the adapter is unavailable.
    #[error(source)]
    pub reason: Unavailability,
}

impl ToolkitUnavailable {
    /// Creates an error of the `toolkit` runtime not being present.
    #[must_use]
    pub fn absent(toolkit: impl Into<Cow<'static, str>>) -> Self {
        Self {
            toolkit: toolkit.into(),
            reason: Unavailability::Absent,
        }
    }

    /// Creates an error of the `toolkit` runtime failing to initialize.
    #[must_use]
    pub fn failed(
        toolkit: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            toolkit: toolkit.into(),
            reason: Unavailability::Failed(message.into()),
        }
    }

    /// Indicates whether the runtime is present, but broken.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        matches!(self.reason, Unavailability::Failed(_))
    }
}

/// Misuse of a dispatcher loop.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum DispatchError {
    /// The loop is already being run by another thread.
    #[display("main loop is already running")]
    AlreadyRunning,

    /// The loop was entered from a work item it is executing.
    #[display("main loop cannot be re-entered from its own work item")]
    Reentrant,

    /// The loop has already stopped and cannot run again.
    #[display("main loop has already stopped")]
    Stopped,
}

/// Failure of a cross-thread call.
#[derive(Debug, Display, Error)]
pub enum InvocationFault {
    /// The function panicked on the main thread.
    #[display("panicked on the main thread: {message}")]
    Panicked {
        /// Readable panic message.
        #[error(not(source))]
        message: String,

        /// Original panic payload, re-raised by [`InvocationFault::resume()`].
        payload: Info,
    },

    /// The dispatcher stopped before the function could run.
    #[display("discarded by a stopped main loop")]
    Discarded,

    /// Waiting was requested from the dispatcher's own thread.
    #[display("waiting on the main loop from its own thread would deadlock")]
    WouldDeadlock,
}

impl InvocationFault {
    /// Creates an [`InvocationFault::Panicked`] from a [`catch_unwind()`]
    /// payload.
    ///
    /// [`catch_unwind()`]: std::panic::catch_unwind()
    #[must_use]
    pub fn panicked(payload: Info) -> Self {
        Self::Panicked {
            message: coerce_info(&payload).into_owned(),
            payload,
        }
    }

    /// Re-raises this fault on the current thread.
    ///
    /// A captured panic is resumed with its identical payload.
    pub fn resume(self) -> ! {
        match self {
            Self::Panicked { payload, .. } => panic::resume_unwind(payload),
            other => panic!("{other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_string_payloads() {
        let info: Info = Box::new(String::from("owned"));
        assert_eq!(coerce_info(&info), "owned");

        let info: Info = Box::new("static");
        assert_eq!(coerce_info(&info), "static");

        let info: Info = Box::new(42_u8);
        assert_eq!(coerce_info(&info), "(Could not resolve panic payload)");
    }

    #[test]
    fn distinguishes_partial_toolkits() {
        assert!(!ToolkitUnavailable::absent("gtk").is_partial());
        assert!(ToolkitUnavailable::failed("gtk", "no display").is_partial());
        assert_eq!(
            ToolkitUnavailable::failed("gtk", "no display").to_string(),
            "`gtk` toolkit unavailable: initialization failed: no display",
        );
    }

    #[test]
    fn resumes_identical_payload() {
        let fault = InvocationFault::panicked(Box::new(7_u32));
        let caught = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            fault.resume();
        }))
        .expect_err("should panic");
        assert_eq!(caught.downcast_ref::<u32>(), Some(&7));
    }
}
