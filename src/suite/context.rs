// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Context handed to a running [`Test`] body.
//!
//! [`Test`]: super::Test

use std::{
    mem,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, PoisonError},
};

use derive_more::with_trait::Debug;

use crate::{error::InvocationFault, MainLoop};

/// Ambient state of a running test, carried explicitly into functions
/// executed on the main thread.
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    /// Full name of the running test.
    test_name: Arc<str>,

    /// Text written by the test so far.
    #[debug(ignore)]
    output: Arc<Mutex<String>>,
}

impl ExecutionContext {
    /// Creates a new [`ExecutionContext`] of the test named `test_name`.
    #[must_use]
    pub fn new(test_name: impl Into<Arc<str>>) -> Self {
        Self {
            test_name: test_name.into(),
            output: Arc::default(),
        }
    }

    /// Full name of the running test.
    #[must_use]
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Appends `text` to the output of the running test.
    pub fn write(&self, text: impl AsRef<str>) {
        self.output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(text.as_ref());
    }

    /// Takes all the text written so far.
    pub(crate) fn take_output(&self) -> String {
        mem::take(&mut *self.output.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Handle of a running test to its environment.
#[derive(Debug)]
pub struct TestContext {
    /// Ambient state of this test.
    execution: ExecutionContext,

    /// Dispatcher owning the main thread, if tests run on a worker thread.
    main_loop: Option<Arc<dyn MainLoop>>,
}

impl TestContext {
    pub(crate) const fn new(
        execution: ExecutionContext,
        main_loop: Option<Arc<dyn MainLoop>>,
    ) -> Self {
        Self { execution, main_loop }
    }

    /// Full name of the running test.
    #[must_use]
    pub fn name(&self) -> &str {
        self.execution.test_name()
    }

    /// Appends `text` to the captured output of the running test.
    pub fn write(&self, text: impl AsRef<str>) {
        self.execution.write(text);
    }

    /// Ambient state of the running test.
    #[must_use]
    pub const fn execution(&self) -> &ExecutionContext {
        &self.execution
    }

    /// Indicates whether the test body runs on a worker thread, with the main
    /// thread owned by a [`MainLoop`].
    #[must_use]
    pub const fn is_dispatched(&self) -> bool {
        self.main_loop.is_some()
    }

    /// Executes `f` on the main thread, blocking until it completes.
    ///
    /// Without a [`MainLoop`] the current thread is the main one, so `f` is
    /// executed inline.
    ///
    /// # Errors
    ///
    /// See [`MainLoop::execute()`]. A panic of `f` is captured into
    /// [`InvocationFault::Panicked`] in both topologies.
    pub fn on_main_thread<F, T>(&self, f: F) -> Result<T, InvocationFault>
    where
        F: FnOnce(&ExecutionContext) -> T + Send + 'static,
        T: Send + 'static,
    {
        match &self.main_loop {
            Some(main_loop) => main_loop.execute(self.execution.clone(), f),
            None => panic::catch_unwind(AssertUnwindSafe(|| f(&self.execution)))
                .map_err(InvocationFault::panicked),
        }
    }
}
