// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tree of [`Suite`]s and [`Test`]s, and the [`Executor`] walking it.

mod context;
mod executor;
mod filter;

use std::{panic::Location, sync::Arc};

use derive_more::with_trait::{Debug, Display};

use crate::error::InvocationFault;

#[doc(inline)]
pub use self::{
    context::{ExecutionContext, TestContext},
    executor::Executor,
    filter::Filter,
};

/// Body of a [`Test`].
pub type Body = Arc<dyn Fn(&TestContext) -> Result<(), Verdict> + Send + Sync>;

/// Non-successful outcome returned by a [`Test`] body.
///
/// A panicking body doesn't need a [`Verdict`]: the panic is captured and the
/// [`Test`] finishes as [`ResultState::Error`].
///
/// [`ResultState::Error`]: crate::ResultState::Error
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Verdict {
    /// Expectation didn't hold.
    #[display("{message}")]
    Failed {
        /// Description of the failure.
        message: String,

        /// Location or trace of the failure, if known.
        stack_trace: Option<String>,
    },

    /// Test decided it shouldn't run.
    #[display("{_0}")]
    Ignored(String),

    /// Test could neither pass nor fail.
    #[display("{_0}")]
    Inconclusive(String),
}

impl Verdict {
    /// Creates a [`Verdict::Failed`] recording the caller's location as its
    /// stack trace.
    #[must_use]
    #[track_caller]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            stack_trace: Some(Location::caller().to_string()),
        }
    }

    /// Creates a [`Verdict::Ignored`].
    #[must_use]
    pub fn ignored(reason: impl Into<String>) -> Self {
        Self::Ignored(reason.into())
    }

    /// Creates a [`Verdict::Inconclusive`].
    #[must_use]
    pub fn inconclusive(reason: impl Into<String>) -> Self {
        Self::Inconclusive(reason.into())
    }
}

impl From<InvocationFault> for Verdict {
    fn from(fault: InvocationFault) -> Self {
        Self::Failed { message: fault.to_string(), stack_trace: None }
    }
}

/// Single test case.
#[derive(Clone, Debug)]
pub struct Test {
    /// Name of this [`Test`], unique inside its [`Suite`].
    pub name: Arc<str>,

    /// Categories used for filtering, in addition to the inherited ones.
    pub categories: Vec<String>,

    /// Reason to never run the body, if any.
    pub ignore: Option<String>,

    /// Function executed as this [`Test`].
    #[debug(ignore)]
    pub body: Body,
}

impl Test {
    /// Creates a new [`Test`] with the given `name` and `body`.
    #[must_use]
    pub fn new<F>(name: impl Into<Arc<str>>, body: F) -> Self
    where
        F: Fn(&TestContext) -> Result<(), Verdict> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            categories: Vec::new(),
            ignore: None,
            body: Arc::new(body),
        }
    }

    /// Adds a category to this [`Test`].
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    /// Marks this [`Test`] as ignored, so its body never runs.
    #[must_use]
    pub fn ignored(mut self, reason: impl Into<String>) -> Self {
        self.ignore = Some(reason.into());
        self
    }
}

/// Child of a [`Suite`].
#[derive(Clone, Debug)]
pub enum Node {
    /// Nested [`Suite`].
    Suite(Suite),

    /// [`Test`] case.
    Test(Test),
}

/// Named group of [`Test`]s and nested [`Suite`]s, executed in insertion
/// order.
#[derive(Clone, Debug)]
pub struct Suite {
    /// Name of this [`Suite`].
    pub name: Arc<str>,

    /// Categories inherited by every descendant.
    pub categories: Vec<String>,

    /// Children in execution order.
    pub children: Vec<Node>,
}

impl Suite {
    /// Creates a new empty [`Suite`].
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            categories: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Appends a [`Test`].
    #[must_use]
    pub fn with_test(mut self, test: Test) -> Self {
        self.children.push(Node::Test(test));
        self
    }

    /// Appends a nested [`Suite`].
    #[must_use]
    pub fn with_suite(mut self, suite: Self) -> Self {
        self.children.push(Node::Suite(suite));
        self
    }

    /// Adds a category inherited by every descendant.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    /// Number of [`Test`]s in this [`Suite`] and all the nested ones.
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.children
            .iter()
            .map(|n| match n {
                Node::Suite(s) => s.test_count(),
                Node::Test(_) => 1,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_nested_tests() {
        let suite = Suite::new("root")
            .with_test(Test::new("a", |_| Ok(())))
            .with_suite(
                Suite::new("nested")
                    .with_test(Test::new("b", |_| Ok(())))
                    .with_test(Test::new("c", |_| Ok(()))),
            );

        assert_eq!(suite.test_count(), 3);
    }

    #[test]
    fn records_failure_location() {
        let line = line!() + 1;
        let verdict = Verdict::failed("nope");

        match verdict {
            Verdict::Failed { message, stack_trace } => {
                assert_eq!(message, "nope");
                let trace = stack_trace.expect("location recorded");
                assert!(trace.contains(&format!(":{line}:")), "{trace}");
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
    }

    #[test]
    fn converts_invocation_fault() {
        let verdict = Verdict::from(InvocationFault::Discarded);
        assert_eq!(verdict.to_string(), InvocationFault::Discarded.to_string());
    }
}
