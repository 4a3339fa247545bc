// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Descriptions of started tests and their output.

use std::sync::Arc;

/// Whether a [`TestInfo`] describes a suite or a single test.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    /// Node having children.
    Suite,

    /// Leaf test.
    Test,
}

/// Description of a suite or a test, emitted when it starts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestInfo {
    /// Dot-separated name including all the parent suites.
    pub full_name: Arc<str>,

    /// Own name of this node.
    pub name: Arc<str>,

    /// Whether this is a suite or a test.
    pub kind: Kind,

    /// Categories used for filtering.
    pub categories: Arc<[String]>,
}

impl TestInfo {
    /// Creates a new [`TestInfo`] of a `kind` node named `name` under the
    /// `parent` full name.
    #[must_use]
    pub fn new(
        parent: Option<&str>,
        name: impl Into<Arc<str>>,
        kind: Kind,
        categories: impl Into<Arc<[String]>>,
    ) -> Self {
        let name = name.into();
        let full_name = match parent {
            Some(p) if !p.is_empty() => format!("{p}.{name}").into(),
            _ => Arc::clone(&name),
        };
        Self {
            full_name,
            name,
            kind,
            categories: categories.into(),
        }
    }

    /// Indicates whether this [`TestInfo`] describes a suite.
    #[must_use]
    pub fn is_suite(&self) -> bool {
        self.kind == Kind::Suite
    }
}

/// Text written by a running test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestOutput {
    /// Full name of the test which wrote the text.
    pub test_name: Arc<str>,

    /// Written text.
    pub text: String,
}
