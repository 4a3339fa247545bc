// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Test harness for code which must run on a single designated main thread.
//!
//! A [`Suite`] is executed on a worker thread while the calling thread becomes
//! the main thread, pumping a [`MainLoop`] dispatcher until the suite
//! completes. Tests reach the main thread through
//! [`TestContext::on_main_thread()`], and lifecycle events may be mirrored
//! live to a remote listener with [`writer::Stream`].
//!
//! # Example
//!
//! ```rust,no_run
//! use loopunit::{Harness, Suite, Test};
//!
//! let suite = Suite::new("widgets").with_test(Test::new("renders", |cx| {
//!     let answer = cx.on_main_thread(|_| 40 + 2)?;
//!     assert_eq!(answer, 42);
//!     Ok(())
//! }));
//!
//! Harness::new(suite).run_and_exit();
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
    trivial_casts,
    trivial_numeric_casts
)]
#![forbid(non_ascii_idents, unsafe_code)]
#![warn(
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod cli;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod harness;
pub mod runner;
pub mod suite;
pub mod tracing;
pub mod writer;

#[doc(inline)]
pub use self::{
    dispatcher::{CrossThreadCall, MainLoop, Registry, WorkQueueLoop},
    error::{Error, Result},
    event::{Counts, ResultState, TestInfo, TestOutput, TestResult},
    harness::Harness,
    runner::{Orchestrator, RunOutcome, Topology},
    suite::{ExecutionContext, Filter, Suite, Test, TestContext, Verdict},
    tracing::init_tracing,
    writer::{Ext as ListenerExt, Listener},
};
