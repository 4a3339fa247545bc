// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Key occurrences in the lifecycle of a test run.
//!
//! Every executed suite or test produces exactly one [`TestInfo`] on start
//! and one [`TestResult`] on finish, with any [`TestOutput`] in between.
//! [`Listener`]s receive them in a [happened-before] order.
//!
//! [`Listener`]: crate::Listener
//! [happened-before]: https://en.wikipedia.org/wiki/Happened-before

mod info;
mod result;

pub use self::{
    info::{Kind, TestInfo, TestOutput},
    result::{Counts, ResultState, TestResult},
};
