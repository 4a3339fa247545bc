// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`tracing`] integration layer.
//!
//! Every part of the crate emits [`tracing`] events, but never installs a
//! global [`Subscriber`] by itself. [`init_tracing()`] installs a default one,
//! writing to [`io::Stderr`] so the console output of tests stays intact.
//!
//! [`Subscriber`]: tracing::Subscriber

use std::io;

use tracing::Level;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt,
    layer::SubscriberExt as _,
    util::SubscriberInitExt as _,
};

/// Initializes a global [`fmt`] [`Subscriber`] showing events of the given
/// `level` and above, unless overridden with the `RUST_LOG` environment
/// variable.
///
/// Returns `false` if a global [`Subscriber`] has been already set.
///
/// [`Subscriber`]: tracing::Subscriber
pub fn init_tracing(level: Level) -> bool {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_thread_names(true))
        .try_init()
        .is_ok()
}

/// Maps a `-v` flag count onto a [`Level`].
#[must_use]
pub const fn level_from_verbosity(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}
