// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! CLI (command line interface) of a test binary.
//!
//! Every option may be omitted: without `--port` no event is streamed, and
//! without any filter every test runs.

#[cfg(feature = "output-junit")]
use std::path::PathBuf;

use regex::Regex;
use smart_default::SmartDefault;

use crate::{dispatcher::ProbePolicy, suite::Filter, writer::Coloring};

pub use clap::Parser;

/// Root CLI of a [`Harness`].
///
/// [`Harness`]: crate::Harness
#[derive(clap::Parser, Clone, Debug, SmartDefault)]
#[command(
    name = "loopunit",
    about = "Run the tests, keeping the main thread free for the UI."
)]
pub struct Opts {
    /// Loopback port of a remote listener to stream test events to.
    #[arg(long, env = "LOOPUNIT_PORT", value_name = "port")]
    pub port: Option<u16>,

    /// Regex to filter tests by their full name.
    #[arg(id = "name", long = "name", short = 'n', value_name = "regex")]
    pub name: Option<Regex>,

    /// Categories to run tests of, exclusively.
    #[arg(long, value_name = "category", value_delimiter = ',')]
    pub include: Vec<String>,

    /// Categories to never run tests of.
    #[arg(long, value_name = "category", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Print a `***** <name>` label before running each test.
    #[arg(long)]
    pub labels: bool,

    /// Coloring policy for a console output.
    #[arg(long, value_name = "auto|always|never", default_value = "auto")]
    #[default(Coloring::Auto)]
    pub color: Coloring,

    /// Path to write a JUnit XML report to.
    #[cfg(feature = "output-junit")]
    #[arg(long, value_name = "path")]
    pub junit: Option<PathBuf>,

    /// Verbosity of diagnostic logging to stderr.
    ///
    /// `-v` logs selected main loop, `-vv` additionally logs every test and
    /// discarded streamed event, `-vvv` logs everything.
    #[arg(short, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Abort when a main loop runtime is present but fails to initialize,
    /// instead of falling back to the next one.
    #[arg(long)]
    pub strict_probe: bool,
}

impl Opts {
    /// Shortcut for [`clap::Parser::parse()`], which doesn't require the trait
    /// being imported.
    #[must_use]
    pub fn parsed() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// [`Filter`] described by these [`Opts`].
    #[must_use]
    pub fn filter(&self) -> Filter {
        Filter {
            name: self.name.clone(),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
        }
    }

    /// [`ProbePolicy`] described by these [`Opts`].
    #[must_use]
    pub const fn probe_policy(&self) -> ProbePolicy {
        if self.strict_probe {
            ProbePolicy::Strict
        } else {
            ProbePolicy::Lenient
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_no_transport_and_no_filter() {
        let opts = Opts::try_parse_from(["loopunit"]).expect("parsed");

        assert_eq!(opts.port, None);
        assert!(opts.filter().is_empty());
        assert_eq!(opts.color, Coloring::Auto);
        assert_eq!(opts.probe_policy(), ProbePolicy::Lenient);
    }

    #[test]
    fn parses_every_option() {
        let opts = Opts::try_parse_from([
            "loopunit",
            "--port",
            "4321",
            "-n",
            "^widgets",
            "--include",
            "gui,slow",
            "--exclude",
            "flaky",
            "--labels",
            "--color",
            "never",
            "-vv",
            "--strict-probe",
        ])
        .expect("parsed");

        assert_eq!(opts.port, Some(4321));
        assert_eq!(opts.include, ["gui", "slow"]);
        assert_eq!(opts.exclude, ["flaky"]);
        assert!(opts.labels);
        assert_eq!(opts.color, Coloring::Never);
        assert_eq!(opts.verbose, 2);
        assert_eq!(opts.probe_policy(), ProbePolicy::Strict);
        assert!(opts.filter().matches("widgets.label", &["gui"]));
        assert!(!opts.filter().matches("layout", &["gui"]));
    }

    #[test]
    fn rejects_unknown_coloring() {
        assert!(Opts::try_parse_from(["loopunit", "--color", "pink"]).is_err());
    }
}
