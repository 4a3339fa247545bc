// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Top-level [`Harness`] of a test binary.

use std::{process, sync::Arc};

use derive_more::with_trait::Debug;

use crate::{
    cli::Opts,
    dispatcher::Registry,
    error::Error,
    runner::{Hook, Orchestrator, RunOutcome},
    suite::Suite,
    tracing::{init_tracing, level_from_verbosity},
    writer::{Basic, Discard, Ext as _, Listener, Stream},
};

/// Top-level test harness.
///
/// Composes the console [`Basic`] output, the [`Stream`] to a remote listener
/// (if a port is configured), a JUnit report (if requested), and a custom
/// [`Listener`], then executes a [`Suite`] with an [`Orchestrator`].
///
/// # Example
///
/// ```rust,no_run
/// use loopunit::{Harness, Suite, Test, Verdict};
///
/// Harness::new(
///     Suite::new("app")
///         .with_test(Test::new("starts", |_| Ok(())))
///         .with_test(Test::new("stops", |_| Err(Verdict::inconclusive("later")))),
/// )
/// .before_shutdown(|| println!("closing windows"))
/// .run_and_exit();
/// ```
#[derive(Debug)]
pub struct Harness<L = Discard> {
    /// [`Suite`] to execute.
    suite: Suite,

    /// Source of the [`MainLoop`].
    ///
    /// [`MainLoop`]: crate::MainLoop
    registry: Registry,

    /// Custom [`Listener`] receiving events along with the built-in ones.
    listener: L,

    /// CLI options, parsed from the command line if not provided.
    cli: Option<Opts>,

    /// Pre-shutdown notifications.
    #[debug(ignore)]
    before_shutdown: Vec<Hook>,
}

impl Harness {
    /// Creates a new [`Harness`] executing the given `suite` with the default
    /// [`Registry`].
    #[must_use]
    pub fn new(suite: Suite) -> Self {
        Self {
            suite,
            registry: Registry::new(),
            listener: Discard,
            cli: None,
            before_shutdown: Vec::new(),
        }
    }
}

impl<L: Listener + Send> Harness<L> {
    /// Replaces the [`Registry`] to select a [`MainLoop`] from.
    ///
    /// [`MainLoop`]: crate::MainLoop
    #[must_use]
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets a custom [`Listener`] receiving events along with the built-in
    /// ones.
    #[must_use]
    pub fn with_listener<N: Listener + Send>(self, listener: N) -> Harness<N> {
        let Self { suite, registry, cli, before_shutdown, .. } = self;
        Harness { suite, registry, listener, cli, before_shutdown }
    }

    /// Registers a notification to run on the main thread right before the
    /// [`MainLoop`] shuts down.
    ///
    /// See [`Orchestrator::before_shutdown()`] for details.
    ///
    /// [`MainLoop`]: crate::MainLoop
    #[must_use]
    pub fn before_shutdown<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.before_shutdown.push(Arc::new(hook));
        self
    }

    /// Uses the given [`Opts`] instead of parsing the command line.
    #[must_use]
    pub fn with_cli(mut self, cli: Opts) -> Self {
        self.cli = Some(cli);
        self
    }

    /// Executes the [`Suite`].
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::execute()`].
    pub fn run(self) -> Result<RunOutcome, Error> {
        let Self { suite, registry, listener, cli, before_shutdown } = self;
        let cli = cli.unwrap_or_else(Opts::parsed);

        if cli.verbose > 0 {
            _ = init_tracing(level_from_verbosity(cli.verbose));
        }
        let registry = if cli.strict_probe {
            registry.with_policy(cli.probe_policy())
        } else {
            registry
        };

        let console = Basic::stdout()
            .with_coloring(cli.color)
            .with_labels(cli.labels);
        let remote = cli.port.map(Stream::tcp);
        #[cfg(feature = "output-junit")]
        let junit = cli.junit.as_ref().and_then(|path| {
            crate::writer::JUnit::create(path)
                .map_err(|e| {
                    tracing::error!(
                        path = %path.display(),
                        error = %e,
                        "failed to create JUnit report",
                    );
                })
                .ok()
        });
        #[cfg(not(feature = "output-junit"))]
        let junit = None::<Discard>;
        let mut listener = console.tee(remote).tee(junit).tee(listener);

        let orchestrator = before_shutdown.into_iter().fold(
            Orchestrator::new(&registry).with_filter(cli.filter()),
            |o, hook| o.before_shutdown(move || hook()),
        );
        orchestrator.execute(&suite, &mut listener)
    }

    /// Executes the [`Suite`] and exits the process with the
    /// [`RunOutcome::exit_code()`].
    pub fn run_and_exit(self) -> ! {
        let code = match self.run() {
            Ok(outcome) => {
                if let Some(fault) = &outcome.worker_fault {
                    eprintln!("Unexpected error while running tests: {fault}");
                }
                outcome.exit_code()
            }
            Err(e) => {
                eprintln!("Failed to run tests: {e}");
                1
            }
        };
        process::exit(code)
    }
}
