// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Selection of the [`MainLoop`] to run tests with.

use std::{
    borrow::Cow,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use once_cell::sync::OnceCell;

use crate::error::{dispatch::coerce_info, ToolkitUnavailable};

use super::{MainLoop, WorkQueueLoop};

/// Constructor of a toolkit adapter, locating its runtime.
pub type Probe =
    Box<dyn Fn() -> Result<Arc<dyn MainLoop>, ToolkitUnavailable> + Send + Sync>;

/// Reaction of a [`Registry`] to a candidate failing to come up.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ProbePolicy {
    /// Every failure falls through to the next candidate.
    #[default]
    Lenient,

    /// A runtime which is present, but fails to initialize, aborts the
    /// selection instead of falling through.
    Strict,
}

/// Priority-ordered list of [`MainLoop`] candidates, probed once.
///
/// Registered toolkit adapters are probed in registration order, followed by
/// the self-hosted [`WorkQueueLoop`] (unless disabled). The first candidate
/// which both constructs and passes [`MainLoop::initialize_toolkit()`] is
/// cached and returned by every subsequent [`Registry::select()`].
///
/// Meant to be created once at startup and passed by reference to whatever
/// runs the tests.
pub struct Registry {
    /// Registered toolkit adapters.
    candidates: Vec<(Cow<'static, str>, Probe)>,

    /// Whether [`WorkQueueLoop`] closes the list.
    fallback: bool,

    /// How candidate failures are treated.
    policy: ProbePolicy,

    /// Memoized outcome of probing.
    selected: OnceCell<Option<Arc<dyn MainLoop>>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field(
                "candidates",
                &self.candidates.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field("fallback", &self.fallback)
            .field("policy", &self.policy)
            .field("selected", &self.selected.get())
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            fallback: true,
            policy: ProbePolicy::default(),
            selected: OnceCell::new(),
        }
    }
}

impl Registry {
    /// Creates a new [`Registry`] containing only the [`WorkQueueLoop`]
    /// fallback.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new [`Registry`] without any candidates, so tests always run
    /// directly on the calling thread.
    #[must_use]
    pub fn direct() -> Self {
        Self::new().without_fallback()
    }

    /// Registers a toolkit adapter, probed after the previously registered
    /// ones and before the [`WorkQueueLoop`] fallback.
    #[must_use]
    pub fn with_toolkit<F>(mut self, name: impl Into<Cow<'static, str>>, probe: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn MainLoop>, ToolkitUnavailable>
            + Send
            + Sync
            + 'static,
    {
        self.candidates.push((name.into(), Box::new(probe)));
        self
    }

    /// Removes the [`WorkQueueLoop`] fallback from the candidates.
    #[must_use]
    pub fn without_fallback(mut self) -> Self {
        self.fallback = false;
        self
    }

    /// Sets the [`ProbePolicy`].
    #[must_use]
    pub fn with_policy(mut self, policy: ProbePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the selected and initialized [`MainLoop`], probing the
    /// candidates on the first call only.
    ///
    /// [`None`] means no dispatcher is available and tests should run directly
    /// on the calling thread.
    ///
    /// # Errors
    ///
    /// With [`ProbePolicy::Strict`] only, if a candidate's runtime is present
    /// but fails to initialize. Such an outcome isn't memoized.
    pub fn select(&self) -> Result<Option<Arc<dyn MainLoop>>, ToolkitUnavailable> {
        self.selected.get_or_try_init(|| self.probe()).cloned()
    }

    fn probe(&self) -> Result<Option<Arc<dyn MainLoop>>, ToolkitUnavailable> {
        for (name, probe) in &self.candidates {
            let constructed = panic::catch_unwind(AssertUnwindSafe(|| probe()))
                .unwrap_or_else(|info| {
                    Err(ToolkitUnavailable::failed(name.clone(), coerce_info(&info)))
                });
            if let Some(main_loop) = self.try_candidate(name, constructed)? {
                return Ok(Some(main_loop));
            }
        }
        if self.fallback {
            let fallback: Arc<dyn MainLoop> = Arc::new(WorkQueueLoop::new());
            if let Some(main_loop) = self.try_candidate("work-queue", Ok(fallback))? {
                return Ok(Some(main_loop));
            }
        }

        tracing::info!("no main loop available, running tests directly");
        Ok(None)
    }

    /// Initializes a `constructed` candidate, deciding by the [`ProbePolicy`]
    /// whether its failure falls through.
    fn try_candidate(
        &self,
        name: &str,
        constructed: Result<Arc<dyn MainLoop>, ToolkitUnavailable>,
    ) -> Result<Option<Arc<dyn MainLoop>>, ToolkitUnavailable> {
        tracing::debug!(toolkit = name, "probing main loop");
        match constructed.and_then(|l| l.initialize_toolkit().map(|()| l)) {
            Ok(main_loop) => {
                tracing::info!(
                    toolkit = name,
                    main_loop = main_loop.name(),
                    "main loop selected",
                );
                Ok(Some(main_loop))
            }
            Err(e) if e.is_partial() && self.policy == ProbePolicy::Strict => {
                tracing::error!(toolkit = name, error = %e, "main loop probe aborted");
                Err(e)
            }
            Err(e) => {
                tracing::debug!(toolkit = name, error = %e, "main loop unavailable");
                Ok(None)
            }
        }
    }
}
