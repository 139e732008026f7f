// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Context
//!
//! Every engine receives a [`SolverContext`] carrying its side channels: a toggle for the
//! `tracing` events it emits and an optional progress sink. Neither affects the numbers.

use std::fmt;

/// A write-only progress sink, called with the completed fraction in `[0, 1]`
pub type ProgressSink<'a> = &'a (dyn Fn(f64) + Send + Sync);

/// Side channels handed to each engine
#[derive(Clone, Copy)]
pub struct SolverContext<'a> {
    logging: bool,
    progress: Option<ProgressSink<'a>>,
}

impl Default for SolverContext<'_> {
    fn default() -> Self {
        Self {
            logging: true,
            progress: None,
        }
    }
}

impl fmt::Debug for SolverContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverContext")
            .field("logging", &self.logging)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl<'a> SolverContext<'a> {
    /// A context which logs and reports no progress
    pub fn new() -> Self {
        Self::default()
    }

    /// A context which neither logs nor reports progress
    pub fn silent() -> Self {
        Self {
            logging: false,
            progress: None,
        }
    }

    /// Toggle the engine's `tracing` events
    pub fn with_logging(self, logging: bool) -> Self {
        Self { logging, ..self }
    }

    /// Attach a progress sink
    pub fn with_progress(self, progress: ProgressSink<'a>) -> SolverContext<'a> {
        SolverContext {
            logging: self.logging,
            progress: Some(progress),
        }
    }

    /// Whether engine events should be emitted
    pub fn logging_enabled(&self) -> bool {
        self.logging
    }

    /// The same logging toggle with the progress sink detached
    pub(crate) fn without_progress(self) -> Self {
        Self {
            logging: self.logging,
            progress: None,
        }
    }

    pub(crate) fn report(&self, fraction: f64) {
        if let Some(sink) = self.progress {
            sink(fraction.clamp(0_f64, 1_f64));
        }
    }
}
