//! `TerminalReporter`: Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.
//!
//! On a TTY each step runs a spinner that the next step (or the final
//! success) ticks off; otherwise steps are plain `•` lines.

use std::cell::RefCell;

use indicatif::ProgressBar;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    current: RefCell<Option<(ProgressBar, String)>>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            current: RefCell::new(None),
        }
    }

    /// Mark the running step as failed. Call before reporting the error.
    pub fn fail(&self) {
        if let Some((pb, msg)) = self.current.borrow_mut().take() {
            progress::finish_error(&pb, &msg);
        }
    }

    fn finish_current(&self) {
        if let Some((pb, msg)) = self.current.borrow_mut().take() {
            progress::finish_ok(&pb, &msg);
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        self.finish_current();
        if self.ctx.show_progress() {
            let pb = progress::spinner(message);
            *self.current.borrow_mut() = Some((pb, message.to_string()));
        } else {
            self.ctx.step(message);
        }
    }

    fn success(&self, message: &str) {
        self.finish_current();
        self.ctx.success(message);
    }

    fn warn(&self, message: &str) {
        self.ctx.warn(message);
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        self.fail();
    }
}
