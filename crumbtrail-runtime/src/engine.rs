//! One shadow stack and one call forest driven by the same event stream.
//!
//! `Engine` is the explicit-handle API: `enter_scope` returns a `ScopeHandle`
//! that must be handed back to `exit_scope` in strict reverse nesting order.
//! The thread-local collector wraps an engine behind RAII guards.
//!
//! An engine is single-threaded. Drive it from one thread at a time.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use crate::clock::{as_ms, Clock, MonotonicClock};
use crate::config::Config;
use crate::error::ScopeError;
use crate::forest::{CallForest, CallTreeNode, Window};
use crate::frame::{FrameDescriptor, ScopeKind};
use crate::report;
use crate::stack::{Exited, ScopeHandle, ShadowStack};
use crate::trace;

pub struct Engine<C: Clock = MonotonicClock> {
    config: Config,
    clock: C,
    stack: ShadowStack,
    forest: CallForest,
    interval_start: Duration,
}

impl Engine<MonotonicClock> {
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl Default for Engine<MonotonicClock> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<C: Clock> Engine<C> {
    pub fn with_clock(config: Config, clock: C) -> Self {
        let interval_start = clock.now();
        Self {
            config,
            clock,
            stack: ShadowStack::new(),
            forest: CallForest::new(),
            interval_start,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of live scopes.
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn stack(&self) -> &ShadowStack {
        &self.stack
    }

    pub fn forest(&self) -> &CallForest {
        &self.forest
    }

    pub fn enter_scope(&mut self, descriptor: FrameDescriptor) -> ScopeHandle {
        let now = self.clock.now();

        if descriptor.kind == ScopeKind::Section && self.stack.top_is_section() {
            if let Some(cut) = self.stack.supersede_top() {
                self.record_exit(cut, now);
            }
        }

        let forest = if self.config.performance_counting && descriptor.kind.is_timed() {
            Some(self.forest.resolve(self.stack.nearest_forest(), &descriptor))
        } else {
            None
        };
        self.stack.push(descriptor, now, forest)
    }

    /// Exit the innermost scope.
    ///
    /// A handle that is not the innermost live scope means the instrumentation
    /// nesting is broken. The call is refused and nothing changes.
    pub fn exit_scope(&mut self, handle: ScopeHandle) -> Result<(), ScopeError> {
        let now = self.clock.now();
        if let Some(exited) = self.stack.pop(handle)? {
            self.record_exit(exited, now);
        }
        Ok(())
    }

    fn record_exit(&mut self, exited: Exited, now: Duration) {
        if let Some(id) = exited.forest {
            let total = now.saturating_sub(exited.entered_at);
            let in_window = now.saturating_sub(exited.charged_from);
            self.forest.record_split(id, as_ms(total), as_ms(in_window));
        }
    }

    /// Decorate the innermost scope. Ignored when no scope is live.
    pub fn attach_value(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<String>) {
        self.stack.attach(name, value.into());
    }

    pub fn write_trace<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        trace::write_trace(&self.stack, out)
    }

    pub fn trace_string(&self) -> String {
        trace::trace_string(&self.stack)
    }

    /// Owned copy of the forest for one window.
    ///
    /// Reading the last interval first rolls the window over if it has
    /// elapsed, exactly like `report_for_last_interval`.
    pub fn snapshot(&mut self, window: Window) -> Vec<CallTreeNode> {
        if window == Window::LastInterval {
            self.poll_interval();
        }
        self.forest.snapshot(window)
    }

    pub fn report_for_last_interval(&mut self) -> String {
        report::render_report(&self.snapshot(Window::LastInterval))
    }

    pub fn report_since_launch(&self) -> String {
        report::render_report(&self.forest.snapshot(Window::SinceLaunch))
    }

    fn poll_interval(&mut self) {
        let now = self.clock.now();
        if now.saturating_sub(self.interval_start) >= self.config.interval {
            // Scopes still running have spent part of this window already.
            for (id, open) in self.stack.take_open_time(now) {
                self.forest.charge_open(id, as_ms(open));
            }
            self.forest.roll_interval();
            self.interval_start = now;
        }
    }
}
