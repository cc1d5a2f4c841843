//! Thread-local engine with RAII scope guards.
//!
//! Each thread lazily gets its own `Engine`. Every engine in the process is
//! built from the same configuration: the one installed by `init()` before
//! the first scope anywhere, or `Config::from_env()` otherwise. `enter()` pushes a scope and
//! returns a `ScopeGuard`; dropping the guard exits the scope on every exit
//! path, early returns and unwinding included.
//!
//! Queries never create an engine and never panic. If the engine is borrowed
//! (a crash handler interrupted an enter or exit on this thread) they return
//! empty output instead.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{FlushError, ScopeError};
use crate::forest::{CallTreeNode, Window};
use crate::frame::{FrameDescriptor, Location, ScopeKind};
use crate::run_file::{runs_dir, RunFile};
use crate::stack::ScopeHandle;

static INSTALLED: OnceLock<Config> = OnceLock::new();
/// Set once any thread has created its engine.
static ENGINES_STARTED: AtomicBool = AtomicBool::new(false);

thread_local! {
    static ENGINE: RefCell<Option<Engine>> = const { RefCell::new(None) };
    /// Bumped by `reset()` so guards from a dropped engine stay inert.
    static GENERATION: Cell<u64> = const { Cell::new(0) };
}

fn effective(mut config: Config) -> Config {
    if !cfg!(feature = "perf") {
        config.performance_counting = false;
    }
    config
}

fn process_config() -> Config {
    let config = INSTALLED.get().cloned().unwrap_or_else(Config::from_env);
    effective(config)
}

fn new_engine() -> Engine {
    ENGINES_STARTED.store(true, Ordering::Release);
    Engine::new(process_config())
}

fn with_engine<R>(f: impl FnOnce(&mut Engine) -> R) -> Option<R> {
    ENGINE
        .try_with(|cell| {
            let mut slot = cell.try_borrow_mut().ok()?;
            let engine = slot.get_or_insert_with(new_engine);
            Some(f(engine))
        })
        .ok()
        .flatten()
}

fn with_existing<R>(f: impl FnOnce(&mut Engine) -> R) -> Option<R> {
    ENGINE
        .try_with(|cell| cell.try_borrow_mut().ok()?.as_mut().map(f))
        .ok()
        .flatten()
}

fn read_existing<R>(f: impl FnOnce(&Engine) -> R) -> Option<R> {
    ENGINE
        .try_with(|cell| cell.try_borrow().ok()?.as_ref().map(f))
        .ok()
        .flatten()
}

fn generation() -> u64 {
    GENERATION.try_with(Cell::get).unwrap_or(u64::MAX)
}

/// Exits its scope when dropped. Must be dropped on the thread that created it.
#[must_use = "dropping the guard immediately exits the scope; bind it with `let _guard = ...`"]
pub struct ScopeGuard {
    handle: Option<ScopeHandle>,
    generation: u64,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let Some(handle) = self.handle else {
            return;
        };
        if self.generation != generation() {
            return;
        }
        if let Some(Err(e)) = with_existing(|engine| engine.exit_scope(handle)) {
            log::error!("crumbtrail: {e} (instrumentation bug)");
        }
    }
}

/// Install the configuration every thread's engine is built from.
///
/// Must run before the first scope on any thread, and only once.
pub fn init(config: Config) -> Result<(), ScopeError> {
    if INSTALLED.get().is_some() {
        return Err(ScopeError::AlreadyConfigured);
    }
    if ENGINES_STARTED.load(Ordering::Acquire) {
        return Err(ScopeError::AlreadyStarted);
    }
    INSTALLED
        .set(config)
        .map_err(|_| ScopeError::AlreadyConfigured)
}

/// Drop this thread's engine and everything it recorded. The next scope
/// starts a fresh engine from the process configuration.
pub fn reset() {
    let _ = GENERATION.try_with(|g| g.set(g.get().wrapping_add(1)));
    let _ = ENGINE.try_with(|cell| {
        if let Ok(mut slot) = cell.try_borrow_mut() {
            *slot = None;
        }
    });
}

/// Push a scope onto this thread's stack until the guard drops.
pub fn enter(
    kind: ScopeKind,
    label: impl Into<Cow<'static, str>>,
    location: Option<Location>,
) -> ScopeGuard {
    let descriptor = FrameDescriptor::new(kind, label, location);
    ScopeGuard {
        handle: with_engine(|engine| engine.enter_scope(descriptor)),
        generation: generation(),
        _not_send: PhantomData,
    }
}

/// `enter` for a function, usually through `scope_fn!`.
#[inline]
pub fn enter_function(
    name: impl Into<Cow<'static, str>>,
    location: Option<Location>,
) -> ScopeGuard {
    enter(ScopeKind::Function, name, location)
}

/// `enter` for a labelled block.
#[inline]
pub fn enter_block(label: impl Into<Cow<'static, str>>) -> ScopeGuard {
    enter(ScopeKind::Block, label, None)
}

/// `enter` for a section. Replaces a section that is the current top.
#[inline]
pub fn enter_section(label: impl Into<Cow<'static, str>>) -> ScopeGuard {
    enter(ScopeKind::Section, label, None)
}

/// `enter` for an untimed frame that only shows up in traces.
#[inline]
pub fn enter_value(label: impl Into<Cow<'static, str>>) -> ScopeGuard {
    enter(ScopeKind::Value, label, None)
}

/// Attach an already formatted value to the innermost live scope.
pub fn attach_value(name: impl Into<Cow<'static, str>>, value: impl Into<String>) {
    with_existing(|engine| engine.attach_value(name, value));
}

/// Number of live scopes on this thread.
pub fn depth() -> usize {
    read_existing(Engine::depth).unwrap_or(0)
}

/// Render this thread's trace into `out` without allocating.
pub fn write_trace<W: fmt::Write>(out: &mut W) -> fmt::Result {
    read_existing(|engine| engine.write_trace(out)).unwrap_or(Ok(()))
}

/// This thread's trace. Empty before the first scope.
pub fn get_trace_string() -> String {
    read_existing(Engine::trace_string).unwrap_or_default()
}

/// Call-tree report of the last completed interval, rolling the window over
/// first if it has elapsed.
pub fn get_performance_report_for_last_interval() -> String {
    with_existing(Engine::report_for_last_interval).unwrap_or_default()
}

/// Call-tree report of everything this thread has timed.
pub fn get_performance_report_since_launch() -> String {
    read_existing(Engine::report_since_launch).unwrap_or_default()
}

/// Owned copy of this thread's call forest for one window.
pub fn snapshot(window: Window) -> Vec<CallTreeNode> {
    with_existing(|engine| engine.snapshot(window)).unwrap_or_default()
}

/// Write this thread's since-launch forest to the runs directory.
///
/// Returns the written path, or `None` when nothing has been timed yet.
pub fn flush() -> Result<Option<PathBuf>, FlushError> {
    let dir = runs_dir().ok_or(FlushError::NoRunsDir)?;
    flush_to(&dir)
}

/// Like `flush`, into `dir`.
pub fn flush_to(dir: &Path) -> Result<Option<PathBuf>, FlushError> {
    let trees = snapshot(Window::SinceLaunch);
    if trees.is_empty() {
        return Ok(None);
    }
    let run = RunFile::new(Window::SinceLaunch, trees);
    let path = dir.join(format!("{}.json", run.timestamp_ms));
    run.write(&path)?;
    log::debug!("crumbtrail: wrote {}", path.display());
    Ok(Some(path))
}
