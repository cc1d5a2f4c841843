//! Collector used when the `trace` feature is off.
//!
//! Same surface as the thread-local collector. Every call is an inlined no-op
//! and the guard is zero-sized, so instrumented code compiles away.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{FlushError, ScopeError};
use crate::forest::{CallTreeNode, Window};
use crate::frame::{Location, ScopeKind};

#[must_use = "dropping the guard immediately exits the scope; bind it with `let _guard = ...`"]
pub struct ScopeGuard;

#[inline(always)]
pub fn init(_config: Config) -> Result<(), ScopeError> {
    Ok(())
}

#[inline(always)]
pub fn reset() {}

#[inline(always)]
pub fn enter(
    _kind: ScopeKind,
    _label: impl Into<Cow<'static, str>>,
    _location: Option<Location>,
) -> ScopeGuard {
    ScopeGuard
}

#[inline(always)]
pub fn enter_function(
    _name: impl Into<Cow<'static, str>>,
    _location: Option<Location>,
) -> ScopeGuard {
    ScopeGuard
}

#[inline(always)]
pub fn enter_block(_label: impl Into<Cow<'static, str>>) -> ScopeGuard {
    ScopeGuard
}

#[inline(always)]
pub fn enter_section(_label: impl Into<Cow<'static, str>>) -> ScopeGuard {
    ScopeGuard
}

#[inline(always)]
pub fn enter_value(_label: impl Into<Cow<'static, str>>) -> ScopeGuard {
    ScopeGuard
}

#[inline(always)]
pub fn attach_value(_name: impl Into<Cow<'static, str>>, _value: impl Into<String>) {}

#[inline(always)]
pub fn depth() -> usize {
    0
}

#[inline(always)]
pub fn write_trace<W: fmt::Write>(_out: &mut W) -> fmt::Result {
    Ok(())
}

#[inline(always)]
pub fn get_trace_string() -> String {
    String::new()
}

#[inline(always)]
pub fn get_performance_report_for_last_interval() -> String {
    String::new()
}

#[inline(always)]
pub fn get_performance_report_since_launch() -> String {
    String::new()
}

#[inline(always)]
pub fn snapshot(_window: Window) -> Vec<CallTreeNode> {
    Vec::new()
}

#[inline(always)]
pub fn flush() -> Result<Option<PathBuf>, FlushError> {
    Ok(None)
}

#[inline(always)]
pub fn flush_to(_dir: &Path) -> Result<Option<PathBuf>, FlushError> {
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_zero_sized() {
        assert_eq!(std::mem::size_of::<ScopeGuard>(), 0);
    }

    #[test]
    fn everything_is_empty() {
        let _g = enter_function("f", None);
        attach_value("k", "v");
        assert_eq!(depth(), 0);
        assert_eq!(get_trace_string(), "");
        assert_eq!(get_performance_report_since_launch(), "");
        assert!(flush().unwrap().is_none());
    }
}
