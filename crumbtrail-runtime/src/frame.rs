//! Frame identity: what kind of scope was entered, and what it is called.
//!
//! A `FrameDescriptor` is immutable once built. It doubles as the key of a
//! call-forest edge, so equality and hashing cover kind, label and location.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of an instrumented scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Function,
    Block,
    /// Supersedes any sibling section at the same nesting point.
    Section,
    /// Shown in traces, never timed.
    Value,
}

impl ScopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeKind::Function => "function",
            ScopeKind::Block => "block",
            ScopeKind::Section => "section",
            ScopeKind::Value => "value",
        }
    }

    /// Whether scopes of this kind get a call-forest node.
    pub fn is_timed(self) -> bool {
        !matches!(self, ScopeKind::Value)
    }
}

/// Source position of a function scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: Cow<'static, str>,
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<Cow<'static, str>>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameDescriptor {
    pub kind: ScopeKind,
    pub label: Cow<'static, str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl FrameDescriptor {
    pub fn new(
        kind: ScopeKind,
        label: impl Into<Cow<'static, str>>,
        location: Option<Location>,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            location,
        }
    }

    pub fn function(name: impl Into<Cow<'static, str>>, location: Option<Location>) -> Self {
        Self::new(ScopeKind::Function, name, location)
    }

    pub fn block(label: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ScopeKind::Block, label, None)
    }

    pub fn section(label: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ScopeKind::Section, label, None)
    }

    pub fn value(label: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ScopeKind::Value, label, None)
    }
}

/// Renders `function name (file:line)` for functions and `block "label"` for
/// everything else. Used verbatim by both the trace and the report.
impl fmt::Display for FrameDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ScopeKind::Function => {
                write!(f, "function {}", self.label)?;
                if let Some(loc) = &self.location {
                    write!(f, " ({loc})")?;
                }
                Ok(())
            }
            kind => write!(f, "{} \"{}\"", kind.as_str(), self.label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn function_renders_location() {
        let f = FrameDescriptor::function("parse", Some(Location::new("src/parse.rs", 42)));
        assert_eq!(f.to_string(), "function parse (src/parse.rs:42)");
        let bare = FrameDescriptor::function("parse", None);
        assert_eq!(bare.to_string(), "function parse");
    }

    #[test]
    fn non_function_kinds_quote_their_label() {
        assert_eq!(FrameDescriptor::block("for loop").to_string(), "block \"for loop\"");
        assert_eq!(FrameDescriptor::section("load").to_string(), "section \"load\"");
        assert_eq!(FrameDescriptor::value("id").to_string(), "value \"id\"");
    }

    #[test]
    fn identity_includes_location() {
        let a = FrameDescriptor::function("g", Some(Location::new("a.rs", 1)));
        let b = FrameDescriptor::function("g", Some(Location::new("a.rs", 2)));
        let mut set = HashSet::new();
        set.insert(a.clone());
        set.insert(b);
        set.insert(a);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn only_value_frames_are_untimed() {
        assert!(ScopeKind::Function.is_timed());
        assert!(ScopeKind::Block.is_timed());
        assert!(ScopeKind::Section.is_timed());
        assert!(!ScopeKind::Value.is_timed());
    }
}
