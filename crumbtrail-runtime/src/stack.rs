//! Shadow call stack with exit memory.
//!
//! The stack mirrors the live scopes of one thread as a single path. Every
//! node, and the virtual root below the outermost node, carries an exit-memory
//! slot: a copy of the descriptor of the last child that was pushed and then
//! popped normally while that node was on top. When execution leaves the
//! instrumented code and crashes, that slot is the last known-good location.
//!
//! A section on top of the stack is force-exited when another section is
//! entered. The superseded section's values and exit memory are dropped and
//! it is not remembered by its parent. Its handle becomes stale and exiting it
//! later is a no-op, which is how the superseded section's guard releases.

use std::borrow::Cow;
use std::time::Duration;

use crate::error::ScopeError;
use crate::forest::ForestId;
use crate::frame::{FrameDescriptor, ScopeKind};

/// Proof of an `enter_scope`. Pass it back to the matching exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a scope handle must be passed to exit_scope"]
pub struct ScopeHandle {
    id: u64,
}

impl ScopeHandle {
    pub fn id(self) -> u64 {
        self.id
    }
}

pub(crate) struct StackNode {
    pub(crate) id: u64,
    pub(crate) descriptor: FrameDescriptor,
    pub(crate) entered_at: Duration,
    /// Start of the time not yet charged to the current interval.
    pub(crate) charged_from: Duration,
    pub(crate) values: Vec<(Cow<'static, str>, String)>,
    pub(crate) forest: Option<ForestId>,
    pub(crate) last_exited: Option<FrameDescriptor>,
}

/// What the engine needs from a node that just left the stack.
pub(crate) struct Exited {
    pub(crate) entered_at: Duration,
    pub(crate) charged_from: Duration,
    pub(crate) forest: Option<ForestId>,
}

#[derive(Default)]
pub struct ShadowStack {
    nodes: Vec<StackNode>,
    root_last_exited: Option<FrameDescriptor>,
    superseded: Vec<u64>,
    next_id: u64,
}

impl ShadowStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live scopes.
    pub fn depth(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn nodes(&self) -> &[StackNode] {
        &self.nodes
    }

    pub(crate) fn root_last_exited(&self) -> Option<&FrameDescriptor> {
        self.root_last_exited.as_ref()
    }

    /// Call-forest node of the innermost timed live scope.
    pub(crate) fn nearest_forest(&self) -> Option<ForestId> {
        self.nodes.iter().rev().find_map(|n| n.forest)
    }

    pub(crate) fn top_is_section(&self) -> bool {
        self.nodes
            .last()
            .map_or(false, |n| n.descriptor.kind == ScopeKind::Section)
    }

    /// Cut the top node's lifetime short without recording it in the
    /// parent's exit memory.
    pub(crate) fn supersede_top(&mut self) -> Option<Exited> {
        let node = self.nodes.pop()?;
        self.superseded.push(node.id);
        Some(Exited {
            entered_at: node.entered_at,
            charged_from: node.charged_from,
            forest: node.forest,
        })
    }

    pub(crate) fn push(
        &mut self,
        descriptor: FrameDescriptor,
        entered_at: Duration,
        forest: Option<ForestId>,
    ) -> ScopeHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.push(StackNode {
            id,
            descriptor,
            entered_at,
            charged_from: entered_at,
            values: Vec::new(),
            forest,
            last_exited: None,
        });
        ScopeHandle { id }
    }

    /// Pop the node behind `handle`, which must be the top.
    ///
    /// Returns `Ok(None)` for the stale handle of a superseded section.
    pub(crate) fn pop(&mut self, handle: ScopeHandle) -> Result<Option<Exited>, ScopeError> {
        if let Some(pos) = self.superseded.iter().rposition(|&id| id == handle.id) {
            self.superseded.swap_remove(pos);
            return Ok(None);
        }
        let top_id = match self.nodes.last() {
            Some(top) => top.id,
            None => return Err(ScopeError::EmptyStack(handle.id)),
        };
        if top_id != handle.id {
            return Err(ScopeError::NotTop {
                expected: top_id,
                found: handle.id,
            });
        }
        let Some(node) = self.nodes.pop() else {
            return Err(ScopeError::EmptyStack(handle.id));
        };
        let slot = match self.nodes.last_mut() {
            Some(parent) => &mut parent.last_exited,
            None => &mut self.root_last_exited,
        };
        *slot = Some(node.descriptor);
        Ok(Some(Exited {
            entered_at: node.entered_at,
            charged_from: node.charged_from,
            forest: node.forest,
        }))
    }

    /// Time every live timed node has run since it was last charged, up to
    /// `now`. The nodes count as charged up to `now` afterwards.
    pub(crate) fn take_open_time(&mut self, now: Duration) -> Vec<(ForestId, Duration)> {
        self.nodes
            .iter_mut()
            .filter_map(|node| {
                let id = node.forest?;
                let open = now.saturating_sub(node.charged_from);
                node.charged_from = now;
                Some((id, open))
            })
            .collect()
    }

    /// Attach a value to the top node. No-op on an empty stack.
    pub fn attach(&mut self, name: impl Into<Cow<'static, str>>, value: String) {
        if let Some(top) = self.nodes.last_mut() {
            top.values.push((name.into(), value));
        }
    }
}
