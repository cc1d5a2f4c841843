//! Call forest: path-keyed timing aggregates.
//!
//! Nodes live in an arena and are addressed by `ForestId`. A node is identified
//! by the chain of descriptors from its root, so the same function reached from
//! two different parents gets two nodes. Nodes are created on the first enter
//! along a new path and are never removed.
//!
//! Each node keeps three counter sets: the interval in progress, the last
//! completed interval, and the lifetime total. `roll_interval` moves the
//! current interval into the completed slot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::frame::FrameDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForestId(usize);

/// Which counters a snapshot or report reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    LastInterval,
    SinceLaunch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Counters {
    time_ms: f64,
    calls: u64,
}

impl Counters {
    fn add(&mut self, elapsed_ms: f64) {
        self.time_ms += elapsed_ms;
        self.calls += 1;
    }
}

struct ForestNode {
    descriptor: FrameDescriptor,
    children: HashMap<FrameDescriptor, ForestId>,
    /// Discovery order, the tie-break for equal times.
    child_order: Vec<ForestId>,
    current: Counters,
    last: Counters,
    lifetime: Counters,
}

impl ForestNode {
    fn new(descriptor: FrameDescriptor) -> Self {
        Self {
            descriptor,
            children: HashMap::new(),
            child_order: Vec::new(),
            current: Counters::default(),
            last: Counters::default(),
            lifetime: Counters::default(),
        }
    }

    fn counters(&self, window: Window) -> Counters {
        match window {
            Window::LastInterval => self.last,
            Window::SinceLaunch => self.lifetime,
        }
    }
}

/// Owned copy of one forest subtree for a single window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallTreeNode {
    #[serde(flatten)]
    pub frame: FrameDescriptor,
    pub calls: u64,
    pub time_ms: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CallTreeNode>,
}

#[derive(Default)]
pub struct CallForest {
    nodes: Vec<ForestNode>,
    roots: HashMap<FrameDescriptor, ForestId>,
    root_order: Vec<ForestId>,
}

impl CallForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find or create the child of `parent` (a root when `None`) for `descriptor`.
    pub fn resolve(&mut self, parent: Option<ForestId>, descriptor: &FrameDescriptor) -> ForestId {
        let existing = match parent {
            Some(p) => self.nodes[p.0].children.get(descriptor),
            None => self.roots.get(descriptor),
        };
        if let Some(&id) = existing {
            return id;
        }

        let id = ForestId(self.nodes.len());
        self.nodes.push(ForestNode::new(descriptor.clone()));
        match parent {
            Some(p) => {
                let node = &mut self.nodes[p.0];
                node.children.insert(descriptor.clone(), id);
                node.child_order.push(id);
            }
            None => {
                self.roots.insert(descriptor.clone(), id);
                self.root_order.push(id);
            }
        }
        id
    }

    /// Add one completed invocation to the current interval and the lifetime.
    pub fn record(&mut self, id: ForestId, elapsed_ms: f64) {
        self.record_split(id, elapsed_ms, elapsed_ms);
    }

    /// Like `record`, for an invocation that was partly charged to earlier
    /// intervals while it was still running. Only `in_window_ms` goes to the
    /// current interval.
    pub fn record_split(&mut self, id: ForestId, total_ms: f64, in_window_ms: f64) {
        let node = &mut self.nodes[id.0];
        node.current.add(in_window_ms);
        node.lifetime.add(total_ms);
    }

    /// Charge time of a still running invocation to the current interval.
    /// The call itself is counted when it completes.
    pub fn charge_open(&mut self, id: ForestId, elapsed_ms: f64) {
        self.nodes[id.0].current.time_ms += elapsed_ms;
    }

    /// Publish the current interval as the last completed one and start over.
    pub fn roll_interval(&mut self) {
        for node in &mut self.nodes {
            node.last = std::mem::take(&mut node.current);
        }
    }

    /// `(time_ms, calls)` of one node in a window.
    pub fn stats(&self, id: ForestId, window: Window) -> (f64, u64) {
        let c = self.nodes[id.0].counters(window);
        (c.time_ms, c.calls)
    }

    /// Time accumulated so far in the interval that has not rolled yet.
    pub fn pending_ms(&self, id: ForestId) -> f64 {
        self.nodes[id.0].current.time_ms
    }

    /// Copy every root with time in `window`, in discovery order.
    ///
    /// Subtrees that did not execute in the window are left out.
    pub fn snapshot(&self, window: Window) -> Vec<CallTreeNode> {
        self.root_order
            .iter()
            .filter_map(|&id| self.snapshot_node(id, window))
            .collect()
    }

    fn snapshot_node(&self, id: ForestId, window: Window) -> Option<CallTreeNode> {
        let node = &self.nodes[id.0];
        let counters = node.counters(window);
        if counters.time_ms <= 0.0 {
            return None;
        }
        Some(CallTreeNode {
            frame: node.descriptor.clone(),
            calls: counters.calls,
            time_ms: counters.time_ms,
            children: node
                .child_order
                .iter()
                .filter_map(|&child| self.snapshot_node(child, window))
                .collect(),
        })
    }
}
