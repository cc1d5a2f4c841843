//! Call-tree performance report.
//!
//! ```text
//! Call Tree #1:
//! 100% 123.4 ms function main (src/main.rs:10)
//!   80% 98.7 ms block "for loop"
//!     50% 49.4 ms function parse (src/parse.rs:3)
//! ```
//!
//! Roots are ordered by total time, children by time within their parent.
//! Equal times keep discovery order. A node's percentage is relative to its
//! parent; every root is 100%.

use std::cmp::Ordering;
use std::fmt::{self, Write};

use crate::forest::CallTreeNode;

const INDENT: &str = "  ";

fn by_time_desc(a: &&CallTreeNode, b: &&CallTreeNode) -> Ordering {
    b.time_ms.partial_cmp(&a.time_ms).unwrap_or(Ordering::Equal)
}

fn executed(trees: &[CallTreeNode]) -> Vec<&CallTreeNode> {
    let mut nodes: Vec<&CallTreeNode> = trees.iter().filter(|n| n.time_ms > 0.0).collect();
    nodes.sort_by(by_time_desc);
    nodes
}

pub fn write_report<W: Write>(trees: &[CallTreeNode], out: &mut W) -> fmt::Result {
    for (i, root) in executed(trees).into_iter().enumerate() {
        if i > 0 {
            out.write_str("\n\n")?;
        }
        write!(out, "Call Tree #{}:", i + 1)?;
        write_node(root, 100.0, 0, out)?;
    }
    Ok(())
}

fn write_node<W: Write>(node: &CallTreeNode, pct: f64, depth: usize, out: &mut W) -> fmt::Result {
    out.write_char('\n')?;
    for _ in 0..depth {
        out.write_str(INDENT)?;
    }
    write!(out, "{pct:.0}% {:.1} ms {}", node.time_ms, node.frame)?;
    for child in executed(&node.children) {
        let child_pct = child.time_ms / node.time_ms * 100.0;
        write_node(child, child_pct, depth + 1, out)?;
    }
    Ok(())
}

pub fn render_report(trees: &[CallTreeNode]) -> String {
    let mut out = String::new();
    let _ = write_report(trees, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameDescriptor, Location};

    fn node(frame: FrameDescriptor, time_ms: f64, children: Vec<CallTreeNode>) -> CallTreeNode {
        CallTreeNode {
            frame,
            calls: 1,
            time_ms,
            children,
        }
    }

    #[test]
    fn empty_forest_renders_nothing() {
        assert_eq!(render_report(&[]), "");
    }

    #[test]
    fn percentages_are_relative_to_parent() {
        let tree = node(
            FrameDescriptor::function("main", Some(Location::new("src/main.rs", 10))),
            200.0,
            vec![node(
                FrameDescriptor::block("for loop"),
                150.0,
                vec![node(FrameDescriptor::function("parse", None), 75.0, vec![])],
            )],
        );
        assert_eq!(
            render_report(&[tree]),
            "Call Tree #1:\n\
             100% 200.0 ms function main (src/main.rs:10)\n  \
             75% 150.0 ms block \"for loop\"\n    \
             50% 75.0 ms function parse"
        );
    }

    #[test]
    fn children_sorted_by_time_with_stable_ties() {
        let tree = node(
            FrameDescriptor::function("root", None),
            10.0,
            vec![
                node(FrameDescriptor::block("small"), 1.0, vec![]),
                node(FrameDescriptor::block("tie_a"), 4.0, vec![]),
                node(FrameDescriptor::block("tie_b"), 4.0, vec![]),
            ],
        );
        let report = render_report(&[tree]);
        let a = report.find("tie_a").unwrap();
        let b = report.find("tie_b").unwrap();
        let small = report.find("small").unwrap();
        assert!(a < b && b < small, "unexpected order:\n{report}");
    }

    #[test]
    fn roots_numbered_by_total_time() {
        let trees = vec![
            node(FrameDescriptor::function("light", None), 1.0, vec![]),
            node(FrameDescriptor::function("heavy", None), 9.0, vec![]),
        ];
        let report = render_report(&trees);
        assert!(report.starts_with("Call Tree #1:\n100% 9.0 ms function heavy"));
        assert!(report.contains("\n\nCall Tree #2:\n100% 1.0 ms function light"));
    }

    #[test]
    fn idle_nodes_are_omitted() {
        let trees = vec![
            node(
                FrameDescriptor::function("f", None),
                3.0,
                vec![node(FrameDescriptor::block("idle"), 0.0, vec![])],
            ),
            node(FrameDescriptor::function("never", None), 0.0, vec![]),
        ];
        let report = render_report(&trees);
        assert!(!report.contains("idle"));
        assert!(!report.contains("never"));
        assert!(!report.contains("#2"));
    }

    #[test]
    fn percentages_round_to_integers() {
        let tree = node(
            FrameDescriptor::function("f", None),
            3.0,
            vec![node(FrameDescriptor::block("third"), 1.0, vec![])],
        );
        assert!(render_report(&[tree]).contains("\n  33% 1.0 ms block \"third\""));
    }
}
