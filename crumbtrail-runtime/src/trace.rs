//! Trace rendering from the shadow stack and exit memory.
//!
//! Output, outermost first:
//!
//! ```text
//! function main (src/main.rs:3)
//!     request = 42
//! while INSIDE the scope of: function handle (src/server.rs:17)
//! after EXITING the scope of: block "decode"
//! ```
//!
//! Rendering only reads structures that already exist and writes through a
//! caller-supplied `fmt::Write`, so a crash handler can render into a buffer
//! it reserved up front.

use std::fmt::{self, Write};

use crate::frame::FrameDescriptor;
use crate::stack::ShadowStack;

const INSIDE: &str = "while INSIDE the scope of: ";
const EXITED: &str = "after EXITING the scope of: ";
const VALUE_INDENT: &str = "    ";

pub fn write_trace<W: Write>(stack: &ShadowStack, out: &mut W) -> fmt::Result {
    let nodes = stack.nodes();
    let mut first = true;
    let mut line = |out: &mut W| -> fmt::Result {
        if !first {
            out.write_char('\n')?;
        }
        first = false;
        Ok(())
    };

    for (depth, node) in nodes.iter().enumerate() {
        line(out)?;
        if depth + 1 == nodes.len() {
            out.write_str(INSIDE)?;
        }
        write!(out, "{}", node.descriptor)?;
        for (name, value) in &node.values {
            line(out)?;
            write!(out, "{VALUE_INDENT}{name} = {value}")?;
        }
    }

    let remembered: Option<&FrameDescriptor> = match nodes.last() {
        Some(innermost) => innermost.last_exited.as_ref(),
        None => stack.root_last_exited(),
    };
    if let Some(exited) = remembered {
        line(out)?;
        write!(out, "{EXITED}{exited}")?;
    }
    Ok(())
}

pub fn trace_string(stack: &ShadowStack) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_trace(stack, &mut out);
    out
}
