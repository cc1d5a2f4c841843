//! Shadow call stack, exit memory and call-tree timing for instrumented code.
//!
//! Instrumented scopes push themselves onto a per-thread shadow stack and pop
//! on drop. From that stack the runtime can always say where the thread is, or
//! which instrumented scope it left last, without symbols or unwinding:
//!
//! ```
//! fn load() {
//!     crumbtrail_runtime::scope_fn!("load");
//!     crumbtrail_runtime::scope_value!("path", "config.toml");
//!     {
//!         crumbtrail_runtime::scope_block!("parse");
//!     }
//!     // A crash handler running here would print:
//!     //   while INSIDE the scope of: function load (src/loader.rs:2)
//!     //       path = config.toml
//!     //   after EXITING the scope of: block "parse"
//!     let _ = crumbtrail_runtime::get_trace_string();
//! }
//! # load();
//! ```
//!
//! The same events feed a call forest of per-path timings, reported since
//! launch or over the last completed interval.
//!
//! The `trace` feature is the master switch: without it the collector API and
//! the macros compile to nothing. The `perf` feature controls timing.

mod clock;
mod config;
mod engine;
mod error;
mod forest;
mod frame;
mod report;
mod run_file;
mod stack;
mod trace;

#[cfg(feature = "trace")]
mod collector;
#[cfg(not(feature = "trace"))]
mod disabled;
#[cfg(not(feature = "trace"))]
use disabled as collector;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use collector::{
    attach_value, depth, enter, enter_block, enter_function, enter_section, enter_value, flush,
    flush_to, get_performance_report_for_last_interval, get_performance_report_since_launch,
    get_trace_string, init, reset, snapshot, write_trace, ScopeGuard,
};
pub use config::{Config, DEFAULT_INTERVAL};
pub use engine::Engine;
pub use error::{FlushError, ScopeError};
pub use forest::{CallForest, CallTreeNode, ForestId, Window};
pub use frame::{FrameDescriptor, Location, ScopeKind};
pub use report::{render_report, write_report};
pub use run_file::{runs_dir, RunFile, RUNS_DIR_ENV};
pub use stack::{ScopeHandle, ShadowStack};
pub use trace::{trace_string, write_trace as write_stack_trace};

/// Whether the collector is compiled in.
pub const ENABLED: bool = cfg!(feature = "trace");

#[doc(hidden)]
pub fn __short_function_name(raw: &'static str) -> &'static str {
    let mut name = raw.strip_suffix("::__f").unwrap_or(raw);
    while let Some(outer) = name.strip_suffix("::{{closure}}") {
        name = outer;
    }
    match name.rfind("::") {
        Some(pos) => &name[pos + 2..],
        None => name,
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn __f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::__short_function_name(type_name_of(__f))
    }};
}

/// Enter a function scope for the rest of the enclosing block.
///
/// Without arguments the name is taken from the enclosing function.
#[macro_export]
macro_rules! scope_fn {
    () => {
        let _crumbtrail_scope = $crate::enter_function(
            $crate::__function_name!(),
            ::std::option::Option::Some($crate::Location::new(file!(), line!())),
        );
    };
    ($name:expr) => {
        let _crumbtrail_scope = $crate::enter_function(
            $name,
            ::std::option::Option::Some($crate::Location::new(file!(), line!())),
        );
    };
}

/// Enter a block scope for the rest of the enclosing block.
#[macro_export]
macro_rules! scope_block {
    ($label:expr) => {
        let _crumbtrail_scope = $crate::enter_block($label);
    };
}

/// Enter a section. A later section in the same block replaces this one.
#[macro_export]
macro_rules! scope_section {
    ($label:expr) => {
        let _crumbtrail_scope = $crate::enter_section($label);
    };
}

/// Attach a `Display` value to the innermost scope. Not evaluated when the
/// collector is compiled out.
#[macro_export]
macro_rules! scope_value {
    ($name:expr, $value:expr) => {
        if $crate::ENABLED {
            $crate::attach_value($name, ::std::format!("{}", $value));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_function_name_strips_path_and_closures() {
        assert_eq!(__short_function_name("app::server::handle::__f"), "handle");
        assert_eq!(
            __short_function_name("app::main::{{closure}}::{{closure}}::__f"),
            "main"
        );
        assert_eq!(__short_function_name("main::__f"), "main");
    }

    #[test]
    fn function_name_macro_names_the_caller() {
        fn outer_name() -> &'static str {
            crate::__function_name!()
        }
        assert_eq!(outer_name(), "outer_name");
    }
}
