//! A small instrumented workload, handy for seeing what a trace and a report
//! look like without wiring the runtime into a program first.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crumbtrail_runtime::{
    flush_to, get_performance_report_for_last_interval, get_performance_report_since_launch,
    get_trace_string, init, reset, scope_block, scope_fn, scope_section, scope_value, Config,
    ScopeError,
};

use crate::error::Error;

#[derive(Debug, Clone)]
pub struct DemoOutput {
    /// Trace taken from inside the deepest scope of the last iteration.
    pub trace: String,
    pub last_interval: String,
    pub since_launch: String,
    pub run_file: Option<PathBuf>,
}

/// Run the workload `iterations` times on this thread's engine.
///
/// The engine is reset first, so anything recorded earlier on this thread is lost.
/// `interval` only applies when nothing in the process has configured the
/// runtime yet.
pub fn run(
    iterations: u32,
    interval: Duration,
    flush_dir: Option<&Path>,
) -> Result<DemoOutput, Error> {
    reset();
    let config = Config::from_env()
        .with_interval(interval)
        .with_performance_counting(true);
    match init(config) {
        Ok(()) => {}
        Err(e @ (ScopeError::AlreadyConfigured | ScopeError::AlreadyStarted)) => {
            log::debug!("demo keeps the process configuration: {e}");
        }
        Err(e) => return Err(e.into()),
    }

    let mut trace = String::new();
    {
        scope_fn!("demo");
        scope_value!("iterations", iterations);
        for i in 0..iterations {
            scope_block!("iteration");
            scope_value!("i", i);
            let records = load(i);
            if let Some(t) = checksum_all(&records, i + 1 == iterations) {
                trace = t;
            }
        }
    }
    log::debug!("demo finished {iterations} iteration(s)");

    let run_file = match flush_dir {
        Some(dir) => flush_to(dir)?,
        None => None,
    };
    Ok(DemoOutput {
        trace,
        last_interval: get_performance_report_for_last_interval(),
        since_launch: get_performance_report_since_launch(),
        run_file,
    })
}

fn load(seed: u32) -> Vec<String> {
    scope_fn!();
    scope_section!("generate");
    let raw: Vec<u64> = (0..64u64)
        .map(|n| n.wrapping_mul(2_654_435_761).wrapping_add(u64::from(seed)))
        .collect();
    scope_section!("format");
    raw.iter().map(|n| format!("{n:x}")).collect()
}

fn checksum_all(records: &[String], capture: bool) -> Option<String> {
    scope_fn!();
    scope_value!("records", records.len());
    let mut trace = None;
    let mut sum = 0u64;
    for (n, record) in records.iter().enumerate() {
        sum = sum.wrapping_add(checksum(record));
        if capture && n + 1 == records.len() {
            scope_value!("sum", sum);
            trace = Some(get_trace_string());
        }
    }
    trace
}

fn checksum(record: &str) -> u64 {
    scope_fn!();
    record
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325, |h, b| (h ^ u64::from(b)).wrapping_mul(0x100_0000_01b3))
}
