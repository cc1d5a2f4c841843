//! `init` configures every thread's engine. Kept in its own test binary since
//! the configuration is installed once per process.
#![cfg(feature = "trace")]

use std::sync::mpsc;
use std::time::Duration;

use crumbtrail_runtime::{
    depth, enter_function, get_performance_report_since_launch, get_trace_string, init,
    scope_fn, Config, ScopeError,
};

fn worker() -> String {
    scope_fn!("worker");
    let mut sum = 0u64;
    for i in 0..50_000u64 {
        sum = sum.wrapping_add(i * i);
    }
    std::hint::black_box(sum);
    get_trace_string()
}

struct InitOnTeardown(mpsc::Sender<Result<(), ScopeError>>);

impl Drop for InitOnTeardown {
    fn drop(&mut self) {
        let _ = self.0.send(init(Config::default()));
    }
}

thread_local! {
    static TEARDOWN: std::cell::RefCell<Option<InitOnTeardown>> =
        const { std::cell::RefCell::new(None) };
}

#[test]
fn init_applies_to_threads_spawned_later() {
    init(
        Config::default()
            .with_performance_counting(false)
            .with_interval(Duration::from_millis(50)),
    )
    .unwrap();
    assert_eq!(init(Config::default()), Err(ScopeError::AlreadyConfigured));

    let (trace, report) = std::thread::spawn(|| {
        let trace = worker();
        (trace, get_performance_report_since_launch())
    })
    .join()
    .unwrap();
    assert!(
        trace.starts_with("while INSIDE the scope of: function worker ("),
        "{trace}"
    );
    assert_eq!(report, "", "profiling was switched off for the whole process");

    // Called while thread-local storage is being torn down: an error, not a panic.
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let guard = enter_function("short-lived", None);
        assert_eq!(depth(), 1);
        drop(guard);
        TEARDOWN.with(|slot| *slot.borrow_mut() = Some(InitOnTeardown(tx)));
    })
    .join()
    .unwrap();
    assert_eq!(rx.recv().unwrap(), Err(ScopeError::AlreadyConfigured));
}
