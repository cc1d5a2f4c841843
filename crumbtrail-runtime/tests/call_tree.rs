//! Call-tree reports over a simulated frame loop.

use std::time::Duration;

use crumbtrail_runtime::{
    CallTreeNode, Config, Engine, FrameDescriptor, Location, ManualClock, Window,
};

fn frame_loop(engine: &mut Engine<ManualClock>, clock: &ManualClock, frames: u64) {
    let main = FrameDescriptor::function("main", Some(Location::new("src/main.rs", 1)));
    let update = FrameDescriptor::function("update", Some(Location::new("src/game.rs", 10)));
    let physics = FrameDescriptor::function("physics", Some(Location::new("src/physics.rs", 4)));
    let render = FrameDescriptor::function("render", Some(Location::new("src/render.rs", 8)));

    let m = engine.enter_scope(main);
    for _ in 0..frames {
        let u = engine.enter_scope(update.clone());
        clock.advance_ms(1);
        let p = engine.enter_scope(physics.clone());
        clock.advance_ms(3);
        engine.exit_scope(p).unwrap();
        engine.exit_scope(u).unwrap();

        let r = engine.enter_scope(render.clone());
        // physics is also called from render, on a different path
        let p = engine.enter_scope(physics.clone());
        clock.advance_ms(1);
        engine.exit_scope(p).unwrap();
        clock.advance_ms(5);
        engine.exit_scope(r).unwrap();
    }
    engine.exit_scope(m).unwrap();
}

fn find<'a>(nodes: &'a [CallTreeNode], label: &str) -> &'a CallTreeNode {
    nodes
        .iter()
        .find(|n| n.frame.label == label)
        .unwrap_or_else(|| panic!("{label} not found"))
}

fn engine() -> (Engine<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let config = Config::default()
        .with_performance_counting(true)
        .with_interval(Duration::from_millis(100));
    (Engine::with_clock(config, clock.clone()), clock)
}

#[test]
fn since_launch_report_for_frame_loop() {
    let (mut engine, clock) = engine();
    frame_loop(&mut engine, &clock, 4);

    assert_eq!(
        engine.report_since_launch(),
        "Call Tree #1:\n\
         100% 40.0 ms function main (src/main.rs:1)\n  \
         60% 24.0 ms function render (src/render.rs:8)\n    \
         17% 4.0 ms function physics (src/physics.rs:4)\n  \
         40% 16.0 ms function update (src/game.rs:10)\n    \
         75% 12.0 ms function physics (src/physics.rs:4)"
    );
}

#[test]
fn physics_has_one_node_per_calling_path() {
    let (mut engine, clock) = engine();
    frame_loop(&mut engine, &clock, 3);

    let trees = engine.snapshot(Window::SinceLaunch);
    let main = find(&trees, "main");
    let under_update = find(&find(&main.children, "update").children, "physics");
    let under_render = find(&find(&main.children, "render").children, "physics");
    assert_eq!(under_update.calls, 3);
    assert_eq!(under_render.calls, 3);
    assert!((under_update.time_ms - 9.0).abs() < 1e-9);
    assert!((under_render.time_ms - 3.0).abs() < 1e-9);
}

#[test]
fn last_interval_only_covers_the_completed_window() {
    let (mut engine, clock) = engine();
    // 10 ms per frame, 100 ms window: ten frames fill it exactly.
    frame_loop(&mut engine, &clock, 10);
    let first = engine.report_for_last_interval();
    assert!(first.contains("100.0 ms function main"), "{first}");

    frame_loop(&mut engine, &clock, 2);
    assert_eq!(engine.report_for_last_interval(), first, "same window, same report");

    clock.advance_ms(80);
    let second = engine.report_for_last_interval();
    assert!(second.contains("20.0 ms function main"), "{second}");
    assert!(engine.report_since_launch().contains("120.0 ms function main"));
}

#[test]
fn root_is_always_one_hundred_percent() {
    for frames in [1, 3, 17] {
        let (mut engine, clock) = engine();
        frame_loop(&mut engine, &clock, frames);
        let report = engine.report_since_launch();
        let root_line = report.lines().nth(1).unwrap();
        assert!(root_line.starts_with("100% "), "{report}");
    }
}
