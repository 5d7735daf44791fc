//! End-to-end decision scenarios: depth map and marker in, command out.

mod common;

use common::{at, marker, navigator, wall, wall_with_obstacle};
use sarathi_core::sectors::{self, position};
use sarathi_core::{
    CameraIntrinsics, Command, CommandDispatcher, MockLink, NavigationMode, OperatorOverride,
};
use std::time::Instant;

// ============================================================================
// Sector classification
// ============================================================================

#[test]
fn test_open_space_is_all_clear_and_forward() {
    let t0 = Instant::now();
    let status = sectors::classify(
        Some(&wall(3.0)),
        CameraIntrinsics::default(),
        0.0,
        1.0,
        5,
    );
    assert!(sectors::is_all_clear(&status));

    let mut nav = navigator(t0);
    let report = nav.cycle(Some(&wall(3.0)), None, None, t0);
    assert!(report.all_clear);
    assert_eq!(report.avoidance_command, Command::Forward);
}

#[test]
fn test_absent_or_empty_depth_is_all_clear() {
    let t0 = Instant::now();
    let mut nav = navigator(t0);
    assert!(nav.cycle(None, None, None, t0).all_clear);
    assert!(nav.cycle(Some(&wall(0.0)), None, None, t0).all_clear);
}

#[test]
fn test_every_valid_point_lands_in_one_sector() {
    let t0 = Instant::now();
    let nav = navigator(t0);
    let depth = wall_with_obstacle(2.5, 0.4, 200, 260);
    let scan = nav.classifier().scan(Some(&depth));
    assert_eq!(scan.total_points(), depth.valid_count());
}

#[test]
fn test_obstacle_left_of_axis_obstructs_left_front() {
    let t0 = Instant::now();
    let nav = navigator(t0);
    let status = nav
        .classifier()
        .classify(Some(&wall_with_obstacle(3.0, 0.6, 0, 100)));
    assert!(status.is_obstructed(position::LEFT_FRONT));
    assert_eq!(status.obstructed_count(), 1);
}

// ============================================================================
// Avoidance timing
// ============================================================================

#[test]
fn test_left_front_obstacle_turns_right_after_debounce() {
    let t0 = Instant::now();
    let mut nav = navigator(t0);
    let depth = wall_with_obstacle(3.0, 0.6, 0, 100);

    let report = nav.cycle(Some(&depth), None, None, t0);
    assert_eq!(report.avoidance_command, Command::Forward);
    assert_eq!(report.decision.mode, NavigationMode::AvoidanceActive);

    let report = nav.cycle(Some(&depth), None, None, at(t0, 0.5));
    assert_eq!(report.avoidance_command, Command::Right);
    assert_eq!(report.decision.command, Command::Right);
}

#[test]
fn test_turn_ends_after_turn_duration() {
    let t0 = Instant::now();
    let mut nav = navigator(t0);
    let depth = wall(0.5);
    let mut step = |secs: f32| {
        nav.cycle(Some(&depth), None, None, at(t0, secs))
            .avoidance_command
    };

    assert_eq!(step(0.4), Command::Right);
    assert_eq!(step(0.5), Command::Right);
    assert_eq!(step(0.65), Command::Forward);
}

// ============================================================================
// Arbitration
// ============================================================================

#[test]
fn test_tracking_only_without_marker_searches() {
    let t0 = Instant::now();
    let mut nav = navigator(t0);
    let report = nav.cycle(
        Some(&wall(3.0)),
        None,
        Some(OperatorOverride::TrackingOnly),
        t0,
    );
    assert_eq!(report.decision.command, Command::Stop);
    assert_eq!(report.decision.mode, NavigationMode::Search);
}

#[test]
fn test_close_marker_in_left_zone_is_reached() {
    let t0 = Instant::now();
    let mut nav = navigator(t0);
    let target = marker(100, Some(0.3));
    let report = nav.cycle(Some(&wall(3.0)), Some(&target), None, t0);
    assert_eq!(report.tracking_command, Some(Command::Right));
    assert_eq!(report.decision.command, Command::Stop);
    assert_eq!(report.decision.mode, NavigationMode::MarkerReached);
}

#[test]
fn test_obstacle_overrides_marker_at_any_distance() {
    let t0 = Instant::now();
    let mut nav = navigator(t0);
    let target = marker(320, Some(0.05));
    let report = nav.cycle(
        Some(&wall_with_obstacle(3.0, 0.6, 0, 100)),
        Some(&target),
        None,
        t0,
    );
    assert_eq!(report.decision.mode, NavigationMode::AvoidanceActive);
    assert_eq!(report.decision.command, report.avoidance_command);
}

#[test]
fn test_far_marker_is_tracked() {
    let t0 = Instant::now();
    let mut nav = navigator(t0);
    let target = marker(600, Some(2.0));
    let report = nav.cycle(Some(&wall(3.0)), Some(&target), None, t0);
    assert_eq!(report.decision.command, Command::Left);
    assert_eq!(report.decision.mode, NavigationMode::MarkerTracking);
}

// ============================================================================
// Full loop with dispatch
// ============================================================================

#[test]
fn test_loop_transmits_only_changes() {
    let t0 = Instant::now();
    let mut nav = navigator(t0);
    let mut dispatcher = CommandDispatcher::new(MockLink::new());
    let target = marker(320, Some(2.0));

    // Approach: forward while tracking, then stop when reached
    for (secs, distance) in [(0.0, 2.0), (0.1, 1.5), (0.2, 1.0), (0.3, 0.4), (0.4, 0.3)] {
        let target = target.with_distance(Some(distance));
        let report = nav.cycle(Some(&wall(3.0)), Some(&target), None, at(t0, secs));
        dispatcher.dispatch(report.decision.command);
    }

    dispatcher.shutdown();
    assert_eq!(
        dispatcher.link().sent_lines(),
        vec!["FORWARD", "STOP", "STOP", "STOP"]
    );
}
