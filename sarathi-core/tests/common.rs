//! Test utilities for the decision core.
//!
//! Builds VGA depth maps with the structured-light intrinsics and a 90° view
//! yaw, which centres the optical axis in the Center sector.

#![allow(dead_code)]

use sarathi_core::{
    AvoidanceConfig, CameraIntrinsics, DepthMap, MarkerObservation, Navigator, SectorConfig,
    TrackingConfig, ZoneBoundaries,
};
use std::time::{Duration, Instant};

pub const WIDTH: usize = 640;
pub const HEIGHT: usize = 480;

/// Sector layout with the optical axis in the Center sector.
pub fn axis_centred_sectors() -> SectorConfig {
    SectorConfig {
        view_yaw_deg: 90.0,
        ..Default::default()
    }
}

pub fn navigator(now: Instant) -> Navigator {
    Navigator::new(
        CameraIntrinsics::default(),
        &axis_centred_sectors(),
        &AvoidanceConfig::default(),
        &TrackingConfig::default(),
        now,
    )
}

/// Uniform wall at `distance` meters.
pub fn wall(distance: f32) -> DepthMap {
    DepthMap::filled(WIDTH, HEIGHT, distance)
}

/// Far wall with a near obstacle covering columns `[col_start, col_end)`.
pub fn wall_with_obstacle(far: f32, near: f32, col_start: usize, col_end: usize) -> DepthMap {
    let mut depth = wall(far);
    for row in 0..HEIGHT {
        for col in col_start..col_end {
            depth.set(col, row, near);
        }
    }
    depth
}

pub fn marker(pixel_x: usize, distance: Option<f32>) -> MarkerObservation {
    let bounds = ZoneBoundaries::from_config(WIDTH, &TrackingConfig::default());
    MarkerObservation::new(42, pixel_x, HEIGHT / 2, &bounds).with_distance(distance)
}

pub fn at(t0: Instant, secs: f32) -> Instant {
    t0 + Duration::from_secs_f32(secs)
}
