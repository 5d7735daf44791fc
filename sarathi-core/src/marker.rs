//! Fiducial marker observations and the tracking mapper.
//!
//! Detection itself happens outside this crate. The core only consumes the
//! marker centre in pixels, derives its lateral zone, and maps the zone to a
//! steering command that turns the robot toward the marker.

use crate::command::Command;
use crate::config::TrackingConfig;
use crate::sectors::DepthMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lateral position of a marker in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    Left,
    Center,
    Right,
}

impl Zone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Center => "CENTER",
            Self::Right => "RIGHT",
        }
    }

    /// Steering command toward a marker in this zone.
    ///
    /// The mapping is mirrored: a marker in the LEFT zone yields RIGHT and a
    /// marker in the RIGHT zone yields LEFT.
    pub fn steering_command(&self) -> Command {
        match self {
            Self::Left => Command::Right,
            Self::Right => Command::Left,
            Self::Center => Command::Forward,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel columns separating the LEFT, CENTER and RIGHT zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneBoundaries {
    /// Columns strictly below this are LEFT
    pub left: usize,
    /// Columns strictly above this are RIGHT
    pub right: usize,
}

impl ZoneBoundaries {
    /// Boundaries at `floor(width * fraction)` for each side.
    pub fn from_frame(width: usize, left_fraction: f32, right_fraction: f32) -> Self {
        Self {
            left: (width as f32 * left_fraction).floor() as usize,
            right: (width as f32 * right_fraction).floor() as usize,
        }
    }

    pub fn from_config(width: usize, config: &TrackingConfig) -> Self {
        Self::from_frame(width, config.left_boundary, config.right_boundary)
    }

    pub fn zone_for(&self, x: usize) -> Zone {
        if x < self.left {
            Zone::Left
        } else if x > self.right {
            Zone::Right
        } else {
            Zone::Center
        }
    }
}

/// A detected marker for one cycle. Absence of a marker is `None` at the
/// call sites, so every value of this type is a detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerObservation {
    pub id: u32,
    pub pixel_x: usize,
    pub pixel_y: usize,
    pub zone: Zone,
    /// Range to the marker in meters, when depth was available
    pub distance: Option<f32>,
}

impl MarkerObservation {
    /// Observation at a pixel position, zone derived from `bounds`.
    pub fn new(id: u32, pixel_x: usize, pixel_y: usize, bounds: &ZoneBoundaries) -> Self {
        Self {
            id,
            pixel_x,
            pixel_y,
            zone: bounds.zone_for(pixel_x),
            distance: None,
        }
    }

    pub fn with_distance(mut self, distance: Option<f32>) -> Self {
        self.distance = distance;
        self
    }

    /// True when the range is known and strictly below `approach_distance`.
    pub fn is_within(&self, approach_distance: f32) -> bool {
        self.distance.is_some_and(|d| d < approach_distance)
    }
}

/// Map a zone to its steering command.
pub fn map_zone(zone: Zone) -> Command {
    zone.steering_command()
}

/// Tracking intent for this cycle, `None` when no marker was detected.
pub fn tracking_command(marker: Option<&MarkerObservation>) -> Option<Command> {
    marker.map(|m| m.zone.steering_command())
}

/// Median of the positive depths in a square window around `(x, y)`.
///
/// The window spans rows `[y - radius, y + radius)` and columns
/// `[x - radius, x + radius)`, clipped to the map. Returns `None` when the
/// centre lies outside the map or no sample in the window is valid. An even
/// number of samples yields the mean of the two middle values.
pub fn estimate_marker_distance(depth: &DepthMap, x: usize, y: usize, radius: usize) -> Option<f32> {
    if x >= depth.width() || y >= depth.height() {
        return None;
    }

    let rows = y.saturating_sub(radius)..y.saturating_add(radius).min(depth.height());
    let cols = x.saturating_sub(radius)..x.saturating_add(radius).min(depth.width());

    let mut samples: Vec<f32> = rows
        .flat_map(|row| cols.clone().filter_map(move |col| depth.get(col, row)))
        .filter(|&d| DepthMap::is_valid_depth(d))
        .collect();

    if samples.is_empty() {
        return None;
    }

    samples.sort_by(f32::total_cmp);
    let mid = samples.len() / 2;
    if samples.len() % 2 == 0 {
        Some((samples[mid - 1] + samples[mid]) / 2.0)
    } else {
        Some(samples[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zone_boundaries_vga() {
        let bounds = ZoneBoundaries::from_frame(640, 0.33, 0.67);
        assert_eq!(bounds.left, 211);
        assert_eq!(bounds.right, 428);

        assert_eq!(bounds.zone_for(0), Zone::Left);
        assert_eq!(bounds.zone_for(210), Zone::Left);
        assert_eq!(bounds.zone_for(211), Zone::Center);
        assert_eq!(bounds.zone_for(428), Zone::Center);
        assert_eq!(bounds.zone_for(429), Zone::Right);
    }

    #[test]
    fn test_zone_mapping_is_mirrored() {
        assert_eq!(map_zone(Zone::Left), Command::Right);
        assert_eq!(map_zone(Zone::Right), Command::Left);
        assert_eq!(map_zone(Zone::Center), Command::Forward);
    }

    #[test]
    fn test_tracking_command_requires_detection() {
        let bounds = ZoneBoundaries::from_frame(640, 0.33, 0.67);
        assert_eq!(tracking_command(None), None);

        let marker = MarkerObservation::new(7, 100, 240, &bounds);
        assert_eq!(marker.zone, Zone::Left);
        assert_eq!(tracking_command(Some(&marker)), Some(Command::Right));
    }

    #[test]
    fn test_is_within_needs_known_distance() {
        let bounds = ZoneBoundaries::from_frame(640, 0.33, 0.67);
        let marker = MarkerObservation::new(1, 320, 240, &bounds);
        assert!(!marker.is_within(0.5));
        assert!(marker.with_distance(Some(0.3)).is_within(0.5));
        assert!(!marker.with_distance(Some(0.5)).is_within(0.5));
    }

    #[test]
    fn test_distance_median_odd_and_even() {
        let mut depth = DepthMap::filled(3, 1, 0.0);
        depth.set(0, 0, 1.0);
        depth.set(1, 0, 3.0);
        depth.set(2, 0, 2.0);
        // Window [0, 3) around column 1, radius 2
        assert_relative_eq!(estimate_marker_distance(&depth, 1, 0, 2).unwrap(), 2.0);

        depth.set(2, 0, 0.0);
        assert_relative_eq!(estimate_marker_distance(&depth, 1, 0, 2).unwrap(), 2.0);

        depth.set(1, 0, 4.0);
        assert_relative_eq!(estimate_marker_distance(&depth, 1, 0, 2).unwrap(), 2.5);
    }

    #[test]
    fn test_distance_window_is_half_open() {
        let mut depth = DepthMap::filled(10, 10, 0.0);
        // Column x + radius is outside the window
        depth.set(7, 5, 0.8);
        assert_eq!(estimate_marker_distance(&depth, 5, 5, 2), None);
        depth.set(3, 3, 0.8);
        assert_relative_eq!(estimate_marker_distance(&depth, 5, 5, 2).unwrap(), 0.8);
    }

    #[test]
    fn test_distance_outside_or_invalid() {
        let depth = DepthMap::filled(4, 4, 1.5);
        assert_eq!(estimate_marker_distance(&depth, 4, 0, 5), None);
        assert_eq!(estimate_marker_distance(&depth, 0, 4, 5), None);
        assert_relative_eq!(estimate_marker_distance(&depth, 0, 0, 5).unwrap(), 1.5);

        let empty = DepthMap::filled(4, 4, 0.0);
        assert_eq!(estimate_marker_distance(&empty, 2, 2, 5), None);
    }

    #[test]
    fn test_distance_huge_radius_covers_whole_map() {
        let mut depth = DepthMap::filled(4, 4, 1.0);
        depth.set(3, 3, 0.0);
        assert_relative_eq!(
            estimate_marker_distance(&depth, 1, 1, usize::MAX).unwrap(),
            1.0
        );
    }
}
