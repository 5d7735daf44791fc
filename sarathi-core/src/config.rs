//! Configuration for the navigation decision core
//!
//! Every field has a serde default so partial TOML sections deserialize.
//! Values are fixed for the lifetime of a run.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sector classification parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SectorConfig {
    /// Obstacle threshold distance in meters (default: 1.0)
    #[serde(default = "default_threshold_distance")]
    pub threshold_distance: f32,

    /// Sector labels in azimuth order; the sector count is their number
    #[serde(default = "default_sector_labels")]
    pub sector_labels: Vec<String>,

    /// Yaw applied to azimuth binning only, in degrees (default: 0.0)
    #[serde(default)]
    pub view_yaw_deg: f32,

    /// Range at which the polar histogram saturates, in meters (default: 2.0)
    #[serde(default = "default_histogram_max_range")]
    pub histogram_max_range: f32,
}

/// Avoidance debounce timing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AvoidanceConfig {
    /// Time to keep driving forward after an obstacle appears (default: 0.4s)
    #[serde(default = "default_forward_duration")]
    pub forward_duration_secs: f32,

    /// Duration of a committed turn (default: 0.2s)
    #[serde(default = "default_turn_duration")]
    pub turn_duration_secs: f32,
}

/// Marker tracking parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrackingConfig {
    /// Stop when the marker is closer than this, in meters (default: 0.5)
    #[serde(default = "default_approach_distance")]
    pub approach_distance: f32,

    /// Left zone boundary as a fraction of frame width (default: 0.33)
    #[serde(default = "default_left_boundary")]
    pub left_boundary: f32,

    /// Right zone boundary as a fraction of frame width (default: 0.67)
    #[serde(default = "default_right_boundary")]
    pub right_boundary: f32,

    /// Half-size of the depth sampling window around the marker, in pixels (default: 5)
    #[serde(default = "default_sample_radius")]
    pub sample_radius: usize,
}

fn default_threshold_distance() -> f32 {
    1.0
}
fn default_sector_labels() -> Vec<String> {
    ["Left", "Left-Front", "Center", "Right-Front", "Right"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_histogram_max_range() -> f32 {
    2.0
}
fn default_forward_duration() -> f32 {
    0.4
}
fn default_turn_duration() -> f32 {
    0.2
}
fn default_approach_distance() -> f32 {
    0.5
}
fn default_left_boundary() -> f32 {
    0.33
}
fn default_right_boundary() -> f32 {
    0.67
}
fn default_sample_radius() -> usize {
    5
}

impl SectorConfig {
    /// Number of sectors
    pub fn sector_count(&self) -> usize {
        self.sector_labels.len()
    }

    /// Label of a sector position, if any
    pub fn label(&self, index: usize) -> Option<&str> {
        self.sector_labels.get(index).map(String::as_str)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sector_labels.is_empty() {
            return Err(Error::InvalidParameter(
                "sector_labels must name at least one sector".to_string(),
            ));
        }
        if self.threshold_distance.is_nan() || self.threshold_distance <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "threshold_distance must be positive, got {}",
                self.threshold_distance
            )));
        }
        if self.histogram_max_range.is_nan() || self.histogram_max_range <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "histogram_max_range must be positive, got {}",
                self.histogram_max_range
            )));
        }
        Ok(())
    }
}

impl AvoidanceConfig {
    pub fn forward_duration(&self) -> Duration {
        seconds(self.forward_duration_secs)
    }

    pub fn turn_duration(&self) -> Duration {
        seconds(self.turn_duration_secs)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("forward_duration_secs", self.forward_duration_secs),
            ("turn_duration_secs", self.turn_duration_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidParameter(format!(
                    "{} must be a non-negative number of seconds, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl TrackingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.approach_distance.is_nan() || self.approach_distance <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "approach_distance must be positive, got {}",
                self.approach_distance
            )));
        }
        if !(0.0 < self.left_boundary
            && self.left_boundary < self.right_boundary
            && self.right_boundary < 1.0)
        {
            return Err(Error::InvalidParameter(format!(
                "zone boundaries must satisfy 0 < left < right < 1, got {} / {}",
                self.left_boundary, self.right_boundary
            )));
        }
        Ok(())
    }
}

/// Negative or NaN values collapse to zero, overflow saturates.
fn seconds(value: f32) -> Duration {
    if value > 0.0 {
        Duration::try_from_secs_f32(value).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

impl Default for SectorConfig {
    fn default() -> Self {
        Self {
            threshold_distance: default_threshold_distance(),
            sector_labels: default_sector_labels(),
            view_yaw_deg: 0.0,
            histogram_max_range: default_histogram_max_range(),
        }
    }
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            forward_duration_secs: default_forward_duration(),
            turn_duration_secs: default_turn_duration(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            approach_distance: default_approach_distance(),
            left_boundary: default_left_boundary(),
            right_boundary: default_right_boundary(),
            sample_radius: default_sample_radius(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let sectors = SectorConfig::default();
        assert_eq!(sectors.sector_count(), 5);
        assert_eq!(sectors.label(2), Some("Center"));
        assert_eq!(sectors.label(5), None);
        sectors.validate().unwrap();
        AvoidanceConfig::default().validate().unwrap();
        TrackingConfig::default().validate().unwrap();
    }

    #[test]
    fn test_durations() {
        let config = AvoidanceConfig::default();
        assert_eq!(config.forward_duration(), Duration::from_secs_f32(0.4));
        assert_eq!(config.turn_duration(), Duration::from_secs_f32(0.2));
    }

    #[test]
    fn test_rejects_bad_values() {
        let sectors = SectorConfig {
            sector_labels: Vec::new(),
            ..Default::default()
        };
        assert!(sectors.validate().is_err());

        let sectors = SectorConfig {
            threshold_distance: 0.0,
            ..Default::default()
        };
        assert!(sectors.validate().is_err());

        let avoidance = AvoidanceConfig {
            turn_duration_secs: -1.0,
            ..Default::default()
        };
        assert!(avoidance.validate().is_err());

        let tracking = TrackingConfig {
            left_boundary: 0.7,
            right_boundary: 0.3,
            ..Default::default()
        };
        assert!(tracking.validate().is_err());
    }
}
