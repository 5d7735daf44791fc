//! Priority arbitration between obstacle avoidance and marker tracking.

use crate::command::{Command, NavigationMode};
use crate::error::{Error, Result};
use crate::marker::MarkerObservation;
use crate::sectors::SectorStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operator-selected restriction of the arbiter. `None` at the call sites
/// means hybrid operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorOverride {
    /// Follow the avoidance controller only
    #[serde(rename = "VFH_ONLY", alias = "avoidance")]
    AvoidanceOnly,
    /// Follow the marker only, ignore obstacles
    #[serde(rename = "ARUCO_ONLY", alias = "tracking")]
    TrackingOnly,
}

impl OperatorOverride {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AvoidanceOnly => "VFH_ONLY",
            Self::TrackingOnly => "ARUCO_ONLY",
        }
    }
}

impl fmt::Display for OperatorOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatorOverride {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vfh_only" | "avoidance" => Ok(Self::AvoidanceOnly),
            "aruco_only" | "tracking" => Ok(Self::TrackingOnly),
            other => Err(Error::InvalidParameter(format!(
                "unknown override mode: {:?}",
                other
            ))),
        }
    }
}

/// Final command for a cycle and the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decision {
    pub command: Command,
    pub mode: NavigationMode,
}

impl Decision {
    pub fn new(command: Command, mode: NavigationMode) -> Self {
        Self { command, mode }
    }

    fn search() -> Self {
        Self::new(Command::Stop, NavigationMode::Search)
    }
}

/// Inputs to one arbitration.
#[derive(Debug, Clone, Copy)]
pub struct ArbiterInputs<'a> {
    pub operator_override: Option<OperatorOverride>,
    pub sectors: &'a SectorStatus,
    pub avoidance_command: Command,
    pub marker: Option<&'a MarkerObservation>,
    pub tracking_command: Option<Command>,
}

/// Fuses avoidance and tracking into one command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arbiter {
    approach_distance: f32,
}

impl Arbiter {
    pub fn new(approach_distance: f32) -> Self {
        Self { approach_distance }
    }

    pub fn approach_distance(&self) -> f32 {
        self.approach_distance
    }

    /// Apply the priority rules, first match wins:
    ///
    /// 1. avoidance-only override: avoidance command
    /// 2. tracking-only override: tracking command, or STOP while searching
    /// 3. any obstructed sector: avoidance command
    /// 4. marker within approach distance: STOP; otherwise track it
    /// 5. nothing detected: STOP while searching
    pub fn decide(&self, inputs: &ArbiterInputs<'_>) -> Decision {
        match inputs.operator_override {
            Some(OperatorOverride::AvoidanceOnly) => {
                return Decision::new(inputs.avoidance_command, NavigationMode::AvoidanceActive);
            }
            Some(OperatorOverride::TrackingOnly) => {
                return match inputs.marker {
                    Some(_) => self.track(inputs.tracking_command),
                    None => Decision::search(),
                };
            }
            None => {}
        }

        if !inputs.sectors.is_all_clear() {
            return Decision::new(inputs.avoidance_command, NavigationMode::AvoidanceActive);
        }

        match inputs.marker {
            Some(marker) if marker.is_within(self.approach_distance) => {
                Decision::new(Command::Stop, NavigationMode::MarkerReached)
            }
            Some(_) => self.track(inputs.tracking_command),
            None => Decision::search(),
        }
    }

    fn track(&self, tracking_command: Option<Command>) -> Decision {
        match tracking_command {
            Some(command) => Decision::new(command, NavigationMode::MarkerTracking),
            None => {
                // Caller passed a marker without an intent; hold still
                log::warn!("Arbiter: marker detected without a tracking command, stopping");
                Decision::new(Command::Stop, NavigationMode::MarkerTracking)
            }
        }
    }
}

/// Free-function form of [`Arbiter::decide`].
pub fn decide(
    operator_override: Option<OperatorOverride>,
    sectors: &SectorStatus,
    avoidance_command: Command,
    marker: Option<&MarkerObservation>,
    tracking_command: Option<Command>,
    approach_distance: f32,
) -> Decision {
    Arbiter::new(approach_distance).decide(&ArbiterInputs {
        operator_override,
        sectors,
        avoidance_command,
        marker,
        tracking_command,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::{Zone, ZoneBoundaries};
    use crate::sectors::position;

    fn marker_at(x: usize, distance: Option<f32>) -> MarkerObservation {
        MarkerObservation::new(3, x, 240, &ZoneBoundaries::from_frame(640, 0.33, 0.67))
            .with_distance(distance)
    }

    fn run(
        operator_override: Option<OperatorOverride>,
        sectors: &SectorStatus,
        avoidance: Command,
        marker: Option<&MarkerObservation>,
    ) -> Decision {
        let tracking = crate::marker::tracking_command(marker);
        decide(operator_override, sectors, avoidance, marker, tracking, 0.5)
    }

    #[test]
    fn test_avoidance_only_override() {
        let clear = SectorStatus::all_clear(5);
        let marker = marker_at(320, Some(0.2));
        let d = run(
            Some(OperatorOverride::AvoidanceOnly),
            &clear,
            Command::Forward,
            Some(&marker),
        );
        assert_eq!(d, Decision::new(Command::Forward, NavigationMode::AvoidanceActive));
    }

    #[test]
    fn test_tracking_only_override_ignores_obstacles() {
        let blocked = SectorStatus::with_obstructed(5, &[position::CENTER]);
        let marker = marker_at(500, None);
        assert_eq!(marker.zone, Zone::Right);

        let d = run(
            Some(OperatorOverride::TrackingOnly),
            &blocked,
            Command::Left,
            Some(&marker),
        );
        assert_eq!(d, Decision::new(Command::Left, NavigationMode::MarkerTracking));

        let d = run(Some(OperatorOverride::TrackingOnly), &blocked, Command::Left, None);
        assert_eq!(d, Decision::new(Command::Stop, NavigationMode::Search));
    }

    #[test]
    fn test_obstacle_beats_close_marker() {
        let blocked = SectorStatus::with_obstructed(5, &[position::RIGHT]);
        let marker = marker_at(320, Some(0.01));
        let d = run(None, &blocked, Command::Forward, Some(&marker));
        assert_eq!(d, Decision::new(Command::Forward, NavigationMode::AvoidanceActive));
    }

    #[test]
    fn test_marker_reached() {
        let clear = SectorStatus::all_clear(5);
        let marker = marker_at(50, Some(0.3));
        assert_eq!(marker.zone, Zone::Left);
        let d = run(None, &clear, Command::Forward, Some(&marker));
        assert_eq!(d, Decision::new(Command::Stop, NavigationMode::MarkerReached));
    }

    #[test]
    fn test_unknown_distance_falls_through_to_tracking() {
        let clear = SectorStatus::all_clear(5);
        let marker = marker_at(50, None);
        let d = run(None, &clear, Command::Forward, Some(&marker));
        assert_eq!(d, Decision::new(Command::Right, NavigationMode::MarkerTracking));

        let marker = marker_at(50, Some(0.5));
        let d = run(None, &clear, Command::Forward, Some(&marker));
        assert_eq!(d.mode, NavigationMode::MarkerTracking);
    }

    #[test]
    fn test_search_when_nothing_seen() {
        let clear = SectorStatus::all_clear(5);
        let d = run(None, &clear, Command::Forward, None);
        assert_eq!(d, Decision::new(Command::Stop, NavigationMode::Search));
    }

    #[test]
    fn test_missing_tracking_command_stops() {
        let clear = SectorStatus::all_clear(5);
        let marker = marker_at(320, None);
        let d = decide(None, &clear, Command::Forward, Some(&marker), None, 0.5);
        assert_eq!(d, Decision::new(Command::Stop, NavigationMode::MarkerTracking));
    }

    #[test]
    fn test_override_parsing() {
        assert_eq!(
            "VFH_ONLY".parse::<OperatorOverride>().unwrap(),
            OperatorOverride::AvoidanceOnly
        );
        assert_eq!(
            "tracking".parse::<OperatorOverride>().unwrap(),
            OperatorOverride::TrackingOnly
        );
        assert!("hybrid".parse::<OperatorOverride>().is_err());
    }
}
