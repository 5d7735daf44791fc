//! Discrete motion commands and navigation mode labels.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Open-loop motion directive sent to the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    Forward,
    Left,
    Right,
    Stop,
}

impl Command {
    /// All commands understood by the actuator.
    pub const ALL: [Command; 4] = [Command::Forward, Command::Left, Command::Right, Command::Stop];

    /// Wire name of the command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "FORWARD",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Stop => "STOP",
        }
    }

    /// True for LEFT and RIGHT.
    pub fn is_turn(&self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = Error;

    /// Parse a command name, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Command::ALL
            .into_iter()
            .find(|cmd| cmd.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::InvalidCommand(name.to_string()))
    }
}

/// Descriptive label of which rule produced the final command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationMode {
    /// Obstacle avoidance owns the command
    #[serde(rename = "VFH_ACTIVE")]
    AvoidanceActive,
    /// Steering toward a detected marker
    #[serde(rename = "ARUCO_TRACKING")]
    MarkerTracking,
    /// Marker is within the approach distance
    #[serde(rename = "ARUCO_REACHED")]
    MarkerReached,
    /// Nothing to do, robot held at STOP
    #[serde(rename = "SEARCH")]
    Search,
}

impl NavigationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AvoidanceActive => "VFH_ACTIVE",
            Self::MarkerTracking => "ARUCO_TRACKING",
            Self::MarkerReached => "ARUCO_REACHED",
            Self::Search => "SEARCH",
        }
    }
}

impl fmt::Display for NavigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("forward".parse::<Command>().unwrap(), Command::Forward);
        assert_eq!(" Stop\n".parse::<Command>().unwrap(), Command::Stop);
        assert_eq!("RIGHT".parse::<Command>().unwrap(), Command::Right);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "BACKWARD".parse::<Command>().unwrap_err();
        assert!(matches!(err, Error::InvalidCommand(ref name) if name == "BACKWARD"));
        assert!("".parse::<Command>().is_err());
    }

    #[test]
    fn test_display_matches_wire_name() {
        for cmd in Command::ALL {
            assert_eq!(cmd.to_string(), cmd.as_str());
            assert_eq!(cmd.as_str().parse::<Command>().unwrap(), cmd);
        }
        assert_eq!(NavigationMode::MarkerReached.to_string(), "ARUCO_REACHED");
    }
}
