//! Configuration loading for SarathiNav
//!
//! One TOML file covers the decision core (`[sectors]`, `[avoidance]`,
//! `[tracking]`) and the surrounding binary. Every section and field is
//! optional; missing values take the defaults below.

use crate::error::{NavError, Result};
use sarathi_core::{
    AvoidanceConfig, CameraIntrinsics, OperatorOverride, SectorConfig, SerialSettings,
    TrackingConfig,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "sarathi.toml";

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NavConfig {
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub sectors: SectorConfig,
    #[serde(default)]
    pub avoidance: AvoidanceConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub actuator: ActuatorConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Depth camera geometry
#[derive(Clone, Debug, Deserialize)]
pub struct SensorConfig {
    /// Focal length x in pixels (default: 525.0)
    #[serde(default = "default_focal")]
    pub fx: f32,

    /// Focal length y in pixels (default: 525.0)
    #[serde(default = "default_focal")]
    pub fy: f32,

    /// Principal point x (default: 319.5)
    #[serde(default = "default_cx")]
    pub cx: f32,

    /// Principal point y (default: 239.5)
    #[serde(default = "default_cy")]
    pub cy: f32,

    /// Frame width in pixels (default: 640)
    #[serde(default = "default_width")]
    pub width: usize,

    /// Frame height in pixels (default: 480)
    #[serde(default = "default_height")]
    pub height: usize,
}

/// Motor controller serial link
#[derive(Clone, Debug, Deserialize)]
pub struct ActuatorConfig {
    /// Open the serial port; when false commands are only logged (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Serial port path (default: /dev/ttyUSB0)
    #[serde(default = "default_port")]
    pub port: String,

    /// Baud rate (default: 9600)
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Serial timeout in milliseconds (default: 1000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Wait after opening the port in milliseconds (default: 2000)
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

/// Control loop pacing and operator defaults
#[derive(Clone, Debug, Deserialize)]
pub struct ControlConfig {
    /// Target loop rate in Hz (default: 30.0)
    #[serde(default = "default_target_fps")]
    pub target_fps: f32,

    /// Seconds between reconnect attempts while disconnected, 0 disables (default: 5.0)
    #[serde(default = "default_reconnect_interval")]
    pub reconnect_interval_secs: f32,

    /// Override active at startup: "VFH_ONLY", "ARUCO_ONLY", or absent for hybrid
    #[serde(default)]
    pub initial_override: Option<OperatorOverride>,

    /// Stop after this many cycles (default: run until quit)
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

/// Synthetic scene used in place of the depth camera and marker detector
#[derive(Clone, Debug, Deserialize)]
pub struct SimulationConfig {
    /// Distance of the background wall in meters (default: 3.0)
    #[serde(default = "default_wall_distance")]
    pub wall_distance: f32,

    #[serde(default)]
    pub obstacle: SimulatedObstacle,

    #[serde(default)]
    pub marker: SimulatedMarker,
}

/// Box obstacle spanning all rows of a column band, drifting toward the camera
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SimulatedObstacle {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// First covered column (default: 260)
    #[serde(default = "default_obstacle_col_start")]
    pub col_start: usize,

    /// One past the last covered column (default: 380)
    #[serde(default = "default_obstacle_col_end")]
    pub col_end: usize,

    /// Initial distance in meters (default: 2.5)
    #[serde(default = "default_obstacle_start_distance")]
    pub start_distance: f32,

    /// Approach speed in m/s (default: 0.1)
    #[serde(default = "default_obstacle_approach_speed")]
    pub approach_speed: f32,

    /// Closest the obstacle gets, in meters (default: 0.3)
    #[serde(default = "default_obstacle_min_distance")]
    pub min_distance: f32,
}

/// Marker reported by the scripted detector
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SimulatedMarker {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Marker id (default: 0)
    #[serde(default)]
    pub id: u32,

    /// Centre column (default: 320)
    #[serde(default = "default_marker_x")]
    pub x: usize,

    /// Centre row (default: 240)
    #[serde(default = "default_marker_y")]
    pub y: usize,
}

/// Log output settings
#[derive(Clone, Debug, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive when RUST_LOG is unset (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "stdout", "stderr", or a directory for a session log file (default: "stdout")
    #[serde(default = "default_log_output")]
    pub output: String,
}

// Default value functions

fn default_focal() -> f32 {
    525.0
}
fn default_cx() -> f32 {
    319.5
}
fn default_cy() -> f32 {
    239.5
}
fn default_width() -> usize {
    640
}
fn default_height() -> usize {
    480
}
fn default_true() -> bool {
    true
}
fn default_port() -> String {
    "/dev/ttyUSB0".to_string()
}
fn default_baud_rate() -> u32 {
    9600
}
fn default_timeout_ms() -> u64 {
    1000
}
fn default_settle_ms() -> u64 {
    2000
}
fn default_target_fps() -> f32 {
    30.0
}
fn default_reconnect_interval() -> f32 {
    5.0
}
fn default_wall_distance() -> f32 {
    3.0
}
fn default_obstacle_col_start() -> usize {
    260
}
fn default_obstacle_col_end() -> usize {
    380
}
fn default_obstacle_start_distance() -> f32 {
    2.5
}
fn default_obstacle_approach_speed() -> f32 {
    0.1
}
fn default_obstacle_min_distance() -> f32 {
    0.3
}
fn default_marker_x() -> usize {
    320
}
fn default_marker_y() -> usize {
    240
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_output() -> String {
    "stdout".to_string()
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            fx: default_focal(),
            fy: default_focal(),
            cx: default_cx(),
            cy: default_cy(),
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            port: default_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            reconnect_interval_secs: default_reconnect_interval(),
            initial_override: None,
            max_cycles: None,
        }
    }
}

impl Default for SimulatedObstacle {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            col_start: default_obstacle_col_start(),
            col_end: default_obstacle_col_end(),
            start_distance: default_obstacle_start_distance(),
            approach_speed: default_obstacle_approach_speed(),
            min_distance: default_obstacle_min_distance(),
        }
    }
}

impl Default for SimulatedMarker {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            id: 0,
            x: default_marker_x(),
            y: default_marker_y(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            wall_distance: default_wall_distance(),
            obstacle: SimulatedObstacle::default(),
            marker: SimulatedMarker::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: default_log_output(),
        }
    }
}

impl SensorConfig {
    pub fn intrinsics(&self) -> CameraIntrinsics {
        CameraIntrinsics::new(self.fx, self.fy, self.cx, self.cy)
    }
}

impl ActuatorConfig {
    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings {
            port: self.port.clone(),
            baud_rate: self.baud_rate,
            timeout: Duration::from_millis(self.timeout_ms),
            settle: Duration::from_millis(self.settle_ms),
        }
    }
}

impl ControlConfig {
    /// Target duration of one cycle
    pub fn cycle_period(&self) -> Duration {
        Duration::try_from_secs_f32(1.0 / self.target_fps).unwrap_or(Duration::MAX)
    }

    /// `None` when reconnecting is disabled
    pub fn reconnect_interval(&self) -> Option<Duration> {
        (self.reconnect_interval_secs > 0.0).then(|| {
            Duration::try_from_secs_f32(self.reconnect_interval_secs).unwrap_or(Duration::MAX)
        })
    }
}

impl NavConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NavError::Config(format!("Failed to read config file: {}", e)))?;
        let config: NavConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Config file to use: the explicit path, else `sarathi.toml` in the
    /// working directory if present, else none (defaults)
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                fallback.exists().then(|| fallback.to_path_buf())
            }
        }
    }

    /// Load from `path` or fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Check values the loader cannot constrain
    pub fn validate(&self) -> Result<()> {
        self.sectors.validate()?;
        self.avoidance.validate()?;
        self.tracking.validate()?;

        if self.sensor.width == 0 || self.sensor.height == 0 {
            return Err(NavError::Config(format!(
                "sensor frame size must be non-zero, got {}x{}",
                self.sensor.width, self.sensor.height
            )));
        }
        if !(self.sensor.fx.is_finite() && self.sensor.fx > 0.0)
            || !(self.sensor.fy.is_finite() && self.sensor.fy > 0.0)
        {
            return Err(NavError::Config(format!(
                "focal lengths must be positive, got fx={} fy={}",
                self.sensor.fx, self.sensor.fy
            )));
        }
        if !self.control.target_fps.is_finite() || self.control.target_fps <= 0.0 {
            return Err(NavError::Config(format!(
                "target_fps must be positive, got {}",
                self.control.target_fps
            )));
        }
        if !self.control.reconnect_interval_secs.is_finite()
            || self.control.reconnect_interval_secs < 0.0
        {
            return Err(NavError::Config(format!(
                "reconnect_interval_secs must be >= 0, got {}",
                self.control.reconnect_interval_secs
            )));
        }
        let obstacle = &self.simulation.obstacle;
        if obstacle.enabled && obstacle.col_start >= obstacle.col_end {
            return Err(NavError::Config(format!(
                "simulation obstacle columns must be non-empty, got {}..{}",
                obstacle.col_start, obstacle.col_end
            )));
        }
        Ok(())
    }
}
