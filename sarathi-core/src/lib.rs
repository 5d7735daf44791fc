//! Sarathi - reactive navigation decision core for a mobile robot
//!
//! Turns a depth map and an optional fiducial-marker observation into one
//! discrete motion command per control cycle:
//!
//! ```text
//! depth map ─▶ SectorClassifier ─▶ AvoidanceController ─┐
//!                                                       ├─▶ Arbiter ─▶ CommandDispatcher ─▶ ActuatorLink
//! marker ────────────────────────▶ tracking_command ────┘
//! ```
//!
//! ## Features
//!
//! - `serial` (default): `SerialLink` over the `serialport` crate

pub mod arbiter;
pub mod avoidance;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod link;
pub mod marker;
pub mod navigator;
pub mod sectors;
pub mod transport;

// Re-export commonly used types
pub use arbiter::{Arbiter, Decision, OperatorOverride};
pub use avoidance::AvoidanceController;
pub use command::{Command, NavigationMode};
pub use config::{AvoidanceConfig, SectorConfig, TrackingConfig};
pub use dispatch::{CommandDispatcher, DispatchResult};
pub use error::{Error, Result};
pub use link::{ActuatorLink, MockLink};
#[cfg(feature = "serial")]
pub use link::{SerialLink, SerialSettings};
pub use marker::{MarkerObservation, Zone, ZoneBoundaries};
pub use navigator::{CycleReport, Navigator};
pub use sectors::{CameraIntrinsics, DepthMap, SectorClassifier, SectorStatus};
