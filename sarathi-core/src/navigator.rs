//! One control cycle of the decision core.
//!
//! Composes the sector classifier, avoidance controller, tracking mapper and
//! arbiter. Actuation stays with the caller, who feeds the decision to a
//! [`CommandDispatcher`](crate::dispatch::CommandDispatcher).

use crate::arbiter::{Arbiter, ArbiterInputs, Decision, OperatorOverride};
use crate::avoidance::AvoidanceController;
use crate::command::Command;
use crate::config::{AvoidanceConfig, SectorConfig, TrackingConfig};
use crate::marker::{MarkerObservation, tracking_command};
use crate::sectors::{CameraIntrinsics, DepthMap, SectorClassifier, SectorStatus};
use std::time::Instant;

/// Every intermediate value of a cycle, for logging and display.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub sectors: SectorStatus,
    /// Per-sector minimum depth, saturated at the histogram range
    pub histogram: Vec<f32>,
    /// Valid depth points seen this cycle
    pub valid_points: usize,
    pub all_clear: bool,
    pub avoidance_command: Command,
    pub tracking_command: Option<Command>,
    pub decision: Decision,
}

/// Stateful per-run decision pipeline.
#[derive(Debug, Clone)]
pub struct Navigator {
    classifier: SectorClassifier,
    avoidance: AvoidanceController,
    arbiter: Arbiter,
    histogram_max_range: f32,
}

impl Navigator {
    pub fn new(
        intrinsics: CameraIntrinsics,
        sectors: &SectorConfig,
        avoidance: &AvoidanceConfig,
        tracking: &TrackingConfig,
        now: Instant,
    ) -> Self {
        log::info!(
            "Navigator: {} sectors, threshold {:.2}m, approach {:.2}m",
            sectors.sector_count(),
            sectors.threshold_distance,
            tracking.approach_distance
        );
        Self {
            classifier: SectorClassifier::from_config(intrinsics, sectors),
            avoidance: AvoidanceController::new(avoidance, now),
            arbiter: Arbiter::new(tracking.approach_distance),
            histogram_max_range: sectors.histogram_max_range,
        }
    }

    /// Run one cycle. `depth` is `None` when the sensor delivered nothing,
    /// which classifies as all clear.
    pub fn cycle(
        &mut self,
        depth: Option<&DepthMap>,
        marker: Option<&MarkerObservation>,
        operator_override: Option<OperatorOverride>,
        now: Instant,
    ) -> CycleReport {
        let scan = self.classifier.scan(depth);
        let sectors = scan.status(self.classifier.threshold_distance());
        let all_clear = sectors.is_all_clear();

        let avoidance_command = self.avoidance.step(&sectors, now);
        let tracking_command = tracking_command(marker);

        let decision = self.arbiter.decide(&ArbiterInputs {
            operator_override,
            sectors: &sectors,
            avoidance_command,
            marker,
            tracking_command,
        });

        CycleReport {
            histogram: scan.histogram(self.histogram_max_range),
            valid_points: scan.total_points(),
            sectors,
            all_clear,
            avoidance_command,
            tracking_command,
            decision,
        }
    }

    pub fn classifier(&self) -> &SectorClassifier {
        &self.classifier
    }

    pub fn avoidance(&self) -> &AvoidanceController {
        &self.avoidance
    }

    pub fn arbiter(&self) -> &Arbiter {
        &self.arbiter
    }
}
