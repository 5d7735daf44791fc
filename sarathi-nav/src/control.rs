//! Single-threaded control loop
//!
//! Each cycle drains operator input, reads a frame, attaches the marker
//! zone and distance, runs the decision core, and dispatches the result.
//! The loop sleeps out the remainder of the cycle period to hold the target
//! rate.

use crate::input::OperatorInput;
use crate::scene::{FrameSource, MarkerDetector};
use sarathi_core::marker::estimate_marker_distance;
use sarathi_core::{
    ActuatorLink, Command, CommandDispatcher, CycleReport, Decision, MarkerObservation, Navigator,
    OperatorOverride, ZoneBoundaries,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Cycles completed per one-second window
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
    fps: u32,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            fps: 0,
        }
    }

    /// Count one cycle. Returns the rate when a window completes.
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        self.frames += 1;
        if now.saturating_duration_since(self.window_start) >= Duration::from_secs(1) {
            self.fps = self.frames;
            self.frames = 0;
            self.window_start = now;
            Some(self.fps)
        } else {
            None
        }
    }

    /// Rate of the last completed window
    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// Loop timing parameters
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    pub cycle_period: Duration,
    /// `None` disables reconnect attempts
    pub reconnect_interval: Option<Duration>,
    pub max_cycles: Option<u64>,
}

/// Counters reported when the loop exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub skipped_frames: u64,
    pub transmissions: u64,
    pub simulated_sends: u64,
}

pub struct ControlLoop<S, D, L>
where
    S: FrameSource,
    D: MarkerDetector,
    L: ActuatorLink,
{
    navigator: Navigator,
    dispatcher: CommandDispatcher<L>,
    source: S,
    detector: D,
    zones: ZoneBoundaries,
    sample_radius: usize,
    operator_override: Option<OperatorOverride>,
    last_decision: Option<Decision>,
    /// Emergency stop holds until the decision or the mode changes
    estop_latched: bool,
    settings: LoopSettings,
    last_reconnect: Option<Instant>,
    fps: FpsCounter,
    cycles: u64,
    skipped_frames: u64,
}

impl<S, D, L> ControlLoop<S, D, L>
where
    S: FrameSource,
    D: MarkerDetector,
    L: ActuatorLink,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        navigator: Navigator,
        dispatcher: CommandDispatcher<L>,
        source: S,
        detector: D,
        zones: ZoneBoundaries,
        sample_radius: usize,
        operator_override: Option<OperatorOverride>,
        settings: LoopSettings,
        now: Instant,
    ) -> Self {
        Self {
            navigator,
            dispatcher,
            source,
            detector,
            zones,
            sample_radius,
            operator_override,
            last_decision: None,
            estop_latched: false,
            settings,
            last_reconnect: None,
            fps: FpsCounter::new(now),
            cycles: 0,
            skipped_frames: 0,
        }
    }

    /// Apply one operator input. Returns false when the operator quit.
    pub fn handle_input(&mut self, input: OperatorInput) -> bool {
        match input {
            OperatorInput::SetOverride(mode) => {
                self.operator_override = mode;
                self.estop_latched = false;
                info!(
                    "Mode switched to {}",
                    mode.map_or("HYBRID", |m| m.as_str())
                );
            }
            OperatorInput::EmergencyStop => {
                warn!("Emergency stop triggered");
                self.dispatcher.force_stop();
                self.estop_latched = true;
            }
            OperatorInput::Quit => {
                info!("Quit requested");
                return false;
            }
        }
        true
    }

    /// Run one cycle at `now`. Returns `None` when no frame was available.
    pub fn run_cycle(&mut self, now: Instant) -> Option<CycleReport> {
        let frame = match self.source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                warn!("Failed to get frames");
                self.skipped_frames += 1;
                return None;
            }
            Err(e) => {
                warn!("Failed to get frames: {}", e);
                self.skipped_frames += 1;
                return None;
            }
        };

        let marker = self.detector.detect(&frame).map(|d| {
            let distance =
                estimate_marker_distance(&frame.depth, d.pixel_x, d.pixel_y, self.sample_radius);
            MarkerObservation::new(d.id, d.pixel_x, d.pixel_y, &self.zones).with_distance(distance)
        });

        let report = self.navigator.cycle(
            Some(&frame.depth),
            marker.as_ref(),
            self.operator_override,
            frame.captured_at,
        );

        let unchanged = self
            .last_decision
            .is_some_and(|d| d.command == report.decision.command);
        if self.estop_latched && unchanged {
            debug!(
                "Emergency stop held, decision still {}",
                report.decision.command
            );
        } else {
            self.estop_latched = false;
            self.dispatcher.dispatch(report.decision.command);
        }

        if !unchanged {
            info!(
                "Mode: {} | Command: {}",
                report.decision.mode, report.decision.command
            );
        }
        self.last_decision = Some(report.decision);

        debug!(
            "sectors={:?} histogram={:?} avoidance={} tracking={:?} marker={:?}",
            report.sectors.iter().collect::<Vec<_>>(),
            report.histogram,
            report.avoidance_command,
            report.tracking_command,
            marker
        );

        if let Some(fps) = self.fps.tick(now) {
            debug!("FPS: {}", fps);
        }
        self.cycles += 1;

        self.maybe_reconnect(now);
        Some(report)
    }

    fn maybe_reconnect(&mut self, now: Instant) {
        let Some(interval) = self.settings.reconnect_interval else {
            return;
        };
        if self.dispatcher.is_connected() {
            return;
        }
        let due = self
            .last_reconnect
            .is_none_or(|last| now.saturating_duration_since(last) >= interval);
        if due {
            self.last_reconnect = Some(now);
            if let Err(e) = self.dispatcher.reconnect() {
                debug!("Reconnect failed: {}", e);
            }
        }
    }

    /// Run until `running` clears, the operator quits, or `max_cycles` is
    /// reached.
    pub fn run(&mut self, running: &AtomicBool, inputs: &Receiver<OperatorInput>) -> RunSummary {
        info!(
            "Control loop running at {:.1} Hz",
            1.0 / self.settings.cycle_period.as_secs_f32()
        );

        'control: while running.load(Ordering::SeqCst) {
            let cycle_start = Instant::now();

            loop {
                match inputs.try_recv() {
                    Ok(input) => {
                        if !self.handle_input(input) {
                            break 'control;
                        }
                    }
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }

            self.run_cycle(cycle_start);

            if self
                .settings
                .max_cycles
                .is_some_and(|max| self.cycles >= max)
            {
                info!("Reached {} cycles", self.cycles);
                break;
            }

            let elapsed = cycle_start.elapsed();
            if elapsed < self.settings.cycle_period {
                std::thread::sleep(self.settings.cycle_period - elapsed);
            }
        }

        self.summary()
    }

    /// Stop the robot and release the actuator link
    pub fn shutdown(&mut self) -> RunSummary {
        info!("Stopping robot...");
        self.dispatcher.shutdown();
        let summary = self.summary();
        info!(
            "Shutdown complete: {} cycles (last {} FPS), {} skipped frames, {} transmitted, {} simulated",
            summary.cycles,
            self.fps.fps(),
            summary.skipped_frames,
            summary.transmissions,
            summary.simulated_sends
        );
        summary
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            cycles: self.cycles,
            skipped_frames: self.skipped_frames,
            transmissions: self.dispatcher.transmissions(),
            simulated_sends: self.dispatcher.simulated_sends(),
        }
    }

    pub fn operator_override(&self) -> Option<OperatorOverride> {
        self.operator_override
    }

    pub fn last_command(&self) -> Option<Command> {
        self.last_decision.map(|d| d.command)
    }

    pub fn dispatcher(&self) -> &CommandDispatcher<L> {
        &self.dispatcher
    }
}
