//! Debounced bang-bang obstacle avoidance.
//!
//! The controller keeps driving forward for `forward_duration` after an
//! obstacle first appears, then commits to a timed turn for `turn_duration`,
//! then returns to forward and re-evaluates. Time is injected by the caller
//! so the state machine can be driven with synthetic timestamps.
//!
//! ```text
//!            obstacle && elapsed >= forward_duration
//!   FORWARD ───────────────────────────────────────▶ LEFT / RIGHT
//!      ▲                                                  │
//!      └──────────── elapsed >= turn_duration ────────────┘
//!      (or immediately when every sector is clear)
//! ```

use crate::command::Command;
use crate::config::AvoidanceConfig;
use crate::sectors::{SectorStatus, position};
use std::time::{Duration, Instant};

/// Mutable state owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvoidanceState {
    /// FORWARD, LEFT or RIGHT
    pub current: Command,
    /// When `current` was last (re)started
    pub started_at: Instant,
    /// Turn direction chosen from the latest obstruction pattern
    pub pending_turn: Option<Command>,
}

/// Turn direction implied by an obstruction pattern, first match wins:
/// left side blocked → RIGHT, right side blocked → LEFT, center only →
/// LEFT when left-front is clear else RIGHT. `None` when no rule applies.
pub fn desired_turn(status: &SectorStatus) -> Option<Command> {
    if status.is_obstructed(position::LEFT) || status.is_obstructed(position::LEFT_FRONT) {
        Some(Command::Right)
    } else if status.is_obstructed(position::RIGHT) || status.is_obstructed(position::RIGHT_FRONT)
    {
        Some(Command::Left)
    } else if status.is_obstructed(position::CENTER) {
        if status.is_obstructed(position::LEFT_FRONT) {
            Some(Command::Right)
        } else {
            Some(Command::Left)
        }
    } else {
        None
    }
}

/// Stateful avoidance command generator.
#[derive(Debug, Clone)]
pub struct AvoidanceController {
    forward_duration: Duration,
    turn_duration: Duration,
    state: AvoidanceState,
}

impl AvoidanceController {
    /// Create a controller driving FORWARD from `now`.
    pub fn new(config: &AvoidanceConfig, now: Instant) -> Self {
        Self::with_durations(config.forward_duration(), config.turn_duration(), now)
    }

    pub fn with_durations(forward_duration: Duration, turn_duration: Duration, now: Instant) -> Self {
        log::debug!(
            "AvoidanceController: forward_duration={:.2}s, turn_duration={:.2}s",
            forward_duration.as_secs_f32(),
            turn_duration.as_secs_f32()
        );
        Self {
            forward_duration,
            turn_duration,
            state: AvoidanceState {
                current: Command::Forward,
                started_at: now,
                pending_turn: None,
            },
        }
    }

    pub fn state(&self) -> &AvoidanceState {
        &self.state
    }

    /// Current command without advancing the state machine.
    pub fn current(&self) -> Command {
        self.state.current
    }

    /// Advance one control cycle.
    pub fn step(&mut self, status: &SectorStatus, now: Instant) -> Command {
        if status.is_all_clear() {
            if self.state.current != Command::Forward {
                log::debug!("AvoidanceController: path clear, back to FORWARD");
                self.transition(Command::Forward, now);
            }
            return Command::Forward;
        }

        if let Some(turn) = desired_turn(status) {
            self.state.pending_turn = Some(turn);
        }

        let elapsed = now.saturating_duration_since(self.state.started_at);

        match self.state.current {
            Command::Forward if elapsed >= self.forward_duration => {
                // pending_turn survives patterns no rule matches, so a turn
                // chosen earlier is still taken; with none yet, keep going
                if let Some(turn) = self.state.pending_turn {
                    log::debug!(
                        "AvoidanceController: obstacle persisted {:.2}s, turning {}",
                        elapsed.as_secs_f32(),
                        turn
                    );
                    self.transition(turn, now);
                }
            }
            Command::Left | Command::Right if elapsed >= self.turn_duration => {
                log::debug!(
                    "AvoidanceController: turn {} complete after {:.2}s",
                    self.state.current,
                    elapsed.as_secs_f32()
                );
                self.transition(Command::Forward, now);
            }
            _ => {}
        }

        self.state.current
    }

    fn transition(&mut self, command: Command, now: Instant) {
        self.state.current = command;
        self.state.started_at = now;
    }
}
