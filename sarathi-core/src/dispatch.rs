//! Deduplicating command dispatcher.
//!
//! Sits between the arbiter and the actuator link. A command equal to the
//! last one sent is not retransmitted and counts as accepted. When the link
//! is down the command is logged as a simulated send and still recorded as
//! last sent, so the loop keeps a consistent view of what the robot was told
//! to do.

use crate::command::Command;
use crate::error::Result;
use crate::link::ActuatorLink;

/// Outcome of one dispatch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchResult {
    /// Command accepted: written to the link, simulated while the link is
    /// down, or a repeat of the last command. False only when a write failed.
    pub sent: bool,
    /// Link health after the call
    pub connected: bool,
}

/// State owned by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchState {
    pub last_sent: Option<Command>,
    pub connected: bool,
}

/// Forwards commands to an actuator link, suppressing repeats.
pub struct CommandDispatcher<L: ActuatorLink> {
    link: L,
    state: DispatchState,
    transmissions: u64,
    simulated: u64,
}

impl<L: ActuatorLink> CommandDispatcher<L> {
    pub fn new(link: L) -> Self {
        let connected = link.is_connected();
        if !connected {
            log::warn!("Actuator link not connected, commands will be simulated");
        }
        Self {
            link,
            state: DispatchState {
                last_sent: None,
                connected,
            },
            transmissions: 0,
            simulated: 0,
        }
    }

    /// Send `command` unless it equals the last command sent.
    pub fn dispatch(&mut self, command: Command) -> DispatchResult {
        if self.state.last_sent == Some(command) {
            return DispatchResult {
                sent: true,
                connected: self.state.connected,
            };
        }
        self.transmit(command)
    }

    /// Parse a command name (case-insensitive) and dispatch it.
    ///
    /// Unknown names are rejected without touching dispatcher state.
    pub fn dispatch_named(&mut self, name: &str) -> Result<DispatchResult> {
        let command: Command = name.parse()?;
        Ok(self.dispatch(command))
    }

    /// Send STOP regardless of what was sent last.
    pub fn force_stop(&mut self) -> DispatchResult {
        log::warn!("Emergency STOP");
        self.transmit(Command::Stop)
    }

    /// Ask the link to reconnect. On success the next command is always
    /// transmitted, since the controller may have reset.
    pub fn reconnect(&mut self) -> Result<()> {
        let result = self.link.reconnect();
        self.state.connected = self.link.is_connected();
        match &result {
            Ok(()) => {
                self.state.last_sent = None;
                log::info!("Actuator link reconnected");
            }
            Err(e) => log::debug!("Actuator reconnect failed: {}", e),
        }
        result
    }

    /// Best-effort STOP bypassing dedup, then release the link.
    pub fn shutdown(&mut self) {
        log::info!("Dispatcher shutdown: sending STOP");
        self.transmit(Command::Stop);
        self.link.close();
        self.state = DispatchState::default();
        log::info!(
            "Dispatcher closed ({} transmitted, {} simulated)",
            self.transmissions,
            self.simulated
        );
    }

    fn transmit(&mut self, command: Command) -> DispatchResult {
        // Recorded even when the link is down
        self.state.last_sent = Some(command);

        if !self.link.is_connected() {
            self.state.connected = false;
            self.simulated += 1;
            log::warn!("[SIM] Actuator << {}", command);
            return DispatchResult {
                sent: true,
                connected: false,
            };
        }

        match self.link.send(command) {
            Ok(()) => {
                self.state.connected = true;
                self.transmissions += 1;
                log::info!("Actuator << {}", command);
                DispatchResult {
                    sent: true,
                    connected: true,
                }
            }
            Err(e) => {
                self.state.connected = false;
                self.simulated += 1;
                log::error!("Actuator send error for {}: {}", command, e);
                DispatchResult {
                    sent: false,
                    connected: false,
                }
            }
        }
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    pub fn last_sent(&self) -> Option<Command> {
        self.state.last_sent
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected
    }

    /// Commands that reached the link
    pub fn transmissions(&self) -> u64 {
        self.transmissions
    }

    /// Commands recorded while the link was down
    pub fn simulated_sends(&self) -> u64 {
        self.simulated
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }
}
