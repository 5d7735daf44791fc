//! Actuator link: discrete commands over a line-oriented byte transport.
//!
//! Each command travels as its ASCII name followed by a newline
//! (`FORWARD\n`, `LEFT\n`, `RIGHT\n`, `STOP\n`). The motor controller on the
//! other end needs no acknowledgement, so links are write-only.

use crate::command::Command;
use crate::error::{Error, Result};
use crate::transport::{MockTransport, Transport};

/// Destination for motion commands.
pub trait ActuatorLink: Send {
    /// Transmit one command. Fails with `NotConnected` when the link is down.
    fn send(&mut self, command: Command) -> Result<()>;

    /// Whether the last open or send succeeded.
    fn is_connected(&self) -> bool;

    /// Close and reopen the underlying transport.
    fn reconnect(&mut self) -> Result<()>;

    /// Release the transport. Best-effort, never fails.
    fn close(&mut self);
}

impl<L: ActuatorLink + ?Sized> ActuatorLink for Box<L> {
    fn send(&mut self, command: Command) -> Result<()> {
        (**self).send(command)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn reconnect(&mut self) -> Result<()> {
        (**self).reconnect()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Wire encoding of a command.
pub fn encode_command(command: Command) -> Vec<u8> {
    format!("{}\n", command.as_str()).into_bytes()
}

/// Write one encoded command and flush it.
pub fn write_command<T: Transport + ?Sized>(transport: &mut T, command: Command) -> Result<()> {
    transport.write_all(&encode_command(command))?;
    transport.flush()
}

#[cfg(feature = "serial")]
pub use serial_link::{SerialLink, SerialSettings};

#[cfg(feature = "serial")]
mod serial_link {
    use super::*;
    use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
    use std::io::Write;
    use std::time::Duration;

    impl Transport for Box<dyn SerialPort> {
        fn write(&mut self, data: &[u8]) -> Result<usize> {
            Ok(Write::write(self, data)?)
        }

        fn flush(&mut self) -> Result<()> {
            Ok(Write::flush(self)?)
        }
    }

    /// Serial port parameters for the motor controller
    #[derive(Debug, Clone, PartialEq)]
    pub struct SerialSettings {
        pub port: String,
        pub baud_rate: u32,
        pub timeout: Duration,
        /// Wait after opening; the controller resets when the port opens
        pub settle: Duration,
    }

    impl Default for SerialSettings {
        fn default() -> Self {
            Self {
                port: "/dev/ttyUSB0".to_string(),
                baud_rate: 9600,
                timeout: Duration::from_secs(1),
                settle: Duration::from_secs(2),
            }
        }
    }

    /// Actuator link over a serial port, 8N1 without flow control.
    ///
    /// A failed open leaves the link disconnected instead of returning an
    /// error, so the control loop can run in simulation.
    pub struct SerialLink {
        settings: SerialSettings,
        port: Option<Box<dyn SerialPort>>,
    }

    impl SerialLink {
        pub fn open(settings: SerialSettings) -> Self {
            let mut link = Self {
                settings,
                port: None,
            };
            if let Err(e) = link.connect() {
                log::error!(
                    "Actuator connection to {} failed: {}; running without actuator",
                    link.settings.port,
                    e
                );
            }
            link
        }

        pub fn settings(&self) -> &SerialSettings {
            &self.settings
        }

        fn connect(&mut self) -> Result<()> {
            let port = serialport::new(&self.settings.port, self.settings.baud_rate)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(self.settings.timeout)
                .open()?;
            if !self.settings.settle.is_zero() {
                std::thread::sleep(self.settings.settle);
            }
            self.port = Some(port);
            log::info!(
                "Actuator connected on {} at {} baud",
                self.settings.port,
                self.settings.baud_rate
            );
            Ok(())
        }
    }

    impl ActuatorLink for SerialLink {
        fn send(&mut self, command: Command) -> Result<()> {
            let port = self.port.as_mut().ok_or(Error::NotConnected)?;
            if let Err(e) = write_command(port, command) {
                self.port = None;
                return Err(e);
            }
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.port.is_some()
        }

        fn reconnect(&mut self) -> Result<()> {
            log::info!("Reconnecting actuator on {}", self.settings.port);
            self.close();
            self.connect()
        }

        fn close(&mut self) {
            if let Some(mut port) = self.port.take() {
                match write_command(&mut port, Command::Stop) {
                    Ok(()) => log::info!("Actuator connection closed"),
                    Err(e) => log::warn!("Error sending STOP while closing actuator: {}", e),
                }
            }
        }
    }
}

/// In-memory actuator link for tests and dry runs.
///
/// Lines written while connected land in the shared [`MockTransport`];
/// clone the transport handle to inspect them after handing the link away.
pub struct MockLink {
    transport: MockTransport,
    connected: bool,
    reconnect_ok: bool,
    reconnect_attempts: usize,
    close_calls: usize,
}

impl MockLink {
    /// A connected link.
    pub fn new() -> Self {
        Self::with_transport(MockTransport::new(), true)
    }

    /// A link that starts disconnected, as after a failed open.
    pub fn disconnected() -> Self {
        Self::with_transport(MockTransport::new(), false)
    }

    pub fn with_transport(transport: MockTransport, connected: bool) -> Self {
        Self {
            transport,
            connected,
            reconnect_ok: true,
            reconnect_attempts: 0,
            close_calls: 0,
        }
    }

    /// Shared handle to the recorded output.
    pub fn transport(&self) -> MockTransport {
        self.transport.clone()
    }

    /// Transmitted command lines.
    pub fn sent_lines(&self) -> Vec<String> {
        self.transport.written_lines()
    }

    /// Whether the next `reconnect` succeeds.
    pub fn set_reconnect_ok(&mut self, ok: bool) {
        self.reconnect_ok = ok;
    }

    pub fn reconnect_attempts(&self) -> usize {
        self.reconnect_attempts
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls
    }
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorLink for MockLink {
    fn send(&mut self, command: Command) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        if let Err(e) = write_command(&mut self.transport, command) {
            self.connected = false;
            return Err(e);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn reconnect(&mut self) -> Result<()> {
        self.reconnect_attempts += 1;
        self.close();
        if self.reconnect_ok {
            self.transport.set_fail_writes(false);
            self.connected = true;
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    fn close(&mut self) {
        self.close_calls += 1;
        if self.connected {
            let _ = write_command(&mut self.transport, Command::Stop);
            self.connected = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_command() {
        assert_eq!(encode_command(Command::Forward), b"FORWARD\n");
        assert_eq!(encode_command(Command::Stop), b"STOP\n");
    }

    #[test]
    fn test_mock_link_records_lines() {
        let mut link = MockLink::new();
        link.send(Command::Left).unwrap();
        link.send(Command::Right).unwrap();
        assert_eq!(link.sent_lines(), vec!["LEFT", "RIGHT"]);
    }

    #[test]
    fn test_mock_link_failure_disconnects() {
        let mut link = MockLink::new();
        link.transport().set_fail_writes(true);
        assert!(link.send(Command::Forward).is_err());
        assert!(!link.is_connected());
        assert!(matches!(link.send(Command::Forward), Err(Error::NotConnected)));
    }

    #[test]
    fn test_mock_link_close_sends_stop_once() {
        let mut link = MockLink::new();
        link.close();
        link.close();
        assert_eq!(link.sent_lines(), vec!["STOP"]);
        assert!(!link.is_connected());
        assert_eq!(link.close_calls(), 2);
    }

    #[test]
    fn test_boxed_link_delegates() {
        let mock = MockLink::new();
        let transport = mock.transport();
        let mut link: Box<dyn ActuatorLink> = Box::new(mock);
        link.send(Command::Forward).unwrap();
        link.close();
        assert!(!link.is_connected());
        assert_eq!(transport.written_lines(), vec!["FORWARD", "STOP"]);
    }

    #[test]
    fn test_mock_link_reconnect() {
        let mut link = MockLink::disconnected();
        link.set_reconnect_ok(false);
        assert!(link.reconnect().is_err());
        assert!(!link.is_connected());

        link.set_reconnect_ok(true);
        link.reconnect().unwrap();
        assert!(link.is_connected());
        assert_eq!(link.reconnect_attempts(), 2);
    }
}
