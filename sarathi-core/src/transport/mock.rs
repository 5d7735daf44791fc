//! Mock transport for testing

use super::Transport;
use crate::error::Result;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory transport that records writes and can simulate a dead link
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Default)]
struct MockTransportInner {
    write_buffer: Vec<u8>,
    fail_writes: bool,
    write_calls: usize,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        // A poisoned buffer is still usable for inspection
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get all written data
    pub fn get_written(&self) -> Vec<u8> {
        self.lock().write_buffer.clone()
    }

    /// Written data split into newline-terminated lines
    pub fn written_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.lock().write_buffer)
            .lines()
            .map(String::from)
            .collect()
    }

    /// Clear written data
    pub fn clear_written(&self) {
        self.lock().write_buffer.clear();
    }

    /// Make subsequent writes fail with a broken pipe
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub fn fails_writes(&self) -> bool {
        self.lock().fail_writes
    }

    /// Number of write calls, including failed ones
    pub fn write_calls(&self) -> usize {
        self.lock().write_calls
    }
}

impl Transport for MockTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let mut inner = self.lock();
        inner.write_calls += 1;
        if inner.fail_writes {
            return Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe).into());
        }
        inner.write_buffer.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_writes_across_clones() {
        let observer = MockTransport::new();
        let mut transport = observer.clone();
        transport.write_all(b"STOP\n").unwrap();
        transport.write_all(b"LEFT\n").unwrap();
        assert_eq!(observer.get_written(), b"STOP\nLEFT\n");
        assert_eq!(observer.written_lines(), vec!["STOP", "LEFT"]);

        observer.clear_written();
        assert!(observer.get_written().is_empty());
    }

    #[test]
    fn test_injected_failure() {
        let mut transport = MockTransport::new();
        transport.set_fail_writes(true);
        assert!(transport.write_all(b"FORWARD\n").is_err());
        assert!(transport.get_written().is_empty());
        assert_eq!(transport.write_calls(), 1);
    }
}
