//! Mock badge reader link.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::mpsc;

use crate::error::{HardwareError, Result};
use crate::traits::Transport;

/// Simulated serial link fed from a [`MockTransportHandle`].
///
/// Bytes sent through the handle become readable in order. By default
/// [`flush_input`](Transport::flush_input) only counts the call and keeps
/// pending bytes, which lets a test queue a whole frame before the code
/// under test starts reading. Use [`with_flush_discards`](Self::with_flush_discards)
/// to model a real port that drops unread input on flush.
///
/// # Examples
///
/// ```
/// use latchkey_hardware::mock::MockTransport;
/// use latchkey_hardware::Transport;
///
/// let (mut transport, handle) = MockTransport::new();
/// handle.send_bytes(b"\n42\r").unwrap();
///
/// assert_eq!(transport.bytes_available().unwrap(), 4);
/// assert_eq!(transport.read_byte().unwrap(), Some(b'\n'));
/// ```
#[derive(Debug)]
pub struct MockTransport {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    pending: VecDeque<u8>,
    shared: Arc<Shared>,
    flush_discards: bool,
}

#[derive(Debug)]
struct Shared {
    open: AtomicBool,
    flushes: AtomicUsize,
}

impl MockTransport {
    /// Create an open mock link and its handle.
    pub fn new() -> (Self, MockTransportHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            open: AtomicBool::new(true),
            flushes: AtomicUsize::new(0),
        });

        let transport = Self {
            rx,
            pending: VecDeque::new(),
            shared: Arc::clone(&shared),
            flush_discards: false,
        };

        (transport, MockTransportHandle { tx, shared })
    }

    /// Make `flush_input` drop everything sent so far.
    pub fn with_flush_discards(mut self) -> Self {
        self.flush_discards = true;
        self
    }

    fn pull(&mut self) {
        while let Ok(chunk) = self.rx.try_recv() {
            self.pending.extend(chunk);
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(HardwareError::disconnected("mock reader"))
        }
    }
}

impl Transport for MockTransport {
    fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }

    fn bytes_available(&mut self) -> Result<usize> {
        self.ensure_open()?;
        self.pull();
        Ok(self.pending.len())
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        self.ensure_open()?;
        self.pull();
        Ok(self.pending.pop_front())
    }

    fn flush_input(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.shared.flushes.fetch_add(1, Ordering::SeqCst);
        if self.flush_discards {
            self.pull();
            self.pending.clear();
        }
        Ok(())
    }
}

/// Handle for feeding and breaking a [`MockTransport`].
///
/// Cloneable; every clone drives the same link.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    shared: Arc<Shared>,
}

impl MockTransportHandle {
    /// Queue bytes as if the reader had sent them.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport has been dropped.
    pub fn send_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.tx
            .send(bytes.to_vec())
            .map_err(|_| HardwareError::disconnected("mock reader dropped"))
    }

    /// Queue one `LF code CR` frame.
    pub fn send_frame(&self, code: &str) -> Result<()> {
        let mut frame = Vec::with_capacity(code.len() + 2);
        frame.push(b'\n');
        frame.extend_from_slice(code.as_bytes());
        frame.push(b'\r');
        self.send_bytes(&frame)
    }

    /// Simulate the reader going away. Every later call on the transport
    /// fails.
    pub fn disconnect(&self) {
        self.shared.open.store(false, Ordering::SeqCst);
    }

    /// Number of times the input was flushed.
    pub fn flush_count(&self) -> usize {
        self.shared.flushes.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_arrive_in_order() {
        let (mut transport, handle) = MockTransport::new();
        handle.send_bytes(b"ab").unwrap();
        handle.send_bytes(b"c").unwrap();

        let mut read = Vec::new();
        while let Some(b) = transport.read_byte().unwrap() {
            read.push(b);
        }
        assert_eq!(read, b"abc");
        assert_eq!(transport.bytes_available().unwrap(), 0);
    }

    #[test]
    fn test_flush_keeps_bytes_by_default() {
        let (mut transport, handle) = MockTransport::new();
        handle.send_frame("123").unwrap();

        transport.flush_input().unwrap();

        assert_eq!(handle.flush_count(), 1);
        assert_eq!(transport.bytes_available().unwrap(), 5);
    }

    #[test]
    fn test_flush_discards_when_configured() {
        let (transport, handle) = MockTransport::new();
        let mut transport = transport.with_flush_discards();
        handle.send_frame("123").unwrap();

        transport.flush_input().unwrap();
        assert_eq!(transport.bytes_available().unwrap(), 0);

        handle.send_bytes(b"x").unwrap();
        assert_eq!(transport.read_byte().unwrap(), Some(b'x'));
    }

    #[test]
    fn test_disconnect() {
        let (mut transport, handle) = MockTransport::new();
        assert!(transport.is_open());

        handle.disconnect();

        assert!(!transport.is_open());
        assert!(matches!(
            transport.read_byte(),
            Err(HardwareError::Disconnected { .. })
        ));
        assert!(transport.flush_input().is_err());
    }

    #[test]
    fn test_send_after_drop_fails() {
        let (transport, handle) = MockTransport::new();
        drop(transport);
        assert!(handle.send_bytes(b"x").is_err());
    }
}
