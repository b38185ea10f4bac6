//! In-process transport for tests and same-process wiring.

use parking_lot::Mutex;

use super::{ReadyState, Transport, TransportError, WireFrame};

/// A transport backed by an in-memory frame buffer.
///
/// Sent frames are recorded and can be drained by the test (or by a pump task
/// shuttling them into another peer's `handle_message`). Ready state is fully
/// scriptable, and sends can be made to fail to exercise error paths.
///
/// # Example
///
/// ```
/// use duorpc_common::transport::{MemoryTransport, Transport, WireFrame};
///
/// let transport = MemoryTransport::open();
/// transport.send(WireFrame::Text("hello".into())).unwrap();
/// assert_eq!(transport.take_sent().len(), 1);
/// ```
pub struct MemoryTransport {
    state: Mutex<ReadyState>,
    sent: Mutex<Vec<WireFrame>>,
    fail_sends: Mutex<Option<String>>,
    last_close: Mutex<Option<(Option<u16>, Option<String>)>>,
}

impl MemoryTransport {
    /// Creates a transport already in the `Open` state.
    pub fn open() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::with_state(ReadyState::Open))
    }

    /// Creates a transport in the given state.
    pub fn with_state(state: ReadyState) -> Self {
        Self {
            state: Mutex::new(state),
            sent: Mutex::new(Vec::new()),
            fail_sends: Mutex::new(None),
            last_close: Mutex::new(None),
        }
    }

    /// Moves the transport to a new state.
    pub fn set_ready_state(&self, state: ReadyState) {
        *self.state.lock() = state;
    }

    /// Makes every subsequent `send` fail with the given reason.
    pub fn fail_sends(&self, reason: impl Into<String>) {
        *self.fail_sends.lock() = Some(reason.into());
    }

    /// Number of frames sent so far.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Drains and returns all recorded frames.
    pub fn take_sent(&self) -> Vec<WireFrame> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// The code/reason of the last `close` call, if any.
    pub fn last_close(&self) -> Option<(Option<u16>, Option<String>)> {
        self.last_close.lock().clone()
    }
}

impl Transport for MemoryTransport {
    fn ready_state(&self) -> ReadyState {
        *self.state.lock()
    }

    fn send(&self, frame: WireFrame) -> Result<(), TransportError> {
        if let Some(reason) = self.fail_sends.lock().clone() {
            return Err(TransportError::SendFailed(reason));
        }
        let state = *self.state.lock();
        if state != ReadyState::Open {
            return Err(TransportError::NotOpen(state));
        }
        self.sent.lock().push(frame);
        Ok(())
    }

    fn close(&self, code: Option<u16>, reason: Option<&str>) {
        *self.state.lock() = ReadyState::Closed;
        *self.last_close.lock() = Some((code, reason.map(str::to_owned)));
    }
}
