//! The message-duplex transport contract a peer consumes.
//!
//! duorpc does not own sockets. The embedding runtime owns the connection
//! (nominally a WebSocket), delivers inbound frames to the peer, and hands the
//! peer a [`Transport`] handle for outbound frames and close. The peer only
//! observes readiness and calls `send`/`close`; reconnect and backoff policy
//! belong to the adapter behind this trait.
//!
//! # Components
//!
//! - [`Transport`]: the consumed contract (`ready_state` / `send` / `close`)
//! - [`ReadyState`]: the four-state connection lifecycle
//! - [`WireFrame`] / [`InboundFrame`]: outbound and inbound frame shapes
//! - [`MemoryTransport`](memory::MemoryTransport): in-process implementation
//!   for tests and same-process wiring

pub mod memory;

use thiserror::Error;

pub use memory::MemoryTransport;

/// Connection lifecycle state, mirroring the WebSocket readyState values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// The connection is being established.
    Connecting = 0,
    /// Frames can be sent.
    Open = 1,
    /// A close has started but not finished.
    Closing = 2,
    /// The connection is gone.
    Closed = 3,
}

/// An outbound frame in the codec's native shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireFrame {
    /// A text frame (JSON codec).
    Text(String),
    /// A binary frame (MessagePack / CBOR codecs).
    Binary(Vec<u8>),
}

impl WireFrame {
    /// The frame payload as bytes, regardless of shape.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            WireFrame::Text(text) => text.as_bytes(),
            WireFrame::Binary(bytes) => bytes,
        }
    }
}

/// An inbound frame as delivered by the embedding runtime.
///
/// Transports may deliver text, a single binary buffer, or a sequence of
/// binary chunks (fragmented frames). [`Protocol::decode_message`]
/// (crate::wire::Protocol::decode_message) normalizes all three before the
/// codec sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// A complete text frame.
    Text(String),
    /// A complete binary frame.
    Binary(Vec<u8>),
    /// A fragmented binary frame; chunk order is the wire order.
    Chunks(Vec<Vec<u8>>),
}

/// Failures raised by a transport on send.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport was not in the `Open` state.
    #[error("transport is not open (state {0:?})")]
    NotOpen(ReadyState),

    /// The transport accepted the frame but could not deliver it.
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// The message-duplex contract consumed by a peer.
///
/// Implementations wrap a real socket (or an in-process channel) and must be
/// cheap to share behind an `Arc`. `send` is synchronous by contract so a peer
/// can register a pending request and hand off the frame without a suspension
/// point between the two; adapters for async sockets buffer internally.
pub trait Transport: Send + Sync {
    /// Current connection state.
    fn ready_state(&self) -> ReadyState;

    /// Sends one frame. Fails if the transport is not open.
    fn send(&self, frame: WireFrame) -> Result<(), TransportError>;

    /// Starts closing the connection with an optional code and reason.
    fn close(&self, code: Option<u16>, reason: Option<&str>);
}

impl dyn Transport {
    /// True when frames can be sent.
    pub fn is_open(&self) -> bool {
        self.ready_state() == ReadyState::Open
    }
}
