//! Object-safe inbound frame routing.

use futures::future::BoxFuture;
use futures::FutureExt;

use duorpc_common::transport::InboundFrame;

use crate::peer::Peer;

/// Anything that can consume inbound frames for one connection.
///
/// A plain [`Peer`] is a sink; composition layers (durable completion
/// routing) implement it too, so supervisors can route frames without knowing
/// which layering is behind a connection.
pub trait MessageSink: Send + Sync {
    /// Decodes and dispatches one inbound frame.
    fn handle_message(&self, frame: InboundFrame) -> BoxFuture<'_, ()>;
}

impl MessageSink for Peer {
    fn handle_message(&self, frame: InboundFrame) -> BoxFuture<'_, ()> {
        Peer::handle_message(self, frame).boxed()
    }
}
