//! Fan-out of outbound envelopes to every bound connection.
//!
//! An envelope is serialized once into a shared [`Frame`]; each recipient
//! gets a refcount bump. Delivery is best-effort: a closed or failing peer is
//! skipped and never stops delivery to the rest.

use std::sync::Arc;

use crate::connection_registry::{ConnectionRegistry, Frame};
use crate::protocol::ServerMessage;

/// Serialize an envelope into a frame, logging instead of failing.
pub fn frame(message: &ServerMessage<'_>) -> Option<Frame> {
    match message.encode() {
        Ok(text) => Some(Arc::from(text)),
        Err(e) => {
            tracing::warn!("Failed to encode envelope: {}", e);
            None
        }
    }
}

pub struct BroadcastBus<'a> {
    registry: &'a ConnectionRegistry,
}

impl<'a> BroadcastBus<'a> {
    pub fn new(registry: &'a ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Send `message` to every open connection. Returns how many peers the
    /// frame was queued for.
    pub fn publish(&self, message: &ServerMessage<'_>) -> usize {
        let Some(frame) = frame(message) else {
            return 0;
        };
        self.publish_frame(&frame)
    }

    pub fn publish_frame(&self, frame: &Frame) -> usize {
        let mut delivered = 0;
        for (conn, login) in self.registry.all() {
            if !conn.is_open() {
                continue;
            }
            if conn.send(Arc::clone(frame)) {
                delivered += 1;
            } else {
                tracing::debug!("Skipping closed connection {} ({})", conn.id(), login);
            }
        }
        delivered
    }
}
