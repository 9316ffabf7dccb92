// src/connection/interrupt.rs

use socket2::Socket;
use std::net::Shutdown;
use tracing::debug;

/// Duplicated descriptors used to wake a blocked accept or receive.
///
/// Shutting down a duplicate affects the shared socket, so the blocked
/// call on the owning [`ConnectionHandle`](super::ConnectionHandle)
/// returns with an error (accept) or end-of-stream (receive). The owner
/// still has to run its own cleanup. The listening port stays bound until
/// both the owner and this handle have dropped their descriptors.
///
/// Waking a blocked accept this way relies on Linux semantics for
/// `shutdown` on a listening socket.
#[derive(Debug)]
pub struct InterruptHandle {
    listen: Option<Socket>,
    accept: Option<Socket>,
}

impl InterruptHandle {
    pub(crate) fn new(listen: Option<Socket>, accept: Option<Socket>) -> Self {
        Self { listen, accept }
    }

    pub fn interrupt(&self) {
        let slots = [("listen", &self.listen), ("accept", &self.accept)];
        for (name, slot) in slots {
            if let Some(socket) = slot {
                match socket.shutdown(Shutdown::Both) {
                    Ok(()) => debug!(socket = name, "socket interrupted"),
                    // already disconnected
                    Err(err) => debug!(socket = name, %err, "interrupt ignored"),
                }
            }
        }
    }
}
