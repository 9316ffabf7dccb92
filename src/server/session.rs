// ────────────────────────────────
// src/server/session.rs
// Blocking driver: one listener, one client at a time.
// ────────────────────────────────

use super::handler::Responder;
use crate::config::EndpointConfig;
use crate::connection::{ClientTuning, ConnectionError, ConnectionHandle, InterruptHandle};
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct InterruptState {
    stopping: bool,
    client: Option<InterruptHandle>,
}

/// Stop request shared with a running [`SessionRunner`], together with the
/// interrupt handle of the client it is serving.
///
/// Publishing a client and requesting a stop take the same lock, so a
/// client accepted concurrently with `stop` is either interrupted by it or
/// never reaches the exchange.
#[derive(Debug, Clone, Default)]
pub struct ClientInterrupt {
    state: Arc<Mutex<InterruptState>>,
}

impl ClientInterrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the runner as stopping and wake the current client, if any.
    /// The listener is not touched.
    pub fn stop(&self) {
        let mut state = self.lock();
        state.stopping = true;
        if let Some(client) = state.client.as_ref() {
            client.interrupt();
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.lock().stopping
    }

    // false once stopping; the handle is then dropped unpublished
    fn publish(&self, client: Option<InterruptHandle>) -> bool {
        let mut state = self.lock();
        if state.stopping {
            return false;
        }
        state.client = client;
        true
    }

    fn clear(&self) {
        self.lock().client.take();
    }

    fn lock(&self) -> MutexGuard<'_, InterruptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Responded { received: usize, sent: usize },
    PeerClosed { received: usize },
    RequestTooLarge { received: usize },
    /// A stop was requested before the exchange started.
    Interrupted,
}

pub struct SessionRunner {
    config: EndpointConfig,
    tuning: ClientTuning,
    handle: ConnectionHandle,
    client_interrupt: Option<ClientInterrupt>,
}

impl SessionRunner {
    pub fn new(config: EndpointConfig) -> Self {
        let tuning = config.tuning();
        Self {
            config,
            tuning,
            handle: ConnectionHandle::new(),
            client_interrupt: None,
        }
    }

    /// Publish each accepted client's interrupt handle into `interrupt`
    /// and honour its stop requests.
    pub fn with_client_interrupt(mut self, interrupt: ClientInterrupt) -> Self {
        self.client_interrupt = Some(interrupt);
        self
    }

    pub fn start(&mut self) -> Result<(), ConnectionError> {
        self.handle.initialize_listener(&self.config.listener())
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.handle.local_addr()
    }

    pub fn interrupt_handle(&self) -> Result<InterruptHandle, ConnectionError> {
        self.handle.interrupt_handle()
    }

    /// Accept one client, answer it, drop it. The listener stays open.
    pub fn serve_one<R: Responder>(
        &mut self,
        responder: &mut R,
    ) -> Result<SessionOutcome, ConnectionError> {
        self.handle.accept_client()?;

        let report = self.handle.configure_client_socket_with(&self.tuning);
        if !report.is_clean() {
            debug!(failed = report.failed.len(), "client tuning incomplete");
        }

        if !self.publish_client_interrupt() {
            info!("stop requested, dropping client before exchange");
            self.handle.cleanup_client();
            return Ok(SessionOutcome::Interrupted);
        }
        let result = self.exchange(responder);
        self.clear_client_interrupt();
        self.handle.cleanup_client();

        if let Ok(outcome) = &result {
            info!(?outcome, "session finished");
        }
        result
    }

    pub fn shutdown(&mut self) {
        self.clear_client_interrupt();
        self.handle.cleanup_all();
    }

    fn exchange<R: Responder>(&self, responder: &mut R) -> Result<SessionOutcome, ConnectionError> {
        let mut buf = vec![0u8; self.config.receive_buffer_size];
        let mut received = 0;

        loop {
            match self.handle.receive(&mut buf, received) {
                Ok(0) => return Ok(SessionOutcome::PeerClosed { received }),
                Ok(read) => {
                    received += read;
                    if let Some(reply) = responder.respond(&buf[..received]) {
                        let sent = send_all(&self.handle, &reply)?;
                        return Ok(SessionOutcome::Responded { received, sent });
                    }
                }
                Err(ConnectionError::BufferFull) => {
                    warn!(received, "request does not fit the receive buffer");
                    return Ok(SessionOutcome::RequestTooLarge { received });
                }
                Err(ConnectionError::Io(err)) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
    }

    fn publish_client_interrupt(&self) -> bool {
        let Some(interrupt) = &self.client_interrupt else {
            return true;
        };
        let client = match self.handle.interrupt_handle() {
            Ok(client) => Some(client),
            Err(err) => {
                debug!(%err, "client interrupt handle unavailable");
                None
            }
        };
        interrupt.publish(client)
    }

    // The duplicate keeps the connection open, so it must go before cleanup.
    fn clear_client_interrupt(&self) {
        if let Some(interrupt) = &self.client_interrupt {
            interrupt.clear();
        }
    }
}

/// Send `buf` completely, looping over partial writes.
pub fn send_all(handle: &ConnectionHandle, mut buf: &[u8]) -> Result<usize, ConnectionError> {
    let total = buf.len();
    while !buf.is_empty() {
        match handle.send(buf) {
            Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
            Ok(written) => buf = &buf[written..],
            Err(ConnectionError::Io(err)) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(total)
}
