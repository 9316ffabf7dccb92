// ────────────────────────────────
// src/connection/handle.rs
// One listening socket plus at most one accepted client.
// ────────────────────────────────

use super::error::{ConnectionError, Stage};
use super::interrupt::InterruptHandle;
use super::tuning::{ClientTuning, TuningReport};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::Read;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tracing::{debug, error, info, warn};

/// Well-known port of the provisioning HTTP endpoint.
pub const HTTP_PORT: u16 = 8888;

/// At most one pending connection is ever expected.
pub const LISTEN_BACKLOG: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerConfig {
    pub bind_address: Ipv4Addr,
    pub port: u16,
    pub backlog: i32,
    pub reuse_address: bool,
}

impl ListenerConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.bind_address, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: Ipv4Addr::UNSPECIFIED,
            port: HTTP_PORT,
            backlog: LISTEN_BACKLOG,
            reuse_address: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Listening,
    Connected,
}

/// Owner of the endpoint's two descriptors.
///
/// `None` in either slot means "no descriptor". Send and receive are only
/// permitted while both slots are populated. Every close path goes through
/// `Option::take`, so a descriptor is closed at most once no matter how
/// many cleanup calls race in from different triggers.
///
/// The handle is meant for a single owner; operations are blocking and
/// there are no internal timeouts. Use [`ConnectionHandle::interrupt_handle`]
/// to unblock a pending accept or receive from another thread.
#[derive(Debug, Default)]
pub struct ConnectionHandle {
    listen: Option<Socket>,
    accept: Option<Socket>,
}

impl ConnectionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        match (&self.listen, &self.accept) {
            (Some(_), Some(_)) => ConnectionState::Connected,
            (Some(_), None) => ConnectionState::Listening,
            (None, _) => ConnectionState::Uninitialized,
        }
    }

    /// Both the listener and a client are present.
    pub fn is_initialized(&self) -> bool {
        self.listen.is_some() && self.accept.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listen.is_some()
    }

    pub fn has_client(&self) -> bool {
        self.accept.is_some()
    }

    /// Address the listener is bound to. Useful when binding port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listen
            .as_ref()
            .and_then(|socket| socket.local_addr().ok())
            .and_then(|addr| addr.as_socket())
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.accept
            .as_ref()
            .and_then(|socket| socket.peer_addr().ok())
            .and_then(|addr| addr.as_socket())
    }

    /// Open the listening socket.
    ///
    /// Anything the handle still holds from a previous session is closed
    /// first. On failure the handle is left uninitialized and the partial
    /// socket has already been released.
    pub fn initialize_listener(&mut self, config: &ListenerConfig) -> Result<(), ConnectionError> {
        self.cleanup_all();

        let socket = open_listener(config)?;
        info!(addr = %config.socket_addr(), backlog = config.backlog, "listen socket opened");
        self.listen = Some(socket);
        Ok(())
    }

    /// Block until a client connects.
    pub fn accept_client(&mut self) -> Result<(), ConnectionError> {
        let listener = self.listen.as_ref().ok_or(ConnectionError::NotListening)?;

        let (client, peer) = listener.accept().map_err(|err| {
            warn!(%err, "accept failed");
            ConnectionError::connect_failed(Stage::Accept, err)
        })?;

        match peer.as_socket() {
            Some(peer) => info!(%peer, "client accepted"),
            None => info!("client accepted"),
        }

        if self.accept.replace(client).is_some() {
            info!("closed stale accept socket");
        }
        Ok(())
    }

    /// Apply the default keepalive and no-delay tunings to the client.
    pub fn configure_client_socket(&self) -> TuningReport {
        self.configure_client_socket_with(&ClientTuning::default())
    }

    /// Apply `tuning` to the client. Does nothing unless the handle is
    /// initialized; individual option failures are logged, never returned.
    pub fn configure_client_socket_with(&self, tuning: &ClientTuning) -> TuningReport {
        match self.connected() {
            Ok(client) => tuning.apply(client),
            Err(_) => {
                debug!("skip client tuning: handle not initialized");
                TuningReport::default()
            }
        }
    }

    /// One send call on the client socket. May write fewer bytes than
    /// `buf.len()`; looping is up to the caller.
    pub fn send(&self, buf: &[u8]) -> Result<usize, ConnectionError> {
        let client = self.connected()?;
        let written = client.send(buf)?;
        debug!(requested = buf.len(), written, "sent");
        Ok(written)
    }

    /// One receive call into `buf[received..buf.len() - 1]`.
    ///
    /// The last byte of `buf` is never written; it is left for the caller
    /// to place a terminator after the accumulated data. `Ok(0)` means the
    /// peer closed the connection.
    pub fn receive(&self, buf: &mut [u8], received: usize) -> Result<usize, ConnectionError> {
        let client = self.connected()?;
        if received >= buf.len() {
            return Err(ConnectionError::InvalidArgument(
                "received offset outside receive buffer",
            ));
        }
        let end = buf.len() - 1;
        if received == end {
            return Err(ConnectionError::BufferFull);
        }

        let mut reader: &Socket = client;
        let read = reader.read(&mut buf[received..end])?;
        debug!(offset = received, read, "received");
        Ok(read)
    }

    /// Drop the client and keep listening.
    pub fn cleanup_client(&mut self) {
        if let Some(client) = self.accept.take() {
            info!("close accept socket");
            drop(client);
        }
    }

    /// Close the listener, then the client. Safe to call repeatedly.
    pub fn cleanup_all(&mut self) {
        if let Some(listener) = self.listen.take() {
            info!("close listen socket");
            drop(listener);
        }
        // the peer may already be gone; the slot still owns the descriptor
        self.cleanup_client();
    }

    /// Duplicate the current descriptors so another thread can unblock a
    /// pending accept or receive on this handle.
    pub fn interrupt_handle(&self) -> Result<InterruptHandle, ConnectionError> {
        let listen = self.listen.as_ref().map(Socket::try_clone).transpose()?;
        let accept = self.accept.as_ref().map(Socket::try_clone).transpose()?;
        Ok(InterruptHandle::new(listen, accept))
    }

    fn connected(&self) -> Result<&Socket, ConnectionError> {
        match (&self.listen, &self.accept) {
            (Some(_), Some(client)) => Ok(client),
            _ => Err(ConnectionError::NotConnected),
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.cleanup_all();
    }
}

fn open_listener(config: &ListenerConfig) -> Result<Socket, ConnectionError> {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).map_err(|err| {
        error!(%err, "Unable to create socket");
        ConnectionError::connect_failed(Stage::Create, err)
    })?;

    if config.reuse_address {
        if let Err(err) = socket.set_reuse_address(true) {
            info!(%err, "reuse socket isn't supported");
        }
    }

    let addr = SockAddr::from(config.socket_addr());
    socket.bind(&addr).map_err(|err| {
        error!(addr = %config.socket_addr(), %err, "Socket unable to bind");
        ConnectionError::connect_failed(Stage::Bind, err)
    })?;

    socket.listen(config.backlog).map_err(|err| {
        error!(%err, "Error occurred during listen");
        ConnectionError::connect_failed(Stage::Listen, err)
    })?;

    Ok(socket)
}
