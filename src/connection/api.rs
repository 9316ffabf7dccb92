// src/connection/api.rs
// Status-code interface for collaborators that treat the handle as an
// optional reference and expect `-1` from failed transfers.

use super::{ConnectionError, ConnectionHandle, ListenerConfig, TuningReport};

/// Returned by [`send`] and [`receive`] on misuse or I/O failure.
pub const SEND_RECV_ERROR: isize = -1;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid arguments")]
    InvalidArgument,

    #[error("Connection failed: {0}")]
    ConnectFailed(#[source] ConnectionError),
}

impl From<ConnectionError> for ApiError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::InvalidArgument(_) => ApiError::InvalidArgument,
            other => ApiError::ConnectFailed(other),
        }
    }
}

pub fn initialize_listener(
    handle: Option<&mut ConnectionHandle>,
    config: &ListenerConfig,
) -> Result<(), ApiError> {
    let handle = handle.ok_or(ApiError::InvalidArgument)?;
    handle.initialize_listener(config)?;
    Ok(())
}

pub fn accept_client(handle: Option<&mut ConnectionHandle>) -> Result<(), ApiError> {
    let handle = handle.ok_or(ApiError::InvalidArgument)?;
    handle.accept_client()?;
    Ok(())
}

pub fn configure_client_socket(handle: Option<&ConnectionHandle>) -> TuningReport {
    handle.map(ConnectionHandle::configure_client_socket).unwrap_or_default()
}

pub fn send(handle: &ConnectionHandle, buf: Option<&[u8]>) -> isize {
    if !handle.is_initialized() {
        return SEND_RECV_ERROR;
    }
    let Some(buf) = buf else {
        return SEND_RECV_ERROR;
    };
    handle.send(buf).map_or(SEND_RECV_ERROR, to_status)
}

pub fn receive(handle: &ConnectionHandle, buf: Option<&mut [u8]>, received: usize) -> isize {
    if !handle.is_initialized() {
        return SEND_RECV_ERROR;
    }
    let Some(buf) = buf else {
        return SEND_RECV_ERROR;
    };
    handle.receive(buf, received).map_or(SEND_RECV_ERROR, to_status)
}

pub fn cleanup_client(handle: Option<&mut ConnectionHandle>) {
    if let Some(handle) = handle {
        handle.cleanup_client();
    }
}

pub fn cleanup_all(handle: Option<&mut ConnectionHandle>) {
    if let Some(handle) = handle {
        handle.cleanup_all();
    }
}

// slices never exceed isize::MAX bytes
fn to_status(count: usize) -> isize {
    isize::try_from(count).unwrap_or(SEND_RECV_ERROR)
}
