// src/connection/error.rs

use std::fmt;
use std::io;

/// OS primitive that failed while opening or accepting on the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Create,
    Bind,
    Listen,
    Accept,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Create => "socket create",
            Stage::Bind => "bind",
            Stage::Listen => "listen",
            Stage::Accept => "accept",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("Connect failed during {stage}: {source}")]
    ConnectFailed {
        stage: Stage,
        #[source]
        source: io::Error,
    },

    #[error("Listener is not initialized")]
    NotListening,

    #[error("Connection handle is not initialized")]
    NotConnected,

    #[error("Receive buffer has no room left")]
    BufferFull,

    #[error("Socket I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ConnectionError {
    pub(crate) fn connect_failed(stage: Stage, source: io::Error) -> Self {
        ConnectionError::ConnectFailed { stage, source }
    }

    /// True for failures that leave the endpoint without a usable listener or client.
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            ConnectionError::ConnectFailed { .. } | ConnectionError::NotListening
        )
    }
}
