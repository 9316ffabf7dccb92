// src/connection/mod.rs
mod error;
mod handle;
mod interrupt;
mod tuning;

pub mod api;

pub use error::{ConnectionError, Stage};
pub use handle::{ConnectionHandle, ConnectionState, ListenerConfig, HTTP_PORT, LISTEN_BACKLOG};
pub use interrupt::InterruptHandle;
pub use tuning::{
    ClientTuning, SocketTuning, TuningReport, DEFAULT_KEEPALIVE_IDLE, DEFAULT_KEEPALIVE_INTERVAL,
    DEFAULT_KEEPALIVE_RETRIES,
};
