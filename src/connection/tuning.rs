// src/connection/tuning.rs
// Transport tunings applied to an accepted client socket.

use socket2::{Socket, TcpKeepalive};
use std::fmt;
use std::io;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_KEEPALIVE_IDLE: Duration = Duration::from_secs(10);
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_KEEPALIVE_RETRIES: u32 = 3;

/// One socket option together with the value to set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketTuning {
    KeepAlive(bool),
    KeepAliveIdle(Duration),
    KeepAliveInterval(Duration),
    KeepAliveRetries(u32),
    NoDelay(bool),
}

impl SocketTuning {
    pub fn name(&self) -> &'static str {
        match self {
            SocketTuning::KeepAlive(_) => "keep-alive",
            SocketTuning::KeepAliveIdle(_) => "keep-idle",
            SocketTuning::KeepAliveInterval(_) => "keep-interval",
            SocketTuning::KeepAliveRetries(_) => "keep-count",
            SocketTuning::NoDelay(_) => "no-delay",
        }
    }

    // Each keepalive parameter goes through its own TcpKeepalive so that a
    // rejected value only affects that one option.
    fn apply(&self, socket: &Socket) -> io::Result<()> {
        match *self {
            SocketTuning::KeepAlive(on) => socket.set_keepalive(on),
            SocketTuning::KeepAliveIdle(idle) => {
                socket.set_tcp_keepalive(&TcpKeepalive::new().with_time(idle))
            }
            SocketTuning::KeepAliveInterval(interval) => set_keepalive_interval(socket, interval),
            SocketTuning::KeepAliveRetries(retries) => set_keepalive_retries(socket, retries),
            SocketTuning::NoDelay(on) => socket.set_tcp_nodelay(on),
        }
    }
}

impl fmt::Display for SocketTuning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketTuning::KeepAlive(on) | SocketTuning::NoDelay(on) => {
                write!(f, "{}={}", self.name(), on)
            }
            SocketTuning::KeepAliveIdle(d) | SocketTuning::KeepAliveInterval(d) => {
                write!(f, "{}={}s", self.name(), d.as_secs())
            }
            SocketTuning::KeepAliveRetries(n) => write!(f, "{}={}", self.name(), n),
        }
    }
}

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
))]
fn set_keepalive_interval(socket: &Socket, interval: Duration) -> io::Result<()> {
    socket.set_tcp_keepalive(&TcpKeepalive::new().with_interval(interval))
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
)))]
fn set_keepalive_interval(_socket: &Socket, _interval: Duration) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "keepalive interval is not configurable on this platform",
    ))
}

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
))]
fn set_keepalive_retries(socket: &Socket, retries: u32) -> io::Result<()> {
    socket.set_tcp_keepalive(&TcpKeepalive::new().with_retries(retries))
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
)))]
fn set_keepalive_retries(_socket: &Socket, _retries: u32) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "keepalive probe count is not configurable on this platform",
    ))
}

/// Ordered list of best-effort tunings for the accepted client.
///
/// The defaults target a short provisioning window: a silent peer is
/// declared dead within `idle + interval * retries` (25 seconds), and
/// Nagle coalescing is disabled because responses fit in one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTuning {
    steps: Vec<SocketTuning>,
}

impl ClientTuning {
    pub fn new(idle: Duration, interval: Duration, retries: u32, nodelay: bool) -> Self {
        Self {
            steps: vec![
                SocketTuning::KeepAlive(true),
                SocketTuning::KeepAliveIdle(idle),
                SocketTuning::KeepAliveInterval(interval),
                SocketTuning::KeepAliveRetries(retries),
                SocketTuning::NoDelay(nodelay),
            ],
        }
    }

    pub fn steps(&self) -> &[SocketTuning] {
        &self.steps
    }

    /// Upper bound between the last activity and the peer being declared dead.
    pub fn dead_peer_timeout(&self) -> Option<Duration> {
        let mut idle = None;
        let mut interval = None;
        let mut retries = None;
        for step in &self.steps {
            match *step {
                SocketTuning::KeepAlive(false) => return None,
                SocketTuning::KeepAliveIdle(d) => idle = Some(d),
                SocketTuning::KeepAliveInterval(d) => interval = Some(d),
                SocketTuning::KeepAliveRetries(n) => retries = Some(n),
                _ => {}
            }
        }
        Some(idle? + interval? * retries?)
    }

    /// Apply every step in order. A failing step is logged and skipped.
    pub fn apply(&self, socket: &Socket) -> TuningReport {
        let mut report = TuningReport::default();
        for step in &self.steps {
            match step.apply(socket) {
                Ok(()) => {
                    debug!(option = %step, "socket option applied");
                    report.applied += 1;
                }
                Err(err) => {
                    warn!(option = %step, %err, "socket set {} failed", step.name());
                    report.failed.push((*step, err.kind()));
                }
            }
        }
        report
    }
}

impl Default for ClientTuning {
    fn default() -> Self {
        Self::new(
            DEFAULT_KEEPALIVE_IDLE,
            DEFAULT_KEEPALIVE_INTERVAL,
            DEFAULT_KEEPALIVE_RETRIES,
            true,
        )
    }
}

/// Outcome of one `ClientTuning::apply` pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TuningReport {
    pub applied: usize,
    pub failed: Vec<(SocketTuning, io::ErrorKind)>,
}

impl TuningReport {
    pub fn attempted(&self) -> usize {
        self.applied + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tuning_order() {
        let tuning = ClientTuning::default();
        assert_eq!(
            tuning.steps(),
            &[
                SocketTuning::KeepAlive(true),
                SocketTuning::KeepAliveIdle(Duration::from_secs(10)),
                SocketTuning::KeepAliveInterval(Duration::from_secs(5)),
                SocketTuning::KeepAliveRetries(3),
                SocketTuning::NoDelay(true),
            ]
        );
    }

    #[test]
    fn dead_peer_timeout_covers_idle_and_every_probe() {
        assert_eq!(
            ClientTuning::default().dead_peer_timeout(),
            Some(Duration::from_secs(25))
        );
        let tuning = ClientTuning::new(Duration::from_secs(1), Duration::from_secs(2), 4, true);
        assert_eq!(tuning.dead_peer_timeout(), Some(Duration::from_secs(9)));
    }

    #[test]
    fn display_names_match_option() {
        assert_eq!(
            SocketTuning::KeepAliveIdle(Duration::from_secs(10)).to_string(),
            "keep-idle=10s"
        );
        assert_eq!(SocketTuning::NoDelay(true).to_string(), "no-delay=true");
        assert_eq!(SocketTuning::KeepAliveRetries(3).to_string(), "keep-count=3");
    }
}
