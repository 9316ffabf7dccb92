// src/config/models.rs
use crate::connection::{ClientTuning, ListenerConfig, HTTP_PORT, LISTEN_BACKLOG};
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub bind_address: Ipv4Addr,
    pub port: u16,
    pub backlog: i32,
    pub reuse_address: bool,
    pub nodelay: bool,
    pub keepalive: KeepaliveConfig,
    pub receive_buffer_size: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            bind_address: Ipv4Addr::UNSPECIFIED,
            port: HTTP_PORT,
            backlog: LISTEN_BACKLOG,
            reuse_address: true,
            nodelay: true,
            keepalive: KeepaliveConfig::default(),
            receive_buffer_size: 2048,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepaliveConfig {
    pub idle_secs: u64,
    pub interval_secs: u64,
    pub retries: u32,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            idle_secs: 10,
            interval_secs: 5,
            retries: 3,
        }
    }
}

impl KeepaliveConfig {
    pub fn idle(&self) -> Duration {
        Duration::from_secs(self.idle_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl EndpointConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.backlog >= 1, "backlog must be at least 1");
        ensure!(self.keepalive.idle_secs >= 1, "keepalive idle must be at least 1 second");
        ensure!(
            self.keepalive.interval_secs >= 1,
            "keepalive interval must be at least 1 second"
        );
        ensure!(self.keepalive.retries >= 1, "keepalive retries must be at least 1");
        // one payload byte plus the reserved terminator slot
        ensure!(
            self.receive_buffer_size >= 2,
            "receive_buffer_size must be at least 2 bytes"
        );
        Ok(())
    }

    pub fn listener(&self) -> ListenerConfig {
        ListenerConfig {
            bind_address: self.bind_address,
            port: self.port,
            backlog: self.backlog,
            reuse_address: self.reuse_address,
        }
    }

    pub fn tuning(&self) -> ClientTuning {
        ClientTuning::new(
            self.keepalive.idle(),
            self.keepalive.interval(),
            self.keepalive.retries,
            self.nodelay,
        )
    }
}
