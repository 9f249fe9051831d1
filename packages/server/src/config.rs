//! Server configuration.

use std::time::Duration;

use thiserror::Error;

use crate::{
    infrastructure::room_hub::{DEFAULT_COMMAND_CAPACITY, DEFAULT_GRACE_PERIOD, HubConfig},
    usecase::DEFAULT_OUTBOUND_QUEUE_CAPACITY,
};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CHAT_HISTORY_CAPACITY: usize = 1000;

/// A joining connection is sent `user_joined` and `user_list` back to back
pub const MIN_OUTBOUND_QUEUE_CAPACITY: usize = 2;

/// Per-connection I/O deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    /// Maximum silence from the client before the connection is dropped
    pub read_timeout: Duration,
    /// Deadline for a single outbound write
    pub write_timeout: Duration,
    /// Ping interval when there is nothing else to send
    pub keepalive_interval: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(10),
            keepalive_interval: Duration::from_secs(54),
        }
    }
}

/// Everything `Server` needs to start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub grace_period: Duration,
    pub timings: SessionTimings,
    pub outbound_queue_capacity: usize,
    pub command_capacity: usize,
    pub chat_history_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            grace_period: DEFAULT_GRACE_PERIOD,
            timings: SessionTimings::default(),
            outbound_queue_capacity: DEFAULT_OUTBOUND_QUEUE_CAPACITY,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            chat_history_capacity: DEFAULT_CHAT_HISTORY_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be at least 1")]
    ZeroCapacity(&'static str),

    #[error("outbound queue capacity must be at least {min}, got {actual}")]
    OutboundQueueTooSmall { min: usize, actual: usize },

    #[error("keepalive interval ({keepalive:?}) must be shorter than the read timeout ({read:?})")]
    KeepaliveTooLong { keepalive: Duration, read: Duration },

    #[error("{0} must not be zero")]
    ZeroDuration(&'static str),
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, capacity) in [
            ("outbound queue capacity", self.outbound_queue_capacity),
            ("command queue capacity", self.command_capacity),
            ("chat history capacity", self.chat_history_capacity),
        ] {
            if capacity == 0 {
                return Err(ConfigError::ZeroCapacity(name));
            }
        }

        if self.outbound_queue_capacity < MIN_OUTBOUND_QUEUE_CAPACITY {
            return Err(ConfigError::OutboundQueueTooSmall {
                min: MIN_OUTBOUND_QUEUE_CAPACITY,
                actual: self.outbound_queue_capacity,
            });
        }

        let timings = &self.timings;
        for (name, duration) in [
            ("read timeout", timings.read_timeout),
            ("write timeout", timings.write_timeout),
            ("keepalive interval", timings.keepalive_interval),
        ] {
            if duration.is_zero() {
                return Err(ConfigError::ZeroDuration(name));
            }
        }

        if timings.keepalive_interval >= timings.read_timeout {
            return Err(ConfigError::KeepaliveTooLong {
                keepalive: timings.keepalive_interval,
                read: timings.read_timeout,
            });
        }

        Ok(())
    }

    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            grace_period: self.grace_period,
            command_capacity: self.command_capacity,
        }
    }
}
