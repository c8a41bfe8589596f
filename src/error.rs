//! Error types.
//!
//! Dispatch itself never fails with an error: its result is an
//! [`Outcome`](crate::capability::Outcome). The errors here cover the event
//! channel, configuration loading and request routing.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to hand an event over to the event channel.
///
/// An error does not mean the reported value was wrong; the channel may be
/// disconnected or throttling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The underlying connection failed.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The channel refused the event because too many were sent in a short time.
    #[error("event '{action}' rate limited")]
    RateLimited { action: String },

    /// The event value could not be encoded into the envelope.
    #[error("event encoding failed: {0}")]
    Encoding(String),

    /// The channel no longer accepts events.
    #[error("event channel closed")]
    Closed,
}

/// Errors raised while loading a [`Config`](crate::config::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("device id must not be empty")]
    EmptyDeviceId,

    #[error("device '{0}' configured more than once")]
    DuplicateDevice(String),

    #[error("device '{device}' lists unknown capability '{action}'")]
    UnknownCapability { device: String, action: String },
}

/// Errors raised by [`DeviceManager`](crate::manager::DeviceManager) before a
/// request reaches any capability.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("request carries no deviceId")]
    MissingDeviceId,

    #[error("no device with id '{0}'")]
    UnknownDevice(String),

    #[error("malformed request: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("could not encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    // check, that the auto traits are available
    const fn is_normal<T: Sized + Send + Sync + Unpin>() {}

    #[test]
    const fn normal_types() {
        is_normal::<ChannelError>();
        is_normal::<ConfigError>();
        is_normal::<RouteError>();
    }

    #[test]
    fn channel_error_messages() {
        let err = ChannelError::RateLimited {
            action: "selectInput".into(),
        };
        assert_eq!(err.to_string(), "event 'selectInput' rate limited");
        assert_eq!(ChannelError::Closed.to_string(), "event channel closed");
    }
}
