//! Client configuration.

use std::time::Duration;

use crate::LobbyError;

/// Socket URL used when nothing else is configured.
pub const DEFAULT_URL: &str = "ws://localhost:8080/ws";

/// Environment variable read by [`ClientConfig::from_env`].
pub const URL_ENV_VAR: &str = "LOBBYLINK_WS_URL";

/// Configuration for a [`LobbyClient`](crate::LobbyClient).
///
/// Start from `ClientConfig::default()` (or [`from_env`](Self::from_env))
/// and override what you need with the `with_*` methods.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `ws://` or `wss://` endpoint of the lobby server.
    pub url: String,

    /// How long opening the socket may take before the attempt is
    /// abandoned and the status falls back to `Disconnected`.
    pub connect_timeout: Duration,

    /// If set, send `PING` on this interval while connected.
    pub ping_interval: Option<Duration>,

    /// Put a `timestamp` (ms since the UNIX epoch) on outbound frames.
    pub stamp_outbound: bool,

    /// Capacity of the [`ClientEvent`](crate::ClientEvent) channel.
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            ping_interval: None,
            stamp_outbound: true,
            event_capacity: 64,
        }
    }
}

impl ClientConfig {
    /// Defaults, with the URL taken from `LOBBYLINK_WS_URL` when set.
    ///
    /// Read once; later changes to the environment have no effect on a
    /// config that was already built.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(URL_ENV_VAR).filter(|url| !url.trim().is_empty()) {
            Some(url) => Self::default().with_url(url.trim()),
            None => Self::default(),
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = Some(interval);
        self
    }

    #[must_use]
    pub fn with_stamp_outbound(mut self, stamp: bool) -> Self {
        self.stamp_outbound = stamp;
        self
    }

    /// Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Checks the config before a client is built from it.
    ///
    /// # Errors
    /// [`LobbyError::InvalidConfig`] if the URL is not `ws://`/`wss://`,
    /// or a duration that must be positive is zero.
    pub fn validate(&self) -> Result<(), LobbyError> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(LobbyError::InvalidConfig(format!(
                "url must start with ws:// or wss://, got {:?}",
                self.url
            )));
        }
        if self.connect_timeout.is_zero() {
            return Err(LobbyError::InvalidConfig(
                "connect_timeout must be greater than zero".into(),
            ));
        }
        if self.ping_interval.is_some_and(|d| d.is_zero()) {
            return Err(LobbyError::InvalidConfig(
                "ping_interval must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.url, "ws://localhost:8080/ws");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.ping_interval, None);
        assert!(config.stamp_outbound);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_uses_env_url() {
        let config = ClientConfig::from_lookup(|key| {
            assert_eq!(key, URL_ENV_VAR);
            Some(" wss://lobby.example.com/ws ".to_string())
        });
        assert_eq!(config.url, "wss://lobby.example.com/ws");
    }

    #[test]
    fn test_from_lookup_falls_back_to_default() {
        assert_eq!(ClientConfig::from_lookup(|_| None).url, DEFAULT_URL);
        assert_eq!(
            ClientConfig::from_lookup(|_| Some("   ".into())).url,
            DEFAULT_URL
        );
    }

    #[test]
    fn test_builder_methods() {
        let config = ClientConfig::default()
            .with_url("ws://127.0.0.1:9000/ws")
            .with_connect_timeout(Duration::from_secs(2))
            .with_ping_interval(Duration::from_secs(15))
            .with_stamp_outbound(false)
            .with_event_capacity(0);
        assert_eq!(config.url, "ws://127.0.0.1:9000/ws");
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.ping_interval, Some(Duration::from_secs(15)));
        assert!(!config.stamp_outbound);
        assert_eq!(config.event_capacity, 1);
    }

    #[test]
    fn test_validate_rejects_non_websocket_url() {
        let err = ClientConfig::default()
            .with_url("http://localhost:8080/ws")
            .validate()
            .unwrap_err();
        assert!(matches!(err, LobbyError::InvalidConfig(_)));
    }

    #[test]
    fn test_validate_rejects_zero_durations() {
        let zero_timeout =
            ClientConfig::default().with_connect_timeout(Duration::ZERO);
        assert!(zero_timeout.validate().is_err());

        let zero_ping = ClientConfig::default().with_ping_interval(Duration::ZERO);
        assert!(zero_ping.validate().is_err());
    }
}
