//! Opt-in reconnection on top of [`LobbyClient::connect`].
//!
//! The client itself never retries. [`LobbyClient::run_with_reconnect`]
//! is a loop layered on the public API: connect, wait for the status to
//! fall back to `Disconnected`, sleep, connect again.

use std::sync::atomic::Ordering;
use std::time::Duration;

use lobbylink_protocol::Codec;
use lobbylink_transport::Connector;
use rand::Rng;

use crate::{ConnectionStatus, LobbyClient, LobbyError};

/// Exponential backoff between reconnect attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Upper bound for any single delay.
    pub max_delay: Duration,

    /// Growth factor per consecutive failure (values below 1 act as 1).
    pub multiplier: f64,

    /// Give up after this many consecutive failed attempts. `None` retries
    /// forever.
    pub max_attempts: Option<u32>,

    /// Fraction of each delay (0.0–1.0) that may be randomly shaved off so
    /// many clients dropped at once do not reconnect in lockstep.
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_attempts: None,
            jitter: 0.1,
        }
    }
}

impl ReconnectPolicy {
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Returns the policy with out-of-range values pulled back into range.
    #[must_use]
    pub fn validated(mut self) -> Self {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            self.multiplier = 1.0;
        }
        self.jitter = clamp_jitter(self.jitter);
        self.max_delay = self.max_delay.max(self.initial_delay);
        self
    }

    /// The delay after `attempt` consecutive failures, before jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// The delay after `attempt` consecutive failures, with jitter.
    ///
    /// Always within `[base * (1 - jitter), base]`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        let jitter = clamp_jitter(self.jitter);
        if jitter == 0.0 {
            return base;
        }
        let cut = rand::rng().random_range(0.0..=jitter);
        base.mul_f64(1.0 - cut)
    }
}

fn clamp_jitter(jitter: f64) -> f64 {
    if jitter.is_finite() {
        jitter.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

impl<C: Connector, K: Codec> LobbyClient<C, K> {
    /// Keeps a session alive as `player_name`, reconnecting after drops.
    ///
    /// A session that reached `Connected` resets the failure count. Returns
    /// `Ok(())` once [`disconnect`](Self::disconnect) is called.
    ///
    /// # Errors
    /// [`LobbyError::ReconnectExhausted`] after `max_attempts` consecutive
    /// attempts that never reached `Connected`.
    pub async fn run_with_reconnect(
        &self,
        player_name: impl Into<String>,
        policy: ReconnectPolicy,
    ) -> Result<(), LobbyError> {
        let player_name = player_name.into();
        let policy = policy.validated();
        let mut status = self.watch_status();
        let disconnects = self.shared.disconnects.load(Ordering::SeqCst);
        let mut failures: u32 = 0;

        loop {
            let sessions = self.shared.connected_sessions.load(Ordering::SeqCst);
            self.connect(player_name.as_str());
            status
                .wait_for(|s| *s == ConnectionStatus::Disconnected)
                .await
                .map_err(|_| LobbyError::Shutdown)?;

            if self.shared.disconnects.load(Ordering::SeqCst) != disconnects {
                tracing::info!("disconnect requested, reconnect loop stopped");
                return Ok(());
            }

            if self.shared.connected_sessions.load(Ordering::SeqCst) > sessions {
                failures = 0;
            } else {
                failures += 1;
                if policy.max_attempts.is_some_and(|max| failures >= max) {
                    tracing::warn!(attempts = failures, "giving up reconnecting");
                    return Err(LobbyError::ReconnectExhausted { attempts: failures });
                }
            }

            let delay = policy.delay_for(failures);
            tracing::info!(attempt = failures + 1, ?delay, "reconnecting");
            tokio::time::sleep(delay).await;

            if self.shared.disconnects.load(Ordering::SeqCst) != disconnects {
                return Ok(());
            }
        }
    }
}
