//! The game state store: one writer, many readers.

use std::sync::Arc;

use lobbylink_protocol::ServerMessage;
use tokio::sync::watch;

use crate::{GameState, reduce};

/// Holds the current [`GameState`] and publishes every change.
///
/// The store is the only place state changes. It is owned by the client
/// (one store per client, created with it and dropped with it) and
/// readers get either a point-in-time snapshot ([`current`]) or a
/// [`watch::Receiver`] that wakes on every published change
/// ([`subscribe`]).
///
/// Snapshots are `Arc<GameState>`: cloning one is a reference-count
/// bump, and nobody holding one can change what the store sees.
///
/// [`current`]: Self::current
/// [`subscribe`]: Self::subscribe
#[derive(Debug)]
pub struct GameStateStore {
    tx: watch::Sender<Arc<GameState>>,
}

impl GameStateStore {
    /// Creates a store holding the default (empty) state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(GameState::default()));
        Self { tx }
    }

    /// Applies one server message and publishes the result.
    ///
    /// Subscribers are only woken when the state actually changed, so a
    /// `PONG` or `ERROR` never produces a notification. Returns the
    /// snapshot current after the message was applied.
    pub fn dispatch(&self, message: &ServerMessage) -> Arc<GameState> {
        if let ServerMessage::Error(err) = message {
            tracing::warn!(message = %err.message, "server reported an error");
        }

        self.tx.send_if_modified(|state| {
            let next = reduce(&**state, message);
            if next == **state {
                return false;
            }
            *state = Arc::new(next);
            true
        });
        self.current()
    }

    /// Returns the current snapshot.
    pub fn current(&self) -> Arc<GameState> {
        Arc::clone(&self.tx.borrow())
    }

    /// Returns a receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<GameState>> {
        self.tx.subscribe()
    }

    /// Replaces the state with defaults, e.g. when a new session starts.
    pub fn reset(&self) {
        tracing::debug!("game state reset");
        self.tx.send_replace(Arc::new(GameState::default()));
    }
}

impl Default for GameStateStore {
    fn default() -> Self {
        Self::new()
    }
}
