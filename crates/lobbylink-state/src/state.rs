//! The client's mirror of shared game state.

use indexmap::IndexMap;
use lobbylink_protocol::{PlayerId, PlayerSnapshot, Stage};

/// Everything the client knows about the session.
///
/// Only the reducer produces new values of this type; everyone else sees
/// it through an `Arc<GameState>` snapshot.
///
/// ```text
/// self_player_id ← JOINED       (once per connection)
/// lobby          ← LOBBY_DATA   (replaced wholesale, never merged)
/// stage          ← GAME_STAGE   (trusted as sent)
/// ```
///
/// Two states are equal only if their lobbies list the same players in
/// the same order.
#[derive(Debug, Clone, Default)]
pub struct GameState {
    /// The id the server assigned to this client, once `JOINED` arrived.
    pub self_player_id: Option<PlayerId>,

    /// Players keyed by id, in the order of the latest `LOBBY_DATA`.
    ///
    /// `IndexMap` gives keyed lookup while keeping a stable display
    /// order, which a `HashMap` would shuffle.
    pub lobby: IndexMap<PlayerId, PlayerSnapshot>,

    /// Current session stage.
    pub stage: Stage,
}

impl PartialEq for GameState {
    fn eq(&self, other: &Self) -> bool {
        // IndexMap's own PartialEq ignores order.
        self.self_player_id == other.self_player_id
            && self.stage == other.stage
            && self.lobby.len() == other.lobby.len()
            && self.lobby.iter().eq(other.lobby.iter())
    }
}

impl Eq for GameState {}

impl GameState {
    /// Players in display order.
    pub fn players(&self) -> impl Iterator<Item = &PlayerSnapshot> {
        self.lobby.values()
    }

    pub fn player(&self, id: &PlayerId) -> Option<&PlayerSnapshot> {
        self.lobby.get(id)
    }

    /// This client's own lobby entry, if joined and listed.
    pub fn self_player(&self) -> Option<&PlayerSnapshot> {
        self.self_player_id.as_ref().and_then(|id| self.lobby.get(id))
    }

    /// `true` once the server has assigned an identity.
    pub fn is_joined(&self) -> bool {
        self.self_player_id.is_some()
    }

    /// `true` when the lobby is non-empty and every player is ready.
    pub fn all_ready(&self) -> bool {
        !self.lobby.is_empty() && self.lobby.values().all(|p| p.is_ready)
    }
}
