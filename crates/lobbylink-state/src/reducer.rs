//! The state reducer: `(state, message) → next state`.

use lobbylink_protocol::ServerMessage;

use crate::GameState;

/// Folds one server message into the state, returning the next state.
///
/// Pure and deterministic: no I/O, no logging, no clock. The same
/// `(state, message)` pair always produces the same result.
///
/// The `match` has no wildcard arm on purpose. Adding a variant to
/// [`ServerMessage`] makes this function fail to compile until the new
/// message is handled here.
pub fn reduce(state: &GameState, message: &ServerMessage) -> GameState {
    match message {
        ServerMessage::Joined(joined) => GameState {
            self_player_id: Some(joined.player_id.clone()),
            ..state.clone()
        },

        // Last write wins: the server always sends the whole lobby.
        ServerMessage::LobbyData(data) => GameState {
            lobby: data
                .players
                .iter()
                .map(|p| (p.id.clone(), p.clone()))
                .collect(),
            ..state.clone()
        },

        ServerMessage::GameStage(stage) => GameState {
            stage: stage.stage.clone(),
            ..state.clone()
        },

        // Surfaced through logs and client events, not state.
        ServerMessage::Error(_) => state.clone(),

        ServerMessage::Pong(_) => state.clone(),
    }
}
