//! Local game state for lobbylink.
//!
//! This crate holds the client's mirror of shared game state and the only
//! code allowed to change it:
//!
//! 1. **State** ([`GameState`]): own identity, lobby roster, stage.
//! 2. **Reducer** ([`reduce`]): a pure function folding one
//!    [`ServerMessage`](lobbylink_protocol::ServerMessage) into the state.
//! 3. **Store** ([`GameStateStore`]): applies the reducer and publishes
//!    immutable snapshots to any number of readers.
//!
//! # How it fits in the stack
//!
//! ```text
//! Client (above)   ← feeds decoded frames in, in socket order
//!     ↕
//! State (this crate)  ← reduce + publish
//!     ↕
//! Protocol (below) ← provides ServerMessage, PlayerSnapshot, Stage
//! ```

mod reducer;
mod state;
mod store;

pub use reducer::reduce;
pub use state::GameState;
pub use store::GameStateStore;
