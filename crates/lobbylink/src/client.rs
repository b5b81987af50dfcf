//! The lobby client: one socket, its connection task, and the state it feeds.
//!
//! Each call to [`LobbyClient::connect`] starts a new *generation*. The
//! generation is bumped under the socket lock, and everything the
//! connection task does to shared state (installing its socket, routing a
//! frame into the store, flipping the status) happens under the same lock
//! after checking that its generation is still the current one. A task
//! that was retired by a newer `connect` (or by `disconnect`) can therefore
//! never touch the status or the game state again, even if it is still
//! between two `await` points when it is aborted.
//!
//! Senders only ever see an installed socket, so `JOIN` is always the
//! first frame the server receives.
//!
//! The flow of one generation is:
//!   1. Close the retired socket, if there was one
//!   2. Open the new socket (bounded by `connect_timeout`)
//!   3. Send `JOIN{playerName}` on it
//!   4. Install it as the live socket → `Connected`
//!   5. Loop: read frames and dispatch them in order, send keepalives
//!   6. On close or error → `Disconnected`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lobbylink_protocol::{
    ClientMessage, Codec, JsonCodec, Position, ServerMessage, WireMessage,
};
use lobbylink_state::{GameState, GameStateStore};
use lobbylink_transport::{
    Connection, ConnectionId, Connector, WebSocketConnector,
};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::{ClientConfig, ClientEvent, ConnectionStatus, LobbyError, OutboundSender};

/// The live socket and the task driving it.
pub(crate) struct Slot<T> {
    generation: u64,
    live: Option<Arc<T>>,
    task: Option<JoinHandle<()>>,
}

/// Everything the client handle, its senders and its connection task share.
pub(crate) struct Shared<C: Connector, K: Codec> {
    pub(crate) config: ClientConfig,
    connector: C,
    pub(crate) codec: K,
    store: GameStateStore,
    status: watch::Sender<ConnectionStatus>,
    events: broadcast::Sender<ClientEvent>,
    socket: Mutex<Slot<C::Connection>>,
    /// Sessions that reached `Connected`, ever.
    pub(crate) connected_sessions: AtomicU64,
    /// Calls to `disconnect`, ever.
    pub(crate) disconnects: AtomicU64,
}

impl<C: Connector, K: Codec> Shared<C, K> {
    fn lock_slot(&self) -> MutexGuard<'_, Slot<C::Connection>> {
        // Nothing panics while holding the lock, but a poisoned slot is
        // still structurally valid.
        self.socket.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves the status to `next` if that is a legal step.
    fn set_status(&self, next: ConnectionStatus) {
        let changed = self.status.send_if_modified(|current| {
            if !current.can_transition_to(next) {
                if *current != next {
                    tracing::debug!(from = %current, to = %next, "refused status transition");
                }
                return false;
            }
            *current = next;
            true
        });
        if changed {
            tracing::debug!(status = %next, "status changed");
            let _ = self.events.send(ClientEvent::StatusChanged(next));
        }
    }

    /// Returns the live socket if the client is connected.
    pub(crate) fn live_connection(&self) -> Option<Arc<C::Connection>> {
        let slot = self.lock_slot();
        if !self.status.borrow().is_connected() {
            return None;
        }
        slot.live.clone()
    }

    /// Makes `conn` the live socket. Returns `false` if `generation` was
    /// retired while the socket was opening or joining.
    fn install(&self, generation: u64, conn: &Arc<C::Connection>) -> bool {
        let mut slot = self.lock_slot();
        if slot.generation != generation {
            return false;
        }
        slot.live = Some(Arc::clone(conn));
        self.set_status(ConnectionStatus::Connected);
        self.connected_sessions.fetch_add(1, Ordering::SeqCst);
        true
    }

    /// Decodes one inbound frame and hands it to the store.
    ///
    /// Frames that cannot be decoded are dropped: the state stays as it
    /// was and the socket stays open.
    fn route(&self, generation: u64, conn_id: ConnectionId, text: &str) {
        let message = match self.codec.decode::<ServerMessage>(text) {
            Ok(frame) => frame.into_message(),
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "dropping undecodable frame");
                if self.lock_slot().generation == generation {
                    let _ = self.events.send(ClientEvent::ProtocolError(e.to_string()));
                }
                return;
            }
        };

        let slot = self.lock_slot();
        if slot.generation != generation {
            return;
        }
        tracing::debug!(%conn_id, kind = message.kind(), "frame received");
        if let ServerMessage::Error(err) = &message {
            let _ = self.events.send(ClientEvent::ServerError(err.message.clone()));
        }
        self.store.dispatch(&message);
    }

    /// Clears the live socket once `generation`'s task is done with it.
    fn finish(&self, generation: u64) {
        let mut slot = self.lock_slot();
        if slot.generation != generation {
            return;
        }
        slot.live = None;
        slot.task = None;
        self.set_status(ConnectionStatus::Disconnected);
    }
}

/// A realtime lobby client.
///
/// Owns exactly one socket at a time and the [`GameStateStore`] that
/// mirrors what the server has told it. Status changes, state snapshots
/// and [`ClientEvent`]s are published on channels, so any number of
/// readers can follow along without locking anything.
///
/// ```rust,no_run
/// use lobbylink::prelude::*;
///
/// # async fn run() -> Result<(), LobbyError> {
/// let client = LobbyClient::new(ClientConfig::from_env())?;
/// client.connect("Alice");
/// client
///     .wait_for_status(ConnectionStatus::Connected, std::time::Duration::from_secs(5))
///     .await?;
/// client.set_ready(true).await;
/// # Ok(())
/// # }
/// ```
pub struct LobbyClient<C: Connector = WebSocketConnector, K: Codec = JsonCodec> {
    pub(crate) shared: Arc<Shared<C, K>>,
}

impl LobbyClient {
    /// Builds a client that talks JSON over a WebSocket.
    ///
    /// # Errors
    /// [`LobbyError::InvalidConfig`] if `config` does not validate.
    pub fn new(config: ClientConfig) -> Result<Self, LobbyError> {
        Self::with_parts(config, WebSocketConnector, JsonCodec)
    }
}

impl<C: Connector, K: Codec> LobbyClient<C, K> {
    /// Builds a client over any connector and codec.
    ///
    /// # Errors
    /// [`LobbyError::InvalidConfig`] if `config` does not validate.
    pub fn with_parts(
        config: ClientConfig,
        connector: C,
        codec: K,
    ) -> Result<Self, LobbyError> {
        config.validate()?;
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let shared = Shared {
            config,
            connector,
            codec,
            store: GameStateStore::new(),
            status,
            events,
            socket: Mutex::new(Slot {
                generation: 0,
                live: None,
                task: None,
            }),
            connected_sessions: AtomicU64::new(0),
            disconnects: AtomicU64::new(0),
        };
        Ok(Self {
            shared: Arc::new(shared),
        })
    }

    /// Starts a new session as `player_name`.
    ///
    /// Returns immediately with the status at `Connecting`; the socket is
    /// opened by a spawned task. Any previous socket is retired first and
    /// the game state is reset. Must be called from inside a Tokio runtime.
    pub fn connect(&self, player_name: impl Into<String>) {
        let player_name = player_name.into();
        let shared = &self.shared;

        let mut slot = shared.lock_slot();
        slot.generation += 1;
        let generation = slot.generation;

        if let Some(task) = slot.task.take() {
            task.abort();
        }
        let retired = slot.live.take();
        shared.set_status(ConnectionStatus::Disconnected);
        shared.store.reset();
        shared.set_status(ConnectionStatus::Connecting);

        tracing::debug!(generation, %player_name, "connecting");
        slot.task = Some(tokio::spawn(run_connection(
            Arc::clone(shared),
            generation,
            player_name,
            retired,
        )));
    }

    /// Closes the live socket, stops its task and sets `Disconnected`.
    ///
    /// The last game state stays readable until the next `connect`.
    pub async fn disconnect(&self) {
        let (task, conn) = {
            let mut slot = self.shared.lock_slot();
            slot.generation += 1;
            self.shared.disconnects.fetch_add(1, Ordering::SeqCst);
            self.shared.set_status(ConnectionStatus::Disconnected);
            (slot.task.take(), slot.live.take())
        };

        if let Some(task) = task {
            task.abort();
        }
        if let Some(conn) = conn {
            close_quietly(conn.as_ref()).await;
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status.borrow()
    }

    /// Returns a receiver that wakes on every status change.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    /// Waits until the status equals `target`.
    ///
    /// # Errors
    /// [`LobbyError::Timeout`] if `timeout` passes first.
    pub async fn wait_for_status(
        &self,
        target: ConnectionStatus,
        timeout: Duration,
    ) -> Result<(), LobbyError> {
        let mut rx = self.watch_status();
        match tokio::time::timeout(timeout, rx.wait_for(|s| *s == target)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(LobbyError::Shutdown),
            Err(_) => Err(LobbyError::Timeout(timeout)),
        }
    }

    /// The store that holds the game state.
    pub fn state(&self) -> &GameStateStore {
        &self.shared.store
    }

    /// The current game state.
    pub fn snapshot(&self) -> Arc<GameState> {
        self.shared.store.current()
    }

    /// Returns a receiver that wakes on every game state change.
    pub fn subscribe(&self) -> watch::Receiver<Arc<GameState>> {
        self.shared.store.subscribe()
    }

    /// Returns a receiver for [`ClientEvent`]s emitted from now on.
    pub fn events(&self) -> broadcast::Receiver<ClientEvent> {
        self.shared.events.subscribe()
    }

    /// A cheap handle for sending messages from other tasks.
    pub fn sender(&self) -> OutboundSender<C, K> {
        OutboundSender::new(Arc::clone(&self.shared))
    }

    /// Sends `message` if connected; see [`OutboundSender::send`].
    pub async fn send(&self, message: ClientMessage) {
        self.sender().send(message).await;
    }

    pub async fn set_ready(&self, ready: bool) {
        self.sender().set_ready(ready).await;
    }

    pub async fn add_character(&self, position: Position, rotation: i32) {
        self.sender().add_character(position, rotation).await;
    }

    pub async fn choose(&self, choice: impl Into<String>) {
        self.sender().choose(choice).await;
    }

    pub async fn ping(&self) {
        self.sender().ping().await;
    }
}

impl<C: Connector, K: Codec> Drop for LobbyClient<C, K> {
    fn drop(&mut self) {
        let mut slot = self.shared.lock_slot();
        slot.generation += 1;
        if let Some(task) = slot.task.take() {
            task.abort();
        }
        let live = slot.live.take();
        self.shared.set_status(ConnectionStatus::Disconnected);
        drop(slot);

        // Close gracefully if there is still a runtime to do it on;
        // otherwise the socket is simply dropped.
        if let (Some(conn), Ok(runtime)) = (live, tokio::runtime::Handle::try_current()) {
            runtime.spawn(async move { close_quietly(conn.as_ref()).await });
        }
    }
}

/// Body of the connection task for one generation.
async fn run_connection<C: Connector, K: Codec>(
    shared: Arc<Shared<C, K>>,
    generation: u64,
    player_name: String,
    retired: Option<Arc<C::Connection>>,
) {
    if let Some(old) = retired {
        close_quietly(old.as_ref()).await;
    }

    if let Err(e) = session(&shared, generation, &player_name).await {
        tracing::warn!(generation, error = %e, "connection lost");
    }

    shared.finish(generation);
}

/// Opens the socket, joins, and routes frames until the socket ends.
async fn session<C: Connector, K: Codec>(
    shared: &Shared<C, K>,
    generation: u64,
    player_name: &str,
) -> Result<(), LobbyError> {
    let url = shared.config.url.as_str();
    let connect_timeout = shared.config.connect_timeout;

    let conn = tokio::time::timeout(connect_timeout, shared.connector.connect(url))
        .await
        .map_err(|_| LobbyError::Timeout(connect_timeout))??;
    let conn = Arc::new(conn);
    let conn_id = conn.id();

    // Nothing else can write to the socket until it is installed.
    let join = shared.encode_outbound(ClientMessage::join(player_name))?;
    conn.send(&join).await?;
    tracing::debug!(%conn_id, %player_name, "join sent");

    if !shared.install(generation, &conn) {
        tracing::debug!(%conn_id, generation, "superseded while opening, closing");
        close_quietly(conn.as_ref()).await;
        return Ok(());
    }
    tracing::info!(%conn_id, generation, %url, "connected");

    let mut keepalive = shared.config.ping_interval.map(|period| {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    loop {
        tokio::select! {
            frame = conn.recv() => match frame? {
                Some(text) => shared.route(generation, conn_id, &text),
                None => {
                    tracing::info!(%conn_id, "connection closed by server");
                    return Ok(());
                }
            },
            () = tick(&mut keepalive) => {
                let ping = shared.encode_outbound(ClientMessage::ping())?;
                conn.send(&ping).await?;
                tracing::debug!(%conn_id, "keepalive ping sent");
            }
        }
    }
}

/// Waits for the next keepalive tick, or forever if keepalive is off.
async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn close_quietly<T: Connection>(conn: &T) {
    let conn_id = conn.id();
    match conn.close().await {
        Ok(()) => tracing::debug!(%conn_id, "connection closed"),
        Err(e) => tracing::debug!(%conn_id, error = %e, "close failed"),
    }
}
