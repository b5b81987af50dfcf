//! Integration tests for the lobby client against a real in-process
//! WebSocket server.
//!
//! The test plays the server: it accepts the client's socket with
//! `tokio-tungstenite`, decodes what the client sends with the same
//! [`JsonCodec`], and pushes encoded [`ServerMessage`]s back.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use lobbylink::prelude::*;
use lobbylink::{
    Codec, Connection, ConnectionId, Connector, Frame, JsonCodec, ServerMessage,
    TransportError,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;

type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

const WAIT: Duration = Duration::from_secs(5);

// =========================================================================
// Helpers
// =========================================================================

async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("should have local addr");
    (listener, format!("ws://{addr}/ws"))
}

async fn accept(listener: &TcpListener) -> ServerWs {
    let (stream, _) = tokio::time::timeout(WAIT, listener.accept())
        .await
        .expect("client should dial in")
        .expect("should accept");
    tokio_tungstenite::accept_async(stream)
        .await
        .expect("upgrade should succeed")
}

/// Reads the next text frame the client sent and decodes it.
async fn recv_client(ws: &mut ServerWs) -> Frame<ClientMessage> {
    loop {
        let msg = tokio::time::timeout(WAIT, ws.next())
            .await
            .expect("client should send a frame")
            .expect("stream should be open")
            .expect("frame should be valid");
        if let Message::Text(text) = msg {
            return JsonCodec
                .decode(text.as_str())
                .expect("client frame should decode");
        }
    }
}

async fn push(ws: &mut ServerWs, message: ServerMessage) {
    let text = JsonCodec
        .encode(&Frame::stamped(message, 1))
        .expect("server frame should encode");
    push_raw(ws, &text).await;
}

async fn push_raw(ws: &mut ServerWs, text: &str) {
    ws.send(Message::Text(text.to_owned().into()))
        .await
        .expect("server send should succeed");
}

fn client(url: &str) -> LobbyClient {
    LobbyClient::new(ClientConfig::default().with_url(url))
        .expect("config should be valid")
}

/// Connects as `name` and returns the server side once the JOIN arrived
/// and the client reports `Connected`.
async fn joined(client: &LobbyClient, listener: &TcpListener, name: &str) -> ServerWs {
    client.connect(name);
    let mut ws = accept(listener).await;
    let join = recv_client(&mut ws).await;
    assert_eq!(join.message, ClientMessage::join(name));
    client
        .wait_for_status(ConnectionStatus::Connected, WAIT)
        .await
        .expect("should connect");
    ws
}

async fn wait_for_state(
    client: &LobbyClient,
    pred: impl FnMut(&Arc<GameState>) -> bool,
) -> Arc<GameState> {
    let mut rx = client.subscribe();
    let state = tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("state should arrive in time")
        .expect("store should be alive");
    Arc::clone(&state)
}

async fn next_event(
    events: &mut broadcast::Receiver<ClientEvent>,
    mut pred: impl FnMut(&ClientEvent) -> bool,
) -> ClientEvent {
    tokio::time::timeout(WAIT, async {
        loop {
            let event = events.recv().await.expect("event channel should be open");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event should arrive in time")
}

fn player(id: &str, name: &str, is_ready: bool) -> PlayerSnapshot {
    PlayerSnapshot {
        id: PlayerId::from(id),
        name: name.to_string(),
        is_ready,
        characters: Vec::new(),
    }
}

// =========================================================================
// Connection lifecycle
// =========================================================================

#[tokio::test]
async fn test_connect_sends_join_and_reports_connected() {
    let (listener, url) = listen().await;
    let client = client(&url);
    assert_eq!(client.status(), ConnectionStatus::Disconnected);

    client.connect("Alice");
    assert_eq!(client.status(), ConnectionStatus::Connecting);

    let mut ws = accept(&listener).await;
    let join = recv_client(&mut ws).await;
    assert_eq!(join.message, ClientMessage::join("Alice"));
    assert!(join.timestamp.is_some(), "outbound frames are stamped");

    client
        .wait_for_status(ConnectionStatus::Connected, WAIT)
        .await
        .expect("should connect");
}

#[tokio::test]
async fn test_server_close_sets_disconnected() {
    let (listener, url) = listen().await;
    let client = client(&url);
    let mut ws = joined(&client, &listener, "Alice").await;

    ws.close(None).await.unwrap();

    client
        .wait_for_status(ConnectionStatus::Disconnected, WAIT)
        .await
        .expect("status should fall back to disconnected");
}

#[tokio::test]
async fn test_unreachable_server_goes_connecting_then_disconnected() {
    let (listener, url) = listen().await;
    drop(listener);

    let client = client(&url);
    let mut events = client.events();
    client.connect("Alice");

    client
        .wait_for_status(ConnectionStatus::Disconnected, WAIT)
        .await
        .unwrap();
    assert_eq!(
        events.try_recv().unwrap(),
        ClientEvent::StatusChanged(ConnectionStatus::Connecting)
    );
    assert_eq!(
        events.try_recv().unwrap(),
        ClientEvent::StatusChanged(ConnectionStatus::Disconnected)
    );
    assert!(events.try_recv().is_err(), "never reached Connected");
}

#[tokio::test]
async fn test_second_connect_retires_the_first_socket() {
    let (listener, url) = listen().await;
    let client = client(&url);

    let mut first = joined(&client, &listener, "Alice").await;
    push(&mut first, ServerMessage::joined("p1")).await;
    wait_for_state(&client, |s| s.is_joined()).await;

    let mut second = joined(&client, &listener, "Bob").await;
    assert_eq!(client.snapshot().self_player_id, None, "state was reset");

    // The retired socket is closed by the client.
    let closed = tokio::time::timeout(WAIT, first.next()).await.unwrap();
    assert!(
        matches!(closed, None | Some(Ok(Message::Close(_))) | Some(Err(_))),
        "expected close, got {closed:?}"
    );

    push(&mut second, ServerMessage::joined("p2")).await;
    let state = wait_for_state(&client, |s| s.is_joined()).await;
    assert_eq!(state.self_player_id, Some(PlayerId::from("p2")));
    assert_eq!(client.status(), ConnectionStatus::Connected);
}

#[tokio::test]
async fn test_dropping_the_client_closes_the_socket() {
    let (listener, url) = listen().await;
    let client = client(&url);
    let mut ws = joined(&client, &listener, "Alice").await;

    drop(client);

    let closed = tokio::time::timeout(WAIT, ws.next()).await.unwrap();
    assert!(
        matches!(closed, Some(Ok(Message::Close(_)))),
        "expected a close frame, got {closed:?}"
    );
}

#[tokio::test]
async fn test_disconnect_closes_socket_and_keeps_last_state() {
    let (listener, url) = listen().await;
    let client = client(&url);
    let mut ws = joined(&client, &listener, "Alice").await;
    push(&mut ws, ServerMessage::joined("p1")).await;
    wait_for_state(&client, |s| s.is_joined()).await;

    client.disconnect().await;
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
    assert!(client.snapshot().is_joined());

    // Nothing is written after disconnect; the server only sees the close.
    client.set_ready(true).await;
    while let Ok(Some(Ok(msg))) = tokio::time::timeout(WAIT, ws.next()).await {
        assert!(!msg.is_text(), "unexpected frame after disconnect: {msg:?}");
        if msg.is_close() {
            break;
        }
    }
}

// =========================================================================
// Inbound frames
// =========================================================================

#[tokio::test]
async fn test_server_pushes_update_game_state() {
    let (listener, url) = listen().await;
    let client = client(&url);
    let mut ws = joined(&client, &listener, "Alice").await;

    push(&mut ws, ServerMessage::joined("p1")).await;
    push(
        &mut ws,
        ServerMessage::lobby_data(vec![
            player("p1", "Alice", true),
            player("p2", "Bob", false),
        ]),
    )
    .await;
    push(&mut ws, ServerMessage::game_stage(Stage::GameStarted)).await;

    // Frames apply in order, so the stage arriving means the rest did too.
    let state = wait_for_state(&client, |s| s.stage == Stage::GameStarted).await;
    assert_eq!(state.self_player_id, Some(PlayerId::from("p1")));
    let names: Vec<_> = state.players().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Alice", "Bob"]);
    assert!(state.self_player().is_some_and(|p| p.is_ready));
    assert!(!state.all_ready());
}

#[tokio::test]
async fn test_reordered_roster_replaces_lobby_order() {
    let (listener, url) = listen().await;
    let client = client(&url);
    let mut ws = joined(&client, &listener, "Alice").await;

    let alice = player("p1", "Alice", false);
    let bob = player("p2", "Bob", false);
    push(&mut ws, ServerMessage::lobby_data(vec![alice.clone(), bob.clone()])).await;
    wait_for_state(&client, |s| s.lobby.len() == 2).await;

    push(&mut ws, ServerMessage::lobby_data(vec![bob, alice])).await;
    let state = wait_for_state(&client, |s| {
        s.players().next().is_some_and(|p| p.id == PlayerId::from("p2"))
    })
    .await;
    let names: Vec<_> = state.players().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Bob", "Alice"]);
}

#[tokio::test]
async fn test_unknown_frames_are_dropped_and_socket_stays_open() {
    let (listener, url) = listen().await;
    let client = client(&url);
    let mut events = client.events();
    let mut ws = joined(&client, &listener, "Alice").await;

    push(&mut ws, ServerMessage::joined("p1")).await;
    push_raw(&mut ws, r#"{"type":"choice_update","payload":{"takenChoices":{}}}"#).await;
    push_raw(&mut ws, "not json").await;
    push(&mut ws, ServerMessage::lobby_data(vec![player("p1", "Alice", false)])).await;

    let state = wait_for_state(&client, |s| !s.lobby.is_empty()).await;
    assert_eq!(state.self_player_id, Some(PlayerId::from("p1")));
    assert_eq!(client.status(), ConnectionStatus::Connected);

    let event = next_event(&mut events, |e| matches!(e, ClientEvent::ProtocolError(_))).await;
    let ClientEvent::ProtocolError(reason) = event else {
        unreachable!()
    };
    assert!(reason.contains("choice_update"), "{reason}");
}

#[tokio::test]
async fn test_server_error_is_reported_without_touching_state() {
    let (listener, url) = listen().await;
    let client = client(&url);
    let mut events = client.events();
    let mut ws = joined(&client, &listener, "Alice").await;

    push(&mut ws, ServerMessage::joined("p1")).await;
    push(&mut ws, ServerMessage::error("name already taken")).await;

    let event = next_event(&mut events, |e| matches!(e, ClientEvent::ServerError(_))).await;
    assert_eq!(event, ClientEvent::ServerError("name already taken".into()));
    assert_eq!(client.snapshot().self_player_id, Some(PlayerId::from("p1")));
    assert_eq!(client.status(), ConnectionStatus::Connected);
}

// =========================================================================
// Outbound frames
// =========================================================================

#[tokio::test]
async fn test_commands_reach_the_server_in_order() {
    let (listener, url) = listen().await;
    let client = client(&url);
    let mut ws = joined(&client, &listener, "Alice").await;

    let sender = client.sender();
    sender.set_ready(true).await;
    sender.add_character(Position::new(3, 4), 90).await;
    client.choose("heads").await;
    client.ping().await;

    assert_eq!(recv_client(&mut ws).await.message, ClientMessage::ready_status(true));
    let placement = lobbylink::CharacterPlacement {
        position: Position::new(3, 4),
        rotation: 90,
    };
    assert_eq!(
        recv_client(&mut ws).await.message,
        ClientMessage::add_character(placement)
    );
    assert_eq!(recv_client(&mut ws).await.message, ClientMessage::choose("heads"));
    assert_eq!(recv_client(&mut ws).await.message, ClientMessage::ping());
}

#[tokio::test]
async fn test_send_before_connect_writes_nothing() {
    let (listener, url) = listen().await;
    let client = client(&url);

    client.set_ready(true).await;
    client.send(ClientMessage::choose("tails")).await;

    assert_eq!(client.status(), ConnectionStatus::Disconnected);
    let dialed = tokio::time::timeout(Duration::from_millis(200), listener.accept()).await;
    assert!(dialed.is_err(), "sending must not open a socket");
}

#[tokio::test]
async fn test_keepalive_sends_ping() {
    let (listener, url) = listen().await;
    let config = ClientConfig::default()
        .with_url(&url)
        .with_ping_interval(Duration::from_millis(50));
    let client = LobbyClient::new(config).unwrap();
    let mut ws = joined(&client, &listener, "Alice").await;

    assert_eq!(recv_client(&mut ws).await.message, ClientMessage::ping());

    // PONG is dispatched like anything else and changes nothing.
    let before = client.snapshot();
    push(&mut ws, ServerMessage::pong()).await;
    assert_eq!(recv_client(&mut ws).await.message, ClientMessage::ping());
    assert_eq!(*client.snapshot(), *before);
}

// =========================================================================
// Handshake ordering
// =========================================================================

type Recorded = Arc<std::sync::Mutex<Vec<String>>>;

/// Connector whose sockets record every frame written to them and never
/// receive anything.
#[derive(Clone, Default)]
struct RecordingConnector {
    sessions: Arc<std::sync::Mutex<Vec<Recorded>>>,
}

struct RecordingConnection {
    id: ConnectionId,
    frames: Recorded,
}

impl Connector for RecordingConnector {
    type Connection = RecordingConnection;

    async fn connect(&self, _url: &str) -> Result<RecordingConnection, TransportError> {
        let frames = Recorded::default();
        let mut sessions = self.sessions.lock().unwrap();
        sessions.push(Arc::clone(&frames));
        Ok(RecordingConnection {
            id: ConnectionId::new(sessions.len() as u64),
            frames,
        })
    }
}

impl Connection for RecordingConnection {
    async fn send(&self, frame: &str) -> Result<(), TransportError> {
        // Give concurrent senders a chance to interleave.
        tokio::task::yield_now().await;
        self.frames.lock().unwrap().push(frame.to_owned());
        Ok(())
    }

    async fn recv(&self) -> Result<Option<String>, TransportError> {
        std::future::pending().await
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_join_is_always_the_first_frame() {
    const ROUNDS: usize = 200;
    let connector = RecordingConnector::default();
    let client =
        LobbyClient::with_parts(ClientConfig::default(), connector.clone(), JsonCodec)
            .unwrap();

    for round in 0..ROUNDS {
        client.connect(format!("player-{round}"));
        client
            .wait_for_status(ConnectionStatus::Connected, WAIT)
            .await
            .unwrap();
        client.set_ready(true).await;
    }
    client.disconnect().await;

    let sessions = connector.sessions.lock().unwrap();
    assert_eq!(sessions.len(), ROUNDS);
    for (round, frames) in sessions.iter().enumerate() {
        let frames = frames.lock().unwrap();
        let first: Frame<ClientMessage> = JsonCodec.decode(&frames[0]).unwrap();
        assert_eq!(
            first.message,
            ClientMessage::join(format!("player-{round}")),
            "session {round} did not start with JOIN"
        );
    }
}
