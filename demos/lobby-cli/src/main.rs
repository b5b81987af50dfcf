//! Terminal client for a lobbylink server.
//!
//! Connects, prints status and lobby changes as they arrive, and turns
//! lines typed on stdin into lobby commands:
//!
//! ```text
//! ready | unready | add X Y ROT | choose TEXT | ping | state | quit
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use lobbylink::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lobby-cli", about = "Join a lobby and play from the terminal")]
struct Cli {
    /// Server URL (defaults to $LOBBYLINK_WS_URL, then ws://localhost:8080/ws)
    #[arg(short, long)]
    url: Option<String>,

    /// Player name sent with JOIN
    #[arg(short, long, default_value = "player")]
    name: String,

    /// Send PING every N seconds while connected
    #[arg(long)]
    ping_secs: Option<u64>,

    /// Reconnect with backoff when the connection drops
    #[arg(long)]
    reconnect: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Ready(bool),
    Add(Position, i32),
    Choose(String),
    Ping,
    State,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    match word {
        "ready" => Ok(Command::Ready(true)),
        "unready" => Ok(Command::Ready(false)),
        "add" => {
            let nums = rest
                .split_whitespace()
                .map(str::parse::<i32>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("add: {e}"))?;
            match nums.as_slice() {
                [x, y, rotation] => Ok(Command::Add(Position::new(*x, *y), *rotation)),
                _ => Err("usage: add X Y ROT".into()),
            }
        }
        "choose" if !rest.is_empty() => Ok(Command::Choose(rest.to_string())),
        "choose" => Err("usage: choose TEXT".into()),
        "ping" => Ok(Command::Ping),
        "state" => Ok(Command::State),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command {other:?}")),
    }
}

fn print_state(state: &GameState) {
    let me = state
        .self_player_id
        .as_ref()
        .map_or_else(|| "-".to_string(), PlayerId::to_string);
    println!("stage: {}  you: {me}", state.stage);
    for player in state.players() {
        let marker = if Some(&player.id) == state.self_player_id.as_ref() { "*" } else { " " };
        let ready = if player.is_ready { "ready" } else { "not ready" };
        println!(
            " {marker} {} ({}) {ready}, {} characters",
            player.name,
            player.id,
            player.characters.len()
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), LobbyError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.url {
        config = config.with_url(url);
    }
    if let Some(secs) = cli.ping_secs {
        config = config.with_ping_interval(Duration::from_secs(secs));
    }

    let client = Arc::new(LobbyClient::new(config)?);
    let mut state = client.subscribe();
    let mut events = client.events();

    let reconnect = if cli.reconnect {
        let client = Arc::clone(&client);
        let name = cli.name.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = client.run_with_reconnect(name, ReconnectPolicy::default()).await {
                tracing::error!(error = %e, "reconnect loop ended");
            }
        }))
    } else {
        client.connect(cli.name.as_str());
        None
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to read stdin");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(Command::Ready(ready)) => client.set_ready(ready).await,
                    Ok(Command::Add(position, rotation)) => {
                        client.add_character(position, rotation).await;
                    }
                    Ok(Command::Choose(choice)) => client.choose(choice).await,
                    Ok(Command::Ping) => client.ping().await,
                    Ok(Command::State) => print_state(&client.snapshot()),
                    Ok(Command::Quit) => break,
                    Err(msg) => println!("{msg}"),
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = Arc::clone(&state.borrow_and_update());
                print_state(&snapshot);
            }
            event = events.recv() => match event {
                Ok(ClientEvent::StatusChanged(status)) => println!("[{status}]"),
                Ok(ClientEvent::ServerError(message)) => println!("server error: {message}"),
                Ok(ClientEvent::ProtocolError(_)) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "missed client events");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    client.disconnect().await;
    if let Some(task) = reconnect {
        let _ = task.await;
    }
    Ok(())
}
