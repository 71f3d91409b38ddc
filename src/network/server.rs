//! WebSocket Server
//!
//! Accepts client connections, answers protocol requests, and relays
//! simulation broadcasts. Each connection gets its own task and its own
//! broadcast subscription; a slow client lags on its private receiver and
//! never backs up the simulation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::core::rng::SimRng;
use crate::network::protocol::{ClientMessage, ErrorCode, ServerError, ServerMessage};
use crate::sim::broadcast::{Broadcaster, Notification};
use crate::sim::registry::MatchRegistry;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address to bind, host:port.
    pub bind_address: String,
    /// Connections beyond this are refused at accept time.
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4000".to_string(),
            max_connections: 1_000,
        }
    }
}

/// Errors raised while serving.
#[derive(Debug, thiserror::Error)]
pub enum MatchServerError {
    /// The listen socket could not be opened.
    #[error("failed to bind {address}: {source}")]
    BindFailed {
        /// The configured bind address.
        address: String,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// WebSocket handshake or transport failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// The WebSocket front end.
pub struct MatchServer {
    config: ServerConfig,
    registry: Arc<MatchRegistry>,
    broadcaster: Broadcaster,
    connections: Arc<AtomicUsize>,
    shutdown: broadcast::Sender<()>,
}

impl MatchServer {
    /// Create a server over the shared registry and broadcast channel.
    pub fn new(config: ServerConfig, registry: Arc<MatchRegistry>, broadcaster: Broadcaster) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            config,
            registry,
            broadcaster,
            connections: Arc::new(AtomicUsize::new(0)),
            shutdown,
        }
    }

    /// Signal every connection task to close and the accept loop to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    /// Bind and serve until shut down.
    pub async fn run(&self) -> Result<(), MatchServerError> {
        let listener =
            TcpListener::bind(&self.config.bind_address)
                .await
                .map_err(|source| MatchServerError::BindFailed {
                    address: self.config.bind_address.clone(),
                    source,
                })?;
        info!(address = %self.config.bind_address, "websocket server listening");

        let mut shutdown_rx = self.shutdown.subscribe();
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            if self.connections.load(Ordering::Relaxed) >= self.config.max_connections {
                                warn!(%peer, "connection refused, at capacity");
                                continue;
                            }
                            self.connections.fetch_add(1, Ordering::Relaxed);

                            let registry = Arc::clone(&self.registry);
                            let broadcaster = self.broadcaster.clone();
                            let connections = Arc::clone(&self.connections);
                            let shutdown_rx = self.shutdown.subscribe();

                            tokio::spawn(async move {
                                debug!(%peer, "client connected");
                                if let Err(e) =
                                    handle_connection(stream, registry, broadcaster, shutdown_rx).await
                                {
                                    debug!(%peer, error = %e, "connection closed with error");
                                }
                                connections.fetch_sub(1, Ordering::Relaxed);
                                debug!(%peer, "client disconnected");
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "accept failed");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("server shutting down");
                    return Ok(());
                }
            }
        }
    }
}

/// Serve one client until it disconnects or the server shuts down.
async fn handle_connection(
    stream: TcpStream,
    registry: Arc<MatchRegistry>,
    broadcaster: Broadcaster,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), MatchServerError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_tx, mut ws_rx) = ws.split();

    // Creation draws weapons per player; entropy-seeded so concurrent
    // clients never share a stream.
    let mut rng = SimRng::from_entropy();
    let mut notifications = broadcaster.subscribe();

    // Full listing on connect, before any pushes.
    let hello = ServerMessage::AllMatches {
        matches: registry.snapshot_all().await,
    };
    send_message(&mut ws_tx, &hello).await?;

    loop {
        tokio::select! {
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(msg)) if msg.is_text() => {
                        let text = msg.into_text()?;
                        let reply = handle_client_message(&text, &registry, &mut rng).await;
                        send_message(&mut ws_tx, &reply).await?;
                    }
                    Some(Ok(msg)) if msg.is_close() => return Ok(()),
                    Some(Ok(_)) => {
                        // Binary and control frames are ignored
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(()),
                }
            }
            notification = notifications.recv() => {
                match notification {
                    Ok(Notification::MatchUpdate(state)) => {
                        send_message(&mut ws_tx, &ServerMessage::MatchUpdate(state)).await?;
                    }
                    Ok(Notification::MatchFinished(state)) => {
                        send_message(&mut ws_tx, &ServerMessage::MatchFinished(state)).await?;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "client fell behind, dropping updates");
                    }
                    Err(broadcast::error::RecvError::Closed) => return Ok(()),
                }
            }
            _ = shutdown_rx.recv() => {
                let _ = ws_tx.send(tokio_tungstenite::tungstenite::Message::Close(None)).await;
                return Ok(());
            }
        }
    }
}

async fn send_message<S>(sink: &mut S, message: &ServerMessage) -> Result<(), MatchServerError>
where
    S: SinkExt<tokio_tungstenite::tungstenite::Message, Error = tokio_tungstenite::tungstenite::Error>
        + Unpin,
{
    match message.to_json() {
        Ok(json) => {
            sink.send(tokio_tungstenite::tungstenite::Message::Text(json))
                .await
                .map_err(MatchServerError::from)
        }
        Err(e) => {
            // Snapshots always serialize; treat failure as a bug, not a
            // reason to kill the connection.
            error!(error = %e, "failed to serialize server message");
            Ok(())
        }
    }
}

/// Dispatch one client frame and produce the reply.
async fn handle_client_message(
    text: &str,
    registry: &MatchRegistry,
    rng: &mut SimRng,
) -> ServerMessage {
    let message = match ClientMessage::from_json(text) {
        Ok(m) => m,
        Err(e) => {
            debug!(error = %e, "unparseable client frame");
            return ServerMessage::Error(ServerError::new(
                ErrorCode::InvalidRequest,
                format!("invalid message: {e}"),
            ));
        }
    };

    match message {
        ClientMessage::CreateMatch(params) => match registry.create(params, rng).await {
            Ok(snapshot) => ServerMessage::MatchCreated(snapshot),
            Err(e) => ServerMessage::Error(e.into()),
        },
        ClientMessage::ListMatches => ServerMessage::AllMatches {
            matches: registry.snapshot_all().await,
        },
        ClientMessage::GetMatch { match_id } => match registry.find(match_id).await {
            Some(handle) => ServerMessage::Match(handle.read().await.clone()),
            None => ServerMessage::Error(ServerError::new(
                ErrorCode::MatchNotFound,
                format!("no match with id {match_id}"),
            )),
        },
        ClientMessage::Ping { timestamp } => ServerMessage::Pong {
            timestamp,
            server_time: Utc::now().timestamp_millis(),
        },
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{CreateMatchParams, TeamParams};

    fn params() -> CreateMatchParams {
        CreateMatchParams {
            map_id: 1,
            team1: TeamParams {
                name: "Alpha".to_string(),
                players: vec!["a".to_string()],
            },
            team2: TeamParams {
                name: "Bravo".to_string(),
                players: vec!["b".to_string()],
            },
            team_players_count: 1,
        }
    }

    #[tokio::test]
    async fn test_create_match_request_creates_and_replies() {
        let registry = MatchRegistry::new();
        let mut rng = SimRng::new(1);
        let text = ClientMessage::CreateMatch(params()).to_json().unwrap();

        let reply = handle_client_message(&text, &registry, &mut rng).await;

        match reply {
            ServerMessage::MatchCreated(state) => {
                assert_eq!(state.round, 1);
                assert!(!state.finished);
            }
            other => panic!("unexpected reply {other:?}"),
        }
        assert_eq!(registry.counts().await, (1, 0));
    }

    #[tokio::test]
    async fn test_invalid_create_is_rejected_without_side_effects() {
        let registry = MatchRegistry::new();
        let mut rng = SimRng::new(2);
        let mut p = params();
        p.team_players_count = 0;
        let text = ClientMessage::CreateMatch(p).to_json().unwrap();

        let reply = handle_client_message(&text, &registry, &mut rng).await;

        match reply {
            ServerMessage::Error(err) => assert_eq!(err.code, ErrorCode::InvalidRequest),
            other => panic!("unexpected reply {other:?}"),
        }
        assert_eq!(registry.counts().await, (0, 0));
    }

    #[tokio::test]
    async fn test_list_matches_returns_everything() {
        let registry = MatchRegistry::new();
        let mut rng = SimRng::new(3);
        let a = registry.create(params(), &mut rng).await.unwrap();
        let b = registry.create(params(), &mut rng).await.unwrap();
        registry.finish(b.match_id).await;

        let text = ClientMessage::ListMatches.to_json().unwrap();
        let reply = handle_client_message(&text, &registry, &mut rng).await;

        match reply {
            ServerMessage::AllMatches { matches } => {
                assert_eq!(matches.len(), 2);
                assert_eq!(matches[0].match_id, a.match_id);
                assert_eq!(matches[1].match_id, b.match_id);
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_match_hits_and_misses() {
        let registry = MatchRegistry::new();
        let mut rng = SimRng::new(4);
        let created = registry.create(params(), &mut rng).await.unwrap();

        let hit = ClientMessage::GetMatch {
            match_id: created.match_id,
        }
        .to_json()
        .unwrap();
        match handle_client_message(&hit, &registry, &mut rng).await {
            ServerMessage::Match(state) => assert_eq!(state.match_id, created.match_id),
            other => panic!("unexpected reply {other:?}"),
        }

        let miss = ClientMessage::GetMatch {
            match_id: crate::game::state::MatchId::new(),
        }
        .to_json()
        .unwrap();
        match handle_client_message(&miss, &registry, &mut rng).await {
            ServerMessage::Error(err) => assert_eq!(err.code, ErrorCode::MatchNotFound),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ping_echoes_timestamp() {
        let registry = MatchRegistry::new();
        let mut rng = SimRng::new(5);
        let text = ClientMessage::Ping { timestamp: 1234 }.to_json().unwrap();

        match handle_client_message(&text, &registry, &mut rng).await {
            ServerMessage::Pong {
                timestamp,
                server_time,
            } => {
                assert_eq!(timestamp, 1234);
                assert!(server_time > 0);
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_garbage_frame_yields_invalid_request() {
        let registry = MatchRegistry::new();
        let mut rng = SimRng::new(6);

        match handle_client_message("{]", &registry, &mut rng).await {
            ServerMessage::Error(err) => assert_eq!(err.code, ErrorCode::InvalidRequest),
            other => panic!("unexpected reply {other:?}"),
        }
    }
}
