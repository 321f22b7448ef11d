//! WebSocket connections.
//!
//! Each socket is one [`ConnectionId`]. Inbound text frames are parsed as
//! [`ClientMessage`]s and dispatched to the engine. Outbound traffic (direct
//! replies and the joined session's audience events) funnels through one
//! bounded channel drained by a writer task, so frames leave in the order
//! they were queued.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::Result;
use super::http::AppState;
use crate::error::TransportError;
use crate::game::engine::GameEngine;
use crate::game::session::{ConnectionId, SessionKey};
use crate::observability::metrics;
use crate::protocol::{ClientMessage, ServerEvent};

/// Outbound events buffered per connection.
pub const OUTBOUND_CAPACITY: usize = 256;

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let id = state.next_connection_id();
    let (tx, rx) = mpsc::channel::<ServerEvent>(OUTBOUND_CAPACITY);

    metrics::connection_opened();
    info!(connection = %id, "WebSocket connection established");

    let writer = tokio::spawn(async move {
        if let Err(e) = write_events(ws_sender, rx).await {
            debug!(connection = %id, error = %e, "stopped writing events");
        }
    });

    let mut connection = Connection::new(id, state.engine().clone(), tx);
    let cancel = state.cancellation().clone();
    loop {
        let frame = tokio::select! {
            () = cancel.cancelled() => break,
            frame = ws_receiver.next() => frame,
        };
        match frame {
            Some(Ok(Message::Text(text))) => connection.handle_text(text.as_str()).await,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(e)) => {
                debug!(connection = %id, error = %e, "WebSocket error");
                break;
            }
            // Pings are answered by axum; binary frames are not part of the protocol.
            Some(Ok(_)) => {}
        }
    }

    connection.close().await;
    let _ = writer.await;
    metrics::connection_closed();
    info!(connection = %id, "WebSocket connection terminated");
}

/// Drains `events` into `sink` as JSON text frames, then closes the sink.
///
/// # Errors
///
/// Returns [`TransportError::ConnectionClosed`] once the peer stops
/// accepting frames, or [`TransportError::Json`] if an event cannot be
/// encoded.
pub async fn write_events<S>(
    mut sink: S,
    mut events: mpsc::Receiver<ServerEvent>,
) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    while let Some(event) = events.recv().await {
        let json = serde_json::to_string(&event)?;
        sink.send(Message::Text(json.into()))
            .await
            .map_err(|e| TransportError::ConnectionClosed(e.to_string()))?;
    }
    let _ = sink.close().await;
    Ok(())
}

/// Protocol state of one client connection, independent of the socket.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    engine: GameEngine,
    outbound: mpsc::Sender<ServerEvent>,
    audience: Option<JoinHandle<()>>,
}

impl Connection {
    /// Creates a connection that queues outgoing events on `outbound`.
    #[must_use]
    pub fn new(id: ConnectionId, engine: GameEngine, outbound: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            id,
            engine,
            outbound,
            audience: None,
        }
    }

    /// Connection id.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Parses and handles one text frame. Malformed frames get an `error`
    /// reply and change nothing.
    pub async fn handle_text(&mut self, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => self.handle_message(message).await,
            Err(e) => {
                debug!(connection = %self.id, error = %e, "rejected malformed message");
                self.reply(ServerEvent::Error {
                    message: format!("invalid message: {e}"),
                })
                .await;
            }
        }
    }

    /// Handles one parsed client message.
    pub async fn handle_message(&mut self, message: ClientMessage) {
        let key = message.game_key();
        if key.as_str().is_empty() {
            self.reply(ServerEvent::Error {
                message: "game_key must not be empty".to_string(),
            })
            .await;
            return;
        }

        if let Some(request) = message.move_request() {
            if let Err(rejection) = self.engine.submit_move(&key, self.id, request).await {
                self.reply(ServerEvent::MoveRejected {
                    code: rejection.label().to_string(),
                    reason: rejection.to_string(),
                })
                .await;
            }
            return;
        }

        match message {
            ClientMessage::JoinGame {
                player_name, team, ..
            } => {
                let joined = self.engine.join(&key, self.id, player_name, team).await;
                self.reply(ServerEvent::GameState(joined.snapshot)).await;
                self.follow(joined.events);
            }
            ClientMessage::TogglePause { .. } => {
                if self.engine.toggle_pause(&key).await.is_none() {
                    self.reply_missing(&key).await;
                }
            }
            ClientMessage::FinishGame { .. } => {
                if !self.engine.finish(&key).await {
                    self.reply_missing(&key).await;
                }
            }
            ClientMessage::Move { .. } => {}
        }
    }

    /// Detaches from the followed session and removes this connection's
    /// player entries everywhere.
    pub async fn close(mut self) {
        if let Some(audience) = self.audience.take() {
            audience.abort();
        }
        let sessions = self.engine.disconnect(self.id).await;
        debug!(connection = %self.id, sessions, "connection closed");
    }

    /// Starts forwarding a session's audience events, replacing any session
    /// followed before.
    fn follow(&mut self, events: broadcast::Receiver<ServerEvent>) {
        if let Some(previous) = self.audience.take() {
            previous.abort();
        }
        self.audience = Some(tokio::spawn(forward_audience(
            events,
            self.outbound.clone(),
            self.id,
        )));
    }

    async fn reply(&self, event: ServerEvent) {
        if self.outbound.send(event).await.is_err() {
            debug!(connection = %self.id, "outbound channel closed, dropping reply");
        }
    }

    async fn reply_missing(&self, key: &SessionKey) {
        self.reply(ServerEvent::Error {
            message: format!("session '{key}' does not exist"),
        })
        .await;
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(audience) = self.audience.take() {
            audience.abort();
        }
    }
}

/// Copies audience events onto a connection's outbound channel until the
/// session finishes or the connection goes away.
async fn forward_audience(
    mut events: broadcast::Receiver<ServerEvent>,
    outbound: mpsc::Sender<ServerEvent>,
    connection: ConnectionId,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let finished = matches!(event, ServerEvent::GameFinished { .. });
                if outbound.send(event).await.is_err() || finished {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                // The next game_state brings the client back in sync.
                warn!(%connection, skipped, "connection lagging, events dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
