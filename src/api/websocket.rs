//! WebSocket support for real-time vault updates
//!
//! Provides a broadcast channel for pushing events to connected clients.

use crate::api::handlers::ApiState;
use crate::vault::{Address, EventRecord};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Maximum number of events to buffer per subscriber
const BROADCAST_CAPACITY: usize = 100;

/// WebSocket events that can be broadcast to clients
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsEvent {
    /// A vault operation emitted an event
    VaultEvent { record: EventRecord },
    /// Connection established
    Connected {
        message: String,
        vault: Address,
        next_sequence: u64,
    },
    /// Heartbeat to keep connection alive
    Ping,
}

/// Broadcaster for WebSocket events
#[derive(Debug)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsEvent>,
}

impl WsBroadcaster {
    /// Create a new broadcaster
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Broadcast an event to all connected clients
    pub fn broadcast(&self, event: WsEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<WsEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> impl IntoResponse {
    let welcome = {
        let deployment = state.deployment.read().await;
        WsEvent::Connected {
            message: "Connected to vault event stream".to_string(),
            vault: deployment.vault.address(),
            next_sequence: deployment.vault.events().len() as u64,
        }
    };
    let broadcaster = state.ws_broadcaster.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster, welcome))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, broadcaster: Arc<WsBroadcaster>, welcome: WsEvent) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before greeting so nothing falls in between
    let mut rx = broadcaster.subscribe();

    if let Ok(json) = serde_json::to_string(&welcome) {
        let _ = sender.send(Message::Text(json.into())).await;
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Ok(json) = serde_json::to_string(&event) {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("WebSocket client lagged, {} events skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(Message::Text(text)) => {
                    log::debug!("Ignoring client message: {}", text);
                }
                Err(e) => {
                    log::warn!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    log::info!("WebSocket connection closed");
}
