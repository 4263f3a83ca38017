//! WebSocket push channel for seat availability.
//!
//! ```text
//! Client          WebSocket Handler          AvailabilityNotifier
//!   │                    │                            │
//!   ├─ Connect ─────────>│                            │
//!   │                    ├─ subscribe() ─────────────>│
//!   │                    │<── SeatUpdate ─────────────┤
//!   │<─ seat_update ─────┤                            │
//!   ├─ Close ───────────>│                            │
//!   │                    ├─ unsubscribe() ───────────>│
//! ```
//!
//! # Message Protocol
//!
//! **Server → Client:**
//! ```json
//! { "type": "seat_update", "seatIds": [12, 13] }
//! ```
//!
//! Inbound messages carry no meaning; the socket is read only to notice the
//! client going away.

use crate::state::AppState;
use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use boxoffice_core::{SeatId, SeatLedger, SeatUpdate};
use boxoffice_runtime::AvailabilityNotifier;
use futures::{SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

/// WebSocket message from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeatWsMessage {
    /// Seats whose status changed; clients re-read the seat map
    SeatUpdate {
        /// Changed seats
        #[serde(rename = "seatIds")]
        seat_ids: Vec<SeatId>,
    },
}

impl From<SeatUpdate> for SeatWsMessage {
    fn from(update: SeatUpdate) -> Self {
        Self::SeatUpdate {
            seat_ids: update.seat_ids,
        }
    }
}

/// Upgrade to a seat availability stream.
///
/// ```javascript
/// const ws = new WebSocket('ws://localhost:8080/ws');
/// ws.onmessage = (event) => {
///   const msg = JSON.parse(event.data);
///   if (msg.type === 'seat_update') refreshSeatMap();
/// };
/// ```
#[allow(clippy::unused_async)] // Axum handler signature requires async
pub async fn handle<L: SeatLedger>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<L>>,
) -> Response {
    debug!("WebSocket connection requested");
    let notifier = Arc::clone(&state.notifier);
    ws.on_upgrade(move |socket| handle_socket(socket, notifier))
}

/// Connection lifecycle: one task forwards updates, one watches for close.
/// Whichever finishes first ends the connection and the observer is removed.
async fn handle_socket(socket: WebSocket, notifier: Arc<AvailabilityNotifier>) {
    let mut observer = notifier.subscribe();
    let observer_id = observer.id();
    info!(observer = %observer_id, "WebSocket observer connected");

    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(update) = observer.recv().await {
            let message = match serde_json::to_string(&SeatWsMessage::from(update)) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    error!(error = %e, "Failed to serialize seat update");
                    continue;
                }
            };

            if sender.send(message).await.is_err() {
                break;
            }
        }

        // Observer was dropped from the registry or the client is gone.
        let _ = sender.close().await;
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => {
            debug!(observer = %observer_id, "Send task completed, aborting receive task");
            recv_task.abort();
        },
        _ = (&mut recv_task) => {
            debug!(observer = %observer_id, "Receive task completed, aborting send task");
            send_task.abort();
        },
    }

    notifier.unsubscribe(observer_id);
    info!(observer = %observer_id, "WebSocket observer disconnected");
}
