//! WebSocket endpoints.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use roiscope_core::protocol::{ChannelCommand, ChannelId, StreamMessage};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::relay::{FramePayload, RelayState};
use crate::source::timestamp;

/// `GET /ws/channel`
pub async fn channel_handler(ws: WebSocketUpgrade, State(state): State<Arc<RelayState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_channel_socket(socket, state))
}

/// `GET /ws/alert`
pub async fn alert_handler(ws: WebSocketUpgrade, State(state): State<Arc<RelayState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_alert_socket(socket, state))
}

fn encode(message: &StreamMessage) -> Option<Message> {
    match message.to_json() {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            warn!("Failed to encode reply: {}", e);
            None
        }
    }
}

/// One subscription per connection; a new subscribe replaces the old one.
async fn handle_channel_socket(socket: WebSocket, state: Arc<RelayState>) {
    let conn_id = Uuid::new_v4();
    info!("Channel connection opened: {}", conn_id);

    let (mut sender, mut receiver) = socket.split();
    let mut current: Option<ChannelId> = None;
    let mut frames: Option<watch::Receiver<FramePayload>> = None;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let ChannelCommand::Subscribe { channel_id } = match serde_json::from_str::<ChannelCommand>(&text) {
                            Ok(command) => command,
                            Err(e) => {
                                warn!("Invalid directive from {}: {}", conn_id, e);
                                continue;
                            }
                        };

                        if current != Some(channel_id) {
                            frames = Some(state.subscribe(channel_id));
                            if let Some(old) = current.replace(channel_id) {
                                debug!("{} leaving channel {}", conn_id, old);
                                state.release(old);
                            }
                        }
                        info!("{} subscribed to channel {}", conn_id, channel_id);

                        let confirmed = StreamMessage::SubscriptionConfirmed {
                            channel_id,
                            timestamp: Some(timestamp()),
                        };
                        if let Some(reply) = encode(&confirmed) {
                            if sender.send(reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // Ignore binary/ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", conn_id, e);
                        break;
                    }
                }
            }

            changed = async {
                match &mut frames {
                    Some(rx) => rx.changed().await.is_ok(),
                    // Nothing subscribed yet, wait for a directive
                    None => std::future::pending::<bool>().await,
                }
            } => {
                if !changed {
                    frames = None;
                    continue;
                }
                let payload = frames.as_mut().and_then(|rx| rx.borrow_and_update().clone());
                if let Some(json) = payload {
                    if sender.send(Message::Text(json.to_string().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    drop(frames);
    if let Some(channel_id) = current {
        state.release(channel_id);
    }
    info!("Channel connection closed: {}", conn_id);
}

async fn handle_alert_socket(socket: WebSocket, state: Arc<RelayState>) {
    let conn_id = Uuid::new_v4();
    info!("Alert connection opened: {}", conn_id);

    let (mut sender, mut receiver) = socket.split();
    let mut alerts = state.subscribe_alerts();

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(_))) => {
                        let confirmed = StreamMessage::AlertSubscriptionConfirmed {
                            timestamp: Some(timestamp()),
                        };
                        if let Some(reply) = encode(&confirmed) {
                            if sender.send(reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", conn_id, e);
                        break;
                    }
                }
            }

            alert = alerts.recv() => {
                match alert {
                    Ok(json) => {
                        if sender.send(Message::Text(json.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Alert connection {} lagged, skipped {} alerts", conn_id, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    info!("Alert connection closed: {}", conn_id);
}
