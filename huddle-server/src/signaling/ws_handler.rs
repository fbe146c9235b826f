use crate::AppState;
use crate::signaling::{SignalingService, parse_frame};
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tracing::{error, info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.signaling, state.idle_timeout))
}

async fn handle_socket(
    socket: WebSocket,
    service: SignalingService,
    idle_timeout: Option<Duration>,
) {
    let (participant_id, mut rx) = service.connect();
    info!("New WebSocket connection: {}", participant_id);

    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize signal message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            loop {
                let next = match idle_timeout {
                    Some(limit) => match tokio::time::timeout(limit, receiver.next()).await {
                        Ok(next) => next,
                        Err(_) => {
                            warn!(
                                "No traffic from {} for {:?}, closing",
                                participant_id, limit
                            );
                            break;
                        }
                    },
                    None => receiver.next().await,
                };

                match next {
                    Some(Ok(Message::Text(text))) => match parse_frame(text.as_str()) {
                        Ok(msg) => service.dispatch(participant_id, msg),
                        Err(e) => service.reject(participant_id, &e),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", participant_id, e);
                        break;
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.disconnect(&participant_id);
    info!("WebSocket disconnected: {}", participant_id);
}
