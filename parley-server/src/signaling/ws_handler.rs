use crate::AppState;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use parley_core::{ClientMessage, ConnectionId, Participant, ServerMessage};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = ConnectionId::new();
    info!("New WebSocket connection: {:?}", connection_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    state.signaling.attach(connection_id.clone(), tx);
    state.signaling.send_signal(
        &connection_id,
        ServerMessage::Welcome {
            connection_id: connection_id.clone(),
        },
    );
    state.signaling.send_signal(
        &connection_id,
        ServerMessage::IceConfig {
            ice_servers: state.signaling.ice_servers(),
        },
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize server message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let state = state.clone();
        let connection_id = connection_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(msg) => dispatch(&state, &connection_id, msg).await,
                        Err(e) => warn!("Invalid ClientMessage from {:?}: {}", connection_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    state.signaling.detach(&connection_id);
    state.rooms.disconnect(connection_id.clone()).await;
    info!("WebSocket disconnected: {:?}", connection_id);
}

/// Routes one decoded client frame. Shared by the socket loop and in-process callers.
pub async fn dispatch(state: &AppState, connection_id: &ConnectionId, msg: ClientMessage) {
    match msg {
        ClientMessage::JoinRoom {
            room_id,
            user_id,
            display_name,
        } => {
            let participant = Participant {
                connection_id: connection_id.clone(),
                user_id,
                display_name,
            };
            state.rooms.join(room_id, participant).await;
        }

        ClientMessage::LeaveRoom { room_id } => {
            state.rooms.leave(room_id, connection_id.clone()).await;
        }

        ClientMessage::Signal(envelope) => {
            debug!(
                "Relaying signal {:?} -> {:?} in '{}'",
                connection_id, envelope.target, envelope.room_id
            );
            state.signaling.relay(connection_id, envelope);
        }

        ClientMessage::JoinText { room_id } => {
            state.rooms.join_text(room_id, connection_id.clone()).await;
        }

        ClientMessage::LeaveText { room_id } => {
            state.rooms.leave_text(room_id, connection_id.clone()).await;
        }

        ClientMessage::TypingStart {
            room_id,
            user_id,
            display_name,
        } => {
            state
                .rooms
                .typing(room_id, connection_id.clone(), user_id, display_name, true)
                .await;
        }

        ClientMessage::TypingStop {
            room_id,
            user_id,
            display_name,
        } => {
            state
                .rooms
                .typing(room_id, connection_id.clone(), user_id, display_name, false)
                .await;
        }
    }
}
