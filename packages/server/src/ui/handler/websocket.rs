//! WebSocket connection handlers.
//!
//! ここがイベントルーティングの境界になる。受信テキストは閉じたイベント集合
//! （`ClientEvent`）として deserialize され、ここを通らない入力が
//! Room Store / Connection Registry に触れることはない。
//! 認識できないイベントはログに記録するだけで、状態遷移もエラー応答も行わない。

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, MessageContent, RoomId, Username},
    infrastructure::dto::conversion::members_dto,
    infrastructure::dto::websocket::{ClientEvent, ServerEvent},
    ui::state::AppState,
    usecase::{Departure, JoinRoomError, LeaveRoomError},
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // 接続 ID はサーバ側で採番する。ルームへの束縛は join/create 時に行われる
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// This function handles the outbound message flow: events addressed to this
/// connection (via rx channel) are written to its WebSocket.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionId::new();
    let (sender, mut receiver) = socket.split();

    // Create a channel for this connection to receive events
    let (tx, rx) = mpsc::unbounded_channel();
    state.message_pusher.register_client(connection_id, tx).await;
    tracing::info!("connection '{}' established", connection_id);

    // Spawn a task to receive events from the coordinator and send to this client
    let mut send_task = pusher_loop(rx, sender);

    // Spawn a task to receive events from this client
    let state_for_recv = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match message {
                Message::Text(text) => {
                    match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => dispatch_event(&state_for_recv, connection_id, event).await,
                        Err(e) => {
                            // 未知のイベント / 不正なペイロード: ログのみ
                            tracing::warn!(
                                "unrecognized event from '{}': {} ({})",
                                connection_id,
                                text,
                                e
                            );
                        }
                    }
                }
                Message::Close(_) => {
                    tracing::info!("connection '{}' requested close", connection_id);
                    break;
                }
                Message::Ping(_) => {
                    // Ping/pong is handled automatically by the WebSocket protocol
                    tracing::debug!("received ping");
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // 切断のクリーンアップは明示的な退室と同じ経路を通る
    state.message_pusher.unregister_client(&connection_id).await;
    match state.leave_room_usecase.on_disconnect(&connection_id).await {
        Some(departure) => {
            tracing::info!(
                "connection '{}' disconnected, left room '{}'",
                connection_id,
                departure.room_id
            );
            broadcast_departure(&state, &departure).await;
        }
        None => {
            tracing::debug!("connection '{}' disconnected (no room binding)", connection_id);
        }
    }
}

/// 受理したイベントを対応するユースケースへ振り分ける
async fn dispatch_event(state: &Arc<AppState>, connection_id: ConnectionId, event: ClientEvent) {
    match event {
        ClientEvent::CreateRoom { username } => {
            handle_create_room(state, connection_id, username).await;
        }
        ClientEvent::JoinRoom { room_id, username } => {
            handle_join_room(state, connection_id, room_id, username).await;
        }
        ClientEvent::LeaveRoom => {
            handle_leave_room(state, connection_id).await;
        }
        ClientEvent::ChatMessage {
            room_id,
            username,
            message,
        } => {
            handle_chat_message(state, connection_id, room_id, username, message).await;
        }
    }
}

async fn handle_create_room(state: &Arc<AppState>, connection_id: ConnectionId, username: String) {
    let username = match Username::new(username) {
        Ok(username) => username,
        Err(e) => {
            push_error(state, &connection_id, &e.to_string()).await;
            return;
        }
    };

    let outcome = state
        .create_room_usecase
        .execute(username.clone(), Some(connection_id))
        .await;

    push_event(
        state,
        &connection_id,
        &ServerEvent::RoomCreated {
            room_id: outcome.room.id.as_str().to_string(),
            username: username.as_str().to_string(),
        },
    )
    .await;
    broadcast_room_details(state, &outcome.room.id).await;

    if let Some(departure) = outcome.departed {
        broadcast_departure(state, &departure).await;
    }
}

async fn handle_join_room(
    state: &Arc<AppState>,
    connection_id: ConnectionId,
    room_id: String,
    username: String,
) {
    let room_id = match RoomId::new(room_id) {
        Ok(room_id) => room_id,
        Err(e) => {
            push_error(state, &connection_id, &e.to_string()).await;
            return;
        }
    };
    let username = match Username::new(username) {
        Ok(username) => username,
        Err(e) => {
            push_error(state, &connection_id, &e.to_string()).await;
            return;
        }
    };

    match state
        .join_room_usecase
        .execute(room_id.clone(), username.clone(), Some(connection_id))
        .await
    {
        Ok(outcome) => {
            push_event(
                state,
                &connection_id,
                &ServerEvent::JoinRoomSuccess {
                    room_id: room_id.as_str().to_string(),
                    members: members_dto(&outcome.room),
                },
            )
            .await;
            broadcast_event(
                state,
                &room_id,
                &ServerEvent::UserJoined {
                    username: username.as_str().to_string(),
                },
                Some(&connection_id),
            )
            .await;
            broadcast_room_details(state, &room_id).await;

            if let Some(departure) = outcome.departed {
                broadcast_departure(state, &departure).await;
            }
        }
        Err(JoinRoomError::RoomNotFound(id)) => {
            // エラーは発生元の接続だけに返す
            push_error(state, &connection_id, &format!("Room {id} does not exist")).await;
        }
    }
}

async fn handle_leave_room(state: &Arc<AppState>, connection_id: ConnectionId) {
    match state.leave_room_usecase.execute(&connection_id).await {
        Ok(departure) => {
            broadcast_departure(state, &departure).await;
        }
        Err(LeaveRoomError::NotInRoom) => {
            push_error(state, &connection_id, "You are not in a room").await;
        }
    }
}

async fn handle_chat_message(
    state: &Arc<AppState>,
    connection_id: ConnectionId,
    room_id: String,
    username: String,
    message: String,
) {
    // チャットは pass-through: 送信者の同一性は検証しない。
    // 形式だけ検証し、不正なら黙って捨てる（エラー応答もしない）
    let room_id = match RoomId::new(room_id) {
        Ok(room_id) => room_id,
        Err(e) => {
            tracing::warn!("chat from '{}' dropped: {}", connection_id, e);
            return;
        }
    };
    let content = match MessageContent::new(message) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("chat from '{}' dropped: {}", connection_id, e);
            return;
        }
    };

    let event = ServerEvent::Message {
        username,
        text: content.into_string(),
    };
    let Some(payload) = to_json(&event) else {
        return;
    };
    state.send_message_usecase.execute(&room_id, &payload).await;
}

fn to_json(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!("failed to serialize server event: {}", e);
            None
        }
    }
}

/// イベントを 1 つの接続へ送る
pub(crate) async fn push_event(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    event: &ServerEvent,
) {
    let Some(json) = to_json(event) else {
        return;
    };
    if let Err(e) = state.message_pusher.push_to(connection_id, &json).await {
        tracing::warn!("failed to push event to '{}': {}", connection_id, e);
    }
}

async fn push_error(state: &Arc<AppState>, connection_id: &ConnectionId, message: &str) {
    push_event(
        state,
        connection_id,
        &ServerEvent::ErrorMessage {
            message: message.to_string(),
        },
    )
    .await;
}

/// イベントをルームへブロードキャストする
pub(crate) async fn broadcast_event(
    state: &Arc<AppState>,
    room_id: &RoomId,
    event: &ServerEvent,
    exclude: Option<&ConnectionId>,
) {
    let Some(json) = to_json(event) else {
        return;
    };
    state
        .broadcaster
        .broadcast_to_room(room_id, &json, exclude)
        .await;
}

/// 配信時点の Room Store の状態からメンバー一覧を再計算してブロードキャストする
pub(crate) async fn broadcast_room_details(state: &Arc<AppState>, room_id: &RoomId) {
    match state.get_room_detail_usecase.execute(room_id).await {
        Ok(room) => {
            broadcast_event(
                state,
                room_id,
                &ServerEvent::RoomDetails {
                    room_id: room_id.as_str().to_string(),
                    members: members_dto(&room),
                },
                None,
            )
            .await;
        }
        Err(_) => {
            // 直後に削除されたルーム: 配送先も残っていない
        }
    }
}

/// 退室を旧ルームの残りメンバーへ通知する
pub(crate) async fn broadcast_departure(state: &Arc<AppState>, departure: &Departure) {
    // 再 join に追い越されてメンバーが残った場合は通知しない
    if !departure.removed || departure.room_deleted {
        return;
    }
    broadcast_event(
        state,
        &departure.room_id,
        &ServerEvent::UserLeft {
            username: departure.username.as_str().to_string(),
        },
        None,
    )
    .await;
    broadcast_room_details(state, &departure.room_id).await;
}
