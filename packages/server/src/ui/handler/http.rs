//! HTTP API endpoint handlers.
//!
//! イベント経路と同じユースケースの薄いアダプタ。ここで作成・参加した
//! 状態もイベント経路と同じ不変条件（同じ Store、同じブロードキャスト）に従う。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::{RoomId, Username},
    infrastructure::dto::http::{
        CreateRoomRequest, CreateRoomResponse, JoinRoomRequest, RoomDetailDto, RoomSummaryDto,
    },
    infrastructure::dto::websocket::ServerEvent,
    ui::state::AppState,
    usecase::JoinRoomError,
};

use super::websocket::{broadcast_event, broadcast_room_details};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Create a room (`POST /createroom`)
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), (StatusCode, String)> {
    let username = Username::new(request.username)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    // HTTP 経由の作成では接続の束縛は行わない（後から WebSocket で join する）
    let outcome = state.create_room_usecase.execute(username, None).await;

    Ok((
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            room_id: outcome.room.id.as_str().to_string(),
        }),
    ))
}

/// Join a room (`POST /joinroom`)
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<RoomDetailDto>, (StatusCode, String)> {
    let room_id =
        RoomId::new(request.room_id).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let username =
        Username::new(request.username).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    match state
        .join_room_usecase
        .execute(room_id.clone(), username.clone(), None)
        .await
    {
        Ok(outcome) => {
            // イベント経路と同じ通知をルームの接続済みメンバーへ送る
            broadcast_event(
                &state,
                &room_id,
                &ServerEvent::UserJoined {
                    username: username.as_str().to_string(),
                },
                None,
            )
            .await;
            broadcast_room_details(&state, &room_id).await;

            Ok(Json(RoomDetailDto::from(&outcome.room)))
        }
        Err(JoinRoomError::RoomNotFound(id)) => Err((
            StatusCode::NOT_FOUND,
            format!("Room {id} does not exist"),
        )),
    }
}

/// Get list of rooms (`GET /rooms`)
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.get_rooms_usecase.execute().await;

    // Domain Model から DTO への変換
    let summaries: Vec<RoomSummaryDto> = rooms.iter().map(RoomSummaryDto::from).collect();
    Json(summaries)
}

/// Get room detail by ID (`GET /room/{room_id}`)
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let room_id = RoomId::new(room_id).map_err(|_| StatusCode::NOT_FOUND)?;

    match state.get_room_detail_usecase.execute(&room_id).await {
        Ok(room) => Ok(Json(RoomDetailDto::from(&room))),
        Err(_) => Err(StatusCode::NOT_FOUND),
    }
}
