//! WebSocket client session management.

use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tamariba_server::infrastructure::dto::websocket::{ClientEvent, ServerEvent};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::{error::ClientError, formatter::MessageFormatter, ui::redisplay_prompt};

/// Run the WebSocket client session.
///
/// Creates a new room when `room` is `None`, otherwise joins the given room.
/// Terminal lines are sent as chat messages; `/leave` leaves the current room.
pub async fn run_client_session(
    url: &str,
    username: &str,
    room: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to room server");
    println!(
        "\nYou are '{}'. Type messages and press Enter to send. Type /leave to leave the room, Ctrl+C to exit.\n",
        username
    );

    let (mut write, mut read) = ws_stream.split();

    // 現在参加中のルーム。サーバからの roomCreated / joinRoomSuccess で更新される
    let current_room = Arc::new(Mutex::new(None::<String>));

    // Send the initial create/join event
    let initial_event = match &room {
        Some(room_id) => ClientEvent::JoinRoom {
            room_id: room_id.clone(),
            username: username.to_string(),
        },
        None => ClientEvent::CreateRoom {
            username: username.to_string(),
        },
    };
    let json = serde_json::to_string(&initial_event)
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    write
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    // Spawn a task to handle incoming events
    let username_for_read = username.to_string();
    let room_for_read = current_room.clone();
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let formatted = match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(ServerEvent::RoomCreated { room_id, .. }) => {
                            if let Ok(mut current) = room_for_read.lock() {
                                *current = Some(room_id.clone());
                            }
                            MessageFormatter::format_room_created(&room_id)
                        }
                        Ok(ServerEvent::JoinRoomSuccess { room_id, members }) => {
                            if let Ok(mut current) = room_for_read.lock() {
                                *current = Some(room_id.clone());
                            }
                            MessageFormatter::format_join_success(&room_id, &members)
                        }
                        Ok(ServerEvent::UserJoined { username }) => {
                            MessageFormatter::format_user_joined(&username)
                        }
                        Ok(ServerEvent::UserLeft { username }) => {
                            MessageFormatter::format_user_left(&username)
                        }
                        Ok(ServerEvent::Message { username, text }) => {
                            MessageFormatter::format_chat_message(&username, &text)
                        }
                        Ok(ServerEvent::RoomDetails { room_id, members }) => {
                            MessageFormatter::format_room_details(&room_id, &members)
                        }
                        Ok(ServerEvent::ErrorMessage { message }) => {
                            MessageFormatter::format_error(&message)
                        }
                        Err(_) => MessageFormatter::format_raw_message(&text),
                    };
                    print!("{}", formatted);
                    redisplay_prompt(&username_for_read);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    connection_error = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    connection_error = true;
                    break;
                }
                _ => {}
            }
        }

        connection_error
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let prompt_name = username.to_string();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", prompt_name);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Spawn a task to turn terminal input into client events
    let username_for_write = username.to_string();
    let room_for_write = current_room.clone();
    let mut write_task = tokio::spawn(async move {
        let mut write_error = false;

        while let Some(line) = input_rx.recv().await {
            let event = if line == "/leave" {
                if let Ok(mut current) = room_for_write.lock() {
                    *current = None;
                }
                ClientEvent::LeaveRoom
            } else {
                let room_id = room_for_write
                    .lock()
                    .ok()
                    .and_then(|current| (*current).clone());
                match room_id {
                    Some(room_id) => ClientEvent::ChatMessage {
                        room_id,
                        username: username_for_write.clone(),
                        message: line,
                    },
                    None => {
                        println!("(not in a room — message dropped)");
                        redisplay_prompt(&username_for_write);
                        continue;
                    }
                }
            };

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send event: {}", e);
                write_error = true;
                break;
            }
        }

        write_error
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            if read_result.unwrap_or(false) {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            if write_result.unwrap_or(false) {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
    }

    Ok(())
}
