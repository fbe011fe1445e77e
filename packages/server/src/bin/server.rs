//! Room coordinator server for tamariba.
//!
//! Clients create or join rooms over WebSocket and exchange chat messages;
//! membership changes are broadcast to co-members. Room state can optionally
//! be mirrored to a directory on disk (best effort, write-behind).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tamariba-server
//! cargo run --bin tamariba-server -- --host 0.0.0.0 --port 3000 --mirror-dir ./data
//! ```

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tamariba_server::{
    domain::{ConnectionRegistry, MessagePusher, MirrorSink, NullMirrorSink, RoomMirror},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        mirror::{FsRoomMirror, MirrorWriter},
        registry::InMemoryConnectionRegistry,
        repository::InMemoryRoomRepository,
    },
    ui::{Server, state::AppState},
    usecase::{
        CreateRoomUseCase, GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase,
        LeaveRoomUseCase, RoomBroadcaster, RoomLocks, SendMessageUseCase,
    },
};
use tamariba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tamariba-server")]
#[command(about = "Room session coordinator over WebSocket", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Keep rooms alive after the last member leaves
    /// (by default empty rooms are deleted)
    #[arg(long)]
    keep_empty_rooms: bool,

    /// Directory for the durable room mirror (best effort; disabled when omitted)
    #[arg(long)]
    mirror_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Repository / Registry / MessagePusher
    // 2. Mirror (write-behind worker)
    // 3. Room locks + Broadcaster
    // 4. UseCases
    // 5. Server

    // 1. Shared mutable state lives behind these two components only
    let repository = Arc::new(InMemoryRoomRepository::new(!args.keep_empty_rooms));
    let registry: Arc<dyn ConnectionRegistry> = Arc::new(InMemoryConnectionRegistry::new());
    let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());

    // 2. Optional durable mirror, decoupled through a bounded queue
    let mirror: Arc<dyn MirrorSink> = match &args.mirror_dir {
        Some(dir) => {
            let backend = Arc::new(FsRoomMirror::new(dir.clone()));
            // 前回のミラーはプロセス起動時に破棄する
            if let Err(e) = backend.clear().await {
                tracing::warn!("failed to wipe mirror at startup: {}", e);
            }
            tracing::info!("mirroring room state to {}", dir.display());
            let (writer, _worker) = MirrorWriter::spawn(backend);
            Arc::new(writer)
        }
        None => Arc::new(NullMirrorSink),
    };

    // 3. Per-room serialization domain and fanout
    let room_locks = Arc::new(RoomLocks::new());
    let broadcaster = Arc::new(RoomBroadcaster::new(
        registry.clone(),
        message_pusher.clone(),
    ));

    // 4. UseCases
    let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(
        repository.clone(),
        registry.clone(),
        room_locks.clone(),
        mirror.clone(),
    ));
    let create_room_usecase = Arc::new(CreateRoomUseCase::new(
        repository.clone(),
        registry.clone(),
        mirror.clone(),
        leave_room_usecase.clone(),
    ));
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(
        repository.clone(),
        registry.clone(),
        room_locks.clone(),
        mirror.clone(),
        leave_room_usecase.clone(),
    ));
    let send_message_usecase = Arc::new(SendMessageUseCase::new(
        room_locks.clone(),
        broadcaster.clone(),
    ));
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(repository.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(repository.clone()));

    // 5. Create and run the server
    let server = Server::new(AppState {
        create_room_usecase,
        join_room_usecase,
        leave_room_usecase,
        send_message_usecase,
        get_rooms_usecase,
        get_room_detail_usecase,
        broadcaster,
        message_pusher,
    });
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
