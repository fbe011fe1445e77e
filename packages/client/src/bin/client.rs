//! CLI chat client for the tamariba room server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tamariba-client -- --username alice
//! cargo run --bin tamariba-client -- --username bob --room abc123
//! ```

use clap::Parser;
use tamariba_client::session::run_client_session;
use tamariba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tamariba-client")]
#[command(about = "CLI client for the tamariba room server", long_about = None)]
struct Args {
    /// WebSocket URL of the room server
    #[arg(short, long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Display name inside the room
    #[arg(short = 'n', long)]
    username: String,

    /// Room id to join; a new room is created when omitted
    #[arg(short, long)]
    room: Option<String>,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let args = Args::parse();

    if let Err(e) = run_client_session(&args.url, &args.username, args.room).await {
        eprintln!("Client error: {}", e);
        std::process::exit(1);
    }
}
