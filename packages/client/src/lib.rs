//! CLI chat client for the tamariba room server.
//!
//! Connects to the server over WebSocket, creates or joins a room, and
//! bridges terminal input/output to the room's event stream.

pub mod error;
pub mod formatter;
pub mod session;
pub mod ui;
