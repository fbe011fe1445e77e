//! Data Transfer Objects (DTOs) for the room coordinator.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket event DTOs (the closed event set of the wire contract)
//! - `http`: HTTP API request/response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
