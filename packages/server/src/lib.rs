//! Room session coordinator library.
//!
//! This library provides the server-side implementation of tamariba: clients
//! create or join named rooms over WebSocket, exchange chat messages, and
//! leave or disconnect, with membership changes broadcast to co-members.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
