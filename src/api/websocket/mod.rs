//! WebSocket endpoint
//!
//! Serves `/ws`. Each connection is one session: it joins a room, receives
//! a snapshot followed by the room's relay stream, and sends graph
//! mutations back.

pub mod handler;
pub mod state;

pub use handler::{ws_handler, WsParams};
pub use state::AppState;
