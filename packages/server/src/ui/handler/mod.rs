//! Request handlers for the WebSocket and HTTP endpoints.

mod http;
mod session;
mod websocket;

pub use http::{get_room_detail, get_rooms, health_check};
pub use websocket::{IDENTITY_HEADER, websocket_handler};
