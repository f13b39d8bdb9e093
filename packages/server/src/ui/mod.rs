//! Signaling server: router, connection handlers and lifecycle.

mod handler;
mod server;
mod signal;
pub mod state;

pub use handler::IDENTITY_HEADER;
pub use server::{Server, ServerOptions};
pub use signal::shutdown_signal;
