//! Room coordination and signaling server for browser video meetings.
//!
//! Participants join rooms over a WebSocket signaling channel, exchange peer
//! transport identifiers, share a whiteboard and a chat, and hand whiteboard
//! control around under a single-holder rule.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
