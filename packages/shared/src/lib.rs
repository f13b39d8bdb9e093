//! Shared utilities for the Kaigi workspace.

pub mod logger;
pub mod time;
