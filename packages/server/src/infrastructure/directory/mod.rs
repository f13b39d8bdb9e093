//! UserDirectory の実装

pub mod roster;

pub use roster::InMemoryUserDirectory;
