//! Meeting room coordination and signaling server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kaigi-server
//! cargo run --bin kaigi-server -- --host 0.0.0.0 --port 5000 --user-roster roster.json
//! ```

use std::sync::Arc;

use clap::Parser;
use kaigi_server::{
    config::ServerConfig,
    domain::UserDirectory,
    infrastructure::directory::InMemoryUserDirectory,
    ui::{Server, ServerOptions},
};
use kaigi_shared::{logger::setup_logger, time::SystemClock};

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(2);
    }

    // Initialize tracing
    setup_logger(
        env!("CARGO_BIN_NAME"),
        &config.log_level.to_ascii_lowercase(),
    );

    // Initialize dependencies in order:
    // 1. UserDirectory (role lookup)
    // 2. Server (repositories, MessagePusher, UseCases)

    // 1. Create UserDirectory
    let directory: Arc<dyn UserDirectory> = match &config.user_roster {
        Some(path) => match InMemoryUserDirectory::from_json_file(path) {
            Ok(directory) => Arc::new(directory),
            Err(e) => {
                tracing::error!("Failed to load user roster: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            tracing::warn!("No user roster configured; every participant joins with role 'user'");
            Arc::new(InMemoryUserDirectory::default())
        }
    };

    // 2. Create and run the server
    let server = Server::new(
        directory,
        Arc::new(SystemClock),
        ServerOptions::from(&config),
    );
    if let Err(e) = server.run(config.host.clone(), config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
