//! chat-relay - Entry Point
//!
//! A line-oriented multi-client chat relay over TCP.

use log::info;

use chat_relay::error::RelayError;
use chat_relay::error::handlers::{error_to_exit_code, handle_error};
use chat_relay::server::run_admin_console;
use chat_relay::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching chat relay...");

    if let Err(e) = run().await {
        handle_error(&e);
        std::process::exit(error_to_exit_code(&e));
    }
}

async fn run() -> Result<(), RelayError> {
    let config = ServerConfig::load()?;
    let server = Server::bind(config).await?;

    tokio::spawn(run_admin_console(tokio::io::stdin(), server.router()));

    server.start().await;
    Ok(())
}
