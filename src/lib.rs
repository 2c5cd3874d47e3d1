pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod routing;
pub mod server;

pub use config::ServerConfig;
pub use server::Server;
