use log::{error, info};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpListener;

use crate::client::{ClientHandle, ClientId, Registry, handle_connection};
use crate::config::ServerConfig;
use crate::error::RelayError;
use crate::routing::Router;

pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
    config: Arc<ServerConfig>,
    next_client_id: AtomicU64,
}

impl Server {
    /// Binds the listening socket and builds an empty registry sized to
    /// `max_clients`.
    pub async fn bind(config: ServerConfig) -> Result<Self, RelayError> {
        let socket = config.listen_socket();

        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e.into());
            }
        };

        let registry = Arc::new(Registry::new(config.max_clients));
        let router = Arc::new(Router::new(registry, config.delivery));

        Ok(Self {
            listener,
            router,
            config: Arc::new(config),
            next_client_id: AtomicU64::new(1),
        })
    }

    /// Address actually bound, useful when the configured port is 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn router(&self) -> Arc<Router> {
        Arc::clone(&self.router)
    }

    /// Accepts connections forever, one task per connection.
    pub async fn start(&self) {
        info!(
            "Starting chat relay on {} (max {} clients, {:?} delivery)",
            self.config.listen_socket(),
            self.config.max_clients,
            self.config.delivery
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let client_id = ClientId(self.next_client_id.fetch_add(1, Ordering::Relaxed));
                    info!("{} established connection from {}", client_id, addr);

                    let (read_half, write_half) = stream.into_split();
                    let handle = ClientHandle::new(client_id, write_half);
                    let router = Arc::clone(&self.router);
                    let config = Arc::clone(&self.config);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        handle_connection(read_half, handle, router, config).await;
                        info!("{} connection closed", client_id);
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}
