use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::io::AsyncRead;

use crate::client::{ClientHandle, ConnectionState, Session};
use crate::config::ServerConfig;
use crate::error::RegistryError;
use crate::protocol::responses::{NAME_PROMPT, join_notice, leave_notice, registry_full_notice};
use crate::protocol::{Command, LineReader, parse_command, parse_name};
use crate::routing::Router;

/// Drives one chat connection from accept to close.
///
/// - Registers the client, asks for a display name and announces the join.
/// - Reads one line at a time and routes it through the `Router`.
/// - Releases the registry slot and shuts the transport down on `/exit`,
///   EOF, or a read error. Only `/exit` announces the departure.
pub async fn handle_connection<R>(
    reader: R,
    handle: ClientHandle,
    router: Arc<Router>,
    config: Arc<ServerConfig>,
) where
    R: AsyncRead + Unpin,
{
    let mut connection = Connection {
        session: Session::new(handle.id()),
        lines: LineReader::new(reader, config.max_line_length),
        handle,
        router,
        max_name_length: config.max_name_length,
    };
    connection.run().await;
}

struct Connection<R> {
    session: Session,
    lines: LineReader<R>,
    handle: ClientHandle,
    router: Arc<Router>,
    max_name_length: usize,
}

impl<R: AsyncRead + Unpin> Connection<R> {
    async fn run(&mut self) {
        while !self.session.state().is_terminal() {
            let current = self.session.state();
            let next = match current {
                ConnectionState::Connecting => ConnectionState::Naming,
                ConnectionState::Naming => self.acquire_name().await,
                ConnectionState::Active => self.serve_line().await,
                ConnectionState::Closing => self.teardown().await,
                ConnectionState::Closed => ConnectionState::Closed,
            };
            if next != current {
                debug!("{}: {:?} -> {:?}", self.session.client_id(), current, next);
            }
            self.session.set_state(next);
        }
    }

    /// Allocates a slot, reads the display name and announces the join.
    async fn acquire_name(&mut self) -> ConnectionState {
        let client_id = self.session.client_id();
        let registry = Arc::clone(self.router.registry());

        let slot = match registry.register(self.handle.clone()).await {
            Ok(slot) => slot,
            Err(RegistryError::Full { capacity }) => {
                warn!(
                    "Rejecting {}: all {} slots are taken",
                    client_id, capacity
                );
                if let Err(e) = self.handle.send_line(&registry_full_notice()).await {
                    warn!("Failed to send rejection to {}: {}", client_id, e);
                }
                return ConnectionState::Closing;
            }
            Err(e) => {
                error!("Failed to register {}: {}", client_id, e);
                return ConnectionState::Closing;
            }
        };
        self.session.set_slot(Some(slot));
        info!("{} registered in {}", client_id, slot);

        if let Err(e) = self.handle.send_line(NAME_PROMPT).await {
            warn!("Failed to prompt {} for a name: {}", client_id, e);
            return ConnectionState::Closing;
        }

        let line = match self.lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("{} disconnected before choosing a name", client_id);
                return ConnectionState::Closing;
            }
            Err(e) => {
                warn!("Failed to read name from {}: {}", client_id, e);
                return ConnectionState::Closing;
            }
        };

        let Some(name) = parse_name(&line, self.max_name_length) else {
            info!("{} sent an empty name, closing", client_id);
            return ConnectionState::Closing;
        };

        if let Err(e) = registry.set_name(slot, &name).await {
            error!("Failed to name {}: {}", client_id, e);
            return ConnectionState::Closing;
        }
        info!("{} is now known as '{}'", client_id, name);

        self.router.broadcast_from_server(&join_notice(&name)).await;
        self.session.set_name(Some(name));
        ConnectionState::Active
    }

    /// Reads and handles one client line.
    async fn serve_line(&mut self) -> ConnectionState {
        let client_id = self.session.client_id();

        let line = match self.lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("{} disconnected.", client_id);
                return ConnectionState::Closing;
            }
            Err(e) => {
                warn!("Failed to read from {}: {}", client_id, e);
                return ConnectionState::Closing;
            }
        };

        let Some(slot) = self.session.slot() else {
            error!("{} is active without a registry slot", client_id);
            return ConnectionState::Closing;
        };

        let command = parse_command(&line);
        debug!("Received from {}: {:?}", client_id, command);

        let routed = match command {
            Command::Exit => {
                info!("{} sent EXIT signal. Closing connection...", client_id);
                let notice = leave_notice(self.session.name().unwrap_or_default());
                self.router.broadcast_from_server(&notice).await;
                return ConnectionState::Closing;
            }
            Command::Say(body) | Command::Chat(body) => self
                .router
                .broadcast_from_client(slot, &body)
                .await
                .map(|report| {
                    debug!(
                        "{} relayed to {} clients ({} failed)",
                        client_id, report.delivered, report.failed
                    );
                }),
            Command::Direct { target, body } => self
                .router
                .unicast(slot, &target, body.as_deref())
                .await
                .map(|outcome| {
                    debug!("{} -> '{}': {:?}", client_id, target, outcome);
                }),
        };

        match routed {
            Ok(()) => ConnectionState::Active,
            Err(e) => {
                error!("Routing failed for {}: {}", client_id, e);
                ConnectionState::Closing
            }
        }
    }

    /// Frees the registry slot and closes the transport.
    async fn teardown(&mut self) -> ConnectionState {
        let client_id = self.session.client_id();

        if let Some(slot) = self.session.take_slot() {
            if self.router.registry().unregister(slot).await {
                info!("{} removed from {}", client_id, slot);
            }
        }

        if let Err(e) = self.handle.close().await {
            debug!("Error closing {}: {}", client_id, e);
        }
        ConnectionState::Closed
    }
}
