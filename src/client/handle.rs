//! Connection handles
//!
//! A `ClientHandle` is the routable side of a connection: its id plus the
//! shared write half of the transport. The registry keeps one clone per slot,
//! the connection handler keeps another for prompts and teardown.

use std::fmt;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Boxed write half of a client transport.
pub type ClientWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Identifier assigned to each accepted connection, unique for the server's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client #{}", self.0)
    }
}

/// Shared, cloneable handle to a client's outgoing stream.
#[derive(Clone)]
pub struct ClientHandle {
    id: ClientId,
    writer: Arc<Mutex<ClientWriter>>,
}

impl ClientHandle {
    pub fn new<W>(id: ClientId, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let writer: ClientWriter = Box::new(writer);
        Self {
            id,
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Writes `line` followed by a newline and flushes.
    ///
    /// The whole line goes out in one `write_all` so concurrent senders never
    /// interleave within a line.
    pub async fn send_line(&self, line: &str) -> io::Result<()> {
        let mut framed = String::with_capacity(line.len() + 1);
        framed.push_str(line);
        framed.push('\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(framed.as_bytes()).await?;
        writer.flush().await
    }

    /// Shuts down the write side of the transport.
    pub async fn close(&self) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.shutdown().await
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};

    #[tokio::test]
    async fn test_send_line_appends_newline() {
        let (local, remote) = tokio::io::duplex(64);
        let handle = ClientHandle::new(ClientId(7), local);

        handle.send_line("Server: hello").await.unwrap();

        let mut lines = BufReader::new(remote).lines();
        assert_eq!(
            lines.next_line().await.unwrap(),
            Some("Server: hello".to_string())
        );
    }

    #[tokio::test]
    async fn test_send_to_dropped_peer_fails() {
        let (local, remote) = tokio::io::duplex(64);
        drop(remote);
        let handle = ClientHandle::new(ClientId(1), local);

        assert!(handle.send_line("anyone there?").await.is_err());
    }

    #[test]
    fn test_client_id_display() {
        assert_eq!(ClientId(3).to_string(), "client #3");
    }
}
