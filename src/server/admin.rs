//! Operator console
//!
//! Reads lines from the server's own input and turns `/bc <text>` into a
//! server broadcast. Everything else is ignored.

use log::{debug, error, info};
use std::sync::Arc;
use tokio::io::AsyncRead;

use crate::protocol::{AdminCommand, LineReader, parse_admin_command};
use crate::routing::Router;

/// Console lines longer than this are split, like client lines.
const MAX_CONSOLE_LINE: usize = 1000;

/// Runs until `input` reaches EOF or fails. The server keeps running either way.
pub async fn run_admin_console<R>(input: R, router: Arc<Router>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = LineReader::new(input, MAX_CONSOLE_LINE);

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_admin_command(&line) {
                AdminCommand::Broadcast(text) => {
                    let report = router.broadcast_from_server(&text).await;
                    debug!(
                        "Console broadcast reached {} clients ({} failed)",
                        report.delivered, report.failed
                    );
                }
                AdminCommand::Ignored => debug!("Ignoring console input: {}", line),
            },
            Ok(None) => {
                info!("Admin console input closed");
                break;
            }
            Err(e) => {
                error!("Failed to read admin console: {}", e);
                break;
            }
        }
    }
}
