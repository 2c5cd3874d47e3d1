//! Message router
//!
//! Delivers formatted lines to one, many, or all named clients in the
//! registry. Peer messages are `"<sender>: <body>"`, server messages are
//! `"Server: <body>"`.
//!
//! In [`DeliveryMode::Locked`] the registry lock is held for the whole
//! scan-and-send sequence, so a stalled recipient stalls every registry
//! operation until its write completes. [`DeliveryMode::Snapshot`] releases the
//! lock before writing.

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::MutexGuard;

use crate::client::{ClientHandle, Registry, SlotRef, SlotTable};
use crate::config::DeliveryMode;
use crate::error::RegistryError;
use crate::protocol::responses::{
    DIRECT_USAGE, format_peer_message, format_server_message, not_found_notice,
};

/// Per-call delivery counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

/// What happened to a directed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnicastOutcome {
    /// Written to the target.
    Delivered,
    /// The target's write failed; logged, nothing else sent.
    WriteFailed,
    /// No client with that name; the sender got a not-found notice.
    NotFound,
    /// No message body; the sender got a usage notice.
    Malformed,
}

#[derive(Debug)]
pub struct Router {
    registry: Arc<Registry>,
    mode: DeliveryMode,
}

impl Router {
    pub fn new(registry: Arc<Registry>, mode: DeliveryMode) -> Self {
        Self { registry, mode }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Sends `"<sender>: <body>"` to every named client except the sender.
    pub async fn broadcast_from_client(
        &self,
        sender: SlotRef,
        body: &str,
    ) -> Result<DeliveryReport, RegistryError> {
        let table = self.registry.lock().await;
        let sender_name = table
            .name_of(sender)
            .ok_or(RegistryError::StaleSlot(sender))?;

        let message = format_peer_message(sender_name, body);
        let recipients: Vec<ClientHandle> = table
            .named()
            .filter(|(slot, _, _)| *slot != sender)
            .map(|(_, handle, _)| handle.clone())
            .collect();

        debug!("{} broadcasting to {} clients", sender, recipients.len());
        Ok(self.deliver(table, &recipients, &message).await)
    }

    /// Sends `"Server: <body>"` to every named client.
    pub async fn broadcast_from_server(&self, body: &str) -> DeliveryReport {
        let table = self.registry.lock().await;
        let message = format_server_message(body);
        let recipients: Vec<ClientHandle> = table
            .named()
            .map(|(_, handle, _)| handle.clone())
            .collect();

        info!("Broadcast: {}", body);
        self.deliver(table, &recipients, &message).await
    }

    /// Sends `"<sender>: <body>"` to the first client named `target`.
    ///
    /// A missing body earns the sender a usage notice, an unknown target a
    /// not-found notice. Nobody else is written to in either case.
    pub async fn unicast(
        &self,
        sender: SlotRef,
        target: &str,
        body: Option<&str>,
    ) -> Result<UnicastOutcome, RegistryError> {
        let table = self.registry.lock().await;
        let sender_handle = table
            .handle_of(sender)
            .cloned()
            .ok_or(RegistryError::StaleSlot(sender))?;
        let sender_name = table
            .name_of(sender)
            .ok_or(RegistryError::StaleSlot(sender))?
            .to_string();

        let Some(body) = body else {
            debug!("{} sent a malformed directed message", sender);
            self.deliver(table, &[sender_handle], DIRECT_USAGE).await;
            return Ok(UnicastOutcome::Malformed);
        };

        let Some(recipient) = table.find_by_name(target).cloned() else {
            debug!("{} addressed unknown client '{}'", sender, target);
            self.deliver(table, &[sender_handle], &not_found_notice(target))
                .await;
            return Ok(UnicastOutcome::NotFound);
        };

        let message = format_peer_message(&sender_name, body);
        let report = self.deliver(table, &[recipient], &message).await;
        if report.delivered == 1 {
            Ok(UnicastOutcome::Delivered)
        } else {
            Ok(UnicastOutcome::WriteFailed)
        }
    }

    /// Writes `message` to each recipient, releasing the table lock first
    /// unless running in locked mode.
    async fn deliver(
        &self,
        table: MutexGuard<'_, SlotTable>,
        recipients: &[ClientHandle],
        message: &str,
    ) -> DeliveryReport {
        let guard = match self.mode {
            DeliveryMode::Locked => Some(table),
            DeliveryMode::Snapshot => {
                drop(table);
                None
            }
        };

        let mut report = DeliveryReport::default();
        for recipient in recipients {
            match recipient.send_line(message).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("Error sending message to {}: {}", recipient.id(), e);
                    report.failed += 1;
                }
            }
        }

        drop(guard);
        report
    }
}
