//! Module `state`
//!
//! Defines the connection lifecycle states and the per-connection `Session`
//! record owned by each connection handler.

use crate::client::{ClientId, SlotRef};

/// Lifecycle of a single connection.
///
/// `Connecting → Naming → Active → Closing → Closed`. A rejected or failed
/// handshake jumps straight from `Naming` to `Closing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport accepted, not yet in the registry.
    Connecting,
    /// Slot allocated (or refused), waiting for the display name.
    Naming,
    /// Named and relaying commands.
    Active,
    /// Releasing the slot and shutting the transport down.
    Closing,
    /// Terminal.
    Closed,
}

impl ConnectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}

/// Represents the state of a connected chat client.
///
/// Tracks the lifecycle state, the registry slot it owns, and its display name.
#[derive(Debug)]
pub struct Session {
    client_id: ClientId,
    state: ConnectionState,
    slot: Option<SlotRef>,
    name: Option<String>,
}

impl Session {
    pub fn new(client_id: ClientId) -> Self {
        Self {
            client_id,
            state: ConnectionState::Connecting,
            slot: None,
            name: None,
        }
    }

    // --------------------
    // Getter methods
    // --------------------

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns the registry slot, if one was allocated.
    pub fn slot(&self) -> Option<SlotRef> {
        self.slot
    }

    /// Returns the display name once the handshake has finished.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    // --------------------
    // Setter methods
    // --------------------

    pub fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
    }

    pub fn set_slot(&mut self, slot: Option<SlotRef>) {
        self.slot = slot;
    }

    /// Removes and returns the slot so it is released exactly once.
    pub fn take_slot(&mut self) -> Option<SlotRef> {
        self.slot.take()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }
}
