//! Error types
//!
//! Defines the registry error taxonomy and the top-level relay error.

use std::fmt;
use std::io;

use crate::client::{ClientId, SlotRef};

/// Client registry errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Every slot is occupied.
    Full { capacity: usize },
    /// The connection already owns a slot.
    AlreadyRegistered(ClientId),
    /// The slot reference no longer belongs to its connection.
    StaleSlot(SlotRef),
    /// The display name was already assigned.
    NameAlreadySet(SlotRef),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Full { capacity } => {
                write!(f, "Registry full ({} clients)", capacity)
            }
            RegistryError::AlreadyRegistered(id) => write!(f, "{} is already registered", id),
            RegistryError::StaleSlot(slot) => write!(f, "Stale slot reference: {}", slot),
            RegistryError::NameAlreadySet(slot) => write!(f, "Name already set for {}", slot),
        }
    }
}

impl std::error::Error for RegistryError {}

/// General relay error that encompasses all error types
#[derive(Debug)]
pub enum RelayError {
    Registry(RegistryError),
    Io(io::Error),
    Config(config::ConfigError),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Registry(e) => write!(f, "Registry error: {}", e),
            RelayError::Io(e) => write!(f, "I/O error: {}", e),
            RelayError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelayError::Registry(e) => Some(e),
            RelayError::Io(e) => Some(e),
            RelayError::Config(e) => Some(e),
        }
    }
}

impl From<RegistryError> for RelayError {
    fn from(error: RegistryError) -> Self {
        RelayError::Registry(error)
    }
}

impl From<io::Error> for RelayError {
    fn from(error: io::Error) -> Self {
        RelayError::Io(error)
    }
}

impl From<config::ConfigError> for RelayError {
    fn from(error: config::ConfigError) -> Self {
        RelayError::Config(error)
    }
}
