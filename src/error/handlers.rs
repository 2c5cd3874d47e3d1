//! Error handlers
//!
//! Logs failures that reach the top of the process.

use crate::error::types::RelayError;
use log::error;

/// Handle a relay error that ended server startup or the accept loop
pub fn handle_error(err: &RelayError) {
    error!("Chat relay error: {}", err);
}

/// Process exit code for a fatal relay error
pub fn error_to_exit_code(err: &RelayError) -> i32 {
    match err {
        RelayError::Config(_) => 2,
        RelayError::Io(_) => 1,
        RelayError::Registry(_) => 1,
    }
}
