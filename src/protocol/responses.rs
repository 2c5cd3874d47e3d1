//! Chat response formatting
//!
//! Every line the server writes to a client is built here.

/// Label used for server-authored messages
pub const SERVER_LABEL: &str = "Server";

/// Sent right after a slot is allocated
pub const NAME_PROMPT: &str = "Enter your name:";

/// Sent to the sender of a directed message with no body
pub const DIRECT_USAGE: &str = "Usage: /say @<name> <message>";

/// Format a message authored by a peer
pub fn format_peer_message(sender: &str, body: &str) -> String {
    format!("{}: {}", sender, body)
}

/// Format a message authored by the server
pub fn format_server_message(body: &str) -> String {
    format_peer_message(SERVER_LABEL, body)
}

pub fn join_notice(name: &str) -> String {
    format!("{name} has joined the chat.")
}

pub fn leave_notice(name: &str) -> String {
    format!("{name} has left the chat.")
}

pub fn not_found_notice(name: &str) -> String {
    format!("Client {name} not found.")
}

/// Sent to a connection turned away because every slot is taken
pub fn registry_full_notice() -> String {
    format_server_message("The chat is full. Try again later.")
}
