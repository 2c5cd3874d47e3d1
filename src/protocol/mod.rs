//! Chat line protocol
//!
//! Handles command parsing, bounded line reads, and response formatting.

pub mod commands;
pub mod reader;
pub mod responses;

pub use commands::{AdminCommand, Command, parse_admin_command, parse_command, parse_name};
pub use reader::LineReader;
