//! Server core functionality
//!
//! This module contains the listener and accept loop, and the operator
//! console that feeds server broadcasts.

pub mod admin;
pub mod core;

pub use admin::run_admin_console;
pub use core::Server;
