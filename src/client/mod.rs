//! Client management system
//!
//! Handles the client registry, connection handles, and the per-connection
//! state machine.

pub mod handle;
pub mod handler;
pub mod registry;
pub mod state;

pub use handle::{ClientHandle, ClientId};
pub use handler::handle_connection;
pub use registry::{ClientSlot, Registry, SlotRef, SlotTable};
pub use state::{ConnectionState, Session};
