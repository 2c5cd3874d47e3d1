//! Message routing
//!
//! Broadcast and directed delivery over the client registry.

pub mod router;

pub use router::{DeliveryReport, Router, UnicastOutcome};
