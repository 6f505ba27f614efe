//! `herald-core`: identity and error building blocks shared by the bus.
//!
//! This crate contains **pure** primitives (no threads, no locking).

pub mod error;
pub mod id;

pub use error::{CoreError, CoreResult};
pub use id::{OwnerKey, SubscriberId};
