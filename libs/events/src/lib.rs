//! # bmset-events
//!
//! Notification events describing admission outcomes for bare-metal sets.
//!
//! ## Design Principles
//!
//! - Events are immutable records of a decision that was already made
//! - Emitting an event never influences the decision it describes
//! - Every event belongs to exactly one set (`{namespace}/{name}`)
//! - Events are versioned for schema evolution
//!
//! ## Event Types
//!
//! - `baremetal_set.create_admitted`
//! - `baremetal_set.update_admitted`
//! - `baremetal_set.delete_observed`
//! - `baremetal_set.rejected`

mod envelope;
mod error;
mod types;

pub use envelope::*;
pub use error::EventError;
pub use types::*;
