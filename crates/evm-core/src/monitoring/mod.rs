//! Confirmation tracking for submitted transactions.
//!
//! Each tracked hash gets its own polling task. The task fetches the
//! receipt and the chain head together on every iteration and publishes
//! the result on a watch channel; handles derive the mined and confirmed
//! observation points from that state.

pub mod confirmation;

pub use confirmation::{ConfirmationState, ConfirmationTracker, PendingTransaction};
