//! Outpass request aggregate - domain model and state transitions.
//!
//! This module contains the core domain logic for requests:
//! - Record, status and decision types
//! - The compare-and-swap transition out of `Pending`

pub mod state;
pub mod transitions;

// Re-export commonly used types
pub use state::*;
pub use transitions::transition;
