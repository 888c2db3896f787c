//! Core domain types for the outpass workflow.
//!
//! This module contains pure domain types with no persistence dependencies:
//! - Outpass requests, statuses and decisions
//! - Credentials derived from approved requests

pub mod credential;
pub mod request;
