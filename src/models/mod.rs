//! Data models for the AuraLink backend.
//!
//! Field names follow the JSON shapes the web client already stores and reads.

mod group;
mod profile;

pub use group::*;
pub use profile::*;
