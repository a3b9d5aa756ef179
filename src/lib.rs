//! Batch tunnel credential provisioning and revocation.
//!
//! External stages (certificate generation, packaging, notification,
//! revocation) are coordinated through one shared YAML document. This crate
//! resolves the machine's external address, keeps the tunnel endpoint pointed
//! at it, and walks a roster handing one subject at a time to the stages.
pub mod cli;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod identity;
pub mod logging;
pub mod pipeline;
pub mod prefs;
pub mod roster;
pub mod stage;
pub mod workflow;
mod util;
