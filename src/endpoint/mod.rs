//! Tunnel endpoint substitution and live reconfiguration.
mod elevate;
mod reconcile;
mod rewrite;

pub use elevate::{Elevator, SudoElevator};
pub use reconcile::{
    apply_endpoint, ReconcileReport, TunnelTarget, DEFAULT_FILE_MODE, DEFAULT_INTERFACE,
    DEFAULT_OWNER, DEFAULT_TUNNEL_CONFIG,
};
pub use rewrite::{rewrite_endpoint, rewrite_file, Rewrite};
