//! The shared configuration document and its on-disk store.
//!
//! One YAML document coordinates this process and every external stage. It is
//! always loaded and saved whole; callers check it out, mutate in memory, and
//! check it back in before handing control to a stage.
mod guard;
mod store;
mod types;

pub use guard::RunGuard;
pub use store::{ConfigStore, DocumentStore};
pub use types::*;

/// Document path used when the CLI is not given one.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
