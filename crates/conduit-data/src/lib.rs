//! Configuration loading for the conduit add-on.
//!
//! [`schema::AddonConfig`] holds every tunable the other crates take as a
//! parameter. [`loader`] reads it from RON, TOML or JSON, picking the
//! format from the file extension.

pub mod loader;
pub mod schema;

pub use loader::{ConfigError, Format, load_config, load_config_dir};
pub use schema::{AddonConfig, ExporterSpeeds, MachineSpec, TimingConfig};
