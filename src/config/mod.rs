// src/config/mod.rs

//! Configuration loading and validation for backend-launcher.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Parse human-readable durations (`duration.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate invariants and resolve defaults (`validate.rs`).
//! - Emit starter configs for common setups (`preset.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod preset;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{config_root_dir, load_and_validate, load_from_path, parse_and_validate};
pub use model::{
    BackendConfig, BackendSection, FrontendSection, LauncherConfig, RawLauncherConfig,
    ReadinessConfig, ReadinessSection, ShutdownSection,
};
pub use preset::Preset;
