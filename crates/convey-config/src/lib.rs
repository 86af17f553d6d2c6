// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Convey ingestion pipeline.
//!
//! Provides TOML parsing with strict key checking, a file hierarchy with
//! environment overrides, semantic validation, and miette diagnostics.
//!
//! # Usage
//!
//! ```no_run
//! use convey_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("max retries: {}", config.queue.max_retries);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::ConveyConfig;

/// Load configuration from the standard hierarchy and validate it.
pub fn load_and_validate() -> Result<ConveyConfig, Vec<ConfigError>> {
    finish(loader::load_config())
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<ConveyConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path))
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<ConveyConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content))
}

fn finish(loaded: Result<ConveyConfig, figment::Error>) -> Result<ConveyConfig, Vec<ConfigError>> {
    let config = loaded.map_err(diagnostic::figment_to_config_errors)?;
    validation::validate_config(&config)?;
    Ok(config)
}
