// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `/etc/convey/convey.toml`, `~/.config/convey/convey.toml`,
//! `./convey.toml`, then `CONVEY_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ConveyConfig;

/// Config sections recognized in `CONVEY_<SECTION>_<KEY>` environment variables.
const ENV_SECTIONS: &[&str] = &["daemon", "storage", "queue", "sync"];

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/convey/convey.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "convey.toml";

/// Returns the per-user config file path, if a config directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("convey").join("convey.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/convey/convey.toml`
/// 3. `~/.config/convey/convey.toml`
/// 4. `./convey.toml`
/// 5. `CONVEY_*` environment variables
pub fn load_config() -> Result<ConveyConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of the defaults (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ConveyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConveyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ConveyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConveyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the standard lookup, before extraction.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(ConveyConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider mapping `CONVEY_QUEUE_MAX_RETRIES` to `queue.max_retries`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that contain underscores themselves survive intact.
fn env_provider() -> Env {
    Env::prefixed("CONVEY_").map(|key| {
        let key_str = key.as_str();
        for section in ENV_SECTIONS {
            if let Some(rest) = key_str
                .strip_prefix(section)
                .and_then(|r| r.strip_prefix('_'))
            {
                return format!("{section}.{rest}").into();
            }
        }
        key_str.to_string().into()
    })
}
