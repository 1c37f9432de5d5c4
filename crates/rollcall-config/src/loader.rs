// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./rollcall.toml` > `~/.config/rollcall/rollcall.toml` >
//! `/etc/rollcall/rollcall.toml` with environment variable overrides via `ROLLCALL_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::RollcallConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/rollcall/rollcall.toml";

/// Local config file, relative to the working directory.
pub const LOCAL_CONFIG_FILE: &str = "rollcall.toml";

/// Config file inside the user's XDG config directory, if one exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rollcall").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/rollcall/rollcall.toml`
/// 3. `~/.config/rollcall/rollcall.toml`
/// 4. `./rollcall.toml`
/// 5. `ROLLCALL_*` environment variables
pub fn load_config() -> Result<RollcallConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string over the compiled defaults.
///
/// No files or environment variables are consulted.
pub fn load_config_from_str(toml_content: &str) -> Result<RollcallConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RollcallConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RollcallConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RollcallConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RollcallConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider with an explicit section mapping.
///
/// `Env::split("_")` would turn `ROLLCALL_TELEGRAM_BOT_TOKEN` into
/// `telegram.bot.token`; only the first segment names the section.
fn env_provider() -> Env {
    Env::prefixed("ROLLCALL_").map(|key| {
        let key_str = key.as_str();
        let mapped = ["service_", "telegram_", "storage_", "attendance_"]
            .iter()
            .find(|section| key_str.starts_with(*section))
            .map(|section| {
                let name = section.trim_end_matches('_');
                format!("{name}.{}", &key_str[section.len()..])
            })
            .unwrap_or_else(|| key_str.to_string());
        mapped.into()
    })
}
