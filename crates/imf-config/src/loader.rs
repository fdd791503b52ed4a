// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Merge order (later overrides earlier):
//! 1. Compiled defaults
//! 2. `/etc/imf/imf.toml`
//! 3. `~/.config/imf/imf.toml`
//! 4. `./imf.toml`
//! 5. `IMF_*` environment variables
//! 6. `QUEUE_PATH` / `CHAT_PATH`

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ImfConfig;

/// Config sections addressable from `IMF_<SECTION>_<KEY>` variables.
const SECTIONS: [&str; 7] = [
    "service", "server", "storage", "history", "tls", "exporter", "status",
];

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<ImfConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ImfConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ImfConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ImfConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ImfConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .merge(legacy_env_provider())
        .extract()
}

/// Build the Figment used for the standard hierarchy.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ImfConfig::default()))
        .merge(Toml::file("/etc/imf/imf.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("imf/imf.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("imf.toml"))
        .merge(env_provider())
        .merge(legacy_env_provider())
}

/// `IMF_*` variables. The first underscore-delimited word picks the section,
/// except for the two listener ports which keep their historical short names
/// (`IMF_HTTP_PORT`, `IMF_HTTPS_PORT`).
fn env_provider() -> Env {
    Env::prefixed("IMF_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    if matches!(key.as_str(), "http_port" | "https_port" | "bind_address") {
        return format!("server.{key}");
    }
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

/// The unprefixed store location variables.
fn legacy_env_provider() -> Env {
    Env::raw().filter_map(|key| match key.as_str().to_ascii_lowercase().as_str() {
        "queue_path" => Some("storage.queue_path".into()),
        "chat_path" => Some("storage.chat_path".into()),
        _ => None,
    })
}
