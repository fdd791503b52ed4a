// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the iMessageForwarder relay.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is a
//! startup error instead of a silently ignored setting.

use serde::{Deserialize, Serialize};

/// Top-level relay configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ImfConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Listener addresses and ports.
    #[serde(default)]
    pub server: ServerConfig,

    /// Queue and history store locations.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Attachment path resolution.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Mutual-TLS material for the authenticated listener.
    #[serde(default)]
    pub tls: TlsConfig,

    /// External history exporter invocation.
    #[serde(default)]
    pub exporter: ExporterConfig,

    /// Unauthenticated status endpoint behavior.
    #[serde(default)]
    pub status: StatusConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Name returned by the liveness probe.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "iMessageForwarder".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Listener configuration for both channels.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address both listeners bind to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port of the plain (unauthenticated) listener.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Port of the mutual-TLS listener.
    #[serde(default = "default_https_port")]
    pub https_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            http_port: default_http_port(),
            https_port: default_https_port(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    3000
}

fn default_https_port() -> u16 {
    3001
}

/// Store locations. Both are required and have no default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the queue SQLite database (`QUEUE_PATH`).
    #[serde(default)]
    pub queue_path: Option<String>,

    /// Path to the authoritative history SQLite database (`CHAT_PATH`).
    #[serde(default)]
    pub chat_path: Option<String>,
}

/// Attachment path resolution settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Directory substituted for a leading `~` in attachment filenames.
    /// Defaults to the operator's home directory.
    #[serde(default)]
    pub home_dir: Option<String>,
}

impl HistoryConfig {
    /// The effective home directory, if one can be determined.
    pub fn resolved_home_dir(&self) -> Option<std::path::PathBuf> {
        self.home_dir
            .as_ref()
            .map(std::path::PathBuf::from)
            .or_else(dirs::home_dir)
    }
}

/// Mutual-TLS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TlsConfig {
    /// PEM certificate chain presented by the authenticated listener.
    #[serde(default = "default_cert_path")]
    pub cert_path: String,

    /// PEM private key for `cert_path`.
    #[serde(default = "default_key_path")]
    pub key_path: String,

    /// PEM trust anchor(s) for client certificates. When unset the server
    /// certificate itself is the trust anchor.
    #[serde(default)]
    pub client_ca_path: Option<String>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: default_cert_path(),
            key_path: default_key_path(),
            client_ca_path: None,
        }
    }
}

fn default_cert_path() -> String {
    "server.cert".to_string()
}

fn default_key_path() -> String {
    "server.key".to_string()
}

/// External history exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    /// Program to execute.
    #[serde(default = "default_exporter_program")]
    pub program: String,

    /// Arguments placed before the trailing `last_update_time` argument.
    #[serde(default = "default_exporter_args")]
    pub args: Vec<String>,

    /// Upper bound for a whole export, in seconds.
    #[serde(default = "default_exporter_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            program: default_exporter_program(),
            args: default_exporter_args(),
            timeout_secs: default_exporter_timeout_secs(),
        }
    }
}

fn default_exporter_program() -> String {
    "python3".to_string()
}

fn default_exporter_args() -> Vec<String> {
    vec!["getMessages.py".to_string()]
}

fn default_exporter_timeout_secs() -> u64 {
    60
}

/// Status endpoint configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StatusConfig {
    /// Echo queued row content on the unauthenticated channel.
    #[serde(default)]
    pub echo_rows: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_legacy_deployment() {
        let config = ImfConfig::default();
        assert_eq!(config.service.name, "iMessageForwarder");
        assert_eq!(config.server.http_port, 3000);
        assert_eq!(config.server.https_port, 3001);
        assert!(config.storage.queue_path.is_none());
        assert!(config.storage.chat_path.is_none());
        assert!(!config.status.echo_rows);
        assert_eq!(config.exporter.timeout_secs, 60);
    }

    #[test]
    fn explicit_home_dir_wins() {
        let history = HistoryConfig {
            home_dir: Some("/home/x".into()),
        };
        assert_eq!(
            history.resolved_home_dir(),
            Some(std::path::PathBuf::from("/home/x"))
        );
    }
}
