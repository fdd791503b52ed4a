// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! All problems are collected so the operator sees every one of them on the
//! first failed start.

use crate::diagnostic::ConfigError;
use crate::model::ImfConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &ImfConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let unset = |value: &Option<String>| value.as_deref().is_none_or(|v| v.trim().is_empty());
    let mut missing = Vec::new();
    if unset(&config.storage.queue_path) {
        missing.push("QUEUE_PATH");
    }
    if unset(&config.storage.chat_path) {
        missing.push("CHAT_PATH");
    }
    if !missing.is_empty() {
        errors.push(ConfigError::MissingEnv {
            vars: missing.join(", "),
        });
    }

    let addr = config.server.bind_address.trim();
    if addr.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.bind_address must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "server.bind_address `{addr}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    if config.server.http_port != 0 && config.server.http_port == config.server.https_port {
        errors.push(ConfigError::Validation {
            message: format!(
                "server.http_port and server.https_port must differ (both are {})",
                config.server.http_port
            ),
        });
    }

    if config.tls.cert_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "tls.cert_path must not be empty".to_string(),
        });
    }
    if config.tls.key_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "tls.key_path must not be empty".to_string(),
        });
    }

    if config.exporter.program.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "exporter.program must not be empty".to_string(),
        });
    }
    if config.exporter.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "exporter.timeout_secs must be greater than 0".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ImfConfig {
        let mut config = ImfConfig::default();
        config.storage.queue_path = Some("/tmp/queue.db".into());
        config.storage.chat_path = Some("/tmp/chat.db".into());
        config
    }

    #[test]
    fn complete_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn toml_with_exporter_section_passes() {
        let toml_str = r#"
[storage]
queue_path = "/var/lib/imf/queue.db"
chat_path = "/Users/relay/Library/Messages/chat.db"

[exporter]
program = "/usr/local/bin/imf-export"
args = []
timeout_secs = 5
"#;
        let config: ImfConfig = toml::from_str(toml_str).unwrap();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn toml_with_zero_timeout_fails() {
        let toml_str = r#"
[storage]
queue_path = "/var/lib/imf/queue.db"
chat_path = "/var/lib/imf/chat.db"

[exporter]
timeout_secs = 0
"#;
        let config: ImfConfig = toml::from_str(toml_str).unwrap();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("timeout_secs"), "{}", errors[0]);
    }

    #[test]
    fn both_missing_paths_reported_together() {
        let errors = validate_config(&ImfConfig::default()).unwrap_err();
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            ConfigError::MissingEnv { vars } => assert_eq!(vars, "QUEUE_PATH, CHAT_PATH"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_chat_path_counts_as_missing() {
        let mut config = valid_config();
        config.storage.chat_path = Some("  ".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("CHAT_PATH"));
        assert!(!errors[0].to_string().contains("QUEUE_PATH"));
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = valid_config();
        config.server.https_port = config.server.http_port;
        config.exporter.timeout_secs = 0;
        config.server.bind_address = "not an address!".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
