// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `imf check-config` command implementation.

use imf_config::ImfConfig;

/// Print the effective configuration. Key material is shown by path only.
pub fn print_summary(config: &ImfConfig) {
    print!("{}", render_summary(config));
}

fn render_summary(config: &ImfConfig) -> String {
    let unset = || "<unset>".to_string();
    let home = config
        .history
        .resolved_home_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(unset);
    let client_ca = config
        .tls
        .client_ca_path
        .clone()
        .unwrap_or_else(|| format!("{} (server certificate)", config.tls.cert_path));

    let mut out = String::from("configuration OK\n");
    let mut line = |key: &str, value: String| {
        out.push_str(&format!("  {key:<20} {value}\n"));
    };
    line("service.name", config.service.name.clone());
    line("service.log_level", config.service.log_level.clone());
    line(
        "plain listener",
        format!("{}:{}", config.server.bind_address, config.server.http_port),
    );
    line(
        "mtls listener",
        format!("{}:{}", config.server.bind_address, config.server.https_port),
    );
    line(
        "queue_path",
        config.storage.queue_path.clone().unwrap_or_else(unset),
    );
    line(
        "chat_path",
        config.storage.chat_path.clone().unwrap_or_else(unset),
    );
    line("home_dir", home);
    line("tls.cert_path", config.tls.cert_path.clone());
    line("tls.key_path", config.tls.key_path.clone());
    line("tls.client_ca", client_ca);
    line(
        "exporter",
        format!(
            "{} {} (timeout {}s)",
            config.exporter.program,
            config.exporter.args.join(" "),
            config.exporter.timeout_secs
        ),
    );
    line("status.echo_rows", config.status.echo_rows.to_string());
    out
}
