// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! imf - store-and-forward iMessage relay.
//!
//! This is the binary entry point for the relay.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check_config;
mod migrate;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use imf_config::{ConfigError, ImfConfig};

/// imf - store-and-forward iMessage relay.
#[derive(Parser, Debug)]
#[command(name = "imf", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this TOML file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Start the plain and mutual-TLS listeners (default).
    Serve,
    /// Create or upgrade the queue store schema and exit.
    Migrate,
    /// Load and validate configuration, then print a summary.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<ImfConfig, Vec<ConfigError>> {
    match path {
        Some(path) => imf_config::load_and_validate_path(path),
        None => imf_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            imf_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Migrate => migrate::run_migrate(&config).await,
        Commands::CheckConfig => {
            check_config::print_summary(&config);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["imf"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["imf", "check-config", "--config", "/tmp/imf.toml"]).unwrap();
        assert_eq!(cli.command, Some(Commands::CheckConfig));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/imf.toml")));

        let cli = Cli::try_parse_from(["imf", "--config", "relay.toml", "migrate"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Migrate));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["imf", "status"]).is_err());
    }
}
