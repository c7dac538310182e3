//! Command-line interface handling for the Outpost session server.
//!
//! This module provides command-line argument parsing using the `clap`
//! crate's builder API.

use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
///
/// Holds the command-line options that can override configuration file
/// settings or provide runtime parameters.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for bind address
    pub bind_address: Option<String>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Optional override for the tier assigned to new connections
    pub default_tier: Option<u8>,
}

impl CliArgs {
    /// Parses command line arguments using clap.
    ///
    /// # Returns
    ///
    /// A `CliArgs` instance containing all parsed command-line options.
    pub fn parse() -> Self {
        let matches = Command::new("Outpost Session Server")
            .version("1.0.0")
            .about("Real-time multiplayer session server with tiered command dispatch")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("config.toml"),
            )
            .arg(
                Arg::new("bind")
                    .short('b')
                    .long("bind")
                    .value_name("ADDRESS")
                    .help("Bind address (e.g., 127.0.0.1:8080)"),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .action(ArgAction::SetTrue)
                    .help("Output logs in JSON format"),
            )
            .arg(
                Arg::new("default-tier")
                    .long("default-tier")
                    .value_name("TIER")
                    .value_parser(clap::value_parser!(u8))
                    .help("Privilege tier for new connections, 0 (owner) to 3 (any)"),
            )
            .get_matches();

        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("config.toml")),
            bind_address: matches.get_one::<String>("bind").cloned(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            default_tier: matches.get_one::<u8>("default-tier").copied(),
        }
    }
}
