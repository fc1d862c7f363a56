//! ls346ctl - LakeShore 346 Curve Tool
//!
//! Reads and writes calibration curves on a LakeShore 346 temperature
//! controller over RS-232 or a TCP serial device server, and runs the
//! offline curve resize and temperature fan-out transforms.

mod config;
mod curve;
mod fanout;
mod utils;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use ls346_common::{init_logging, load_config, AppConfig};
use ls346_link::LinkKind;
use std::path::PathBuf;

use crate::config::ConfigCommands;
use crate::curve::CurveCommands;

#[derive(Parser)]
#[command(name = "ls346ctl")]
#[command(about = "LakeShore 346 curve transfer and temperature fan-out tool")]
#[command(long_about = "LakeShore 346 curve transfer and temperature fan-out tool

Instrument commands:
  curve read     Download a curve (1-60)
  curve write    Upload a user curve (21-60)

Offline commands:
  curve resize   Truncate or zero-pad curve arrays
  fanout         Split a flat temperature vector across input cards A-H
  config         Show or validate the effective configuration

Examples:
  ls346ctl curve read --curve 21 --points 50
  ls346ctl --link tcp --address 10.0.0.5:4001 curve write --curve 21 --file dt470.json
  ls346ctl fanout --counts 2,4 --readings 4.2,4.3,77.1,77.2,77.3,77.4

Configuration is read from ls346.yaml (or --config) and LS346_* environment
variables, e.g. LS346_TRANSFER__BATCH_SIZE=20.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Link kind override: serial or tcp
    #[arg(long, global = true)]
    link: Option<LinkKind>,

    /// Serial port override (e.g. /dev/ttyUSB0)
    #[arg(long, global = true)]
    port: Option<String>,

    /// TCP address override as host:port
    #[arg(long, global = true)]
    address: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Curve transfer and resize
    #[command(subcommand)]
    Curve(CurveCommands),

    /// Split a flat temperature vector across input cards
    Fanout {
        /// Inputs per card, in card order A-H (missing cards have none)
        #[arg(long, value_delimiter = ',')]
        counts: Vec<u8>,

        /// Flat temperature readings
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        readings: Vec<f64>,
    },

    /// Configuration inspection
    #[command(subcommand)]
    Config(ConfigCommands),
}

impl Cli {
    /// Apply command-line link overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut AppConfig) -> Result<()> {
        if let Some(kind) = self.link {
            config.link.kind = kind;
        }
        if let Some(port) = &self.port {
            config.link.serial.port = port.clone();
        }
        if let Some(address) = &self.address {
            config.link.tcp.address = address.clone();
        }
        config
            .validate()
            .context("Invalid configuration after command-line overrides")?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config)?;

    let _log_guard =
        init_logging(&config.logging, cli.verbose).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Curve(cmd) => curve::handle_command(cmd, &config).await,
        Commands::Fanout { counts, readings } => fanout::handle_command(&counts, &readings),
        Commands::Config(cmd) => config::handle_command(cmd, &config),
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use clap::CommandFactory;
    use ls346_protocol::CurvePoint;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_curve_write() {
        let cli = Cli::try_parse_from([
            "ls346ctl",
            "-vv",
            "curve",
            "write",
            "--curve",
            "21",
            "--point",
            "0.1,300",
            "--point",
            "-0.2,4.2",
            "--batch",
            "4",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Curve(CurveCommands::Write {
                curve,
                points,
                batch,
                file,
            }) => {
                assert_eq!(curve, 21);
                assert_eq!(
                    points,
                    vec![CurvePoint::new(0.1, 300.0), CurvePoint::new(-0.2, 4.2)]
                );
                assert_eq!(batch, Some(4));
                assert!(file.is_none());
            },
            _ => panic!("expected curve write"),
        }
    }

    #[test]
    fn test_parse_fanout_lists() {
        let cli = Cli::try_parse_from([
            "ls346ctl",
            "fanout",
            "--counts",
            "2,4",
            "--readings",
            "1,2,3,4,5,-6.5",
        ])
        .unwrap();

        match cli.command {
            Commands::Fanout { counts, readings } => {
                assert_eq!(counts, vec![2, 4]);
                assert_eq!(readings, vec![1.0, 2.0, 3.0, 4.0, 5.0, -6.5]);
            },
            _ => panic!("expected fanout"),
        }
    }

    #[test]
    fn test_link_overrides() {
        let cli = Cli::try_parse_from([
            "ls346ctl",
            "--link",
            "tcp",
            "--address",
            "192.168.1.20:4001",
            "config",
            "validate",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config).unwrap();
        assert_eq!(config.link.kind, LinkKind::Tcp);
        assert_eq!(config.link.tcp.address, "192.168.1.20:4001");

        let cli = Cli::try_parse_from(["ls346ctl", "--address", "nohost", "config", "show"])
            .unwrap();
        let mut config = AppConfig::default();
        config.link.kind = LinkKind::Tcp;
        assert!(cli.apply_overrides(&mut config).is_err());
    }

    #[test]
    fn test_point_and_file_conflict() {
        let result = Cli::try_parse_from([
            "ls346ctl",
            "curve",
            "resize",
            "--size",
            "4",
            "--point",
            "1,2",
            "--file",
            "curve.json",
        ]);
        assert!(result.is_err());
    }
}
