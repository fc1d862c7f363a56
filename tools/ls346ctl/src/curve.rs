//! Curve commands
//!
//! Read, write and resize calibration curves.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::*;
use ls346_common::AppConfig;
use ls346_link::{open_channel, InstrumentChannel, LogProgress};
use ls346_protocol::{read_curve, resize, write_curve, CurveBuffer, CurvePoint};
use std::path::PathBuf;
use tracing::info;

use crate::utils::{parse_point, print_json, read_points_file, split_points};

#[derive(Subcommand)]
pub enum CurveCommands {
    /// Download a curve from the instrument
    #[command(about = "Read a curve (1-60) and print its points as JSON")]
    Read {
        /// Curve number
        #[arg(long)]
        curve: u32,

        /// Number of points to read (default: transfer.read_points)
        #[arg(long)]
        points: Option<usize>,

        /// Points per command (default: transfer.batch_size)
        #[arg(long)]
        batch: Option<usize>,

        /// Only print points before the first (0, 0) terminator
        #[arg(long)]
        data_only: bool,
    },

    /// Upload a curve to the instrument
    #[command(about = "Write a user curve (21-60)")]
    Write {
        /// Curve number
        #[arg(long)]
        curve: u32,

        /// Point as UNIT,TEMPERATURE (repeatable)
        #[arg(long = "point", value_parser = parse_point, allow_hyphen_values = true)]
        points: Vec<CurvePoint>,

        /// JSON file with curve points, instead of --point
        #[arg(long, conflicts_with = "points")]
        file: Option<PathBuf>,

        /// Points per command (default: transfer.batch_size)
        #[arg(long)]
        batch: Option<usize>,
    },

    /// Truncate or zero-pad a curve (offline)
    #[command(about = "Resize curve arrays to a new length (1-200)")]
    Resize {
        /// New curve length
        #[arg(long)]
        size: usize,

        /// Point as UNIT,TEMPERATURE (repeatable)
        #[arg(long = "point", value_parser = parse_point, allow_hyphen_values = true)]
        points: Vec<CurvePoint>,

        /// JSON file with curve points, instead of --point
        #[arg(long, conflicts_with = "points")]
        file: Option<PathBuf>,
    },
}

fn collect_points(points: Vec<CurvePoint>, file: Option<PathBuf>) -> Result<Vec<CurvePoint>> {
    match file {
        Some(path) => read_points_file(&path),
        None => Ok(points),
    }
}

async fn connect(config: &AppConfig) -> Result<Box<dyn InstrumentChannel>> {
    open_channel(&config.link)
        .await
        .with_context(|| format!("Failed to open {} link", config.link.kind))
}

pub async fn handle_command(cmd: CurveCommands, config: &AppConfig) -> Result<()> {
    match cmd {
        CurveCommands::Read {
            curve,
            points,
            batch,
            data_only,
        } => {
            let total = points.unwrap_or(config.transfer.read_points);
            let batch = batch.unwrap_or(config.transfer.batch_size);

            let mut channel = connect(config).await?;
            let mut progress = LogProgress::new(&config.transfer.progress_name);
            let points = read_curve(channel.as_mut(), curve, total, batch, &mut progress)
                .await
                .with_context(|| format!("Failed to read curve {curve}"))?;

            info!(stats = ?channel.stats(), "Link statistics");
            eprintln!(
                "{} curve {}: {} of {} points",
                "Read".green(),
                curve,
                points.len(),
                total
            );

            if data_only {
                let buffer = CurveBuffer::from_points(points)?;
                print_json(buffer.data())
            } else {
                print_json(&points)
            }
        },
        CurveCommands::Write {
            curve,
            points,
            file,
            batch,
        } => {
            let points = collect_points(points, file)?;
            if points.is_empty() {
                bail!("no curve points given, use --point or --file");
            }
            let (units, temps) = split_points(&points);
            let batch = batch.unwrap_or(config.transfer.batch_size);

            let mut channel = connect(config).await?;
            let mut progress = LogProgress::new(&config.transfer.progress_name);
            let outcome = write_curve(channel.as_mut(), curve, &units, &temps, batch, &mut progress)
                .await
                .with_context(|| format!("Failed to write curve {curve}"))?;

            info!(stats = ?channel.stats(), "Link statistics");
            eprintln!(
                "{} curve {}: {} points{}",
                "Wrote".green(),
                curve,
                outcome.effective_len,
                if outcome.terminator_appended {
                    " + terminator"
                } else {
                    ""
                }
            );
            print_json(&outcome)
        },
        CurveCommands::Resize { size, points, file } => {
            let points = collect_points(points, file)?;
            let (units, temps) = split_points(&points);
            let resized = resize(&units, &temps, size)?;
            print_json(&resized)
        },
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resize_is_offline() {
        // The default serial port does not exist here; resize must not open it
        let cmd = CurveCommands::Resize {
            size: 3,
            points: vec![CurvePoint::new(1.0, 10.0)],
            file: None,
        };
        handle_command(cmd, &AppConfig::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_resize_rejects_bad_size() {
        let cmd = CurveCommands::Resize {
            size: 0,
            points: vec![],
            file: None,
        };
        let err = handle_command(cmd, &AppConfig::default()).await.unwrap_err();
        assert!(err.to_string().contains("size must be between 1 and 200"));
    }

    #[tokio::test]
    async fn test_write_requires_points() {
        let cmd = CurveCommands::Write {
            curve: 21,
            points: vec![],
            file: None,
            batch: None,
        };
        let err = handle_command(cmd, &AppConfig::default()).await.unwrap_err();
        assert!(err.to_string().contains("no curve points"));
    }
}
