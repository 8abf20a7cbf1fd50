//! fuelsheet CLI - Fuel-station report exporter
//!
//! Renders a station's monthly reports into one xlsx workbook, either on
//! demand (`export`) or from a JSON request body (`handle`).

mod config;
mod delivery;
mod handler;
mod pipeline;
mod source;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fuelsheet_core::{Request, RequestInput};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::pipeline::ReportPipeline;

#[derive(Parser)]
#[command(name = "fuelsheet")]
#[command(author, version, about = "Fuel-station report workbooks", long_about = None)]
struct Cli {
    /// Defaults file (TOML); `defaults.toml` in the working directory if present
    #[arg(short, long, global = true, env = "FUELSHEET_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the workbook for one station and month
    Export {
        /// Any day in the reporting month (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Station identifier
        #[arg(short, long)]
        station: String,

        /// Write to this file instead of the configured output directory
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Serve a JSON request body (`{"date": ..., "stationID": ...}`)
    Handle {
        /// Request body; read from stdin if omitted
        #[arg(value_name = "REQUEST_JSON")]
        request: Option<String>,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::info!(stage = %config.stage, "fuelsheet starting");
    let pipeline = ReportPipeline::from_config(&config);

    match cli.command {
        Commands::Export {
            date,
            station,
            file,
        } => {
            let request = Request::try_from(RequestInput {
                date,
                station_id: station,
            })?;
            let locator = match file {
                Some(path) => pipeline.run_to_path(&request, &path)?.display().to_string(),
                None => pipeline.run(&request)?,
            };
            println!("{locator}");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Handle { request } => {
            let body = match request {
                Some(body) => body,
                None => {
                    let mut body = String::new();
                    std::io::stdin()
                        .read_to_string(&mut body)
                        .context("failed to read request body from stdin")?;
                    body
                }
            };
            let response = handler::handle(&pipeline, &body);
            println!("{}", response.body);
            Ok(if response.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
