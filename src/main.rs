//! Text Scanner - printed-text OCR from image files or a live camera
//!
//! Load a picture or stream a camera, optionally drag a region of interest,
//! and read the text in it. Recognized words are boxed on the image.

mod app;
mod capture;
mod config;
mod dashboard;
mod error;
mod geometry;
mod scan;
mod selection;
mod shared;
mod vision;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::app::Services;
use crate::config::AppConfig;
use crate::dashboard::Startup;
use crate::geometry::SourceRect;
use crate::scan::ScanFormat;
use crate::vision::TesseractEngine;

/// Text Scanner - printed-text OCR
#[derive(Parser, Debug)]
#[command(name = "text-scanner", version)]
#[command(about = "Read printed text from images or a live camera")]
struct Cli {
    /// Configuration file (default: <config dir>/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Image to open at startup
    #[arg(long)]
    image: Option<PathBuf>,

    /// Camera to start at startup
    #[arg(long)]
    camera: Option<u32>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Recognize one image without opening a window
    Scan(ScanArgs),
    /// Print the effective configuration as TOML
    PrintConfig {
        /// Also write it to the default config location
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Image to recognize
    image: PathBuf,

    /// Region of interest in image pixels
    #[arg(long, value_name = "X,Y,W,H", value_parser = scan::parse_roi)]
    roi: Option<SourceRect>,

    /// Print JSON with word boxes instead of plain text
    #[arg(long)]
    json: bool,

    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Logs go to stderr so `scan` output stays clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = load_or_create_config(cli.config.as_deref())?;

    match cli.command {
        Some(CliCommand::Scan(args)) => run_scan(&config, args),
        Some(CliCommand::PrintConfig { save }) => print_config(&config, save),
        None => run_window(config, cli.image, cli.camera),
    }
}

/// Load configuration from `--config`, the default location, or defaults
fn load_or_create_config(explicit: Option<&std::path::Path>) -> Result<AppConfig> {
    let config = match explicit {
        Some(path) => {
            let config = config::load_config(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => match config::default_config_path() {
            Ok(path) if path.exists() => {
                let config = config::load_config(&path)?;
                info!("Loaded configuration from {:?}", path);
                config
            }
            _ => {
                info!("Using default configuration");
                AppConfig::default()
            }
        },
    };
    Ok(config.with_env_overrides())
}

fn print_config(config: &AppConfig, save: bool) -> Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    if save {
        let path = config::default_config_path()?;
        config::save_config(config, &path)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        info!("Saved configuration to {:?}", path);
    }
    Ok(())
}

fn run_scan(config: &AppConfig, args: ScanArgs) -> Result<()> {
    let engine = Arc::new(TesseractEngine::new(&config.ocr));
    let result = scan::scan(engine, &args.image, args.roi)?;

    let format = if args.json {
        ScanFormat::Json
    } else {
        ScanFormat::Text
    };
    let rendered = scan::render(&result, format)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote result to {:?}", path);
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn run_window(config: AppConfig, image: Option<PathBuf>, camera: Option<u32>) -> Result<()> {
    info!("Text Scanner starting...");

    // Camera polling and OCR jobs run here; the window keeps the main thread
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("scanner-worker")
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let engine = Arc::new(TesseractEngine::new(&config.ocr));
    info!("OCR language: {}", engine.language());
    let services = Services::new(
        config,
        runtime.handle().clone(),
        engine,
        capture::default_backend(),
    );

    if let Err(e) = dashboard::run_scanner(services, Startup { image, camera }) {
        tracing::error!("Window error: {}", e);
    }

    info!("Text Scanner shutdown complete");
    Ok(())
}
