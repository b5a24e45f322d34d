// Elascope Main Entry Point
// Copyright (c) 2026 The Elascope Authors

use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use elascope::batch;
use elascope::config::{AnalysisConfig, Arrangement, BitrateMode, OutputFormat};

#[derive(Parser)]
#[command(name = "elascope")]
#[command(about = "Visualizes JPEG recompression error on images and video", long_about = None)]
struct Cli {
    /// Image file, video file, or directory of images to analyze
    input: PathBuf,

    /// Output path override (single-file inputs only)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JPEG quality factor for the throwaway re-encoding (1-100)
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Brightness ceiling for the contrast stretch
    #[arg(long, default_value_t = 4850.0)]
    ceiling: f32,

    /// Write the enhanced map alone instead of the joined composite
    #[arg(long)]
    separate: bool,

    /// Worker pool size (defaults to the host's parallelism)
    #[arg(long)]
    workers: Option<usize>,

    /// Output frame rate for video (defaults to the source rate)
    #[arg(long)]
    fps: Option<u32>,

    /// Bitrate source for video re-encoding
    #[arg(long, value_enum, default_value = "match")]
    bitrate: BitrateMode,

    /// Raster container for image outputs (defaults to the input's)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let args = Cli::parse();
    let config = AnalysisConfig {
        quality: args.quality,
        ceiling: args.ceiling,
        arrangement: if args.separate {
            Arrangement::Separate
        } else {
            Arrangement::Joined
        },
        workers: args.workers.unwrap_or_else(num_cpus::get),
        frame_rate: args.fps,
        bitrate: args.bitrate,
        format: args.format,
    };

    let summary = batch::run(&args.input, args.output, &config).await?;

    if summary.failed > 0 {
        warn!(
            "[MAIN] {} input(s) failed, {} written",
            summary.failed,
            summary.succeeded.len()
        );
    }
    info!("[MAIN] Done: {} output(s)", summary.succeeded.len());
    Ok(())
}
