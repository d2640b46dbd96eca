mod scan;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Result, ensure};
use clap::Parser;
use picture_frame::select::ImageFilter;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "image-checker",
    about = "Utility to check all images in a picture frame tree can be loaded"
)]
struct Args {
    /// Path to top of a directory tree that contains images
    #[arg(short = 'p', default_value = "/home/pi/FramePictures")]
    top_path: PathBuf,

    /// Logging level (error|warn|info|debug|trace).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn run(args: &Args) -> Result<bool> {
    ensure!(
        args.top_path.is_dir(),
        "{} is not a directory",
        args.top_path.display()
    );
    info!(path = %args.top_path.display(), "beginning image file scan");
    let report = scan::check_tree(&args.top_path, &ImageFilter::default());
    info!(
        scanned = report.checked,
        bad = report.bad.len(),
        "done image file scan"
    );
    for path in &report.bad {
        println!("{}", path.display());
    }
    Ok(report.bad.is_empty())
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = init_tracing(&args.log_level) {
        eprintln!("failed to initialise logging: {err:#}");
        return ExitCode::FAILURE;
    }
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            error!(error = %format!("{err:#}"), "image check failed");
            ExitCode::from(1)
        }
    }
}
