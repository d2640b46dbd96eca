//! Binary entrypoint for the picture frame.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use picture_frame::config::{Configuration, DisplayMode, FadeMode, ScreenMode};
use picture_frame::render::frame::WinitFrame;
use picture_frame::slideshow::Slideshow;
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, fmt};

/// Displays images for a picture frame
#[derive(Debug, Parser)]
#[command(name = "picture-frame", about = "Displays images for a picture frame")]
struct Cli {
    /// Optional YAML config file; flags below override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to top of a directory tree that contains images
    #[arg(short = 'p', value_name = "PATH")]
    top_path: Option<PathBuf>,

    /// What image types to display
    #[arg(short = 'm', value_enum, ignore_case = true)]
    frame_mode: Option<DisplayMode>,

    /// Time (in seconds) to display each image
    #[arg(short = 't', value_name = "SECONDS")]
    display_time: Option<u64>,

    /// Fade mode to run in
    #[arg(short = 'f', value_enum, ignore_case = true)]
    fade_mode: Option<FadeMode>,

    /// Screen mode to run in (full = fullscreen, half = 50%)
    #[arg(short = 's', value_enum, ignore_case = true)]
    screen_mode: Option<ScreenMode>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn configuration(&self) -> Result<Configuration> {
        let mut cfg = match &self.config {
            Some(path) => Configuration::from_yaml_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => Configuration::default(),
        };
        if let Some(path) = &self.top_path {
            cfg.photo_library_path.clone_from(path);
        }
        if let Some(mode) = self.frame_mode {
            cfg.frame_mode = mode;
        }
        if let Some(secs) = self.display_time {
            cfg.dwell = Duration::from_secs(secs);
        }
        if let Some(mode) = self.fade_mode {
            cfg.fade_mode = mode;
        }
        if let Some(mode) = self.screen_mode {
            cfg.screen_mode = mode;
        }
        cfg.validated().context("validating configuration")
    }
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("picture_frame={level}").parse()?)
        .add_directive("wgpu=warn".parse()?)
        .add_directive("winit=warn".parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let cfg = cli.configuration()?;
    info!(
        path = %cfg.photo_library_path.display(),
        mode = %cfg.frame_mode,
        dwell = %humantime::format_duration(cfg.dwell),
        fade = ?cfg.fade_mode,
        screen = ?cfg.screen_mode,
        "welcome to picture frame"
    );

    let mut frame = WinitFrame::open(cfg.screen_mode).context("opening display")?;
    let mut show = Slideshow::new(&cfg, rand::rng());
    let ending = show.run(&mut frame)?;
    info!(?ending, "slideshow finished");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_tracing(cli.verbose) {
        eprintln!("failed to initialise logging: {err:#}");
        return ExitCode::FAILURE;
    }

    if let Err(err) = run(&cli) {
        error!(error = %format!("{err:#}"), "exiting");
    }
    // Every designed exit path reports status 1, including a requested quit.
    ExitCode::from(1)
}
