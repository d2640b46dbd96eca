use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("resetting display");
    if let Err(err) = picture_frame::render::frame::reset_display() {
        error!(error = %format!("{err:#}"), "reset failed");
    }
    ExitCode::from(1)
}
