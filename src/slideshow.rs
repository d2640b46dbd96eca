//! Slideshow driver: select, load, orient, classify, render, dwell, poll.
//!
//! The driver owns no display resources. Everything visible goes through a
//! [`Frame`], which keeps the state machine testable without a window.

use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info};

pub use crate::config::{DisplayMode, FadeMode, ScreenMode};
use crate::config::Configuration;
use crate::error::Error;
use crate::photo::{ExifRotation, Layout, Photo, correct_orientation, load_photo};
use crate::processing::scale::scale_photo;
use crate::select::{ImageFilter, select_with_retry};

/// A decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Restrict (or stop restricting) which photo shapes are shown.
    Show(DisplayMode),
    Fade(FadeMode),
    /// Any other key.
    Quit,
}

/// Mutable slideshow state carried between iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowState {
    pub display_mode: DisplayMode,
    pub fade_mode: FadeMode,
    pub running: bool,
}

impl ShowState {
    #[must_use]
    pub const fn new(display_mode: DisplayMode, fade_mode: FadeMode) -> Self {
        Self {
            display_mode,
            fade_mode,
            running: true,
        }
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Show(mode) => {
                info!(mode = %mode, "display mode changed");
                self.display_mode = mode;
            }
            Command::Fade(mode) => {
                info!(?mode, "fade mode changed");
                self.fade_mode = mode;
            }
            Command::Quit => self.running = false,
        }
    }
}

/// The display collaborator driven by [`Slideshow`].
pub trait Frame {
    /// Drawable size in pixels.
    fn size(&self) -> (u32, u32);

    /// Transition from whatever is on screen to `photo`.
    ///
    /// # Errors
    /// Returns an error if the backend fails to upload or draw.
    fn present(&mut self, photo: &Photo, fade: FadeMode) -> anyhow::Result<()>;

    /// Keep the current photo on screen for `duration`.
    ///
    /// # Errors
    /// Returns an error if the backend fails while redrawing.
    fn dwell(&mut self, duration: Duration) -> anyhow::Result<()>;

    /// Take at most one pending key press without blocking.
    fn poll(&mut self) -> Option<Command>;

    /// Restore input visibility and release the display.
    fn teardown(&mut self);
}

/// Result of a single loop iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Shown { path: PathBuf, layout: Layout },
    /// The photo did not match the display mode; nothing was drawn.
    Skipped { path: PathBuf, layout: Layout },
}

/// Why the loop stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    KeyPressed,
}

pub struct Slideshow<R> {
    root: PathBuf,
    filter: ImageFilter,
    attempts: usize,
    dwell: Duration,
    state: ShowState,
    rng: R,
    iteration: u64,
}

impl<R: Rng> Slideshow<R> {
    pub fn new(cfg: &Configuration, rng: R) -> Self {
        Self {
            root: cfg.photo_library_path.clone(),
            filter: cfg.image_filter(),
            attempts: cfg.select_attempts.max(1),
            dwell: cfg.dwell,
            state: ShowState::new(cfg.frame_mode, cfg.fade_mode),
            rng,
            iteration: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &ShowState {
        &self.state
    }

    /// Run one iteration. Key handling happens at the end, so the returned
    /// outcome describes the photo and [`Slideshow::state`] reflects any key.
    ///
    /// # Errors
    /// Returns [`Error::NoImages`] when selection comes back empty,
    /// [`Error::Decode`] when the chosen file cannot be decoded, and
    /// [`Error::Render`] when the frame fails.
    pub fn step<F: Frame + ?Sized>(&mut self, frame: &mut F) -> Result<Outcome, Error> {
        self.iteration += 1;
        debug!(iteration = self.iteration, "slideshow iteration");

        let path = select_with_retry(&self.root, &self.filter, self.attempts, &mut self.rng)?
            .ok_or_else(|| Error::NoImages(self.root.clone()))?;

        let photo = load_photo(&path)?;
        let photo = correct_orientation(photo, ExifRotation::read(&path));
        let layout = photo.layout();

        let outcome = if self.state.display_mode.admits(layout) {
            let (display_w, display_h) = frame.size();
            let scaled = scale_photo(photo, display_w, display_h)?;
            frame
                .present(&scaled, self.state.fade_mode)
                .map_err(Error::Render)?;
            info!(path = %path.display(), ?layout, "showing image");
            frame.dwell(self.dwell).map_err(Error::Render)?;
            Outcome::Shown { path, layout }
        } else {
            debug!(
                path = %path.display(),
                ?layout,
                mode = %self.state.display_mode,
                "image skipped by display mode"
            );
            Outcome::Skipped { path, layout }
        };

        if let Some(command) = frame.poll() {
            self.state.apply(command);
        }
        Ok(outcome)
    }

    /// Loop until a quit key or a fatal error. The frame is torn down exactly
    /// once on every exit path.
    ///
    /// # Errors
    /// Propagates the fatal error from [`Slideshow::step`].
    pub fn run<F: Frame + ?Sized>(&mut self, frame: &mut F) -> Result<Ending, Error> {
        info!(
            root = %self.root.display(),
            mode = %self.state.display_mode,
            fade = ?self.state.fade_mode,
            dwell = %humantime::format_duration(self.dwell),
            "starting slideshow"
        );
        let result = self.run_until_stopped(frame);
        frame.teardown();
        result
    }

    fn run_until_stopped<F: Frame + ?Sized>(&mut self, frame: &mut F) -> Result<Ending, Error> {
        while self.state.running {
            self.step(frame)?;
        }
        Ok(Ending::KeyPressed)
    }
}

/// Weights for one rendered frame of a transition, in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeFrame {
    pub outgoing: u8,
    pub incoming: u8,
}

const MERGE_RATE: usize = 10;
const BLACK_RATE: usize = 25;

/// Frames drawn for a transition. Every schedule ends fully on the new photo.
#[must_use]
pub fn fade_schedule(mode: FadeMode) -> Vec<FadeFrame> {
    let mut frames = Vec::new();
    match mode {
        FadeMode::Merge => {
            for a in (0..=255u8).step_by(MERGE_RATE) {
                frames.push(FadeFrame {
                    outgoing: 255 - a,
                    incoming: a,
                });
            }
        }
        FadeMode::Black => {
            for a in (0..=255u8).rev().step_by(BLACK_RATE) {
                frames.push(FadeFrame {
                    outgoing: a,
                    incoming: 0,
                });
            }
            frames.push(FadeFrame {
                outgoing: 0,
                incoming: 0,
            });
            for a in (0..=255u8).step_by(BLACK_RATE) {
                frames.push(FadeFrame {
                    outgoing: 0,
                    incoming: a,
                });
            }
        }
    }
    frames.push(FadeFrame {
        outgoing: 0,
        incoming: 255,
    });
    frames
}
