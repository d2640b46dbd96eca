use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, ensure};
use clap::ValueEnum;
use serde::Deserialize;

use crate::error::Error;
use crate::photo::Layout;
use crate::select::ImageFilter;

/// Which photos the frame shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    #[serde(alias = "Landscape")]
    Landscape,
    #[serde(alias = "Portrait")]
    Portrait,
    #[default]
    #[serde(alias = "All")]
    All,
}

impl DisplayMode {
    /// Whether a photo of the given shape is rendered in this mode.
    #[must_use]
    pub const fn admits(self, layout: Layout) -> bool {
        matches!(
            (self, layout),
            (Self::All, _) | (Self::Landscape, Layout::Landscape) | (Self::Portrait, Layout::Portrait)
        )
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Landscape => "Landscape",
            Self::Portrait => "Portrait",
            Self::All => "All",
        })
    }
}

/// Transition used when a new photo replaces the old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FadeMode {
    /// Cross-fade the new photo over the old one.
    #[default]
    #[serde(alias = "Merge")]
    Merge,
    /// Fade the old photo out to black, then the new photo in.
    #[serde(alias = "Black")]
    Black,
}

/// Fraction of the monitor the frame occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenMode {
    /// Borderless fullscreen.
    #[default]
    #[serde(alias = "Full")]
    Full,
    /// Window at half the monitor width and height.
    #[serde(alias = "Half")]
    Half,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Root directory searched recursively for images.
    pub photo_library_path: PathBuf,
    /// Which photo shapes are shown at startup.
    pub frame_mode: DisplayMode,
    /// Time a photo stays on screen after its fade completes.
    #[serde(with = "humantime_serde")]
    pub dwell: Duration,
    /// Transition style at startup.
    pub fade_mode: FadeMode,
    pub screen_mode: ScreenMode,
    /// Full tree walks attempted before giving up on finding an image.
    pub select_attempts: usize,
    /// Allowed extensions including the dot, matched case-sensitively.
    pub extensions: Vec<String>,
    /// Metadata sidecar directory names to skip.
    pub sidecar_dirs: Vec<String>,
}

impl Configuration {
    /// Parse a YAML configuration file.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Config`]
    /// if it is not a valid configuration.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let s = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(!self.dwell.is_zero(), "dwell must be greater than zero");
        ensure!(
            self.select_attempts > 0,
            "select-attempts must be greater than zero"
        );
        ensure!(
            !self.extensions.is_empty(),
            "extensions must list at least one entry"
        );
        ensure!(
            self.extensions.iter().all(|e| e.starts_with('.') && e.len() > 1),
            "extensions must start with a dot, e.g. \".jpg\""
        );
        Ok(self)
    }

    #[must_use]
    pub fn image_filter(&self) -> ImageFilter {
        ImageFilter {
            extensions: self.extensions.clone(),
            sidecar_dirs: self.sidecar_dirs.clone(),
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        let filter = ImageFilter::default();
        Self {
            photo_library_path: PathBuf::from("/FramePictures"),
            frame_mode: DisplayMode::All,
            dwell: Duration::from_secs(10),
            fade_mode: FadeMode::Merge,
            screen_mode: ScreenMode::Full,
            select_attempts: 10,
            extensions: filter.extensions,
            sidecar_dirs: filter.sidecar_dirs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mode_admission() {
        assert!(DisplayMode::All.admits(Layout::Landscape));
        assert!(DisplayMode::All.admits(Layout::Portrait));
        assert!(DisplayMode::Landscape.admits(Layout::Landscape));
        assert!(!DisplayMode::Landscape.admits(Layout::Portrait));
        assert!(DisplayMode::Portrait.admits(Layout::Portrait));
        assert!(!DisplayMode::Portrait.admits(Layout::Landscape));
    }

    #[test]
    fn zero_dwell_is_rejected() {
        let cfg = Configuration {
            dwell: Duration::ZERO,
            ..Configuration::default()
        };
        assert!(cfg.validated().is_err());
    }

    #[test]
    fn undotted_extension_is_rejected() {
        let cfg = Configuration {
            extensions: vec!["jpg".into()],
            ..Configuration::default()
        };
        assert!(cfg.validated().is_err());
    }
}
