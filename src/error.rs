use std::path::PathBuf;

use thiserror::Error;

/// Library error type for picture frame operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured photo root is missing or not a directory.
    #[error("invalid photo directory: {0}")]
    BadDir(String),

    /// Every selection attempt finished without an eligible image.
    #[error("no images found under {0}")]
    NoImages(PathBuf),

    /// The image decoder rejected the selected file.
    #[error("cannot load image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// CPU resize of a decoded photo failed.
    #[error("resize error: {0}")]
    Resize(String),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),

    /// Rendering/display error from the frame backend.
    #[error("render error: {0:#}")]
    Render(anyhow::Error),
}
