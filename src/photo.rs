//! Decoded photo record plus orientation correction and classification.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::{ImageReader, RgbaImage, imageops};
use tracing::debug;

use crate::error::Error;

/// A decoded image ready for orientation, scaling and upload.
#[derive(Debug, Clone)]
pub struct Photo {
    pub path: PathBuf,
    pub pixels: RgbaImage,
    pub width: u32,
    pub height: u32,
}

impl Photo {
    pub fn new(path: PathBuf, pixels: RgbaImage) -> Self {
        let (width, height) = pixels.dimensions();
        Self {
            path,
            pixels,
            width,
            height,
        }
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        Layout::classify(self.width, self.height)
    }
}

/// Decode `path` to RGBA8.
///
/// # Errors
/// Returns [`Error::Decode`] if the file cannot be opened or decoded.
pub fn load_photo(path: &Path) -> Result<Photo, Error> {
    let decode = || -> Result<RgbaImage, image::ImageError> {
        let img = ImageReader::open(path)?
            .with_guessed_format()? // sniff based on content/extension
            .decode()?;
        Ok(img.to_rgba8())
    };
    let pixels = decode().map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let photo = Photo::new(path.to_path_buf(), pixels);
    debug!(
        path = %path.display(),
        width = photo.width,
        height = photo.height,
        "decoded image"
    );
    Ok(photo)
}

/// Rotation recorded in the EXIF orientation tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExifRotation {
    None,
    Rotated90Cw,
    Rotated90Ccw,
    Rotated180,
}

impl ExifRotation {
    /// Map a raw EXIF orientation value. Mirrored variants are left alone.
    #[must_use]
    pub const fn from_tag(value: u32) -> Self {
        match value {
            6 => Self::Rotated90Cw,
            8 => Self::Rotated90Ccw,
            3 => Self::Rotated180,
            _ => Self::None,
        }
    }

    /// Read the orientation tag of `path`. Missing or unreadable metadata
    /// yields [`ExifRotation::None`].
    #[must_use]
    pub fn read(path: &Path) -> Self {
        read_orientation(path).map_or(Self::None, Self::from_tag)
    }
}

fn read_orientation(path: &Path) -> Option<u32> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    field.value.get_uint(0)
}

/// Undo the camera rotation recorded in `rotation`.
#[must_use]
pub fn correct_orientation(photo: Photo, rotation: ExifRotation) -> Photo {
    let pixels = match rotation {
        ExifRotation::None => {
            debug!(path = %photo.path.display(), "no orientation correction needed");
            return photo;
        }
        ExifRotation::Rotated90Cw => imageops::rotate90(&photo.pixels),
        ExifRotation::Rotated90Ccw => imageops::rotate270(&photo.pixels),
        ExifRotation::Rotated180 => imageops::rotate180(&photo.pixels),
    };
    debug!(path = %photo.path.display(), ?rotation, "corrected orientation");
    Photo::new(photo.path, pixels)
}

/// Shape of a decoded photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Landscape,
    Portrait,
}

impl Layout {
    /// Square images count as portrait.
    #[must_use]
    pub const fn classify(width: u32, height: u32) -> Self {
        if width > height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    // JPEG 2x1 with EXIF orientation 6 (rotate 90 CW), base64 encoded
    const ORIENT6_JPEG: &str = concat!(
        "/9j/4AAQSkZJRgABAQAAAQABAAD/4QAiRXhpZgAATU0AKgAAAAgAAQESAAMAAAABAAYAAAAAAAD/2wBDAAgGBgcGBQgHBwcJCQgKDBQNDAsLDBkSEw8UHRofHh0aHBwgJC4nICIsIxwcKDcpLDAxNDQ0Hyc5PTgyPC4zNDL/",
        "2wBDAQkJCQwLDBgNDRgyIRwhMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjL/wAARCAABAAIDASIAAhEBAxEB/8QAHwAAAQUBAQEBAQEAAAAAAAAAAAECAwQFBgcICQoL/8QAtRAAAgEDAwIEAwUFBAQAAAF9AQIDAAQRBRIhMUEGE1FhByJxFDKBkaEII0KxwRVS0fAkM2JyggkKFhcYGRolJicoKSo0NTY3ODk6Q0RFRkdISUpTVFVWV1hZWmNkZWZnaGlqc3R1dnd4eXqDhIWGh4iJipKTlJWWl5iZmqKjpKWmp6ipqrKztLW2t7i5usLDxMXGx8jJytLT1NXW19jZ2uHi4+Tl5ufo6erx8vP09fb3+Pn6/8QAHwEAAwEBAQEBAQEBAQAAAAAAAAECAwQFBgcICQoL/8QAtREAAgECBAQDBAcFBAQAAQJ3AAECAxEEBSExBhJBUQdhcRMiMoEIFEKRobHBCSMzUvAVYnLRChYkNOEl8RcYGRomJygpKjU2Nzg5OkNERUZHSElKU1RVVldYWVpjZGVmZ2hpanN0dXZ3eHl6goOEhYaHiImKkpOUlZaXmJmaoqOkpaanqKmqsrO0tba3uLm6wsPExcbHyMnK0tPU1dbX2Nna4uPk5ebn6Onq8vP09fb3+Pn6/9oADAMBAAIRAxEAPwDi6KKK+ZP3E//Z"
    );

    #[test]
    fn classification_ties_go_to_portrait() {
        assert_eq!(Layout::classify(800, 600), Layout::Landscape);
        assert_eq!(Layout::classify(600, 800), Layout::Portrait);
        assert_eq!(Layout::classify(800, 800), Layout::Portrait);
    }

    #[test]
    fn orientation_six_rotates_clockwise() {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(ORIENT6_JPEG)
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orient6.jpg");
        std::fs::write(&path, &bytes).unwrap();

        assert_eq!(ExifRotation::read(&path), ExifRotation::Rotated90Cw);
        let photo = load_photo(&path).unwrap();
        assert_eq!((photo.width, photo.height), (2, 1));
        let photo = correct_orientation(photo, ExifRotation::Rotated90Cw);
        assert_eq!((photo.width, photo.height), (1, 2));
        assert_eq!(photo.layout(), Layout::Portrait);
    }

    #[test]
    fn missing_metadata_leaves_image_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.png");
        RgbaImage::new(3, 2).save(&path).unwrap();

        assert_eq!(ExifRotation::read(&path), ExifRotation::None);
        let photo = correct_orientation(load_photo(&path).unwrap(), ExifRotation::None);
        assert_eq!((photo.width, photo.height), (3, 2));
    }

    #[test]
    fn ccw_and_half_turn_rotations() {
        let photo = Photo::new(PathBuf::from("x.png"), RgbaImage::new(4, 2));
        let ccw = correct_orientation(photo.clone(), ExifRotation::Rotated90Ccw);
        assert_eq!((ccw.width, ccw.height), (2, 4));
        let half = correct_orientation(photo, ExifRotation::Rotated180);
        assert_eq!((half.width, half.height), (4, 2));
    }

    #[test]
    fn undecodable_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        let err = load_photo(&path).expect_err("garbage should not decode");
        assert!(matches!(err, Error::Decode { ref path, .. } if path.ends_with("bad.jpg")));
    }

    #[test]
    fn tag_mapping_ignores_mirrored_values() {
        assert_eq!(ExifRotation::from_tag(1), ExifRotation::None);
        assert_eq!(ExifRotation::from_tag(2), ExifRotation::None);
        assert_eq!(ExifRotation::from_tag(5), ExifRotation::None);
        assert_eq!(ExifRotation::from_tag(8), ExifRotation::Rotated90Ccw);
        assert_eq!(ExifRotation::from_tag(3), ExifRotation::Rotated180);
    }
}
