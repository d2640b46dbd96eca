use fast_image_resize as fir;
use image::RgbaImage;
use tracing::debug;

use crate::error::Error;
use crate::photo::Photo;
use crate::processing::layout::fit_within;

/// Scale `photo` up or down so it fits a `display_w` x `display_h` screen.
///
/// # Errors
/// Returns [`Error::Resize`] if the resampler rejects the buffers.
pub fn scale_photo(photo: Photo, display_w: u32, display_h: u32) -> Result<Photo, Error> {
    let (target_w, target_h) = fit_within(display_w, display_h, photo.width, photo.height);
    debug!(
        original_width = photo.width,
        original_height = photo.height,
        scaled_width = target_w,
        scaled_height = target_h,
        "scaling image"
    );
    if (target_w, target_h) == (photo.width, photo.height) {
        return Ok(photo);
    }
    let pixels = resize_rgba(&photo.pixels, target_w, target_h)?;
    Ok(Photo::new(photo.path, pixels))
}

fn resize_rgba(source: &RgbaImage, target_w: u32, target_h: u32) -> Result<RgbaImage, Error> {
    let src_view = fir::images::ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        fir::PixelType::U8x4,
    )
    .map_err(|err| Error::Resize(err.to_string()))?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom));
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_view, &mut dst_image, Some(&options))
        .map_err(|err| Error::Resize(err.to_string()))?;
    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| Error::Resize("resized buffer has the wrong length".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn scaled_photo_fits_display_and_keeps_aspect() {
        let photo = Photo::new(PathBuf::from("wide.png"), RgbaImage::new(400, 200));
        let scaled = scale_photo(photo, 192, 108).unwrap();
        assert_eq!((scaled.width, scaled.height), (192, 96));
        assert_eq!(scaled.pixels.dimensions(), (192, 96));
    }

    #[test]
    fn exact_fit_is_left_alone() {
        let photo = Photo::new(PathBuf::from("same.png"), RgbaImage::new(64, 48));
        let scaled = scale_photo(photo, 64, 48).unwrap();
        assert_eq!((scaled.width, scaled.height), (64, 48));
    }
}
