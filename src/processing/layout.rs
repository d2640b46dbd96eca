/// Fit an image inside the display, preserving aspect ratio.
///
/// The more constraining of the two axis ratios wins, so one dimension lands
/// exactly on the display edge. Small images are scaled up. The free
/// dimension is truncated.
#[allow(clippy::cast_possible_truncation)]
pub fn fit_within(display_w: u32, display_h: u32, src_w: u32, src_h: u32) -> (u32, u32) {
    let (dw, dh) = (u64::from(display_w.max(1)), u64::from(display_h.max(1)));
    let (iw, ih) = (u64::from(src_w.max(1)), u64::from(src_h.max(1)));
    // dh/ih <= dw/iw, cross-multiplied to stay in integers.
    let (w, h) = if dh * iw <= dw * ih {
        (iw * dh / ih, dh)
    } else {
        (dw, ih * dw / iw)
    };
    (w.clamp(1, u64::from(u32::MAX)) as u32, h.clamp(1, u64::from(u32::MAX)) as u32)
}

pub fn center_offset(inner_w: u32, inner_h: u32, outer_w: u32, outer_h: u32) -> (u32, u32) {
    let ox = outer_w.saturating_sub(inner_w) / 2;
    let oy = outer_h.saturating_sub(inner_h) / 2;
    (ox, oy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_image_is_width_constrained() {
        assert_eq!(fit_within(1920, 1080, 4000, 2000), (1920, 960));
    }

    #[test]
    fn tall_image_is_height_constrained() {
        assert_eq!(fit_within(1920, 1080, 3024, 4032), (810, 1080));
    }

    #[test]
    fn small_image_is_scaled_up() {
        assert_eq!(fit_within(1920, 1080, 800, 600), (1440, 1080));
    }

    #[test]
    fn offsets_center_the_image() {
        assert_eq!(center_offset(1920, 960, 1920, 1080), (0, 60));
        assert_eq!(center_offset(810, 1080, 1920, 1080), (555, 0));
        assert_eq!(center_offset(2000, 2000, 1920, 1080), (0, 0));
    }
}
