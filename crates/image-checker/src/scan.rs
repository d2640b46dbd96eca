use std::path::{Path, PathBuf};

use picture_frame::photo::load_photo;
use picture_frame::select::{ImageFilter, eligible_images};
use tracing::{info, warn};

const PROGRESS_EVERY: usize = 100;

/// Totals from one pass over the tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub checked: usize,
    pub bad: Vec<PathBuf>,
}

/// Decode every eligible image under `root`, recording the ones that fail.
pub fn check_tree(root: &Path, filter: &ImageFilter) -> CheckReport {
    let mut report = CheckReport::default();
    for path in eligible_images(root, filter) {
        report.checked += 1;
        if let Err(err) = load_photo(&path) {
            warn!(path = %path.display(), error = %err, "cannot load image");
            report.bad.push(path);
        }
        if report.checked % PROGRESS_EVERY == 0 {
            info!(checked = report.checked, "images checked");
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn counts_good_and_bad_images() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::create_dir_all(root.join(".AppleDouble")).unwrap();

        image::RgbaImage::new(2, 2).save(root.join("good.png")).unwrap();
        image::RgbaImage::new(2, 2)
            .save_with_format(root.join("nested").join("good.PNG"), image::ImageFormat::Png)
            .unwrap();
        fs::write(root.join("nested").join("broken.jpg"), b"not a jpeg").unwrap();
        fs::write(root.join(".AppleDouble").join("sidecar.jpg"), b"x").unwrap();
        fs::write(root.join("._hidden.jpg"), b"x").unwrap();
        fs::write(root.join("notes.txt"), b"x").unwrap();

        let report = check_tree(root, &ImageFilter::default());
        assert_eq!(report.checked, 3);
        assert_eq!(report.bad, vec![root.join("nested").join("broken.jpg")]);
    }

    #[test]
    fn empty_tree_checks_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let report = check_tree(tmp.path(), &ImageFilter::default());
        assert_eq!(report, CheckReport::default());
    }
}
