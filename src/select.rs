//! Random image selection over a directory tree.
//!
//! The tree is re-walked on every call so files added or removed by an
//! outside sync job are picked up without keeping an index in memory.
//! Selection uses reservoir sampling with a reservoir of one.

use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::error::Error;

/// Decides which files in the tree are candidates for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFilter {
    /// Allowed extensions including the leading dot, matched literally.
    pub extensions: Vec<String>,
    /// Directory names holding platform metadata sidecars (never descended).
    pub sidecar_dirs: Vec<String>,
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self {
            extensions: [".jpg", ".JPG", ".png", ".PNG"]
                .into_iter()
                .map(String::from)
                .collect(),
            sidecar_dirs: vec![".AppleDouble".to_string()],
        }
    }
}

impl ImageFilter {
    /// Return `true` if `path` (found under `root`) may be shown.
    ///
    /// Extensions are compared case-sensitively against the configured list.
    #[must_use]
    pub fn is_eligible(&self, root: &Path, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if name.starts_with('.') {
            return false;
        }
        if !self.has_allowed_extension(path) {
            return false;
        }
        let below_root = path.strip_prefix(root).unwrap_or(path);
        !below_root
            .parent()
            .into_iter()
            .flat_map(Path::components)
            .any(|c| c.as_os_str().to_str().is_some_and(|c| self.is_sidecar(c)))
    }

    fn has_allowed_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.strip_prefix('.').unwrap_or(allowed) == ext)
            })
    }

    fn is_sidecar(&self, name: &str) -> bool {
        self.sidecar_dirs.iter().any(|d| d == name)
    }

    fn should_skip_dir(&self, entry: &DirEntry) -> bool {
        // The root is never pruned, even if it is itself named like a sidecar.
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        entry
            .file_name()
            .to_str()
            .is_some_and(|n| self.is_sidecar(n))
    }
}

/// Stream every eligible image below `root` in walk order.
///
/// Unreadable entries are skipped. Symlinked files are listed; symlinked
/// directories are not followed.
pub fn eligible_images<'a>(
    root: &'a Path,
    filter: &'a ImageFilter,
) -> impl Iterator<Item = PathBuf> + 'a {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(move |e| !filter.should_skip_dir(e))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(is_file_like)
        .filter(move |entry| filter.is_eligible(root, entry.path()))
        .map(DirEntry::into_path)
}

/// Regular files and symlinks that do not point at a directory. Directory
/// links are never descended, so a dangling link is listed and left for
/// [`select_with_retry`] to reject.
fn is_file_like(entry: &DirEntry) -> bool {
    let ft = entry.file_type();
    ft.is_file() || (ft.is_symlink() && !entry.path().is_dir())
}

/// Pick one eligible image uniformly at random from the tree under `root`.
///
/// Returns `Ok(None)` when the walk finds no eligible file.
///
/// # Errors
/// Returns [`Error::BadDir`] if `root` is missing or not a directory.
#[allow(clippy::cast_precision_loss)]
pub fn select_image<R: Rng + ?Sized>(
    root: &Path,
    filter: &ImageFilter,
    rng: &mut R,
) -> Result<Option<PathBuf>, Error> {
    if !root.is_dir() {
        return Err(Error::BadDir(root.to_string_lossy().into_owned()));
    }

    let mut seen: u64 = 0;
    let mut chosen = None;
    for path in eligible_images(root, filter) {
        seen += 1;
        let r: f64 = rng.random_range(0.0..seen as f64);
        if r < 1.0 {
            chosen = Some(path);
        }
    }
    trace!(root = %root.display(), eligible = seen, "walk complete");
    Ok(chosen)
}

/// Run [`select_image`] up to `attempts` times until it yields a file that is
/// still present and eligible.
///
/// # Errors
/// Returns [`Error::BadDir`] if `root` is missing or not a directory.
pub fn select_with_retry<R: Rng + ?Sized>(
    root: &Path,
    filter: &ImageFilter,
    attempts: usize,
    rng: &mut R,
) -> Result<Option<PathBuf>, Error> {
    for attempt in 1..=attempts {
        match select_image(root, filter, rng)? {
            Some(path) if path.is_file() && filter.is_eligible(root, &path) => {
                debug!(attempt, path = %path.display(), "randomly selected image");
                return Ok(Some(path));
            }
            Some(path) => {
                debug!(attempt, path = %path.display(), "selected image vanished; retrying");
            }
            None => debug!(attempt, "no eligible image found; retrying"),
        }
    }
    Ok(None)
}
