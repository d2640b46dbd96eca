use picture_frame::Error;
use picture_frame::config::{Configuration, DisplayMode, FadeMode, ScreenMode};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn empty_document_uses_defaults() {
    let cfg: Configuration = serde_yaml::from_str("{}").unwrap();
    assert_eq!(cfg.photo_library_path, PathBuf::from("/FramePictures"));
    assert_eq!(cfg.frame_mode, DisplayMode::All);
    assert_eq!(cfg.fade_mode, FadeMode::Merge);
    assert_eq!(cfg.screen_mode, ScreenMode::Full);
    assert_eq!(cfg.dwell, Duration::from_secs(10));
    assert_eq!(cfg.select_attempts, 10);
    assert_eq!(cfg.extensions, vec![".jpg", ".JPG", ".png", ".PNG"]);
    assert_eq!(cfg.sidecar_dirs, vec![".AppleDouble"]);
}

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
photo-library-path: "/photos"
frame-mode: portrait
dwell: 5s
fade-mode: black
screen-mode: half
select-attempts: 3
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.photo_library_path, PathBuf::from("/photos"));
    assert_eq!(cfg.frame_mode, DisplayMode::Portrait);
    assert_eq!(cfg.dwell, Duration::from_secs(5));
    assert_eq!(cfg.fade_mode, FadeMode::Black);
    assert_eq!(cfg.screen_mode, ScreenMode::Half);
    assert_eq!(cfg.select_attempts, 3);
}

#[test]
fn capitalized_mode_names_are_accepted() {
    let yaml = r#"
frame-mode: Landscape
fade-mode: Merge
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.frame_mode, DisplayMode::Landscape);
    assert_eq!(cfg.fade_mode, FadeMode::Merge);
}

#[test]
fn humantime_dwell_with_minutes() {
    let cfg: Configuration = serde_yaml::from_str("dwell: 1m 30s").unwrap();
    assert_eq!(cfg.dwell, Duration::from_secs(90));
}

#[test]
fn custom_extensions_replace_defaults() {
    let yaml = r#"
extensions: [".jpeg", ".webp"]
sidecar-dirs: []
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let filter = cfg.image_filter();
    assert_eq!(filter.extensions, vec![".jpeg", ".webp"]);
    assert!(filter.sidecar_dirs.is_empty());
}

#[test]
fn unknown_mode_is_a_parse_error() {
    let err = serde_yaml::from_str::<Configuration>("frame-mode: diagonal");
    assert!(err.is_err());
}

#[test]
fn validated_rejects_bad_values() {
    let zero_attempts: Configuration = serde_yaml::from_str("select-attempts: 0").unwrap();
    assert!(zero_attempts.validated().is_err());

    let no_extensions: Configuration = serde_yaml::from_str("extensions: []").unwrap();
    assert!(no_extensions.validated().is_err());

    let ok: Configuration = serde_yaml::from_str("dwell: 2s").unwrap();
    assert!(ok.validated().is_ok());
}

#[test]
fn from_yaml_file_reads_disk() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(tmp.path(), "photo-library-path: /srv/pictures\nframe-mode: all\n").unwrap();
    let cfg = Configuration::from_yaml_file(tmp.path()).unwrap();
    assert_eq!(cfg.photo_library_path, PathBuf::from("/srv/pictures"));
    assert_eq!(cfg.frame_mode, DisplayMode::All);
}

#[test]
fn from_yaml_file_reports_missing_file() {
    let err = Configuration::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
    assert!(matches!(err, Error::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound));
}

#[test]
fn from_yaml_file_reports_malformed_yaml() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(tmp.path(), "frame-mode: [unterminated\n").unwrap();
    let err = Configuration::from_yaml_file(tmp.path()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
