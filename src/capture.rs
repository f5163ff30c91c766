//! Hotkey-triggered capture.
//!
//! A capture hides the viewer, waits until it is really gone from the
//! screen, grabs the whole virtual screen and writes it as a PNG. By default
//! every capture replaces `screenshot.png` in the application directory.
//! With "keep images" turned on each capture gets its own timestamped file in
//! `Saved/`, and existing files there are never overwritten.

use crate::screengrab::{EncodeError, GrabError, Image, ScreenGrabber};
use chrono::{DateTime, Local};
use custom_error::custom_error;
use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_HIDE_TIMEOUT: Duration = Duration::from_secs(2);

const DEFAULT_FILE: &str = "screenshot.png";
const SAVED_DIR: &str = "Saved";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

custom_error! { pub CaptureError
    HideTimeout{waited: Duration} = @{ format!("the window did not hide within {:?}", waited) },
    Grab{source: GrabError} = "cannot grab the screen: {source}",
    Encode{source: EncodeError} = "cannot encode the screenshot: {source}",
    CreateDir{path: PathBuf, source: io::Error} = @{ format!("cannot create {}: {}", path.display(), source) },
    Write{path: PathBuf, source: io::Error} = @{ format!("cannot write {}: {}", path.display(), source) },
}

/// The window that must get out of the way while the screen is grabbed.
pub trait Surface {
    fn hide(&mut self);

    /// Blocks until the window is off screen or `timeout` elapses.
    /// Returns `false` on timeout.
    fn wait_hidden(&mut self, timeout: Duration) -> bool;

    fn present(&mut self, image: &Image);
    fn show(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturePaths {
    pub default_file: PathBuf,
    pub saved_dir: PathBuf,
}

impl CapturePaths {
    pub fn new(app_dir: &Path) -> CapturePaths {
        CapturePaths {
            default_file: app_dir.join(DEFAULT_FILE),
            saved_dir: app_dir.join(SAVED_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    pub path: PathBuf,
    pub sequence: u32,
}

pub struct CaptureController<G> {
    grabber: G,
    paths: CapturePaths,
    keep_images: bool,
    hide_timeout: Duration,

    count: u32,
    current: Option<CaptureRecord>,
}

impl<G: ScreenGrabber> CaptureController<G> {
    pub fn new(grabber: G, paths: CapturePaths, keep_images: bool) -> Self {
        CaptureController {
            grabber,
            paths,
            keep_images,
            hide_timeout: DEFAULT_HIDE_TIMEOUT,
            count: 0,
            current: None,
        }
    }

    pub fn set_keep_images(&mut self, keep_images: bool) {
        self.keep_images = keep_images;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn current(&self) -> Option<&CaptureRecord> {
        self.current.as_ref()
    }

    /// Takes a screenshot and writes it to disk. The surface is shown again
    /// whatever the outcome; on failure nothing else changes, including the
    /// file of the previous capture.
    pub fn capture_now<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
    ) -> Result<CaptureRecord, CaptureError> {
        surface.hide();
        let result = self.capture_hidden(surface);
        surface.show();

        match &result {
            Ok(record) => tracing::info!(
                path = %record.path.display(),
                sequence = record.sequence,
                "screenshot saved"
            ),
            Err(e) => tracing::warn!(error = %e, "screenshot failed"),
        }

        result
    }

    fn capture_hidden<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
    ) -> Result<CaptureRecord, CaptureError> {
        if !surface.wait_hidden(self.hide_timeout) {
            return Err(CaptureError::HideTimeout {
                waited: self.hide_timeout,
            });
        }

        let image = self.grabber.grab()?;

        let mut png = Vec::new();
        image.encode_png(&mut png)?;

        let path = self.store(&png, Local::now())?;

        self.count += 1;

        let record = CaptureRecord {
            path,
            sequence: self.count,
        };

        self.current = Some(record.clone());
        surface.present(&image);

        Ok(record)
    }

    fn store(&self, png: &[u8], now: DateTime<Local>) -> Result<PathBuf, CaptureError> {
        if self.keep_images {
            self.store_kept(png, now)
        } else {
            self.store_default(png)
        }
    }

    // written next to the target, then renamed over it
    fn store_default(&self, png: &[u8]) -> Result<PathBuf, CaptureError> {
        let path = self.paths.default_file.clone();
        let staging = path.with_extension("png.tmp");

        if let Err(source) = fs::write(&staging, png).and_then(|_| fs::rename(&staging, &path)) {
            remove_partial(&staging);
            return Err(CaptureError::Write { path, source });
        }

        Ok(path)
    }

    fn store_kept(&self, png: &[u8], now: DateTime<Local>) -> Result<PathBuf, CaptureError> {
        let dir = &self.paths.saved_dir;

        fs::create_dir_all(dir).map_err(|source| CaptureError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let stem = now.format(TIMESTAMP_FORMAT).to_string();
        let mut path = dir.join(format!("{}.png", stem));
        let mut suffix = 1;

        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    return match file.write_all(png) {
                        Ok(()) => Ok(path),
                        Err(source) => {
                            drop(file);
                            remove_partial(&path);
                            Err(CaptureError::Write { path, source })
                        }
                    };
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    path = dir.join(format!("{}-{}.png", stem, suffix));
                    suffix += 1;
                }
                Err(source) => return Err(CaptureError::Write { path, source }),
            }
        }
    }

    /// Starts over: forgets the current capture and resets the counter.
    /// The default file is removed if it is the current capture; kept files
    /// stay on disk.
    pub fn reset(&mut self) {
        if let Some(record) = self.current.take() {
            if record.path == self.paths.default_file {
                if let Err(e) = fs::remove_file(&record.path) {
                    if e.kind() != io::ErrorKind::NotFound {
                        tracing::warn!(error = %e, "cannot remove default screenshot");
                    }
                }
            }
        }

        self.count = 0;
    }

    /// Removes the default screenshot file, if any. Called on exit.
    pub fn cleanup(&mut self) -> io::Result<()> {
        match fs::remove_file(&self.paths.default_file) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

// a half-written file must not look like a capture
fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "cannot remove partial screenshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[derive(Default)]
    struct FakeGrabber {
        fail: bool,
        // pixel buffer too short for the dimensions, so encoding fails
        short_buffer: bool,
        grabs: usize,
    }

    impl ScreenGrabber for FakeGrabber {
        fn grab(&mut self) -> Result<Image, GrabError> {
            self.grabs += 1;

            if self.fail {
                return Err(GrabError::EmptyScreen);
            }

            let data = if self.short_buffer {
                vec![0; 2]
            } else {
                vec![255, 0, 0, 0, 0, 255]
            };

            Ok(Image {
                dimensions: (2, 1),
                data,
            })
        }
    }

    #[derive(Default)]
    struct FakeSurface {
        stuck: bool,
        hidden: bool,
        calls: Vec<&'static str>,
        presented: usize,
    }

    impl Surface for FakeSurface {
        fn hide(&mut self) {
            self.calls.push("hide");
            self.hidden = !self.stuck;
        }

        fn wait_hidden(&mut self, _timeout: Duration) -> bool {
            self.calls.push("wait");
            self.hidden
        }

        fn present(&mut self, _image: &Image) {
            self.calls.push("present");
            self.presented += 1;
        }

        fn show(&mut self) {
            self.calls.push("show");
            self.hidden = false;
        }
    }

    fn controller(app_dir: &Path, keep_images: bool) -> CaptureController<FakeGrabber> {
        CaptureController::new(
            FakeGrabber::default(),
            CapturePaths::new(app_dir),
            keep_images,
        )
    }

    #[test]
    fn default_capture_overwrites_fixed_path() {
        let dir = tempdir().unwrap();
        let mut controller = controller(dir.path(), false);
        let mut surface = FakeSurface::default();

        let first = controller.capture_now(&mut surface).unwrap();
        let second = controller.capture_now(&mut surface).unwrap();

        assert_eq!(first.path, dir.path().join("screenshot.png"));
        assert_eq!(second.path, first.path);
        assert_eq!(second.sequence, 2);
        assert!(second.path.exists());
        assert!(!dir.path().join("Saved").exists());
    }

    #[test]
    fn kept_captures_get_distinct_files() {
        let dir = tempdir().unwrap();
        let mut controller = controller(dir.path(), true);
        let mut surface = FakeSurface::default();

        let records: Vec<_> = (0..3)
            .map(|_| controller.capture_now(&mut surface).unwrap())
            .collect();

        assert_ne!(records[0].path, records[1].path);
        assert_ne!(records[1].path, records[2].path);
        assert_ne!(records[0].path, records[2].path);

        for record in &records {
            assert!(record.path.starts_with(dir.path().join("Saved")));
            assert!(record.path.exists());
        }
    }

    #[test]
    fn kept_file_is_never_overwritten() {
        let dir = tempdir().unwrap();
        let controller = controller(dir.path(), true);
        let now = Local.with_ymd_and_hms(2022, 7, 9, 12, 30, 5).unwrap();

        let first = controller.store(b"earlier capture", now).unwrap();
        let second = controller.store(b"second", now).unwrap();
        let third = controller.store(b"third", now).unwrap();

        let saved = dir.path().join("Saved");
        assert_eq!(first, saved.join("2022-07-09_12-30-05.png"));
        assert_eq!(second, saved.join("2022-07-09_12-30-05-1.png"));
        assert_eq!(third, saved.join("2022-07-09_12-30-05-2.png"));
        assert_eq!(fs::read(&first).unwrap(), b"earlier capture");
        assert_eq!(fs::read(&third).unwrap(), b"third");
    }

    #[test]
    fn unwritable_destination_changes_nothing() {
        let dir = tempdir().unwrap();
        // a regular file where the application directory should be
        let app_dir = dir.path().join("not-a-dir");
        fs::write(&app_dir, b"").unwrap();

        let mut controller = controller(&app_dir, false);
        let mut surface = FakeSurface::default();

        match controller.capture_now(&mut surface) {
            Err(CaptureError::Write { .. }) => (),
            other => panic!("expected a write error, got {:?}", other),
        }

        assert_eq!(controller.count(), 0);
        assert_eq!(controller.current(), None);
        assert_eq!(surface.presented, 0);
        assert_eq!(surface.calls.last(), Some(&"show"));
    }

    #[test]
    fn hide_timeout_skips_the_grab() {
        let dir = tempdir().unwrap();
        let mut controller = controller(dir.path(), false);
        controller.hide_timeout = Duration::from_millis(10);
        let mut surface = FakeSurface {
            stuck: true,
            ..FakeSurface::default()
        };

        match controller.capture_now(&mut surface) {
            Err(CaptureError::HideTimeout { waited }) => {
                assert_eq!(waited, Duration::from_millis(10))
            }
            other => panic!("expected a timeout, got {:?}", other),
        }

        assert_eq!(controller.grabber.grabs, 0);
        assert_eq!(surface.calls, vec!["hide", "wait", "show"]);
        assert_eq!(controller.count(), 0);
    }

    #[test]
    fn grab_failure_is_reported() {
        let dir = tempdir().unwrap();
        let mut controller = CaptureController::new(
            FakeGrabber {
                fail: true,
                ..FakeGrabber::default()
            },
            CapturePaths::new(dir.path()),
            false,
        );
        let mut surface = FakeSurface::default();

        assert!(matches!(
            controller.capture_now(&mut surface),
            Err(CaptureError::Grab { .. })
        ));
        assert_eq!(controller.count(), 0);
        assert!(!dir.path().join("screenshot.png").exists());
    }

    #[test]
    fn surface_sees_hide_wait_present_show() {
        let dir = tempdir().unwrap();
        let mut controller = controller(dir.path(), false);
        let mut surface = FakeSurface::default();

        controller.capture_now(&mut surface).unwrap();

        assert_eq!(surface.calls, vec!["hide", "wait", "present", "show"]);
    }

    #[test]
    fn failed_encode_keeps_previous_capture() {
        let dir = tempdir().unwrap();
        let mut controller = controller(dir.path(), false);
        let mut surface = FakeSurface::default();

        let first = controller.capture_now(&mut surface).unwrap();
        let before = fs::read(&first.path).unwrap();

        controller.grabber.short_buffer = true;

        match controller.capture_now(&mut surface) {
            Err(CaptureError::Encode { .. }) => (),
            other => panic!("expected an encode error, got {:?}", other),
        }

        assert_eq!(fs::read(&first.path).unwrap(), before);
        assert_eq!(controller.current(), Some(&first));
        assert_eq!(controller.count(), 1);
        assert_eq!(surface.presented, 1);
    }

    #[test]
    fn failed_write_keeps_previous_capture() {
        let dir = tempdir().unwrap();
        let mut controller = controller(dir.path(), false);
        let mut surface = FakeSurface::default();

        let first = controller.capture_now(&mut surface).unwrap();
        let before = fs::read(&first.path).unwrap();

        // the staging file cannot be created over a directory
        let staging = dir.path().join("screenshot.png.tmp");
        fs::create_dir(&staging).unwrap();

        match controller.capture_now(&mut surface) {
            Err(CaptureError::Write { .. }) => (),
            other => panic!("expected a write error, got {:?}", other),
        }

        assert_eq!(fs::read(&first.path).unwrap(), before);
        assert_eq!(controller.count(), 1);
        assert!(staging.is_dir());
    }

    #[test]
    fn failed_kept_encode_leaves_no_file() {
        let dir = tempdir().unwrap();
        let mut controller = controller(dir.path(), true);
        let mut surface = FakeSurface::default();
        controller.grabber.short_buffer = true;

        assert!(controller.capture_now(&mut surface).is_err());
        assert!(!dir.path().join("Saved").exists());
    }

    #[test]
    fn reset_removes_default_file_only() {
        let dir = tempdir().unwrap();
        let mut controller = controller(dir.path(), false);
        let mut surface = FakeSurface::default();

        let default = controller.capture_now(&mut surface).unwrap();
        controller.reset();

        assert!(!default.path.exists());
        assert_eq!(controller.count(), 0);
        assert_eq!(controller.current(), None);

        controller.set_keep_images(true);
        let kept = controller.capture_now(&mut surface).unwrap();
        controller.reset();

        assert!(kept.path.exists());
        assert_eq!(kept.sequence, 1);
    }

    #[test]
    fn keep_images_can_change_between_captures() {
        let dir = tempdir().unwrap();
        let mut controller = controller(dir.path(), false);
        let mut surface = FakeSurface::default();

        let default = controller.capture_now(&mut surface).unwrap();
        controller.set_keep_images(true);
        let kept = controller.capture_now(&mut surface).unwrap();

        assert_eq!(default.path, dir.path().join("screenshot.png"));
        assert!(kept.path.starts_with(dir.path().join("Saved")));
        assert!(default.path.exists());
        assert_eq!(kept.sequence, 2);
        assert_eq!(controller.count(), 2);
    }

    #[test]
    fn cleanup_removes_default_file() {
        let dir = tempdir().unwrap();
        let mut controller = controller(dir.path(), false);
        let mut surface = FakeSurface::default();

        let record = controller.capture_now(&mut surface).unwrap();
        controller.cleanup().unwrap();

        assert!(!record.path.exists());
        // nothing left to remove is fine too
        controller.cleanup().unwrap();
    }
}
