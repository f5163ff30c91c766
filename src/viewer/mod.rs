//! Window showing the latest capture.

#[cfg(windows)]
#[path = "windows.rs"]
mod os;

#[cfg(windows)]
pub use os::{Viewer, ViewerError};

use crate::{keys::Modifiers, settings::OptionChange};
use easer::functions::{Cubic, Easing};
use std::time::Duration;

const FADE_IN: Duration = Duration::from_millis(250);

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ViewerEvent {
    CloseRequested,
    /// Forget the current capture and start counting again.
    NewRequested,
    /// Open the current capture with its default application.
    OpenRequested,
    /// `K`, `T`, or a modifier held with a key to pick a new hotkey.
    Options(OptionChange),
}

/// Maps a key press in the viewer to what it asks for. With a modifier held
/// the press picks a new hotkey instead.
pub fn shortcut(key: &str, modifiers: Modifiers) -> Option<ViewerEvent> {
    if modifiers.bits() != 0 {
        return OptionChange::hotkey(modifiers, key).map(ViewerEvent::Options);
    }

    match key {
        "N" => Some(ViewerEvent::NewRequested),
        "Enter" => Some(ViewerEvent::OpenRequested),
        "K" => Some(ViewerEvent::Options(OptionChange::ToggleKeepImages)),
        "T" => Some(ViewerEvent::Options(OptionChange::ToggleTopMost)),
        _ => None,
    }
}

/// Title bar status: captures so far, the bound hotkey, where captures go.
pub fn status_line(count: u32, hotkey: Option<&str>, keep_images: bool) -> String {
    format!(
        "{} taken - {} - {}",
        count,
        hotkey.unwrap_or("no hotkey"),
        if keep_images {
            "keeping images"
        } else {
            "overwriting"
        }
    )
}

/// Quad covering the largest area of the frame with the image's aspect
/// ratio, centered. Returned as `[x, y, w, h]` in normalized device
/// coordinates.
pub fn fit_rect(image: (u32, u32), frame: (u32, u32)) -> [f32; 4] {
    let (iw, ih) = (image.0.max(1) as f32, image.1.max(1) as f32);
    let (fw, fh) = (frame.0.max(1) as f32, frame.1.max(1) as f32);

    let scale = (fw / iw).min(fh / ih);
    let w = iw * scale / fw * 2.0;
    let h = ih * scale / fh * 2.0;

    [-w / 2.0, -h / 2.0, w, h]
}

/// Opacity of a capture `elapsed` after it was presented.
pub fn fade_opacity(elapsed: Duration) -> f32 {
    let d = FADE_IN.as_secs_f32();
    let t = elapsed.as_secs_f32().min(d);

    Cubic::ease_out(t, 0.0, 1.0, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: [f32; 4], b: [f32; 4]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn same_aspect_fills_frame() {
        assert!(approx(
            fit_rect((1920, 1080), (640, 360)),
            [-1.0, -1.0, 2.0, 2.0]
        ));
    }

    #[test]
    fn wide_image_is_letterboxed() {
        // 4:1 image in a square frame uses a quarter of the height
        assert!(approx(
            fit_rect((400, 100), (200, 200)),
            [-1.0, -0.25, 2.0, 0.5]
        ));
    }

    #[test]
    fn tall_image_is_pillarboxed() {
        assert!(approx(
            fit_rect((100, 200), (400, 200)),
            [-0.25, -1.0, 0.5, 2.0]
        ));
    }

    #[test]
    fn plain_keys() {
        let none = Modifiers::default();

        assert_eq!(shortcut("N", none), Some(ViewerEvent::NewRequested));
        assert_eq!(shortcut("Enter", none), Some(ViewerEvent::OpenRequested));
        assert_eq!(
            shortcut("K", none),
            Some(ViewerEvent::Options(OptionChange::ToggleKeepImages))
        );
        assert_eq!(
            shortcut("T", none),
            Some(ViewerEvent::Options(OptionChange::ToggleTopMost))
        );
        assert_eq!(shortcut("Q", none), None);
    }

    #[test]
    fn modified_keys_rebind() {
        let ctrl_alt = Modifiers {
            control: true,
            alt: true,
            shift: false,
        };

        assert_eq!(
            shortcut("F9", ctrl_alt),
            Some(ViewerEvent::Options(OptionChange::Hotkey {
                modifiers: ctrl_alt,
                key: "F9".to_string(),
            }))
        );
        // K with a modifier is a hotkey, not the keep-images toggle
        assert!(matches!(
            shortcut("K", ctrl_alt),
            Some(ViewerEvent::Options(OptionChange::Hotkey { .. }))
        ));
    }

    #[test]
    fn status_mentions_everything() {
        assert_eq!(
            status_line(3, Some("Alt+Shift+S"), true),
            "3 taken - Alt+Shift+S - keeping images"
        );
        assert_eq!(status_line(0, None, false), "0 taken - no hotkey - overwriting");
    }

    #[test]
    fn fade_goes_from_transparent_to_opaque() {
        assert!(fade_opacity(Duration::from_millis(0)).abs() < 1e-5);
        assert!(fade_opacity(Duration::from_millis(100)) > 0.0);
        assert!(fade_opacity(Duration::from_millis(100)) < 1.0);
        assert!((fade_opacity(Duration::from_secs(5)) - 1.0).abs() < 1e-5);
    }
}
