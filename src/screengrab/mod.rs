#[cfg(windows)]
#[path = "windows.rs"]
mod os;

#[cfg(windows)]
pub use os::VirtualScreen;

use custom_error::custom_error;
use std::io::{self, Write};

custom_error! { pub GrabError
    EmptyScreen = "the virtual screen has no area",
    Gdi{call: &'static str} = "{call} failed",
}

custom_error! { pub EncodeError
    Io{source: io::Error} = "{source}",
    Png{source: png::EncodingError} = "cannot encode png: {source}",
}

pub trait ScreenGrabber {
    fn grab(&mut self) -> Result<Image, GrabError>;
}

// tightly packed RGB8, top row first
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub dimensions: (u32, u32),
    pub data: Vec<u8>,
}

impl Image {
    pub fn encode_png<W: Write>(&self, mut out: W) -> Result<(), EncodeError> {
        let (w, h) = self.dimensions;

        {
            let mut encoder = png::Encoder::new(&mut out, w, h);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);

            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.data)?;
            writer.finish()?;
        }

        out.flush()?;

        Ok(())
    }
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rectangle {
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_png() {
        let image = Image {
            dimensions: (2, 2),
            data: vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255],
        };

        let mut out = Vec::new();
        image.encode_png(&mut out).unwrap();

        assert!(out.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]));
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let image = Image {
            dimensions: (4, 4),
            data: vec![0; 3],
        };

        assert!(image.encode_png(Vec::new()).is_err());
    }

    #[test]
    fn empty_rectangle() {
        let rect = Rectangle {
            x: -1920,
            y: 0,
            w: 0,
            h: 1080,
        };

        assert!(rect.is_empty());
        assert!(!Rectangle { w: 1, ..rect }.is_empty());
    }
}
