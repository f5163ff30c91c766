use super::{GrabError, Image, Rectangle, ScreenGrabber};

use std::{
    mem::{size_of, zeroed},
    ptr::null_mut,
};
use winapi::{
    ctypes::c_void,
    shared::windef::{HBITMAP, HDC},
    um::{
        wingdi::{
            BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDIBits,
            SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, CAPTUREBLT, DIB_RGB_COLORS,
            SRCCOPY,
        },
        winuser::{
            GetDC, GetSystemMetrics, ReleaseDC, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN,
            SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN,
        },
    },
};

/// Grabs the bounding box of every monitor at once.
#[derive(Debug, Default)]
pub struct VirtualScreen;

impl ScreenGrabber for VirtualScreen {
    fn grab(&mut self) -> Result<Image, GrabError> {
        let bounds = virtual_screen_bounds();

        if bounds.is_empty() {
            return Err(GrabError::EmptyScreen);
        }

        let bgra = capture(bounds)?;

        tracing::debug!(?bounds, "virtual screen captured");

        Ok(Image {
            dimensions: (bounds.w, bounds.h),
            data: bgra_to_rgb(&bgra),
        })
    }
}

// get the combined size of all the monitors
fn virtual_screen_bounds() -> Rectangle {
    let (x, y, w, h) = unsafe {
        (
            GetSystemMetrics(SM_XVIRTUALSCREEN),
            GetSystemMetrics(SM_YVIRTUALSCREEN),
            GetSystemMetrics(SM_CXVIRTUALSCREEN),
            GetSystemMetrics(SM_CYVIRTUALSCREEN),
        )
    };

    Rectangle {
        x,
        y,
        w: w.max(0) as u32,
        h: h.max(0) as u32,
    }
}

// copies the screen pixels into a top-down 32bpp buffer
fn capture(bounds: Rectangle) -> Result<Vec<u8>, GrabError> {
    let (w, h) = (bounds.w as i32, bounds.h as i32);

    let screen = ScreenDc::get()?;
    let dc = MemoryDc::compatible_with(&screen)?;
    let bitmap = Bitmap::compatible_with(&screen, w, h)?;

    let mut bi: BITMAPINFO = unsafe { zeroed() };
    bi.bmiHeader = BITMAPINFOHEADER {
        biSize: size_of::<BITMAPINFOHEADER>() as u32,
        biWidth: w,
        // negative height asks for top-down rows
        biHeight: -h,
        biPlanes: 1,
        biBitCount: 32,
        biCompression: BI_RGB,
        biSizeImage: 0,
        biXPelsPerMeter: 0,
        biYPelsPerMeter: 0,
        biClrUsed: 0,
        biClrImportant: 0,
    };

    let mut data = vec![0u8; bounds.w as usize * bounds.h as usize * 4];

    unsafe {
        let old_obj = SelectObject(dc.0, bitmap.0 as *mut c_void);
        let blitted = BitBlt(
            dc.0,
            0,
            0,
            w,
            h,
            screen.0,
            bounds.x,
            bounds.y,
            SRCCOPY | CAPTUREBLT,
        );
        SelectObject(dc.0, old_obj);

        if blitted == 0 {
            return Err(GrabError::Gdi { call: "BitBlt" });
        }

        // the bitmap must not be selected into a DC here
        let lines = GetDIBits(
            dc.0,
            bitmap.0,
            0,
            h as u32,
            data.as_mut_ptr() as *mut c_void,
            &mut bi,
            DIB_RGB_COLORS,
        );

        if lines == 0 {
            return Err(GrabError::Gdi { call: "GetDIBits" });
        }
    }

    Ok(data)
}

fn bgra_to_rgb(bgra: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(bgra.len() / 4 * 3);

    for pixel in bgra.chunks_exact(4) {
        rgb.extend_from_slice(&[pixel[2], pixel[1], pixel[0]]);
    }

    rgb
}

#[derive(Debug)]
struct ScreenDc(HDC);

impl ScreenDc {
    fn get() -> Result<ScreenDc, GrabError> {
        let hdc = unsafe { GetDC(null_mut()) };

        if hdc.is_null() {
            Err(GrabError::Gdi { call: "GetDC" })
        } else {
            Ok(ScreenDc(hdc))
        }
    }
}

impl Drop for ScreenDc {
    fn drop(&mut self) {
        unsafe {
            ReleaseDC(null_mut(), self.0);
        }
    }
}

#[derive(Debug)]
struct MemoryDc(HDC);

impl MemoryDc {
    fn compatible_with(screen: &ScreenDc) -> Result<MemoryDc, GrabError> {
        let hdc = unsafe { CreateCompatibleDC(screen.0) };

        if hdc.is_null() {
            Err(GrabError::Gdi {
                call: "CreateCompatibleDC",
            })
        } else {
            Ok(MemoryDc(hdc))
        }
    }
}

impl Drop for MemoryDc {
    fn drop(&mut self) {
        unsafe {
            DeleteDC(self.0);
        }
    }
}

#[derive(Debug)]
struct Bitmap(HBITMAP);

impl Bitmap {
    fn compatible_with(screen: &ScreenDc, w: i32, h: i32) -> Result<Bitmap, GrabError> {
        let bitmap = unsafe { CreateCompatibleBitmap(screen.0, w, h) };

        if bitmap.is_null() {
            Err(GrabError::Gdi {
                call: "CreateCompatibleBitmap",
            })
        } else {
            Ok(Bitmap(bitmap))
        }
    }
}

impl Drop for Bitmap {
    fn drop(&mut self) {
        unsafe {
            DeleteObject(self.0 as *mut c_void);
        }
    }
}
