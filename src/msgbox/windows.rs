use std::{ffi::OsStr, iter::once, os::windows::ffi::OsStrExt, ptr::null_mut};
use winapi::um::winuser::{MessageBoxW, MB_ICONERROR, MB_OK, MB_TOPMOST};

pub fn error(title: &str, msg: &str) {
    let title: Vec<u16> = OsStr::new(title).encode_wide().chain(once(0)).collect();
    let text: Vec<u16> = OsStr::new(msg).encode_wide().chain(once(0)).collect();

    unsafe {
        MessageBoxW(
            null_mut(),
            text.as_ptr(),
            title.as_ptr(),
            MB_OK | MB_ICONERROR | MB_TOPMOST,
        )
    };
}
