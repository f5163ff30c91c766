use std::{
    ffi::OsStr, iter::once, os::windows::ffi::OsStrExt, path::Path, ptr::null_mut, thread,
    time::Duration,
};
use winapi::{
    shared::{windef::HWND, winerror::S_OK},
    um::{
        dwmapi::DwmFlush,
        shellapi::ShellExecuteW,
        shellscalingapi::{SetProcessDpiAwareness, PROCESS_PER_MONITOR_DPI_AWARE},
        winuser::{IsWindowVisible, SW_SHOWNORMAL},
    },
};

// GDI reports physical pixels only once the process is DPI aware
pub fn enable_dpi_awareness() {
    if unsafe { SetProcessDpiAwareness(PROCESS_PER_MONITOR_DPI_AWARE) } != S_OK {
        tracing::debug!("process DPI awareness was already set");
    }
}

pub fn is_visible(wnd: HWND) -> bool {
    unsafe { IsWindowVisible(wnd) != 0 }
}

/// Blocks until the compositor presented its next frame.
pub fn wait_for_compositor() {
    if unsafe { DwmFlush() } != S_OK {
        // composition is off, approximate a frame
        thread::sleep(Duration::from_millis(16));
    }
}

/// Opens `path` with the application associated with its type.
pub fn open_with_shell(path: &Path) -> bool {
    let verb: Vec<u16> = OsStr::new("open").encode_wide().chain(once(0)).collect();
    let file: Vec<u16> = path.as_os_str().encode_wide().chain(once(0)).collect();

    let result = unsafe {
        ShellExecuteW(
            null_mut(),
            verb.as_ptr(),
            file.as_ptr(),
            null_mut(),
            null_mut(),
            SW_SHOWNORMAL,
        )
    };

    // values above 32 mean success
    result as usize > 32
}
