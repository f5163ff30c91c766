use super::HotkeyBackend;

use std::{ffi::OsStr, iter::once, mem::zeroed, os::windows::ffi::OsStrExt, ptr::null_mut};
use winapi::{
    shared::windef::HWND,
    um::{
        libloaderapi::GetModuleHandleW,
        winuser::{
            CreateWindowExW, DestroyWindow, PeekMessageW, RegisterHotKey, UnregisterHotKey,
            HWND_MESSAGE, MSG, PM_REMOVE, WM_HOTKEY,
        },
    },
};

/// Hidden message-only window that receives `WM_HOTKEY`.
///
/// If the window cannot be created, hotkeys are bound to the thread message
/// queue instead.
#[derive(Debug)]
pub struct MessageWindow {
    hwnd: HWND,
}

impl MessageWindow {
    pub fn new() -> MessageWindow {
        let class: Vec<u16> = OsStr::new("STATIC").encode_wide().chain(once(0)).collect();
        let title: Vec<u16> = OsStr::new("ScreenDrop hotkey")
            .encode_wide()
            .chain(once(0))
            .collect();

        let hwnd = unsafe {
            CreateWindowExW(
                0,
                class.as_ptr(),
                title.as_ptr(),
                0,
                0,
                0,
                0,
                0,
                HWND_MESSAGE,
                null_mut(),
                GetModuleHandleW(null_mut()),
                null_mut(),
            )
        };

        if hwnd.is_null() {
            tracing::warn!("cannot create hotkey window, using the thread queue");
        }

        MessageWindow { hwnd }
    }

    // PeekMessageW treats -1 as "thread messages only"
    fn filter(&self) -> HWND {
        if self.hwnd.is_null() {
            -1isize as HWND
        } else {
            self.hwnd
        }
    }
}

impl HotkeyBackend for MessageWindow {
    fn register(&mut self, id: i32, modifiers: u32, key_code: u32) -> bool {
        unsafe { RegisterHotKey(self.hwnd, id, modifiers, key_code) != 0 }
    }

    fn unregister(&mut self, id: i32) -> bool {
        unsafe { UnregisterHotKey(self.hwnd, id) != 0 }
    }

    fn take_presses(&mut self, id: i32) -> usize {
        let mut msg: MSG = unsafe { zeroed() };
        let mut presses = 0;

        while unsafe { PeekMessageW(&mut msg, self.filter(), WM_HOTKEY, WM_HOTKEY, PM_REMOVE) } != 0
        {
            if msg.wParam as i32 == id {
                presses += 1;
            }
        }

        presses
    }
}

impl Drop for MessageWindow {
    fn drop(&mut self) {
        if !self.hwnd.is_null() {
            unsafe {
                DestroyWindow(self.hwnd);
            }
        }
    }
}
