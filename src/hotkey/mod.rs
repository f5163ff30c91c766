//! Global hotkey binding.
//!
//! [`HotkeyListener`] keeps track of the single active binding and talks to
//! the OS through a [`HotkeyBackend`]. Failing to register (usually because
//! another program already owns the combination) is not an error: the
//! listener simply ends up with no binding.

#[cfg(windows)]
#[path = "windows.rs"]
mod os;

#[cfg(windows)]
pub use os::MessageWindow;

use crate::{
    keys::{self, Modifiers},
    settings::Settings,
};

// only one binding is ever live, so a fixed id is enough
const HOTKEY_ID: i32 = 1;

pub trait HotkeyBackend {
    fn register(&mut self, id: i32, modifiers: u32, key_code: u32) -> bool;
    fn unregister(&mut self, id: i32) -> bool;

    /// Removes the queued presses of hotkey `id` and returns how many there were.
    fn take_presses(&mut self, id: i32) -> usize;
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Binding {
    pub modifiers: Modifiers,
    pub key_code: u32,
}

pub struct HotkeyListener<B: HotkeyBackend> {
    backend: B,
    active: Option<Binding>,
}

impl<B: HotkeyBackend> HotkeyListener<B> {
    pub fn new(backend: B) -> Self {
        HotkeyListener {
            backend,
            active: None,
        }
    }

    /// Replaces the current binding. Returns `false` if the OS refused it,
    /// in which case no binding is left active.
    pub fn register(&mut self, modifiers: Modifiers, key_code: u32) -> bool {
        self.unregister();

        if self
            .backend
            .register(HOTKEY_ID, modifiers.bits(), key_code)
        {
            tracing::info!(?modifiers, key_code, "hotkey registered");
            self.active = Some(Binding {
                modifiers,
                key_code,
            });

            true
        } else {
            tracing::warn!(
                ?modifiers,
                key_code,
                "hotkey could not be registered, continuing without one"
            );

            false
        }
    }

    /// Releases the current binding. Returns `true` if one was released.
    pub fn unregister(&mut self) -> bool {
        match self.active.take() {
            Some(binding) => {
                let released = self.backend.unregister(HOTKEY_ID);

                if !released {
                    tracing::warn!(?binding, "hotkey could not be unregistered");
                }

                released
            }
            None => false,
        }
    }

    /// Binds the combination described by `settings`.
    pub fn bind(&mut self, settings: &Settings) -> bool {
        match keys::key_code(&settings.hotkey) {
            Some(key_code) => self.register(settings.modifiers(), key_code),
            None => {
                tracing::info!(key = %settings.hotkey, "no usable hotkey configured");
                self.unregister();

                false
            }
        }
    }

    pub fn active(&self) -> Option<Binding> {
        self.active
    }

    /// Number of presses since the last poll. Never blocks.
    pub fn poll(&mut self) -> usize {
        if self.active.is_none() {
            return 0;
        }

        self.backend.take_presses(HOTKEY_ID)
    }
}

impl<B: HotkeyBackend> Drop for HotkeyListener<B> {
    fn drop(&mut self) {
        self.unregister();
    }
}
