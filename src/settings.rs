//! Persisted user options.
//!
//! The settings live in a JSON file next to the executable. They are read
//! once at startup and written back on exit. A missing file is created with
//! the defaults, and fields missing from an existing file keep their default.
//! In between, the viewer's shortcuts change them through [`OptionChange`].

use crate::keys::{self, Modifiers};
use custom_error::custom_error;
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};

pub const SETTINGS_FILE: &str = "ScreenDrop-settings.json";

custom_error! { pub SettingsError
    Io{source: io::Error} = "cannot access settings file: {source}",
    Format{source: serde_json::Error} = "malformed settings file: {source}",
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub top_most: bool,
    pub keep_images: bool,
    pub start_at_logon: bool,
    pub control: bool,
    pub alt: bool,
    pub shift: bool,
    pub hotkey: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            top_most: true,
            keep_images: false,
            start_at_logon: false,
            control: false,
            alt: true,
            shift: true,
            hotkey: "S".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionChange {
    ToggleTopMost,
    ToggleKeepImages,
    Hotkey { modifiers: Modifiers, key: String },
}

impl OptionChange {
    /// A new hotkey combination. Needs at least one modifier and a key name
    /// that resolves to a key code.
    pub fn hotkey(modifiers: Modifiers, key: &str) -> Option<OptionChange> {
        if modifiers.bits() == 0 || keys::key_code(key).is_none() {
            return None;
        }

        Some(OptionChange::Hotkey {
            modifiers,
            key: key.to_string(),
        })
    }
}

impl Settings {
    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            control: self.control,
            alt: self.alt,
            shift: self.shift,
        }
    }

    pub fn apply(&mut self, change: &OptionChange) {
        match change {
            OptionChange::ToggleTopMost => self.top_most = !self.top_most,
            OptionChange::ToggleKeepImages => self.keep_images = !self.keep_images,
            OptionChange::Hotkey { modifiers, key } => {
                self.control = modifiers.control;
                self.alt = modifiers.alt;
                self.shift = modifiers.shift;
                self.hotkey = key.clone();
            }
        }

        tracing::debug!(?change, "option changed");
    }
}

/// Loads the settings at `path`, writing a default file first if none exists.
pub fn load(path: &Path) -> Result<Settings, SettingsError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "creating default settings file");
        save(path, &Settings::default())?;
    }

    let contents = fs::read_to_string(path)?;
    let settings = serde_json::from_str(&contents)?;

    tracing::debug!(path = %path.display(), ?settings, "settings loaded");

    Ok(settings)
}

/// Writes `settings` to a sibling file first and renames it over `path`, so
/// a failed save leaves the previous file intact.
pub fn save(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    let json = serde_json::to_string_pretty(settings)?;
    let staging = path.with_extension("json.tmp");

    if let Err(e) = fs::write(&staging, json).and_then(|_| fs::rename(&staging, path)) {
        if let Err(cleanup) = fs::remove_file(&staging) {
            if cleanup.kind() != io::ErrorKind::NotFound {
                tracing::warn!(error = %cleanup, "cannot remove staged settings file");
            }
        }

        return Err(e.into());
    }

    tracing::debug!(path = %path.display(), "settings saved");

    Ok(())
}
