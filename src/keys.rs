//! Key names and modifier masks for the global hotkey.
//!
//! Names follow the ones shown in the options (`S`, `F12`, `PrintScreen`,
//! ...) and resolve to Win32 virtual-key codes.

pub const MOD_ALT: u32 = 0x0001;
pub const MOD_CONTROL: u32 = 0x0002;
pub const MOD_SHIFT: u32 = 0x0004;

#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub struct Modifiers {
    pub control: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    // the fsModifiers argument of RegisterHotKey
    pub fn bits(self) -> u32 {
        let mut bits = 0;

        if self.control {
            bits |= MOD_CONTROL;
        }

        if self.alt {
            bits |= MOD_ALT;
        }

        if self.shift {
            bits |= MOD_SHIFT;
        }

        bits
    }
}

/// Human readable combination, e.g. `Alt+Shift+S`.
pub fn label(modifiers: Modifiers, key: &str) -> String {
    let mut parts = Vec::new();

    if modifiers.control {
        parts.push("Ctrl");
    }

    if modifiers.alt {
        parts.push("Alt");
    }

    if modifiers.shift {
        parts.push("Shift");
    }

    parts.push(key);
    parts.join("+")
}

/// Resolves a key name to its virtual-key code.
///
/// Matching is case insensitive. `None` means "no hotkey" and, like any
/// unknown name, yields `None`.
pub fn key_code(name: &str) -> Option<u32> {
    let name = name.trim().to_ascii_uppercase();

    let code = match name.as_str() {
        "" | "NONE" => return None,
        "BACK" | "BACKSPACE" => 0x08,
        "TAB" => 0x09,
        "ENTER" | "RETURN" => 0x0D,
        "PAUSE" => 0x13,
        "ESCAPE" | "ESC" => 0x1B,
        "SPACE" => 0x20,
        "PAGEUP" | "PRIOR" => 0x21,
        "PAGEDOWN" | "NEXT" => 0x22,
        "END" => 0x23,
        "HOME" => 0x24,
        "LEFT" => 0x25,
        "UP" => 0x26,
        "RIGHT" => 0x27,
        "DOWN" => 0x28,
        "PRINTSCREEN" | "SNAPSHOT" => 0x2C,
        "INSERT" => 0x2D,
        "DELETE" => 0x2E,
        other => return indexed_key(other),
    };

    Some(code)
}

// letters, digits, function and numpad keys
fn indexed_key(name: &str) -> Option<u32> {
    let bytes = name.as_bytes();

    match bytes {
        [c] if c.is_ascii_uppercase() || c.is_ascii_digit() => Some(u32::from(*c)),
        [b'D', d] if d.is_ascii_digit() => Some(u32::from(*d)),
        _ => {
            if let Some(n) = name.strip_prefix("NUMPAD") {
                let n: u32 = n.parse().ok()?;
                if n <= 9 {
                    return Some(0x60 + n);
                }
            } else if let Some(n) = name.strip_prefix('F') {
                let n: u32 = n.parse().ok()?;
                if (1..=24).contains(&n) {
                    return Some(0x70 + n - 1);
                }
            }

            None
        }
    }
}
