#[cfg(windows)]
#[path = "windows.rs"]
mod os;

/// Tells the user something went wrong. Always logged as well.
pub fn error(title: &str, msg: &str) {
    tracing::error!(title, "{}", msg);

    #[cfg(windows)]
    os::error(title, msg);
}
