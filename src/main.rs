#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

#[cfg(windows)]
mod app;
#[cfg(any(windows, test))]
mod capture;
#[cfg(windows)]
mod focuser;
#[cfg(any(windows, test))]
mod hotkey;
#[cfg(any(windows, test))]
mod keys;
mod msgbox;
#[cfg(any(windows, test))]
mod screengrab;
#[cfg(any(windows, test))]
mod settings;
#[cfg(any(windows, test))]
mod viewer;

use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("a global tracing subscriber was already set");
    }
}

#[cfg(windows)]
fn main() -> Result<(), app::AppError> {
    init_logging();

    app::run().map_err(|e| {
        msgbox::error("ScreenDrop", &e.to_string());
        e
    })
}

#[cfg(not(windows))]
fn main() {
    init_logging();
    msgbox::error("ScreenDrop", "ScreenDrop only runs on Windows");
    std::process::exit(1);
}
