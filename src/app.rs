use crate::{
    capture::{CaptureController, CapturePaths},
    focuser,
    hotkey::{HotkeyBackend, HotkeyListener, MessageWindow},
    keys, msgbox,
    screengrab::{ScreenGrabber, VirtualScreen},
    settings::{self, OptionChange, Settings, SETTINGS_FILE},
    viewer::{status_line, Viewer, ViewerError, ViewerEvent},
};
use custom_error::custom_error;
use std::{env, path::PathBuf};

custom_error! { pub AppError
    Viewer{source: ViewerError} = "viewer error: {source}",
}

// settings and captures live next to the executable
fn app_dir() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => match exe.parent() {
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::from("."),
        },
        Err(e) => {
            tracing::warn!(error = %e, "cannot locate executable, using working directory");
            PathBuf::from(".")
        }
    }
}

// "3 taken - Alt+Shift+S - overwriting"
fn refresh_title<G: ScreenGrabber, B: HotkeyBackend>(
    viewer: &Viewer,
    controller: &CaptureController<G>,
    listener: &HotkeyListener<B>,
    settings: &Settings,
) {
    let hotkey = listener
        .active()
        .map(|binding| keys::label(binding.modifiers, &settings.hotkey));

    viewer.set_title(&status_line(
        controller.count(),
        hotkey.as_deref(),
        settings.keep_images,
    ));
}

pub fn run() -> Result<(), AppError> {
    focuser::enable_dpi_awareness();

    let app_dir = app_dir();
    let settings_path = app_dir.join(SETTINGS_FILE);

    let mut settings = match settings::load(&settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            msgbox::error(
                "Settings error",
                &format!("Error loading settings file.\n\nMessage:\n{}", e),
            );
            Settings::default()
        }
    };

    let mut viewer = Viewer::new(settings.top_most)?;

    let mut listener = HotkeyListener::new(MessageWindow::new());
    listener.bind(&settings);

    let mut controller = CaptureController::new(
        VirtualScreen,
        CapturePaths::new(&app_dir),
        settings.keep_images,
    );

    refresh_title(&viewer, &controller, &listener, &settings);

    tracing::info!(
        dir = %app_dir.display(),
        key_code = ?listener.active().map(|binding| binding.key_code),
        "ready"
    );

    'main: loop {
        // presses queued during a capture collapse into one
        if listener.poll() > 0 {
            match controller.capture_now(&mut viewer) {
                Ok(_) => refresh_title(&viewer, &controller, &listener, &settings),
                Err(e) => msgbox::error(
                    "Error",
                    &format!("Could not take screenshot!\n\nMessage:\n{}", e),
                ),
            }
        }

        for event in viewer.pump() {
            match event {
                ViewerEvent::CloseRequested => break 'main,
                ViewerEvent::NewRequested => {
                    controller.reset();
                    viewer.clear();
                    refresh_title(&viewer, &controller, &listener, &settings);
                }
                ViewerEvent::OpenRequested => {
                    if let Some(record) = controller.current() {
                        if !focuser::open_with_shell(&record.path) {
                            tracing::warn!(path = %record.path.display(), "cannot open capture");
                        }
                    }
                }
                ViewerEvent::Options(change) => {
                    settings.apply(&change);

                    match change {
                        OptionChange::ToggleTopMost => viewer.set_always_on_top(settings.top_most),
                        OptionChange::ToggleKeepImages => {
                            controller.set_keep_images(settings.keep_images)
                        }
                        OptionChange::Hotkey { .. } => {
                            if !listener.bind(&settings) {
                                msgbox::error(
                                    "Hotkey error",
                                    &format!(
                                        "Could not register {}, it may be in use by another program.",
                                        keys::label(settings.modifiers(), &settings.hotkey)
                                    ),
                                );
                            }
                        }
                    }

                    refresh_title(&viewer, &controller, &listener, &settings);
                }
            }
        }

        viewer.render()?;
    }

    listener.unregister();

    if let Err(e) = settings::save(&settings_path, &settings) {
        msgbox::error(
            "File error",
            &format!("Error saving settings file.\n\nMessage:\n{}", e),
        );
    }

    if let Err(e) = controller.cleanup() {
        msgbox::error(
            "File error",
            &format!("Could not remove default screenshot file!\n\nMessage:\n{}", e),
        );
    }

    Ok(())
}
