//! cropnote: capture the screen, pick a region, scribble on it, copy it.
//!
//! The engine is platform independent:
//! - selection geometry and the selection state machine (geometry, selection)
//! - stroke history with undo/redo (annotation)
//! - cropping and compositing (compositor)
//! - size-budgeted PNG export to a clipboard sink (export)
//! - the session facade that ties them together (session)
//!
//! The status-bar app, global hotkey and overlay window are macOS only.

pub mod annotation;
pub mod capture;
pub mod compositor;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod keymap;
pub mod scheduler;
pub mod selection;
pub mod session;

#[cfg(target_os = "macos")]
mod app;
#[cfg(target_os = "macos")]
mod hotkey;
#[cfg(target_os = "macos")]
mod overlay;
#[cfg(target_os = "macos")]
mod statusbar;

use std::process::ExitCode;

pub use config::Settings;
pub use error::{Error, Result, SessionError};
pub use session::{CaptureSession, Notification, Phase};

/// Entry point for the binary.
pub fn run() -> ExitCode {
    env_logger::init();
    let settings = Settings::from_env();
    log::debug!("Settings: {:?}", settings);

    #[cfg(target_os = "macos")]
    {
        app::run(settings)
    }

    #[cfg(not(target_os = "macos"))]
    {
        let _ = settings;
        log::error!("cropnote's capture front-end is only available on macOS");
        ExitCode::FAILURE
    }
}
