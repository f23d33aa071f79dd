pub mod view;
pub mod window;

pub use window::OverlayWindow;
