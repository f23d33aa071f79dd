pub mod history;
pub mod model;
pub mod renderer;

pub use history::{HistoryStatus, StrokeHistory};
pub use model::{Color, Stroke};
