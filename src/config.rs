use std::str::FromStr;
use std::time::Duration;

use crate::annotation::model::Color;

/// Tunables for selection, annotation and export.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub handle_size: f64,
    pub edge_grab_distance: f64,
    /// Smallest width/height a resize or move may leave behind.
    pub min_resize_size: f64,
    /// A fresh drag must exceed this on both axes to be kept.
    pub min_selection_size: f64,
    pub undo_capacity: usize,
    pub stroke_width: f64,
    pub stroke_color: Color,
    pub max_export_dimension: u32,
    /// 0.0 favours speed, 1.0 favours size.
    pub export_quality: f32,
    pub copied_feedback_delay: Duration,
    pub recapture_delay: Duration,
    pub restore_last_selection: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            handle_size: 10.0,
            edge_grab_distance: 8.0,
            min_resize_size: 20.0,
            min_selection_size: 10.0,
            undo_capacity: 50,
            stroke_width: 3.0,
            stroke_color: Color::RED,
            max_export_dimension: 3840,
            export_quality: 0.7,
            copied_feedback_delay: Duration::from_millis(1500),
            recapture_delay: Duration::from_millis(300),
            restore_last_selection: false,
        }
    }
}

impl Settings {
    /// Defaults overridden by `CROPNOTE_*` variables (a `.env` file is honoured).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut settings = Settings::default();
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings
    }

    /// Apply overrides from any key/value lookup. Unparseable values are
    /// skipped with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        override_with(&lookup, "CROPNOTE_HANDLE_SIZE", &mut self.handle_size);
        override_with(&lookup, "CROPNOTE_EDGE_GRAB", &mut self.edge_grab_distance);
        override_with(&lookup, "CROPNOTE_MIN_RESIZE", &mut self.min_resize_size);
        override_with(&lookup, "CROPNOTE_MIN_SELECTION", &mut self.min_selection_size);
        override_with(&lookup, "CROPNOTE_UNDO_CAPACITY", &mut self.undo_capacity);
        override_with(&lookup, "CROPNOTE_STROKE_WIDTH", &mut self.stroke_width);
        override_with(&lookup, "CROPNOTE_MAX_EXPORT_DIMENSION", &mut self.max_export_dimension);
        override_with(&lookup, "CROPNOTE_EXPORT_QUALITY", &mut self.export_quality);
        override_with(&lookup, "CROPNOTE_RESTORE_SELECTION", &mut self.restore_last_selection);

        let mut feedback_ms = self.copied_feedback_delay.as_millis() as u64;
        override_with(&lookup, "CROPNOTE_FEEDBACK_MS", &mut feedback_ms);
        self.copied_feedback_delay = Duration::from_millis(feedback_ms);

        let mut recapture_ms = self.recapture_delay.as_millis() as u64;
        override_with(&lookup, "CROPNOTE_RECAPTURE_MS", &mut recapture_ms);
        self.recapture_delay = Duration::from_millis(recapture_ms);

        self.export_quality = self.export_quality.clamp(0.0, 1.0);
        self.max_export_dimension = self.max_export_dimension.max(1);
    }
}

fn override_with<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *slot = value,
        Err(_) => log::warn!("[CONFIG] Ignoring {}={:?}: not a valid value", key, raw),
    }
}
