//! One capture from screenshot to clipboard.
//!
//! [`CaptureSession`] is the single mutable object the front-end holds. It
//! routes pointer input to the selection machine or the stroke history
//! depending on the phase, and reports changes through the callback handed
//! to [`CaptureSession::new`].

use std::time::Instant;

use image::RgbaImage;

use crate::annotation::{Color, HistoryStatus, StrokeHistory};
use crate::capture::{CaptureError, CaptureSource, SourceBitmap};
use crate::compositor::{self, CompositeRequest};
use crate::config::Settings;
use crate::error::{Result, SessionError};
use crate::export::{self, ClipboardSink, EncodedImage};
use crate::geometry::{PixelRect, Point, Rect, Size};
use crate::keymap::Command;
use crate::scheduler::{DeferredAction, DeferredQueue};
use crate::selection::{Selection, SelectionContext, SelectionEffect, SelectionEvent};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    Idle,
    Selecting,
    /// `selection` is in view units; `crop` is the matching bitmap region.
    Annotating { selection: Rect, crop: PixelRect },
}

/// State changes the front-end may want to reflect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Notification {
    UndoAvailability { can_undo: bool, can_redo: bool },
    EditsExist(bool),
    SelectionCommitted(Rect),
    Copied,
    CopiedFeedbackEnded,
}

pub type Listener = Box<dyn FnMut(Notification)>;

pub struct CaptureSession {
    settings: Settings,
    phase: Phase,
    source: Option<SourceBitmap>,
    view_size: Size,
    selection: Selection,
    history: StrokeHistory,
    color: Color,
    line_width: f64,
    deferred: DeferredQueue,
    /// Last confirmed selection as fractions of the view.
    last_selection: Option<Rect>,
    clipboard: Box<dyn ClipboardSink>,
    listener: Listener,
}

impl CaptureSession {
    pub fn new(
        settings: Settings,
        clipboard: Box<dyn ClipboardSink>,
        listener: impl FnMut(Notification) + 'static,
    ) -> Self {
        CaptureSession {
            selection: Selection::new(SelectionContext::new(Rect::ZERO, &settings)),
            history: StrokeHistory::new(settings.undo_capacity),
            color: settings.stroke_color,
            line_width: settings.stroke_width,
            phase: Phase::Idle,
            source: None,
            view_size: Size::ZERO,
            deferred: DeferredQueue::new(),
            last_selection: None,
            clipboard,
            listener: Box::new(listener),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn source(&self) -> Option<&SourceBitmap> {
        self.source.as_ref()
    }

    pub fn view_size(&self) -> Size {
        self.view_size
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &StrokeHistory {
        &self.history
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    pub fn last_selection(&self) -> Option<Rect> {
        self.last_selection
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Width for strokes started from now on. Non-positive widths are ignored.
    pub fn set_line_width(&mut self, width: f64) {
        if width > 0.0 && width.is_finite() {
            self.line_width = width;
        }
    }

    /// Start selecting on `source`, shown at `view_size` points.
    pub fn begin(&mut self, source: SourceBitmap, view_size: Size) {
        log::info!(
            "[SESSION] New capture {}x{} px in a {}x{} view",
            source.width(),
            source.height(),
            view_size.width,
            view_size.height
        );
        self.source = Some(source);
        self.view_size = view_size;
        self.selection.reset(Rect::from_size(view_size));
        self.history.reset();
        self.deferred.cancel(DeferredAction::Recapture);
        self.phase = Phase::Selecting;

        if self.settings.restore_last_selection {
            if let Some(last) = self.last_selection {
                if let Some(rect) = self.selection.seed(last.denormalized(view_size)) {
                    log::debug!("[SELECT] Restored previous selection {:?}", rect);
                }
            }
        }
    }

    /// Capture from `source` and begin. On failure the session is unchanged.
    pub fn capture(&mut self, source: &mut dyn CaptureSource, view_size: Size) -> std::result::Result<(), CaptureError> {
        let bitmap = source.capture().inspect_err(|e| {
            log::warn!("[CAPTURE] {}", e);
        })?;
        self.begin(bitmap, view_size);
        Ok(())
    }

    /// Drop the capture and go back to idle.
    pub fn end(&mut self) {
        self.phase = Phase::Idle;
        self.source = None;
        self.selection.reset(Rect::ZERO);
        self.history.reset();
    }

    pub fn pointer_down(&mut self, point: Point) {
        match self.phase {
            Phase::Selecting => {
                self.selection.handle(SelectionEvent::PointerDown(point));
            }
            Phase::Annotating { selection, .. } => {
                if selection.contains(point) {
                    self.history
                        .begin_stroke(to_canvas(point, &selection), self.color, self.line_width);
                }
            }
            Phase::Idle => {}
        }
    }

    pub fn pointer_move(&mut self, point: Point) {
        match self.phase {
            Phase::Selecting => {
                self.selection.handle(SelectionEvent::PointerMove(point));
            }
            Phase::Annotating { selection, .. } => {
                self.history.append_point(to_canvas(point, &selection));
            }
            Phase::Idle => {}
        }
    }

    pub fn pointer_up(&mut self, point: Point) {
        match self.phase {
            Phase::Selecting => {
                if let Some(SelectionEffect::Settled(rect)) =
                    self.selection.handle(SelectionEvent::PointerUp(point))
                {
                    log::debug!("[SELECT] Selection settled at {:?}", rect);
                }
            }
            Phase::Annotating { .. } => {
                // The release point is not part of the stroke; a bare click stays degenerate.
                if let Some(status) = self.history.commit_stroke() {
                    self.publish(status);
                }
            }
            Phase::Idle => {}
        }
    }

    pub fn command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Confirm => self.confirm().map(|_| ()),
            Command::Cancel => {
                self.cancel();
                Ok(())
            }
            Command::Undo => self.undo(),
            Command::Redo => self.redo(),
            Command::ClearAll => self.clear_all(),
            Command::Copy => self.copy_to_clipboard(Instant::now()).map(|_| ()),
            Command::SelectColor(index) => {
                if let Some(color) = Color::PALETTE.get(index) {
                    self.set_color(*color);
                }
                Ok(())
            }
        }
    }

    /// Lock in the committed selection and switch to annotating.
    /// Returns `Ok(None)` when there is nothing committed to confirm.
    pub fn confirm(&mut self) -> Result<Option<Rect>> {
        if self.phase != Phase::Selecting {
            return Ok(None);
        }
        let source = self.source.as_ref().ok_or(SessionError::NoSource)?;
        let Some(rect) = self.selection.rect().filter(|_| self.selection.state().is_committed()) else {
            return Ok(None);
        };

        let crop = compositor::crop_rect(&rect, self.view_size, (source.width(), source.height()))
            .inspect_err(|e| log::warn!("[SESSION] Cannot confirm selection: {}", e))?;

        if let Some(SelectionEffect::Confirmed(rect)) = self.selection.handle(SelectionEvent::Confirm) {
            self.phase = Phase::Annotating { selection: rect, crop };
            self.last_selection = rect.normalized(self.view_size);
            log::info!(
                "[SESSION] Selection confirmed: {:?} -> {}x{} px at ({},{})",
                rect,
                crop.width,
                crop.height,
                crop.x,
                crop.y
            );
            (self.listener)(Notification::SelectionCommitted(rect));
            self.publish(self.history.status());
            return Ok(Some(rect));
        }
        Ok(None)
    }

    pub fn cancel(&mut self) {
        if let Phase::Selecting = self.phase {
            self.selection.handle(SelectionEvent::Cancel);
        }
        if self.phase != Phase::Idle {
            log::info!("[SESSION] Capture cancelled");
        }
        self.end();
    }

    pub fn undo(&mut self) -> Result<()> {
        self.require_annotating()?;
        if let Some(status) = self.history.undo() {
            self.publish(status);
        }
        Ok(())
    }

    pub fn redo(&mut self) -> Result<()> {
        self.require_annotating()?;
        if let Some(status) = self.history.redo() {
            self.publish(status);
        }
        Ok(())
    }

    pub fn clear_all(&mut self) -> Result<()> {
        self.require_annotating()?;
        let status = self.history.clear_all();
        self.publish(status);
        Ok(())
    }

    /// Cropped screenshot with every committed stroke drawn on it, at the
    /// crop's native pixel size.
    pub fn final_image(&self) -> Result<RgbaImage> {
        let Phase::Annotating { selection, crop } = self.phase else {
            return Err(SessionError::NotAnnotating.into());
        };
        let source = self.source.as_ref().ok_or(SessionError::NoSource)?;
        let image = compositor::composite(&CompositeRequest {
            source,
            crop,
            strokes: self.history.strokes(),
            canvas: selection.size(),
            target: crop.dimensions(),
        })?;
        Ok(image)
    }

    /// Compose, encode and hand the result to the clipboard. Nothing is
    /// delivered if any step fails.
    pub fn copy_to_clipboard(&mut self, now: Instant) -> Result<EncodedImage> {
        let image = self.final_image()?;
        let encoded = export::encode(
            &image,
            self.settings.max_export_dimension,
            self.settings.export_quality,
        )?;
        self.clipboard.deliver(&encoded)?;

        (self.listener)(Notification::Copied);
        self.deferred.schedule(
            now,
            self.settings.copied_feedback_delay,
            DeferredAction::HideCopiedFeedback,
        );
        Ok(encoded)
    }

    /// Ask for a new capture once the current window has had time to hide.
    pub fn request_recapture(&mut self, now: Instant) {
        log::debug!("[SESSION] Recapture requested");
        self.deferred.schedule(now, self.settings.recapture_delay, DeferredAction::Recapture);
    }

    /// Drain due deferred actions. Feedback expiry is reported through the
    /// listener; the returned actions are for the host to carry out.
    pub fn poll_deferred(&mut self, now: Instant) -> Vec<DeferredAction> {
        let due = self.deferred.take_due(now);
        for action in &due {
            if *action == DeferredAction::HideCopiedFeedback {
                (self.listener)(Notification::CopiedFeedbackEnded);
            }
        }
        due
    }

    fn require_annotating(&self) -> std::result::Result<(), SessionError> {
        match self.phase {
            Phase::Annotating { .. } => Ok(()),
            _ => Err(SessionError::NotAnnotating),
        }
    }

    fn publish(&mut self, status: HistoryStatus) {
        (self.listener)(Notification::UndoAvailability {
            can_undo: status.can_undo,
            can_redo: status.can_redo,
        });
        (self.listener)(Notification::EditsExist(status.has_edits));
    }
}

/// View point to annotation-canvas point: origin at the selection's top-left,
/// y growing downward.
pub fn to_canvas(point: Point, selection: &Rect) -> Point {
    Point::new(point.x - selection.x, selection.max_y() - point.y)
}

/// Inverse of [`to_canvas`].
pub fn from_canvas(point: Point, selection: &Rect) -> Point {
    Point::new(selection.x + point.x, selection.max_y() - point.y)
}
