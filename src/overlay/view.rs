use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use image::RgbaImage;
use objc2::rc::Retained;
use objc2::{define_class, msg_send, DefinedClass, MainThreadOnly};
use objc2_app_kit::{
    NSColor, NSCursor, NSEvent, NSEventModifierFlags, NSFont, NSGraphicsContext, NSTextField,
    NSTrackingArea, NSTrackingAreaOptions, NSView,
};
use objc2_core_foundation::{CFRetained, CGFloat, CGPoint, CGRect, CGSize};
use objc2_core_graphics::{
    CGBitmapContextCreate, CGBitmapContextCreateImage, CGBitmapContextGetBytesPerRow,
    CGBitmapContextGetData, CGBlendMode, CGColorSpace, CGContext, CGImage, CGImageAlphaInfo,
    CGLineCap, CGLineJoin,
};
use objc2_foundation::{MainThreadMarker, NSPoint, NSRect, NSString};

use crate::annotation::Stroke;
use crate::capture::{CaptureError, CaptureSource};
use crate::geometry::{self, CursorKind, Point, Rect, Size};
use crate::keymap::{self, Command, Modifiers};
use crate::scheduler::DeferredAction;
use crate::session::{self, CaptureSession, Phase};

pub struct OverlayViewIvars {
    session: RefCell<CaptureSession>,
    screenshot: RefCell<Option<CFRetained<CGImage>>>,
    /// Set while the "Copied" feedback is showing.
    copied: Rc<Cell<bool>>,
    label: RefCell<Option<Retained<NSTextField>>>,
    tracking_area: RefCell<Option<Retained<NSTrackingArea>>>,
}

define_class!(
    #[unsafe(super(NSView))]
    #[thread_kind = MainThreadOnly]
    #[name = "CropnoteOverlayView"]
    #[ivars = OverlayViewIvars]
    pub struct OverlayView;

    impl OverlayView {
        // Not flipped: view coordinates have a bottom-left origin, which is
        // the space selections are kept in.
        #[unsafe(method(isFlipped))]
        fn is_flipped(&self) -> bool {
            false
        }

        #[unsafe(method(acceptsFirstResponder))]
        fn accepts_first_responder(&self) -> bool {
            true
        }

        #[unsafe(method(acceptsFirstMouse:))]
        fn accepts_first_mouse(&self, _event: Option<&NSEvent>) -> bool {
            true
        }

        #[unsafe(method(drawRect:))]
        fn draw_rect(&self, _dirty_rect: NSRect) {
            let Some(context) = NSGraphicsContext::currentContext() else {
                return;
            };
            let cg = context.CGContext();
            let bounds = self.bounds();
            let screenshot = self.ivars().screenshot.borrow();

            if let Some(image) = screenshot.as_deref() {
                CGContext::draw_image(Some(&cg), bounds, Some(image));
            }

            CGContext::set_rgb_fill_color(Some(&cg), 0.0, 0.0, 0.0, 0.5);
            CGContext::fill_rect(Some(&cg), bounds);

            let session = self.ivars().session.borrow();
            let phase = session.phase();
            let selection = match phase {
                Phase::Annotating { selection, .. } => Some(selection),
                _ => session.selection().rect(),
            };
            let Some(selection) = selection.filter(|r| r.width >= 1.0 && r.height >= 1.0) else {
                return;
            };
            let sel_rect = to_cg_rect(&selection);

            // Undim the selection by redrawing the screenshot inside it.
            CGContext::save_g_state(Some(&cg));
            CGContext::set_blend_mode(Some(&cg), CGBlendMode::Clear);
            CGContext::fill_rect(Some(&cg), sel_rect);
            CGContext::restore_g_state(Some(&cg));

            CGContext::save_g_state(Some(&cg));
            CGContext::clip_to_rect(Some(&cg), sel_rect);
            if let Some(image) = screenshot.as_deref() {
                CGContext::draw_image(Some(&cg), bounds, Some(image));
            }
            if let Phase::Annotating { .. } = phase {
                let history = session.history();
                for stroke in history.strokes() {
                    draw_stroke(&cg, stroke, &selection);
                }
                if let Some(stroke) = history.pending() {
                    draw_stroke(&cg, stroke, &selection);
                }
            }
            CGContext::restore_g_state(Some(&cg));

            CGContext::save_g_state(Some(&cg));
            CGContext::set_rgb_stroke_color(Some(&cg), 0.2, 0.6, 1.0, 1.0);
            CGContext::set_line_width(Some(&cg), 1.0);
            let dash_lengths: [CGFloat; 2] = [4.0, 4.0];
            unsafe {
                CGContext::set_line_dash(Some(&cg), 0.0, dash_lengths.as_ptr(), dash_lengths.len());
            }
            CGContext::stroke_rect(Some(&cg), sel_rect);
            CGContext::restore_g_state(Some(&cg));

            if phase == Phase::Selecting {
                draw_handles(&cg, &selection, session.settings().handle_size);
            }
        }

        #[unsafe(method(mouseDown:))]
        fn mouse_down(&self, event: &NSEvent) {
            let point = self.event_point(event);
            self.ivars().session.borrow_mut().pointer_down(point);
            self.refresh();
        }

        #[unsafe(method(mouseDragged:))]
        fn mouse_dragged(&self, event: &NSEvent) {
            let point = self.event_point(event);
            self.ivars().session.borrow_mut().pointer_move(point);
            self.refresh();
        }

        #[unsafe(method(mouseUp:))]
        fn mouse_up(&self, event: &NSEvent) {
            let point = self.event_point(event);
            self.ivars().session.borrow_mut().pointer_up(point);
            self.refresh();
        }

        #[unsafe(method(mouseMoved:))]
        fn mouse_moved(&self, event: &NSEvent) {
            let point = self.event_point(event);
            let session = self.ivars().session.borrow();
            let kind = match session.phase() {
                Phase::Selecting => geometry::cursor_for(session.selection().hover(point)),
                _ => CursorKind::Crosshair,
            };
            ns_cursor(kind).set();
        }

        #[unsafe(method(keyDown:))]
        fn key_down(&self, event: &NSEvent) {
            let flags = event.modifierFlags();
            let modifiers = Modifiers {
                command: flags.contains(NSEventModifierFlags::Command),
                shift: flags.contains(NSEventModifierFlags::Shift),
            };
            if let Some(command) = keymap::command_for_key(event.keyCode(), modifiers) {
                self.perform(command);
            }
        }

        #[unsafe(method(resetCursorRects))]
        fn reset_cursor_rects(&self) {
            let bounds = self.bounds();
            self.addCursorRect_cursor(bounds, &NSCursor::crosshairCursor());
        }

        #[unsafe(method(updateTrackingAreas))]
        fn update_tracking_areas(&self) {
            if let Some(old_area) = self.ivars().tracking_area.borrow_mut().take() {
                self.removeTrackingArea(&old_area);
            }

            let options = NSTrackingAreaOptions::MouseMoved
                | NSTrackingAreaOptions::ActiveAlways
                | NSTrackingAreaOptions::CursorUpdate;
            let area = unsafe {
                NSTrackingArea::initWithRect_options_owner_userInfo(
                    MainThreadMarker::from(self).alloc(),
                    self.bounds(),
                    options,
                    Some(self),
                    None,
                )
            };
            self.addTrackingArea(&area);
            *self.ivars().tracking_area.borrow_mut() = Some(area);
        }
    }
);

impl OverlayView {
    pub fn new(
        mtm: MainThreadMarker,
        frame: NSRect,
        session: CaptureSession,
        copied: Rc<Cell<bool>>,
    ) -> Retained<Self> {
        let this = mtm.alloc().set_ivars(OverlayViewIvars {
            session: RefCell::new(session),
            screenshot: RefCell::new(None),
            copied,
            label: RefCell::new(None),
            tracking_area: RefCell::new(None),
        });
        let view: Retained<Self> = unsafe { msg_send![super(this), initWithFrame: frame] };

        let label = NSTextField::labelWithString(&NSString::from_str(""), mtm);
        label.setFont(Some(&NSFont::systemFontOfSize(12.0)));
        label.setTextColor(Some(&NSColor::whiteColor()));
        label.setBackgroundColor(Some(&NSColor::colorWithCalibratedWhite_alpha(0.0, 0.7)));
        label.setDrawsBackground(true);
        label.setHidden(true);
        view.addSubview(&label);
        *view.ivars().label.borrow_mut() = Some(label);

        view
    }

    /// Take a new screenshot and start selecting on it.
    pub fn start_capture(
        &self,
        source: &mut dyn CaptureSource,
        view_size: Size,
    ) -> Result<(), CaptureError> {
        self.ivars().session.borrow_mut().capture(source, view_size)?;
        let image = self
            .ivars()
            .session
            .borrow()
            .source()
            .and_then(|bitmap| rgba_to_cgimage(bitmap.pixels()));
        if image.is_none() {
            log::warn!("[CAPTURE] Could not prepare the screenshot for display");
        }
        *self.ivars().screenshot.borrow_mut() = image;
        self.ivars().copied.set(false);
        self.refresh();
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.ivars().session.borrow().phase() != Phase::Idle
    }

    pub fn request_recapture(&self, now: Instant) {
        self.ivars().session.borrow_mut().request_recapture(now);
    }

    /// Run due deferred work; returns actions the app has to carry out.
    pub fn tick(&self, now: Instant) -> Vec<DeferredAction> {
        let due = self.ivars().session.borrow_mut().poll_deferred(now);
        if !due.is_empty() {
            self.refresh();
        }
        due
    }

    /// Forget the screenshot and go idle.
    pub fn reset(&self) {
        self.ivars().session.borrow_mut().end();
        *self.ivars().screenshot.borrow_mut() = None;
        self.ivars().copied.set(false);
        self.refresh();
    }

    fn perform(&self, command: Command) {
        let phase = self.ivars().session.borrow().phase();
        // Return while annotating means "done": copy the result.
        let command = match (phase, command) {
            (Phase::Annotating { .. }, Command::Confirm) => Command::Copy,
            _ => command,
        };

        let result = self.ivars().session.borrow_mut().command(command);
        if let Err(e) = result {
            log::warn!("[SESSION] {:?} failed: {}", command, e);
        }

        if command == Command::Cancel {
            self.reset();
            if let Some(window) = self.window() {
                window.orderOut(None);
            }
            return;
        }
        self.refresh();
    }

    fn event_point(&self, event: &NSEvent) -> Point {
        let p = self.convertPoint_fromView(event.locationInWindow(), None);
        Point::new(p.x, p.y)
    }

    /// Update the size/feedback label and schedule a redraw.
    fn refresh(&self) {
        let session = self.ivars().session.borrow();
        let selection = match session.phase() {
            Phase::Annotating { selection, .. } => Some(selection),
            Phase::Selecting => session.selection().rect().filter(|r| !r.is_empty()),
            Phase::Idle => None,
        };
        drop(session);

        if let Some(label) = self.ivars().label.borrow().as_ref() {
            match selection {
                Some(rect) => {
                    let text = if self.ivars().copied.get() {
                        "Copied".to_string()
                    } else {
                        geometry::dimension_label(&rect)
                    };
                    label.setStringValue(&NSString::from_str(&text));
                    label.sizeToFit();
                    let height = label.frame().size.height;
                    let bounds = self.bounds();
                    let y = if rect.max_y() + height + 4.0 <= bounds.size.height {
                        rect.max_y() + 4.0
                    } else {
                        rect.max_y() - height - 4.0
                    };
                    label.setFrameOrigin(NSPoint::new(rect.x, y));
                    label.setHidden(false);
                }
                None => label.setHidden(true),
            }
        }
        self.setNeedsDisplay(true);
    }
}

fn to_cg_rect(rect: &Rect) -> CGRect {
    CGRect::new(CGPoint::new(rect.x, rect.y), CGSize::new(rect.width, rect.height))
}

fn draw_stroke(cg: &CGContext, stroke: &Stroke, selection: &Rect) {
    let points = stroke.points();
    if points.len() < 2 {
        return;
    }
    let (r, g, b, a) = stroke.color.components();
    CGContext::set_rgb_stroke_color(Some(cg), r, g, b, a);
    CGContext::set_line_width(Some(cg), stroke.width);
    CGContext::set_line_cap(Some(cg), CGLineCap::Round);
    CGContext::set_line_join(Some(cg), CGLineJoin::Round);

    CGContext::begin_path(Some(cg));
    let first = session::from_canvas(points[0], selection);
    CGContext::move_to_point(Some(cg), first.x, first.y);
    for p in &points[1..] {
        let p = session::from_canvas(*p, selection);
        CGContext::add_line_to_point(Some(cg), p.x, p.y);
    }
    CGContext::stroke_path(Some(cg));
}

fn draw_handles(cg: &CGContext, rect: &Rect, handle_size: f64) {
    let hs = handle_size / 2.0;
    let points = [
        (rect.min_x(), rect.min_y()),
        (rect.max_x(), rect.min_y()),
        (rect.min_x(), rect.max_y()),
        (rect.max_x(), rect.max_y()),
        (rect.mid_x(), rect.min_y()),
        (rect.mid_x(), rect.max_y()),
        (rect.min_x(), rect.mid_y()),
        (rect.max_x(), rect.mid_y()),
    ];

    CGContext::set_rgb_fill_color(Some(cg), 1.0, 1.0, 1.0, 1.0);
    CGContext::set_rgb_stroke_color(Some(cg), 0.2, 0.6, 1.0, 1.0);
    CGContext::set_line_width(Some(cg), 1.0);
    unsafe { CGContext::set_line_dash(Some(cg), 0.0, std::ptr::null(), 0) };

    for (x, y) in points {
        let handle_rect = CGRect::new(CGPoint::new(x - hs, y - hs), CGSize::new(handle_size, handle_size));
        CGContext::fill_rect(Some(cg), handle_rect);
        CGContext::stroke_rect(Some(cg), handle_rect);
    }
}

fn ns_cursor(kind: CursorKind) -> Retained<NSCursor> {
    match kind {
        CursorKind::Crosshair => NSCursor::crosshairCursor(),
        CursorKind::OpenHand => NSCursor::openHandCursor(),
        CursorKind::ResizeUpDown => NSCursor::resizeUpDownCursor(),
        CursorKind::ResizeLeftRight => NSCursor::resizeLeftRightCursor(),
        // No public diagonal resize cursor before macOS 15.
        CursorKind::ResizeNorthWestSouthEast | CursorKind::ResizeNorthEastSouthWest => {
            NSCursor::crosshairCursor()
        }
    }
}

/// Copy RGBA pixels into a context-owned buffer and snapshot it as a CGImage.
fn rgba_to_cgimage(pixels: &RgbaImage) -> Option<CFRetained<CGImage>> {
    let width = pixels.width() as usize;
    let height = pixels.height() as usize;
    let row_len = width * 4;

    let color_space = CGColorSpace::new_device_rgb()?;
    unsafe {
        let ctx = CGBitmapContextCreate(
            std::ptr::null_mut(),
            width,
            height,
            8,
            0,
            Some(&color_space),
            CGImageAlphaInfo::PremultipliedLast.0,
        )?;
        let data = CGBitmapContextGetData(Some(&ctx)) as *mut u8;
        if data.is_null() {
            return None;
        }
        let stride = CGBitmapContextGetBytesPerRow(Some(&ctx));
        for (row, src) in pixels.as_raw().chunks_exact(row_len).enumerate() {
            std::ptr::copy_nonoverlapping(src.as_ptr(), data.add(row * stride), row_len);
        }
        CGBitmapContextCreateImage(Some(&ctx))
    }
}
