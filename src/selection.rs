//! Region selection as an explicit state machine.
//!
//! [`step`] is a pure transition function over [`SelectionState`];
//! [`Selection`] wraps it together with the view bounds and limits so that
//! the UI layer holds a single mutable value.

use crate::config::Settings;
use crate::geometry::{self, Handle, HandleMetrics, Point, Rect};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectionState {
    Empty,
    /// A fresh rubber-band drag from `anchor`.
    Dragging { anchor: Point, rect: Rect },
    /// Editing an existing rectangle through `handle`.
    Resizing { handle: Handle, anchor: Point, start: Rect, rect: Rect },
    Committed { rect: Rect },
}

impl SelectionState {
    /// Rectangle currently shown, if any.
    pub fn rect(&self) -> Option<Rect> {
        match *self {
            SelectionState::Empty => None,
            SelectionState::Dragging { rect, .. }
            | SelectionState::Resizing { rect, .. }
            | SelectionState::Committed { rect } => Some(rect),
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, SelectionState::Committed { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectionEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    Confirm,
    Cancel,
    /// Install a rectangle directly, e.g. one remembered from a previous capture.
    Seed(Rect),
}

/// Side effect of a transition, for the owner to act on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectionEffect {
    /// A drag or resize settled into `Committed`.
    Settled(Rect),
    /// A drag ended too small and was thrown away.
    Discarded,
    /// The user confirmed the committed rectangle.
    Confirmed(Rect),
    Cancelled,
}

/// Limits and bounds the transition function needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionContext {
    pub bounds: Rect,
    pub metrics: HandleMetrics,
    /// A new drag is kept only if both sides are strictly larger than this.
    pub min_selection: f64,
}

impl SelectionContext {
    pub fn new(bounds: Rect, settings: &Settings) -> Self {
        SelectionContext {
            bounds,
            metrics: HandleMetrics::from(settings),
            min_selection: settings.min_selection_size,
        }
    }

    fn clamp_point(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(self.bounds.min_x(), self.bounds.max_x()),
            p.y.clamp(self.bounds.min_y(), self.bounds.max_y()),
        )
    }
}

/// Advance `state` by one event.
pub fn step(
    state: SelectionState,
    event: SelectionEvent,
    ctx: &SelectionContext,
) -> (SelectionState, Option<SelectionEffect>) {
    use SelectionEffect as Fx;
    use SelectionState as S;

    match (state, event) {
        (_, SelectionEvent::Cancel) => (S::Empty, Some(Fx::Cancelled)),

        (_, SelectionEvent::Seed(rect)) => match rect.intersection(&ctx.bounds) {
            Some(r) if r.width >= ctx.metrics.min_size && r.height >= ctx.metrics.min_size => {
                (S::Committed { rect: r }, Some(Fx::Settled(r)))
            }
            _ => (state, None),
        },

        (S::Empty, SelectionEvent::PointerDown(p)) => {
            let p = ctx.clamp_point(p);
            (S::Dragging { anchor: p, rect: Rect::new(p.x, p.y, 0.0, 0.0) }, None)
        }

        (S::Committed { rect }, SelectionEvent::PointerDown(p)) => {
            match geometry::classify(p, &rect, &ctx.metrics) {
                Handle::None => {
                    let p = ctx.clamp_point(p);
                    (S::Dragging { anchor: p, rect: Rect::new(p.x, p.y, 0.0, 0.0) }, None)
                }
                handle => (S::Resizing { handle, anchor: p, start: rect, rect }, None),
            }
        }

        (S::Dragging { anchor, .. }, SelectionEvent::PointerMove(p)) => {
            let rect = Rect::from_points(anchor, ctx.clamp_point(p));
            (S::Dragging { anchor, rect }, None)
        }

        (S::Dragging { anchor, .. }, SelectionEvent::PointerUp(p)) => {
            let rect = Rect::from_points(anchor, ctx.clamp_point(p));
            if rect.width > ctx.min_selection && rect.height > ctx.min_selection {
                (S::Committed { rect }, Some(Fx::Settled(rect)))
            } else {
                log::debug!("[SELECT] Discarding {}x{} drag", rect.width, rect.height);
                (S::Empty, Some(Fx::Discarded))
            }
        }

        (S::Resizing { handle, anchor, start, rect }, SelectionEvent::PointerMove(p)) => {
            let delta = p.delta_from(anchor);
            let rect = geometry::resize(&start, handle, delta, &ctx.bounds, &ctx.metrics)
                .unwrap_or(rect);
            (S::Resizing { handle, anchor, start, rect }, None)
        }

        (S::Resizing { rect, .. }, SelectionEvent::PointerUp(_)) => {
            (S::Committed { rect }, Some(Fx::Settled(rect)))
        }

        (S::Committed { rect }, SelectionEvent::Confirm) => (state, Some(Fx::Confirmed(rect))),

        // Presses while a drag is active, stray moves/ups, and confirms with
        // nothing committed leave the state alone.
        _ => (state, None),
    }
}

/// Owner of the selection state for one capture session.
#[derive(Clone, Debug)]
pub struct Selection {
    state: SelectionState,
    ctx: SelectionContext,
}

impl Selection {
    pub fn new(ctx: SelectionContext) -> Self {
        Selection { state: SelectionState::Empty, ctx }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn rect(&self) -> Option<Rect> {
        self.state.rect()
    }

    pub fn handle(&mut self, event: SelectionEvent) -> Option<SelectionEffect> {
        let (next, effect) = step(self.state, event, &self.ctx);
        self.state = next;
        effect
    }

    /// Install `rect` as the committed selection, clipped to bounds.
    /// Returns the rectangle actually installed.
    pub fn seed(&mut self, rect: Rect) -> Option<Rect> {
        match self.handle(SelectionEvent::Seed(rect)) {
            Some(SelectionEffect::Settled(r)) => Some(r),
            _ => None,
        }
    }

    /// Handle under the pointer when no drag is active, for cursor feedback.
    pub fn hover(&self, point: Point) -> Handle {
        match self.state {
            SelectionState::Committed { rect } => geometry::classify(point, &rect, &self.ctx.metrics),
            _ => Handle::None,
        }
    }

    /// Back to `Empty` with new bounds, for a new capture.
    pub fn reset(&mut self, bounds: Rect) {
        self.state = SelectionState::Empty;
        self.ctx.bounds = bounds;
    }
}
