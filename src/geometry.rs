//! Rectangles, handles and coordinate-space conversions.
//!
//! Three coordinate spaces meet here:
//! - view space: the interactive surface, origin bottom-left, y up;
//! - bitmap space: the captured raster, origin top-left, y down, in pixels;
//! - normalized space: view space divided by the view size, so [0,1] on both axes.
//!
//! Everything in this module is a pure function of its inputs.

use crate::config::Settings;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Offset from `origin` to `self`.
    pub fn delta_from(self, origin: Point) -> (f64, f64) {
        (self.x - origin.x, self.y - origin.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size { width: 0.0, height: 0.0 };

    pub const fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Axis-aligned rectangle. Width and height are never negative; a rectangle
/// with zero width or height means "no selection".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const ZERO: Rect = Rect { x: 0.0, y: 0.0, width: 0.0, height: 0.0 };

    /// Build a rectangle, folding negative extents back onto the origin.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x: if width < 0.0 { x + width } else { x },
            y: if height < 0.0 { y + height } else { y },
            width: width.abs(),
            height: height.abs(),
        }
    }

    pub fn from_size(size: Size) -> Self {
        Rect::new(0.0, 0.0, size.width, size.height)
    }

    /// Bounding box of two points.
    pub fn from_points(a: Point, b: Point) -> Self {
        Rect {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn mid_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn mid_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.size().is_empty()
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x() && p.x <= self.max_x() && p.y >= self.min_y() && p.y <= self.max_y()
    }

    /// Containment test that excludes the boundary.
    pub fn contains_strictly(&self, p: Point) -> bool {
        p.x > self.min_x() && p.x < self.max_x() && p.y > self.min_y() && p.y < self.max_y()
    }

    /// Overlap of two rectangles, or `None` when they do not overlap with a positive area.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.min_x().max(other.min_x());
        let y0 = self.min_y().max(other.min_y());
        let x1 = self.max_x().min(other.max_x());
        let y1 = self.max_y().min(other.max_y());
        if x1 > x0 && y1 > y0 {
            Some(Rect { x: x0, y: y0, width: x1 - x0, height: y1 - y0 })
        } else {
            None
        }
    }

    /// Shift the rectangle (size unchanged) so that it lies inside `bounds`.
    /// A rectangle larger than `bounds` is pinned to the bounds' origin.
    pub fn clamp_within(&self, bounds: &Rect) -> Rect {
        let max_x = (bounds.max_x() - self.width).max(bounds.min_x());
        let max_y = (bounds.max_y() - self.height).max(bounds.min_y());
        Rect {
            x: self.x.clamp(bounds.min_x(), max_x),
            y: self.y.clamp(bounds.min_y(), max_y),
            ..*self
        }
    }

    /// Re-express this view-space rectangle with a top-left origin:
    /// `y' = view_height - y - height`.
    pub fn flipped(&self, view_height: f64) -> Rect {
        Rect { y: view_height - self.y - self.height, ..*self }
    }

    /// Express the rectangle as fractions of `view`.
    pub fn normalized(&self, view: Size) -> Option<Rect> {
        if view.is_empty() {
            return None;
        }
        Some(Rect {
            x: self.x / view.width,
            y: self.y / view.height,
            width: self.width / view.width,
            height: self.height / view.height,
        })
    }

    /// Inverse of [`Rect::normalized`].
    pub fn denormalized(&self, view: Size) -> Rect {
        Rect {
            x: self.x * view.width,
            y: self.y * view.height,
            width: self.width * view.width,
            height: self.height * view.height,
        }
    }
}

/// Integer rectangle in bitmap space (origin top-left, y down).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        PixelRect { x, y, width, height }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Named hotspot on a selection rectangle. Top/bottom follow view space,
/// so `Top` is the edge at `max_y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handle {
    None,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
    Move,
}

/// Cursor shape the host should show for a handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorKind {
    Crosshair,
    OpenHand,
    ResizeNorthWestSouthEast,
    ResizeNorthEastSouthWest,
    ResizeUpDown,
    ResizeLeftRight,
}

pub fn cursor_for(handle: Handle) -> CursorKind {
    match handle {
        Handle::None => CursorKind::Crosshair,
        Handle::Move => CursorKind::OpenHand,
        Handle::TopLeft | Handle::BottomRight => CursorKind::ResizeNorthWestSouthEast,
        Handle::TopRight | Handle::BottomLeft => CursorKind::ResizeNorthEastSouthWest,
        Handle::Top | Handle::Bottom => CursorKind::ResizeUpDown,
        Handle::Left | Handle::Right => CursorKind::ResizeLeftRight,
    }
}

/// Hit-zone and size limits used by [`classify`] and [`resize`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandleMetrics {
    /// Edge length of the square zone centred on each corner.
    pub handle_size: f64,
    /// Distance from an edge line within which the edge is grabbed.
    pub edge_grab: f64,
    /// Smallest width/height a resize may produce.
    pub min_size: f64,
}

impl Default for HandleMetrics {
    fn default() -> Self {
        HandleMetrics::from(&Settings::default())
    }
}

impl From<&Settings> for HandleMetrics {
    fn from(settings: &Settings) -> Self {
        HandleMetrics {
            handle_size: settings.handle_size,
            edge_grab: settings.edge_grab_distance,
            min_size: settings.min_resize_size,
        }
    }
}

/// Classify `point` against `rect`.
///
/// Corners are checked first, then edges (middle two-thirds of each edge
/// only), then the interior. An empty rectangle has no handles.
pub fn classify(point: Point, rect: &Rect, metrics: &HandleMetrics) -> Handle {
    if rect.is_empty() {
        return Handle::None;
    }

    let half = metrics.handle_size / 2.0;
    let corners = [
        (rect.min_x(), rect.max_y(), Handle::TopLeft),
        (rect.max_x(), rect.max_y(), Handle::TopRight),
        (rect.min_x(), rect.min_y(), Handle::BottomLeft),
        (rect.max_x(), rect.min_y(), Handle::BottomRight),
    ];
    for (cx, cy, handle) in corners {
        if (point.x - cx).abs() <= half && (point.y - cy).abs() <= half {
            return handle;
        }
    }

    let grab = metrics.edge_grab;
    let in_middle_x =
        point.x >= rect.min_x() + rect.width / 6.0 && point.x <= rect.max_x() - rect.width / 6.0;
    let in_middle_y =
        point.y >= rect.min_y() + rect.height / 6.0 && point.y <= rect.max_y() - rect.height / 6.0;

    if in_middle_y && (point.x - rect.min_x()).abs() <= grab {
        return Handle::Left;
    }
    if in_middle_y && (point.x - rect.max_x()).abs() <= grab {
        return Handle::Right;
    }
    if in_middle_x && (point.y - rect.max_y()).abs() <= grab {
        return Handle::Top;
    }
    if in_middle_x && (point.y - rect.min_y()).abs() <= grab {
        return Handle::Bottom;
    }

    if rect.contains_strictly(point) {
        return Handle::Move;
    }

    Handle::None
}

/// Apply a pointer delta to the drag-start snapshot `start`.
///
/// Returns `None` when the result would be smaller than `metrics.min_size` on
/// either axis, or would fall entirely outside `bounds`; the caller keeps its
/// previous rectangle in that case. Resized rectangles are clipped to
/// `bounds`; a moved rectangle is shifted back inside them instead.
pub fn resize(
    start: &Rect,
    handle: Handle,
    delta: (f64, f64),
    bounds: &Rect,
    metrics: &HandleMetrics,
) -> Option<Rect> {
    let (dx, dy) = delta;
    let Rect { x, y, width: w, height: h } = *start;

    let (nx, ny, nw, nh) = match handle {
        Handle::TopLeft => (x + dx, y, w - dx, h + dy),
        Handle::TopRight => (x, y, w + dx, h + dy),
        Handle::BottomLeft => (x + dx, y + dy, w - dx, h - dy),
        Handle::BottomRight => (x, y + dy, w + dx, h - dy),
        Handle::Top => (x, y, w, h + dy),
        Handle::Bottom => (x, y + dy, w, h - dy),
        Handle::Left => (x + dx, y, w - dx, h),
        Handle::Right => (x, y, w + dx, h),
        Handle::Move => (x + dx, y + dy, w, h),
        Handle::None => return Some(*start),
    };

    if nw < metrics.min_size || nh < metrics.min_size {
        return None;
    }

    let candidate = Rect { x: nx, y: ny, width: nw, height: nh };
    if handle == Handle::Move {
        return Some(candidate.clamp_within(bounds));
    }
    candidate.intersection(bounds)
}

/// Map a view-space selection onto bitmap pixels.
///
/// Flips the rectangle to a top-left origin, then scales each axis by
/// `bitmap / view`. Returns the fractional rectangle; rounding and bounds
/// checks belong to the caller.
pub fn view_to_bitmap(selection: &Rect, view: Size, bitmap: Size) -> Option<Rect> {
    let sx = bitmap.width / view.width;
    let sy = bitmap.height / view.height;
    if !sx.is_finite() || !sy.is_finite() || sx <= 0.0 || sy <= 0.0 {
        return None;
    }
    let flipped = selection.flipped(view.height);
    Some(Rect {
        x: flipped.x * sx,
        y: flipped.y * sy,
        width: flipped.width * sx,
        height: flipped.height * sy,
    })
}

/// Per-axis scale that takes points authored on a canvas of size `from` to a
/// raster of size `to`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale {
    pub sx: f64,
    pub sy: f64,
}

impl Scale {
    pub fn between(from: Size, to: Size) -> Option<Scale> {
        let sx = to.width / from.width;
        let sy = to.height / from.height;
        if sx.is_finite() && sy.is_finite() && sx > 0.0 && sy > 0.0 {
            Some(Scale { sx, sy })
        } else {
            None
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(p.x * self.sx, p.y * self.sy)
    }

    /// Isotropic factor for line widths.
    pub fn uniform(&self) -> f64 {
        self.sx.min(self.sy)
    }
}

/// `"W × H"` label for a selection, using truncated view units.
pub fn dimension_label(rect: &Rect) -> String {
    format!("{} × {}", rect.width as i64, rect.height as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> HandleMetrics {
        HandleMetrics { handle_size: 10.0, edge_grab: 8.0, min_size: 20.0 }
    }

    fn bounds() -> Rect {
        Rect::new(0.0, 0.0, 1000.0, 1000.0)
    }

    #[test]
    fn new_folds_negative_extents() {
        let r = Rect::new(50.0, 60.0, -20.0, -30.0);
        assert_eq!(r, Rect::new(30.0, 30.0, 20.0, 30.0));
    }

    #[test]
    fn interior_points_are_move_body() {
        let r = Rect::new(100.0, 100.0, 300.0, 200.0);
        for &(x, y) in &[(250.0, 200.0), (150.0, 150.0), (350.0, 260.0), (200.0, 130.0)] {
            assert_eq!(classify(Point::new(x, y), &r, &metrics()), Handle::Move, "({x},{y})");
        }
    }

    #[test]
    fn corners_win_under_small_noise() {
        let r = Rect::new(100.0, 100.0, 300.0, 200.0);
        let m = metrics();
        for &(nx, ny) in &[(0.0, 0.0), (1.0, -1.0), (-1.0, 1.0), (0.5, 0.5)] {
            assert_eq!(classify(Point::new(100.0 + nx, 300.0 + ny), &r, &m), Handle::TopLeft);
            assert_eq!(classify(Point::new(400.0 + nx, 300.0 + ny), &r, &m), Handle::TopRight);
            assert_eq!(classify(Point::new(100.0 + nx, 100.0 + ny), &r, &m), Handle::BottomLeft);
            assert_eq!(classify(Point::new(400.0 + nx, 100.0 + ny), &r, &m), Handle::BottomRight);
        }
    }

    #[test]
    fn edges_only_in_middle_two_thirds() {
        let r = Rect::new(100.0, 100.0, 300.0, 300.0);
        let m = metrics();
        assert_eq!(classify(Point::new(100.0, 250.0), &r, &m), Handle::Left);
        assert_eq!(classify(Point::new(406.0, 250.0), &r, &m), Handle::Right);
        assert_eq!(classify(Point::new(250.0, 395.0), &r, &m), Handle::Top);
        assert_eq!(classify(Point::new(250.0, 100.0), &r, &m), Handle::Bottom);
        // Near a corner but outside its zone and outside the middle band.
        assert_eq!(classify(Point::new(100.0, 120.0), &r, &m), Handle::None);
        assert_eq!(classify(Point::new(102.0, 120.0), &r, &m), Handle::Move);
    }

    #[test]
    fn far_outside_is_none() {
        let r = Rect::new(100.0, 100.0, 300.0, 300.0);
        assert_eq!(classify(Point::new(10.0, 10.0), &r, &metrics()), Handle::None);
        assert_eq!(classify(Point::new(50.0, 50.0), &Rect::ZERO, &metrics()), Handle::None);
    }

    #[test]
    fn zero_delta_is_identity_for_every_handle() {
        let r = Rect::new(100.0, 100.0, 300.0, 200.0);
        for h in [
            Handle::TopLeft,
            Handle::TopRight,
            Handle::BottomLeft,
            Handle::BottomRight,
            Handle::Top,
            Handle::Bottom,
            Handle::Left,
            Handle::Right,
            Handle::Move,
            Handle::None,
        ] {
            assert_eq!(resize(&r, h, (0.0, 0.0), &bounds(), &metrics()), Some(r), "{h:?}");
        }
    }

    #[test]
    fn corner_resize_moves_origin_and_size_together() {
        let r = Rect::new(100.0, 100.0, 300.0, 200.0);
        let out = resize(&r, Handle::TopLeft, (10.0, 15.0), &bounds(), &metrics()).unwrap();
        assert_eq!(out, Rect::new(110.0, 100.0, 290.0, 215.0));

        let out = resize(&r, Handle::BottomRight, (10.0, 15.0), &bounds(), &metrics()).unwrap();
        assert_eq!(out, Rect::new(100.0, 115.0, 310.0, 185.0));
    }

    #[test]
    fn edge_resize_touches_one_axis() {
        let r = Rect::new(100.0, 100.0, 300.0, 200.0);
        let out = resize(&r, Handle::Left, (-20.0, 40.0), &bounds(), &metrics()).unwrap();
        assert_eq!(out, Rect::new(80.0, 100.0, 320.0, 200.0));
        let out = resize(&r, Handle::Bottom, (40.0, 20.0), &bounds(), &metrics()).unwrap();
        assert_eq!(out, Rect::new(100.0, 120.0, 300.0, 180.0));
    }

    #[test]
    fn resize_below_minimum_is_rejected() {
        let r = Rect::new(100.0, 100.0, 30.0, 30.0);
        assert_eq!(resize(&r, Handle::Right, (-15.0, 0.0), &bounds(), &metrics()), None);
        assert!(resize(&r, Handle::Right, (-10.0, 0.0), &bounds(), &metrics()).is_some());
    }

    #[test]
    fn resize_is_clipped_and_move_is_clamped() {
        let r = Rect::new(900.0, 100.0, 80.0, 80.0);
        let out = resize(&r, Handle::Right, (100.0, 0.0), &bounds(), &metrics()).unwrap();
        assert_eq!(out, Rect::new(900.0, 100.0, 100.0, 80.0));

        let out = resize(&r, Handle::Move, (100.0, -200.0), &bounds(), &metrics()).unwrap();
        assert_eq!(out, Rect::new(920.0, 0.0, 80.0, 80.0));
    }

    #[test]
    fn flip_uses_max_y() {
        let r = Rect::new(0.0, 100.0, 50.0, 200.0);
        assert_eq!(r.flipped(1000.0).y, 700.0);
    }

    #[test]
    fn view_to_bitmap_scales_after_flip() {
        let sel = Rect::new(100.0, 100.0, 300.0, 200.0);
        let out = view_to_bitmap(&sel, Size::new(1000.0, 500.0), Size::new(2000.0, 1000.0)).unwrap();
        assert_eq!(out, Rect::new(200.0, 400.0, 600.0, 400.0));
        assert!(view_to_bitmap(&sel, Size::ZERO, Size::new(10.0, 10.0)).is_none());
    }

    #[test]
    fn scale_maps_canvas_to_target() {
        let s = Scale::between(Size::new(200.0, 100.0), Size::new(400.0, 200.0)).unwrap();
        assert_eq!(s.apply(Point::new(50.0, 50.0)), Point::new(100.0, 100.0));
        assert_eq!(s.uniform(), 2.0);
    }

    #[test]
    fn normalized_round_trip_through_a_new_view() {
        let r = Rect::new(192.0, 108.0, 960.0, 540.0);
        let n = r.normalized(Size::new(1920.0, 1080.0)).unwrap();
        assert_eq!(n, Rect::new(0.1, 0.1, 0.5, 0.5));
        assert_eq!(n.denormalized(Size::new(1000.0, 1000.0)), Rect::new(100.0, 100.0, 500.0, 500.0));
    }

    #[test]
    fn cursors_follow_handles() {
        assert_eq!(cursor_for(Handle::Move), CursorKind::OpenHand);
        assert_eq!(cursor_for(Handle::BottomLeft), CursorKind::ResizeNorthEastSouthWest);
        assert_eq!(cursor_for(Handle::None), CursorKind::Crosshair);
    }

    #[test]
    fn label_truncates() {
        assert_eq!(dimension_label(&Rect::new(0.0, 0.0, 300.7, 200.2)), "300 × 200");
    }
}
