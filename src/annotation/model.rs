use crate::geometry::Point;

/// Straight (non-premultiplied) RGBA colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RED: Color = Color::rgb(255, 59, 48);
    pub const BLUE: Color = Color::rgb(0, 122, 255);
    pub const GREEN: Color = Color::rgb(40, 205, 65);
    pub const YELLOW: Color = Color::rgb(255, 204, 0);
    pub const ORANGE: Color = Color::rgb(255, 149, 0);
    pub const PURPLE: Color = Color::rgb(175, 82, 222);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Toolbar order; the first entry is the default.
    pub const PALETTE: [Color; 8] = [
        Color::RED,
        Color::BLUE,
        Color::GREEN,
        Color::YELLOW,
        Color::ORANGE,
        Color::PURPLE,
        Color::BLACK,
        Color::WHITE,
    ];

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    /// Components scaled to 0.0..=1.0, for drawing APIs that take floats.
    pub fn components(&self) -> (f64, f64, f64, f64) {
        (
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
            self.a as f64 / 255.0,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::RED
    }
}

/// One freehand polyline. Points are on the annotation canvas: top-left
/// origin, relative to the selection, in view units.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    points: Vec<Point>,
    pub color: Color,
    pub width: f64,
}

impl Stroke {
    pub fn new(start: Point, color: Color, width: f64) -> Self {
        Stroke { points: vec![start], color, width }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub(crate) fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// A single click leaves one point; those never become history.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_point_stroke_is_degenerate() {
        let mut s = Stroke::new(Point::new(1.0, 1.0), Color::BLUE, 3.0);
        assert!(s.is_degenerate());
        s.push(Point::new(2.0, 2.0));
        assert!(!s.is_degenerate());
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn palette_starts_with_red() {
        assert_eq!(Color::PALETTE[0], Color::default());
        assert_eq!(Color::WHITE.components(), (1.0, 1.0, 1.0, 1.0));
    }
}
