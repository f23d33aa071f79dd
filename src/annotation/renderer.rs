//! Rasterise strokes onto an RGBA buffer with tiny-skia.
//!
//! Strokes are drawn with round caps and round joins, anti-aliased,
//! source-over in commit order.

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use tiny_skia::{ColorU8, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Transform};

use super::model::Stroke;
use crate::geometry::Scale;

/// Draw `strokes` onto `canvas`, mapping points through `scale` and
/// multiplying widths by `scale.uniform()`.
pub fn draw_strokes(canvas: &mut RgbaImage, strokes: &[Arc<Stroke>], scale: &Scale) {
    if strokes.iter().all(|s| s.is_degenerate()) {
        return;
    }
    let (w, h) = canvas.dimensions();
    let Some(mut pixmap) = Pixmap::new(w, h) else {
        return;
    };

    // tiny-skia works on premultiplied pixels; `image` keeps straight alpha.
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(canvas.pixels()) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }

    for stroke in strokes {
        draw_stroke(&mut pixmap, stroke, scale);
    }

    for (dst, src) in canvas.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
}

fn draw_stroke(pixmap: &mut Pixmap, stroke: &Stroke, scale: &Scale) {
    let width = stroke.width * scale.uniform();
    if stroke.is_degenerate() || !(width > 0.0) {
        return;
    }

    let mut points = stroke.points().iter().map(|p| scale.apply(*p));
    let Some(first) = points.next() else {
        return;
    };
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in points {
        pb.line_to(p.x as f32, p.y as f32);
    }
    let Some(path) = pb.finish() else {
        return;
    };

    let mut paint = Paint::default();
    let color = stroke.color;
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;

    let outline = tiny_skia::Stroke {
        width: width as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..tiny_skia::Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &outline, Transform::identity(), None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::model::Color;
    use crate::geometry::Point;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const UNIT: Scale = Scale { sx: 1.0, sy: 1.0 };

    fn white(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, WHITE)
    }

    fn line(points: &[(f64, f64)], color: Color, width: f64) -> Arc<Stroke> {
        let mut stroke = Stroke::new(Point::new(points[0].0, points[0].1), color, width);
        for &(x, y) in &points[1..] {
            stroke.push(Point::new(x, y));
        }
        Arc::new(stroke)
    }

    #[test]
    fn horizontal_line_covers_its_centre_only() {
        let mut img = white(20, 20);
        draw_strokes(&mut img, &[line(&[(2.0, 10.0), (18.0, 10.0)], Color::BLACK, 6.0)], &UNIT);
        assert_eq!(*img.get_pixel(10, 9), Rgba([0, 0, 0, 255]));
        assert_eq!(*img.get_pixel(10, 10), Rgba([0, 0, 0, 255]));
        assert_eq!(*img.get_pixel(10, 3), WHITE);
        assert_eq!(*img.get_pixel(10, 17), WHITE);
    }

    #[test]
    fn caps_are_round() {
        let mut img = white(40, 40);
        draw_strokes(&mut img, &[line(&[(10.0, 20.0), (30.0, 20.0)], Color::BLACK, 10.0)], &UNIT);
        // Past the end point along the axis: inside the cap.
        assert_eq!(*img.get_pixel(33, 19), Rgba([0, 0, 0, 255]));
        // Diagonal corner beyond the cap radius stays clear.
        assert_eq!(*img.get_pixel(34, 24), WHITE);
        assert_eq!(*img.get_pixel(36, 20), WHITE);
    }

    #[test]
    fn out_of_canvas_points_are_clipped() {
        let mut img = white(10, 10);
        draw_strokes(&mut img, &[line(&[(-50.0, 5.0), (50.0, 5.0)], Color::BLUE, 4.0)], &UNIT);
        assert_eq!(*img.get_pixel(0, 4), Rgba([0, 122, 255, 255]));
        assert_eq!(*img.get_pixel(9, 5), Rgba([0, 122, 255, 255]));
        assert_eq!(*img.get_pixel(5, 0), WHITE);
    }

    #[test]
    fn scaled_stroke_lands_on_scaled_points() {
        let mut img = white(40, 40);
        let scale = Scale { sx: 2.0, sy: 2.0 };
        draw_strokes(&mut img, &[line(&[(5.0, 5.0), (15.0, 5.0)], Color::RED, 2.0)], &scale);
        // Width 2 becomes 4 around y=10.
        assert_eq!(*img.get_pixel(20, 9), Rgba([255, 59, 48, 255]));
        assert_eq!(*img.get_pixel(20, 10), Rgba([255, 59, 48, 255]));
        assert_eq!(*img.get_pixel(20, 5), WHITE);
        assert_eq!(*img.get_pixel(4, 10), WHITE);
    }

    #[test]
    fn later_strokes_occlude_earlier() {
        let mut img = white(20, 20);
        let strokes = [
            line(&[(0.0, 10.0), (20.0, 10.0)], Color::RED, 6.0),
            line(&[(10.0, 0.0), (10.0, 20.0)], Color::GREEN, 6.0),
        ];
        draw_strokes(&mut img, &strokes, &UNIT);
        assert_eq!(*img.get_pixel(10, 10), Rgba([40, 205, 65, 255]));
        assert_eq!(*img.get_pixel(3, 10), Rgba([255, 59, 48, 255]));
    }

    #[test]
    fn single_point_strokes_draw_nothing() {
        let mut img = white(10, 10);
        draw_strokes(&mut img, &[line(&[(5.0, 5.0)], Color::BLACK, 6.0)], &UNIT);
        assert!(img.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn transparent_pixels_keep_straight_alpha() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0]));
        draw_strokes(&mut img, &[line(&[(0.0, 5.0), (10.0, 5.0)], Color::RED, 4.0)], &UNIT);
        assert_eq!(*img.get_pixel(5, 5), Rgba([255, 59, 48, 255]));
        assert_eq!(*img.get_pixel(5, 0), Rgba([0, 0, 0, 0]));
    }
}
