//! Cell geometry.
//!
//! A `Geometry` is a plain value: mutators on the model always take a new geometry, so callers
//! clone (or use the `with_*` builders) before editing and never patch one observed by a view.

use crate::geom::{Point, Rect, point, rect};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// For vertices `x`/`y` are fractions of the parent size; for edges they describe the label
    /// position along the path (`x` in `-1..=1`, `y` as the orthogonal distance).
    pub relative: bool,
    /// Pixel offset. For edges this is the label offset.
    pub offset: Option<Point>,
    /// Waypoints of an edge in the parent's coordinate space.
    pub points: Vec<Point>,
    /// Bounds swapped in when the cell is collapsed or expanded.
    pub alternate_bounds: Option<Rect>,
    pub source_point: Option<Point>,
    pub target_point: Option<Point>,
}

impl Geometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Default::default()
        }
    }

    /// Geometry for an edge or a relative label, with `relative` set.
    pub fn relative(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            relative: true,
            ..Default::default()
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_relative(mut self, relative: bool) -> Self {
        self.relative = relative;
        self
    }

    pub fn with_offset(mut self, offset: Option<Point>) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = points;
        self
    }

    pub fn with_alternate_bounds(mut self, bounds: Option<Rect>) -> Self {
        self.alternate_bounds = bounds;
        self
    }

    pub fn with_terminal_point(mut self, pt: Option<Point>, source: bool) -> Self {
        self.set_terminal_point(pt, source);
        self
    }

    pub fn terminal_point(&self, source: bool) -> Option<Point> {
        if source {
            self.source_point
        } else {
            self.target_point
        }
    }

    pub fn set_terminal_point(&mut self, pt: Option<Point>, source: bool) {
        if source {
            self.source_point = pt;
        } else {
            self.target_point = pt;
        }
    }

    pub fn bounds(&self) -> Rect {
        rect(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> Point {
        point(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Moves the geometry, its terminal points and its waypoints. Relative geometries keep their
    /// fractional position (callers move those through `offset`).
    pub fn translate(&mut self, dx: f64, dy: f64) {
        if !self.relative {
            self.x += dx;
            self.y += dy;
        }
        if let Some(p) = self.source_point.as_mut() {
            p.x += dx;
            p.y += dy;
        }
        if let Some(p) = self.target_point.as_mut() {
            p.x += dx;
            p.y += dy;
        }
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
    }

    pub fn translated(mut self, dx: f64, dy: f64) -> Self {
        self.translate(dx, dy);
        self
    }

    /// Scales position, size, terminal points and waypoints. With `fixed_aspect` both axes use
    /// the smaller factor.
    pub fn scale(&mut self, sx: f64, sy: f64, fixed_aspect: bool) {
        if let Some(p) = self.source_point.as_mut() {
            p.x *= sx;
            p.y *= sy;
        }
        if let Some(p) = self.target_point.as_mut() {
            p.x *= sx;
            p.y *= sy;
        }
        for p in &mut self.points {
            p.x *= sx;
            p.y *= sy;
        }
        if !self.relative {
            self.x *= sx;
            self.y *= sy;
            let (sx, sy) = if fixed_aspect {
                let s = sx.min(sy);
                (s, s)
            } else {
                (sx, sy)
            };
            self.width *= sx;
            self.height *= sy;
        }
    }

    pub fn scaled(mut self, sx: f64, sy: f64, fixed_aspect: bool) -> Self {
        self.scale(sx, sy, fixed_aspect);
        self
    }

    /// Exchanges the bounds with `alternate_bounds`. No-op without alternate bounds.
    pub fn swap(&mut self) {
        if let Some(alt) = self.alternate_bounds {
            let old = self.bounds();
            self.x = alt.origin.x;
            self.y = alt.origin.y;
            self.width = alt.size.width;
            self.height = alt.size.height;
            self.alternate_bounds = Some(old);
        }
    }

    pub fn swapped(mut self) -> Self {
        self.swap();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_keeps_relative_position() {
        let g = Geometry::relative(0.5, 0.5)
            .with_terminal_point(Some(point(1.0, 1.0)), true)
            .translated(10.0, 5.0);
        assert_eq!((g.x, g.y), (0.5, 0.5));
        assert_eq!(g.source_point, Some(point(11.0, 6.0)));
    }

    #[test]
    fn scale_with_fixed_aspect_uses_smaller_factor() {
        let g = Geometry::new(10.0, 10.0, 20.0, 10.0).scaled(2.0, 3.0, true);
        assert_eq!((g.x, g.y, g.width, g.height), (20.0, 30.0, 40.0, 20.0));
    }

    #[test]
    fn swap_round_trips() {
        let g = Geometry::new(5.0, 5.0, 100.0, 80.0)
            .with_alternate_bounds(Some(rect(0.0, 0.0, 30.0, 20.0)));
        let collapsed = g.clone().swapped();
        assert_eq!(collapsed.bounds(), rect(0.0, 0.0, 30.0, 20.0));
        assert_eq!(collapsed.swapped(), g);
    }
}
