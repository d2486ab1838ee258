//! Geometry primitives shared by the model and the view.
//!
//! Points and rectangles are `euclid` values in an untyped unit. Helpers that `euclid` does not
//! provide (rectangle accumulation that keeps zero-sized rectangles, rotation around a center,
//! segment distances) live here.

pub type Unit = euclid::UnknownUnit;

pub type Point = euclid::Point2D<f64, Unit>;
pub type Vector = euclid::Vector2D<f64, Unit>;
pub type Size = euclid::Size2D<f64, Unit>;
pub type Rect = euclid::Rect<f64, Unit>;

pub fn point(x: f64, y: f64) -> Point {
    euclid::point2(x, y)
}

pub fn vector(x: f64, y: f64) -> Vector {
    euclid::vec2(x, y)
}

pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect::new(point(x, y), euclid::size2(width, height))
}

pub fn center(r: &Rect) -> Point {
    point(r.origin.x + r.size.width / 2.0, r.origin.y + r.size.height / 2.0)
}

/// Grows `a` so it also covers `b`.
///
/// Unlike `euclid::Rect::union` this keeps zero-sized rectangles, so it can be used to
/// accumulate the bounds of a list of points.
pub fn add_rect(a: &Rect, b: &Rect) -> Rect {
    let min_x = a.origin.x.min(b.origin.x);
    let min_y = a.origin.y.min(b.origin.y);
    let max_x = (a.origin.x + a.size.width).max(b.origin.x + b.size.width);
    let max_y = (a.origin.y + a.size.height).max(b.origin.y + b.size.height);
    rect(min_x, min_y, max_x - min_x, max_y - min_y)
}

/// Grows the rectangle by `amount` on every side.
pub fn grow(r: &Rect, amount: f64) -> Rect {
    rect(
        r.origin.x - amount,
        r.origin.y - amount,
        r.size.width + 2.0 * amount,
        r.size.height + 2.0 * amount,
    )
}

/// Rotates the rectangle by 90 degrees around its center.
pub fn rotate90(r: &Rect) -> Rect {
    let t = (r.size.width - r.size.height) / 2.0;
    rect(r.origin.x + t, r.origin.y - t, r.size.height, r.size.width)
}

/// Inclusive containment test (points on the border are inside).
pub fn contains(r: &Rect, x: f64, y: f64) -> bool {
    r.origin.x <= x
        && r.origin.x + r.size.width >= x
        && r.origin.y <= y
        && r.origin.y + r.size.height >= y
}

pub fn intersect_rects(a: &Rect, b: &Rect) -> Rect {
    let x = a.origin.x.max(b.origin.x);
    let y = a.origin.y.max(b.origin.y);
    let right = (a.origin.x + a.size.width).min(b.origin.x + b.size.width);
    let bottom = (a.origin.y + a.size.height).min(b.origin.y + b.size.height);
    rect(x, y, (right - x).max(0.0), (bottom - y).max(0.0))
}

pub fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

/// Rotates `pt` around `c` given the precomputed cosine and sine of the angle.
pub fn rotated_point(pt: Point, cos: f64, sin: f64, c: Point) -> Point {
    let x = pt.x - c.x;
    let y = pt.y - c.y;
    point(x * cos - y * sin + c.x, y * cos + x * sin + c.y)
}

/// Bounding box of `r` rotated by `degrees` around its center.
pub fn rotated_bounds(r: &Rect, degrees: f64) -> Rect {
    if degrees == 0.0 {
        return *r;
    }
    let rad = to_radians(degrees);
    let (cos, sin) = (rad.cos(), rad.sin());
    let c = center(r);
    let corners = [
        point(r.origin.x, r.origin.y),
        point(r.origin.x + r.size.width, r.origin.y),
        point(r.origin.x + r.size.width, r.origin.y + r.size.height),
        point(r.origin.x, r.origin.y + r.size.height),
    ];
    let mut out: Option<Rect> = None;
    for p in corners {
        let p = rotated_point(p, cos, sin, c);
        let pr = rect(p.x, p.y, 0.0, 0.0);
        out = Some(match out {
            Some(acc) => add_rect(&acc, &pr),
            None => pr,
        });
    }
    out.unwrap_or(*r)
}

/// Squared distance between the point `(px, py)` and the segment `(x1, y1) - (x2, y2)`.
pub fn pt_seg_dist_sq(x1: f64, y1: f64, x2: f64, y2: f64, px: f64, py: f64) -> f64 {
    let x2 = x2 - x1;
    let y2 = y2 - y1;
    let mut px = px - x1;
    let mut py = py - y1;
    let mut dot = px * x2 + py * y2;
    let proj_len_sq = if dot <= 0.0 {
        0.0
    } else {
        px = x2 - px;
        py = y2 - py;
        dot = px * x2 + py * y2;
        if dot <= 0.0 {
            0.0
        } else {
            (dot * dot) / (x2 * x2 + y2 * y2)
        }
    };
    (px * px + py * py - proj_len_sq).max(0.0)
}

/// Returns -1, 0 or 1 depending on which side of the directed segment the point lies.
pub fn relative_ccw(x1: f64, y1: f64, x2: f64, y2: f64, px: f64, py: f64) -> i32 {
    let x2 = x2 - x1;
    let y2 = y2 - y1;
    let mut px = px - x1;
    let mut py = py - y1;
    let mut ccw = px * y2 - py * x2;
    if ccw == 0.0 {
        ccw = px * x2 + py * y2;
        if ccw > 0.0 {
            px -= x2;
            py -= y2;
            ccw = px * x2 + py * y2;
            if ccw < 0.0 {
                ccw = 0.0;
            }
        }
    }
    if ccw < 0.0 {
        -1
    } else if ccw > 0.0 {
        1
    } else {
        0
    }
}

/// Intersection of the segments `(x0, y0) - (x1, y1)` and `(x2, y2) - (x3, y3)`.
#[allow(clippy::too_many_arguments)]
pub fn intersection(
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    x3: f64,
    y3: f64,
) -> Option<Point> {
    let denom = (y3 - y2) * (x1 - x0) - (x3 - x2) * (y1 - y0);
    let nume_a = (x3 - x2) * (y0 - y2) - (y3 - y2) * (x0 - x2);
    let nume_b = (x1 - x0) * (y0 - y2) - (y1 - y0) * (x0 - x2);
    let ua = nume_a / denom;
    let ub = nume_b / denom;
    if (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub) {
        Some(point(x0 + ua * (x1 - x0), y0 + ua * (y1 - y0)))
    } else {
        None
    }
}

pub fn distance(a: Point, b: Point) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_rect_keeps_zero_sized_points() {
        let a = rect(10.0, 10.0, 0.0, 0.0);
        let b = rect(30.0, 5.0, 0.0, 0.0);
        assert_eq!(add_rect(&a, &b), rect(10.0, 5.0, 20.0, 5.0));
    }

    #[test]
    fn rotate90_swaps_extent_around_center() {
        let r = rotate90(&rect(0.0, 0.0, 40.0, 20.0));
        assert_eq!(r, rect(10.0, -10.0, 20.0, 40.0));
        assert_eq!(center(&r), point(20.0, 10.0));
    }

    #[test]
    fn segment_distance_clamps_to_end_points() {
        assert_eq!(pt_seg_dist_sq(0.0, 0.0, 10.0, 0.0, 5.0, 3.0), 9.0);
        assert_eq!(pt_seg_dist_sq(0.0, 0.0, 10.0, 0.0, 13.0, 4.0), 25.0);
        assert_eq!(pt_seg_dist_sq(0.0, 0.0, 10.0, 0.0, -3.0, 0.0), 9.0);
    }

    #[test]
    fn crossing_segments_intersect() {
        let p = intersection(0.0, 0.0, 10.0, 10.0, 0.0, 10.0, 10.0, 0.0);
        assert_eq!(p, Some(point(5.0, 5.0)));
        assert_eq!(intersection(0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0), None);
    }

    #[test]
    fn rotated_bounds_of_square_by_ninety_is_identity() {
        let r = rotated_bounds(&rect(0.0, 0.0, 10.0, 10.0), 90.0);
        assert!((r.origin.x - 0.0).abs() < 1e-9);
        assert!((r.size.width - 10.0).abs() < 1e-9);
    }
}
