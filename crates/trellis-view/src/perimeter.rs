//! Built-in perimeter projections.
//!
//! All functions take the (possibly grown) device bounds of the terminal and the point the edge
//! is heading to, and return the point where the line from the center towards `next` leaves the
//! shape. Degenerate input (zero-sized bounds, `next` at the center) never panics.

use crate::state::CellState;
use std::f64::consts::PI;
use trellis_core::geom::{Point, Rect, intersection, point};
use trellis_core::style::Direction;

pub fn rectangle(bounds: &Rect, _vertex: &CellState, next: Point, orthogonal: bool) -> Option<Point> {
    Some(rectangle_point(bounds, next, orthogonal))
}

fn rectangle_point(bounds: &Rect, next: Point, orthogonal: bool) -> Point {
    let (x, y) = (bounds.origin.x, bounds.origin.y);
    let (w, h) = (bounds.size.width, bounds.size.height);
    let cx = x + w / 2.0;
    let cy = y + h / 2.0;
    let alpha = (next.y - cy).atan2(next.x - cx);
    let beta = PI / 2.0 - alpha;
    let t = h.atan2(w);

    let mut p = if alpha < -PI + t || alpha > PI - t {
        point(x, cy - w * alpha.tan() / 2.0)
    } else if alpha < -t {
        point(cx - h * beta.tan() / 2.0, y)
    } else if alpha < t {
        point(x + w, cy + w * alpha.tan() / 2.0)
    } else {
        point(cx + h * beta.tan() / 2.0, y + h)
    };

    if orthogonal {
        if next.x >= x && next.x <= x + w {
            p.x = next.x;
        } else if next.y >= y && next.y <= y + h {
            p.y = next.y;
        }
        if next.x < x {
            p.x = x;
        } else if next.x > x + w {
            p.x = x + w;
        }
        if next.y < y {
            p.y = y;
        } else if next.y > y + h {
            p.y = y + h;
        }
    }
    p
}

pub fn ellipse(bounds: &Rect, _vertex: &CellState, next: Point, orthogonal: bool) -> Option<Point> {
    let (x, y) = (bounds.origin.x, bounds.origin.y);
    let a = bounds.size.width / 2.0;
    let b = bounds.size.height / 2.0;
    if a <= 0.0 || b <= 0.0 {
        return Some(rectangle_point(bounds, next, orthogonal));
    }
    let cx = x + a;
    let cy = y + b;
    let (px, py) = (next.x, next.y);

    // Whole-pixel deltas keep near-vertical lines exactly vertical.
    let dx = (px - cx).trunc();
    let dy = (py - cy).trunc();

    if dx == 0.0 && dy != 0.0 {
        return Some(point(cx, cy + b * dy / dy.abs()));
    }
    if dx == 0.0 && dy == 0.0 {
        return Some(point(px, py));
    }

    if orthogonal {
        if py >= y && py <= y + bounds.size.height {
            let ty = py - cy;
            let mut tx = (a * a * (1.0 - ty * ty / (b * b))).max(0.0).sqrt();
            if px <= x {
                tx = -tx;
            }
            return Some(point(cx + tx, py));
        }
        if px >= x && px <= x + bounds.size.width {
            let tx = px - cx;
            let mut ty = (b * b * (1.0 - tx * tx / (a * a))).max(0.0).sqrt();
            if py <= y {
                ty = -ty;
            }
            return Some(point(px, cy + ty));
        }
    }

    // Line through the center and `next`, intersected with the ellipse.
    let d = dy / dx;
    let h = cy - d * cx;
    let e = a * a * d * d + b * b;
    let f = -2.0 * cx * e;
    let g = a * a * d * d * cx * cx + b * b * cx * cx - a * a * b * b;
    let det = (f * f - 4.0 * e * g).sqrt();
    if !det.is_finite() {
        return Some(rectangle_point(bounds, next, orthogonal));
    }

    let x1 = (-f + det) / (2.0 * e);
    let x2 = (-f - det) / (2.0 * e);
    let p1 = point(x1, d * x1 + h);
    let p2 = point(x2, d * x2 + h);
    let d1 = (p1 - next).square_length();
    let d2 = (p2 - next).square_length();
    Some(if d1 < d2 { p1 } else { p2 })
}

pub fn rhombus(bounds: &Rect, _vertex: &CellState, next: Point, orthogonal: bool) -> Option<Point> {
    let (x, y) = (bounds.origin.x, bounds.origin.y);
    let (w, h) = (bounds.size.width, bounds.size.height);
    let cx = x + w / 2.0;
    let cy = y + h / 2.0;
    let (px, py) = (next.x, next.y);

    if orthogonal && w > 0.0 && h > 0.0 {
        if px >= x && px <= x + w {
            let half = h / 2.0 * (1.0 - (px - cx).abs() / (w / 2.0));
            let sy = if py < cy { cy - half } else { cy + half };
            return Some(point(px, sy));
        }
        if py >= y && py <= y + h {
            let half = w / 2.0 * (1.0 - (py - cy).abs() / (h / 2.0));
            let sx = if px < cx { cx - half } else { cx + half };
            return Some(point(sx, py));
        }
    }

    let (ex, ey) = (if px < cx { x } else { x + w }, if py < cy { y } else { y + h });
    intersection(px, py, cx, cy, cx, ey, ex, cy)
}

pub fn triangle(bounds: &Rect, vertex: &CellState, next: Point, orthogonal: bool) -> Option<Point> {
    let direction = vertex.style.direction.unwrap_or_default();
    let vertical = direction.is_vertical();

    let (x, y) = (bounds.origin.x, bounds.origin.y);
    let (w, h) = (bounds.size.width, bounds.size.height);
    let mut cx = x + w / 2.0;
    let mut cy = y + h / 2.0;

    let (start, corner, end) = match direction {
        Direction::North => (point(x, y + h), point(cx, y), point(x + w, y + h)),
        Direction::South => (point(x, y), point(cx, y + h), point(x + w, y)),
        Direction::West => (point(x + w, y), point(x, cy), point(x + w, y + h)),
        Direction::East => (point(x, y), point(x + w, cy), point(x, y + h)),
    };

    let (dx, dy) = (next.x - cx, next.y - cy);
    let alpha = if vertical { dx.atan2(dy) } else { dy.atan2(dx) };
    let t = if vertical { w.atan2(h) } else { h.atan2(w) };

    let base = match direction {
        Direction::North | Direction::West => alpha > -t && alpha < t,
        _ => alpha < -PI + t || alpha > PI - t,
    };

    let result = if base {
        let on_base = if vertical {
            next.x >= start.x && next.x <= end.x
        } else {
            next.y >= start.y && next.y <= end.y
        };
        if orthogonal && on_base {
            Some(if vertical {
                point(next.x, start.y)
            } else {
                point(start.x, next.y)
            })
        } else {
            Some(match direction {
                Direction::North => point(x + w / 2.0 + h * alpha.tan() / 2.0, y + h),
                Direction::South => point(x + w / 2.0 - h * alpha.tan() / 2.0, y),
                Direction::West => point(x + w, y + h / 2.0 + w * alpha.tan() / 2.0),
                Direction::East => point(x, y + h / 2.0 - w * alpha.tan() / 2.0),
            })
        }
    } else {
        if orthogonal {
            let mut pt = point(cx, cy);
            if next.y >= y && next.y <= y + h {
                pt.x = if vertical {
                    cx
                } else if direction == Direction::West {
                    x + w
                } else {
                    x
                };
                pt.y = next.y;
            } else if next.x >= x && next.x <= x + w {
                pt.x = next.x;
                pt.y = if !vertical {
                    cy
                } else if direction == Direction::North {
                    y + h
                } else {
                    y
                };
            }
            cx = pt.x;
            cy = pt.y;
        }
        let upper = if vertical {
            next.x <= x + w / 2.0
        } else {
            next.y <= y + h / 2.0
        };
        if upper {
            intersection(next.x, next.y, cx, cy, start.x, start.y, corner.x, corner.y)
        } else {
            intersection(next.x, next.y, cx, cy, corner.x, corner.y, end.x, end.y)
        }
    };

    Some(result.unwrap_or(point(cx, cy)))
}

/// Six-sided polygon, pointy on the left and right (or top and bottom for vertical directions).
pub fn hexagon(bounds: &Rect, vertex: &CellState, next: Point, orthogonal: bool) -> Option<Point> {
    let (x, y) = (bounds.origin.x, bounds.origin.y);
    let (w, h) = (bounds.size.width, bounds.size.height);
    let cx = x + w / 2.0;
    let cy = y + h / 2.0;
    let vertical = vertex.style.direction.is_some_and(Direction::is_vertical);

    let corners = if vertical {
        [
            point(cx, y),
            point(x + w, y + h / 4.0),
            point(x + w, y + 3.0 * h / 4.0),
            point(cx, y + h),
            point(x, y + 3.0 * h / 4.0),
            point(x, y + h / 4.0),
        ]
    } else {
        [
            point(x + w / 4.0, y),
            point(x + 3.0 * w / 4.0, y),
            point(x + w, cy),
            point(x + 3.0 * w / 4.0, y + h),
            point(x + w / 4.0, y + h),
            point(x, cy),
        ]
    };

    let mut from = point(cx, cy);
    if orthogonal {
        if next.y >= y && next.y <= y + h {
            from = point(cx, next.y);
        } else if next.x >= x && next.x <= x + w {
            from = point(next.x, cy);
        }
    }

    let dir = next - from;
    let len = dir.length();
    if len == 0.0 || !len.is_finite() {
        return None;
    }
    // Cast past the far side so the segment always crosses the outline.
    let reach = (w + h).max(1.0) * 2.0 / len;
    let far = from + dir * reach;

    let mut best: Option<(f64, Point)> = None;
    for i in 0..corners.len() {
        let a = corners[i];
        let b = corners[(i + 1) % corners.len()];
        if let Some(p) = intersection(from.x, from.y, far.x, far.y, a.x, a.y, b.x, b.y) {
            let d = (p - from).square_length();
            if best.is_none_or(|(bd, _)| d > bd) {
                best = Some((d, p));
            }
        }
    }
    best.map(|(_, p)| p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::geom::rect;
    use trellis_core::{CellId, CellKind, ResolvedStyle};

    fn vertex() -> CellState {
        CellState::new(CellId(1), CellKind::Vertex, ResolvedStyle::default())
    }

    #[test]
    fn rectangle_midpoints() {
        let b = rect(0.0, 0.0, 100.0, 50.0);
        let v = vertex();
        assert_eq!(rectangle(&b, &v, point(250.0, 25.0), false), Some(point(100.0, 25.0)));
        let left = rectangle(&b, &v, point(-50.0, 25.0), false).unwrap();
        assert!(left.x == 0.0 && (left.y - 25.0).abs() < 1e-9);
        assert_eq!(rectangle(&b, &v, point(50.0, 200.0), false), Some(point(50.0, 50.0)));
    }

    #[test]
    fn rectangle_orthogonal_keeps_the_axis_of_next() {
        let b = rect(0.0, 0.0, 100.0, 50.0);
        let p = rectangle(&b, &vertex(), point(30.0, 200.0), true);
        assert_eq!(p, Some(point(30.0, 50.0)));
    }

    #[test]
    fn degenerate_inputs_do_not_produce_nan() {
        let v = vertex();
        let zero = rect(10.0, 10.0, 0.0, 0.0);
        for f in [rectangle, ellipse, rhombus, triangle, hexagon] {
            if let Some(p) = f(&zero, &v, point(10.0, 10.0), false) {
                assert!(p.x.is_finite() && p.y.is_finite());
            }
        }
    }
}
