//! Built-in edge routing strategies.
//!
//! Every function receives the edge state (whose first and last absolute points may already be
//! fixed), the source and target terminal states and the model waypoints, and appends the
//! interior points of the route. Fixed terminal points replace the terminal shape with a
//! zero-sized box at that point.

use crate::registry::EdgeStyleInput;
use crate::state::CellState;
use trellis_core::geom::{Point, point};
use trellis_core::style::Direction;

const ENTITY_SEGMENT: f64 = 30.0;
const ORTH_BUFFER: f64 = 10.0;

/// A terminal reduced to what routing needs.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RouteBox {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    rcx: f64,
    rcy: f64,
}

impl RouteBox {
    fn of(state: &CellState) -> Self {
        Self {
            x: state.x,
            y: state.y,
            width: state.width,
            height: state.height,
            rcx: state.style.routing_center_x,
            rcy: state.style.routing_center_y,
        }
    }

    fn at(p: Point) -> Self {
        Self {
            x: p.x,
            y: p.y,
            width: 0.0,
            height: 0.0,
            rcx: 0.0,
            rcy: 0.0,
        }
    }

    fn right(&self) -> f64 {
        self.x + self.width
    }

    fn bottom(&self) -> f64 {
        self.y + self.height
    }

    fn routing_center_x(&self) -> f64 {
        self.x + self.width / 2.0 + self.rcx * self.width
    }

    fn routing_center_y(&self) -> f64 {
        self.y + self.height / 2.0 + self.rcy * self.height
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        self.x <= x && self.right() >= x && self.y <= y && self.bottom() >= y
    }
}

fn terminal_boxes(input: &EdgeStyleInput<'_>) -> (Option<RouteBox>, Option<RouteBox>) {
    let source = match input.source_point() {
        Some(p) => Some(RouteBox::at(p)),
        None => input.source.map(RouteBox::of),
    };
    let target = match input.target_point() {
        Some(p) => Some(RouteBox::at(p)),
        None => input.target.map(RouteBox::of),
    };
    (source, target)
}

fn outside(a: &RouteBox, b: &RouteBox, x: f64, y: f64) -> bool {
    !a.contains(x, y) && !b.contains(x, y)
}

/// Horizontal stubs leaving and entering the terminals on their left or right side.
pub fn entity_relation(input: &EdgeStyleInput<'_>, result: &mut Vec<Point>) {
    let segment = input.state.style.segment.unwrap_or(ENTITY_SEGMENT) * input.scale;
    let p0 = input.source_point();
    let pe = input.target_point();

    let mut source_left = false;
    if let Some(source) = input.source {
        if let Some(rx) = source.relative_x {
            source_left = rx <= 0.5;
        } else if let Some(target) = input.target {
            let te = pe.map_or(target.x + target.width, |p| p.x);
            let s0 = p0.map_or(source.x, |p| p.x);
            source_left = te < s0;
        }
    }

    let mut target_left = true;
    if let Some(target) = input.target {
        if let Some(rx) = target.relative_x {
            target_left = rx <= 0.5;
        } else if let Some(source) = input.source {
            let s0 = p0.map_or(source.x + source.width, |p| p.x);
            let te = pe.map_or(target.x, |p| p.x);
            target_left = s0 < te;
        }
    }

    let (Some(source), Some(target)) = terminal_boxes(input) else {
        return;
    };

    let x0 = if source_left { source.x } else { source.right() };
    let y0 = source.routing_center_y();
    let xe = if target_left { target.x } else { target.right() };
    let ye = target.routing_center_y();

    let dep = point(x0 + if source_left { -segment } else { segment }, y0);
    let arr = point(xe + if target_left { -segment } else { segment }, ye);

    if source_left == target_left {
        let x = if source_left {
            x0.min(xe) - segment
        } else {
            x0.max(xe) + segment
        };
        result.push(point(x, y0));
        result.push(point(x, ye));
    } else if (dep.x < arr.x) == source_left {
        let mid_y = y0 + (ye - y0) / 2.0;
        result.push(dep);
        result.push(point(dep.x, mid_y));
        result.push(point(arr.x, mid_y));
        result.push(arr);
    } else {
        result.push(dep);
        result.push(arr);
    }
}

/// Self-loop drawn next to the source; the `direction` style picks the side (west by default).
pub fn loop_route(input: &EdgeStyleInput<'_>, result: &mut Vec<Point>) {
    if input.source_point().is_some() && input.target_point().is_some() {
        result.extend(input.points.iter().map(|p| input.transform_control_point(*p)));
        return;
    }
    let Some(source) = input.source.map(RouteBox::of) else {
        return;
    };

    let pt = input
        .points
        .first()
        .map(|p| input.transform_control_point(*p))
        .filter(|p| !source.contains(p.x, p.y));

    let seg = input.state.style.segment.unwrap_or(input.grid_size) * input.scale;
    let dir = input.state.style.direction.unwrap_or(Direction::West);

    let (mut x, mut dx, mut y, mut dy) = (0.0, 0.0, 0.0, 0.0);
    if dir.is_vertical() {
        x = source.routing_center_x();
        dx = seg;
    } else {
        y = source.routing_center_y();
        dy = seg;
    }

    match pt {
        Some(p) if p.x >= source.x && p.x <= source.right() => {
            x = source.routing_center_x();
            dx = (x - p.x).abs().max(dy);
            y = p.y;
            dy = 0.0;
        }
        Some(p) => {
            x = p.x;
            dy = (y - p.y).abs().max(dy);
        }
        None => match dir {
            Direction::North => y = source.y - 2.0 * dx,
            Direction::South => y = source.bottom() + 2.0 * dx,
            Direction::East => x = source.x - 2.0 * dy,
            Direction::West => x = source.right() + 2.0 * dy,
        },
    }

    result.push(point(x - dx, y - dy));
    result.push(point(x + dx, y + dy));
}

/// Picks [`side_to_side`] or [`top_to_bottom`] from the terminal layout, the first waypoint and
/// the `elbow` style.
pub fn elbow_connector(input: &EdgeStyleInput<'_>, result: &mut Vec<Point>) {
    let mut vertical = false;
    let mut horizontal = false;

    if let (Some(s), Some(t)) = (input.source, input.target) {
        if let Some(p) = input.points.first() {
            let left = s.x.min(t.x);
            let right = (s.x + s.width).max(t.x + t.width);
            let top = s.y.min(t.y);
            let bottom = (s.y + s.height).max(t.y + t.height);
            let pt = input.transform_control_point(*p);
            vertical = pt.y < top || pt.y > bottom;
            horizontal = pt.x < left || pt.x > right;
        } else {
            let left = s.x.max(t.x);
            let right = (s.x + s.width).min(t.x + t.width);
            vertical = left == right;
            if !vertical {
                let top = s.y.max(t.y);
                let bottom = (s.y + s.height).min(t.y + t.height);
                horizontal = top == bottom;
            }
        }
    }

    let elbow_vertical = input.state.style.elbow == trellis_core::style::Elbow::Vertical;
    if !horizontal && (vertical || elbow_vertical) {
        top_to_bottom(input, result);
    } else {
        side_to_side(input, result);
    }
}

/// Vertical middle segment between horizontally arranged terminals.
pub fn side_to_side(input: &EdgeStyleInput<'_>, result: &mut Vec<Point>) {
    let pt = input.points.first().map(|p| input.transform_control_point(*p));
    let (Some(source), Some(target)) = terminal_boxes(input) else {
        return;
    };

    let l = source.x.max(target.x);
    let r = source.right().min(target.right());
    let x = pt.map_or_else(|| (r + (l - r) / 2.0).round(), |p| p.x);

    let mut y1 = source.routing_center_y();
    let mut y2 = target.routing_center_y();
    if let Some(p) = pt {
        if p.y >= source.y && p.y <= source.bottom() {
            y1 = p.y;
        }
        if p.y >= target.y && p.y <= target.bottom() {
            y2 = p.y;
        }
    }

    if outside(&target, &source, x, y1) {
        result.push(point(x, y1));
    }
    if outside(&target, &source, x, y2) {
        result.push(point(x, y2));
    }

    if result.is_empty() {
        match pt {
            Some(p) => {
                if outside(&target, &source, x, p.y) {
                    result.push(point(x, p.y));
                }
            }
            None => {
                let t = source.y.max(target.y);
                let b = source.bottom().min(target.bottom());
                result.push(point(x, t + (b - t) / 2.0));
            }
        }
    }
}

/// Horizontal middle segment between vertically arranged terminals.
pub fn top_to_bottom(input: &EdgeStyleInput<'_>, result: &mut Vec<Point>) {
    let pt = input.points.first().map(|p| input.transform_control_point(*p));
    let (Some(source), Some(target)) = terminal_boxes(input) else {
        return;
    };

    let t = source.y.max(target.y);
    let b = source.bottom().min(target.bottom());

    let mut x = source.routing_center_x();
    if let Some(p) = pt.filter(|p| p.x >= source.x && p.x <= source.right()) {
        x = p.x;
    }
    let y = pt.map_or_else(|| (b + (t - b) / 2.0).round(), |p| p.y);

    if outside(&target, &source, x, y) {
        result.push(point(x, y));
    }

    x = match pt {
        Some(p) if p.x >= target.x && p.x <= target.right() => p.x,
        _ => target.routing_center_x(),
    };
    if outside(&target, &source, x, y) {
        result.push(point(x, y));
    }

    if result.is_empty() {
        match pt {
            Some(p) => {
                if outside(&target, &source, p.x, y) {
                    result.push(point(p.x, y));
                }
            }
            None => {
                let l = source.x.max(target.x);
                let r = source.right().min(target.right());
                result.push(point(l + (r - l) / 2.0, y));
            }
        }
    }
}

/// Orthogonal polyline through the waypoints: every waypoint fixes the position of one segment
/// and the direction alternates at each bend. Without waypoints this is an elbow connector.
pub fn segment_connector(input: &EdgeStyleInput<'_>, result: &mut Vec<Point>) {
    if input.points.is_empty() {
        elbow_connector(input, result);
        return;
    }
    let (Some(source), Some(target)) = terminal_boxes(input) else {
        return;
    };

    let start = point(source.routing_center_x(), source.routing_center_y());
    let end = point(target.routing_center_x(), target.routing_center_y());
    let hints: Vec<Point> = input
        .points
        .iter()
        .map(|p| input.transform_control_point(*p))
        .collect();

    let push = |cur: Point, bend: Point, result: &mut Vec<Point>| {
        if bend != cur && outside(&source, &target, bend.x, bend.y) {
            result.push(bend);
        }
    };

    let first = hints[0];
    let mut horizontal = (first.x - start.x).abs() >= (first.y - start.y).abs();
    let mut cur = start;
    for hint in &hints {
        let bend = if horizontal {
            point(hint.x, cur.y)
        } else {
            point(cur.x, hint.y)
        };
        push(cur, bend, result);
        cur = bend;
        horizontal = !horizontal;
    }

    let bend = if horizontal {
        point(end.x, cur.y)
    } else {
        point(cur.x, end.y)
    };
    if bend != end {
        push(cur, bend, result);
    }
}

/// Orthogonal route with one or two bends placed in the gap between the terminals. The first
/// waypoint, when present, fixes the position of the middle segment. Overlapping terminals are
/// routed around their right side.
pub fn orth_connector(input: &EdgeStyleInput<'_>, result: &mut Vec<Point>) {
    let (Some(source), Some(target)) = terminal_boxes(input) else {
        return;
    };
    let hint = input.points.first().map(|p| input.transform_control_point(*p));
    let buffer = input.state.style.jetty_size.unwrap_or(ORTH_BUFFER) * input.scale;

    let (sx, sy) = (source.routing_center_x(), source.routing_center_y());
    let (tx, ty) = (target.routing_center_x(), target.routing_center_y());

    let gap_x = (target.x - source.right()).max(source.x - target.right());
    let gap_y = (target.y - source.bottom()).max(source.y - target.bottom());

    if gap_x <= 0.0 && gap_y <= 0.0 {
        let x = hint.map_or_else(|| source.right().max(target.right()) + buffer, |h| h.x);
        result.push(point(x, sy));
        result.push(point(x, ty));
        return;
    }

    if gap_x >= gap_y {
        let mid = hint.map_or_else(
            || {
                if target.x >= source.right() {
                    source.right() + gap_x / 2.0
                } else {
                    target.right() + gap_x / 2.0
                }
            },
            |h| h.x,
        );
        let top = source.y.max(target.y);
        let bottom = source.bottom().min(target.bottom());
        if hint.is_none() && top <= bottom {
            result.push(point(mid, top + (bottom - top) / 2.0));
        } else {
            result.push(point(mid, sy));
            result.push(point(mid, ty));
        }
    } else {
        let mid = hint.map_or_else(
            || {
                if target.y >= source.bottom() {
                    source.bottom() + gap_y / 2.0
                } else {
                    target.bottom() + gap_y / 2.0
                }
            },
            |h| h.y,
        );
        let left = source.x.max(target.x);
        let right = source.right().min(target.right());
        if hint.is_none() && left <= right {
            result.push(point(left + (right - left) / 2.0, mid));
        } else {
            result.push(point(sx, mid));
            result.push(point(tx, mid));
        }
    }
}
