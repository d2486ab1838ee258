//! Absolute coordinates of vertices and label anchors.

use super::GraphView;
use crate::state::CellState;
use trellis_core::geom::{self, Point, point};
use trellis_core::style::{LabelPosition, VerticalLabelPosition};
use trellis_core::{Geometry, Model};

impl GraphView {
    /// Recomputes origin, device bounds and (for edges) the routed points of `state`.
    ///
    /// The state must not be registered in the cache while this runs; parent and terminal
    /// states are read from the cache. Returns `false` if the state has to be torn down.
    pub(crate) fn update_cell_state(&self, model: &Model, state: &mut CellState) -> bool {
        let cell = state.cell;
        state.absolute_offset = Point::zero();
        state.origin = Point::zero();
        state.length = 0.0;
        state.relative_x = None;

        let mut keep = true;
        if Some(cell) != self.current_root {
            let pstate = model.parent(cell).and_then(|p| self.states.get(&p));
            if let Some(p) = pstate.filter(|p| Some(p.cell) != self.current_root) {
                state.origin += p.origin.to_vector();
            }
            if let Some(offset) = self
                .hooks
                .as_ref()
                .and_then(|h| h.child_offset_for_cell(model, cell))
            {
                state.origin += offset.to_vector();
            }

            if let Some(geo) = model.geometry(cell) {
                if !state.is_edge() {
                    let offset = geo.offset.unwrap_or(Point::zero());
                    match pstate {
                        Some(p) if geo.relative => {
                            state.relative_x = Some(geo.x);
                            if p.is_edge() {
                                let anchor = self.get_point(p, Some(geo));
                                state.origin.x += anchor.x / self.scale - p.origin.x - self.translate.x;
                                state.origin.y += anchor.y / self.scale - p.origin.y - self.translate.y;
                            } else {
                                state.origin.x += geo.x * p.unscaled_width + offset.x;
                                state.origin.y += geo.y * p.unscaled_height + offset.y;
                            }
                        }
                        _ => {
                            state.absolute_offset = point(self.scale * offset.x, self.scale * offset.y);
                            state.origin.x += geo.x;
                            state.origin.y += geo.y;
                        }
                    }
                }

                state.x = self.scale * (self.translate.x + state.origin.x);
                state.y = self.scale * (self.translate.y + state.origin.y);
                state.width = self.scale * geo.width;
                state.unscaled_width = geo.width;
                state.height = self.scale * geo.height;
                state.unscaled_height = geo.height;

                if state.is_vertex() {
                    self.update_vertex_state(model, state, geo);
                }
                if state.is_edge() {
                    keep = self.update_edge_state(model, state, geo);
                }
            }
        }

        state.update_cached_bounds();
        keep
    }

    fn update_vertex_state(&self, model: &Model, state: &mut CellState, geo: &Geometry) {
        let pstate = model.parent(state.cell).and_then(|p| self.states.get(&p));
        if let Some(p) = pstate.filter(|p| geo.relative && !p.is_edge()) {
            let alpha = geom::to_radians(p.style.rotation);
            if alpha != 0.0 {
                let c = geom::rotated_point(state.center(), alpha.cos(), alpha.sin(), p.center());
                state.x = c.x - state.width / 2.0;
                state.y = c.y - state.height / 2.0;
            }
        }
        self.update_vertex_label_offset(state);
    }

    /// Shifts the label anchor of a vertex according to its label position styles.
    pub fn update_vertex_label_offset(&self, state: &mut CellState) {
        let style = &state.style;
        match style.label_position {
            LabelPosition::Left => {
                let lw = style.label_width.map_or(state.width, |w| w * self.scale);
                state.absolute_offset.x -= lw;
            }
            LabelPosition::Right => state.absolute_offset.x += state.width,
            LabelPosition::Center => {
                if let Some(lw) = style.label_width {
                    let dx = match style.align {
                        LabelPosition::Center => 0.5,
                        LabelPosition::Right => 1.0,
                        LabelPosition::Left => 0.0,
                    };
                    if dx != 0.0 {
                        state.absolute_offset.x -= (lw * self.scale - state.width) * dx;
                    }
                }
            }
        }
        match state.style.vertical_label_position {
            VerticalLabelPosition::Top => state.absolute_offset.y -= state.height,
            VerticalLabelPosition::Bottom => state.absolute_offset.y += state.height,
            VerticalLabelPosition::Middle => {}
        }
    }

    /// Places the label anchor of an edge: along the path for relative geometries, otherwise
    /// between the terminal points plus the geometry offset.
    pub fn update_edge_label_offset(&self, state: &mut CellState, geo: &Geometry) {
        state.absolute_offset = state.center();
        if state.absolute_points.is_empty() || state.segments.is_empty() {
            return;
        }
        if geo.relative {
            state.absolute_offset = self.get_point(state, Some(geo));
        } else if let (Some(p0), Some(pe)) = (state.first_point(), state.last_point()) {
            let off = geo.offset.unwrap_or(Point::zero());
            state.absolute_offset = point(
                p0.x + (pe.x - p0.x) / 2.0 + off.x * self.scale,
                p0.y + (pe.y - p0.y) / 2.0 + off.y * self.scale,
            );
        }
    }

    /// Point on an edge for a relative geometry: `x` in `[-1, 1]` walks the path from source to
    /// target, `y` is the orthogonal distance. Non-edge states yield their center plus offset.
    pub fn get_point(&self, state: &CellState, geometry: Option<&Geometry>) -> Point {
        let mut x = state.center_x();
        let mut y = state.center_y();

        if !state.segments.is_empty() && geometry.is_none_or(|g| g.relative) {
            let gx = geometry.map_or(0.0, |g| g.x / 2.0);
            let count = state.absolute_points.len();
            let dist = ((gx + 0.5) * state.length).round();
            let mut segment = state.segments[0];
            let mut length = 0.0;
            let mut index = 1;
            while dist >= (length + segment).round() && index < count.saturating_sub(1) {
                length += segment;
                segment = state.segments.get(index).copied().unwrap_or(0.0);
                index += 1;
            }
            let factor = if segment == 0.0 {
                0.0
            } else {
                (dist - length) / segment
            };
            let p0 = state.absolute_points.get(index - 1).copied().flatten();
            let pe = state.absolute_points.get(index).copied().flatten();
            if let (Some(p0), Some(pe)) = (p0, pe) {
                let gy = geometry.map_or(0.0, |g| g.y);
                let off = geometry.and_then(|g| g.offset).unwrap_or(Point::zero());
                let (dx, dy) = (pe.x - p0.x, pe.y - p0.y);
                let nx = if segment == 0.0 { 0.0 } else { dy / segment };
                let ny = if segment == 0.0 { 0.0 } else { dx / segment };
                x = p0.x + dx * factor + (nx * gy + off.x) * self.scale;
                y = p0.y + dy * factor - (ny * gy - off.y) * self.scale;
            }
        } else if let Some(off) = geometry.and_then(|g| g.offset) {
            x += off.x;
            y += off.y;
        }
        point(x, y)
    }

    /// Inverse of [`GraphView::get_point`]: the relative label position on `edge` closest to the
    /// device point `(x, y)`.
    pub fn get_relative_point(&self, model: &Model, edge: &CellState, x: f64, y: f64) -> Point {
        let relative = model.geometry(edge.cell).is_some_and(|g| g.relative);
        let pts: Vec<Point> = edge.absolute_points.iter().flatten().copied().collect();
        let count = pts.len();
        if !relative || count < 2 || edge.length == 0.0 || edge.segments.len() + 1 < count {
            return Point::zero();
        }

        let mut p0 = pts[0];
        let mut pe = pts[1];
        let mut min_dist = geom::pt_seg_dist_sq(p0.x, p0.y, pe.x, pe.y, x, y);
        let mut length = 0.0;
        let mut index = 0;
        let mut tmp = 0.0;
        for i in 2..count {
            p0 = pe;
            pe = pts[i];
            let dist = geom::pt_seg_dist_sq(p0.x, p0.y, pe.x, pe.y, x, y);
            tmp += edge.segments[i - 2];
            if dist <= min_dist {
                min_dist = dist;
                index = i - 1;
                length = tmp;
            }
        }

        let seg = edge.segments[index];
        let p0 = pts[index];
        let pe = pts[index + 1];
        let (x2, y2, x1, y1) = (p0.x, p0.y, pe.x, pe.y);
        let (xs, ys) = (x2 - x1, y2 - y1);
        let px = xs - (x - x1);
        let py = ys - (y - y1);
        let dot = px * xs + py * ys;
        let proj_sq = if dot <= 0.0 {
            0.0
        } else {
            dot * dot / (xs * xs + ys * ys)
        };
        let proj = proj_sq.sqrt().min(seg);

        let mut y_dist = geom::pt_seg_dist_sq(p0.x, p0.y, pe.x, pe.y, x, y).sqrt();
        if geom::relative_ccw(p0.x, p0.y, pe.x, pe.y, x, y) == -1 {
            y_dist = -y_dist;
        }
        point(
            ((edge.length / 2.0 - length - proj) / edge.length) * -2.0,
            y_dist / self.scale,
        )
    }
}
