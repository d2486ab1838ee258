//! Edge terminal points, routing and perimeter projection.

use super::GraphView;
use crate::registry::{EdgeStyleEntry, EdgeStyleInput, PerimeterFn};
use crate::state::CellState;
use trellis_core::geom::{self, Point, Rect, point};
use trellis_core::style::{ConnectionConstraint, Direction, keys};
use trellis_core::{CellId, Geometry, Model};

impl GraphView {
    /// Resolves the absolute points of an edge. Returns `false` if the edge cannot be drawn
    /// (a terminal that should be visible has no state, or an end stays unresolved).
    pub(crate) fn update_edge_state(&self, model: &Model, state: &mut CellState, geo: &Geometry) -> bool {
        let cell = state.cell;
        let source = state.visible_source.and_then(|id| self.states.get(&id));
        let target = state.visible_target.and_then(|id| self.states.get(&id));

        let missing = |terminal: Option<&CellState>, src: bool| {
            (model.terminal(cell, src).is_some() && terminal.is_none())
                || (terminal.is_none() && geo.terminal_point(src).is_none())
        };
        if missing(source, true) || missing(target, false) {
            return false;
        }

        self.update_fixed_terminal_points(state, geo, source, target);
        self.update_points(state, &geo.points, source, target);
        self.update_floating_terminal_points(state, source, target);

        if Some(cell) != self.current_root
            && (state.absolute_points.len() < 2
                || state.first_point().is_none()
                || state.last_point().is_none())
        {
            return false;
        }
        self.update_edge_bounds(state);
        self.update_edge_label_offset(state, geo);
        true
    }

    fn update_fixed_terminal_points(
        &self,
        state: &mut CellState,
        geo: &Geometry,
        source: Option<&CellState>,
        target: Option<&CellState>,
    ) {
        for (terminal, src) in [(source, true), (target, false)] {
            let constraint = state.style.constraint(src);
            let pt = self.fixed_terminal_point(state, geo, terminal, src, constraint);
            state.set_absolute_terminal_point(pt, src);
        }
    }

    /// The end point given by a connection constraint, or the geometry's terminal point for an
    /// unconnected end.
    pub fn fixed_terminal_point(
        &self,
        edge: &CellState,
        geo: &Geometry,
        terminal: Option<&CellState>,
        source: bool,
        constraint: Option<ConnectionConstraint>,
    ) -> Option<Point> {
        match (terminal, constraint) {
            (Some(t), Some(c)) => self.connection_point(t, &c, false),
            (Some(_), None) => None,
            (None, _) => geo
                .terminal_point(source)
                .map(|pt| self.transform_control_point(edge, pt)),
        }
    }

    fn update_points(
        &self,
        state: &mut CellState,
        points: &[Point],
        source: Option<&CellState>,
        target: Option<&CellState>,
    ) {
        let mut pts = vec![state.first_point()];
        match self.edge_style_for(state, points, source, target) {
            Some(entry) => {
                let input = EdgeStyleInput {
                    state,
                    source: self.terminal_port(state, source, true),
                    target: self.terminal_port(state, target, false),
                    points,
                    scale: self.scale,
                    translate: self.translate,
                    grid_size: self.options.grid_size,
                };
                let mut routed = Vec::new();
                (entry.route)(&input, &mut routed);
                pts.extend(routed.into_iter().map(Some));
            }
            None => {
                pts.extend(points.iter().map(|p| Some(self.transform_control_point(state, *p))));
            }
        }
        pts.push(state.last_point());
        state.absolute_points = pts;
    }

    fn update_floating_terminal_points(
        &self,
        state: &mut CellState,
        source: Option<&CellState>,
        target: Option<&CellState>,
    ) {
        if state.last_point().is_none() {
            if let Some(t) = target {
                let pt = self.floating_terminal_point(state, t, source, false);
                state.set_absolute_terminal_point(Some(pt), false);
            }
        }
        if state.first_point().is_none() {
            if let Some(s) = source {
                let pt = self.floating_terminal_point(state, s, target, true);
                state.set_absolute_terminal_point(Some(pt), true);
            }
        }
    }

    /// Where the edge meets the perimeter of `start`, aiming at the next point of the route or
    /// the center of `end`.
    pub fn floating_terminal_point(
        &self,
        edge: &CellState,
        start: &CellState,
        end: Option<&CellState>,
        source: bool,
    ) -> Point {
        let start = self.terminal_port(edge, Some(start), source).unwrap_or(start);
        let mut next = self.next_point(edge, end, source);

        let alpha = geom::to_radians(start.style.rotation);
        let center = start.center();
        if alpha != 0.0 {
            next = next.map(|n| geom::rotated_point(n, (-alpha).cos(), (-alpha).sin(), center));
        }

        let border = edge.style.perimeter_spacing + edge.style.perimeter_spacing_for(source);
        let orthogonal = alpha == 0.0 && self.is_orthogonal(edge);
        let pt = self.perimeter_point(start, next, orthogonal, border);
        if alpha != 0.0 {
            geom::rotated_point(pt, alpha.cos(), alpha.sin(), center)
        } else {
            pt
        }
    }

    /// The point next to the source (or target) end: the adjacent absolute point, else the
    /// center of `opposite`.
    pub fn next_point(&self, edge: &CellState, opposite: Option<&CellState>, source: bool) -> Option<Point> {
        let pts = &edge.absolute_points;
        let mut next = None;
        if pts.len() >= 2 {
            let count = pts.len();
            let index = if source { 1.min(count - 1) } else { count.saturating_sub(2) };
            next = pts[index];
        }
        next.or_else(|| opposite.map(CellState::center))
    }

    /// Projects `next` onto the perimeter of `terminal`, honoring flips. Falls back to the
    /// terminal's point when no perimeter applies.
    pub fn perimeter_point(
        &self,
        terminal: &CellState,
        next: Option<Point>,
        orthogonal: bool,
        border: f64,
    ) -> Point {
        let mut result = None;
        if let (Some(perimeter), Some(next)) = (self.perimeter_fn(terminal), next) {
            let bounds = self.perimeter_bounds(terminal, border);
            if bounds.size.width > 0.0 || bounds.size.height > 0.0 {
                let (flip_h, flip_v) = flips(terminal);
                let c = geom::center(&bounds);
                let flip = |mut p: Point| {
                    if flip_h {
                        p.x = 2.0 * c.x - p.x;
                    }
                    if flip_v {
                        p.y = 2.0 * c.y - p.y;
                    }
                    p
                };
                result = perimeter(&bounds, terminal, flip(next), orthogonal).map(flip);
            }
        }
        result.unwrap_or_else(|| self.get_point(terminal, None))
    }

    pub fn perimeter_fn(&self, state: &CellState) -> Option<PerimeterFn> {
        state
            .style
            .perimeter
            .as_deref()
            .and_then(|name| self.registry.perimeter(name))
    }

    /// Device bounds of `terminal` grown by `border` plus its own perimeter spacing.
    pub fn perimeter_bounds(&self, terminal: &CellState, border: f64) -> Rect {
        terminal.perimeter_bounds((border + terminal.style.perimeter_spacing) * self.scale)
    }

    /// The state an end is routed to: the `sourcePort`/`targetPort` cell if it has a state.
    pub fn terminal_port<'a>(
        &'a self,
        edge: &CellState,
        terminal: Option<&'a CellState>,
        source: bool,
    ) -> Option<&'a CellState> {
        edge.style
            .port(source)
            .and_then(parse_cell_id)
            .and_then(|id| self.states.get(&id))
            .or(terminal)
    }

    /// Edge style for `edge`: the loop style for self-loops, else the `edgeStyle` entry unless
    /// `noEdgeStyle` is set.
    pub fn edge_style_for(
        &self,
        edge: &CellState,
        points: &[Point],
        source: Option<&CellState>,
        target: Option<&CellState>,
    ) -> Option<EdgeStyleEntry> {
        let name = if self.is_loop_style_enabled(edge, points, source, target) {
            Some(
                edge.style
                    .loop_style
                    .as_deref()
                    .unwrap_or(&self.options.default_loop_style),
            )
        } else if !edge.style.no_edge_style {
            edge.style.edge_style.as_deref()
        } else {
            None
        };
        name.and_then(|n| self.registry.edge_style(n))
    }

    pub fn is_loop_style_enabled(
        &self,
        edge: &CellState,
        points: &[Point],
        source: Option<&CellState>,
        target: Option<&CellState>,
    ) -> bool {
        let orthogonal_loop = edge.style.get(keys::ORTHOGONAL_LOOP).is_some_and(|v| v == "1" || v == "true");
        let constrained = edge.style.source_constraint.is_some() || edge.style.target_constraint.is_some();
        if points.len() < 2 && (!orthogonal_loop || !constrained) {
            return matches!((source, target), (Some(s), Some(t)) if s.cell == t.cell);
        }
        false
    }

    /// `true` if floating ends of `edge` should be projected orthogonally.
    pub fn is_orthogonal(&self, edge: &CellState) -> bool {
        if let Some(orthogonal) = edge.style.orthogonal {
            return orthogonal;
        }
        if edge.style.no_edge_style {
            return false;
        }
        edge.style
            .edge_style
            .as_deref()
            .and_then(|n| self.registry.edge_style(n))
            .is_some_and(|e| e.orthogonal)
    }

    /// The device point for `constraint` on `vertex`, honoring direction, rotation and flips.
    pub fn connection_point(
        &self,
        vertex: &CellState,
        constraint: &ConnectionConstraint,
        round: bool,
    ) -> Option<Point> {
        let fraction = constraint.point?;
        let mut bounds = self.perimeter_bounds(vertex, 0.0);
        let cx = geom::center(&bounds);
        let direction = vertex.style.direction;

        let mut r1 = 0.0;
        if let Some(dir) = direction.filter(|_| vertex.style.anchor_point_direction) {
            r1 = match dir {
                Direction::North => 270.0,
                Direction::West => 180.0,
                Direction::South => 90.0,
                Direction::East => 0.0,
            };
            if dir.is_vertical() {
                bounds = geom::rotate90(&bounds);
            }
        }

        let mut pt = point(
            bounds.origin.x + fraction.x * bounds.size.width + constraint.dx * self.scale,
            bounds.origin.y + fraction.y * bounds.size.height + constraint.dy * self.scale,
        );

        let mut r2 = vertex.style.rotation;
        if constraint.perimeter {
            if r1 != 0.0 {
                let (cos, sin) = match r1 as i32 {
                    90 => (0.0, 1.0),
                    180 => (-1.0, 0.0),
                    _ => (0.0, -1.0),
                };
                pt = geom::rotated_point(pt, cos, sin, cx);
            }
            pt = self.perimeter_point(vertex, Some(pt), false, 0.0);
        } else {
            r2 += r1;
            if vertex.is_vertex() {
                let (flip_h, flip_v) = flips(vertex);
                let c = geom::center(&bounds);
                if flip_h {
                    pt.x = 2.0 * c.x - pt.x;
                }
                if flip_v {
                    pt.y = 2.0 * c.y - pt.y;
                }
            }
        }

        if r2 != 0.0 {
            let rad = geom::to_radians(r2);
            pt = geom::rotated_point(pt, rad.cos(), rad.sin(), cx);
        }
        if round {
            pt = point(pt.x.round(), pt.y.round());
        }
        Some(pt)
    }

    /// Bounding box, segment lengths and terminal distance of a routed edge.
    pub(crate) fn update_edge_bounds(&self, state: &mut CellState) {
        let (Some(p0), Some(pe)) = (state.first_point(), state.last_point()) else {
            return;
        };
        state.terminal_distance = geom::distance(p0, pe);

        let mut length = 0.0;
        let mut segments = Vec::with_capacity(state.absolute_points.len());
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (p0.x, p0.y, p0.x, p0.y);
        let mut prev = p0;
        for tmp in state.absolute_points.iter().skip(1).flatten() {
            let segment = geom::distance(prev, *tmp);
            segments.push(segment);
            length += segment;
            prev = *tmp;
            min_x = min_x.min(tmp.x);
            min_y = min_y.min(tmp.y);
            max_x = max_x.max(tmp.x);
            max_y = max_y.max(tmp.y);
        }

        // Axis-aligned edges keep a non-zero extent.
        const MIN_EXTENT: f64 = 1.0;
        state.length = length;
        state.segments = segments;
        state.x = min_x;
        state.y = min_y;
        state.width = (max_x - min_x).max(MIN_EXTENT);
        state.height = (max_y - min_y).max(MIN_EXTENT);
    }
}

/// Effective flips of a vertex; vertical directions swap the axes.
fn flips(state: &CellState) -> (bool, bool) {
    if !state.is_vertex() {
        return (false, false);
    }
    let (h, v) = (state.style.flip_h, state.style.flip_v);
    if state.style.direction.is_some_and(Direction::is_vertical) {
        (v, h)
    } else {
        (h, v)
    }
}

fn parse_cell_id(s: &str) -> Option<CellId> {
    s.trim_start_matches('#').parse().ok().map(CellId)
}
