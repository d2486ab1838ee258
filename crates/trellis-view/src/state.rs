//! Computed view state of a single cell.

use crate::renderer::ShapeHandle;
use trellis_core::geom::{self, Point, Rect, point, rect};
use trellis_core::{CellId, CellKind, ResolvedStyle};

#[derive(Debug, Clone)]
pub struct CellState {
    pub cell: CellId,
    pub kind: CellKind,
    /// Device bounds (after translate and scale).
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub unscaled_width: f64,
    pub unscaled_height: f64,
    /// Unscaled origin accumulated from the parents.
    pub origin: Point,
    /// Label anchor for edges, label offset for vertices.
    pub absolute_offset: Point,
    /// `Some(geometry.x)` when the cell's geometry is relative.
    pub relative_x: Option<f64>,
    pub style: ResolvedStyle,
    /// First and last entries are the terminal points; `None` while unresolved.
    pub absolute_points: Vec<Option<Point>>,
    pub segments: Vec<f64>,
    pub length: f64,
    pub terminal_distance: f64,
    pub visible_source: Option<CellId>,
    pub visible_target: Option<CellId>,
    pub invalid: bool,
    pub invalid_style: bool,
    /// Renderer-owned handle, released through [`crate::CellRenderer::destroy`].
    pub shape: Option<ShapeHandle>,
    /// Label bounds reported by the renderer, folded into the graph bounds.
    pub text_bounds: Option<Rect>,
    pub cell_bounds: Rect,
    pub paint_bounds: Rect,
}

impl CellState {
    pub fn new(cell: CellId, kind: CellKind, style: ResolvedStyle) -> Self {
        Self {
            cell,
            kind,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            unscaled_width: 0.0,
            unscaled_height: 0.0,
            origin: Point::zero(),
            absolute_offset: Point::zero(),
            relative_x: None,
            style,
            absolute_points: Vec::new(),
            segments: Vec::new(),
            length: 0.0,
            terminal_distance: 0.0,
            visible_source: None,
            visible_target: None,
            invalid: true,
            invalid_style: false,
            shape: None,
            text_bounds: None,
            cell_bounds: Rect::zero(),
            paint_bounds: Rect::zero(),
        }
    }

    pub fn is_vertex(&self) -> bool {
        self.kind == CellKind::Vertex
    }

    pub fn is_edge(&self) -> bool {
        self.kind == CellKind::Edge
    }

    pub fn bounds(&self) -> Rect {
        rect(self.x, self.y, self.width, self.height)
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn center(&self) -> Point {
        point(self.center_x(), self.center_y())
    }

    /// Bounds used for perimeter projection, grown by `border` device pixels.
    pub fn perimeter_bounds(&self, border: f64) -> Rect {
        let b = self.bounds();
        if border != 0.0 { geom::grow(&b, border) } else { b }
    }

    pub fn visible_terminal(&self, source: bool) -> Option<CellId> {
        if source {
            self.visible_source
        } else {
            self.visible_target
        }
    }

    pub fn set_visible_terminal(&mut self, terminal: Option<CellId>, source: bool) {
        if source {
            self.visible_source = terminal;
        } else {
            self.visible_target = terminal;
        }
    }

    pub fn first_point(&self) -> Option<Point> {
        self.absolute_points.first().copied().flatten()
    }

    pub fn last_point(&self) -> Option<Point> {
        self.absolute_points.last().copied().flatten()
    }

    /// Sets the first (`source`) or last absolute point, growing the list to two entries.
    pub fn set_absolute_terminal_point(&mut self, pt: Option<Point>, source: bool) {
        let pts = &mut self.absolute_points;
        if source {
            if pts.is_empty() {
                pts.push(pt);
            } else {
                pts[0] = pt;
            }
        } else if pts.is_empty() {
            pts.push(None);
            pts.push(pt);
        } else if pts.len() == 1 {
            pts.push(pt);
        } else {
            let last = pts.len() - 1;
            pts[last] = pt;
        }
    }

    pub fn routing_center_x(&self) -> f64 {
        self.center_x() + self.style.routing_center_x * self.width
    }

    pub fn routing_center_y(&self) -> f64 {
        self.center_y() + self.style.routing_center_y * self.height
    }

    /// Refreshes `cell_bounds` and `paint_bounds` from the current device bounds.
    pub fn update_cached_bounds(&mut self) {
        self.cell_bounds = self.bounds();
        self.paint_bounds = if self.is_vertex() {
            geom::rotated_bounds(&self.cell_bounds, self.style.rotation)
        } else {
            self.cell_bounds
        };
    }

    /// Shape plus label bounds. States without a shape only contribute their label.
    pub fn bounding_box(&self) -> Option<Rect> {
        let shape = self.shape.map(|_| self.paint_bounds);
        match (shape, self.text_bounds) {
            (Some(s), Some(t)) => Some(geom::add_rect(&s, &t)),
            (s, t) => s.or(t),
        }
    }
}
