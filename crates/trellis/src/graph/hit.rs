//! Hit testing and zooming.

use super::Graph;
use crate::events::GraphEvent;
use trellis_core::geom::{self, point};
use trellis_core::{CellId, Rect};
use trellis_view::CellState;

impl Graph {
    /// Topmost visible cell whose state contains the device point `(x, y)`, searching below
    /// `parent` (the current root or model root by default). Children are hit before their parent
    /// and later siblings before earlier ones.
    pub fn get_cell_at(&self, x: f64, y: f64, parent: Option<CellId>) -> Option<CellId> {
        self.get_cell_at_filtered(x, y, parent, true, true)
    }

    pub fn get_cell_at_filtered(
        &self,
        x: f64,
        y: f64,
        parent: Option<CellId>,
        vertices: bool,
        edges: bool,
    ) -> Option<CellId> {
        let parent = parent
            .or_else(|| self.view.current_root())
            .unwrap_or_else(|| self.model.root());
        for &cell in self.model.children(parent).iter().rev() {
            if let Some(hit) = self.get_cell_at_filtered(x, y, Some(cell), vertices, edges) {
                return Some(hit);
            }
            let wanted = (edges && self.model.is_edge(cell)) || (vertices && self.model.is_vertex(cell));
            if !wanted || !self.model.is_visible(cell) {
                continue;
            }
            if let Some(state) = self.view.get_state(cell) {
                if self.intersects(state, x, y) {
                    return Some(cell);
                }
            }
        }
        None
    }

    /// Edges are hit within the tolerance of any segment; vertices inside their (unrotated)
    /// bounds.
    pub fn intersects(&self, state: &CellState, x: f64, y: f64) -> bool {
        if state.is_edge() {
            let t2 = self.config.tolerance * self.config.tolerance;
            return state.absolute_points.windows(2).any(|w| match (w[0], w[1]) {
                (Some(a), Some(b)) => geom::pt_seg_dist_sq(a.x, a.y, b.x, b.y, x, y) <= t2,
                _ => false,
            });
        }
        let mut p = point(x, y);
        let alpha = geom::to_radians(state.style.rotation);
        if alpha != 0.0 {
            p = geom::rotated_point(p, (-alpha).cos(), (-alpha).sin(), state.center());
        }
        geom::contains(&state.bounds(), p.x, p.y)
    }

    // --- zoom ---------------------------------------------------------------------------------

    pub fn zoom_in(&mut self) {
        self.zoom(self.config.zoom_factor);
    }

    pub fn zoom_out(&mut self) {
        self.zoom(1.0 / self.config.zoom_factor);
    }

    pub fn zoom_actual(&mut self) {
        let previous = self.view.scale();
        if self.view.scale_and_translate(&self.model, 1.0, 0.0, 0.0) {
            self.fire(GraphEvent::Scale {
                scale: 1.0,
                previous,
            });
        }
    }

    pub fn zoom_to(&mut self, scale: f64) {
        self.zoom(scale / self.view.scale());
    }

    /// Multiplies the scale by `factor`, rounded to two decimals.
    pub fn zoom(&mut self, factor: f64) {
        let previous = self.view.scale();
        let scale = (previous * factor * 100.0).round() / 100.0;
        if self.view.set_scale(&self.model, scale) {
            self.fire(GraphEvent::Scale { scale, previous });
        }
    }

    /// Scales (and unless `keep_origin` translates) the view so the graph bounds fit a viewport
    /// of `width` x `height` with `border` around them. Returns the new scale; the view is left
    /// unchanged when the graph is empty.
    pub fn fit(&mut self, width: f64, height: f64, border: f64, keep_origin: bool, margin: f64) -> f64 {
        let mut bounds: Rect = self.view.graph_bounds();
        if bounds.size.width <= 0.0 || bounds.size.height <= 0.0 {
            return self.view.scale();
        }
        if keep_origin {
            bounds.size.width += bounds.origin.x;
            bounds.size.height += bounds.origin.y;
            bounds.origin = point(0.0, 0.0);
        }
        let s = self.view.scale();
        let w2 = bounds.size.width / s;
        let h2 = bounds.size.height / s;
        let b = if keep_origin { border } else { 2.0 * border } + margin + 1.0;
        let w1 = width - b;
        let h1 = height - b;
        let s2 = (w1 / w2)
            .min(h1 / h2)
            .max(self.config.min_fit_scale)
            .min(self.config.max_fit_scale);

        let previous = self.view.scale();
        let changed = if keep_origin {
            self.view.set_scale(&self.model, s2)
        } else {
            let tr = self.view.translate();
            let x0 = (tr.x - bounds.origin.x / s + border / s2 + margin / 2.0).floor();
            let y0 = (tr.y - bounds.origin.y / s + border / s2 + margin / 2.0).floor();
            self.view.scale_and_translate(&self.model, s2, x0, y0)
        };
        if changed && previous != self.view.scale() {
            self.fire(GraphEvent::Scale {
                scale: self.view.scale(),
                previous,
            });
        }
        self.view.scale()
    }

    /// Rounds `value` to the grid when the grid is enabled.
    pub fn snap(&self, value: f64) -> f64 {
        self.config.snap(value)
    }

    pub fn graph_bounds(&self) -> Rect {
        self.view.graph_bounds()
    }
}
