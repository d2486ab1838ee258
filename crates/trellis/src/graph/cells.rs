//! Inserting, removing, cloning and relabelling cells.

use super::{Graph, HashSet};
use crate::events::GraphEvent;
use serde_json::Value;
use trellis_core::geom::point;
use trellis_core::style::set_style_value;
use trellis_core::{CellId, CellKind, Geometry, Point, Result};

impl Graph {
    /// Adds a vertex with absolute geometry below `parent` (the default parent when `None`).
    #[allow(clippy::too_many_arguments)]
    pub fn insert_vertex(
        &mut self,
        parent: Option<CellId>,
        value: impl Into<Value>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        style: Option<&str>,
    ) -> Result<CellId> {
        self.insert_vertex_with_geometry(parent, value, Geometry::new(x, y, width, height), style)
    }

    pub fn insert_vertex_with_geometry(
        &mut self,
        parent: Option<CellId>,
        value: impl Into<Value>,
        geometry: Geometry,
        style: Option<&str>,
    ) -> Result<CellId> {
        let vertex = self.model.create_cell(
            CellKind::Vertex,
            value.into(),
            Some(geometry),
            style.map(str::to_string),
        );
        self.add_cells(&[vertex], parent, None, None, None)?;
        Ok(vertex)
    }

    /// Adds an edge from `source` to `target`. The edge geometry is relative so its label is
    /// placed along the path.
    pub fn insert_edge(
        &mut self,
        parent: Option<CellId>,
        value: impl Into<Value>,
        source: Option<CellId>,
        target: Option<CellId>,
        style: Option<&str>,
    ) -> Result<CellId> {
        let edge = self.model.create_cell(
            CellKind::Edge,
            value.into(),
            Some(Geometry::default().with_relative(true)),
            style.map(str::to_string),
        );
        self.add_cells(&[edge], parent, None, source, target)?;
        Ok(edge)
    }

    /// Adds (or moves) `cells` into `parent` at `index`, connecting them to `source` and
    /// `target` when given.
    pub fn add_cells(
        &mut self,
        cells: &[CellId],
        parent: Option<CellId>,
        index: Option<usize>,
        source: Option<CellId>,
        target: Option<CellId>,
    ) -> Result<Vec<CellId>> {
        let parent = parent.unwrap_or_else(|| self.default_parent());
        let index = index.unwrap_or_else(|| self.model.child_count(parent));
        self.batch_update(|g| {
            g.cells_added(cells, parent, index, source, target, false, true, true)
        })?;
        Ok(cells.to_vec())
    }

    /// With `absolute`, cells coming from another parent keep their on-screen position.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn cells_added(
        &mut self,
        cells: &[CellId],
        parent: CellId,
        index: usize,
        source: Option<CellId>,
        target: Option<CellId>,
        absolute: bool,
        constrain: bool,
        extend: bool,
    ) -> Result<()> {
        if cells.is_empty() {
            return Ok(());
        }
        self.batch_update(|g| {
            let parent_origin = if absolute {
                g.view.get_state(parent).map(|s| s.origin)
            } else {
                None
            };
            let mut index = index as isize;
            for (i, &cell) in cells.iter().enumerate() {
                let previous = g.model.parent(cell);

                if let Some(o1) = parent_origin {
                    if cell != parent && Some(parent) != previous {
                        let o2 = previous
                            .and_then(|p| g.view.get_state(p))
                            .map_or(Point::zero(), |s| s.origin);
                        if let Some(geo) = g.model.geometry(cell).cloned() {
                            let mut geo = geo.translated(o2.x - o1.x, o2.y - o1.y);
                            if !geo.relative
                                && g.model.is_vertex(cell)
                                && !g.config.allow_negative_coordinates
                            {
                                geo.x = geo.x.max(0.0);
                                geo.y = geo.y.max(0.0);
                            }
                            g.model.set_geometry(cell, Some(geo))?;
                        }
                    }
                }

                // Following indices shift down once the cell leaves its slot in the same parent.
                if Some(parent) == previous
                    && index + i as isize > g.model.child_count(parent) as isize
                {
                    index -= 1;
                }
                g.model.add(parent, cell, Some((index + i as isize).max(0) as usize))?;

                if extend && g.config.extend_parents_on_add && g.is_extend_parent(cell) {
                    g.extend_parent(cell)?;
                }
                if constrain {
                    g.constrain_child(cell)?;
                }
                if let Some(s) = source {
                    g.cell_connected(cell, Some(s), true, None)?;
                }
                if let Some(t) = target {
                    g.cell_connected(cell, Some(t), false, None)?;
                }
            }
            g.fire(GraphEvent::CellsAdded {
                cells: cells.to_vec(),
                parent,
                index: index.max(0) as usize,
                source,
                target,
            });
            Ok(())
        })
    }

    /// Removes the deletable cells among `cells`. With `include_edges` every connected edge goes
    /// too; otherwise connected edges without a state are removed as they could not be
    /// disconnected. Returns the removed cells.
    pub fn remove_cells(&mut self, cells: &[CellId], include_edges: bool) -> Result<Vec<CellId>> {
        let cells = if include_edges {
            let all = self.add_all_edges(cells);
            self.deletable_cells(&all)
        } else {
            let mut cells = cells.to_vec();
            let mut seen: HashSet<CellId> = cells.iter().copied().collect();
            let edges = self.model.all_edges(&cells);
            for edge in self.deletable_cells(&edges) {
                if self.view.get_state(edge).is_none() && seen.insert(edge) {
                    cells.push(edge);
                }
            }
            cells
        };
        self.batch_update(|g| g.cells_removed(&cells))?;
        Ok(cells)
    }

    /// `cells` followed by every edge connected to them or their descendants.
    pub fn add_all_edges(&self, cells: &[CellId]) -> Vec<CellId> {
        let mut out = cells.to_vec();
        let mut seen: HashSet<CellId> = cells.iter().copied().collect();
        for edge in self.model.all_edges(cells) {
            if seen.insert(edge) {
                out.push(edge);
            }
        }
        out
    }

    /// Detaches `cells`. Edges that stay behind lose the removed terminal and keep its last
    /// on-screen position as a terminal point.
    pub(crate) fn cells_removed(&mut self, cells: &[CellId]) -> Result<()> {
        if cells.is_empty() {
            return Ok(());
        }
        let scale = self.view.scale();
        let tr = self.view.translate();
        self.batch_update(|g| {
            let mut done: HashSet<CellId> = cells.iter().copied().collect();
            for &cell in cells {
                for edge in g.model.all_edges(&[cell]) {
                    if !done.insert(edge) {
                        continue;
                    }
                    for source in [true, false] {
                        g.disconnect_removed_terminal(edge, cell, source, scale, tr)?;
                    }
                }
                g.model.remove(cell)?;
            }
            g.fire(GraphEvent::CellsRemoved {
                cells: cells.to_vec(),
            });
            Ok(())
        })
    }

    fn disconnect_removed_terminal(
        &mut self,
        edge: CellId,
        removed: CellId,
        source: bool,
        scale: f64,
        tr: Point,
    ) -> Result<()> {
        let Some(geo) = self.model.geometry(edge).cloned() else {
            return Ok(());
        };
        let Some(terminal) = self.model.terminal(edge, source) else {
            return Ok(());
        };
        if terminal != removed && !self.model.is_ancestor(removed, terminal) {
            return Ok(());
        }
        let mut geo = geo;
        let state = self.view.get_state(edge);
        let end = state.and_then(|s| if source { s.first_point() } else { s.last_point() });
        if let (Some(state), Some(pt)) = (state, end) {
            geo.set_terminal_point(
                Some(point(
                    pt.x / scale - tr.x - state.origin.x,
                    pt.y / scale - tr.y - state.origin.y,
                )),
                source,
            );
        } else if let Some(ts) = self.view.get_state(terminal) {
            geo.set_terminal_point(
                Some(point(ts.center_x() / scale - tr.x, ts.center_y() / scale - tr.y)),
                source,
            );
        }
        self.model.set_geometry(edge, Some(geo))?;
        self.model.set_terminal(edge, None, source)
    }

    /// Deep-copies `cells` and places the copies in the coordinate space of the default parent
    /// (unless `keep_position`). Edges whose terminals are not copied keep their current end
    /// points. Without `allow_invalid_edges`, copies of edges that fail validation are dropped.
    pub fn clone_cells(
        &mut self,
        cells: &[CellId],
        allow_invalid_edges: bool,
        keep_position: bool,
    ) -> Result<Vec<CellId>> {
        Ok(self
            .clone_cell_pairs(cells, allow_invalid_edges, keep_position)?
            .into_iter()
            .map(|(_, clone)| clone)
            .collect())
    }

    pub(crate) fn clone_cell_pairs(
        &mut self,
        cells: &[CellId],
        allow_invalid_edges: bool,
        keep_position: bool,
    ) -> Result<Vec<(CellId, CellId)>> {
        let cells: Vec<CellId> = cells
            .iter()
            .copied()
            .filter(|&c| self.model.has_cell(c))
            .collect();
        if cells.is_empty() {
            return Ok(Vec::new());
        }
        let lookup: HashSet<CellId> = cells.iter().copied().collect();
        let scale = self.view.scale();
        let tr = self.view.translate();
        let clones = self.model.clone_cells(&cells, true);

        self.batch_update(|g| {
            let mut out = Vec::with_capacity(cells.len());
            for (&cell, &clone) in cells.iter().zip(&clones) {
                if !allow_invalid_edges
                    && g.model.is_edge(clone)
                    && g.edge_validation_error(
                        Some(clone),
                        g.model.terminal(clone, true),
                        g.model.terminal(clone, false),
                    )
                    .is_some()
                {
                    continue;
                }
                let geo = g.model.geometry(clone).cloned();
                let state = g.view.get_state(cell);
                let pstate = g.model.parent(cell).and_then(|p| g.view.get_state(p));
                if let (Some(mut geo), Some(state), Some(pstate)) = (geo, state, pstate) {
                    let (dx, dy) = if keep_position {
                        (0.0, 0.0)
                    } else {
                        (pstate.origin.x, pstate.origin.y)
                    };
                    if g.model.is_edge(clone) {
                        if !state.absolute_points.is_empty() {
                            for source in [true, false] {
                                let copied = g
                                    .model
                                    .terminal(cell, source)
                                    .is_some_and(|t| g.has_ancestor_in(t, &lookup));
                                let end = if source {
                                    state.first_point()
                                } else {
                                    state.last_point()
                                };
                                if let (false, Some(pt)) = (copied, end) {
                                    geo.set_terminal_point(
                                        Some(point(pt.x / scale - tr.x, pt.y / scale - tr.y)),
                                        source,
                                    );
                                }
                            }
                            for p in &mut geo.points {
                                p.x += dx;
                                p.y += dy;
                            }
                        }
                    } else {
                        geo.translate(dx, dy);
                    }
                    g.model.set_geometry(clone, Some(geo))?;
                }
                out.push((cell, clone));
            }
            Ok(out)
        })
    }

    /// Whether `cell` or one of its ancestors is in `cells`.
    pub(crate) fn has_ancestor_in(&self, cell: CellId, cells: &HashSet<CellId>) -> bool {
        let mut current = Some(cell);
        while let Some(c) = current {
            if cells.contains(&c) {
                return true;
            }
            current = self.model.parent(c);
        }
        false
    }

    /// Shows or hides `cells` (and with `include_edges` their connected edges).
    pub fn toggle_cells(
        &mut self,
        show: bool,
        cells: &[CellId],
        include_edges: bool,
    ) -> Result<Vec<CellId>> {
        let cells = if include_edges {
            self.add_all_edges(cells)
        } else {
            cells.to_vec()
        };
        self.batch_update(|g| {
            for &cell in &cells {
                g.model.set_visible(cell, show)?;
            }
            g.fire(GraphEvent::CellsToggled {
                cells: cells.clone(),
                show,
            });
            Ok(())
        })?;
        Ok(cells)
    }

    pub fn label_changed(&mut self, cell: CellId, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.batch_update(|g| {
            let previous = g.model.value(cell).cloned().unwrap_or(Value::Null);
            g.model.set_value(cell, value.clone())?;
            g.fire(GraphEvent::LabelChanged {
                cell,
                value,
                previous,
            });
            Ok(())
        })
    }

    /// Sets (or with `None` removes) one style key on every cell.
    pub fn set_cell_styles(&mut self, key: &str, value: Option<&str>, cells: &[CellId]) -> Result<()> {
        self.batch_update(|g| {
            for &cell in cells {
                let style = set_style_value(g.model.style(cell), key, value)?;
                g.model.set_style(cell, style)?;
            }
            Ok(())
        })
    }
}
