//! Moving, resizing and aligning cells, plus the parent-extension and child-containment rules
//! that run inside the same transaction.

use super::{Graph, HashSet};
use crate::events::GraphEvent;
use trellis_core::geom::{self, point, rect};
use trellis_core::{CellId, Geometry, Rect, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

impl Graph {
    /// Moves `cells` by `(dx, dy)`. With `clone` the copies are moved instead; with `target` the
    /// cells are reparented into it keeping their on-screen position. Returns the moved cells.
    pub fn move_cells(
        &mut self,
        cells: &[CellId],
        dx: f64,
        dy: f64,
        clone: bool,
        target: Option<CellId>,
    ) -> Result<Vec<CellId>> {
        if dx == 0.0 && dy == 0.0 && !clone && target.is_none() {
            return Ok(cells.to_vec());
        }
        let cells = self.model.topmost_cells(cells);
        self.batch_update(|g| {
            let lookup: HashSet<CellId> = cells.iter().copied().collect();
            // Labels of edges whose terminals move along follow the edge on their own.
            let checked: Vec<CellId> = cells
                .iter()
                .copied()
                .filter(|&cell| {
                    let relative = g.model.geometry(cell).is_some_and(|geo| geo.relative);
                    let Some(parent) = g.model.parent(cell) else {
                        return true;
                    };
                    !relative
                        || !g.model.is_edge(parent)
                        || (!g.terminal_in(parent, true, &lookup)
                            && !g.terminal_in(parent, false, &lookup))
                })
                .collect();

            let (moved, origins, target) = if clone {
                let pairs = g.clone_cell_pairs(&checked, g.config.clone_invalid_edges, false)?;
                let origins: Vec<CellId> = pairs.iter().map(|&(o, _)| o).collect();
                let moved: Vec<CellId> = pairs.iter().map(|&(_, c)| c).collect();
                (moved, origins, Some(target.unwrap_or_else(|| g.default_parent())))
            } else {
                (checked.clone(), checked, target)
            };

            // Negative coordinates are allowed until the cells land in the target.
            let allow_negative = g.config.allow_negative_coordinates;
            if target.is_some() {
                g.config.allow_negative_coordinates = true;
            }
            let disconnect = !clone && g.config.disconnect_on_move && g.config.allow_dangling_edges;
            let extend = g.config.extend_parents_on_move && target.is_none();
            let moved_result = g.cells_moved(&moved, dx, dy, disconnect, target.is_none(), extend);
            g.config.allow_negative_coordinates = allow_negative;
            moved_result?;

            if let Some(target) = target {
                let index = g.model.child_count(target);
                g.cells_added(&moved, target, index, None, None, true, true, true)?;
                if clone {
                    // Copied edge labels go back onto the original edge.
                    for (&copy, &orig) in moved.iter().zip(&origins) {
                        let relative = g.model.geometry(copy).is_some_and(|geo| geo.relative);
                        if let Some(parent) = g.model.parent(orig) {
                            if relative && g.model.is_edge(parent) && g.model.contains(parent) {
                                g.model.add(parent, copy, None)?;
                            }
                        }
                    }
                }
            }

            g.fire(GraphEvent::MoveCells {
                cells: moved.clone(),
                dx,
                dy,
                clone,
                target,
            });
            Ok(moved)
        })
    }

    fn terminal_in(&self, edge: CellId, source: bool, cells: &HashSet<CellId>) -> bool {
        self.model
            .terminal(edge, source)
            .is_some_and(|t| self.has_ancestor_in(t, cells))
    }

    pub(crate) fn cells_moved(
        &mut self,
        cells: &[CellId],
        dx: f64,
        dy: f64,
        disconnect: bool,
        constrain: bool,
        extend: bool,
    ) -> Result<()> {
        if cells.is_empty() || (dx == 0.0 && dy == 0.0) {
            return Ok(());
        }
        self.batch_update(|g| {
            if disconnect {
                g.disconnect_graph(cells)?;
            }
            for &cell in cells {
                g.translate_cell(cell, dx, dy)?;
                if extend && g.is_extend_parent(cell) {
                    g.extend_parent(cell)?;
                } else if constrain {
                    g.constrain_child(cell)?;
                }
            }
            if g.config.reset_edges_on_move {
                g.reset_edges(cells)?;
            }
            g.fire(GraphEvent::CellsMoved {
                cells: cells.to_vec(),
                dx,
                dy,
                disconnect,
            });
            Ok(())
        })
    }

    /// Translates the geometry of `cell`. Relative vertices move through their offset, rotated
    /// into the frame of a rotated parent.
    pub fn translate_cell(&mut self, cell: CellId, dx: f64, dy: f64) -> Result<()> {
        let Some(mut geo) = self.model.geometry(cell).cloned() else {
            return Ok(());
        };
        geo.translate(dx, dy);
        if !geo.relative && self.model.is_vertex(cell) && !self.config.allow_negative_coordinates {
            geo.x = geo.x.max(0.0);
            geo.y = geo.y.max(0.0);
        }
        if geo.relative && !self.model.is_edge(cell) {
            let angle = match self.model.parent(cell) {
                Some(p) if self.model.is_vertex(p) => self.cell_style(p).rotation,
                _ => 0.0,
            };
            let (mut dx, mut dy) = (dx, dy);
            if angle != 0.0 {
                let rad = geom::to_radians(-angle);
                let pt = geom::rotated_point(point(dx, dy), rad.cos(), rad.sin(), point(0.0, 0.0));
                dx = pt.x;
                dy = pt.y;
            }
            let offset = geo.offset.unwrap_or(point(0.0, 0.0));
            geo.offset = Some(point(offset.x + dx, offset.y + dy));
        }
        self.model.set_geometry(cell, Some(geo))
    }

    /// Whether `cell` grows its parent when it no longer fits.
    pub fn is_extend_parent(&self, cell: CellId) -> bool {
        !self.model.is_edge(cell) && self.config.extend_parents
    }

    /// Grows the parent of `cell` so the child fits. Collapsed parents are left alone.
    pub fn extend_parent(&mut self, cell: CellId) -> Result<()> {
        let Some(parent) = self.model.parent(cell) else {
            return Ok(());
        };
        let Some(p) = self.model.geometry(parent).cloned() else {
            return Ok(());
        };
        if self.model.is_collapsed(parent) {
            return Ok(());
        }
        let Some(geo) = self.model.geometry(cell) else {
            return Ok(());
        };
        if !geo.relative && (p.width < geo.x + geo.width || p.height < geo.y + geo.height) {
            let width = p.width.max(geo.x + geo.width);
            let height = p.height.max(geo.y + geo.height);
            self.cells_resized(&[parent], &[rect(p.x, p.y, width, height)], false)?;
        }
        Ok(())
    }

    /// Area a child of `cell`'s parent must stay in, in the parent's coordinates. `None` for
    /// edges and for children of the default parent.
    pub fn cell_containment_area(&self, cell: CellId) -> Option<Rect> {
        if self.model.is_edge(cell) {
            return None;
        }
        let parent = self.model.parent(cell)?;
        if parent == self.default_parent() {
            return None;
        }
        let g = self.model.geometry(parent)?;
        let mut area = rect(0.0, 0.0, g.width, g.height);
        if self.is_swimlane(parent) {
            let size = self.cell_style(parent).start_size;
            area.origin.y = size;
            area.size.height = (g.height - size).max(0.0);
        }
        Some(area)
    }

    /// Keeps `cell` (and its visible descendants) inside its containment area, shrinking it
    /// first when it is larger than the area.
    pub fn constrain_child(&mut self, cell: CellId) -> Result<()> {
        let Some(geo) = self.model.geometry(cell).cloned() else {
            return Ok(());
        };
        if geo.relative && !self.config.constrain_relative_children {
            return Ok(());
        }
        if !self.is_constrain_child(cell) {
            return Ok(());
        }
        let Some(mut max) = self.cell_containment_area(cell) else {
            return Ok(());
        };
        let overlap = if self.config.allow_overlap_parent {
            self.cell_style(cell).overlap
        } else {
            0.0
        };
        if overlap > 0.0 {
            max = rect(
                max.origin.x - max.size.width * overlap,
                max.origin.y - max.size.height * overlap,
                max.size.width * (1.0 + 2.0 * overlap),
                max.size.height * (1.0 + 2.0 * overlap),
            );
        }

        let mut cells = vec![cell];
        if !self.model.is_collapsed(cell) {
            cells.extend(
                self.model
                    .descendants(cell)
                    .into_iter()
                    .skip(1)
                    .filter(|&d| self.model.is_visible(d)),
            );
        }
        let Some(bbox) = self.bounding_box_from_geometry(&cells, false) else {
            return Ok(());
        };

        let (mx, my, mw, mh) = (max.origin.x, max.origin.y, max.size.width, max.size.height);
        let (bx, by, bw, bh) = (bbox.origin.x, bbox.origin.y, bbox.size.width, bbox.size.height);
        let mut geo = geo;

        let mut dx = 0.0;
        if geo.width > mw {
            dx = geo.width - mw;
            geo.width -= dx;
        }
        if bx + bw > mx + mw {
            dx -= bx + bw - mx - mw - dx;
        }
        let mut dy = 0.0;
        if geo.height > mh {
            dy = geo.height - mh;
            geo.height -= dy;
        }
        if by + bh > my + mh {
            dy -= by + bh - my - mh - dy;
        }
        if bx < mx {
            dx -= bx - mx;
        }
        if by < my {
            dy -= by - my;
        }

        if dx != 0.0 || dy != 0.0 {
            if geo.relative {
                let offset = geo.offset.unwrap_or(point(0.0, 0.0));
                geo.offset = Some(point(offset.x + dx, offset.y + dy));
            } else {
                geo.x += dx;
                geo.y += dy;
            }
        }
        self.model.set_geometry(cell, Some(geo))
    }

    pub fn is_constrain_child(&self, cell: CellId) -> bool {
        self.config.constrain_children
            && self
                .model
                .parent(cell)
                .is_some_and(|p| !self.model.is_edge(p))
    }

    fn constrain_child_cells(&mut self, cell: CellId) -> Result<()> {
        for child in self.model.children(cell).to_vec() {
            self.constrain_child(child)?;
        }
        Ok(())
    }

    /// Bounds of `cells` computed from their geometries alone, in the coordinates of their
    /// common parent. Children are offset by their parent when the parent is in `cells` too.
    pub fn bounding_box_from_geometry(&self, cells: &[CellId], include_edges: bool) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        for &cell in cells {
            if !include_edges && !self.model.is_vertex(cell) {
                continue;
            }
            let Some(geo) = self.model.geometry(cell) else {
                continue;
            };
            let bbox = if self.model.is_edge(cell) {
                self.edge_geometry_bounds(cell, geo)
            } else {
                self.vertex_geometry_bounds(cell, geo, cells)
            };
            if let Some(b) = bbox {
                result = Some(match result {
                    Some(r) => geom::add_rect(&r, &b),
                    None => b,
                });
            }
        }
        result
    }

    fn edge_geometry_bounds(&self, edge: CellId, geo: &Geometry) -> Option<Rect> {
        let mut out: Option<Rect> = None;
        let mut add = |x: f64, y: f64| {
            let r = rect(x, y, 0.0, 0.0);
            out = Some(match out {
                Some(o) => geom::add_rect(&o, &r),
                None => r,
            });
        };
        for source in [true, false] {
            if self.model.terminal(edge, source).is_none() {
                if let Some(p) = geo.terminal_point(source) {
                    add(p.x, p.y);
                }
            }
        }
        for p in &geo.points {
            add(p.x, p.y);
        }
        out
    }

    fn vertex_geometry_bounds(&self, cell: CellId, geo: &Geometry, cells: &[CellId]) -> Option<Rect> {
        let parent = self.model.parent(cell);
        let parent_vertex = parent.filter(|&p| self.model.is_vertex(p));
        let mut bbox = if geo.relative {
            let p = parent_vertex.filter(|&p| Some(p) != self.view.current_root())?;
            let pb = self.bounding_box_from_geometry(&[p], false)?;
            let mut b = rect(
                geo.x * pb.size.width,
                geo.y * pb.size.height,
                geo.width,
                geo.height,
            );
            if cells.contains(&p) {
                b.origin.x += pb.origin.x;
                b.origin.y += pb.origin.y;
            }
            b
        } else {
            let mut b = geo.bounds();
            if let Some(p) = parent_vertex.filter(|p| cells.contains(p)) {
                if let Some(pb) = self.bounding_box_from_geometry(&[p], false) {
                    b.origin.x += pb.origin.x;
                    b.origin.y += pb.origin.y;
                }
            }
            b
        };
        if let Some(offset) = geo.offset {
            bbox.origin.x += offset.x;
            bbox.origin.y += offset.y;
        }
        let angle = self.cell_style(cell).rotation;
        if angle != 0.0 {
            bbox = geom::rotated_bounds(&bbox, angle);
        }
        Some(bbox)
    }

    /// Resizes `cells` to `bounds` (pairwise). Mismatched lengths are a no-op. Returns the
    /// previous geometries.
    pub fn resize_cells(&mut self, cells: &[CellId], bounds: &[Rect]) -> Result<Vec<Option<Geometry>>> {
        let recurse = self.config.recursive_resize;
        self.batch_update(|g| g.cells_resized(cells, bounds, recurse))
    }

    pub(crate) fn cells_resized(
        &mut self,
        cells: &[CellId],
        bounds: &[Rect],
        recurse: bool,
    ) -> Result<Vec<Option<Geometry>>> {
        if cells.len() != bounds.len() {
            tracing::warn!(
                cells = cells.len(),
                bounds = bounds.len(),
                "ignoring resize with mismatched bounds"
            );
            return Ok(Vec::new());
        }
        self.batch_update(|g| {
            let mut previous = Vec::with_capacity(cells.len());
            for (&cell, b) in cells.iter().zip(bounds) {
                previous.push(g.cell_resized(cell, b, false, recurse)?);
                // Parents grow before the child is clamped.
                if g.is_extend_parent(cell) {
                    g.extend_parent(cell)?;
                }
                g.constrain_child(cell)?;
            }
            if g.config.reset_edges_on_resize {
                g.reset_edges(cells)?;
            }
            g.fire(GraphEvent::CellsResized {
                cells: cells.to_vec(),
                bounds: bounds.to_vec(),
            });
            Ok(previous)
        })
    }

    fn cell_resized(
        &mut self,
        cell: CellId,
        bounds: &Rect,
        ignore_relative: bool,
        recurse: bool,
    ) -> Result<Option<Geometry>> {
        let previous = self.model.geometry(cell).cloned();
        let Some(prev) = previous.as_ref() else {
            return Ok(None);
        };
        if prev.bounds() == *bounds {
            return Ok(previous);
        }
        let mut geo = prev.clone();
        if !ignore_relative && geo.relative {
            if let Some(offset) = geo.offset {
                geo.offset = Some(point(
                    offset.x + bounds.origin.x - geo.x,
                    offset.y + bounds.origin.y - geo.y,
                ));
            }
        } else {
            geo.x = bounds.origin.x;
            geo.y = bounds.origin.y;
        }
        geo.width = bounds.size.width;
        geo.height = bounds.size.height;
        if !geo.relative && self.model.is_vertex(cell) && !self.config.allow_negative_coordinates {
            geo.x = geo.x.max(0.0);
            geo.y = geo.y.max(0.0);
        }
        self.batch_update(|g| {
            if recurse {
                g.resize_child_cells(cell, &geo)?;
            }
            g.model.set_geometry(cell, Some(geo))?;
            g.constrain_child_cells(cell)
        })?;
        Ok(previous)
    }

    fn resize_child_cells(&mut self, cell: CellId, new_geo: &Geometry) -> Result<()> {
        let Some(geo) = self.model.geometry(cell) else {
            return Ok(());
        };
        let sx = if geo.width != 0.0 { new_geo.width / geo.width } else { 1.0 };
        let sy = if geo.height != 0.0 { new_geo.height / geo.height } else { 1.0 };
        for child in self.model.children(cell).to_vec() {
            self.scale_cell(child, sx, sy, true)?;
        }
        Ok(())
    }

    /// Scales the geometry of `cell`, honouring its aspect, resize and movable flags.
    pub fn scale_cell(&mut self, cell: CellId, sx: f64, sy: f64, recurse: bool) -> Result<()> {
        let Some(original) = self.model.geometry(cell).cloned() else {
            return Ok(());
        };
        let style = self.cell_style(cell).into_owned();
        let mut geo = original.clone();
        geo.scale(sx, sy, style.aspect_fixed);
        match style.resize_width {
            Some(true) => geo.width = original.width * sx,
            Some(false) => geo.width = original.width,
            None => {}
        }
        match style.resize_height {
            Some(true) => geo.height = original.height * sy,
            Some(false) => geo.height = original.height,
            None => {}
        }
        if !self.is_cell_movable(cell) {
            geo.x = original.x;
            geo.y = original.y;
        }
        if !self.is_cell_resizable(cell) {
            geo.width = original.width;
            geo.height = original.height;
        }
        if self.model.is_vertex(cell) {
            self.cell_resized(cell, &geo.bounds(), true, recurse)?;
        } else {
            self.model.set_geometry(cell, Some(geo))?;
        }
        Ok(())
    }

    /// Aligns the non-edge `cells` on `param` or, when `None`, on the extreme coordinate of their
    /// current states.
    pub fn align_cells(&mut self, align: Align, cells: &[CellId], param: Option<f64>) -> Result<Vec<CellId>> {
        if cells.len() < 2 {
            return Ok(cells.to_vec());
        }
        let param = param.or_else(|| self.align_param(align, cells));
        let Some(param) = param else {
            return Ok(cells.to_vec());
        };
        let s = self.view.scale();
        self.batch_update(|g| {
            for &cell in cells {
                if g.model.is_edge(cell) {
                    continue;
                }
                let Some(state) = g.view.get_state(cell) else {
                    continue;
                };
                let Some(mut geo) = g.model.geometry(cell).cloned() else {
                    continue;
                };
                match align {
                    Align::Left => geo.x += (param - state.x) / s,
                    Align::Center => geo.x += (param - state.x - state.width / 2.0) / s,
                    Align::Right => geo.x += (param - state.x - state.width) / s,
                    Align::Top => geo.y += (param - state.y) / s,
                    Align::Middle => geo.y += (param - state.y - state.height / 2.0) / s,
                    Align::Bottom => geo.y += (param - state.y - state.height) / s,
                }
                g.model.set_geometry(cell, Some(geo))?;
            }
            g.fire(GraphEvent::AlignCells {
                cells: cells.to_vec(),
                align,
            });
            Ok(())
        })?;
        Ok(cells.to_vec())
    }

    fn align_param(&self, align: Align, cells: &[CellId]) -> Option<f64> {
        let mut param: Option<f64> = None;
        for &cell in cells {
            if self.model.is_edge(cell) {
                continue;
            }
            let Some(state) = self.view.get_state(cell) else {
                continue;
            };
            let value = match align {
                // The first state decides for centered alignments.
                Align::Center => return Some(state.x + state.width / 2.0),
                Align::Middle => return Some(state.y + state.height / 2.0),
                Align::Left => state.x,
                Align::Right => state.x + state.width,
                Align::Top => state.y,
                Align::Bottom => state.y + state.height,
            };
            param = Some(match (param, align) {
                (None, _) => value,
                (Some(p), Align::Right | Align::Bottom) => p.max(value),
                (Some(p), _) => p.min(value),
            });
        }
        param
    }
}
