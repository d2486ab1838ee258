//! Folding, grouping and z-ordering.

use super::Graph;
use crate::events::GraphEvent;
use trellis_core::geom::{self, rect};
use trellis_core::{CellId, CellKind, Geometry, Rect, Result};

impl Graph {
    /// Collapses (or expands) `cells`. With `check_foldable` cells that are not foldable are
    /// skipped. Returns the cells passed in.
    pub fn fold_cells(
        &mut self,
        collapse: bool,
        recurse: bool,
        cells: &[CellId],
        check_foldable: bool,
    ) -> Result<Vec<CellId>> {
        self.batch_update(|g| g.cells_folded(cells, collapse, recurse, check_foldable))?;
        Ok(cells.to_vec())
    }

    fn cells_folded(
        &mut self,
        cells: &[CellId],
        collapse: bool,
        recurse: bool,
        check_foldable: bool,
    ) -> Result<()> {
        if cells.is_empty() {
            return Ok(());
        }
        self.batch_update(|g| {
            for &cell in cells {
                if check_foldable && !g.is_cell_foldable(cell, collapse) {
                    continue;
                }
                if collapse == g.model.is_collapsed(cell) {
                    continue;
                }
                g.model.set_collapsed(cell, collapse)?;
                g.swap_bounds(cell)?;
                if g.is_extend_parent(cell) {
                    g.extend_parent(cell)?;
                }
                if recurse {
                    let children = g.model.children(cell).to_vec();
                    g.cells_folded(&children, collapse, recurse, false)?;
                }
                g.constrain_child(cell)?;
            }
            g.fire(GraphEvent::CellsFolded {
                cells: cells.to_vec(),
                collapse,
                recurse,
            });
            Ok(())
        })
    }

    /// Exchanges the geometry of `cell` with its alternate bounds.
    pub fn swap_bounds(&mut self, cell: CellId) -> Result<()> {
        let Some(mut geo) = self.model.geometry(cell).cloned() else {
            return Ok(());
        };
        self.update_alternate_bounds(cell, &mut geo);
        geo.swap();
        self.model.set_geometry(cell, Some(geo))
    }

    /// Creates the alternate bounds on first use (preferred size or the current size) and moves
    /// them to the geometry's position, compensating for rotation around the center.
    pub fn update_alternate_bounds(&self, cell: CellId, geo: &mut Geometry) {
        let style = self.cell_style(cell);
        if geo.alternate_bounds.is_none() {
            let (mut w, mut h) = (geo.width, geo.height);
            if self.config.collapse_to_preferred_size {
                if let Some((pw, ph)) = self.policy.preferred_size(self, cell) {
                    w = pw;
                    h = ph;
                    if style.start_size > 0.0 {
                        h = h.max(style.start_size);
                    }
                }
            }
            geo.alternate_bounds = Some(rect(0.0, 0.0, w, h));
        }
        if let Some(mut alt) = geo.alternate_bounds {
            alt.origin.x = geo.x;
            alt.origin.y = geo.y;
            let alpha = geom::to_radians(style.rotation);
            if alpha != 0.0 {
                let dx = alt.origin.x + alt.size.width / 2.0 - geo.center().x;
                let dy = alt.origin.y + alt.size.height / 2.0 - geo.center().y;
                let (cos, sin) = (alpha.cos(), alpha.sin());
                let dx2 = cos * dx - sin * dy;
                let dy2 = sin * dx + cos * dy;
                alt.origin.x += dx2 - dx;
                alt.origin.y += dy2 - dy;
            }
            geo.alternate_bounds = Some(alt);
        }
    }

    /// Puts `cells` into `group` (a new empty, non-connectable vertex when `None`) sized to their
    /// bounds plus `border`. Only cells sharing the first cell's parent are grouped, and nothing
    /// happens for fewer than two. Returns the group, or the given `group` unchanged when
    /// nothing was grouped.
    pub fn group_cells(
        &mut self,
        group: Option<CellId>,
        border: f64,
        cells: &[CellId],
    ) -> Result<Option<CellId>> {
        let cells = self.cells_for_group(cells);
        if cells.len() < 2 {
            return Ok(group);
        }
        let Some(bounds) = self.bounds_for_group(group, &cells, border) else {
            return Ok(group);
        };
        let group = match group {
            Some(g) => g,
            None => self.create_group_cell()?,
        };
        let parent = self
            .model
            .parent(group)
            .or_else(|| self.model.parent(cells[0]))
            .unwrap_or_else(|| self.default_parent());

        self.batch_update(|g| {
            if g.model.geometry(group).is_none() {
                g.model.set_geometry(group, Some(Geometry::default()))?;
            }
            let index = g.model.child_count(parent);
            g.cells_added(&[group], parent, index, None, None, false, false, false)?;
            let index = g.model.child_count(group);
            g.cells_added(&cells, group, index, None, None, false, false, false)?;
            g.cells_moved(&cells, -bounds.origin.x, -bounds.origin.y, false, false, false)?;
            g.cells_resized(&[group], &[bounds], false)?;
            g.fire(GraphEvent::GroupCells {
                group,
                cells: cells.clone(),
                border,
            });
            Ok(())
        })?;
        Ok(Some(group))
    }

    /// The first cell and every later cell with the same parent.
    pub fn cells_for_group(&self, cells: &[CellId]) -> Vec<CellId> {
        let Some(&first) = cells.first() else {
            return Vec::new();
        };
        let parent = self.model.parent(first);
        std::iter::once(first)
            .chain(cells[1..].iter().copied().filter(|&c| self.model.parent(c) == parent))
            .collect()
    }

    fn create_group_cell(&mut self) -> Result<CellId> {
        let group = self.model.create_cell(
            CellKind::Vertex,
            serde_json::Value::String(String::new()),
            None,
            None,
        );
        self.model.set_connectable(group, false)?;
        Ok(group)
    }

    /// Bounds of `children` grown by `border` (and by the start size of a swimlane group).
    pub fn bounds_for_group(
        &self,
        group: Option<CellId>,
        children: &[CellId],
        border: f64,
    ) -> Option<Rect> {
        let mut result = self.bounding_box_from_geometry(children, true)?;
        if let Some(group) = group.filter(|&g| self.is_swimlane(g)) {
            let size = self.cell_style(group).start_size;
            result.origin.y -= size;
            result.size.height += size;
        }
        Some(rect(
            result.origin.x - border,
            result.origin.y - border,
            result.size.width + 2.0 * border,
            result.size.height + 2.0 * border,
        ))
    }

    /// Moves the children of `cells` into the cells' parents (keeping their on-screen position)
    /// and removes the emptied groups. Returns the moved children.
    pub fn ungroup_cells(&mut self, cells: &[CellId]) -> Result<Vec<CellId>> {
        if cells.is_empty() {
            return Ok(Vec::new());
        }
        let mut result = Vec::new();
        self.batch_update(|g| {
            for &cell in cells {
                let children = g.model.children(cell).to_vec();
                if children.is_empty() {
                    continue;
                }
                let Some(parent) = g.model.parent(cell) else {
                    continue;
                };
                let index = g.model.child_count(parent);
                g.cells_added(&children, parent, index, None, None, true, false, true)?;
                for &child in &children {
                    let origin = g.view.get_state(child).map(|s| s.origin);
                    let geo = g.model.geometry(child).filter(|geo| geo.relative).cloned();
                    if let (Some(origin), Some(mut geo)) = (origin, geo) {
                        geo.x = origin.x;
                        geo.y = origin.y;
                        geo.relative = false;
                        g.model.set_geometry(child, Some(geo))?;
                    }
                }
                result.extend(children);
            }
            let removed = g.add_all_edges(cells);
            g.cells_removed(&removed)?;
            g.fire(GraphEvent::UngroupCells {
                cells: cells.to_vec(),
            });
            Ok(())
        })?;
        Ok(result)
    }

    /// Moves `cells` into the default parent, keeping their on-screen position.
    pub fn remove_cells_from_parent(&mut self, cells: &[CellId]) -> Result<Vec<CellId>> {
        self.batch_update(|g| {
            let parent = g.default_parent();
            let index = g.model.child_count(parent);
            g.cells_added(cells, parent, index, None, None, true, false, true)?;
            g.fire(GraphEvent::RemoveCellsFromParent {
                cells: cells.to_vec(),
            });
            Ok(())
        })?;
        Ok(cells.to_vec())
    }

    /// Moves `cells` to the back (the start of their parent's children, in the given order) or
    /// to the front.
    pub fn order_cells(&mut self, back: bool, cells: &[CellId]) -> Result<Vec<CellId>> {
        self.batch_update(|g| {
            for (i, &cell) in cells.iter().enumerate() {
                let Some(parent) = g.model.parent(cell) else {
                    continue;
                };
                let index = if back {
                    i
                } else {
                    g.model.child_count(parent).saturating_sub(1)
                };
                g.model.add(parent, cell, Some(index))?;
            }
            g.fire(GraphEvent::CellsOrdered {
                cells: cells.to_vec(),
                back,
            });
            Ok(())
        })?;
        Ok(cells.to_vec())
    }
}
