//! Capability predicates.
//!
//! Each predicate combines a graph-wide switch from [`trellis_core::GraphConfig`], the derived
//! lock rule ([`Graph::is_cell_locked`]) and the cell's style flag. A locked cell is never movable,
//! resizable, editable or bendable; otherwise the style flag can only switch a capability off.

use crate::Graph;
use trellis_core::CellId;

impl Graph {
    /// Locked when the graph is locked, or for vertices with relative geometry.
    pub fn is_cell_locked(&self, cell: CellId) -> bool {
        self.config.cells_locked
            || (self.model.is_vertex(cell)
                && self.model.geometry(cell).is_some_and(|g| g.relative))
    }

    pub fn is_cell_movable(&self, cell: CellId) -> bool {
        self.config.cells_movable
            && !self.is_cell_locked(cell)
            && self.cell_style(cell).movable != Some(false)
    }

    pub fn is_cell_resizable(&self, cell: CellId) -> bool {
        self.config.cells_resizable
            && !self.is_cell_locked(cell)
            && self.cell_style(cell).resizable != Some(false)
    }

    pub fn is_cell_editable(&self, cell: CellId) -> bool {
        self.config.cells_editable
            && !self.is_cell_locked(cell)
            && self.cell_style(cell).editable != Some(false)
    }

    pub fn is_cell_bendable(&self, cell: CellId) -> bool {
        self.config.cells_bendable
            && !self.is_cell_locked(cell)
            && self.cell_style(cell).bendable != Some(false)
    }

    pub fn is_cell_deletable(&self, cell: CellId) -> bool {
        self.config.cells_deletable && self.cell_style(cell).deletable != Some(false)
    }

    pub fn is_cell_cloneable(&self, cell: CellId) -> bool {
        self.config.cells_cloneable && self.cell_style(cell).cloneable != Some(false)
    }

    pub fn is_cell_selectable(&self, _cell: CellId) -> bool {
        self.config.cells_selectable
    }

    pub fn is_cell_rotatable(&self, cell: CellId) -> bool {
        self.cell_style(cell).rotatable != Some(false)
    }

    pub fn is_cell_disconnectable(&self, cell: CellId, _terminal: CellId, _source: bool) -> bool {
        self.config.cells_disconnectable && !self.is_cell_locked(cell)
    }

    /// Only cells with children can be folded.
    pub fn is_cell_foldable(&self, cell: CellId, _collapse: bool) -> bool {
        self.model.child_count(cell) > 0 && self.cell_style(cell).foldable != Some(false)
    }

    pub fn is_cell_connectable(&self, cell: CellId) -> bool {
        self.model.is_connectable(cell) && self.cell_style(cell).connectable != Some(false)
    }

    pub fn is_label_movable(&self, cell: CellId) -> bool {
        !self.is_cell_locked(cell)
            && ((self.model.is_edge(cell) && self.config.edge_labels_movable)
                || (self.model.is_vertex(cell) && self.config.vertex_labels_movable))
    }

    pub fn is_cell_collapsed(&self, cell: CellId) -> bool {
        self.model.is_collapsed(cell)
    }

    pub fn is_cell_visible(&self, cell: CellId) -> bool {
        self.model.is_visible(cell)
    }

    pub fn is_swimlane(&self, cell: CellId) -> bool {
        !self.model.is_edge(cell) && self.cell_style(cell).shape.as_deref() == Some("swimlane")
    }

    /// Built-in terminal rule: a missing terminal is valid only when dangling edges are
    /// allowed; edges are valid terminals only with connectable edges.
    pub fn is_valid_terminal(&self, cell: Option<CellId>) -> bool {
        match cell {
            None => self.config.allow_dangling_edges,
            Some(c) => {
                (!self.model.is_edge(c) || self.config.connectable_edges)
                    && self.is_cell_connectable(c)
            }
        }
    }

    pub fn is_valid_source(&self, cell: Option<CellId>) -> bool {
        self.policy.is_valid_source(self, cell)
    }

    pub fn is_valid_target(&self, cell: Option<CellId>) -> bool {
        self.policy.is_valid_target(self, cell)
    }

    pub fn is_valid_connection(&self, source: Option<CellId>, target: Option<CellId>) -> bool {
        self.is_valid_source(source) && self.is_valid_target(target)
    }

    pub fn movable_cells(&self, cells: &[CellId]) -> Vec<CellId> {
        self.filter_cells(cells, |g, c| g.is_cell_movable(c))
    }

    pub fn deletable_cells(&self, cells: &[CellId]) -> Vec<CellId> {
        self.filter_cells(cells, |g, c| g.is_cell_deletable(c))
    }

    pub fn cloneable_cells(&self, cells: &[CellId]) -> Vec<CellId> {
        self.filter_cells(cells, |g, c| g.is_cell_cloneable(c))
    }

    pub fn foldable_cells(&self, cells: &[CellId], collapse: bool) -> Vec<CellId> {
        self.filter_cells(cells, |g, c| g.is_cell_foldable(c, collapse))
    }

    fn filter_cells(&self, cells: &[CellId], keep: impl Fn(&Graph, CellId) -> bool) -> Vec<CellId> {
        cells.iter().copied().filter(|&c| keep(self, c)).collect()
    }
}
