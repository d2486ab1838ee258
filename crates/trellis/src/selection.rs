//! Selection model.

use indexmap::IndexSet;
use trellis_core::CellId;

/// Ordered set of selected cells. Mutators return the `(added, removed)` delta so the graph can
/// fire a single `SelectionChanged` event.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    cells: IndexSet<CellId>,
    single: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// With single selection only the last added cell is kept.
    pub fn set_single(&mut self, single: bool) {
        self.single = single;
    }

    pub fn is_single(&self) -> bool {
        self.single
    }

    pub fn cells(&self) -> Vec<CellId> {
        self.cells.iter().copied().collect()
    }

    pub fn first(&self) -> Option<CellId> {
        self.cells.first().copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: CellId) -> bool {
        self.cells.contains(&cell)
    }

    pub fn set(&mut self, cells: &[CellId]) -> (Vec<CellId>, Vec<CellId>) {
        let wanted: IndexSet<CellId> = if self.single {
            cells.last().copied().into_iter().collect()
        } else {
            cells.iter().copied().collect()
        };
        let removed: Vec<CellId> = self
            .cells
            .iter()
            .filter(|c| !wanted.contains(*c))
            .copied()
            .collect();
        let added: Vec<CellId> = wanted
            .iter()
            .filter(|c| !self.cells.contains(*c))
            .copied()
            .collect();
        self.cells = wanted;
        (added, removed)
    }

    pub fn add(&mut self, cells: &[CellId]) -> (Vec<CellId>, Vec<CellId>) {
        if self.single {
            return match cells.last() {
                Some(&c) => self.set(&[c]),
                None => (Vec::new(), Vec::new()),
            };
        }
        let added = cells
            .iter()
            .copied()
            .filter(|&c| self.cells.insert(c))
            .collect();
        (added, Vec::new())
    }

    pub fn remove(&mut self, cells: &[CellId]) -> (Vec<CellId>, Vec<CellId>) {
        let removed = cells
            .iter()
            .copied()
            .filter(|c| self.cells.shift_remove(c))
            .collect();
        (Vec::new(), removed)
    }

    pub fn clear(&mut self) -> (Vec<CellId>, Vec<CellId>) {
        let removed = self.cells.drain(..).collect();
        (Vec::new(), removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_reports_delta_and_keeps_order() {
        let mut sel = Selection::new();
        sel.add(&[CellId(3), CellId(1)]);
        let (added, removed) = sel.set(&[CellId(1), CellId(7)]);
        assert_eq!(added, vec![CellId(7)]);
        assert_eq!(removed, vec![CellId(3)]);
        assert_eq!(sel.cells(), vec![CellId(1), CellId(7)]);
    }

    #[test]
    fn single_selection_keeps_last() {
        let mut sel = Selection::new();
        sel.set_single(true);
        sel.add(&[CellId(1), CellId(2)]);
        assert_eq!(sel.cells(), vec![CellId(2)]);
    }
}
