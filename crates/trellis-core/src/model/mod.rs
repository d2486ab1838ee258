//! The cell model: a tree of cells plus nestable transactions.
//!
//! Every mutator executes immediately and appends a [`Change`] to the pending list. The pending
//! list is handed out when the outermost [`Model::end_update`] commits, so a listener sees one
//! batch per transaction no matter how many edits it contained.

mod cell;
mod change;
mod geometry;

pub use cell::{Cell, CellId, CellKind};
pub use change::{Change, ChangeKind};
pub use geometry::Geometry;

use crate::{Error, Result};
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use serde_json::Value;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

pub struct Model {
    cells: HashMap<CellId, Cell>,
    root: CellId,
    next_id: u32,
    update_level: usize,
    pending: Vec<Change>,
    removed: Vec<CellId>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("root", &self.root)
            .field("cells", &self.cells.len())
            .field("update_level", &self.update_level)
            .finish()
    }
}

impl Model {
    /// Creates a model with a root and one default layer below it.
    pub fn new() -> Self {
        let mut model = Self {
            cells: HashMap::default(),
            root: CellId(0),
            next_id: 0,
            update_level: 0,
            pending: Vec::new(),
            removed: Vec::new(),
        };
        let root = model.create_cell(CellKind::Structural, Value::Null, None, None);
        let layer = model.create_cell(CellKind::Structural, Value::Null, None, None);
        model.root = root;
        if let Some(c) = model.cells.get_mut(&layer) {
            c.parent = Some(root);
        }
        if let Some(c) = model.cells.get_mut(&root) {
            c.children.push(layer);
        }
        model
    }

    // --- transactions -------------------------------------------------------------------------

    pub fn begin_update(&mut self) {
        self.update_level += 1;
    }

    /// Closes one transaction level. Returns the committed changes when the outermost level
    /// closes, `None` while still nested.
    pub fn end_update(&mut self) -> Option<Vec<Change>> {
        self.update_level = self.update_level.saturating_sub(1);
        if self.update_level > 0 {
            return None;
        }
        let changes = std::mem::take(&mut self.pending);
        tracing::debug!(changes = changes.len(), "model transaction committed");
        Some(changes)
    }

    pub fn update_level(&self) -> usize {
        self.update_level
    }

    pub fn is_updating(&self) -> bool {
        self.update_level > 0
    }

    pub fn pending_changes(&self) -> &[Change] {
        &self.pending
    }

    // --- lookup -------------------------------------------------------------------------------

    pub fn root(&self) -> CellId {
        self.root
    }

    /// The first child of the root, where cells go by default.
    pub fn default_layer(&self) -> Option<CellId> {
        self.children(self.root).first().copied()
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    pub fn has_cell(&self, id: CellId) -> bool {
        self.cells.contains_key(&id)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn parent(&self, id: CellId) -> Option<CellId> {
        self.cells.get(&id).and_then(|c| c.parent)
    }

    pub fn children(&self, id: CellId) -> &[CellId] {
        self.cells.get(&id).map(|c| c.children()).unwrap_or(&[])
    }

    pub fn child_count(&self, id: CellId) -> usize {
        self.children(id).len()
    }

    pub fn geometry(&self, id: CellId) -> Option<&Geometry> {
        self.cells.get(&id).and_then(|c| c.geometry.as_ref())
    }

    pub fn style(&self, id: CellId) -> Option<&str> {
        self.cells.get(&id).and_then(|c| c.style.as_deref())
    }

    pub fn value(&self, id: CellId) -> Option<&Value> {
        self.cells.get(&id).map(|c| &c.value)
    }

    pub fn terminal(&self, edge: CellId, source: bool) -> Option<CellId> {
        self.cells.get(&edge).and_then(|c| c.terminal(source))
    }

    pub fn edges(&self, id: CellId) -> &[CellId] {
        self.cells.get(&id).map(|c| c.edges()).unwrap_or(&[])
    }

    pub fn is_vertex(&self, id: CellId) -> bool {
        self.cells.get(&id).is_some_and(|c| c.is_vertex())
    }

    pub fn is_edge(&self, id: CellId) -> bool {
        self.cells.get(&id).is_some_and(|c| c.is_edge())
    }

    pub fn is_visible(&self, id: CellId) -> bool {
        self.cells.get(&id).is_some_and(|c| c.visible)
    }

    pub fn is_collapsed(&self, id: CellId) -> bool {
        self.cells.get(&id).is_some_and(|c| c.collapsed)
    }

    pub fn is_connectable(&self, id: CellId) -> bool {
        self.cells.get(&id).is_some_and(|c| c.connectable)
    }

    /// `true` if the cell is attached to the tree below the current root.
    pub fn contains(&self, id: CellId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == self.root {
                return true;
            }
            cur = self.parent(c);
        }
        false
    }

    /// `true` if `ancestor` is `cell` or one of its ancestors.
    pub fn is_ancestor(&self, ancestor: CellId, cell: CellId) -> bool {
        let mut cur = Some(cell);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.parent(c);
        }
        false
    }

    /// The cell and all its descendants in pre-order.
    pub fn descendants(&self, id: CellId) -> Vec<CellId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(c) = stack.pop() {
            if !self.cells.contains_key(&c) {
                continue;
            }
            out.push(c);
            stack.extend(self.children(c).iter().rev().copied());
        }
        out
    }

    /// Drops every cell that has an ancestor in `cells`.
    pub fn topmost_cells(&self, cells: &[CellId]) -> Vec<CellId> {
        let set: IndexSet<CellId> = cells.iter().copied().collect();
        cells
            .iter()
            .copied()
            .filter(|&c| {
                let mut cur = self.parent(c);
                while let Some(p) = cur {
                    if set.contains(&p) {
                        return false;
                    }
                    cur = self.parent(p);
                }
                true
            })
            .collect()
    }

    /// Edges connected to the given cells or any of their descendants, without duplicates.
    pub fn all_edges(&self, cells: &[CellId]) -> Vec<CellId> {
        let mut out: IndexSet<CellId> = IndexSet::new();
        for &cell in cells {
            for d in self.descendants(cell) {
                out.extend(self.edges(d).iter().copied());
            }
        }
        out.into_iter().collect()
    }

    /// Edges from `source` to `target` (and back unless `directed`).
    pub fn edges_between(&self, source: CellId, target: CellId, directed: bool) -> Vec<CellId> {
        self.edges(source)
            .iter()
            .copied()
            .filter(|&e| {
                let s = self.terminal(e, true);
                let t = self.terminal(e, false);
                (s == Some(source) && t == Some(target))
                    || (!directed && s == Some(target) && t == Some(source))
            })
            .collect()
    }

    /// Number of edges leaving (`outgoing`) or entering the cell, not counting `ignored`.
    pub fn directed_edge_count(
        &self,
        cell: CellId,
        outgoing: bool,
        ignored: Option<CellId>,
    ) -> usize {
        self.edges(cell)
            .iter()
            .filter(|&&e| Some(e) != ignored && self.terminal(e, outgoing) == Some(cell))
            .count()
    }

    // --- construction -------------------------------------------------------------------------

    /// Allocates a detached cell. It becomes part of the tree once passed to [`Model::add`].
    pub fn create_cell(
        &mut self,
        kind: CellKind,
        value: Value,
        geometry: Option<Geometry>,
        style: Option<String>,
    ) -> CellId {
        let id = CellId(self.next_id);
        self.next_id += 1;
        let mut cell = Cell::new(id, kind);
        cell.value = value;
        cell.geometry = geometry;
        cell.style = style;
        self.cells.insert(id, cell);
        id
    }

    /// Sets the connectable flag. This is a creation-time attribute and is not recorded.
    pub fn set_connectable(&mut self, id: CellId, connectable: bool) -> Result<()> {
        self.cell_mut(id)?.connectable = connectable;
        Ok(())
    }

    /// Deep-copies the given cells (and their children when `include_children`) into detached
    /// clones. Edge terminals are kept only when the terminal was cloned too.
    pub fn clone_cells(&mut self, cells: &[CellId], include_children: bool) -> Vec<CellId> {
        let mut mapping: HashMap<CellId, CellId> = HashMap::default();
        let mut clones = Vec::with_capacity(cells.len());
        for &cell in cells {
            if self.cells.contains_key(&cell) {
                clones.push(self.clone_subtree(cell, include_children, &mut mapping));
            }
        }
        let pairs: Vec<(CellId, CellId)> = mapping.iter().map(|(&k, &v)| (k, v)).collect();
        for (original, clone) in pairs {
            for source in [true, false] {
                let Some(terminal) = self.terminal(original, source) else {
                    continue;
                };
                let Some(&mapped) = mapping.get(&terminal) else {
                    continue;
                };
                if let Some(c) = self.cells.get_mut(&clone) {
                    if source {
                        c.source = Some(mapped);
                    } else {
                        c.target = Some(mapped);
                    }
                }
                if let Some(t) = self.cells.get_mut(&mapped) {
                    if !t.edges.contains(&clone) {
                        t.edges.push(clone);
                    }
                }
            }
        }
        clones
    }

    fn clone_subtree(
        &mut self,
        cell: CellId,
        include_children: bool,
        mapping: &mut HashMap<CellId, CellId>,
    ) -> CellId {
        let Some(orig) = self.cells.get(&cell).cloned() else {
            return cell;
        };
        let id = self.create_cell(orig.kind, orig.value, orig.geometry, orig.style);
        if let Some(c) = self.cells.get_mut(&id) {
            c.visible = orig.visible;
            c.collapsed = orig.collapsed;
            c.connectable = orig.connectable;
        }
        mapping.insert(cell, id);
        if include_children {
            for child in orig.children {
                let cloned = self.clone_subtree(child, true, mapping);
                if let Some(c) = self.cells.get_mut(&cloned) {
                    c.parent = Some(id);
                }
                if let Some(c) = self.cells.get_mut(&id) {
                    c.children.push(cloned);
                }
            }
        }
        id
    }

    // --- mutation -----------------------------------------------------------------------------

    fn cell_mut(&mut self, id: CellId) -> Result<&mut Cell> {
        self.cells.get_mut(&id).ok_or(Error::UnknownCell(id))
    }

    /// Replaces the root. The old root stays allocated so the change can be inspected.
    pub fn set_root(&mut self, root: CellId) -> Result<()> {
        if !self.cells.contains_key(&root) {
            return Err(Error::UnknownCell(root));
        }
        if root == self.root {
            return Ok(());
        }
        let previous = self.root;
        self.root = root;
        self.pending.push(Change::Root { root, previous });
        Ok(())
    }

    /// Replaces the content with a fresh root and default layer.
    pub fn clear(&mut self) -> Result<CellId> {
        let root = self.create_cell(CellKind::Structural, Value::Null, None, None);
        let layer = self.create_cell(CellKind::Structural, Value::Null, None, None);
        self.cell_mut(layer)?.parent = Some(root);
        self.cell_mut(root)?.children.push(layer);
        self.set_root(root)?;
        Ok(root)
    }

    /// Inserts `child` into `parent` at `index` (appends when `None`), removing it from its
    /// previous parent first.
    pub fn add(&mut self, parent: CellId, child: CellId, index: Option<usize>) -> Result<()> {
        if !self.cells.contains_key(&parent) {
            return Err(Error::UnknownCell(parent));
        }
        if !self.cells.contains_key(&child) {
            return Err(Error::UnknownCell(child));
        }
        if self.is_ancestor(child, parent) {
            return Err(Error::CycleDetected { child, parent });
        }

        let previous = self.parent(child);
        let previous_index = previous.and_then(|p| self.cells.get(&p)?.index_of(child));
        let index = index.unwrap_or_else(|| {
            let n = self.child_count(parent);
            if previous == Some(parent) {
                n.saturating_sub(1)
            } else {
                n
            }
        });
        if previous == Some(parent) && previous_index == Some(index) {
            return Ok(());
        }

        self.detach(child);
        let parent_cell = self.cell_mut(parent)?;
        let at = index.min(parent_cell.children.len());
        parent_cell.children.insert(at, child);
        self.cell_mut(child)?.parent = Some(parent);
        self.connect(child, true);

        self.pending.push(Change::Child {
            child,
            parent: Some(parent),
            previous,
            index: Some(at),
            previous_index,
        });
        Ok(())
    }

    /// Detaches the cell (and its subtree) from the tree. Removing the root is a no-op.
    pub fn remove(&mut self, cell: CellId) -> Result<()> {
        if !self.cells.contains_key(&cell) {
            return Err(Error::UnknownCell(cell));
        }
        if cell == self.root {
            return Ok(());
        }
        let Some(previous) = self.parent(cell) else {
            return Ok(());
        };
        let previous_index = self.cells.get(&previous).and_then(|p| p.index_of(cell));
        self.connect(cell, false);
        self.detach(cell);
        self.removed.push(cell);
        self.pending.push(Change::Child {
            child: cell,
            parent: None,
            previous: Some(previous),
            index: None,
            previous_index,
        });
        Ok(())
    }

    /// Frees the subtrees detached by [`Model::remove`] in committed transactions. A subtree
    /// that was re-added stays, and one whose vertices still terminate an attached edge is kept
    /// until a later purge. Does nothing while a transaction is open. Returns the freed cells.
    pub fn purge_removed(&mut self) -> Vec<CellId> {
        if self.is_updating() {
            return Vec::new();
        }
        let mut freed = Vec::new();
        let mut retained = Vec::new();
        for cell in std::mem::take(&mut self.removed) {
            if !self.cells.contains_key(&cell) || cell == self.root || self.parent(cell).is_some() {
                continue;
            }
            let subtree = self.descendants(cell);
            let outside: Vec<CellId> = subtree
                .iter()
                .flat_map(|&c| self.edges(c).iter().copied())
                .filter(|e| !subtree.contains(e))
                .collect();
            if outside.iter().any(|&e| self.contains(e)) {
                retained.push(cell);
                continue;
            }
            for edge in outside {
                if let Some(e) = self.cells.get_mut(&edge) {
                    if e.source.is_some_and(|t| subtree.contains(&t)) {
                        e.source = None;
                    }
                    if e.target.is_some_and(|t| subtree.contains(&t)) {
                        e.target = None;
                    }
                }
            }
            for &c in &subtree {
                self.cells.remove(&c);
            }
            freed.extend(subtree);
        }
        self.removed = retained;
        if !freed.is_empty() {
            tracing::debug!(freed = freed.len(), "freed removed cells");
        }
        freed
    }

    fn detach(&mut self, cell: CellId) {
        let Some(parent) = self.parent(cell) else {
            return;
        };
        if let Some(p) = self.cells.get_mut(&parent) {
            p.children.retain(|&c| c != cell);
        }
        if let Some(c) = self.cells.get_mut(&cell) {
            c.parent = None;
        }
    }

    /// Registers (or unregisters) every edge in the subtree with its terminals, keeping the
    /// edge's own terminal references intact.
    fn connect(&mut self, cell: CellId, is_connect: bool) {
        for d in self.descendants(cell) {
            if !self.is_edge(d) {
                continue;
            }
            for source in [true, false] {
                let Some(terminal) = self.terminal(d, source) else {
                    continue;
                };
                let Some(t) = self.cells.get_mut(&terminal) else {
                    continue;
                };
                if is_connect {
                    if !t.edges.contains(&d) {
                        t.edges.push(d);
                    }
                } else {
                    t.edges.retain(|&e| e != d);
                }
            }
        }
    }

    pub fn set_terminal(
        &mut self,
        edge: CellId,
        terminal: Option<CellId>,
        source: bool,
    ) -> Result<()> {
        if let Some(t) = terminal {
            if !self.cells.contains_key(&t) {
                return Err(Error::UnknownCell(t));
            }
        }
        let cell = self.cell_mut(edge)?;
        let previous = cell.terminal(source);
        if previous == terminal {
            return Ok(());
        }
        let other = cell.terminal(!source);
        if source {
            cell.source = terminal;
        } else {
            cell.target = terminal;
        }
        if let Some(p) = previous {
            if other != Some(p) {
                if let Some(pc) = self.cells.get_mut(&p) {
                    pc.edges.retain(|&e| e != edge);
                }
            }
        }
        if let Some(t) = terminal {
            if let Some(tc) = self.cells.get_mut(&t) {
                if !tc.edges.contains(&edge) {
                    tc.edges.push(edge);
                }
            }
        }
        self.pending.push(Change::Terminal {
            edge,
            terminal,
            previous,
            source,
        });
        Ok(())
    }

    pub fn set_terminals(
        &mut self,
        edge: CellId,
        source: Option<CellId>,
        target: Option<CellId>,
    ) -> Result<()> {
        self.set_terminal(edge, source, true)?;
        self.set_terminal(edge, target, false)
    }

    /// Always recorded: listeners compare old and new geometry themselves.
    pub fn set_geometry(&mut self, cell: CellId, geometry: Option<Geometry>) -> Result<()> {
        let c = self.cell_mut(cell)?;
        let previous = std::mem::replace(&mut c.geometry, geometry.clone());
        self.pending.push(Change::Geometry {
            cell,
            geometry,
            previous,
        });
        Ok(())
    }

    pub fn set_value(&mut self, cell: CellId, value: Value) -> Result<()> {
        let c = self.cell_mut(cell)?;
        let previous = std::mem::replace(&mut c.value, value.clone());
        self.pending.push(Change::Value {
            cell,
            value,
            previous,
        });
        Ok(())
    }

    pub fn set_style(&mut self, cell: CellId, style: Option<String>) -> Result<()> {
        let c = self.cell_mut(cell)?;
        if c.style == style {
            return Ok(());
        }
        let previous = std::mem::replace(&mut c.style, style.clone());
        self.pending.push(Change::Style {
            cell,
            style,
            previous,
        });
        Ok(())
    }

    pub fn set_collapsed(&mut self, cell: CellId, collapsed: bool) -> Result<()> {
        let c = self.cell_mut(cell)?;
        if c.collapsed == collapsed {
            return Ok(());
        }
        c.collapsed = collapsed;
        self.pending.push(Change::Collapsed {
            cell,
            collapsed,
            previous: !collapsed,
        });
        Ok(())
    }

    pub fn set_visible(&mut self, cell: CellId, visible: bool) -> Result<()> {
        let c = self.cell_mut(cell)?;
        if c.visible == visible {
            return Ok(());
        }
        c.visible = visible;
        self.pending.push(Change::Visible {
            cell,
            visible,
            previous: !visible,
        });
        Ok(())
    }
}
