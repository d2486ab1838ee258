//! Cells: the nodes of the model tree.

use super::Geometry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Stable identity of a cell for the lifetime of its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u32);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellKind {
    Vertex,
    Edge,
    /// Roots, layers and other grouping nodes that are neither vertex nor edge.
    #[default]
    Structural,
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub(crate) id: CellId,
    pub(crate) kind: CellKind,
    pub(crate) value: Value,
    pub(crate) geometry: Option<Geometry>,
    pub(crate) style: Option<String>,
    pub(crate) parent: Option<CellId>,
    pub(crate) children: Vec<CellId>,
    pub(crate) source: Option<CellId>,
    pub(crate) target: Option<CellId>,
    /// Edges connected to this cell. A loop is listed once.
    pub(crate) edges: Vec<CellId>,
    pub(crate) visible: bool,
    pub(crate) collapsed: bool,
    pub(crate) connectable: bool,
}

impl Cell {
    pub(crate) fn new(id: CellId, kind: CellKind) -> Self {
        Self {
            id,
            kind,
            value: Value::Null,
            geometry: None,
            style: None,
            parent: None,
            children: Vec::new(),
            source: None,
            target: None,
            edges: Vec::new(),
            visible: true,
            collapsed: false,
            connectable: kind != CellKind::Structural,
        }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn is_vertex(&self) -> bool {
        self.kind == CellKind::Vertex
    }

    pub fn is_edge(&self) -> bool {
        self.kind == CellKind::Edge
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    pub fn parent(&self) -> Option<CellId> {
        self.parent
    }

    pub fn children(&self) -> &[CellId] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn index_of(&self, child: CellId) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }

    pub fn terminal(&self, source: bool) -> Option<CellId> {
        if source { self.source } else { self.target }
    }

    pub fn edges(&self) -> &[CellId] {
        &self.edges
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn is_connectable(&self) -> bool {
        self.connectable
    }
}
