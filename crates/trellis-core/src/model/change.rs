//! Change records emitted by committed transactions.

use super::{CellId, Geometry};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Root,
    Child,
    Terminal,
    Geometry,
    Value,
    Style,
    Collapsed,
    Visible,
}

/// One executed model edit. Every record keeps the previous value so listeners can compare.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Root {
        root: CellId,
        previous: CellId,
    },
    Child {
        child: CellId,
        parent: Option<CellId>,
        previous: Option<CellId>,
        index: Option<usize>,
        previous_index: Option<usize>,
    },
    Terminal {
        edge: CellId,
        terminal: Option<CellId>,
        previous: Option<CellId>,
        source: bool,
    },
    Geometry {
        cell: CellId,
        geometry: Option<Geometry>,
        previous: Option<Geometry>,
    },
    Value {
        cell: CellId,
        value: Value,
        previous: Value,
    },
    Style {
        cell: CellId,
        style: Option<String>,
        previous: Option<String>,
    },
    Collapsed {
        cell: CellId,
        collapsed: bool,
        previous: bool,
    },
    Visible {
        cell: CellId,
        visible: bool,
        previous: bool,
    },
}

impl Change {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::Root { .. } => ChangeKind::Root,
            Change::Child { .. } => ChangeKind::Child,
            Change::Terminal { .. } => ChangeKind::Terminal,
            Change::Geometry { .. } => ChangeKind::Geometry,
            Change::Value { .. } => ChangeKind::Value,
            Change::Style { .. } => ChangeKind::Style,
            Change::Collapsed { .. } => ChangeKind::Collapsed,
            Change::Visible { .. } => ChangeKind::Visible,
        }
    }

    /// The cell the change is about (the new root for root changes).
    pub fn cell(&self) -> CellId {
        match *self {
            Change::Root { root, .. } => root,
            Change::Child { child, .. } => child,
            Change::Terminal { edge, .. } => edge,
            Change::Geometry { cell, .. }
            | Change::Value { cell, .. }
            | Change::Style { cell, .. }
            | Change::Collapsed { cell, .. }
            | Change::Visible { cell, .. } => cell,
        }
    }
}
