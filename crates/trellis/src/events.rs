//! Domain events fired by the graph after (or while) applying an edit.

use crate::graph::Align;
use trellis_core::{CellId, Change, Rect};

/// One notification. Cell lists are in the order the edit processed them.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    /// A committed transaction, after its changes were processed and the view revalidated.
    Change { changes: Vec<Change> },
    CellsAdded {
        cells: Vec<CellId>,
        parent: CellId,
        index: usize,
        source: Option<CellId>,
        target: Option<CellId>,
    },
    CellsRemoved { cells: Vec<CellId> },
    CellsMoved {
        cells: Vec<CellId>,
        dx: f64,
        dy: f64,
        disconnect: bool,
    },
    MoveCells {
        cells: Vec<CellId>,
        dx: f64,
        dy: f64,
        clone: bool,
        target: Option<CellId>,
    },
    CellsResized {
        cells: Vec<CellId>,
        bounds: Vec<Rect>,
    },
    CellConnected {
        edge: CellId,
        terminal: Option<CellId>,
        source: bool,
        previous: Option<CellId>,
    },
    CellsFolded {
        cells: Vec<CellId>,
        collapse: bool,
        recurse: bool,
    },
    GroupCells {
        group: CellId,
        cells: Vec<CellId>,
        border: f64,
    },
    UngroupCells { cells: Vec<CellId> },
    RemoveCellsFromParent { cells: Vec<CellId> },
    AlignCells { cells: Vec<CellId>, align: Align },
    CellsOrdered { cells: Vec<CellId>, back: bool },
    CellsToggled { cells: Vec<CellId>, show: bool },
    LabelChanged {
        cell: CellId,
        value: serde_json::Value,
        previous: serde_json::Value,
    },
    Root { root: Option<CellId> },
    Size { bounds: Rect },
    Scale { scale: f64, previous: f64 },
    SelectionChanged {
        added: Vec<CellId>,
        removed: Vec<CellId>,
    },
    Click { cell: Option<CellId>, x: f64, y: f64 },
    DoubleClick { cell: Option<CellId>, x: f64, y: f64 },
    TapAndHold { cell: Option<CellId>, x: f64, y: f64 },
}

pub type ListenerId = usize;

type Listener = Box<dyn FnMut(&GraphEvent)>;

/// Ordered list of event listeners.
pub struct EventSource {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: ListenerId,
    enabled: bool,
}

impl Default for EventSource {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
            enabled: true,
        }
    }
}

impl std::fmt::Debug for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource")
            .field("listeners", &self.listeners.len())
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl EventSource {
    pub fn add_listener(&mut self, listener: impl FnMut(&GraphEvent) + 'static) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn fire(&mut self, event: &GraphEvent) {
        if !self.enabled {
            return;
        }
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}
