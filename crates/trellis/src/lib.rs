#![forbid(unsafe_code)]

//! `trellis` is a headless interactive diagram-editing engine.
//!
//! The [`Graph`] facade owns a [`Model`] and a [`GraphView`]. Every mutation runs inside a model
//! transaction; the outermost commit hands the recorded changes to [`Graph::process_change`], which
//! invalidates the affected cell states, and then revalidates the view once.
//!
//! Drawing is delegated to a [`CellRenderer`]; nothing in this crate touches a real canvas.

pub mod events;
pub mod graph;
pub mod interaction;
pub mod policy;
pub mod predicates;
pub mod selection;
pub mod validation;

pub use trellis_core::*;
pub use trellis_view::{
    CellRenderer, CellState, EdgeStyleEntry, EdgeStyleFn, EdgeStyleInput, GraphView,
    NullRenderer, PerimeterFn, Registry, ShapeHandle, ViewHooks, ViewOptions,
};

pub use events::{EventSource, GraphEvent, ListenerId};
pub use graph::{Align, Graph};
pub use interaction::{
    InteractionDispatcher, MouseEventContext, MouseEventKind, MouseListener, PointerKind,
};
pub use policy::{DefaultPolicy, GraphPolicy};
pub use selection::Selection;
pub use validation::Multiplicity;
