#![forbid(unsafe_code)]

//! Cached cell states and view validation.
//!
//! [`GraphView`] turns the model tree (relative, parent-scoped geometries) into absolute,
//! scaled and translated [`CellState`]s. States are created lazily, marked invalid on change and
//! recomputed by the next [`GraphView::validate`] pass: parents before children, terminals before
//! the edges connected to them.

pub mod edge_style;
pub mod perimeter;
pub mod registry;
pub mod renderer;
pub mod state;
pub mod view;

pub use registry::{EdgeStyleEntry, EdgeStyleFn, EdgeStyleInput, PerimeterFn, Registry};
pub use renderer::{CellRenderer, NullRenderer, ShapeHandle};
pub use state::CellState;
pub use view::{GraphView, ViewHooks, ViewOptions};
