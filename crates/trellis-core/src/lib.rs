#![forbid(unsafe_code)]

//! Cell model, transactions, geometry and styles (headless).
//!
//! Design goals:
//! - the model is the single source of truth; views only cache what they derive from it
//! - every mutation is recorded as a [`model::Change`] so observers can replay or invalidate
//! - no panics on user-controlled input (bad styles or geometry degrade to defaults)

pub mod config;
pub mod error;
pub mod geom;
pub mod model;
pub mod style;

pub use config::GraphConfig;
pub use error::{Error, Result};
pub use geom::{Point, Rect};
pub use model::{Cell, CellId, CellKind, Change, Geometry, Model};
pub use style::{ResolvedStyle, StyleMap, StyleResolver, StyleSheet};
