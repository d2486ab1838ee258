//! Named perimeter and edge-style functions.
//!
//! Styles refer to routing and projection strategies by name (`perimeter=ellipsePerimeter`,
//! `edgeStyle=elbowEdgeStyle`). The [`Registry`] maps those names to plain function pointers;
//! it is built once and handed to the view, there is no process-wide table.

use crate::edge_style;
use crate::perimeter;
use crate::state::CellState;
use rustc_hash::FxBuildHasher;
use trellis_core::geom::{Point, Rect, point};

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

/// Projects `next` onto the perimeter of `bounds`. `vertex` is the terminal being projected
/// onto; `orthogonal` asks for a horizontal or vertical connection where possible. `None` means
/// no intersection was found and the caller falls back to the terminal's center.
pub type PerimeterFn =
    fn(bounds: &Rect, vertex: &CellState, next: Point, orthogonal: bool) -> Option<Point>;

/// Appends the interior routing points of an edge to `result`. The terminal points are not
/// part of the output.
pub type EdgeStyleFn = fn(input: &EdgeStyleInput<'_>, result: &mut Vec<Point>);

/// Everything an edge style may look at while routing.
#[derive(Debug, Clone, Copy)]
pub struct EdgeStyleInput<'a> {
    pub state: &'a CellState,
    pub source: Option<&'a CellState>,
    pub target: Option<&'a CellState>,
    /// Control points in model coordinates.
    pub points: &'a [Point],
    pub scale: f64,
    pub translate: Point,
    pub grid_size: f64,
}

impl EdgeStyleInput<'_> {
    /// Maps a model control point into device coordinates.
    pub fn transform_control_point(&self, pt: Point) -> Point {
        let origin = self.state.origin;
        point(
            self.scale * (pt.x + self.translate.x + origin.x),
            self.scale * (pt.y + self.translate.y + origin.y),
        )
    }

    /// Fixed source point, if one was resolved before routing.
    pub fn source_point(&self) -> Option<Point> {
        self.state.first_point()
    }

    pub fn target_point(&self) -> Option<Point> {
        self.state.last_point()
    }
}

#[derive(Clone, Copy)]
pub struct EdgeStyleEntry {
    pub route: EdgeStyleFn,
    /// Whether floating terminal points should be projected orthogonally.
    pub orthogonal: bool,
}

impl std::fmt::Debug for EdgeStyleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeStyleEntry")
            .field("orthogonal", &self.orthogonal)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default)]
pub struct Registry {
    perimeters: HashMap<String, PerimeterFn>,
    edge_styles: HashMap<String, EdgeStyleEntry>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("perimeters", &self.perimeters.keys().collect::<Vec<_>>())
            .field("edge_styles", &self.edge_styles.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    /// An empty registry. Use [`Registry::with_builtins`] for the standard strategies.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register_perimeter("rectanglePerimeter", perimeter::rectangle);
        reg.register_perimeter("ellipsePerimeter", perimeter::ellipse);
        reg.register_perimeter("rhombusPerimeter", perimeter::rhombus);
        reg.register_perimeter("trianglePerimeter", perimeter::triangle);
        reg.register_perimeter("hexagonPerimeter", perimeter::hexagon);

        reg.register_edge_style("entityRelationEdgeStyle", edge_style::entity_relation, true);
        reg.register_edge_style("loopEdgeStyle", edge_style::loop_route, false);
        reg.register_edge_style("elbowEdgeStyle", edge_style::elbow_connector, true);
        reg.register_edge_style("sideToSideEdgeStyle", edge_style::side_to_side, true);
        reg.register_edge_style("topToBottomEdgeStyle", edge_style::top_to_bottom, true);
        reg.register_edge_style("segmentEdgeStyle", edge_style::segment_connector, true);
        reg.register_edge_style("orthogonalEdgeStyle", edge_style::orth_connector, true);
        reg
    }

    /// Registers (or replaces) a perimeter under `name`.
    pub fn register_perimeter(&mut self, name: impl Into<String>, f: PerimeterFn) {
        self.perimeters.insert(name.into(), f);
    }

    pub fn register_edge_style(&mut self, name: impl Into<String>, f: EdgeStyleFn, orthogonal: bool) {
        self.edge_styles.insert(
            name.into(),
            EdgeStyleEntry {
                route: f,
                orthogonal,
            },
        );
    }

    pub fn perimeter(&self, name: &str) -> Option<PerimeterFn> {
        self.perimeters.get(name).copied()
    }

    pub fn edge_style(&self, name: &str) -> Option<EdgeStyleEntry> {
        self.edge_styles.get(name).copied()
    }

    pub fn has_perimeter(&self, name: &str) -> bool {
        self.perimeters.contains_key(name)
    }

    pub fn has_edge_style(&self, name: &str) -> bool {
        self.edge_styles.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered_by_name() {
        let reg = Registry::with_builtins();
        assert!(reg.has_perimeter("rectanglePerimeter"));
        assert!(reg.has_perimeter("ellipsePerimeter"));
        assert!(reg.edge_style("elbowEdgeStyle").is_some_and(|e| e.orthogonal));
        assert!(reg.edge_style("loopEdgeStyle").is_some_and(|e| !e.orthogonal));
        assert!(reg.edge_style("unknown").is_none());
    }

    #[test]
    fn registration_replaces_existing_entries() {
        fn center_only(bounds: &Rect, _: &CellState, _: Point, _: bool) -> Option<Point> {
            Some(trellis_core::geom::center(bounds))
        }
        let mut reg = Registry::new();
        assert!(reg.perimeter("rectanglePerimeter").is_none());
        reg.register_perimeter("rectanglePerimeter", center_only);
        assert!(reg.has_perimeter("rectanglePerimeter"));
    }
}
