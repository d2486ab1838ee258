//! The view validator.
//!
//! `GraphView` owns the state cache of one view. It never mutates the model: every method that
//! needs the tree takes the [`Model`] by shared reference, so the owner (usually the graph
//! facade) decides when the view catches up with model changes.

mod edge;
mod update;

use crate::registry::Registry;
use crate::renderer::{CellRenderer, NullRenderer, ShapeHandle};
use crate::state::CellState;
use rustc_hash::FxBuildHasher;
use std::rc::Rc;
use trellis_core::geom::{self, Point, Rect, point, rect};
use trellis_core::{CellId, CellKind, Model, ResolvedStyle, StyleResolver, StyleSheet};

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;
type HashSet<K> = hashbrown::HashSet<K, FxBuildHasher>;

/// Callbacks the view asks its owner for while computing states.
pub trait ViewHooks {
    /// Extra unscaled offset applied to the origin of `cell`.
    fn child_offset_for_cell(&self, _model: &Model, _cell: CellId) -> Option<Point> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewOptions {
    /// Default segment length for loops.
    pub grid_size: f64,
    /// Edge style used for self-loops without a `loop` style.
    pub default_loop_style: String,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            grid_size: 10.0,
            default_loop_style: "loopEdgeStyle".to_string(),
        }
    }
}

pub struct GraphView {
    states: HashMap<CellId, CellState>,
    scale: f64,
    translate: Point,
    current_root: Option<CellId>,
    graph_bounds: Rect,
    registry: Registry,
    styles: Box<dyn StyleResolver>,
    renderer: Box<dyn CellRenderer>,
    hooks: Option<Rc<dyn ViewHooks>>,
    options: ViewOptions,
    rendering: bool,
    update_style: bool,
    last_node: Option<ShapeHandle>,
    last_html_node: Option<ShapeHandle>,
}

impl Default for GraphView {
    fn default() -> Self {
        Self::new(
            Registry::with_builtins(),
            Box::new(StyleSheet::default()),
            Box::new(NullRenderer::default()),
        )
    }
}

impl std::fmt::Debug for GraphView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphView")
            .field("states", &self.states.len())
            .field("scale", &self.scale)
            .field("translate", &self.translate)
            .field("current_root", &self.current_root)
            .field("graph_bounds", &self.graph_bounds)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl GraphView {
    pub fn new(
        registry: Registry,
        styles: Box<dyn StyleResolver>,
        renderer: Box<dyn CellRenderer>,
    ) -> Self {
        Self {
            states: HashMap::default(),
            scale: 1.0,
            translate: Point::zero(),
            current_root: None,
            graph_bounds: Rect::zero(),
            registry,
            styles,
            renderer,
            hooks: None,
            options: ViewOptions::default(),
            rendering: true,
            update_style: false,
            last_node: None,
            last_html_node: None,
        }
    }

    // --- configuration ------------------------------------------------------------------------

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translate(&self) -> Point {
        self.translate
    }

    pub fn current_root(&self) -> Option<CellId> {
        self.current_root
    }

    /// Bounds of all shapes and labels, as of the last [`GraphView::validate`].
    pub fn graph_bounds(&self) -> Rect {
        self.graph_bounds
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ViewOptions) {
        self.options = options;
    }

    pub fn styles(&self) -> &dyn StyleResolver {
        self.styles.as_ref()
    }

    /// Replaces the style resolver. Existing states keep their style until they are recreated
    /// or restyled.
    pub fn set_style_resolver(&mut self, styles: Box<dyn StyleResolver>) {
        self.styles = styles;
    }

    pub fn renderer_mut(&mut self) -> &mut dyn CellRenderer {
        self.renderer.as_mut()
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn CellRenderer>) -> Box<dyn CellRenderer> {
        std::mem::replace(&mut self.renderer, renderer)
    }

    pub fn set_hooks(&mut self, hooks: Option<Rc<dyn ViewHooks>>) {
        self.hooks = hooks;
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    pub fn set_rendering(&mut self, rendering: bool) {
        self.rendering = rendering;
    }

    /// When set, [`GraphView::ensure_state`] re-resolves the style of existing states.
    pub fn set_update_style(&mut self, update_style: bool) {
        self.update_style = update_style;
    }

    // --- state cache --------------------------------------------------------------------------

    pub fn get_state(&self, cell: CellId) -> Option<&CellState> {
        self.states.get(&cell)
    }

    pub fn get_state_mut(&mut self, cell: CellId) -> Option<&mut CellState> {
        self.states.get_mut(&cell)
    }

    pub fn states(&self) -> impl Iterator<Item = &CellState> {
        self.states.values()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Returns the state of `cell`, creating it first if the cell is visible.
    pub fn ensure_state(&mut self, model: &Model, cell: CellId) -> Option<&CellState> {
        if model.is_visible(cell) {
            if !self.states.contains_key(&cell) {
                if let Some(state) = self.create_state(model, cell) {
                    self.states.insert(cell, state);
                }
            } else if self.update_style {
                let style = self.resolve_style(model, cell);
                if let Some(state) = self.states.get_mut(&cell) {
                    state.style = style;
                }
            }
        }
        self.states.get(&cell)
    }

    /// Builds a fresh, invalid state for `cell` without registering it.
    pub fn create_state(&self, model: &Model, cell: CellId) -> Option<CellState> {
        let kind = model.cell(cell)?.kind();
        Some(CellState::new(cell, kind, self.resolve_style(model, cell)))
    }

    fn resolve_style(&self, model: &Model, cell: CellId) -> ResolvedStyle {
        match model.cell(cell) {
            Some(c) => ResolvedStyle::from_map(&self.styles.cell_style(c)),
            None => ResolvedStyle::default(),
        }
    }

    /// Detaches the state of `cell` and releases its shape.
    pub fn remove_state(&mut self, cell: CellId) -> Option<CellState> {
        let mut state = self.states.remove(&cell)?;
        self.renderer.destroy(&mut state);
        state.invalid = true;
        Some(state)
    }

    /// Removes the states of `cell` (the model root by default) and, with `recurse`, of its
    /// descendants. The current root keeps its children's states unless `force` is set.
    pub fn clear(&mut self, model: &Model, cell: Option<CellId>, force: bool, recurse: bool) {
        let cell = cell.unwrap_or(model.root());
        self.remove_state(cell);
        if recurse && (force || Some(cell) != self.current_root) {
            for &child in model.children(cell) {
                self.clear(model, Some(child), force, true);
            }
        } else {
            self.invalidate(model, Some(cell), true, true);
        }
    }

    // --- invalidation -------------------------------------------------------------------------

    /// Marks the state of `cell` (the model root by default) invalid, then its descendants with
    /// `recurse` and the connected edges with `include_edges`.
    pub fn invalidate(
        &mut self,
        model: &Model,
        cell: Option<CellId>,
        recurse: bool,
        include_edges: bool,
    ) {
        let mut visited = HashSet::default();
        let cell = cell.unwrap_or(model.root());
        self.invalidate_cell(model, cell, recurse, include_edges, &mut visited);
    }

    fn invalidate_cell(
        &mut self,
        model: &Model,
        cell: CellId,
        recurse: bool,
        include_edges: bool,
        visited: &mut HashSet<CellId>,
    ) {
        if let Some(state) = self.states.get_mut(&cell) {
            state.invalid = true;
        }
        if !visited.insert(cell) {
            return;
        }
        if recurse {
            for &child in model.children(cell) {
                self.invalidate_cell(model, child, recurse, include_edges, visited);
            }
        }
        if include_edges {
            for &edge in model.edges(cell) {
                self.invalidate_cell(model, edge, recurse, include_edges, visited);
            }
        }
    }

    // --- validation ---------------------------------------------------------------------------

    /// Brings all states below `cell` (the current root or model root by default) up to date
    /// and recomputes the graph bounds.
    pub fn validate(&mut self, model: &Model, cell: Option<CellId>) {
        let cell = cell.or(self.current_root).unwrap_or(model.root());
        self.reset_validation_state();
        self.validate_cell(model, cell, true);
        let bounds = if self.validate_cell_state(model, cell, true) {
            self.bounding_box(model, cell, true)
        } else {
            None
        };
        self.graph_bounds = bounds.unwrap_or_else(|| self.empty_bounds());
        self.reset_validation_state();
    }

    pub fn revalidate(&mut self, model: &Model) {
        self.invalidate(model, None, true, true);
        self.validate(model, None);
    }

    pub fn refresh(&mut self, model: &Model) {
        if self.current_root.is_some() {
            self.clear(model, None, false, true);
        }
        self.revalidate(model);
    }

    fn reset_validation_state(&mut self) {
        self.last_node = None;
        self.last_html_node = None;
    }

    /// Creates states for visible cells below `cell` and removes the states of cells that are
    /// hidden or below a collapsed ancestor. Coordinates are not computed here.
    pub fn validate_cell(&mut self, model: &Model, cell: CellId, visible: bool) {
        let visible = visible && model.is_visible(cell);
        if visible {
            self.ensure_state(model, cell);
        } else {
            self.remove_state(cell);
        }
        let expanded = !model.is_collapsed(cell) || Some(cell) == self.current_root;
        for &child in model.children(cell) {
            self.validate_cell(model, child, visible && expanded);
        }
    }

    /// Recomputes the state of `cell` if it is invalid, after its parent and visible terminals.
    /// Returns `true` if the cell has a state afterwards.
    pub fn validate_cell_state(&mut self, model: &Model, cell: CellId, recurse: bool) -> bool {
        let Some(state) = self.states.get_mut(&cell) else {
            return false;
        };

        if state.invalid {
            state.invalid = false;
            if state.invalid_style {
                state.invalid_style = false;
                let style = self.resolve_style(model, cell);
                if let Some(state) = self.states.get_mut(&cell) {
                    state.style = style;
                }
            }
            tracing::trace!(cell = %cell, "validate cell state");

            if Some(cell) != self.current_root {
                if let Some(parent) = model.parent(cell) {
                    self.validate_cell_state(model, parent, false);
                }
            }
            let source = self
                .visible_terminal(model, cell, true)
                .filter(|&t| self.validate_cell_state(model, t, false));
            let target = self
                .visible_terminal(model, cell, false)
                .filter(|&t| self.validate_cell_state(model, t, false));

            let Some(mut state) = self.states.remove(&cell) else {
                return false;
            };
            state.visible_source = source;
            state.visible_target = target;

            if !self.update_cell_state(model, &mut state) {
                tracing::debug!(cell = %cell, "edge has no renderable terminals; removing state");
                self.renderer.destroy(&mut state);
                self.clear(model, Some(cell), true, true);
                return false;
            }

            if Some(cell) != self.current_root {
                if state.shape.is_none() && state.kind != CellKind::Structural {
                    state.shape = self.renderer.create_shape(&state);
                }
                self.renderer.redraw(&mut state, false, self.rendering);
                state.update_cached_bounds();
            }
            self.states.insert(cell, state);
        }

        if recurse {
            self.state_validated(cell);
            for &child in model.children(cell) {
                self.validate_cell_state(model, child, true);
            }
        }
        true
    }

    fn state_validated(&mut self, cell: CellId) {
        if let Some(state) = self.states.get(&cell).filter(|s| s.shape.is_some()) {
            let (node, html) =
                self.renderer
                    .insert_state_after(state, self.last_node, self.last_html_node);
            self.last_node = node.or(self.last_node);
            self.last_html_node = html.or(self.last_html_node);
        }
    }

    /// The cell an edge end is drawn at: the terminal itself, or its topmost collapsed or
    /// hidden ancestor. `None` for terminals outside the view or directly below the root.
    pub fn visible_terminal(&self, model: &Model, edge: CellId, source: bool) -> Option<CellId> {
        let mut result = model.terminal(edge, source);
        let mut best = result;
        while let Some(r) = result {
            if Some(r) == self.current_root {
                break;
            }
            if best.is_some_and(|b| !model.is_visible(b)) || model.is_collapsed(r) {
                best = Some(r);
            }
            result = model.parent(r);
        }
        best.filter(|&b| {
            model.contains(b) && model.parent(b) != Some(model.root()) && Some(b) != self.current_root
        })
    }

    // --- bounds -------------------------------------------------------------------------------

    /// Union of the shape and label bounds of `cell` and, with `recurse`, its descendants.
    pub fn bounding_box(&self, model: &Model, cell: CellId, recurse: bool) -> Option<Rect> {
        let state = self.states.get(&cell)?;
        let mut bbox = state.bounding_box();
        if recurse {
            for &child in model.children(cell) {
                if let Some(b) = self.bounding_box(model, child, true) {
                    bbox = Some(match bbox {
                        Some(a) => geom::add_rect(&a, &b),
                        None => b,
                    });
                }
            }
        }
        bbox
    }

    /// Zero-sized bounds at the translated origin.
    pub fn empty_bounds(&self) -> Rect {
        rect(
            self.translate.x * self.scale,
            self.translate.y * self.scale,
            0.0,
            0.0,
        )
    }

    // --- transform ----------------------------------------------------------------------------

    /// Sets the scale and revalidates every state. Returns `false` if nothing changed.
    pub fn set_scale(&mut self, model: &Model, scale: f64) -> bool {
        if !scale.is_finite() || scale <= 0.0 {
            tracing::warn!(scale, "ignoring non-positive view scale");
            return false;
        }
        if scale == self.scale {
            return false;
        }
        self.scale = scale;
        self.revalidate(model);
        true
    }

    pub fn set_translate(&mut self, model: &Model, dx: f64, dy: f64) -> bool {
        if self.translate == point(dx, dy) {
            return false;
        }
        self.translate = point(dx, dy);
        self.revalidate(model);
        true
    }

    pub fn scale_and_translate(&mut self, model: &Model, scale: f64, dx: f64, dy: f64) -> bool {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            tracing::warn!(scale, "ignoring non-positive view scale");
            self.scale
        };
        if scale == self.scale && self.translate == point(dx, dy) {
            return false;
        }
        self.scale = scale;
        self.translate = point(dx, dy);
        self.revalidate(model);
        true
    }

    /// Resets scale and translate to identity and invalidates every state without validating.
    /// The next [`GraphView::validate`] recomputes the geometry.
    pub fn reset_transform(&mut self, model: &Model) -> bool {
        if self.scale == 1.0 && self.translate == point(0.0, 0.0) {
            return false;
        }
        self.scale = 1.0;
        self.translate = point(0.0, 0.0);
        self.invalidate(model, None, true, true);
        true
    }

    /// Makes `root` the display root and rebuilds every state. Returns the previous root.
    pub fn set_current_root(&mut self, model: &Model, root: Option<CellId>) -> Option<CellId> {
        if root == self.current_root {
            return root;
        }
        let previous = std::mem::replace(&mut self.current_root, root);
        tracing::debug!(root = ?root, previous = ?previous, "current root changed");
        self.clear(model, Some(model.root()), true, true);
        self.validate(model, None);
        previous
    }

    /// Maps a model-space control point of `state` into device coordinates.
    pub fn transform_control_point(&self, state: &CellState, pt: Point) -> Point {
        point(
            self.scale * (pt.x + self.translate.x + state.origin.x),
            self.scale * (pt.y + self.translate.y + state.origin.y),
        )
    }
}
