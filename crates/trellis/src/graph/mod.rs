//! The graph facade.
//!
//! `Graph` owns the model, the view, the configuration and the policy. Mutations are grouped into
//! model transactions; when the outermost transaction commits, [`Graph::process_change`] maps each
//! change record onto view invalidation and the view is revalidated once.

mod cells;
mod connect;
mod group;
mod hit;
mod layout;

pub use layout::Align;

use crate::events::{EventSource, GraphEvent, ListenerId};
use crate::policy::{DefaultPolicy, GraphPolicy};
use crate::selection::Selection;
use crate::validation::Multiplicity;
use rustc_hash::FxBuildHasher;
use std::borrow::Cow;
use std::rc::Rc;
use trellis_core::{
    CellId, Change, GraphConfig, Model, ResolvedStyle, Result, StyleResolver,
};
use trellis_view::{CellRenderer, GraphView, Registry, ViewHooks, ViewOptions};

pub(crate) type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;
pub(crate) type HashSet<K> = hashbrown::HashSet<K, FxBuildHasher>;

pub struct Graph {
    pub(crate) model: Model,
    pub(crate) view: GraphView,
    pub(crate) config: GraphConfig,
    pub(crate) policy: Rc<dyn GraphPolicy>,
    pub(crate) selection: Selection,
    pub(crate) events: EventSource,
    pub(crate) multiplicities: Vec<Multiplicity>,
    pub(crate) warnings: HashMap<CellId, String>,
    default_parent: Option<CellId>,
}

impl Default for Graph {
    fn default() -> Self {
        let mut graph = Self {
            model: Model::new(),
            view: GraphView::default(),
            config: GraphConfig::default(),
            policy: Rc::new(DefaultPolicy),
            selection: Selection::new(),
            events: EventSource::default(),
            multiplicities: Vec::new(),
            warnings: HashMap::default(),
            default_parent: None,
        };
        graph.sync_view();
        graph
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("model", &self.model)
            .field("view", &self.view)
            .field("selection", &self.selection)
            .field("multiplicities", &self.multiplicities.len())
            .finish_non_exhaustive()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self.sync_view();
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn CellRenderer>) -> Self {
        self.view.set_renderer(renderer);
        self
    }

    pub fn with_style_resolver(mut self, styles: Box<dyn StyleResolver>) -> Self {
        self.view.set_style_resolver(styles);
        self
    }

    /// Replaces the perimeter and edge-style registry (built-ins by default).
    pub fn with_registry(mut self, registry: Registry) -> Self {
        *self.view.registry_mut() = registry;
        self
    }

    pub fn with_policy(mut self, policy: impl GraphPolicy + 'static) -> Self {
        self.policy = Rc::new(policy);
        self.sync_view();
        self
    }

    /// Starts from an existing model. The view is validated right away.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self.view.clear(&self.model, None, true, true);
        self.view.validate(&self.model, None);
        self
    }

    fn sync_view(&mut self) {
        self.view.set_options(ViewOptions {
            grid_size: self.config.grid_size,
            default_loop_style: self.config.default_loop_style.clone(),
        });
        let hooks: Rc<dyn ViewHooks> = self.policy.clone();
        self.view.set_hooks(Some(hooks));
    }

    // --- accessors ----------------------------------------------------------------------------

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Direct model access. Edits made here are processed by the next commit of
    /// [`Graph::end_update`], so wrap them in [`Graph::batch_update`].
    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn view(&self) -> &GraphView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut GraphView {
        &mut self.view
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GraphConfig) {
        self.config = config;
        self.sync_view();
    }

    pub fn policy(&self) -> &dyn GraphPolicy {
        self.policy.as_ref()
    }

    pub fn multiplicities(&self) -> &[Multiplicity] {
        &self.multiplicities
    }

    pub fn set_multiplicities(&mut self, multiplicities: Vec<Multiplicity>) {
        self.multiplicities = multiplicities;
    }

    pub fn add_listener(&mut self, listener: impl FnMut(&GraphEvent) + 'static) -> ListenerId {
        self.events.add_listener(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.events.remove_listener(id)
    }

    pub fn events_mut(&mut self) -> &mut EventSource {
        &mut self.events
    }

    pub(crate) fn fire(&mut self, event: GraphEvent) {
        self.events.fire(&event);
    }

    /// Label text of `cell` as decided by the policy.
    pub fn label(&self, cell: CellId) -> Option<String> {
        self.policy.label(self, cell)
    }

    /// Warning recorded for `cell` by the last [`Graph::validate_graph`].
    pub fn cell_warning(&self, cell: CellId) -> Option<&str> {
        self.warnings.get(&cell).map(String::as_str)
    }

    /// Resolved style of `cell`: the cached state style when the cell has a state, otherwise
    /// resolved from the style sheet.
    pub fn cell_style(&self, cell: CellId) -> Cow<'_, ResolvedStyle> {
        if let Some(state) = self.view.get_state(cell) {
            return Cow::Borrowed(&state.style);
        }
        match self.model.cell(cell) {
            Some(c) => Cow::Owned(ResolvedStyle::from_map(&self.view.styles().cell_style(c))),
            None => Cow::Owned(ResolvedStyle::default()),
        }
    }

    // --- parents and roots --------------------------------------------------------------------

    /// Parent for new cells: the current root, then the explicit default parent, then the first
    /// layer.
    pub fn default_parent(&self) -> CellId {
        self.view
            .current_root()
            .or(self.default_parent)
            .or_else(|| self.model.default_layer())
            .unwrap_or_else(|| self.model.root())
    }

    pub fn set_default_parent(&mut self, parent: Option<CellId>) {
        self.default_parent = parent;
    }

    pub fn current_root(&self) -> Option<CellId> {
        self.view.current_root()
    }

    pub fn is_valid_root(&self, cell: CellId) -> bool {
        self.model.contains(cell) && !self.model.is_edge(cell)
    }

    /// Drills down into `cell`, showing only its subtree.
    pub fn enter_group(&mut self, cell: CellId) {
        if Some(cell) == self.view.current_root() || !self.is_valid_root(cell) {
            return;
        }
        self.view.set_current_root(&self.model, Some(cell));
        self.clear_selection();
        self.fire(GraphEvent::Root { root: Some(cell) });
    }

    /// Moves the current root one valid level up, selecting the group that was left.
    pub fn exit_group(&mut self) {
        let root = self.model.root();
        let Some(current) = self.view.current_root() else {
            return;
        };
        let mut next = self.model.parent(current);
        while let Some(n) = next {
            if n == root || self.is_valid_root(n) || self.model.parent(n) == Some(root) {
                break;
            }
            next = self.model.parent(n);
        }
        let next = match next {
            Some(n) if n != root && self.model.parent(n) != Some(root) => Some(n),
            _ => None,
        };
        self.view.set_current_root(&self.model, next);
        self.fire(GraphEvent::Root { root: next });
        if self.view.get_state(current).is_some() {
            self.set_selection_cells(&[current]);
        }
    }

    /// Shows the whole model again.
    pub fn home(&mut self) {
        if self.view.current_root().is_some() {
            self.view.set_current_root(&self.model, None);
            self.fire(GraphEvent::Root { root: None });
        }
    }

    pub fn refresh(&mut self) {
        self.view.refresh(&self.model);
    }

    // --- transactions -------------------------------------------------------------------------

    pub fn begin_update(&mut self) {
        self.model.begin_update();
    }

    /// Closes a transaction. The outermost close processes the recorded changes.
    pub fn end_update(&mut self) {
        if let Some(changes) = self.model.end_update() {
            self.graph_model_changed(changes);
        }
    }

    /// Runs `f` inside a transaction. The transaction is closed even when `f` fails; edits
    /// applied before the failure stay applied.
    pub fn batch_update<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.begin_update();
        let result = f(self);
        self.end_update();
        result
    }

    fn graph_model_changed(&mut self, changes: Vec<Change>) {
        tracing::debug!(changes = changes.len(), "processing committed changes");
        for change in &changes {
            self.process_change(change);
        }
        self.update_selection();
        self.view.validate(&self.model, None);
        self.size_did_change();
        self.fire(GraphEvent::Change { changes });
        self.model.purge_removed();
    }

    fn size_did_change(&mut self) {
        let bounds = self.view.graph_bounds();
        self.fire(GraphEvent::Size { bounds });
    }

    /// Invalidates whatever the change affects. Validation happens afterwards, once per commit.
    pub fn process_change(&mut self, change: &Change) {
        match change {
            Change::Root { root, previous } => {
                tracing::debug!(root = %root, previous = %previous, "model root changed");
                self.clear_selection();
                self.default_parent = None;
                self.remove_state_for_cell(*previous);
                if self.config.reset_view_on_root_change {
                    self.view.reset_transform(&self.model);
                }
                self.fire(GraphEvent::Root { root: Some(*root) });
            }
            Change::Child {
                child,
                parent,
                previous,
                ..
            } => {
                self.view.invalidate(&self.model, Some(*child), true, true);
                let detached = match parent {
                    None => true,
                    Some(p) => !self.model.contains(*p) || self.model.is_collapsed(*p),
                };
                if detached {
                    self.remove_state_for_cell(*child);
                    if self.view.current_root() == Some(*child) {
                        self.home();
                    }
                }
                if parent != previous {
                    for p in [parent, previous].into_iter().flatten() {
                        self.view.invalidate(&self.model, Some(*p), false, false);
                    }
                }
            }
            Change::Terminal { edge, .. } => {
                self.view.invalidate(&self.model, Some(*edge), true, true);
            }
            Change::Geometry {
                cell,
                geometry,
                previous,
            } => {
                if geometry != previous {
                    self.view.invalidate(&self.model, Some(*cell), true, true);
                }
            }
            Change::Value { cell, .. } => {
                self.view.invalidate(&self.model, Some(*cell), false, false);
            }
            Change::Style { cell, .. } => {
                self.view.invalidate(&self.model, Some(*cell), true, true);
                self.remove_state_for_cell(*cell);
            }
            Change::Collapsed { cell, .. } | Change::Visible { cell, .. } => {
                self.remove_state_for_cell(*cell);
            }
        }
    }

    /// Drops the states of `cell` and its descendants and invalidates the connected edges.
    pub fn remove_state_for_cell(&mut self, cell: CellId) {
        let children = self.model.children(cell).to_vec();
        for child in children {
            self.remove_state_for_cell(child);
        }
        self.view.invalidate(&self.model, Some(cell), false, true);
        self.view.remove_state(cell);
    }

    // --- selection ----------------------------------------------------------------------------

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_cells(&self) -> Vec<CellId> {
        self.selection.cells()
    }

    pub fn is_cell_selected(&self, cell: CellId) -> bool {
        self.selection.contains(cell)
    }

    pub fn set_selection_cells(&mut self, cells: &[CellId]) {
        let cells = self.selectable(cells);
        let delta = self.selection.set(&cells);
        self.selection_changed(delta);
    }

    pub fn add_selection_cells(&mut self, cells: &[CellId]) {
        let cells = self.selectable(cells);
        let delta = self.selection.add(&cells);
        self.selection_changed(delta);
    }

    pub fn remove_selection_cells(&mut self, cells: &[CellId]) {
        let delta = self.selection.remove(cells);
        self.selection_changed(delta);
    }

    pub fn clear_selection(&mut self) {
        let delta = self.selection.clear();
        self.selection_changed(delta);
    }

    fn selectable(&self, cells: &[CellId]) -> Vec<CellId> {
        cells
            .iter()
            .copied()
            .filter(|&c| self.model.has_cell(c) && self.is_cell_selectable(c))
            .collect()
    }

    fn selection_changed(&mut self, (added, removed): (Vec<CellId>, Vec<CellId>)) {
        if !added.is_empty() || !removed.is_empty() {
            self.fire(GraphEvent::SelectionChanged { added, removed });
        }
    }

    /// Deselects cells that left the model or are hidden by a collapsed or invisible ancestor.
    fn update_selection(&mut self) {
        let current_root = self.view.current_root();
        let removed: Vec<CellId> = self
            .selection
            .cells()
            .into_iter()
            .filter(|&cell| {
                if !self.model.contains(cell) || !self.model.is_visible(cell) {
                    return true;
                }
                let mut parent = self.model.parent(cell);
                while let Some(p) = parent {
                    if Some(p) == current_root {
                        break;
                    }
                    if self.model.is_collapsed(p) || !self.model.is_visible(p) {
                        return true;
                    }
                    parent = self.model.parent(p);
                }
                false
            })
            .collect();
        if !removed.is_empty() {
            self.remove_selection_cells(&removed);
        }
    }
}
