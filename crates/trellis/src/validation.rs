//! Edge and cell validation.
//!
//! Validation results are data, never errors: `None` means valid, `Some("")` invalid without a
//! message, and any other string carries newline-terminated messages.

use crate::Graph;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trellis_core::CellId;

pub const ALREADY_CONNECTED: &str = "Nodes already connected";
pub const CONTAINS_VALIDATION_ERRORS: &str = "Contains validation errors";

/// Cardinality rule for the terminals of a given type.
///
/// A terminal matches when its value is the string `node_type`, or an object whose `"type"` is
/// `node_type` (and whose `attr` equals `value` when `attr` is set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Multiplicity {
    /// Rule applies to outgoing edges of sources (`true`) or incoming edges of targets.
    pub source: bool,
    pub node_type: String,
    pub attr: Option<String>,
    pub value: Option<String>,
    pub min: usize,
    /// `None` is unbounded. `Some(0)` forbids any edge.
    pub max: Option<usize>,
    pub valid_neighbors: Vec<String>,
    /// Whether `valid_neighbors` lists allowed (`true`) or forbidden neighbour types.
    pub valid_neighbors_allowed: bool,
    pub count_error: Option<String>,
    pub type_error: Option<String>,
}

impl Default for Multiplicity {
    fn default() -> Self {
        Self {
            source: true,
            node_type: String::new(),
            attr: None,
            value: None,
            min: 0,
            max: None,
            valid_neighbors: Vec::new(),
            valid_neighbors_allowed: true,
            count_error: None,
            type_error: None,
        }
    }
}

impl Multiplicity {
    pub fn new(source: bool, node_type: impl Into<String>) -> Self {
        Self {
            source,
            node_type: node_type.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, attr: impl Into<String>, value: impl Into<String>) -> Self {
        self.attr = Some(attr.into());
        self.value = Some(value.into());
        self
    }

    pub fn with_count(mut self, min: usize, max: Option<usize>, error: impl Into<String>) -> Self {
        self.min = min;
        self.max = max;
        self.count_error = Some(error.into());
        self
    }

    pub fn with_neighbors(
        mut self,
        neighbors: impl IntoIterator<Item = impl Into<String>>,
        allowed: bool,
        error: impl Into<String>,
    ) -> Self {
        self.valid_neighbors = neighbors.into_iter().map(Into::into).collect();
        self.valid_neighbors_allowed = allowed;
        self.type_error = Some(error.into());
        self
    }

    /// Messages for connecting `source` to `target`, given the edge counts excluding the edge
    /// being checked.
    pub fn check(
        &self,
        graph: &Graph,
        source: CellId,
        target: CellId,
        source_out: usize,
        target_in: usize,
    ) -> Option<String> {
        let model = graph.model();
        let terminal = if self.source { source } else { target };
        if !self.matches(model.value(terminal)) {
            return None;
        }
        let mut error = String::new();
        let count = if self.source { source_out } else { target_in };
        if let Some(msg) = &self.count_error {
            if self.max.is_some_and(|max| max == 0 || count >= max) {
                error.push_str(msg);
                error.push('\n');
            }
        }
        if let Some(msg) = &self.type_error {
            if !self.valid_neighbors.is_empty() && !self.check_neighbors(graph, source, target) {
                error.push_str(msg);
                error.push('\n');
            }
        }
        (!error.is_empty()).then_some(error)
    }

    fn check_neighbors(&self, graph: &Graph, source: CellId, target: CellId) -> bool {
        let other = if self.source { target } else { source };
        let value = graph.model().value(other);
        let listed = self
            .valid_neighbors
            .iter()
            .any(|t| check_type(value, t, None, None));
        if listed {
            self.valid_neighbors_allowed
        } else {
            !self.valid_neighbors_allowed
        }
    }

    pub fn matches(&self, value: Option<&Value>) -> bool {
        check_type(
            value,
            &self.node_type,
            self.attr.as_deref(),
            self.value.as_deref(),
        )
    }
}

fn check_type(value: Option<&Value>, node_type: &str, attr: Option<&str>, expected: Option<&str>) -> bool {
    match value {
        Some(Value::String(s)) => s == node_type,
        Some(Value::Object(map)) => {
            let type_ok = map.get("type").and_then(Value::as_str) == Some(node_type);
            let attr_ok = match attr {
                None => true,
                Some(a) => match map.get(a) {
                    Some(Value::String(s)) => Some(s.as_str()) == expected,
                    Some(other) => expected.is_some_and(|e| other.to_string() == e),
                    None => false,
                },
            };
            type_ok && attr_ok
        }
        _ => false,
    }
}

impl Graph {
    /// Why connecting `edge` (or a new edge) from `source` to `target` is not allowed.
    ///
    /// Rules run in a fixed order: dangling ends, pure-label edges (no terminals at all are
    /// valid), loops, the source/target predicates, then for two terminals the multigraph rule,
    /// the multiplicities and the policy's `validate_edge`.
    pub fn edge_validation_error(
        &self,
        edge: Option<CellId>,
        source: Option<CellId>,
        target: Option<CellId>,
    ) -> Option<String> {
        if edge.is_some()
            && !self.config.allow_dangling_edges
            && (source.is_none() || target.is_none())
        {
            return Some(String::new());
        }
        if let Some(e) = edge {
            if self.model.terminal(e, true).is_none() && self.model.terminal(e, false).is_none() {
                return None;
            }
        }
        if !self.config.allow_loops && source.is_some() && source == target {
            return Some(String::new());
        }
        if !self.is_valid_connection(source, target) {
            return Some(String::new());
        }

        let (Some(source), Some(target)) = (source, target) else {
            return if self.config.allow_dangling_edges {
                None
            } else {
                Some(String::new())
            };
        };

        let mut error = String::new();
        if !self.config.multigraph {
            let existing = self.model.edges_between(source, target, true);
            if existing.len() > 1 || (existing.len() == 1 && Some(existing[0]) != edge) {
                error.push_str(ALREADY_CONNECTED);
                error.push('\n');
            }
        }

        let source_out = self.model.directed_edge_count(source, true, edge);
        let target_in = self.model.directed_edge_count(target, false, edge);
        for rule in &self.multiplicities {
            if let Some(msg) = rule.check(self, source, target, source_out, target_in) {
                error.push_str(&msg);
            }
        }

        if let Some(msg) = self.policy.validate_edge(self, edge, source, target) {
            error.push_str(&msg);
        }
        (!error.is_empty()).then_some(error)
    }

    pub fn is_edge_valid(
        &self,
        edge: Option<CellId>,
        source: Option<CellId>,
        target: Option<CellId>,
    ) -> bool {
        self.edge_validation_error(edge, source, target).is_none()
    }

    /// Count violations of the multiplicities for `cell` as a terminal.
    pub fn cell_validation_error(&self, cell: CellId) -> Option<String> {
        let out_count = self.model.directed_edge_count(cell, true, None);
        let in_count = self.model.directed_edge_count(cell, false, None);
        let value = self.model.value(cell);
        let mut error = String::new();
        for rule in &self.multiplicities {
            if !rule.matches(value) {
                continue;
            }
            let count = if rule.source { out_count } else { in_count };
            if count > rule.max.unwrap_or(usize::MAX) || count < rule.min {
                if let Some(msg) = &rule.count_error {
                    error.push_str(msg);
                }
                error.push('\n');
            }
        }
        (!error.is_empty()).then_some(error)
    }

    /// Validates the subtree of `cell` (the model root by default), recording a warning per
    /// invalid cell (see [`Graph::cell_warning`]). Returns the warning of `cell` itself; a cell
    /// with invalid descendants is invalid even without its own message.
    pub fn validate_graph(&mut self, cell: Option<CellId>) -> Option<String> {
        let cell = cell.unwrap_or_else(|| self.model.root());
        let mut children_valid = true;
        for child in self.model.children(cell).to_vec() {
            let warning = self.validate_graph(Some(child));
            match &warning {
                Some(w) => {
                    self.warnings.insert(child, w.clone());
                }
                None => {
                    self.warnings.remove(&child);
                }
            }
            children_valid &= warning.is_none();
        }

        let mut warning = String::new();
        if self.model.is_collapsed(cell) && !children_valid {
            warning.push_str(CONTAINS_VALIDATION_ERRORS);
            warning.push('\n');
        }
        let own = if self.model.is_edge(cell) {
            self.edge_validation_error(
                Some(cell),
                self.model.terminal(cell, true),
                self.model.terminal(cell, false),
            )
        } else {
            self.cell_validation_error(cell)
        };
        if let Some(msg) = own {
            warning.push_str(&msg);
        }
        if let Some(msg) = self.policy.validate_cell(self, cell) {
            warning.push_str(&msg);
        }

        if self.model.parent(cell).is_none() {
            self.view.validate(&self.model, None);
        }
        (!warning.is_empty() || !children_valid).then_some(warning)
    }
}
