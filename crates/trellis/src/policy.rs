//! Extension points of the graph.
//!
//! A [`GraphPolicy`] is supplied at construction (see [`crate::Graph::with_policy`]). Every method
//! has a default, so implementors override only what they need. The policy is also the view's
//! [`ViewHooks`] implementation.

use crate::Graph;
use trellis_core::CellId;
use trellis_view::ViewHooks;

pub trait GraphPolicy: ViewHooks {
    /// Extra validation for a connection between two terminals. `None` accepts it, `Some("")`
    /// rejects it silently and any other string is appended to the validation message.
    fn validate_edge(
        &self,
        _graph: &Graph,
        _edge: Option<CellId>,
        _source: CellId,
        _target: CellId,
    ) -> Option<String> {
        None
    }

    /// Extra validation for a single cell, appended to the warning of `validate_graph`.
    fn validate_cell(&self, _graph: &Graph, _cell: CellId) -> Option<String> {
        None
    }

    /// Whether `cell` is a port: connecting to it connects the edge to
    /// [`GraphPolicy::terminal_for_port`] and records the port id in the edge style.
    fn is_port(&self, _graph: &Graph, _cell: CellId) -> bool {
        false
    }

    fn terminal_for_port(&self, graph: &Graph, port: CellId, _source: bool) -> Option<CellId> {
        graph.model().parent(port)
    }

    /// Size a cell collapses to when it has no alternate bounds yet.
    fn preferred_size(&self, _graph: &Graph, _cell: CellId) -> Option<(f64, f64)> {
        None
    }

    fn is_valid_source(&self, graph: &Graph, cell: Option<CellId>) -> bool {
        graph.is_valid_terminal(cell)
    }

    fn is_valid_target(&self, graph: &Graph, cell: Option<CellId>) -> bool {
        graph.is_valid_terminal(cell)
    }

    /// Text shown for the cell. Strings are used verbatim; other JSON values are serialized.
    fn label(&self, graph: &Graph, cell: CellId) -> Option<String> {
        match graph.model().value(cell)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Policy with every default.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPolicy;

impl ViewHooks for DefaultPolicy {}

impl GraphPolicy for DefaultPolicy {}
