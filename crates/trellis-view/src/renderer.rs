//! Contract with the drawing backend.

use crate::state::CellState;

/// Opaque handle to a backend shape owned by a [`CellState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeHandle(pub u64);

/// Draws cell states. The view calls `create_shape` for vertices and edges that have no shape
/// yet, `redraw` after every recomputation and `destroy` when a state is removed.
pub trait CellRenderer {
    fn create_shape(&mut self, state: &CellState) -> Option<ShapeHandle>;

    fn redraw(&mut self, state: &mut CellState, force: bool, rendering: bool);

    fn destroy(&mut self, state: &mut CellState);

    /// Orders the state's nodes after the given ones; returns the nodes the next state should
    /// follow.
    fn insert_state_after(
        &mut self,
        state: &CellState,
        node: Option<ShapeHandle>,
        html_node: Option<ShapeHandle>,
    ) -> (Option<ShapeHandle>, Option<ShapeHandle>) {
        (state.shape.or(node), html_node)
    }
}

/// Hands out handles and draws nothing.
#[derive(Debug, Default)]
pub struct NullRenderer {
    next: u64,
}

impl CellRenderer for NullRenderer {
    fn create_shape(&mut self, _state: &CellState) -> Option<ShapeHandle> {
        self.next += 1;
        Some(ShapeHandle(self.next))
    }

    fn redraw(&mut self, _state: &mut CellState, _force: bool, _rendering: bool) {}

    fn destroy(&mut self, state: &mut CellState) {
        state.shape = None;
    }
}
