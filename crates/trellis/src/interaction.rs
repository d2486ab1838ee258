//! Pointer event dispatch.
//!
//! The host feeds raw pointer events into an [`InteractionDispatcher`] together with a timestamp.
//! The dispatcher resolves the cell under the pointer, hands the event to every registered
//! [`MouseListener`] in order and derives clicks, double taps and tap-and-hold gestures from
//! the stream. Time never advances on its own: pending tap-and-hold gestures fire from
//! [`InteractionDispatcher::tick`].

use crate::{Graph, GraphEvent};
use trellis_core::CellId;
use trellis_core::geom::point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Down,
    Move,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
    Pen,
}

/// One pointer event as seen by the listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct MouseEventContext {
    /// Client coordinates of the source event.
    pub x: f64,
    pub y: f64,
    /// Coordinates relative to the graph container, i.e. the space of the cell states.
    pub graph_x: f64,
    pub graph_y: f64,
    /// Cell under the pointer; resolved by hit testing when not set by the host.
    pub cell: Option<CellId>,
    pub pointer: PointerKind,
    pub button: u16,
    pub time_ms: u64,
    consumed: bool,
}

impl MouseEventContext {
    pub fn new(x: f64, y: f64, time_ms: u64) -> Self {
        Self {
            x,
            y,
            graph_x: x,
            graph_y: y,
            cell: None,
            pointer: PointerKind::Mouse,
            button: 0,
            time_ms,
            consumed: false,
        }
    }

    pub fn touch(x: f64, y: f64, time_ms: u64) -> Self {
        Self {
            pointer: PointerKind::Touch,
            ..Self::new(x, y, time_ms)
        }
    }

    /// Sets container-relative coordinates when the container is offset from the client origin.
    pub fn with_graph_point(mut self, graph_x: f64, graph_y: f64) -> Self {
        self.graph_x = graph_x;
        self.graph_y = graph_y;
        self
    }

    pub fn with_cell(mut self, cell: Option<CellId>) -> Self {
        self.cell = cell;
        self
    }

    pub fn with_button(mut self, button: u16) -> Self {
        self.button = button;
        self
    }

    pub fn is_touch(&self) -> bool {
        self.pointer != PointerKind::Mouse
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    pub fn consume(&mut self) {
        self.consumed = true;
    }

    /// Graph coordinates mapped back into model space.
    pub fn model_point(&self, graph: &Graph) -> trellis_core::Point {
        let s = graph.view().scale();
        let tr = graph.view().translate();
        point(self.graph_x / s - tr.x, self.graph_y / s - tr.y)
    }
}

/// Receives every dispatched event. Listeners run in registration order and see events that
/// earlier listeners consumed; they check [`MouseEventContext::is_consumed`] themselves.
pub trait MouseListener {
    fn mouse_down(&mut self, _graph: &mut Graph, _me: &mut MouseEventContext) {}
    fn mouse_move(&mut self, _graph: &mut Graph, _me: &mut MouseEventContext) {}
    fn mouse_up(&mut self, _graph: &mut Graph, _me: &mut MouseEventContext) {}
}

#[derive(Debug, Clone, Copy)]
struct Touch {
    time_ms: u64,
    x: f64,
    y: f64,
    cell: Option<CellId>,
}

#[derive(Default)]
pub struct InteractionDispatcher {
    listeners: Vec<Box<dyn MouseListener>>,
    mouse_down: bool,
    down_at: Option<(f64, f64)>,
    last_touch: Option<Touch>,
    hold: Option<Touch>,
}

impl std::fmt::Debug for InteractionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionDispatcher")
            .field("listeners", &self.listeners.len())
            .field("mouse_down", &self.mouse_down)
            .finish_non_exhaustive()
    }
}

impl InteractionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: Box<dyn MouseListener>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_mouse_down(&self) -> bool {
        self.mouse_down
    }

    pub fn has_pending_hold(&self) -> bool {
        self.hold.is_some()
    }

    pub fn dispatch(&mut self, graph: &mut Graph, kind: MouseEventKind, me: &mut MouseEventContext) {
        if me.cell.is_none() {
            me.cell = graph.get_cell_at(me.graph_x, me.graph_y, None);
        }
        let tolerance = graph.config().double_tap_tolerance;

        match kind {
            MouseEventKind::Down => {
                self.mouse_down = true;
                self.down_at = Some((me.graph_x, me.graph_y));
                if me.is_touch() {
                    self.detect_double_tap(graph, me);
                    self.hold = Some(Touch {
                        time_ms: me.time_ms,
                        x: me.graph_x,
                        y: me.graph_y,
                        cell: me.cell,
                    });
                }
            }
            MouseEventKind::Move => {
                if let Some(h) = self.hold {
                    if (h.x - me.graph_x).abs() > tolerance || (h.y - me.graph_y).abs() > tolerance {
                        self.hold = None;
                    }
                }
            }
            MouseEventKind::Up => {
                self.hold = None;
            }
        }

        for listener in &mut self.listeners {
            match kind {
                MouseEventKind::Down => listener.mouse_down(graph, me),
                MouseEventKind::Move => listener.mouse_move(graph, me),
                MouseEventKind::Up => listener.mouse_up(graph, me),
            }
        }

        if kind == MouseEventKind::Up {
            self.click(graph, me);
            self.mouse_down = false;
            self.down_at = None;
        }
    }

    /// A second touch within the double-tap timeout and tolerance of the first is a double
    /// click on the cell of the first touch.
    fn detect_double_tap(&mut self, graph: &mut Graph, me: &mut MouseEventContext) {
        let config = graph.config();
        let (timeout, tolerance) = (config.double_tap_timeout_ms, config.double_tap_tolerance);
        if let Some(last) = self.last_touch {
            if me.time_ms.saturating_sub(last.time_ms) < timeout
                && (last.x - me.graph_x).abs() < tolerance
                && (last.y - me.graph_y).abs() < tolerance
            {
                self.last_touch = None;
                self.double_click(graph, me, last.cell);
                return;
            }
        }
        self.last_touch = Some(Touch {
            time_ms: me.time_ms,
            x: me.graph_x,
            y: me.graph_y,
            cell: me.cell,
        });
    }

    fn click(&mut self, graph: &mut Graph, me: &MouseEventContext) {
        if me.is_consumed() || !self.mouse_down {
            return;
        }
        let tolerance = graph.config().tolerance;
        if let Some((x, y)) = self.down_at {
            if (x - me.graph_x).abs() > tolerance || (y - me.graph_y).abs() > tolerance {
                return;
            }
        }
        graph.fire(GraphEvent::Click {
            cell: me.cell,
            x: me.graph_x,
            y: me.graph_y,
        });
    }

    /// Native double-click from the host.
    pub fn dispatch_double_click(&mut self, graph: &mut Graph, me: &mut MouseEventContext) {
        if me.cell.is_none() {
            me.cell = graph.get_cell_at(me.graph_x, me.graph_y, None);
        }
        let cell = me.cell;
        self.double_click(graph, me, cell);
    }

    fn double_click(&mut self, graph: &mut Graph, me: &mut MouseEventContext, cell: Option<CellId>) {
        if me.is_consumed() {
            return;
        }
        graph.fire(GraphEvent::DoubleClick {
            cell,
            x: me.graph_x,
            y: me.graph_y,
        });
        me.consume();
    }

    /// Fires a pending tap-and-hold once the pointer has been held still for the configured
    /// delay. Returns whether it fired.
    pub fn tick(&mut self, graph: &mut Graph, now_ms: u64) -> bool {
        let Some(hold) = self.hold else {
            return false;
        };
        if now_ms.saturating_sub(hold.time_ms) < graph.config().tap_and_hold_delay_ms {
            return false;
        }
        self.hold = None;
        tracing::trace!(cell = ?hold.cell, "tap and hold");
        graph.fire(GraphEvent::TapAndHold {
            cell: hold.cell,
            x: hold.x,
            y: hold.y,
        });
        true
    }
}
