use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use trellis::geom::{Point, point, rect};
use trellis::style::ConnectionConstraint;
use trellis::{
    Align, CellId, CellKind, CellRenderer, CellState, Error, Geometry, Graph, GraphConfig,
    GraphEvent, GraphPolicy, ShapeHandle, ViewHooks,
};

#[derive(Default)]
struct Log {
    redraws: Vec<CellId>,
}

struct Recording(Rc<RefCell<Log>>);

impl CellRenderer for Recording {
    fn create_shape(&mut self, state: &CellState) -> Option<ShapeHandle> {
        Some(ShapeHandle(u64::from(state.cell.0)))
    }

    fn redraw(&mut self, state: &mut CellState, _force: bool, _rendering: bool) {
        self.0.borrow_mut().redraws.push(state.cell);
    }

    fn destroy(&mut self, state: &mut CellState) {
        state.shape = None;
    }
}

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
}

fn geo(graph: &Graph, cell: CellId) -> Geometry {
    graph.model().geometry(cell).cloned().unwrap()
}

fn vertex(graph: &mut Graph, parent: Option<CellId>, x: f64, y: f64, w: f64, h: f64) -> CellId {
    graph.insert_vertex(parent, "v", x, y, w, h, None).unwrap()
}

fn pair(graph: &mut Graph) -> (CellId, CellId, CellId) {
    let a = vertex(graph, None, 0.0, 0.0, 100.0, 50.0);
    let b = vertex(graph, None, 200.0, 0.0, 100.0, 50.0);
    let e = graph.insert_edge(None, "", Some(a), Some(b), None).unwrap();
    (a, b, e)
}

#[test]
fn nested_moves_redraw_once_on_commit() {
    let log = Rc::new(RefCell::new(Log::default()));
    let mut graph = Graph::new().with_renderer(Box::new(Recording(log.clone())));
    let a = vertex(&mut graph, None, 0.0, 0.0, 100.0, 50.0);
    log.borrow_mut().redraws.clear();

    graph.begin_update();
    graph.move_cells(&[a], 10.0, 0.0, false, None).unwrap();
    graph.move_cells(&[a], 5.0, 0.0, false, None).unwrap();
    assert!(log.borrow().redraws.is_empty());
    graph.end_update();

    assert_eq!(geo(&graph, a).x, 15.0);
    assert_eq!(log.borrow().redraws.iter().filter(|&&c| c == a).count(), 1);
    assert_eq!(graph.view().get_state(a).unwrap().x, 15.0);
}

#[test]
fn batch_update_closes_the_transaction_on_error() {
    let mut graph = Graph::new();
    let a = vertex(&mut graph, None, 0.0, 0.0, 10.0, 10.0);

    let result: Result<(), Error> = graph.batch_update(|g| {
        g.move_cells(&[a], 10.0, 0.0, false, None)?;
        g.connect_cell(CellId(999), Some(a), true, None)?;
        Ok(())
    });

    assert!(result.is_err());
    assert_eq!(graph.model().update_level(), 0);
    assert_eq!(geo(&graph, a).x, 10.0);
    assert_eq!(graph.view().get_state(a).unwrap().x, 10.0);
}

#[test]
fn moving_a_terminal_reroutes_the_edge() {
    let mut graph = Graph::new();
    let (a, _, e) = pair(&mut graph);
    let before = graph.view().get_state(e).unwrap().first_point().unwrap();

    graph.move_cells(&[a], 0.0, 150.0, false, None).unwrap();

    assert_eq!(graph.model().terminal(e, true), Some(a));
    let first = graph.view().get_state(e).unwrap().first_point().unwrap();
    assert!(!close(first, before), "{first:?}");
    // A now spans (0, 150)..(100, 200); the edge leaves through its top side.
    assert!((first.y - 150.0).abs() < 1e-6, "{first:?}");
    assert!(first.x > 50.0 && first.x < 100.0, "{first:?}");
}

#[test]
fn moving_into_a_target_keeps_the_screen_position() {
    let mut graph = Graph::new();
    let group = vertex(&mut graph, None, 100.0, 100.0, 200.0, 200.0);
    let a = vertex(&mut graph, None, 150.0, 150.0, 20.0, 20.0);

    let moved = graph.move_cells(&[a], 10.0, 0.0, false, Some(group)).unwrap();

    assert_eq!(moved, vec![a]);
    assert_eq!(graph.model().parent(a), Some(group));
    let g = geo(&graph, a);
    assert_eq!((g.x, g.y), (60.0, 50.0));
    let state = graph.view().get_state(a).unwrap();
    assert_eq!((state.x, state.y), (160.0, 150.0));
}

#[test]
fn move_with_clone_leaves_the_original() {
    let mut graph = Graph::new();
    let a = vertex(&mut graph, None, 10.0, 10.0, 20.0, 20.0);
    let layer = graph.default_parent();
    let before = graph.model().child_count(layer);

    let copies = graph.move_cells(&[a], 10.0, 10.0, true, None).unwrap();

    assert_eq!(copies.len(), 1);
    let copy = copies[0];
    assert_ne!(copy, a);
    assert_eq!(graph.model().parent(copy), Some(layer));
    assert_eq!(graph.model().child_count(layer), before + 1);
    assert_eq!((geo(&graph, copy).x, geo(&graph, copy).y), (20.0, 20.0));
    assert_eq!(geo(&graph, a).x, 10.0);
    assert!(graph.view().get_state(copy).is_some());
}

#[test]
fn resize_extends_the_parent_before_constraining() {
    let mut graph = Graph::new();
    let parent = vertex(&mut graph, None, 0.0, 0.0, 100.0, 100.0);
    let child = vertex(&mut graph, Some(parent), 10.0, 10.0, 20.0, 20.0);

    graph
        .resize_cells(&[child], &[rect(10.0, 10.0, 150.0, 20.0)])
        .unwrap();

    assert_eq!(geo(&graph, child).width, 150.0);
    assert_eq!(geo(&graph, parent).width, 160.0);
    assert_eq!(geo(&graph, parent).height, 100.0);
}

#[test]
fn resize_with_mismatched_bounds_is_a_noop() {
    let mut graph = Graph::new();
    let a = vertex(&mut graph, None, 0.0, 0.0, 10.0, 10.0);
    let previous = graph.resize_cells(&[a], &[]).unwrap();
    assert!(previous.is_empty());
    assert_eq!(geo(&graph, a).width, 10.0);
}

#[test]
fn moved_children_stay_inside_their_parent() {
    let mut graph = Graph::new();
    let parent = vertex(&mut graph, None, 0.0, 0.0, 100.0, 100.0);
    let child = vertex(&mut graph, Some(parent), 10.0, 10.0, 20.0, 20.0);

    graph.move_cells(&[child], 200.0, 0.0, false, None).unwrap();
    assert_eq!(geo(&graph, child).x, 80.0);

    graph.move_cells(&[child], -500.0, 0.0, false, None).unwrap();
    assert_eq!(geo(&graph, child).x, 0.0);
    assert_eq!(geo(&graph, parent).width, 100.0);
}

#[test]
fn removing_a_terminal_leaves_a_dangling_end_in_place() {
    let mut graph = Graph::new();
    let (a, b, e) = pair(&mut graph);

    let removed = graph.remove_cells(&[b], false).unwrap();

    assert_eq!(removed, vec![b]);
    assert!(!graph.model().contains(b));
    assert_eq!(graph.model().terminal(e, true), Some(a));
    assert_eq!(graph.model().terminal(e, false), None);
    let end = geo(&graph, e).terminal_point(false).unwrap();
    assert!(close(end, point(200.0, 25.0)), "{end:?}");

    let state = graph.view().get_state(e).unwrap();
    assert!(close(state.last_point().unwrap(), point(200.0, 25.0)));
    assert!(close(state.first_point().unwrap(), point(100.0, 25.0)));
}

#[test]
fn removing_with_edges_takes_connected_edges_along() {
    let mut graph = Graph::new();
    let (a, _, e) = pair(&mut graph);

    let removed = graph.remove_cells(&[a], true).unwrap();

    assert_eq!(removed, vec![a, e]);
    assert!(!graph.model().contains(e));
    assert!(graph.view().get_state(e).is_none());
}

#[test]
fn undeletable_cells_are_kept() {
    let mut graph = Graph::new();
    let a = graph
        .insert_vertex(None, "a", 0.0, 0.0, 10.0, 10.0, Some("deletable=0"))
        .unwrap();
    let removed = graph.remove_cells(&[a], true).unwrap();
    assert!(removed.is_empty());
    assert!(graph.model().contains(a));
}

#[test]
fn re_adding_into_the_same_parent_shifts_the_insertion_index() {
    let mut graph = Graph::new();
    let layer = graph.default_parent();
    let a = vertex(&mut graph, None, 0.0, 0.0, 10.0, 10.0);
    let b = vertex(&mut graph, None, 0.0, 0.0, 10.0, 10.0);
    let c = vertex(&mut graph, None, 0.0, 0.0, 10.0, 10.0);

    graph.add_cells(&[a, b], Some(layer), Some(3), None, None).unwrap();
    assert_eq!(graph.model().children(layer), &[c, a, b]);

    graph.add_cells(&[c], Some(layer), Some(1), None, None).unwrap();
    assert_eq!(graph.model().children(layer), &[a, c, b]);
}

#[test]
fn group_and_ungroup_keep_positions() {
    let mut graph = Graph::new();
    let layer = graph.default_parent();
    let a = vertex(&mut graph, None, 10.0, 10.0, 20.0, 20.0);
    let b = vertex(&mut graph, None, 50.0, 50.0, 20.0, 20.0);

    let group = graph.group_cells(None, 5.0, &[a, b]).unwrap().unwrap();

    assert_eq!(graph.model().parent(a), Some(group));
    assert_eq!(graph.model().parent(group), Some(layer));
    assert_eq!(geo(&graph, group).bounds(), rect(5.0, 5.0, 70.0, 70.0));
    assert_eq!((geo(&graph, a).x, geo(&graph, a).y), (5.0, 5.0));
    assert_eq!((geo(&graph, b).x, geo(&graph, b).y), (45.0, 45.0));
    assert!(!graph.model().is_connectable(group));
    assert_eq!(graph.view().get_state(b).unwrap().x, 50.0);

    let children = graph.ungroup_cells(&[group]).unwrap();

    assert_eq!(children, vec![a, b]);
    assert!(!graph.model().contains(group));
    assert_eq!(graph.model().parent(a), Some(layer));
    assert_eq!((geo(&graph, a).x, geo(&graph, a).y), (10.0, 10.0));
    assert_eq!((geo(&graph, b).x, geo(&graph, b).y), (50.0, 50.0));
}

#[test]
fn grouping_a_single_cell_does_nothing() {
    let mut graph = Graph::new();
    let a = vertex(&mut graph, None, 10.0, 10.0, 20.0, 20.0);
    let layer = graph.default_parent();

    let count = graph.model().cell_count();

    assert_eq!(graph.group_cells(None, 0.0, &[a]).unwrap(), None);
    assert_eq!(graph.model().parent(a), Some(layer));
    assert_eq!(graph.model().cell_count(), count);
}

#[test]
fn ungrouped_children_are_not_clamped_into_the_new_parent() {
    let mut graph = Graph::new().with_config(GraphConfig {
        extend_parents_on_add: false,
        ..GraphConfig::default()
    });
    let outer = vertex(&mut graph, None, 0.0, 0.0, 100.0, 100.0);
    let group = vertex(&mut graph, Some(outer), 60.0, 60.0, 30.0, 30.0);
    let child = vertex(&mut graph, Some(group), 0.0, 0.0, 10.0, 10.0);
    graph
        .batch_update(|g| {
            g.model_mut()
                .set_geometry(child, Some(Geometry::new(30.0, 30.0, 20.0, 20.0)))
        })
        .unwrap();

    let children = graph.ungroup_cells(&[group]).unwrap();

    assert_eq!(children, vec![child]);
    assert_eq!(graph.model().parent(child), Some(outer));
    let g = geo(&graph, child);
    assert_eq!((g.x, g.y), (90.0, 90.0));
}

#[test]
fn order_cells_moves_to_the_back() {
    let mut graph = Graph::new();
    let layer = graph.default_parent();
    let a = vertex(&mut graph, None, 0.0, 0.0, 10.0, 10.0);
    let b = vertex(&mut graph, None, 0.0, 0.0, 10.0, 10.0);
    let c = vertex(&mut graph, None, 0.0, 0.0, 10.0, 10.0);

    graph.order_cells(true, &[c]).unwrap();
    assert_eq!(graph.model().children(layer), &[c, a, b]);

    graph.order_cells(false, &[c]).unwrap();
    assert_eq!(graph.model().children(layer), &[a, b, c]);
}

#[test]
fn align_uses_the_extreme_state_coordinate() {
    let mut graph = Graph::new();
    let a = vertex(&mut graph, None, 10.0, 10.0, 20.0, 20.0);
    let b = vertex(&mut graph, None, 50.0, 50.0, 40.0, 20.0);

    graph.align_cells(Align::Left, &[a, b], None).unwrap();
    assert_eq!(geo(&graph, b).x, 10.0);

    graph.align_cells(Align::Right, &[a, b], None).unwrap();
    assert_eq!(geo(&graph, a).x, 30.0);
    assert_eq!(geo(&graph, b).x, 10.0);

    graph.align_cells(Align::Top, &[a, b], Some(100.0)).unwrap();
    assert_eq!((geo(&graph, a).y, geo(&graph, b).y), (100.0, 100.0));
}

struct Compact;

impl ViewHooks for Compact {}

impl GraphPolicy for Compact {
    fn preferred_size(&self, _graph: &Graph, _cell: CellId) -> Option<(f64, f64)> {
        Some((40.0, 30.0))
    }

    fn is_port(&self, graph: &Graph, cell: CellId) -> bool {
        graph.model().value(cell) == Some(&json!("port"))
    }
}

#[test]
fn folding_swaps_in_the_preferred_size() {
    let mut graph = Graph::new().with_policy(Compact);
    let parent = vertex(&mut graph, None, 10.0, 10.0, 200.0, 200.0);
    vertex(&mut graph, Some(parent), 20.0, 20.0, 40.0, 40.0);
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    graph.add_listener(move |e| {
        if let GraphEvent::CellsFolded { collapse, .. } = e {
            sink.borrow_mut().push(*collapse);
        }
    });

    graph.fold_cells(true, false, &[parent], true).unwrap();
    assert_eq!(geo(&graph, parent).bounds(), rect(10.0, 10.0, 40.0, 30.0));
    assert_eq!(
        geo(&graph, parent).alternate_bounds,
        Some(rect(10.0, 10.0, 200.0, 200.0))
    );

    graph.fold_cells(false, false, &[parent], true).unwrap();
    assert_eq!(geo(&graph, parent).bounds(), rect(10.0, 10.0, 200.0, 200.0));
    assert_eq!(*events.borrow(), vec![true, false]);
}

#[test]
fn leaves_are_not_foldable() {
    let mut graph = Graph::new();
    let leaf = vertex(&mut graph, None, 0.0, 0.0, 10.0, 10.0);
    graph.fold_cells(true, false, &[leaf], true).unwrap();
    assert!(!graph.is_cell_collapsed(leaf));
}

#[test]
fn connecting_to_a_port_uses_its_owner() {
    let mut graph = Graph::new().with_policy(Compact);
    let (_, b, e) = pair(&mut graph);
    let port = graph
        .insert_vertex_with_geometry(
            Some(b),
            "port",
            Geometry::relative(1.0, 0.5).with_size(10.0, 10.0),
            None,
        )
        .unwrap();

    graph.connect_cell(e, Some(port), false, None).unwrap();

    assert_eq!(graph.model().terminal(e, false), Some(b));
    let style = graph.model().style(e).unwrap_or_default().to_string();
    assert!(style.contains(&format!("targetPort={port}")), "{style}");

    graph.connect_cell(e, Some(b), false, None).unwrap();
    assert!(!graph.model().style(e).unwrap_or_default().contains("targetPort"));
}

#[test]
fn connection_constraint_pins_the_entry_point() {
    let mut graph = Graph::new();
    let (_, b, e) = pair(&mut graph);

    let constraint = ConnectionConstraint::new(Some(point(0.5, 1.0)), true);
    graph.connect_cell(e, Some(b), false, Some(constraint)).unwrap();

    assert_eq!(graph.connection_constraint(e, false), Some(constraint));
    let last = graph.view().get_state(e).unwrap().last_point().unwrap();
    assert!(close(last, point(250.0, 50.0)), "{last:?}");

    graph
        .connect_cell(e, Some(b), false, Some(ConnectionConstraint::new(None, true)))
        .unwrap();
    assert_eq!(graph.connection_constraint(e, false), None);
}

#[test]
fn connected_events_report_the_previous_terminal() {
    let mut graph = Graph::new();
    let (a, b, e) = pair(&mut graph);
    let c = vertex(&mut graph, None, 0.0, 200.0, 10.0, 10.0);
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    graph.add_listener(move |ev| {
        if matches!(ev, GraphEvent::CellConnected { .. }) {
            sink.borrow_mut().push(ev.clone());
        }
    });

    graph.connect_cell(e, Some(c), true, None).unwrap();

    assert_eq!(
        *events.borrow(),
        vec![GraphEvent::CellConnected {
            edge: e,
            terminal: Some(c),
            source: true,
            previous: Some(a),
        }]
    );
    assert_eq!(graph.model().edges_between(c, b, true), vec![e]);
}

#[test]
fn hiding_cells_drops_their_states() {
    let mut graph = Graph::new();
    let (a, b, e) = pair(&mut graph);

    let toggled = graph.toggle_cells(false, &[a], true).unwrap();

    assert_eq!(toggled, vec![a, e]);
    assert!(graph.view().get_state(a).is_none());
    assert!(graph.view().get_state(e).is_none());
    assert!(graph.view().get_state(b).is_some());

    graph.toggle_cells(true, &[a], true).unwrap();
    assert!(graph.view().get_state(e).is_some());
}

#[test]
fn label_changes_report_the_previous_value() {
    let mut graph = Graph::new();
    let a = graph.insert_vertex(None, "old", 0.0, 0.0, 10.0, 10.0, None).unwrap();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    graph.add_listener(move |ev| {
        if let GraphEvent::LabelChanged { value, previous, .. } = ev {
            sink.borrow_mut().push((value.clone(), previous.clone()));
        }
    });

    graph.label_changed(a, "new").unwrap();

    assert_eq!(graph.label(a).as_deref(), Some("new"));
    assert_eq!(*events.borrow(), vec![(json!("new"), json!("old"))]);
}

#[test]
fn locked_relative_vertices_are_not_movable() {
    let mut graph = Graph::new();
    let a = vertex(&mut graph, None, 0.0, 0.0, 100.0, 100.0);
    let label = graph
        .insert_vertex_with_geometry(Some(a), "l", Geometry::relative(0.5, 0.5), None)
        .unwrap();

    assert!(graph.is_cell_locked(label));
    assert!(!graph.is_cell_movable(label));
    assert!(graph.is_cell_movable(a));
    assert!(graph.is_cell_foldable(a, true));
}

#[test]
fn removed_cells_are_freed_from_the_model() {
    let mut graph = Graph::new();
    let count = graph.model().cell_count();
    let (a, b, e) = pair(&mut graph);

    graph.remove_cells(&[a, b], true).unwrap();

    assert_eq!(graph.model().cell_count(), count);
    assert!(!graph.model().has_cell(e));
    assert!(graph.view().get_state(e).is_none());
}

#[test]
fn moving_into_a_detached_parent_drops_the_state() {
    let mut graph = Graph::new();
    let a = vertex(&mut graph, None, 0.0, 0.0, 10.0, 10.0);
    assert!(graph.view().get_state(a).is_some());
    let holder = graph
        .model_mut()
        .create_cell(CellKind::Vertex, json!(null), None, None);

    graph.batch_update(|g| g.model_mut().add(holder, a, None)).unwrap();

    assert_eq!(graph.model().parent(a), Some(holder));
    assert!(graph.view().get_state(a).is_none());
}

#[test]
fn malformed_style_values_are_rejected() {
    let mut graph = Graph::new();
    let a = vertex(&mut graph, None, 0.0, 0.0, 10.0, 10.0);

    let err = graph
        .set_cell_styles("fillColor", Some("red;shape=ellipse"), &[a])
        .unwrap_err();

    assert!(matches!(err, Error::InvalidStyleValue { .. }));
    assert_eq!(graph.model().style(a), None);
}

#[test]
fn root_change_validates_once_at_the_new_scale() {
    let log = Rc::new(RefCell::new(Log::default()));
    let mut graph = Graph::new().with_renderer(Box::new(Recording(log.clone())));
    vertex(&mut graph, None, 0.0, 0.0, 10.0, 10.0);
    graph.zoom_to(2.0);
    log.borrow_mut().redraws.clear();

    graph.begin_update();
    let root = graph.model_mut().clear().unwrap();
    let layer = graph.model().children(root)[0];
    let v = vertex(&mut graph, Some(layer), 10.0, 20.0, 30.0, 40.0);
    graph.end_update();

    assert_eq!(graph.view().scale(), 1.0);
    let redraws = log.borrow().redraws.iter().filter(|&&c| c == v).count();
    assert_eq!(redraws, 1);
    let state = graph.view().get_state(v).unwrap();
    assert_eq!((state.x, state.y, state.width), (10.0, 20.0, 30.0));
}
