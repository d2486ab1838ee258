use std::cell::RefCell;
use std::rc::Rc;
use trellis::geom::{Point, point};
use trellis::{CellId, CellRenderer, CellState, Graph, GraphEvent, ShapeHandle};

#[derive(Default)]
struct Log {
    created: usize,
    redraws: Vec<CellId>,
    destroyed: Vec<CellId>,
}

struct Recording(Rc<RefCell<Log>>);

impl CellRenderer for Recording {
    fn create_shape(&mut self, state: &CellState) -> Option<ShapeHandle> {
        self.0.borrow_mut().created += 1;
        Some(ShapeHandle(u64::from(state.cell.0)))
    }

    fn redraw(&mut self, state: &mut CellState, _force: bool, _rendering: bool) {
        self.0.borrow_mut().redraws.push(state.cell);
    }

    fn destroy(&mut self, state: &mut CellState) {
        self.0.borrow_mut().destroyed.push(state.cell);
        state.shape = None;
    }
}

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
}

fn ends(graph: &Graph, edge: CellId) -> (Point, Point) {
    let state = graph.view().get_state(edge).unwrap();
    (state.first_point().unwrap(), state.last_point().unwrap())
}

/// Two vertices side by side joined by an edge.
fn pair(graph: &mut Graph) -> (CellId, CellId, CellId) {
    let a = graph.insert_vertex(None, "A", 0.0, 0.0, 100.0, 50.0, None).unwrap();
    let b = graph.insert_vertex(None, "B", 200.0, 0.0, 100.0, 50.0, None).unwrap();
    let e = graph.insert_edge(None, "", Some(a), Some(b), None).unwrap();
    (a, b, e)
}

fn record_events(graph: &mut Graph) -> Rc<RefCell<Vec<GraphEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    graph.add_listener(move |e| sink.borrow_mut().push(e.clone()));
    events
}

#[test]
fn inserted_edge_ends_on_facing_perimeters() {
    let mut graph = Graph::new();
    let (a, b, e) = pair(&mut graph);

    assert_eq!(graph.model().terminal(e, true), Some(a));
    assert_eq!(graph.model().terminal(e, false), Some(b));
    let (first, last) = ends(&graph, e);
    assert!(close(first, point(100.0, 25.0)), "{first:?}");
    assert!(close(last, point(200.0, 25.0)), "{last:?}");
}

#[test]
fn default_parent_is_the_first_layer() {
    let graph = Graph::new();
    assert_eq!(Some(graph.default_parent()), graph.model().default_layer());
}

#[test]
fn get_cell_at_prefers_later_siblings_and_edges_within_tolerance() {
    let mut graph = Graph::new();
    let (a, b, e) = pair(&mut graph);

    assert_eq!(graph.get_cell_at(50.0, 25.0, None), Some(a));
    assert_eq!(graph.get_cell_at(250.0, 25.0, None), Some(b));
    assert_eq!(graph.get_cell_at(150.0, 27.0, None), Some(e));
    assert_eq!(graph.get_cell_at(150.0, 40.0, None), None);
    assert_eq!(graph.get_cell_at_filtered(150.0, 25.0, None, true, false), None);

    let over = graph.insert_vertex(None, "C", 40.0, 10.0, 20.0, 20.0, None).unwrap();
    assert_eq!(graph.get_cell_at(50.0, 20.0, None), Some(over));
}

#[test]
fn children_are_hit_before_their_parent() {
    let mut graph = Graph::new();
    let parent = graph.insert_vertex(None, "P", 0.0, 0.0, 200.0, 200.0, None).unwrap();
    let child = graph
        .insert_vertex(Some(parent), "C", 20.0, 20.0, 40.0, 40.0, None)
        .unwrap();

    assert_eq!(graph.get_cell_at(40.0, 40.0, None), Some(child));
    assert_eq!(graph.get_cell_at(150.0, 150.0, None), Some(parent));
}

#[test]
fn collapsing_removes_descendant_states() {
    let mut graph = Graph::new();
    let parent = graph.insert_vertex(None, "P", 0.0, 0.0, 200.0, 200.0, None).unwrap();
    let child = graph
        .insert_vertex(Some(parent), "C", 20.0, 20.0, 40.0, 40.0, None)
        .unwrap();
    assert!(graph.view().get_state(child).is_some());

    graph.fold_cells(true, false, &[parent], true).unwrap();

    assert!(graph.is_cell_collapsed(parent));
    assert!(graph.view().get_state(child).is_none());
    assert!(graph.view().get_state(parent).is_some());
    assert_ne!(graph.get_cell_at(40.0, 40.0, None), Some(child));

    graph.fold_cells(false, false, &[parent], true).unwrap();
    assert!(graph.view().get_state(child).is_some());
}

#[test]
fn style_change_recreates_the_state() {
    let log = Rc::new(RefCell::new(Log::default()));
    let mut graph = Graph::new().with_renderer(Box::new(Recording(log.clone())));
    let a = graph.insert_vertex(None, "A", 0.0, 0.0, 100.0, 50.0, None).unwrap();
    let created = log.borrow().created;

    graph.set_cell_styles("fillColor", Some("red"), &[a]).unwrap();

    assert!(log.borrow().destroyed.contains(&a));
    assert_eq!(log.borrow().created, created + 1);
    assert_eq!(graph.model().style(a), Some("fillColor=red"));
    assert_eq!(
        graph.view().get_state(a).unwrap().style.raw.get("fillColor").map(String::as_str),
        Some("red")
    );
}

#[test]
fn entering_a_group_makes_it_the_view_root() {
    let mut graph = Graph::new();
    let group = graph.insert_vertex(None, "G", 100.0, 100.0, 200.0, 200.0, None).unwrap();
    let child = graph
        .insert_vertex(Some(group), "C", 10.0, 10.0, 40.0, 40.0, None)
        .unwrap();
    let leaf = graph.insert_vertex(None, "L", 0.0, 0.0, 10.0, 10.0, None).unwrap();
    let events = record_events(&mut graph);

    graph.enter_group(group);
    assert_eq!(graph.current_root(), Some(group));
    assert_eq!(graph.default_parent(), group);
    let state = graph.view().get_state(child).unwrap();
    assert_eq!((state.x, state.y), (10.0, 10.0));
    assert!(graph.view().get_state(leaf).is_none());
    assert!(
        events
            .borrow()
            .iter()
            .any(|e| *e == GraphEvent::Root { root: Some(group) })
    );

    graph.home();
    assert_eq!(graph.current_root(), None);
    assert_eq!(graph.view().get_state(child).unwrap().x, 110.0);
    assert!(graph.view().get_state(leaf).is_some());
}

#[test]
fn edges_and_leaves_are_not_valid_roots() {
    let mut graph = Graph::new();
    let (_, _, e) = pair(&mut graph);
    assert!(!graph.is_valid_root(e));

    graph.enter_group(e);
    assert_eq!(graph.current_root(), None);
}

#[test]
fn zoom_rounds_to_two_decimals_and_fires_scale() {
    let mut graph = Graph::new();
    let a = graph.insert_vertex(None, "A", 10.0, 10.0, 100.0, 50.0, None).unwrap();
    let events = record_events(&mut graph);

    graph.zoom_in();
    assert_eq!(graph.view().scale(), 1.2);
    assert_eq!(graph.view().get_state(a).unwrap().width, 120.0);

    graph.zoom_out();
    assert_eq!(graph.view().scale(), 1.0);

    graph.zoom_to(2.0);
    assert_eq!(graph.view().get_state(a).unwrap().x, 20.0);

    graph.zoom_actual();
    assert_eq!(graph.view().scale(), 1.0);

    let scales: Vec<f64> = events
        .borrow()
        .iter()
        .filter_map(|e| match e {
            GraphEvent::Scale { scale, .. } => Some(*scale),
            _ => None,
        })
        .collect();
    assert_eq!(scales, vec![1.2, 1.0, 2.0, 1.0]);
}

#[test]
fn fit_scales_graph_bounds_into_the_viewport() {
    let mut graph = Graph::new();
    pair(&mut graph);
    let bounds = graph.graph_bounds();
    assert_eq!(bounds.size.width, 300.0);
    assert_eq!(bounds.size.height, 50.0);

    let scale = graph.fit(601.0, 101.0, 0.0, false, 0.0);
    assert_eq!(scale, 2.0);
    assert_eq!(graph.graph_bounds().size.width, 600.0);
}

#[test]
fn fit_leaves_an_empty_graph_alone() {
    let mut graph = Graph::new();
    assert_eq!(graph.fit(800.0, 600.0, 10.0, false, 0.0), 1.0);
}

#[test]
fn removed_cells_leave_the_selection() {
    let mut graph = Graph::new();
    let (a, b, _) = pair(&mut graph);
    let events = record_events(&mut graph);

    graph.set_selection_cells(&[a, b]);
    assert!(graph.is_cell_selected(a));
    graph.remove_cells(&[a], true).unwrap();

    assert_eq!(graph.selection_cells(), vec![b]);
    let changes: Vec<GraphEvent> = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, GraphEvent::SelectionChanged { .. }))
        .cloned()
        .collect();
    assert_eq!(
        changes.last(),
        Some(&GraphEvent::SelectionChanged {
            added: Vec::new(),
            removed: vec![a],
        })
    );
}

#[test]
fn clear_selection_fires_only_when_something_changes() {
    let mut graph = Graph::new();
    let (a, _, _) = pair(&mut graph);
    let events = record_events(&mut graph);

    graph.clear_selection();
    assert!(events.borrow().is_empty());

    graph.add_selection_cells(&[a]);
    graph.clear_selection();
    assert!(graph.selection().is_empty());
    assert_eq!(events.borrow().len(), 2);
}

#[test]
fn one_change_event_per_outermost_transaction() {
    let mut graph = Graph::new();
    let events = record_events(&mut graph);

    graph.begin_update();
    let a = graph.insert_vertex(None, "A", 0.0, 0.0, 10.0, 10.0, None).unwrap();
    graph.insert_vertex(None, "B", 20.0, 0.0, 10.0, 10.0, None).unwrap();
    assert!(graph.view().get_state(a).is_none());
    graph.end_update();

    let events = events.borrow();
    let changes = events
        .iter()
        .filter(|e| matches!(e, GraphEvent::Change { .. }))
        .count();
    assert_eq!(changes, 1);
    assert!(matches!(events.last(), Some(GraphEvent::Change { changes }) if changes.len() == 2));
    assert!(graph.view().get_state(a).is_some());
}

#[test]
fn labels_follow_the_value() {
    let mut graph = Graph::new();
    let a = graph.insert_vertex(None, "Hello", 0.0, 0.0, 10.0, 10.0, None).unwrap();
    let n = graph
        .insert_vertex(None, serde_json::json!(42), 0.0, 0.0, 10.0, 10.0, None)
        .unwrap();
    assert_eq!(graph.label(a).as_deref(), Some("Hello"));
    assert_eq!(graph.label(n).as_deref(), Some("42"));
}
