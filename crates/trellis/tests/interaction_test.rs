use std::cell::RefCell;
use std::rc::Rc;
use trellis::{
    CellId, Graph, GraphEvent, InteractionDispatcher, MouseEventContext, MouseEventKind,
    MouseListener,
};

struct Fixture {
    graph: Graph,
    dispatcher: InteractionDispatcher,
    events: Rc<RefCell<Vec<GraphEvent>>>,
    a: CellId,
}

fn fixture() -> Fixture {
    let mut graph = Graph::new();
    let a = graph.insert_vertex(None, "A", 0.0, 0.0, 100.0, 50.0, None).unwrap();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    graph.add_listener(move |e| {
        if matches!(
            e,
            GraphEvent::Click { .. } | GraphEvent::DoubleClick { .. } | GraphEvent::TapAndHold { .. }
        ) {
            sink.borrow_mut().push(e.clone());
        }
    });
    Fixture {
        graph,
        dispatcher: InteractionDispatcher::new(),
        events,
        a,
    }
}

impl Fixture {
    fn send(&mut self, kind: MouseEventKind, mut me: MouseEventContext) -> MouseEventContext {
        self.dispatcher.dispatch(&mut self.graph, kind, &mut me);
        me
    }

    fn tap(&mut self, x: f64, y: f64, time_ms: u64) {
        self.send(MouseEventKind::Down, MouseEventContext::touch(x, y, time_ms));
        self.send(MouseEventKind::Up, MouseEventContext::touch(x, y, time_ms + 50));
    }
}

#[test]
fn press_and_release_in_place_clicks_the_cell_under_the_pointer() {
    let mut f = fixture();

    let down = f.send(MouseEventKind::Down, MouseEventContext::new(50.0, 25.0, 0));
    assert_eq!(down.cell, Some(f.a));
    assert!(f.dispatcher.is_mouse_down());
    f.send(MouseEventKind::Up, MouseEventContext::new(51.0, 25.0, 80));

    assert!(!f.dispatcher.is_mouse_down());
    assert_eq!(
        *f.events.borrow(),
        vec![GraphEvent::Click {
            cell: Some(f.a),
            x: 51.0,
            y: 25.0,
        }]
    );
}

#[test]
fn clicking_the_background_reports_no_cell() {
    let mut f = fixture();
    f.send(MouseEventKind::Down, MouseEventContext::new(300.0, 300.0, 0));
    f.send(MouseEventKind::Up, MouseEventContext::new(300.0, 300.0, 10));
    assert!(matches!(
        f.events.borrow().as_slice(),
        [GraphEvent::Click { cell: None, .. }]
    ));
}

#[test]
fn dragging_beyond_the_tolerance_is_not_a_click() {
    let mut f = fixture();
    f.send(MouseEventKind::Down, MouseEventContext::new(10.0, 10.0, 0));
    f.send(MouseEventKind::Move, MouseEventContext::new(40.0, 10.0, 20));
    f.send(MouseEventKind::Up, MouseEventContext::new(40.0, 10.0, 40));
    assert!(f.events.borrow().is_empty());
}

struct Consumer {
    seen: Rc<RefCell<Vec<Option<CellId>>>>,
}

impl MouseListener for Consumer {
    fn mouse_down(&mut self, _graph: &mut Graph, me: &mut MouseEventContext) {
        self.seen.borrow_mut().push(me.cell);
    }

    fn mouse_up(&mut self, _graph: &mut Graph, me: &mut MouseEventContext) {
        me.consume();
    }
}

#[test]
fn consumed_events_do_not_click() {
    let mut f = fixture();
    let seen = Rc::new(RefCell::new(Vec::new()));
    f.dispatcher.add_listener(Box::new(Consumer { seen: seen.clone() }));
    assert_eq!(f.dispatcher.listener_count(), 1);

    f.send(MouseEventKind::Down, MouseEventContext::new(50.0, 25.0, 0));
    let up = f.send(MouseEventKind::Up, MouseEventContext::new(50.0, 25.0, 10));

    assert!(up.is_consumed());
    assert_eq!(*seen.borrow(), vec![Some(f.a)]);
    assert!(f.events.borrow().is_empty());
}

#[test]
fn host_supplied_cells_skip_hit_testing() {
    let mut f = fixture();
    let other = f
        .graph
        .insert_vertex(None, "B", 500.0, 500.0, 10.0, 10.0, None)
        .unwrap();
    let me = MouseEventContext::new(50.0, 25.0, 0).with_cell(Some(other));
    let down = f.send(MouseEventKind::Down, me);
    assert_eq!(down.cell, Some(other));
}

#[test]
fn two_quick_taps_double_click_the_first_cell() {
    let mut f = fixture();

    f.tap(50.0, 25.0, 0);
    let second = f.send(MouseEventKind::Down, MouseEventContext::touch(60.0, 30.0, 200));

    assert!(second.is_consumed());
    let events = f.events.borrow();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], GraphEvent::Click { .. }));
    assert_eq!(
        events[1],
        GraphEvent::DoubleClick {
            cell: Some(f.a),
            x: 60.0,
            y: 30.0,
        }
    );
}

#[test]
fn slow_or_distant_taps_are_separate() {
    let mut f = fixture();

    f.tap(50.0, 25.0, 0);
    f.tap(50.0, 25.0, 1_000);
    f.tap(90.0, 45.0, 1_100);
    f.tap(10.0, 5.0, 1_200);

    assert!(
        f.events
            .borrow()
            .iter()
            .all(|e| !matches!(e, GraphEvent::DoubleClick { .. }))
    );
}

#[test]
fn mouse_presses_never_double_tap() {
    let mut f = fixture();
    for t in [0, 100] {
        f.send(MouseEventKind::Down, MouseEventContext::new(50.0, 25.0, t));
        f.send(MouseEventKind::Up, MouseEventContext::new(50.0, 25.0, t + 10));
    }
    assert_eq!(f.events.borrow().len(), 2);
}

#[test]
fn native_double_click_resolves_the_cell() {
    let mut f = fixture();
    let mut me = MouseEventContext::new(50.0, 25.0, 0);
    f.dispatcher.dispatch_double_click(&mut f.graph, &mut me);
    assert_eq!(
        *f.events.borrow(),
        vec![GraphEvent::DoubleClick {
            cell: Some(f.a),
            x: 50.0,
            y: 25.0,
        }]
    );
}

#[test]
fn holding_a_touch_fires_tap_and_hold_once() {
    let mut f = fixture();
    f.send(MouseEventKind::Down, MouseEventContext::touch(50.0, 25.0, 1_000));
    assert!(f.dispatcher.has_pending_hold());

    assert!(!f.dispatcher.tick(&mut f.graph, 1_300));
    assert!(f.dispatcher.tick(&mut f.graph, 1_500));
    assert!(!f.dispatcher.tick(&mut f.graph, 2_000));

    assert_eq!(
        *f.events.borrow(),
        vec![GraphEvent::TapAndHold {
            cell: Some(f.a),
            x: 50.0,
            y: 25.0,
        }]
    );
}

#[test]
fn moving_or_releasing_cancels_the_hold() {
    let mut f = fixture();

    f.send(MouseEventKind::Down, MouseEventContext::touch(50.0, 25.0, 0));
    f.send(MouseEventKind::Move, MouseEventContext::touch(60.0, 30.0, 100));
    assert!(f.dispatcher.has_pending_hold());
    f.send(MouseEventKind::Move, MouseEventContext::touch(90.0, 30.0, 200));
    assert!(!f.dispatcher.has_pending_hold());
    assert!(!f.dispatcher.tick(&mut f.graph, 1_000));
    f.send(MouseEventKind::Up, MouseEventContext::touch(90.0, 30.0, 300));

    f.send(MouseEventKind::Down, MouseEventContext::touch(50.0, 25.0, 2_000));
    f.send(MouseEventKind::Up, MouseEventContext::touch(50.0, 25.0, 2_100));
    assert!(!f.dispatcher.tick(&mut f.graph, 3_000));

    assert!(
        f.events
            .borrow()
            .iter()
            .all(|e| !matches!(e, GraphEvent::TapAndHold { .. }))
    );
}

#[test]
fn model_point_undoes_scale_and_translate() {
    let mut f = fixture();
    f.graph.zoom_to(2.0);
    let me = MouseEventContext::new(100.0, 50.0, 0);
    let p = me.model_point(&f.graph);
    assert_eq!((p.x, p.y), (50.0, 25.0));
}
