use serde_json::json;
use trellis::validation::{ALREADY_CONNECTED, CONTAINS_VALIDATION_ERRORS};
use trellis::{CellId, Graph, GraphConfig, GraphPolicy, Multiplicity, ViewHooks};

fn graph_with(config: GraphConfig) -> Graph {
    Graph::new().with_config(config)
}

fn node(graph: &mut Graph, value: serde_json::Value) -> CellId {
    graph.insert_vertex(None, value, 0.0, 0.0, 40.0, 40.0, None).unwrap()
}

#[test]
fn dangling_ends_are_rejected_when_disallowed() {
    let mut graph = graph_with(GraphConfig {
        allow_dangling_edges: false,
        ..GraphConfig::default()
    });
    let a = node(&mut graph, json!("a"));
    let e = graph.insert_edge(None, "", Some(a), None, None).unwrap();

    assert_eq!(graph.edge_validation_error(Some(e), Some(a), None), Some(String::new()));
    assert_eq!(graph.edge_validation_error(None, Some(a), None), Some(String::new()));
    assert!(!graph.is_edge_valid(Some(e), Some(a), None));
}

#[test]
fn dangling_rule_runs_before_the_pure_label_exemption() {
    let mut strict = graph_with(GraphConfig {
        allow_dangling_edges: false,
        ..GraphConfig::default()
    });
    let e = strict.insert_edge(None, "label", None, None, None).unwrap();
    assert_eq!(strict.edge_validation_error(Some(e), None, None), Some(String::new()));

    let mut lenient = Graph::new();
    let e = lenient.insert_edge(None, "label", None, None, None).unwrap();
    assert_eq!(lenient.edge_validation_error(Some(e), None, None), None);
}

#[test]
fn loops_follow_the_configuration() {
    let mut graph = Graph::new();
    let a = node(&mut graph, json!("a"));
    assert_eq!(graph.edge_validation_error(None, Some(a), Some(a)), Some(String::new()));

    let mut config = graph.config().clone();
    config.allow_loops = true;
    graph.set_config(config);
    assert_eq!(graph.edge_validation_error(None, Some(a), Some(a)), None);
}

#[test]
fn edges_are_not_terminals_unless_connectable() {
    let mut graph = Graph::new();
    let a = node(&mut graph, json!("a"));
    let b = node(&mut graph, json!("b"));
    let e = graph.insert_edge(None, "", Some(a), Some(b), None).unwrap();
    assert!(!graph.is_valid_target(Some(e)));
    assert_eq!(graph.edge_validation_error(None, Some(a), Some(e)), Some(String::new()));
}

#[test]
fn unconnectable_terminals_are_rejected() {
    let mut graph = Graph::new();
    let a = node(&mut graph, json!("a"));
    let b = graph
        .insert_vertex(None, "b", 0.0, 0.0, 10.0, 10.0, Some("connectable=0"))
        .unwrap();
    assert!(!graph.is_valid_connection(Some(a), Some(b)));
}

#[test]
fn multigraph_off_reports_existing_connections() {
    let mut graph = graph_with(GraphConfig {
        multigraph: false,
        ..GraphConfig::default()
    });
    let a = node(&mut graph, json!("a"));
    let b = node(&mut graph, json!("b"));
    let e = graph.insert_edge(None, "", Some(a), Some(b), None).unwrap();

    assert_eq!(
        graph.edge_validation_error(None, Some(a), Some(b)),
        Some(format!("{ALREADY_CONNECTED}\n"))
    );
    assert_eq!(graph.edge_validation_error(Some(e), Some(a), Some(b)), None);
    assert_eq!(graph.edge_validation_error(None, Some(b), Some(a)), None);
}

#[test]
fn multiplicity_limits_outgoing_edges() {
    let mut graph = Graph::new();
    graph.set_multiplicities(vec![
        Multiplicity::new(true, "task").with_count(0, Some(1), "Only one output"),
    ]);
    let a = node(&mut graph, json!("task"));
    let b = node(&mut graph, json!("task"));
    let c = node(&mut graph, json!("task"));

    assert_eq!(graph.edge_validation_error(None, Some(a), Some(b)), None);
    let e = graph.insert_edge(None, "", Some(a), Some(b), None).unwrap();

    assert_eq!(
        graph.edge_validation_error(None, Some(a), Some(c)),
        Some("Only one output\n".to_string())
    );
    assert_eq!(graph.edge_validation_error(Some(e), Some(a), Some(b)), None);
    assert_eq!(graph.edge_validation_error(None, Some(b), Some(c)), None);
}

#[test]
fn multiplicity_restricts_neighbour_types() {
    let mut graph = Graph::new();
    graph.set_multiplicities(vec![Multiplicity::new(true, "task").with_neighbors(
        ["gate"],
        true,
        "Must connect to a gate",
    )]);
    let task = node(&mut graph, json!({"type": "task"}));
    let gate = node(&mut graph, json!({"type": "gate"}));
    let other = node(&mut graph, json!("task"));

    assert_eq!(graph.edge_validation_error(None, Some(task), Some(gate)), None);
    assert_eq!(
        graph.edge_validation_error(None, Some(task), Some(other)),
        Some("Must connect to a gate\n".to_string())
    );
    assert_eq!(graph.edge_validation_error(None, Some(gate), Some(other)), None);
}

#[test]
fn zero_max_forbids_any_incoming_edge() {
    let mut graph = Graph::new();
    graph.set_multiplicities(vec![
        Multiplicity::new(false, "start").with_count(0, Some(0), "No inputs"),
    ]);
    let a = node(&mut graph, json!("a"));
    let start = node(&mut graph, json!("start"));
    assert_eq!(
        graph.edge_validation_error(None, Some(a), Some(start)),
        Some("No inputs\n".to_string())
    );
}

#[test]
fn validate_graph_records_warnings_up_the_tree() {
    let mut graph = Graph::new();
    graph.set_multiplicities(vec![
        Multiplicity::new(true, "task").with_count(1, None, "Needs an output"),
    ]);
    let task = node(&mut graph, json!("task"));
    let other = node(&mut graph, json!("other"));
    let layer = graph.default_parent();

    let warning = graph.validate_graph(None);

    assert_eq!(warning, Some(String::new()));
    assert_eq!(graph.cell_warning(task), Some("Needs an output\n"));
    assert_eq!(graph.cell_warning(layer), Some(""));
    assert_eq!(graph.cell_warning(other), None);

    graph.insert_edge(None, "", Some(task), Some(other), None).unwrap();
    assert_eq!(graph.validate_graph(None), None);
    assert_eq!(graph.cell_warning(task), None);
}

#[test]
fn collapsed_groups_summarize_invalid_children() {
    let mut graph = Graph::new();
    graph.set_multiplicities(vec![
        Multiplicity::new(true, "task").with_count(1, None, "Needs an output"),
    ]);
    let group = node(&mut graph, json!("group"));
    graph
        .insert_vertex(Some(group), "task", 0.0, 0.0, 10.0, 10.0, None)
        .unwrap();
    graph.fold_cells(true, false, &[group], true).unwrap();

    graph.validate_graph(None);

    assert_eq!(
        graph.cell_warning(group),
        Some(format!("{CONTAINS_VALIDATION_ERRORS}\n").as_str())
    );
}

struct NoForbidden;

impl ViewHooks for NoForbidden {}

impl GraphPolicy for NoForbidden {
    fn validate_edge(
        &self,
        graph: &Graph,
        _edge: Option<CellId>,
        _source: CellId,
        target: CellId,
    ) -> Option<String> {
        (graph.model().value(target) == Some(&json!("forbidden")))
            .then(|| "Target is forbidden\n".to_string())
    }

    fn validate_cell(&self, graph: &Graph, cell: CellId) -> Option<String> {
        (graph.model().value(cell) == Some(&json!("lonely")) && graph.model().edges(cell).is_empty())
            .then(|| "Lonely\n".to_string())
    }
}

#[test]
fn policy_messages_follow_the_built_in_rules() {
    let mut graph = graph_with(GraphConfig {
        multigraph: false,
        ..GraphConfig::default()
    })
    .with_policy(NoForbidden);
    let a = node(&mut graph, json!("a"));
    let f = node(&mut graph, json!("forbidden"));
    let ok = node(&mut graph, json!("ok"));

    assert_eq!(graph.edge_validation_error(None, Some(a), Some(ok)), None);
    assert_eq!(
        graph.edge_validation_error(None, Some(a), Some(f)),
        Some("Target is forbidden\n".to_string())
    );

    graph.insert_edge(None, "", Some(a), Some(f), None).unwrap();
    assert_eq!(
        graph.edge_validation_error(None, Some(a), Some(f)),
        Some(format!("{ALREADY_CONNECTED}\nTarget is forbidden\n"))
    );
}

#[test]
fn policy_cell_messages_land_in_warnings() {
    let mut graph = Graph::new().with_policy(NoForbidden);
    let lonely = node(&mut graph, json!("lonely"));

    graph.validate_graph(None);

    assert_eq!(graph.cell_warning(lonely), Some("Lonely\n"));
}
