//! Integration tests for tracedfg-config.
//!
//! These tests build graphs from pipelines and files with the built-in node
//! types and run them.

use tracedfg_config::{
    ConfigError, NodeConfig, Pipeline, ValidationError, load_graph, open_graph, save_graph,
    validate_pipeline,
};
use tracedfg_core::{DfgError, Graph, NodeId, Registry, Value};
use tracedfg_nodes::builtin_registry;
use tempfile::TempDir;

fn registry() -> Registry {
    builtin_registry().unwrap()
}

fn pi_twice() -> Pipeline {
    Pipeline::new("pi twice")
        .with_node(
            NodeConfig::new(1, "am::core::double_constant")
                .with_property("value", 3.14)
                .with_property("num_samples", 2),
        )
        .with_node(NodeConfig::new(2, "am::core::arithmetic::double::add"))
        .with_connection("1.out", "2.in")
}

fn sum(graph: &Graph) -> f64 {
    graph
        .buffer_of(NodeId::new(2), "out")
        .unwrap()
        .samples::<f64>()
        .unwrap()[0]
}

// ============================================================================
// Pipelines
// ============================================================================

#[test]
fn pipeline_builds_and_runs() {
    let reg = registry();
    let mut graph = pi_twice().build(&reg).unwrap();
    assert_eq!(graph.len(), 2);

    graph.schedule().unwrap();
    assert!((sum(&graph) - 6.28).abs() < 1e-12);
}

#[test]
fn pipeline_file_roundtrip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested/dir/pi.toml");

    let pipeline = pi_twice();
    pipeline.save(&path).unwrap();
    assert!(path.exists());

    let loaded = Pipeline::load(&path).unwrap();
    assert_eq!(loaded, pipeline);
}

#[test]
fn pipeline_from_hand_written_toml() {
    let reg = registry();
    let pipeline = Pipeline::from_toml(
        r#"
name = "pick"
description = "forward the first or second value by a control flag"

[[nodes]]
id = 1
type = "am::core::uint64_constant"
[nodes.properties]
value = 7

[[nodes]]
id = 2
type = "am::core::uint64_constant"
[nodes.properties]
value = 9

[[nodes]]
id = 3
type = "am::core::bool_constant"
[nodes.properties]
value = false

[[nodes]]
id = 4
type = "am::core::filter::conditional_forward::pairwise"

[[connections]]
from = "4.out"
to = "5.in"

[[connections]]
from = "1.out"
to = "4.forward if true"

[[connections]]
from = "2.out"
to = "4.forward if false"

[[connections]]
from = "3.out"
to = "4.control"

[[nodes]]
id = 5
type = "am::core::uint64::to_string"
"#,
    )
    .unwrap();

    assert_eq!(validate_pipeline(&pipeline, &reg), Ok(()));

    let mut graph = pipeline.build(&reg).unwrap();
    graph.schedule().unwrap();
    let out = graph.buffer_of(NodeId::new(5), "out").unwrap();
    assert_eq!(out.samples::<String>().unwrap(), ["9".to_string()]);
}

#[test]
fn pipeline_type_mismatch_is_a_graph_error() {
    let reg = registry();
    let pipeline = Pipeline::new("mismatch")
        .with_node(NodeConfig::new(1, "am::core::string_constant").with_property("value", "x"))
        .with_node(NodeConfig::new(2, "am::core::arithmetic::uint64::add"))
        .with_connection("1.out", "2.in");

    let err = pipeline.build(&reg).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Graph(DfgError::TypeMismatch { .. })
    ));
}

#[test]
fn pipeline_bad_endpoint() {
    let reg = registry();
    let pipeline = pi_twice().with_connection("1out", "2.in");
    assert!(matches!(
        pipeline.build(&reg),
        Err(ConfigError::InvalidEndpoint { .. })
    ));
    assert_eq!(
        validate_pipeline(&pipeline, &reg),
        Err(ValidationError::InvalidEndpoint("1out".to_string()))
    );
}

#[test]
fn pipeline_from_graph_keeps_properties() {
    let reg = registry();
    let mut graph = Graph::new();
    let c = graph.add_node(&reg, "am::core::int64_constant").unwrap();
    graph.set_property(c, "value", &Value::Int(-4)).unwrap();
    let select = graph.add_node(&reg, "am::core::select_nth").unwrap();
    graph.set_property(select, "N", &Value::Int(-1)).unwrap();
    graph
        .set_property(select, "fail_if_no_input", &Value::from(false))
        .unwrap();
    graph.connect_by_name(c, "out", select, "in").unwrap();

    let pipeline = Pipeline::from_graph("selected", &graph).unwrap();
    assert_eq!(pipeline.connections.len(), 1);
    assert_eq!(pipeline.connections[0].from, format!("{c}.out"));
    assert_eq!(pipeline.connections[0].to, format!("{select}.in"));

    let text = pipeline.to_toml().unwrap();
    let mut rebuilt = Pipeline::from_toml(&text).unwrap().build(&reg).unwrap();
    assert_eq!(rebuilt.get_property(select, "N").unwrap(), Value::Int(-1));
    assert_eq!(
        rebuilt
            .get_property(select, "fail_if_no_input")
            .unwrap()
            .as_bool(),
        Some(false)
    );

    rebuilt.schedule().unwrap();
    let out = rebuilt.buffer_of(select, "out").unwrap();
    assert_eq!(out.samples::<i64>().unwrap(), [-4]);
}

// ============================================================================
// Graph files
// ============================================================================

#[test]
fn graph_file_roundtrip() {
    let reg = registry();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("graphs/pi.dfg");

    let graph = pi_twice().build(&reg).unwrap();
    save_graph(&graph, &path).unwrap();

    let mut loaded = load_graph(&path, &reg).unwrap();
    assert_eq!(loaded.len(), 2);
    loaded.schedule().unwrap();
    assert!((sum(&loaded) - 6.28).abs() < 1e-12);
}

#[test]
fn open_graph_picks_format_by_extension() {
    let reg = registry();
    let temp = TempDir::new().unwrap();
    let toml_path = temp.path().join("pi.toml");
    let dfg_path = temp.path().join("pi.dfg");

    let pipeline = pi_twice();
    pipeline.save(&toml_path).unwrap();
    save_graph(&pipeline.build(&reg).unwrap(), &dfg_path).unwrap();

    for path in [&toml_path, &dfg_path] {
        let mut graph = open_graph(path, &reg).unwrap();
        graph.schedule().unwrap();
        assert!((sum(&graph) - 6.28).abs() < 1e-12, "{}", path.display());
    }

    // A pipeline is not object notation.
    let err = load_graph(&toml_path, &reg).unwrap_err();
    assert!(matches!(err, ConfigError::Graph(_)));
}
