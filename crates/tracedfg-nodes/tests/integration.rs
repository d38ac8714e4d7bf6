//! Integration tests for the built-in node types.
//!
//! Builds small graphs from the built-in registry and checks pass results,
//! wildcard narrowing and failure behaviour end to end.

use tracedfg_core::{DfgError, Graph, NodeId, Registry, Value};
use tracedfg_nodes::builtin_registry;

fn registry() -> Registry {
    builtin_registry().unwrap()
}

fn constant(graph: &mut Graph, reg: &Registry, type_name: &str, value: Value) -> NodeId {
    let id = graph.add_node(reg, type_name).unwrap();
    graph.set_property(id, "value", &value).unwrap();
    id
}

/// Feeds `values` through a merge node so they arrive as one buffer.
fn series(graph: &mut Graph, reg: &Registry, type_name: &str, values: &[Value]) -> NodeId {
    let merge = graph
        .add_node(reg, &format!("am::core::merge{}", values.len()))
        .unwrap();
    for (i, value) in values.iter().enumerate() {
        let c = constant(graph, reg, type_name, value.clone());
        graph
            .connect_by_name(c, "out", merge, &format!("in{i}"))
            .unwrap();
    }
    merge
}

fn uints(values: &[u64]) -> Vec<Value> {
    values.iter().map(|&v| Value::from(v)).collect()
}

fn bools(values: &[bool]) -> Vec<Value> {
    values.iter().map(|&v| Value::from(v)).collect()
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn double_constant_into_add() {
    let reg = registry();
    let mut graph = Graph::new();
    let pi = constant(&mut graph, &reg, "am::core::double_constant", Value::Double(3.14));
    graph
        .set_property(pi, "num_samples", &Value::Int(2))
        .unwrap();
    let add = graph
        .add_node(&reg, "am::core::arithmetic::double::add")
        .unwrap();
    graph.connect_by_name(pi, "out", add, "in").unwrap();

    graph.schedule().unwrap();

    let out = graph.buffer_of(add, "out").unwrap().samples::<f64>().unwrap();
    assert_eq!(out.len(), 1);
    assert!((out[0] - 6.28).abs() < 1e-12);
}

#[test]
fn sub_of_series() {
    let reg = registry();
    let mut graph = Graph::new();
    let values = series(&mut graph, &reg, "am::core::int64_constant", &[
        Value::Int(10),
        Value::Int(3),
        Value::Int(-4),
    ]);
    let sub = graph
        .add_node(&reg, "am::core::arithmetic::int64::sub")
        .unwrap();
    graph.connect_by_name(values, "out", sub, "in").unwrap();

    graph.schedule().unwrap();
    assert_eq!(
        graph.buffer_of(sub, "out").unwrap().samples::<i64>().unwrap(),
        &[11]
    );
}

#[test]
fn overflow_aborts_pass_and_resets_buffers() {
    let reg = registry();
    let mut graph = Graph::new();
    let big = constant(&mut graph, &reg, "am::core::uint8_constant", Value::Int(200));
    graph
        .set_property(big, "num_samples", &Value::Int(2))
        .unwrap();
    let add = graph
        .add_node(&reg, "am::core::arithmetic::uint8::add")
        .unwrap();
    graph.connect_by_name(big, "out", add, "in").unwrap();

    let err = graph.schedule().unwrap_err();
    match &err {
        DfgError::Process { node, source, .. } => {
            assert_eq!(*node, add);
            assert!(matches!(**source, DfgError::NodeFailure(_)));
        }
        other => panic!("expected Process, got {other}"),
    }
    assert!(graph.buffer_of(big, "out").unwrap().is_empty());
}

#[test]
fn add_without_input_writes_nothing() {
    let reg = registry();
    let mut graph = Graph::new();
    let add = graph
        .add_node(&reg, "am::core::arithmetic::timestamp::add")
        .unwrap();
    let report = graph.schedule().unwrap();
    assert_eq!(report.executed(), &[add]);
    assert!(graph.buffer_of(add, "out").unwrap().is_empty());
}

// ============================================================================
// Conditional forward and narrowing
// ============================================================================

const COND: &str = "am::core::filter::conditional_forward::pairwise";

#[test]
fn conditional_forward_selects_pairwise() {
    let reg = registry();
    let mut graph = Graph::new();
    let a = series(&mut graph, &reg, "am::core::uint64_constant", &uints(&[1, 2, 3]));
    let b = series(&mut graph, &reg, "am::core::uint64_constant", &uints(&[10, 20, 30]));
    let control = series(&mut graph, &reg, "am::core::bool_constant", &bools(&[true, false, true]));
    let cond = graph.add_node(&reg, COND).unwrap();

    graph.connect_by_name(a, "out", cond, "forward if true").unwrap();
    graph.connect_by_name(b, "out", cond, "forward if false").unwrap();
    graph.connect_by_name(control, "out", cond, "control").unwrap();

    graph.schedule().unwrap();

    let out = graph.buffer_of(cond, "out").unwrap();
    assert_eq!(out.data_type().name(), "am::core::uint64");
    assert_eq!(out.samples::<u64>().unwrap(), &[1, 20, 3]);
}

#[test]
fn conditional_forward_rejects_second_type() {
    let reg = registry();
    let mut graph = Graph::new();
    let uint = constant(&mut graph, &reg, "am::core::uint64_constant", Value::Int(1));
    let double = constant(&mut graph, &reg, "am::core::double_constant", Value::Double(1.0));
    let cond = graph.add_node(&reg, COND).unwrap();

    graph.connect_by_name(uint, "out", cond, "forward if true").unwrap();
    let err = graph
        .connect_by_name(double, "out", cond, "forward if false")
        .unwrap_err();

    match err {
        DfgError::Rejected { reason, .. } => assert_eq!(
            reason,
            "Current type of this node is 'am::core::uint64', cannot connect to port with type 'am::core::double'."
        ),
        other => panic!("expected Rejected, got {other}"),
    }
    let port = graph.find_port(cond, "forward if false").unwrap();
    assert!(!graph.node(cond).unwrap().port(port.port).unwrap().is_connected());
}

#[test]
fn narrowing_widens_after_last_disconnect() {
    let reg = registry();
    let mut graph = Graph::new();
    let uint = constant(&mut graph, &reg, "am::core::uint64_constant", Value::Int(1));
    let double = constant(&mut graph, &reg, "am::core::double_constant", Value::Double(1.0));
    let cond = graph.add_node(&reg, COND).unwrap();

    let src = graph.find_port(uint, "out").unwrap();
    let dst = graph.find_port(cond, "forward if true").unwrap();
    graph.connect(src, dst).unwrap();
    assert_eq!(
        graph.buffer_of(cond, "out").unwrap().data_type().name(),
        "am::core::uint64"
    );

    graph.disconnect(src, dst).unwrap();
    assert_eq!(
        graph.buffer_of(cond, "out").unwrap().data_type().name(),
        "am::core::any"
    );

    graph
        .connect_by_name(double, "out", cond, "forward if false")
        .unwrap();
    assert_eq!(
        graph.buffer_of(cond, "out").unwrap().data_type().name(),
        "am::core::double"
    );
}

#[test]
fn control_port_does_not_bind() {
    let reg = registry();
    let mut graph = Graph::new();
    let flag = constant(&mut graph, &reg, "am::core::bool_constant", Value::from(true));
    let text = constant(&mut graph, &reg, "am::core::string_constant", Value::from("x"));
    let cond = graph.add_node(&reg, COND).unwrap();

    graph.connect_by_name(flag, "out", cond, "control").unwrap();
    assert_eq!(
        graph.buffer_of(cond, "out").unwrap().data_type().name(),
        "am::core::any"
    );
    graph
        .connect_by_name(text, "out", cond, "forward if true")
        .unwrap();
    assert_eq!(
        graph.buffer_of(cond, "out").unwrap().data_type().name(),
        "am::core::string"
    );
}

#[test]
fn retype_refused_with_several_readers() {
    let reg = registry();
    let mut graph = Graph::new();
    let select = graph.add_node(&reg, "am::core::select_nth").unwrap();
    let left = graph.add_node(&reg, "am::core::merge2").unwrap();
    let right = graph.add_node(&reg, "am::core::merge2").unwrap();
    graph.connect_by_name(select, "out", left, "in0").unwrap();
    graph.connect_by_name(select, "out", right, "in0").unwrap();

    let uint = constant(&mut graph, &reg, "am::core::uint64_constant", Value::Int(7));
    let err = graph
        .connect_by_name(uint, "out", select, "in")
        .unwrap_err();

    assert!(matches!(err, DfgError::BufferShared { readers: 2, .. }), "got: {err}");
    let port = graph.find_port(select, "in").unwrap();
    assert!(!graph.node(select).unwrap().port(port.port).unwrap().is_connected());
    assert_eq!(
        graph.buffer_of(select, "out").unwrap().data_type().name(),
        "am::core::any"
    );
}

#[test]
fn concrete_reader_binds_output() {
    let reg = registry();
    let mut graph = Graph::new();
    let select = graph.add_node(&reg, "am::core::select_nth").unwrap();
    let add = graph
        .add_node(&reg, "am::core::arithmetic::int32::add")
        .unwrap();
    graph.connect_by_name(select, "out", add, "in").unwrap();
    assert_eq!(
        graph.buffer_of(select, "out").unwrap().data_type().name(),
        "am::core::int32"
    );

    let wrong = constant(&mut graph, &reg, "am::core::int8_constant", Value::Int(1));
    let err = graph
        .connect_by_name(wrong, "out", select, "in")
        .unwrap_err();
    assert!(matches!(err, DfgError::Rejected { .. }));
}

// ============================================================================
// Select nth and merge
// ============================================================================

#[test]
fn select_nth_counts_from_both_ends() {
    let reg = registry();
    let mut graph = Graph::new();
    let values = series(&mut graph, &reg, "am::core::uint64_constant", &uints(&[4, 5, 6, 7]));
    let first = graph.add_node(&reg, "am::core::select_nth").unwrap();
    let last = graph.add_node(&reg, "am::core::select_nth").unwrap();
    graph.set_property(last, "N", &Value::Int(-1)).unwrap();
    graph.connect_by_name(values, "out", first, "in").unwrap();
    graph.connect_by_name(values, "out", last, "in").unwrap();

    graph.schedule().unwrap();
    assert_eq!(
        graph.buffer_of(first, "out").unwrap().samples::<u64>().unwrap(),
        &[4]
    );
    assert_eq!(
        graph.buffer_of(last, "out").unwrap().samples::<u64>().unwrap(),
        &[7]
    );
}

#[test]
fn select_nth_out_of_range() {
    let reg = registry();
    let mut graph = Graph::new();
    let value = constant(&mut graph, &reg, "am::core::string_constant", Value::from("only"));
    let select = graph.add_node(&reg, "am::core::select_nth").unwrap();
    graph.set_property(select, "N", &Value::Int(3)).unwrap();
    graph.connect_by_name(value, "out", select, "in").unwrap();

    let err = graph.schedule().unwrap_err();
    assert!(matches!(err, DfgError::Process { .. }));

    graph
        .set_property(select, "fail_if_no_input", &Value::from(false))
        .unwrap();
    graph.schedule().unwrap();
    assert!(graph.buffer_of(select, "out").unwrap().is_empty());
}

#[test]
fn merge_skips_unconnected_inputs() {
    let reg = registry();
    let mut graph = Graph::new();
    let merge = graph.add_node(&reg, "am::core::merge4").unwrap();
    let a = constant(&mut graph, &reg, "am::core::int16_constant", Value::Int(1));
    let b = constant(&mut graph, &reg, "am::core::int16_constant", Value::Int(2));
    graph.set_property(b, "num_samples", &Value::Int(2)).unwrap();
    graph.connect_by_name(b, "out", merge, "in3").unwrap();
    graph.connect_by_name(a, "out", merge, "in1").unwrap();

    graph.schedule().unwrap();
    assert_eq!(
        graph.buffer_of(merge, "out").unwrap().samples::<i16>().unwrap(),
        &[1, 2, 2]
    );
}

// ============================================================================
// Logic and strings
// ============================================================================

#[test]
fn logic_folding_and_pairwise() {
    let reg = registry();
    let mut graph = Graph::new();
    let a = series(&mut graph, &reg, "am::core::bool_constant", &bools(&[true, false]));
    let b = series(&mut graph, &reg, "am::core::bool_constant", &bools(&[true, true]));
    let and = graph
        .add_node(&reg, "am::core::logic::and::pairwise")
        .unwrap();
    let any = graph
        .add_node(&reg, "am::core::logic::or::folding")
        .unwrap();
    graph.connect_by_name(a, "out", and, "a").unwrap();
    graph.connect_by_name(b, "out", and, "b").unwrap();
    graph.connect_by_name(and, "out", any, "in").unwrap();

    graph.schedule().unwrap();
    assert_eq!(
        graph.buffer_of(and, "out").unwrap().samples::<bool>().unwrap(),
        &[true, false]
    );
    assert_eq!(
        graph.buffer_of(any, "out").unwrap().samples::<bool>().unwrap(),
        &[true]
    );
}

#[test]
fn pairwise_count_mismatch_fails() {
    let reg = registry();
    let mut graph = Graph::new();
    let a = series(&mut graph, &reg, "am::core::bool_constant", &bools(&[true, false]));
    let b = constant(&mut graph, &reg, "am::core::bool_constant", Value::from(true));
    let or = graph
        .add_node(&reg, "am::core::logic::or::pairwise")
        .unwrap();
    graph.connect_by_name(a, "out", or, "a").unwrap();
    graph.connect_by_name(b, "out", or, "b").unwrap();

    let err = graph.schedule().unwrap_err();
    assert!(err.to_string().contains("different sample counts"), "{err}");
}

#[test]
fn to_string_and_concat() {
    let reg = registry();
    let mut graph = Graph::new();
    let n = constant(&mut graph, &reg, "am::core::int32_constant", Value::Int(-5));
    graph.set_property(n, "num_samples", &Value::Int(3)).unwrap();
    let text = graph.add_node(&reg, "am::core::int32::to_string").unwrap();
    let concat = graph.add_node(&reg, "am::core::string_concat").unwrap();
    graph
        .set_property(concat, "separator", &Value::from(", "))
        .unwrap();
    graph.connect_by_name(n, "out", text, "in").unwrap();
    graph.connect_by_name(text, "out", concat, "in").unwrap();

    graph.schedule().unwrap();
    assert_eq!(
        graph.buffer_of(concat, "out").unwrap().samples::<String>().unwrap(),
        &["-5, -5, -5".to_string()]
    );
}

#[test]
fn on_demand_output_stays_empty_when_unconnected() {
    let reg = registry();
    let mut graph = Graph::new();
    let n = constant(&mut graph, &reg, "am::core::uint16_constant", Value::Int(9));
    let text = graph.add_node(&reg, "am::core::uint16::to_string").unwrap();
    graph.connect_by_name(n, "out", text, "in").unwrap();

    graph.schedule().unwrap();
    assert!(graph.buffer_of(text, "out").unwrap().is_empty());
}

#[test]
fn string_format_wraps_each_sample() {
    let reg = registry();
    let mut graph = Graph::new();
    let s = constant(&mut graph, &reg, "am::core::string_constant", Value::from("cpu"));
    graph.set_property(s, "num_samples", &Value::Int(2)).unwrap();
    let format = graph.add_node(&reg, "am::core::string_format").unwrap();
    graph
        .set_property(format, "format", &Value::from("[%s] 100%%"))
        .unwrap();
    graph.connect_by_name(s, "out", format, "in").unwrap();

    graph.schedule().unwrap();
    assert_eq!(
        graph.buffer_of(format, "out").unwrap().samples::<String>().unwrap(),
        &["[cpu] 100%".to_string(), "[cpu] 100%".to_string()]
    );
}

#[test]
fn timestamp_to_string_properties_survive_notation() {
    let reg = registry();
    let text = r#"
        am_dfg_graph {
            nodes: [
                am_dfg_node {
                    type: "am::core::timestamp_to_string",
                    id: 1,
                    pretty_print: 1,
                    max_significant_digits: 5
                },
            ],
        }
    "#;
    let graph = Graph::load(&reg, text).unwrap();
    let id = NodeId::new(1);
    assert_eq!(graph.get_property(id, "pretty_print").unwrap(), Value::Int(1));
    assert_eq!(
        graph.get_property(id, "max_significant_digits").unwrap(),
        Value::Int(5)
    );

    let restored = Graph::load(&reg, &graph.save().unwrap()).unwrap();
    assert_eq!(
        restored.get_property(id, "max_significant_digits").unwrap(),
        Value::Int(5)
    );
}

// ============================================================================
// Statistics
// ============================================================================

#[test]
fn statistics_of_series() {
    let reg = registry();
    let mut graph = Graph::new();
    let values = series(&mut graph, &reg, "am::core::uint32_constant", &uints(&[5, 2, 9]));
    let mut results = Vec::new();
    for stat in ["min", "max", "average"] {
        let node = graph
            .add_node(&reg, &format!("am::core::statistics::uint32::{stat}"))
            .unwrap();
        graph.connect_by_name(values, "out", node, "in").unwrap();
        results.push(node);
    }

    graph.schedule().unwrap();
    let outputs: Vec<u32> = results
        .iter()
        .map(|&node| *graph.buffer_of(node, "out").unwrap().read_last::<u32>().unwrap())
        .collect();
    assert_eq!(outputs, [2, 9, 5]);
}

#[test]
fn statistics_without_input_write_nothing() {
    let reg = registry();
    let mut graph = Graph::new();
    let avg = graph
        .add_node(&reg, "am::core::statistics::double::average")
        .unwrap();

    graph.schedule().unwrap();
    assert!(graph.buffer_of(avg, "out").unwrap().is_empty());
}

#[test]
fn average_overflow_fails_pass() {
    let reg = registry();
    let mut graph = Graph::new();
    let values = series(&mut graph, &reg, "am::core::int8_constant", &[
        Value::Int(100),
        Value::Int(100),
    ]);
    let avg = graph
        .add_node(&reg, "am::core::statistics::int8::average")
        .unwrap();
    graph.connect_by_name(values, "out", avg, "in").unwrap();

    let err = graph.schedule().unwrap_err();
    assert!(matches!(err, DfgError::Process { node, .. } if node == avg), "{err}");
}

// ============================================================================
// Connection rules and persistence
// ============================================================================

#[test]
fn second_writer_is_already_connected() {
    let reg = registry();
    let mut graph = Graph::new();
    let a = constant(&mut graph, &reg, "am::core::uint64_constant", Value::Int(1));
    let b = constant(&mut graph, &reg, "am::core::uint64_constant", Value::Int(2));
    let add = graph
        .add_node(&reg, "am::core::arithmetic::uint64::add")
        .unwrap();
    graph.connect_by_name(a, "out", add, "in").unwrap();

    let err = graph.connect_by_name(b, "out", add, "in").unwrap_err();
    assert!(matches!(err, DfgError::AlreadyConnected { .. }));
}

#[test]
fn not_well_connected_has_no_side_effects() {
    let reg = registry();
    let mut graph = Graph::new();
    let n = constant(&mut graph, &reg, "am::core::uint64_constant", Value::Int(5));
    let add = graph
        .add_node(&reg, "am::core::arithmetic::uint64::add")
        .unwrap();
    graph.connect_by_name(n, "out", add, "in").unwrap();
    graph.schedule().unwrap();

    let cond = graph.add_node(&reg, COND).unwrap();
    graph
        .connect_by_name(n, "out", cond, "forward if true")
        .unwrap();
    let err = graph.schedule().unwrap_err();

    match err {
        DfgError::NotWellConnected { node, port, .. } => {
            assert_eq!(node, cond);
            assert_eq!(port, "control");
        }
        other => panic!("expected NotWellConnected, got {other}"),
    }
    // Output of the previous pass is untouched.
    assert_eq!(
        graph.buffer_of(add, "out").unwrap().samples::<u64>().unwrap(),
        &[5]
    );
}

#[test]
fn topology_roundtrip_restores_narrowing() {
    let reg = registry();
    let mut graph = Graph::new();
    let a = series(&mut graph, &reg, "am::core::uint64_constant", &uints(&[1, 2]));
    let b = series(&mut graph, &reg, "am::core::uint64_constant", &uints(&[8, 9]));
    let control = series(&mut graph, &reg, "am::core::bool_constant", &bools(&[false, true]));
    let cond = graph.add_node(&reg, COND).unwrap();
    graph.connect_by_name(a, "out", cond, "forward if true").unwrap();
    graph.connect_by_name(b, "out", cond, "forward if false").unwrap();
    graph.connect_by_name(control, "out", cond, "control").unwrap();

    let text = graph.save().unwrap();
    let mut restored = Graph::load(&reg, &text).unwrap();
    assert_eq!(restored.save().unwrap(), text);

    restored.schedule().unwrap();
    assert_eq!(
        restored.buffer_of(cond, "out").unwrap().samples::<u64>().unwrap(),
        &[8, 2]
    );
}

#[test]
fn properties_survive_notation() {
    let reg = registry();
    let text = r#"
        am_dfg_graph {
            nodes: [
                am_dfg_node { type: "am::core::double_constant", id: 1, value: 1.5, num_samples: 4 },
                am_dfg_node { type: "am::core::arithmetic::double::add", id: 2 },
            ],
            connections: [[1, "out", 2, "in"]],
        }
    "#;
    let mut graph = Graph::load(&reg, text).unwrap();
    assert_eq!(
        graph.get_property(NodeId::new(1), "num_samples").unwrap(),
        Value::Int(4)
    );
    graph.schedule().unwrap();
    assert_eq!(
        graph
            .buffer_of(NodeId::new(2), "out")
            .unwrap()
            .samples::<f64>()
            .unwrap(),
        &[6.0]
    );
}
