//! Built-in node types for the tracedfg dataflow engine.
//!
//! This crate provides the standard node-type set of the `am::core`
//! namespace and a ready-made [`Registry`] holding it together with the
//! built-in sample types.
//!
//! # Node types
//!
//! - **Constants**: `am::core::<type>_constant` for the integer types,
//!   `double`, `bool` and `string`
//! - **Arithmetic**: `am::core::arithmetic::<type>::{add,sub}`
//! - **Logic**: `am::core::logic::{and,or}::{folding,pairwise}`
//! - **Filtering**: `am::core::filter::conditional_forward::pairwise`,
//!   `am::core::select_nth`, `am::core::merge{2,3,4,8}`
//! - **Statistics**: `am::core::statistics::<type>::{min,max,average}`
//! - **Strings**: `am::core::<int>::to_string`, `am::core::timestamp_to_string`,
//!   `am::core::string_concat`, `am::core::string_format`
//!
//! # Example
//!
//! ```rust
//! use tracedfg_core::{Graph, Value};
//! use tracedfg_nodes::builtin_registry;
//!
//! let registry = builtin_registry().unwrap();
//! let mut graph = Graph::new();
//!
//! let pi = graph.add_node(&registry, "am::core::double_constant").unwrap();
//! graph.set_property(pi, "value", &Value::Double(3.14)).unwrap();
//! graph.set_property(pi, "num_samples", &Value::Int(2)).unwrap();
//!
//! let sum = graph.add_node(&registry, "am::core::arithmetic::double::add").unwrap();
//! graph.connect_by_name(pi, "out", sum, "in").unwrap();
//!
//! graph.schedule().unwrap();
//! let out = graph.buffer_of(sum, "out").unwrap();
//! assert!((out.samples::<f64>().unwrap()[0] - 6.28).abs() < 1e-12);
//! ```

pub mod arithmetic;
pub mod conditional_forward;
pub mod constant;
pub mod logic;
pub mod merge;
pub mod narrow;
pub mod property;
pub mod select_nth;
pub mod statistics;
pub mod string_concat;
pub mod string_format;
pub mod to_string;

pub use narrow::{Binding, Narrowing};

use tracedfg_core::{DfgError, NodeTypeBuilder, Registry, Timestamp};

use arithmetic::Op;
use logic::Connective;
use statistics::Stat;

/// Definitions of every built-in node type.
pub fn builtin_node_types() -> Vec<NodeTypeBuilder> {
    let mut types = vec![
        constant::node_type::<u8>(),
        constant::node_type::<u16>(),
        constant::node_type::<u32>(),
        constant::node_type::<u64>(),
        constant::node_type::<i8>(),
        constant::node_type::<i16>(),
        constant::node_type::<i32>(),
        constant::node_type::<i64>(),
        constant::node_type::<f64>(),
        constant::node_type::<bool>(),
        constant::node_type::<String>(),
    ];

    for op in [Op::Add, Op::Sub] {
        types.extend([
            arithmetic::node_type::<u8>(op),
            arithmetic::node_type::<u16>(op),
            arithmetic::node_type::<u32>(op),
            arithmetic::node_type::<u64>(op),
            arithmetic::node_type::<i8>(op),
            arithmetic::node_type::<i16>(op),
            arithmetic::node_type::<i32>(op),
            arithmetic::node_type::<i64>(op),
            arithmetic::node_type::<Timestamp>(op),
            arithmetic::node_type::<f64>(op),
        ]);
    }

    for connective in [Connective::And, Connective::Or] {
        types.push(logic::folding(connective));
        types.push(logic::pairwise(connective));
    }

    types.push(conditional_forward::node_type());
    types.push(select_nth::node_type());
    types.extend(merge::WIDTHS.iter().filter_map(|&k| merge::node_type(k)));

    for stat in [Stat::Min, Stat::Max, Stat::Average] {
        types.extend([
            statistics::node_type::<u8>(stat),
            statistics::node_type::<u16>(stat),
            statistics::node_type::<u32>(stat),
            statistics::node_type::<u64>(stat),
            statistics::node_type::<i8>(stat),
            statistics::node_type::<i16>(stat),
            statistics::node_type::<i32>(stat),
            statistics::node_type::<i64>(stat),
            statistics::node_type::<Timestamp>(stat),
            statistics::node_type::<f64>(stat),
        ]);
    }

    types.extend([
        to_string::node_type::<u8>(),
        to_string::node_type::<u16>(),
        to_string::node_type::<u32>(),
        to_string::node_type::<u64>(),
        to_string::node_type::<i8>(),
        to_string::node_type::<i16>(),
        to_string::node_type::<i32>(),
        to_string::node_type::<i64>(),
        to_string::timestamp_node_type(),
    ]);
    types.push(string_concat::node_type());
    types.push(string_format::node_type());
    types
}

/// Registers every built-in node type.
///
/// The sample types they refer to must already be registered.
pub fn register_builtin_nodes(registry: &mut Registry) -> Result<(), DfgError> {
    for builder in builtin_node_types() {
        registry.register_node_type(builder)?;
    }
    #[cfg(feature = "tracing")]
    tracing::debug!(
        "register_builtin_nodes: {} node types",
        registry.node_types().len()
    );
    Ok(())
}

/// A registry with the built-in sample types and node types.
pub fn builtin_registry() -> Result<Registry, DfgError> {
    let mut registry = Registry::with_builtin_types();
    register_builtin_nodes(&mut registry)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_builds() {
        let registry = builtin_registry().unwrap();
        let node_types = registry.node_types();
        assert_eq!(node_types.len(), builtin_node_types().len());
        for name in [
            "am::core::uint64_constant",
            "am::core::string_constant",
            "am::core::arithmetic::timestamp::add",
            "am::core::arithmetic::double::sub",
            "am::core::logic::or::pairwise",
            "am::core::filter::conditional_forward::pairwise",
            "am::core::select_nth",
            "am::core::merge8",
            "am::core::statistics::timestamp::average",
            "am::core::statistics::int8::max",
            "am::core::uint32::to_string",
            "am::core::timestamp_to_string",
            "am::core::string_concat",
            "am::core::string_format",
        ] {
            assert!(registry.lookup_node_type(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_node_type_count() {
        // 11 constants, 20 arithmetic, 4 logic, 1 + 1 + 4 filters,
        // 30 statistics, 9 + 1 + 1 strings
        assert_eq!(builtin_node_types().len(), 82);
    }

    #[test]
    fn test_registering_twice_fails() {
        let mut registry = builtin_registry().unwrap();
        let err = register_builtin_nodes(&mut registry).unwrap_err();
        assert!(matches!(err, DfgError::DuplicateType { kind: "node type", .. }));
    }
}
