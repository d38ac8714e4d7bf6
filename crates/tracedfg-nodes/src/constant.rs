//! Constant sources: `am::core::<type>_constant`.

use tracedfg_core::{DfgError, NodeBehavior, NodeType, NodeTypeBuilder, ProcessContext, Value};

use crate::property::{self, PropertyValue};

/// Port index of `out`.
const OUT: usize = 0;

/// Writes `num_samples` copies of `value` every pass.
#[derive(Debug, Clone)]
pub struct Constant<T> {
    value: T,
    num_samples: u64,
}

impl<T: PropertyValue> Default for Constant<T> {
    fn default() -> Self {
        Self {
            value: T::default(),
            num_samples: 1,
        }
    }
}

impl<T: PropertyValue> NodeBehavior for Constant<T> {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), DfgError> {
        if !ctx.activated(OUT) {
            return Ok(());
        }
        let count = usize::try_from(self.num_samples).map_err(|_| DfgError::Allocation {
            type_name: T::TYPE_NAME.to_string(),
            requested: usize::MAX,
        })?;
        ctx.output(OUT)?.reserve::<T>(count)?.fill(self.value.clone());
        Ok(())
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        match name {
            "value" => Some(self.value.to_value()),
            "num_samples" => Some(Value::from(self.num_samples)),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: &Value) -> Result<(), DfgError> {
        match name {
            "value" => self.value = property::expect(name, value)?,
            "num_samples" => self.num_samples = property::expect(name, value)?,
            _ => return Err(DfgError::invalid_property(name, "no such property")),
        }
        Ok(())
    }
}

fn create<T: PropertyValue>() -> Box<dyn NodeBehavior> {
    Box::new(Constant::<T>::default())
}

/// Definition of the constant node for sample type `T`.
pub fn node_type<T: PropertyValue>() -> NodeTypeBuilder {
    NodeType::builder(
        format!("am::core::{}_constant", T::SHORT_NAME),
        format!("{} Constant", capitalize(T::SHORT_NAME)),
    )
    .output("out", T::TYPE_NAME)
    .property("value", "Value", T::TYPE_NAME)
    .property("num_samples", "Num samples", "am::core::uint64")
    .factory(create::<T>)
}

pub(crate) fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let node = Constant::<u32>::default();
        assert_eq!(node.get_property("value"), Some(Value::Int(0)));
        assert_eq!(node.get_property("num_samples"), Some(Value::Int(1)));
        assert_eq!(node.get_property("other"), None);
    }

    #[test]
    fn test_set_property_checks_shape() {
        let mut node = Constant::<String>::default();
        node.set_property("value", &Value::from("hello")).unwrap();
        assert_eq!(node.get_property("value"), Some(Value::from("hello")));

        let err = node.set_property("value", &Value::Int(3)).unwrap_err();
        assert!(matches!(err, DfgError::InvalidProperty { .. }));
        let err = node.set_property("num_samples", &Value::Int(-1)).unwrap_err();
        assert!(matches!(err, DfgError::InvalidProperty { .. }));
    }

    #[test]
    fn test_names() {
        let builder = node_type::<f64>();
        assert_eq!(builder.name(), "am::core::double_constant");
        assert_eq!(capitalize("uint8"), "Uint8");
        assert_eq!(capitalize(""), "");
    }
}
