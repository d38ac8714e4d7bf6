//! `am::core::string_concat`: joins all input strings into one.

use tracedfg_core::{DfgError, NodeBehavior, NodeType, NodeTypeBuilder, ProcessContext, Value};

use crate::property;

const IN: usize = 0;
const OUT: usize = 1;

/// Joins the input samples with `separator`.
#[derive(Debug, Default)]
pub struct StringConcat {
    separator: String,
}

impl NodeBehavior for StringConcat {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), DfgError> {
        if !ctx.activated(OUT) {
            return Ok(());
        }
        let joined = ctx
            .require_input(IN)?
            .samples::<String>()?
            .join(&self.separator);
        ctx.output(OUT)?.push(joined)
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        (name == "separator").then(|| Value::from(self.separator.as_str()))
    }

    fn set_property(&mut self, name: &str, value: &Value) -> Result<(), DfgError> {
        if name != "separator" {
            return Err(DfgError::invalid_property(name, "no such property"));
        }
        self.separator = property::expect(name, value)?;
        Ok(())
    }
}

fn create() -> Box<dyn NodeBehavior> {
    Box::new(StringConcat::default())
}

/// Definition of the node type.
pub fn node_type() -> NodeTypeBuilder {
    NodeType::builder("am::core::string_concat", "String Concatenator")
        .mandatory_input("in", "am::core::string")
        .output("out", "am::core::string")
        .property("separator", "Separator", "am::core::string")
        .pure_functional()
        .factory(create)
}
