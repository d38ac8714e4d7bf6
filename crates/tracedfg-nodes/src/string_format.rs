//! `am::core::string_format`: embeds each input string in a format string.

use tracedfg_core::{DfgError, NodeBehavior, NodeType, NodeTypeBuilder, ProcessContext, Value};

use crate::property;

const IN: usize = 0;
const OUT: usize = 1;

/// Writes one output sample per input sample, with every `%s` in `format`
/// replaced by the input and `%%` by a single `%`. Any other `%` is kept
/// as is.
#[derive(Debug)]
pub struct StringFormat {
    format: String,
}

impl Default for StringFormat {
    fn default() -> Self {
        Self {
            format: "%s".to_string(),
        }
    }
}

impl StringFormat {
    /// Applies the format string to `input`.
    pub fn apply(&self, input: &str) -> String {
        let mut out = String::with_capacity(self.format.len() + input.len());
        let mut chars = self.format.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != '%' {
                out.push(ch);
                continue;
            }
            match chars.peek() {
                Some('s') => {
                    chars.next();
                    out.push_str(input);
                }
                Some('%') => {
                    chars.next();
                    out.push('%');
                }
                _ => out.push('%'),
            }
        }
        out
    }
}

impl NodeBehavior for StringFormat {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), DfgError> {
        if !ctx.activated(OUT) {
            return Ok(());
        }
        let texts: Vec<String> = ctx
            .require_input(IN)?
            .samples::<String>()?
            .iter()
            .map(|s| self.apply(s))
            .collect();
        let out = ctx.output(OUT)?;
        for text in texts {
            out.push(text)?;
        }
        Ok(())
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        (name == "format").then(|| Value::from(self.format.as_str()))
    }

    fn set_property(&mut self, name: &str, value: &Value) -> Result<(), DfgError> {
        if name != "format" {
            return Err(DfgError::invalid_property(name, "no such property"));
        }
        self.format = property::expect(name, value)?;
        Ok(())
    }
}

fn create() -> Box<dyn NodeBehavior> {
    Box::new(StringFormat::default())
}

/// Definition of the node type.
pub fn node_type() -> NodeTypeBuilder {
    NodeType::builder("am::core::string_format", "String Format")
        .mandatory_input("in", "am::core::string")
        .output("out", "am::core::string")
        .property("format", "Format", "am::core::string")
        .pure_functional()
        .factory(create)
}
