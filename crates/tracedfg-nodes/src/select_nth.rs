//! `am::core::select_nth`: forwards a single sample selected by index.

use tracedfg_core::{
    DataType, DfgError, HookContext, NodeBehavior, NodeType, NodeTypeBuilder, ProcessContext,
    TypeRef, Value,
};

use crate::narrow::Narrowing;
use crate::property;

const IN: usize = 0;
const OUT: usize = 1;
const NARROWED: [usize; 2] = [IN, OUT];

/// Forwards sample `N` of its input.
///
/// Non-negative `N` counts from the start, negative `N` from the end
/// (`-1` is the last sample).
#[derive(Debug)]
pub struct SelectNth {
    n: i64,
    fail_if_no_input: bool,
    narrowing: Narrowing,
}

impl Default for SelectNth {
    fn default() -> Self {
        Self {
            n: 0,
            fail_if_no_input: true,
            narrowing: Narrowing::new(),
        }
    }
}

impl SelectNth {
    /// Index of the selected sample in an input of `len` samples.
    pub fn index(&self, len: usize) -> Option<usize> {
        if self.n >= 0 {
            usize::try_from(self.n).ok().filter(|&i| i < len)
        } else {
            let back = usize::try_from(self.n.unsigned_abs()).ok()?;
            len.checked_sub(back)
        }
    }
}

impl NodeBehavior for SelectNth {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), DfgError> {
        if !ctx.activated(OUT) {
            return Ok(());
        }
        let Some(input) = ctx.input(IN) else {
            return Ok(());
        };

        match self.index(input.len()) {
            Some(index) => ctx.output(OUT)?.copy_from(input, index, 1),
            None if self.fail_if_no_input => Err(DfgError::failure(format!(
                "no sample at index {} in input of {} samples",
                self.n,
                input.len()
            ))),
            None => Ok(()),
        }
    }

    fn pre_connect(&self, _port: usize, peer_type: &DataType) -> Result<(), String> {
        self.narrowing.admits(peer_type)
    }

    fn connect(
        &mut self,
        ctx: &mut HookContext<'_>,
        _port: usize,
        peer_type: &TypeRef,
    ) -> Result<(), DfgError> {
        self.narrowing.bind(ctx, peer_type, &NARROWED)
    }

    fn disconnect(&mut self, ctx: &mut HookContext<'_>, _port: usize) -> Result<(), DfgError> {
        self.narrowing.release(ctx, &NARROWED)
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        match name {
            "N" => Some(Value::Int(self.n)),
            "fail_if_no_input" => Some(Value::from(self.fail_if_no_input)),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: &Value) -> Result<(), DfgError> {
        match name {
            "N" => self.n = property::expect(name, value)?,
            "fail_if_no_input" => self.fail_if_no_input = property::expect(name, value)?,
            _ => return Err(DfgError::invalid_property(name, "no such property")),
        }
        Ok(())
    }
}

fn create() -> Box<dyn NodeBehavior> {
    Box::new(SelectNth::default())
}

/// Definition of the node type.
pub fn node_type() -> NodeTypeBuilder {
    NodeType::builder("am::core::select_nth", "Select Nth")
        .input("in", "am::core::any")
        .output("out", "am::core::any")
        .property("N", "N", "am::core::int64")
        .property("fail_if_no_input", "Fail if no input", "am::core::bool")
        .pure_functional()
        .factory(create)
}
