//! `am::core::merge<K>`: concatenation of K inputs.

use tracedfg_core::{
    BehaviorFactory, DataType, DfgError, HookContext, NodeBehavior, NodeType, NodeTypeBuilder,
    ProcessContext, TypeRef,
};

use crate::conditional_forward::rollback;
use crate::narrow::Narrowing;

/// Input counts with a registered merge node.
pub const WIDTHS: [usize; 4] = [2, 3, 4, 8];

/// Appends every connected input to `out`, in port order.
#[derive(Debug)]
pub struct Merge {
    inputs: usize,
    ports: Vec<usize>,
    narrowing: Narrowing,
}

impl Merge {
    /// Creates a merge of `inputs` ports `in0..in{inputs-1}` followed by `out`.
    pub fn new(inputs: usize) -> Self {
        Self {
            inputs,
            ports: (0..=inputs).collect(),
            narrowing: Narrowing::new(),
        }
    }
}

impl NodeBehavior for Merge {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), DfgError> {
        let out_port = self.inputs;
        if !ctx.activated(out_port) {
            return Ok(());
        }

        let inputs: Vec<_> = (0..self.inputs)
            .filter_map(|port| ctx.input(port))
            .filter(|buffer| !buffer.is_empty())
            .collect();
        let out = ctx.output(out_port)?;
        let old_len = out.len();
        for input in inputs {
            if let Err(err) = out.copy_from(input, 0, input.len()) {
                rollback(out, old_len)?;
                return Err(err);
            }
        }
        Ok(())
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
        self.narrowing.bind(ctx, peer_type, &self.ports)
    }

    fn disconnect(&mut self, ctx: &mut HookContext<'_>, _port: usize) -> Result<(), DfgError> {
        self.narrowing.release(ctx, &self.ports)
    }
}

fn create<const K: usize>() -> Box<dyn NodeBehavior> {
    Box::new(Merge::new(K))
}

/// Definition of the merge node with `inputs` inputs, or `None` if no such
/// node exists.
pub fn node_type(inputs: usize) -> Option<NodeTypeBuilder> {
    let factory: BehaviorFactory = match inputs {
        2 => create::<2>,
        3 => create::<3>,
        4 => create::<4>,
        8 => create::<8>,
        _ => return None,
    };
    let builder = NodeType::builder(
        format!("am::core::merge{inputs}"),
        format!("Merge {inputs} Inputs"),
    );
    let builder = (0..inputs).fold(builder, |b, i| b.input(&format!("in{i}"), "am::core::any"));
    Some(builder.output("out", "am::core::any").pure_functional().factory(factory))
}
