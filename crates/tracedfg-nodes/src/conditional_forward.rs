//! `am::core::filter::conditional_forward::pairwise`
//!
//! Selects, sample by sample, between two inputs of the same type:
//! `out[i] = control[i] ? forward_if_true[i] : forward_if_false[i]`.
//! The data ports are wildcards narrowed to one concrete type (see
//! [`crate::narrow`]); `control` is a mandatory boolean input.

use tracedfg_core::{
    Buffer, DataType, DfgError, HookContext, NodeBehavior, NodeType, NodeTypeBuilder,
    ProcessContext, TypeRef,
};

use crate::narrow::Narrowing;

const IF_TRUE: usize = 0;
const IF_FALSE: usize = 1;
const CONTROL: usize = 2;
const OUT: usize = 3;

/// Ports that share the narrowed type.
const NARROWED: [usize; 3] = [IF_TRUE, IF_FALSE, OUT];

/// Pairwise conditional forward.
#[derive(Debug, Default)]
pub struct ConditionalForward {
    narrowing: Narrowing,
}

impl ConditionalForward {
    /// Current binding of the data ports.
    pub fn narrowing(&self) -> &Narrowing {
        &self.narrowing
    }
}

impl NodeBehavior for ConditionalForward {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), DfgError> {
        let if_true = ctx.require_input(IF_TRUE)?;
        let if_false = ctx.require_input(IF_FALSE)?;
        let control = ctx.require_input(CONTROL)?.samples::<bool>()?;

        if if_true.len() != control.len() || if_false.len() != control.len() {
            return Err(DfgError::failure(format!(
                "inputs have different sample counts ({}, {} and {} control samples)",
                if_true.len(),
                if_false.len(),
                control.len()
            )));
        }
        if !ctx.activated(OUT) {
            return Ok(());
        }

        let out = ctx.output(OUT)?;
        let old_len = out.len();
        for (i, &forward_true) in control.iter().enumerate() {
            let src = if forward_true { if_true } else { if_false };
            if let Err(err) = out.copy_from(src, i, 1) {
                rollback(out, old_len)?;
                return Err(err);
            }
        }
        Ok(())
    }

    fn pre_connect(&self, port: usize, peer_type: &DataType) -> Result<(), String> {
        if port == CONTROL {
            return Ok(());
        }
        self.narrowing.admits(peer_type)
    }

    fn connect(
        &mut self,
        ctx: &mut HookContext<'_>,
        port: usize,
        peer_type: &TypeRef,
    ) -> Result<(), DfgError> {
        if port == CONTROL {
            return Ok(());
        }
        self.narrowing.bind(ctx, peer_type, &NARROWED)
    }

    fn disconnect(&mut self, ctx: &mut HookContext<'_>, port: usize) -> Result<(), DfgError> {
        if port == CONTROL {
            return Ok(());
        }
        self.narrowing.release(ctx, &NARROWED)
    }
}

/// Drops the samples appended since the buffer held `len` samples.
pub(crate) fn rollback(buffer: &mut Buffer, len: usize) -> Result<(), DfgError> {
    buffer.shrink(buffer.len().saturating_sub(len))
}

fn create() -> Box<dyn NodeBehavior> {
    Box::new(ConditionalForward::default())
}

/// Definition of the node type.
pub fn node_type() -> NodeTypeBuilder {
    NodeType::builder(
        "am::core::filter::conditional_forward::pairwise",
        "Conditional forward (pairwise)",
    )
    .input("forward if true", "am::core::any")
    .input("forward if false", "am::core::any")
    .mandatory_input("control", "am::core::bool")
    .output("out", "am::core::any")
    .pure_functional()
    .factory(create)
}
