//! Boolean logic: `am::core::logic::{and,or}::{folding,pairwise}`.

use tracedfg_core::{BehaviorFactory, DfgError, NodeBehavior, NodeType, NodeTypeBuilder, ProcessContext};

const BOOL: &str = "am::core::bool";

/// Logical connective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
}

impl Connective {
    fn name(self) -> &'static str {
        match self {
            Connective::And => "and",
            Connective::Or => "or",
        }
    }

    fn apply(self, a: bool, b: bool) -> bool {
        match self {
            Connective::And => a && b,
            Connective::Or => a || b,
        }
    }

    /// Reduces `values`; the empty reduction is the identity element.
    pub fn fold(self, values: &[bool]) -> bool {
        match self {
            Connective::And => values.iter().all(|&v| v),
            Connective::Or => values.iter().any(|&v| v),
        }
    }
}

/// Reduces all samples on `in` to one sample on `out`.
#[derive(Debug)]
pub struct Folding(Connective);

impl NodeBehavior for Folding {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), DfgError> {
        if !ctx.activated(1) {
            return Ok(());
        }
        let Some(input) = ctx.input(0) else {
            return Ok(());
        };
        let result = self.0.fold(input.samples::<bool>()?);
        ctx.output(1)?.push(result)
    }
}

/// Combines `a[i]` and `b[i]` into `out[i]`.
#[derive(Debug)]
pub struct Pairwise(Connective);

impl NodeBehavior for Pairwise {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), DfgError> {
        let a = ctx.require_input(0)?.samples::<bool>()?;
        let b = ctx.require_input(1)?.samples::<bool>()?;
        if a.len() != b.len() {
            return Err(DfgError::failure(format!(
                "inputs have different sample counts ({} and {})",
                a.len(),
                b.len()
            )));
        }
        if !ctx.activated(2) {
            return Ok(());
        }

        let out = ctx.output(2)?.reserve::<bool>(a.len())?;
        for ((slot, &x), &y) in out.iter_mut().zip(a).zip(b) {
            *slot = self.0.apply(x, y);
        }
        Ok(())
    }
}

fn folding_and() -> Box<dyn NodeBehavior> {
    Box::new(Folding(Connective::And))
}

fn folding_or() -> Box<dyn NodeBehavior> {
    Box::new(Folding(Connective::Or))
}

fn pairwise_and() -> Box<dyn NodeBehavior> {
    Box::new(Pairwise(Connective::And))
}

fn pairwise_or() -> Box<dyn NodeBehavior> {
    Box::new(Pairwise(Connective::Or))
}

/// Definition of the folding node for `op`.
pub fn folding(op: Connective) -> NodeTypeBuilder {
    let factory: BehaviorFactory = match op {
        Connective::And => folding_and,
        Connective::Or => folding_or,
    };
    NodeType::builder(
        format!("am::core::logic::{}::folding", op.name()),
        format!("Logical {} (folding)", op.name()),
    )
    .input("in", BOOL)
    .output("out", BOOL)
    .pure_functional()
    .factory(factory)
}

/// Definition of the pairwise node for `op`.
pub fn pairwise(op: Connective) -> NodeTypeBuilder {
    let factory: BehaviorFactory = match op {
        Connective::And => pairwise_and,
        Connective::Or => pairwise_or,
    };
    NodeType::builder(
        format!("am::core::logic::{}::pairwise", op.name()),
        format!("Logical {} (pairwise)", op.name()),
    )
    .input("a", BOOL)
    .input("b", BOOL)
    .output("out", BOOL)
    .pure_functional()
    .factory(factory)
}
