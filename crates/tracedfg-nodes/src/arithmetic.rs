//! Folding arithmetic: `am::core::arithmetic::<type>::{add,sub}`.
//!
//! Both nodes reduce all samples on `in` to a single sample on `out`.
//! `add` sums from zero; `sub` starts from the first sample and subtracts
//! the remaining ones. Overflow, and any non-finite double result, fails
//! the node. Without input samples nothing is written.

use std::marker::PhantomData;

use tracedfg_core::{
    BehaviorFactory, DfgError, NamedSample, NodeBehavior, NodeType, NodeTypeBuilder,
    ProcessContext, Timestamp,
};

use crate::constant::capitalize;

const IN: usize = 0;
const OUT: usize = 1;

/// Sample types with checked addition and subtraction.
pub trait Checked: NamedSample + Copy {
    /// Additive identity.
    const ZERO: Self;

    /// `self + rhs`, or `None` if the result is not representable.
    fn add(self, rhs: Self) -> Option<Self>;

    /// `self - rhs`, or `None` if the result is not representable.
    fn sub(self, rhs: Self) -> Option<Self>;

    /// Returns `false` for values that must not be emitted.
    fn is_valid(self) -> bool {
        true
    }
}

macro_rules! checked_int {
    ($($ty:ty),*) => {
        $(
            impl Checked for $ty {
                const ZERO: Self = 0;

                fn add(self, rhs: Self) -> Option<Self> {
                    self.checked_add(rhs)
                }

                fn sub(self, rhs: Self) -> Option<Self> {
                    self.checked_sub(rhs)
                }
            }
        )*
    };
}

checked_int!(u8, u16, u32, u64, i8, i16, i32, i64);

impl Checked for f64 {
    const ZERO: Self = 0.0;

    fn add(self, rhs: Self) -> Option<Self> {
        Some(self + rhs).filter(|r| r.is_finite())
    }

    fn sub(self, rhs: Self) -> Option<Self> {
        Some(self - rhs).filter(|r| r.is_finite())
    }

    fn is_valid(self) -> bool {
        self.is_finite()
    }
}

impl Checked for Timestamp {
    const ZERO: Self = Timestamp(0);

    fn add(self, rhs: Self) -> Option<Self> {
        self.checked_add(rhs)
    }

    fn sub(self, rhs: Self) -> Option<Self> {
        self.checked_sub(rhs)
    }
}

/// The two folding operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Sum of all samples.
    Add,
    /// First sample minus the rest.
    Sub,
}

impl Op {
    /// Name suffix of the node type.
    pub fn name(self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Sub => "sub",
        }
    }

    /// Folds `samples`; `Ok(None)` if there are none.
    pub fn fold<T: Checked>(self, samples: &[T]) -> Result<Option<T>, DfgError> {
        let Some((&first, rest)) = samples.split_first() else {
            return Ok(None);
        };
        let overflow = || {
            DfgError::failure(format!(
                "{} of {} samples overflows",
                self.name(),
                T::SHORT_NAME
            ))
        };
        let (mut acc, rest) = match self {
            Op::Add => (T::ZERO, samples),
            Op::Sub => (first, rest),
        };
        for &sample in rest {
            let next = match self {
                Op::Add => acc.add(sample),
                Op::Sub => acc.sub(sample),
            };
            acc = next.ok_or_else(overflow)?;
        }
        if !acc.is_valid() {
            return Err(overflow());
        }
        Ok(Some(acc))
    }
}

/// Arithmetic node behaviour for sample type `T`.
#[derive(Debug)]
pub struct Arithmetic<T> {
    op: Op,
    _sample: PhantomData<fn() -> T>,
}

impl<T: Checked> Arithmetic<T> {
    /// Creates a node applying `op`.
    pub fn new(op: Op) -> Self {
        Self {
            op,
            _sample: PhantomData,
        }
    }
}

impl<T: Checked> NodeBehavior for Arithmetic<T> {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), DfgError> {
        if !ctx.activated(OUT) {
            return Ok(());
        }
        let Some(input) = ctx.input(IN) else {
            return Ok(());
        };
        if let Some(result) = self.op.fold(input.samples::<T>()?)? {
            ctx.output(OUT)?.push(result)?;
        }
        Ok(())
    }
}

fn add<T: Checked>() -> Box<dyn NodeBehavior> {
    Box::new(Arithmetic::<T>::new(Op::Add))
}

fn sub<T: Checked>() -> Box<dyn NodeBehavior> {
    Box::new(Arithmetic::<T>::new(Op::Sub))
}

/// Definition of the `op` node for sample type `T`.
pub fn node_type<T: Checked>(op: Op) -> NodeTypeBuilder {
    let factory: BehaviorFactory = match op {
        Op::Add => add::<T>,
        Op::Sub => sub::<T>,
    };
    NodeType::builder(
        format!("am::core::arithmetic::{}::{}", T::SHORT_NAME, op.name()),
        format!("{} {}", capitalize(T::SHORT_NAME), capitalize(op.name())),
    )
    .input("in", T::TYPE_NAME)
    .output("out", T::TYPE_NAME)
    .pure_functional()
    .factory(factory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_sums_from_zero() {
        assert_eq!(Op::Add.fold(&[1u8, 2, 3]).unwrap(), Some(6));
        assert_eq!(Op::Add.fold(&[3.14, 3.14]).unwrap(), Some(6.28));
        assert_eq!(Op::Add.fold::<i32>(&[]).unwrap(), None);
    }

    #[test]
    fn test_sub_starts_from_first() {
        assert_eq!(Op::Sub.fold(&[10i64, 3, 2]).unwrap(), Some(5));
        assert_eq!(Op::Sub.fold(&[7u16]).unwrap(), Some(7));
        assert_eq!(
            Op::Sub.fold(&[Timestamp(100), Timestamp(40)]).unwrap(),
            Some(Timestamp(60))
        );
    }

    #[test]
    fn test_overflow_fails() {
        let err = Op::Add.fold(&[200u8, 100]).unwrap_err();
        assert_eq!(err.to_string(), "add of uint8 samples overflows");
        assert!(Op::Sub.fold(&[1u64, 2]).is_err());
        assert!(Op::Sub.fold(&[i8::MIN, 1]).is_err());
    }

    #[test]
    fn test_non_finite_double_fails() {
        assert!(Op::Add.fold(&[f64::MAX, f64::MAX]).is_err());
        assert!(Op::Add.fold(&[f64::NAN]).is_err());
        assert!(Op::Sub.fold(&[f64::INFINITY]).is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!(
            node_type::<Timestamp>(Op::Sub).name(),
            "am::core::arithmetic::timestamp::sub"
        );
        assert_eq!(
            node_type::<u64>(Op::Add).name(),
            "am::core::arithmetic::uint64::add"
        );
    }
}
