//! Basic statistics: `am::core::statistics::<type>::{min,max,average}`.
//!
//! Each node reduces the samples on `in` to one sample on `out`. Nothing is
//! written when `in` holds no samples.

use std::marker::PhantomData;

use tracedfg_core::{
    BehaviorFactory, DfgError, NodeBehavior, NodeType, NodeTypeBuilder, ProcessContext, Timestamp,
};

use crate::arithmetic::Checked;
use crate::constant::capitalize;

const IN: usize = 0;
const OUT: usize = 1;

/// Sample types that can be ordered and averaged.
pub trait Summary: Checked + PartialOrd {
    /// `sum / count`, rounded towards zero for integers.
    fn mean(sum: Self, count: usize) -> Self;
}

macro_rules! int_summary {
    ($($ty:ty),*) => {
        $(
            impl Summary for $ty {
                fn mean(sum: Self, count: usize) -> Self {
                    // The quotient lies between the smallest and largest
                    // sample, so it always fits.
                    (sum as i128 / count.max(1) as i128) as $ty
                }
            }
        )*
    };
}

int_summary!(u8, u16, u32, u64, i8, i16, i32, i64);

impl Summary for f64 {
    fn mean(sum: Self, count: usize) -> Self {
        sum / count.max(1) as f64
    }
}

impl Summary for Timestamp {
    fn mean(sum: Self, count: usize) -> Self {
        Timestamp(sum.0 / count.max(1) as u64)
    }
}

/// The three reductions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    /// Smallest sample.
    Min,
    /// Largest sample.
    Max,
    /// Arithmetic mean. Fails if the intermediate sum overflows.
    Average,
}

impl Stat {
    /// Name suffix of the node type.
    pub fn name(self) -> &'static str {
        match self {
            Stat::Min => "min",
            Stat::Max => "max",
            Stat::Average => "average",
        }
    }

    fn human_name(self) -> &'static str {
        match self {
            Stat::Min => "Minimum",
            Stat::Max => "Maximum",
            Stat::Average => "Average",
        }
    }

    /// Reduces `samples`; `Ok(None)` if there are none.
    pub fn reduce<T: Summary>(self, samples: &[T]) -> Result<Option<T>, DfgError> {
        let Some((&first, rest)) = samples.split_first() else {
            return Ok(None);
        };
        let result = match self {
            Stat::Min => rest
                .iter()
                .fold(first, |curr, &s| if curr > s { s } else { curr }),
            Stat::Max => rest
                .iter()
                .fold(first, |curr, &s| if curr < s { s } else { curr }),
            Stat::Average => {
                let mut sum = first;
                for &sample in rest {
                    sum = sum.add(sample).ok_or_else(Self::overflow::<T>)?;
                }
                if !sum.is_valid() {
                    return Err(Self::overflow::<T>());
                }
                T::mean(sum, samples.len())
            }
        };
        Ok(Some(result))
    }

    fn overflow<T: Summary>() -> DfgError {
        DfgError::failure(format!("sum of {} samples overflows", T::SHORT_NAME))
    }
}

/// Statistics node behaviour for sample type `T`.
#[derive(Debug)]
pub struct Statistic<T> {
    stat: Stat,
    _sample: PhantomData<fn() -> T>,
}

impl<T: Summary> Statistic<T> {
    /// Creates a node computing `stat`.
    pub fn new(stat: Stat) -> Self {
        Self {
            stat,
            _sample: PhantomData,
        }
    }
}

impl<T: Summary> NodeBehavior for Statistic<T> {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), DfgError> {
        if !ctx.activated(OUT) || !ctx.has_data(IN) {
            return Ok(());
        }
        let input = ctx.require_input(IN)?;
        if let Some(result) = self.stat.reduce(input.samples::<T>()?)? {
            ctx.output(OUT)?.push(result)?;
        }
        Ok(())
    }
}

fn min<T: Summary>() -> Box<dyn NodeBehavior> {
    Box::new(Statistic::<T>::new(Stat::Min))
}

fn max<T: Summary>() -> Box<dyn NodeBehavior> {
    Box::new(Statistic::<T>::new(Stat::Max))
}

fn average<T: Summary>() -> Box<dyn NodeBehavior> {
    Box::new(Statistic::<T>::new(Stat::Average))
}

/// Definition of the `stat` node for sample type `T`.
pub fn node_type<T: Summary>(stat: Stat) -> NodeTypeBuilder {
    let factory: BehaviorFactory = match stat {
        Stat::Min => min::<T>,
        Stat::Max => max::<T>,
        Stat::Average => average::<T>,
    };
    NodeType::builder(
        format!("am::core::statistics::{}::{}", T::SHORT_NAME, stat.name()),
        format!("{} {}", capitalize(T::SHORT_NAME), stat.human_name()),
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
    fn test_min_max() {
        assert_eq!(Stat::Min.reduce(&[4i16, -7, 9]).unwrap(), Some(-7));
        assert_eq!(Stat::Max.reduce(&[4i16, -7, 9]).unwrap(), Some(9));
        assert_eq!(
            Stat::Max.reduce(&[Timestamp(5), Timestamp(50)]).unwrap(),
            Some(Timestamp(50))
        );
        assert_eq!(Stat::Min.reduce::<u8>(&[]).unwrap(), None);
    }

    #[test]
    fn test_average_truncates_integers() {
        assert_eq!(Stat::Average.reduce(&[1u32, 2, 4]).unwrap(), Some(2));
        assert_eq!(Stat::Average.reduce(&[-3i8, -4]).unwrap(), Some(-3));
        assert_eq!(Stat::Average.reduce(&[1.0f64, 2.0]).unwrap(), Some(1.5));
        assert_eq!(
            Stat::Average.reduce(&[Timestamp(10), Timestamp(21)]).unwrap(),
            Some(Timestamp(15))
        );
    }

    #[test]
    fn test_average_with_many_small_samples() {
        assert!(Stat::Average.reduce(&[3u8; 1000]).is_err());
        assert_eq!(Stat::Average.reduce(&[0u8; 1000]).unwrap(), Some(0));
    }

    #[test]
    fn test_average_overflow_fails() {
        let err = Stat::Average.reduce(&[u64::MAX, 1]).unwrap_err();
        assert_eq!(err.to_string(), "sum of uint64 samples overflows");
        assert!(Stat::Average.reduce(&[f64::MAX, f64::MAX]).is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!(
            node_type::<f64>(Stat::Average).name(),
            "am::core::statistics::double::average"
        );
        assert_eq!(
            node_type::<i64>(Stat::Min).name(),
            "am::core::statistics::int64::min"
        );
    }
}
