//! Built-in sample types of the `am::core` namespace.

use std::fmt;

use super::{DataType, Sample, TypeRegistry};
use crate::error::DfgError;

/// Point in time, in nanoseconds since the start of the trace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Checked addition; `None` on overflow.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Checked subtraction; `None` on underflow.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Half-open time span between two timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Interval {
    /// First timestamp of the interval.
    pub start: Timestamp,
    /// End of the interval.
    pub end: Timestamp,
}

impl Interval {
    /// Creates an interval from raw nanosecond values.
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start: Timestamp(start),
            end: Timestamp(end),
        }
    }

    /// Length of the interval, or `None` if `end < start`.
    pub fn duration(&self) -> Option<u64> {
        self.end.0.checked_sub(self.start.0)
    }
}

/// A [`Sample`] with a fixed registered name.
///
/// Generic node implementations use this to derive their port types and
/// node-type names from the Rust sample type.
pub trait NamedSample: Sample {
    /// Fully qualified type name, e.g. `"am::core::uint8"`.
    const TYPE_NAME: &'static str;
    /// Name without namespace, e.g. `"uint8"`.
    const SHORT_NAME: &'static str;
}

macro_rules! text_sample {
    ($($ty:ty => $short:literal),* $(,)?) => {
        $(
            impl Sample for $ty {
                fn to_text(&self) -> Option<String> {
                    Some(self.to_string())
                }

                fn from_text(text: &str) -> Option<Self> {
                    text.trim().parse().ok()
                }
            }

            impl NamedSample for $ty {
                const TYPE_NAME: &'static str = concat!("am::core::", $short);
                const SHORT_NAME: &'static str = $short;
            }
        )*
    };
}

text_sample! {
    u8 => "uint8",
    u16 => "uint16",
    u32 => "uint32",
    u64 => "uint64",
    i8 => "int8",
    i16 => "int16",
    i32 => "int32",
    i64 => "int64",
    f64 => "double",
}

impl Sample for bool {
    fn to_text(&self) -> Option<String> {
        Some(self.to_string())
    }

    fn from_text(text: &str) -> Option<Self> {
        match text.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
}

impl NamedSample for bool {
    const TYPE_NAME: &'static str = "am::core::bool";
    const SHORT_NAME: &'static str = "bool";
}

impl Sample for String {
    fn to_text(&self) -> Option<String> {
        Some(self.clone())
    }

    fn from_text(text: &str) -> Option<Self> {
        Some(text.to_string())
    }
}

impl NamedSample for String {
    const TYPE_NAME: &'static str = "am::core::string";
    const SHORT_NAME: &'static str = "string";
}

impl Sample for Timestamp {
    fn to_text(&self) -> Option<String> {
        Some(self.0.to_string())
    }

    fn from_text(text: &str) -> Option<Self> {
        text.trim().parse().ok().map(Timestamp)
    }
}

impl NamedSample for Timestamp {
    const TYPE_NAME: &'static str = "am::core::timestamp";
    const SHORT_NAME: &'static str = "timestamp";
}

impl Sample for Interval {
    fn to_text(&self) -> Option<String> {
        Some(format!("[{}, {}]", self.start, self.end))
    }

    fn from_text(text: &str) -> Option<Self> {
        let inner = text.trim().strip_prefix('[')?.strip_suffix(']')?;
        let (start, end) = inner.split_once(',')?;
        Some(Self::new(start.trim().parse().ok()?, end.trim().parse().ok()?))
    }
}

impl NamedSample for Interval {
    const TYPE_NAME: &'static str = "am::core::interval";
    const SHORT_NAME: &'static str = "interval";
}

fn named<T: NamedSample>() -> DataType {
    DataType::new::<T>(T::TYPE_NAME)
}

/// The wildcard followed by every built-in concrete type.
pub fn builtin_types() -> Vec<DataType> {
    vec![
        DataType::any(),
        named::<bool>(),
        named::<u8>(),
        named::<u16>(),
        named::<u32>(),
        named::<u64>(),
        named::<i8>(),
        named::<i16>(),
        named::<i32>(),
        named::<i64>(),
        named::<f64>(),
        named::<String>(),
        named::<Timestamp>(),
        named::<Interval>(),
    ]
}

/// Registers the wildcard and every built-in concrete type.
pub fn register_builtin_types(registry: &mut TypeRegistry) -> Result<(), DfgError> {
    for data_type in builtin_types() {
        registry.register(data_type)?;
    }
    Ok(())
}
