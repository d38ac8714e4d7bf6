//! Conversion between sample values and notation values for node properties.

use tracedfg_core::{DfgError, NamedSample, Timestamp, Value};

/// A sample type that can be stored in a node property.
pub trait PropertyValue: NamedSample {
    /// Converts a notation value, or `None` if it has the wrong shape or is
    /// out of range.
    fn from_value(value: &Value) -> Option<Self>;

    /// Converts to a notation value.
    fn to_value(&self) -> Value;
}

macro_rules! signed_property {
    ($($ty:ty),*) => {
        $(
            impl PropertyValue for $ty {
                fn from_value(value: &Value) -> Option<Self> {
                    value.as_i64().and_then(|v| <$ty>::try_from(v).ok())
                }

                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }
            }
        )*
    };
}

macro_rules! unsigned_property {
    ($($ty:ty),*) => {
        $(
            impl PropertyValue for $ty {
                fn from_value(value: &Value) -> Option<Self> {
                    value.as_u64().and_then(|v| <$ty>::try_from(v).ok())
                }

                fn to_value(&self) -> Value {
                    Value::from(u64::from(*self))
                }
            }
        )*
    };
}

signed_property!(i8, i16, i32, i64);
unsigned_property!(u8, u16, u32, u64);

impl PropertyValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }

    fn to_value(&self) -> Value {
        Value::Double(*self)
    }
}

impl PropertyValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }

    fn to_value(&self) -> Value {
        Value::from(*self)
    }
}

impl PropertyValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl PropertyValue for Timestamp {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_u64().map(Timestamp)
    }

    fn to_value(&self) -> Value {
        Value::from(self.0)
    }
}

/// Converts a property value or fails with [`DfgError::InvalidProperty`].
pub fn expect<T: PropertyValue>(name: &str, value: &Value) -> Result<T, DfgError> {
    T::from_value(value).ok_or_else(|| {
        DfgError::invalid_property(
            name,
            format!("expected a {} value, found {}", T::TYPE_NAME, value.kind()),
        )
    })
}
