//! Conversions to strings.
//!
//! - `am::core::<int>::to_string` renders integer samples in decimal.
//! - `am::core::timestamp_to_string` renders timestamps either in plain
//!   decimal or, with `pretty_print` set, with an SI prefix and at most
//!   `max_significant_digits` digits (`1234567` becomes `1.23M`). A trailing
//!   `+` marks a value whose integer digits did not all fit.

use std::marker::PhantomData;

use tracedfg_core::{
    DfgError, NamedSample, NodeBehavior, NodeType, NodeTypeBuilder, ProcessContext, Timestamp,
    Value,
};

use crate::constant::capitalize;
use crate::property;

const IN: usize = 0;
const OUT: usize = 1;

/// Converts every input sample with the type's string converter.
#[derive(Debug, Default)]
pub struct Stringify<T>(PhantomData<fn() -> T>);

impl<T: NamedSample> NodeBehavior for Stringify<T> {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), DfgError> {
        if !ctx.activated(OUT) {
            return Ok(());
        }
        let Some(input) = ctx.input(IN) else {
            return Ok(());
        };

        let texts = input
            .samples::<T>()?
            .iter()
            .map(|sample| {
                sample.to_text().ok_or_else(|| {
                    DfgError::failure(format!("{} has no string conversion", T::TYPE_NAME))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let out = ctx.output(OUT)?;
        for text in texts {
            out.push(text)?;
        }
        Ok(())
    }
}

fn create<T: NamedSample>() -> Box<dyn NodeBehavior> {
    Box::new(Stringify::<T>(PhantomData))
}

/// Definition of the conversion node for sample type `T`.
pub fn node_type<T: NamedSample>() -> NodeTypeBuilder {
    NodeType::builder(
        format!("am::core::{}::to_string", T::SHORT_NAME),
        format!("{} -> String", capitalize(T::SHORT_NAME)),
    )
    .input("in", T::TYPE_NAME)
    .on_demand_output("out", "am::core::string")
    .pure_functional()
    .factory(create::<T>)
}

const SI_PREFIXES: [&str; 7] = ["", "K", "M", "G", "T", "P", "E"];

const SI_VALUES: [u64; 7] = [
    1,
    1_000,
    1_000_000,
    1_000_000_000,
    1_000_000_000_000,
    1_000_000_000_000_000,
    1_000_000_000_000_000_000,
];

/// Formats `value` with an SI prefix and at most `max_digits` significant
/// digits. Trailing zeros after the decimal point are omitted; a `+` is
/// appended if integer digits had to be dropped.
pub fn si_format(value: u64, max_digits: usize) -> String {
    let unit_idx = SI_VALUES
        .iter()
        .rposition(|&unit| value / unit != 0)
        .unwrap_or(0);
    let unit = SI_VALUES[unit_idx];

    let (mut f, mut unit_digits): (u64, usize) = match value / unit {
        100.. => (100 * unit, 3),
        10.. => (10 * unit, 2),
        _ => (unit, 1),
    };

    let mut out = String::new();
    let mut rest = value;
    let mut remaining = max_digits;
    while remaining > 0 {
        remaining -= 1;
        let Some(digit) = rest.checked_div(f) else {
            break;
        };
        unit_digits = unit_digits.saturating_sub(1);
        out.push(char::from(b'0' + digit as u8));
        rest %= f;

        if rest == 0 && unit_digits == 0 {
            break;
        }
        if f == unit && remaining > 0 {
            out.push('.');
        }
        f /= 10;
    }

    out.push_str(SI_PREFIXES[unit_idx]);
    if unit_digits != 0 {
        out.push('+');
    }
    out
}

/// Timestamp conversion with optional SI pretty printing.
#[derive(Debug)]
pub struct TimestampToString {
    pretty_print: bool,
    max_significant_digits: u8,
}

impl Default for TimestampToString {
    fn default() -> Self {
        Self {
            pretty_print: false,
            max_significant_digits: 3,
        }
    }
}

impl TimestampToString {
    /// Renders one timestamp according to the current properties.
    pub fn render(&self, timestamp: Timestamp) -> String {
        if self.pretty_print {
            si_format(timestamp.0, usize::from(self.max_significant_digits))
        } else {
            timestamp.0.to_string()
        }
    }
}

impl NodeBehavior for TimestampToString {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), DfgError> {
        if !ctx.activated(OUT) {
            return Ok(());
        }
        let Some(input) = ctx.input(IN) else {
            return Ok(());
        };

        let texts: Vec<String> = input
            .samples::<Timestamp>()?
            .iter()
            .map(|&t| self.render(t))
            .collect();
        let out = ctx.output(OUT)?;
        for text in texts {
            out.push(text)?;
        }
        Ok(())
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        match name {
            "pretty_print" => Some(Value::from(self.pretty_print)),
            "max_significant_digits" => Some(Value::from(u64::from(self.max_significant_digits))),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: &Value) -> Result<(), DfgError> {
        match name {
            "pretty_print" => self.pretty_print = property::expect(name, value)?,
            "max_significant_digits" => {
                self.max_significant_digits = property::expect(name, value)?;
            }
            _ => return Err(DfgError::invalid_property(name, "no such property")),
        }
        Ok(())
    }
}

fn create_timestamp() -> Box<dyn NodeBehavior> {
    Box::new(TimestampToString::default())
}

/// Definition of `am::core::timestamp_to_string`.
pub fn timestamp_node_type() -> NodeTypeBuilder {
    NodeType::builder("am::core::timestamp_to_string", "Timestamp -> String")
        .input("in", Timestamp::TYPE_NAME)
        .on_demand_output("out", "am::core::string")
        .property("pretty_print", "Pretty print", "am::core::bool")
        .property(
            "max_significant_digits",
            "Significant digits",
            "am::core::uint8",
        )
        .pure_functional()
        .factory(create_timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(node_type::<i16>().name(), "am::core::int16::to_string");
        assert_eq!(node_type::<u64>().name(), "am::core::uint64::to_string");
        assert_eq!(timestamp_node_type().name(), "am::core::timestamp_to_string");
    }

    #[test]
    fn test_si_format() {
        assert_eq!(si_format(0, 3), "0");
        assert_eq!(si_format(7, 3), "7");
        assert_eq!(si_format(1_234_567, 3), "1.23M");
        assert_eq!(si_format(1_500, 3), "1.5K");
        assert_eq!(si_format(2_000_000_000, 3), "2G");
        assert_eq!(si_format(999_999, 3), "999K");
        assert_eq!(si_format(u64::MAX, 3), "18.4E");
    }

    #[test]
    fn test_si_format_marks_dropped_digits() {
        assert_eq!(si_format(123_456, 2), "12K+");
        assert_eq!(si_format(5_000, 0), "K+");
    }

    #[test]
    fn test_timestamp_properties() {
        let mut node = TimestampToString::default();
        assert_eq!(node.get_property("pretty_print"), Some(Value::from(false)));
        assert_eq!(
            node.get_property("max_significant_digits"),
            Some(Value::from(3u64))
        );
        assert_eq!(node.render(Timestamp(1_234_567)), "1234567");

        node.set_property("pretty_print", &Value::Int(1)).unwrap();
        node.set_property("max_significant_digits", &Value::Int(2))
            .unwrap();
        assert_eq!(node.render(Timestamp(1_234_567)), "1.2M");

        assert!(node
            .set_property("max_significant_digits", &Value::Int(256))
            .is_err());
        assert!(node.set_property("format", &Value::from("x")).is_err());
    }
}
