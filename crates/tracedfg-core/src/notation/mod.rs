//! Object notation: the structural text format used to save and restore
//! graph topologies.
//!
//! ```text
//! am_dfg_node {
//! 	type: "am::core::double_constant",
//! 	id: 1,
//! 	value: 3.14,
//! 	num_samples: 2
//! }
//! ```
//!
//! A document is a single [`Value`]: a named group of members, a list, a
//! string, an integer or a double. [`parse`] reads text into a value; the
//! [`Display`](std::fmt::Display) impl of [`Value`] writes it back with tab
//! indentation, and `parse(&value.to_string()) == Ok(value)`.

mod parser;

pub use parser::{MAX_DEPTH, ParseError, parse};

use std::fmt::{self, Write};

/// A node of the notation tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `name { member: value, ... }`
    Group(Group),
    /// `[value, ...]`
    List(Vec<Value>),
    /// `"text"`
    String(String),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer above `i64::MAX`.
    UInt(u64),
    /// Floating-point number.
    Double(f64),
}

impl Value {
    /// Short description of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Group(_) => "group",
            Value::List(_) => "list",
            Value::String(_) => "string",
            Value::Int(_) | Value::UInt(_) => "integer",
            Value::Double(_) => "double",
        }
    }

    /// The group, if this is one.
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Value::Group(g) => Some(g),
            _ => None,
        }
    }

    /// The list items, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The value as `i64`, if it is an integer in range.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(n) => Some(n),
            Value::UInt(n) => i64::try_from(n).ok(),
            _ => None,
        }
    }

    /// The value as `u64`, if it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Int(n) => u64::try_from(n).ok(),
            Value::UInt(n) => Some(n),
            _ => None,
        }
    }

    /// The value as `f64`. Integers are converted.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Double(d) => Some(d),
            Value::Int(n) => Some(n as f64),
            Value::UInt(n) => Some(n as f64),
            _ => None,
        }
    }

    /// The value as a boolean: the integers 0 and 1.
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        }
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        i64::try_from(n).map_or(Value::UInt(n), Value::Int)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Int(i64::from(b))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Group> for Value {
    fn from(g: Group) -> Self {
        Value::Group(g)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// A named group with ordered members.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    name: String,
    members: Vec<(String, Value)>,
}

impl Group {
    /// Creates an empty group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    /// Group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a member.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.members.push((name.into(), value.into()));
    }

    /// Members in order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.members.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Value of the first member called `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the group has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Printer
// ---------------------------------------------------------------------------

fn indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_char('\t')?;
    }
    Ok(())
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

/// Writes `value` assuming the cursor already sits at the right column;
/// nested lines are indented relative to `depth`.
fn write_value(f: &mut fmt::Formatter<'_>, value: &Value, depth: usize) -> fmt::Result {
    match value {
        Value::Group(group) => {
            writeln!(f, "{} {{", group.name)?;
            let last = group.members.len().saturating_sub(1);
            for (i, (name, member)) in group.members.iter().enumerate() {
                indent(f, depth + 1)?;
                write!(f, "{name}: ")?;
                write_value(f, member, depth + 1)?;
                f.write_str(if i == last { "\n" } else { ",\n" })?;
            }
            indent(f, depth)?;
            f.write_char('}')
        }
        Value::List(items) if items.is_empty() => f.write_str("[]"),
        Value::List(items) => {
            f.write_str("[\n")?;
            let last = items.len() - 1;
            for (i, item) in items.iter().enumerate() {
                indent(f, depth + 1)?;
                write_value(f, item, depth + 1)?;
                f.write_str(if i == last { "\n" } else { ",\n" })?;
            }
            indent(f, depth)?;
            f.write_char(']')
        }
        Value::String(s) => write_escaped(f, s),
        Value::Int(n) => write!(f, "{n}"),
        Value::UInt(n) => write!(f, "{n}"),
        Value::Double(d) => write!(f, "{d:?}"),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, 0)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, &Value::Group(self.clone()), 0)
    }
}
