//! The field container tree built and consumed by serialisation passes.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use vc2stream_io::Bits;
use vc2stream_slices::{HqSliceArray, LdSliceArray};

/// A single field value within a [`Context`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Fixed-width or exp-Golomb unsigned integer.
    UInt(u64),
    /// Signed exp-Golomb integer.
    SInt(i64),
    Bool(bool),
    /// A byte string.
    Bytes(Vec<u8>),
    /// An arbitrary-length bit pattern (byte-align or bounded-block
    /// padding).
    Bits(Bits),
    /// A nested field container.
    Context(Context),
    /// The slice data of a low-delay picture.
    LdSlices(LdSliceArray),
    /// The slice data of a high-quality picture.
    HqSlices(HqSliceArray),
}

impl Value {
    /// Short name of the value's kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::UInt(_) => "unsigned integer",
            Value::SInt(_) => "signed integer",
            Value::Bool(_) => "boolean",
            Value::Bytes(_) => "byte string",
            Value::Bits(_) => "bit string",
            Value::Context(_) => "nested context",
            Value::LdSlices(_) => "low-delay slice array",
            Value::HqSlices(_) => "high-quality slice array",
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_sint(&self) -> Option<i64> {
        match self {
            Value::SInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bits(&self) -> Option<&Bits> {
        match self {
            Value::Bits(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_context(&self) -> Option<&Context> {
        match self {
            Value::Context(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::UInt(v) => write!(f, "{v}"),
            Value::SInt(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Bytes(bytes) => {
                write!(f, "0x")?;
                for byte in bytes {
                    write!(f, "{byte:02X}")?;
                }
                Ok(())
            }
            Value::Bits(bits) => write!(f, "{bits}"),
            Value::Context(_) => write!(f, "<nested context>"),
            Value::LdSlices(array) => {
                write!(f, "<low-delay slices x{}>", array.params().slice_count)
            }
            Value::HqSlices(array) => {
                write!(f, "<high-quality slices x{}>", array.params().slice_count)
            }
        }
    }
}

/// An insertion-ordered mapping from target names to value sequences.
///
/// A grammar may visit the same target several times, so each name maps to
/// an ordered sequence: reading appends, writing consumes front to back.
/// Nested structures are contexts stored as values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    entries: Vec<(String, Vec<Value>)>,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct targets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, target: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == target)
    }

    /// The value sequence of a target.
    pub fn get(&self, target: &str) -> Option<&[Value]> {
        self.entries
            .iter()
            .find(|(name, _)| name == target)
            .map(|(_, values)| values.as_slice())
    }

    /// The `index`th value of a target.
    pub fn value(&self, target: &str, index: usize) -> Option<&Value> {
        self.get(target).and_then(|values| values.get(index))
    }

    /// Shorthand for the sole value of a target.
    pub fn single(&self, target: &str) -> Option<&Value> {
        match self.get(target) {
            Some([value]) => Some(value),
            _ => None,
        }
    }

    /// Append a value to a target's sequence, creating the target if new.
    pub fn append(&mut self, target: &str, value: Value) {
        match self.entries.iter_mut().find(|(name, _)| name == target) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((target.to_string(), vec![value])),
        }
    }

    /// Mutable access to a target's value sequence.
    pub fn get_mut(&mut self, target: &str) -> Option<&mut Vec<Value>> {
        self.entries
            .iter_mut()
            .find(|(name, _)| name == target)
            .map(|(_, values)| values)
    }

    /// Replace a target's whole sequence.
    pub fn set(&mut self, target: &str, values: Vec<Value>) {
        match self.entries.iter_mut().find(|(name, _)| name == target) {
            Some((_, existing)) => *existing = values,
            None => self.entries.push((target.to_string(), values)),
        }
    }

    pub(crate) fn value_mut(&mut self, target: &str, index: usize) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(name, _)| name == target)
            .and_then(|(_, values)| values.get_mut(index))
    }

    /// Iterate `(target, values)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, values) in &self.entries {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Context {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ContextVisitor;

        impl<'de> Visitor<'de> for ContextVisitor {
            type Value = Context;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of target names to value sequences")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Context, A::Error> {
                let mut context = Context::new();
                while let Some((name, values)) = access.next_entry::<String, Vec<Value>>()? {
                    context.set(&name, values);
                }
                Ok(context)
            }
        }

        deserializer.deserialize_map(ContextVisitor)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_context(f, self, 0)
    }
}

fn write_context(f: &mut fmt::Formatter<'_>, context: &Context, indent: usize) -> fmt::Result {
    for (name, values) in context.iter() {
        for value in values {
            write!(f, "{:indent$}{name}: ", "", indent = indent)?;
            match value {
                Value::Context(nested) => {
                    writeln!(f)?;
                    write_context(f, nested, indent + 2)?;
                }
                other => writeln!(f, "{other}")?,
            }
        }
    }
    Ok(())
}
