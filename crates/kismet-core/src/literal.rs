//! Constant values carried by pin defaults and literal terminals.

use ordered_float::OrderedFloat;
use std::fmt;

use crate::{ObjectId, PinCategory, PinType, TypeHash};

/// A constant value.
///
/// Floats are wrapped in [`OrderedFloat`] so literals can be compared and
/// hashed like every other value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Bool(bool),
    Byte(u8),
    Int(i32),
    Float(OrderedFloat<f64>),
    Name(String),
    String(String),
    Text(String),
    /// Object reference; `None` is the null object.
    Object(Option<ObjectId>),
    /// Class reference; `None` is the null class.
    Class(Option<TypeHash>),
    /// Struct value with its fields in declaration order.
    Struct {
        struct_type: TypeHash,
        fields: Vec<(String, Literal)>,
    },
    Array(Vec<Literal>),
}

impl Literal {
    /// Shorthand for a float literal.
    pub fn float(value: f64) -> Self {
        Literal::Float(OrderedFloat(value))
    }

    /// Zero value for a pin type; `None` for exec, wildcard and struct pins.
    ///
    /// Structs need their field list, which only the metadata knows.
    pub fn default_for(pin_type: &PinType) -> Option<Self> {
        if pin_type.is_array {
            return Some(Literal::Array(Vec::new()));
        }
        let value = match pin_type.category {
            PinCategory::Bool => Literal::Bool(false),
            PinCategory::Byte => Literal::Byte(0),
            PinCategory::Int => Literal::Int(0),
            PinCategory::Float => Literal::float(0.0),
            PinCategory::Name => Literal::Name(String::new()),
            PinCategory::String => Literal::String(String::new()),
            PinCategory::Text => Literal::Text(String::new()),
            PinCategory::Object | PinCategory::Interface => Literal::Object(None),
            PinCategory::Class => Literal::Class(None),
            PinCategory::Exec
            | PinCategory::Wildcard
            | PinCategory::Struct
            | PinCategory::Delegate
            | PinCategory::MulticastDelegate => return None,
        };
        Some(value)
    }

    /// Field of a struct literal by name.
    pub fn field(&self, name: &str) -> Option<&Literal> {
        match self {
            Literal::Struct { fields, .. } => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Mutable field of a struct literal by name.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Literal> {
        match self {
            Literal::Struct { fields, .. } => fields
                .iter_mut()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Truthiness used by conditional jumps.
    pub fn is_truthy(&self) -> bool {
        match self {
            Literal::Bool(b) => *b,
            Literal::Byte(b) => *b != 0,
            Literal::Int(i) => *i != 0,
            Literal::Object(o) => o.is_some(),
            Literal::Class(c) => c.is_some(),
            _ => false,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Byte(b) => write!(f, "{b}"),
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Float(x) => write!(f, "{}", x.0),
            Literal::Name(s) | Literal::Text(s) => write!(f, "{s}"),
            Literal::String(s) => write!(f, "{s:?}"),
            Literal::Object(None) | Literal::Class(None) => write!(f, "None"),
            Literal::Object(Some(id)) => write!(f, "object#{}", id.0),
            Literal::Class(Some(hash)) => write!(f, "class {hash}"),
            Literal::Struct { fields, .. } => {
                write!(f, "(")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}={value}")?;
                }
                write!(f, ")")
            }
            Literal::Array(items) => write!(f, "[{} items]", items.len()),
        }
    }
}
