//! Pin types and the connection compatibility rules of the graph schema.

use crate::{MetadataProvider, TypeHash};

/// Pin names shared by node layouts and handlers.
pub mod pin_names {
    pub const EXECUTE: &str = "execute";
    pub const THEN: &str = "then";
    pub const ELSE: &str = "else";
    pub const SELF: &str = "self";
    pub const RETURN_VALUE: &str = "ReturnValue";
    pub const CONDITION: &str = "Condition";
    pub const CAST_FAILED: &str = "CastFailed";
    pub const DELEGATE: &str = "Delegate";
    pub const OUTPUT_GET: &str = "Output_Get";
    pub const SELECTION: &str = "Selection";
    pub const RESET: &str = "Reset";
    pub const IS_LOOP: &str = "Loop";
    pub const START_INDEX: &str = "StartIndex";
}

/// Which side of a node a pin sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinDirection {
    Input,
    Output,
}

impl PinDirection {
    /// The direction a pin must have to connect to this one.
    pub fn opposite(self) -> Self {
        match self {
            PinDirection::Input => PinDirection::Output,
            PinDirection::Output => PinDirection::Input,
        }
    }
}

/// Broad type category of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinCategory {
    Exec,
    Bool,
    Byte,
    Int,
    Float,
    Name,
    String,
    Text,
    Object,
    Class,
    Interface,
    Struct,
    Delegate,
    MulticastDelegate,
    Wildcard,
}

/// Full type of a pin.
///
/// `sub_object` narrows the category: the class of an object, class or
/// interface pin, the struct of a struct pin, the enum of a byte pin, or the
/// signature function of a delegate pin. `None` on an object pin means "any
/// object".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PinType {
    pub category: PinCategory,
    pub sub_object: Option<TypeHash>,
    pub is_array: bool,
    pub is_reference: bool,
    pub is_const: bool,
}

impl PinType {
    pub fn new(category: PinCategory) -> Self {
        Self {
            category,
            sub_object: None,
            is_array: false,
            is_reference: false,
            is_const: false,
        }
    }

    fn with_sub(category: PinCategory, sub: TypeHash) -> Self {
        Self {
            sub_object: Some(sub),
            ..Self::new(category)
        }
    }

    pub fn exec() -> Self {
        Self::new(PinCategory::Exec)
    }

    pub fn bool() -> Self {
        Self::new(PinCategory::Bool)
    }

    pub fn byte() -> Self {
        Self::new(PinCategory::Byte)
    }

    /// Byte pin carrying a value of `enum_type`.
    pub fn enum_byte(enum_type: TypeHash) -> Self {
        Self::with_sub(PinCategory::Byte, enum_type)
    }

    pub fn int() -> Self {
        Self::new(PinCategory::Int)
    }

    pub fn float() -> Self {
        Self::new(PinCategory::Float)
    }

    pub fn name() -> Self {
        Self::new(PinCategory::Name)
    }

    pub fn string() -> Self {
        Self::new(PinCategory::String)
    }

    pub fn text() -> Self {
        Self::new(PinCategory::Text)
    }

    pub fn object(class: TypeHash) -> Self {
        Self::with_sub(PinCategory::Object, class)
    }

    /// Object pin accepting any class.
    pub fn any_object() -> Self {
        Self::new(PinCategory::Object)
    }

    /// Class reference pin whose value is `class` or a subclass.
    pub fn class(class: TypeHash) -> Self {
        Self::with_sub(PinCategory::Class, class)
    }

    pub fn any_class() -> Self {
        Self::new(PinCategory::Class)
    }

    pub fn interface(interface: TypeHash) -> Self {
        Self::with_sub(PinCategory::Interface, interface)
    }

    pub fn structure(struct_type: TypeHash) -> Self {
        Self::with_sub(PinCategory::Struct, struct_type)
    }

    pub fn delegate(signature: TypeHash) -> Self {
        Self::with_sub(PinCategory::Delegate, signature)
    }

    pub fn multicast_delegate(signature: TypeHash) -> Self {
        Self::with_sub(PinCategory::MulticastDelegate, signature)
    }

    pub fn wildcard() -> Self {
        Self::new(PinCategory::Wildcard)
    }

    /// Array of this type.
    pub fn as_array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Passed by reference.
    pub fn as_reference(mut self) -> Self {
        self.is_reference = true;
        self
    }

    pub fn is_exec(&self) -> bool {
        self.category == PinCategory::Exec
    }

    pub fn is_wildcard(&self) -> bool {
        self.category == PinCategory::Wildcard
    }

    /// Object, class or interface pin.
    pub fn is_object_like(&self) -> bool {
        matches!(
            self.category,
            PinCategory::Object | PinCategory::Interface | PinCategory::Class
        )
    }
}

/// Whether a value flowing out of `output` may feed `input`.
///
/// Exec pins only connect to exec pins. Wildcards accept any data type.
/// Object pins accept subclasses, interface pins accept implementers, and
/// enum bytes interconvert with plain bytes.
pub fn pin_types_compatible(
    output: &PinType,
    input: &PinType,
    metadata: &dyn MetadataProvider,
) -> bool {
    if output.is_exec() || input.is_exec() {
        return output.is_exec() && input.is_exec();
    }
    if output.is_wildcard() || input.is_wildcard() {
        return true;
    }
    if output.is_array != input.is_array {
        return false;
    }

    match (output.category, input.category) {
        (PinCategory::Object, PinCategory::Object) | (PinCategory::Class, PinCategory::Class) => {
            match (output.sub_object, input.sub_object) {
                (_, None) => true,
                (None, Some(_)) => false,
                (Some(from), Some(to)) => metadata.is_child_of(from, to),
            }
        }
        (PinCategory::Object | PinCategory::Interface, PinCategory::Interface) => {
            match (output.sub_object, input.sub_object) {
                (_, None) => true,
                (None, Some(_)) => false,
                (Some(from), Some(to)) => {
                    from == to || metadata.implements_interface(from, to)
                }
            }
        }
        (PinCategory::Byte, PinCategory::Byte) => match (output.sub_object, input.sub_object) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        },
        (PinCategory::Struct, PinCategory::Struct)
        | (PinCategory::Delegate, PinCategory::Delegate)
        | (PinCategory::MulticastDelegate, PinCategory::MulticastDelegate) => {
            output.sub_object == input.sub_object
        }
        (PinCategory::Delegate, PinCategory::MulticastDelegate)
        | (PinCategory::MulticastDelegate, PinCategory::Delegate) => {
            output.sub_object == input.sub_object
        }
        (a, b) => a == b,
    }
}
