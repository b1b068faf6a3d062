//! Built-in function libraries referenced by node expansion and math lowering.
//!
//! These mirror the native helper libraries graphs link against: a node
//! helper library used by node expansions, and a small math library usable
//! from math expression nodes.

use crate::{
    ClassFlags, ClassInfo, FunctionFlags, FunctionInfo, MetadataRegistry, PinType, TypeHash,
};

pub const NODE_HELPER_LIBRARY: &str = "KismetNodeHelperLibrary";
pub const MATH_LIBRARY: &str = "KismetMathLibrary";

pub fn node_helper_library() -> TypeHash {
    TypeHash::from_name(NODE_HELPER_LIBRARY)
}

pub fn math_library() -> TypeHash {
    TypeHash::from_name(MATH_LIBRARY)
}

/// `GetValidEnumIndex(EntryCount: int, EnumeratorValue: byte) -> byte`.
///
/// Clamps a byte to the last named entry of an enum with `EntryCount` entries.
pub fn get_valid_enum_index() -> TypeHash {
    TypeHash::from_function(node_helper_library(), "GetValidEnumIndex")
}

/// `HasUnmarkedBit(Data: int, NumBits: int) -> bool`.
pub fn has_unmarked_bit() -> TypeHash {
    TypeHash::from_function(node_helper_library(), "HasUnmarkedBit")
}

/// `GetUnmarkedBit(Data: int, StartIdx: int, NumBits: int) -> int`.
///
/// First unmarked bit at or after `StartIdx`, wrapping around; a negative
/// start searches from bit 0. Returns -1 when every bit is marked.
pub fn get_unmarked_bit() -> TypeHash {
    TypeHash::from_function(node_helper_library(), "GetUnmarkedBit")
}

/// `MarkBit(Data: int, Index: int) -> int`: `Data` with bit `Index` set.
pub fn mark_bit() -> TypeHash {
    TypeHash::from_function(node_helper_library(), "MarkBit")
}

/// `AddComponentByClass(Class: class) -> object`. Instantiates a component
/// on the calling actor.
pub fn add_component_by_class() -> TypeHash {
    TypeHash::from_function(node_helper_library(), "AddComponentByClass")
}

pub fn not_equal_byte() -> TypeHash {
    TypeHash::from_function(math_library(), "NotEqual_ByteByte")
}

pub fn not_equal_int() -> TypeHash {
    TypeHash::from_function(math_library(), "NotEqual_IntInt")
}

pub fn add_float() -> TypeHash {
    TypeHash::from_function(math_library(), "Add_FloatFloat")
}

pub fn subtract_float() -> TypeHash {
    TypeHash::from_function(math_library(), "Subtract_FloatFloat")
}

pub fn multiply_float() -> TypeHash {
    TypeHash::from_function(math_library(), "Multiply_FloatFloat")
}

pub fn divide_float() -> TypeHash {
    TypeHash::from_function(math_library(), "Divide_FloatFloat")
}

pub fn less_float() -> TypeHash {
    TypeHash::from_function(math_library(), "Less_FloatFloat")
}

/// Register both libraries.
pub(crate) fn register(registry: &mut MetadataRegistry) {
    let native = FunctionFlags::BLUEPRINT_CALLABLE
        | FunctionFlags::PURE
        | FunctionFlags::STATIC
        | FunctionFlags::FINAL
        | FunctionFlags::NATIVE;

    let helper = registry.add_class(
        ClassInfo::new(NODE_HELPER_LIBRARY).with_flags(ClassFlags::FUNCTION_LIBRARY),
    );
    registry.add_function(
        FunctionInfo::new(helper, "GetValidEnumIndex")
            .with_flags(native | FunctionFlags::INTERNAL_USE_ONLY)
            .with_param("EntryCount", PinType::int())
            .with_param("EnumeratorValue", PinType::byte())
            .with_return(PinType::byte()),
    );
    let internal = native | FunctionFlags::INTERNAL_USE_ONLY;
    registry.add_function(
        FunctionInfo::new(helper, "HasUnmarkedBit")
            .with_flags(internal)
            .with_param("Data", PinType::int())
            .with_param("NumBits", PinType::int())
            .with_return(PinType::bool()),
    );
    registry.add_function(
        FunctionInfo::new(helper, "GetUnmarkedBit")
            .with_flags(internal)
            .with_param("Data", PinType::int())
            .with_param("StartIdx", PinType::int())
            .with_param("NumBits", PinType::int())
            .with_return(PinType::int()),
    );
    registry.add_function(
        FunctionInfo::new(helper, "MarkBit")
            .with_flags(internal)
            .with_param("Data", PinType::int())
            .with_param("Index", PinType::int())
            .with_return(PinType::int()),
    );
    registry.add_function(
        FunctionInfo::new(helper, "AddComponentByClass")
            .with_flags(
                FunctionFlags::BLUEPRINT_CALLABLE
                    | FunctionFlags::STATIC
                    | FunctionFlags::INTERNAL_USE_ONLY,
            )
            .with_param("Class", PinType::any_class())
            .with_return(PinType::any_object()),
    );

    let math = registry.add_class(ClassInfo::new(MATH_LIBRARY).with_flags(ClassFlags::FUNCTION_LIBRARY));
    for name in [
        "Add_FloatFloat",
        "Subtract_FloatFloat",
        "Multiply_FloatFloat",
        "Divide_FloatFloat",
    ] {
        registry.add_function(
            FunctionInfo::new(math, name)
                .with_flags(native)
                .with_category("Math|Float")
                .with_param("A", PinType::float())
                .with_param("B", PinType::float())
                .with_return(PinType::float()),
        );
    }
    for (name, pin_type) in [
        ("NotEqual_ByteByte", PinType::byte()),
        ("NotEqual_IntInt", PinType::int()),
    ] {
        registry.add_function(
            FunctionInfo::new(math, name)
                .with_flags(native)
                .with_category("Math|Comparison")
                .with_param("A", pin_type.clone())
                .with_param("B", pin_type)
                .with_return(PinType::bool()),
        );
    }
    registry.add_function(
        FunctionInfo::new(math, "Less_FloatFloat")
            .with_flags(native)
            .with_category("Math|Float")
            .with_param("A", PinType::float())
            .with_param("B", PinType::float())
            .with_return(PinType::bool()),
    );
}
