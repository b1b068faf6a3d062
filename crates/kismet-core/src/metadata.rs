//! Reflection metadata consumed by action discovery, filtering and lowering.
//!
//! The engine's reflection system is modelled through the narrow
//! [`MetadataProvider`] trait: a handful of required lookups plus provided
//! queries (inheritance, inherited field iteration, variable type legality)
//! built on top of them. [`MetadataRegistry`](crate::MetadataRegistry) is the
//! in-memory implementation used by tests and tools.
//!
//! Field enumeration returns hashes rather than references. A hash that no
//! longer resolves is a dangling field handle; callers skip it per field
//! instead of failing the whole pass.

use crate::{
    ClassFlags, FunctionFlags, Literal, PinCategory, PinType, PropertyFlags, StructFlags, TypeHash,
};

/// Runtime object instance (an actor or component placed in a level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

// ==========================================================================
// Classes
// ==========================================================================

/// A reflected class and its own (non-inherited) fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    pub hash: TypeHash,
    pub name: String,
    pub super_class: Option<TypeHash>,
    pub flags: ClassFlags,
    /// Interfaces implemented directly by this class.
    pub interfaces: Vec<TypeHash>,
    /// Member categories hidden from graphs of this class and its children.
    pub hide_categories: Vec<String>,
    /// When non-empty, members may only be used by blueprints deriving from one of these.
    pub restricted_to: Vec<TypeHash>,
    /// Blueprint that generated this class.
    pub blueprint: Option<TypeHash>,
    pub functions: Vec<TypeHash>,
    pub properties: Vec<TypeHash>,
    pub enums: Vec<TypeHash>,
    pub structs: Vec<TypeHash>,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::from_name(&name),
            name,
            super_class: None,
            flags: ClassFlags::empty(),
            interfaces: Vec::new(),
            hide_categories: Vec::new(),
            restricted_to: Vec::new(),
            blueprint: None,
            functions: Vec::new(),
            properties: Vec::new(),
            enums: Vec::new(),
            structs: Vec::new(),
        }
    }

    pub fn with_super(mut self, super_class: TypeHash) -> Self {
        self.super_class = Some(super_class);
        self
    }

    pub fn with_flags(mut self, flags: ClassFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_hidden_category(mut self, category: impl Into<String>) -> Self {
        self.hide_categories.push(category.into());
        self
    }

    pub fn restricted_to(mut self, class: TypeHash) -> Self {
        self.restricted_to.push(class);
        self
    }

    pub fn generated_by(mut self, blueprint: TypeHash) -> Self {
        self.blueprint = Some(blueprint);
        self
    }

    pub fn has_flags(&self, flags: ClassFlags) -> bool {
        self.flags.intersects(flags)
    }

    pub fn is_interface(&self) -> bool {
        self.flags.contains(ClassFlags::INTERFACE)
    }
}

// ==========================================================================
// Functions and parameters
// ==========================================================================

/// A function parameter (including the return value).
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub name: String,
    pub pin_type: PinType,
    pub flags: PropertyFlags,
}

impl ParamInfo {
    pub fn new(name: impl Into<String>, pin_type: PinType) -> Self {
        Self {
            name: name.into(),
            pin_type,
            flags: PropertyFlags::PARAM,
        }
    }

    pub fn is_return(&self) -> bool {
        self.flags.contains(PropertyFlags::RETURN_PARAM)
    }

    /// Produces a value: the return value or a non-reference out parameter.
    pub fn is_output(&self) -> bool {
        self.is_return()
            || (self.flags.contains(PropertyFlags::OUT_PARAM)
                && !self.flags.contains(PropertyFlags::REFERENCE_PARAM))
    }

    pub fn is_input(&self) -> bool {
        !self.is_output()
    }
}

/// A reflected function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    pub hash: TypeHash,
    pub name: String,
    pub owner: TypeHash,
    pub flags: FunctionFlags,
    pub params: Vec<ParamInfo>,
    pub category: String,
}

impl FunctionInfo {
    pub fn new(owner: TypeHash, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::from_function(owner, &name),
            name,
            owner,
            flags: FunctionFlags::empty(),
            params: Vec::new(),
            category: String::new(),
        }
    }

    pub fn with_flags(mut self, flags: FunctionFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, pin_type: PinType) -> Self {
        self.params.push(ParamInfo::new(name, pin_type));
        self
    }

    pub fn with_out_param(mut self, name: impl Into<String>, pin_type: PinType) -> Self {
        let mut param = ParamInfo::new(name, pin_type);
        param.flags |= PropertyFlags::OUT_PARAM;
        self.params.push(param);
        self
    }

    pub fn with_return(mut self, pin_type: PinType) -> Self {
        let mut param = ParamInfo::new(crate::pin_names::RETURN_VALUE, pin_type);
        param.flags |= PropertyFlags::OUT_PARAM | PropertyFlags::RETURN_PARAM;
        self.params.push(param);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn has_flags(&self, flags: FunctionFlags) -> bool {
        self.flags.intersects(flags)
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(FunctionFlags::STATIC)
    }

    pub fn is_pure(&self) -> bool {
        self.flags.contains(FunctionFlags::PURE)
    }

    pub fn return_param(&self) -> Option<&ParamInfo> {
        self.params.iter().find(|p| p.is_return())
    }

    pub fn input_params(&self) -> impl Iterator<Item = &ParamInfo> {
        self.params.iter().filter(|p| p.is_input())
    }

    pub fn output_params(&self) -> impl Iterator<Item = &ParamInfo> {
        self.params.iter().filter(|p| p.is_output())
    }

    fn is_hidden_from_graphs(&self) -> bool {
        self.has_flags(FunctionFlags::DELEGATE | FunctionFlags::INTERNAL_USE_ONLY)
    }

    /// Callable from a graph through a call-function node.
    pub fn is_blueprint_callable(&self) -> bool {
        self.flags.contains(FunctionFlags::BLUEPRINT_CALLABLE) && !self.is_hidden_from_graphs()
    }

    /// Implementable as an event: an overridable function with no outputs.
    pub fn can_be_placed_as_event(&self) -> bool {
        self.flags.contains(FunctionFlags::BLUEPRINT_EVENT)
            && !self.is_hidden_from_graphs()
            && !self.params.iter().any(|p| {
                p.is_return()
                    || (p.flags.contains(PropertyFlags::OUT_PARAM)
                        && !p.flags.contains(PropertyFlags::CONST_PARAM))
            })
    }
}

// ==========================================================================
// Properties
// ==========================================================================

/// A reflected member property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    pub hash: TypeHash,
    pub name: String,
    pub owner: TypeHash,
    pub flags: PropertyFlags,
    pub pin_type: PinType,
    pub category: String,
}

impl PropertyInfo {
    pub fn new(owner: TypeHash, name: impl Into<String>, pin_type: PinType) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::from_property(owner, &name),
            name,
            owner,
            flags: PropertyFlags::empty(),
            pin_type,
            category: String::new(),
        }
    }

    pub fn with_flags(mut self, flags: PropertyFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn has_flags(&self, flags: PropertyFlags) -> bool {
        self.flags.intersects(flags)
    }

    pub fn is_multicast_delegate(&self) -> bool {
        self.pin_type.category == PinCategory::MulticastDelegate
    }

    /// Signature function of a delegate property.
    pub fn signature(&self) -> Option<TypeHash> {
        match self.pin_type.category {
            PinCategory::Delegate | PinCategory::MulticastDelegate => self.pin_type.sub_object,
            _ => None,
        }
    }

    /// Class of an object-valued property.
    pub fn object_class(&self) -> Option<TypeHash> {
        match self.pin_type.category {
            PinCategory::Object if !self.pin_type.is_array => self.pin_type.sub_object,
            _ => None,
        }
    }

    /// Visible to graphs: flagged visible, or a bindable/broadcastable
    /// multicast delegate, and never a parameter.
    pub fn is_blueprint_visible(&self) -> bool {
        !self.flags.contains(PropertyFlags::PARAM)
            && (self.flags.contains(PropertyFlags::BLUEPRINT_VISIBLE)
                || (self.is_multicast_delegate()
                    && self.has_flags(PropertyFlags::ASSIGNABLE | PropertyFlags::CALLABLE)))
    }
}

// ==========================================================================
// Enums and structs
// ==========================================================================

/// A reflected enum. `entries` excludes the implicit trailing MAX entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumInfo {
    pub hash: TypeHash,
    pub name: String,
    pub owner: Option<TypeHash>,
    pub entries: Vec<String>,
    pub blueprint_type: bool,
}

impl EnumInfo {
    pub fn new(name: impl Into<String>, entries: &[&str]) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::from_name(&name),
            name,
            owner: None,
            entries: entries.iter().map(|e| e.to_string()).collect(),
            blueprint_type: true,
        }
    }

    pub fn nested_in(mut self, owner: TypeHash) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.blueprint_type = false;
        self
    }

    /// Number of named entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// A field of a reflected struct.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub pin_type: PinType,
    pub visible: bool,
    pub read_only: bool,
}

/// A reflected struct.
#[derive(Debug, Clone, PartialEq)]
pub struct StructInfo {
    pub hash: TypeHash,
    pub name: String,
    pub owner: Option<TypeHash>,
    pub flags: StructFlags,
    pub fields: Vec<StructField>,
}

impl StructInfo {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::from_name(&name),
            name,
            owner: None,
            flags: StructFlags::BLUEPRINT_TYPE | StructFlags::BREAKABLE | StructFlags::MAKEABLE,
            fields: Vec::new(),
        }
    }

    pub fn nested_in(mut self, owner: TypeHash) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_flags(mut self, flags: StructFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, pin_type: PinType) -> Self {
        self.fields.push(StructField {
            name: name.into(),
            pin_type,
            visible: true,
            read_only: false,
        });
        self
    }

    pub fn with_read_only_field(mut self, name: impl Into<String>, pin_type: PinType) -> Self {
        self.fields.push(StructField {
            name: name.into(),
            pin_type,
            visible: true,
            read_only: true,
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn visible_fields(&self) -> impl Iterator<Item = &StructField> {
        self.fields.iter().filter(|f| f.visible)
    }

    /// Zeroed value of this struct. Nested struct fields start empty.
    pub fn default_value(&self) -> Literal {
        Literal::Struct {
            struct_type: self.hash,
            fields: self
                .fields
                .iter()
                .map(|f| {
                    let value = Literal::default_for(&f.pin_type).unwrap_or(Literal::Struct {
                        struct_type: f.pin_type.sub_object.unwrap_or_default(),
                        fields: Vec::new(),
                    });
                    (f.name.clone(), value)
                })
                .collect(),
        }
    }
}

// ==========================================================================
// Blueprints
// ==========================================================================

/// A macro graph owned by a blueprint, with its tunnel signature.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroGraphInfo {
    pub name: String,
    pub inputs: Vec<(String, PinType)>,
    pub outputs: Vec<(String, PinType)>,
}

/// A local variable declared inside a function graph.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariableInfo {
    pub name: String,
    pub pin_type: PinType,
}

/// A function graph owned by a blueprint.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionGraphInfo {
    pub name: String,
    pub locals: Vec<LocalVariableInfo>,
}

/// Asset-level description of a blueprint.
#[derive(Debug, Clone, PartialEq)]
pub struct BlueprintInfo {
    pub hash: TypeHash,
    pub name: String,
    pub parent_class: TypeHash,
    pub generated_class: Option<TypeHash>,
    pub skeleton_class: Option<TypeHash>,
    pub macro_graphs: Vec<MacroGraphInfo>,
    pub function_graphs: Vec<FunctionGraphInfo>,
}

impl BlueprintInfo {
    pub fn new(name: impl Into<String>, parent_class: TypeHash) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::from_blueprint(&name),
            name,
            parent_class,
            generated_class: None,
            skeleton_class: None,
            macro_graphs: Vec::new(),
            function_graphs: Vec::new(),
        }
    }

    pub fn with_macro(
        mut self,
        name: impl Into<String>,
        inputs: Vec<(String, PinType)>,
        outputs: Vec<(String, PinType)>,
    ) -> Self {
        self.macro_graphs.push(MacroGraphInfo {
            name: name.into(),
            inputs,
            outputs,
        });
        self
    }

    pub fn with_function_graph(mut self, name: impl Into<String>, locals: Vec<LocalVariableInfo>) -> Self {
        self.function_graphs.push(FunctionGraphInfo {
            name: name.into(),
            locals,
        });
        self
    }

    /// Class used to answer inheritance questions about this blueprint.
    ///
    /// The skeleton class is always current, even mid-compile.
    pub fn class_for_queries(&self) -> TypeHash {
        self.skeleton_class
            .or(self.generated_class)
            .unwrap_or(self.parent_class)
    }

    pub fn macro_graph(&self, name: &str) -> Option<&MacroGraphInfo> {
        self.macro_graphs.iter().find(|g| g.name == name)
    }

    pub fn function_graph(&self, name: &str) -> Option<&FunctionGraphInfo> {
        self.function_graphs.iter().find(|g| g.name == name)
    }
}

// ==========================================================================
// Provider
// ==========================================================================

/// Upper bound on inheritance depth; guards against malformed cyclic metadata.
const MAX_HIERARCHY_DEPTH: usize = 256;

/// Read-only view of the reflection system.
pub trait MetadataProvider {
    /// Every known class, in registration order.
    fn class_hashes(&self) -> Vec<TypeHash>;

    fn class(&self, hash: TypeHash) -> Option<&ClassInfo>;
    fn function(&self, hash: TypeHash) -> Option<&FunctionInfo>;
    fn property(&self, hash: TypeHash) -> Option<&PropertyInfo>;
    fn enum_info(&self, hash: TypeHash) -> Option<&EnumInfo>;
    fn struct_info(&self, hash: TypeHash) -> Option<&StructInfo>;
    fn blueprint(&self, hash: TypeHash) -> Option<&BlueprintInfo>;

    /// Enums not nested in any class.
    fn global_enums(&self) -> Vec<TypeHash>;

    /// Structs not nested in any class.
    fn global_structs(&self) -> Vec<TypeHash>;

    /// Whether a runtime object still exists.
    fn is_object_alive(&self, object: ObjectId) -> bool;

    /// Class of a live runtime object.
    fn object_class(&self, object: ObjectId) -> Option<TypeHash>;

    /// Functions declared directly on `class`.
    fn own_functions(&self, class: TypeHash) -> &[TypeHash] {
        self.class(class).map(|c| c.functions.as_slice()).unwrap_or(&[])
    }

    /// Properties declared directly on `class`.
    fn own_properties(&self, class: TypeHash) -> &[TypeHash] {
        self.class(class).map(|c| c.properties.as_slice()).unwrap_or(&[])
    }

    fn nested_enums(&self, class: TypeHash) -> &[TypeHash] {
        self.class(class).map(|c| c.enums.as_slice()).unwrap_or(&[])
    }

    fn nested_structs(&self, class: TypeHash) -> &[TypeHash] {
        self.class(class).map(|c| c.structs.as_slice()).unwrap_or(&[])
    }

    /// Transient, stale (reinstanced) or non-skeleton blueprint classes.
    fn is_ignorable(&self, class: TypeHash) -> bool {
        let Some(info) = self.class(class) else {
            return true;
        };
        info.has_flags(ClassFlags::TRANSIENT | ClassFlags::NEWER_VERSION_EXISTS)
            || (info.flags.contains(ClassFlags::BLUEPRINT_GENERATED)
                && !info.flags.contains(ClassFlags::SKELETON))
    }

    /// `class` followed by each ancestor, nearest first.
    fn super_chain(&self, class: TypeHash) -> Vec<TypeHash> {
        let mut chain = Vec::new();
        let mut current = Some(class);
        while let Some(hash) = current {
            if chain.len() >= MAX_HIERARCHY_DEPTH || chain.contains(&hash) {
                break;
            }
            chain.push(hash);
            current = self.class(hash).and_then(|c| c.super_class);
        }
        chain
    }

    /// True when `class` is `parent` or derives from it.
    fn is_child_of(&self, class: TypeHash, parent: TypeHash) -> bool {
        self.super_chain(class).contains(&parent)
    }

    fn implements_interface(&self, class: TypeHash, interface: TypeHash) -> bool {
        self.super_chain(class).into_iter().any(|hash| {
            self.class(hash)
                .is_some_and(|c| c.interfaces.contains(&interface))
        })
    }

    /// True when any class in the chain carries one of `flags`.
    fn chain_has_flags(&self, class: TypeHash, flags: ClassFlags) -> bool {
        self.super_chain(class)
            .into_iter()
            .filter_map(|hash| self.class(hash))
            .any(|c| c.has_flags(flags))
    }

    /// Own and inherited functions, nearest class first.
    fn all_functions(&self, class: TypeHash) -> Vec<TypeHash> {
        self.super_chain(class)
            .into_iter()
            .flat_map(|hash| self.own_functions(hash).iter().copied())
            .collect()
    }

    /// Own and inherited properties, nearest class first.
    fn all_properties(&self, class: TypeHash) -> Vec<TypeHash> {
        self.super_chain(class)
            .into_iter()
            .flat_map(|hash| self.own_properties(hash).iter().copied())
            .collect()
    }

    /// Whether `class` may be used as a variable type.
    ///
    /// The nearest explicit marker in the hierarchy wins; blueprint generated
    /// classes are usable unless marked otherwise.
    fn is_allowable_variable_class(&self, class: TypeHash) -> bool {
        for hash in self.super_chain(class) {
            let Some(info) = self.class(hash) else {
                return false;
            };
            if info.has_flags(ClassFlags::NEWER_VERSION_EXISTS) {
                return false;
            }
            if info.flags.contains(ClassFlags::NOT_BLUEPRINT_TYPE) {
                return false;
            }
            if info.has_flags(ClassFlags::BLUEPRINT_TYPE | ClassFlags::BLUEPRINT_GENERATED) {
                return true;
            }
        }
        false
    }

    /// Whether `category` is hidden on `class` or any ancestor.
    ///
    /// A hidden category also hides its `|`-separated subcategories.
    fn is_category_hidden(&self, class: TypeHash, category: &str) -> bool {
        if category.is_empty() {
            return false;
        }
        self.super_chain(class)
            .into_iter()
            .filter_map(|hash| self.class(hash))
            .flat_map(|c| c.hide_categories.iter())
            .any(|hidden| {
                category.eq_ignore_ascii_case(hidden)
                    || category
                        .to_ascii_lowercase()
                        .starts_with(&format!("{}|", hidden.to_ascii_lowercase()))
            })
    }
}
