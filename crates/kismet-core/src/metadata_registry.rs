//! MetadataRegistry - in-memory reflection metadata.
//!
//! [`MetadataRegistry`] stores classes, functions, properties, enums, structs,
//! blueprints and live runtime objects keyed by [`TypeHash`], and implements
//! [`MetadataProvider`] over them.
//!
//! Registering a member (function, property, nested enum or struct) appends it
//! to its owner's field list, so enumeration order is registration order.
//!
//! # Thread Safety
//!
//! `MetadataRegistry` is **not thread-safe**. Metadata is populated
//! and edited on the editor thread, the same thread that refreshes the action
//! catalog.
//!
//! # Example
//!
//! ```
//! use kismet_core::{ClassInfo, FunctionFlags, FunctionInfo, MetadataProvider, MetadataRegistry, PinType};
//!
//! let mut registry = MetadataRegistry::new();
//! let actor = registry.add_class(ClassInfo::new("Actor"));
//! let jump = registry.add_function(
//!     FunctionInfo::new(actor, "Jump").with_flags(FunctionFlags::BLUEPRINT_CALLABLE),
//! );
//!
//! assert_eq!(registry.own_functions(actor), &[jump]);
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::{
    BlueprintInfo, ClassFlags, ClassInfo, EnumInfo, FunctionInfo, MetadataProvider, ObjectId,
    PropertyInfo, StructInfo, TypeHash, library,
};

/// In-memory reflection metadata.
#[derive(Debug, Default, Clone)]
pub struct MetadataRegistry {
    classes: FxHashMap<TypeHash, ClassInfo>,
    /// Registration order of classes.
    class_order: Vec<TypeHash>,
    functions: FxHashMap<TypeHash, FunctionInfo>,
    properties: FxHashMap<TypeHash, PropertyInfo>,
    enums: FxHashMap<TypeHash, EnumInfo>,
    structs: FxHashMap<TypeHash, StructInfo>,
    global_enums: Vec<TypeHash>,
    global_structs: Vec<TypeHash>,
    blueprints: FxHashMap<TypeHash, BlueprintInfo>,
    objects: FxHashMap<ObjectId, TypeHash>,
    destroyed: FxHashSet<ObjectId>,
    next_object: u32,
}

impl MetadataRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in function libraries registered.
    pub fn with_library() -> Self {
        let mut registry = Self::new();
        library::register(&mut registry);
        registry
    }

    // ==========================================================================
    // Classes
    // ==========================================================================

    /// Register (or replace) a class. Replacing keeps the existing field lists
    /// when the new description has none.
    pub fn add_class(&mut self, mut info: ClassInfo) -> TypeHash {
        let hash = info.hash;
        if let Some(existing) = self.classes.remove(&hash) {
            if info.functions.is_empty() {
                info.functions = existing.functions;
            }
            if info.properties.is_empty() {
                info.properties = existing.properties;
            }
            if info.enums.is_empty() {
                info.enums = existing.enums;
            }
            if info.structs.is_empty() {
                info.structs = existing.structs;
            }
        } else {
            self.class_order.push(hash);
        }
        self.classes.insert(hash, info);
        hash
    }

    pub fn class_mut(&mut self, hash: TypeHash) -> Option<&mut ClassInfo> {
        self.classes.get_mut(&hash)
    }

    /// Declare that `class` implements `interface`.
    pub fn add_interface(&mut self, class: TypeHash, interface: TypeHash) {
        if let Some(info) = self.classes.get_mut(&class)
            && !info.interfaces.contains(&interface)
        {
            info.interfaces.push(interface);
        }
    }

    /// Remove a class and every member declared on it.
    pub fn remove_class(&mut self, hash: TypeHash) -> Option<ClassInfo> {
        let info = self.classes.remove(&hash)?;
        debug!(
            class = %info.name,
            members = info.functions.len() + info.properties.len(),
            "removing class"
        );
        self.class_order.retain(|h| *h != hash);
        for f in &info.functions {
            self.functions.remove(f);
        }
        for p in &info.properties {
            self.properties.remove(p);
        }
        for e in &info.enums {
            self.enums.remove(e);
        }
        for s in &info.structs {
            self.structs.remove(s);
        }
        Some(info)
    }

    /// Mark a class stale, as reinstancing does when a newer version replaces it.
    pub fn mark_stale(&mut self, hash: TypeHash) {
        if let Some(info) = self.classes.get_mut(&hash) {
            info.flags |= ClassFlags::NEWER_VERSION_EXISTS;
        }
    }

    // ==========================================================================
    // Members
    // ==========================================================================

    /// Register a function and append it to its owner's function list.
    pub fn add_function(&mut self, info: FunctionInfo) -> TypeHash {
        let hash = info.hash;
        if let Some(owner) = self.classes.get_mut(&info.owner)
            && !owner.functions.contains(&hash)
        {
            owner.functions.push(hash);
        }
        self.functions.insert(hash, info);
        hash
    }

    pub fn function_mut(&mut self, hash: TypeHash) -> Option<&mut FunctionInfo> {
        self.functions.get_mut(&hash)
    }

    /// Rename a function. Its hash (identity) is unchanged.
    pub fn rename_function(&mut self, hash: TypeHash, name: impl Into<String>) -> bool {
        match self.functions.get_mut(&hash) {
            Some(info) => {
                info.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Remove a function from the registry and from its owner.
    pub fn remove_function(&mut self, hash: TypeHash) -> Option<FunctionInfo> {
        let info = self.functions.remove(&hash)?;
        if let Some(owner) = self.classes.get_mut(&info.owner) {
            owner.functions.retain(|f| *f != hash);
        }
        Some(info)
    }

    /// Register a property and append it to its owner's property list.
    pub fn add_property(&mut self, info: PropertyInfo) -> TypeHash {
        let hash = info.hash;
        if let Some(owner) = self.classes.get_mut(&info.owner)
            && !owner.properties.contains(&hash)
        {
            owner.properties.push(hash);
        }
        self.properties.insert(hash, info);
        hash
    }

    pub fn property_mut(&mut self, hash: TypeHash) -> Option<&mut PropertyInfo> {
        self.properties.get_mut(&hash)
    }

    /// Remove a property from the registry and from its owner.
    pub fn remove_property(&mut self, hash: TypeHash) -> Option<PropertyInfo> {
        let info = self.properties.remove(&hash)?;
        if let Some(owner) = self.classes.get_mut(&info.owner) {
            owner.properties.retain(|p| *p != hash);
        }
        Some(info)
    }

    // ==========================================================================
    // Types
    // ==========================================================================

    /// Register an enum, nested in its owner class or global.
    pub fn add_enum(&mut self, info: EnumInfo) -> TypeHash {
        let hash = info.hash;
        match info.owner.and_then(|owner| self.classes.get_mut(&owner)) {
            Some(owner) => {
                if !owner.enums.contains(&hash) {
                    owner.enums.push(hash);
                }
            }
            None => {
                if !self.global_enums.contains(&hash) {
                    self.global_enums.push(hash);
                }
            }
        }
        self.enums.insert(hash, info);
        hash
    }

    /// Register a struct, nested in its owner class or global.
    pub fn add_struct(&mut self, info: StructInfo) -> TypeHash {
        let hash = info.hash;
        match info.owner.and_then(|owner| self.classes.get_mut(&owner)) {
            Some(owner) => {
                if !owner.structs.contains(&hash) {
                    owner.structs.push(hash);
                }
            }
            None => {
                if !self.global_structs.contains(&hash) {
                    self.global_structs.push(hash);
                }
            }
        }
        self.structs.insert(hash, info);
        hash
    }

    // ==========================================================================
    // Blueprints and objects
    // ==========================================================================

    /// Register a blueprint and link its generated and skeleton classes back to it.
    pub fn add_blueprint(&mut self, info: BlueprintInfo) -> TypeHash {
        let hash = info.hash;
        for class in [info.generated_class, info.skeleton_class].into_iter().flatten() {
            if let Some(class_info) = self.classes.get_mut(&class) {
                class_info.blueprint = Some(hash);
            }
        }
        self.blueprints.insert(hash, info);
        hash
    }

    pub fn blueprint_mut(&mut self, hash: TypeHash) -> Option<&mut BlueprintInfo> {
        self.blueprints.get_mut(&hash)
    }

    /// Spawn a runtime object of `class`.
    pub fn add_object(&mut self, class: TypeHash) -> ObjectId {
        self.next_object += 1;
        let id = ObjectId(self.next_object);
        self.objects.insert(id, class);
        id
    }

    /// Destroy a runtime object; later liveness checks report it dead.
    pub fn destroy_object(&mut self, id: ObjectId) -> bool {
        if self.objects.remove(&id).is_some() {
            debug!(object = ?id, "object destroyed");
            self.destroyed.insert(id);
            true
        } else {
            false
        }
    }
}

impl MetadataProvider for MetadataRegistry {
    fn class_hashes(&self) -> Vec<TypeHash> {
        self.class_order.clone()
    }

    fn class(&self, hash: TypeHash) -> Option<&ClassInfo> {
        self.classes.get(&hash)
    }

    fn function(&self, hash: TypeHash) -> Option<&FunctionInfo> {
        self.functions.get(&hash)
    }

    fn property(&self, hash: TypeHash) -> Option<&PropertyInfo> {
        self.properties.get(&hash)
    }

    fn enum_info(&self, hash: TypeHash) -> Option<&EnumInfo> {
        self.enums.get(&hash)
    }

    fn struct_info(&self, hash: TypeHash) -> Option<&StructInfo> {
        self.structs.get(&hash)
    }

    fn blueprint(&self, hash: TypeHash) -> Option<&BlueprintInfo> {
        self.blueprints.get(&hash)
    }

    fn global_enums(&self) -> Vec<TypeHash> {
        self.global_enums.clone()
    }

    fn global_structs(&self) -> Vec<TypeHash> {
        self.global_structs.clone()
    }

    fn is_object_alive(&self, object: ObjectId) -> bool {
        self.objects.contains_key(&object) && !self.destroyed.contains(&object)
    }

    fn object_class(&self, object: ObjectId) -> Option<TypeHash> {
        self.objects.get(&object).copied()
    }
}
