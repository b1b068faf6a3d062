//! Reflection flag sets attached to classes, functions, properties and structs.

use bitflags::bitflags;

bitflags! {
    /// Flags describing a reflected class.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassFlags: u32 {
        /// Cannot be instantiated directly.
        const ABSTRACT = 1 << 0;
        /// Scheduled for removal; its members are hidden from menus by default.
        const DEPRECATED = 1 << 1;
        /// Transient helper class, never listed.
        const TRANSIENT = 1 << 2;
        /// Stale class left behind by reinstancing.
        const NEWER_VERSION_EXISTS = 1 << 3;
        /// Interface class; callable functions also get message actions.
        const INTERFACE = 1 << 4;
        /// Class generated by compiling a blueprint.
        const BLUEPRINT_GENERATED = 1 << 5;
        /// Skeleton class mirroring a blueprint's public surface.
        const SKELETON = 1 << 6;
        /// Explicitly usable as a variable type (inherited by subclasses).
        const BLUEPRINT_TYPE = 1 << 7;
        /// Explicitly not usable as a variable type (inherited by subclasses).
        const NOT_BLUEPRINT_TYPE = 1 << 8;
        /// Actor class.
        const ACTOR = 1 << 9;
        /// Actor component class.
        const ACTOR_COMPONENT = 1 << 10;
        /// Base class for latent async actions spawned through factory functions.
        const ASYNC_ACTION = 1 << 11;
        /// Static function library.
        const FUNCTION_LIBRARY = 1 << 12;
        /// Component class that may be added to actors from a graph.
        const SPAWNABLE_COMPONENT = 1 << 13;
    }
}

bitflags! {
    /// Flags describing a reflected function.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FunctionFlags: u32 {
        /// Can be called from a graph.
        const BLUEPRINT_CALLABLE = 1 << 0;
        /// Can be implemented as an event in a graph.
        const BLUEPRINT_EVENT = 1 << 1;
        /// No side effects; has no execution pins.
        const PURE = 1 << 2;
        const CONST = 1 << 3;
        const STATIC = 1 << 4;
        const FINAL = 1 << 5;
        const NATIVE = 1 << 6;
        /// Signature of a delegate, not a callable function.
        const DELEGATE = 1 << 7;
        /// Suspends execution until an external event resumes it.
        const LATENT = 1 << 8;
        const PROTECTED = 1 << 9;
        const PRIVATE = 1 << 10;
        const DEPRECATED = 1 << 11;
        /// Only reachable through dedicated node types.
        const INTERNAL_USE_ONLY = 1 << 12;
        /// Only runs with network authority.
        const AUTHORITY_ONLY = 1 << 13;
        /// Only runs on clients.
        const COSMETIC = 1 << 14;
    }
}

bitflags! {
    /// Flags describing a reflected property or function parameter.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PropertyFlags: u32 {
        /// Readable from graphs.
        const BLUEPRINT_VISIBLE = 1 << 0;
        /// Readable but not writable from graphs.
        const READ_ONLY = 1 << 1;
        /// Multicast delegate that graphs may bind to.
        const ASSIGNABLE = 1 << 2;
        /// Multicast delegate that graphs may broadcast.
        const CALLABLE = 1 << 3;
        /// Function parameter, never listed as a variable.
        const PARAM = 1 << 4;
        const OUT_PARAM = 1 << 5;
        const RETURN_PARAM = 1 << 6;
        const REFERENCE_PARAM = 1 << 7;
        const CONST_PARAM = 1 << 8;
        const PROTECTED = 1 << 9;
        const PRIVATE = 1 << 10;
        const DEPRECATED = 1 << 11;
    }
}

bitflags! {
    /// Flags describing a reflected struct.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StructFlags: u32 {
        /// Usable as a variable type.
        const BLUEPRINT_TYPE = 1 << 0;
        /// Supports generic decomposition into its fields.
        const BREAKABLE = 1 << 1;
        /// Supports generic composition from its fields.
        const MAKEABLE = 1 << 2;
    }
}
