//! Deterministic hash-based identity for reflected types and fields.
//!
//! [`TypeHash`] is a 64-bit hash computed from names, so a class, enum or
//! struct can be referenced before it is registered and two registrations of
//! the same name always agree on identity.
//!
//! Member fields (functions and properties) mix the owner's hash into their
//! seed, so `Actor::Tick` and `Pawn::Tick` never collide.
//!
//! # Examples
//!
//! ```
//! use kismet_core::TypeHash;
//!
//! let actor = TypeHash::from_name("Actor");
//! assert_eq!(actor, TypeHash::from_name("Actor"));
//!
//! let tick = TypeHash::from_function(actor, "Tick");
//! let hidden = TypeHash::from_property(actor, "Tick");
//! assert_ne!(tick, hidden);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific seeds so different kinds of names never share a hash.
pub mod hash_constants {
    /// Domain marker for class, enum and struct hashes
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for member function hashes
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for member property hashes
    pub const PROPERTY: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for blueprint asset hashes
    pub const BLUEPRINT: u64 = 0x3e9f5d2a8c7b1403;
}

/// A deterministic 64-bit hash identifying a type, field or blueprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Hash of a class, enum or struct name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(xxh64(name.as_bytes(), hash_constants::TYPE))
    }

    /// Hash of a function owned by `owner`.
    #[inline]
    pub fn from_function(owner: TypeHash, name: &str) -> Self {
        TypeHash(xxh64(name.as_bytes(), owner.0 ^ hash_constants::FUNCTION))
    }

    /// Hash of a property owned by `owner`.
    #[inline]
    pub fn from_property(owner: TypeHash, name: &str) -> Self {
        TypeHash(xxh64(name.as_bytes(), owner.0 ^ hash_constants::PROPERTY))
    }

    /// Hash of a blueprint asset.
    #[inline]
    pub fn from_blueprint(name: &str) -> Self {
        TypeHash(xxh64(name.as_bytes(), hash_constants::BLUEPRINT))
    }

    /// Returns true for [`TypeHash::EMPTY`].
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_deterministic() {
        assert_eq!(TypeHash::from_name("Actor"), TypeHash::from_name("Actor"));
        assert_ne!(TypeHash::from_name("Actor"), TypeHash::from_name("Pawn"));
    }

    #[test]
    fn members_are_scoped_to_owner() {
        let actor = TypeHash::from_name("Actor");
        let pawn = TypeHash::from_name("Pawn");
        assert_ne!(
            TypeHash::from_function(actor, "Tick"),
            TypeHash::from_function(pawn, "Tick")
        );
    }

    #[test]
    fn domains_do_not_collide() {
        let actor = TypeHash::from_name("Actor");
        assert_ne!(
            TypeHash::from_function(actor, "Health"),
            TypeHash::from_property(actor, "Health")
        );
        assert_ne!(TypeHash::from_name("Door"), TypeHash::from_blueprint("Door"));
    }

    #[test]
    fn empty_hash() {
        assert!(TypeHash::EMPTY.is_empty());
        assert!(!TypeHash::from_name("int").is_empty());
    }
}
