//! Core types shared by the kismet crates.
//!
//! This crate provides the data model the action database, the context
//! filter and the node lowering pass all work on:
//!
//! - [`TypeHash`] identities for reflected types and fields
//! - reflection metadata behind the [`MetadataProvider`] trait, with the
//!   in-memory [`MetadataRegistry`]
//! - [`PinType`] and the schema's connection rules
//! - graphs ([`Blueprint`], [`Graph`], [`Node`], [`Pin`]) and node kinds
//! - [`Literal`] constants and [`Diagnostics`]

mod diagnostics;
mod error;
mod flags;
mod graph;
pub mod library;
mod literal;
mod metadata;
mod metadata_registry;
mod node;
mod node_kind;
mod pin_type;
mod pins;
mod type_hash;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{GraphError, GraphResult};
pub use flags::{ClassFlags, FunctionFlags, PropertyFlags, StructFlags};
pub use graph::{
    Blueprint, Graph, GraphId, GraphKind, NodeRef, SchemaKind, exec_output_prefix,
    find_directed_pin,
};
pub use literal::Literal;
pub use metadata::{
    BlueprintInfo, ClassInfo, EnumInfo, FunctionGraphInfo, FunctionInfo, LocalVariableInfo,
    MacroGraphInfo, MetadataProvider, ObjectId, ParamInfo, PropertyInfo, StructField, StructInfo,
};
pub use metadata_registry::MetadataRegistry;
pub use node::{
    Location, LocalVariableRef, MacroGraphRef, Node, NodeConfig, NodeId, Pin, PinId, PinTemplate,
    TunnelRole,
};
pub use node_kind::{
    GraphKinds, NodeKind, NodeTypeFlags, NodeTypeInfo, NodeTypeRegistry, SchemaKinds,
};
pub use pin_type::{PinCategory, PinDirection, PinType, pin_names, pin_types_compatible};
pub use pins::default_pins;
pub use type_hash::TypeHash;
