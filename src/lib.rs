//! Kismet: a Blueprint graph editing and compilation front end.
//!
//! This crate ties the workspace together behind an [`EditorSession`] and
//! re-exports the types most callers need.
//!
//! ## Architecture
//!
//! - **kismet-core**: reflection metadata, pin types, graphs and nodes
//! - **kismet-registry**: the action catalog, the context filter, action
//!   spawning and incremental priming of template nodes
//! - **kismet-compiler**: node handlers that lower a function graph to a
//!   linear statement list, plus a small evaluator for that list
//!
//! ## Quick Start
//!
//! ```
//! use kismet::{
//!     Action, ActionFilter, Blueprint, ClassInfo, EditorSession, FilterContext, FunctionFlags,
//!     FunctionInfo, GraphKind, Location, MetadataRegistry, NodeKind, TypeHash,
//! };
//!
//! let mut metadata = MetadataRegistry::new();
//! let actor = metadata.add_class(ClassInfo::new("Actor"));
//! let jump = metadata.add_function(
//!     FunctionInfo::new(actor, "Jump").with_flags(FunctionFlags::BLUEPRINT_CALLABLE),
//! );
//!
//! let mut session = EditorSession::default();
//! let filter = ActionFilter::new(FilterContext::new()).permit_node_type(NodeKind::CallFunction);
//! assert_eq!(session.filtered_actions(&metadata, &filter).len(), 1);
//!
//! let mut blueprint = Blueprint::new(TypeHash::from_blueprint("Hero"));
//! let graph = blueprint.add_graph("EventGraph", GraphKind::Ubergraph);
//! session
//!     .spawn(&metadata, &Action::function(jump), &mut blueprint, graph, &[], Location::new(0, 0))
//!     .unwrap();
//! let compiled = session.compile_blueprint(&metadata, &blueprint);
//! assert!(!compiled[0].has_errors());
//! ```

mod session;

pub use session::{EditorSession, SessionConfig, SessionError};

pub use kismet_core::{
    Blueprint, BlueprintInfo, ClassFlags, ClassInfo, Diagnostic, Diagnostics, EnumInfo,
    FunctionFlags, FunctionInfo, Graph, GraphId, GraphKind, Literal, Location, MetadataProvider,
    MetadataRegistry, Node, NodeConfig, NodeId, NodeKind, NodeRef, NodeTypeRegistry, ObjectId, Pin,
    PinId, PinType, PropertyFlags, PropertyInfo, Severity, StructInfo, TypeHash,
};

pub use kismet_registry::{
    Action, ActionCatalog, ActionEnv, ActionFilter, ActionKey, Clock, FilterContext, FilterFlags,
    GraphContext, IncrementalPrimer, MenuSignature, MonotonicClock, PrimerConfig, SpawnerKind,
};

pub use kismet_compiler::{
    CompiledFunction, CompilerOptions, EvalError, Evaluator, FunctionCompiler, HandlerRegistry,
    LoweringError, NodeHandler, Statement, StatementKind, TraceEvent,
};
