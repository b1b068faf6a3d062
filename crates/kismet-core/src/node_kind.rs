//! Node kinds and the node type registry.
//!
//! [`NodeKind`] is the runtime type tag of a graph node. Kinds form a shallow
//! hierarchy ([`NodeKind::parent`]) so allow/deny lists can name a family of
//! node types, e.g. every delegate node through [`NodeKind::BaseDelegate`].
//!
//! [`NodeTypeRegistry`] holds the per-kind static facts the filter needs:
//! abstractness, deprecation, purity, and which graph kinds and schemas a
//! node may be created in.

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use crate::{FunctionFlags, GraphKind, MetadataProvider, NodeConfig, SchemaKind};

/// Runtime type tag of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Comment,
    Documentation,
    CallFunction,
    /// Interface message call.
    Message,
    Event,
    ComponentBoundEvent,
    /// Event bound to a delegate of the blueprint's own actor class.
    ActorBoundEvent,
    /// Adds a component of a given class to the owning actor.
    AddComponent,
    /// Abstract base of variable getters and setters.
    Variable,
    VariableGet,
    VariableSet,
    /// Abstract base of multicast delegate nodes.
    BaseDelegate,
    AddDelegate,
    RemoveDelegate,
    ClearDelegate,
    CallDelegate,
    DynamicCast,
    ClassDynamicCast,
    GetNumEnumEntries,
    ForEachElementInEnum,
    EnumLiteral,
    CastByteToEnum,
    SwitchEnum,
    BreakStruct,
    MakeStruct,
    SetFieldsInStruct,
    MacroInstance,
    ExecutionSequence,
    IfThenElse,
    MultiGate,
    MakeArray,
    MathExpression,
    /// Abstract base of latent async task nodes.
    AsyncTask,
    AsyncAction,
    FunctionEntry,
    FunctionResult,
    Tunnel,
}

impl NodeKind {
    /// Every kind, in declaration order.
    pub const ALL: &'static [NodeKind] = &[
        NodeKind::Comment,
        NodeKind::Documentation,
        NodeKind::CallFunction,
        NodeKind::Message,
        NodeKind::Event,
        NodeKind::ComponentBoundEvent,
        NodeKind::ActorBoundEvent,
        NodeKind::AddComponent,
        NodeKind::Variable,
        NodeKind::VariableGet,
        NodeKind::VariableSet,
        NodeKind::BaseDelegate,
        NodeKind::AddDelegate,
        NodeKind::RemoveDelegate,
        NodeKind::ClearDelegate,
        NodeKind::CallDelegate,
        NodeKind::DynamicCast,
        NodeKind::ClassDynamicCast,
        NodeKind::GetNumEnumEntries,
        NodeKind::ForEachElementInEnum,
        NodeKind::EnumLiteral,
        NodeKind::CastByteToEnum,
        NodeKind::SwitchEnum,
        NodeKind::BreakStruct,
        NodeKind::MakeStruct,
        NodeKind::SetFieldsInStruct,
        NodeKind::MacroInstance,
        NodeKind::ExecutionSequence,
        NodeKind::IfThenElse,
        NodeKind::MultiGate,
        NodeKind::MakeArray,
        NodeKind::MathExpression,
        NodeKind::AsyncTask,
        NodeKind::AsyncAction,
        NodeKind::FunctionEntry,
        NodeKind::FunctionResult,
        NodeKind::Tunnel,
    ];

    /// Parent kind in the node hierarchy.
    pub fn parent(self) -> Option<NodeKind> {
        match self {
            NodeKind::Message => Some(NodeKind::CallFunction),
            NodeKind::ComponentBoundEvent | NodeKind::ActorBoundEvent => Some(NodeKind::Event),
            NodeKind::VariableGet | NodeKind::VariableSet => Some(NodeKind::Variable),
            NodeKind::AddDelegate
            | NodeKind::RemoveDelegate
            | NodeKind::ClearDelegate
            | NodeKind::CallDelegate => Some(NodeKind::BaseDelegate),
            NodeKind::ClassDynamicCast => Some(NodeKind::DynamicCast),
            NodeKind::AsyncAction => Some(NodeKind::AsyncTask),
            _ => None,
        }
    }

    /// True when `self` is `ancestor` or derives from it.
    pub fn is_child_of(self, ancestor: NodeKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// Human readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            NodeKind::Comment => "Comment",
            NodeKind::Documentation => "Documentation",
            NodeKind::CallFunction => "Call Function",
            NodeKind::Message => "Message",
            NodeKind::Event => "Event",
            NodeKind::ComponentBoundEvent => "Component Bound Event",
            NodeKind::ActorBoundEvent => "Actor Bound Event",
            NodeKind::AddComponent => "Add Component",
            NodeKind::Variable => "Variable",
            NodeKind::VariableGet => "Get",
            NodeKind::VariableSet => "Set",
            NodeKind::BaseDelegate => "Delegate",
            NodeKind::AddDelegate => "Bind Event to",
            NodeKind::RemoveDelegate => "Unbind Event from",
            NodeKind::ClearDelegate => "Unbind all Events from",
            NodeKind::CallDelegate => "Call",
            NodeKind::DynamicCast => "Cast To",
            NodeKind::ClassDynamicCast => "Cast To Class",
            NodeKind::GetNumEnumEntries => "Get number of entries in",
            NodeKind::ForEachElementInEnum => "For Each",
            NodeKind::EnumLiteral => "Literal enum",
            NodeKind::CastByteToEnum => "Byte to Enum",
            NodeKind::SwitchEnum => "Switch on",
            NodeKind::BreakStruct => "Break",
            NodeKind::MakeStruct => "Make",
            NodeKind::SetFieldsInStruct => "Set members in",
            NodeKind::MacroInstance => "Macro",
            NodeKind::ExecutionSequence => "Sequence",
            NodeKind::IfThenElse => "Branch",
            NodeKind::MultiGate => "MultiGate",
            NodeKind::MakeArray => "Make Array",
            NodeKind::MathExpression => "Math Expression",
            NodeKind::AsyncTask => "Async Task",
            NodeKind::AsyncAction => "Async Action",
            NodeKind::FunctionEntry => "Function Entry",
            NodeKind::FunctionResult => "Return Node",
            NodeKind::Tunnel => "Tunnel",
        }
    }
}

bitflags! {
    /// Static facts about a node kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeTypeFlags: u32 {
        /// Never instantiated; only used to group kinds.
        const ABSTRACT = 1 << 0;
        const DEPRECATED = 1 << 1;
        /// Has execution pins.
        const IMPURE = 1 << 2;
        /// Suspends execution.
        const LATENT = 1 << 3;
        /// Placed by the compiler or by graph creation, never from menus.
        const INTERNAL = 1 << 4;
    }
}

bitflags! {
    /// Set of graph kinds.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GraphKinds: u32 {
        const UBERGRAPH = 1 << 0;
        const FUNCTION = 1 << 1;
        const MACRO = 1 << 2;
        const ANIMATION = 1 << 3;
        const CONSTRUCTION = 1 << 4;
    }
}

impl GraphKinds {
    pub fn contains_kind(self, kind: GraphKind) -> bool {
        self.contains(GraphKinds::from(kind))
    }
}

impl From<GraphKind> for GraphKinds {
    fn from(kind: GraphKind) -> Self {
        match kind {
            GraphKind::Ubergraph => GraphKinds::UBERGRAPH,
            GraphKind::Function => GraphKinds::FUNCTION,
            GraphKind::Macro => GraphKinds::MACRO,
            GraphKind::Animation => GraphKinds::ANIMATION,
            GraphKind::Construction => GraphKinds::CONSTRUCTION,
        }
    }
}

bitflags! {
    /// Set of graph schemas.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SchemaKinds: u32 {
        const K2 = 1 << 0;
        const ANIMATION = 1 << 1;
        const MATERIAL = 1 << 2;
    }
}

impl From<SchemaKind> for SchemaKinds {
    fn from(kind: SchemaKind) -> Self {
        match kind {
            SchemaKind::K2 => SchemaKinds::K2,
            SchemaKind::Animation => SchemaKinds::ANIMATION,
            SchemaKind::Material => SchemaKinds::MATERIAL,
        }
    }
}

/// Static registration record of a node kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTypeInfo {
    pub kind: NodeKind,
    pub flags: NodeTypeFlags,
    /// Graph kinds the node may be placed in.
    pub graphs: GraphKinds,
    /// Schemas the node may be created under.
    pub schemas: SchemaKinds,
}

impl NodeTypeInfo {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            flags: NodeTypeFlags::empty(),
            graphs: GraphKinds::all(),
            schemas: SchemaKinds::K2 | SchemaKinds::ANIMATION,
        }
    }

    pub fn with_flags(mut self, flags: NodeTypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn in_graphs(mut self, graphs: GraphKinds) -> Self {
        self.graphs = graphs;
        self
    }

    pub fn under_schemas(mut self, schemas: SchemaKinds) -> Self {
        self.schemas = schemas;
        self
    }
}

/// Registry of node kinds known to the editor.
#[derive(Debug, Clone, Default)]
pub struct NodeTypeRegistry {
    types: FxHashMap<NodeKind, NodeTypeInfo>,
    order: Vec<NodeKind>,
}

impl NodeTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in node kind.
    pub fn with_defaults() -> Self {
        use NodeKind as K;
        use NodeTypeFlags as F;

        let event_graph = GraphKinds::UBERGRAPH;
        let no_anim = GraphKinds::all() - GraphKinds::ANIMATION;

        let mut registry = Self::new();
        for kind in NodeKind::ALL.iter().copied() {
            let info = NodeTypeInfo::new(kind);
            let info = match kind {
                K::Comment | K::Documentation => info.under_schemas(SchemaKinds::all()),
                K::Variable | K::BaseDelegate => info.with_flags(F::ABSTRACT),
                K::AsyncTask => info.with_flags(F::ABSTRACT | F::IMPURE | F::LATENT),
                K::AsyncAction => info.with_flags(F::IMPURE | F::LATENT).in_graphs(event_graph),
                K::Event | K::ComponentBoundEvent | K::ActorBoundEvent => {
                    info.with_flags(F::IMPURE).in_graphs(event_graph)
                }
                K::AddComponent => info
                    .with_flags(F::IMPURE)
                    .in_graphs(GraphKinds::UBERGRAPH | GraphKinds::FUNCTION),
                K::FunctionEntry | K::FunctionResult => info
                    .with_flags(F::INTERNAL | F::IMPURE)
                    .in_graphs(GraphKinds::FUNCTION | GraphKinds::CONSTRUCTION),
                K::Tunnel => info.with_flags(F::INTERNAL).in_graphs(GraphKinds::MACRO),
                K::Message
                | K::VariableSet
                | K::AddDelegate
                | K::RemoveDelegate
                | K::ClearDelegate
                | K::CallDelegate
                | K::DynamicCast
                | K::ClassDynamicCast
                | K::ForEachElementInEnum
                | K::SwitchEnum
                | K::SetFieldsInStruct
                | K::ExecutionSequence
                | K::IfThenElse
                | K::MultiGate
                | K::MakeArray => info.with_flags(F::IMPURE).in_graphs(no_anim),
                _ => info,
            };
            registry.register(info);
        }
        registry
    }

    /// Register or replace a node kind.
    pub fn register(&mut self, info: NodeTypeInfo) {
        if !self.types.contains_key(&info.kind) {
            self.order.push(info.kind);
        }
        self.types.insert(info.kind, info);
    }

    pub fn info(&self, kind: NodeKind) -> Option<&NodeTypeInfo> {
        self.types.get(&kind)
    }

    /// Registered kinds in registration order.
    pub fn kinds(&self) -> &[NodeKind] {
        &self.order
    }

    fn has_flags(&self, kind: NodeKind, flags: NodeTypeFlags) -> bool {
        self.info(kind).is_some_and(|i| i.flags.intersects(flags))
    }

    pub fn is_abstract(&self, kind: NodeKind) -> bool {
        self.has_flags(kind, NodeTypeFlags::ABSTRACT)
    }

    /// Deprecated itself or through a deprecated parent kind.
    pub fn is_deprecated(&self, kind: NodeKind) -> bool {
        let mut current = Some(kind);
        while let Some(k) = current {
            if self.has_flags(k, NodeTypeFlags::DEPRECATED) {
                return true;
            }
            current = k.parent();
        }
        false
    }

    pub fn set_deprecated(&mut self, kind: NodeKind, deprecated: bool) {
        if let Some(info) = self.types.get_mut(&kind) {
            info.flags.set(NodeTypeFlags::DEPRECATED, deprecated);
        }
    }

    /// Whether a node of `kind` configured with `config` has execution pins.
    ///
    /// Call-function nodes take their purity from the bound function.
    pub fn is_impure(
        &self,
        kind: NodeKind,
        config: &NodeConfig,
        metadata: &dyn MetadataProvider,
    ) -> bool {
        match kind {
            NodeKind::CallFunction => config
                .function
                .and_then(|f| metadata.function(f))
                .is_some_and(|f| !f.is_pure()),
            _ => self.has_flags(kind, NodeTypeFlags::IMPURE),
        }
    }

    /// Whether a node of `kind` may be placed in a graph of `graph` kind.
    ///
    /// Latent calls and local variable nodes narrow the static rule: latent
    /// functions only run in event graphs, locals only exist in functions.
    pub fn is_compatible_with_graph(
        &self,
        kind: NodeKind,
        config: &NodeConfig,
        metadata: &dyn MetadataProvider,
        graph: GraphKind,
    ) -> bool {
        let Some(info) = self.info(kind) else {
            return false;
        };
        if !info.graphs.contains_kind(graph) {
            return false;
        }
        let latent_call = kind.is_child_of(NodeKind::CallFunction)
            && config
                .function
                .and_then(|f| metadata.function(f))
                .is_some_and(|f| f.has_flags(FunctionFlags::LATENT));
        if latent_call || info.flags.contains(NodeTypeFlags::LATENT) {
            return graph == GraphKind::Ubergraph;
        }
        if config.local_variable.is_some() {
            return graph == GraphKind::Function;
        }
        true
    }

    /// Whether a node of `kind` may be created under `schema`.
    pub fn can_create_under_schema(&self, kind: NodeKind, schema: SchemaKind) -> bool {
        self.info(kind)
            .is_some_and(|info| info.schemas.contains(SchemaKinds::from(schema)))
    }
}
