//! Actions: descriptors that spawn one configured graph node.
//!
//! An [`Action`] is immutable once built. The only state it carries is lazy:
//! the menu signature (dropped on rename) and the template node (built once,
//! pins allocated once).
//!
//! # Example
//!
//! ```
//! use kismet_core::{ClassInfo, FunctionFlags, FunctionInfo, MetadataRegistry, NodeKind, NodeTypeRegistry};
//! use kismet_registry::{Action, ActionEnv};
//!
//! let mut metadata = MetadataRegistry::new();
//! let actor = metadata.add_class(ClassInfo::new("Actor"));
//! let jump = metadata.add_function(
//!     FunctionInfo::new(actor, "Jump").with_flags(FunctionFlags::BLUEPRINT_CALLABLE),
//! );
//! let node_types = NodeTypeRegistry::with_defaults();
//! let env = ActionEnv::new(&metadata, &node_types);
//!
//! let action = Action::function(jump);
//! assert_eq!(action.node_kind(), NodeKind::CallFunction);
//! assert_eq!(action.signature(&env).name, "Jump");
//! assert!(!action.is_primed());
//! action.prime(&env);
//! assert!(action.is_primed());
//! ```

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

use kismet_core::{
    LocalVariableRef, MacroGraphRef, MetadataProvider, NodeConfig, NodeKind, Pin, PinId,
    TypeHash, default_pins,
};

use crate::ActionEnv;

/// Post-construction configuration: `(config, is_template)`.
pub type CustomizeFn = Rc<dyn Fn(&mut NodeConfig, bool)>;

/// Key of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKey {
    /// Actions discovered on a class.
    Class(TypeHash),
    /// Self-describing actions of a node type.
    NodeType(NodeKind),
    /// Actions for a global enum or struct asset.
    Asset(TypeHash),
}

/// How an action spawns its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpawnerKind {
    /// Plain node, configured only through the customize callback.
    Node,
    Function,
    Message,
    /// Event node; at most one per function per blueprint.
    Event,
    /// Variable or delegate node for a member property.
    Property,
    LocalVariable,
    /// Event bound to a component's or an actor's delegate; needs a binding object.
    BoundEvent,
    /// Call through a component; needs a binding object.
    BoundCall,
    Macro,
}

/// Field an action is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BoundField {
    Function(TypeHash),
    Property(TypeHash),
    LocalVariable(LocalVariableRef),
    MacroGraph(MacroGraphRef),
}

/// Display name and menu category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MenuSignature {
    pub name: String,
    pub category: String,
}

/// A throwaway node instance used to inspect an action's pin shape.
pub struct TemplateNode {
    pub kind: NodeKind,
    pub config: NodeConfig,
    pins: OnceCell<Vec<Pin>>,
}

impl TemplateNode {
    fn new(kind: NodeKind, config: NodeConfig) -> Self {
        Self {
            kind,
            config,
            pins: OnceCell::new(),
        }
    }

    /// Pins of the template, allocated on first use.
    pub fn pins(&self, metadata: &dyn MetadataProvider) -> &[Pin] {
        self.pins.get_or_init(|| {
            default_pins(self.kind, &self.config, metadata)
                .into_iter()
                .enumerate()
                .map(|(i, template)| Pin::new(PinId(i as u32), template))
                .collect()
        })
    }

    pub fn has_pins(&self) -> bool {
        self.pins.get().is_some()
    }
}

impl fmt::Debug for TemplateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateNode")
            .field("kind", &self.kind)
            .field("primed", &self.has_pins())
            .finish()
    }
}

/// Descriptor that spawns one configured graph node.
pub struct Action {
    node_kind: NodeKind,
    spawner: SpawnerKind,
    field: Option<BoundField>,
    /// Component property bound actions operate through.
    component: Option<TypeHash>,
    customize: Option<CustomizeFn>,
    signature: RefCell<Option<MenuSignature>>,
    template: OnceCell<TemplateNode>,
}

impl Action {
    fn new(node_kind: NodeKind, spawner: SpawnerKind, field: Option<BoundField>) -> Self {
        Self {
            node_kind,
            spawner,
            field,
            component: None,
            customize: None,
            signature: RefCell::new(None),
            template: OnceCell::new(),
        }
    }

    // ==========================================================================
    // Construction
    // ==========================================================================

    /// Plain node of `kind`.
    pub fn node(kind: NodeKind) -> Self {
        Self::new(kind, SpawnerKind::Node, None)
    }

    /// Call of `function`.
    pub fn function(function: TypeHash) -> Self {
        Self::new(
            NodeKind::CallFunction,
            SpawnerKind::Function,
            Some(BoundField::Function(function)),
        )
    }

    /// Interface message call of `function`.
    pub fn message(function: TypeHash) -> Self {
        Self::new(
            NodeKind::Message,
            SpawnerKind::Message,
            Some(BoundField::Function(function)),
        )
    }

    /// Event implementing `function`.
    pub fn event(function: TypeHash) -> Self {
        Self::new(
            NodeKind::Event,
            SpawnerKind::Event,
            Some(BoundField::Function(function)),
        )
    }

    /// Variable or delegate node of `kind` for a member property.
    pub fn property(kind: NodeKind, property: TypeHash) -> Self {
        Self::new(kind, SpawnerKind::Property, Some(BoundField::Property(property)))
    }

    /// Getter or setter of a function-local variable.
    pub fn local_variable(kind: NodeKind, variable: LocalVariableRef) -> Self {
        Self::new(
            kind,
            SpawnerKind::LocalVariable,
            Some(BoundField::LocalVariable(variable)),
        )
    }

    /// Event bound to `delegate` of the component held in `component`.
    pub fn bound_event(component: TypeHash, delegate: TypeHash) -> Self {
        let mut action = Self::new(
            NodeKind::ComponentBoundEvent,
            SpawnerKind::BoundEvent,
            Some(BoundField::Property(delegate)),
        );
        action.component = Some(component);
        action
    }

    /// Event bound to `delegate` declared on an actor class. Binding objects
    /// are instances of that class.
    pub fn actor_bound_event(delegate: TypeHash) -> Self {
        Self::new(
            NodeKind::ActorBoundEvent,
            SpawnerKind::BoundEvent,
            Some(BoundField::Property(delegate)),
        )
    }

    /// Call of `function` on the component held in `component`.
    pub fn bound_call(component: TypeHash, function: TypeHash) -> Self {
        let mut action = Self::new(
            NodeKind::CallFunction,
            SpawnerKind::BoundCall,
            Some(BoundField::Function(function)),
        );
        action.component = Some(component);
        action
    }

    /// Instance of a blueprint macro graph.
    pub fn macro_instance(graph: MacroGraphRef) -> Self {
        Self::new(
            NodeKind::MacroInstance,
            SpawnerKind::Macro,
            Some(BoundField::MacroGraph(graph)),
        )
    }

    /// Attach the customize callback.
    pub fn with_customize(mut self, customize: impl Fn(&mut NodeConfig, bool) + 'static) -> Self {
        self.customize = Some(Rc::new(customize));
        self
    }

    // ==========================================================================
    // Accessors
    // ==========================================================================

    pub fn node_kind(&self) -> NodeKind {
        self.node_kind
    }

    pub fn spawner(&self) -> SpawnerKind {
        self.spawner
    }

    pub fn field(&self) -> Option<&BoundField> {
        self.field.as_ref()
    }

    pub fn component(&self) -> Option<TypeHash> {
        self.component
    }

    /// Bound to a runtime object at spawn time.
    pub fn is_bound(&self) -> bool {
        matches!(self.spawner, SpawnerKind::BoundEvent | SpawnerKind::BoundCall)
    }

    pub fn function(&self) -> Option<TypeHash> {
        match self.field {
            Some(BoundField::Function(f)) => Some(f),
            _ => None,
        }
    }

    pub fn property(&self) -> Option<TypeHash> {
        match self.field {
            Some(BoundField::Property(p)) => Some(p),
            _ => None,
        }
    }

    pub fn local_variable(&self) -> Option<&LocalVariableRef> {
        match &self.field {
            Some(BoundField::LocalVariable(l)) => Some(l),
            _ => None,
        }
    }

    /// Hash of the bound member function or property.
    pub fn member_field(&self) -> Option<TypeHash> {
        self.function().or(self.property())
    }

    /// Class owning the bound member function or property.
    pub fn member_owner(&self, metadata: &dyn MetadataProvider) -> Option<TypeHash> {
        if let Some(f) = self.function() {
            return metadata.function(f).map(|f| f.owner);
        }
        self.property()
            .and_then(|p| metadata.property(p))
            .map(|p| p.owner)
    }

    // ==========================================================================
    // Node configuration
    // ==========================================================================

    /// Configuration for a new node: the bound field, then the customize callback.
    pub fn config(&self, is_template: bool) -> NodeConfig {
        let mut config = NodeConfig::default();
        match &self.field {
            Some(BoundField::Function(f)) => config.function = Some(*f),
            Some(BoundField::Property(p)) => config.property = Some(*p),
            Some(BoundField::LocalVariable(l)) => config.local_variable = Some(l.clone()),
            Some(BoundField::MacroGraph(m)) => config.macro_graph = Some(m.clone()),
            None => {}
        }
        config.bound_property = self.component;
        if let Some(customize) = &self.customize {
            customize(&mut config, is_template);
        }
        config
    }

    /// Template node, built on first use.
    pub fn template_node(&self) -> &TemplateNode {
        self.template
            .get_or_init(|| TemplateNode::new(self.node_kind, self.config(true)))
    }

    /// Allocate the template's pins. Idempotent.
    pub fn prime(&self, env: &ActionEnv<'_>) {
        self.template_node().pins(env.metadata);
    }

    /// Template pins have been allocated.
    pub fn is_primed(&self) -> bool {
        self.template.get().is_some_and(TemplateNode::has_pins)
    }

    // ==========================================================================
    // Menu signature
    // ==========================================================================

    /// Display name and category, computed on first use.
    pub fn signature(&self, env: &ActionEnv<'_>) -> MenuSignature {
        if let Some(cached) = self.signature.borrow().as_ref() {
            return cached.clone();
        }
        let signature = self.build_signature(env.metadata);
        *self.signature.borrow_mut() = Some(signature.clone());
        signature
    }

    /// Drop the cached signature, e.g. after the bound field was renamed.
    pub fn invalidate_signature(&self) {
        self.signature.borrow_mut().take();
    }

    fn build_signature(&self, metadata: &dyn MetadataProvider) -> MenuSignature {
        let config = &self.template_node().config;
        let kind = self.node_kind;
        let class_name = |hash: Option<TypeHash>| {
            hash.and_then(|h| metadata.class(h))
                .map(|c| c.name.clone())
                .unwrap_or_default()
        };

        let (name, category) = match self.spawner {
            SpawnerKind::Function | SpawnerKind::Message | SpawnerKind::Event => {
                let info = config.function.and_then(|f| metadata.function(f));
                let name = info.map(|f| f.name.clone()).unwrap_or_default();
                let category = info
                    .map(|f| {
                        if f.category.is_empty() {
                            class_name(Some(f.owner))
                        } else {
                            f.category.clone()
                        }
                    })
                    .unwrap_or_default();
                match self.spawner {
                    SpawnerKind::Event => (format!("Event {name}"), "Add Event".to_string()),
                    SpawnerKind::Message => (format!("{name} (Message)"), category),
                    _ => (name, category),
                }
            }
            SpawnerKind::Property => {
                let info = config.property.and_then(|p| metadata.property(p));
                let name = info.map(|p| p.name.clone()).unwrap_or_default();
                let category = info
                    .map(|p| {
                        if p.category.is_empty() {
                            class_name(Some(p.owner))
                        } else {
                            p.category.clone()
                        }
                    })
                    .unwrap_or_default();
                (format!("{} {name}", kind.display_name()), category)
            }
            SpawnerKind::LocalVariable => {
                let name = config
                    .local_variable
                    .as_ref()
                    .map(|l| l.name.clone())
                    .unwrap_or_default();
                (
                    format!("{} {name}", kind.display_name()),
                    "Local Variables".to_string(),
                )
            }
            SpawnerKind::BoundEvent | SpawnerKind::BoundCall => {
                let component = config
                    .bound_property
                    .and_then(|p| metadata.property(p))
                    .map(|p| p.name.clone());
                let member = if self.spawner == SpawnerKind::BoundEvent {
                    config
                        .property
                        .and_then(|p| metadata.property(p))
                        .map(|p| format!("Add {}", p.name))
                } else {
                    config
                        .function
                        .and_then(|f| metadata.function(f))
                        .map(|f| f.name.clone())
                };
                let member = member.unwrap_or_default();
                match component {
                    Some(component) => (format!("{member} ({component})"), "Components".to_string()),
                    None => (member, "Actor Events".to_string()),
                }
            }
            SpawnerKind::Macro => {
                let name = config
                    .macro_graph
                    .as_ref()
                    .map(|m| m.graph.clone())
                    .unwrap_or_default();
                (name, "Macros".to_string())
            }
            SpawnerKind::Node => {
                let subject = config
                    .enum_type
                    .and_then(|e| metadata.enum_info(e))
                    .map(|e| e.name.clone())
                    .or_else(|| {
                        config
                            .struct_type
                            .and_then(|s| metadata.struct_info(s))
                            .map(|s| s.name.clone())
                    })
                    .or_else(|| {
                        config
                            .target_class
                            .and_then(|c| metadata.class(c))
                            .map(|c| c.name.clone())
                    })
                    .or_else(|| {
                        config
                            .function
                            .and_then(|f| metadata.function(f))
                            .map(|f| f.name.clone())
                    });
                let name = match subject {
                    Some(subject) => format!("{} {subject}", kind.display_name()),
                    None => kind.display_name().to_string(),
                };
                (name, "Utilities".to_string())
            }
        };
        MenuSignature { name, category }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("node_kind", &self.node_kind)
            .field("spawner", &self.spawner)
            .field("field", &self.field)
            .field("component", &self.component)
            .field("customized", &self.customize.is_some())
            .field("primed", &self.is_primed())
            .finish()
    }
}
