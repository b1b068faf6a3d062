//! Graph nodes, their pins and per-node configuration.

use crate::{Graph, Literal, NodeKind, ObjectId, PinDirection, PinType, TypeHash};

/// Node identity within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Pin identity within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId(pub u32);

/// Editor location of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// This location moved by `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Description of a pin before it is given an identity.
#[derive(Debug, Clone, PartialEq)]
pub struct PinTemplate {
    pub name: String,
    pub direction: PinDirection,
    pub pin_type: PinType,
    pub default: Option<Literal>,
    pub hidden: bool,
}

impl PinTemplate {
    pub fn input(name: impl Into<String>, pin_type: PinType) -> Self {
        Self {
            name: name.into(),
            direction: PinDirection::Input,
            pin_type,
            default: None,
            hidden: false,
        }
    }

    pub fn output(name: impl Into<String>, pin_type: PinType) -> Self {
        Self {
            direction: PinDirection::Output,
            ..Self::input(name, pin_type)
        }
    }

    pub fn with_default(mut self, value: Literal) -> Self {
        self.default = Some(value);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// A pin on a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    pub id: PinId,
    pub name: String,
    pub direction: PinDirection,
    pub pin_type: PinType,
    /// Value used when an input pin is not linked.
    pub default: Option<Literal>,
    pub hidden: bool,
    /// Pins this pin is wired to.
    pub links: Vec<PinId>,
}

impl Pin {
    pub fn new(id: PinId, template: PinTemplate) -> Self {
        Self {
            id,
            name: template.name,
            direction: template.direction,
            pin_type: template.pin_type,
            default: template.default,
            hidden: template.hidden,
            links: Vec::new(),
        }
    }

    pub fn is_input(&self) -> bool {
        self.direction == PinDirection::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == PinDirection::Output
    }

    pub fn is_exec(&self) -> bool {
        self.pin_type.is_exec()
    }

    pub fn is_linked(&self) -> bool {
        !self.links.is_empty()
    }

    /// The implicit target object pin.
    pub fn is_self(&self) -> bool {
        self.is_input() && self.name == crate::pin_names::SELF
    }
}

/// Reference to a macro graph owned by a blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MacroGraphRef {
    pub blueprint: TypeHash,
    pub graph: String,
}

/// Reference to a local variable of a blueprint function graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalVariableRef {
    pub blueprint: TypeHash,
    pub graph: String,
    pub name: String,
}

/// Side of a tunnel node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TunnelRole {
    /// Exposes the enclosing node's inputs as outputs.
    Entry,
    /// Collects values for the enclosing node's outputs.
    Exit,
}

/// Per-node configuration set by an action's customize callback.
///
/// Which fields matter depends on the node kind: a call node reads
/// `function`, a cast reads `target_class`, a break node reads `struct_type`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeConfig {
    pub function: Option<TypeHash>,
    pub property: Option<TypeHash>,
    pub enum_type: Option<TypeHash>,
    pub struct_type: Option<TypeHash>,
    pub target_class: Option<TypeHash>,
    pub macro_graph: Option<MacroGraphRef>,
    pub local_variable: Option<LocalVariableRef>,
    /// Component property the node operates through (bound actions).
    pub bound_property: Option<TypeHash>,
    /// Runtime object the node is bound to (bound actions).
    pub bound_object: Option<ObjectId>,
    /// Number of editable outputs of sequence and multi-gate nodes, or
    /// inputs of make-array nodes. Zero means the kind's default.
    pub pin_count: usize,
    /// Byte to enum casts validate the value when set.
    pub safe_cast: bool,
    pub comment: Option<String>,
    pub tunnel: Option<TunnelRole>,
    /// Expression graph of a math expression node.
    pub inner_graph: Option<Box<Graph>>,
}

impl NodeConfig {
    pub fn for_function(function: TypeHash) -> Self {
        Self {
            function: Some(function),
            ..Self::default()
        }
    }

    pub fn for_property(property: TypeHash) -> Self {
        Self {
            property: Some(property),
            ..Self::default()
        }
    }

    pub fn for_enum(enum_type: TypeHash) -> Self {
        Self {
            enum_type: Some(enum_type),
            ..Self::default()
        }
    }

    pub fn for_struct(struct_type: TypeHash) -> Self {
        Self {
            struct_type: Some(struct_type),
            ..Self::default()
        }
    }

    pub fn for_class(target_class: TypeHash) -> Self {
        Self {
            target_class: Some(target_class),
            ..Self::default()
        }
    }
}

/// A node placed in a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub config: NodeConfig,
    pub location: Location,
    pub pins: Vec<Pin>,
}

impl Node {
    /// Pin by name.
    pub fn find_pin(&self, name: &str) -> Option<&Pin> {
        self.pins.iter().find(|p| p.name == name)
    }

    /// Pin by name and direction.
    pub fn find_pin_dir(&self, name: &str, direction: PinDirection) -> Option<&Pin> {
        self.pins
            .iter()
            .find(|p| p.name == name && p.direction == direction)
    }

    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.iter().find(|p| p.id == id)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(|p| p.is_input())
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(|p| p.is_output())
    }

    /// Data (non-exec) pins.
    pub fn data_pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(|p| !p.is_exec())
    }

    /// Whether the node has an exec input or output.
    pub fn has_exec_pins(&self) -> bool {
        self.pins.iter().any(|p| p.is_exec())
    }
}
