//! Context filtering of catalog actions.
//!
//! An [`ActionFilter`] decides whether an action should be hidden for a
//! query context: the blueprints being edited, the graphs a node would be
//! placed in, the pins being dragged from and the objects selected in a
//! level. The decision is made by a list of rejection tests, each a
//! predicate meaning "exclude this action".
//!
//! Tests run in reverse registration order, so custom tests added with
//! [`ActionFilter::add_rejection_test`] run before the built-in ones and the
//! most expensive built-in (pin shape matching) runs last. The order only
//! affects cost; the verdict is the same for any order.
//!
//! Filters compose: after `a |= b` an action is hidden when either filter
//! rejects it; after `a &= b` only when both do.
//!
//! # Example
//!
//! ```
//! use kismet_core::{MetadataRegistry, NodeKind, NodeTypeRegistry};
//! use kismet_registry::{Action, ActionEnv, ActionFilter, FilterContext};
//!
//! let metadata = MetadataRegistry::new();
//! let node_types = NodeTypeRegistry::with_defaults();
//! let env = ActionEnv::new(&metadata, &node_types);
//!
//! let filter = ActionFilter::new(FilterContext::new()).reject_node_type(NodeKind::Comment);
//! assert!(filter.is_filtered(&env, &Action::node(NodeKind::Comment)));
//! assert!(!filter.is_filtered(&env, &Action::node(NodeKind::ExecutionSequence)));
//! ```

mod rejections;

use std::ops::{BitAndAssign, BitOrAssign};
use std::rc::Rc;

use bitflags::bitflags;
use kismet_core::{Graph, GraphKind, NodeKind, ObjectId, Pin, SchemaKind, TypeHash};
use tracing::trace;

use crate::{Action, ActionCatalog, ActionEnv};

bitflags! {
    /// Filter behavior switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FilterFlags: u32 {
        /// Hide static fields of classes outside the target set.
        const EXCLUDE_GLOBAL_FIELDS = 1 << 0;
        /// Keep deprecated node types and fields.
        const INCLUDE_DEPRECATED = 1 << 1;
        /// Match the deny-list exactly instead of including child kinds.
        const PERMIT_REJECTION_SUBCLASSES = 1 << 2;
    }
}

/// Predicate meaning "exclude this action".
pub type RejectionTest = Rc<dyn Fn(&ActionFilter, &ActionEnv<'_>, &Action) -> bool>;

/// A graph a filtered action could be placed in.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphContext {
    /// Blueprint owning the graph.
    pub blueprint: TypeHash,
    pub name: String,
    pub kind: GraphKind,
    pub schema: SchemaKind,
    pub supports_impure: bool,
}

impl GraphContext {
    pub fn new(blueprint: TypeHash, name: impl Into<String>, kind: GraphKind) -> Self {
        let schema = match kind {
            GraphKind::Animation => SchemaKind::Animation,
            _ => SchemaKind::K2,
        };
        Self {
            blueprint,
            name: name.into(),
            kind,
            schema,
            supports_impure: kind != GraphKind::Animation,
        }
    }

    /// Snapshot of an existing graph of `blueprint`.
    pub fn from_graph(blueprint: TypeHash, graph: &Graph) -> Self {
        Self {
            blueprint,
            name: graph.name.clone(),
            kind: graph.kind,
            schema: graph.schema,
            supports_impure: graph.supports_impure(),
        }
    }

    pub fn with_schema(mut self, schema: SchemaKind) -> Self {
        self.schema = schema;
        self
    }

    pub fn pure_only(mut self) -> Self {
        self.supports_impure = false;
        self
    }
}

/// Query input of a filter evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterContext {
    /// Blueprints (by [`BlueprintInfo`](kismet_core::BlueprintInfo) hash) being edited.
    pub blueprints: Vec<TypeHash>,
    pub graphs: Vec<GraphContext>,
    /// Pins being dragged from.
    pub pins: Vec<Pin>,
    /// Objects bound actions may bind to.
    pub selected_objects: Vec<ObjectId>,
}

impl FilterContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blueprint(mut self, blueprint: TypeHash) -> Self {
        self.blueprints.push(blueprint);
        self
    }

    pub fn with_graph(mut self, graph: GraphContext) -> Self {
        self.graphs.push(graph);
        self
    }

    pub fn with_pin(mut self, pin: Pin) -> Self {
        self.pins.push(pin);
        self
    }

    pub fn with_selected_object(mut self, object: ObjectId) -> Self {
        self.selected_objects.push(object);
        self
    }
}

/// Chain of rejection tests over a [`FilterContext`], composable with other
/// filters.
pub struct ActionFilter {
    pub context: FilterContext,
    /// When non-empty, only these kinds (and their children) pass.
    pub permitted_node_types: Vec<NodeKind>,
    pub rejected_node_types: Vec<NodeKind>,
    /// Classes whose members are wanted; defaults to the blueprints' classes.
    pub target_classes: Vec<TypeHash>,
    pub flags: FilterFlags,
    tests: Vec<RejectionTest>,
    or_filters: Vec<ActionFilter>,
    and_filters: Vec<ActionFilter>,
}

impl ActionFilter {
    /// Create a filter with every built-in rejection test registered.
    pub fn new(context: FilterContext) -> Self {
        let mut filter = Self {
            context,
            permitted_node_types: Vec::new(),
            rejected_node_types: Vec::new(),
            target_classes: Vec::new(),
            flags: FilterFlags::empty(),
            tests: Vec::new(),
            or_filters: Vec::new(),
            and_filters: Vec::new(),
        };
        for test in rejections::BUILTIN_TESTS.iter().copied() {
            filter.tests.push(Rc::new(test));
        }
        filter
    }

    pub fn with_flags(mut self, flags: FilterFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn permit_node_type(mut self, kind: NodeKind) -> Self {
        self.permitted_node_types.push(kind);
        self
    }

    pub fn reject_node_type(mut self, kind: NodeKind) -> Self {
        self.rejected_node_types.push(kind);
        self
    }

    pub fn with_target_class(mut self, class: TypeHash) -> Self {
        self.target_classes.push(class);
        self
    }

    /// Add a custom test. Later tests run earlier.
    pub fn add_rejection_test(
        &mut self,
        test: impl Fn(&ActionFilter, &ActionEnv<'_>, &Action) -> bool + 'static,
    ) {
        self.tests.push(Rc::new(test));
    }

    /// Number of registered rejection tests.
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    #[cfg(test)]
    pub(crate) fn tests_mut(&mut self) -> &mut Vec<RejectionTest> {
        &mut self.tests
    }

    // ==========================================================================
    // Evaluation
    // ==========================================================================

    /// Whether `action` should be hidden.
    ///
    /// Rejected by this filter or any OR branch, and by every AND branch.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn is_filtered(&self, env: &ActionEnv<'_>, action: &Action) -> bool {
        let rejected = self.is_filtered_by_this(env, action)
            || self.or_filters.iter().any(|f| f.is_filtered(env, action));
        rejected && self.and_filters.iter().all(|f| f.is_filtered(env, action))
    }

    /// Verdict of this filter's own tests, ignoring composed filters.
    pub fn is_filtered_by_this(&self, env: &ActionEnv<'_>, action: &Action) -> bool {
        let rejected = self.tests.iter().rev().any(|test| test(self, env, action));
        if rejected {
            trace!(kind = ?action.node_kind(), field = ?action.field(), "action rejected");
        }
        rejected
    }

    /// Actions of `catalog` that pass the filter.
    pub fn filtered_actions<'c>(
        &self,
        env: &ActionEnv<'_>,
        catalog: &'c ActionCatalog,
    ) -> Vec<&'c Action> {
        catalog
            .iter()
            .map(|(_, action)| action)
            .filter(|action| !self.is_filtered(env, action))
            .collect()
    }

    /// Classes member actions are checked against: the explicit targets, or
    /// the query classes of the context blueprints.
    pub fn effective_target_classes(&self, env: &ActionEnv<'_>) -> Vec<TypeHash> {
        if !self.target_classes.is_empty() {
            return self.target_classes.clone();
        }
        self.context
            .blueprints
            .iter()
            .filter_map(|b| env.metadata.blueprint(*b))
            .map(|b| b.class_for_queries())
            .collect()
    }
}

impl BitOrAssign for ActionFilter {
    fn bitor_assign(&mut self, rhs: ActionFilter) {
        self.or_filters.push(rhs);
    }
}

impl BitAndAssign for ActionFilter {
    fn bitand_assign(&mut self, rhs: ActionFilter) {
        self.and_filters.push(rhs);
    }
}

impl std::fmt::Debug for ActionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionFilter")
            .field("context", &self.context)
            .field("permitted_node_types", &self.permitted_node_types)
            .field("rejected_node_types", &self.rejected_node_types)
            .field("target_classes", &self.target_classes)
            .field("flags", &self.flags)
            .field("tests", &self.tests.len())
            .field("or_filters", &self.or_filters)
            .field("and_filters", &self.and_filters)
            .finish()
    }
}
