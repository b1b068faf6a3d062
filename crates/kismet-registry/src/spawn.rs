//! Turning actions into graph nodes.

use kismet_core::{Blueprint, GraphId, Location, NodeRef, ObjectId};
use tracing::debug;

use crate::{Action, ActionEnv, SpawnerKind};

/// Vertical spacing between nodes spawned for consecutive bindings.
const BINDING_SPACING: i32 = 50;

impl Action {
    /// Create the action's node in `graph` at `location`.
    ///
    /// Event actions return the blueprint's existing event node for the same
    /// function instead of placing a duplicate. Bound actions need objects to
    /// bind to and return `None` here; use [`Action::invoke_bound`].
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn invoke(
        &self,
        env: &ActionEnv<'_>,
        blueprint: &mut Blueprint,
        graph: GraphId,
        location: Location,
    ) -> Option<NodeRef> {
        if self.is_bound() {
            debug!(kind = ?self.node_kind(), "bound action invoked without bindings");
            return None;
        }
        self.spawn(env, blueprint, graph, location, None)
    }

    /// Create (or find) one node per live, compatible binding.
    ///
    /// Returns the last node, or `None` when no binding was eligible, in which
    /// case nothing is created. Non-bound actions ignore `bindings`.
    pub fn invoke_bound(
        &self,
        env: &ActionEnv<'_>,
        blueprint: &mut Blueprint,
        graph: GraphId,
        bindings: &[ObjectId],
        location: Location,
    ) -> Option<NodeRef> {
        if !self.is_bound() {
            return self.invoke(env, blueprint, graph, location);
        }

        let eligible: Vec<ObjectId> = bindings
            .iter()
            .copied()
            .filter(|object| self.is_binding_compatible(env, *object))
            .collect();
        if eligible.is_empty() {
            debug!(kind = ?self.node_kind(), "no eligible bindings");
            return None;
        }

        let mut last = None;
        for (i, object) in eligible.into_iter().enumerate() {
            let at = location.offset(0, i as i32 * BINDING_SPACING);
            if let Some(node) = self.spawn(env, blueprint, graph, at, Some(object)) {
                last = Some(node);
            }
        }
        last
    }

    /// Whether `object` is alive and an instance of the bound component's class,
    /// or of the delegate owner for actor-bound events.
    pub fn is_binding_compatible(&self, env: &ActionEnv<'_>, object: ObjectId) -> bool {
        let metadata = env.metadata;
        if !metadata.is_object_alive(object) {
            return false;
        }
        // Actor-bound delegates bind to instances of the class declaring them.
        let bound_class = match self.component() {
            Some(component) => metadata.property(component).and_then(|p| p.object_class()),
            None => self.member_owner(metadata),
        };
        let Some(bound_class) = bound_class else {
            return false;
        };
        metadata
            .object_class(object)
            .is_some_and(|class| metadata.is_child_of(class, bound_class))
    }

    fn spawn(
        &self,
        env: &ActionEnv<'_>,
        blueprint: &mut Blueprint,
        graph: GraphId,
        location: Location,
        binding: Option<ObjectId>,
    ) -> Option<NodeRef> {
        if env.node_types.is_abstract(self.node_kind()) {
            return None;
        }

        let mut config = self.config(false);
        config.bound_object = binding;

        match self.spawner() {
            SpawnerKind::Event => {
                if let Some(function) = config.function
                    && let Some(existing) = blueprint.find_event_node(function)
                {
                    return Some(existing);
                }
            }
            SpawnerKind::BoundEvent => {
                if let Some(delegate) = config.property
                    && let Some(existing) =
                        blueprint.find_bound_event_node(delegate, config.bound_property, binding)
                {
                    return Some(existing);
                }
            }
            _ => {}
        }

        let target = blueprint.graph_mut(graph)?;
        let node = target.add_node(self.node_kind(), config, location, env.metadata);
        debug!(kind = ?self.node_kind(), ?node, "spawned node");
        Some(NodeRef { graph, node })
    }
}
