//! The action catalog: every node spawn descriptor the editor can offer.
//!
//! Entries are keyed by [`ActionKey`]. A class entry is rebuilt wholesale by
//! [`ActionCatalog::refresh_class_actions`]; node type and asset entries by
//! [`ActionCatalog::refresh_node_type_actions`]. Every non-empty refreshed
//! entry is handed to the [`IncrementalPrimer`].
//!
//! The catalog is **not thread-safe**: it is owned by one editor
//! session and mutated in place.
//!
//! # Example
//!
//! ```
//! use kismet_core::{ClassInfo, FunctionFlags, FunctionInfo, MetadataRegistry, NodeTypeRegistry};
//! use kismet_registry::{ActionCatalog, ActionEnv, ActionKey};
//!
//! let mut metadata = MetadataRegistry::new();
//! let actor = metadata.add_class(ClassInfo::new("Actor"));
//! metadata.add_function(FunctionInfo::new(actor, "Jump").with_flags(FunctionFlags::BLUEPRINT_CALLABLE));
//! let node_types = NodeTypeRegistry::with_defaults();
//! let env = ActionEnv::new(&metadata, &node_types);
//!
//! let mut catalog = ActionCatalog::new();
//! catalog.refresh_class_actions(&env, actor);
//! assert_eq!(catalog.actions(ActionKey::Class(actor)).len(), 1);
//! ```

use std::time::Duration;

use kismet_core::{NodeKind, TypeHash};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::discovery::{class_actions, node_type_actions};
use crate::{Action, ActionEnv, ActionKey, IncrementalPrimer};

/// Database of discovered actions.
#[derive(Debug, Default)]
pub struct ActionCatalog {
    entries: FxHashMap<ActionKey, Vec<Action>>,
    primer: IncrementalPrimer,
    populated: bool,
}

impl ActionCatalog {
    /// Create an empty catalog with the default primer.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primer(primer: IncrementalPrimer) -> Self {
        Self {
            primer,
            ..Self::default()
        }
    }

    // ==========================================================================
    // Refresh
    // ==========================================================================

    /// Rebuild the entry of `class` from its current metadata.
    ///
    /// Ignorable classes lose their entry; classes without actions get none.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn refresh_class_actions(&mut self, env: &ActionEnv<'_>, class: TypeHash) {
        let key = ActionKey::Class(class);
        if env.metadata.is_ignorable(class) {
            debug!(?class, "skipping ignorable class");
            self.remove_entry(key);
            return;
        }
        let actions = class_actions(env, class);
        debug!(?class, count = actions.len(), "refreshed class actions");
        self.set_entry(key, actions);
    }

    /// Refresh the classes generated from `blueprint`.
    pub fn refresh_blueprint_actions(&mut self, env: &ActionEnv<'_>, blueprint: TypeHash) {
        let Some(info) = env.metadata.blueprint(blueprint) else {
            return;
        };
        let classes: Vec<TypeHash> = [info.skeleton_class, info.generated_class]
            .into_iter()
            .flatten()
            .collect();
        for class in classes {
            self.refresh_class_actions(env, class);
        }
    }

    /// Rebuild the node type and asset actions contributed by `kind`.
    ///
    /// Autonomous actions keyed to a class are rebuilt with that class.
    pub fn refresh_node_type_actions(&mut self, env: &ActionEnv<'_>, kind: NodeKind) {
        self.entries.remove(&ActionKey::NodeType(kind));
        for (key, actions) in self.entries.iter_mut() {
            if matches!(key, ActionKey::Asset(_)) {
                actions.retain(|a| a.node_kind() != kind);
            }
        }
        self.entries.retain(|_, actions| !actions.is_empty());

        let mut touched = Vec::new();
        for (key, action) in node_type_actions(env, kind) {
            if matches!(key, ActionKey::Class(_)) {
                continue;
            }
            self.entries.entry(key).or_default().push(action);
            if !touched.contains(&key) {
                touched.push(key);
            }
        }
        for key in touched {
            self.primer.enqueue(key);
        }
    }

    /// Rebuild every entry.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn refresh_all(&mut self, env: &ActionEnv<'_>) {
        self.entries.clear();
        self.primer.clear();
        for class in env.metadata.class_hashes() {
            self.refresh_class_actions(env, class);
        }
        for &kind in env.node_types.kinds() {
            self.refresh_node_type_actions(env, kind);
        }
        self.populated = true;
        info!(
            entries = self.entries.len(),
            actions = self.action_count(),
            "action catalog refreshed"
        );
    }

    /// All entries, refreshing everything first if the catalog was never populated.
    pub fn get_all_actions(&mut self, env: &ActionEnv<'_>) -> &FxHashMap<ActionKey, Vec<Action>> {
        if !self.populated {
            self.refresh_all(env);
        }
        &self.entries
    }

    /// Remove the entry of `class`. Returns whether it existed.
    pub fn clear_class_actions(&mut self, class: TypeHash) -> bool {
        self.remove_entry(ActionKey::Class(class))
    }

    /// Drop cached signatures of actions bound to `field`, e.g. after a rename.
    pub fn invalidate_signatures(&self, field: TypeHash) {
        for action in self.entries.values().flatten() {
            if action.member_field() == Some(field) || action.component() == Some(field) {
                action.invalidate_signature();
            }
        }
    }

    /// Spend part of a frame priming template nodes.
    pub fn tick(&mut self, env: &ActionEnv<'_>, delta: Duration) -> usize {
        self.primer.tick(env, &self.entries, delta)
    }

    /// Drop every entry and pending priming work.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.primer.clear();
        self.populated = false;
    }

    fn set_entry(&mut self, key: ActionKey, actions: Vec<Action>) {
        if actions.is_empty() {
            self.remove_entry(key);
        } else {
            self.entries.insert(key, actions);
            self.primer.enqueue(key);
        }
    }

    fn remove_entry(&mut self, key: ActionKey) -> bool {
        self.primer.remove(key);
        self.entries.remove(&key).is_some()
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    /// Actions of one entry, empty if absent.
    pub fn actions(&self, key: ActionKey) -> &[Action] {
        self.entries.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, key: ActionKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Entry keys in sorted order.
    pub fn keys(&self) -> Vec<ActionKey> {
        let mut keys: Vec<ActionKey> = self.entries.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Every action with its entry key, entries in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (ActionKey, &Action)> {
        self.keys()
            .into_iter()
            .flat_map(move |key| self.actions(key).iter().map(move |a| (key, a)))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of actions across all entries.
    pub fn action_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    pub fn primer(&self) -> &IncrementalPrimer {
        &self.primer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primer::tests::StepClock;
    use crate::{MenuSignature, PrimerConfig, SpawnerKind};
    use kismet_core::{
        ClassFlags, ClassInfo, EnumInfo, FunctionFlags, FunctionInfo, MetadataRegistry,
        NodeTypeRegistry, PinType, PropertyFlags, PropertyInfo,
    };

    fn actor_metadata() -> (MetadataRegistry, TypeHash, TypeHash) {
        let mut metadata = MetadataRegistry::new();
        let actor = metadata.add_class(ClassInfo::new("Actor"));
        let jump = metadata.add_function(
            FunctionInfo::new(actor, "Jump").with_flags(FunctionFlags::BLUEPRINT_CALLABLE),
        );
        metadata.add_property(
            PropertyInfo::new(actor, "Speed", PinType::float())
                .with_flags(PropertyFlags::BLUEPRINT_VISIBLE),
        );
        (metadata, actor, jump)
    }

    fn shape(actions: &[Action]) -> Vec<(NodeKind, SpawnerKind, Option<TypeHash>)> {
        actions
            .iter()
            .map(|a| (a.node_kind(), a.spawner(), a.member_field()))
            .collect()
    }

    #[test]
    fn refresh_is_idempotent() {
        let (metadata, actor, _) = actor_metadata();
        let node_types = NodeTypeRegistry::with_defaults();
        let env = ActionEnv::new(&metadata, &node_types);
        let mut catalog = ActionCatalog::new();

        catalog.refresh_class_actions(&env, actor);
        let first = shape(catalog.actions(ActionKey::Class(actor)));
        catalog.refresh_class_actions(&env, actor);
        let second = shape(catalog.actions(ActionKey::Class(actor)));

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn refresh_replaces_wholesale() {
        let (mut metadata, actor, jump) = actor_metadata();
        let node_types = NodeTypeRegistry::with_defaults();
        let mut catalog = ActionCatalog::new();
        catalog.refresh_class_actions(&ActionEnv::new(&metadata, &node_types), actor);

        metadata.remove_function(jump);
        catalog.refresh_class_actions(&ActionEnv::new(&metadata, &node_types), actor);
        assert!(
            catalog
                .actions(ActionKey::Class(actor))
                .iter()
                .all(|a| a.function().is_none())
        );
    }

    #[test]
    fn ignorable_classes_lose_their_entry() {
        let (mut metadata, actor, _) = actor_metadata();
        let node_types = NodeTypeRegistry::with_defaults();
        let mut catalog = ActionCatalog::new();
        catalog.refresh_class_actions(&ActionEnv::new(&metadata, &node_types), actor);
        assert!(catalog.contains(ActionKey::Class(actor)));

        metadata.mark_stale(actor);
        catalog.refresh_class_actions(&ActionEnv::new(&metadata, &node_types), actor);
        assert!(!catalog.contains(ActionKey::Class(actor)));
    }

    #[test]
    fn get_all_actions_populates_once() {
        let (mut metadata, actor, _) = actor_metadata();
        metadata.add_enum(EnumInfo::new("EColor", &["Red", "Green"]));
        let node_types = NodeTypeRegistry::with_defaults();
        let mut catalog = ActionCatalog::new();
        let env = ActionEnv::new(&metadata, &node_types);

        assert!(!catalog.is_populated());
        let count = catalog.get_all_actions(&env).len();
        assert!(catalog.is_populated());
        assert!(catalog.contains(ActionKey::Class(actor)));
        assert!(catalog.contains(ActionKey::NodeType(NodeKind::ExecutionSequence)));
        assert_eq!(
            catalog
                .actions(ActionKey::Asset(TypeHash::from_name("EColor")))
                .len(),
            5
        );

        catalog.clear_class_actions(actor);
        assert_eq!(catalog.get_all_actions(&env).len(), count - 1);
    }

    #[test]
    fn node_type_refresh_keeps_other_kinds() {
        let mut metadata = MetadataRegistry::new();
        let color = metadata.add_enum(EnumInfo::new("EColor", &["Red"]));
        let node_types = NodeTypeRegistry::with_defaults();
        let env = ActionEnv::new(&metadata, &node_types);
        let mut catalog = ActionCatalog::new();
        catalog.refresh_all(&env);

        catalog.refresh_node_type_actions(&env, NodeKind::EnumLiteral);
        let kinds: Vec<NodeKind> = catalog
            .actions(ActionKey::Asset(color))
            .iter()
            .map(Action::node_kind)
            .collect();
        assert_eq!(kinds.len(), 5);
        assert_eq!(kinds.iter().filter(|k| **k == NodeKind::EnumLiteral).count(), 1);
    }

    #[test]
    fn rename_invalidates_signatures() {
        let (mut metadata, actor, jump) = actor_metadata();
        let node_types = NodeTypeRegistry::with_defaults();
        let mut catalog = ActionCatalog::new();
        {
            let env = ActionEnv::new(&metadata, &node_types);
            catalog.refresh_class_actions(&env, actor);
            assert_eq!(catalog.actions(ActionKey::Class(actor))[0].signature(&env).name, "Jump");
        }

        metadata.rename_function(jump, "Hop");
        catalog.invalidate_signatures(jump);
        let env = ActionEnv::new(&metadata, &node_types);
        assert_eq!(
            catalog.actions(ActionKey::Class(actor))[0].signature(&env),
            MenuSignature {
                name: "Hop".into(),
                category: "Actor".into()
            }
        );
    }

    #[test]
    fn tick_primes_refreshed_entries() {
        let (metadata, actor, _) = actor_metadata();
        let node_types = NodeTypeRegistry::with_defaults();
        let env = ActionEnv::new(&metadata, &node_types);
        let primer = IncrementalPrimer::with_clock(PrimerConfig::default(), StepClock::new(Duration::ZERO));
        let mut catalog = ActionCatalog::with_primer(primer);

        catalog.refresh_class_actions(&env, actor);
        assert_eq!(catalog.primer().pending(), 1);
        assert_eq!(catalog.tick(&env, Duration::from_millis(100)), 3);
        assert!(catalog.iter().all(|(_, a)| a.is_primed()));
        assert!(catalog.primer().is_idle());
    }

    #[test]
    fn skeleton_refresh_via_blueprint() {
        let mut metadata = MetadataRegistry::new();
        let actor = metadata.add_class(ClassInfo::new("Actor"));
        let skeleton = metadata.add_class(
            ClassInfo::new("SKEL_Door_C")
                .with_super(actor)
                .with_flags(ClassFlags::BLUEPRINT_GENERATED | ClassFlags::SKELETON),
        );
        metadata.add_function(
            FunctionInfo::new(skeleton, "Open").with_flags(FunctionFlags::BLUEPRINT_CALLABLE),
        );
        let generated = metadata.add_class(
            ClassInfo::new("Door_C")
                .with_super(actor)
                .with_flags(ClassFlags::BLUEPRINT_GENERATED),
        );
        let mut info = kismet_core::BlueprintInfo::new("Door", actor);
        info.skeleton_class = Some(skeleton);
        info.generated_class = Some(generated);
        let blueprint = metadata.add_blueprint(info);
        let node_types = NodeTypeRegistry::with_defaults();
        let env = ActionEnv::new(&metadata, &node_types);

        let mut catalog = ActionCatalog::new();
        catalog.refresh_blueprint_actions(&env, blueprint);
        assert!(catalog.contains(ActionKey::Class(skeleton)));
        assert!(!catalog.contains(ActionKey::Class(generated)));
    }
}
