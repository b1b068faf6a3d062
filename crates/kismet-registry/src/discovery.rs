//! Discovery passes that build the actions of a catalog entry.
//!
//! A class entry is produced by running, in order, the function, property,
//! enum, struct, cast, component class and blueprint graph passes over the
//! class's own fields, then adding the async action factories it declares.

use kismet_core::{
    ClassFlags, FunctionFlags, LocalVariableRef, MacroGraphRef, NodeKind, NodeTypeFlags,
    PinCategory, PropertyFlags, StructFlags, TypeHash,
};
use tracing::warn;

use crate::{Action, ActionEnv, ActionKey};

/// Node kinds that operate on an enum type.
const ENUM_NODE_KINDS: &[NodeKind] = &[
    NodeKind::GetNumEnumEntries,
    NodeKind::ForEachElementInEnum,
    NodeKind::EnumLiteral,
    NodeKind::CastByteToEnum,
    NodeKind::SwitchEnum,
];

/// Node kinds that describe themselves with a single plain action.
const STANDALONE_NODE_KINDS: &[NodeKind] = &[
    NodeKind::Comment,
    NodeKind::Documentation,
    NodeKind::ExecutionSequence,
    NodeKind::IfThenElse,
    NodeKind::MultiGate,
    NodeKind::MakeArray,
    NodeKind::MathExpression,
];

/// Every action discovered on `class`, in catalog order.
#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn class_actions(env: &ActionEnv<'_>, class: TypeHash) -> Vec<Action> {
    let metadata = env.metadata;
    let mut actions = Vec::new();

    function_pass(env, class, &mut actions);
    property_pass(env, class, &mut actions);
    for &enum_type in metadata.nested_enums(class) {
        enum_actions(env, enum_type, &mut actions);
    }
    for &struct_type in metadata.nested_structs(class) {
        struct_actions(env, struct_type, &mut actions);
    }
    cast_pass(env, class, &mut actions);
    component_class_pass(env, class, &mut actions);
    graph_pass(env, class, &mut actions);

    // Async factories are the only node type actions keyed to a class.
    if describes_itself(env, NodeKind::AsyncAction) {
        actions.extend(async_factories_of(env, class));
    }
    actions
}

// ==========================================================================
// Member passes
// ==========================================================================

fn function_pass(env: &ActionEnv<'_>, class: TypeHash, actions: &mut Vec<Action>) {
    let metadata = env.metadata;
    let is_interface = metadata.class(class).is_some_and(|c| c.is_interface());

    for &hash in metadata.own_functions(class) {
        let Some(function) = metadata.function(hash) else {
            warn!(?class, function = ?hash, "skipping unresolved function");
            continue;
        };
        if function.can_be_placed_as_event() {
            actions.push(Action::event(hash));
        }
        if function.is_blueprint_callable() {
            actions.push(Action::function(hash));
            if is_interface {
                actions.push(Action::message(hash));
            }
        }
    }
}

fn property_pass(env: &ActionEnv<'_>, class: TypeHash, actions: &mut Vec<Action>) {
    let metadata = env.metadata;
    let is_component = metadata.chain_has_flags(class, ClassFlags::ACTOR_COMPONENT);
    let is_actor = metadata.chain_has_flags(class, ClassFlags::ACTOR);

    for &hash in metadata.own_properties(class) {
        let Some(property) = metadata.property(hash) else {
            warn!(?class, property = ?hash, "skipping unresolved property");
            continue;
        };
        if !property.is_blueprint_visible() {
            continue;
        }

        if property.is_multicast_delegate() {
            if property.has_flags(PropertyFlags::ASSIGNABLE) {
                actions.push(Action::property(NodeKind::AddDelegate, hash));
            }
            if property.has_flags(PropertyFlags::CALLABLE) {
                actions.push(Action::property(NodeKind::CallDelegate, hash));
            }
            actions.push(Action::property(NodeKind::RemoveDelegate, hash));
            actions.push(Action::property(NodeKind::ClearDelegate, hash));
            if is_actor && !is_component {
                actions.push(Action::actor_bound_event(hash));
            }
            continue;
        }

        actions.push(Action::property(NodeKind::VariableGet, hash));
        actions.push(Action::property(NodeKind::VariableSet, hash));

        if let Some(component_class) = property.object_class()
            && metadata.chain_has_flags(component_class, ClassFlags::ACTOR_COMPONENT)
        {
            bound_actions(env, hash, component_class, actions);
        }
    }
}

/// Bound events for the component's delegates and bound calls for its
/// callable functions, inherited members included.
fn bound_actions(
    env: &ActionEnv<'_>,
    component: TypeHash,
    component_class: TypeHash,
    actions: &mut Vec<Action>,
) {
    let metadata = env.metadata;

    for delegate in metadata.all_properties(component_class) {
        if metadata
            .property(delegate)
            .is_some_and(|p| p.is_multicast_delegate() && p.is_blueprint_visible())
        {
            actions.push(Action::bound_event(component, delegate));
        }
    }
    for function in metadata.all_functions(component_class) {
        if metadata.function(function).is_some_and(|f| {
            f.is_blueprint_callable() && (!f.is_pure() || f.has_flags(FunctionFlags::CONST))
        }) {
            actions.push(Action::bound_call(component, function));
        }
    }
}

// ==========================================================================
// Type passes
// ==========================================================================

fn enum_actions(env: &ActionEnv<'_>, enum_type: TypeHash, actions: &mut Vec<Action>) {
    match env.metadata.enum_info(enum_type) {
        Some(info) if info.blueprint_type => {}
        Some(_) => return,
        None => {
            warn!(enum_type = ?enum_type, "skipping unresolved enum");
            return;
        }
    }
    for &kind in ENUM_NODE_KINDS {
        actions.push(enum_action(kind, enum_type));
    }
}

fn enum_action(kind: NodeKind, enum_type: TypeHash) -> Action {
    Action::node(kind).with_customize(move |config, _| {
        config.enum_type = Some(enum_type);
        if kind == NodeKind::CastByteToEnum {
            config.safe_cast = true;
        }
    })
}

fn struct_actions(env: &ActionEnv<'_>, struct_type: TypeHash, actions: &mut Vec<Action>) {
    let Some(info) = env.metadata.struct_info(struct_type) else {
        warn!(struct_type = ?struct_type, "skipping unresolved struct");
        return;
    };
    if !info.flags.contains(StructFlags::BLUEPRINT_TYPE) {
        return;
    }

    let mut kinds = Vec::new();
    if info.flags.contains(StructFlags::BREAKABLE) {
        kinds.push(NodeKind::BreakStruct);
    }
    if info.flags.contains(StructFlags::MAKEABLE) {
        kinds.extend([NodeKind::MakeStruct, NodeKind::SetFieldsInStruct]);
    }
    for kind in kinds {
        actions.push(
            Action::node(kind).with_customize(move |config, _| config.struct_type = Some(struct_type)),
        );
    }
}

fn cast_pass(env: &ActionEnv<'_>, class: TypeHash, actions: &mut Vec<Action>) {
    if !env.metadata.is_allowable_variable_class(class) {
        return;
    }
    for kind in [NodeKind::DynamicCast, NodeKind::ClassDynamicCast] {
        actions.push(
            Action::node(kind).with_customize(move |config, _| config.target_class = Some(class)),
        );
    }
}

/// Concrete component classes marked spawnable get an add-component action.
fn component_class_pass(env: &ActionEnv<'_>, class: TypeHash, actions: &mut Vec<Action>) {
    let metadata = env.metadata;
    let Some(info) = metadata.class(class) else {
        return;
    };
    if info.has_flags(ClassFlags::ABSTRACT)
        || !info.has_flags(ClassFlags::SPAWNABLE_COMPONENT)
        || !metadata.chain_has_flags(class, ClassFlags::ACTOR_COMPONENT)
    {
        return;
    }
    actions.push(
        Action::node(NodeKind::AddComponent)
            .with_customize(move |config, _| config.target_class = Some(class)),
    );
}

/// Macro instances and local variables of the blueprint behind a skeleton class.
fn graph_pass(env: &ActionEnv<'_>, class: TypeHash, actions: &mut Vec<Action>) {
    let metadata = env.metadata;
    let Some(info) = metadata.class(class) else {
        return;
    };
    if !info.has_flags(ClassFlags::BLUEPRINT_GENERATED) {
        return;
    }
    let Some(blueprint) = info.blueprint.and_then(|b| metadata.blueprint(b)) else {
        return;
    };

    for graph in &blueprint.macro_graphs {
        actions.push(Action::macro_instance(MacroGraphRef {
            blueprint: blueprint.hash,
            graph: graph.name.clone(),
        }));
    }
    for graph in &blueprint.function_graphs {
        for local in &graph.locals {
            let variable = LocalVariableRef {
                blueprint: blueprint.hash,
                graph: graph.name.clone(),
                name: local.name.clone(),
            };
            actions.push(Action::local_variable(NodeKind::VariableGet, variable.clone()));
            actions.push(Action::local_variable(NodeKind::VariableSet, variable));
        }
    }
}

// ==========================================================================
// Autonomous actions
// ==========================================================================

/// Self-describing actions a node type contributes, with the entry each
/// belongs to.
#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn node_type_actions(env: &ActionEnv<'_>, kind: NodeKind) -> Vec<(ActionKey, Action)> {
    let metadata = env.metadata;
    if !describes_itself(env, kind) {
        return Vec::new();
    }

    if STANDALONE_NODE_KINDS.contains(&kind) {
        return vec![(ActionKey::NodeType(kind), Action::node(kind))];
    }

    if ENUM_NODE_KINDS.contains(&kind) {
        return metadata
            .global_enums()
            .into_iter()
            .filter(|e| metadata.enum_info(*e).is_some_and(|e| e.blueprint_type))
            .map(|e| (ActionKey::Asset(e), enum_action(kind, e)))
            .collect();
    }

    match kind {
        NodeKind::BreakStruct | NodeKind::MakeStruct | NodeKind::SetFieldsInStruct => {
            let required = if kind == NodeKind::BreakStruct {
                StructFlags::BREAKABLE
            } else {
                StructFlags::MAKEABLE
            };
            metadata
                .global_structs()
                .into_iter()
                .filter(|s| {
                    metadata
                        .struct_info(*s)
                        .is_some_and(|s| s.flags.contains(StructFlags::BLUEPRINT_TYPE | required))
                })
                .map(|s| {
                    let action =
                        Action::node(kind).with_customize(move |config, _| config.struct_type = Some(s));
                    (ActionKey::Asset(s), action)
                })
                .collect()
        }
        NodeKind::AsyncAction => async_action_factories(env),
        _ => Vec::new(),
    }
}

/// Registered kinds that are neither abstract nor internal.
fn describes_itself(env: &ActionEnv<'_>, kind: NodeKind) -> bool {
    env.node_types.info(kind).is_some_and(|info| {
        !info
            .flags
            .intersects(NodeTypeFlags::ABSTRACT | NodeTypeFlags::INTERNAL)
    })
}

fn async_action_factories(env: &ActionEnv<'_>) -> Vec<(ActionKey, Action)> {
    env.metadata
        .class_hashes()
        .into_iter()
        .flat_map(|class| {
            async_factories_of(env, class)
                .into_iter()
                .map(move |action| (ActionKey::Class(class), action))
        })
        .collect()
}

/// Static internal factories of `class` that return an instance of it, when
/// `class` is a concrete async action class.
fn async_factories_of(env: &ActionEnv<'_>, class: TypeHash) -> Vec<Action> {
    let metadata = env.metadata;
    if metadata.is_ignorable(class)
        || !metadata.chain_has_flags(class, ClassFlags::ASYNC_ACTION)
        || metadata
            .class(class)
            .is_some_and(|c| c.has_flags(ClassFlags::ABSTRACT))
    {
        return Vec::new();
    }

    let mut actions = Vec::new();
    for &hash in metadata.own_functions(class) {
        let Some(function) = metadata.function(hash) else {
            continue;
        };
        let is_factory = function.is_static()
            && function.has_flags(FunctionFlags::INTERNAL_USE_ONLY)
            && function.return_param().is_some_and(|r| {
                r.pin_type.category == PinCategory::Object
                    && r.pin_type
                        .sub_object
                        .is_some_and(|c| metadata.is_child_of(c, class))
            });
        if is_factory {
            actions.push(
                Action::node(NodeKind::AsyncAction)
                    .with_customize(move |config, _| config.function = Some(hash)),
            );
        }
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoundField, SpawnerKind};
    use kismet_core::{
        BlueprintInfo, ClassInfo, EnumInfo, FunctionInfo, LocalVariableInfo, MetadataRegistry,
        NodeTypeRegistry, PinType, PropertyInfo, StructInfo,
    };

    fn kinds(actions: &[Action]) -> Vec<NodeKind> {
        actions.iter().map(|a| a.node_kind()).collect()
    }

    #[test]
    fn function_pass_emits_events_calls_and_messages() {
        let mut metadata = MetadataRegistry::new();
        let iface = metadata.add_class(ClassInfo::new("Interactable").with_flags(ClassFlags::INTERFACE));
        metadata.add_function(
            FunctionInfo::new(iface, "Interact")
                .with_flags(FunctionFlags::BLUEPRINT_CALLABLE | FunctionFlags::BLUEPRINT_EVENT),
        );
        metadata.add_function(
            FunctionInfo::new(iface, "Hidden")
                .with_flags(FunctionFlags::BLUEPRINT_CALLABLE | FunctionFlags::INTERNAL_USE_ONLY),
        );
        let node_types = NodeTypeRegistry::with_defaults();
        let env = ActionEnv::new(&metadata, &node_types);

        let actions = class_actions(&env, iface);
        assert_eq!(
            actions.iter().map(|a| a.spawner()).collect::<Vec<_>>(),
            vec![SpawnerKind::Event, SpawnerKind::Function, SpawnerKind::Message]
        );
    }

    #[test]
    fn property_pass_branches_on_kind() {
        let mut metadata = MetadataRegistry::new();
        let actor = metadata.add_class(ClassInfo::new("Actor"));
        let sig = metadata.add_function(FunctionInfo::new(actor, "OnDiedSignature").with_flags(FunctionFlags::DELEGATE));
        metadata.add_property(
            PropertyInfo::new(actor, "Health", PinType::float())
                .with_flags(PropertyFlags::BLUEPRINT_VISIBLE),
        );
        metadata.add_property(
            PropertyInfo::new(actor, "OnDied", PinType::multicast_delegate(sig))
                .with_flags(PropertyFlags::ASSIGNABLE | PropertyFlags::CALLABLE),
        );
        metadata.add_property(PropertyInfo::new(actor, "Secret", PinType::int()));
        let node_types = NodeTypeRegistry::with_defaults();
        let env = ActionEnv::new(&metadata, &node_types);

        assert_eq!(
            kinds(&class_actions(&env, actor)),
            vec![
                NodeKind::VariableGet,
                NodeKind::VariableSet,
                NodeKind::AddDelegate,
                NodeKind::CallDelegate,
                NodeKind::RemoveDelegate,
                NodeKind::ClearDelegate,
            ]
        );
    }

    #[test]
    fn component_properties_add_bound_actions() {
        let mut metadata = MetadataRegistry::new();
        let base = metadata.add_class(ClassInfo::new("ActorComponent").with_flags(ClassFlags::ACTOR_COMPONENT));
        let sig = metadata.add_function(FunctionInfo::new(base, "HitSignature").with_flags(FunctionFlags::DELEGATE));
        let on_hit = metadata.add_property(
            PropertyInfo::new(base, "OnHit", PinType::multicast_delegate(sig))
                .with_flags(PropertyFlags::ASSIGNABLE),
        );
        let mesh = metadata.add_class(ClassInfo::new("MeshComponent").with_super(base));
        let set_mesh = metadata.add_function(
            FunctionInfo::new(mesh, "SetMesh").with_flags(FunctionFlags::BLUEPRINT_CALLABLE),
        );
        metadata.add_function(
            FunctionInfo::new(mesh, "GetBounds")
                .with_flags(FunctionFlags::BLUEPRINT_CALLABLE | FunctionFlags::PURE),
        );
        let actor = metadata.add_class(ClassInfo::new("Actor"));
        let component = metadata.add_property(
            PropertyInfo::new(actor, "Mesh", PinType::object(mesh))
                .with_flags(PropertyFlags::BLUEPRINT_VISIBLE),
        );
        let node_types = NodeTypeRegistry::with_defaults();
        let env = ActionEnv::new(&metadata, &node_types);

        let actions = class_actions(&env, actor);
        assert_eq!(
            kinds(&actions),
            vec![
                NodeKind::VariableGet,
                NodeKind::VariableSet,
                NodeKind::ComponentBoundEvent,
                NodeKind::CallFunction,
            ]
        );
        assert_eq!(actions[2].field(), Some(&BoundField::Property(on_hit)));
        assert_eq!(actions[2].component(), Some(component));
        assert_eq!(actions[3].function(), Some(set_mesh));
        assert_eq!(actions[3].spawner(), SpawnerKind::BoundCall);
    }

    #[test]
    fn actor_delegates_get_actor_bound_events() {
        let mut metadata = MetadataRegistry::new();
        let actor = metadata.add_class(ClassInfo::new("Actor").with_flags(ClassFlags::ACTOR));
        let pawn = metadata.add_class(ClassInfo::new("Pawn").with_super(actor));
        let sig = metadata.add_function(FunctionInfo::new(pawn, "Signature").with_flags(FunctionFlags::DELEGATE));
        let on_landed = metadata.add_property(
            PropertyInfo::new(pawn, "OnLanded", PinType::multicast_delegate(sig))
                .with_flags(PropertyFlags::ASSIGNABLE),
        );
        metadata.add_property(
            PropertyInfo::new(pawn, "OnBroadcastOnly", PinType::multicast_delegate(sig))
                .with_flags(PropertyFlags::CALLABLE),
        );
        let node_types = NodeTypeRegistry::with_defaults();
        let env = ActionEnv::new(&metadata, &node_types);

        let actions = class_actions(&env, pawn);
        assert_eq!(
            kinds(&actions),
            vec![
                NodeKind::AddDelegate,
                NodeKind::RemoveDelegate,
                NodeKind::ClearDelegate,
                NodeKind::ActorBoundEvent,
                NodeKind::CallDelegate,
                NodeKind::RemoveDelegate,
                NodeKind::ClearDelegate,
                NodeKind::ActorBoundEvent,
            ]
        );
        assert_eq!(actions[3].property(), Some(on_landed));
        assert_eq!(actions[3].spawner(), SpawnerKind::BoundEvent);
        assert_eq!(actions[3].component(), None);
    }

    #[test]
    fn spawnable_component_classes_add_components() {
        let mut metadata = MetadataRegistry::new();
        let base = metadata.add_class(
            ClassInfo::new("ActorComponent")
                .with_flags(ClassFlags::ACTOR_COMPONENT | ClassFlags::ABSTRACT | ClassFlags::SPAWNABLE_COMPONENT),
        );
        let light = metadata.add_class(
            ClassInfo::new("LightComponent")
                .with_super(base)
                .with_flags(ClassFlags::SPAWNABLE_COMPONENT),
        );
        let internal = metadata.add_class(ClassInfo::new("InternalComponent").with_super(base));
        let loose = metadata.add_class(ClassInfo::new("Widget").with_flags(ClassFlags::SPAWNABLE_COMPONENT));
        let node_types = NodeTypeRegistry::with_defaults();
        let env = ActionEnv::new(&metadata, &node_types);

        let actions = class_actions(&env, light);
        assert_eq!(kinds(&actions), vec![NodeKind::AddComponent]);
        assert_eq!(actions[0].config(false).target_class, Some(light));
        assert!(class_actions(&env, base).is_empty());
        assert!(class_actions(&env, internal).is_empty());
        assert!(class_actions(&env, loose).is_empty());
    }

    #[test]
    fn nested_types_and_casts() {
        let mut metadata = MetadataRegistry::new();
        let pawn = metadata.add_class(ClassInfo::new("Pawn").with_flags(ClassFlags::BLUEPRINT_TYPE));
        metadata.add_enum(EnumInfo::new("EMode", &["Walk", "Fly"]).nested_in(pawn));
        metadata.add_enum(EnumInfo::new("EInternal", &["A"]).nested_in(pawn).hidden());
        metadata.add_struct(
            StructInfo::new("FStats")
                .nested_in(pawn)
                .with_flags(StructFlags::BLUEPRINT_TYPE | StructFlags::BREAKABLE),
        );
        let node_types = NodeTypeRegistry::with_defaults();
        let env = ActionEnv::new(&metadata, &node_types);

        assert_eq!(
            kinds(&class_actions(&env, pawn)),
            vec![
                NodeKind::GetNumEnumEntries,
                NodeKind::ForEachElementInEnum,
                NodeKind::EnumLiteral,
                NodeKind::CastByteToEnum,
                NodeKind::SwitchEnum,
                NodeKind::BreakStruct,
                NodeKind::DynamicCast,
                NodeKind::ClassDynamicCast,
            ]
        );
        let byte_cast = &class_actions(&env, pawn)[3];
        assert!(byte_cast.config(false).safe_cast);
    }

    #[test]
    fn graph_pass_reads_skeleton_blueprint() {
        let mut metadata = MetadataRegistry::new();
        let actor = metadata.add_class(ClassInfo::new("Actor"));
        let skeleton = metadata.add_class(
            ClassInfo::new("SKEL_Door_C")
                .with_super(actor)
                .with_flags(ClassFlags::BLUEPRINT_GENERATED | ClassFlags::SKELETON | ClassFlags::NOT_BLUEPRINT_TYPE),
        );
        let mut info = BlueprintInfo::new("Door", actor)
            .with_macro("Toggle", Vec::new(), Vec::new())
            .with_function_graph(
                "Open",
                vec![LocalVariableInfo {
                    name: "Angle".into(),
                    pin_type: PinType::float(),
                }],
            );
        info.skeleton_class = Some(skeleton);
        metadata.add_blueprint(info);
        let node_types = NodeTypeRegistry::with_defaults();
        let env = ActionEnv::new(&metadata, &node_types);

        let actions = class_actions(&env, skeleton);
        assert_eq!(
            actions.iter().map(|a| a.spawner()).collect::<Vec<_>>(),
            vec![SpawnerKind::Macro, SpawnerKind::LocalVariable, SpawnerKind::LocalVariable]
        );
        assert_eq!(actions[1].local_variable().unwrap().name, "Angle");
    }

    #[test]
    fn autonomous_actions() {
        let mut metadata = MetadataRegistry::new();
        let color = metadata.add_enum(EnumInfo::new("EColor", &["Red"]));
        let node_types = NodeTypeRegistry::with_defaults();
        let env = ActionEnv::new(&metadata, &node_types);

        let comment = node_type_actions(&env, NodeKind::Comment);
        assert_eq!(comment.len(), 1);
        assert_eq!(comment[0].0, ActionKey::NodeType(NodeKind::Comment));

        let literal = node_type_actions(&env, NodeKind::EnumLiteral);
        assert_eq!(literal.len(), 1);
        assert_eq!(literal[0].0, ActionKey::Asset(color));

        assert!(node_type_actions(&env, NodeKind::Variable).is_empty());
        assert!(node_type_actions(&env, NodeKind::FunctionEntry).is_empty());
    }

    #[test]
    fn async_factories_key_to_their_class() {
        let mut metadata = MetadataRegistry::new();
        let base = metadata.add_class(ClassInfo::new("AsyncActionBase").with_flags(ClassFlags::ASYNC_ACTION | ClassFlags::ABSTRACT));
        let download = metadata.add_class(ClassInfo::new("AsyncDownload").with_super(base));
        metadata.add_function(
            FunctionInfo::new(download, "DownloadFile")
                .with_flags(FunctionFlags::STATIC | FunctionFlags::INTERNAL_USE_ONLY)
                .with_param("Url", PinType::string())
                .with_return(PinType::object(download)),
        );
        let node_types = NodeTypeRegistry::with_defaults();
        let env = ActionEnv::new(&metadata, &node_types);

        let actions = node_type_actions(&env, NodeKind::AsyncAction);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].0, ActionKey::Class(download));
        assert_eq!(kinds(&class_actions(&env, download)), vec![NodeKind::AsyncAction]);
        assert!(class_actions(&env, base).is_empty());
    }

    #[test]
    fn class_entries_exclude_asset_actions() {
        let mut metadata = MetadataRegistry::new();
        let actor = metadata.add_class(ClassInfo::new("Actor"));
        metadata.add_enum(EnumInfo::new("EColor", &["Red"]));
        metadata.add_struct(
            StructInfo::new("FVector").with_flags(StructFlags::BLUEPRINT_TYPE | StructFlags::MAKEABLE),
        );
        let node_types = NodeTypeRegistry::with_defaults();
        let env = ActionEnv::new(&metadata, &node_types);

        assert!(class_actions(&env, actor).is_empty());
        assert_eq!(node_type_actions(&env, NodeKind::EnumLiteral).len(), 1);
    }

    #[test]
    fn unresolved_fields_are_skipped() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("kismet_registry=warn")
            .try_init();
        let mut metadata = MetadataRegistry::new();
        let actor = metadata.add_class(ClassInfo::new("Actor"));
        let gone = metadata.add_function(
            FunctionInfo::new(actor, "Gone").with_flags(FunctionFlags::BLUEPRINT_CALLABLE),
        );
        metadata.add_function(
            FunctionInfo::new(actor, "Kept").with_flags(FunctionFlags::BLUEPRINT_CALLABLE),
        );
        metadata.remove_function(gone);
        metadata.class_mut(actor).unwrap().functions.insert(0, gone);
        let node_types = NodeTypeRegistry::with_defaults();
        let env = ActionEnv::new(&metadata, &node_types);

        assert_eq!(class_actions(&env, actor).len(), 1);
    }
}
