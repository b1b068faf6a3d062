//! Built-in rejection tests.
//!
//! Each test returns `true` to exclude the action. They are registered in
//! [`BUILTIN_TESTS`] order, so the last one listed runs first.

use kismet_core::{
    ClassFlags, FunctionFlags, FunctionInfo, MetadataProvider, NodeKind, Pin, PinCategory,
    PinType, PropertyFlags, PropertyInfo, TypeHash, pin_types_compatible,
};

use super::{ActionFilter, FilterFlags};
use crate::{Action, ActionEnv, BoundField, SpawnerKind};

pub(crate) type RejectionFn = fn(&ActionFilter, &ActionEnv<'_>, &Action) -> bool;

/// Built-in tests, most expensive first.
pub(crate) const BUILTIN_TESTS: &[RejectionFn] = &[
    is_pin_shape_mismatch,
    is_property_type_mismatch,
    is_function_param_mismatch,
    is_impure_in_pure_graph,
    is_hidden_by_category,
    is_excluded_global_field,
    is_access_violation,
    is_non_subclass_cast,
    is_unimplementable_event,
    is_read_only_setter,
    is_restricted_class,
    is_incompatible_with_graph,
    is_incompatible_with_schema,
    is_deprecated,
    is_rejected_node_type,
    is_outside_target_classes,
    is_missing_binding,
    is_foreign_local_variable,
];

// ==========================================================================
// Helpers
// ==========================================================================

fn bound_function<'m>(env: &ActionEnv<'m>, action: &Action) -> Option<&'m FunctionInfo> {
    action.function().and_then(|f| env.metadata.function(f))
}

fn bound_property<'m>(env: &ActionEnv<'m>, action: &Action) -> Option<&'m PropertyInfo> {
    action.property().and_then(|p| env.metadata.property(p))
}

/// Category, owner and visibility flags of the bound member field.
struct MemberField {
    owner: TypeHash,
    category: String,
    is_static: bool,
    is_private: bool,
    is_protected: bool,
    is_deprecated: bool,
}

fn member_field(env: &ActionEnv<'_>, action: &Action) -> Option<MemberField> {
    if let Some(function) = bound_function(env, action) {
        return Some(MemberField {
            owner: function.owner,
            category: function.category.clone(),
            is_static: function.is_static(),
            is_private: function.has_flags(FunctionFlags::PRIVATE),
            is_protected: function.has_flags(FunctionFlags::PROTECTED),
            is_deprecated: function.has_flags(FunctionFlags::DEPRECATED),
        });
    }
    bound_property(env, action).map(|property| MemberField {
        owner: property.owner,
        category: property.category.clone(),
        is_static: false,
        is_private: property.has_flags(PropertyFlags::PRIVATE),
        is_protected: property.has_flags(PropertyFlags::PROTECTED),
        is_deprecated: property.has_flags(PropertyFlags::DEPRECATED),
    })
}

/// Whether `class` is `owner`, derives from it or implements it.
fn inherits(metadata: &dyn MetadataProvider, class: TypeHash, owner: TypeHash) -> bool {
    metadata.is_child_of(class, owner) || metadata.implements_interface(class, owner)
}

/// An object pin whose class can serve as the target of `owner`'s members.
fn is_self_pin_for(metadata: &dyn MetadataProvider, pin: &Pin, owner: TypeHash) -> bool {
    pin.is_output()
        && matches!(
            pin.pin_type.category,
            PinCategory::Object | PinCategory::Interface
        )
        && !pin.pin_type.is_array
        && pin
            .pin_type
            .sub_object
            .is_some_and(|class| inherits(metadata, class, owner))
}

/// Whether a node input of `input` type accepts the context output `pin`,
/// or a node output of `output` type feeds the context input `pin`.
fn accepts(metadata: &dyn MetadataProvider, pin: &Pin, node_pin: &PinType) -> bool {
    if pin.is_output() {
        pin_types_compatible(&pin.pin_type, node_pin, metadata)
    } else {
        pin_types_compatible(node_pin, &pin.pin_type, metadata)
    }
}

// ==========================================================================
// Pin matching
// ==========================================================================

/// No template pin connects to some context pin. Field-less actions only;
/// member actions are matched by the cheaper field tests.
fn is_pin_shape_mismatch(filter: &ActionFilter, env: &ActionEnv<'_>, action: &Action) -> bool {
    if filter.context.pins.is_empty()
        || matches!(
            action.field(),
            Some(BoundField::Function(_) | BoundField::Property(_))
        )
    {
        return false;
    }
    let template = action.template_node().pins(env.metadata);
    filter.context.pins.iter().any(|context_pin| {
        !template.iter().any(|pin| {
            !pin.hidden
                && pin.direction == context_pin.direction.opposite()
                && accepts(env.metadata, context_pin, &pin.pin_type)
        })
    })
}

/// A getter, setter or delegate node of the bound property cannot connect to
/// some context pin.
fn is_property_type_mismatch(filter: &ActionFilter, env: &ActionEnv<'_>, action: &Action) -> bool {
    let kind = action.node_kind();
    if filter.context.pins.is_empty()
        || !(kind.is_child_of(NodeKind::Variable) || kind.is_child_of(NodeKind::BaseDelegate))
        || action.is_bound()
    {
        return false;
    }
    let Some(property) = bound_property(env, action) else {
        return false;
    };
    let metadata = env.metadata;
    let impure = kind != NodeKind::VariableGet;

    filter.context.pins.iter().any(|pin| {
        let matched = if pin.is_exec() {
            impure
        } else if pin.is_output() {
            is_self_pin_for(metadata, pin, property.owner)
                || (kind == NodeKind::VariableSet && accepts(metadata, pin, &property.pin_type))
                || (matches!(kind, NodeKind::AddDelegate | NodeKind::RemoveDelegate)
                    && property
                        .signature()
                        .is_some_and(|sig| accepts(metadata, pin, &PinType::delegate(sig))))
        } else {
            matches!(kind, NodeKind::VariableGet | NodeKind::VariableSet)
                && accepts(metadata, pin, &property.pin_type)
        };
        !matched
    })
}

/// A call or event node of the bound function cannot connect to some
/// context pin.
fn is_function_param_mismatch(filter: &ActionFilter, env: &ActionEnv<'_>, action: &Action) -> bool {
    let kind = action.node_kind();
    if filter.context.pins.is_empty()
        || !(kind.is_child_of(NodeKind::CallFunction) || kind.is_child_of(NodeKind::Event))
    {
        return false;
    }
    let Some(function) = bound_function(env, action) else {
        return false;
    };
    let metadata = env.metadata;
    let is_event = kind.is_child_of(NodeKind::Event);

    filter.context.pins.iter().any(|pin| {
        let matched = if pin.is_exec() {
            if is_event {
                pin.is_input()
            } else {
                !function.is_pure()
            }
        } else if is_event {
            // Event parameters are node outputs.
            pin.is_input()
                && function
                    .input_params()
                    .any(|p| accepts(metadata, pin, &p.pin_type))
        } else if pin.is_output() {
            (!function.is_static() && is_self_pin_for(metadata, pin, function.owner))
                || function
                    .input_params()
                    .any(|p| accepts(metadata, pin, &p.pin_type))
        } else {
            function
                .output_params()
                .any(|p| accepts(metadata, pin, &p.pin_type))
        };
        !matched
    })
}

// ==========================================================================
// Graph and field rules
// ==========================================================================

/// An impure node offered for a graph that only takes pure nodes.
fn is_impure_in_pure_graph(filter: &ActionFilter, env: &ActionEnv<'_>, action: &Action) -> bool {
    if filter.context.graphs.iter().all(|g| g.supports_impure) {
        return false;
    }
    let config = &action.template_node().config;
    env.node_types
        .is_impure(action.node_kind(), config, env.metadata)
}

fn is_hidden_by_category(filter: &ActionFilter, env: &ActionEnv<'_>, action: &Action) -> bool {
    let Some(field) = member_field(env, action) else {
        return false;
    };
    filter
        .effective_target_classes(env)
        .into_iter()
        .any(|class| env.metadata.is_category_hidden(class, &field.category))
}

/// A static field of a class outside the target set, when globals are excluded.
fn is_excluded_global_field(filter: &ActionFilter, env: &ActionEnv<'_>, action: &Action) -> bool {
    if !filter.flags.contains(FilterFlags::EXCLUDE_GLOBAL_FIELDS) {
        return false;
    }
    let Some(field) = member_field(env, action) else {
        return false;
    };
    field.is_static
        && !filter
            .effective_target_classes(env)
            .into_iter()
            .any(|class| inherits(env.metadata, class, field.owner))
}

/// Private members used outside their class, protected members outside
/// subclasses.
fn is_access_violation(filter: &ActionFilter, env: &ActionEnv<'_>, action: &Action) -> bool {
    let Some(field) = member_field(env, action) else {
        return false;
    };
    if !field.is_private && !field.is_protected {
        return false;
    }
    filter.effective_target_classes(env).into_iter().any(|class| {
        if field.is_private {
            class != field.owner
        } else {
            !env.metadata.is_child_of(class, field.owner)
        }
    })
}

/// Cast from a typed output pin to a class that is not a strict subclass of it.
fn is_non_subclass_cast(filter: &ActionFilter, env: &ActionEnv<'_>, action: &Action) -> bool {
    let kind = action.node_kind();
    if !kind.is_child_of(NodeKind::DynamicCast) {
        return false;
    }
    let Some(target) = action.template_node().config.target_class else {
        return false;
    };
    let metadata = env.metadata;
    if metadata.class(target).is_some_and(|c| c.is_interface()) {
        return false;
    }
    let source_category = if kind == NodeKind::ClassDynamicCast {
        PinCategory::Class
    } else {
        PinCategory::Object
    };

    filter.context.pins.iter().any(|pin| {
        pin.is_output()
            && pin.pin_type.category == source_category
            && pin
                .pin_type
                .sub_object
                .is_some_and(|source| source == target || !metadata.is_child_of(target, source))
    })
}

/// Event the target class cannot implement: it does not inherit the owner,
/// or it already declares a function of that name itself.
fn is_unimplementable_event(filter: &ActionFilter, env: &ActionEnv<'_>, action: &Action) -> bool {
    if action.spawner() != SpawnerKind::Event {
        return false;
    }
    let Some(function) = bound_function(env, action) else {
        return false;
    };
    let metadata = env.metadata;
    filter.effective_target_classes(env).into_iter().any(|class| {
        !inherits(metadata, class, function.owner)
            || metadata.own_functions(class).iter().any(|f| {
                metadata
                    .function(*f)
                    .is_some_and(|own| own.name == function.name)
            })
    })
}

fn is_read_only_setter(_filter: &ActionFilter, env: &ActionEnv<'_>, action: &Action) -> bool {
    action.node_kind() == NodeKind::VariableSet
        && bound_property(env, action).is_some_and(|p| p.has_flags(PropertyFlags::READ_ONLY))
}

/// Members of a class restricted to blueprints deriving from specific classes.
fn is_restricted_class(filter: &ActionFilter, env: &ActionEnv<'_>, action: &Action) -> bool {
    let metadata = env.metadata;
    let owner = member_field(env, action)
        .map(|f| f.owner)
        .or(action.template_node().config.target_class);
    let Some(restricted_to) = owner
        .and_then(|o| metadata.class(o))
        .map(|c| &c.restricted_to)
        .filter(|r| !r.is_empty())
    else {
        return false;
    };
    filter.effective_target_classes(env).into_iter().any(|class| {
        !restricted_to
            .iter()
            .any(|allowed| metadata.is_child_of(class, *allowed))
    })
}

fn is_incompatible_with_graph(filter: &ActionFilter, env: &ActionEnv<'_>, action: &Action) -> bool {
    let config = &action.template_node().config;
    filter.context.graphs.iter().any(|graph| {
        !env.node_types
            .is_compatible_with_graph(action.node_kind(), config, env.metadata, graph.kind)
    })
}

fn is_incompatible_with_schema(filter: &ActionFilter, env: &ActionEnv<'_>, action: &Action) -> bool {
    filter
        .context
        .graphs
        .iter()
        .any(|graph| !env.node_types.can_create_under_schema(action.node_kind(), graph.schema))
}

/// Deprecated node type, field, owning class or cast target.
fn is_deprecated(filter: &ActionFilter, env: &ActionEnv<'_>, action: &Action) -> bool {
    if filter.flags.contains(FilterFlags::INCLUDE_DEPRECATED) {
        return false;
    }
    if env.node_types.is_deprecated(action.node_kind()) {
        return true;
    }
    let metadata = env.metadata;
    let class_deprecated = |class: TypeHash| {
        metadata
            .class(class)
            .is_some_and(|c| c.has_flags(ClassFlags::DEPRECATED))
    };
    if let Some(field) = member_field(env, action)
        && (field.is_deprecated || class_deprecated(field.owner))
    {
        return true;
    }
    action
        .template_node()
        .config
        .target_class
        .is_some_and(class_deprecated)
}

/// Kind outside the allow-list or on the deny-list.
fn is_rejected_node_type(filter: &ActionFilter, _env: &ActionEnv<'_>, action: &Action) -> bool {
    let kind = action.node_kind();
    if !filter.permitted_node_types.is_empty()
        && !filter
            .permitted_node_types
            .iter()
            .any(|permitted| kind.is_child_of(*permitted))
    {
        return true;
    }
    let exact = filter
        .flags
        .contains(FilterFlags::PERMIT_REJECTION_SUBCLASSES);
    filter.rejected_node_types.iter().any(|rejected| {
        if exact {
            kind == *rejected
        } else {
            kind.is_child_of(*rejected)
        }
    })
}

/// Member of a class the targets do not inherit. Static fields and members
/// reachable through a context object pin are exempt.
fn is_outside_target_classes(filter: &ActionFilter, env: &ActionEnv<'_>, action: &Action) -> bool {
    let metadata = env.metadata;
    let owner = match action.component() {
        Some(component) => metadata.property(component).map(|p| p.owner),
        // Actor-bound events target the bound objects, not the blueprint.
        None if action.is_bound() => return false,
        None => member_field(env, action)
            .filter(|f| !f.is_static)
            .map(|f| f.owner),
    };
    let Some(owner) = owner else {
        return false;
    };
    let targets = filter.effective_target_classes(env);
    if targets.is_empty() || targets.iter().any(|class| inherits(metadata, *class, owner)) {
        return false;
    }
    !filter
        .context
        .pins
        .iter()
        .any(|pin| is_self_pin_for(metadata, pin, owner))
}

fn is_missing_binding(filter: &ActionFilter, env: &ActionEnv<'_>, action: &Action) -> bool {
    action.is_bound()
        && !filter
            .context
            .selected_objects
            .iter()
            .any(|object| action.is_binding_compatible(env, *object))
}

/// Local variable offered outside the function graph that declares it.
fn is_foreign_local_variable(filter: &ActionFilter, _env: &ActionEnv<'_>, action: &Action) -> bool {
    let Some(variable) = action.local_variable() else {
        return false;
    };
    let context = &filter.context;
    context
        .blueprints
        .iter()
        .any(|b| *b != variable.blueprint)
        || context
            .graphs
            .iter()
            .any(|g| g.blueprint != variable.blueprint || g.name != variable.graph)
}
