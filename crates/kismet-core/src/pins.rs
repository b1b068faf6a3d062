//! Default pin layouts per node kind.
//!
//! [`default_pins`] is the single source of pin shapes: the editor uses it
//! when placing a node and template nodes use it to answer compatibility
//! queries, so both always agree. Bound fields that do not resolve produce
//! only the kind's fixed pins.

use crate::pin_names::*;
use crate::{
    FunctionInfo, Literal, MetadataProvider, NodeConfig, NodeKind, PinTemplate, PinType,
    TunnelRole,
};

const DEFAULT_EXEC_OUTPUTS: usize = 2;
const DEFAULT_ARRAY_INPUTS: usize = 1;

fn exec_in() -> PinTemplate {
    PinTemplate::input(EXECUTE, PinType::exec())
}

fn exec_out(name: &str) -> PinTemplate {
    PinTemplate::output(name, PinType::exec())
}

fn self_pin(class: crate::TypeHash) -> PinTemplate {
    PinTemplate::input(SELF, PinType::object(class))
}

/// Pins of a call to `function`: exec pins unless pure, a target pin unless
/// static, inputs and outputs in declaration order.
fn call_pins(function: &FunctionInfo, pins: &mut Vec<PinTemplate>) {
    if !function.is_pure() {
        pins.push(exec_in());
        pins.push(exec_out(THEN));
    }
    if !function.is_static() {
        pins.push(self_pin(function.owner));
    }
    for param in &function.params {
        if param.is_input() {
            pins.push(PinTemplate::input(&param.name, param.pin_type.clone()));
        } else {
            pins.push(PinTemplate::output(&param.name, param.pin_type.clone()));
        }
    }
}

/// Event outputs: `then` plus every parameter as an output.
fn event_pins(function: &FunctionInfo, pins: &mut Vec<PinTemplate>) {
    pins.push(exec_out(THEN));
    for param in function.input_params() {
        pins.push(PinTemplate::output(&param.name, param.pin_type.clone()));
    }
}

/// Default pin layout of a node of `kind` configured with `config`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn default_pins(
    kind: NodeKind,
    config: &NodeConfig,
    metadata: &dyn MetadataProvider,
) -> Vec<PinTemplate> {
    let mut pins = Vec::new();
    let function = config.function.and_then(|f| metadata.function(f));
    let property = config.property.and_then(|p| metadata.property(p));
    let enum_info = config.enum_type.and_then(|e| metadata.enum_info(e));
    let struct_info = config.struct_type.and_then(|s| metadata.struct_info(s));

    match kind {
        NodeKind::Comment
        | NodeKind::Documentation
        | NodeKind::Variable
        | NodeKind::BaseDelegate
        | NodeKind::AsyncTask => {}

        NodeKind::CallFunction | NodeKind::Message => {
            if let Some(function) = function {
                call_pins(function, &mut pins);
            }
        }

        NodeKind::Event => {
            if let Some(function) = function {
                event_pins(function, &mut pins);
            }
        }

        NodeKind::ComponentBoundEvent | NodeKind::ActorBoundEvent => {
            if let Some(signature) = property
                .and_then(|p| p.signature())
                .and_then(|s| metadata.function(s))
            {
                event_pins(signature, &mut pins);
            }
        }

        NodeKind::VariableGet | NodeKind::VariableSet => {
            let variable = if let Some(local) = &config.local_variable {
                metadata
                    .blueprint(local.blueprint)
                    .and_then(|bp| bp.function_graph(&local.graph))
                    .and_then(|g| g.locals.iter().find(|l| l.name == local.name))
                    .map(|l| (l.name.clone(), l.pin_type.clone(), None))
            } else {
                property.map(|p| (p.name.clone(), p.pin_type.clone(), Some(p.owner)))
            };
            if let Some((name, pin_type, owner)) = variable {
                if kind == NodeKind::VariableSet {
                    pins.push(exec_in());
                    pins.push(exec_out(THEN));
                    pins.push(PinTemplate::input(&name, pin_type.clone()));
                    pins.push(PinTemplate::output(OUTPUT_GET, pin_type));
                } else {
                    pins.push(PinTemplate::output(&name, pin_type));
                }
                if let Some(owner) = owner {
                    pins.push(self_pin(owner));
                }
            }
        }

        NodeKind::AddDelegate
        | NodeKind::RemoveDelegate
        | NodeKind::ClearDelegate
        | NodeKind::CallDelegate => {
            if let Some(property) = property {
                pins.push(exec_in());
                pins.push(exec_out(THEN));
                pins.push(self_pin(property.owner));
                let signature = property.signature();
                match kind {
                    NodeKind::AddDelegate | NodeKind::RemoveDelegate => {
                        if let Some(sig) = signature {
                            pins.push(PinTemplate::input(DELEGATE, PinType::delegate(sig)));
                        }
                    }
                    NodeKind::CallDelegate => {
                        if let Some(sig) = signature.and_then(|s| metadata.function(s)) {
                            for param in sig.input_params() {
                                pins.push(PinTemplate::input(&param.name, param.pin_type.clone()));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        NodeKind::AddComponent => {
            pins.push(exec_in());
            pins.push(exec_out(THEN));
            if let Some(class) = config.target_class {
                pins.push(PinTemplate::output(RETURN_VALUE, PinType::object(class)));
            }
        }

        NodeKind::DynamicCast | NodeKind::ClassDynamicCast => {
            pins.push(exec_in());
            pins.push(exec_out(THEN));
            pins.push(exec_out(CAST_FAILED));
            if let Some(target) = config.target_class {
                let name = metadata
                    .class(target)
                    .map(|c| c.name.as_str())
                    .unwrap_or("Target");
                if kind == NodeKind::DynamicCast {
                    pins.push(PinTemplate::input("Object", PinType::any_object()));
                    pins.push(PinTemplate::output(format!("As{name}"), PinType::object(target)));
                } else {
                    pins.push(PinTemplate::input("Class", PinType::any_class()));
                    pins.push(PinTemplate::output(format!("As{name}"), PinType::class(target)));
                }
            }
        }

        NodeKind::GetNumEnumEntries => {
            pins.push(PinTemplate::output(RETURN_VALUE, PinType::int()));
        }

        NodeKind::ForEachElementInEnum => {
            pins.push(exec_in());
            pins.push(exec_out("LoopBody"));
            if let Some(e) = enum_info {
                pins.push(PinTemplate::output("EnumValue", PinType::enum_byte(e.hash)));
            }
            pins.push(exec_out("Completed"));
        }

        NodeKind::EnumLiteral => {
            if let Some(e) = enum_info {
                pins.push(
                    PinTemplate::input("Enum", PinType::enum_byte(e.hash))
                        .with_default(Literal::Byte(0)),
                );
                pins.push(PinTemplate::output(RETURN_VALUE, PinType::enum_byte(e.hash)));
            }
        }

        NodeKind::CastByteToEnum => {
            if let Some(e) = enum_info {
                pins.push(PinTemplate::input("Byte", PinType::byte()).with_default(Literal::Byte(0)));
                pins.push(PinTemplate::output(RETURN_VALUE, PinType::enum_byte(e.hash)));
            }
        }

        NodeKind::SwitchEnum => {
            pins.push(exec_in());
            if let Some(e) = enum_info {
                pins.push(
                    PinTemplate::input(SELECTION, PinType::enum_byte(e.hash))
                        .with_default(Literal::Byte(0)),
                );
                for entry in &e.entries {
                    pins.push(exec_out(entry));
                }
            }
        }

        NodeKind::BreakStruct => {
            if let Some(s) = struct_info {
                pins.push(
                    PinTemplate::input(&s.name, PinType::structure(s.hash))
                        .with_default(s.default_value()),
                );
                for field in s.visible_fields() {
                    pins.push(PinTemplate::output(&field.name, field.pin_type.clone()));
                }
            }
        }

        NodeKind::MakeStruct => {
            if let Some(s) = struct_info {
                for field in s.visible_fields().filter(|f| !f.read_only) {
                    let mut pin = PinTemplate::input(&field.name, field.pin_type.clone());
                    pin.default = Literal::default_for(&field.pin_type);
                    pins.push(pin);
                }
                pins.push(PinTemplate::output(&s.name, PinType::structure(s.hash)));
            }
        }

        NodeKind::SetFieldsInStruct => {
            if let Some(s) = struct_info {
                pins.push(exec_in());
                pins.push(exec_out(THEN));
                pins.push(PinTemplate::input("StructRef", PinType::structure(s.hash).as_reference()));
                for field in s.visible_fields().filter(|f| !f.read_only) {
                    pins.push(PinTemplate::input(&field.name, field.pin_type.clone()));
                }
                pins.push(PinTemplate::output("StructOut", PinType::structure(s.hash)));
            }
        }

        NodeKind::MacroInstance => {
            if let Some(info) = config.macro_graph.as_ref().and_then(|m| {
                metadata
                    .blueprint(m.blueprint)
                    .and_then(|bp| bp.macro_graph(&m.graph))
            }) {
                for (name, pin_type) in &info.inputs {
                    pins.push(PinTemplate::input(name, pin_type.clone()));
                }
                for (name, pin_type) in &info.outputs {
                    pins.push(PinTemplate::output(name, pin_type.clone()));
                }
            }
        }

        NodeKind::ExecutionSequence | NodeKind::MultiGate => {
            let prefix = crate::exec_output_prefix(kind).unwrap_or("then_");
            let count = if config.pin_count == 0 {
                DEFAULT_EXEC_OUTPUTS
            } else {
                config.pin_count
            };
            pins.push(exec_in());
            if kind == NodeKind::MultiGate {
                pins.push(PinTemplate::input(RESET, PinType::exec()));
                pins.push(PinTemplate::input(IS_LOOP, PinType::bool()).with_default(Literal::Bool(false)));
                pins.push(PinTemplate::input(START_INDEX, PinType::int()).with_default(Literal::Int(-1)));
            }
            for i in 0..count {
                pins.push(exec_out(&format!("{prefix}{i}")));
            }
        }

        NodeKind::IfThenElse => {
            pins.push(exec_in());
            pins.push(PinTemplate::input(CONDITION, PinType::bool()).with_default(Literal::Bool(true)));
            pins.push(exec_out(THEN));
            pins.push(exec_out(ELSE));
        }

        NodeKind::MakeArray => {
            let count = if config.pin_count == 0 {
                DEFAULT_ARRAY_INPUTS
            } else {
                config.pin_count
            };
            for i in 0..count {
                pins.push(PinTemplate::input(format!("[{i}]"), PinType::wildcard()));
            }
            pins.push(PinTemplate::output("Array", PinType::wildcard().as_array()));
        }

        NodeKind::MathExpression => match config.inner_graph.as_deref() {
            Some(inner) => {
                for node in inner.nodes() {
                    match node.config.tunnel {
                        Some(TunnelRole::Entry) => {
                            for pin in node.outputs() {
                                pins.push(PinTemplate::input(&pin.name, pin.pin_type.clone()));
                            }
                        }
                        Some(TunnelRole::Exit) => {
                            for pin in node.inputs() {
                                pins.push(PinTemplate::output(&pin.name, pin.pin_type.clone()));
                            }
                        }
                        None => {}
                    }
                }
            }
            None => pins.push(PinTemplate::output(RETURN_VALUE, PinType::float())),
        },

        NodeKind::AsyncAction => {
            pins.push(exec_in());
            pins.push(exec_out(THEN));
            if let Some(factory) = function {
                for param in factory.input_params() {
                    pins.push(PinTemplate::input(&param.name, param.pin_type.clone()));
                }
                if let Some(action_class) = factory.return_param().and_then(|r| r.pin_type.sub_object) {
                    for prop in metadata
                        .all_properties(action_class)
                        .into_iter()
                        .filter_map(|p| metadata.property(p))
                        .filter(|p| p.is_multicast_delegate() && p.is_blueprint_visible())
                    {
                        pins.push(exec_out(&prop.name));
                    }
                }
            }
        }

        NodeKind::FunctionEntry => {
            pins.push(exec_out(THEN));
            if let Some(function) = function {
                for param in function.input_params() {
                    pins.push(PinTemplate::output(&param.name, param.pin_type.clone()));
                }
            }
        }

        NodeKind::FunctionResult => {
            pins.push(exec_in());
            if let Some(function) = function {
                for param in function.output_params() {
                    pins.push(PinTemplate::input(&param.name, param.pin_type.clone()));
                }
            }
        }

        NodeKind::Tunnel => {}
    }

    pins
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ClassInfo, EnumInfo, FunctionFlags, MetadataRegistry, PinDirection, PropertyFlags,
        PropertyInfo, StructInfo,
    };

    fn names(pins: &[PinTemplate]) -> Vec<&str> {
        pins.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn impure_member_call() {
        let mut metadata = MetadataRegistry::new();
        let actor = metadata.add_class(ClassInfo::new("Actor"));
        let f = metadata.add_function(
            FunctionInfo::new(actor, "F")
                .with_flags(FunctionFlags::BLUEPRINT_CALLABLE)
                .with_param("x", PinType::int())
                .with_return(PinType::bool()),
        );
        let pins = default_pins(NodeKind::CallFunction, &NodeConfig::for_function(f), &metadata);
        assert_eq!(names(&pins), vec!["execute", "then", "self", "x", "ReturnValue"]);
        assert_eq!(pins[4].direction, PinDirection::Output);
    }

    #[test]
    fn pure_static_call_has_no_exec_or_self() {
        let metadata = MetadataRegistry::with_library();
        let pins = default_pins(
            NodeKind::CallFunction,
            &NodeConfig::for_function(crate::library::add_float()),
            &metadata,
        );
        assert_eq!(names(&pins), vec!["A", "B", "ReturnValue"]);
    }

    #[test]
    fn setter_layout() {
        let mut metadata = MetadataRegistry::new();
        let actor = metadata.add_class(ClassInfo::new("Actor"));
        let speed = metadata.add_property(
            PropertyInfo::new(actor, "Speed", PinType::float())
                .with_flags(PropertyFlags::BLUEPRINT_VISIBLE),
        );
        let pins = default_pins(NodeKind::VariableSet, &NodeConfig::for_property(speed), &metadata);
        assert_eq!(
            names(&pins),
            vec!["execute", "then", "Speed", "Output_Get", "self"]
        );
    }

    #[test]
    fn break_struct_outputs_visible_fields() {
        let mut metadata = MetadataRegistry::new();
        let mut info = StructInfo::new("Pair")
            .with_field("f1", PinType::int())
            .with_field("f2", PinType::bool())
            .with_field("secret", PinType::int());
        info.fields[2].visible = false;
        let pair = metadata.add_struct(info);
        let pins = default_pins(NodeKind::BreakStruct, &NodeConfig::for_struct(pair), &metadata);
        assert_eq!(names(&pins), vec!["Pair", "f1", "f2"]);
    }

    #[test]
    fn sequence_default_and_configured() {
        let metadata = MetadataRegistry::new();
        let pins = default_pins(NodeKind::ExecutionSequence, &NodeConfig::default(), &metadata);
        assert_eq!(names(&pins), vec!["execute", "then_0", "then_1"]);

        let config = NodeConfig {
            pin_count: 3,
            ..NodeConfig::default()
        };
        let pins = default_pins(NodeKind::ExecutionSequence, &config, &metadata);
        assert_eq!(names(&pins), vec!["execute", "then_0", "then_1", "then_2"]);
    }

    #[test]
    fn switch_enum_has_one_exec_per_entry() {
        let mut metadata = MetadataRegistry::new();
        let e = metadata.add_enum(EnumInfo::new("EColor", &["Red", "Green", "Blue"]));
        let pins = default_pins(NodeKind::SwitchEnum, &NodeConfig::for_enum(e), &metadata);
        assert_eq!(names(&pins), vec!["execute", "Selection", "Red", "Green", "Blue"]);
    }

    #[test]
    fn multigate_has_reset_and_options() {
        let metadata = MetadataRegistry::new();
        let pins = default_pins(NodeKind::MultiGate, &NodeConfig::default(), &metadata);
        assert_eq!(
            names(&pins),
            vec!["execute", "Reset", "Loop", "StartIndex", "out_0", "out_1"]
        );
    }

    #[test]
    fn unresolved_field_yields_fixed_pins_only() {
        let metadata = MetadataRegistry::new();
        let ghost = crate::TypeHash::from_name("Ghost");
        assert!(default_pins(NodeKind::CallFunction, &NodeConfig::for_function(ghost), &metadata).is_empty());
        let cast = default_pins(NodeKind::DynamicCast, &NodeConfig::default(), &metadata);
        assert_eq!(names(&cast), vec!["execute", "then", "CastFailed"]);
    }
}
