//! Variable getters and setters.
//!
//! A getter emits nothing: its output net resolves straight to the variable
//! terminal. A setter assigns the variable and exposes it again on
//! `Output_Get`.

use kismet_core::{Node, NodeKind, PinType, pin_names};

use crate::handler::{NodeHandler, check_kind, emit_then_goto, register_data_pins};
use crate::{
    FunctionContext, LoweringError, LoweringResult, Statement, StatementKind, Terminal,
    TerminalId, TerminalKind,
};

pub struct VariableHandler;

/// Name, type and kind of the variable a node reads or writes.
fn variable(ctx: &FunctionContext<'_>, node: &Node) -> LoweringResult<(String, PinType, TerminalKind)> {
    if let Some(local) = &node.config.local_variable {
        let pin_type = node
            .data_pins()
            .find(|p| p.name == local.name)
            .map(|p| p.pin_type.clone())
            .ok_or(LoweringError::MissingProperty)?;
        return Ok((
            local.name.clone(),
            pin_type,
            TerminalKind::LocalVariable(local.name.clone()),
        ));
    }
    let property = node
        .config
        .property
        .and_then(|p| ctx.metadata().property(p))
        .ok_or(LoweringError::MissingProperty)?;
    Ok((
        property.name.clone(),
        property.pin_type.clone(),
        TerminalKind::Property(property.hash),
    ))
}

/// Object the variable is read through; `None` means self.
fn variable_context(ctx: &mut FunctionContext<'_>, node: &Node) -> Option<TerminalId> {
    let pin = node.find_pin(pin_names::SELF).filter(|p| p.is_input() && p.is_linked())?;
    Some(ctx.register_net(pin))
}

impl NodeHandler for VariableHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::VariableGet, NodeKind::VariableSet]
    }

    fn register_nets(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        let (name, pin_type, kind) = variable(ctx, node)?;
        let context = variable_context(ctx, node);

        let exposed = match node.kind {
            NodeKind::VariableGet => node.find_pin(&name).filter(|p| p.is_output()),
            _ => node.find_pin(pin_names::OUTPUT_GET),
        };
        match exposed {
            Some(pin) => {
                ctx.register_net_as(pin, kind, context, false);
            }
            None if node.kind == NodeKind::VariableSet => {
                ctx.add_terminal(Terminal::new(name, pin_type, kind).with_context(context));
            }
            None => return Err(LoweringError::MissingPin(name)),
        }
        register_data_pins(ctx, node);
        Ok(())
    }

    fn compile(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        if node.kind == NodeKind::VariableGet {
            return Ok(());
        }

        let (name, pin_type, kind) = variable(ctx, node)?;
        let target = match node.find_pin(pin_names::OUTPUT_GET) {
            Some(pin) => ctx.register_net(pin),
            None => {
                let context = variable_context(ctx, node);
                ctx.add_terminal(Terminal::new(name.clone(), pin_type, kind).with_context(context))
            }
        };
        let value = ctx.input_terminal(node, &name)?;
        ctx.emit(
            node.id,
            Statement::new(StatementKind::Assignment)
                .with_lhs(target)
                .with_rhs(vec![value]),
        );
        emit_then_goto(ctx, node);
        Ok(())
    }
}
