//! Function calls and interface messages.

use kismet_core::{Literal, Node, NodeKind, PinType, library, pin_names};

use crate::handler::{NodeHandler, check_kind, emit_then_goto};
use crate::{FunctionContext, LoweringError, LoweringResult, Statement, StatementKind};

/// Lowers call-function and message nodes into one call statement.
///
/// Arguments are every non-return parameter in declaration order; out
/// parameters are passed as their output terminals. Impure calls continue
/// through `then`.
pub struct CallFunctionHandler;

impl NodeHandler for CallFunctionHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::CallFunction, NodeKind::Message]
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn compile(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        let function = node
            .config
            .function
            .and_then(|f| ctx.metadata().function(f))
            .ok_or(LoweringError::MissingFunction)?;

        let mut args = Vec::new();
        let mut lhs = None;
        for param in &function.params {
            if param.is_return() {
                lhs = Some(ctx.output_terminal(node, &param.name)?);
            } else if param.is_input() {
                args.push(ctx.input_terminal(node, &param.name)?);
            } else {
                args.push(ctx.output_terminal(node, &param.name)?);
            }
        }

        let kind = if node.kind == NodeKind::Message {
            StatementKind::CallMessage
        } else {
            StatementKind::CallFunction
        };
        let mut statement = Statement::new(kind)
            .with_function(function.hash)
            .with_rhs(args);
        if let Some(lhs) = lhs {
            statement = statement.with_lhs(lhs);
        }
        if !function.is_static() {
            statement = statement.with_context(ctx.input_terminal(node, pin_names::SELF)?);
        }
        let pure = function.is_pure();
        ctx.emit(node.id, statement);

        if !pure {
            emit_then_goto(ctx, node);
        }
        Ok(())
    }
}

/// Add-component nodes call `AddComponentByClass` with the configured
/// class, then continue through `then`.
pub struct AddComponentHandler;

impl NodeHandler for AddComponentHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::AddComponent]
    }

    fn compile(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        let class = node.config.target_class.ok_or(LoweringError::MissingTargetClass)?;
        let helper = library::add_component_by_class();
        if ctx.metadata().function(helper).is_none() {
            return Err(LoweringError::MissingLibraryFunction(helper));
        }

        let class = ctx.literal(Literal::Class(Some(class)), PinType::class(class));
        let component = ctx.output_terminal(node, pin_names::RETURN_VALUE)?;
        ctx.emit(
            node.id,
            Statement::new(StatementKind::CallFunction)
                .with_function(helper)
                .with_rhs(vec![class])
                .with_lhs(component),
        );
        emit_then_goto(ctx, node);
        Ok(())
    }
}
