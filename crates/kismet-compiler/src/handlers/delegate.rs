//! Multicast delegate add, remove, clear and broadcast.

use kismet_core::{Node, NodeKind, pin_names};

use crate::handler::{NodeHandler, check_kind, emit_then_goto};
use crate::{FunctionContext, LoweringError, LoweringResult, Statement, StatementKind};

/// Emits one delegate statement on the bound property, read through the
/// `self` pin.
///
/// Add and remove take the `Delegate` input; broadcast takes every input
/// parameter of the signature in declaration order; clear takes nothing.
pub struct DelegateHandler;

impl NodeHandler for DelegateHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[
            NodeKind::AddDelegate,
            NodeKind::RemoveDelegate,
            NodeKind::ClearDelegate,
            NodeKind::CallDelegate,
        ]
    }

    fn compile(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        let property = node
            .config
            .property
            .and_then(|p| ctx.metadata().property(p))
            .ok_or(LoweringError::MissingProperty)?;
        let context = ctx.input_terminal(node, pin_names::SELF)?;

        let (kind, rhs) = match node.kind {
            NodeKind::AddDelegate => (
                StatementKind::AddMulticastDelegate,
                vec![ctx.input_terminal(node, pin_names::DELEGATE)?],
            ),
            NodeKind::RemoveDelegate => (
                StatementKind::RemoveMulticastDelegate,
                vec![ctx.input_terminal(node, pin_names::DELEGATE)?],
            ),
            NodeKind::ClearDelegate => (StatementKind::ClearMulticastDelegate, Vec::new()),
            _ => {
                let signature = property
                    .signature()
                    .and_then(|s| ctx.metadata().function(s))
                    .ok_or(LoweringError::MissingFunction)?;
                let mut args = Vec::new();
                for param in signature.input_params() {
                    args.push(ctx.input_terminal(node, &param.name)?);
                }
                (StatementKind::CallMulticastDelegate, args)
            }
        };

        ctx.emit(
            node.id,
            Statement::new(kind)
                .with_property(property.hash)
                .with_context(context)
                .with_rhs(rhs),
        );
        emit_then_goto(ctx, node);
        Ok(())
    }
}
