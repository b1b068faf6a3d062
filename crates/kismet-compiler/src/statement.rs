//! Lowered statements consumed by the bytecode emitter.
//!
//! A statement is a kind tag plus operands. The emitter reads the tag as a
//! single byte, so [`StatementKind`] converts to and from `u8`.

use kismet_core::{NodeId, PinId, TypeHash};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::TerminalId;

/// Statement kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum StatementKind {
    Nop = 0,
    /// `lhs = function(context; rhs...)`
    CallFunction,
    /// Interface message; a no-op when the context does not implement it.
    CallMessage,
    /// `lhs = rhs[0]`
    Assignment,
    /// Unconditional jump.
    Goto,
    /// Jump when `rhs[0]` is false.
    GotoIfNot,
    /// Push a resume point onto the flow stack.
    PushState,
    /// Pop the flow stack, or finish when it is empty.
    EndOfThread,
    /// [`EndOfThread`](Self::EndOfThread) when `rhs[0]` is false.
    EndOfThreadIfNot,
    /// Debugger stop between branches.
    DebugSite,
    Return,
    AddMulticastDelegate,
    RemoveMulticastDelegate,
    ClearMulticastDelegate,
    CallMulticastDelegate,
    /// `lhs = rhs[0] as class`, null on failure.
    DynamicCast,
    /// Class-to-class cast, null on failure.
    MetaCast,
    /// `lhs = rhs[0] != null`
    ObjectToBool,
}

impl StatementKind {
    /// Control never falls through to the next statement.
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            StatementKind::Goto | StatementKind::EndOfThread | StatementKind::Return
        )
    }
}

/// Where a jump goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpTarget {
    /// First statement of the node wired to this exec output.
    Pin(PinId),
    /// Statement of the emitting node, by index into its own statements.
    Local(usize),
    /// Index into the function's statement list.
    Statement(usize),
}

/// One lowered statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    /// Node the statement was lowered from.
    pub node: Option<NodeId>,
    pub lhs: Option<TerminalId>,
    pub rhs: Vec<TerminalId>,
    pub context: Option<TerminalId>,
    pub function: Option<TypeHash>,
    pub property: Option<TypeHash>,
    pub class: Option<TypeHash>,
    pub target: Option<JumpTarget>,
}

impl Statement {
    pub fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            node: None,
            lhs: None,
            rhs: Vec::new(),
            context: None,
            function: None,
            property: None,
            class: None,
            target: None,
        }
    }

    /// Unconditional jump to the node wired to `pin`.
    pub fn goto(pin: PinId) -> Self {
        Self::new(StatementKind::Goto).with_target(JumpTarget::Pin(pin))
    }

    pub fn with_lhs(mut self, lhs: TerminalId) -> Self {
        self.lhs = Some(lhs);
        self
    }

    pub fn with_rhs(mut self, rhs: Vec<TerminalId>) -> Self {
        self.rhs = rhs;
        self
    }

    pub fn with_context(mut self, context: TerminalId) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_function(mut self, function: TypeHash) -> Self {
        self.function = Some(function);
        self
    }

    pub fn with_property(mut self, property: TypeHash) -> Self {
        self.property = Some(property);
        self
    }

    pub fn with_class(mut self, class: TypeHash) -> Self {
        self.class = Some(class);
        self
    }

    pub fn with_target(mut self, target: JumpTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Emitter opcode of this statement.
    pub fn opcode(&self) -> u8 {
        self.kind.into()
    }
}
