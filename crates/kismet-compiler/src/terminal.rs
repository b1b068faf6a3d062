//! Terminals: the storage locations and constants statements operate on.

use kismet_core::{Literal, PinType, TypeHash};

/// Terminal identity within one compiled function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalId(pub u32);

/// What a terminal refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalKind {
    /// Temporary owned by the function frame.
    Local,
    Literal(Literal),
    /// Member variable of the context object, or of self without a context.
    Property(TypeHash),
    /// Field of the struct value held by the context terminal.
    Field(String),
    /// Function parameter, written by the caller.
    Param(String),
    /// Function output, read by the caller.
    Result(String),
    /// Local variable declared on the function graph.
    LocalVariable(String),
    /// Value of an inline statement, computed on each read.
    Inline(usize),
    /// The object the function runs on.
    DefaultSelf,
}

/// A compiler-side operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Terminal {
    pub id: TerminalId,
    pub name: String,
    pub pin_type: PinType,
    pub kind: TerminalKind,
    /// Object or struct the terminal is read through.
    pub context: Option<TerminalId>,
    pub is_const: bool,
}

impl Terminal {
    /// A terminal with a placeholder id; the function context assigns the
    /// real one when the terminal is added.
    pub fn new(name: impl Into<String>, pin_type: PinType, kind: TerminalKind) -> Self {
        Self {
            id: TerminalId(u32::MAX),
            name: name.into(),
            pin_type,
            kind,
            context: None,
            is_const: false,
        }
    }

    pub fn with_context(mut self, context: Option<TerminalId>) -> Self {
        self.context = context;
        self
    }

    pub fn with_const(mut self, is_const: bool) -> Self {
        self.is_const = is_const;
        self
    }

    pub fn literal(&self) -> Option<&Literal> {
        match &self.kind {
            TerminalKind::Literal(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        self.literal().is_some()
    }
}
