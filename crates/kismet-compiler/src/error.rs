//! Error types for node lowering.

use kismet_core::{GraphError, TypeHash};
use thiserror::Error;

// ============================================================================
// Lowering Errors
// ============================================================================

/// A structural problem found while lowering a single node.
///
/// The driver records it against the node and moves on; the rest of the
/// function still compiles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoweringError {
    #[error("unknown struct type {0}")]
    UnknownStruct(TypeHash),

    #[error("struct '{struct_name}' has no field named '{field}'")]
    NoMatchingField { struct_name: String, field: String },

    #[error("unknown enum type {0}")]
    UnknownEnum(TypeHash),

    #[error("node is not bound to a known function")]
    MissingFunction,

    #[error("node is not bound to a known property")]
    MissingProperty,

    #[error("cast has no target class")]
    MissingTargetClass,

    /// A required input is neither wired nor has a usable default.
    #[error("pin '{0}' has no input net")]
    NoInputNet(String),

    #[error("node has no pin named '{0}'")]
    MissingPin(String),

    #[error("function '{name}' cannot be used in a math expression: {reason}")]
    InvalidMathFunction { name: String, reason: &'static str },

    #[error("malformed math expression: {0}")]
    MalformedExpression(String),

    /// A node expansion needs a helper function the metadata does not provide.
    #[error("library function {0} is not registered")]
    MissingLibraryFunction(TypeHash),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Result alias for lowering a node.
pub type LoweringResult<T> = std::result::Result<T, LoweringError>;

// ============================================================================
// Evaluation Errors
// ============================================================================

/// Errors raised by the reference [`Evaluator`](crate::Evaluator).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("step limit of {0} statements exceeded")]
    StepLimitExceeded(usize),

    #[error("statement {0} jumps to an unresolved target")]
    UnresolvedJump(usize),

    #[error("statement {0} is missing an operand")]
    MissingOperand(usize),

    #[error("terminal '{0}' read before it was written")]
    Uninitialized(String),

    #[error("cannot write to constant terminal '{0}'")]
    ConstWrite(String),

    #[error("value has no field named '{0}'")]
    MissingField(String),

    #[error("argument {index} is not a {expected}")]
    BadArgument { index: usize, expected: &'static str },
}

/// Result alias for evaluation.
pub type EvalResult<T> = std::result::Result<T, EvalError>;
