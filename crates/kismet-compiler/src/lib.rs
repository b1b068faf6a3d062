//! Kismet node lowering
//!
//! Turns a graph of placed nodes into a linear list of statements over
//! terminals, one handler per node kind.
//!
//! ## Architecture
//!
//! - **Nets**: pins wired together share one [`NetId`]; every net resolves
//!   to at most one [`Terminal`]
//! - **Handlers**: a [`NodeHandler`] expands, registers and compiles one
//!   family of node kinds; the [`HandlerRegistry`] dispatches on kind
//! - **Driver**: the [`FunctionCompiler`] runs the phases and linearizes the
//!   per-node statements into a [`CompiledFunction`]
//! - **Evaluation**: the [`Evaluator`] executes compiled statements so
//!   lowering can be checked end to end
//!
//! ## Modules
//!
//! - [`context`]: per-function lowering state and compiler options
//! - [`handler`]: the handler trait and registry
//! - [`handlers`]: the built-in handlers
//! - [`compiler`]: the compilation driver
//! - [`eval`]: the reference evaluator

pub mod compiler;
pub mod context;
mod error;
pub mod eval;
pub mod handler;
pub mod handlers;
mod net;
mod statement;
mod terminal;

#[cfg(test)]
mod testing;

pub use compiler::{CompiledFunction, FunctionCompiler};
pub use context::{CompilerOptions, FunctionContext};
pub use error::{EvalError, EvalResult, LoweringError, LoweringResult};
pub use eval::{Evaluator, Frame, NativeFn, TraceEvent};
pub use handler::{ExpandContext, HandlerRegistry, NodeHandler};
pub use net::{NetId, NetMap};
pub use statement::{JumpTarget, Statement, StatementKind};
pub use terminal::{Terminal, TerminalId, TerminalKind};
