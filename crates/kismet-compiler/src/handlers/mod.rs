//! Built-in node handlers, one module per node family.

mod call;
mod cast;
mod delegate;
mod entry;
mod enums;
mod flow;
mod math;
mod structs;
mod variable;

pub use call::{AddComponentHandler, CallFunctionHandler};
pub use cast::DynamicCastHandler;
pub use delegate::DelegateHandler;
pub use entry::{EntryHandler, PassiveHandler, ResultHandler};
pub use enums::{CastByteToEnumHandler, EnumEntryCountHandler, EnumLiteralHandler, SwitchEnumHandler};
pub use flow::{BranchHandler, ExecutionSequenceHandler, MultiGateHandler};
pub use math::MathExpressionHandler;
pub use structs::{BreakStructHandler, MakeStructHandler, SetFieldsHandler};
pub use variable::VariableHandler;
