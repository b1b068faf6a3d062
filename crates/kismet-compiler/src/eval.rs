//! Reference evaluator for compiled functions.
//!
//! The [`Evaluator`] executes a [`CompiledFunction`] statement by statement.
//! It exists to check lowering: it defines what each statement kind means
//! and records the observable effects (calls, broadcasts, debug stops) in a
//! trace.
//!
//! Functions registered as natives run in Rust; every other call is traced
//! and returns the zero value of its return type. The library helpers that
//! node expansions insert are registered by default.
//!
//! ```
//! use kismet_compiler::Evaluator;
//! use kismet_core::{MetadataRegistry, library};
//!
//! let metadata = MetadataRegistry::with_library();
//! let eval = Evaluator::new(&metadata).with_step_limit(100);
//! assert!(eval.trace().is_empty());
//! assert!(eval.has_native(library::get_valid_enum_index()));
//! ```

use kismet_core::{Literal, MetadataProvider, ObjectId, TypeHash, library};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::{
    CompiledFunction, EvalError, EvalResult, JumpTarget, Statement, StatementKind, Terminal,
    TerminalId, TerminalKind,
};

const DEFAULT_STEP_LIMIT: usize = 10_000;

/// A function implemented by the evaluator; receives the input arguments in
/// declaration order.
pub type NativeFn = fn(&[Literal]) -> EvalResult<Literal>;

/// Observable effect of running a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    Call(TypeHash),
    Message(TypeHash),
    Broadcast { property: TypeHash, listeners: usize },
    DebugSite(usize),
}

/// Terminal values of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    slots: Vec<Option<Literal>>,
}

impl Frame {
    fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
        }
    }

    /// Value held by a frame-owned terminal.
    pub fn get(&self, id: TerminalId) -> Option<&Literal> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }
}

enum Flow {
    Next,
    Jump(usize),
    Push(usize),
    EndThread,
    Return,
}

type ObjectKey = (Option<ObjectId>, TypeHash);

/// Statement interpreter.
pub struct Evaluator<'a> {
    metadata: &'a dyn MetadataProvider,
    natives: FxHashMap<TypeHash, NativeFn>,
    properties: FxHashMap<ObjectKey, Literal>,
    delegates: FxHashMap<ObjectKey, Vec<Literal>>,
    self_object: Option<ObjectId>,
    step_limit: usize,
    trace: Vec<TraceEvent>,
}

impl<'a> Evaluator<'a> {
    pub fn new(metadata: &'a dyn MetadataProvider) -> Self {
        let mut natives: FxHashMap<TypeHash, NativeFn> = FxHashMap::default();
        natives.insert(library::get_valid_enum_index(), valid_enum_index);
        natives.insert(library::add_float(), |args| Ok(Literal::float(float_arg(args, 0)? + float_arg(args, 1)?)));
        natives.insert(library::subtract_float(), |args| Ok(Literal::float(float_arg(args, 0)? - float_arg(args, 1)?)));
        natives.insert(library::multiply_float(), |args| Ok(Literal::float(float_arg(args, 0)? * float_arg(args, 1)?)));
        natives.insert(library::divide_float(), divide_float);
        natives.insert(library::less_float(), |args| Ok(Literal::Bool(float_arg(args, 0)? < float_arg(args, 1)?)));
        natives.insert(library::not_equal_byte(), not_equal);
        natives.insert(library::not_equal_int(), not_equal);
        natives.insert(library::has_unmarked_bit(), has_unmarked_bit);
        natives.insert(library::get_unmarked_bit(), get_unmarked_bit);
        natives.insert(library::mark_bit(), mark_bit);
        Self {
            metadata,
            natives,
            properties: FxHashMap::default(),
            delegates: FxHashMap::default(),
            self_object: None,
            step_limit: DEFAULT_STEP_LIMIT,
            trace: Vec::new(),
        }
    }

    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    pub fn with_native(mut self, function: TypeHash, native: NativeFn) -> Self {
        self.natives.insert(function, native);
        self
    }

    /// Object the function runs on.
    pub fn with_self(mut self, object: ObjectId) -> Self {
        self.self_object = Some(object);
        self
    }

    /// Initial value of `property` on `object` (`None` is self).
    pub fn with_property(mut self, object: Option<ObjectId>, property: TypeHash, value: Literal) -> Self {
        let object = object.or(self.self_object);
        self.properties.insert((object, property), value);
        self
    }

    pub fn has_native(&self, function: TypeHash) -> bool {
        self.natives.contains_key(&function)
    }

    /// Current value of `property` on `object` (`None` is self).
    pub fn property(&self, object: Option<ObjectId>, property: TypeHash) -> Option<&Literal> {
        self.properties.get(&(object.or(self.self_object), property))
    }

    pub fn trace(&self) -> &[TraceEvent] {
        &self.trace
    }

    /// Run from the first statement.
    pub fn run(&mut self, compiled: &CompiledFunction, args: &[(&str, Literal)]) -> EvalResult<Frame> {
        self.run_from(compiled, 0, args)
    }

    /// Run from statement `start`, typically one of the entry points.
    ///
    /// Parameters missing from `args` start at their type's zero value.
    pub fn run_from(
        &mut self,
        compiled: &CompiledFunction,
        start: usize,
        args: &[(&str, Literal)],
    ) -> EvalResult<Frame> {
        let mut frame = Frame::new(compiled.terminals.len());
        for (slot, terminal) in frame.slots.iter_mut().zip(&compiled.terminals) {
            *slot = match &terminal.kind {
                TerminalKind::Param(name) => args
                    .iter()
                    .find(|(n, _)| *n == name.as_str())
                    .map(|(_, v)| v.clone())
                    .or_else(|| Literal::default_for(&terminal.pin_type)),
                TerminalKind::Result(_) | TerminalKind::LocalVariable(_) => {
                    Literal::default_for(&terminal.pin_type)
                }
                _ => None,
            };
        }

        let mut pc = start;
        let mut flow_stack = Vec::new();
        let mut steps = 0;
        while let Some(statement) = compiled.statements.get(pc) {
            steps += 1;
            if steps > self.step_limit {
                return Err(EvalError::StepLimitExceeded(self.step_limit));
            }
            match self.execute(compiled, &mut frame, pc, statement)? {
                Flow::Next => pc += 1,
                Flow::Jump(target) => pc = target,
                Flow::Push(target) => {
                    flow_stack.push(target);
                    pc += 1;
                }
                Flow::EndThread => match flow_stack.pop() {
                    Some(resume) => pc = resume,
                    None => break,
                },
                Flow::Return => break,
            }
        }
        trace!(function = %compiled.name, steps, "run finished");
        Ok(frame)
    }

    /// Value of a function output after a run.
    pub fn result(&mut self, compiled: &CompiledFunction, frame: &Frame, name: &str) -> EvalResult<Literal> {
        let id = compiled
            .result(name)
            .ok_or_else(|| EvalError::Uninitialized(name.to_string()))?;
        self.read(compiled, frame, id)
    }

    // ======================================================================
    // Terminals
    // ======================================================================

    /// Current value of a terminal.
    pub fn read(&mut self, compiled: &CompiledFunction, frame: &Frame, id: TerminalId) -> EvalResult<Literal> {
        let terminal = lookup(compiled, id)?;
        let uninitialized = || EvalError::Uninitialized(terminal.name.clone());
        match &terminal.kind {
            TerminalKind::Literal(value) => Ok(value.clone()),
            TerminalKind::DefaultSelf => Ok(Literal::Object(self.self_object)),
            TerminalKind::Property(property) => {
                let object = self.context_object(compiled, frame, terminal)?;
                self.properties
                    .get(&(object, *property))
                    .cloned()
                    .or_else(|| Literal::default_for(&terminal.pin_type))
                    .ok_or_else(uninitialized)
            }
            TerminalKind::Field(name) => {
                let context = terminal
                    .context
                    .ok_or_else(|| EvalError::MissingField(name.clone()))?;
                let parent = self.read(compiled, frame, context)?;
                parent
                    .field(name)
                    .cloned()
                    .ok_or_else(|| EvalError::MissingField(name.clone()))
            }
            TerminalKind::Inline(index) => {
                let statement = compiled
                    .inline_statements
                    .get(*index)
                    .ok_or(EvalError::MissingOperand(*index))?;
                let (value, _) = self.invoke(compiled, frame, *index, statement)?;
                value.ok_or_else(uninitialized)
            }
            TerminalKind::Local
            | TerminalKind::Param(_)
            | TerminalKind::Result(_)
            | TerminalKind::LocalVariable(_) => frame.get(id).cloned().ok_or_else(uninitialized),
        }
    }

    fn write(
        &mut self,
        compiled: &CompiledFunction,
        frame: &mut Frame,
        id: TerminalId,
        value: Literal,
    ) -> EvalResult<()> {
        let terminal = lookup(compiled, id)?;
        if terminal.is_const {
            return Err(EvalError::ConstWrite(terminal.name.clone()));
        }
        match &terminal.kind {
            TerminalKind::Literal(_) | TerminalKind::Inline(_) | TerminalKind::DefaultSelf => {
                Err(EvalError::ConstWrite(terminal.name.clone()))
            }
            TerminalKind::Property(property) => {
                let object = self.context_object(compiled, frame, terminal)?;
                self.properties.insert((object, *property), value);
                Ok(())
            }
            TerminalKind::Field(name) => {
                let context = terminal
                    .context
                    .ok_or_else(|| EvalError::MissingField(name.clone()))?;
                let mut parent = self.read(compiled, frame, context)?;
                *parent
                    .field_mut(name)
                    .ok_or_else(|| EvalError::MissingField(name.clone()))? = value;
                self.write(compiled, frame, context, parent)
            }
            TerminalKind::Local
            | TerminalKind::Param(_)
            | TerminalKind::Result(_)
            | TerminalKind::LocalVariable(_) => {
                if let Some(slot) = frame.slots.get_mut(id.0 as usize) {
                    *slot = Some(value);
                }
                Ok(())
            }
        }
    }

    /// Object a member terminal is read through; self without a context.
    fn context_object(
        &mut self,
        compiled: &CompiledFunction,
        frame: &Frame,
        terminal: &Terminal,
    ) -> EvalResult<Option<ObjectId>> {
        match terminal.context {
            Some(context) => match self.read(compiled, frame, context)? {
                Literal::Object(object) => Ok(object),
                _ => Err(EvalError::BadArgument {
                    index: 0,
                    expected: "object",
                }),
            },
            None => Ok(self.self_object),
        }
    }

    // ======================================================================
    // Statements
    // ======================================================================

    fn execute(
        &mut self,
        compiled: &CompiledFunction,
        frame: &mut Frame,
        pc: usize,
        statement: &Statement,
    ) -> EvalResult<Flow> {
        let operand = |i: usize| statement.rhs.get(i).copied().ok_or(EvalError::MissingOperand(pc));
        let lhs = || statement.lhs.ok_or(EvalError::MissingOperand(pc));
        let target = || match statement.target {
            Some(JumpTarget::Statement(index)) => Ok(index),
            _ => Err(EvalError::UnresolvedJump(pc)),
        };

        match statement.kind {
            StatementKind::Nop => {}
            StatementKind::CallFunction | StatementKind::CallMessage => {
                let (value, outputs) = self.invoke(compiled, frame, pc, statement)?;
                for (id, value) in outputs {
                    self.write(compiled, frame, id, value)?;
                }
                if let (Some(lhs), Some(value)) = (statement.lhs, value) {
                    self.write(compiled, frame, lhs, value)?;
                }
            }
            StatementKind::Assignment => {
                let value = self.read(compiled, frame, operand(0)?)?;
                self.write(compiled, frame, lhs()?, value)?;
            }
            StatementKind::Goto => return Ok(Flow::Jump(target()?)),
            StatementKind::GotoIfNot => {
                if !self.read(compiled, frame, operand(0)?)?.is_truthy() {
                    return Ok(Flow::Jump(target()?));
                }
            }
            StatementKind::PushState => return Ok(Flow::Push(target()?)),
            StatementKind::EndOfThread => return Ok(Flow::EndThread),
            StatementKind::EndOfThreadIfNot => {
                if !self.read(compiled, frame, operand(0)?)?.is_truthy() {
                    return Ok(Flow::EndThread);
                }
            }
            StatementKind::DebugSite => self.trace.push(TraceEvent::DebugSite(pc)),
            StatementKind::Return => return Ok(Flow::Return),
            StatementKind::AddMulticastDelegate
            | StatementKind::RemoveMulticastDelegate
            | StatementKind::ClearMulticastDelegate
            | StatementKind::CallMulticastDelegate => self.delegate(compiled, frame, pc, statement)?,
            StatementKind::DynamicCast | StatementKind::MetaCast => {
                let class = statement.class.ok_or(EvalError::MissingOperand(pc))?;
                let value = self.read(compiled, frame, operand(0)?)?;
                let metadata = self.metadata;
                let derives = |c: TypeHash| metadata.is_child_of(c, class);
                let cast = match value {
                    Literal::Object(Some(object))
                        if metadata.object_class(object).is_some_and(derives) =>
                    {
                        Literal::Object(Some(object))
                    }
                    Literal::Class(Some(c)) if derives(c) => Literal::Class(Some(c)),
                    Literal::Class(_) => Literal::Class(None),
                    _ => Literal::Object(None),
                };
                self.write(compiled, frame, lhs()?, cast)?;
            }
            StatementKind::ObjectToBool => {
                let value = self.read(compiled, frame, operand(0)?)?;
                let valid = matches!(value, Literal::Object(Some(_)) | Literal::Class(Some(_)));
                self.write(compiled, frame, lhs()?, Literal::Bool(valid))?;
            }
        }
        Ok(Flow::Next)
    }

    /// Run a call; returns the return value and the out parameter writes.
    fn invoke(
        &mut self,
        compiled: &CompiledFunction,
        frame: &Frame,
        pc: usize,
        statement: &Statement,
    ) -> EvalResult<(Option<Literal>, Vec<(TerminalId, Literal)>)> {
        let hash = statement.function.ok_or(EvalError::MissingOperand(pc))?;
        let metadata = self.metadata;
        let function = metadata.function(hash);
        let params: Vec<_> = function
            .map(|f| f.params.iter().filter(|p| !p.is_return()).collect())
            .unwrap_or_default();

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for (i, id) in statement.rhs.iter().enumerate() {
            match params.get(i) {
                Some(param) if !param.is_input() => {
                    if let Some(zero) = Literal::default_for(&param.pin_type) {
                        outputs.push((*id, zero));
                    }
                }
                _ => inputs.push(self.read(compiled, frame, *id)?),
            }
        }

        if let Some(native) = self.natives.get(&hash) {
            return Ok((Some(native(&inputs)?), Vec::new()));
        }
        self.trace.push(match statement.kind {
            StatementKind::CallMessage => TraceEvent::Message(hash),
            _ => TraceEvent::Call(hash),
        });
        let value = function
            .and_then(|f| f.return_param())
            .and_then(|p| Literal::default_for(&p.pin_type));
        Ok((value, outputs))
    }

    fn delegate(
        &mut self,
        compiled: &CompiledFunction,
        frame: &Frame,
        pc: usize,
        statement: &Statement,
    ) -> EvalResult<()> {
        let property = statement.property.ok_or(EvalError::MissingOperand(pc))?;
        let object = match statement.context {
            Some(context) => match self.read(compiled, frame, context)? {
                Literal::Object(object) => object,
                _ => self.self_object,
            },
            None => self.self_object,
        };
        let key = (object, property);

        match statement.kind {
            StatementKind::AddMulticastDelegate | StatementKind::RemoveMulticastDelegate => {
                let id = statement.rhs.first().copied().ok_or(EvalError::MissingOperand(pc))?;
                let listener = self.read(compiled, frame, id)?;
                let listeners = self.delegates.entry(key).or_default();
                if statement.kind == StatementKind::AddMulticastDelegate {
                    if !listeners.contains(&listener) {
                        listeners.push(listener);
                    }
                } else {
                    listeners.retain(|l| *l != listener);
                }
            }
            StatementKind::ClearMulticastDelegate => {
                self.delegates.remove(&key);
            }
            _ => {
                for id in &statement.rhs {
                    self.read(compiled, frame, *id)?;
                }
                let listeners = self.delegates.get(&key).map_or(0, Vec::len);
                self.trace.push(TraceEvent::Broadcast { property, listeners });
            }
        }
        Ok(())
    }
}

fn lookup(compiled: &CompiledFunction, id: TerminalId) -> EvalResult<&Terminal> {
    compiled
        .terminal(id)
        .ok_or_else(|| EvalError::Uninitialized(format!("#{}", id.0)))
}

// ==========================================================================
// Natives
// ==========================================================================

fn float_arg(args: &[Literal], index: usize) -> EvalResult<f64> {
    match args.get(index) {
        Some(Literal::Float(value)) => Ok(value.into_inner()),
        _ => Err(EvalError::BadArgument {
            index,
            expected: "float",
        }),
    }
}

fn divide_float(args: &[Literal]) -> EvalResult<Literal> {
    let divisor = float_arg(args, 1)?;
    if divisor == 0.0 {
        return Ok(Literal::float(0.0));
    }
    Ok(Literal::float(float_arg(args, 0)? / divisor))
}

fn int_arg(args: &[Literal], index: usize) -> EvalResult<i32> {
    match args.get(index) {
        Some(Literal::Int(value)) => Ok(*value),
        _ => Err(EvalError::BadArgument {
            index,
            expected: "int",
        }),
    }
}

fn not_equal(args: &[Literal]) -> EvalResult<Literal> {
    match (args.first(), args.get(1)) {
        (Some(a), Some(b)) => Ok(Literal::Bool(a != b)),
        _ => Err(EvalError::BadArgument {
            index: args.len(),
            expected: "operand",
        }),
    }
}

/// Gate bits live in an int, so at most 32 outputs are tracked.
fn bit_count(args: &[Literal], index: usize) -> EvalResult<u32> {
    Ok(int_arg(args, index)?.clamp(0, 32) as u32)
}

fn is_marked(data: i32, bit: u32) -> bool {
    (data as u32) & (1u32 << bit) != 0
}

fn has_unmarked_bit(args: &[Literal]) -> EvalResult<Literal> {
    let data = int_arg(args, 0)?;
    let bits = bit_count(args, 1)?;
    Ok(Literal::Bool((0..bits).any(|bit| !is_marked(data, bit))))
}

fn get_unmarked_bit(args: &[Literal]) -> EvalResult<Literal> {
    let data = int_arg(args, 0)?;
    let start = int_arg(args, 1)?;
    let bits = bit_count(args, 2)?;
    if bits == 0 {
        return Ok(Literal::Int(-1));
    }
    let start = if start < 0 { 0 } else { start as u32 % bits };
    let found = (0..bits)
        .map(|step| (start + step) % bits)
        .find(|bit| !is_marked(data, *bit));
    Ok(Literal::Int(found.map_or(-1, |bit| bit as i32)))
}

fn mark_bit(args: &[Literal]) -> EvalResult<Literal> {
    let data = int_arg(args, 0)?;
    let index = int_arg(args, 1)?;
    if !(0..32).contains(&index) {
        return Ok(Literal::Int(data));
    }
    Ok(Literal::Int(((data as u32) | (1u32 << index)) as i32))
}

/// Clamp an enumerator byte to the last valid entry.
fn valid_enum_index(args: &[Literal]) -> EvalResult<Literal> {
    let Some(Literal::Int(count)) = args.first() else {
        return Err(EvalError::BadArgument {
            index: 0,
            expected: "int",
        });
    };
    let Some(Literal::Byte(value)) = args.get(1) else {
        return Err(EvalError::BadArgument {
            index: 1,
            expected: "byte",
        });
    };
    let last = (*count - 1).clamp(0, u8::MAX as i32) as u8;
    Ok(Literal::Byte((*value).min(last)))
}
