use std::rc::Rc;

use crate::ast::{BinaryOp, BlockId, ExprId, ExprKind, Pos, Program, StmtId, StmtKind};
use crate::types::{self, Type};
use crate::value::{FunctionValue, Symbol, Value};

use super::builtins;
use super::error::RuntimeError;
use super::frame::{Frame, FrameStack, Task};

/// Injected line sink: every `print` call and error/backtrace report goes
/// through it, one line per call.
pub type PrintFn = Box<dyn FnMut(&str)>;

pub enum ExecOutcome {
    Completed,
    /// An error reached the top of the frame stack; the backtrace and the
    /// message have been reported through the sink.
    Failed,
}

/// An error that found no enclosing catch, with the call sites collected
/// while unwinding.
struct Unhandled {
    error: RuntimeError,
    backtrace: Vec<StmtId>,
}

/// The execution engine. Owns the frame stack, the shared value stack and
/// the position cursor; drives evaluation through the two-phase
/// prepare/execute protocol over arena positions. State persists across
/// `execute` calls, which is what lets a REPL session keep its bindings.
pub struct Evaluator {
    frames: FrameStack,
    values: Vec<Value>,
    cursor: Option<Pos>,
    print: PrintFn,
}

impl Evaluator {
    pub fn new(print: PrintFn) -> Self {
        builtins::check_registry();

        let mut frames = FrameStack::new();
        for name in builtins::BUILTIN_NAMES {
            frames.global_mut().symbols.insert(
                Rc::from(*name),
                Symbol::read_only(Value::Function(Rc::new(FunctionValue::builtin()))),
            );
        }

        Evaluator {
            frames,
            values: Vec::new(),
            cursor: None,
            print,
        }
    }

    /// Runs a top-level sequence to completion (or to an unhandled error,
    /// which is reported through the sink).
    pub fn execute(&mut self, program: &Program, root: BlockId) -> ExecOutcome {
        self.cursor = Some(program.entry(root));
        match self.main_loop(program) {
            Ok(()) => ExecOutcome::Completed,
            Err(unhandled) => {
                self.report_unhandled(program, unhandled);
                ExecOutcome::Failed
            }
        }
    }

    /// A global binding's current value, for embedding and tests.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.frames
            .global()
            .symbols
            .get(name)
            .map(|symbol| symbol.value.clone())
    }

    fn main_loop(&mut self, program: &Program) -> Result<(), Unhandled> {
        loop {
            let pos = match self.align_cursor(program) {
                Some(pos) => pos,
                None => return Ok(()),
            };
            let stmt = program.stmt_at(pos).expect("aligned cursor out of range");

            // The frame remembers which statement its pending work belongs
            // to; jump targets are computed from this site, not from the
            // live cursor, which may move mid-statement when a call returns.
            self.frames.current().site = Some(pos);

            if let Err(error) = self.prepare_stmt(program, pos, stmt) {
                self.handle_exception(program, error)?;
                continue;
            }

            let initial = self.cursor;
            while let Some(task) = self.frames.current().work.pop() {
                if let Err(error) = self.execute_task(program, task) {
                    self.handle_exception(program, error)?;
                }
            }

            // A jump already points at the next instruction
            if self.cursor == initial {
                self.cursor = Some(pos.next());
            }
        }
    }

    /// Resolves an exhausted cursor by popping finished frames and resuming
    /// at their stored return addresses. `None` means the run is over.
    fn align_cursor(&mut self, program: &Program) -> Option<Pos> {
        loop {
            if let Some(pos) = self.cursor {
                if program.stmt_at(pos).is_some() {
                    return Some(pos);
                }
            }
            if self.frames.depth() > 1 {
                self.frames.pop();
                self.cursor = self.frames.current().return_address;
            } else {
                return None;
            }
        }
    }

    // ------------------------------------------------------------------
    // Prepare: convert one statement's tree into a flat post-order work
    // list on the current frame. Validation happens before any push, so a
    // failed prepare leaves no partial work behind.
    // ------------------------------------------------------------------

    fn prepare_stmt(
        &mut self,
        program: &Program,
        pos: Pos,
        id: StmtId,
    ) -> Result<(), RuntimeError> {
        match &program.stmt(id).kind {
            StmtKind::Assign { target, value } => {
                if !matches!(program.expr(*target), ExprKind::Identifier(_)) {
                    return Err(RuntimeError::name("Identifier expected for assignment"));
                }
                self.push_task(Task::Stmt(id));
                self.prepare_expr(program, *value);
            }
            StmtKind::If { condition, .. } | StmtKind::While { condition, .. } => {
                self.push_task(Task::Stmt(id));
                self.prepare_expr(program, *condition);
            }
            StmtKind::ElseIf { condition, .. } => {
                self.check_conditional_predecessor(program, pos, "elseif")?;
                self.push_task(Task::Stmt(id));
                self.prepare_expr(program, *condition);
            }
            StmtKind::Else { .. } => {
                self.check_conditional_predecessor(program, pos, "else")?;
                self.push_task(Task::Stmt(id));
            }
            StmtKind::Return { value } => {
                self.push_task(Task::Stmt(id));
                self.prepare_expr(program, *value);
            }
            // A call statement is just its call expression
            StmtKind::Call { call } => self.prepare_expr(program, *call),
            _ => self.push_task(Task::Stmt(id)),
        }
        Ok(())
    }

    /// `elseif`/`else` are only legal immediately after `if`/`elseif` in
    /// the same sequence; a dangling one fails when reached, not at parse.
    fn check_conditional_predecessor(
        &self,
        program: &Program,
        pos: Pos,
        keyword: &'static str,
    ) -> Result<(), RuntimeError> {
        match program.stmt_before(pos).map(|id| &program.stmt(id).kind) {
            Some(StmtKind::If { .. }) | Some(StmtKind::ElseIf { .. }) => Ok(()),
            _ => Err(RuntimeError::UnexpectedElse(keyword)),
        }
    }

    fn prepare_expr(&mut self, program: &Program, id: ExprId) {
        match program.expr(id) {
            ExprKind::Binary { left, right, .. } => {
                self.push_task(Task::Expr(id));
                // Right first, so the left operand executes (and stacks
                // its value) first
                self.prepare_expr(program, *right);
                self.prepare_expr(program, *left);
            }
            ExprKind::ListLiteral { elements, .. } => {
                self.push_task(Task::Expr(id));
                for element in elements {
                    self.prepare_expr(program, *element);
                }
            }
            ExprKind::Call { args, .. } | ExprKind::TypedExpr { args, .. } => {
                self.push_task(Task::Expr(id));
                for arg in args {
                    self.prepare_expr(program, *arg);
                }
            }
            ExprKind::IndexedIdentifier { index, .. } => {
                self.push_task(Task::Expr(id));
                self.prepare_expr(program, *index);
            }
            ExprKind::Identifier(_) | ExprKind::Literal(_) | ExprKind::Lambda { .. } => {
                self.push_task(Task::Expr(id));
            }
        }
    }

    fn push_task(&mut self, task: Task) {
        self.frames.current().work.push(task);
    }

    // ------------------------------------------------------------------
    // Execute
    // ------------------------------------------------------------------

    fn execute_task(&mut self, program: &Program, task: Task) -> Result<(), RuntimeError> {
        match task {
            Task::Stmt(id) => self.execute_stmt(program, id),
            Task::Expr(id) => self.execute_expr(program, id),
        }
    }

    /// The position of the statement the current frame's work belongs to.
    fn site(&mut self) -> Pos {
        self.frames.current().site.expect("executing without a site")
    }

    fn execute_stmt(&mut self, program: &Program, id: StmtId) -> Result<(), RuntimeError> {
        match &program.stmt(id).kind {
            StmtKind::Block(body) => {
                let ret = self.site().next();
                self.enter_block(program, *body, ret, Frame::new());
            }
            StmtKind::Assign { target, .. } => self.execute_assign(program, *target)?,
            StmtKind::If { body, .. } | StmtKind::ElseIf { body, .. } => {
                let body = *body;
                let condition = self.pop_condition()?;
                let site = self.site();
                if condition {
                    let ret = self.skip_conditional_tail(program, site.next());
                    self.enter_block(program, body, ret, Frame::new());
                } else {
                    self.cursor = Some(site.next());
                }
            }
            StmtKind::Else { body } => {
                let ret = self.site().next();
                self.enter_block(program, *body, ret, Frame::new());
            }
            StmtKind::While { body, .. } => {
                let body = *body;
                let condition = self.pop_condition()?;
                let site = self.site();
                if condition {
                    // Falling off the body returns to the while node, which
                    // re-tests the guard
                    self.enter_block(program, body, site, Frame::new());
                } else {
                    self.cursor = Some(site.next());
                }
            }
            StmtKind::Break => self.execute_break(program)?,
            StmtKind::Return { .. } => {
                if self.frames.depth() == 1 {
                    return Err(RuntimeError::ReturnOutsideBlock);
                }
                self.frames.pop();
                self.cursor = self.frames.current().return_address;
            }
            StmtKind::Function { name, params, body } => {
                self.define_function(name.clone(), params.clone(), *body)?;
            }
            StmtKind::Try { body } => {
                let site = self.site();
                let next = site.next();
                match program.stmt_at(next).map(|id| &program.stmt(id).kind) {
                    Some(StmtKind::Catch { .. }) => {
                        self.enter_block(program, *body, next, Frame::new())
                    }
                    _ => return Err(RuntimeError::MissingCatchAfterTry),
                }
            }
            StmtKind::Catch { binding, body } => {
                // Only active when the unwinder left a pending exception on
                // top of the value stack; otherwise a no-op passthrough
                if let Some(Value::Exception(message)) = self.values.last() {
                    let message = message.clone();
                    self.values.pop();
                    let mut frame = Frame::new();
                    if let Some(name) = binding {
                        frame
                            .symbols
                            .insert(name.clone(), Symbol::new(Value::Str(message)));
                    }
                    let ret = self.site().next();
                    self.enter_block(program, *body, ret, frame);
                }
            }
            StmtKind::Import { module, .. } => self.execute_import(program, *module)?,
            // Never scheduled: prepare delegates to the call expression
            StmtKind::Call { .. } => {}
            StmtKind::Nop => {}
        }
        Ok(())
    }

    fn enter_block(&mut self, program: &Program, body: BlockId, ret: Pos, frame: Frame) {
        self.frames.current().return_address = Some(ret);
        self.frames.push(frame);
        self.cursor = Some(program.entry(body));
    }

    /// First position after the whole `if/elseif*/else?` chain.
    fn skip_conditional_tail(&self, program: &Program, mut pos: Pos) -> Pos {
        while let Some(id) = program.stmt_at(pos) {
            match program.stmt(id).kind {
                StmtKind::ElseIf { .. } | StmtKind::Else { .. } => pos = pos.next(),
                _ => break,
            }
        }
        pos
    }

    fn execute_assign(&mut self, program: &Program, target: ExprId) -> Result<(), RuntimeError> {
        let name = match program.expr(target) {
            ExprKind::Identifier(name) => name.clone(),
            _ => return Err(RuntimeError::name("Identifier expected for assignment")),
        };
        let value = self.pop_value();

        match self.frames.find_symbol_frame(&name) {
            Some(index) => {
                let current = self.frames.is_current(index);
                let slot = self
                    .frames
                    .frame_mut(index)
                    .symbols
                    .get(&*name)
                    .cloned()
                    .expect("symbol frame lost its symbol");
                if slot.read_only {
                    if current {
                        return Err(RuntimeError::name(format!("{} is read only", name)));
                    }
                    // Read-only in an outer frame: shadow instead of reject
                    self.frames
                        .current()
                        .symbols
                        .insert(name, Symbol::new(value));
                } else if slot.value.type_tag() != value.type_tag() {
                    // The slot keeps its type; the assigned value is coerced
                    let cast = types::cast(value, slot.value.type_tag())?;
                    self.frames
                        .frame_mut(index)
                        .symbols
                        .insert(name, Symbol::new(cast));
                } else {
                    self.frames
                        .frame_mut(index)
                        .symbols
                        .insert(name, Symbol::new(value));
                }
            }
            None => {
                self.frames
                    .current()
                    .symbols
                    .insert(name, Symbol::new(value));
            }
        }
        Ok(())
    }

    /// Counts frames up to the nearest one whose return address is a while
    /// node, drops exactly those, and resumes after the loop.
    fn execute_break(&mut self, program: &Program) -> Result<(), RuntimeError> {
        let mut frames_to_drop = 0;
        let mut found = false;
        for frame in self.frames.iter_innermost_first() {
            let is_loop = frame.return_address.is_some_and(|ret| {
                matches!(
                    program.stmt_at(ret).map(|id| &program.stmt(id).kind),
                    Some(StmtKind::While { .. })
                )
            });
            if is_loop {
                found = true;
                break;
            }
            frames_to_drop += 1;
        }

        if !found {
            return Err(RuntimeError::BreakOutsideLoop);
        }

        for _ in 0..frames_to_drop {
            self.frames.pop();
        }
        let ret = self
            .frames
            .current()
            .return_address
            .expect("loop frame lost its return address");
        self.cursor = Some(ret.next());
        Ok(())
    }

    fn define_function(
        &mut self,
        name: Rc<str>,
        params: Vec<Rc<str>>,
        body: BlockId,
    ) -> Result<(), RuntimeError> {
        let current = self.frames.current();
        if current.symbols.contains_key(&*name) {
            return Err(RuntimeError::name(format!("{} is already defined", name)));
        }
        let function = FunctionValue {
            params,
            body: Some(body),
        };
        current
            .symbols
            .insert(name, Symbol::read_only(Value::Function(Rc::new(function))));
        Ok(())
    }

    /// Registers the module's top-level functions into the current frame;
    /// a zero-argument `init` instead runs immediately, exactly once.
    fn execute_import(&mut self, program: &Program, module: BlockId) -> Result<(), RuntimeError> {
        let mut init_body = None;
        for id in program.block_stmts(module) {
            if let StmtKind::Function { name, params, body } = &program.stmt(*id).kind {
                if &**name == "init" {
                    if params.is_empty() {
                        if init_body.is_some() {
                            return Err(RuntimeError::name("init already declared"));
                        }
                        init_body = Some(*body);
                    }
                    continue;
                }
                self.define_function(name.clone(), params.clone(), *body)?;
            }
        }

        if let Some(body) = init_body {
            let ret = self.site().next();
            self.enter_block(program, body, ret, Frame::new());
        }
        Ok(())
    }

    fn execute_expr(&mut self, program: &Program, id: ExprId) -> Result<(), RuntimeError> {
        match program.expr(id) {
            ExprKind::Identifier(name) => {
                let symbol = self.frames.find_symbol(name).ok_or_else(|| {
                    RuntimeError::name(format!("No such symbol: \"{}\"", name))
                })?;
                self.values.push(symbol.value.clone());
            }
            ExprKind::IndexedIdentifier { name, .. } => {
                let element = self.read_indexed(name)?;
                self.values.push(element);
            }
            ExprKind::Literal(value) => self.values.push(value.clone()),
            ExprKind::Binary { op, .. } => {
                let right = self.pop_value();
                let left = self.pop_value();
                let result = binary_op(*op, left, right)?;
                self.values.push(result);
            }
            ExprKind::ListLiteral {
                elem_keyword,
                elements,
            } => {
                let list = self.build_list(elem_keyword, elements.len())?;
                self.values.push(list);
            }
            ExprKind::Lambda { params, body } => {
                let function = FunctionValue {
                    params: params.clone(),
                    body: Some(*body),
                };
                self.values.push(Value::Function(Rc::new(function)));
            }
            ExprKind::TypedExpr { keyword, args } => {
                if args.len() != 1 {
                    return Err(RuntimeError::Arity(format!(
                        "Invalid parameters passed to \"{}\"; expected 1",
                        keyword
                    )));
                }
                let to = Type::from_keyword(keyword).expect("typed expression keyword");
                let value = self.pop_value();
                let cast = types::cast(value, to)?;
                self.values.push(cast);
            }
            ExprKind::Call { name, args } => self.execute_call(program, name, args.len())?,
        }
        Ok(())
    }

    fn read_indexed(&mut self, name: &str) -> Result<Value, RuntimeError> {
        let index_value = self.pop_value();
        let index = index_value
            .as_int()
            .ok_or_else(|| RuntimeError::unsupported_cast(index_value.type_tag(), Type::Int))?;
        let symbol = self
            .frames
            .find_symbol(name)
            .ok_or_else(|| RuntimeError::name(format!("No such symbol: \"{}\"", name)))?;

        fn element<T: Clone>(list: &[T], index: i64) -> Result<T, RuntimeError> {
            usize::try_from(index)
                .ok()
                .and_then(|i| list.get(i).cloned())
                .ok_or(RuntimeError::IndexOutOfBounds {
                    index,
                    length: list.len(),
                })
        }

        match &symbol.value {
            Value::IntList(list) => element(&list.borrow(), index).map(Value::Int),
            Value::FloatList(list) => element(&list.borrow(), index).map(Value::Float),
            Value::StringList(list) => element(&list.borrow(), index).map(Value::Str),
            _ => Err(RuntimeError::name(format!("{} is not a list", name))),
        }
    }

    /// Pops `count` prepared elements (they come off in declaration order)
    /// and builds a homogeneous list, coercing each element to the declared
    /// element type.
    fn build_list(&mut self, elem_keyword: &str, count: usize) -> Result<Value, RuntimeError> {
        let elem_type = Type::from_keyword(elem_keyword)
            .filter(|t| t.list_of().is_some())
            .ok_or_else(|| {
                RuntimeError::invalid_operation(format!("Invalid type given: {}", elem_keyword))
            })?;

        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            let value = self.pop_value();
            elements.push(types::cast(value, elem_type)?);
        }

        let list = match elem_type {
            Type::Int => Value::IntList(Rc::new(
                elements
                    .into_iter()
                    .map(|v| v.as_int().expect("cast to int"))
                    .collect::<Vec<_>>()
                    .into(),
            )),
            Type::Float => Value::FloatList(Rc::new(
                elements
                    .into_iter()
                    .map(|v| match v {
                        Value::Float(x) => x,
                        _ => unreachable!("cast to float"),
                    })
                    .collect::<Vec<_>>()
                    .into(),
            )),
            Type::String => Value::StringList(Rc::new(
                elements
                    .into_iter()
                    .map(|v| match v {
                        Value::Str(s) => s,
                        _ => unreachable!("cast to string"),
                    })
                    .collect::<Vec<_>>()
                    .into(),
            )),
            _ => unreachable!("element type without a list form"),
        };
        Ok(list)
    }

    fn execute_call(
        &mut self,
        program: &Program,
        name: &Rc<str>,
        argc: usize,
    ) -> Result<(), RuntimeError> {
        let symbol = self
            .frames
            .find_symbol(name)
            .ok_or_else(|| RuntimeError::name(format!("No such function: \"{}\"", name)))?;
        let function = match &symbol.value {
            Value::Function(function) => function.clone(),
            _ => return Err(RuntimeError::name(format!("{} is not a function", name))),
        };

        match function.body {
            Some(body) => {
                // Fewer arguments than parameters fails before the body
                // runs; extras are evaluated and ignored
                if argc < function.params.len() {
                    return Err(RuntimeError::arity(name, function.params.len(), argc));
                }
                let mut passed = Vec::with_capacity(argc);
                for _ in 0..argc {
                    passed.push(self.pop_value());
                }

                let ret = self.site().next();
                let mut frame = Frame::new();
                for (param, value) in function.params.iter().zip(passed) {
                    frame.symbols.insert(param.clone(), Symbol::new(value));
                }
                self.enter_block(program, body, ret, frame);
            }
            None => {
                let mut passed = Vec::with_capacity(argc);
                for _ in 0..argc {
                    passed.push(self.pop_value());
                }
                let expected = builtins::arity_of(name)
                    .ok_or_else(|| RuntimeError::name(format!("No such function: \"{}\"", name)))?;
                if argc != expected {
                    return Err(RuntimeError::arity(name, expected, argc));
                }

                let sink = &mut self.print;
                let result = builtins::dispatch(name, &passed, |line| sink(line))?;
                self.values.push(result);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Exceptions
    // ------------------------------------------------------------------

    /// Unwinds frames toward the nearest catch, collecting call sites for
    /// the backtrace. Exhaustion clears the machine and reports unhandled.
    fn handle_exception(
        &mut self,
        program: &Program,
        error: RuntimeError,
    ) -> Result<(), Unhandled> {
        let mut backtrace = Vec::new();
        if let Some(id) = self.cursor.and_then(|pos| program.stmt_at(pos)) {
            backtrace.push(id);
        }

        while self.frames.depth() > 1 {
            self.frames.pop();
            let ret = self.frames.current().return_address;
            if let Some(ret) = ret {
                if let Some(prev) = program.stmt_before(ret) {
                    if matches!(program.stmt(prev).kind, StmtKind::Call { .. }) {
                        backtrace.push(prev);
                    }
                }
                let is_catch = matches!(
                    program.stmt_at(ret).map(|id| &program.stmt(id).kind),
                    Some(StmtKind::Catch { .. })
                );
                if is_catch {
                    self.cursor = Some(ret);
                    self.values
                        .push(Value::Exception(error.to_string().into()));
                    return Ok(());
                }
            }
        }

        self.values.clear();
        self.frames.current().work.clear();
        self.cursor = None;
        Err(Unhandled { error, backtrace })
    }

    fn report_unhandled(&mut self, program: &Program, unhandled: Unhandled) {
        (self.print)("Backtrace (most recent call first):");
        for id in &unhandled.backtrace {
            if let Some(debug) = &program.stmt(*id).debug {
                (self.print)(&format!(
                    "    {} at {}:{}:{}",
                    debug.text, debug.file, debug.line, debug.column
                ));
            }
        }
        (self.print)(&unhandled.error.to_string());
    }

    // ------------------------------------------------------------------
    // Value stack
    // ------------------------------------------------------------------

    fn pop_value(&mut self) -> Value {
        self.values.pop().expect("value stack underflow")
    }

    fn pop_condition(&mut self) -> Result<bool, RuntimeError> {
        let value = self.pop_value();
        match types::cast(value, Type::Bool)? {
            Value::Bool(b) => Ok(b),
            _ => unreachable!("cast to bool"),
        }
    }
}

/// Applies a binary operator. The right operand is first coerced to the
/// left operand's type; arithmetic keeps that type, comparisons produce a
/// bool. Every supported combination is spelled out here.
fn binary_op(op: BinaryOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
    let right = types::cast(right, left.type_tag())?;

    let result = match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => match op {
            BinaryOp::Add => Value::Int(a.wrapping_add(*b)),
            BinaryOp::Sub => Value::Int(a.wrapping_sub(*b)),
            BinaryOp::Mul => Value::Int(a.wrapping_mul(*b)),
            BinaryOp::Div => {
                if *b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                Value::Int(a.wrapping_div(*b))
            }
            BinaryOp::Mod => {
                if *b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                Value::Int(a.wrapping_rem(*b))
            }
            BinaryOp::Eq => Value::Bool(a == b),
            BinaryOp::NotEq => Value::Bool(a != b),
            BinaryOp::Less => Value::Bool(a < b),
            BinaryOp::LessEq => Value::Bool(a <= b),
            BinaryOp::Greater => Value::Bool(a > b),
            BinaryOp::GreaterEq => Value::Bool(a >= b),
        },
        (Value::Float(a), Value::Float(b)) => float_op(op, f64::from(*a), f64::from(*b), true),
        (Value::Double(a), Value::Double(b)) => float_op(op, *a, *b, false),
        (Value::Str(a), Value::Str(b)) => match op {
            BinaryOp::Add => Value::Str(format!("{}{}", a, b).into()),
            BinaryOp::Eq => Value::Bool(a == b),
            BinaryOp::NotEq => Value::Bool(a != b),
            _ => return Err(invalid_op(op, Type::String)),
        },
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinaryOp::Eq => Value::Bool(a == b),
            BinaryOp::NotEq => Value::Bool(a != b),
            _ => return Err(invalid_op(op, Type::Bool)),
        },
        (Value::Null, Value::Null) => match op {
            BinaryOp::Eq => Value::Bool(true),
            BinaryOp::NotEq => Value::Bool(false),
            _ => return Err(invalid_op(op, Type::Null)),
        },
        // Reference comparison for the remaining kinds
        (Value::IntList(a), Value::IntList(b)) => ref_op(op, Rc::ptr_eq(a, b), Type::IntList)?,
        (Value::FloatList(a), Value::FloatList(b)) => {
            ref_op(op, Rc::ptr_eq(a, b), Type::FloatList)?
        }
        (Value::StringList(a), Value::StringList(b)) => {
            ref_op(op, Rc::ptr_eq(a, b), Type::StringList)?
        }
        (Value::Function(a), Value::Function(b)) => {
            ref_op(op, Rc::ptr_eq(a, b), Type::Function)?
        }
        (Value::Exception(a), Value::Exception(b)) => ref_op(op, a == b, Type::Exception)?,
        _ => unreachable!("operands share a type after coercion"),
    };
    Ok(result)
}

fn float_op(op: BinaryOp, a: f64, b: f64, single: bool) -> Value {
    let arith = |x: f64| {
        if single {
            Value::Float(x as f32)
        } else {
            Value::Double(x)
        }
    };
    match op {
        BinaryOp::Add => arith(a + b),
        BinaryOp::Sub => arith(a - b),
        BinaryOp::Mul => arith(a * b),
        BinaryOp::Div => arith(a / b),
        BinaryOp::Mod => arith(a % b),
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::NotEq => Value::Bool(a != b),
        BinaryOp::Less => Value::Bool(a < b),
        BinaryOp::LessEq => Value::Bool(a <= b),
        BinaryOp::Greater => Value::Bool(a > b),
        BinaryOp::GreaterEq => Value::Bool(a >= b),
    }
}

fn ref_op(op: BinaryOp, equal: bool, tag: Type) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(equal)),
        BinaryOp::NotEq => Ok(Value::Bool(!equal)),
        _ => Err(invalid_op(op, tag)),
    }
}

fn invalid_op(op: BinaryOp, tag: Type) -> RuntimeError {
    RuntimeError::invalid_operation(format!("Unsupported operation: {} on type {}", op, tag))
}
