use crate::common::*;
use crate::script::ast::*;
use crate::script::input_source::InputSpan;
use crate::script::Program;

use super::error::{EvalError, EvalErrorKind, EvalFrame};
use super::store::Store;
use super::value::*;

pub type EvalResult = Result<Value, EvalError>;

/// Deepest nesting of statement and expression evaluations, counting every
/// level of every active function call.
pub const MAX_EVAL_DEPTH: usize = 256;

/// Host callback reachable from a script by name. Its arguments are the
/// evaluated call arguments; whatever it does is a side effect.
pub type NativeCallback<'p> = Box<dyn FnMut(&[Value]) + 'p>;

struct NativeFunction<'p> {
    name: String,
    callback: NativeCallback<'p>,
}

/// Tree-walking interpreter for a single program. Each interpreter owns its
/// own scope stack and object heap; interpreters over the same program share
/// nothing but the (immutable) program itself.
pub struct Interpreter<'p> {
    program: &'p Program,
    store: Store,
    natives: Vec<NativeFunction<'p>>,
    logger: Box<dyn Logger>,
}

impl<'p> Interpreter<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self::with_logger(program, Box::new(DummyLogger))
    }

    pub fn with_logger(program: &'p Program, logger: Box<dyn Logger>) -> Self {
        Self {
            program,
            store: Store::new(),
            natives: Vec::new(),
            logger,
        }
    }

    /// Binds a host function under `name` in the global scope. Binding the
    /// same name again replaces the earlier binding.
    pub fn bind_native<F>(&mut self, name: &str, callback: F)
        where F: FnMut(&[Value]) + 'p
    {
        let index = self.natives.len();
        self.natives.push(NativeFunction { name: name.to_string(), callback: Box::new(callback) });
        let value = self.store.alloc_object(Object::NativeFunction(NativeFunctionObject {
            name: name.to_string(),
            index,
        }));
        self.store.write_global(name, value);
        log!(self.logger, "bound native function '{}'", name);
    }

    /// Evaluates the whole program. The result is the value of its last
    /// statement.
    pub fn evaluate(&mut self) -> EvalResult {
        let program = self.program;
        let statements = &program.heap[program.root].statements;
        self.run(|ctx| ctx.eval_statements(statements))
    }

    pub fn evaluate_statement(&mut self, id: StatementId) -> EvalResult {
        self.run(|ctx| ctx.eval_statement(id))
    }

    pub fn evaluate_expression(&mut self, id: ExpressionId) -> EvalResult {
        self.run(|ctx| ctx.eval_expression(id))
    }

    /// Reads a variable from the global scope.
    pub fn value_of(&self, name: &str) -> Option<&Value> {
        self.store.read_global(name)
    }

    /// Returns the elements of an array value produced by this interpreter.
    /// Objects that are no longer reachable from a variable may be reclaimed
    /// by the next evaluation, after which this returns `None` (or another
    /// object that reuses the slot).
    pub fn array_elements(&self, value: &Value) -> Option<&[Value]> {
        match value {
            Value::Object(heap_pos) => match self.store.get_object(*heap_pos) {
                Some(Object::Array(values)) => Some(values.as_slice()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Returns the properties of a plain object value, with the same validity
    /// as `array_elements`.
    pub fn object_properties(&self, value: &Value) -> Option<&HashMap<String, Value>> {
        match value {
            Value::Object(heap_pos) => match self.store.get_object(*heap_pos) {
                Some(Object::PlainObject(properties)) => Some(properties),
                _ => None,
            },
            _ => None,
        }
    }

    /// Number of object slots in the heap, both live and reclaimed.
    pub fn heap_size(&self) -> usize {
        self.store.heap_regions.len()
    }

    pub fn logger(&self) -> &dyn Logger {
        &*self.logger
    }

    /// Runs an evaluation with a fresh context. A failed evaluation leaves
    /// scopes behind, these are discarded so the interpreter stays usable.
    fn run<F>(&mut self, f: F) -> EvalResult
        where F: FnOnce(&mut EvalContext<'_, 'p>) -> EvalResult
    {
        let program = self.program;
        let depth = self.store.scopes.len();
        let mut ctx = EvalContext {
            heap: &program.heap,
            store: &mut self.store,
            natives: &mut self.natives,
            logger: &mut *self.logger,
            frames: Vec::new(),
            depth: 0,
        };

        let result = f(&mut ctx);
        if result.is_err() {
            self.store.scopes.truncate(depth);
            self.store.temporaries.clear();
        }
        result
    }
}

enum Callee {
    Native(usize),
    Function(FunctionDeclarationId),
}

/// Everything a single evaluation needs, passed explicitly through every
/// evaluation step.
struct EvalContext<'a, 'p> {
    heap: &'p Heap,
    store: &'a mut Store,
    natives: &'a mut [NativeFunction<'p>],
    logger: &'a mut dyn Logger,
    frames: Vec<EvalFrame>,
    // Number of statement and expression evaluations currently active
    depth: usize,
}

impl<'a, 'p> EvalContext<'a, 'p> {
    fn error(&mut self, kind: EvalErrorKind, span: InputSpan) -> EvalError {
        log!(self.logger, "evaluation failed: {}", &kind);
        EvalError::new(kind, span, self.frames.clone())
    }

    fn expect<T>(&mut self, result: Result<T, EvalErrorKind>, span: InputSpan) -> Result<T, EvalError> {
        result.map_err(|kind| self.error(kind, span))
    }

    fn enter(&mut self, span: InputSpan) -> Result<(), EvalError> {
        if self.depth >= MAX_EVAL_DEPTH {
            return Err(self.error(EvalErrorKind::DepthExceeded(MAX_EVAL_DEPTH), span));
        }
        self.depth += 1;
        Ok(())
    }

    //--------------------------------------------------------------------------
    // Statements
    //--------------------------------------------------------------------------

    /// Evaluates statements in order. Every statement is evaluated, a return
    /// statement does not end the sequence.
    fn eval_statements(&mut self, statements: &[StatementId]) -> EvalResult {
        let mut result = Value::Undefined;
        for statement_id in statements {
            result = self.eval_statement(*statement_id)?;
        }
        Ok(result)
    }

    fn eval_statement(&mut self, id: StatementId) -> EvalResult {
        self.enter(self.heap[id].span())?;
        // Nothing outside the scopes and temporaries is live between
        // statements, so this is where the heap is collected
        if let Some(reclaimed) = self.store.maybe_collect() {
            log!(self.logger, "reclaimed {} object(s)", reclaimed);
        }
        let result = self.eval_statement_inner(id);
        self.depth -= 1;
        result
    }

    fn eval_statement_inner(&mut self, id: StatementId) -> EvalResult {
        let heap = self.heap;
        match &heap[id] {
            Statement::Block(stmt) => self.eval_statements(&stmt.statements),
            Statement::Function(stmt) => {
                let value = self.store.alloc_object(Object::Function(FunctionObject {
                    declaration: stmt.this,
                }));
                self.store.write(&stmt.identifier.value, value.clone());
                Ok(value)
            },
            Statement::Variable(stmt) => {
                let mut result = Value::Undefined;
                for declarator in &stmt.declarations {
                    let value = self.eval_expression(declarator.initializer)?;
                    self.store.write(&declarator.identifier.value, value.clone());
                    result = value;
                }
                Ok(result)
            },
            Statement::If(stmt) => {
                if self.eval_test(stmt.test)? {
                    self.store.push_scope();
                    let result = self.eval_statement(stmt.consequent)?;
                    self.store.pop_scope();
                    Ok(result)
                } else {
                    Ok(Value::Undefined)
                }
            },
            Statement::For(stmt) => {
                // One scope for the entire loop, not one per iteration
                self.store.push_scope();
                self.eval_statement(stmt.init)?;
                while self.eval_test(stmt.test)? {
                    self.eval_statement(stmt.body)?;
                    self.eval_expression(stmt.update)?;
                }
                self.store.pop_scope();
                Ok(Value::Undefined)
            },
            Statement::Return(stmt) => match stmt.argument {
                Some(argument) => self.eval_expression(argument),
                None => Ok(Value::Undefined),
            },
            Statement::Expression(stmt) => self.eval_expression(stmt.expression),
        }
    }

    fn eval_test(&mut self, test: ExpressionId) -> Result<bool, EvalError> {
        let value = self.eval_expression(test)?;
        let span = self.heap[test].span();
        self.expect(value.expect_bool(), span)
    }

    //--------------------------------------------------------------------------
    // Expressions
    //--------------------------------------------------------------------------

    fn eval_expression(&mut self, id: ExpressionId) -> EvalResult {
        self.enter(self.heap[id].span())?;
        let result = self.eval_expression_inner(id);
        self.depth -= 1;
        result
    }

    fn eval_expression_inner(&mut self, id: ExpressionId) -> EvalResult {
        let heap = self.heap;
        match &heap[id] {
            Expression::Identifier(expr) => self.read_variable(&expr.identifier),
            Expression::Binary(expr) => {
                let left = self.eval_expression(expr.left)?;
                self.store.temporaries.push(left);
                let right = self.eval_expression(expr.right)?;
                let left = self.store.temporaries.pop().unwrap_or_default();
                let left = self.expect(left.expect_int(), heap[expr.left].span())?;
                let right = self.expect(right.expect_int(), heap[expr.right].span())?;
                match expr.operation {
                    BinaryOperator::Add => Ok(Value::Int(left.wrapping_add(right))),
                    BinaryOperator::LessThan => Ok(Value::Bool(left < right)),
                    BinaryOperator::GreaterThan => Ok(Value::Bool(left > right)),
                    operation => Err(self.error(EvalErrorKind::UnsupportedOperator(operation.symbol()), expr.span)),
                }
            },
            Expression::Assignment(expr) => {
                let value = self.eval_expression(expr.right)?;
                match expr.operation {
                    AssignmentOperator::Set => self.assign(expr.left, value)?,
                }
                Ok(Value::Undefined)
            },
            Expression::Update(expr) => self.eval_update(expr),
            Expression::Call(expr) => self.eval_call(expr),
            Expression::Member(expr) => {
                let (heap_pos, index) = self.resolve_element(expr)?;
                match self.store.object(heap_pos) {
                    Object::Array(values) => Ok(values[index].clone()),
                    _ => unreachable!(),
                }
            },
            Expression::Array(expr) => {
                let values = self.eval_rooted(&expr.elements)?;
                Ok(self.store.alloc_object(Object::Array(values)))
            },
            Expression::Object(expr) => {
                let base = self.store.temporaries.len();
                let mut keys = Vec::with_capacity(expr.properties.len());
                for property in &expr.properties {
                    let key = match &heap[property.key] {
                        Expression::Identifier(key) => key.identifier.value.clone(),
                        Expression::IntLiteral(key) => key.value.to_string(),
                        key => return Err(self.error(
                            EvalErrorKind::UnsupportedNodeKind(key.kind_name()), key.span()
                        )),
                    };
                    keys.push(key);
                    let value = self.eval_expression(property.value)?;
                    self.store.temporaries.push(value);
                }
                let values = self.store.temporaries.split_off(base);
                let properties = keys.into_iter().zip(values).collect();
                Ok(self.store.alloc_object(Object::PlainObject(properties)))
            },
            Expression::IntLiteral(expr) => Ok(Value::Int(expr.value)),
        }
    }

    /// Evaluates expressions in order. Values stay on the temporaries stack
    /// until all of them are evaluated, so a collection in between keeps them.
    fn eval_rooted(&mut self, expressions: &[ExpressionId]) -> Result<Vec<Value>, EvalError> {
        let base = self.store.temporaries.len();
        for expression in expressions {
            let value = self.eval_expression(*expression)?;
            self.store.temporaries.push(value);
        }
        Ok(self.store.temporaries.split_off(base))
    }

    fn read_variable(&mut self, identifier: &Identifier) -> EvalResult {
        match self.store.read(&identifier.value) {
            Some(value) => Ok(value.clone()),
            None => Err(self.error(
                EvalErrorKind::UnboundIdentifier(identifier.value.clone()), identifier.span
            )),
        }
    }

    /// Writes a value to an identifier (in the innermost scope) or to an
    /// array element (in place, visible through every reference).
    fn assign(&mut self, target: ExpressionId, value: Value) -> Result<(), EvalError> {
        let heap = self.heap;
        match &heap[target] {
            Expression::Identifier(expr) => {
                self.store.write(&expr.identifier.value, value);
                Ok(())
            },
            Expression::Member(expr) => {
                self.store.temporaries.push(value);
                let (heap_pos, index) = self.resolve_element(expr)?;
                let value = self.store.temporaries.pop().unwrap_or_default();
                match self.store.object_mut(heap_pos) {
                    Object::Array(values) => values[index] = value,
                    _ => unreachable!(),
                }
                Ok(())
            },
            expr => Err(self.error(EvalErrorKind::UnsupportedNodeKind(expr.kind_name()), expr.span())),
        }
    }

    fn eval_update(&mut self, expr: &UpdateExpression) -> EvalResult {
        let heap = self.heap;
        match &heap[expr.argument] {
            Expression::Identifier(ident) => {
                let current = self.read_variable(&ident.identifier)?;
                let current = self.expect(current.expect_int(), ident.identifier.span)?;
                let updated = Value::Int(apply_update(expr.operation, current));
                self.store.write(&ident.identifier.value, updated.clone());
                Ok(updated)
            },
            Expression::Member(member) => {
                let (heap_pos, index) = self.resolve_element(member)?;
                let current = match self.store.object(heap_pos) {
                    Object::Array(values) => values[index].clone(),
                    _ => unreachable!(),
                };
                let current = self.expect(current.expect_int(), member.span)?;
                let updated = Value::Int(apply_update(expr.operation, current));
                match self.store.object_mut(heap_pos) {
                    Object::Array(values) => values[index] = updated.clone(),
                    _ => unreachable!(),
                }
                Ok(updated)
            },
            argument => Err(self.error(
                EvalErrorKind::UnsupportedNodeKind(argument.kind_name()), argument.span()
            )),
        }
    }

    /// Resolves `object[index]` to the array's heap position and a checked
    /// index. Shared by reads, assignments and updates of array elements.
    fn resolve_element(&mut self, expr: &MemberExpression) -> Result<(HeapPos, usize), EvalError> {
        let heap = self.heap;
        let object = self.eval_expression(expr.object)?;
        let object_span = heap[expr.object].span();
        let heap_pos = self.expect(object.expect_object(), object_span)?;
        match self.store.object(heap_pos) {
            Object::Array(_) => {},
            object => {
                let found = object.type_name();
                return Err(self.error(EvalErrorKind::TypeMismatch { expected: "array", found }, object_span));
            },
        }

        self.store.temporaries.push(object);
        let index = self.eval_expression(expr.property)?;
        self.store.temporaries.pop();
        let index = self.expect(index.expect_int(), heap[expr.property].span())?;
        let length = match self.store.object(heap_pos) {
            Object::Array(values) => values.len(),
            _ => unreachable!(),
        };

        if index < 0 || index as u64 >= length as u64 {
            return Err(self.error(EvalErrorKind::IndexOutOfRange { index, length }, expr.span));
        }

        Ok((heap_pos, index as usize))
    }

    fn eval_call(&mut self, expr: &CallExpression) -> EvalResult {
        let heap = self.heap;
        let callee = self.read_variable(&expr.callee)?;
        let callee = match &callee {
            Value::Object(heap_pos) => match self.store.object(*heap_pos) {
                Object::NativeFunction(native) => Callee::Native(native.index),
                Object::Function(function) => Callee::Function(function.declaration),
                object => {
                    let found = object.type_name();
                    return Err(self.error(EvalErrorKind::TypeMismatch { expected: "function", found }, expr.callee.span));
                },
            },
            value => {
                let found = value.type_name();
                return Err(self.error(EvalErrorKind::TypeMismatch { expected: "function", found }, expr.callee.span));
            },
        };

        let arguments = self.eval_rooted(&expr.arguments)?;

        match callee {
            Callee::Native(index) => {
                let native = &mut self.natives[index];
                log!(self.logger, "native call '{}' with {} argument(s)", &native.name, arguments.len());
                (native.callback)(&arguments);
                Ok(Value::Undefined)
            },
            Callee::Function(declaration_id) => {
                let declaration = &heap[declaration_id];
                if arguments.len() < declaration.parameters.len() {
                    return Err(self.error(EvalErrorKind::ArityMismatch {
                        name: declaration.identifier.value.clone(),
                        expected: declaration.parameters.len(),
                        found: arguments.len(),
                    }, expr.span));
                }

                log!(self.logger, "call '{}' with {} argument(s)", &declaration.identifier.value, arguments.len());
                self.frames.push(EvalFrame {
                    function: declaration.identifier.value.clone(),
                    call_site: expr.span,
                });
                self.store.push_scope();
                for (parameter, argument) in declaration.parameters.iter().zip(arguments) {
                    self.store.write(&parameter.value, argument);
                }

                let result = self.eval_statements(&heap[declaration.body].statements)?;
                self.store.pop_scope();
                self.frames.pop();
                Ok(result)
            },
        }
    }
}

fn apply_update(operation: UpdateOperator, current: i64) -> i64 {
    match operation {
        UpdateOperator::Increment => current.wrapping_add(1),
        UpdateOperator::Decrement => current.wrapping_sub(1),
    }
}
