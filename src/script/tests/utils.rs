use std::cell::RefCell;
use std::collections::HashMap;

use crate::script::{
    ast::*,
    compile,
    eval::*,
    input_source::*,
    parser::*,
    Program,
};

//------------------------------------------------------------------------------
// Interface for parsing and compiling
//------------------------------------------------------------------------------

pub(crate) struct Tester {
    test_name: String,
    source: String,
}

impl Tester {
    pub(crate) fn new<S: ToString>(test_name: S) -> Self {
        Self{
            test_name: test_name.to_string(),
            source: String::new(),
        }
    }

    /// Utility for quick tests that use a single source file and expect the
    /// compilation to succeed.
    pub(crate) fn new_single_source_expect_ok<T: ToString, S: ToString>(test_name: T, source: S) -> AstOkTester {
        Self::new(test_name)
            .with_source(source)
            .compile()
            .expect_ok()
    }

    /// Utility for quick tests that use a single source file and expect the
    /// compilation to fail.
    pub(crate) fn new_single_source_expect_err<T: ToString, S: ToString>(test_name: T, source: S) -> AstErrTester {
        Self::new(test_name)
            .with_source(source)
            .compile()
            .expect_err()
    }

    pub(crate) fn with_source<S: ToString>(mut self, source: S) -> Self {
        self.source = source.to_string();
        self
    }

    pub(crate) fn compile(self) -> AstTesterResult {
        match compile("test", &self.source) {
            Ok(program) => AstTesterResult::Ok(AstOkTester{
                test_name: self.test_name, source: self.source, program
            }),
            Err(error) => AstTesterResult::Err(AstErrTester{
                test_name: self.test_name, error
            }),
        }
    }
}

pub(crate) enum AstTesterResult {
    Ok(AstOkTester),
    Err(AstErrTester)
}

impl AstTesterResult {
    pub(crate) fn expect_ok(self) -> AstOkTester {
        match self {
            AstTesterResult::Ok(v) => v,
            AstTesterResult::Err(err) => {
                println!("DEBUG: Full error:\n{}", &err.error);
                panic!(
                    "[{}] Expected compilation to succeed, but it failed with {}",
                    err.test_name, assert_postfix(err.error.statements())
                );
            }
        }
    }

    pub(crate) fn expect_err(self) -> AstErrTester {
        match self {
            AstTesterResult::Ok(ok) => {
                panic!("[{}] Expected compilation to fail, but it succeeded", ok.test_name);
            },
            AstTesterResult::Err(err) => err,
        }
    }
}

//------------------------------------------------------------------------------
// Interface for successful compilation
//------------------------------------------------------------------------------

pub(crate) struct AstOkTester {
    test_name: String,
    source: String,
    program: Program,
}

impl AstOkTester {
    pub(crate) fn assert_num_statements(self, num: usize) -> Self {
        let found = self.program.statements().len();
        assert_eq!(
            num, found,
            "[{}] Expected {} top-level statements, but found {}",
            self.test_name, num, found
        );
        self
    }

    pub(crate) fn for_statement<F: Fn(StatementTester)>(self, idx: usize, f: F) -> Self {
        let statements = self.program.statements();
        assert!(
            idx < statements.len(),
            "[{}] Expected a statement at index {}, but there are only {}",
            self.test_name, idx, statements.len()
        );

        let tester = StatementTester{
            test_name: &self.test_name,
            heap: self.program.heap(),
            stmt: &self.program.heap()[statements[idx]],
        };
        f(tester);
        self
    }

    /// Evaluates the program with a `print` native that records its
    /// arguments, and expects the evaluation to succeed.
    pub(crate) fn eval_ok<F: FnOnce(EvalOkTester)>(self, f: F) -> Self {
        let printed = RefCell::new(Vec::new());
        {
            let mut interpreter = Interpreter::new(&self.program);
            interpreter.bind_native("print", |args| printed.borrow_mut().push(args.to_vec()));
            let result = match interpreter.evaluate() {
                Ok(result) => result,
                Err(err) => {
                    let err = err.attach_source(&InputSource::new_test(&self.source));
                    println!("DEBUG: Full error:\n{}", &err);
                    panic!(
                        "[{}] Expected evaluation to succeed, but it failed with {}",
                        self.test_name, assert_postfix(err.statements())
                    );
                }
            };

            let printed = printed.borrow().clone();
            f(EvalOkTester{ test_name: &self.test_name, interpreter: &interpreter, result, printed });
        }
        self
    }

    /// Evaluates the program (with the same `print` native as `eval_ok`) and
    /// expects the evaluation to fail.
    pub(crate) fn eval_err(self) -> EvalErrTester {
        let result = {
            let mut interpreter = Interpreter::new(&self.program);
            interpreter.bind_native("print", |_| {});
            interpreter.evaluate()
        };

        match result {
            Ok(value) => panic!(
                "[{}] Expected evaluation to fail, but it succeeded with {}",
                self.test_name, value
            ),
            Err(error) => EvalErrTester{
                test_name: self.test_name,
                error: error.attach_source(&InputSource::new_test(&self.source)),
            },
        }
    }
}

pub(crate) struct StatementTester<'a> {
    test_name: &'a str,
    heap: &'a Heap,
    stmt: &'a Statement,
}

impl<'a> StatementTester<'a> {
    pub(crate) fn assert_kind(self, kind_name: &str) -> Self {
        assert_eq!(
            kind_name, self.stmt.kind_name(),
            "[{}] Expected a {}, but found a {}",
            self.test_name, kind_name, self.stmt.kind_name()
        );
        self
    }

    /// Asserts the shape of the statement's expression, serialized in
    /// prefix form, e.g. `(+ a (> b c))`.
    pub(crate) fn assert_expr(self, expected: &str) -> Self {
        let expr_id = match self.stmt {
            Statement::Expression(stmt) => stmt.expression,
            Statement::Return(stmt) => match stmt.argument {
                Some(argument) => argument,
                None => panic!("[{}] Return statement has no argument", self.test_name),
            },
            Statement::Variable(stmt) => stmt.declarations[0].initializer,
            stmt => panic!("[{}] A {} has no single expression", self.test_name, stmt.kind_name()),
        };

        let mut serialized = String::new();
        serialize_expr(&mut serialized, self.heap, expr_id);
        assert_eq!(
            expected, &serialized,
            "[{}] Expected expression '{}', but got '{}'",
            self.test_name, expected, &serialized
        );
        self
    }
}

pub(crate) struct EvalOkTester<'a> {
    test_name: &'a str,
    interpreter: &'a Interpreter<'a>,
    result: Value,
    printed: Vec<Vec<Value>>,
}

impl<'a> EvalOkTester<'a> {
    pub(crate) fn assert_result(self, expected: Value) -> Self {
        assert_eq!(
            expected, self.result,
            "[{}] Expected program to evaluate to {}, but got {}",
            self.test_name, &expected, &self.result
        );
        self
    }

    pub(crate) fn assert_printed(self, expected: &[&[Value]]) -> Self {
        let expected: Vec<Vec<Value>> = expected.iter().map(|args| args.to_vec()).collect();
        assert_eq!(
            expected, self.printed,
            "[{}] Expected print calls {:?}, but got {:?}",
            self.test_name, &expected, &self.printed
        );
        self
    }

    pub(crate) fn assert_global(self, name: &str, expected: Value) -> Self {
        let found = self.interpreter.value_of(name);
        assert_eq!(
            Some(&expected), found,
            "[{}] Expected global '{}' to be {}, but got {:?}",
            self.test_name, name, &expected, found
        );
        self
    }

    /// Asserts that a global holds a plain object with exactly the given
    /// properties.
    pub(crate) fn assert_object(self, name: &str, expected: &[(&str, Value)]) -> Self {
        let expected: HashMap<String, Value> = expected.iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();
        let properties = self.interpreter.value_of(name)
            .and_then(|value| self.interpreter.object_properties(value));
        assert_eq!(
            Some(&expected), properties,
            "[{}] Expected global '{}' to be the object {:?}, but got {:?}",
            self.test_name, name, &expected, properties
        );
        self
    }

    pub(crate) fn assert_heap_below(self, limit: usize) -> Self {
        let size = self.interpreter.heap_size();
        assert!(
            size < limit,
            "[{}] Expected fewer than {} heap slots, but found {}",
            self.test_name, limit, size
        );
        self
    }

    pub(crate) fn assert_array(self, name: &str, expected: &[Value]) -> Self {
        let elements = self.interpreter.value_of(name)
            .and_then(|value| self.interpreter.array_elements(value));
        assert_eq!(
            Some(expected), elements,
            "[{}] Expected global '{}' to be the array {:?}, but got {:?}",
            self.test_name, name, expected, elements
        );
        self
    }
}

//------------------------------------------------------------------------------
// Interface for failed compilation or evaluation
//------------------------------------------------------------------------------

pub(crate) struct AstErrTester {
    test_name: String,
    error: ParseError,
}

impl AstErrTester {
    pub(crate) fn assert_kind(self, expected: ParseErrorKind) -> Self {
        assert_eq!(
            expected, self.error.kind,
            "[{}] Expected parse error {:?}, but got {:?}",
            self.test_name, &expected, &self.error.kind
        );
        self
    }

    pub(crate) fn error<F: Fn(ErrorTester)>(&self, f: F) {
        let tester = ErrorTester{ test_name: &self.test_name, statements: self.error.statements() };
        f(tester)
    }
}

pub(crate) struct EvalErrTester {
    test_name: String,
    error: EvalError,
}

impl EvalErrTester {
    pub(crate) fn assert_kind(self, expected: EvalErrorKind) -> Self {
        assert_eq!(
            expected, self.error.kind,
            "[{}] Expected evaluation error {:?}, but got {:?}",
            self.test_name, &expected, &self.error.kind
        );
        self
    }

    pub(crate) fn assert_frames(self, expected: &[&str]) -> Self {
        let found: Vec<&str> = self.error.frames().iter().map(|f| f.function.as_str()).collect();
        assert_eq!(
            expected, found.as_slice(),
            "[{}] Expected call frames {:?}, but got {:?}",
            self.test_name, expected, &found
        );
        self
    }

    pub(crate) fn error<F: Fn(ErrorTester)>(&self, f: F) {
        let tester = ErrorTester{ test_name: &self.test_name, statements: self.error.statements() };
        f(tester)
    }
}

pub(crate) struct ErrorTester<'a> {
    test_name: &'a str,
    statements: &'a [ErrorStatement],
}

impl<'a> ErrorTester<'a> {
    pub(crate) fn assert_num(self, num: usize) -> Self {
        assert_eq!(
            num, self.statements.len(),
            "[{}] expected error to consist of '{}' parts, but encountered '{}' for {}",
            self.test_name, num, self.statements.len(), assert_postfix(self.statements)
        );

        self
    }

    pub(crate) fn assert_ctx_has(self, idx: usize, msg: &str) -> Self {
        assert!(
            self.statements[idx].context.contains(msg),
            "[{}] expected error statement {}'s context to contain '{}' for {}",
            self.test_name, idx, msg, assert_postfix(self.statements)
        );

        self
    }

    pub(crate) fn assert_msg_has(self, idx: usize, msg: &str) -> Self {
        assert!(
            self.statements[idx].message.contains(msg),
            "[{}] expected error statement {}'s message to contain '{}' for {}",
            self.test_name, idx, msg, assert_postfix(self.statements)
        );

        self
    }

    /// Seeks the index of the pattern in the context line, then checks if
    /// the error's column corresponds to that index.
    pub(crate) fn assert_occurs_at(self, idx: usize, pattern: &str) -> Self {
        let pos = self.statements[idx].context.find(pattern);
        assert!(
            pos.is_some(),
            "[{}] incorrect occurs_at: '{}' could not be found in the context for {}",
            self.test_name, pattern, assert_postfix(self.statements)
        );
        let pos = pos.unwrap();
        let col = self.statements[idx].span.begin.column as usize;
        assert_eq!(
            pos, col,
            "[{}] Expected error to occur at column {}, but found it at {} for {}",
            self.test_name, pos, col, assert_postfix(self.statements)
        );

        self
    }
}

//------------------------------------------------------------------------------
// Generic utilities
//------------------------------------------------------------------------------

fn assert_postfix(statements: &[ErrorStatement]) -> String {
    let mut v = String::new();
    v.push_str("error: [");
    for (idx, stmt) in statements.iter().enumerate() {
        if idx != 0 {
            v.push_str(", ");
        }

        v.push_str(&format!("{{ context: {}, message: {} }}", &stmt.context, stmt.message));
    }
    v.push(']');
    v
}

fn serialize_expr(target: &mut String, heap: &Heap, expr_id: ExpressionId) {
    match &heap[expr_id] {
        Expression::Identifier(expr) => target.push_str(&expr.identifier.value),
        Expression::IntLiteral(expr) => target.push_str(&expr.value.to_string()),
        Expression::Binary(expr) => {
            target.push('(');
            target.push_str(expr.operation.symbol());
            target.push(' ');
            serialize_expr(target, heap, expr.left);
            target.push(' ');
            serialize_expr(target, heap, expr.right);
            target.push(')');
        },
        Expression::Assignment(expr) => {
            target.push('(');
            target.push_str(expr.operation.symbol());
            target.push(' ');
            serialize_expr(target, heap, expr.left);
            target.push(' ');
            serialize_expr(target, heap, expr.right);
            target.push(')');
        },
        Expression::Update(expr) => {
            target.push('(');
            target.push_str(expr.operation.symbol());
            target.push(' ');
            serialize_expr(target, heap, expr.argument);
            target.push(')');
        },
        Expression::Call(expr) => {
            target.push_str("(call ");
            target.push_str(&expr.callee.value);
            for argument in &expr.arguments {
                target.push(' ');
                serialize_expr(target, heap, *argument);
            }
            target.push(')');
        },
        Expression::Member(expr) => {
            target.push_str("([] ");
            serialize_expr(target, heap, expr.object);
            target.push(' ');
            serialize_expr(target, heap, expr.property);
            target.push(')');
        },
        Expression::Array(expr) => {
            target.push('[');
            for (idx, element) in expr.elements.iter().enumerate() {
                if idx != 0 { target.push(' '); }
                serialize_expr(target, heap, *element);
            }
            target.push(']');
        },
        Expression::Object(expr) => {
            target.push('{');
            for (idx, property) in expr.properties.iter().enumerate() {
                if idx != 0 { target.push(' '); }
                serialize_expr(target, heap, property.key);
                target.push(':');
                serialize_expr(target, heap, property.value);
            }
            target.push('}');
        },
    }
}
