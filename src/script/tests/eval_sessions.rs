use crate as minijs;
use crossbeam_utils::thread::scope;
use minijs::{compile, logging::VecLogger, Interpreter, Program, Value};
use minijs::ast::Statement;
use std::cell::RefCell;
use std::sync::Arc;

lazy_static::lazy_static! {
    static ref COUNTER_PROGRAM: Arc<Program> = {
        Arc::new(compile("counter", "
            var a = [0]
            for (var i = 0; i < 100; i++) a[0]++
            report(a[0])
            a
        ").unwrap())
    };
}

#[test]
fn parallel_interpreters() {
    // Every interpreter has its own heap, so the shared program yields the
    // same count in each thread.
    let results = scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| {
            let program = COUNTER_PROGRAM.clone();
            s.spawn(move |_| {
                let reported = RefCell::new(Vec::new());
                let mut interpreter = Interpreter::new(&program);
                interpreter.bind_native("report", |args| reported.borrow_mut().extend_from_slice(args));
                let result = interpreter.evaluate().unwrap();
                let elements = interpreter.array_elements(&result).map(|e| e.to_vec());
                drop(interpreter);
                (reported.into_inner(), elements)
            })
        }).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>()
    }).unwrap();

    assert_eq!(results.len(), 4);
    for (reported, elements) in results {
        assert_eq!(reported, vec![Value::Int(100)]);
        assert_eq!(elements, Some(vec![Value::Int(100)]));
    }
}

#[test]
fn repeated_evaluation() {
    // Evaluating twice runs the program again on the same heap
    let mut count = 0;
    {
        let mut interpreter = Interpreter::new(&COUNTER_PROGRAM);
        interpreter.bind_native("report", |_| count += 1);
        interpreter.evaluate().unwrap();
        interpreter.evaluate().unwrap();
    }
    assert_eq!(count, 2);
}

#[test]
fn rebinding_natives() {
    let program = compile("rebind", "out(1)").unwrap();
    let mut first = Vec::new();
    let mut second = Vec::new();
    {
        let mut interpreter = Interpreter::new(&program);
        interpreter.bind_native("out", |args| first.extend_from_slice(args));
        interpreter.bind_native("out", |args| second.extend_from_slice(args));
        interpreter.evaluate().unwrap();
    }
    assert!(first.is_empty());
    assert_eq!(second, vec![Value::Int(1)]);
}

#[test]
fn single_nodes() {
    let program = compile("nodes", "
        function f(a) { return a[5] }
        f([1])
        var y = 2
        y + 40
    ").unwrap();
    let statements = program.statements().to_vec();
    let heap = program.heap();
    let mut interpreter = Interpreter::new(&program);

    interpreter.evaluate_statement(statements[0]).unwrap();
    assert!(interpreter.evaluate_statement(statements[1]).is_err());

    // The failed call left no scope behind, so the declaration is global
    interpreter.evaluate_statement(statements[2]).unwrap();
    assert_eq!(interpreter.value_of("y"), Some(&Value::Int(2)));

    let expression = match &heap[statements[3]] {
        Statement::Expression(stmt) => stmt.expression,
        stmt => panic!("expected an expression statement, found {}", stmt.kind_name()),
    };
    assert_eq!(interpreter.evaluate_expression(expression).unwrap(), Value::Int(42));
    assert_eq!(interpreter.value_of("a"), None);
}

#[test]
#[cfg(not(feature = "no_logging"))]
fn logged_session() {
    let program = compile("logged", "
        function f(a) { out(a) }
        f(1)
        missing
    ").unwrap();
    let mut interpreter = Interpreter::with_logger(&program, Box::new(VecLogger::new("session")));
    interpreter.bind_native("out", |_| {});
    assert!(interpreter.evaluate().is_err());

    let mut log = Vec::new();
    interpreter.logger().dump_log(&mut log);
    let log = String::from_utf8(log).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 4, "got:\n{}", log);
    assert!(lines.iter().all(|line| line.starts_with("session at ")), "got:\n{}", log);
    assert!(lines[0].ends_with("bound native function 'out'"), "got:\n{}", log);
    assert!(lines[1].ends_with("call 'f' with 1 argument(s)"), "got:\n{}", log);
    assert!(lines[2].ends_with("native call 'out' with 1 argument(s)"), "got:\n{}", log);
    assert!(lines[3].ends_with("evaluation failed: 'missing' is not defined"), "got:\n{}", log);
}

#[test]
fn object_contents_after_collection() {
    let program = compile("collected", "
        for (var i = 0; i < 500; i++) { var t = [i] }
        var o = {a: [5], b: 6}
        for (var i = 0; i < 500; i++) { var t = [i] }
    ").unwrap();
    let mut interpreter = Interpreter::new(&program);
    interpreter.evaluate().unwrap();
    assert!(interpreter.heap_size() < 200);

    let o = interpreter.value_of("o").cloned().unwrap();
    let properties = interpreter.object_properties(&o).unwrap();
    assert_eq!(properties.get("b"), Some(&Value::Int(6)));
    let a = properties.get("a").cloned().unwrap();
    assert_eq!(interpreter.array_elements(&a), Some(&[Value::Int(5)][..]));
    assert_eq!(interpreter.object_properties(&a), None);
}
