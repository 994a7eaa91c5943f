use crate::{common::*, logging::FileLogger, Interpreter, Program, Value};
use core::cell::RefCell;
use std::io::Write;
use std::os::raw::{c_int, c_void};
use std::slice::from_raw_parts as slice_from_raw_parts;
use std::sync::Arc;

///////////////////////////////////////////////
#[derive(Default)]
struct StoredError {
    // invariant: len is zero IFF its occupied
    // contents are 1+ bytes because we also store the NULL TERMINATOR
    buf: Vec<u8>,
}
impl StoredError {
    const NULL_TERMINATOR: u8 = 0;
    fn clear(&mut self) {
        // no null terminator either!
        self.buf.clear();
    }
    fn debug_store<E: Debug>(&mut self, error: &E) {
        let _ = write!(&mut self.buf, "{:?}", error);
        self.buf.push(Self::NULL_TERMINATOR);
    }
    fn tl_debug_store<E: Debug>(error: &E) {
        STORED_ERROR.with(|stored_error| {
            let mut stored_error = stored_error.borrow_mut();
            stored_error.clear();
            stored_error.debug_store(error);
        })
    }
    fn display_store<E: std::fmt::Display>(&mut self, error: &E) {
        let _ = write!(&mut self.buf, "{}", error);
        self.buf.push(Self::NULL_TERMINATOR);
    }
    fn tl_display_store<E: std::fmt::Display>(error: &E) {
        STORED_ERROR.with(|stored_error| {
            let mut stored_error = stored_error.borrow_mut();
            stored_error.clear();
            stored_error.display_store(error);
        })
    }
    fn tl_clear() {
        STORED_ERROR.with(|stored_error| {
            let mut stored_error = stored_error.borrow_mut();
            stored_error.clear();
        })
    }
    fn tl_bytes_peek() -> (*const u8, usize) {
        STORED_ERROR.with(|stored_error| {
            let stored_error = stored_error.borrow();
            match stored_error.buf.len() {
                0 => (core::ptr::null(), 0), // no error!
                n => {
                    // stores an error of length n-1 AND a NULL TERMINATOR
                    (stored_error.buf.as_ptr(), n - 1)
                }
            }
        })
    }
}
thread_local! {
    static STORED_ERROR: RefCell<StoredError> = RefCell::new(StoredError::default());
}
unsafe fn tl_str_from_raw<'a>(bytes_ptr: *const u8, bytes_len: usize) -> Result<&'a str, c_int> {
    std::str::from_utf8(&*slice_from_raw_parts(bytes_ptr, bytes_len)).map_err(|err| {
        StoredError::tl_debug_store(&err);
        ERR_MINIJS
    })
}

pub const ERR_OK: c_int = 0;
pub const ERR_MINIJS: c_int = -1;

///////////////////// VALUES //////////////////////////

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiValueKind {
    Undefined = 0,
    Null = 1,
    Int = 2,
    Bool = 3,
    String = 4,
    Object = 5,
}

/// C view of a runtime value. `payload` holds the integer, the boolean (0 or
/// 1) or the object's heap position. It is zero for the other kinds.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiValue {
    pub kind: FfiValueKind,
    pub payload: i64,
}

impl From<&Value> for FfiValue {
    fn from(value: &Value) -> Self {
        let (kind, payload) = match value {
            Value::Undefined => (FfiValueKind::Undefined, 0),
            Value::Null => (FfiValueKind::Null, 0),
            Value::Int(v) => (FfiValueKind::Int, *v),
            Value::Bool(v) => (FfiValueKind::Bool, *v as i64),
            Value::String(_) => (FfiValueKind::String, 0),
            Value::Object(heap_pos) => (FfiValueKind::Object, *heap_pos as i64),
        };
        FfiValue { kind, payload }
    }
}

/// Host callback: receives the user data given at binding time and the
/// evaluated call arguments, which are only valid for the duration of the call.
pub type FfiNativeCallback = unsafe extern "C" fn(user_data: *mut c_void, args: *const FfiValue, args_len: usize);

struct FfiNative {
    name: String,
    callback: FfiNativeCallback,
    user_data: *mut c_void,
}

/// Interpreter configuration as seen from C. Each evaluation starts a new
/// session over the shared program, with every native bound so far.
pub struct FfiInterpreter {
    program: Arc<Program>,
    natives: Vec<FfiNative>,
    log_file: Option<std::fs::File>,
}

///////////////////// MINIJS //////////////////////////

/// Returns length (via out pointer) and pointer (via return value) of the last error.
/// - pointer is NULL iff there was no last error
/// - data at pointer is null-delimited
/// - len does NOT include the length of the null-delimiter
/// If len is NULL, it will not written to.
#[no_mangle]
pub unsafe extern "C" fn minijs_error_peek(len: *mut usize) -> *const u8 {
    let (err_ptr, err_len) = StoredError::tl_bytes_peek();
    if !len.is_null() {
        len.write(err_len);
    }
    err_ptr
}

///////////////////// PROGRAM //////////////////////////

/// Tokenizes and parses the utf8-encoded source.
/// - On success, returns a new program
/// - On failure, stores an error string (see `minijs_error_peek`) and returns NULL
#[no_mangle]
pub unsafe extern "C" fn minijs_program_parse(source: *const u8, source_len: usize) -> *mut Arc<Program> {
    StoredError::tl_clear();
    let source = match tl_str_from_raw(source, source_len) {
        Ok(source) => source,
        Err(_) => return std::ptr::null_mut(),
    };
    match crate::compile("<ffi>", source) {
        Ok(program) => Box::into_raw(Box::new(Arc::new(program))),
        Err(err) => {
            StoredError::tl_display_store(&err);
            std::ptr::null_mut()
        }
    }
}

/// Destroys the given program. Interpreters created from it remain usable.
#[no_mangle]
pub unsafe extern "C" fn minijs_program_destroy(program: *mut Arc<Program>) {
    drop(Box::from_raw(program))
}

///////////////////// INTERPRETER //////////////////////////

#[no_mangle]
pub unsafe extern "C" fn minijs_interpreter_new(program: &Arc<Program>) -> *mut FfiInterpreter {
    let interpreter = FfiInterpreter { program: program.clone(), natives: Vec::new(), log_file: None };
    Box::into_raw(Box::new(interpreter))
}

/// Like `minijs_interpreter_new`, but every evaluation logs to the file at
/// the given utf8-encoded path. Returns NULL and stores an error if the file
/// cannot be created.
#[no_mangle]
pub unsafe extern "C" fn minijs_interpreter_new_logging(
    program: &Arc<Program>,
    path_ptr: *const u8,
    path_len: usize,
) -> *mut FfiInterpreter {
    StoredError::tl_clear();
    let path_str = match tl_str_from_raw(path_ptr, path_len) {
        Ok(path_str) => path_str,
        Err(_) => return std::ptr::null_mut(),
    };
    match std::fs::File::create(path_str) {
        Ok(file) => {
            let interpreter = FfiInterpreter { program: program.clone(), natives: Vec::new(), log_file: Some(file) };
            Box::into_raw(Box::new(interpreter))
        }
        Err(err) => {
            StoredError::tl_debug_store(&err);
            std::ptr::null_mut()
        }
    }
}

/// Destroys the given interpreter, freeing its resources.
#[no_mangle]
pub unsafe extern "C" fn minijs_interpreter_destroy(interpreter: *mut FfiInterpreter) {
    drop(Box::from_raw(interpreter))
}

/// Binds `callback` under the utf8-encoded name. `user_data` is passed back
/// to the callback unchanged on every invocation.
#[no_mangle]
pub unsafe extern "C" fn minijs_interpreter_bind_native(
    interpreter: &mut FfiInterpreter,
    name_ptr: *const u8,
    name_len: usize,
    callback: FfiNativeCallback,
    user_data: *mut c_void,
) -> c_int {
    StoredError::tl_clear();
    let name = match tl_str_from_raw(name_ptr, name_len) {
        Ok(name) => name,
        Err(err) => return err,
    };
    interpreter.natives.push(FfiNative { name: name.to_string(), callback, user_data });
    ERR_OK
}

/// Evaluates the whole program.
/// - On success, writes the program's value to `out` (if not NULL) and returns 0
/// - On failure, stores an error string (see `minijs_error_peek`) and returns -1
#[no_mangle]
pub unsafe extern "C" fn minijs_interpreter_evaluate(interpreter: &mut FfiInterpreter, out: *mut FfiValue) -> c_int {
    StoredError::tl_clear();
    let mut session = match &interpreter.log_file {
        Some(file) => match file.try_clone() {
            Ok(file) => Interpreter::with_logger(&interpreter.program, Box::new(FileLogger::new("minijs", file))),
            Err(err) => {
                StoredError::tl_debug_store(&err);
                return ERR_MINIJS;
            }
        },
        None => Interpreter::new(&interpreter.program),
    };

    for native in &interpreter.natives {
        let (callback, user_data) = (native.callback, native.user_data);
        session.bind_native(&native.name, move |args| {
            let args: Vec<FfiValue> = args.iter().map(FfiValue::from).collect();
            callback(user_data, args.as_ptr(), args.len())
        });
    }

    match session.evaluate() {
        Ok(value) => {
            if !out.is_null() {
                out.write(FfiValue::from(&value));
            }
            ERR_OK
        }
        Err(err) => {
            StoredError::tl_display_store(&err);
            ERR_MINIJS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "C" fn collect_ints(user_data: *mut c_void, args: *const FfiValue, args_len: usize) {
        let collected = &mut *(user_data as *mut Vec<i64>);
        for arg in &*slice_from_raw_parts(args, args_len) {
            collected.push(arg.payload);
        }
    }

    fn peek_error() -> Option<String> {
        let mut len = 0;
        let ptr = unsafe { minijs_error_peek(&mut len) };
        if ptr.is_null() {
            None
        } else {
            let bytes = unsafe { slice_from_raw_parts(ptr, len) };
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }

    #[test]
    fn ffi_session() {
        let source = b"function add(a, b) { return a + b }\nfor (var i = 0; i < 3; i++) emit(add(i, 10))\nvar r = [7]\nr";
        unsafe {
            let program = minijs_program_parse(source.as_ptr(), source.len());
            assert!(!program.is_null());
            assert_eq!(peek_error(), None);

            let interpreter = minijs_interpreter_new(&*program);
            let mut collected: Vec<i64> = Vec::new();
            let name = b"emit";
            let bound = minijs_interpreter_bind_native(
                &mut *interpreter, name.as_ptr(), name.len(),
                collect_ints, &mut collected as *mut Vec<i64> as *mut c_void,
            );
            assert_eq!(bound, ERR_OK);

            // The program may go away before its interpreters
            minijs_program_destroy(program);

            let mut out = FfiValue { kind: FfiValueKind::Undefined, payload: 0 };
            assert_eq!(minijs_interpreter_evaluate(&mut *interpreter, &mut out), ERR_OK);
            assert_eq!(collected, vec![10, 11, 12]);
            assert_eq!(out.kind, FfiValueKind::Object);

            // A second evaluation is a new session
            assert_eq!(minijs_interpreter_evaluate(&mut *interpreter, std::ptr::null_mut()), ERR_OK);
            assert_eq!(collected, vec![10, 11, 12, 10, 11, 12]);

            minijs_interpreter_destroy(interpreter);
        }
    }

    #[test]
    fn ffi_errors() {
        unsafe {
            let source = b"var x = a - b";
            let program = minijs_program_parse(source.as_ptr(), source.len());
            assert!(program.is_null());
            let error = peek_error().expect("stored parse error");
            assert!(error.contains("operator '-' is not supported"), "got: {}", error);

            let source = b"var x = missing";
            let program = minijs_program_parse(source.as_ptr(), source.len());
            assert!(!program.is_null());
            let interpreter = minijs_interpreter_new(&*program);
            assert_eq!(minijs_interpreter_evaluate(&mut *interpreter, std::ptr::null_mut()), ERR_MINIJS);
            let error = peek_error().expect("stored evaluation error");
            assert!(error.contains("'missing' is not defined"), "got: {}", error);

            let invalid = [0xffu8, 0xfe];
            assert!(minijs_program_parse(invalid.as_ptr(), invalid.len()).is_null());
            assert!(peek_error().is_some());

            minijs_interpreter_destroy(interpreter);
            minijs_program_destroy(program);
        }
    }
}
