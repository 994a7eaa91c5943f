/**
 * script/tests/mod.rs
 *
 * Tests for the tokenizer, the parser and the interpreter. Most of them go
 * through the `Tester` harness, which compiles a single source and offers
 * builder-like assertions on the resulting program, its evaluation or the
 * error that was produced.
 */

mod utils;
mod tokenizer;
mod eval_sessions;

pub(crate) use utils::{Tester}; // the testing harness
pub(crate) use crate::script::eval::Value;
