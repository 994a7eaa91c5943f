pub(crate) mod arena;
pub mod ast;
mod ast_printer;
pub mod eval;
pub mod input_source;
pub mod parser;
mod punctuator;
mod tokenizer;
pub mod tokens;

#[cfg(test)]
mod tests;

use derive_more::{Display, From};

use crate::script::ast::{Heap, Root, RootId, StatementId};
use crate::script::ast_printer::ASTWriter;
use crate::script::eval::EvalError;
use crate::script::input_source::InputSource;
use crate::script::parser::{ParseError, Parser, MAX_NESTING_DEPTH};
use crate::script::tokenizer::Tokenizer;
use crate::script::tokens::Token;

/// A parsed program: the arena holding every node, and the root node's id.
/// The program is never modified after parsing, any number of interpreters
/// may borrow it at the same time.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Program {
    pub(crate) heap: Heap,
    pub(crate) root: RootId,
}

impl Program {
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn root(&self) -> &Root {
        &self.heap[self.root]
    }

    pub fn statements(&self) -> &[StatementId] {
        &self.root().statements
    }

    /// Encodes the program with `bincode`, so it can be cached and loaded
    /// again without going through the tokenizer and parser.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Decodes a program encoded by `to_bytes`. The decoded tree is checked
    /// before it is returned, so a corrupted or hand-made encoding cannot
    /// make an interpreter index outside the tree.
    pub fn from_bytes(bytes: &[u8]) -> Result<Program, Error> {
        let program: Program = bincode::deserialize(bytes)?;
        program.heap.validate(program.root, MAX_NESTING_DEPTH).map_err(Error::InvalidProgram)?;
        Ok(program)
    }

    /// Writes an indented dump of the syntax tree.
    pub fn write_ast<W: std::io::Write>(&self, w: &mut W) -> std::io::Result<()> {
        ASTWriter::new().write_ast(w, self)
    }
}

/// Any failure produced while loading or running a program.
#[derive(Debug, Display, From)]
pub enum Error {
    #[display(fmt = "{}", _0)]
    Parse(ParseError),
    #[display(fmt = "{}", _0)]
    Eval(EvalError),
    #[display(fmt = "failed to decode program: {}", _0)]
    Decode(bincode::Error),
    #[display(fmt = "invalid program: {}", _0)]
    #[from(ignore)]
    InvalidProgram(String),
}

impl std::error::Error for Error {}

/// Splits source text into tokens. The result always ends with exactly one
/// end-of-input token.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut source = InputSource::new(String::new(), text.to_string());
    Tokenizer::new().tokenize(&mut source)
}

/// Builds a program from a token sequence. Errors carry positions but no
/// source context; use `compile` to get both.
pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    let mut heap = Heap::new();
    let root = Parser::new(tokens).parse(&mut heap)?;
    Ok(Program { heap, root })
}

pub fn compile(filename: &str, text: &str) -> Result<Program, ParseError> {
    let mut source = InputSource::new(filename.to_string(), text.to_string());
    let tokens = Tokenizer::new().tokenize(&mut source);
    parse(&tokens).map_err(|err| err.attach_source(&source))
}
