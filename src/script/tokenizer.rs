use super::input_source::{InputPosition, InputSource, InputSpan};
use super::punctuator::punctuator_start;
use super::tokens::*;

/// Splits source text into tokens. Characters are gathered in a buffer until
/// whitespace or the start of a punctuator is encountered, at which point the
/// buffer is classified as a keyword, an integer literal or an identifier.
/// Punctuators are recognized through the punctuator trie, always taking the
/// longest match.
///
/// Tokenizing never fails: characters that the language does not know about
/// simply end up in an identifier.
pub(crate) struct Tokenizer {
    buffer: String,
    // Position of the first and just past the last buffered character
    buffer_begin: InputPosition,
    buffer_end: InputPosition,
}

impl Tokenizer {
    pub(crate) fn new() -> Self {
        Self {
            buffer: String::with_capacity(64),
            buffer_begin: InputPosition::default(),
            buffer_end: InputPosition::default(),
        }
    }

    /// Tokenizes everything that remains in the source. The returned tokens
    /// always end with a single `Eof` token.
    pub(crate) fn tokenize(&mut self, source: &mut InputSource) -> Vec<Token> {
        let mut target = Vec::with_capacity(128);

        while let Some(c) = source.next() {
            let char_begin = source.pos();
            source.consume();

            if is_whitespace(c) {
                self.flush_buffer(source, &mut target);
            } else if let Some(punctuator) = punctuator_start(c) {
                self.flush_buffer(source, &mut target);

                // Longest match: descend into the trie as long as the next
                // character continues the punctuator.
                let mut punctuator = punctuator;
                while let Some(next) = source.next().and_then(|c| punctuator.continuation(c)) {
                    source.consume();
                    punctuator = next;
                }

                let end = source.pos();
                target.push(Token::new(punctuator.kind, end, InputSpan::from_positions(char_begin, end)));
            } else {
                if self.buffer.is_empty() {
                    self.buffer_begin = char_begin;
                }
                self.buffer.push(c);
                self.buffer_end = source.pos();
            }
        }

        self.flush_buffer(source, &mut target);

        let end = source.pos();
        target.push(Token::new(TokenKind::Eof, end, InputSpan::from_positions(end, end)));
        target
    }

    /// Classifies the buffered characters, if any, and pushes the resulting
    /// token. The token position is the cursor at the moment of flushing.
    fn flush_buffer(&mut self, source: &InputSource, target: &mut Vec<Token>) {
        if self.buffer.is_empty() {
            return;
        }

        let position = source.pos();
        let span = InputSpan::from_positions(self.buffer_begin, self.buffer_end);
        let token = match keyword_kind(&self.buffer) {
            Some(kind) => Token::new(kind, position, span),
            None => {
                let kind = if self.buffer.parse::<i64>().is_ok() {
                    TokenKind::IntLiteral
                } else {
                    TokenKind::Identifier
                };
                Token::with_value(kind, self.buffer.clone(), position, span)
            }
        };

        target.push(token);
        self.buffer.clear();
    }
}

fn keyword_kind(text: &str) -> Option<TokenKind> {
    match text {
        "function" => Some(TokenKind::Function),
        "var" => Some(TokenKind::Var),
        "return" => Some(TokenKind::Return),
        "if" => Some(TokenKind::If),
        "for" => Some(TokenKind::For),
        _ => None,
    }
}

fn is_whitespace(c: char) -> bool {
    match c {
        '\u{0009}' | '\u{000B}' | '\u{000C}' | '\u{FEFF}' => true,
        c => c.is_whitespace(),
    }
}
