use std::fmt;

use super::input_source::{InputPosition, InputSpan};

/// Represents a particular kind of token. Punctuator kinds are named after
/// the characters they consist of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TokenKind {
    // Variable-character tokens
    Identifier,
    IntLiteral,
    // Keywords
    Function,
    Var,
    Return,
    If,
    For,
    // Optional chaining and nullish coalescing
    Question,           // ?
    QuestionPeriod,     // ?.
    QuestionQuestion,   // ??
    QuestionQuestionEq, // ??=
    // Grouping and separators
    OpenCurly,   // {
    CloseCurly,  // }
    OpenParen,   // (
    CloseParen,  // )
    OpenSquare,  // [
    CloseSquare, // ]
    Period,      // .
    Spread,      // ...
    SemiColon,   // ;
    Comma,       // ,
    Colon,       // :
    // Comparison and shifts
    OpenAngle,           // <
    LessEquals,          // <=
    ShiftLeft,           // <<
    ShiftLeftEquals,     // <<=
    CloseAngle,          // >
    GreaterEquals,       // >=
    ShiftRight,          // >>
    ShiftRightEquals,    // >>=
    ShiftRightUnsigned,  // >>>
    ShiftRightUnsignedEquals, // >>>=
    // Equality and assignment
    Equal,          // =
    EqualEqual,     // ==
    EqualEqualEqual, // ===
    Arrow,          // =>
    Exclamation,    // !
    NotEqual,       // !=
    NotEqualEqual,  // !==
    // Arithmetic
    Plus,               // +
    PlusPlus,           // ++
    PlusEquals,         // +=
    Minus,              // -
    MinusMinus,         // --
    MinusEquals,        // -=
    Star,               // *
    StarStar,           // **
    StarStarEquals,     // **=
    StarEquals,         // *=
    Percent,            // %
    PercentEquals,      // %=
    Slash,              // /
    SlashEquals,        // /=
    // Bitwise and logical
    And,          // &
    AndAnd,       // &&
    AndAndEquals, // &&=
    AndEquals,    // &=
    Or,           // |
    OrOr,         // ||
    OrOrEquals,   // ||=
    OrEquals,     // |=
    Caret,        // ^
    CaretEquals,  // ^=
    Tilde,        // ~
    // Special
    Illegal, // ..
    Eof,
}

impl TokenKind {
    /// Returns the characters that make up a punctuator, or `None` for the
    /// variable-character and special kinds.
    pub fn token_chars(&self) -> Option<&'static str> {
        use TokenKind as TK;
        let chars = match self {
            TK::Identifier | TK::IntLiteral | TK::Illegal | TK::Eof => return None,
            TK::Function => "function",
            TK::Var => "var",
            TK::Return => "return",
            TK::If => "if",
            TK::For => "for",
            TK::Question => "?",
            TK::QuestionPeriod => "?.",
            TK::QuestionQuestion => "??",
            TK::QuestionQuestionEq => "??=",
            TK::OpenCurly => "{",
            TK::CloseCurly => "}",
            TK::OpenParen => "(",
            TK::CloseParen => ")",
            TK::OpenSquare => "[",
            TK::CloseSquare => "]",
            TK::Period => ".",
            TK::Spread => "...",
            TK::SemiColon => ";",
            TK::Comma => ",",
            TK::Colon => ":",
            TK::OpenAngle => "<",
            TK::LessEquals => "<=",
            TK::ShiftLeft => "<<",
            TK::ShiftLeftEquals => "<<=",
            TK::CloseAngle => ">",
            TK::GreaterEquals => ">=",
            TK::ShiftRight => ">>",
            TK::ShiftRightEquals => ">>=",
            TK::ShiftRightUnsigned => ">>>",
            TK::ShiftRightUnsignedEquals => ">>>=",
            TK::Equal => "=",
            TK::EqualEqual => "==",
            TK::EqualEqualEqual => "===",
            TK::Arrow => "=>",
            TK::Exclamation => "!",
            TK::NotEqual => "!=",
            TK::NotEqualEqual => "!==",
            TK::Plus => "+",
            TK::PlusPlus => "++",
            TK::PlusEquals => "+=",
            TK::Minus => "-",
            TK::MinusMinus => "--",
            TK::MinusEquals => "-=",
            TK::Star => "*",
            TK::StarStar => "**",
            TK::StarStarEquals => "**=",
            TK::StarEquals => "*=",
            TK::Percent => "%",
            TK::PercentEquals => "%=",
            TK::Slash => "/",
            TK::SlashEquals => "/=",
            TK::And => "&",
            TK::AndAnd => "&&",
            TK::AndAndEquals => "&&=",
            TK::AndEquals => "&=",
            TK::Or => "|",
            TK::OrOr => "||",
            TK::OrOrEquals => "||=",
            TK::OrEquals => "|=",
            TK::Caret => "^",
            TK::CaretEquals => "^=",
            TK::Tilde => "~",
        };

        Some(chars)
    }

    pub fn is_keyword(&self) -> bool {
        use TokenKind as TK;
        match self {
            TK::Function | TK::Var | TK::Return | TK::If | TK::For => true,
            _ => false,
        }
    }

    /// Punctuators that separate or close a construct. These end an
    /// expression when found in suffix position.
    pub fn is_separator(&self) -> bool {
        use TokenKind as TK;
        match self {
            TK::SemiColon | TK::Comma | TK::Colon |
            TK::CloseParen | TK::CloseSquare |
            TK::OpenCurly | TK::CloseCurly => true,
            _ => false,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier => f.write_str("identifier"),
            TokenKind::IntLiteral => f.write_str("integer literal"),
            TokenKind::Illegal => f.write_str("illegal token '..'"),
            TokenKind::Eof => f.write_str("end of input"),
            kind => match kind.token_chars() {
                Some(chars) => write!(f, "'{}'", chars),
                None => write!(f, "{:?}", kind),
            },
        }
    }
}

/// A classified lexical unit. `position` is the cursor right after the token
/// was consumed, `span` covers the token's own characters.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: Option<String>,
    pub position: InputPosition,
    pub span: InputSpan,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, position: InputPosition, span: InputSpan) -> Self {
        Self { kind, value: None, position, span }
    }

    pub(crate) fn with_value(kind: TokenKind, value: String, position: InputPosition, span: InputSpan) -> Self {
        Self { kind, value: Some(value), position, span }
    }

    pub fn text(&self) -> &str {
        match &self.value {
            Some(value) => value.as_str(),
            None => self.kind.token_chars().unwrap_or(""),
        }
    }
}
