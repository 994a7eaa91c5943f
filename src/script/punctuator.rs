use lazy_static::lazy_static;

use crate::common::*;
use super::tokens::TokenKind;

/// Node of the punctuator trie: the kind of token recognized so far, and the
/// characters that may extend it into a longer punctuator.
#[derive(Debug)]
pub(crate) struct Punctuator {
    pub kind: TokenKind,
    continuations: HashMap<char, Punctuator>,
}

impl Punctuator {
    pub(crate) fn continuation(&self, c: char) -> Option<&Punctuator> {
        self.continuations.get(&c)
    }
}

fn leaf(kind: TokenKind) -> Punctuator {
    Punctuator { kind, continuations: HashMap::new() }
}

fn node(kind: TokenKind, continuations: HashMap<char, Punctuator>) -> Punctuator {
    Punctuator { kind, continuations }
}

lazy_static! {
    static ref PUNCTUATORS: HashMap<char, Punctuator> = {
        use TokenKind as TK;

        hashmap!{
            '?' => node(TK::Question, hashmap!{
                '.' => leaf(TK::QuestionPeriod),
                '?' => node(TK::QuestionQuestion, hashmap!{
                    '=' => leaf(TK::QuestionQuestionEq),
                }),
            }),
            '{' => leaf(TK::OpenCurly),
            '}' => leaf(TK::CloseCurly),
            '(' => leaf(TK::OpenParen),
            ')' => leaf(TK::CloseParen),
            '[' => leaf(TK::OpenSquare),
            ']' => leaf(TK::CloseSquare),
            // ".." is only a step towards "...", on its own it is illegal
            '.' => node(TK::Period, hashmap!{
                '.' => node(TK::Illegal, hashmap!{
                    '.' => leaf(TK::Spread),
                }),
            }),
            ';' => leaf(TK::SemiColon),
            ',' => leaf(TK::Comma),
            ':' => leaf(TK::Colon),
            '<' => node(TK::OpenAngle, hashmap!{
                '=' => leaf(TK::LessEquals),
                '<' => node(TK::ShiftLeft, hashmap!{
                    '=' => leaf(TK::ShiftLeftEquals),
                }),
            }),
            '>' => node(TK::CloseAngle, hashmap!{
                '=' => leaf(TK::GreaterEquals),
                '>' => node(TK::ShiftRight, hashmap!{
                    '=' => leaf(TK::ShiftRightEquals),
                    '>' => node(TK::ShiftRightUnsigned, hashmap!{
                        '=' => leaf(TK::ShiftRightUnsignedEquals),
                    }),
                }),
            }),
            '=' => node(TK::Equal, hashmap!{
                '=' => node(TK::EqualEqual, hashmap!{
                    '=' => leaf(TK::EqualEqualEqual),
                }),
                '>' => leaf(TK::Arrow),
            }),
            '!' => node(TK::Exclamation, hashmap!{
                '=' => node(TK::NotEqual, hashmap!{
                    '=' => leaf(TK::NotEqualEqual),
                }),
            }),
            '+' => node(TK::Plus, hashmap!{
                '+' => leaf(TK::PlusPlus),
                '=' => leaf(TK::PlusEquals),
            }),
            '-' => node(TK::Minus, hashmap!{
                '-' => leaf(TK::MinusMinus),
                '=' => leaf(TK::MinusEquals),
            }),
            '*' => node(TK::Star, hashmap!{
                '*' => node(TK::StarStar, hashmap!{
                    '=' => leaf(TK::StarStarEquals),
                }),
                '=' => leaf(TK::StarEquals),
            }),
            '%' => node(TK::Percent, hashmap!{
                '=' => leaf(TK::PercentEquals),
            }),
            '/' => node(TK::Slash, hashmap!{
                '=' => leaf(TK::SlashEquals),
            }),
            '&' => node(TK::And, hashmap!{
                '&' => node(TK::AndAnd, hashmap!{
                    '=' => leaf(TK::AndAndEquals),
                }),
                '=' => leaf(TK::AndEquals),
            }),
            '|' => node(TK::Or, hashmap!{
                '|' => node(TK::OrOr, hashmap!{
                    '=' => leaf(TK::OrOrEquals),
                }),
                '=' => leaf(TK::OrEquals),
            }),
            '^' => node(TK::Caret, hashmap!{
                '=' => leaf(TK::CaretEquals),
            }),
            '~' => leaf(TK::Tilde),
        }
    };
}

/// Returns the trie root for a punctuator starting with `c`, if any.
pub(crate) fn punctuator_start(c: char) -> Option<&'static Punctuator> {
    PUNCTUATORS.get(&c)
}
