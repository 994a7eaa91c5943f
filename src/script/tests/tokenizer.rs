/// tokenizer.rs
///
/// Tests for the tokenizer in isolation: punctuator matching, buffer
/// classification and position tracking.

use crate::script::input_source::{InputPosition, InputSpan};
use crate::script::tokenize;
use crate::script::tokens::{Token, TokenKind};

use TokenKind as TK;

fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|t| t.kind).collect()
}

fn pos(line: u32, column: u32, offset: u32) -> InputPosition {
    InputPosition{ line, column, offset }
}

#[test]
fn test_longest_match() {
    assert_eq!(kinds(&tokenize(">>>=")), vec![TK::ShiftRightUnsignedEquals, TK::Eof]);
    assert_eq!(kinds(&tokenize("?.")), vec![TK::QuestionPeriod, TK::Eof]);
    assert_eq!(kinds(&tokenize("??=")), vec![TK::QuestionQuestionEq, TK::Eof]);
    assert_eq!(kinds(&tokenize("===")), vec![TK::EqualEqualEqual, TK::Eof]);
    assert_eq!(kinds(&tokenize("**=")), vec![TK::StarStarEquals, TK::Eof]);

    // Longest match stops at the first character that does not continue
    assert_eq!(kinds(&tokenize(">>>>")), vec![TK::ShiftRightUnsigned, TK::CloseAngle, TK::Eof]);
    assert_eq!(kinds(&tokenize("++=")), vec![TK::PlusPlus, TK::Equal, TK::Eof]);
    assert_eq!(kinds(&tokenize("a=>b")), vec![TK::Identifier, TK::Arrow, TK::Identifier, TK::Eof]);
}

#[test]
fn test_dots() {
    assert_eq!(kinds(&tokenize(".")), vec![TK::Period, TK::Eof]);
    assert_eq!(kinds(&tokenize("..")), vec![TK::Illegal, TK::Eof]);
    assert_eq!(kinds(&tokenize("...")), vec![TK::Spread, TK::Eof]);
    assert_eq!(kinds(&tokenize("....")), vec![TK::Spread, TK::Period, TK::Eof]);
}

#[test]
fn test_single_eof() {
    for source in &["", "   ", "\n\n", "a", "a;", "function f() {}", "var x = [1, 2]\n"] {
        let tokens = tokenize(source);
        let num_eof = tokens.iter().filter(|t| t.kind == TK::Eof).count();
        assert_eq!(num_eof, 1, "source {:?} produced {} Eof tokens", source, num_eof);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TK::Eof), "source {:?} does not end in Eof", source);
    }
}

#[test]
fn test_deterministic() {
    let source = "function foo(a, b) { var c = a + b; return c }";
    assert_eq!(tokenize(source), tokenize(source));
}

#[test]
fn test_buffer_classification() {
    let tokens = tokenize("function var return if for fn vars 42 4a2 x$y");
    assert_eq!(kinds(&tokens), vec![
        TK::Function, TK::Var, TK::Return, TK::If, TK::For,
        TK::Identifier, TK::Identifier, TK::IntLiteral, TK::Identifier, TK::Identifier,
        TK::Eof
    ]);
    assert_eq!(tokens[0].value, None);
    assert_eq!(tokens[5].text(), "fn");
    assert_eq!(tokens[7].text(), "42");
    assert_eq!(tokens[9].text(), "x$y");

    // Too large for a 64-bit integer
    let tokens = tokenize("99999999999999999999");
    assert_eq!(tokens[0].kind, TK::Identifier);
    assert_eq!(tokens[0].text(), "99999999999999999999");

    // A minus sign is a punctuator, not part of the literal
    assert_eq!(kinds(&tokenize("-1")), vec![TK::Minus, TK::IntLiteral, TK::Eof]);
}

#[test]
fn test_whitespace() {
    let tokens = tokenize("a\tb\u{000B}c\u{000C}d\u{FEFF}e\u{00A0}f\r\ng");
    assert_eq!(tokens.len(), 8);
    assert!(tokens[..7].iter().all(|t| t.kind == TK::Identifier));
    let texts: Vec<&str> = tokens[..7].iter().map(|t| t.text()).collect();
    assert_eq!(texts, vec!["a", "b", "c", "d", "e", "f", "g"]);
}

#[test]
fn test_positions() {
    let tokens = tokenize("var x = 10\nx++");
    assert_eq!(kinds(&tokens), vec![
        TK::Var, TK::Identifier, TK::Equal, TK::IntLiteral, TK::Identifier, TK::PlusPlus, TK::Eof
    ]);

    // Buffered tokens record the cursor after the delimiter was consumed
    assert_eq!(tokens[0].position, pos(0, 4, 4));
    assert_eq!(tokens[0].span, InputSpan::from_positions(pos(0, 0, 0), pos(0, 3, 3)));
    assert_eq!(tokens[1].position, pos(0, 6, 6));
    assert_eq!(tokens[1].span, InputSpan::from_positions(pos(0, 4, 4), pos(0, 5, 5)));

    // Punctuators record the cursor right after their last character
    assert_eq!(tokens[2].position, pos(0, 7, 7));
    assert_eq!(tokens[2].span, InputSpan::from_positions(pos(0, 6, 6), pos(0, 7, 7)));

    // The newline moves the cursor to the next line
    assert_eq!(tokens[3].position, pos(1, 0, 11));
    assert_eq!(tokens[3].span, InputSpan::from_positions(pos(0, 8, 8), pos(0, 10, 10)));

    assert_eq!(tokens[4].position, pos(1, 2, 13));
    assert_eq!(tokens[4].span, InputSpan::from_positions(pos(1, 0, 11), pos(1, 1, 12)));
    assert_eq!(tokens[5].position, pos(1, 3, 14));
    assert_eq!(tokens[5].span, InputSpan::from_positions(pos(1, 1, 12), pos(1, 3, 14)));
    assert_eq!(tokens[6].position, pos(1, 3, 14));
}

#[test]
fn test_columns_count_code_points() {
    let tokens = tokenize("é ü");
    assert_eq!(tokens[0].span.begin, pos(0, 0, 0));
    assert_eq!(tokens[0].span.end, pos(0, 1, 2));
    assert_eq!(tokens[1].span.begin, pos(0, 2, 3));
    assert_eq!(tokens[1].span.end, pos(0, 3, 5));
}

#[test]
fn test_token_display() {
    assert_eq!(TK::ShiftRightUnsignedEquals.to_string(), "'>>>='");
    assert_eq!(TK::Function.to_string(), "'function'");
    assert_eq!(TK::Identifier.to_string(), "identifier");
    assert_eq!(TK::Eof.to_string(), "end of input");
}
