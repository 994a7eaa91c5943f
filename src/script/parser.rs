use std::fmt;

use derive_more::Display;

use super::ast::*;
use super::input_source::*;
use super::tokens::*;

use TokenKind as TK;

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ParseErrorKind {
    #[display(fmt = "expected {}, but found {}", expected, found)]
    UnexpectedTokenKind { expected: TokenKind, found: TokenKind },
    #[display(fmt = "unexpected {} at the start of a statement", _0)]
    UnknownStatementStart(TokenKind),
    #[display(fmt = "unexpected {} at the start of an expression", _0)]
    UnknownExpressionStart(TokenKind),
    #[display(fmt = "operator {} is not supported", _0)]
    UnknownSuffixOperator(TokenKind),
    #[display(fmt = "only a plain identifier can be {}", _0)]
    InvalidSuffixTarget(&'static str),
    #[display(fmt = "'{}' is not a valid integer literal", _0)]
    InvalidIntLiteral(String),
    #[display(fmt = "nesting exceeds the maximum depth of {}", _0)]
    NestingTooDeep(usize),
}

/// Deepest nesting of statements and expressions the parser accepts. Decoded
/// programs are held to the same limit.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Error produced while parsing. The first statement describes the error
/// itself, subsequent statements (if any) provide additional information.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub(crate) statements: Vec<ErrorStatement>,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, span: InputSpan) -> Self {
        let message = kind.to_string();
        Self { kind, statements: vec![ErrorStatement::new(StatementKind::Error, span, message)] }
    }

    pub(crate) fn with_info_at_span(mut self, span: InputSpan, message: String) -> Self {
        self.statements.push(ErrorStatement::new(StatementKind::Info, span, message));
        self
    }

    /// Fills in the filename and offending source lines of every statement.
    pub fn attach_source(mut self, source: &InputSource) -> Self {
        for statement in self.statements.iter_mut() {
            statement.attach_source(source);
        }
        self
    }

    pub fn statements(&self) -> &[ErrorStatement] {
        &self.statements
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_statements(&self.statements, f)
    }
}

impl std::error::Error for ParseError {}

/// Recursive descent parser with a single token of lookahead. Every suffix
/// operator parses a complete expression as its right hand side, so binary
/// chains nest to the right: `a + b > c` is `a + (b > c)`.
pub(crate) struct Parser<'t> {
    tokens: &'t [Token],
    index: usize,
    // End of the most recently consumed token, used to close node spans
    last_end: InputPosition,
    depth: usize,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, index: 0, last_end: InputPosition::default(), depth: 0 }
    }

    pub(crate) fn parse(&mut self, h: &mut Heap) -> Result<RootId, ParseError> {
        let begin = self.span().begin;
        let mut statements = Vec::new();
        loop {
            self.skip_semicolons();
            if self.has(TK::Eof) {
                break;
            }
            statements.push(self.consume_statement(h)?);
        }

        let span = InputSpan::from_positions(begin, self.span().end);
        let root = h.alloc_root(|this| Root { this, span, statements });

        // Suffix chains such as `a++++` deepen the tree without recursing
        if let Some(span) = h.find_too_deep(MAX_NESTING_DEPTH) {
            return Err(ParseError::new(ParseErrorKind::NestingTooDeep(MAX_NESTING_DEPTH), span));
        }
        Ok(root)
    }

    //--------------------------------------------------------------------------
    // Token helpers
    //--------------------------------------------------------------------------

    /// Kind of the current token. A token stream that lacks its terminating
    /// `Eof` behaves as if it had one.
    fn kind(&self) -> TokenKind {
        self.tokens.get(self.index).map(|t| t.kind).unwrap_or(TK::Eof)
    }

    fn span(&self) -> InputSpan {
        match self.tokens.get(self.index) {
            Some(token) => token.span,
            None => InputSpan::from_positions(self.last_end, self.last_end),
        }
    }

    fn has(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.index)?;
        self.index += 1;
        self.last_end = token.span.end;
        Some(token)
    }

    fn skip_semicolons(&mut self) {
        while self.has(TK::SemiColon) {
            self.advance();
        }
    }

    fn error_unexpected(&self, expected: TokenKind) -> ParseError {
        ParseError::new(
            ParseErrorKind::UnexpectedTokenKind { expected, found: self.kind() },
            self.span(),
        )
    }

    fn consume_token(&mut self, expected: TokenKind) -> Result<InputSpan, ParseError> {
        if !self.has(expected) {
            return Err(self.error_unexpected(expected));
        }
        let span = self.span();
        self.advance();
        Ok(span)
    }

    fn consume_identifier(&mut self) -> Result<Identifier, ParseError> {
        if !self.has(TK::Identifier) {
            return Err(self.error_unexpected(TK::Identifier));
        }
        let span = self.span();
        let value = self.advance().and_then(|t| t.value.clone()).unwrap_or_default();
        Ok(Identifier { span, value })
    }

    /// Consumes list items up to and including the closing token. Commas
    /// between items are optional.
    fn consume_list<T, F>(&mut self, h: &mut Heap, close: TokenKind, mut item: F) -> Result<Vec<T>, ParseError>
        where F: FnMut(&mut Self, &mut Heap) -> Result<T, ParseError>
    {
        let mut items = Vec::new();
        while !self.has(close) {
            if self.has(TK::Eof) {
                return Err(self.error_unexpected(close));
            }

            items.push(item(self, h)?);
            if self.has(TK::Comma) {
                self.advance();
            } else if !self.has(close) && (self.has(TK::Eof) || self.kind().is_separator()) {
                return Err(self.error_unexpected(close));
            }
        }

        self.consume_token(close)?;
        Ok(items)
    }

    fn span_from(&self, begin: InputPosition) -> InputSpan {
        InputSpan::from_positions(begin, self.last_end)
    }

    /// Runs `f` `levels` deeper, failing once the parser's own recursion
    /// passes the nesting limit.
    fn nested<T, F>(&mut self, h: &mut Heap, levels: usize, f: F) -> Result<T, ParseError>
        where F: FnOnce(&mut Self, &mut Heap) -> Result<T, ParseError>
    {
        if self.depth + levels > MAX_NESTING_DEPTH {
            return Err(ParseError::new(ParseErrorKind::NestingTooDeep(MAX_NESTING_DEPTH), self.span()));
        }
        self.depth += levels;
        let result = f(self, h);
        self.depth -= levels;
        result
    }

    //--------------------------------------------------------------------------
    // Statements
    //--------------------------------------------------------------------------

    fn consume_statement(&mut self, h: &mut Heap) -> Result<StatementId, ParseError> {
        self.nested(h, 1, |p, h| p.consume_statement_inner(h))
    }

    fn consume_statement_inner(&mut self, h: &mut Heap) -> Result<StatementId, ParseError> {
        match self.kind() {
            TK::Function => Ok(self.consume_function_declaration(h)?.upcast()),
            TK::Var => Ok(self.consume_variable_declaration(h)?.upcast()),
            TK::Return => Ok(self.consume_return_statement(h)?.upcast()),
            TK::If => Ok(self.consume_if_statement(h)?.upcast()),
            TK::For => Ok(self.consume_for_statement(h)?.upcast()),
            TK::OpenCurly => Ok(self.consume_block_statement(h)?.upcast()),
            kind if is_expression_start(kind) => Ok(self.consume_expression_statement(h)?.upcast()),
            kind => Err(ParseError::new(ParseErrorKind::UnknownStatementStart(kind), self.span())),
        }
    }

    fn consume_block_statement(&mut self, h: &mut Heap) -> Result<BlockStatementId, ParseError> {
        let open_span = self.consume_token(TK::OpenCurly)?;
        let mut statements = Vec::new();
        loop {
            self.skip_semicolons();
            if self.has(TK::CloseCurly) {
                break;
            }
            if self.has(TK::Eof) {
                return Err(self.error_unexpected(TK::CloseCurly)
                    .with_info_at_span(open_span, String::from("block was opened here")));
            }
            statements.push(self.consume_statement(h)?);
        }
        self.consume_token(TK::CloseCurly)?;

        let span = self.span_from(open_span.begin);
        Ok(h.alloc_block_statement(|this| BlockStatement { this, span, statements }))
    }

    fn consume_function_declaration(&mut self, h: &mut Heap) -> Result<FunctionDeclarationId, ParseError> {
        let begin = self.consume_token(TK::Function)?.begin;
        let identifier = self.consume_identifier()?;
        self.consume_token(TK::OpenParen)?;
        let parameters = self.consume_list(h, TK::CloseParen, |p, _| p.consume_identifier())?;
        let body = self.nested(h, 1, |p, h| p.consume_block_statement(h))?;

        let span = self.span_from(begin);
        Ok(h.alloc_function_declaration(|this| FunctionDeclaration {
            this, span, identifier, parameters, body
        }))
    }

    fn consume_variable_declaration(&mut self, h: &mut Heap) -> Result<VariableDeclarationId, ParseError> {
        let begin = self.consume_token(TK::Var)?.begin;
        let identifier = self.consume_identifier()?;
        self.consume_token(TK::Equal)?;
        let initializer = self.consume_expression(h)?;

        let span = self.span_from(begin);
        let declarator = VariableDeclarator {
            span: InputSpan::from_positions(identifier.span.begin, span.end),
            identifier,
            initializer,
        };
        Ok(h.alloc_variable_declaration(|this| VariableDeclaration {
            this, span, declarations: vec![declarator]
        }))
    }

    fn consume_return_statement(&mut self, h: &mut Heap) -> Result<ReturnStatementId, ParseError> {
        let begin = self.consume_token(TK::Return)?.begin;
        let argument = if is_expression_start(self.kind()) {
            Some(self.consume_expression(h)?)
        } else {
            None
        };
        if self.has(TK::SemiColon) {
            self.advance();
        }

        let span = self.span_from(begin);
        Ok(h.alloc_return_statement(|this| ReturnStatement { this, span, argument }))
    }

    fn consume_if_statement(&mut self, h: &mut Heap) -> Result<IfStatementId, ParseError> {
        let begin = self.consume_token(TK::If)?.begin;
        self.consume_token(TK::OpenParen)?;
        let test = self.consume_expression(h)?;
        self.consume_token(TK::CloseParen)?;
        let consequent = self.consume_statement(h)?;

        let span = self.span_from(begin);
        Ok(h.alloc_if_statement(|this| IfStatement { this, span, test, consequent }))
    }

    fn consume_for_statement(&mut self, h: &mut Heap) -> Result<ForStatementId, ParseError> {
        let begin = self.consume_token(TK::For)?.begin;
        self.consume_token(TK::OpenParen)?;
        let init = self.consume_statement(h)?;
        self.consume_token(TK::SemiColon)?;
        let test = self.consume_expression(h)?;
        self.consume_token(TK::SemiColon)?;
        let update = self.consume_expression(h)?;
        self.consume_token(TK::CloseParen)?;
        let body = self.consume_statement(h)?;

        let span = self.span_from(begin);
        Ok(h.alloc_for_statement(|this| ForStatement { this, span, init, test, update, body }))
    }

    fn consume_expression_statement(&mut self, h: &mut Heap) -> Result<ExpressionStatementId, ParseError> {
        let expression = self.consume_expression(h)?;
        let span = h[expression].span();
        Ok(h.alloc_expression_statement(|this| ExpressionStatement { this, span, expression }))
    }

    //--------------------------------------------------------------------------
    // Expressions
    //--------------------------------------------------------------------------

    fn consume_expression(&mut self, h: &mut Heap) -> Result<ExpressionId, ParseError> {
        self.nested(h, 1, |p, h| p.consume_expression_inner(h))
    }

    fn consume_expression_inner(&mut self, h: &mut Heap) -> Result<ExpressionId, ParseError> {
        let (mut expr, mut grouped) = self.consume_primary_expression(h)?;

        loop {
            let begin = h[expr].span().begin;
            expr = match self.kind() {
                TK::Plus => self.consume_binary_suffix(h, expr, BinaryOperator::Add)?,
                TK::OpenAngle => self.consume_binary_suffix(h, expr, BinaryOperator::LessThan)?,
                TK::CloseAngle => self.consume_binary_suffix(h, expr, BinaryOperator::GreaterThan)?,
                TK::Equal => {
                    self.advance();
                    let right = self.consume_expression(h)?;
                    let span = self.span_from(begin);
                    h.alloc_assignment_expression(|this| AssignmentExpression {
                        this, span, left: expr, operation: AssignmentOperator::Set, right
                    }).upcast()
                },
                TK::PlusPlus | TK::MinusMinus => {
                    let operation = if self.has(TK::PlusPlus) {
                        UpdateOperator::Increment
                    } else {
                        UpdateOperator::Decrement
                    };
                    self.advance();
                    let span = self.span_from(begin);
                    h.alloc_update_expression(|this| UpdateExpression {
                        this, span, operation, argument: expr
                    }).upcast()
                },
                TK::OpenParen => {
                    let callee = match &h[expr] {
                        Expression::Identifier(ident) if !grouped => ident.identifier.clone(),
                        _ => return Err(ParseError::new(
                            ParseErrorKind::InvalidSuffixTarget("called"), self.span()
                        )),
                    };
                    self.advance();
                    let arguments = self.consume_list(h, TK::CloseParen, |p, h| p.consume_expression(h))?;
                    let span = self.span_from(begin);
                    h.alloc_call_expression(|this| CallExpression {
                        this, span, callee, arguments
                    }).upcast()
                },
                TK::OpenSquare => {
                    if grouped || !matches!(h[expr], Expression::Identifier(_)) {
                        return Err(ParseError::new(
                            ParseErrorKind::InvalidSuffixTarget("indexed"), self.span()
                        ));
                    }
                    self.advance();
                    let property = self.consume_expression(h)?;
                    self.consume_token(TK::CloseSquare)?;
                    let span = self.span_from(begin);
                    h.alloc_member_expression(|this| MemberExpression {
                        this, span, object: expr, property
                    }).upcast()
                },
                kind if is_unsupported_operator(kind) => {
                    return Err(ParseError::new(ParseErrorKind::UnknownSuffixOperator(kind), self.span()));
                },
                _ => break,
            };
            grouped = false;
        }

        Ok(expr)
    }

    fn consume_binary_suffix(&mut self, h: &mut Heap, left: ExpressionId, operation: BinaryOperator) -> Result<ExpressionId, ParseError> {
        let begin = h[left].span().begin;
        self.advance();
        let right = self.consume_expression(h)?;
        let span = self.span_from(begin);
        Ok(h.alloc_binary_expression(|this| BinaryExpression {
            this, span, left, operation, right
        }).upcast())
    }

    /// Parses an expression without suffixes. The flag is set when the
    /// expression was wrapped in parentheses, which keeps `(f)(1)` from
    /// passing as a call of `f`.
    fn consume_primary_expression(&mut self, h: &mut Heap) -> Result<(ExpressionId, bool), ParseError> {
        let expr = match self.kind() {
            TK::OpenParen => {
                self.advance();
                let expr = self.consume_expression(h)?;
                self.consume_token(TK::CloseParen)?;
                return Ok((expr, true));
            },
            TK::Identifier => {
                let identifier = self.consume_identifier()?;
                Ok(h.alloc_identifier_expression(|this| IdentifierExpression {
                    this, identifier
                }).upcast())
            },
            TK::IntLiteral => {
                let span = self.span();
                let text = self.advance().and_then(|t| t.value.clone()).unwrap_or_default();
                let value = match text.parse::<i64>() {
                    Ok(value) => value,
                    Err(_) => return Err(ParseError::new(ParseErrorKind::InvalidIntLiteral(text), span)),
                };
                Ok(h.alloc_int_literal_expression(|this| IntLiteralExpression {
                    this, span, value
                }).upcast())
            },
            TK::OpenSquare => {
                let begin = self.span().begin;
                self.advance();
                let elements = self.consume_list(h, TK::CloseSquare, |p, h| p.consume_expression(h))?;
                let span = self.span_from(begin);
                Ok(h.alloc_array_expression(|this| ArrayExpression {
                    this, span, elements
                }).upcast())
            },
            TK::OpenCurly => {
                let begin = self.span().begin;
                self.advance();
                let properties = self.consume_list(h, TK::CloseCurly, |p, h| p.consume_property(h))?;
                let span = self.span_from(begin);
                Ok(h.alloc_object_expression(|this| ObjectExpression {
                    this, span, properties
                }).upcast())
            },
            kind => Err(ParseError::new(ParseErrorKind::UnknownExpressionStart(kind), self.span())),
        }?;
        Ok((expr, false))
    }

    fn consume_property(&mut self, h: &mut Heap) -> Result<Property, ParseError> {
        let key = self.consume_expression(h)?;
        self.consume_token(TK::Colon)?;
        let value = self.consume_expression(h)?;
        let span = InputSpan::from_positions(h[key].span().begin, self.last_end);
        Ok(Property { span, key, value })
    }
}

fn is_expression_start(kind: TokenKind) -> bool {
    match kind {
        TK::OpenParen | TK::Identifier | TK::IntLiteral | TK::OpenSquare | TK::OpenCurly => true,
        _ => false,
    }
}

/// Operator punctuators that the grammar has no suffix rule for. Anything
/// else that cannot continue an expression simply ends it.
fn is_unsupported_operator(kind: TokenKind) -> bool {
    kind.token_chars().is_some() && !kind.is_keyword() && !kind.is_separator()
}
