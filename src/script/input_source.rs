use std::fmt;
use std::fmt::Write;

/// Cursor position. `line` and `column` are zero-based and count code
/// points, `offset` is the byte offset into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct InputPosition {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct InputSpan {
    pub begin: InputPosition,
    pub end: InputPosition,
}

impl InputSpan {
    #[inline]
    pub fn from_positions(begin: InputPosition, end: InputPosition) -> Self {
        Self { begin, end }
    }
}

/// Wrapper around source text with an optional filename. The cursor only
/// moves forward, so a source can be scanned exactly once.
pub struct InputSource {
    pub(crate) filename: String,
    pub(crate) input: String,
    // Iteration
    line: u32,
    column: u32,
    offset: usize,
}

impl InputSource {
    pub fn new(filename: String, input: String) -> Self {
        Self {
            filename,
            input,
            line: 0,
            column: 0,
            offset: 0,
        }
    }

    #[cfg(test)]
    pub fn new_test(input: &str) -> Self {
        Self::new(String::from("test"), input.to_string())
    }

    #[inline]
    pub fn pos(&self) -> InputPosition {
        InputPosition { line: self.line, column: self.column, offset: self.offset as u32 }
    }

    pub fn next(&self) -> Option<char> {
        self.input[self.offset..].chars().next()
    }

    /// Consumes the next code point, keeping line and column up to date.
    pub fn consume(&mut self) {
        match self.next() {
            Some('\n') => {
                self.line += 1;
                self.column = 0;
                self.offset += 1;
            }
            Some(c) => {
                self.column += 1;
                self.offset += c.len_utf8();
            }
            None => {}
        }

        debug_assert!(self.offset < u32::max_value() as usize);
    }

    /// Text of the given zero-based line without its line terminator, or an
    /// empty string if the source has no such line.
    pub(crate) fn line_text(&self, line: u32) -> &str {
        match self.input.split('\n').nth(line as usize) {
            Some(text) => text.strip_suffix('\r').unwrap_or(text),
            None => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Info,
    Error,
}

/// One message of an error report. The context line is filled in once the
/// report is tied to its source through `attach_source`.
#[derive(Debug, Clone)]
pub struct ErrorStatement {
    pub(crate) statement_kind: StatementKind,
    pub(crate) span: InputSpan,
    pub(crate) filename: String,
    pub(crate) context: String,
    pub(crate) message: String,
}

impl ErrorStatement {
    pub(crate) fn new(statement_kind: StatementKind, span: InputSpan, message: String) -> Self {
        Self {
            statement_kind,
            span,
            filename: String::new(),
            context: String::new(),
            message,
        }
    }

    pub(crate) fn attach_source(&mut self, source: &InputSource) {
        self.filename = source.filename.clone();
        self.context = source.line_text(self.span.begin.line).to_string();
    }

    pub fn kind(&self) -> StatementKind {
        self.statement_kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn span(&self) -> InputSpan {
        self.span
    }
}

impl fmt::Display for ErrorStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Write kind of statement and message
        match self.statement_kind {
            StatementKind::Info => f.write_str(" INFO: ")?,
            StatementKind::Error => f.write_str("ERROR: ")?,
        }
        f.write_str(&self.message)?;
        f.write_char('\n')?;

        // Write originating file/line/column
        f.write_str(" +- ")?;
        if !self.filename.is_empty() {
            write!(f, "in {} ", self.filename)?;
        }
        writeln!(f, "at {}:{}", self.span.begin.line + 1, self.span.begin.column + 1)?;

        if self.context.is_empty() {
            return Ok(());
        }

        // Context line with the offending span underlined. Tabs are widened
        // to four spaces in both lines so the underline stays aligned.
        let first_col = self.span.begin.column as usize;
        let last_col = if self.span.end.line == self.span.begin.line {
            (self.span.end.column as usize).max(first_col + 1)
        } else {
            self.context.chars().count().max(first_col + 1)
        };

        let mut context = String::with_capacity(128);
        let mut annotation = String::with_capacity(128);
        let mut underlined = false;
        for (char_idx, char) in self.context.chars().enumerate() {
            let width = if char == '\t' { 4 } else { 1 };
            if char == '\t' {
                context.push_str("    ");
            } else {
                context.push(char);
            }
            for _ in 0..width {
                if char_idx < first_col {
                    annotation.push(' ');
                } else if char_idx < last_col {
                    annotation.push('~');
                    underlined = true;
                }
            }
        }
        if !underlined {
            // Span starts at the end of the line, e.g. at the end of input
            annotation.push('~');
        }

        writeln!(f, " | ")?;
        writeln!(f, " | {}", context)?;
        writeln!(f, " | {}", annotation)
    }
}

/// Renders a sequence of statements, one after the other.
pub(crate) fn fmt_statements(statements: &[ErrorStatement], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if statements.is_empty() {
        return Ok(());
    }

    fmt::Display::fmt(&statements[0], f)?;
    for statement in statements.iter().skip(1) {
        writeln!(f)?;
        fmt::Display::fmt(statement, f)?;
    }

    Ok(())
}
