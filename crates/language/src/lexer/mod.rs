/// FerrisScript lexer: a lazy, restartable token stream over a source string.

mod token;

pub use token::{Keyword, SyntaxPosition, Token, TokenCategory, TokenKind, keywords_for};

use crate::diagnostic::{Diagnostic, Span, Stage, ToDiagnostic};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("unexpected character {ch:?} (U+{:04X})", codepoint(.ch))]
    InvalidCharacter { ch: char, span: Span },
    #[error("unterminated string literal")]
    UnterminatedString { span: Span },
    #[error("invalid escape sequence `\\{ch}` in string literal")]
    InvalidEscape { ch: char, span: Span },
    #[error("malformed number literal `{text}`: {reason}")]
    MalformedNumber { text: String, reason: &'static str, span: Span },
    #[error("unterminated block comment")]
    UnterminatedComment { span: Span },
}

fn codepoint(ch: &char) -> u32 {
    u32::from(*ch)
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::InvalidCharacter { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::InvalidEscape { span, .. }
            | LexError::MalformedNumber { span, .. }
            | LexError::UnterminatedComment { span } => *span,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            LexError::InvalidCharacter { .. } => "E101",
            LexError::UnterminatedString { .. } => "E102",
            LexError::InvalidEscape { .. } => "E103",
            LexError::MalformedNumber { .. } => "E104",
            LexError::UnterminatedComment { .. } => "E105",
        }
    }
}

impl ToDiagnostic for LexError {
    fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(Stage::Lex, self.code(), self.to_string(), Some(self.span()))
    }
}

/// A saved lexer position. Lexing can resume from any checkpoint taken
/// between tokens. Only [`Lexer::checkpoint`] creates one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    offset: usize,
    line: usize,
    column: usize,
}

impl Checkpoint {
    pub fn offset(&self) -> usize {
        self.offset
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer { source, offset: 0, line: 1, column: 1, finished: false }
    }

    /// Re-lex `source` starting at a checkpoint taken earlier.
    ///
    /// A checkpoint that does not fit `source` (past its end or inside a
    /// multi-byte character) is moved back to the previous character
    /// boundary, and the position is recounted from the start.
    pub fn resume(source: &'a str, checkpoint: Checkpoint) -> Self {
        let mut offset = checkpoint.offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let (line, column) = if offset == checkpoint.offset {
            (checkpoint.line, checkpoint.column)
        } else {
            position_of(source, offset)
        };
        Lexer { source, offset, line, column, finished: false }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint { offset: self.offset, line: self.line, column: self.column }
    }

    fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.offset..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.advance();
        }
    }

    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match (self.peek(), self.peek_next()) {
                (Some(ch), _) if ch.is_whitespace() => {
                    self.advance();
                }
                (Some('/'), Some('/')) => {
                    self.advance_while(|c| c != '\n');
                }
                (Some('/'), Some('*')) => {
                    let start = self.span();
                    self.advance();
                    self.advance();
                    loop {
                        match self.advance() {
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                break;
                            }
                            Some(_) => {}
                            None => return Err(LexError::UnterminatedComment { span: start }),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Produce the next token. After `Eof` every call returns `Eof` again.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia()?;

        let start = self.offset;
        let span = self.span();
        let Some(ch) = self.advance() else {
            return Ok(Token::new(TokenKind::Eof, "", span));
        };

        let kind = match ch {
            '+' => self.with_equal(TokenKind::Plus, TokenKind::PlusEqual),
            '*' => self.with_equal(TokenKind::Star, TokenKind::StarEqual),
            '/' => self.with_equal(TokenKind::Slash, TokenKind::SlashEqual),
            '%' => self.with_equal(TokenKind::Percent, TokenKind::PercentEqual),
            '=' => self.with_equal(TokenKind::Equal, TokenKind::EqualEqual),
            '!' => self.with_equal(TokenKind::Bang, TokenKind::NotEqual),
            '<' => self.with_equal(TokenKind::Less, TokenKind::LessEqual),
            '>' => self.with_equal(TokenKind::Greater, TokenKind::GreaterEqual),
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    self.with_equal(TokenKind::Minus, TokenKind::MinusEqual)
                }
            }
            '&' if self.peek() == Some('&') => {
                self.advance();
                TokenKind::And
            }
            '|' if self.peek() == Some('|') => {
                self.advance();
                TokenKind::Or
            }
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '.' => {
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance_while(|c| c.is_ascii_digit() || c == '.');
                    return Err(LexError::MalformedNumber {
                        text: self.source[start..self.offset].to_string(),
                        reason: "leading decimal point",
                        span,
                    });
                }
                TokenKind::Dot
            }
            '"' => self.read_string(span)?,
            c if c.is_ascii_digit() => self.read_number(start, span)?,
            c if is_ident_start(c) => {
                self.advance_while(is_ident_continue);
                let text = &self.source[start..self.offset];
                match Keyword::lookup(text) {
                    Some(kw) => kw.token(),
                    None => TokenKind::Identifier(text.to_string()),
                }
            }
            other => return Err(LexError::InvalidCharacter { ch: other, span }),
        };

        Ok(Token::new(kind, &self.source[start..self.offset], span))
    }

    fn with_equal(&mut self, single: TokenKind, double: TokenKind) -> TokenKind {
        if self.peek() == Some('=') {
            self.advance();
            double
        } else {
            single
        }
    }

    /// Literals carry no sign, so the `i32` range check applies before any
    /// unary minus: `i32::MIN` has to be written `-2147483647 - 1`.
    fn read_number(&mut self, start: usize, span: Span) -> Result<TokenKind, LexError> {
        self.advance_while(|c| c.is_ascii_digit());

        let mut is_float = false;
        if self.peek() == Some('.') {
            if !self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
                return Err(self.malformed(start, "trailing decimal point", span));
            }
            self.advance();
            self.advance_while(|c| c.is_ascii_digit());
            is_float = true;

            if self.peek() == Some('.') {
                self.advance_while(|c| c.is_ascii_digit() || c == '.');
                return Err(self.malformed(start, "multiple decimal points", span));
            }
        }

        if self.peek().is_some_and(is_ident_continue) {
            self.advance_while(is_ident_continue);
            return Err(self.malformed(start, "invalid suffix", span));
        }

        let text = &self.source[start..self.offset];
        if is_float {
            match text.parse::<f32>() {
                Ok(v) if v.is_finite() => Ok(TokenKind::Float(v)),
                _ => Err(self.malformed(start, "out of range for f32", span)),
            }
        } else {
            text.parse::<i32>()
                .map(TokenKind::Integer)
                .map_err(|_| self.malformed(start, "out of range for i32", span))
        }
    }

    fn malformed(&self, start: usize, reason: &'static str, span: Span) -> LexError {
        LexError::MalformedNumber { text: self.source[start..self.offset].to_string(), reason, span }
    }

    // Opening quote already consumed. On an invalid escape the rest of the
    // literal is still consumed so lexing resumes after the closing quote.
    fn read_string(&mut self, span: Span) -> Result<TokenKind, LexError> {
        let mut value = String::new();
        let mut bad_escape = None;

        loop {
            let escape_span = self.span();
            match self.advance() {
                None | Some('\n') => return Err(LexError::UnterminatedString { span }),
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    None | Some('\n') => return Err(LexError::UnterminatedString { span }),
                    Some(other) => {
                        bad_escape.get_or_insert(LexError::InvalidEscape { ch: other, span: escape_span });
                    }
                },
                Some(c) => value.push(c),
            }
        }

        match bad_escape {
            Some(err) => Err(err),
            None => Ok(TokenKind::Str(value)),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    /// Yields every token up to and including a single `Eof`, then `None`.
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        if matches!(&result, Ok(tok) if tok.kind == TokenKind::Eof) {
            self.finished = true;
        }
        Some(result)
    }
}

/// 1-based line and column (in characters) of a byte offset on a char boundary.
fn position_of(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |tail| tail.chars().count()) + 1;
    (line, column)
}

/// Identifiers are ASCII only: a letter or `_`, then letters, digits or `_`.
/// Every other character outside strings and comments is rejected.
pub fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

pub fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Lex a whole source string, stopping at the first error.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).collect()
}
