/// Tokens, keywords and the syntax positions keywords may appear in.

use crate::diagnostic::Span;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Fn,
    Let,
    Mut,
    If,
    Else,
    While,
    Return,
    True,
    False,
    SelfKw,

    // Literals
    Identifier(String),
    Integer(i32),
    Float(f32),
    Str(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equal,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Bang,
    And,          // &&
    Or,           // ||
    PlusEqual,    // +=
    MinusEqual,   // -=
    StarEqual,    // *=
    SlashEqual,   // /=
    PercentEqual, // %=
    Arrow,        // ->

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Colon,
    Dot,

    Eof,
}

/// Coarse token classes, as reported to diagnostics and tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCategory {
    Keyword,
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    BoolLiteral,
    Operator,
    Punctuation,
    EndOfInput,
}

impl TokenKind {
    pub fn category(&self) -> TokenCategory {
        use TokenKind::*;
        match self {
            Fn | Let | Mut | If | Else | While | Return | SelfKw => TokenCategory::Keyword,
            True | False => TokenCategory::BoolLiteral,
            Identifier(_) => TokenCategory::Identifier,
            Integer(_) => TokenCategory::IntLiteral,
            Float(_) => TokenCategory::FloatLiteral,
            Str(_) => TokenCategory::StringLiteral,
            Plus | Minus | Star | Slash | Percent | Equal | EqualEqual | NotEqual | Less | LessEqual
            | Greater | GreaterEqual | Bang | And | Or | PlusEqual | MinusEqual | StarEqual
            | SlashEqual | PercentEqual | Arrow => TokenCategory::Operator,
            LParen | RParen | LBrace | RBrace | Comma | Semicolon | Colon | Dot => TokenCategory::Punctuation,
            Eof => TokenCategory::EndOfInput,
        }
    }

    pub fn keyword(&self) -> Option<Keyword> {
        Keyword::ALL.iter().copied().find(|k| k.token() == *self)
    }

    /// Human-readable description used in "expected X, found Y" messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(name) => format!("identifier `{}`", name),
            TokenKind::Integer(n) => format!("integer literal `{}`", n),
            TokenKind::Float(v) => format!("float literal `{:?}`", v),
            TokenKind::Str(s) => format!("string literal {:?}", s),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("`{}`", other),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(kw) = self.keyword() {
            return f.write_str(kw.as_str());
        }
        let text = match self {
            TokenKind::Identifier(name) => return f.write_str(name),
            TokenKind::Integer(n) => return write!(f, "{}", n),
            TokenKind::Float(v) => return write!(f, "{:?}", v),
            TokenKind::Str(s) => return write!(f, "{:?}", s),
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Equal => "=",
            TokenKind::EqualEqual => "==",
            TokenKind::NotEqual => "!=",
            TokenKind::Less => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEqual => ">=",
            TokenKind::Bang => "!",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::PlusEqual => "+=",
            TokenKind::MinusEqual => "-=",
            TokenKind::StarEqual => "*=",
            TokenKind::SlashEqual => "/=",
            TokenKind::PercentEqual => "%=",
            TokenKind::Arrow => "->",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Eof => "<eof>",
            // keywords handled above
            _ => "",
        };
        f.write_str(text)
    }
}

/// A lexed token. `lexeme` is the exact source slice it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self { kind, lexeme: lexeme.into(), span }
    }

    pub fn line(&self) -> usize {
        self.span.line
    }

    pub fn column(&self) -> usize {
        self.span.column
    }

    /// Position just past the last character of this token.
    pub fn end(&self) -> Span {
        Span::new(self.span.line, self.span.column + self.lexeme.chars().count())
    }
}

/// Where in the grammar a keyword is being considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxPosition {
    /// Script level, between declarations.
    Item,
    /// Start of a statement inside a block.
    Statement,
    /// Anywhere an expression is expected.
    Expression,
}

impl fmt::Display for SyntaxPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxPosition::Item => f.write_str("script-level"),
            SyntaxPosition::Statement => f.write_str("statement"),
            SyntaxPosition::Expression => f.write_str("expression"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Fn,
    Let,
    Mut,
    If,
    Else,
    While,
    Return,
    True,
    False,
    SelfKw,
}

impl Keyword {
    pub const ALL: [Keyword; 10] = [
        Keyword::Fn,
        Keyword::Let,
        Keyword::Mut,
        Keyword::If,
        Keyword::Else,
        Keyword::While,
        Keyword::Return,
        Keyword::True,
        Keyword::False,
        Keyword::SelfKw,
    ];

    pub fn lookup(ident: &str) -> Option<Keyword> {
        Self::ALL.iter().copied().find(|k| k.as_str() == ident)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Fn => "fn",
            Keyword::Let => "let",
            Keyword::Mut => "mut",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Return => "return",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::SelfKw => "self",
        }
    }

    pub fn token(self) -> TokenKind {
        match self {
            Keyword::Fn => TokenKind::Fn,
            Keyword::Let => TokenKind::Let,
            Keyword::Mut => TokenKind::Mut,
            Keyword::If => TokenKind::If,
            Keyword::Else => TokenKind::Else,
            Keyword::While => TokenKind::While,
            Keyword::Return => TokenKind::Return,
            Keyword::True => TokenKind::True,
            Keyword::False => TokenKind::False,
            Keyword::SelfKw => TokenKind::SelfKw,
        }
    }

    /// Keywords that begin a statement. Never valid where an expression is expected.
    pub fn starts_statement(self) -> bool {
        matches!(self, Keyword::Let | Keyword::If | Keyword::While | Keyword::Return)
    }

    /// Keywords that only make sense inside an expression.
    pub fn is_expression_keyword(self) -> bool {
        matches!(self, Keyword::True | Keyword::False | Keyword::SelfKw)
    }

    /// Whether this keyword may start a construct at `position`.
    ///
    /// `mut` and `else` only continue a construct, so they start nothing.
    pub fn allowed_in(self, position: SyntaxPosition) -> bool {
        match position {
            SyntaxPosition::Item => matches!(self, Keyword::Fn | Keyword::Let),
            // An expression statement can begin with an expression keyword.
            SyntaxPosition::Statement => self.starts_statement() || self.is_expression_keyword(),
            SyntaxPosition::Expression => self.is_expression_keyword(),
        }
    }
}

/// Keywords that can begin a construct at `position`.
pub fn keywords_for(position: SyntaxPosition) -> Vec<Keyword> {
    Keyword::ALL.iter().copied().filter(|k| k.allowed_in(position)).collect()
}
