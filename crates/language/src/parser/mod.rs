/// FerrisScript parser: recursive descent with precedence climbing for
/// expressions and panic-mode error recovery.

use crate::ast::*;
use crate::diagnostic::{Diagnostic, Span, Stage, ToDiagnostic};
use crate::lexer::{LexError, Lexer, SyntaxPosition, Token, TokenKind};

/// Syntax nested deeper than this (blocks, parentheses, operator chains) is
/// rejected so later passes can recurse over the tree safely.
pub const MAX_NESTING: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
enum Precedence {
    Lowest,
    Or,          // ||
    And,         // &&
    Equals,      // == !=
    LessGreater, // < <= > >=
    Sum,         // + -
    Product,     // * / %
    Prefix,      // -X or !X
}

fn precedence_of(op: BinaryOp) -> Precedence {
    match op {
        BinaryOp::Or => Precedence::Or,
        BinaryOp::And => Precedence::And,
        BinaryOp::Eq | BinaryOp::Ne => Precedence::Equals,
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => Precedence::LessGreater,
        BinaryOp::Add | BinaryOp::Sub => Precedence::Sum,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => Precedence::Product,
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("expected {expected}, found {found}")]
    Expected { expected: &'static str, found: String },
    #[error("expected `;` after {after}")]
    MissingSemicolon { after: &'static str },
    #[error("expected expression, found {found}")]
    ExpectedExpression { found: String },
    #[error("invalid assignment target")]
    InvalidAssignmentTarget,
    #[error("`{keyword}` is not allowed in {position} position")]
    MisplacedKeyword { keyword: &'static str, position: SyntaxPosition },
    #[error("expected `fn` or `let` at script level, found {found}")]
    UnexpectedItem { found: String },
    #[error("only named functions can be called")]
    InvalidCallee,
    #[error("expression nested too deeply")]
    NestingTooDeep,
}

impl ParseErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ParseErrorKind::Expected { .. } => "E201",
            ParseErrorKind::MissingSemicolon { .. } => "E202",
            ParseErrorKind::ExpectedExpression { .. } => "E203",
            ParseErrorKind::InvalidAssignmentTarget => "E204",
            ParseErrorKind::MisplacedKeyword { .. } => "E205",
            ParseErrorKind::UnexpectedItem { .. } => "E206",
            ParseErrorKind::InvalidCallee => "E207",
            ParseErrorKind::NestingTooDeep => "E208",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ToDiagnostic for ParseError {
    fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(Stage::Parse, self.kind.code(), self.to_string(), Some(self.span))
    }
}

/// Anything that can go wrong before type checking.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SyntaxError {
    pub fn span(&self) -> Span {
        match self {
            SyntaxError::Lex(e) => e.span(),
            SyntaxError::Parse(e) => e.span,
        }
    }
}

impl ToDiagnostic for SyntaxError {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            SyntaxError::Lex(e) => e.to_diagnostic(),
            SyntaxError::Parse(e) => e.to_diagnostic(),
        }
    }
}

/// A best-effort program plus every syntax error found on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub program: Program,
    pub errors: Vec<SyntaxError>,
}

impl ParseOutput {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.errors.iter().map(ToDiagnostic::to_diagnostic).collect()
    }

    pub fn into_result(self) -> Result<Program, Vec<SyntaxError>> {
        if self.errors.is_empty() { Ok(self.program) } else { Err(self.errors) }
    }
}

/// Lex and parse a whole script.
pub fn parse(source: &str) -> ParseOutput {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();
    log::debug!(
        "parsed {} items with {} syntax errors",
        program.items.len(),
        parser.errors.len()
    );
    ParseOutput { program, errors: parser.errors }
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur_token: Token,
    /// Position just past the last consumed token.
    last_end: Span,
    /// Set by the first error; further errors are dropped until the parser
    /// reaches a synchronization point.
    panic_mode: bool,
    consumed: usize,
    depth: usize,
    pub errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        let mut p = Parser {
            lexer,
            cur_token: Token::new(TokenKind::Eof, "", Span::default()),
            last_end: Span::default(),
            panic_mode: false,
            consumed: 0,
            depth: 0,
            errors: vec![],
        };
        p.cur_token = p.pull_token();
        p
    }

    fn pull_token(&mut self) -> Token {
        loop {
            match self.lexer.next_token() {
                Ok(token) => return token,
                Err(err) => {
                    log::trace!("lex error at {}: {}", err.span(), err);
                    self.errors.push(SyntaxError::Lex(err));
                    self.panic_mode = true;
                }
            }
        }
    }

    /// Consume the current token and return it.
    fn next_token(&mut self) -> Token {
        let next = self.pull_token();
        let prev = std::mem::replace(&mut self.cur_token, next);
        self.last_end = prev.end();
        self.consumed += 1;
        prev
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.cur_token.kind == *kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.next_token();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Option<Token> {
        if self.check(&kind) {
            Some(self.next_token())
        } else {
            self.error_expected(expected);
            None
        }
    }

    fn expect_identifier(&mut self, expected: &'static str) -> Option<(String, Span)> {
        if let TokenKind::Identifier(name) = &self.cur_token.kind {
            let name = name.clone();
            let span = self.next_token().span;
            Some((name, span))
        } else {
            self.error_expected(expected);
            None
        }
    }

    fn expect_semicolon(&mut self, after: &'static str) {
        if self.eat(&TokenKind::Semicolon) {
            // a consumed `;` is a synchronization point
            self.panic_mode = false;
        } else {
            let span = self.last_end;
            self.error(ParseErrorKind::MissingSemicolon { after }, span);
        }
    }

    fn error(&mut self, kind: ParseErrorKind, span: Span) {
        if self.panic_mode {
            log::trace!("suppressed cascading parse error at {}: {}", span, kind);
            return;
        }
        log::trace!("parse error at {}: {}", span, kind);
        self.errors.push(SyntaxError::Parse(ParseError { kind, span }));
        self.panic_mode = true;
    }

    fn error_expected(&mut self, expected: &'static str) {
        let found = self.cur_token.kind.describe();
        let span = self.cur_token.span;
        self.error(ParseErrorKind::Expected { expected, found }, span);
    }

    /// Skip to the next statement boundary: past a `;`, before a `}`, before a
    /// statement keyword, or after a skipped `{ ... }` group.
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        loop {
            match &self.cur_token.kind {
                TokenKind::Eof => break,
                TokenKind::Semicolon if depth == 0 => {
                    self.next_token();
                    break;
                }
                TokenKind::RBrace if depth == 0 => break,
                TokenKind::RBrace => {
                    self.next_token();
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                TokenKind::LBrace => {
                    self.next_token();
                    depth += 1;
                }
                kind if depth == 0 && kind.keyword().is_some_and(|k| k.starts_statement()) => break,
                _ => {
                    self.next_token();
                }
            }
        }
        self.panic_mode = false;
    }

    /// Skip to the next `fn` or `let` at script level.
    fn synchronize_item(&mut self) {
        let mut depth = 0usize;
        loop {
            match &self.cur_token.kind {
                TokenKind::Eof => break,
                TokenKind::Fn | TokenKind::Let if depth == 0 => break,
                TokenKind::LBrace => {
                    self.next_token();
                    depth += 1;
                }
                TokenKind::RBrace => {
                    self.next_token();
                    depth = depth.saturating_sub(1);
                }
                _ => {
                    self.next_token();
                }
            }
        }
        self.panic_mode = false;
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::new();

        while !self.check(&TokenKind::Eof) {
            let before = self.consumed;
            match &self.cur_token.kind {
                TokenKind::Fn => {
                    if let Some(function) = self.parse_function() {
                        program.items.push(Item::Function(function));
                    }
                }
                TokenKind::Let => {
                    if let Some(global) = self.parse_let() {
                        program.items.push(Item::Global(global));
                    }
                }
                other => {
                    let found = other.describe();
                    let span = self.cur_token.span;
                    self.error(ParseErrorKind::UnexpectedItem { found }, span);
                }
            }
            if self.panic_mode {
                self.synchronize_item();
            }
            if self.consumed == before {
                self.next_token();
            }
        }
        program
    }

    // --- Declarations ---

    fn parse_function(&mut self) -> Option<FunctionDecl> {
        let start = self.next_token(); // fn
        let (name, _) = self.expect_identifier("function name")?;
        self.expect(TokenKind::LParen, "`(`")?;

        let mut params = vec![];
        if !self.check(&TokenKind::RParen) {
            loop {
                let (param_name, span) = self.expect_identifier("parameter name")?;
                self.expect(TokenKind::Colon, "`:` after parameter name")?;
                let ty = self.parse_type()?;
                params.push(Param { name: param_name, ty, span });
                if !self.eat(&TokenKind::Comma) || self.check(&TokenKind::RParen) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;

        let return_type = if self.eat(&TokenKind::Arrow) {
            self.parse_type()?
        } else {
            TypeName::new("void", self.cur_token.span)
        };

        let body = self.parse_block()?;
        Some(FunctionDecl { name, params, return_type, body, span: start.span })
    }

    fn parse_type(&mut self) -> Option<TypeName> {
        let (name, span) = self.expect_identifier("type name")?;
        Some(TypeName::new(name, span))
    }

    fn parse_let(&mut self) -> Option<LetDecl> {
        let start = self.next_token(); // let
        let mutable = self.eat(&TokenKind::Mut);
        let (name, _) = self.expect_identifier("variable name")?;

        let type_hint = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        self.expect(TokenKind::Equal, "`=`")?;
        let value = self.parse_expression(Precedence::Lowest)?;
        self.expect_semicolon("variable declaration");

        Some(LetDecl { name, mutable, type_hint, value, span: start.span, resolved: None })
    }

    // --- Statements ---

    fn parse_block(&mut self) -> Option<Block> {
        let saved = self.depth;
        if !self.enter_nesting() {
            return None;
        }
        let block = self.parse_block_inner();
        self.depth = saved;
        block
    }

    fn parse_block_inner(&mut self) -> Option<Block> {
        let open = self.expect(TokenKind::LBrace, "`{`")?;
        let mut statements = vec![];

        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            let before = self.consumed;
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            if self.panic_mode {
                self.synchronize();
            }
            if self.consumed == before {
                self.next_token();
            }
        }

        if self.eat(&TokenKind::RBrace) {
            self.panic_mode = false;
        } else {
            self.error_expected("`}`");
        }
        Some(Block { statements, span: open.span })
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match &self.cur_token.kind {
            TokenKind::Let => self.parse_let().map(Stmt::Let),
            TokenKind::If => self.parse_if().map(Stmt::If),
            TokenKind::While => self.parse_while().map(Stmt::While),
            TokenKind::Return => self.parse_return().map(Stmt::Return),
            TokenKind::Fn | TokenKind::Mut | TokenKind::Else => {
                let token = self.next_token();
                let keyword = token.kind.keyword().map(|k| k.as_str()).unwrap_or("?");
                self.error(
                    ParseErrorKind::MisplacedKeyword { keyword, position: SyntaxPosition::Statement },
                    token.span,
                );
                None
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_if(&mut self) -> Option<IfStmt> {
        let start = self.next_token(); // if
        let condition = self.parse_expression(Precedence::Lowest)?;
        let then_block = self.parse_block()?;

        let mut else_block = None;
        if self.eat(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                let nested = self.parse_if()?;
                let span = nested.span;
                else_block = Some(Block { statements: vec![Stmt::If(nested)], span });
            } else {
                else_block = Some(self.parse_block()?);
            }
        }

        Some(IfStmt { condition, then_block, else_block, span: start.span })
    }

    fn parse_while(&mut self) -> Option<WhileStmt> {
        let start = self.next_token(); // while
        let condition = self.parse_expression(Precedence::Lowest)?;
        let body = self.parse_block()?;
        Some(WhileStmt { condition, body, span: start.span })
    }

    fn parse_return(&mut self) -> Option<ReturnStmt> {
        let start = self.next_token(); // return
        let value = if self.check(&TokenKind::Semicolon) || self.check(&TokenKind::RBrace) {
            None
        } else {
            Some(self.parse_expression(Precedence::Lowest)?)
        };
        self.expect_semicolon("return statement");
        Some(ReturnStmt { value, span: start.span })
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest)?;

        let op = match &self.cur_token.kind {
            TokenKind::Equal => Some(None),
            kind => BinaryOp::from_compound(kind).map(Some),
        };

        let Some(op) = op else {
            self.expect_semicolon("expression statement");
            return Some(Stmt::Expr(expr));
        };

        self.next_token(); // = or op=
        if !expr.is_place() {
            self.error(ParseErrorKind::InvalidAssignmentTarget, expr.span);
        }
        let value = self.parse_expression(Precedence::Lowest)?;
        self.expect_semicolon("assignment");
        let span = expr.span;
        Some(Stmt::Assign(Assignment { target: expr, op, value, span }))
    }

    // --- Expressions ---

    fn enter_nesting(&mut self) -> bool {
        if self.depth >= MAX_NESTING {
            let span = self.cur_token.span;
            self.error(ParseErrorKind::NestingTooDeep, span);
            return false;
        }
        self.depth += 1;
        true
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let saved = self.depth;
        let result = if self.enter_nesting() { self.parse_binary(precedence) } else { None };
        self.depth = saved;
        result
    }

    fn parse_binary(&mut self, precedence: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;

        while let Some(op) = BinaryOp::from_token(&self.cur_token.kind) {
            let op_precedence = precedence_of(op);
            if precedence >= op_precedence || !self.enter_nesting() {
                break;
            }
            let op_token = self.next_token();
            let right = self.parse_expression(op_precedence)?;
            left = Expr::new(
                ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) },
                op_token.span,
            );
        }
        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        let op = match self.cur_token.kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        let op_token = self.next_token();
        let operand = self.parse_expression(Precedence::Prefix)?;
        Some(Expr::new(ExprKind::Unary { op, operand: Box::new(operand) }, op_token.span))
    }

    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            match &self.cur_token.kind {
                TokenKind::Dot => {
                    if !self.enter_nesting() {
                        return None;
                    }
                    self.next_token();
                    let (field, span) = self.expect_identifier("field name")?;
                    expr = Expr::new(ExprKind::FieldAccess { object: Box::new(expr), field }, span);
                }
                TokenKind::LParen => {
                    let ExprKind::Identifier(name) = &expr.kind else {
                        let span = self.cur_token.span;
                        self.error(ParseErrorKind::InvalidCallee, span);
                        return None;
                    };
                    let name = name.clone();
                    let span = expr.span;
                    self.next_token(); // (
                    let args = self.parse_arguments()?;
                    expr = Expr::new(ExprKind::Call { name, args }, span);
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn parse_arguments(&mut self) -> Option<Vec<Expr>> {
        let mut args = vec![];
        if self.eat(&TokenKind::RParen) {
            return Some(args);
        }
        loop {
            args.push(self.parse_expression(Precedence::Lowest)?);
            if !self.eat(&TokenKind::Comma) || self.check(&TokenKind::RParen) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "`)` after arguments")?;
        Some(args)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let span = self.cur_token.span;
        let kind = match &self.cur_token.kind {
            TokenKind::Integer(n) => ExprKind::Literal(Literal::Int(*n)),
            TokenKind::Float(v) => ExprKind::Literal(Literal::Float(*v)),
            TokenKind::Str(s) => ExprKind::Literal(Literal::Str(s.clone())),
            TokenKind::True => ExprKind::Literal(Literal::Bool(true)),
            TokenKind::False => ExprKind::Literal(Literal::Bool(false)),
            TokenKind::Identifier(name) => ExprKind::Identifier(name.clone()),
            TokenKind::SelfKw => ExprKind::SelfRef,
            TokenKind::LParen => {
                self.next_token();
                let inner = self.parse_expression(Precedence::Lowest)?;
                self.expect(TokenKind::RParen, "`)`")?;
                return Some(inner);
            }
            other => {
                match other.keyword() {
                    Some(kw) if !kw.allowed_in(SyntaxPosition::Expression) => {
                        // consumed so recovery does not restart a statement here
                        self.next_token();
                        let keyword = kw.as_str();
                        let position = SyntaxPosition::Expression;
                        self.error(ParseErrorKind::MisplacedKeyword { keyword, position }, span);
                    }
                    _ => {
                        let found = other.describe();
                        self.error(ParseErrorKind::ExpectedExpression { found }, span);
                    }
                }
                return None;
            }
        };
        self.next_token();
        Some(Expr::new(kind, span))
    }
}
