//! Pratt parser over the flat token vector (`spec.md` §4.2).
//!
//! Grounded on the teacher's cursor-over-token-vector design
//! (`parser/parser/*.rs`): a `Parser` struct holds `tokens` + a `pos` cursor,
//! statement dispatch keys off the lookahead token, and recovery is local
//! (`synthesize` a missing token, `synchronize` to the next statement
//! boundary on a hard failure).

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::diagnostics::{Category, Diagnostics, Span};
use crate::parser::ast::*;
use crate::parser::interner::{Interner, Symbol};
use crate::parser::token::{LiteralValue, Token, TokenKind};

/// Internal staging for parse failures; every variant is flattened into the
/// shared `Diagnostics` bag before it escapes `Parser` (`spec.md` §7: no
/// phase throws out of the pipeline).
#[derive(Debug, Error, Clone, PartialEq)]
enum ParseError {
    #[error("expected {expected}, found '{found}'")]
    MissingToken { expected: &'static str, found: String },
    #[error("parser made no progress at '{found}'")]
    NoProgress { found: String },
    #[error("expected an expression before '->'")]
    ExpressionBeforeArrow,
    #[error("could not parse block body")]
    UnparseableBlock,
}

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: &'a mut Diagnostics,
    interner: &'a mut Interner,
    /// The parser's own lexical-scope tracker, used only to disambiguate
    /// inferred variable declarations from assignments (`spec.md` §4.2).
    scopes: Vec<FxHashSet<Symbol>>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, diagnostics: &'a mut Diagnostics, interner: &'a mut Interner) -> Self {
        Self { tokens, pos: 0, diagnostics, interner, scopes: vec![FxHashSet::default()] }
    }

    pub fn parse_compilation_unit(mut self) -> CompilationUnit {
        let start = self.peek().clone();
        let mut statements = Vec::new();
        while !self.at_eof() {
            let before = self.pos;
            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => {}
            }
            if self.pos == before {
                // No progress: emit a diagnostic and force the cursor forward.
                let tok = self.peek().clone();
                self.report(ParseError::NoProgress { found: tok.text.clone() }, self.span_of(&tok));
                self.synchronize();
            }
        }
        let end = self.peek().clone();
        CompilationUnit { statements, span: self.cover(&start, &end) }
    }

    // ---- token-stream primitives -----------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the expected token, or emit a diagnostic and synthesize one
    /// with empty text so the AST shape is preserved (`spec.md` §4.2).
    fn expect(&mut self, kind: TokenKind, what: &'static str) -> Token {
        if self.check(kind) {
            self.advance()
        } else {
            let found = self.peek().clone();
            self.report(ParseError::MissingToken { expected: what, found: found.text.clone() }, self.span_of(&found));
            Token::synthesized(kind, found.line, found.col)
        }
    }

    /// Silently consumes a trailing `;;` terminator if present (`spec.md` §4.2).
    fn eat_legacy_terminator(&mut self) {
        self.eat(TokenKind::DoubleSemi);
    }

    fn report(&mut self, err: ParseError, span: Span) {
        self.diagnostics.error(Category::Parser, span, err.to_string());
    }

    /// A control-flow condition/iterator expression that must precede `=>`;
    /// an empty one (`if => ...`) is its own diagnosed error kind
    /// (`spec.md` §7 "expression-before-arrow").
    fn parse_condition_expr(&mut self) -> Expr {
        if self.check(TokenKind::FatArrow) {
            let tok = self.peek().clone();
            self.report(ParseError::ExpressionBeforeArrow, self.span_of(&tok));
            return Expr::Error { span: self.span_of(&tok) };
        }
        self.parse_expr()
    }

    fn span_of(&self, tok: &Token) -> Span {
        Span::new(tok.line, tok.col, tok.len())
    }

    fn cover(&self, start: &Token, end: &Token) -> Span {
        Span::new(start.line, start.col, (end.col.saturating_sub(start.col)).max(1))
    }

    /// Skip tokens until a semicolon is consumed or a statement-starting
    /// token is reached (`spec.md` §4.2).
    fn synchronize(&mut self) {
        while !self.at_eof() {
            if self.eat(TokenKind::Semicolon) {
                return;
            }
            if self.starts_statement(self.peek().kind) {
                return;
            }
            self.advance();
        }
    }

    fn starts_statement(&self, kind: TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::If
                | TokenKind::Loop
                | TokenKind::Paralloop
                | TokenKind::Return
                | TokenKind::Flux
                | TokenKind::Struct
                | TokenKind::Class
                | TokenKind::Enum
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Module
                | TokenKind::Import
                | TokenKind::Throw
                | TokenKind::LBrace
        )
    }

    // ---- scope tracking (for inferred-decl vs. assignment disambiguation) --

    fn push_scope(&mut self) {
        self.scopes.push(FxHashSet::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: Symbol) {
        self.scopes.last_mut().unwrap().insert(name);
    }

    fn is_declared(&self, name: Symbol) -> bool {
        self.scopes.iter().any(|s| s.contains(&name))
    }

    // ---- statements ---------------------------------------------------

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.peek().kind {
            TokenKind::LBrace => Some(self.parse_block()),
            TokenKind::If => Some(self.parse_if()),
            TokenKind::Loop => Some(self.parse_loop(false)),
            TokenKind::Paralloop => Some(self.parse_loop(true)),
            TokenKind::Return => Some(self.parse_return()),
            TokenKind::Break => Some(self.parse_break()),
            TokenKind::Continue => Some(self.parse_continue()),
            TokenKind::Throw => Some(self.parse_throw()),
            TokenKind::Flux => Some(self.parse_flux_decl()),
            TokenKind::Struct => Some(self.parse_record_decl(RecordKind::Struct)),
            TokenKind::Class => Some(self.parse_record_decl(RecordKind::Class)),
            TokenKind::Enum => Some(self.parse_enum_decl()),
            TokenKind::Module => Some(self.parse_module_decl()),
            TokenKind::Import => Some(self.parse_import()),
            _ => self.parse_unknown_leading_statement(),
        }
    }

    fn parse_block(&mut self) -> Statement {
        let open = self.expect(TokenKind::LBrace, "'{'");
        self.push_scope();
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_eof() {
            let before = self.pos;
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            if self.pos == before {
                self.advance();
            }
        }
        let close = self.expect(TokenKind::RBrace, "'}'");
        self.pop_scope();
        Statement::Block { statements, span: self.cover(&open, &close) }
    }

    /// A statement body is either a brace block or a single statement
    /// (`spec.md` §4.2).
    fn parse_body(&mut self) -> Statement {
        if self.check(TokenKind::LBrace) {
            self.parse_block()
        } else {
            self.parse_statement().unwrap_or_else(|| {
                let tok = self.peek().clone();
                self.report(ParseError::UnparseableBlock, self.span_of(&tok));
                Statement::Block { statements: vec![], span: self.span_of(&tok) }
            })
        }
    }

    fn parse_if(&mut self) -> Statement {
        let kw = self.advance();
        let cond = self.parse_condition_expr();
        self.expect(TokenKind::FatArrow, "'=>'");
        let then_branch = Box::new(self.parse_body());
        let else_branch = if self.eat(TokenKind::Arrow) {
            Some(Box::new(self.parse_body()))
        } else {
            None
        };
        self.eat_legacy_terminator();
        let end = self.tokens[self.pos.saturating_sub(1)].clone();
        Statement::If { cond, then_branch, else_branch, span: self.cover(&kw, &end) }
    }

    fn parse_loop(&mut self, parallel: bool) -> Statement {
        let kw = self.advance();
        let cond_or_count = self.parse_condition_expr();
        let iter_var = if parallel && self.eat(TokenKind::Comma) {
            let tok = self.expect(TokenKind::Identifier, "iteration variable name");
            let sym = self.intern_ident(&tok);
            self.declare(sym);
            Some((sym, self.span_of(&tok)))
        } else {
            None
        };
        self.expect(TokenKind::FatArrow, "'=>'");
        let body = Box::new(self.parse_body());
        self.eat_legacy_terminator();
        let end = self.tokens[self.pos.saturating_sub(1)].clone();
        Statement::Loop { parallel, cond_or_count, iter_var, body, span: self.cover(&kw, &end) }
    }

    fn parse_return(&mut self) -> Statement {
        let kw = self.advance();
        let value = if self.check(TokenKind::Semicolon) { None } else { Some(self.parse_expr()) };
        let end = self.expect(TokenKind::Semicolon, "';'");
        Statement::Return { value, span: self.cover(&kw, &end) }
    }

    fn parse_break(&mut self) -> Statement {
        let kw = self.advance();
        let end = self.expect(TokenKind::Semicolon, "';'");
        Statement::Break { span: self.cover(&kw, &end) }
    }

    fn parse_continue(&mut self) -> Statement {
        let kw = self.advance();
        let end = self.expect(TokenKind::Semicolon, "';'");
        Statement::Continue { span: self.cover(&kw, &end) }
    }

    fn parse_throw(&mut self) -> Statement {
        let kw = self.advance();
        let value = self.parse_expr();
        let end = self.expect(TokenKind::Semicolon, "';'");
        Statement::Throw { value, span: self.cover(&kw, &end) }
    }

    fn parse_flux_decl(&mut self) -> Statement {
        let kw = self.advance();
        let declared_type = self.try_parse_type_then_name();
        let name_tok = self.expect(TokenKind::Identifier, "variable name");
        let name = self.intern_ident(&name_tok);
        self.expect(TokenKind::Assign, "'='");
        let init = self.parse_expr();
        let end = self.expect(TokenKind::Semicolon, "';'");
        self.declare(name);
        Statement::VarDecl {
            name,
            name_span: self.span_of(&name_tok),
            declared_type,
            flux: true,
            init,
            span: self.cover(&kw, &end),
        }
    }

    /// Dispatch for statements whose leading token isn't a dedicated keyword
    /// (`spec.md` §4.2: typed decl / inferred decl / assignment / expr-stmt).
    fn parse_unknown_leading_statement(&mut self) -> Option<Statement> {
        let start = self.peek().clone();

        if let Some(declared_type) = self.try_parse_type_then_name() {
            let name_tok = self.expect(TokenKind::Identifier, "variable name");
            let name = self.intern_ident(&name_tok);
            self.expect(TokenKind::Assign, "'='");
            let init = self.parse_expr();
            let end = self.expect(TokenKind::Semicolon, "';'");
            self.declare(name);
            return Some(Statement::VarDecl {
                name,
                name_span: self.span_of(&name_tok),
                declared_type: Some(declared_type),
                flux: false,
                init,
                span: self.cover(&start, &end),
            });
        }

        if self.check(TokenKind::Identifier) {
            let name_tok = self.peek().clone();
            let name = self.intern_ident(&name_tok);
            let op = self.assign_op_at(1);
            if let Some(op) = op {
                self.advance();
                self.advance();
                if op == AssignOp::Assign && !self.is_declared(name) {
                    let init = self.parse_expr();
                    let end = self.expect(TokenKind::Semicolon, "';'");
                    self.declare(name);
                    return Some(Statement::VarDecl {
                        name,
                        name_span: self.span_of(&name_tok),
                        declared_type: None,
                        flux: false,
                        init,
                        span: self.cover(&start, &end),
                    });
                }
                let value = self.parse_expr();
                let end = self.expect(TokenKind::Semicolon, "';'");
                return Some(Statement::Assign {
                    target: name,
                    target_span: self.span_of(&name_tok),
                    op,
                    value,
                    span: self.cover(&start, &end),
                });
            }
        }

        let expr = self.parse_expr();
        let end = self.expect(TokenKind::Semicolon, "';'");
        Some(Statement::Expr { expr, span: self.cover(&start, &end) })
    }

    fn assign_op_at(&self, offset: usize) -> Option<AssignOp> {
        match self.peek_at(offset).kind {
            TokenKind::Assign => Some(AssignOp::Assign),
            TokenKind::PlusAssign => Some(AssignOp::AddAssign),
            TokenKind::MinusAssign => Some(AssignOp::SubAssign),
            TokenKind::StarAssign => Some(AssignOp::MulAssign),
            TokenKind::SlashAssign => Some(AssignOp::DivAssign),
            _ => None,
        }
    }

    /// Attempts `TypeRef Identifier '='` lookahead without committing;
    /// restores the cursor on failure.
    fn try_parse_type_then_name(&mut self) -> Option<TypeRef> {
        let save = self.pos;
        let ty = self.try_parse_type_ref();
        match ty {
            Some(ty) if self.check(TokenKind::Identifier) && self.peek_at(1).kind == TokenKind::Assign => Some(ty),
            _ => {
                self.pos = save;
                None
            }
        }
    }

    fn try_parse_type_ref(&mut self) -> Option<TypeRef> {
        if !self.check(TokenKind::Identifier) {
            return None;
        }
        let name_tok = self.advance();
        let name = self.intern_ident(&name_tok);
        let mut args = Vec::new();
        if self.check(TokenKind::Lt) {
            let save = self.pos;
            self.advance();
            loop {
                match self.try_parse_type_ref() {
                    Some(arg) => args.push(arg),
                    None => {
                        self.pos = save;
                        args.clear();
                        break;
                    }
                }
                if self.eat(TokenKind::Comma) {
                    continue;
                }
                break;
            }
            if !args.is_empty() && !self.eat(TokenKind::Gt) {
                self.pos = save;
                args.clear();
            }
        }
        let mut ty = TypeRef::Named { name, args, span: self.span_of(&name_tok) };
        while self.check(TokenKind::LBracket) && self.peek_at(1).kind == TokenKind::RBracket {
            let open = self.advance();
            self.advance();
            ty = TypeRef::Array { element: Box::new(ty), span: self.span_of(&open) };
        }
        Some(ty)
    }

    fn parse_type_ref(&mut self) -> TypeRef {
        let tok = self.peek().clone();
        self.try_parse_type_ref().unwrap_or_else(|| {
            self.report(ParseError::MissingToken { expected: "a type", found: tok.text.clone() }, self.span_of(&tok));
            TypeRef::Named { name: Symbol::dummy(), args: vec![], span: self.span_of(&tok) }
        })
    }

    fn parse_record_decl(&mut self, kind: RecordKind) -> Statement {
        let kw = self.advance();
        let name_tok = self.expect(TokenKind::Identifier, "type name");
        let name = self.intern_ident(&name_tok);
        let generics = self.parse_generic_params();
        self.expect(TokenKind::LBrace, "'{'");
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_eof() {
            let ty = self.parse_type_ref();
            let field_tok = self.expect(TokenKind::Identifier, "field name");
            let field_name = self.intern_ident(&field_tok);
            self.eat(TokenKind::Comma);
            fields.push(FieldDecl { name: field_name, ty, span: self.span_of(&field_tok) });
        }
        let close = self.expect(TokenKind::RBrace, "'}'");
        Statement::RecordDecl {
            kind,
            name,
            name_span: self.span_of(&name_tok),
            generics,
            fields,
            span: self.cover(&kw, &close),
        }
    }

    fn parse_enum_decl(&mut self) -> Statement {
        let kw = self.advance();
        let name_tok = self.expect(TokenKind::Identifier, "type name");
        let name = self.intern_ident(&name_tok);
        let generics = self.parse_generic_params();
        self.expect(TokenKind::LBrace, "'{'");
        let mut variants = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_eof() {
            let variant_tok = self.expect(TokenKind::Identifier, "variant name");
            let variant_name = self.intern_ident(&variant_tok);
            let payload = if self.eat(TokenKind::LParen) {
                let ty = self.parse_type_ref();
                self.expect(TokenKind::RParen, "')'");
                Some(ty)
            } else {
                None
            };
            self.eat(TokenKind::Comma);
            variants.push(VariantDecl { name: variant_name, payload, span: self.span_of(&variant_tok) });
        }
        let close = self.expect(TokenKind::RBrace, "'}'");
        Statement::EnumDecl {
            name,
            name_span: self.span_of(&name_tok),
            generics,
            variants,
            span: self.cover(&kw, &close),
        }
    }

    fn parse_generic_params(&mut self) -> Vec<Symbol> {
        let mut generics = Vec::new();
        if self.eat(TokenKind::Lt) {
            loop {
                let tok = self.expect(TokenKind::Identifier, "generic parameter name");
                generics.push(self.intern_ident(&tok));
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Gt, "'>'");
        }
        generics
    }

    fn parse_module_decl(&mut self) -> Statement {
        let kw = self.advance();
        let name_tok = self.expect(TokenKind::Identifier, "module name");
        let name = self.intern_ident(&name_tok);
        self.expect(TokenKind::LBrace, "'{'");
        let mut body = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_eof() {
            let before = self.pos;
            if let Some(stmt) = self.parse_statement() {
                body.push(stmt);
            }
            if self.pos == before {
                self.advance();
            }
        }
        let close = self.expect(TokenKind::RBrace, "'}'");
        Statement::Module { name, body, span: self.cover(&kw, &close) }
    }

    fn parse_import(&mut self) -> Statement {
        let kw = self.advance();
        let mut path = Vec::new();
        loop {
            let tok = self.expect(TokenKind::Identifier, "module path segment");
            path.push(self.intern_ident(&tok));
            if !self.eat(TokenKind::Dot) {
                break;
            }
        }
        let end = self.expect(TokenKind::Semicolon, "';'");
        Statement::Import { path, span: self.cover(&kw, &end) }
    }

    // ---- expressions (Pratt, precedence climbing) ----------------------
    //
    // High to low (`spec.md` §4.2): multiplicative, additive, shift,
    // comparison, equality, bitwise-and family, bitwise-or/logical-or family.

    fn parse_expr(&mut self) -> Expr {
        self.parse_or_family()
    }

    fn parse_or_family(&mut self) -> Expr {
        let mut left = self.parse_and_family();
        loop {
            let op = match self.peek().kind {
                TokenKind::Pipe => BinaryOp::BitOr,
                TokenKind::NotPipe => BinaryOp::BitNor,
                TokenKind::AmpAmp => BinaryOp::And,
                TokenKind::PipePipe => BinaryOp::Or,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.parse_and_family();
            let span = self.span_between(&left, &right, &op_tok);
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_and_family(&mut self) -> Expr {
        let mut left = self.parse_equality();
        loop {
            let op = match self.peek().kind {
                TokenKind::Amp => BinaryOp::BitAnd,
                TokenKind::NotAmp => BinaryOp::BitNand,
                TokenKind::Caret => BinaryOp::Xor,
                TokenKind::CaretAmp => BinaryOp::XorAnd,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.parse_equality();
            let span = self.span_between(&left, &right, &op_tok);
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_equality(&mut self) -> Expr {
        let mut left = self.parse_comparison();
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.parse_comparison();
            let span = self.span_between(&left, &right, &op_tok);
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_comparison(&mut self) -> Expr {
        let mut left = self.parse_shift();
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.parse_shift();
            let span = self.span_between(&left, &right, &op_tok);
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_shift(&mut self) -> Expr {
        let mut left = self.parse_additive();
        loop {
            let op = match self.peek().kind {
                TokenKind::Shl => BinaryOp::Shl,
                TokenKind::Shr => BinaryOp::Shr,
                TokenKind::PlusShl => BinaryOp::UShl,
                TokenKind::PlusShr => BinaryOp::UShr,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.parse_additive();
            let span = self.span_between(&left, &right, &op_tok);
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_additive(&mut self) -> Expr {
        let mut left = self.parse_multiplicative();
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.parse_multiplicative();
            let span = self.span_between(&left, &right, &op_tok);
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_multiplicative(&mut self) -> Expr {
        let mut left = self.parse_unary();
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                TokenKind::SlashCaret => BinaryOp::IntDiv,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.parse_unary();
            let span = self.span_between(&left, &right, &op_tok);
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_unary(&mut self) -> Expr {
        let op = match self.peek().kind {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            let op_tok = self.advance();
            let operand = self.parse_unary();
            let span = Span::new(op_tok.line, op_tok.col, (operand.span().col + operand.span().len).saturating_sub(op_tok.col).max(1));
            return Expr::Unary { op, operand: Box::new(operand), span };
        }
        self.parse_cast_or_primary()
    }

    /// Casts `(type) expr` are disambiguated by lookahead: `(`, a valid
    /// type-reference, `)`, then an expression-starting token (`spec.md` §4.2).
    fn parse_cast_or_primary(&mut self) -> Expr {
        if self.check(TokenKind::LParen) {
            let save = self.pos;
            let open = self.advance();
            if let Some(ty) = self.try_parse_type_ref() {
                if self.check(TokenKind::RParen) && self.starts_expression(self.peek_at(1).kind) {
                    self.advance(); // ')'
                    let operand = self.parse_unary();
                    let span = Span::new(open.line, open.col, (operand.span().col + operand.span().len).saturating_sub(open.col).max(1));
                    return Expr::Cast { target: ty, operand: Box::new(operand), span };
                }
            }
            self.pos = save;
        }
        self.parse_primary()
    }

    fn starts_expression(&self, kind: TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::IntLiteral
                | TokenKind::FloatLiteral
                | TokenKind::StringLiteral
                | TokenKind::CharLiteral
                | TokenKind::BoolLiteral
                | TokenKind::Identifier
                | TokenKind::LParen
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Bang
                | TokenKind::Tilde
        )
    }

    fn parse_primary(&mut self) -> Expr {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::IntLiteral => {
                self.advance();
                let v = match tok.value { Some(LiteralValue::Int(v)) => v, _ => 0 };
                Expr::Literal { value: Literal::Int(v), span: self.span_of(&tok) }
            }
            TokenKind::FloatLiteral => {
                self.advance();
                let v = match tok.value { Some(LiteralValue::Float(v)) => v, _ => 0.0 };
                Expr::Literal { value: Literal::Float(v), span: self.span_of(&tok) }
            }
            TokenKind::BoolLiteral | TokenKind::True | TokenKind::False => {
                self.advance();
                let v = match tok.value { Some(LiteralValue::Bool(v)) => v, _ => tok.kind == TokenKind::True };
                Expr::Literal { value: Literal::Bool(v), span: self.span_of(&tok) }
            }
            TokenKind::CharLiteral => {
                self.advance();
                let v = match tok.value { Some(LiteralValue::Char(v)) => v, _ => '\0' };
                Expr::Literal { value: Literal::Char(v), span: self.span_of(&tok) }
            }
            TokenKind::StringLiteral => {
                self.advance();
                let v = match tok.value { Some(LiteralValue::Str(sym)) => sym, _ => Symbol::dummy() };
                Expr::Literal { value: Literal::Str(v), span: self.span_of(&tok) }
            }
            TokenKind::Identifier => {
                self.advance();
                Expr::Name { name: self.intern_ident(&tok), span: self.span_of(&tok) }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr();
                let close = self.expect(TokenKind::RParen, "')'");
                Expr::Paren { inner: Box::new(inner), span: self.cover(&tok, &close) }
            }
            _ => {
                self.report(ParseError::MissingToken { expected: "an expression", found: tok.text.clone() }, self.span_of(&tok));
                Expr::Error { span: self.span_of(&tok) }
            }
        }
    }

    fn span_between(&self, left: &Expr, right: &Expr, _op: &Token) -> Span {
        let l = left.span();
        let r = right.span();
        Span::new(l.line, l.col, (r.col + r.len).saturating_sub(l.col).max(1))
    }

    /// Interns identifier text on demand. Identifiers aren't interned by the
    /// lexer (only literals are) so the parser owns this single touch point,
    /// sharing the same `Interner` the lexer used for string literals.
    fn intern_ident(&mut self, tok: &Token) -> Symbol {
        self.interner.intern(&tok.text)
    }
}
