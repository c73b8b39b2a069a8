//! Lexer for the Ember language (`spec.md` §4.1).
//!
//! Two-layer design grounded on the teacher's `parser/lexer.rs`: a
//! `#[derive(Logos)]` enum does longest-match tokenization with callback
//! functions for literals and comment skipping, and a thin driver converts
//! byte spans into the 1-based `(line, col)` pairs `Token` needs.

use crate::diagnostics::{Category, Diagnostics, Span as DiagSpan};
use crate::parser::interner::Interner;
use crate::parser::token::{LiteralValue, Token, TokenKind};
use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"#[^\n]*")]
enum Raw {
    #[token("/#", lex_slash_hash_comment)]
    SlashHashComment,

    #[token("@#", lex_at_hash_comment)]
    AtHashComment,

    // Keywords (placed ahead of the identifier regex; logos prefers the
    // higher-priority exact-literal match on a tie in match length).
    #[token("if")]
    If,
    #[token("loop")]
    Loop,
    #[token("paralloop")]
    Paralloop,
    #[token("return")]
    Return,
    #[token("flux")]
    Flux,
    #[token("struct")]
    Struct,
    #[token("class")]
    Class,
    #[token("enum")]
    Enum,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("module")]
    Module,
    #[token("import")]
    Import,
    #[token("match")]
    Match,
    #[token("throw")]
    Throw,
    #[token("gc")]
    Gc,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"0[xX][0-9a-fA-F]+", |lex| parse_int_radix(lex.slice(), 2, 16))]
    #[regex(r"0[bB][01]+", |lex| parse_int_radix(lex.slice(), 2, 2))]
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    IntLiteral(Option<i64>),

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    FloatLiteral(Option<f64>),

    #[token("@\"", lex_raw_string)]
    RawString(String),

    #[regex(r#"\$"([^"\\]|\\.)*""#, |lex| unescape(&lex.slice()[2..lex.slice().len() - 1]))]
    DollarString(Option<String>),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(&lex.slice()[1..lex.slice().len() - 1]))]
    StringLiteral(Option<String>),

    #[regex(r"'([^'\\]|\\.)'", |lex| unescape_char(&lex.slice()[1..lex.slice().len() - 1]))]
    CharLiteral(Option<char>),

    // Control tokens and longest-match operators. Logos resolves overlaps
    // (e.g. `+<<` vs `+` vs `<<`) by preferring the longest match.
    #[token("+<<")]
    PlusShl,
    #[token("+>>")]
    PlusShr,
    #[token("=>")]
    FatArrow,
    #[token("->")]
    Arrow,
    #[token("<-")]
    LeftArrow,
    #[token(";;")]
    DoubleSemi,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    StarAssign,
    #[token("/=")]
    SlashAssign,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("!|")]
    NotPipe,
    #[token("!&")]
    NotAmp,
    #[token("^&")]
    CaretAmp,
    #[token("/^")]
    SlashCaret,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=")]
    Assign,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
}

fn lex_slash_hash_comment(lex: &mut logos::Lexer<'_, Raw>) -> logos::Skip {
    let remainder = lex.remainder();
    match remainder.find("#/") {
        Some(end) => lex.bump(end + 2),
        None => lex.bump(remainder.len()),
    }
    logos::Skip
}

fn lex_at_hash_comment(lex: &mut logos::Lexer<'_, Raw>) -> logos::Skip {
    let remainder = lex.remainder();
    match remainder.find("@#@") {
        Some(end) => lex.bump(end + 3),
        None => lex.bump(remainder.len()),
    }
    logos::Skip
}

/// `@"..."` raw strings: `""` is an embedded quote, nothing else is escaped.
fn lex_raw_string(lex: &mut logos::Lexer<'_, Raw>) -> Option<String> {
    let remainder = lex.remainder();
    let mut out = String::new();
    let mut chars = remainder.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '"' {
            if remainder[i + 1..].starts_with('"') {
                out.push('"');
                chars.next();
                continue;
            }
            lex.bump(i + 1);
            return Some(out);
        }
        out.push(c);
    }
    // Unterminated: consume to end of input.
    lex.bump(remainder.len());
    None
}

fn parse_int_radix(slice: &str, prefix_len: usize, radix: u32) -> Option<i64> {
    i64::from_str_radix(&slice[prefix_len..], radix).ok()
}

fn unescape(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next()? {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                '\\' => out.push('\\'),
                '"' => out.push('"'),
                '\'' => out.push('\''),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

fn unescape_char(s: &str) -> Option<char> {
    let unescaped = unescape(s)?;
    let mut chars = unescaped.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    Some(c)
}

/// Walks `source[from..to]`, advancing `(line, col)`, treating CR, LF, and
/// CRLF each as exactly one newline (`spec.md` §4.1).
fn advance_position(source: &str, from: usize, to: usize, line: &mut u32, col: &mut u32) {
    let mut iter = source[from..to].chars().peekable();
    while let Some(c) = iter.next() {
        match c {
            '\r' => {
                if iter.peek() == Some(&'\n') {
                    iter.next();
                }
                *line += 1;
                *col = 1;
            }
            '\n' => {
                *line += 1;
                *col = 1;
            }
            _ => *col += 1,
        }
    }
}

pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub interner: Interner,
}

pub fn lex(source: &str, diagnostics: &mut Diagnostics) -> LexOutput {
    let mut interner = Interner::new();
    let mut tokens = Vec::new();
    let mut lexer = Raw::lexer(source);
    let mut pos = 0usize;
    let mut line = 1u32;
    let mut col = 1u32;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        advance_position(source, pos, span.start, &mut line, &mut col);
        let (tok_line, tok_col) = (line, col);
        advance_position(source, span.start, span.end, &mut line, &mut col);
        pos = span.end;
        let text = lexer.slice().to_string();

        let token = match result {
            Ok(raw) => match raw {
                Raw::If => Token::new(TokenKind::If, text, tok_line, tok_col),
                Raw::Loop => Token::new(TokenKind::Loop, text, tok_line, tok_col),
                Raw::Paralloop => Token::new(TokenKind::Paralloop, text, tok_line, tok_col),
                Raw::Return => Token::new(TokenKind::Return, text, tok_line, tok_col),
                Raw::Flux => Token::new(TokenKind::Flux, text, tok_line, tok_col),
                Raw::Struct => Token::new(TokenKind::Struct, text, tok_line, tok_col),
                Raw::Class => Token::new(TokenKind::Class, text, tok_line, tok_col),
                Raw::Enum => Token::new(TokenKind::Enum, text, tok_line, tok_col),
                Raw::Break => Token::new(TokenKind::Break, text, tok_line, tok_col),
                Raw::Continue => Token::new(TokenKind::Continue, text, tok_line, tok_col),
                Raw::True => Token::new(TokenKind::BoolLiteral, text, tok_line, tok_col)
                    .with_value(LiteralValue::Bool(true)),
                Raw::False => Token::new(TokenKind::BoolLiteral, text, tok_line, tok_col)
                    .with_value(LiteralValue::Bool(false)),
                Raw::Module => Token::new(TokenKind::Module, text, tok_line, tok_col),
                Raw::Import => Token::new(TokenKind::Import, text, tok_line, tok_col),
                Raw::Match => Token::new(TokenKind::Match, text, tok_line, tok_col),
                Raw::Throw => Token::new(TokenKind::Throw, text, tok_line, tok_col),
                Raw::Gc => Token::new(TokenKind::Gc, text, tok_line, tok_col),
                Raw::Identifier(_) => Token::new(TokenKind::Identifier, text, tok_line, tok_col),
                Raw::IntLiteral(Some(v)) => Token::new(TokenKind::IntLiteral, text, tok_line, tok_col)
                    .with_value(LiteralValue::Int(v)),
                Raw::IntLiteral(None) => {
                    diagnostics.error(Category::Lexer, DiagSpan::new(tok_line, tok_col, text.len().max(1) as u32), format!("invalid integer literal '{text}'"));
                    Token::new(TokenKind::IntLiteral, text, tok_line, tok_col).with_value(LiteralValue::Int(0))
                }
                Raw::FloatLiteral(Some(v)) => Token::new(TokenKind::FloatLiteral, text, tok_line, tok_col)
                    .with_value(LiteralValue::Float(v)),
                Raw::FloatLiteral(None) => {
                    diagnostics.error(Category::Lexer, DiagSpan::new(tok_line, tok_col, text.len().max(1) as u32), format!("invalid float literal '{text}'"));
                    Token::new(TokenKind::FloatLiteral, text, tok_line, tok_col).with_value(LiteralValue::Float(0.0))
                }
                Raw::RawString(s) => {
                    let sym = interner.intern(&s);
                    Token::new(TokenKind::StringLiteral, text, tok_line, tok_col).with_value(LiteralValue::Str(sym))
                }
                Raw::DollarString(Some(s)) | Raw::StringLiteral(Some(s)) => {
                    let sym = interner.intern(&s);
                    Token::new(TokenKind::StringLiteral, text, tok_line, tok_col).with_value(LiteralValue::Str(sym))
                }
                Raw::DollarString(None) | Raw::StringLiteral(None) => {
                    diagnostics.error(Category::Lexer, DiagSpan::new(tok_line, tok_col, text.len().max(1) as u32), "unsupported escape sequence in string literal");
                    let sym = interner.intern("");
                    Token::new(TokenKind::StringLiteral, text, tok_line, tok_col).with_value(LiteralValue::Str(sym))
                }
                Raw::CharLiteral(Some(c)) => Token::new(TokenKind::CharLiteral, text, tok_line, tok_col)
                    .with_value(LiteralValue::Char(c)),
                Raw::CharLiteral(None) => {
                    diagnostics.error(Category::Lexer, DiagSpan::new(tok_line, tok_col, text.len().max(1) as u32), "invalid character literal");
                    Token::new(TokenKind::CharLiteral, text, tok_line, tok_col).with_value(LiteralValue::Char('\0'))
                }
                Raw::PlusShl => Token::new(TokenKind::PlusShl, text, tok_line, tok_col),
                Raw::PlusShr => Token::new(TokenKind::PlusShr, text, tok_line, tok_col),
                Raw::FatArrow => Token::new(TokenKind::FatArrow, text, tok_line, tok_col),
                Raw::Arrow => Token::new(TokenKind::Arrow, text, tok_line, tok_col),
                Raw::LeftArrow => Token::new(TokenKind::LeftArrow, text, tok_line, tok_col),
                Raw::DoubleSemi => Token::new(TokenKind::DoubleSemi, text, tok_line, tok_col),
                Raw::EqEq => Token::new(TokenKind::EqEq, text, tok_line, tok_col),
                Raw::NotEq => Token::new(TokenKind::NotEq, text, tok_line, tok_col),
                Raw::LtEq => Token::new(TokenKind::LtEq, text, tok_line, tok_col),
                Raw::GtEq => Token::new(TokenKind::GtEq, text, tok_line, tok_col),
                Raw::Shl => Token::new(TokenKind::Shl, text, tok_line, tok_col),
                Raw::Shr => Token::new(TokenKind::Shr, text, tok_line, tok_col),
                Raw::PlusAssign => Token::new(TokenKind::PlusAssign, text, tok_line, tok_col),
                Raw::MinusAssign => Token::new(TokenKind::MinusAssign, text, tok_line, tok_col),
                Raw::StarAssign => Token::new(TokenKind::StarAssign, text, tok_line, tok_col),
                Raw::SlashAssign => Token::new(TokenKind::SlashAssign, text, tok_line, tok_col),
                Raw::AmpAmp => Token::new(TokenKind::AmpAmp, text, tok_line, tok_col),
                Raw::PipePipe => Token::new(TokenKind::PipePipe, text, tok_line, tok_col),
                Raw::NotPipe => Token::new(TokenKind::NotPipe, text, tok_line, tok_col),
                Raw::NotAmp => Token::new(TokenKind::NotAmp, text, tok_line, tok_col),
                Raw::CaretAmp => Token::new(TokenKind::CaretAmp, text, tok_line, tok_col),
                Raw::SlashCaret => Token::new(TokenKind::SlashCaret, text, tok_line, tok_col),
                Raw::Plus => Token::new(TokenKind::Plus, text, tok_line, tok_col),
                Raw::Minus => Token::new(TokenKind::Minus, text, tok_line, tok_col),
                Raw::Star => Token::new(TokenKind::Star, text, tok_line, tok_col),
                Raw::Slash => Token::new(TokenKind::Slash, text, tok_line, tok_col),
                Raw::Percent => Token::new(TokenKind::Percent, text, tok_line, tok_col),
                Raw::Assign => Token::new(TokenKind::Assign, text, tok_line, tok_col),
                Raw::Lt => Token::new(TokenKind::Lt, text, tok_line, tok_col),
                Raw::Gt => Token::new(TokenKind::Gt, text, tok_line, tok_col),
                Raw::Amp => Token::new(TokenKind::Amp, text, tok_line, tok_col),
                Raw::Pipe => Token::new(TokenKind::Pipe, text, tok_line, tok_col),
                Raw::Caret => Token::new(TokenKind::Caret, text, tok_line, tok_col),
                Raw::Tilde => Token::new(TokenKind::Tilde, text, tok_line, tok_col),
                Raw::Bang => Token::new(TokenKind::Bang, text, tok_line, tok_col),
                Raw::Comma => Token::new(TokenKind::Comma, text, tok_line, tok_col),
                Raw::Dot => Token::new(TokenKind::Dot, text, tok_line, tok_col),
                Raw::Semicolon => Token::new(TokenKind::Semicolon, text, tok_line, tok_col),
                Raw::Colon => Token::new(TokenKind::Colon, text, tok_line, tok_col),
                Raw::LParen => Token::new(TokenKind::LParen, text, tok_line, tok_col),
                Raw::RParen => Token::new(TokenKind::RParen, text, tok_line, tok_col),
                Raw::LBracket => Token::new(TokenKind::LBracket, text, tok_line, tok_col),
                Raw::RBracket => Token::new(TokenKind::RBracket, text, tok_line, tok_col),
                Raw::LBrace => Token::new(TokenKind::LBrace, text, tok_line, tok_col),
                Raw::RBrace => Token::new(TokenKind::RBrace, text, tok_line, tok_col),
                Raw::SlashHashComment | Raw::AtHashComment => unreachable!("comments are skipped"),
            },
            Err(()) => {
                diagnostics.error(Category::Lexer, DiagSpan::new(tok_line, tok_col, 1), format!("unexpected character '{text}'"));
                continue;
            }
        };
        tokens.push(token);
    }

    tokens.push(Token::new(TokenKind::Eof, "", line, col));
    LexOutput { tokens, interner }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut diags = Diagnostics::new();
        lex(src, &mut diags).tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn longest_match_operators() {
        assert_eq!(kinds("+<<"), vec![TokenKind::PlusShl, TokenKind::Eof]);
        assert_eq!(kinds("=>"), vec![TokenKind::FatArrow, TokenKind::Eof]);
        assert_eq!(kinds(";;"), vec![TokenKind::DoubleSemi, TokenKind::Eof]);
        assert_eq!(kinds("/^"), vec![TokenKind::SlashCaret, TokenKind::Eof]);
    }

    #[test]
    fn keywords_win_over_identifiers() {
        assert_eq!(kinds("flux loopy"), vec![TokenKind::Flux, TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn line_block_comments_are_skipped() {
        assert_eq!(kinds("// hi\n1 /# nested-looking #/ 2 @# c @#@ 3"),
            vec![TokenKind::IntLiteral, TokenKind::IntLiteral, TokenKind::IntLiteral, TokenKind::Eof]);
    }

    #[test]
    fn raw_string_doubled_quote_escape() {
        let mut diags = Diagnostics::new();
        let out = lex(r#"@"a""b""#, &mut diags);
        assert!(!diags.has_errors());
        match &out.tokens[0].value {
            Some(LiteralValue::Str(sym)) => assert_eq!(out.interner.resolve(*sym), "a\"b"),
            other => panic!("expected string literal, got {other:?}"),
        }
    }

    #[test]
    fn crlf_counts_as_one_newline() {
        let mut diags = Diagnostics::new();
        let out = lex("1\r\n2", &mut diags);
        assert_eq!(out.tokens[1].line, 2);
        assert_eq!(out.tokens[1].col, 1);
    }

    #[test]
    fn hex_and_binary_prefixes() {
        let mut diags = Diagnostics::new();
        let out = lex("0xFF 0b101", &mut diags);
        assert_eq!(out.tokens[0].value, Some(LiteralValue::Int(255)));
        assert_eq!(out.tokens[1].value, Some(LiteralValue::Int(5)));
    }

    #[test]
    fn bad_character_emits_diagnostic_and_continues() {
        let mut diags = Diagnostics::new();
        let out = lex("1 ` 2", &mut diags);
        assert!(diags.has_errors());
        assert_eq!(out.tokens.iter().map(|t| &t.kind).collect::<Vec<_>>(),
            vec![&TokenKind::IntLiteral, &TokenKind::IntLiteral, &TokenKind::Eof]);
    }
}
