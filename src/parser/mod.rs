//! Lexer, parser, interner, token, and AST types (`spec.md` §4.1-4.2).

pub mod ast;
pub mod interner;
pub mod lexer;
pub mod parse;
pub mod token;

pub use ast::CompilationUnit;
pub use interner::{Interner, Symbol};
pub use parse::Parser;
pub use token::{LiteralValue, Token, TokenKind};

use crate::diagnostics::Diagnostics;

/// Convenience entry point used by the driver and by tests: lex then parse a
/// whole source string, returning the AST and the interner that owns every
/// identifier/string symbol referenced from it.
pub fn parse_source(source: &str, diagnostics: &mut Diagnostics) -> (CompilationUnit, Interner) {
    let lexer::LexOutput { tokens, mut interner } = lexer::lex(source, diagnostics);
    let unit = Parser::new(tokens, diagnostics, &mut interner).parse_compilation_unit();
    (unit, interner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::*;

    #[test]
    fn parses_flux_decl_and_return() {
        let mut diags = Diagnostics::new();
        let (unit, _interner) = parse_source("flux x = 2; return x + 3;", &mut diags);
        assert!(!diags.has_errors());
        assert_eq!(unit.statements.len(), 2);
        assert!(matches!(unit.statements[0], Statement::VarDecl { flux: true, declared_type: None, .. }));
        assert!(matches!(unit.statements[1], Statement::Return { .. }));
    }

    #[test]
    fn parses_typed_decl_and_cast() {
        let mut diags = Diagnostics::new();
        let (unit, _interner) = parse_source("float f = 3.9; int i = (int)f; return i;", &mut diags);
        assert!(!diags.has_errors());
        assert!(matches!(unit.statements[0], Statement::VarDecl { flux: false, declared_type: Some(_), .. }));
        match &unit.statements[1] {
            Statement::VarDecl { init, .. } => assert!(matches!(init, Expr::Cast { .. })),
            other => panic!("expected var decl, got {other:?}"),
        }
    }

    #[test]
    fn parses_loop_with_compound_assign() {
        let mut diags = Diagnostics::new();
        let src = "flux sum = 0; flux i = 10; loop i > 0 => { sum += i; i -= 1; } return sum;";
        let (unit, _interner) = parse_source(src, &mut diags);
        assert!(!diags.has_errors());
        assert_eq!(unit.statements.len(), 4);
        assert!(matches!(unit.statements[2], Statement::Loop { parallel: false, .. }));
    }

    #[test]
    fn parses_if_else_with_legacy_terminator() {
        let mut diags = Diagnostics::new();
        let src = "if 1 > 0 => { } -> { } ;; return 0;";
        let (unit, _interner) = parse_source(src, &mut diags);
        assert!(!diags.has_errors());
        assert_eq!(unit.statements.len(), 2);
    }

    #[test]
    fn missing_token_recovers_with_synthesized_token() {
        let mut diags = Diagnostics::new();
        let (unit, _interner) = parse_source("flux x = 2 return x;", &mut diags);
        assert!(diags.has_errors());
        assert_eq!(unit.statements.len(), 2);
    }

    #[test]
    fn assignment_vs_inferred_decl_disambiguation() {
        let mut diags = Diagnostics::new();
        let (unit, _interner) = parse_source("flux x = 1; x = 2; y = 3;", &mut diags);
        assert!(!diags.has_errors());
        assert!(matches!(unit.statements[1], Statement::Assign { .. }));
        assert!(matches!(unit.statements[2], Statement::VarDecl { .. }));
    }
}
