//! Type checking and ownership/borrow analysis (`spec.md` §4.3-4.4).

pub mod checker;
pub mod error;
pub mod ownership;
pub mod symbols;
pub mod types;

pub use checker::{CheckOutput, ExprTypes, TypeChecker};
pub use ownership::OwnershipAnalyzer;
pub use types::{RecordDef, RecordKind, TypeSymbol};

use crate::diagnostics::Diagnostics;
use crate::parser::ast::CompilationUnit;
use crate::parser::interner::Interner;

/// Runs the type checker, then the ownership/borrow pass, over a parsed
/// compilation unit. Both phases append to the same `Diagnostics` bag; a
/// failure in either never stops the other from running, so a single
/// `emberc` invocation reports as many problems as it can find.
pub fn check(unit: &CompilationUnit, interner: &Interner, diagnostics: &mut Diagnostics) -> CheckOutput {
    let output = TypeChecker::new(diagnostics, interner).check(unit);
    OwnershipAnalyzer::new(diagnostics, interner, &output.expr_types).check(unit);
    output
}
