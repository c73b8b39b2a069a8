//! Ownership/affine-move analysis (`spec.md` §4.4).
//!
//! Primitive (`int, float, bool, char`) values are copy types and are never
//! tracked here at all. Every other value is a move type: assigning a bare
//! variable name into a new binding or into another variable moves it, and
//! using it again afterwards is an error. Reading through a move-typed value
//! without consuming it (any use other than a bare-name initializer or
//! assignment right-hand side — a cast operand, a binary operand) opens a
//! borrow that closes again at the end of the statement that opened it: a
//! compound statement (`if`, `loop`, a block) only closes its own borrows
//! after every nested statement it runs has already closed its own, so a
//! borrow taken in an `if`'s condition stays open for the whole `if`, but a
//! borrow taken inside one arm of a prior, unrelated statement is long gone
//! by the next statement.

use rustc_hash::FxHashMap;

use crate::checker::checker::ExprTypes;
use crate::checker::error::CheckError;
use crate::diagnostics::{Category, Diagnostics, Span};
use crate::parser::ast::*;
use crate::parser::interner::{Interner, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveState {
    Owned,
    Moved,
}

struct OwnershipVar {
    state: MoveState,
    borrow_count: u32,
}

pub struct OwnershipAnalyzer<'a> {
    diagnostics: &'a mut Diagnostics,
    interner: &'a Interner,
    expr_types: &'a ExprTypes,
    scopes: Vec<FxHashMap<Symbol, OwnershipVar>>,
    /// One frame per statement currently being checked (the call stack of
    /// `check_statement`, not the variable-scope stack): names borrowed
    /// directly by the innermost statement, closed and decremented as soon
    /// as that statement finishes.
    borrow_frames: Vec<Vec<Symbol>>,
}

impl<'a> OwnershipAnalyzer<'a> {
    pub fn new(diagnostics: &'a mut Diagnostics, interner: &'a Interner, expr_types: &'a ExprTypes) -> Self {
        Self { diagnostics, interner, expr_types, scopes: vec![FxHashMap::default()], borrow_frames: Vec::new() }
    }

    pub fn check(mut self, unit: &CompilationUnit) {
        for stmt in &unit.statements {
            self.check_statement(stmt);
        }
    }

    fn name_str(&self, sym: Symbol) -> String {
        self.interner.resolve(sym).to_string()
    }

    fn report(&mut self, span: Span, err: CheckError) {
        self.diagnostics.error(Category::Ownership, span, err.to_string());
    }

    fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Closes the innermost statement's borrow frame, decrementing every name
    /// it opened. A name whose declaring scope has *already* closed by now
    /// would mean a borrow survived past the variable it was taken from —
    /// the `borrow-outlives-scope` case — but statement frames always close
    /// before the scope they're nested in is popped, so this only ever fires
    /// as a last-resort consistency check.
    fn close_borrow_frame(&mut self, span: Span) {
        let opened = self.borrow_frames.pop().expect("frame stack underflow");
        for name in opened {
            match self.scopes.iter().rposition(|s| s.contains_key(&name)) {
                Some(idx) => {
                    let var = self.scopes[idx].get_mut(&name).expect("just located by rposition");
                    var.borrow_count = var.borrow_count.saturating_sub(1);
                }
                None => {
                    let n = self.name_str(name);
                    self.report(span, CheckError::BorrowOutlivesScope { name: n });
                }
            }
        }
    }

    fn is_move_typed_init(&self, init: &Expr) -> bool {
        let span = init.span();
        self.expr_types.get(&(span.line, span.col, span.len)).is_some_and(|t| t.is_move_type() && !t.is_error())
    }

    /// Records a non-consuming read of `name`: flags use-after-move, else
    /// opens a borrow. Silently ignores untracked names (copy types, or
    /// names the type checker already reported as undefined).
    fn touch_use(&mut self, name: Symbol, span: Span) {
        let Some(idx) = self.scopes.iter().rposition(|s| s.contains_key(&name)) else { return };
        let var = self.scopes[idx].get_mut(&name).expect("just located by rposition");
        if var.state == MoveState::Moved {
            let n = self.name_str(name);
            self.report(span, CheckError::UseAfterMove { name: n });
            return;
        }
        var.borrow_count += 1;
        self.borrow_frames.last_mut().expect("a statement frame is always open while scanning its expressions").push(name);
    }

    /// Consumes `name` as the source of a move. Returns whether the move
    /// actually happened (callers skip updating the destination on `false`).
    fn consume_move(&mut self, name: Symbol, span: Span) -> bool {
        let Some(idx) = self.scopes.iter().rposition(|s| s.contains_key(&name)) else { return true };
        let var = self.scopes[idx].get_mut(&name).expect("just located by rposition");
        if var.state == MoveState::Moved {
            let n = self.name_str(name);
            self.report(span, CheckError::UseAfterMove { name: n });
            return false;
        }
        if var.borrow_count > 0 {
            let n = self.name_str(name);
            self.report(span, CheckError::MoveWhileBorrowed { name: n });
            return false;
        }
        var.state = MoveState::Moved;
        true
    }

    fn scan_expr_uses(&mut self, expr: &Expr) {
        match expr {
            Expr::Name { name, span } => self.touch_use(*name, *span),
            Expr::Paren { inner, .. } | Expr::Unary { operand: inner, .. } | Expr::Cast { operand: inner, .. } => {
                self.scan_expr_uses(inner);
            }
            Expr::Binary { left, right, .. } => {
                self.scan_expr_uses(left);
                self.scan_expr_uses(right);
            }
            Expr::Literal { .. } | Expr::Error { .. } => {}
        }
    }

    /// Entry point for every statement: opens this statement's own borrow
    /// frame, dispatches, then closes the frame so every borrow it opened is
    /// decremented before control returns to whatever statement contains it.
    fn check_statement(&mut self, stmt: &Statement) {
        self.borrow_frames.push(Vec::new());
        self.check_statement_kind(stmt);
        self.close_borrow_frame(stmt.span());
    }

    fn check_statement_kind(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Block { statements, .. } => {
                self.push_scope();
                for s in statements {
                    self.check_statement(s);
                }
                self.pop_scope();
            }
            Statement::Expr { expr, .. } => self.scan_expr_uses(expr),
            Statement::VarDecl { name, init, .. } => {
                let tracked = self.is_move_typed_init(init);
                if let Expr::Name { name: src, span } = init {
                    self.consume_move(*src, *span);
                } else {
                    self.scan_expr_uses(init);
                }
                if tracked {
                    self.scopes
                        .last_mut()
                        .expect("base scope always present")
                        .insert(*name, OwnershipVar { state: MoveState::Owned, borrow_count: 0 });
                }
            }
            Statement::Assign { target, target_span, op, value, .. } => {
                if *op != AssignOp::Assign {
                    self.scan_expr_uses(value);
                    return;
                }
                if let Expr::Name { name: src, span } = value {
                    if src == target {
                        let n = self.name_str(*target);
                        self.report(*target_span, CheckError::SelfMove { name: n });
                        return;
                    }
                    self.check_assign_while_borrowed(*target, *target_span);
                    if self.consume_move(*src, *span) {
                        self.mark_owned(*target);
                    }
                } else {
                    self.scan_expr_uses(value);
                    self.check_assign_while_borrowed(*target, *target_span);
                    self.mark_owned(*target);
                }
            }
            Statement::Return { value, .. } => {
                if let Some(v) = value {
                    self.scan_expr_uses(v);
                }
            }
            Statement::Throw { value, .. } => self.scan_expr_uses(value),
            Statement::If { cond, then_branch, else_branch, .. } => {
                self.scan_expr_uses(cond);
                self.check_statement(then_branch);
                if let Some(e) = else_branch {
                    self.check_statement(e);
                }
            }
            Statement::Loop { cond_or_count, body, .. } => {
                self.scan_expr_uses(cond_or_count);
                self.check_statement(body);
            }
            Statement::Module { body, .. } => {
                for s in body {
                    self.check_statement(s);
                }
            }
            Statement::Break { .. }
            | Statement::Continue { .. }
            | Statement::RecordDecl { .. }
            | Statement::EnumDecl { .. }
            | Statement::Import { .. } => {}
        }
    }

    fn check_assign_while_borrowed(&mut self, target: Symbol, span: Span) {
        if let Some(idx) = self.scopes.iter().rposition(|s| s.contains_key(&target)) {
            if self.scopes[idx][&target].borrow_count > 0 {
                let n = self.name_str(target);
                self.report(span, CheckError::AssignWhileBorrowed { name: n });
            }
        }
    }

    fn mark_owned(&mut self, name: Symbol) {
        if let Some(idx) = self.scopes.iter().rposition(|s| s.contains_key(&name)) {
            self.scopes[idx].get_mut(&name).expect("just located by rposition").state = MoveState::Owned;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::{Category, Diagnostics};
    use crate::parser::parse_source;

    fn ownership_errors(source: &str) -> Vec<Category> {
        let mut diagnostics = Diagnostics::new();
        let (unit, interner) = parse_source(source, &mut diagnostics);
        crate::checker::check(&unit, &interner, &mut diagnostics);
        diagnostics.iter().filter(|d| d.category == Category::Ownership).map(|d| d.category).collect()
    }

    #[test]
    fn a_borrow_closes_at_the_end_of_the_statement_that_opened_it() {
        let source = "flux s = \"hi\";\nflux t = s + \"x\";\ns = \"bye\";\nreturn 0;\n";
        assert!(ownership_errors(source).is_empty(), "a borrow from a prior statement must not block a later assignment");
    }

    #[test]
    fn assigning_to_a_variable_borrowed_by_its_own_statement_is_rejected() {
        let source = "flux s = \"hi\";\nif s == s => { s = \"bye\"; }\nreturn 0;\n";
        assert_eq!(ownership_errors(source), vec![Category::Ownership]);
    }

    #[test]
    fn moving_a_variable_borrowed_by_the_enclosing_statement_is_rejected() {
        let source = "flux s = \"hi\";\nif s == s => { flux t = s; }\nreturn 0;\n";
        assert_eq!(ownership_errors(source), vec![Category::Ownership]);
    }

    #[test]
    fn use_after_move_is_still_caught() {
        let source = "flux s = \"hi\";\nflux t = s;\nflux u = s;\nreturn 0;\n";
        assert_eq!(ownership_errors(source), vec![Category::Ownership]);
    }
}
