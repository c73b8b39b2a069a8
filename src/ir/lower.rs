//! AST to IR lowering (`spec.md` §4.5).
//!
//! Type declarations, modules, and imports contribute no instructions.
//! `paralloop` is lowered exactly like a sequential `loop` with an induction
//! variable when counted (`spec.md` §5: the VM has no real concurrency, so a
//! counted paralloop's reduction-only restriction is what makes running it
//! sequentially produce the same result a parallel scheduler would).
//! `throw` has no dedicated opcode (`spec.md` §3's opcode table has none) and
//! lowers the same way `return` does, ending the function.

use super::block::{BasicBlock, BlockId};
use super::function::{Function, Module};
use super::instr::Instr;
use super::value::{IrConst, IrType, IrValue, Temp};
use crate::checker::{ExprTypes, TypeSymbol};
use crate::parser::ast::*;
use crate::parser::interner::{Interner, Symbol};

struct LoopTargets {
    break_target: BlockId,
    continue_target: BlockId,
}

pub struct IrLowerer<'a> {
    interner: &'a mut Interner,
    expr_types: &'a ExprTypes,
    next_temp: u32,
    next_block: u32,
    blocks: Vec<BasicBlock>,
    current: BlockId,
    loop_stack: Vec<LoopTargets>,
    counted_loop_counter: u32,
}

impl<'a> IrLowerer<'a> {
    pub fn new(interner: &'a mut Interner, expr_types: &'a ExprTypes) -> Self {
        let entry = BlockId(0);
        Self {
            interner,
            expr_types,
            next_temp: 0,
            next_block: 1,
            blocks: vec![BasicBlock::new(entry)],
            current: entry,
            loop_stack: Vec::new(),
            counted_loop_counter: 0,
        }
    }

    pub fn lower_program(unit: &CompilationUnit, interner: &mut Interner, expr_types: &ExprTypes) -> Module {
        let entry = BlockId(0);
        let mut lowerer = IrLowerer::new(interner, expr_types);
        for stmt in &unit.statements {
            lowerer.lower_statement(stmt);
        }
        lowerer.ensure_terminated(Instr::Return { value: None });
        Module { functions: vec![Function { name: "main".to_string(), blocks: lowerer.blocks, entry }] }
    }

    fn fresh_temp(&mut self) -> Temp {
        let t = Temp(self.next_temp);
        self.next_temp += 1;
        t
    }

    fn fresh_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        self.blocks.push(BasicBlock::new(id));
        id
    }

    fn synthetic_var(&mut self, label: &str) -> Symbol {
        self.counted_loop_counter += 1;
        self.interner.intern(&format!("__{label}_{}", self.counted_loop_counter))
    }

    fn emit(&mut self, instr: Instr) {
        let block = self.blocks.iter_mut().find(|b| b.id == self.current).expect("current block always exists");
        block.instrs.push(instr);
    }

    fn switch_to(&mut self, block: BlockId) {
        self.current = block;
    }

    /// Appends `terminator` to the current block only if it doesn't already
    /// end in one (an earlier `return`/`break`/`continue` already did).
    fn ensure_terminated(&mut self, terminator: Instr) {
        let block = self.blocks.iter_mut().find(|b| b.id == self.current).expect("current block always exists");
        if block.terminator().is_none() {
            block.instrs.push(terminator);
        }
    }

    fn current_is_terminated(&self) -> bool {
        self.blocks.iter().find(|b| b.id == self.current).expect("current block always exists").terminator().is_some()
    }

    fn expr_type(&self, expr: &Expr) -> TypeSymbol {
        let span = expr.span();
        self.expr_types.get(&(span.line, span.col, span.len)).cloned().unwrap_or(TypeSymbol::Primitive(crate::checker::types::Primitive::Error))
    }

    fn ir_type_of(&self, expr: &Expr) -> IrType {
        ir_type(&self.expr_type(expr))
    }

    fn lower_statement(&mut self, stmt: &Statement) {
        if self.current_is_terminated() {
            // Dead code after an early return/break/continue/throw: still walk
            // it so nested declarations (if any) are visited, but route fresh
            // control flow into a new, unreachable block instead of appending
            // after a terminator.
            let dead = self.fresh_block();
            self.switch_to(dead);
        }
        match stmt {
            Statement::Block { statements, .. } => {
                for s in statements {
                    self.lower_statement(s);
                }
            }
            Statement::Expr { expr, .. } => {
                self.lower_expr(expr);
            }
            Statement::VarDecl { name, init, .. } => {
                let value = self.lower_expr(init);
                self.emit(Instr::VarSet { var: *name, value });
            }
            Statement::Assign { target, op, value, .. } => {
                let rhs = self.lower_expr(value);
                let final_value = match op {
                    AssignOp::Assign => rhs,
                    _ => {
                        let cur = self.fresh_temp();
                        self.emit(Instr::VarGet { dest: cur, var: *target });
                        let bin_op = match op {
                            AssignOp::AddAssign => BinaryOp::Add,
                            AssignOp::SubAssign => BinaryOp::Sub,
                            AssignOp::MulAssign => BinaryOp::Mul,
                            AssignOp::DivAssign => BinaryOp::Div,
                            AssignOp::Assign => unreachable!(),
                        };
                        let dest = self.fresh_temp();
                        self.emit(Instr::Binary { dest, op: bin_op, left: IrValue::Temp(cur), right: rhs });
                        IrValue::Temp(dest)
                    }
                };
                self.emit(Instr::VarSet { var: *target, value: final_value });
            }
            Statement::Return { value, .. } => {
                let v = value.as_ref().map(|e| self.lower_expr(e));
                self.emit(Instr::Return { value: v });
            }
            Statement::Throw { value, .. } => {
                let v = self.lower_expr(value);
                self.emit(Instr::Return { value: Some(v) });
            }
            Statement::If { cond, then_branch, else_branch, .. } => self.lower_if(cond, then_branch, else_branch.as_deref()),
            Statement::Loop { parallel, cond_or_count, iter_var, body, .. } => {
                let counted = *parallel && self.expr_type(cond_or_count) == TypeSymbol::Primitive(crate::checker::types::Primitive::Int);
                if counted {
                    self.lower_counted_loop(cond_or_count, *iter_var, body);
                } else {
                    self.lower_condition_loop(cond_or_count, body);
                }
            }
            Statement::Break { .. } => {
                let target = self.loop_stack.last().expect("break only valid inside a loop, enforced by the checker").break_target;
                self.emit(Instr::Jump { target });
            }
            Statement::Continue { .. } => {
                let target = self.loop_stack.last().expect("continue only valid inside a loop, enforced by the checker").continue_target;
                self.emit(Instr::Jump { target });
            }
            Statement::RecordDecl { .. } | Statement::EnumDecl { .. } | Statement::Module { .. } | Statement::Import { .. } => {}
        }
    }

    fn lower_if(&mut self, cond: &Expr, then_branch: &Statement, else_branch: Option<&Statement>) {
        let cond_val = self.lower_expr(cond);
        let then_block = self.fresh_block();
        let else_block = self.fresh_block();
        let join_block = self.fresh_block();
        self.emit(Instr::Branch { cond: cond_val, if_true: then_block, if_false: else_block });

        self.switch_to(then_block);
        self.lower_statement(then_branch);
        self.ensure_terminated(Instr::Jump { target: join_block });

        self.switch_to(else_block);
        if let Some(e) = else_branch {
            self.lower_statement(e);
        }
        self.ensure_terminated(Instr::Jump { target: join_block });

        self.switch_to(join_block);
    }

    fn lower_condition_loop(&mut self, cond: &Expr, body: &Statement) {
        let header = self.fresh_block();
        let body_block = self.fresh_block();
        let exit_block = self.fresh_block();
        self.ensure_terminated(Instr::Jump { target: header });

        self.switch_to(header);
        let cond_val = self.lower_expr(cond);
        self.emit(Instr::Branch { cond: cond_val, if_true: body_block, if_false: exit_block });

        self.switch_to(body_block);
        self.loop_stack.push(LoopTargets { break_target: exit_block, continue_target: header });
        self.lower_statement(body);
        self.loop_stack.pop();
        self.ensure_terminated(Instr::Jump { target: header });

        self.switch_to(exit_block);
    }

    fn lower_counted_loop(&mut self, count: &Expr, iter_var: Option<(Symbol, crate::diagnostics::Span)>, body: &Statement) {
        let count_val = self.lower_expr(count);
        let count_var = self.synthetic_var("paralloop_count");
        self.emit(Instr::VarSet { var: count_var, value: count_val });
        let counter_var = self.synthetic_var("paralloop_i");
        self.emit(Instr::VarSet { var: counter_var, value: IrValue::Const(IrConst::Int(0)) });

        let header = self.fresh_block();
        let body_block = self.fresh_block();
        let exit_block = self.fresh_block();
        self.ensure_terminated(Instr::Jump { target: header });

        self.switch_to(header);
        let i_temp = self.fresh_temp();
        self.emit(Instr::VarGet { dest: i_temp, var: counter_var });
        let n_temp = self.fresh_temp();
        self.emit(Instr::VarGet { dest: n_temp, var: count_var });
        let cmp = self.fresh_temp();
        self.emit(Instr::Binary { dest: cmp, op: BinaryOp::Lt, left: IrValue::Temp(i_temp), right: IrValue::Temp(n_temp) });
        self.emit(Instr::Branch { cond: IrValue::Temp(cmp), if_true: body_block, if_false: exit_block });

        self.switch_to(body_block);
        if let Some((name, _)) = iter_var {
            let i_temp2 = self.fresh_temp();
            self.emit(Instr::VarGet { dest: i_temp2, var: counter_var });
            self.emit(Instr::VarSet { var: name, value: IrValue::Temp(i_temp2) });
        }
        self.loop_stack.push(LoopTargets { break_target: exit_block, continue_target: header });
        self.lower_statement(body);
        self.loop_stack.pop();

        if !self.current_is_terminated() {
            let i_temp3 = self.fresh_temp();
            self.emit(Instr::VarGet { dest: i_temp3, var: counter_var });
            let one = self.fresh_temp();
            self.emit(Instr::LoadConst { dest: one, value: IrConst::Int(1) });
            let next = self.fresh_temp();
            self.emit(Instr::Binary { dest: next, op: BinaryOp::Add, left: IrValue::Temp(i_temp3), right: IrValue::Temp(one) });
            self.emit(Instr::VarSet { var: counter_var, value: IrValue::Temp(next) });
        }
        self.ensure_terminated(Instr::Jump { target: header });

        self.switch_to(exit_block);
    }

    fn lower_expr(&mut self, expr: &Expr) -> IrValue {
        match expr {
            Expr::Literal { value, .. } => IrValue::Const(lower_literal(value, self.interner)),
            Expr::Name { name, .. } => {
                let dest = self.fresh_temp();
                self.emit(Instr::VarGet { dest, var: *name });
                IrValue::Temp(dest)
            }
            Expr::Paren { inner, .. } => self.lower_expr(inner),
            Expr::Unary { op, operand, .. } => {
                let v = self.lower_expr(operand);
                let dest = self.fresh_temp();
                self.emit(Instr::Unary { dest, op: *op, operand: v });
                IrValue::Temp(dest)
            }
            Expr::Binary { op, left, right, .. } => {
                let l = self.lower_expr(left);
                let r = self.lower_expr(right);
                let dest = self.fresh_temp();
                self.emit(Instr::Binary { dest, op: *op, left: l, right: r });
                IrValue::Temp(dest)
            }
            Expr::Cast { operand, .. } => {
                let v = self.lower_expr(operand);
                let ty = self.ir_type_of(expr);
                let dest = self.fresh_temp();
                self.emit(Instr::Cast { dest, ty, operand: v });
                IrValue::Temp(dest)
            }
            Expr::Error { .. } => {
                // Never reaches a successfully-checked program; lowered as an
                // inert placeholder so the lowering pass stays total.
                let dest = self.fresh_temp();
                self.emit(Instr::LoadConst { dest, value: IrConst::Int(0) });
                IrValue::Temp(dest)
            }
        }
    }
}

fn lower_literal(lit: &Literal, interner: &Interner) -> IrConst {
    match lit {
        Literal::Int(v) => IrConst::Int(*v),
        Literal::Float(v) => IrConst::Float(*v),
        Literal::Bool(v) => IrConst::Bool(*v),
        Literal::Char(v) => IrConst::Char(*v),
        Literal::Str(sym) => IrConst::Str(interner.resolve(*sym).to_string()),
    }
}

fn ir_type(ty: &TypeSymbol) -> IrType {
    use crate::checker::types::Primitive;
    match ty {
        TypeSymbol::Primitive(Primitive::Int) => IrType::Int,
        TypeSymbol::Primitive(Primitive::Float) => IrType::Float,
        TypeSymbol::Primitive(Primitive::Bool) => IrType::Bool,
        TypeSymbol::Primitive(Primitive::Char) => IrType::Char,
        TypeSymbol::Primitive(Primitive::String) => IrType::String,
        _ => IrType::Unit,
    }
}
