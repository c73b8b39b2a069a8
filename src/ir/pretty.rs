//! MLIR-style textual dump of a lowered `Module`, used by the `mlir`
//! compilation target (`spec.md` §4.5, §6).

use std::fmt::Write as _;

use super::function::{Function, Module};
use super::instr::Instr;
use super::value::{IrConst, IrValue};
use crate::parser::interner::Interner;

pub fn print_module(module: &Module, interner: &Interner) -> String {
    let mut out = String::new();
    for f in &module.functions {
        print_function(&mut out, f, interner);
    }
    out
}

fn print_function(out: &mut String, f: &Function, interner: &Interner) {
    let _ = writeln!(out, "func @{}() {{", f.name);
    for block in &f.blocks {
        let _ = writeln!(out, "^bb{}:", block.id.0);
        for instr in &block.instrs {
            let _ = writeln!(out, "  {}", print_instr(instr, interner));
        }
    }
    let _ = writeln!(out, "}}");
}

fn print_value(v: &IrValue) -> String {
    match v {
        IrValue::Const(IrConst::Int(i)) => format!("{i} : int"),
        IrValue::Const(IrConst::Float(f)) => format!("{f} : float"),
        IrValue::Const(IrConst::Bool(b)) => format!("{b} : bool"),
        IrValue::Const(IrConst::Char(c)) => format!("{c:?} : char"),
        IrValue::Const(IrConst::Str(s)) => format!("{s:?} : string"),
        IrValue::Temp(t) => format!("%{}", t.0),
    }
}

fn print_instr(instr: &Instr, interner: &Interner) -> String {
    match instr {
        Instr::LoadConst { dest, value } => format!("%{} = const {}", dest.0, print_value(&IrValue::Const(value.clone()))),
        Instr::Move { dest, src } => format!("%{} = move {}", dest.0, print_value(src)),
        Instr::VarGet { dest, var } => format!("%{} = var.get @{}", dest.0, interner.resolve(*var)),
        Instr::VarSet { var, value } => format!("var.set @{} = {}", interner.resolve(*var), print_value(value)),
        Instr::Unary { dest, op, operand } => format!("%{} = unary.{:?} {}", dest.0, op, print_value(operand)),
        Instr::Binary { dest, op, left, right } => {
            format!("%{} = binary.{:?} {}, {}", dest.0, op, print_value(left), print_value(right))
        }
        Instr::Cast { dest, ty, operand } => format!("%{} = cast<{:?}> {}", dest.0, ty, print_value(operand)),
        Instr::Jump { target } => format!("jump ^bb{}", target.0),
        Instr::Branch { cond, if_true, if_false } => {
            format!("branch {}, ^bb{}, ^bb{}", print_value(cond), if_true.0, if_false.0)
        }
        Instr::Return { value: Some(v) } => format!("return {}", print_value(v)),
        Instr::Return { value: None } => "return".to_string(),
    }
}
