//! Constant folding (`spec.md` §4.5 optimizer passes).
//!
//! Folds only within a single block: a fresh constant map starts at the top
//! of every block and nothing carries across an edge, because a loop
//! header's back-edge means a block can run more than once with a operand
//! that only looks constant on the first pass.

use rustc_hash::FxHashMap;

use crate::ir::function::Function;
use crate::ir::instr::Instr;
use crate::ir::value::{BinaryOp, IrConst, IrType, IrValue, Temp, UnaryOp};

pub fn run(func: &mut Function) -> bool {
    let mut changed = false;
    for block in &mut func.blocks {
        let mut consts: FxHashMap<Temp, IrConst> = FxHashMap::default();
        for instr in &mut block.instrs {
            changed |= substitute_known(instr, &consts);
            if let Some(folded) = try_fold(instr) {
                let dest = instr.dest().expect("try_fold only returns Some for instructions with a dest");
                *instr = Instr::LoadConst { dest, value: folded };
                changed = true;
            }
            if let Instr::LoadConst { dest, value } = instr {
                consts.insert(*dest, value.clone());
            }
        }
    }
    changed
}

fn resolve(v: &mut IrValue, consts: &FxHashMap<Temp, IrConst>) -> bool {
    if let IrValue::Temp(t) = v {
        if let Some(c) = consts.get(t) {
            *v = IrValue::Const(c.clone());
            return true;
        }
    }
    false
}

fn substitute_known(instr: &mut Instr, consts: &FxHashMap<Temp, IrConst>) -> bool {
    match instr {
        Instr::Move { src, .. } | Instr::VarSet { value: src, .. } | Instr::Unary { operand: src, .. } | Instr::Cast { operand: src, .. } => {
            resolve(src, consts)
        }
        Instr::Binary { left, right, .. } => {
            let a = resolve(left, consts);
            let b = resolve(right, consts);
            a || b
        }
        Instr::Branch { cond, .. } => resolve(cond, consts),
        Instr::Return { value: Some(v) } => resolve(v, consts),
        _ => false,
    }
}

fn try_fold(instr: &Instr) -> Option<IrConst> {
    match instr {
        Instr::Unary { op, operand: IrValue::Const(c), .. } => fold_unary(*op, c),
        Instr::Binary { op, left: IrValue::Const(l), right: IrValue::Const(r), .. } => fold_binary(*op, l, r),
        Instr::Cast { ty, operand: IrValue::Const(c), .. } => fold_cast(*ty, c),
        _ => None,
    }
}

fn fold_unary(op: UnaryOp, v: &IrConst) -> Option<IrConst> {
    match (op, v) {
        (UnaryOp::Plus, IrConst::Int(i)) => Some(IrConst::Int(*i)),
        (UnaryOp::Plus, IrConst::Float(f)) => Some(IrConst::Float(*f)),
        (UnaryOp::Neg, IrConst::Int(i)) => Some(IrConst::Int(i.wrapping_neg())),
        (UnaryOp::Neg, IrConst::Float(f)) => Some(IrConst::Float(-f)),
        (UnaryOp::Not, IrConst::Bool(b)) => Some(IrConst::Bool(!b)),
        (UnaryOp::BitNot, IrConst::Int(i)) => Some(IrConst::Int(!i)),
        (UnaryOp::BitNot, IrConst::Char(c)) => Some(IrConst::Int(!(*c as i64))),
        _ => None,
    }
}

fn as_int(c: &IrConst) -> Option<i64> {
    match c {
        IrConst::Int(i) => Some(*i),
        IrConst::Char(c) => Some(*c as i64),
        _ => None,
    }
}

fn as_float(c: &IrConst) -> Option<f64> {
    match c {
        IrConst::Float(f) => Some(*f),
        IrConst::Int(i) => Some(*i as f64),
        IrConst::Char(c) => Some(*c as u32 as f64),
        _ => None,
    }
}

fn fold_binary(op: BinaryOp, l: &IrConst, r: &IrConst) -> Option<IrConst> {
    use BinaryOp::*;
    if matches!(op, Add) && (matches!(l, IrConst::Str(_)) || matches!(r, IrConst::Str(_))) {
        return Some(IrConst::Str(format!("{}{}", display_const(l), display_const(r))));
    }
    if let (Some(a), Some(b)) = (as_int(l), as_int(r)) {
        if matches!(l, IrConst::Int(_) | IrConst::Char(_)) && matches!(r, IrConst::Int(_) | IrConst::Char(_)) {
            match op {
                Add => return Some(IrConst::Int(a.wrapping_add(b))),
                Sub => return Some(IrConst::Int(a.wrapping_sub(b))),
                Mul => return Some(IrConst::Int(a.wrapping_mul(b))),
                Div | Mod | IntDiv if b == 0 => return None, // leave for the VM to raise a runtime error
                Div | IntDiv => return Some(IrConst::Int(a.wrapping_div(b))),
                Mod => return Some(IrConst::Int(a.wrapping_rem(b))),
                Shl => return Some(IrConst::Int(a.wrapping_shl((b & 63) as u32))),
                Shr => return Some(IrConst::Int(a.wrapping_shr((b & 63) as u32))),
                UShl => return Some(IrConst::Int(((a as u64).wrapping_shl((b & 63) as u32)) as i64)),
                UShr => return Some(IrConst::Int(((a as u64).wrapping_shr((b & 63) as u32)) as i64)),
                BitAnd => return Some(IrConst::Int(a & b)),
                BitOr => return Some(IrConst::Int(a | b)),
                Xor => return Some(IrConst::Int(a ^ b)),
                XorAnd => return Some(IrConst::Int(!(a ^ b))),
                Lt => return Some(IrConst::Bool(a < b)),
                LtEq => return Some(IrConst::Bool(a <= b)),
                Gt => return Some(IrConst::Bool(a > b)),
                GtEq => return Some(IrConst::Bool(a >= b)),
                Eq => return Some(IrConst::Bool(a == b)),
                NotEq => return Some(IrConst::Bool(a != b)),
                _ => {}
            }
        }
    }
    if matches!(l, IrConst::Float(_)) || matches!(r, IrConst::Float(_)) {
        if let (Some(a), Some(b)) = (as_float(l), as_float(r)) {
            match op {
                Add => return Some(IrConst::Float(a + b)),
                Sub => return Some(IrConst::Float(a - b)),
                Mul => return Some(IrConst::Float(a * b)),
                Div => return Some(IrConst::Float(a / b)),
                Lt => return Some(IrConst::Bool(a < b)),
                LtEq => return Some(IrConst::Bool(a <= b)),
                Gt => return Some(IrConst::Bool(a > b)),
                GtEq => return Some(IrConst::Bool(a >= b)),
                Eq => return Some(IrConst::Bool(a == b)),
                NotEq => return Some(IrConst::Bool(a != b)),
                _ => {}
            }
        }
    }
    match (op, l, r) {
        (And, IrConst::Bool(a), IrConst::Bool(b)) => Some(IrConst::Bool(*a && *b)),
        (Or, IrConst::Bool(a), IrConst::Bool(b)) => Some(IrConst::Bool(*a || *b)),
        (BitNand, IrConst::Bool(a), IrConst::Bool(b)) => Some(IrConst::Bool(!(*a && *b))),
        (BitNor, IrConst::Bool(a), IrConst::Bool(b)) => Some(IrConst::Bool(!(*a || *b))),
        (Eq, IrConst::Bool(a), IrConst::Bool(b)) => Some(IrConst::Bool(a == b)),
        (NotEq, IrConst::Bool(a), IrConst::Bool(b)) => Some(IrConst::Bool(a != b)),
        (Eq, IrConst::Str(a), IrConst::Str(b)) => Some(IrConst::Bool(a == b)),
        (NotEq, IrConst::Str(a), IrConst::Str(b)) => Some(IrConst::Bool(a != b)),
        _ => None,
    }
}

fn fold_cast(ty: IrType, v: &IrConst) -> Option<IrConst> {
    match (ty, v) {
        (IrType::Int, IrConst::Int(i)) => Some(IrConst::Int(*i)),
        (IrType::Int, IrConst::Char(c)) => Some(IrConst::Int(*c as i64)),
        (IrType::Int, IrConst::Float(f)) => Some(IrConst::Int(*f as i64)),
        (IrType::Float, IrConst::Float(f)) => Some(IrConst::Float(*f)),
        (IrType::Float, IrConst::Int(i)) => Some(IrConst::Float(*i as f64)),
        (IrType::Float, IrConst::Char(c)) => Some(IrConst::Float(*c as u32 as f64)),
        _ => None,
    }
}

fn display_const(c: &IrConst) -> String {
    match c {
        IrConst::Int(i) => i.to_string(),
        IrConst::Float(f) => f.to_string(),
        IrConst::Bool(b) => b.to_string(),
        IrConst::Char(c) => c.to_string(),
        IrConst::Str(s) => s.clone(),
    }
}
