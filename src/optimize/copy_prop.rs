//! Copy propagation (`spec.md` §4.5 optimizer passes).
//!
//! Single-block only, same rationale as `constant_fold`: a map from temp to
//! its known source value is rebuilt from scratch at the top of every block.

use rustc_hash::FxHashMap;

use crate::ir::function::Function;
use crate::ir::instr::Instr;
use crate::ir::value::{IrValue, Temp};

pub fn run(func: &mut Function) -> bool {
    let mut changed = false;
    for block in &mut func.blocks {
        let mut copies: FxHashMap<Temp, IrValue> = FxHashMap::default();
        for instr in &mut block.instrs {
            changed |= substitute(instr, &copies);
            match instr {
                Instr::Move { dest, src } => {
                    copies.insert(*dest, src.clone());
                }
                Instr::LoadConst { dest, .. } | Instr::VarGet { dest, .. } | Instr::Unary { dest, .. } | Instr::Binary { dest, .. } | Instr::Cast { dest, .. } => {
                    copies.remove(dest);
                }
                _ => {}
            }
        }
    }
    changed
}

fn resolve(v: &mut IrValue, copies: &FxHashMap<Temp, IrValue>) -> bool {
    if let IrValue::Temp(t) = v {
        if let Some(known) = copies.get(t) {
            *v = known.clone();
            return true;
        }
    }
    false
}

fn substitute(instr: &mut Instr, copies: &FxHashMap<Temp, IrValue>) -> bool {
    match instr {
        Instr::Move { src, .. } | Instr::VarSet { value: src, .. } | Instr::Unary { operand: src, .. } | Instr::Cast { operand: src, .. } => {
            resolve(src, copies)
        }
        Instr::Binary { left, right, .. } => {
            let a = resolve(left, copies);
            let b = resolve(right, copies);
            a || b
        }
        Instr::Branch { cond, .. } => resolve(cond, copies),
        Instr::Return { value: Some(v) } => resolve(v, copies),
        _ => false,
    }
}
