//! IR instructions (`spec.md` §4.5): one straight-line operation each, plus
//! the three control-flow terminators (`Jump`, `Branch`, `Return`).

use super::block::BlockId;
use super::value::{BinaryOp, IrConst, IrType, IrValue, Temp, UnaryOp, VarSlot};

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    LoadConst { dest: Temp, value: IrConst },
    /// Copies a value into a fresh temp; emitted by the optimizer's copy
    /// propagation pass as an intermediate form before it is folded away.
    Move { dest: Temp, src: IrValue },
    VarGet { dest: Temp, var: VarSlot },
    VarSet { var: VarSlot, value: IrValue },
    Unary { dest: Temp, op: UnaryOp, operand: IrValue },
    Binary { dest: Temp, op: BinaryOp, left: IrValue, right: IrValue },
    Cast { dest: Temp, ty: IrType, operand: IrValue },
    /// Unconditional control transfer, always the last instruction of a block.
    Jump { target: BlockId },
    /// Conditional control transfer, always the last instruction of a block.
    Branch { cond: IrValue, if_true: BlockId, if_false: BlockId },
    /// Ends the function, always the last instruction of a block.
    Return { value: Option<IrValue> },
}

impl Instr {
    pub fn dest(&self) -> Option<Temp> {
        match self {
            Instr::LoadConst { dest, .. }
            | Instr::Move { dest, .. }
            | Instr::VarGet { dest, .. }
            | Instr::Unary { dest, .. }
            | Instr::Binary { dest, .. }
            | Instr::Cast { dest, .. } => Some(*dest),
            Instr::VarSet { .. } | Instr::Jump { .. } | Instr::Branch { .. } | Instr::Return { .. } => None,
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(self, Instr::Jump { .. } | Instr::Branch { .. } | Instr::Return { .. })
    }

    /// Every temp this instruction reads, for liveness/dead-code passes.
    pub fn uses(&self) -> Vec<Temp> {
        fn value_temp(v: &IrValue) -> Option<Temp> {
            match v {
                IrValue::Temp(t) => Some(*t),
                IrValue::Const(_) => None,
            }
        }
        match self {
            Instr::Move { src, .. } => value_temp(src).into_iter().collect(),
            Instr::VarSet { value, .. } => value_temp(value).into_iter().collect(),
            Instr::Unary { operand, .. } | Instr::Cast { operand, .. } => value_temp(operand).into_iter().collect(),
            Instr::Binary { left, right, .. } => [value_temp(left), value_temp(right)].into_iter().flatten().collect(),
            Instr::Branch { cond, .. } => value_temp(cond).into_iter().collect(),
            Instr::Return { value: Some(v) } => value_temp(v).into_iter().collect(),
            Instr::LoadConst { .. } | Instr::VarGet { .. } | Instr::Jump { .. } | Instr::Return { value: None } => Vec::new(),
        }
    }
}
