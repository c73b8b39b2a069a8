//! IR to register bytecode (`spec.md` §4.7).
//!
//! Locals and temporaries share one dense slot space, so `VarGet`/`VarSet`
//! both lower to a plain `Move` between a variable's slot and a temp's slot
//! — the opcode table has no separate variable-access instruction. A
//! two-target `Branch` has no single-opcode counterpart either: it becomes a
//! `JumpIfTrue` to the true block, followed by a `Jump` to the false block
//! unless the false block is already the next one in layout order, in which
//! case the `Jump` is just dropped and control falls through.

use rustc_hash::FxHashMap;

use crate::ir::block::BlockId;
use crate::ir::function::{Function, Module};
use crate::ir::instr::Instr;
use crate::ir::value::{IrConst, IrType, IrValue, Temp, VarSlot};

use super::opcode::{self, Instruction, OpCode};
use super::program::{BytecodeFunction, BytecodeProgram};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SlotKey {
    Var(VarSlot),
    Temp(Temp),
    Synthetic(u32),
}

#[derive(Debug, Clone, Copy)]
enum Field {
    A,
    B,
    D,
}

pub struct BytecodeGenerator {
    temp_types: FxHashMap<Temp, IrType>,
    var_types: FxHashMap<VarSlot, IrType>,
    slots: FxHashMap<SlotKey, i32>,
    next_slot: i32,
    next_synth: u32,
    constants: Vec<IrConst>,
}

pub fn generate(module: &Module) -> BytecodeProgram {
    BytecodeProgram { functions: module.functions.iter().map(generate_function).collect() }
}

fn generate_function(func: &Function) -> BytecodeFunction {
    let mut gen = BytecodeGenerator {
        temp_types: FxHashMap::default(),
        var_types: FxHashMap::default(),
        slots: FxHashMap::default(),
        next_slot: 0,
        next_synth: 0,
        constants: Vec::new(),
    };
    gen.run(func)
}

impl BytecodeGenerator {
    fn slot(&mut self, key: SlotKey) -> i32 {
        if let Some(&s) = self.slots.get(&key) {
            return s;
        }
        let s = self.next_slot;
        self.next_slot += 1;
        self.slots.insert(key, s);
        s
    }

    fn const_index(&mut self, value: IrConst) -> i32 {
        if let Some(pos) = self.constants.iter().position(|c| c == &value) {
            return pos as i32;
        }
        self.constants.push(value);
        (self.constants.len() - 1) as i32
    }

    fn value_type(&self, v: &IrValue) -> Option<IrType> {
        match v {
            IrValue::Const(c) => Some(c.ty()),
            IrValue::Temp(t) => self.temp_types.get(t).copied(),
        }
    }

    fn is_int(&self, v: &IrValue) -> bool {
        self.value_type(v) == Some(IrType::Int)
    }

    /// Resolves a value to a slot holding it, materializing a constant into a
    /// synthetic slot via `LoadConst` if it isn't already a slot-backed temp.
    fn operand_slot(&mut self, v: &IrValue, instrs: &mut Vec<Instruction>) -> i32 {
        match v {
            IrValue::Temp(t) => self.slot(SlotKey::Temp(*t)),
            IrValue::Const(c) => {
                let id = self.next_synth;
                self.next_synth += 1;
                let slot = self.slot(SlotKey::Synthetic(id));
                let cidx = self.const_index(c.clone());
                instrs.push(Instruction::new(OpCode::LoadConst, slot, cidx, 0, 0));
                slot
            }
        }
    }

    fn run(&mut self, func: &Function) -> BytecodeFunction {
        let block_index: FxHashMap<BlockId, usize> = func.blocks.iter().enumerate().map(|(i, b)| (b.id, i)).collect();

        let mut instrs: Vec<Instruction> = Vec::new();
        let mut fixups: Vec<(usize, Field, BlockId)> = Vec::new();
        let mut block_starts: FxHashMap<BlockId, usize> = FxHashMap::default();

        for (i, block) in func.blocks.iter().enumerate() {
            block_starts.insert(block.id, instrs.len());
            let next_block_id = func.blocks.get(i + 1).map(|b| b.id);

            let mut j = 0;
            while j < block.instrs.len() {
                let instr = &block.instrs[j];
                match instr {
                    Instr::LoadConst { dest, value } => {
                        self.temp_types.insert(*dest, value.ty());
                        let cidx = self.const_index(value.clone());
                        let a = self.slot(SlotKey::Temp(*dest));
                        instrs.push(Instruction::new(OpCode::LoadConst, a, cidx, 0, 0));
                    }
                    Instr::Move { dest, src } => {
                        if let Some(ty) = self.value_type(src) {
                            self.temp_types.insert(*dest, ty);
                        }
                        let b = self.operand_slot(src, &mut instrs);
                        let a = self.slot(SlotKey::Temp(*dest));
                        instrs.push(Instruction::new(OpCode::Move, a, b, 0, 0));
                    }
                    Instr::VarGet { dest, var } => {
                        if let Some(ty) = self.var_types.get(var).copied() {
                            self.temp_types.insert(*dest, ty);
                        }
                        let b = self.slot(SlotKey::Var(*var));
                        let a = self.slot(SlotKey::Temp(*dest));
                        instrs.push(Instruction::new(OpCode::Move, a, b, 0, 0));
                    }
                    Instr::VarSet { var, value } => {
                        if let Some(ty) = self.value_type(value) {
                            self.var_types.insert(*var, ty);
                        }
                        let b = self.operand_slot(value, &mut instrs);
                        let a = self.slot(SlotKey::Var(*var));
                        instrs.push(Instruction::new(OpCode::Move, a, b, 0, 0));
                    }
                    Instr::Unary { dest, op, operand } => {
                        let ty = self.value_type(operand).unwrap_or(IrType::Int);
                        self.temp_types.insert(*dest, ty);
                        let c = self.operand_slot(operand, &mut instrs);
                        let a = self.slot(SlotKey::Temp(*dest));
                        instrs.push(Instruction::new(OpCode::Unary, a, opcode::encode_unary(*op), c, 0));
                    }
                    Instr::Binary { dest, op, left, right } => {
                        let fused = self.try_fuse_compare_branch(*dest, *op, left, right, block.instrs.get(j + 1), i, &block_index);
                        if let Some(branch_consumed) = fused {
                            let left_slot = self.operand_slot(left, &mut instrs);
                            if let IrValue::Const(c) = right {
                                let cidx = self.const_index(c.clone());
                                instrs.push(Instruction::new(OpCode::JumpIfBinaryIntConstRightTrue, left_slot, cidx, opcode::encode_binary(*op), 0));
                            } else {
                                let right_slot = self.operand_slot(right, &mut instrs);
                                instrs.push(Instruction::new(OpCode::JumpIfBinaryIntTrue, left_slot, right_slot, opcode::encode_binary(*op), 0));
                            }
                            let target_idx = instrs.len() - 1;
                            let (if_true, _if_false) = branch_consumed;
                            fixups.push((target_idx, Field::D, if_true));
                            j += 1; // also consumes the following Branch
                        } else {
                            self.emit_binary(*dest, *op, left, right, &mut instrs);
                        }
                    }
                    Instr::Cast { dest, ty, operand } => {
                        self.temp_types.insert(*dest, *ty);
                        let b = self.operand_slot(operand, &mut instrs);
                        let a = self.slot(SlotKey::Temp(*dest));
                        instrs.push(Instruction::new(OpCode::Cast, a, b, opcode::encode_ir_type(*ty), 0));
                    }
                    Instr::Jump { target } => {
                        instrs.push(Instruction::new(OpCode::Jump, 0, 0, 0, 0));
                        fixups.push((instrs.len() - 1, Field::A, *target));
                    }
                    Instr::Branch { cond, if_true, if_false } => {
                        let c = self.operand_slot(cond, &mut instrs);
                        instrs.push(Instruction::new(OpCode::JumpIfTrue, c, 0, 0, 0));
                        fixups.push((instrs.len() - 1, Field::B, *if_true));
                        if Some(*if_false) != next_block_id {
                            instrs.push(Instruction::new(OpCode::Jump, 0, 0, 0, 0));
                            fixups.push((instrs.len() - 1, Field::A, *if_false));
                        }
                    }
                    Instr::Return { value } => match value {
                        Some(v) => {
                            let s = self.operand_slot(v, &mut instrs);
                            instrs.push(Instruction::new(OpCode::Return, s, 0, 0, 0));
                        }
                        None => instrs.push(Instruction::new(OpCode::Return, -1, 0, 0, 0)),
                    },
                }
                j += 1;
            }
        }

        for (idx, field, block_id) in fixups {
            let target = block_starts.get(&block_id).copied().unwrap_or(instrs.len()) as i32;
            match field {
                Field::A => instrs[idx].a = target,
                Field::B => instrs[idx].b = target,
                Field::D => instrs[idx].d = target,
            }
        }

        BytecodeFunction { name: func.name.clone(), slot_count: self.next_slot, constants: std::mem::take(&mut self.constants), instrs }
    }

    fn emit_binary(&mut self, dest: Temp, op: crate::ir::value::BinaryOp, left: &IrValue, right: &IrValue, instrs: &mut Vec<Instruction>) {
        let result_ty = if opcode::is_int_comparison(op) { IrType::Bool } else { self.value_type(left).unwrap_or(IrType::Int) };
        self.temp_types.insert(dest, result_ty);
        let both_int = self.is_int(left) && self.is_int(right);
        let a = self.slot(SlotKey::Temp(dest));
        if both_int {
            if let IrValue::Const(c) = right {
                let left_slot = self.operand_slot(left, instrs);
                let cidx = self.const_index(c.clone());
                instrs.push(Instruction::new(OpCode::BinaryIntConstRight, a, opcode::encode_binary(op), left_slot, cidx));
            } else {
                let left_slot = self.operand_slot(left, instrs);
                let right_slot = self.operand_slot(right, instrs);
                instrs.push(Instruction::new(OpCode::BinaryInt, a, opcode::encode_binary(op), left_slot, right_slot));
            }
        } else {
            let left_slot = self.operand_slot(left, instrs);
            let right_slot = self.operand_slot(right, instrs);
            instrs.push(Instruction::new(OpCode::Binary, a, opcode::encode_binary(op), left_slot, right_slot));
        }
    }

    /// Fuses `dest = left op right; branch dest, if_true, if_false` into a
    /// single fused compare-and-jump when `dest` is only used by that branch
    /// and the false edge already falls through to the next block in layout.
    #[allow(clippy::too_many_arguments)]
    fn try_fuse_compare_branch(
        &self,
        dest: Temp,
        op: crate::ir::value::BinaryOp,
        left: &IrValue,
        right: &IrValue,
        next_instr: Option<&Instr>,
        block_pos: usize,
        block_index: &FxHashMap<BlockId, usize>,
    ) -> Option<(BlockId, BlockId)> {
        if !opcode::is_int_comparison(op) || !self.is_int(left) || !self.is_int(right) {
            return None;
        }
        match next_instr {
            Some(Instr::Binary { .. }) => None,
            Some(Instr::Jump { .. }) | Some(Instr::Return { .. }) | Some(Instr::Unary { .. }) | Some(Instr::Cast { .. }) | Some(Instr::VarGet { .. }) | Some(Instr::VarSet { .. }) | Some(Instr::Move { .. }) | Some(Instr::LoadConst { .. }) | None => None,
            Some(Instr::Branch { cond: IrValue::Temp(t), if_true, if_false }) if *t == dest => {
                let this_pos = block_pos;
                let false_pos = block_index.get(if_false).copied();
                if false_pos == Some(this_pos + 1) {
                    Some((*if_true, *if_false))
                } else {
                    None
                }
            }
            Some(Instr::Branch { .. }) => None,
        }
    }
}
