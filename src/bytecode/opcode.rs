//! Register bytecode instruction set (`spec.md` §3 opcode table).
//!
//! Every instruction is a fixed-shape `(op, A, B, C, D)` tuple. `op` and any
//! specialization bits live in the opcode itself, never packed into an
//! operand, so the VM's dispatch switch stays dense (`spec.md` §9).

use crate::ir::value::{BinaryOp, IrType, UnaryOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OpCode {
    Nop,
    /// `s[A] <- const[B]`
    LoadConst,
    /// `s[A] <- s[B]`
    Move,
    /// unary `B` applied to `s[C]`, result in `s[A]`
    Unary,
    /// generic binary `B` on `s[C] , s[D]`, result in `s[A]`
    Binary,
    /// integer-specialized binary
    BinaryInt,
    /// `s[A] <- s[C] op const[D]`
    BinaryIntConstRight,
    /// fused integer compare + branch: jump to `D` if `s[A] op(C) s[B]`
    JumpIfBinaryIntTrue,
    /// fused integer compare-with-constant + branch
    JumpIfBinaryIntConstRightTrue,
    /// `s[A] <- cast<C>(s[B])`
    Cast,
    Jump,
    /// jump to `B` if `s[A]` is non-zero
    JumpIfTrue,
    /// jump to `B` if `s[A]` is zero
    JumpIfFalse,
    /// `A < 0` returns unit, else returns `s[A]`
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Instruction {
    pub op: OpCode,
    pub a: i32,
    pub b: i32,
    pub c: i32,
    pub d: i32,
}

impl Instruction {
    pub fn new(op: OpCode, a: i32, b: i32, c: i32, d: i32) -> Self {
        Self { op, a, b, c, d }
    }
}

/// Stable small-integer encoding for `UnaryOp`/`BinaryOp` carried in an
/// operand field, decoded by both the VM and the native transpiler.
pub fn encode_unary(op: UnaryOp) -> i32 {
    match op {
        UnaryOp::Plus => 0,
        UnaryOp::Neg => 1,
        UnaryOp::Not => 2,
        UnaryOp::BitNot => 3,
    }
}

pub fn decode_unary(code: i32) -> UnaryOp {
    match code {
        0 => UnaryOp::Plus,
        1 => UnaryOp::Neg,
        2 => UnaryOp::Not,
        3 => UnaryOp::BitNot,
        _ => unreachable!("bytecode carries only encoded unary ops"),
    }
}

pub fn encode_binary(op: BinaryOp) -> i32 {
    use BinaryOp::*;
    match op {
        Add => 0,
        Sub => 1,
        Mul => 2,
        Div => 3,
        Mod => 4,
        IntDiv => 5,
        Shl => 6,
        Shr => 7,
        UShl => 8,
        UShr => 9,
        Lt => 10,
        LtEq => 11,
        Gt => 12,
        GtEq => 13,
        Eq => 14,
        NotEq => 15,
        BitAnd => 16,
        BitOr => 17,
        BitNand => 18,
        BitNor => 19,
        Xor => 20,
        XorAnd => 21,
        And => 22,
        Or => 23,
    }
}

pub fn decode_binary(code: i32) -> BinaryOp {
    use BinaryOp::*;
    match code {
        0 => Add,
        1 => Sub,
        2 => Mul,
        3 => Div,
        4 => Mod,
        5 => IntDiv,
        6 => Shl,
        7 => Shr,
        8 => UShl,
        9 => UShr,
        10 => Lt,
        11 => LtEq,
        12 => Gt,
        13 => GtEq,
        14 => Eq,
        15 => NotEq,
        16 => BitAnd,
        17 => BitOr,
        18 => BitNand,
        19 => BitNor,
        20 => Xor,
        21 => XorAnd,
        22 => And,
        23 => Or,
        _ => unreachable!("bytecode carries only encoded binary ops"),
    }
}

pub fn encode_ir_type(ty: IrType) -> i32 {
    match ty {
        IrType::Int => 0,
        IrType::Float => 1,
        IrType::Bool => 2,
        IrType::Char => 3,
        IrType::String => 4,
        IrType::Unit => 5,
    }
}

pub fn decode_ir_type(code: i32) -> IrType {
    match code {
        0 => IrType::Int,
        1 => IrType::Float,
        2 => IrType::Bool,
        3 => IrType::Char,
        4 => IrType::String,
        5 => IrType::Unit,
        _ => unreachable!("bytecode carries only encoded IR types"),
    }
}

pub fn is_int_comparison(op: BinaryOp) -> bool {
    matches!(op, BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq | BinaryOp::Eq | BinaryOp::NotEq)
}
