//! Bytecode interpreter (`spec.md` §4.8).

use crate::bytecode::opcode::{self, OpCode};
use crate::bytecode::program::{BytecodeFunction, BytecodeProgram};
use crate::ir::value::{BinaryOp, IrType, UnaryOp};

use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub success: bool,
    pub return_value: Value,
    pub error_message: String,
}

impl ExecutionResult {
    fn ok(value: Value) -> Self {
        Self { success: true, return_value: value, error_message: String::new() }
    }

    fn err(message: impl Into<String>) -> Self {
        let message = message.into();
        log::debug!("vm: execution failed: {message}");
        Self { success: false, return_value: Value::Unit, error_message: message }
    }
}

/// Executes `function` to completion. `program` is accepted to match the
/// `(program, entry-function)` shape in `spec.md` §4.8 — nothing in
/// `function` can currently call into a sibling, since the source language
/// has no function calls, so it goes unused today.
pub fn execute(_program: &BytecodeProgram, function: &BytecodeFunction) -> ExecutionResult {
    log::trace!("vm: executing {} ({} slots, {} instrs)", function.name, function.slot_count, function.instrs.len());
    let mut slots = vec![Value::Unit; function.slot_count.max(0) as usize];
    let mut pc: usize = 0;

    loop {
        if pc >= function.instrs.len() {
            return ExecutionResult::ok(Value::Unit);
        }
        let instr = function.instrs[pc];
        match instr.op {
            OpCode::Nop => pc += 1,
            OpCode::LoadConst => {
                slots[instr.a as usize] = Value::from_const(&function.constants[instr.b as usize]);
                pc += 1;
            }
            OpCode::Move => {
                slots[instr.a as usize] = slots[instr.b as usize].clone();
                pc += 1;
            }
            OpCode::Unary => {
                let op = opcode::decode_unary(instr.b);
                slots[instr.a as usize] = eval_unary(op, &slots[instr.c as usize]);
                pc += 1;
            }
            OpCode::Binary | OpCode::BinaryInt => {
                let op = opcode::decode_binary(instr.b);
                let (l, r) = (slots[instr.c as usize].clone(), slots[instr.d as usize].clone());
                match eval_binary(op, &l, &r) {
                    Ok(v) => {
                        slots[instr.a as usize] = v;
                        pc += 1;
                    }
                    Err(msg) => return ExecutionResult::err(msg),
                }
            }
            OpCode::BinaryIntConstRight => {
                let op = opcode::decode_binary(instr.b);
                let l = slots[instr.c as usize].clone();
                let r = Value::from_const(&function.constants[instr.d as usize]);
                match eval_binary(op, &l, &r) {
                    Ok(v) => {
                        slots[instr.a as usize] = v;
                        pc += 1;
                    }
                    Err(msg) => return ExecutionResult::err(msg),
                }
            }
            OpCode::JumpIfBinaryIntTrue => {
                let op = opcode::decode_binary(instr.c);
                let (l, r) = (slots[instr.a as usize].clone(), slots[instr.b as usize].clone());
                match eval_binary(op, &l, &r) {
                    Ok(v) => pc = if v.truthy() { instr.d as usize } else { pc + 1 },
                    Err(msg) => return ExecutionResult::err(msg),
                }
            }
            OpCode::JumpIfBinaryIntConstRightTrue => {
                let op = opcode::decode_binary(instr.c);
                let l = slots[instr.a as usize].clone();
                let r = Value::from_const(&function.constants[instr.b as usize]);
                match eval_binary(op, &l, &r) {
                    Ok(v) => pc = if v.truthy() { instr.d as usize } else { pc + 1 },
                    Err(msg) => return ExecutionResult::err(msg),
                }
            }
            OpCode::Cast => {
                let ty = opcode::decode_ir_type(instr.c);
                slots[instr.a as usize] = eval_cast(ty, &slots[instr.b as usize]);
                pc += 1;
            }
            OpCode::Jump => pc = instr.a as usize,
            OpCode::JumpIfTrue => pc = if slots[instr.a as usize].truthy() { instr.b as usize } else { pc + 1 },
            OpCode::JumpIfFalse => pc = if !slots[instr.a as usize].truthy() { instr.b as usize } else { pc + 1 },
            OpCode::Return => {
                let v = if instr.a < 0 { Value::Unit } else { slots[instr.a as usize].clone() };
                return ExecutionResult::ok(v);
            }
        }
    }
}

fn eval_unary(op: UnaryOp, v: &Value) -> Value {
    match (op, v) {
        (UnaryOp::Plus, Value::Int(i)) => Value::Int(*i),
        (UnaryOp::Plus, Value::Float(f)) => Value::Float(*f),
        (UnaryOp::Neg, Value::Int(i)) => Value::Int(i.wrapping_neg()),
        (UnaryOp::Neg, Value::Float(f)) => Value::Float(-f),
        (UnaryOp::Not, Value::Bool(b)) => Value::Bool(!b),
        (UnaryOp::BitNot, Value::Int(i)) => Value::Int(!i),
        (UnaryOp::BitNot, Value::Char(c)) => Value::Int(!(*c as i64)),
        _ => Value::Unit,
    }
}

fn as_int(v: &Value) -> Option<i64> {
    match v {
        Value::Int(i) => Some(*i),
        Value::Char(c) => Some(*c as i64),
        _ => None,
    }
}

fn as_float(v: &Value) -> Option<f64> {
    match v {
        Value::Float(f) => Some(*f),
        Value::Int(i) => Some(*i as f64),
        Value::Char(c) => Some(*c as u32 as f64),
        _ => None,
    }
}

fn display_value(v: &Value) -> String {
    match v {
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Char(c) => c.to_string(),
        Value::Str(s) => s.as_str().to_string(),
        Value::Unit => String::new(),
    }
}

/// Integer arithmetic is two's-complement 64-bit, wrapping on overflow;
/// shift amounts mask to the low 6 bits (`spec.md` §4.8). Division and
/// modulo by a zero constant fail the execution rather than panicking.
fn eval_binary(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, String> {
    use BinaryOp::*;
    if matches!(op, Add) && (matches!(l, Value::Str(_)) || matches!(r, Value::Str(_))) {
        return Ok(Value::Str(std::rc::Rc::new(format!("{}{}", display_value(l), display_value(r)))));
    }
    if let (Value::Bool(a), Value::Bool(b)) = (l, r) {
        return Ok(match op {
            And => Value::Bool(*a && *b),
            Or => Value::Bool(*a || *b),
            BitNand => Value::Bool(!(*a && *b)),
            BitNor => Value::Bool(!(*a || *b)),
            Eq => Value::Bool(a == b),
            NotEq => Value::Bool(a != b),
            _ => return Err(format!("unsupported operator {op:?} on bool operands")),
        });
    }
    if let (Some(a), Some(b)) = (as_int(l), as_int(r)) {
        return Ok(match op {
            Add => Value::Int(a.wrapping_add(b)),
            Sub => Value::Int(a.wrapping_sub(b)),
            Mul => Value::Int(a.wrapping_mul(b)),
            Div | IntDiv if b == 0 => return Err("division by zero".to_string()),
            Mod if b == 0 => return Err("modulo by zero".to_string()),
            Div | IntDiv => Value::Int(a.wrapping_div(b)),
            Mod => Value::Int(a.wrapping_rem(b)),
            Shl => Value::Int(a.wrapping_shl((b & 63) as u32)),
            Shr => Value::Int(a.wrapping_shr((b & 63) as u32)),
            UShl => Value::Int(((a as u64).wrapping_shl((b & 63) as u32)) as i64),
            UShr => Value::Int(((a as u64).wrapping_shr((b & 63) as u32)) as i64),
            BitAnd => Value::Int(a & b),
            BitOr => Value::Int(a | b),
            Xor => Value::Int(a ^ b),
            XorAnd => Value::Int(!(a ^ b)),
            Lt => Value::Bool(a < b),
            LtEq => Value::Bool(a <= b),
            Gt => Value::Bool(a > b),
            GtEq => Value::Bool(a >= b),
            Eq => Value::Bool(a == b),
            NotEq => Value::Bool(a != b),
            And | Or | BitNand | BitNor => return Err(format!("operator {op:?} requires bool operands")),
        });
    }
    if let (Some(a), Some(b)) = (as_float(l), as_float(r)) {
        return Ok(match op {
            Add => Value::Float(a + b),
            Sub => Value::Float(a - b),
            Mul => Value::Float(a * b),
            Div => Value::Float(a / b),
            Lt => Value::Bool(a < b),
            LtEq => Value::Bool(a <= b),
            Gt => Value::Bool(a > b),
            GtEq => Value::Bool(a >= b),
            Eq => Value::Bool(a == b),
            NotEq => Value::Bool(a != b),
            _ => return Err(format!("unsupported operator {op:?} on float operands")),
        });
    }
    match (op, l, r) {
        (Eq, Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a == b)),
        (NotEq, Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a != b)),
        _ => Err(format!("unsupported operand combination for {op:?}")),
    }
}

fn eval_cast(ty: IrType, v: &Value) -> Value {
    match (ty, v) {
        (IrType::Int, Value::Int(i)) => Value::Int(*i),
        (IrType::Int, Value::Char(c)) => Value::Int(*c as i64),
        (IrType::Int, Value::Float(f)) => Value::Int(*f as i64),
        (IrType::Float, Value::Float(f)) => Value::Float(*f),
        (IrType::Float, Value::Int(i)) => Value::Float(*i as f64),
        (IrType::Float, Value::Char(c)) => Value::Float(*c as u32 as f64),
        (IrType::Char, Value::Int(i)) => Value::Char(char::from_u32(*i as u32).unwrap_or('\0')),
        (IrType::Char, Value::Char(c)) => Value::Char(*c),
        (IrType::Bool, Value::Bool(b)) => Value::Bool(*b),
        _ => v.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode;
    use crate::checker;
    use crate::diagnostics::Diagnostics;
    use crate::ir;
    use crate::optimize::optimize;
    use crate::parser::parse_source;

    fn run(source: &str) -> ExecutionResult {
        let mut diagnostics = Diagnostics::default();
        let (unit, mut interner) = parse_source(source, &mut diagnostics);
        let output = checker::check(&unit, &interner, &mut diagnostics);
        assert!(!diagnostics.has_errors(), "{diagnostics:?}");
        let mut module = ir::lower(&unit, &mut interner, &output.expr_types);
        optimize(&mut module);
        let program = bytecode::generate(&module);
        execute(&program, program.main())
    }

    #[test]
    fn s1_simple_return() {
        let result = run("flux x = 2; return x + 3;\n");
        assert_eq!(result, ExecutionResult::ok(Value::Int(5)));
    }

    #[test]
    fn s2_summation_loop() {
        let result = run("flux sum = 0;\nflux i = 10;\nloop i > 0 => { sum += i; i -= 1; }\nreturn sum;\n");
        assert_eq!(result, ExecutionResult::ok(Value::Int(55)));
    }

    #[test]
    fn s3_explicit_narrowing_cast() {
        let result = run("float f = 3.9;\nint i = (int)f;\nreturn i;\n");
        assert_eq!(result, ExecutionResult::ok(Value::Int(3)));
    }

    #[test]
    fn division_by_zero_fails_execution() {
        let result = run("flux x = 1;\nflux y = 0;\nreturn x / y;\n");
        assert!(!result.success);
        assert!(!result.error_message.is_empty());
    }
}
