//! Bytecode to C transpiler (`spec.md` §4.9).
//!
//! Every slot is emitted as a single `int64_t` local: `bool` and `char`
//! values already collapse to their integer representation in the VM
//! (`spec.md` §4.8), so the native kernel path supports exactly the integer
//! subset of the language — the benchmark kernels in `spec.md` §8 (S2, S5,
//! S6) are all pure integer loops. A function touching `float` or `string`
//! is rejected before emission rather than emitted incorrectly.

use crate::bytecode::opcode::{self, OpCode};
use crate::bytecode::program::BytecodeFunction;
use crate::ir::value::{BinaryOp, IrConst, IrType, UnaryOp};

pub fn emit(function: &BytecodeFunction) -> Result<String, String> {
    reject_unsupported(function)?;

    let mut body = String::new();
    for (pc, instr) in function.instrs.iter().enumerate() {
        body.push_str(&format!("L{pc}:\n"));
        let is_terminator = matches!(instr.op, OpCode::Jump | OpCode::JumpIfTrue | OpCode::JumpIfFalse | OpCode::JumpIfBinaryIntTrue | OpCode::JumpIfBinaryIntConstRightTrue | OpCode::Return);
        body.push_str(&emit_instr(instr, function, pc));
        if !is_terminator {
            body.push_str(&format!("    goto L{};\n", pc + 1));
        }
    }
    body.push_str(&format!("L{}:\n    return 0;\n", function.instrs.len()));

    let locals = (0..function.slot_count).map(|i| format!("s{i}")).collect::<Vec<_>>().join(" = 0, ");
    let locals_decl = if function.slot_count > 0 { format!("int64_t {locals} = 0;\n") } else { String::new() };
    let header = HEADER;
    let main = MAIN;

    Ok(format!("{header}\nstatic int64_t run_once(void) {{\n{locals_decl}{body}}}\n\n{main}\n"))
}

fn reject_unsupported(function: &BytecodeFunction) -> Result<(), String> {
    if function.constants.iter().any(|c| matches!(c, IrConst::Float(_) | IrConst::Str(_))) {
        return Err("native transpiler only supports integer-kernel functions".to_string());
    }
    for instr in &function.instrs {
        if matches!(instr.op, OpCode::Cast) && matches!(opcode::decode_ir_type(instr.c), IrType::Float | IrType::String) {
            return Err("native transpiler only supports integer-kernel functions".to_string());
        }
    }
    Ok(())
}

fn emit_instr(instr: &crate::bytecode::opcode::Instruction, function: &BytecodeFunction, pc: usize) -> String {
    match instr.op {
        OpCode::Nop => String::new(),
        OpCode::LoadConst => format!("    s{} = {}LL;\n", instr.a, const_as_i64(&function.constants[instr.b as usize])),
        OpCode::Move => format!("    s{} = s{};\n", instr.a, instr.b),
        OpCode::Unary => format!("    s{} = {};\n", instr.a, unary_expr(opcode::decode_unary(instr.b), format!("s{}", instr.c))),
        OpCode::Binary | OpCode::BinaryInt => {
            format!("    s{} = {};\n", instr.a, binary_expr(opcode::decode_binary(instr.b), format!("s{}", instr.c), format!("s{}", instr.d)))
        }
        OpCode::BinaryIntConstRight => {
            let rhs = format!("{}LL", const_as_i64(&function.constants[instr.d as usize]));
            format!("    s{} = {};\n", instr.a, binary_expr(opcode::decode_binary(instr.b), format!("s{}", instr.c), rhs))
        }
        OpCode::JumpIfBinaryIntTrue => {
            let cond = binary_expr(opcode::decode_binary(instr.c), format!("s{}", instr.a), format!("s{}", instr.b));
            format!("    if ({cond}) goto L{};\n    goto L{};\n", instr.d, pc + 1)
        }
        OpCode::JumpIfBinaryIntConstRightTrue => {
            let rhs = format!("{}LL", const_as_i64(&function.constants[instr.b as usize]));
            let cond = binary_expr(opcode::decode_binary(instr.c), format!("s{}", instr.a), rhs);
            format!("    if ({cond}) goto L{};\n    goto L{};\n", instr.d, pc + 1)
        }
        OpCode::Cast => format!("    s{} = s{};\n", instr.a, instr.b),
        OpCode::Jump => format!("    goto L{};\n", instr.a),
        OpCode::JumpIfTrue => format!("    if (s{}) goto L{};\n    goto L{};\n", instr.a, instr.b, pc + 1),
        OpCode::JumpIfFalse => format!("    if (!s{}) goto L{};\n    goto L{};\n", instr.a, instr.b, pc + 1),
        OpCode::Return => {
            if instr.a < 0 {
                "    return 0;\n".to_string()
            } else {
                format!("    return s{};\n", instr.a)
            }
        }
    }
}

fn const_as_i64(c: &IrConst) -> i64 {
    match c {
        IrConst::Int(i) => *i,
        IrConst::Bool(b) => *b as i64,
        IrConst::Char(c) => *c as i64,
        IrConst::Float(_) | IrConst::Str(_) => unreachable!("rejected before emission"),
    }
}

fn unary_expr(op: UnaryOp, src: String) -> String {
    match op {
        UnaryOp::Plus => src,
        UnaryOp::Neg => format!("-{src}"),
        UnaryOp::Not => format!("!{src}"),
        UnaryOp::BitNot => format!("~{src}"),
    }
}

fn binary_expr(op: BinaryOp, l: String, r: String) -> String {
    use BinaryOp::*;
    match op {
        Add => format!("({l} + {r})"),
        Sub => format!("({l} - {r})"),
        Mul => format!("({l} * {r})"),
        Div | IntDiv => format!("({l} / {r})"),
        Mod => format!("({l} % {r})"),
        Shl => format!("({l} << ({r} & 63))"),
        Shr => format!("({l} >> ({r} & 63))"),
        UShl => format!("(int64_t)((uint64_t){l} << ({r} & 63))"),
        UShr => format!("(int64_t)((uint64_t){l} >> ({r} & 63))"),
        BitAnd => format!("({l} & {r})"),
        BitOr => format!("({l} | {r})"),
        Xor => format!("({l} ^ {r})"),
        XorAnd => format!("(~({l} ^ {r}))"),
        Lt => format!("({l} < {r})"),
        LtEq => format!("({l} <= {r})"),
        Gt => format!("({l} > {r})"),
        GtEq => format!("({l} >= {r})"),
        Eq => format!("({l} == {r})"),
        NotEq => format!("({l} != {r})"),
        And => format!("({l} && {r})"),
        Or => format!("({l} || {r})"),
        BitNand => format!("(!({l} && {r}))"),
        BitNor => format!("(!({l} || {r}))"),
    }
}

const HEADER: &str = r#"#include <stdint.h>
#include <stdio.h>
#include <stdlib.h>
#include <string.h>
#include <time.h>
"#;

/// `--raw` prints the single return value; iterations mode prints a CSV
/// line `iterations,total_ms,mean_ms,checksum` using the same running
/// checksum (`mix`/`rotl13`) the tiered runner uses on the VM side
/// (`spec.md` §4.9), so a caller can compare the two without re-deriving it.
const MAIN: &str = r#"static uint64_t rotl13(uint64_t x) {
    return (x << 13) | (x >> (64 - 13));
}

static uint64_t mix(uint64_t checksum, uint64_t value, uint64_t i) {
    uint64_t c = checksum ^ (value + 0x9e3779b97f4a7c15ULL + (i << 6) + (i >> 2));
    return rotl13(c);
}

static double now_ms(void) {
    struct timespec ts;
    clock_gettime(CLOCK_MONOTONIC, &ts);
    return (double)ts.tv_sec * 1000.0 + (double)ts.tv_nsec / 1e6;
}

int main(int argc, char **argv) {
    if (argc >= 2 && strcmp(argv[1], "--raw") == 0) {
        int64_t v = run_once();
        printf("%lld\n", (long long)v);
        return 0;
    }
    uint64_t iterations = argc >= 2 ? strtoull(argv[1], NULL, 10) : 1;
    double start = now_ms();
    uint64_t checksum = 0;
    for (uint64_t i = 0; i < iterations; i++) {
        int64_t v = run_once();
        checksum = mix(checksum, (uint64_t)v, i);
    }
    double total = now_ms() - start;
    double mean = iterations > 0 ? total / (double)iterations : 0.0;
    printf("%llu,%.3f,%.6f,%llu\n", (unsigned long long)iterations, total, mean, (unsigned long long)checksum);
    return 0;
}
"#;
