//! Human-readable bytecode disassembly, for the thin CLI's `--dump-bytecode`
//! and for debugging optimizer/codegen output by eye.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use super::opcode::OpCode;
use super::program::BytecodeProgram;

struct OpMeta {
    name: &'static str,
}

static OPCODE_NAMES: Lazy<FxHashMap<OpCode, OpMeta>> = Lazy::new(|| {
    use OpCode::*;
    [
        (Nop, "nop"),
        (LoadConst, "load_const"),
        (Move, "move"),
        (Unary, "unary"),
        (Binary, "binary"),
        (BinaryInt, "binary_int"),
        (BinaryIntConstRight, "binary_int_const_right"),
        (JumpIfBinaryIntTrue, "jump_if_binary_int_true"),
        (JumpIfBinaryIntConstRightTrue, "jump_if_binary_int_const_right_true"),
        (Cast, "cast"),
        (Jump, "jump"),
        (JumpIfTrue, "jump_if_true"),
        (JumpIfFalse, "jump_if_false"),
        (Return, "return"),
    ]
    .into_iter()
    .map(|(op, name)| (op, OpMeta { name }))
    .collect()
});

pub fn disassemble(program: &BytecodeProgram) -> String {
    let mut out = String::new();
    for func in &program.functions {
        out.push_str(&format!("function {} (slots={}, constants={})\n", func.name, func.slot_count, func.constants.len()));
        for (pc, instr) in func.instrs.iter().enumerate() {
            let name = OPCODE_NAMES.get(&instr.op).map(|m| m.name).unwrap_or("?");
            out.push_str(&format!("  {pc:4}: {name:<34} a={} b={} c={} d={}\n", instr.a, instr.b, instr.c, instr.d));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::generate;
    use crate::checker;
    use crate::diagnostics::Diagnostics;
    use crate::ir;
    use crate::parser::parse_source;

    #[test]
    fn disassembly_names_every_opcode_it_emits() {
        let mut diagnostics = Diagnostics::default();
        let (unit, mut interner) = parse_source("flux x = 1;\nreturn x + 2;\n", &mut diagnostics);
        let output = checker::check(&unit, &interner, &mut diagnostics);
        let module = ir::lower(&unit, &mut interner, &output.expr_types);
        let program = generate(&module);
        let text = disassemble(&program);
        assert!(text.contains("function main"));
        assert!(!text.contains(": ?  "));
    }
}
