//! Register-based bytecode: instruction set, program data model, and the
//! IR-to-bytecode generator (`spec.md` §3, §4.7).

pub mod codegen;
pub mod disasm;
pub mod opcode;
pub mod program;

pub use disasm::disassemble;
pub use opcode::{Instruction, OpCode};
pub use program::{BytecodeFunction, BytecodeProgram};

use crate::ir::function::Module;

pub fn generate(module: &Module) -> BytecodeProgram {
    codegen::generate(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker;
    use crate::diagnostics::Diagnostics;
    use crate::ir;
    use crate::optimize::optimize;
    use crate::parser::parse_source;

    fn compile(source: &str) -> BytecodeProgram {
        let mut diagnostics = Diagnostics::default();
        let (unit, mut interner) = parse_source(source, &mut diagnostics);
        let output = checker::check(&unit, &interner, &mut diagnostics);
        assert!(!diagnostics.has_errors(), "{diagnostics:?}");
        let mut module = ir::lower(&unit, &mut interner, &output.expr_types);
        optimize(&mut module);
        generate(&module)
    }

    #[test]
    fn slot_count_is_dense_and_program_ends_in_return() {
        let program = compile("flux x = 2; return x + 3;\n");
        let main = program.main();
        assert!(main.slot_count > 0);
        assert!(matches!(main.instrs.last().unwrap().op, OpCode::Return));
    }

    #[test]
    fn loop_condition_lowers_to_a_fused_or_plain_conditional_jump() {
        let program = compile("flux sum = 0;\nflux i = 10;\nloop i > 0 => { sum += i; i -= 1; }\nreturn sum;\n");
        let main = program.main();
        assert!(main.instrs.iter().any(|i| matches!(i.op, OpCode::JumpIfBinaryIntTrue | OpCode::JumpIfBinaryIntConstRightTrue | OpCode::JumpIfTrue)));
    }
}
