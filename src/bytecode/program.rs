//! Bytecode program data model (`spec.md` §3).

use crate::ir::value::IrConst;

use super::opcode::Instruction;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BytecodeFunction {
    pub name: String,
    pub slot_count: i32,
    pub constants: Vec<IrConst>,
    pub instrs: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct BytecodeProgram {
    pub functions: Vec<BytecodeFunction>,
}

impl BytecodeProgram {
    pub fn main(&self) -> &BytecodeFunction {
        self.functions.iter().find(|f| f.name == "main").expect("every compiled program has a main function")
    }

    /// Serializes to the JSON form used for on-disk golden fixtures in tests.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("bytecode programs contain no non-serializable data")
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// A CRC32 fingerprint over every function's instruction stream, slot
    /// count, and constant table. Used by callers (the driver's diagnostics,
    /// cache inspection tooling) to tell two compiled programs apart without
    /// a full structural comparison.
    pub fn checksum(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        for func in &self.functions {
            hasher.update(func.name.as_bytes());
            hasher.update(&func.slot_count.to_le_bytes());
            for constant in &func.constants {
                hasher.update(format!("{constant:?}").as_bytes());
            }
            for instr in &func.instrs {
                hasher.update(&(instr.op as i32).to_le_bytes());
                hasher.update(&instr.a.to_le_bytes());
                hasher.update(&instr.b.to_le_bytes());
                hasher.update(&instr.c.to_le_bytes());
                hasher.update(&instr.d.to_le_bytes());
            }
        }
        hasher.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::opcode::OpCode;

    #[test]
    fn json_round_trip_preserves_the_program() {
        let program = BytecodeProgram {
            functions: vec![BytecodeFunction {
                name: "main".to_string(),
                slot_count: 2,
                constants: vec![IrConst::Int(7), IrConst::Str("x".to_string())],
                instrs: vec![Instruction::new(OpCode::LoadConst, 0, 0, 0, 0), Instruction::new(OpCode::Return, 0, 0, 0, 0)],
            }],
        };
        let json = program.to_json();
        let restored = BytecodeProgram::from_json(&json).expect("round trip should parse");
        assert_eq!(program, restored);
    }
}
