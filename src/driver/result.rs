//! The driver's compilation artifact (`spec.md` §3 `CompilationResult`).

use crate::bytecode::BytecodeProgram;
use crate::diagnostics::Diagnostics;
use crate::ir::Module as IrModule;
use crate::parser::ast::CompilationUnit;
use crate::parser::interner::Interner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Bytecode,
    Mlir,
}

#[derive(Clone)]
pub struct CompilationResult {
    pub ast: CompilationUnit,
    pub interner: Interner,
    pub diagnostics: Diagnostics,
    pub ir: IrModule,
    pub bytecode: BytecodeProgram,
    /// Present only for `Target::Mlir`; both targets emit identical bytecode
    /// (`spec.md` §6), the dump is purely informational.
    pub mlir_dump: Option<String>,
    pub success: bool,
}

impl std::fmt::Debug for CompilationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilationResult")
            .field("diagnostics", &self.diagnostics)
            .field("success", &self.success)
            .field("mlir_dump_present", &self.mlir_dump.is_some())
            .finish()
    }
}
