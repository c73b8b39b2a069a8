//! Three-address IR over labeled basic blocks (`spec.md` §4.5).

pub mod block;
pub mod function;
pub mod instr;
pub mod lower;
pub mod pretty;
pub mod value;

pub use block::{BasicBlock, BlockId};
pub use function::{Function, Module};
pub use instr::Instr;
pub use lower::IrLowerer;
pub use value::{IrConst, IrType, IrValue, Temp, VarSlot};

use crate::checker::ExprTypes;
use crate::parser::ast::CompilationUnit;
use crate::parser::interner::Interner;

pub fn lower(unit: &CompilationUnit, interner: &mut Interner, expr_types: &ExprTypes) -> Module {
    IrLowerer::lower_program(unit, interner, expr_types)
}
