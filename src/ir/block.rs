//! Labeled basic blocks (`spec.md` §4.5).

use super::instr::Instr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub id: BlockId,
    pub instrs: Vec<Instr>,
}

impl BasicBlock {
    pub fn new(id: BlockId) -> Self {
        Self { id, instrs: Vec::new() }
    }

    /// The block's terminator, if one has been emitted yet. A block under
    /// construction may be briefly empty or missing one; every block in a
    /// finished `Function` has exactly one, as its last instruction.
    pub fn terminator(&self) -> Option<&Instr> {
        self.instrs.last().filter(|i| i.is_terminator())
    }
}
