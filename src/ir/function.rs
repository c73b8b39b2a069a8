//! IR functions and modules (`spec.md` §4.5).
//!
//! Ember's grammar has no function declarations or calls (`spec.md` §3/§4.2):
//! a whole compiled program lowers to exactly one function, conventionally
//! named `main`. `Module` stays a `Vec<Function>` rather than a single field
//! so the rest of the pipeline (optimizer, codegen) never special-cases the
//! one-function-per-program fact.

use super::block::{BasicBlock, BlockId};

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub blocks: Vec<BasicBlock>,
    pub entry: BlockId,
}

impl Function {
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        self.blocks.iter().find(|b| b.id == id).expect("dangling BlockId")
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        self.blocks.iter_mut().find(|b| b.id == id).expect("dangling BlockId")
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub functions: Vec<Function>,
}

impl Module {
    pub fn main(&self) -> &Function {
        self.functions.iter().find(|f| f.name == "main").expect("every lowered module has a main function")
    }
}
