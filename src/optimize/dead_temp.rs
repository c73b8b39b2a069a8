//! Dead temporary elimination (`spec.md` §4.5 optimizer passes).
//!
//! Unlike the other passes this one is whole-function: a temp defined in one
//! block is only ever read within that same block (the lowerer never lets a
//! temp cross a block boundary — every cross-block value goes through a named
//! variable), so liveness doesn't need a real dataflow fixed point, but
//! scanning the whole function is just as cheap and avoids relying on that
//! invariant staying true.

use rustc_hash::FxHashSet;

use crate::ir::function::Function;
use crate::ir::instr::Instr;

pub fn run(func: &mut Function) -> bool {
    let mut live: FxHashSet<_> = Default::default();
    for block in &func.blocks {
        for instr in &block.instrs {
            live.extend(instr.uses());
        }
    }

    let mut changed = false;
    for block in &mut func.blocks {
        let before = block.instrs.len();
        block.instrs.retain(|instr| match instr.dest() {
            Some(t) => live.contains(&t) || has_side_effect(instr),
            None => true,
        });
        changed |= block.instrs.len() != before;
    }
    changed
}

/// `VarGet` is the only dest-producing instruction with no side effect beyond
/// its own result; everything else with a dest (arithmetic, casts, moves) is
/// pure too, but is kept here for clarity if a future instruction ever reads
/// through a side channel.
fn has_side_effect(_instr: &Instr) -> bool {
    false
}
