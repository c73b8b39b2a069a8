//! Dead store elimination (`spec.md` §4.5 optimizer passes).
//!
//! Removes a `VarSet` that is immediately overwritten by another `VarSet` to
//! the same variable later in the same block with no intervening `VarGet` of
//! that variable — the earlier store's value is never observed. Like the
//! other local passes this only looks within one block: a variable read at
//! the top of a successor block might still observe a store made here.

use rustc_hash::FxHashMap;

use crate::ir::function::Function;
use crate::ir::instr::Instr;
use crate::ir::value::VarSlot;

pub fn run(func: &mut Function) -> bool {
    let mut changed = false;
    for block in &mut func.blocks {
        let mut last_store: FxHashMap<VarSlot, usize> = FxHashMap::default();
        let mut dead = vec![false; block.instrs.len()];
        for (i, instr) in block.instrs.iter().enumerate() {
            match instr {
                Instr::VarGet { var, .. } => {
                    last_store.remove(var);
                }
                Instr::VarSet { var, .. } => {
                    if let Some(&prev) = last_store.get(var) {
                        dead[prev] = true;
                    }
                    last_store.insert(*var, i);
                }
                _ => {}
            }
        }
        if dead.iter().any(|&d| d) {
            let mut i = 0;
            block.instrs.retain(|_| {
                let keep = !dead[i];
                i += 1;
                keep
            });
            changed = true;
        }
    }
    changed
}
