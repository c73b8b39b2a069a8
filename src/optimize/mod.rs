//! IR-level optimizer (`spec.md` §4.5): a fixed small set of local passes
//! run to a fixed point (or a bounded number of rounds, whichever comes
//! first — a pathological program could otherwise alternate between two
//! pass outputs forever).

pub mod constant_fold;
pub mod copy_prop;
pub mod dead_store;
pub mod dead_temp;

use crate::ir::function::Module;

/// Above this many rounds we stop re-running passes even if the last round
/// still reported a change, trading a theoretically-missed fold for a
/// guaranteed-terminating compile.
const MAX_ROUNDS: usize = 4;

pub fn optimize(module: &mut Module) {
    for func in &mut module.functions {
        for round in 0..MAX_ROUNDS {
            let mut changed = false;
            changed |= constant_fold::run(func);
            changed |= copy_prop::run(func);
            changed |= dead_store::run(func);
            changed |= dead_temp::run(func);
            log::trace!("optimize {}: round {round} changed = {changed}", func.name);
            if !changed {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker;
    use crate::diagnostics::Diagnostics;
    use crate::ir;
    use crate::parser::parse_source;

    fn optimized(source: &str) -> Module {
        let mut diagnostics = Diagnostics::default();
        let (unit, mut interner) = parse_source(source, &mut diagnostics);
        let output = checker::check(&unit, &interner, &mut diagnostics);
        assert!(!diagnostics.has_errors(), "{diagnostics:?}");
        let mut module = ir::lower(&unit, &mut interner, &output.expr_types);
        optimize(&mut module);
        module
    }

    #[test]
    fn folds_constant_arithmetic_into_a_single_load() {
        let module = optimized("x: int = 1 + 2 * 3;\n");
        let main = module.main();
        let loads: Vec<_> = main
            .blocks
            .iter()
            .flat_map(|b| &b.instrs)
            .filter(|i| matches!(i, crate::ir::Instr::LoadConst { value: crate::ir::IrConst::Int(7), .. }))
            .collect();
        assert_eq!(loads.len(), 1);
    }

    #[test]
    fn removes_dead_store_with_no_intervening_read() {
        let module = optimized("flux x: int = 1;\nx = 2;\nx = 3;\n");
        let main = module.main();
        let sets: Vec<_> = main.blocks.iter().flat_map(|b| &b.instrs).filter(|i| matches!(i, crate::ir::Instr::VarSet { .. })).collect();
        assert_eq!(sets.len(), 1);
    }
}
