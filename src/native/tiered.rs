//! Tiered VM to native promotion (`spec.md` §4.9).

use crate::bytecode::program::BytecodeProgram;
use crate::vm;

use super::compiler;
use super::transpiler;

/// VM iterations run before attempting to promote to native, chosen so low
/// iteration counts never pay compile overhead (`spec.md` §9) — not a
/// contract, just a default.
pub const VM_WARMUP_ITERATIONS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TieredResult {
    pub iterations: u64,
    pub checksum: u64,
    pub used_native: bool,
}

/// Running checksum folded across iterations: `mix(c, v, i) =
/// rotl13(c ^ (v + 0x9e3779b97f4a7c15 + (i << 6) + (i >> 2)))` (`spec.md` §4.9).
pub fn mix(checksum: u64, value: u64, i: u64) -> u64 {
    let c = checksum ^ (value.wrapping_add(0x9e3779b97f4a7c15).wrapping_add(i << 6).wrapping_add(i >> 2));
    c.rotate_left(13)
}

pub fn run(program: &BytecodeProgram, iterations: u64) -> Result<TieredResult, String> {
    let function = program.main();
    let vm_iters = iterations.min(VM_WARMUP_ITERATIONS);
    let mut checksum = 0u64;

    for i in 0..vm_iters {
        let result = vm::execute(program, function);
        if !result.success {
            return Err(result.error_message);
        }
        checksum = mix(checksum, result.return_value.as_checksum_word(), i);
    }

    let remaining = iterations - vm_iters;
    if remaining == 0 {
        return Ok(TieredResult { iterations, checksum, used_native: false });
    }

    let Some(native) = compiler::locate() else {
        log::debug!("no native compiler found, staying on the VM for the remaining {remaining} iterations");
        for i in vm_iters..iterations {
            let result = vm::execute(program, function);
            if !result.success {
                return Err(result.error_message);
            }
            checksum = mix(checksum, result.return_value.as_checksum_word(), i);
        }
        return Ok(TieredResult { iterations, checksum, used_native: false });
    };

    log::debug!("promoting {} to native after {vm_iters} warmup iterations", function.name);
    let c_source = transpiler::emit(function)?;
    let handle = native.compile(&c_source)?;
    for i in vm_iters..iterations {
        let value = handle.execute_once()?;
        checksum = mix(checksum, value as u64, i);
    }
    Ok(TieredResult { iterations, checksum, used_native: true })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_is_deterministic() {
        let a = mix(0, 5, 0);
        let b = mix(0, 5, 0);
        assert_eq!(a, b);
    }
}
