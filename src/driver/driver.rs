//! Compilation driver (`spec.md` §4.10): lex -> parse -> typecheck ->
//! ownership -> lower -> optimize -> generate, gated by a FIFO cache.

use std::rc::Rc;

use crate::bytecode;
use crate::checker;
use crate::diagnostics::Diagnostics;
use crate::ir;
use crate::optimize::optimize;
use crate::parser::parse_source;

use super::cache::Cache;
use super::result::{CompilationResult, Target};

/// `spec.md` §4.10's default cache capacity.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

pub struct CompilerDriver {
    cache: Cache,
}

impl Default for CompilerDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerDriver {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { cache: Cache::new(capacity) }
    }

    /// Runs the whole pipeline even when earlier phases produced errors, so
    /// later phases can surface more diagnostics; `success` reflects whether
    /// any diagnostic was error-severity (`spec.md` §2, §7).
    pub fn compile(&mut self, source: &str, target: Target) -> Rc<CompilationResult> {
        if let Some(hit) = self.cache.get(target, source) {
            log::trace!("cache hit for {target:?} ({} bytes)", source.len());
            return hit;
        }
        log::debug!("cache miss for {target:?}, running full pipeline");
        let result = Rc::new(compile_uncached(source, target));
        log::trace!("compiled program checksum = {:#010x}", result.bytecode.checksum());
        self.cache.insert(target, source.to_string(), result.clone());
        result
    }

    pub fn print_ast(&self, source: &str) -> String {
        let mut diagnostics = Diagnostics::new();
        let (ast, _interner) = parse_source(source, &mut diagnostics);
        format!("{ast:#?}")
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache.hits()
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache.misses()
    }
}

fn compile_uncached(source: &str, target: Target) -> CompilationResult {
    let mut diagnostics = Diagnostics::new();
    log::trace!("phase: parse");
    let (ast, mut interner) = parse_source(source, &mut diagnostics);
    log::trace!("phase: check");
    let output = checker::check(&ast, &interner, &mut diagnostics);
    log::trace!("phase: lower");
    let mut module = ir::lower(&ast, &mut interner, &output.expr_types);
    log::trace!("phase: optimize");
    optimize(&mut module);
    log::trace!("phase: generate");
    let bytecode = bytecode::generate(&module);
    let mlir_dump = matches!(target, Target::Mlir).then(|| ir::pretty::print_module(&module, &interner));
    let success = !diagnostics.has_errors();
    log::debug!("pipeline finished, success = {success}, {} diagnostics", diagnostics.iter().count());

    CompilationResult { ast, interner, diagnostics, ir: module, bytecode, mlir_dump, success }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_hit_returns_the_same_object_and_does_not_advance_misses() {
        let mut driver = CompilerDriver::new();
        let a = driver.compile("flux x = 1; return x;\n", Target::Bytecode);
        assert_eq!(driver.cache_misses(), 1);
        let b = driver.compile("flux x = 1; return x;\n", Target::Bytecode);
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(driver.cache_misses(), 1);
        assert_eq!(driver.cache_hits(), 1);
    }

    #[test]
    fn fifo_eviction_drops_the_oldest_entry_at_capacity() {
        let mut driver = CompilerDriver::with_capacity(1);
        driver.compile("return 1;\n", Target::Bytecode);
        driver.compile("return 2;\n", Target::Bytecode);
        driver.compile("return 1;\n", Target::Bytecode);
        assert_eq!(driver.cache_misses(), 3);
    }

    #[test]
    fn type_error_surfaces_as_unsuccessful_compile() {
        let mut driver = CompilerDriver::new();
        let result = driver.compile("float f = 1.2;\nint i = f;\n", Target::Bytecode);
        assert!(!result.success);
        assert!(result.diagnostics.iter().any(|d| d.category == crate::diagnostics::Category::Type));
    }

    #[test]
    fn bytecode_and_mlir_targets_produce_equal_bytecode() {
        let mut driver = CompilerDriver::new();
        let source = "flux n = 250;\nflux i = 1;\nflux acc = 0;\nloop i <= n => { if (i % 3) == 0 => { acc += i*2; } -> { acc += i; } i += 1; }\nreturn acc;\n";
        let bc = driver.compile(source, Target::Bytecode);
        let mlir = driver.compile(source, Target::Mlir);
        assert_eq!(bc.bytecode, mlir.bytecode);
        assert!(mlir.mlir_dump.is_some());
        assert!(bc.mlir_dump.is_none());
    }
}
