//! Compilation driver, cache, and result types (`spec.md` §4.10).

pub mod cache;
pub mod driver;
pub mod result;

pub use driver::CompilerDriver;
pub use result::{CompilationResult, Target};
