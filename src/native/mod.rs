//! Native transpiler, compiler invocation, and tiered execution (`spec.md` §4.9).

pub mod compiler;
pub mod tiered;
pub mod transpiler;

pub use compiler::{locate, NativeCompiler, NativeHandle, NativeIterationResult};
pub use tiered::{run as run_tiered, TieredResult};
