//! Structured internal error types for the checker and ownership analyzer.
//!
//! Grounded on the teacher's `parser/checker/error.rs`: these never escape as
//! a `Result` the driver has to unwrap — each variant is converted to one
//! line in the shared `Diagnostics` bag at the point it's raised.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CheckError {
    #[error("unknown type '{name}'")]
    UnknownType { name: String },

    #[error("type '{name}' expects {expected} generic argument(s), got {actual}")]
    ArityMismatch { name: String, expected: usize, actual: usize },

    #[error("generic type '{name}' must be used with type arguments here")]
    OpenGeneric { name: String },

    #[error("duplicate field '{name}' in '{owner}'")]
    DuplicateField { owner: String, name: String },

    #[error("duplicate variant '{name}' in '{owner}'")]
    DuplicateVariant { owner: String, name: String },

    #[error("duplicate declaration of '{name}'")]
    DuplicateDecl { name: String },

    #[error("undefined name '{name}'")]
    UndefinedName { name: String },

    #[error("cannot convert '{from}' to '{to}'")]
    InvalidConversion { from: String, to: String },

    #[error("invalid operand type for operator '{op}': {detail}")]
    InvalidOperand { op: &'static str, detail: String },

    #[error("cannot assign to immutable variable '{name}'")]
    AssignImmutable { name: String },

    #[error("'{keyword}' is only valid inside a loop")]
    OutsideLoop { keyword: &'static str },

    #[error("counted paralloop bodies cannot contain '{keyword}'")]
    ParalloopForbidden { keyword: &'static str },

    #[error("counted paralloop cannot be nested inside another counted paralloop")]
    NestedCountedParalloop,

    #[error("counted paralloop requires an int iterator or condition")]
    ParalloopRequiresInt,

    #[error("outer variable '{name}' may only be updated inside a counted paralloop via '+=' reduction, without reading itself on the right-hand side")]
    ParalloopInvalidReduction { name: String },

    #[error("use of moved value '{name}'")]
    UseAfterMove { name: String },

    #[error("cannot move out of '{name}' while it is borrowed")]
    MoveWhileBorrowed { name: String },

    #[error("cannot move '{name}' into itself")]
    SelfMove { name: String },

    #[error("cannot assign to '{name}' while it is borrowed")]
    AssignWhileBorrowed { name: String },

    #[error("borrow of '{name}' outlives the scope it was taken in")]
    BorrowOutlivesScope { name: String },
}
