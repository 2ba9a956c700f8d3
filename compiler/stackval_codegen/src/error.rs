//! Internal-consistency faults raised during emission.
//!
//! None of these are user diagnostics. Each one means an upstream phase
//! handed this crate inputs it had promised to validate, or a bug here.
//! Callers propagate them with `?` and abort code generation for the
//! current compilation unit.

use stackval_types::Type;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CodegenError {
    /// An addressable operation was invoked on a value that has no location.
    #[error("`{operation}` is not supported on {kind} values")]
    UnsupportedOperation {
        operation: &'static str,
        kind: &'static str,
    },

    /// A value with a cleanup task was requested at a type other than its own.
    #[error("value with cleanup has type {natural} but was requested as {requested}; wrap it in a coercion")]
    CleanupTypeMismatch { natural: Type, requested: Type },

    /// No instruction sequence converts between the two types.
    #[error("cannot coerce {from} to {to}")]
    IllegalCoercion { from: Type, to: Type },

    /// The override graph has no ancestor with an annotation default.
    #[error("no declaration overridden by `{param}` declares a default value readable from annotations")]
    MissingInheritedDefault { param: String },

    /// An annotation default does not parse as its parameter's type.
    #[error("default value {value:?} of `{param}` is not a valid literal of its declared type")]
    UncheckedDefaultLiteral { param: String, value: String },
}
