//! Leaf types for the stackval code generator.
//!
//! This crate provides:
//!
//! - **Target type descriptors** ([`Type`], [`PrimitiveKind`], [`ClassName`]):
//!   the machine-level representation of a value on the operand stack, with
//!   its size class and boxed/unboxed counterpart.
//!
//! - **Constants** ([`Constant`]): literal payloads that can be pushed
//!   directly.
//!
//! - **The emission sink contract** ([`InstructionSink`]): one method per
//!   low-level operation. [`InsnBuffer`] is the recording implementation:
//!   it keeps the emitted [`Insn`]s in order and tracks stack depth.
//!
//! # Crate Dependencies
//!
//! None besides the optional `serde` feature. Everything that decides *what*
//! to emit lives in `stackval_codegen`; this crate only describes *how* it is
//! written down.

mod constant;
mod insn;
mod ty;

pub use constant::Constant;
pub use insn::{
    Conversion, FieldRef, InstructionSink, Insn, InsnBuffer, InvokeKind, MethodRef,
};
pub use ty::{ClassName, PrimitiveKind, Type};
