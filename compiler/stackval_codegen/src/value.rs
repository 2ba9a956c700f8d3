//! Deferred values.
//!
//! A [`StackValue`] describes a value that has not been materialized yet:
//! a constant, a local, a field, an array element, the result of an opaque
//! emission procedure, or a wrapper around another value. Asking it to
//! [`put`](StackValue::put) itself emits the instructions that leave it on
//! the operand stack, coerced to the requested type.
//!
//! # Receiver and selector
//!
//! Addressable values split into two halves. The *receiver* is whatever the
//! access consumes from the stack (the object of an instance field, the
//! array and index of an element). The *selector* is the load or store that
//! consumes it. `put` is receiver-then-selector; compound assignments drive
//! the halves separately through [`put_receiver`](StackValue::put_receiver),
//! [`dup_receiver`](StackValue::dup_receiver),
//! [`put_selector`](StackValue::put_selector) and
//! [`store_selector`](StackValue::store_selector).
//!
//! # Ordering
//!
//! Sub-values are emitted depth-first in construction order, so the side
//! effects of a value tree happen in the order its leaves were built.
//!
//! # Ownership
//!
//! Each variant owns its sub-values. The sink is never stored: it is passed
//! by `&mut` into every call and borrowed by emission and cleanup
//! procedures only while they run.

use std::fmt;

use stackval_types::{ClassName, Constant, FieldRef, InstructionSink, Type};

use crate::coerce::coerce;
use crate::CodegenError;

/// Opaque emission procedure. Must leave exactly one value of the
/// operation's declared type on the stack (nothing for `void`).
pub type EmitFn<'a> = Box<dyn Fn(&mut dyn InstructionSink) + 'a>;

/// Post-emission task. Receives the wrapped value it runs after.
pub type CleanupFn<'a> = Box<dyn Fn(&StackValue<'a>, &mut dyn InstructionSink) + 'a>;

/// Static classification of an [`StackValue::Operation`].
///
/// Both kinds emit identically. Callers use the distinction to special-case
/// call results (inlining, exception-table bookkeeping).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Computed,
    FunctionCall,
}

/// A value not yet materialized into instructions.
pub enum StackValue<'a> {
    /// A literal of type `ty`.
    Constant { value: Constant, ty: Type },

    /// Local variable slot.
    Local { slot: u16, ty: Type },

    /// Instance field read through `receiver`.
    InstanceField {
        field: FieldRef,
        receiver: Box<StackValue<'a>>,
    },

    /// Static field. A receiver, if present, is evaluated only for its side
    /// effects and discarded.
    StaticField {
        field: FieldRef,
        receiver: Option<Box<StackValue<'a>>>,
    },

    /// Element `index` of `array`; `ty` is the element type.
    ArrayElement {
        array: Box<StackValue<'a>>,
        index: Box<StackValue<'a>>,
        ty: Type,
    },

    /// Result of an opaque emission procedure.
    Operation {
        kind: OperationKind,
        ty: Type,
        emit: EmitFn<'a>,
        side_effects: bool,
    },

    /// `value` cast to `cast_type` in two hops (natural → cast → requested).
    Coercion {
        value: Box<StackValue<'a>>,
        cast_type: Type,
    },

    /// `value` followed by `cleanup` at the moment it is consumed.
    WithCleanup {
        value: Box<StackValue<'a>>,
        cleanup: CleanupFn<'a>,
    },
}

impl<'a> StackValue<'a> {
    // ── Construction ────────────────────────────────────────────

    /// A constant typed as `ty`.
    pub fn constant(value: Constant, ty: Type) -> Self {
        Self::Constant { value, ty }
    }

    /// A constant at its natural type.
    pub fn literal(value: Constant) -> Self {
        let ty = value.natural_type();
        Self::Constant { value, ty }
    }

    /// The `null` literal typed as `ty`.
    pub fn null(ty: Type) -> Self {
        Self::constant(Constant::Null, ty)
    }

    pub fn local(slot: u16, ty: Type) -> Self {
        Self::Local { slot, ty }
    }

    pub fn field(field: FieldRef, receiver: StackValue<'a>) -> Self {
        Self::InstanceField {
            field,
            receiver: Box::new(receiver),
        }
    }

    pub fn static_field(field: FieldRef) -> Self {
        Self::StaticField {
            field,
            receiver: None,
        }
    }

    /// Static field accessed through an expression, e.g. `expr.CONST`.
    pub fn static_field_with_receiver(field: FieldRef, receiver: StackValue<'a>) -> Self {
        Self::StaticField {
            field,
            receiver: Some(Box::new(receiver)),
        }
    }

    /// The static field holding enum entry `entry` of `enum_class`.
    pub fn enum_entry(enum_class: ClassName, entry: impl Into<String>) -> Self {
        let ty = Type::Object(enum_class.clone());
        Self::static_field(FieldRef::new(enum_class, entry, ty))
    }

    pub fn array_element(array: StackValue<'a>, index: StackValue<'a>, ty: Type) -> Self {
        Self::ArrayElement {
            array: Box::new(array),
            index: Box::new(index),
            ty,
        }
    }

    /// A computed value. Assumed to have side effects.
    pub fn operation(ty: Type, emit: impl Fn(&mut dyn InstructionSink) + 'a) -> Self {
        Self::Operation {
            kind: OperationKind::Computed,
            ty,
            emit: Box::new(emit),
            side_effects: true,
        }
    }

    /// A computed value the caller vouches is free of side effects.
    pub fn pure_operation(ty: Type, emit: impl Fn(&mut dyn InstructionSink) + 'a) -> Self {
        Self::Operation {
            kind: OperationKind::Computed,
            ty,
            emit: Box::new(emit),
            side_effects: false,
        }
    }

    /// The result of a function call.
    pub fn function_call(ty: Type, emit: impl Fn(&mut dyn InstructionSink) + 'a) -> Self {
        Self::Operation {
            kind: OperationKind::FunctionCall,
            ty,
            emit: Box::new(emit),
            side_effects: true,
        }
    }

    /// `value` cast to `cast_type`. Returns `value` itself when it already
    /// has that type.
    pub fn coercion(value: StackValue<'a>, cast_type: Type) -> Self {
        if *value.ty() == cast_type {
            return value;
        }
        Self::Coercion {
            value: Box::new(value),
            cast_type,
        }
    }

    /// `value` with `cleanup` run right after it is emitted.
    pub fn with_cleanup(
        value: StackValue<'a>,
        cleanup: impl Fn(&StackValue<'a>, &mut dyn InstructionSink) + 'a,
    ) -> Self {
        Self::WithCleanup {
            value: Box::new(value),
            cleanup: Box::new(cleanup),
        }
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Type of the value this produces before any requested coercion.
    pub fn ty(&self) -> &Type {
        match self {
            Self::Constant { ty, .. }
            | Self::Local { ty, .. }
            | Self::ArrayElement { ty, .. }
            | Self::Operation { ty, .. } => ty,
            Self::InstanceField { field, .. } | Self::StaticField { field, .. } => &field.ty,
            Self::Coercion { cast_type, .. } => cast_type,
            Self::WithCleanup { value, .. } => value.ty(),
        }
    }

    /// Whether emitting this value may have effects beyond producing it.
    ///
    /// Reported for upstream optimizers; nothing here acts on it.
    pub fn has_side_effects(&self) -> bool {
        match self {
            Self::Constant { .. } | Self::Local { .. } => false,
            Self::InstanceField { receiver, .. } => receiver.has_side_effects(),
            Self::StaticField { receiver, .. } => {
                receiver.as_ref().is_some_and(|r| r.has_side_effects())
            }
            // Out-of-bounds and null accesses trap.
            Self::ArrayElement { .. } | Self::WithCleanup { .. } => true,
            Self::Operation { side_effects, .. } => *side_effects,
            Self::Coercion { value, .. } => value.has_side_effects(),
        }
    }

    /// Whether this is a call result (not looking through wrappers).
    pub fn is_function_call(&self) -> bool {
        matches!(
            self,
            Self::Operation {
                kind: OperationKind::FunctionCall,
                ..
            }
        )
    }

    /// Short variant name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Constant { .. } => "constant",
            Self::Local { .. } => "local",
            Self::InstanceField { .. } => "instance field",
            Self::StaticField { .. } => "static field",
            Self::ArrayElement { .. } => "array element",
            Self::Operation {
                kind: OperationKind::Computed,
                ..
            } => "operation",
            Self::Operation {
                kind: OperationKind::FunctionCall,
                ..
            } => "function call",
            Self::Coercion { .. } => "coercion",
            Self::WithCleanup { .. } => "cleanup",
        }
    }

    // ── Emission ────────────────────────────────────────────────

    /// Emit this value coerced to `ty`.
    ///
    /// Leaves exactly one value of type `ty` on the stack (nothing for
    /// `void`).
    pub fn put(&self, ty: &Type, sink: &mut dyn InstructionSink) -> Result<(), CodegenError> {
        self.check_cleanup_request(ty)?;
        self.emit_receiver(sink)?;
        self.put_selector(ty, sink)
    }

    /// Emit the selector half, assuming the receiver is already on the
    /// stack, and coerce the result to `ty`.
    pub fn put_selector(
        &self,
        ty: &Type,
        sink: &mut dyn InstructionSink,
    ) -> Result<(), CodegenError> {
        ensure_sufficient_stack(|| match self {
            Self::Constant { value, ty: own } => {
                sink.push_const(value);
                coerce(own, ty, sink)
            }
            Self::Local { slot, ty: own } => {
                sink.load(own, *slot);
                coerce(own, ty, sink)
            }
            Self::InstanceField { field, .. } => {
                sink.get_field(field);
                coerce(&field.ty, ty, sink)
            }
            Self::StaticField { field, .. } => {
                sink.get_static(field);
                coerce(&field.ty, ty, sink)
            }
            Self::ArrayElement { ty: elem, .. } => {
                sink.array_load(elem);
                coerce(elem, ty, sink)
            }
            Self::Operation { ty: own, emit, .. } => {
                emit(sink);
                coerce(own, ty, sink)
            }
            Self::Coercion { value, cast_type } => {
                value.put_selector(value.ty(), sink)?;
                coerce(value.ty(), cast_type, sink)?;
                coerce(cast_type, ty, sink)
            }
            Self::WithCleanup { value, cleanup } => {
                self.check_cleanup_request(ty)?;
                value.put_selector(value.ty(), sink)?;
                cleanup(value, sink);
                Ok(())
            }
        })
    }

    /// Emit the receiver of an addressable value.
    ///
    /// `is_read` tells whether the receiver is about to feed a load or a
    /// store. Fails on values that have no location.
    pub fn put_receiver(
        &self,
        sink: &mut dyn InstructionSink,
        is_read: bool,
    ) -> Result<(), CodegenError> {
        match self {
            Self::Local { .. } => Ok(()),
            Self::InstanceField { .. } | Self::StaticField { .. } | Self::ArrayElement { .. } => {
                self.emit_receiver(sink)
            }
            Self::Coercion { value, .. } | Self::WithCleanup { value, .. } => {
                value.put_receiver(sink, is_read)
            }
            Self::Constant { .. } | Self::Operation { .. } => {
                Err(self.unsupported("put_receiver"))
            }
        }
    }

    /// Duplicate the receiver already on the stack, for read-modify-write.
    pub fn dup_receiver(&self, sink: &mut dyn InstructionSink) -> Result<(), CodegenError> {
        match self {
            Self::Local { .. } | Self::StaticField { .. } => Ok(()),
            Self::InstanceField { .. } => {
                sink.dup(1);
                Ok(())
            }
            // array reference + int index
            Self::ArrayElement { .. } => {
                sink.dup(2);
                Ok(())
            }
            Self::Coercion { value, .. } | Self::WithCleanup { value, .. } => {
                value.dup_receiver(sink)
            }
            Self::Constant { .. } | Self::Operation { .. } => {
                Err(self.unsupported("dup_receiver"))
            }
        }
    }

    /// Store the stack-top value of type `top` into this location.
    ///
    /// The receiver must already be below the value. Transparent wrappers
    /// store straight into their inner location.
    pub fn store_selector(
        &self,
        top: &Type,
        sink: &mut dyn InstructionSink,
    ) -> Result<(), CodegenError> {
        match self {
            Self::Local { slot, ty } => {
                coerce(top, ty, sink)?;
                sink.store(ty, *slot);
                Ok(())
            }
            Self::InstanceField { field, .. } => {
                coerce(top, &field.ty, sink)?;
                sink.put_field(field);
                Ok(())
            }
            Self::StaticField { field, .. } => {
                coerce(top, &field.ty, sink)?;
                sink.put_static(field);
                Ok(())
            }
            Self::ArrayElement { ty, .. } => {
                coerce(top, ty, sink)?;
                sink.array_store(ty);
                Ok(())
            }
            Self::Coercion { value, .. } | Self::WithCleanup { value, .. } => {
                value.store_selector(top, sink)
            }
            Self::Constant { .. } | Self::Operation { .. } => {
                Err(self.unsupported("store_selector"))
            }
        }
    }

    /// Assign `value` to this location: receiver, value at its natural
    /// type, then the store.
    pub fn store(
        &self,
        value: &StackValue<'_>,
        sink: &mut dyn InstructionSink,
    ) -> Result<(), CodegenError> {
        self.put_receiver(sink, false)?;
        value.put(value.ty(), sink)?;
        self.store_selector(value.ty(), sink)
    }

    /// Whether accessing this location consumes an object receiver.
    pub fn is_non_static_access(&self, is_read: bool) -> Result<bool, CodegenError> {
        match self {
            Self::Local { .. } | Self::StaticField { .. } => Ok(false),
            Self::InstanceField { .. } | Self::ArrayElement { .. } => Ok(true),
            Self::Coercion { value, .. } | Self::WithCleanup { value, .. } => {
                value.is_non_static_access(is_read)
            }
            Self::Constant { .. } | Self::Operation { .. } => {
                Err(self.unsupported("is_non_static_access"))
            }
        }
    }

    // ── Internals ───────────────────────────────────────────────

    /// Receiver half of `put`. Values without a location have none.
    fn emit_receiver(&self, sink: &mut dyn InstructionSink) -> Result<(), CodegenError> {
        ensure_sufficient_stack(|| match self {
            Self::Constant { .. } | Self::Local { .. } | Self::Operation { .. } => Ok(()),
            Self::InstanceField { receiver, .. } => receiver.put(receiver.ty(), sink),
            Self::StaticField { receiver, .. } => match receiver {
                Some(receiver) if receiver.has_side_effects() => {
                    receiver.put(receiver.ty(), sink)?;
                    let size = receiver.ty().size();
                    if size > 0 {
                        sink.pop(size);
                    }
                    Ok(())
                }
                _ => Ok(()),
            },
            Self::ArrayElement { array, index, .. } => {
                array.put(array.ty(), sink)?;
                index.put(&Type::I32, sink)
            }
            Self::Coercion { value, .. } | Self::WithCleanup { value, .. } => {
                value.emit_receiver(sink)
            }
        })
    }

    /// A cleanup value only ever emits at its own type.
    fn check_cleanup_request(&self, requested: &Type) -> Result<(), CodegenError> {
        match self {
            Self::WithCleanup { value, .. } if value.ty() != requested => {
                Err(CodegenError::CleanupTypeMismatch {
                    natural: value.ty().clone(),
                    requested: requested.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    fn unsupported(&self, operation: &'static str) -> CodegenError {
        CodegenError::UnsupportedOperation {
            operation,
            kind: self.kind_name(),
        }
    }
}

impl fmt::Debug for StackValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant { value, ty } => f
                .debug_struct("Constant")
                .field("value", value)
                .field("ty", ty)
                .finish(),
            Self::Local { slot, ty } => f
                .debug_struct("Local")
                .field("slot", slot)
                .field("ty", ty)
                .finish(),
            Self::InstanceField { field, receiver } => f
                .debug_struct("InstanceField")
                .field("field", field)
                .field("receiver", receiver)
                .finish(),
            Self::StaticField { field, receiver } => f
                .debug_struct("StaticField")
                .field("field", field)
                .field("receiver", receiver)
                .finish(),
            Self::ArrayElement { array, index, ty } => f
                .debug_struct("ArrayElement")
                .field("array", array)
                .field("index", index)
                .field("ty", ty)
                .finish(),
            Self::Operation {
                kind,
                ty,
                side_effects,
                ..
            } => f
                .debug_struct("Operation")
                .field("kind", kind)
                .field("ty", ty)
                .field("side_effects", side_effects)
                .finish_non_exhaustive(),
            Self::Coercion { value, cast_type } => f
                .debug_struct("Coercion")
                .field("value", value)
                .field("cast_type", cast_type)
                .finish(),
            Self::WithCleanup { value, .. } => f
                .debug_struct("WithCleanup")
                .field("value", value)
                .finish_non_exhaustive(),
        }
    }
}

/// Minimum stack left before growing (64KB red zone).
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 64 * 1024;

/// Growth increment for deeply nested value trees (1MB).
#[cfg(not(target_arch = "wasm32"))]
const STACK_GROWTH: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_GROWTH, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
