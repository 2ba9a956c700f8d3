//! Coercion resolver.
//!
//! [`coerce`] converts the value on top of the stack from one [`Type`] to
//! another by emitting zero or more sink operations. It is a pure function
//! of `(from, to)`: the same pair always produces the same sequence.
//!
//! # Rules
//!
//! | from \ to      | void | primitive          | reference            |
//! |----------------|------|--------------------|----------------------|
//! | void           | none | push zero          | push `null`          |
//! | primitive      | pop  | conversion steps   | box (+ cast)         |
//! | object         | pop  | unbox (+ convert)  | `checkcast` if needed|
//! | array          | pop  | illegal            | `checkcast` if needed|
//!
//! Boxing into a wrapper of a *different* primitive converts first, so
//! `int → java/lang/Long` is `i2l; box long`, never a failing cast of an
//! `Integer`. Unboxing anything that is not a wrapper goes through
//! `Boolean`, `Character` or `Number` depending on the target.

use stackval_types::{ClassName, Constant, Conversion, InstructionSink, PrimitiveKind, Type};

use crate::CodegenError;

/// Emit the operations converting a stack-top `from` into `to`.
///
/// A no-op when `from == to`.
pub fn coerce(from: &Type, to: &Type, sink: &mut dyn InstructionSink) -> Result<(), CodegenError> {
    if from == to {
        return Ok(());
    }
    tracing::trace!(%from, %to, "coerce");

    match (from, to) {
        (_, Type::Void) => sink.pop(from.size()),
        (Type::Void, _) => {
            if let Some(default) = Constant::default_for(to) {
                sink.push_const(&default);
            }
        }
        (Type::Primitive(from), Type::Primitive(to)) => convert_primitive(*from, *to, sink),
        (Type::Primitive(from), Type::Object(_)) => box_into(*from, to, sink),
        (Type::Object(_) | Type::Array(_), Type::Object(_) | Type::Array(_)) => {
            cast_reference(from, to, sink);
        }
        (Type::Object(class), Type::Primitive(to)) => unbox_into(class, *to, sink),
        (Type::Primitive(_), Type::Array(_)) | (Type::Array(_), Type::Primitive(_)) => {
            return Err(CodegenError::IllegalCoercion {
                from: from.clone(),
                to: to.clone(),
            });
        }
    }
    Ok(())
}

/// Primitive-to-primitive conversion.
///
/// Goes through the stack kinds first (`l2i`, `d2f`, ...), then narrows an
/// `int` result when the target's range does not already contain the
/// source's.
fn convert_primitive(from: PrimitiveKind, to: PrimitiveKind, sink: &mut dyn InstructionSink) {
    if from == to {
        return;
    }
    let src = from.stack_kind();
    let dst = to.stack_kind();
    if src != dst {
        sink.convert(stack_conversion(src, dst));
    }
    if dst == PrimitiveKind::I32 {
        // After a conversion the value spans the whole int range.
        let origin = if src == PrimitiveKind::I32 {
            from
        } else {
            PrimitiveKind::I32
        };
        if let Some(step) = narrowing(origin, to) {
            sink.convert(step);
        }
    }
}

fn stack_conversion(src: PrimitiveKind, dst: PrimitiveKind) -> Conversion {
    use PrimitiveKind::{F32, F64, I32, I64};

    match (src, dst) {
        (I32, I64) => Conversion::I2L,
        (I32, F32) => Conversion::I2F,
        (I32, F64) => Conversion::I2D,
        (I64, I32) => Conversion::L2I,
        (I64, F32) => Conversion::L2F,
        (I64, F64) => Conversion::L2D,
        (F32, I32) => Conversion::F2I,
        (F32, I64) => Conversion::F2L,
        (F32, F64) => Conversion::F2D,
        (F64, I32) => Conversion::D2I,
        (F64, I64) => Conversion::D2L,
        (F64, F32) => Conversion::D2F,
        _ => unreachable!("stack conversion between {src} and {dst}"),
    }
}

fn narrowing(from: PrimitiveKind, to: PrimitiveKind) -> Option<Conversion> {
    use PrimitiveKind::{Bool, Char, I16, I8};

    match to {
        I8 if !matches!(from, I8 | Bool) => Some(Conversion::I2B),
        I16 if !matches!(from, I8 | I16 | Bool) => Some(Conversion::I2S),
        Char if !matches!(from, Char | Bool) => Some(Conversion::I2C),
        _ => None,
    }
}

/// Box a primitive into reference type `target`.
fn box_into(from: PrimitiveKind, target: &Type, sink: &mut dyn InstructionSink) {
    let kind = match target.unboxed() {
        Some(wrapped) if wrapped != from => {
            convert_primitive(from, wrapped, sink);
            wrapped
        }
        _ => from,
    };
    sink.box_primitive(kind);
    cast_reference(&Type::Object(kind.boxed_class()), target, sink);
}

fn cast_reference(from: &Type, to: &Type, sink: &mut dyn InstructionSink) {
    if !from.is_statically_assignable_to(to) {
        sink.checkcast(to);
    }
}

/// Unbox a reference of class `from` into primitive `to`.
fn unbox_into(from: &ClassName, to: PrimitiveKind, sink: &mut dyn InstructionSink) {
    if let Some(wrapped) = PrimitiveKind::from_boxed_class(from) {
        sink.unbox(from, wrapped);
        convert_primitive(wrapped, to, sink);
        return;
    }

    let via = match to {
        PrimitiveKind::Bool => ClassName::BOOLEAN,
        PrimitiveKind::Char => ClassName::CHARACTER,
        _ => ClassName::NUMBER,
    };
    if *from != via {
        sink.checkcast(&Type::Object(via.clone()));
    }
    sink.unbox(&via, to);
}

#[cfg(test)]
mod tests;
