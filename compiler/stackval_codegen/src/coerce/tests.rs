use pretty_assertions::assert_eq;
use stackval_types::{Insn, InsnBuffer};

use super::*;

fn emitted(from: &Type, to: &Type) -> Vec<Insn> {
    let mut buf = InsnBuffer::new();
    coerce(from, to, &mut buf).unwrap_or_else(|e| panic!("{from} -> {to}: {e}"));
    buf.into_insns()
}

fn boxed(kind: PrimitiveKind) -> Type {
    Type::Object(kind.boxed_class())
}

#[test]
fn identity_is_a_no_op() {
    let types = [
        Type::VOID,
        Type::BOOL,
        Type::I32,
        Type::F64,
        Type::OBJECT,
        Type::NUMBER,
        boxed(PrimitiveKind::I64),
        Type::array_of(Type::STRING),
    ];
    for ty in &types {
        assert_eq!(emitted(ty, ty), Vec::<Insn>::new(), "{ty}");
    }
}

// Primitive conversions

#[test]
fn widening_int_to_long() {
    assert_eq!(emitted(&Type::I32, &Type::I64), vec![Insn::Convert(Conversion::I2L)]);
}

#[test]
fn long_to_byte_goes_through_int() {
    assert_eq!(
        emitted(&Type::I64, &Type::I8),
        vec![Insn::Convert(Conversion::L2I), Insn::Convert(Conversion::I2B)]
    );
}

#[test]
fn double_to_char() {
    assert_eq!(
        emitted(&Type::F64, &Type::CHAR),
        vec![Insn::Convert(Conversion::D2I), Insn::Convert(Conversion::I2C)]
    );
}

#[test]
fn float_to_double() {
    assert_eq!(emitted(&Type::F32, &Type::F64), vec![Insn::Convert(Conversion::F2D)]);
}

#[test]
fn sub_int_widening_is_free() {
    assert_eq!(emitted(&Type::I8, &Type::I16), Vec::<Insn>::new());
    assert_eq!(emitted(&Type::I16, &Type::I32), Vec::<Insn>::new());
    assert_eq!(emitted(&Type::CHAR, &Type::I32), Vec::<Insn>::new());
}

#[test]
fn sub_int_narrowing_truncates() {
    assert_eq!(emitted(&Type::I16, &Type::I8), vec![Insn::Convert(Conversion::I2B)]);
    assert_eq!(emitted(&Type::CHAR, &Type::I16), vec![Insn::Convert(Conversion::I2S)]);
    assert_eq!(emitted(&Type::I32, &Type::CHAR), vec![Insn::Convert(Conversion::I2C)]);
}

#[test]
fn byte_to_double() {
    assert_eq!(emitted(&Type::I8, &Type::F64), vec![Insn::Convert(Conversion::I2D)]);
}

// Boxing

#[test]
fn int_requested_as_number_boxes_then_upcasts_for_free() {
    assert_eq!(
        emitted(&Type::I32, &Type::NUMBER),
        vec![Insn::Box(PrimitiveKind::I32)]
    );
}

#[test]
fn box_to_own_wrapper() {
    assert_eq!(
        emitted(&Type::F64, &boxed(PrimitiveKind::F64)),
        vec![Insn::Box(PrimitiveKind::F64)]
    );
}

#[test]
fn box_to_other_wrapper_converts_first() {
    assert_eq!(
        emitted(&Type::I32, &boxed(PrimitiveKind::I64)),
        vec![Insn::Convert(Conversion::I2L), Insn::Box(PrimitiveKind::I64)]
    );
}

#[test]
fn box_to_unrelated_class_casts() {
    let comparable = Type::object("java/lang/Comparable");
    assert_eq!(
        emitted(&Type::I32, &comparable),
        vec![Insn::Box(PrimitiveKind::I32), Insn::CheckCast(comparable.clone())]
    );
}

#[test]
fn boolean_cannot_upcast_to_number_for_free() {
    assert_eq!(
        emitted(&Type::BOOL, &Type::NUMBER),
        vec![Insn::Box(PrimitiveKind::Bool), Insn::CheckCast(Type::NUMBER)]
    );
}

// Unboxing

#[test]
fn unbox_own_wrapper() {
    assert_eq!(
        emitted(&boxed(PrimitiveKind::I32), &Type::I32),
        vec![Insn::Unbox {
            owner: ClassName::INTEGER,
            to: PrimitiveKind::I32,
        }]
    );
}

#[test]
fn unbox_then_convert() {
    assert_eq!(
        emitted(&boxed(PrimitiveKind::I32), &Type::I64),
        vec![
            Insn::Unbox {
                owner: ClassName::INTEGER,
                to: PrimitiveKind::I32,
            },
            Insn::Convert(Conversion::I2L),
        ]
    );
}

#[test]
fn unbox_through_number() {
    assert_eq!(
        emitted(&Type::NUMBER, &Type::F64),
        vec![Insn::Unbox {
            owner: ClassName::NUMBER,
            to: PrimitiveKind::F64,
        }]
    );
    assert_eq!(
        emitted(&Type::OBJECT, &Type::I32),
        vec![
            Insn::CheckCast(Type::NUMBER),
            Insn::Unbox {
                owner: ClassName::NUMBER,
                to: PrimitiveKind::I32,
            },
        ]
    );
}

#[test]
fn unbox_boolean_and_char_through_their_wrappers() {
    assert_eq!(
        emitted(&Type::OBJECT, &Type::BOOL),
        vec![
            Insn::CheckCast(boxed(PrimitiveKind::Bool)),
            Insn::Unbox {
                owner: ClassName::BOOLEAN,
                to: PrimitiveKind::Bool,
            },
        ]
    );
    assert_eq!(
        emitted(&Type::OBJECT, &Type::CHAR),
        vec![
            Insn::CheckCast(boxed(PrimitiveKind::Char)),
            Insn::Unbox {
                owner: ClassName::CHARACTER,
                to: PrimitiveKind::Char,
            },
        ]
    );
}

// References

#[test]
fn upcast_is_free_and_downcast_checks() {
    assert_eq!(emitted(&Type::STRING, &Type::OBJECT), Vec::<Insn>::new());
    assert_eq!(emitted(&boxed(PrimitiveKind::I16), &Type::NUMBER), Vec::<Insn>::new());
    assert_eq!(
        emitted(&Type::OBJECT, &Type::STRING),
        vec![Insn::CheckCast(Type::STRING)]
    );
    assert_eq!(
        emitted(&Type::NUMBER, &boxed(PrimitiveKind::I32)),
        vec![Insn::CheckCast(boxed(PrimitiveKind::I32))]
    );
}

#[test]
fn array_casts() {
    let strings = Type::array_of(Type::STRING);
    let objects = Type::array_of(Type::OBJECT);
    assert_eq!(emitted(&strings, &objects), Vec::<Insn>::new());
    assert_eq!(emitted(&objects, &strings), vec![Insn::CheckCast(strings.clone())]);
    assert_eq!(emitted(&Type::OBJECT, &strings), vec![Insn::CheckCast(strings)]);
}

// Void

#[test]
fn discard_into_void() {
    assert_eq!(emitted(&Type::I32, &Type::VOID), vec![Insn::Pop(1)]);
    assert_eq!(emitted(&Type::F64, &Type::VOID), vec![Insn::Pop(2)]);
    assert_eq!(emitted(&Type::STRING, &Type::VOID), vec![Insn::Pop(1)]);
}

#[test]
fn materialize_from_void() {
    assert_eq!(emitted(&Type::VOID, &Type::I64), vec![Insn::Const(Constant::I64(0))]);
    assert_eq!(emitted(&Type::VOID, &Type::STRING), vec![Insn::Const(Constant::Null)]);
}

// Illegal

#[test]
fn arrays_and_primitives_do_not_mix() {
    let ints = Type::array_of(Type::I32);
    let mut buf = InsnBuffer::new();
    assert_eq!(
        coerce(&ints, &Type::I32, &mut buf),
        Err(CodegenError::IllegalCoercion {
            from: ints.clone(),
            to: Type::I32,
        })
    );
    assert_eq!(
        coerce(&Type::I32, &ints, &mut buf),
        Err(CodegenError::IllegalCoercion {
            from: Type::I32,
            to: ints,
        })
    );
    assert!(buf.is_empty());
}

#[test]
fn coercion_leaves_target_size_on_stack() {
    let cases = [
        (Type::I32, Type::F64),
        (Type::F64, Type::I8),
        (Type::I64, Type::NUMBER),
        (boxed(PrimitiveKind::F64), Type::I64),
        (Type::OBJECT, Type::F64),
    ];
    for (from, to) in cases {
        let mut buf = InsnBuffer::new();
        coerce(&from, &to, &mut buf).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            buf.depth(),
            i32::from(to.size()) - i32::from(from.size()),
            "{from} -> {to}"
        );
    }
}
