//! Property-based tests for coercion and deferred value emission.
//!
//! These generate random type pairs and random value trees and verify:
//! 1. Coercion is a no-op between equal types and deterministic otherwise.
//! 2. Every legal coercion changes stack depth by exactly the size difference.
//! 3. A coerced value emits `coerce(A, B) ++ coerce(B, C)`.
//! 4. Effectful leaves are emitted in construction order at any depth.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(
    clippy::doc_markdown,
    clippy::uninlined_format_args,
    clippy::redundant_closure_for_method_calls,
    reason = "Proptest macros generate code with these patterns"
)]

use proptest::prelude::*;
use stackval_codegen::{coerce, CodegenError, StackValue};
use stackval_types::{ClassName, FieldRef, Insn, InsnBuffer, InvokeKind, MethodRef, PrimitiveKind, Type};

// -- Type Strategies --

fn sample_types() -> Vec<Type> {
    let mut types = vec![
        Type::VOID,
        Type::OBJECT,
        Type::NUMBER,
        Type::STRING,
        Type::object("java/lang/Comparable"),
        Type::array_of(Type::I32),
        Type::array_of(Type::STRING),
        Type::array_of(Type::OBJECT),
    ];
    for kind in PrimitiveKind::ALL {
        types.push(Type::Primitive(kind));
        types.push(Type::Object(kind.boxed_class()));
    }
    types
}

fn any_type() -> impl Strategy<Value = Type> {
    prop::sample::select(sample_types())
}

fn is_legal(from: &Type, to: &Type) -> bool {
    !matches!(
        (from, to),
        (Type::Primitive(_), Type::Array(_)) | (Type::Array(_), Type::Primitive(_))
    )
}

fn legal_pair() -> impl Strategy<Value = (Type, Type)> {
    (any_type(), any_type()).prop_filter("primitives and arrays do not mix", |(from, to)| {
        is_legal(from, to)
    })
}

fn illegal_pair() -> impl Strategy<Value = (Type, Type)> {
    let primitive = prop::sample::select(PrimitiveKind::ALL.to_vec()).prop_map(Type::Primitive);
    let array = prop::sample::select(vec![Type::array_of(Type::I32), Type::array_of(Type::STRING)]);
    prop_oneof![(primitive.clone(), array.clone()), (array, primitive)]
}

fn coerced(from: &Type, to: &Type) -> Result<Vec<Insn>, CodegenError> {
    let mut buf = InsnBuffer::new();
    coerce(from, to, &mut buf)?;
    Ok(buf.into_insns())
}

// -- Value Tree Strategies --

/// Shape of a generated value tree. Built into a `StackValue` by [`Builder`].
#[derive(Clone, Debug)]
enum Shape {
    /// An effectful call, numbered in construction order.
    Call,
    /// A local load.
    Pure,
    /// Cast to one of [`cast_types`].
    Coerce(Box<Shape>, usize),
    /// `Integer.value` read through the child.
    Field(Box<Shape>),
    /// A static field whose receiver is the child.
    Static(Box<Shape>),
    /// Array element with both array and index computed.
    Element(Box<Shape>, Box<Shape>),
    /// The child with a no-op cleanup.
    Cleanup(Box<Shape>),
}

fn cast_types() -> [Type; 4] {
    [
        Type::I32,
        Type::I64,
        Type::F64,
        Type::Object(ClassName::INTEGER),
    ]
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![Just(Shape::Call), Just(Shape::Pure)];
    leaf.prop_recursive(6, 48, 2, |inner| {
        prop_oneof![
            (inner.clone(), 0..4usize).prop_map(|(s, k)| Shape::Coerce(Box::new(s), k)),
            inner.clone().prop_map(|s| Shape::Field(Box::new(s))),
            inner.clone().prop_map(|s| Shape::Static(Box::new(s))),
            inner.clone().prop_map(|s| Shape::Cleanup(Box::new(s))),
            (inner.clone(), inner).prop_map(|(a, b)| Shape::Element(Box::new(a), Box::new(b))),
        ]
    })
}

fn call_method(n: usize) -> MethodRef {
    MethodRef::new(
        ClassName::new("com/example/Effects"),
        format!("f{n}"),
        Vec::new(),
        Type::I32,
    )
}

/// Turns shapes into values, numbering calls left to right.
#[derive(Default)]
struct Builder {
    calls: usize,
}

impl Builder {
    fn build(&mut self, shape: &Shape) -> StackValue<'static> {
        match shape {
            Shape::Call => {
                let method = call_method(self.calls);
                self.calls += 1;
                StackValue::function_call(Type::I32, move |sink| {
                    sink.invoke(InvokeKind::Static, &method);
                })
            }
            Shape::Pure => StackValue::local(0, Type::I32),
            Shape::Coerce(inner, k) => {
                let types = cast_types();
                let cast = types[*k % types.len()].clone();
                StackValue::coercion(self.build(inner), cast)
            }
            Shape::Field(inner) => {
                let receiver =
                    StackValue::coercion(self.build(inner), Type::Object(ClassName::INTEGER));
                StackValue::field(
                    FieldRef::new(ClassName::INTEGER, "value", Type::I32),
                    receiver,
                )
            }
            Shape::Static(inner) => {
                let receiver = self.build(inner);
                StackValue::static_field_with_receiver(
                    FieldRef::new(ClassName::new("com/example/Effects"), "COUNT", Type::I32),
                    receiver,
                )
            }
            Shape::Element(array, index) => {
                let array = StackValue::coercion(
                    StackValue::coercion(self.build(array), Type::OBJECT),
                    Type::array_of(Type::I32),
                );
                let index = StackValue::coercion(self.build(index), Type::I32);
                StackValue::array_element(array, index, Type::I32)
            }
            Shape::Cleanup(inner) => StackValue::with_cleanup(self.build(inner), |_, _| {}),
        }
    }
}

fn called_methods(insns: &[Insn]) -> Vec<String> {
    insns
        .iter()
        .filter_map(|insn| match insn {
            Insn::Invoke { method, .. } => Some(method.name.clone()),
            _ => None,
        })
        .collect()
}

// -- Properties --

proptest! {
    #[test]
    fn coercion_to_same_type_is_empty(ty in any_type()) {
        prop_assert_eq!(coerced(&ty, &ty), Ok(Vec::new()));
    }

    #[test]
    fn coercion_is_deterministic(from in any_type(), to in any_type()) {
        prop_assert_eq!(coerced(&from, &to), coerced(&from, &to));
    }

    #[test]
    fn coercion_is_stack_correct((from, to) in legal_pair()) {
        let mut buf = InsnBuffer::new();
        coerce(&from, &to, &mut buf).unwrap();
        prop_assert_eq!(
            buf.depth(),
            i32::from(to.size()) - i32::from(from.size())
        );
    }

    #[test]
    fn illegal_coercions_emit_nothing((from, to) in illegal_pair()) {
        let mut buf = InsnBuffer::new();
        let is_illegal = matches!(
            coerce(&from, &to, &mut buf),
            Err(CodegenError::IllegalCoercion { .. })
        );
        prop_assert!(is_illegal);
        prop_assert!(buf.is_empty());
    }

    #[test]
    fn coerced_value_emits_both_hops(
        (natural, cast) in legal_pair(),
        requested in any_type(),
    ) {
        prop_assume!(is_legal(&cast, &requested));
        let value = StackValue::coercion(
            StackValue::operation(natural.clone(), |_| {}),
            cast.clone(),
        );
        let mut buf = InsnBuffer::new();
        value.put(&requested, &mut buf).unwrap();

        let mut expected = coerced(&natural, &cast).unwrap();
        expected.extend(coerced(&cast, &requested).unwrap());
        prop_assert_eq!(buf.into_insns(), expected);
    }

    #[test]
    fn effects_follow_construction_order(shape in shape_strategy()) {
        let mut builder = Builder::default();
        let value = builder.build(&shape);
        let mut buf = InsnBuffer::new();
        value.put(value.ty(), &mut buf).unwrap();

        let expected: Vec<String> = (0..builder.calls).map(|n| format!("f{n}")).collect();
        prop_assert_eq!(called_methods(buf.insns()), expected);
        prop_assert_eq!(buf.depth(), i32::from(value.ty().size()));
    }
}
