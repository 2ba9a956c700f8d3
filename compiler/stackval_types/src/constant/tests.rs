use pretty_assertions::assert_eq;

use super::*;

#[test]
fn natural_types() {
    assert_eq!(Constant::I32(5).natural_type(), Type::I32);
    assert_eq!(Constant::I64(5).natural_type(), Type::I64);
    assert_eq!(Constant::Char('x').natural_type(), Type::CHAR);
    assert_eq!(Constant::Null.natural_type(), Type::OBJECT);
    assert_eq!(Constant::String("a".into()).natural_type(), Type::STRING);
}

#[test]
fn zero_matches_kind() {
    for kind in PrimitiveKind::ALL {
        assert_eq!(Constant::zero(kind).natural_type(), Type::Primitive(kind));
    }
}

#[test]
fn defaults() {
    assert_eq!(Constant::default_for(&Type::VOID), None);
    assert_eq!(Constant::default_for(&Type::F64), Some(Constant::F64(0.0)));
    assert_eq!(Constant::default_for(&Type::STRING), Some(Constant::Null));
    assert_eq!(
        Constant::default_for(&Type::array_of(Type::I32)),
        Some(Constant::Null)
    );
}

#[test]
fn display() {
    assert_eq!(Constant::I32(5).to_string(), "5");
    assert_eq!(Constant::I64(-1).to_string(), "-1L");
    assert_eq!(Constant::String("hi".into()).to_string(), "\"hi\"");
    assert_eq!(Constant::Null.to_string(), "null");
}
