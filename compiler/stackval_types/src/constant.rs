//! Literal constants that can be pushed onto the operand stack.

use std::fmt;

use crate::{PrimitiveKind, Type};

/// A constant payload.
///
/// Integer constants keep their declared width so that the natural type of
/// the pushed value is never ambiguous.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Constant {
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
}

impl Constant {
    /// The type a push of this constant leaves on the stack.
    ///
    /// `null` is typed as `java/lang/Object`; callers that know better wrap
    /// it with their own type.
    pub fn natural_type(&self) -> Type {
        match self {
            Self::Null => Type::OBJECT,
            Self::Bool(_) => Type::BOOL,
            Self::Char(_) => Type::CHAR,
            Self::I8(_) => Type::I8,
            Self::I16(_) => Type::I16,
            Self::I32(_) => Type::I32,
            Self::I64(_) => Type::I64,
            Self::F32(_) => Type::F32,
            Self::F64(_) => Type::F64,
            Self::String(_) => Type::STRING,
        }
    }

    /// The zero value of a primitive kind.
    pub const fn zero(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Bool => Self::Bool(false),
            PrimitiveKind::Char => Self::Char('\0'),
            PrimitiveKind::I8 => Self::I8(0),
            PrimitiveKind::I16 => Self::I16(0),
            PrimitiveKind::I32 => Self::I32(0),
            PrimitiveKind::I64 => Self::I64(0),
            PrimitiveKind::F32 => Self::F32(0.0),
            PrimitiveKind::F64 => Self::F64(0.0),
        }
    }

    /// Default value for a slot of type `ty`: `null` for references, zero
    /// for primitives, nothing for `void`.
    pub fn default_for(ty: &Type) -> Option<Self> {
        match ty {
            Type::Void => None,
            Type::Primitive(kind) => Some(Self::zero(*kind)),
            Type::Object(_) | Type::Array(_) => Some(Self::Null),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Char(c) => write!(f, "{c:?}"),
            Self::I8(v) => write!(f, "{v}b"),
            Self::I16(v) => write!(f, "{v}s"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}L"),
            Self::F32(v) => write!(f, "{v}f"),
            Self::F64(v) => write!(f, "{v}d"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

#[cfg(test)]
mod tests;
