//! Target type descriptors.
//!
//! A [`Type`] identifies the runtime representation category of a value on
//! the operand stack: a primitive, an object reference, an array, or `void`.
//!
//! # Invariants
//!
//! - Every type has a size class: `void` occupies 0 slots, `long` and
//!   `double` occupy 2, everything else occupies 1.
//! - Every primitive has exactly one boxed form (see
//!   [`PrimitiveKind::boxed_class`]). Only the eight wrapper classes unbox.
//! - Types are plain values: compared structurally, cloned freely.

use std::borrow::Cow;
use std::fmt;

// ── Class names ─────────────────────────────────────────────────────

/// Internal (slash-separated) name of a class, e.g. `java/lang/Integer`.
///
/// Well-known classes are available as `const`s and never allocate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassName(Cow<'static, str>);

impl ClassName {
    pub const OBJECT: Self = Self::from_static("java/lang/Object");
    pub const NUMBER: Self = Self::from_static("java/lang/Number");
    pub const STRING: Self = Self::from_static("java/lang/String");
    pub const CLONEABLE: Self = Self::from_static("java/lang/Cloneable");
    pub const SERIALIZABLE: Self = Self::from_static("java/io/Serializable");

    pub const BOOLEAN: Self = Self::from_static("java/lang/Boolean");
    pub const CHARACTER: Self = Self::from_static("java/lang/Character");
    pub const BYTE: Self = Self::from_static("java/lang/Byte");
    pub const SHORT: Self = Self::from_static("java/lang/Short");
    pub const INTEGER: Self = Self::from_static("java/lang/Integer");
    pub const LONG: Self = Self::from_static("java/lang/Long");
    pub const FLOAT: Self = Self::from_static("java/lang/Float");
    pub const DOUBLE: Self = Self::from_static("java/lang/Double");

    /// Wrap a static class name without allocating.
    #[inline]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Create a class name from an owned string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The internal name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Primitive kinds ─────────────────────────────────────────────────

/// Machine-level primitive kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimitiveKind {
    Bool,
    /// Unsigned 16-bit code unit.
    Char,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl PrimitiveKind {
    /// Every primitive kind, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Bool,
        Self::Char,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::F32,
        Self::F64,
    ];

    /// Source-level name (`int`, `double`, ...).
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Char => "char",
            Self::I8 => "byte",
            Self::I16 => "short",
            Self::I32 => "int",
            Self::I64 => "long",
            Self::F32 => "float",
            Self::F64 => "double",
        }
    }

    /// Single-character descriptor (`Z`, `C`, `B`, `S`, `I`, `J`, `F`, `D`).
    #[inline]
    pub const fn descriptor(self) -> char {
        match self {
            Self::Bool => 'Z',
            Self::Char => 'C',
            Self::I8 => 'B',
            Self::I16 => 'S',
            Self::I32 => 'I',
            Self::I64 => 'J',
            Self::F32 => 'F',
            Self::F64 => 'D',
        }
    }

    /// Inverse of [`descriptor`](Self::descriptor).
    pub const fn from_descriptor(c: char) -> Option<Self> {
        match c {
            'Z' => Some(Self::Bool),
            'C' => Some(Self::Char),
            'B' => Some(Self::I8),
            'S' => Some(Self::I16),
            'I' => Some(Self::I32),
            'J' => Some(Self::I64),
            'F' => Some(Self::F32),
            'D' => Some(Self::F64),
            _ => None,
        }
    }

    /// Number of evaluation-stack slots a value of this kind occupies.
    #[inline]
    pub const fn size(self) -> u8 {
        if self.is_wide() {
            2
        } else {
            1
        }
    }

    /// `long` and `double` take two slots.
    #[inline]
    pub const fn is_wide(self) -> bool {
        matches!(self, Self::I64 | Self::F64)
    }

    /// Numeric kinds are the ones whose wrapper extends `java/lang/Number`.
    #[inline]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Bool | Self::Char)
    }

    /// The kind this value is computed as on the stack.
    ///
    /// Sub-int kinds (`boolean`, `char`, `byte`, `short`) are all held as
    /// 32-bit ints.
    #[inline]
    pub const fn stack_kind(self) -> Self {
        match self {
            Self::Bool | Self::Char | Self::I8 | Self::I16 | Self::I32 => Self::I32,
            Self::I64 => Self::I64,
            Self::F32 => Self::F32,
            Self::F64 => Self::F64,
        }
    }

    /// The wrapper class this kind boxes into.
    pub const fn boxed_class(self) -> ClassName {
        match self {
            Self::Bool => ClassName::BOOLEAN,
            Self::Char => ClassName::CHARACTER,
            Self::I8 => ClassName::BYTE,
            Self::I16 => ClassName::SHORT,
            Self::I32 => ClassName::INTEGER,
            Self::I64 => ClassName::LONG,
            Self::F32 => ClassName::FLOAT,
            Self::F64 => ClassName::DOUBLE,
        }
    }

    /// The primitive kind a wrapper class unboxes into, if it is one.
    pub fn from_boxed_class(class: &ClassName) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.boxed_class() == *class)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Type descriptors ────────────────────────────────────────────────

/// Machine-level type of a stack value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Type {
    Void,
    Primitive(PrimitiveKind),
    Object(ClassName),
    Array(Box<Type>),
}

impl Type {
    pub const VOID: Self = Self::Void;
    pub const BOOL: Self = Self::Primitive(PrimitiveKind::Bool);
    pub const CHAR: Self = Self::Primitive(PrimitiveKind::Char);
    pub const I8: Self = Self::Primitive(PrimitiveKind::I8);
    pub const I16: Self = Self::Primitive(PrimitiveKind::I16);
    pub const I32: Self = Self::Primitive(PrimitiveKind::I32);
    pub const I64: Self = Self::Primitive(PrimitiveKind::I64);
    pub const F32: Self = Self::Primitive(PrimitiveKind::F32);
    pub const F64: Self = Self::Primitive(PrimitiveKind::F64);

    pub const OBJECT: Self = Self::Object(ClassName::OBJECT);
    pub const NUMBER: Self = Self::Object(ClassName::NUMBER);
    pub const STRING: Self = Self::Object(ClassName::STRING);

    /// Object reference to the named class.
    pub fn object(name: impl Into<String>) -> Self {
        Self::Object(ClassName::new(name))
    }

    /// Array whose elements have type `elem`.
    pub fn array_of(elem: Type) -> Self {
        Self::Array(Box::new(elem))
    }

    /// Number of evaluation-stack slots a value of this type occupies.
    #[inline]
    pub fn size(&self) -> u8 {
        match self {
            Self::Void => 0,
            Self::Primitive(kind) => kind.size(),
            Self::Object(_) | Self::Array(_) => 1,
        }
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    #[inline]
    pub fn is_wide(&self) -> bool {
        self.size() == 2
    }

    /// Object or array reference.
    #[inline]
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Array(_))
    }

    #[inline]
    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    #[inline]
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Self::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// The boxed counterpart of a primitive type.
    ///
    /// Returns `None` for references and `void`; they have no boxed form.
    pub fn boxed(&self) -> Option<Type> {
        self.as_primitive()
            .map(|kind| Self::Object(kind.boxed_class()))
    }

    /// The primitive a wrapper class unboxes into.
    ///
    /// Returns `None` for every type that is not one of the eight wrappers.
    pub fn unboxed(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Object(class) => PrimitiveKind::from_boxed_class(class),
            _ => None,
        }
    }

    /// Unboxed primitive type for a wrapper, the type itself otherwise.
    pub fn unboxed_or_self(&self) -> Type {
        self.unboxed().map_or_else(|| self.clone(), Self::Primitive)
    }

    /// Whether a reference of this type can be used as `to` without a
    /// runtime cast.
    ///
    /// Only relationships known without a class hierarchy are recognised:
    /// every reference is an `Object`, numeric wrappers are `Number`s,
    /// arrays are `Cloneable` and `Serializable`, reference arrays are
    /// covariant. Anything else answers `false` and gets a `checkcast`.
    pub fn is_statically_assignable_to(&self, to: &Type) -> bool {
        if self == to {
            return true;
        }
        match (self, to) {
            (Self::Object(from), Self::Object(target)) => {
                *target == ClassName::OBJECT
                    || (*target == ClassName::NUMBER
                        && PrimitiveKind::from_boxed_class(from)
                            .is_some_and(PrimitiveKind::is_numeric))
            }
            (Self::Array(_), Self::Object(target)) => {
                *target == ClassName::OBJECT
                    || *target == ClassName::CLONEABLE
                    || *target == ClassName::SERIALIZABLE
            }
            (Self::Array(from), Self::Array(target)) => {
                from.is_reference()
                    && target.is_reference()
                    && from.is_statically_assignable_to(target)
            }
            _ => false,
        }
    }

    /// Descriptor string, e.g. `I`, `Ljava/lang/Integer;`, `[J`.
    pub fn descriptor(&self) -> String {
        let mut out = String::new();
        self.write_descriptor(&mut out);
        out
    }

    pub(crate) fn write_descriptor(&self, out: &mut String) {
        match self {
            Self::Void => out.push('V'),
            Self::Primitive(kind) => out.push(kind.descriptor()),
            Self::Object(class) => {
                out.push('L');
                out.push_str(class.as_str());
                out.push(';');
            }
            Self::Array(elem) => {
                out.push('[');
                elem.write_descriptor(out);
            }
        }
    }

    /// Parse exactly one descriptor. Trailing input is rejected.
    pub fn from_descriptor(desc: &str) -> Option<Self> {
        let (ty, rest) = Self::parse_descriptor(desc)?;
        rest.is_empty().then_some(ty)
    }

    fn parse_descriptor(desc: &str) -> Option<(Self, &str)> {
        let mut chars = desc.chars();
        let head = chars.next()?;
        let rest = chars.as_str();
        match head {
            'V' => Some((Self::Void, rest)),
            '[' => {
                let (elem, rest) = Self::parse_descriptor(rest)?;
                if elem.is_void() {
                    return None;
                }
                Some((Self::array_of(elem), rest))
            }
            'L' => {
                let end = rest.find(';')?;
                let name = &rest[..end];
                if name.is_empty() {
                    return None;
                }
                Some((Self::object(name), &rest[end + 1..]))
            }
            c => PrimitiveKind::from_descriptor(c).map(|kind| (Self::Primitive(kind), rest)),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Primitive(kind) => write!(f, "{kind}"),
            Self::Object(class) => write!(f, "{class}"),
            Self::Array(elem) => write!(f, "{elem}[]"),
        }
    }
}

impl From<PrimitiveKind> for Type {
    fn from(kind: PrimitiveKind) -> Self {
        Self::Primitive(kind)
    }
}
