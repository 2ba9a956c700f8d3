//! The emission sink contract and its recording implementation.
//!
//! [`InstructionSink`] is the only way the code generator talks to the
//! bytecode writer. It is a capability interface: one method per low-level
//! operation, no queries. The code generator sequences calls; the sink
//! decides how they are encoded.
//!
//! [`InsnBuffer`] records every call as an [`Insn`] and tracks the operand
//! stack depth (in slots) from each instruction's stack effect.

use std::fmt;

use crate::{ClassName, Constant, PrimitiveKind, Type};

// ── Operands ────────────────────────────────────────────────────────

/// A single primitive conversion step.
///
/// Conversions operate on stack kinds (`int`, `long`, `float`, `double`);
/// the three narrowing steps `I2B`, `I2C`, `I2S` truncate an `int` to a
/// sub-int range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Conversion {
    I2L,
    I2F,
    I2D,
    L2I,
    L2F,
    L2D,
    F2I,
    F2L,
    F2D,
    D2I,
    D2L,
    D2F,
    I2B,
    I2C,
    I2S,
}

impl Conversion {
    /// Kind consumed from the stack.
    pub const fn source(self) -> PrimitiveKind {
        match self {
            Self::I2L | Self::I2F | Self::I2D | Self::I2B | Self::I2C | Self::I2S => {
                PrimitiveKind::I32
            }
            Self::L2I | Self::L2F | Self::L2D => PrimitiveKind::I64,
            Self::F2I | Self::F2L | Self::F2D => PrimitiveKind::F32,
            Self::D2I | Self::D2L | Self::D2F => PrimitiveKind::F64,
        }
    }

    /// Kind produced on the stack.
    pub const fn target(self) -> PrimitiveKind {
        match self {
            Self::L2I | Self::F2I | Self::D2I => PrimitiveKind::I32,
            Self::I2L | Self::F2L | Self::D2L => PrimitiveKind::I64,
            Self::I2F | Self::L2F | Self::D2F => PrimitiveKind::F32,
            Self::I2D | Self::L2D | Self::F2D => PrimitiveKind::F64,
            Self::I2B => PrimitiveKind::I8,
            Self::I2C => PrimitiveKind::Char,
            Self::I2S => PrimitiveKind::I16,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::I2L => "i2l",
            Self::I2F => "i2f",
            Self::I2D => "i2d",
            Self::L2I => "l2i",
            Self::L2F => "l2f",
            Self::L2D => "l2d",
            Self::F2I => "f2i",
            Self::F2L => "f2l",
            Self::F2D => "f2d",
            Self::D2I => "d2i",
            Self::D2L => "d2l",
            Self::D2F => "d2f",
            Self::I2B => "i2b",
            Self::I2C => "i2c",
            Self::I2S => "i2s",
        }
    }
}

/// Dispatch flavour of a call instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InvokeKind {
    Static,
    Virtual,
    Interface,
    Special,
}

impl InvokeKind {
    /// Every flavour except `Static` consumes a receiver.
    #[inline]
    pub const fn has_receiver(self) -> bool {
        !matches!(self, Self::Static)
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Static => "invokestatic",
            Self::Virtual => "invokevirtual",
            Self::Interface => "invokeinterface",
            Self::Special => "invokespecial",
        }
    }
}

/// A resolved method reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodRef {
    pub owner: ClassName,
    pub name: String,
    pub params: Vec<Type>,
    pub ret: Type,
}

impl MethodRef {
    pub fn new(owner: ClassName, name: impl Into<String>, params: Vec<Type>, ret: Type) -> Self {
        Self {
            owner,
            name: name.into(),
            params,
            ret,
        }
    }

    /// Method descriptor, e.g. `(IJ)Ljava/lang/String;`.
    pub fn descriptor(&self) -> String {
        let mut out = String::from("(");
        for param in &self.params {
            param.write_descriptor(&mut out);
        }
        out.push(')');
        self.ret.write_descriptor(&mut out);
        out
    }

    /// Slots consumed by the arguments, receiver excluded.
    pub fn arg_slots(&self) -> i32 {
        self.params.iter().map(|p| i32::from(p.size())).sum()
    }
}

/// A resolved field reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldRef {
    pub owner: ClassName,
    pub name: String,
    pub ty: Type,
}

impl FieldRef {
    pub fn new(owner: ClassName, name: impl Into<String>, ty: Type) -> Self {
        Self {
            owner,
            name: name.into(),
            ty,
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:{}", self.owner, self.name, self.ty.descriptor())
    }
}

// ── Sink contract ───────────────────────────────────────────────────

/// Low-level instruction emitter.
///
/// Each method appends exactly one operation. Implementations do not
/// validate operand types; the code generator is trusted to produce
/// well-typed sequences.
pub trait InstructionSink {
    /// Push a constant.
    fn push_const(&mut self, value: &Constant);

    /// Load local `slot` of type `ty`.
    fn load(&mut self, ty: &Type, slot: u16);

    /// Store the stack top into local `slot` of type `ty`.
    fn store(&mut self, ty: &Type, slot: u16);

    /// `receiver -> value`
    fn get_field(&mut self, field: &FieldRef);

    /// `-> value`
    fn get_static(&mut self, field: &FieldRef);

    /// `receiver, value ->`
    fn put_field(&mut self, field: &FieldRef);

    /// `value ->`
    fn put_static(&mut self, field: &FieldRef);

    /// `array, index -> value`
    fn array_load(&mut self, elem: &Type);

    /// `array, index, value ->`
    fn array_store(&mut self, elem: &Type);

    /// `length -> array`
    fn new_array(&mut self, elem: &Type);

    /// Call `method`, consuming the receiver (if any) and arguments.
    fn invoke(&mut self, kind: InvokeKind, method: &MethodRef);

    /// Apply one primitive conversion step.
    fn convert(&mut self, conversion: Conversion);

    /// Box a primitive into its wrapper class.
    fn box_primitive(&mut self, kind: PrimitiveKind);

    /// Unbox a reference of class `owner` (a wrapper or `Number`) into `to`.
    fn unbox(&mut self, owner: &ClassName, to: PrimitiveKind);

    /// Runtime-checked reference cast.
    fn checkcast(&mut self, ty: &Type);

    /// Duplicate the top `size` slots (1 or 2).
    fn dup(&mut self, size: u8);

    /// Discard the top `size` slots (1 or 2).
    fn pop(&mut self, size: u8);
}

// ── Recorded instructions ───────────────────────────────────────────

/// One recorded sink call.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Insn {
    Const(Constant),
    Load { ty: Type, slot: u16 },
    Store { ty: Type, slot: u16 },
    GetField(FieldRef),
    GetStatic(FieldRef),
    PutField(FieldRef),
    PutStatic(FieldRef),
    ArrayLoad(Type),
    ArrayStore(Type),
    NewArray(Type),
    Invoke { kind: InvokeKind, method: MethodRef },
    Convert(Conversion),
    Box(PrimitiveKind),
    Unbox { owner: ClassName, to: PrimitiveKind },
    CheckCast(Type),
    Dup(u8),
    Pop(u8),
}

impl Insn {
    /// Net change in operand stack depth, in slots.
    pub fn stack_effect(&self) -> i32 {
        let slots = |ty: &Type| i32::from(ty.size());
        match self {
            Self::Const(value) => slots(&value.natural_type()),
            Self::Load { ty, .. } | Self::GetStatic(FieldRef { ty, .. }) => slots(ty),
            Self::Store { ty, .. } | Self::PutStatic(FieldRef { ty, .. }) => -slots(ty),
            Self::GetField(field) => slots(&field.ty) - 1,
            Self::PutField(field) => -slots(&field.ty) - 1,
            Self::ArrayLoad(elem) => slots(elem) - 2,
            Self::ArrayStore(elem) => -slots(elem) - 2,
            Self::NewArray(_) | Self::CheckCast(_) => 0,
            Self::Invoke { kind, method } => {
                let receiver = i32::from(kind.has_receiver());
                slots(&method.ret) - method.arg_slots() - receiver
            }
            Self::Convert(conversion) => {
                i32::from(conversion.target().size()) - i32::from(conversion.source().size())
            }
            Self::Box(kind) => 1 - i32::from(kind.size()),
            Self::Unbox { to, .. } => i32::from(to.size()) - 1,
            Self::Dup(size) => i32::from(*size),
            Self::Pop(size) => -i32::from(*size),
        }
    }
}

impl fmt::Display for Insn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(value) => write!(f, "push {value}"),
            Self::Load { ty, slot } => write!(f, "load {ty} #{slot}"),
            Self::Store { ty, slot } => write!(f, "store {ty} #{slot}"),
            Self::GetField(field) => write!(f, "getfield {field}"),
            Self::GetStatic(field) => write!(f, "getstatic {field}"),
            Self::PutField(field) => write!(f, "putfield {field}"),
            Self::PutStatic(field) => write!(f, "putstatic {field}"),
            Self::ArrayLoad(elem) => write!(f, "aload {elem}"),
            Self::ArrayStore(elem) => write!(f, "astore {elem}"),
            Self::NewArray(elem) => write!(f, "newarray {elem}"),
            Self::Invoke { kind, method } => write!(
                f,
                "{} {}.{}{}",
                kind.mnemonic(),
                method.owner,
                method.name,
                method.descriptor()
            ),
            Self::Convert(conversion) => f.write_str(conversion.mnemonic()),
            Self::Box(kind) => write!(f, "box {kind}"),
            Self::Unbox { owner, to } => write!(f, "unbox {owner} -> {to}"),
            Self::CheckCast(ty) => write!(f, "checkcast {ty}"),
            Self::Dup(1) => f.write_str("dup"),
            Self::Dup(_) => f.write_str("dup2"),
            Self::Pop(1) => f.write_str("pop"),
            Self::Pop(_) => f.write_str("pop2"),
        }
    }
}

// ── Recording sink ──────────────────────────────────────────────────

/// Sink that records instructions in emission order.
///
/// Stack depth is tracked in slots. Depth may go negative when a sequence
/// consumes values pushed before recording started (e.g. a store whose
/// value was produced elsewhere); [`max_depth`](Self::max_depth) only
/// counts what was pushed here.
#[derive(Clone, Debug, Default)]
pub struct InsnBuffer {
    insns: Vec<Insn>,
    depth: i32,
    max_depth: i32,
}

impl InsnBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insns(&self) -> &[Insn] {
        &self.insns
    }

    pub fn into_insns(self) -> Vec<Insn> {
        self.insns
    }

    /// Current stack depth relative to the start of recording.
    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Highest depth reached so far.
    pub fn max_depth(&self) -> i32 {
        self.max_depth
    }

    pub fn len(&self) -> usize {
        self.insns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insns.is_empty()
    }

    /// Forget recorded instructions and reset depth tracking.
    pub fn clear(&mut self) {
        self.insns.clear();
        self.depth = 0;
        self.max_depth = 0;
    }

    fn record(&mut self, insn: Insn) {
        self.depth += insn.stack_effect();
        self.max_depth = self.max_depth.max(self.depth);
        self.insns.push(insn);
    }
}

impl InstructionSink for InsnBuffer {
    fn push_const(&mut self, value: &Constant) {
        self.record(Insn::Const(value.clone()));
    }

    fn load(&mut self, ty: &Type, slot: u16) {
        self.record(Insn::Load {
            ty: ty.clone(),
            slot,
        });
    }

    fn store(&mut self, ty: &Type, slot: u16) {
        self.record(Insn::Store {
            ty: ty.clone(),
            slot,
        });
    }

    fn get_field(&mut self, field: &FieldRef) {
        self.record(Insn::GetField(field.clone()));
    }

    fn get_static(&mut self, field: &FieldRef) {
        self.record(Insn::GetStatic(field.clone()));
    }

    fn put_field(&mut self, field: &FieldRef) {
        self.record(Insn::PutField(field.clone()));
    }

    fn put_static(&mut self, field: &FieldRef) {
        self.record(Insn::PutStatic(field.clone()));
    }

    fn array_load(&mut self, elem: &Type) {
        self.record(Insn::ArrayLoad(elem.clone()));
    }

    fn array_store(&mut self, elem: &Type) {
        self.record(Insn::ArrayStore(elem.clone()));
    }

    fn new_array(&mut self, elem: &Type) {
        self.record(Insn::NewArray(elem.clone()));
    }

    fn invoke(&mut self, kind: InvokeKind, method: &MethodRef) {
        self.record(Insn::Invoke {
            kind,
            method: method.clone(),
        });
    }

    fn convert(&mut self, conversion: Conversion) {
        self.record(Insn::Convert(conversion));
    }

    fn box_primitive(&mut self, kind: PrimitiveKind) {
        self.record(Insn::Box(kind));
    }

    fn unbox(&mut self, owner: &ClassName, to: PrimitiveKind) {
        self.record(Insn::Unbox {
            owner: owner.clone(),
            to,
        });
    }

    fn checkcast(&mut self, ty: &Type) {
        self.record(Insn::CheckCast(ty.clone()));
    }

    fn dup(&mut self, size: u8) {
        debug_assert!(matches!(size, 1 | 2), "dup of {size} slots");
        self.record(Insn::Dup(size));
    }

    fn pop(&mut self, size: u8) {
        debug_assert!(matches!(size, 1 | 2), "pop of {size} slots");
        self.record(Insn::Pop(size));
    }
}
