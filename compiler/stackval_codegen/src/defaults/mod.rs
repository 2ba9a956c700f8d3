//! Inherited default arguments.
//!
//! A parameter that overrides one or more declarations (through several
//! implemented interfaces, say) may take its default value from any of them.
//! The override relation forms a DAG; [`OverrideGraph::find_inherited_default`]
//! searches it depth-first in pre-order, starting at the parameter itself,
//! and stops at the first declaration that both declares a default and has
//! one readable from an annotation.
//!
//! [`find_default_argument_value`] then turns that annotation payload into a
//! [`StackValue`] of the requested type.

mod lexical;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use stackval_types::{ClassName, Type};

use crate::{CodegenError, StackValue};

pub use lexical::{lexical_cast, LexicalValue};

// ── Declarations ────────────────────────────────────────────────

/// Index of a [`ParamDecl`] in its [`OverrideGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ParamId(u32);

impl ParamId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Default value captured from an annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefaultValue {
    /// The explicit null marker.
    Null,
    /// Literal text, cast by the parameter's declared type.
    String(String),
}

/// Declared type of a parameter, as far as lexical casting cares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceType {
    Bool,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    /// An enum class and its entry names.
    Enum {
        class: ClassName,
        entries: Vec<String>,
    },
    /// Any type literals cannot express.
    Other(String),
}

/// A value parameter declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: String,
    pub source_type: SourceType,
    /// Whether the declaration has a default value at all.
    pub declares_default: bool,
    /// The default, if one is readable from an annotation.
    pub annotation: Option<DefaultValue>,
    /// Directly overridden declarations, in declared order.
    pub overridden: Vec<ParamId>,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            name: name.into(),
            source_type,
            declares_default: false,
            annotation: None,
            overridden: Vec::new(),
        }
    }

    /// Mark the declaration as having a default without an annotation.
    #[must_use]
    pub fn with_default(mut self) -> Self {
        self.declares_default = true;
        self
    }

    /// Declare a default readable from an annotation.
    #[must_use]
    pub fn with_annotation(mut self, value: DefaultValue) -> Self {
        self.declares_default = true;
        self.annotation = Some(value);
        self
    }

    #[must_use]
    pub fn overriding(mut self, overridden: impl IntoIterator<Item = ParamId>) -> Self {
        self.overridden.extend(overridden);
        self
    }

    /// The annotation default, if this declaration supplies one.
    fn capturable_default(&self) -> Option<&DefaultValue> {
        if self.declares_default {
            self.annotation.as_ref()
        } else {
            None
        }
    }
}

// ── Graph ───────────────────────────────────────────────────────

/// Arena of parameter declarations linked by override edges.
///
/// A declaration can only override declarations added before it, so the
/// graph is acyclic by construction.
#[derive(Clone, Debug, Default)]
pub struct OverrideGraph {
    params: Vec<ParamDecl>,
}

impl OverrideGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration and return its id.
    ///
    /// # Panics
    ///
    /// Panics if `decl` overrides an id this graph has not handed out yet.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "parameter counts fit in u32"
    )]
    pub fn add(&mut self, decl: ParamDecl) -> ParamId {
        let id = ParamId::new(self.params.len() as u32);
        assert!(
            decl.overridden.iter().all(|o| *o < id),
            "`{}` overrides a declaration that does not exist yet",
            decl.name
        );
        self.params.push(decl);
        id
    }

    /// # Panics
    ///
    /// Panics if `id` did not come from this graph.
    #[inline]
    pub fn get(&self, id: ParamId) -> &ParamDecl {
        &self.params[id.index()]
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// First declaration in pre-order from `param` (inclusive) that supplies
    /// an annotation default.
    pub fn find_inherited_default(&self, param: ParamId) -> Result<ParamId, CodegenError> {
        let mut stack: SmallVec<[ParamId; 8]> = SmallVec::new();
        let mut visited = FxHashSet::default();
        stack.push(param);

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let decl = self.get(id);
            if decl.capturable_default().is_some() {
                tracing::debug!(
                    param = %self.get(param).name,
                    found = id.raw(),
                    visited = visited.len(),
                    "inherited default"
                );
                return Ok(id);
            }
            // Reversed so the first overridden declaration pops first.
            stack.extend(
                decl.overridden
                    .iter()
                    .rev()
                    .copied()
                    .filter(|o| !visited.contains(o)),
            );
        }

        Err(CodegenError::MissingInheritedDefault {
            param: self.get(param).name.clone(),
        })
    }
}

// ── Materialization ─────────────────────────────────────────────

/// The default argument of `param` as a value of type `target`.
///
/// The annotation text is cast by `param`'s own declared type. Scalars are
/// built at the unboxed form of `target` and coerced back to it, so a boxed
/// target gets a boxing step.
pub fn find_default_argument_value<'a>(
    graph: &OverrideGraph,
    param: ParamId,
    target: &Type,
) -> Result<StackValue<'a>, CodegenError> {
    let found = graph.find_inherited_default(param)?;
    let decl = graph.get(param);

    let text = match graph.get(found).capturable_default() {
        Some(DefaultValue::String(text)) => text,
        Some(DefaultValue::Null) | None => return Ok(StackValue::null(target.clone())),
    };

    match lexical_cast(&decl.source_type, text) {
        Some(LexicalValue::EnumEntry { class, entry }) => Ok(StackValue::enum_entry(class, entry)),
        Some(LexicalValue::Constant(value)) => {
            let unboxed = target.unboxed_or_self();
            let constant = if value.natural_type() == unboxed {
                StackValue::constant(value, unboxed)
            } else {
                // Declared and requested types disagree (`int` read as `long`).
                StackValue::coercion(StackValue::literal(value), unboxed)
            };
            Ok(StackValue::coercion(constant, target.clone()))
        }
        None => Err(CodegenError::UncheckedDefaultLiteral {
            param: decl.name.clone(),
            value: text.clone(),
        }),
    }
}
