//! Deferred value emission for stack-machine code generation.
//!
//! Expressions are lowered into [`StackValue`] trees first and materialized
//! later, once the consuming context knows which type it needs. Putting a
//! value emits its instructions into an [`InstructionSink`] and coerces the
//! result to the requested type.
//!
//! # Architecture
//!
//! - [`StackValue`]: the deferred value variants and their
//!   receiver/selector emission.
//! - [`coerce`]: the stateless coercion resolver (conversions, boxing,
//!   unboxing, reference casts).
//! - [`defaults`]: inherited default-argument resolution over the override
//!   graph.
//!
//! Every emitting operation returns `Result<_, CodegenError>`. An error is an
//! internal-consistency fault, never a user diagnostic.
//!
//! # Tracing
//!
//! Enable with `RUST_LOG=stackval_codegen=debug` (default resolution) or
//! `RUST_LOG=stackval_codegen=trace` (every coercion) after calling
//! [`init_tracing`].
//!
//! [`InstructionSink`]: stackval_types::InstructionSink

use std::sync::Once;

mod coerce;
pub mod defaults;
mod error;
mod value;

pub use coerce::coerce;
pub use defaults::{
    find_default_argument_value, lexical_cast, DefaultValue, LexicalValue, OverrideGraph,
    ParamDecl, ParamId, SourceType,
};
pub use error::CodegenError;
pub use value::{CleanupFn, EmitFn, OperationKind, StackValue};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
