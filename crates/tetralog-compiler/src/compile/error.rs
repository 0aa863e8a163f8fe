//! Compile-time errors. All of these abort compilation before any
//! execution begins; unification failure is never an error.

use thiserror::Error;

use crate::module::LoadError;

#[derive(Debug, Error)]
pub enum CompileError {
    /// Malformed pattern: wrong kind of term in a position.
    #[error("malformed pattern: {0}")]
    Structural(String),

    /// A pattern references a graph/predicate/module nothing defines.
    #[error("unknown {kind}: {name}")]
    ResourceNotFound { kind: &'static str, name: String },

    /// The injected module loader rejected a load.
    #[error("loading module {name} failed")]
    Loader {
        name: String,
        #[source]
        source: LoadError,
    },
}
