//! Top-level error surface of the generator.
//!
//! Each pipeline stage owns its error enum next to its code
//! ([`LoadError`](crate::loader::LoadError), [`DslError`](crate::dsl::DslError),
//! [`GraphError`](crate::graph::GraphError), [`EmitError`](crate::emit::EmitError));
//! this module aggregates them so the orchestrator and the CLI handle a single
//! type. Warnings are not errors: they go through `tracing::warn!` and
//! generation continues.

use std::path::Path;

use thiserror::Error;

use crate::{dsl::DslError, emit::EmitError, graph::GraphError, loader::LoadError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Dsl(#[from] DslError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error("failed to read config {path}: {message}")]
    Config { path: String, message: String },

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// A source position, printed as `file:line:column`.
///
/// Line and column are 1-based; a zeroed location means the position is
/// unknown (e.g. a synthesized node).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(file: impl Into<String>, span: proc_macro2::Span) -> Self {
        let start = span.start();
        Self {
            file: file.into(),
            line: start.line,
            column: start.column + 1,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}
