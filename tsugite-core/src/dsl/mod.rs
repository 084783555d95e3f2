//! # DSL Parser
//!
//! Second stage of the pipeline: recognizes the injector DSL inside parsed
//! source files and turns it into [`InjectorSpec`](spec::InjectorSpec)
//! values.
//!
//! The DSL is a fixed set of *marker calls*. A top-level `static`/`const`
//! whose initializer is `Inject::<T>("name", providers…)` declares an
//! injector; inside its provider list the recognized forms are `Provide`,
//! `Value`, `Arg`, `Bind`, `As`, `AsMap`, `Async`, `Struct`, `Set` and bare
//! paths naming a set variable. Markers are never compiled (the declaring
//! items sit behind a never-enabled cfg flag), so only their syntactic shape
//! matters here — arities and type arguments are checked by this stage, not
//! by the compiler.
//!
//! The parser is tolerant of everything *outside* marker positions, and
//! strict inside them: an unrecognized call in a provider list is a hard
//! error with its source position.

pub mod normalize;
pub mod parse;
pub mod spec;

use std::str::FromStr;

use thiserror::Error;

use crate::error::Location;

pub use normalize::flatten;
pub use parse::extract_injectors;
pub use spec::{InjectorSpec, ProviderSpec};

/// The marker vocabulary, matched against the final path segment of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum Marker {
    Inject,
    Provide,
    Value,
    Arg,
    Bind,
    As,
    AsMap,
    Async,
    Struct,
    Set,
}

impl Marker {
    pub fn recognize(ident: &str) -> Option<Self> {
        Self::from_str(ident).ok()
    }
}

#[derive(Error, Debug)]
pub enum DslError {
    #[error("{location}: `{found}` is not a recognized provider form")]
    UnrecognizedMarker { location: Location, found: String },

    #[error("{location}: `{marker}` expects {expected}")]
    BadArity {
        location: Location,
        marker: Marker,
        expected: String,
    },

    #[error("{location}: `{marker}` requires a string-literal name")]
    BadName { location: Location, marker: Marker },

    #[error("{location}: `{marker}` requires an explicit type argument")]
    MissingTypeArgument { location: Location, marker: Marker },

    #[error("{location}: `Inject` cannot appear inside a provider list")]
    NestedInject { location: Location },

    #[error("{location}: unknown set `{name}`")]
    UnknownSet { location: Location, name: String },

    #[error("{location}: set reference cycle: {chain}")]
    SetCycle { location: Location, chain: String },

    #[error("{location}: no function `{name}` declared in this package")]
    UnknownProvider { location: Location, name: String },

    #[error("{location}: no struct `{name}` declared in this package")]
    UnknownStruct { location: Location, name: String },

    #[error("{location}: `{name}` has no named fields to expand")]
    NotExpandable { location: Location, name: String },

    #[error("{location}: `Async` applies only to function providers")]
    AsyncOnNonFunction { location: Location },

    #[error("{location}: cannot infer the value's type; use `Value::<T>(…)`")]
    UnresolvedValueType { location: Location },

    #[error("{location}: {message}")]
    BadBind { location: Location, message: String },

    #[error("{location}: injector `{name}` declared more than once in this file")]
    DuplicateInjector { location: Location, name: String },
}
