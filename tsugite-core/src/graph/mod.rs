//! # Graph Builder
//!
//! Third stage of the pipeline: turns the flattened provider list of one
//! injector into a typed dependency DAG.
//!
//! Matching is purely by [`TypeKey`](type_key::TypeKey) — the canonical
//! identity of a type. Each provider becomes one or more
//! [`ProviderNode`](node::ProviderNode)s (struct expansion and interface
//! binding synthesize extra nodes), the `producers` table maps every
//! produced key to its node, and a reachability pass from the root resolves
//! every consumed key, collects injector parameters, and rejects the three
//! fatal shapes: a missing provider, two providers claiming one type, and a
//! dependency cycle.
//!
//! A graph is built afresh per injector, handed to the scheduler and the
//! emitter, then dropped; nothing is shared between injectors.

pub mod builder;
pub mod node;
pub mod type_key;

use thiserror::Error;

use crate::error::Location;

pub use builder::{Graph, Param, build_graph};
pub use node::{Dependency, NodeId, NodeKind, Output, ParamMode, ProviderNode};
pub use type_key::{TypeKey, TypeKeys};

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("{location}: no provider for type `{ty}` consumed by {consumer}")]
    MissingProvider {
        ty: String,
        consumer: String,
        location: Location,
    },

    #[error("{location}: injector `{injector}` has no provider for its root type `{ty}`")]
    NoRootProvider {
        ty: String,
        injector: String,
        location: Location,
    },

    #[error("multiple providers for type `{ty}`: first at {first}, again at {second}")]
    DuplicateProvider {
        ty: String,
        first: Location,
        second: Location,
    },

    #[error("{location}: dependency cycle: {chain}")]
    Cycle { chain: String, location: Location },
}
