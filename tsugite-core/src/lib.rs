//! # tsugite: compile-time dependency injection for Rust
//!
//! tsugite turns declarative injector specifications into plain Rust
//! functions. Users describe *what* to build — a root type plus the
//! providers that can construct its transitive dependencies — and the
//! generator figures out *how*: it resolves the dependency graph, orders
//! construction, runs independent async providers concurrently, and writes
//! the wiring code a careful engineer would have written by hand.
//!
//! ## The DSL
//!
//! Injectors are declared as never-compiled marker calls (gate the items
//! behind a cfg flag that is never enabled):
//!
//! ```text
//! #[cfg(tsugite)]
//! static INIT_APP: Injector = Inject::<App>(
//!     "init_app",
//!     Provide(new_config),
//!     Async(Provide(new_db)),
//!     Bind::<Arc<dyn Repository>>(Provide(new_pg_repo)),
//!     Arg::<u16>("port"),
//!     Provide(new_app),
//! );
//! ```
//!
//! Running `tsugite generate` over the file emits a sibling `*_gen.rs`
//! module containing `pub fn init_app(port: u16) -> Result<App, BoxError>`
//! (or `pub async fn` when any provider is async).
//!
//! ## Processing Pipeline
//!
//! ```text
//! Sources → Loader → DSL Parser → Graph Builder → Scheduler → Emitter → Writer
//! ```
//!
//! ### Stage 1: Loading
//!
//! The [`loader`] module parses every non-generated `.rs` file of a
//! directory as one *package* and collects declared signatures into a
//! symbol table — the type information the rest of the pipeline resolves
//! names against.
//!
//! ### Stage 2: DSL Parsing
//!
//! The [`dsl`] module recognizes marker calls, extracts injector
//! specifications and flattens provider sets.
//!
//! ### Stage 3: Graph Building
//!
//! The [`graph`] module canonicalizes type identities and unifies each
//! injector's providers into a validated DAG: one producer per type,
//! no cycles, everything reachable from the root resolved.
//!
//! ### Stage 4: Scheduling
//!
//! The [`schedule`] module linearizes the DAG — a deterministic
//! topological order for synchronous graphs, concurrency stages grouped by
//! async depth otherwise.
//!
//! ### Stage 5: Emission
//!
//! The [`emit`] module renders each schedule as a Rust function and each
//! source file's injectors as one formatted generated module.
//!
//! ### Stage 6: Writing
//!
//! The [`generate`] module coordinates the run and writes outputs
//! atomically — nothing is written until the whole run has rendered.
//!
//! ## Guarantees
//!
//! * Deterministic: identical inputs produce byte-identical outputs.
//! * Stateless: no caches or registries survive a run.
//! * All-or-nothing: a fatal error writes no files.

pub mod config;
pub mod dsl;
pub mod emit;
pub mod error;
pub mod generate;
pub mod graph;
pub mod loader;
pub mod schedule;

pub use config::GeneratorConfig;
pub use error::{Error, Location, Result};
pub use generate::{RunSummary, generate};
