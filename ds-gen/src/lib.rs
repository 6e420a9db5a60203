#![deny(
    // This is overly strict, of course. The intent is somewhat of a "quality seal," less to fix everything, and more to force us to add inline allows, which are even more needlessly verbose, but give us a mechanism to say "we think this is okay, but you might want to take a second look here."
    clippy::nursery,
    clippy::pedantic,
)]
#![allow(clippy::module_name_repetitions)]

//! # ds-gen – synthetic records for graph-shaped data dictionaries
//!
//! ds-gen compiles a data dictionary (a set of entity types, their properties and the links
//! between them) into a dependency graph, and then synthesizes records for every entity type
//! in an order where no record ever references a parent that does not exist yet.
//!
//! ## Pipeline overview
//! 1. Definition construction ([`EntityDefinition::from_schema`]) – Turn each parsed per-type
//!    schema object into a structured definition. Missing `category`/`properties`/`links` keys
//!    are fatal.
//! 2. Graph construction ([`DependencyGraph::derive_edges`]) – Resolve every declared link to
//!    its target type. Required links become the ordering constraints.
//! 3. Validation ([`DependencyGraph::validate_all`]) – Check required properties and required
//!    links, reporting through a [`FailurePolicy`] so a diagnostic pass can see every defect.
//! 4. Ordering ([`DependencyGraph::topological_order`],
//!    [`DependencyGraph::ordered_path_to`]) – Kahn's algorithm with declaration-order
//!    tie-breaking; required cycles are fatal.
//! 5. Synthesis ([`DependencyGraph::synthesize`], [`DependencyGraph::synthesize_all`]) –
//!    Reconcile record counts against parent datasets, synthesize property values
//!    ([`property::synthesize`]) and attach link references ([`ResolvedLink::reference`]).
//!
//! Everything lives in one [`DependencyGraph`] per run, datasets included, so independent runs
//! never share state. All stages are annotated with [`tracing`] spans.

pub mod errors;
pub mod graph;
pub mod links;
pub mod model;
pub mod policy;
pub mod property;
pub mod simulation;
pub mod utils;

pub use errors::{
    SimError,
    SimResult,
};
pub use graph::DependencyGraph;
pub use links::{
    Container,
    LinkKind,
    ResolvedLink,
};
pub use model::{
    Cardinality,
    EntityDefinition,
    LinkReference,
    Relationship,
    SynthesizedRecord,
};
pub use policy::FailurePolicy;
pub use simulation::{
    InstanceCounts,
    SynthesisOptions,
};

#[cfg(test)]
mod tests;
