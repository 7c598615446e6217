//! Compile formal ontologies into closed, enumerable terminologies.
//!
//! The pipeline runs leaves first:
//!
//! 1. [`mireot`] extracts a bounded subgraph around a root entity.
//! 2. [`skos`] rewrites that subgraph into a sealed SKOS concept scheme.
//! 3. [`terminology`] abstracts the SKOS model into a [`ConceptGraph`],
//!    linearizes and closes its hierarchy, and merges releases into a
//!    [`VersionedConceptGraph`].
//!
//! [`compiler`] wires the stages together for batch runs driven by
//! [`config::Config`].
pub use self::errors::Error;

pub mod compiler;
pub mod config;
pub mod errors;
pub mod logger;
pub mod mireot;
pub mod ontology;
pub mod skos;
pub mod terminology;

#[cfg(feature = "cli")]
pub mod cli;

pub use terminology::{ConceptGraph, ConceptScheme, Term, VersionedConceptGraph};

/// Application results options list
pub type Result<T, E = Error> = std::result::Result<T, E>;
