//! Ontology primitives shared by every pipeline stage.
//!
//! The module keeps RDF handling behind small value objects and one query
//! trait ([`TripleQuery`]), so extraction, conversion and abstraction never
//! depend on a particular parser or store.

pub mod document;
pub mod model;
pub mod reasoner;
pub mod value_objects;
pub mod vocab;

pub use document::{Catalog, DocumentError, LoadedOntology, OntologyLoader};
pub use model::{Literal, Model, Node, Pattern, Statement, TripleQuery};
pub use reasoner::{HierarchyReasoner, Reasoner};
pub use value_objects::{Iri, IriError};
