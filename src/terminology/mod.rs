//! Terminology read model.
//!
//! A sealed SKOS model is abstracted into a [`ConceptGraph`] (schemes,
//! concepts and parent edges, plus the derived closure). Graphs of successive
//! releases fold into a [`VersionedConceptGraph`], which is what emitters walk
//! through a [`TerminologyCatalog`].
//!
//! Terms and schemes live in flat owned maps and refer to each other through
//! [`TermRef`] and scheme IRIs only.

pub mod abstractor;
pub mod catalog;
pub mod closure;
pub mod graph;
pub mod scheme;
pub mod sorter;
pub mod term;
pub mod versioned;

pub use abstractor::SkosTerminologyAbstractor;
pub use catalog::{EnumerationArtifact, EnumerationVariant, OutputLayout, TerminologyCatalog};
pub use closure::TransitiveClosure;
pub use graph::ConceptGraph;
pub use scheme::ConceptScheme;
pub use sorter::{CycleError, HierarchySorter};
pub use term::{LabelKind, Term, TermBuilder, TermRef};
pub use versioned::{ConceptTermSeries, SchemeRelease, VersionedConceptGraph};

use thiserror::Error;

use crate::ontology::Iri;

#[derive(Debug, Error)]
pub enum TerminologyError {
    #[error("unable to handle concept `{concept}` in more than one scheme: {}", list(.schemes))]
    MultipleSchemes { concept: Iri, schemes: Vec<Iri> },

    #[error("hierarchy of scheme `{scheme}` has a cycle through {}", list(.concepts))]
    CycleDetected { scheme: Iri, concepts: Vec<Iri> },

    #[error("concept `{concept}` refers to unknown scheme `{scheme}`")]
    UnknownScheme { concept: Iri, scheme: Iri },

    #[error("no scheme `{scheme}` in the concept graph")]
    SchemeNotFound { scheme: Iri },

    #[error("concept `{concept}` has the same identity as another concept of scheme `{scheme}`")]
    DuplicateConcept { concept: Iri, scheme: Iri },
}

impl TerminologyError {
    /// Concept and scheme identifiers the error is about.
    #[must_use]
    pub fn offending(&self) -> Vec<&Iri> {
        match self {
            Self::MultipleSchemes { concept, schemes } => {
                std::iter::once(concept).chain(schemes).collect()
            }
            Self::CycleDetected { scheme, concepts } => std::iter::once(scheme).chain(concepts).collect(),
            Self::UnknownScheme { concept, scheme } | Self::DuplicateConcept { concept, scheme } => {
                vec![concept, scheme]
            }
            Self::SchemeNotFound { scheme } => vec![scheme],
        }
    }
}

fn list(iris: &[Iri]) -> String {
    iris.iter()
        .map(|iri| format!("`{iri}`"))
        .collect::<Vec<_>>()
        .join(", ")
}
