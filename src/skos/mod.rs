//! OWL to SKOS normalization.
//!
//! [`Owl2SkosConverter`] runs an ordered list of [`rules::ConstructRule`]s
//! over an extracted subgraph, seals the resulting hierarchy with
//! [`HierarchySealer`] and optionally checks it with [`SkosValidator`].

pub mod converter;
pub mod identifier;
pub mod rules;
pub mod sealer;
pub mod validator;

pub use converter::{Conversion, ConversionMode, Owl2SkosConfig, Owl2SkosConverter, ValidationLevel};
pub use identifier::derive_identifier;
pub use sealer::{HierarchySealer, SealReport};
pub use validator::{SkosValidator, Violation};

use thiserror::Error;

use crate::ontology::{Iri, IriError};

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("scheme `{scheme}` has no top concept")]
    MissingTopConcept { scheme: Iri },

    #[error("scheme `{scheme}` has {} top concepts", .candidates.len())]
    AmbiguousTopConcept { scheme: Iri, candidates: Vec<Iri> },

    #[error("SKOS validation failed with {} violation(s)", .violations.len())]
    Validation { violations: Vec<Violation> },

    #[error("`{name}` does not form a valid IRI in the target namespace")]
    InvalidName {
        name: String,
        #[source]
        source: IriError,
    },
}

impl ConversionError {
    /// Scheme and concept identifiers the error is about.
    #[must_use]
    pub fn offending(&self) -> Vec<&Iri> {
        match self {
            Self::MissingTopConcept { scheme } => vec![scheme],
            Self::AmbiguousTopConcept { scheme, candidates } => {
                std::iter::once(scheme).chain(candidates).collect()
            }
            Self::Validation { violations } => violations.iter().flat_map(Violation::concepts).collect(),
            Self::InvalidName { .. } => Vec::new(),
        }
    }
}
