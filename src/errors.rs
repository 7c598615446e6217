//! Crate level error type.
//!
//! Each subsystem owns a narrow error enum; this module folds them into a
//! single [`Error`] so the compiler and the CLI can propagate with `?`.
use std::path::PathBuf;

use crate::{
    ontology::{DocumentError, Iri, IriError},
    skos::ConversionError,
    terminology::TerminologyError,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Iri(#[from] IriError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Terminology(#[from] TerminologyError),

    #[error("cannot read configuration `{path}`: {source}")]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration `{path}`: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    JSON(#[from] serde_json::Error),
}

impl Error {
    pub fn string(s: &str) -> Self {
        Self::Message(s.to_string())
    }

    /// Returns `true` for errors that abort a single compilation unit
    /// because the source violates a structural invariant.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Conversion(ConversionError::MissingTopConcept { .. })
                | Self::Conversion(ConversionError::AmbiguousTopConcept { .. })
                | Self::Terminology(TerminologyError::MultipleSchemes { .. })
                | Self::Terminology(TerminologyError::CycleDetected { .. })
        )
    }

    /// Scheme and concept identifiers a structural or validation failure is
    /// about. Empty for every other error.
    #[must_use]
    pub fn offending(&self) -> Vec<Iri> {
        match self {
            Self::Conversion(err) => err.offending().into_iter().cloned().collect(),
            Self::Terminology(err) => err.offending().into_iter().cloned().collect(),
            Self::Document(DocumentError::UnresolvedImport { iri }) => vec![iri.clone()],
            _ => Vec::new(),
        }
    }
}
