//! Minimum information to reference an external ontology term.
//!
//! Instead of importing a whole ontology, [`MireotExtractor`] keeps the root
//! entity and its ancestors and descendants inside a [`DepthBounds`] window.

pub mod config;
pub mod extractor;

pub use config::{DepthBounds, EntityType, MireotConfig};
pub use extractor::{extract_classes, is_declared, MireotExtractor};
