use oxrdf::NamedNodeRef;
use serde::{Deserialize, Serialize};

use crate::ontology::{value_objects::Iri, vocab};

/// Kind of entity the extraction walks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    #[default]
    Class,
    ObjectProperty,
    DataProperty,
    Individual,
}

impl EntityType {
    /// Predicate linking a child entity to its parent.
    #[must_use]
    pub fn hierarchy_predicate(self) -> NamedNodeRef<'static> {
        match self {
            Self::Class => vocab::SUB_CLASS_OF,
            Self::ObjectProperty | Self::DataProperty => vocab::SUB_PROPERTY_OF,
            Self::Individual => vocab::TYPE,
        }
    }

    /// OWL class that declares entities of this kind.
    #[must_use]
    pub fn declaration(self) -> NamedNodeRef<'static> {
        match self {
            Self::Class => vocab::CLASS,
            Self::ObjectProperty => vocab::OBJECT_PROPERTY,
            Self::DataProperty => vocab::DATATYPE_PROPERTY,
            Self::Individual => vocab::NAMED_INDIVIDUAL,
        }
    }
}

/// Inclusive hop-count window around the root. `None` leaves a side open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthBounds {
    #[serde(default)]
    pub min: Option<u32>,
    #[serde(default)]
    pub max: Option<u32>,
}

impl DepthBounds {
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn between(min: u32, max: u32) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Only the root itself.
    #[must_use]
    pub fn root_only() -> Self {
        Self::between(0, 0)
    }

    #[must_use]
    pub fn contains(&self, depth: u32) -> bool {
        self.min.map_or(true, |min| depth >= min) && self.max.map_or(true, |max| depth <= max)
    }

    /// Whether nodes past `depth` may still be in range.
    #[must_use]
    pub fn can_descend_past(&self, depth: u32) -> bool {
        self.max.map_or(true, |max| depth < max)
    }
}

/// Extraction settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MireotConfig {
    /// Namespace for [`MireotConfig::namespace_scoped`] and for resolving a
    /// root given as a bare local name.
    #[serde(default)]
    pub base_uri: Option<Iri>,
    #[serde(default)]
    pub entity_type: EntityType,
    #[serde(default)]
    pub min_depth: Option<u32>,
    #[serde(default)]
    pub max_depth: Option<u32>,
    /// Keep the root and its annotations, nothing else.
    #[serde(default)]
    pub entity_only: bool,
    /// Do not walk into entities outside the base (or root) namespace.
    #[serde(default)]
    pub namespace_scoped: bool,
}

impl MireotConfig {
    #[must_use]
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_depth(mut self, bounds: DepthBounds) -> Self {
        self.min_depth = bounds.min;
        self.max_depth = bounds.max;
        self
    }

    #[must_use]
    pub fn with_base_uri(mut self, base_uri: Iri) -> Self {
        self.base_uri = Some(base_uri);
        self
    }

    #[must_use]
    pub fn entity_only(mut self, entity_only: bool) -> Self {
        self.entity_only = entity_only;
        self
    }

    #[must_use]
    pub fn namespace_scoped(mut self, scoped: bool) -> Self {
        self.namespace_scoped = scoped;
        self
    }

    /// Effective bounds after applying [`MireotConfig::entity_only`].
    #[must_use]
    pub fn bounds(&self) -> DepthBounds {
        if self.entity_only {
            DepthBounds::root_only()
        } else {
            DepthBounds {
                min: self.min_depth,
                max: self.max_depth,
            }
        }
    }

    /// Resolves `root` against the base namespace when it is not an IRI.
    pub fn resolve_root(&self, root: &str) -> Result<Iri, crate::ontology::IriError> {
        match (Iri::new(root), &self.base_uri) {
            (Ok(iri), _) => Ok(iri),
            (Err(_), Some(base)) => base.join(root),
            (Err(err), None) => Err(err),
        }
    }
}
