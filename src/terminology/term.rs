use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use chrono::NaiveDate;
use oxrdf::NamedNodeRef;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ontology::{value_objects::Iri, vocab};

/// Key of one version of one concept. Edge and closure maps are keyed by it.
///
/// Identifiers are derived from local names, so the same `uuid` may denote
/// unrelated concepts of different schemes. The versioned IRI of the owning
/// scheme keeps those apart.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TermRef {
    pub scheme: Iri,
    pub uuid: Uuid,
    pub version_tag: String,
}

impl Display for TermRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.version_tag.is_empty() {
            write!(f, "{}", self.uuid)
        } else {
            write!(f, "{}@{}", self.uuid, self.version_tag)
        }
    }
}

/// Kind of a concept label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    Preferred,
    Alternative,
    Hidden,
    Rdfs,
}

impl LabelKind {
    pub const ALL: [Self; 4] = [Self::Preferred, Self::Alternative, Self::Hidden, Self::Rdfs];

    /// RDF property carrying labels of this kind.
    #[must_use]
    pub fn predicate(self) -> NamedNodeRef<'static> {
        match self {
            Self::Preferred => vocab::PREF_LABEL,
            Self::Alternative => vocab::ALT_LABEL,
            Self::Hidden => vocab::HIDDEN_LABEL,
            Self::Rdfs => vocab::LABEL,
        }
    }
}

/// One version of a concept.
///
/// Terms are immutable once built; see [`TermBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Term {
    concept_id: Iri,
    namespace_uri: Iri,
    uuid: Uuid,
    tag: String,
    labels: BTreeMap<LabelKind, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    notations: Vec<String>,
    referent: Iri,
    #[serde(skip_serializing_if = "Option::is_none")]
    established_on: Option<NaiveDate>,
    version_tag: String,
    scheme_id: Iri,
}

impl Term {
    #[must_use]
    pub fn builder(concept_id: Iri, namespace_uri: Iri, uuid: Uuid, tag: impl Into<String>) -> TermBuilder {
        TermBuilder::new(concept_id, namespace_uri, uuid, tag)
    }

    /// Key of this version of the concept within its owning scheme version.
    #[must_use]
    pub fn reference(&self) -> TermRef {
        TermRef {
            scheme: self.scheme_id.clone(),
            uuid: self.uuid,
            version_tag: self.version_tag.clone(),
        }
    }

    #[must_use]
    pub fn concept_id(&self) -> &Iri {
        &self.concept_id
    }

    #[must_use]
    pub fn namespace_uri(&self) -> &Iri {
        &self.namespace_uri
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Primary label: the first preferred label, else the first RDFS label,
    /// else the tag.
    #[must_use]
    pub fn label(&self) -> &str {
        self.labels(LabelKind::Preferred)
            .first()
            .or_else(|| self.labels(LabelKind::Rdfs).first())
            .map_or(self.tag.as_str(), String::as_str)
    }

    #[must_use]
    pub fn labels(&self, kind: LabelKind) -> &[String] {
        self.labels.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    #[must_use]
    pub fn notations(&self) -> &[String] {
        &self.notations
    }

    #[must_use]
    pub fn referent(&self) -> &Iri {
        &self.referent
    }

    #[must_use]
    pub fn established_on(&self) -> Option<NaiveDate> {
        self.established_on
    }

    #[must_use]
    pub fn version_tag(&self) -> &str {
        &self.version_tag
    }

    /// Versioned IRI of the scheme owning this term.
    #[must_use]
    pub fn scheme_id(&self) -> &Iri {
        &self.scheme_id
    }

    pub(crate) fn assign_scheme(&mut self, scheme_id: &Iri) {
        self.scheme_id = scheme_id.clone();
    }

    /// Same real-world concept, regardless of version.
    #[must_use]
    pub fn same_entity(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }

    /// Same concept and same version.
    #[must_use]
    pub fn same_version(&self, other: &Self) -> bool {
        self.same_entity(other) && self.version_tag == other.version_tag
    }
}

/// Assembles a [`Term`].
#[derive(Clone, Debug)]
pub struct TermBuilder {
    term: Term,
}

impl TermBuilder {
    fn new(concept_id: Iri, namespace_uri: Iri, uuid: Uuid, tag: impl Into<String>) -> Self {
        Self {
            term: Term {
                referent: concept_id.clone(),
                concept_id,
                scheme_id: namespace_uri.clone(),
                namespace_uri,
                uuid,
                tag: tag.into(),
                labels: BTreeMap::new(),
                comment: None,
                notations: Vec::new(),
                established_on: None,
                version_tag: String::new(),
            },
        }
    }

    /// Adds a label; duplicates of the same kind are ignored.
    #[must_use]
    pub fn label(mut self, kind: LabelKind, text: impl Into<String>) -> Self {
        let text = text.into();
        let labels = self.term.labels.entry(kind).or_default();
        if !labels.contains(&text) {
            labels.push(text);
        }
        self
    }

    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.term.comment = Some(comment.into());
        self
    }

    #[must_use]
    pub fn notation(mut self, notation: impl Into<String>) -> Self {
        let notation = notation.into();
        if !self.term.notations.contains(&notation) {
            self.term.notations.push(notation);
        }
        self
    }

    #[must_use]
    pub fn referent(mut self, referent: Iri) -> Self {
        self.term.referent = referent;
        self
    }

    /// Owning scheme version. [`ConceptScheme`](super::ConceptScheme) sets it
    /// when the term is added.
    #[must_use]
    pub fn in_scheme(mut self, scheme_id: Iri) -> Self {
        self.term.scheme_id = scheme_id;
        self
    }

    #[must_use]
    pub fn released(mut self, version_tag: impl Into<String>, established_on: Option<NaiveDate>) -> Self {
        self.term.version_tag = version_tag.into();
        self.term.established_on = established_on;
        self
    }

    #[must_use]
    pub fn build(self) -> Term {
        self.term
    }
}
