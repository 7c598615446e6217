use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::{
    sorter::HierarchySorter,
    term::{Term, TermRef},
    TerminologyError,
};
use crate::ontology::Iri;

/// One release of a concept scheme and the concepts it owns.
///
/// `resource_id` names the scheme across releases, `version_id` names this
/// release. Without an explicit version IRI both are equal. Every owned term
/// carries `version_id` as its scheme, so its [`TermRef`] is unique across
/// schemes and releases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConceptScheme {
    resource_id: Iri,
    version_id: Iri,
    tag: String,
    label: String,
    version_tag: String,
    established_on: Option<NaiveDate>,
    top_concept: Option<Term>,
    concepts: BTreeMap<TermRef, Term>,
    parents: BTreeMap<TermRef, BTreeSet<TermRef>>,
}

impl ConceptScheme {
    /// Unversioned scheme without concepts.
    #[must_use]
    pub fn new(resource_id: Iri, tag: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            version_id: resource_id.clone(),
            resource_id,
            tag: tag.into(),
            label: label.into(),
            version_tag: String::new(),
            established_on: None,
            top_concept: None,
            concepts: BTreeMap::new(),
            parents: BTreeMap::new(),
        }
    }

    /// Names this release. Concepts already added are moved under the new
    /// version IRI.
    #[must_use]
    pub fn with_version(
        mut self,
        version_id: Iri,
        version_tag: impl Into<String>,
        established_on: Option<NaiveDate>,
    ) -> Self {
        self.version_id = version_id;
        self.version_tag = version_tag.into();
        self.established_on = established_on;
        self.restamp();
        self
    }

    /// Designated top concept. It is a hierarchy root and not one of the
    /// scheme's concepts.
    #[must_use]
    pub fn with_top_concept(mut self, mut top: Term) -> Self {
        top.assign_scheme(&self.version_id);
        self.top_concept = Some(top);
        self
    }

    /// Scheme IRI shared by every release.
    #[must_use]
    pub fn resource_id(&self) -> &Iri {
        &self.resource_id
    }

    /// IRI of this release.
    #[must_use]
    pub fn version_id(&self) -> &Iri {
        &self.version_id
    }

    /// Local code of the scheme, used to name generated artifacts.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Human readable name.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Release tag, empty when the source carries none.
    #[must_use]
    pub fn version_tag(&self) -> &str {
        &self.version_tag
    }

    /// Publication date of this release.
    #[must_use]
    pub fn established_on(&self) -> Option<NaiveDate> {
        self.established_on
    }

    #[must_use]
    pub fn top_concept(&self) -> Option<&Term> {
        self.top_concept.as_ref()
    }

    /// Concepts ordered by reference.
    pub fn concepts(&self) -> impl Iterator<Item = &Term> + '_ {
        self.concepts.values()
    }

    /// Concept stored under `reference`.
    #[must_use]
    pub fn concept(&self, reference: &TermRef) -> Option<&Term> {
        self.concepts.get(reference)
    }

    /// Whether this scheme owns `reference`.
    #[must_use]
    pub fn contains(&self, reference: &TermRef) -> bool {
        self.concepts.contains_key(reference)
    }

    /// Looks a concept up by the entity it denotes.
    #[must_use]
    pub fn concept_by_referent(&self, referent: &Iri) -> Option<&Term> {
        self.concepts().find(|term| term.referent() == referent)
    }

    /// Number of concepts, the top concept excluded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Immediate parent edges between concepts of this scheme.
    #[must_use]
    pub fn parents(&self) -> &BTreeMap<TermRef, BTreeSet<TermRef>> {
        &self.parents
    }

    /// Takes ownership of `term` and returns its key in this scheme.
    pub(crate) fn add_concept(&mut self, mut term: Term) -> Result<TermRef, TerminologyError> {
        term.assign_scheme(&self.version_id);
        let reference = term.reference();
        if self.concepts.contains_key(&reference) {
            return Err(TerminologyError::DuplicateConcept {
                concept: term.concept_id().clone(),
                scheme: self.resource_id.clone(),
            });
        }
        self.concepts.insert(reference.clone(), term);
        Ok(reference)
    }

    /// Re-keys owned terms and edges after the version IRI changed.
    fn restamp(&mut self) {
        let version_id = self.version_id.clone();
        let rekey = |reference: &TermRef| TermRef {
            scheme: version_id.clone(),
            ..reference.clone()
        };
        self.concepts = std::mem::take(&mut self.concepts)
            .into_values()
            .map(|mut term| {
                term.assign_scheme(&version_id);
                (term.reference(), term)
            })
            .collect();
        self.parents = std::mem::take(&mut self.parents)
            .into_iter()
            .map(|(child, edges)| (rekey(&child), edges.iter().map(rekey).collect()))
            .collect();
        if let Some(top) = &mut self.top_concept {
            top.assign_scheme(&version_id);
        }
    }

    /// Registers `parent` as an immediate parent of `child`. Self edges are
    /// ignored.
    pub(crate) fn add_parent(&mut self, child: TermRef, parent: TermRef) {
        if child != parent {
            self.parents.entry(child).or_default().insert(parent);
        }
    }

    /// Concepts in hierarchy order: every concept follows its ancestors, ties
    /// broken by tag and then by concept IRI.
    pub fn linearize(&self) -> Result<Vec<&Term>, TerminologyError> {
        let order = HierarchySorter::sort(self.concepts.keys().cloned(), &self.parents, |reference| {
            self.concepts
                .get(reference)
                .map(|term| (term.tag().to_string(), term.concept_id().clone()))
        })
        .map_err(|cycle| TerminologyError::CycleDetected {
            scheme: self.resource_id.clone(),
            concepts: cycle
                .unresolved
                .iter()
                .filter_map(|reference| self.concepts.get(reference))
                .map(|term| term.concept_id().clone())
                .collect(),
        })?;
        Ok(order
            .iter()
            .filter_map(|reference| self.concepts.get(reference))
            .collect())
    }
}
