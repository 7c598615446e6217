use std::collections::{BTreeMap, BTreeSet};

use super::{
    closure::TransitiveClosure,
    scheme::ConceptScheme,
    term::{Term, TermRef},
    TerminologyError,
};
use crate::ontology::Iri;

/// Schemes, parent edges and closure of one abstraction run.
///
/// The parent edge map is the union of the schemes' own maps and the closure
/// is derived from it when the graph is built.
#[derive(Clone, Debug, Default)]
pub struct ConceptGraph {
    schemes: BTreeMap<Iri, ConceptScheme>,
    owners: BTreeMap<TermRef, Iri>,
    parents: BTreeMap<TermRef, BTreeSet<TermRef>>,
    closure: BTreeMap<TermRef, Vec<TermRef>>,
}

impl ConceptGraph {
    #[must_use]
    pub fn new(schemes: impl IntoIterator<Item = ConceptScheme>) -> Self {
        let schemes: BTreeMap<Iri, ConceptScheme> = schemes
            .into_iter()
            .map(|scheme| (scheme.resource_id().clone(), scheme))
            .collect();

        let mut owners = BTreeMap::new();
        let mut parents: BTreeMap<TermRef, BTreeSet<TermRef>> = BTreeMap::new();
        for (resource, scheme) in &schemes {
            for term in scheme.concepts() {
                owners.insert(term.reference(), resource.clone());
            }
            for (child, edges) in scheme.parents() {
                parents
                    .entry(child.clone())
                    .or_default()
                    .extend(edges.iter().cloned());
            }
        }

        let closure = closure_of(&parents, |reference| {
            owners
                .get(reference)
                .and_then(|resource| schemes.get(resource))
                .and_then(|scheme| scheme.concept(reference))
        });

        Self {
            schemes,
            owners,
            parents,
            closure,
        }
    }

    /// Schemes ordered by resource IRI.
    pub fn schemes(&self) -> impl Iterator<Item = &ConceptScheme> + '_ {
        self.schemes.values()
    }

    #[must_use]
    pub fn scheme(&self, resource: &Iri) -> Option<&ConceptScheme> {
        self.schemes.get(resource)
    }

    /// Scheme owning the concept.
    #[must_use]
    pub fn scheme_for(&self, reference: &TermRef) -> Option<&ConceptScheme> {
        self.owners
            .get(reference)
            .and_then(|resource| self.schemes.get(resource))
    }

    #[must_use]
    pub fn term(&self, reference: &TermRef) -> Option<&Term> {
        self.scheme_for(reference)
            .and_then(|scheme| scheme.concept(reference))
    }

    #[must_use]
    pub fn parents(&self) -> &BTreeMap<TermRef, BTreeSet<TermRef>> {
        &self.parents
    }

    #[must_use]
    pub fn closure(&self) -> &BTreeMap<TermRef, Vec<TermRef>> {
        &self.closure
    }

    /// Immediate parents of a concept.
    #[must_use]
    pub fn parents_of(&self, reference: &TermRef) -> Vec<&Term> {
        self.parents
            .get(reference)
            .into_iter()
            .flatten()
            .filter_map(|parent| self.term(parent))
            .collect()
    }

    /// Every ancestor of a concept, ancestors first.
    #[must_use]
    pub fn ancestors_of(&self, reference: &TermRef) -> Vec<&Term> {
        self.closure
            .get(reference)
            .into_iter()
            .flatten()
            .filter_map(|ancestor| self.term(ancestor))
            .collect()
    }

    /// Concepts of one scheme in hierarchy order.
    pub fn linearized(&self, resource: &Iri) -> Result<Vec<&Term>, TerminologyError> {
        let scheme = self
            .schemes
            .get(resource)
            .ok_or_else(|| TerminologyError::SchemeNotFound {
                scheme: resource.clone(),
            })?;
        scheme.linearize()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub(crate) fn into_schemes(self) -> impl Iterator<Item = ConceptScheme> {
        self.schemes.into_values()
    }
}

/// Closure of `parents` with ties broken by tag and concept IRI.
pub(crate) fn closure_of<'a>(
    parents: &BTreeMap<TermRef, BTreeSet<TermRef>>,
    lookup: impl Fn(&TermRef) -> Option<&'a Term>,
) -> BTreeMap<TermRef, Vec<TermRef>> {
    TransitiveClosure::compute_with(parents, |reference| {
        lookup(reference).map(|term| (term.tag().to_string(), term.concept_id().clone()))
    })
}
