//! Cross-version merge of concept graphs.
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::{
    graph::{closure_of, ConceptGraph},
    scheme::ConceptScheme,
    term::{Term, TermRef},
};
use crate::ontology::Iri;

/// Every merged version of one concept, in merge order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConceptTermSeries<'a> {
    pub uuid: Uuid,
    pub versions: Vec<&'a Term>,
}

impl<'a> ConceptTermSeries<'a> {
    /// Version merged last.
    #[must_use]
    pub fn latest(&self) -> Option<&'a Term> {
        self.versions.last().copied()
    }
}

/// Release metadata of one scheme version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SchemeRelease {
    pub version_id: Iri,
    pub version_tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub established_on: Option<NaiveDate>,
    pub concepts: usize,
}

impl From<&ConceptScheme> for SchemeRelease {
    fn from(scheme: &ConceptScheme) -> Self {
        Self {
            version_id: scheme.version_id().clone(),
            version_tag: scheme.version_tag().to_string(),
            established_on: scheme.established_on(),
            concepts: scheme.len(),
        }
    }
}

/// Many [`ConceptGraph`]s folded together, keyed by scheme version IRI.
///
/// Merging a scheme version that is already present replaces it and moves it
/// to the end of the merge order. Accessors taking a scheme IRI expect the
/// unversioned resource IRI and collapse across versions.
#[derive(Clone, Debug, Default)]
pub struct VersionedConceptGraph {
    schemes: BTreeMap<Iri, ConceptScheme>,
    merge_order: Vec<Iri>,
    owners: BTreeMap<TermRef, Iri>,
    parents: BTreeMap<TermRef, BTreeSet<TermRef>>,
    closure: BTreeMap<TermRef, Vec<TermRef>>,
}

impl From<ConceptGraph> for VersionedConceptGraph {
    fn from(graph: ConceptGraph) -> Self {
        let mut versioned = Self::default();
        versioned.merge(graph);
        versioned
    }
}

impl VersionedConceptGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every scheme of `graph`. A version merged again drops its earlier
    /// concepts and edges first; other schemes keep theirs even when they
    /// share concept identifiers or version tags.
    pub fn merge(&mut self, graph: ConceptGraph) {
        for scheme in graph.into_schemes() {
            let version = scheme.version_id().clone();
            if let Some(previous) = self.schemes.remove(&version) {
                for term in previous.concepts() {
                    let reference = term.reference();
                    self.owners.remove(&reference);
                    self.parents.remove(&reference);
                }
                self.merge_order.retain(|merged| merged != &version);
            }
            for term in scheme.concepts() {
                self.owners.insert(term.reference(), version.clone());
            }
            for (child, edges) in scheme.parents() {
                self.parents
                    .entry(child.clone())
                    .or_default()
                    .extend(edges.iter().cloned());
            }
            self.merge_order.push(version.clone());
            self.schemes.insert(version, scheme);
        }
        self.closure = closure_of(&self.parents, |reference| self.term(reference));
    }

    /// Scheme versions in merge order.
    pub fn schemes(&self) -> impl Iterator<Item = &ConceptScheme> + '_ {
        self.merge_order
            .iter()
            .filter_map(|version| self.schemes.get(version))
    }

    /// Looks up one release by its version IRI.
    #[must_use]
    pub fn scheme_version(&self, version_id: &Iri) -> Option<&ConceptScheme> {
        self.schemes.get(version_id)
    }

    /// One scheme per unversioned identity: the first merged version,
    /// ordered by resource IRI.
    #[must_use]
    pub fn distinct_concept_schemes(&self) -> Vec<&ConceptScheme> {
        let mut distinct: BTreeMap<&Iri, &ConceptScheme> = BTreeMap::new();
        for scheme in self.schemes() {
            distinct.entry(scheme.resource_id()).or_insert(scheme);
        }
        distinct.into_values().collect()
    }

    /// One series per distinct concept of the scheme, ordered by identifier.
    #[must_use]
    pub fn concept_series(&self, resource: &Iri) -> Vec<ConceptTermSeries<'_>> {
        let mut series: BTreeMap<Uuid, Vec<&Term>> = BTreeMap::new();
        for scheme in self.schemes().filter(|scheme| scheme.resource_id() == resource) {
            for term in scheme.concepts() {
                series.entry(term.uuid()).or_default().push(term);
            }
        }
        series
            .into_iter()
            .map(|(uuid, versions)| ConceptTermSeries { uuid, versions })
            .collect()
    }

    /// Versions of one scheme, newest `established_on` first. Undated
    /// versions come last; equal dates keep merge order.
    #[must_use]
    pub fn scheme_series(&self, resource: &Iri) -> Vec<&ConceptScheme> {
        let mut series: Vec<&ConceptScheme> = self
            .schemes()
            .filter(|scheme| scheme.resource_id() == resource)
            .collect();
        series.sort_by(|a, b| b.established_on().cmp(&a.established_on()));
        series
    }

    /// Serializable summary of [`Self::scheme_series`].
    #[must_use]
    pub fn scheme_releases(&self, resource: &Iri) -> Vec<SchemeRelease> {
        self.scheme_series(resource)
            .into_iter()
            .map(SchemeRelease::from)
            .collect()
    }

    /// First of [`Self::scheme_series`].
    #[must_use]
    pub fn latest_scheme(&self, resource: &Iri) -> Option<&ConceptScheme> {
        self.scheme_series(resource).into_iter().next()
    }

    /// Resolves a reference through the scheme that owns it.
    #[must_use]
    pub fn term(&self, reference: &TermRef) -> Option<&Term> {
        self.owners
            .get(reference)
            .and_then(|version| self.schemes.get(version))
            .and_then(|scheme| scheme.concept(reference))
    }

    #[must_use]
    pub fn parents_of(&self, reference: &TermRef) -> Vec<&Term> {
        self.parents
            .get(reference)
            .into_iter()
            .flatten()
            .filter_map(|parent| self.term(parent))
            .collect()
    }

    /// Ancestors nearest the top first, as linearized in the closure.
    #[must_use]
    pub fn ancestors_of(&self, reference: &TermRef) -> Vec<&Term> {
        self.closure
            .get(reference)
            .into_iter()
            .flatten()
            .filter_map(|ancestor| self.term(ancestor))
            .collect()
    }

    #[must_use]
    pub fn parents(&self) -> &BTreeMap<TermRef, BTreeSet<TermRef>> {
        &self.parents
    }

    /// Linearized ancestors of every concept with at least one parent.
    #[must_use]
    pub fn closure(&self) -> &BTreeMap<TermRef, Vec<TermRef>> {
        &self.closure
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::VersionedConceptGraph;
    use crate::{
        ontology::Iri,
        terminology::{graph::ConceptGraph, scheme::ConceptScheme, term::Term},
    };

    fn iri(text: &str) -> Iri {
        Iri::new(format!("http://my.edu/test{text}")).expect("iri")
    }

    fn release(tag: &str, date: Option<NaiveDate>, concepts: &[(u128, &str)]) -> ConceptGraph {
        release_of("Colors", tag, date, concepts)
    }

    fn release_of(scheme: &str, tag: &str, date: Option<NaiveDate>, concepts: &[(u128, &str)]) -> ConceptGraph {
        let mut built = ConceptScheme::new(iri(&format!("#{scheme}")), scheme, scheme).with_version(
            iri(&format!("/versions/{tag}#{scheme}")),
            tag,
            date,
        );
        let mut references = Vec::new();
        for (n, name) in concepts {
            let term = Term::builder(iri(&format!("/{scheme}#c{n}")), iri("#"), Uuid::from_u128(*n), *name)
                .released(tag, date)
                .build();
            references.push(built.add_concept(term).expect("distinct"));
        }
        if let [parent, child, ..] = references.as_slice() {
            built.add_parent(child.clone(), parent.clone());
        }
        ConceptGraph::new([built])
    }

    #[test]
    fn series_follow_dates_and_merge_order() {
        let v1 = release("1", NaiveDate::from_ymd_opt(2020, 1, 1), &[(1, "Red"), (2, "Crimson")]);
        let v2 = release("2", NaiveDate::from_ymd_opt(2022, 1, 1), &[(1, "Red"), (3, "Blue")]);

        let mut graph = VersionedConceptGraph::from(v1);
        graph.merge(v2);

        let tags: Vec<&str> = graph
            .scheme_series(&iri("#Colors"))
            .into_iter()
            .map(ConceptScheme::version_tag)
            .collect();
        assert_eq!(tags, vec!["2", "1"]);
        assert_eq!(graph.distinct_concept_schemes().len(), 1);
        assert_eq!(graph.distinct_concept_schemes()[0].version_tag(), "1");

        let series = graph.concept_series(&iri("#Colors"));
        assert_eq!(series.len(), 3);
        let red = &series[0];
        assert_eq!(red.uuid, Uuid::from_u128(1));
        let versions: Vec<&str> = red.versions.iter().map(|t| t.version_tag()).collect();
        assert_eq!(versions, vec!["1", "2"]);
        assert_eq!(red.latest().map(Term::version_tag), Some("2"));
    }

    #[test]
    fn newer_merge_listed_last_even_when_older() {
        let v1 = release("1", NaiveDate::from_ymd_opt(2020, 1, 1), &[(1, "Red")]);
        let v2 = release("2", NaiveDate::from_ymd_opt(2022, 1, 1), &[(1, "Red")]);
        let mut graph = VersionedConceptGraph::from(v2);
        graph.merge(v1);

        let series = graph.concept_series(&iri("#Colors"));
        let versions: Vec<&str> = series[0].versions.iter().map(|t| t.version_tag()).collect();
        assert_eq!(versions, vec!["2", "1"]);
        assert_eq!(
            graph.latest_scheme(&iri("#Colors")).map(ConceptScheme::version_tag),
            Some("2")
        );
        let releases = graph.scheme_releases(&iri("#Colors"));
        assert_eq!(releases[1].established_on, NaiveDate::from_ymd_opt(2020, 1, 1));
    }

    #[test]
    fn remerging_a_version_replaces_it() {
        let v1 = release("1", None, &[(1, "Red"), (2, "Crimson")]);
        let v1_again = release("1", None, &[(1, "Red")]);
        let mut graph = VersionedConceptGraph::from(v1);
        graph.merge(v1_again);

        assert_eq!(graph.schemes().count(), 1);
        assert_eq!(graph.concept_series(&iri("#Colors")).len(), 1);
        assert!(graph.parents().is_empty());
    }

    #[test]
    fn edges_and_closures_are_unioned_per_version() {
        let v1 = release("1", None, &[(1, "Red"), (2, "Crimson")]);
        let v2 = release("2", None, &[(1, "Red"), (2, "Crimson")]);
        let mut graph = VersionedConceptGraph::from(v1);
        graph.merge(v2);
        assert_eq!(graph.parents().len(), 2);
        for scheme in graph.schemes() {
            let crimson = scheme
                .concepts()
                .find(|t| t.tag() == "Crimson")
                .expect("crimson");
            let ancestors: Vec<&str> = graph
                .ancestors_of(&crimson.reference())
                .into_iter()
                .map(|t| t.version_tag())
                .collect();
            assert_eq!(ancestors, vec![scheme.version_tag()]);
        }
    }

    #[test]
    fn schemes_sharing_a_tag_keep_their_own_edges() {
        let colours = release_of("Colours", "1", None, &[(1, "Colour"), (9, "Other")]);
        let shapes = release_of("Shapes", "1", None, &[(2, "Shape"), (9, "Other")]);
        let mut graph = VersionedConceptGraph::from(colours);
        graph.merge(shapes);

        for (scheme, parent) in [("#Colours", "Colour"), ("#Shapes", "Shape")] {
            let latest = graph.latest_scheme(&iri(scheme)).expect("merged");
            let other = latest.concepts().find(|t| t.tag() == "Other").expect("other");
            let parents: Vec<&str> = graph
                .parents_of(&other.reference())
                .into_iter()
                .map(Term::tag)
                .collect();
            assert_eq!(parents, vec![parent]);
            assert_eq!(graph.term(&other.reference()), Some(other));
        }

        graph.merge(release_of("Shapes", "1", None, &[(9, "Other")]));
        let colours = graph.latest_scheme(&iri("#Colours")).expect("merged");
        let other = colours.concepts().find(|t| t.tag() == "Other").expect("other");
        assert_eq!(graph.parents_of(&other.reference()).len(), 1);
        assert_eq!(graph.ancestors_of(&other.reference()).len(), 1);
    }
}
