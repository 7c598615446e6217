//! Builds a [`ConceptGraph`] from a sealed SKOS model.
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    graph::ConceptGraph,
    scheme::ConceptScheme,
    term::{LabelKind, Term, TermRef},
    TerminologyError,
};
use crate::{
    ontology::{vocab, Iri, Literal, Node, Pattern, TripleQuery},
    skos::identifier::derive_identifier,
};

/// Role of a typed subject in the source model, decided once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    Scheme,
    Concept,
    Unrecognized,
}

/// Walks a SKOS model and materializes its schemes, concepts and parent
/// edges.
///
/// A scheme with exactly one top concept keeps it apart from its concepts:
/// the top is a hierarchy root, so edges pointing at it are not parent edges.
pub struct SkosTerminologyAbstractor<'a, Q>
where
    Q: TripleQuery + ?Sized,
{
    source: &'a Q,
    version_tag: Option<String>,
}

impl<'a, Q> SkosTerminologyAbstractor<'a, Q>
where
    Q: TripleQuery + ?Sized,
{
    #[must_use]
    pub fn new(source: &'a Q) -> Self {
        Self {
            source,
            version_tag: None,
        }
    }

    /// Overrides the version tag read from the schemes.
    #[must_use]
    pub fn with_version_tag(mut self, version_tag: Option<String>) -> Self {
        self.version_tag = version_tag;
        self
    }

    pub fn abstract_graph(&self) -> Result<ConceptGraph, TerminologyError> {
        let roles = self.classify();

        let mut schemes: BTreeMap<Iri, ConceptScheme> = BTreeMap::new();
        let mut tops: BTreeSet<Iri> = BTreeSet::new();
        for (iri, _) in roles.iter().filter(|(_, role)| **role == Role::Scheme) {
            let (scheme, top) = self.scheme(iri);
            tops.extend(top);
            schemes.insert(iri.clone(), scheme);
        }

        // concept IRI -> (owning scheme, reference)
        let mut located: BTreeMap<Iri, (Iri, TermRef)> = BTreeMap::new();
        for (iri, _) in roles.iter().filter(|(_, role)| **role == Role::Concept) {
            if tops.contains(iri) {
                continue;
            }
            let Some(owner) = self.owning_scheme(iri)? else {
                warn!(concept = %iri, "skos_concept_without_scheme");
                continue;
            };
            let Some(scheme) = schemes.get_mut(&owner) else {
                return Err(TerminologyError::UnknownScheme {
                    concept: iri.clone(),
                    scheme: owner,
                });
            };
            let term = self.term(iri, scheme);
            let reference = scheme.add_concept(term)?;
            located.insert(iri.clone(), (owner, reference));
        }

        let by_referent: BTreeMap<Iri, (Iri, TermRef)> = located
            .iter()
            .filter_map(|(_, (owner, reference))| {
                schemes
                    .get(owner)
                    .and_then(|scheme| scheme.concept(reference))
                    .map(|term| (term.referent().clone(), (owner.clone(), reference.clone())))
            })
            .collect();

        let mut edges = 0_usize;
        for (iri, (owner, reference)) in &located {
            for target in self.broader_targets(iri) {
                if &target == iri || tops.contains(&target) {
                    continue;
                }
                let referent = self.referent(&target);
                let Some((target_owner, parent)) = by_referent.get(&referent) else {
                    warn!(concept = %iri, broader = %target, "skos_broader_dangling");
                    continue;
                };
                if target_owner != owner {
                    warn!(
                        concept = %iri,
                        broader = %target,
                        scheme = %owner,
                        "skos_broader_crosses_scheme"
                    );
                    continue;
                }
                if let Some(scheme) = schemes.get_mut(owner) {
                    scheme.add_parent(reference.clone(), parent.clone());
                    edges += 1;
                }
            }
        }

        debug!(
            schemes = schemes.len(),
            concepts = located.len(),
            edges,
            "skos_abstracted"
        );
        Ok(ConceptGraph::new(schemes.into_values()))
    }

    fn classify(&self) -> BTreeMap<Iri, Role> {
        let mut roles: BTreeMap<Iri, Role> = BTreeMap::new();
        for statement in self.source.select(&Pattern::any().predicate(vocab::TYPE)) {
            let Node::Iri(subject) = statement.subject else {
                continue;
            };
            let role = if statement.object.is(vocab::CONCEPT_SCHEME) {
                Role::Scheme
            } else if statement.object.is(vocab::CONCEPT) {
                Role::Concept
            } else {
                Role::Unrecognized
            };
            let current = roles.entry(subject).or_insert(role);
            if rank(role) > rank(*current) {
                *current = role;
            }
        }
        roles
    }

    fn scheme(&self, iri: &Iri) -> (ConceptScheme, Option<Iri>) {
        let node = Node::from(iri);
        let tag = iri.local_name().to_string();
        let label = self
            .first_literal(&node, &[vocab::PREF_LABEL, vocab::LABEL])
            .map_or_else(|| tag.clone(), |literal| literal.value().to_string());

        let version_id = self
            .source
            .object_iris(&node, vocab::VERSION_IRI)
            .into_iter()
            .next()
            .unwrap_or_else(|| iri.clone());
        let version_tag = self.version_tag.clone().unwrap_or_else(|| {
            self.first_literal(&node, &[vocab::VERSION_INFO])
                .map(|literal| literal.value().to_string())
                .unwrap_or_default()
        });
        let established_on = [vocab::ISSUED, vocab::CREATED, vocab::DATE]
            .into_iter()
            .flat_map(|predicate| self.source.literals(&node, predicate))
            .find_map(|literal| parse_date(literal.value()));

        let mut scheme =
            ConceptScheme::new(iri.clone(), tag, label).with_version(version_id, version_tag, established_on);

        let mut tops: BTreeSet<Iri> = self
            .source
            .object_iris(&node, vocab::HAS_TOP_CONCEPT)
            .into_iter()
            .collect();
        tops.extend(self.source.subject_iris(vocab::TOP_CONCEPT_OF, &node));

        let designated = match tops.len() {
            1 => tops.into_iter().next(),
            0 => None,
            _ => {
                debug!(scheme = %iri, tops = tops.len(), "skos_scheme_top_concepts_kept_as_concepts");
                None
            }
        };
        if let Some(top) = &designated {
            let top = self.term(top, &scheme);
            scheme = scheme.with_top_concept(top);
        }
        (scheme, designated)
    }

    fn owning_scheme(&self, concept: &Iri) -> Result<Option<Iri>, TerminologyError> {
        let schemes: BTreeSet<Iri> = self
            .source
            .object_iris(&Node::from(concept), vocab::IN_SCHEME)
            .into_iter()
            .collect();
        if schemes.len() > 1 {
            return Err(TerminologyError::MultipleSchemes {
                concept: concept.clone(),
                schemes: schemes.into_iter().collect(),
            });
        }
        Ok(schemes.into_iter().next())
    }

    fn term(&self, iri: &Iri, scheme: &ConceptScheme) -> Term {
        let node = Node::from(iri);
        let referent = self.referent(iri);
        let uuid = self
            .source
            .literals(&node, vocab::IDENTIFIER)
            .iter()
            .find_map(|literal| Uuid::parse_str(literal.value().trim()).ok())
            .unwrap_or_else(|| derive_identifier(iri.as_str()));
        let notations: Vec<String> = self
            .source
            .literals(&node, vocab::NOTATION)
            .into_iter()
            .map(|literal| literal.value().to_string())
            .collect();
        let tag = notations
            .first()
            .cloned()
            .unwrap_or_else(|| referent.local_name().to_string());
        let namespace = Iri::new(iri.namespace()).unwrap_or_else(|_| iri.clone());

        let mut builder = Term::builder(iri.clone(), namespace, uuid, tag)
            .referent(referent)
            .in_scheme(scheme.version_id().clone())
            .released(scheme.version_tag(), scheme.established_on());
        for kind in LabelKind::ALL {
            for literal in self.source.literals(&node, kind.predicate()) {
                builder = builder.label(kind, literal.value());
            }
        }
        for notation in notations {
            builder = builder.notation(notation);
        }
        if let Some(comment) = self.first_literal(&node, &[vocab::DEFINITION, vocab::COMMENT]) {
            builder = builder.comment(comment.value());
        }
        builder.build()
    }

    /// Entity the concept denotes: its `dct:source`, else the concept itself.
    fn referent(&self, concept: &Iri) -> Iri {
        self.source
            .object_iris(&Node::from(concept), vocab::SOURCE)
            .into_iter()
            .next()
            .unwrap_or_else(|| concept.clone())
    }

    fn broader_targets(&self, concept: &Iri) -> BTreeSet<Iri> {
        let node = Node::from(concept);
        vocab::BROADER_FAMILY
            .iter()
            .flat_map(|predicate| self.source.object_iris(&node, *predicate))
            .collect()
    }

    fn first_literal(&self, node: &Node, predicates: &[oxrdf::NamedNodeRef<'_>]) -> Option<Literal> {
        predicates
            .iter()
            .find_map(|predicate| self.source.literals(node, *predicate).into_iter().next())
    }
}

fn rank(role: Role) -> u8 {
    match role {
        Role::Unrecognized => 0,
        Role::Concept => 1,
        Role::Scheme => 2,
    }
}

/// Accepts plain dates and the date part of date-times.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value.get(..10).unwrap_or(value), "%Y-%m-%d").ok()
}
