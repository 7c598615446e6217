//! Integrity checks over a converted SKOS model.
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Display, Formatter},
};

use serde::Serialize;

use crate::{
    ontology::{vocab, Iri, Model, Node, TripleQuery},
    terminology::closure::{ancestors, cyclic_nodes},
};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    MissingPrefLabel { concept: Iri },
    DuplicatePrefLabel { concept: Iri, language: Option<String> },
    RelatedClashesWithBroader { concept: Iri, related: Iri },
    BroaderCycle { concepts: Vec<Iri> },
    OrphanConcept { concept: Iri },
}

impl Violation {
    #[must_use]
    pub fn concepts(&self) -> Vec<&Iri> {
        match self {
            Self::MissingPrefLabel { concept }
            | Self::DuplicatePrefLabel { concept, .. }
            | Self::OrphanConcept { concept } => vec![concept],
            Self::RelatedClashesWithBroader { concept, related } => vec![concept, related],
            Self::BroaderCycle { concepts } => concepts.iter().collect(),
        }
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPrefLabel { concept } => write!(f, "`{concept}` has no skos:prefLabel"),
            Self::DuplicatePrefLabel { concept, language } => write!(
                f,
                "`{concept}` has more than one skos:prefLabel for language `{}`",
                language.as_deref().unwrap_or("none")
            ),
            Self::RelatedClashesWithBroader { concept, related } => write!(
                f,
                "`{concept}` is skos:related to its ancestor `{related}`"
            ),
            Self::BroaderCycle { concepts } => {
                write!(f, "skos:broader cycle through {} concept(s)", concepts.len())
            }
            Self::OrphanConcept { concept } => write!(f, "`{concept}` is not in any scheme"),
        }
    }
}

/// Checks labels, hierarchy shape and scheme membership of every
/// `skos:Concept`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SkosValidator;

impl SkosValidator {
    #[must_use]
    pub fn validate(&self, model: &Model) -> Vec<Violation> {
        let concepts = model.instances_of(vocab::CONCEPT);
        let mut violations = BTreeSet::new();

        let mut broader: BTreeMap<Iri, BTreeSet<Iri>> = BTreeMap::new();
        for concept in &concepts {
            let node = Node::from(concept);
            let parents: BTreeSet<Iri> = model.object_iris(&node, vocab::BROADER).into_iter().collect();
            if !parents.is_empty() {
                broader.insert(concept.clone(), parents);
            }
        }

        for concept in &concepts {
            let node = Node::from(concept);

            let labels = model.literals(&node, vocab::PREF_LABEL);
            if labels.is_empty() {
                violations.insert(Violation::MissingPrefLabel {
                    concept: concept.clone(),
                });
            }
            let mut per_language: BTreeMap<Option<&str>, usize> = BTreeMap::new();
            for label in &labels {
                *per_language.entry(label.language()).or_default() += 1;
            }
            for (language, count) in per_language {
                if count > 1 {
                    violations.insert(Violation::DuplicatePrefLabel {
                        concept: concept.clone(),
                        language: language.map(str::to_string),
                    });
                }
            }

            if model.object_iris(&node, vocab::IN_SCHEME).is_empty()
                && model.object_iris(&node, vocab::TOP_CONCEPT_OF).is_empty()
            {
                violations.insert(Violation::OrphanConcept {
                    concept: concept.clone(),
                });
            }

            let lineage = ancestors(&broader, concept);
            for related in model.object_iris(&node, vocab::RELATED) {
                if lineage.contains(&related) {
                    violations.insert(Violation::RelatedClashesWithBroader {
                        concept: concept.clone(),
                        related,
                    });
                }
            }
        }

        let cyclic = cyclic_nodes(&broader);
        if !cyclic.is_empty() {
            violations.insert(Violation::BroaderCycle {
                concepts: cyclic.into_iter().collect(),
            });
        }
        violations.into_iter().collect()
    }
}
