//! Ordered construct rules of the OWL to SKOS conversion.
//!
//! Each rule reads the source model through [`TripleQuery`] and adds the
//! statements it constructs to the target. Concept, annotation and lexical
//! rules run before the hierarchy rule, so every concept's scheme membership
//! is final when hierarchy edges are built and later sealed.
use std::collections::{BTreeMap, BTreeSet};

use oxrdf::NamedNodeRef;
use uuid::Uuid;

use super::{
    converter::Owl2SkosConfig,
    identifier::{derive_identifier, natural_key},
    ConversionError,
};
use crate::ontology::{vocab, Iri, Literal, Model, Node, Pattern, Statement, TripleQuery};

/// Source declarations that become concepts.
const DECLARATIONS: [NamedNodeRef<'static>; 5] = [
    vocab::CLASS,
    vocab::OBJECT_PROPERTY,
    vocab::DATATYPE_PROPERTY,
    vocab::NAMED_INDIVIDUAL,
    vocab::CONCEPT,
];

/// Source hierarchy predicates that become `skos:broader`.
const HIERARCHY: [NamedNodeRef<'static>; 5] = [
    vocab::SUB_CLASS_OF,
    vocab::SUB_PROPERTY_OF,
    vocab::TYPE,
    vocab::BROADER,
    vocab::BROADER_TRANSITIVE,
];

/// Annotation properties carried over, with their SKOS counterpart.
const ANNOTATIONS: [(NamedNodeRef<'static>, NamedNodeRef<'static>); 5] = [
    (vocab::COMMENT, vocab::DEFINITION),
    (vocab::DEFINITION, vocab::DEFINITION),
    (vocab::ALT_LABEL, vocab::ALT_LABEL),
    (vocab::HIDDEN_LABEL, vocab::HIDDEN_LABEL),
    (vocab::SCOPE_NOTE, vocab::SCOPE_NOTE),
];

/// A source entity re-identified in the target namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintedConcept {
    pub iri: Iri,
    pub id: Uuid,
    /// Natural key the identifier was derived from.
    pub code: String,
}

/// Names shared by every rule of one conversion.
pub struct RuleContext<'c> {
    pub config: &'c Owl2SkosConfig,
    pub scheme: Iri,
    pub top: Iri,
    /// Source ontology headers.
    pub ontologies: Vec<Iri>,
    /// Source entity to minted concept.
    pub concepts: BTreeMap<Iri, MintedConcept>,
}

impl<'c> RuleContext<'c> {
    pub fn mint(source: &Model, config: &'c Owl2SkosConfig) -> Result<Self, ConversionError> {
        let scheme = config.mint(&config.effective_scheme_name())?;
        let top = config.mint(&config.effective_top_concept_name())?;

        let mut concepts = BTreeMap::new();
        for declaration in DECLARATIONS {
            for entity in source.instances_of(declaration) {
                if is_builtin(&entity) || concepts.contains_key(&entity) {
                    continue;
                }
                let code = natural_key(source, &entity, &config.code_properties);
                let id = derive_identifier(&code);
                let iri = config.mint(&id.to_string())?;
                concepts.insert(entity, MintedConcept { iri, id, code });
            }
        }

        Ok(Self {
            config,
            scheme,
            top,
            ontologies: source.instances_of(vocab::ONTOLOGY),
            concepts,
        })
    }

    fn minted(&self, entity: &Iri) -> Option<&MintedConcept> {
        self.concepts.get(entity)
    }

    /// Preferred labels of `entity`, at most one per language.
    ///
    /// Configured primary kind, then `skos:prefLabel`, then the configured
    /// label property, then the local name.
    fn preferred_labels(&self, source: &Model, entity: &Iri) -> Vec<Literal> {
        let node = Node::from(entity);
        let mut candidates: Vec<NamedNodeRef<'_>> = Vec::with_capacity(3);
        if let Some(kind) = self.config.primary_label {
            candidates.push(kind.predicate());
        }
        candidates.push(vocab::PREF_LABEL);
        candidates.push(self.config.label_property.as_named_node());

        let labels = candidates
            .into_iter()
            .map(|predicate| source.literals(&node, predicate))
            .find(|labels| !labels.is_empty())
            .unwrap_or_else(|| vec![Literal::new_simple(entity.local_name())]);

        let mut seen = BTreeSet::new();
        labels
            .into_iter()
            .filter(|label| seen.insert(label.language().map(str::to_string)))
            .collect()
    }
}

pub trait ConstructRule {
    fn name(&self) -> &'static str;

    fn enabled(&self, config: &Owl2SkosConfig) -> bool;

    fn apply(&self, source: &Model, context: &RuleContext<'_>, target: &mut Model);
}

/// Rules in application order.
#[must_use]
pub fn standard_rules() -> Vec<Box<dyn ConstructRule>> {
    vec![
        Box::new(SchemeRule),
        Box::new(ConceptRule),
        Box::new(AnnotationRule),
        Box::new(LexicalRule),
        Box::new(HierarchyRule),
        Box::new(ImportsRule),
    ]
}

/// Scheme, top concept and release metadata.
pub struct SchemeRule;

impl ConstructRule for SchemeRule {
    fn name(&self) -> &'static str {
        "scheme"
    }

    fn enabled(&self, config: &Owl2SkosConfig) -> bool {
        config.mode.includes_concepts()
    }

    fn apply(&self, source: &Model, context: &RuleContext<'_>, target: &mut Model) {
        let config = context.config;
        let scheme = &context.scheme;
        let top = &context.top;
        let scheme_name = config.effective_scheme_name();
        let top_name = config.effective_top_concept_name();

        target.insert(Statement::new(scheme.clone(), vocab::TYPE, vocab::CONCEPT_SCHEME));
        target.insert(Statement::new(
            scheme.clone(),
            vocab::PREF_LABEL,
            Literal::new_simple(scheme_name.as_str()),
        ));
        target.insert(Statement::new(
            scheme.clone(),
            vocab::LABEL,
            Literal::new_simple(scheme_name),
        ));
        target.insert(Statement::new(top.clone(), vocab::TYPE, vocab::CONCEPT));
        target.insert(Statement::new(top.clone(), vocab::IN_SCHEME, scheme.clone()));
        target.insert(Statement::new(top.clone(), vocab::TOP_CONCEPT_OF, scheme.clone()));
        target.insert(Statement::new(scheme.clone(), vocab::HAS_TOP_CONCEPT, top.clone()));
        target.insert(Statement::new(
            top.clone(),
            vocab::PREF_LABEL,
            Literal::new_simple(top_name),
        ));

        let mut version_iri = None;
        let mut version_tag = config.version_tag.clone();
        for ontology in &context.ontologies {
            let node = Node::from(ontology);
            version_iri =
                version_iri.or_else(|| source.object_iris(&node, vocab::VERSION_IRI).into_iter().next());
            version_tag = version_tag.or_else(|| {
                source
                    .literals(&node, vocab::VERSION_INFO)
                    .into_iter()
                    .next()
                    .map(|literal| literal.value().to_string())
            });
            for predicate in [vocab::ISSUED, vocab::CREATED, vocab::DATE] {
                for date in source.literals(&node, predicate) {
                    target.insert(Statement::new(scheme.clone(), predicate, date));
                }
            }
        }

        if let Some(tag) = &version_tag {
            target.insert(Statement::new(
                scheme.clone(),
                vocab::VERSION_INFO,
                Literal::new_simple(tag.as_str()),
            ));
        }
        // an overridden tag names its own release
        if config.version_tag.is_some() {
            version_iri = None;
        }
        let version_iri = version_iri.or_else(|| {
            version_tag
                .as_deref()
                .and_then(|tag| config.version_iri(tag).ok())
        });
        if let Some(version_iri) = version_iri {
            target.insert(Statement::new(scheme.clone(), vocab::VERSION_IRI, version_iri));
        }
    }
}

/// One `skos:Concept` per minted entity.
pub struct ConceptRule;

impl ConstructRule for ConceptRule {
    fn name(&self) -> &'static str {
        "concept"
    }

    fn enabled(&self, config: &Owl2SkosConfig) -> bool {
        config.mode.includes_concepts()
    }

    fn apply(&self, source: &Model, context: &RuleContext<'_>, target: &mut Model) {
        for (entity, concept) in &context.concepts {
            let subject = concept.iri.clone();
            target.insert(Statement::new(subject.clone(), vocab::TYPE, vocab::CONCEPT));
            target.insert(Statement::new(
                subject.clone(),
                vocab::IN_SCHEME,
                context.scheme.clone(),
            ));
            target.insert(Statement::new(
                subject.clone(),
                vocab::NOTATION,
                Literal::new_simple(concept.code.as_str()),
            ));
            target.insert(Statement::new(
                subject.clone(),
                vocab::IDENTIFIER,
                Literal::new_simple(concept.id.to_string()),
            ));
            target.insert(Statement::new(subject.clone(), vocab::SOURCE, entity.clone()));
            for label in context.preferred_labels(source, entity) {
                target.insert(Statement::new(subject.clone(), vocab::PREF_LABEL, label.clone()));
                target.insert(Statement::new(subject.clone(), vocab::LABEL, label));
            }
        }
    }
}

/// Documentation and secondary labels of minted entities.
pub struct AnnotationRule;

impl ConstructRule for AnnotationRule {
    fn name(&self) -> &'static str {
        "annotation"
    }

    fn enabled(&self, config: &Owl2SkosConfig) -> bool {
        config.mode.includes_annotations()
    }

    fn apply(&self, source: &Model, context: &RuleContext<'_>, target: &mut Model) {
        for (from, to) in ANNOTATIONS {
            let constructed = source.construct(&Pattern::any().predicate(from), |statement| {
                let minted = statement
                    .subject
                    .as_iri()
                    .and_then(|entity| context.minted(entity));
                match (minted, &statement.object) {
                    (Some(concept), Node::Literal(literal)) => Some(Statement::new(
                        concept.iri.clone(),
                        to,
                        literal.clone(),
                    )),
                    _ => None,
                }
            });
            target.merge(&constructed);
        }
    }
}

/// OntoLex entry and canonical form for every minted entity.
pub struct LexicalRule;

impl ConstructRule for LexicalRule {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn enabled(&self, config: &Owl2SkosConfig) -> bool {
        config.mode.includes_lex()
    }

    fn apply(&self, source: &Model, context: &RuleContext<'_>, target: &mut Model) {
        for (entity, concept) in &context.concepts {
            let (Ok(entry), Ok(form)) = (
                context.config.mint(&format!("{}_entry", concept.id)),
                context.config.mint(&format!("{}_form", concept.id)),
            ) else {
                continue;
            };
            target.insert(Statement::new(
                concept.iri.clone(),
                vocab::TYPE,
                vocab::LEXICAL_CONCEPT,
            ));
            target.insert(Statement::new(entry.clone(), vocab::TYPE, vocab::LEXICAL_ENTRY));
            target.insert(Statement::new(entry.clone(), vocab::EVOKES, concept.iri.clone()));
            target.insert(Statement::new(entry, vocab::CANONICAL_FORM, form.clone()));
            target.insert(Statement::new(form.clone(), vocab::TYPE, vocab::FORM));
            for label in context.preferred_labels(source, entity) {
                target.insert(Statement::new(form.clone(), vocab::WRITTEN_REP, label));
            }
        }
    }
}

/// Broader, narrower, related and exact-match edges between minted concepts.
///
/// Parents that were not minted keep their source IRI and are redirected to
/// the top concept when the hierarchy is sealed. Concepts left without a
/// parent hang off the top concept.
pub struct HierarchyRule;

impl ConstructRule for HierarchyRule {
    fn name(&self) -> &'static str {
        "hierarchy"
    }

    fn enabled(&self, config: &Owl2SkosConfig) -> bool {
        config.mode.includes_concepts()
    }

    fn apply(&self, source: &Model, context: &RuleContext<'_>, target: &mut Model) {
        let top = &context.top;
        for (entity, concept) in &context.concepts {
            let child = concept.iri.clone();
            let mut has_parent = false;

            if !context.config.flatten {
                let node = Node::from(entity);
                let mut parents: BTreeSet<Iri> = HIERARCHY
                    .iter()
                    .flat_map(|predicate| source.object_iris(&node, *predicate))
                    .collect();
                parents.extend(source.subject_iris(vocab::NARROWER, &node));
                parents.retain(|parent| parent != entity && !is_builtin(parent));

                for parent in parents {
                    match context.minted(&parent) {
                        Some(minted) => {
                            target.insert(Statement::new(
                                child.clone(),
                                vocab::BROADER,
                                minted.iri.clone(),
                            ));
                            target.insert(Statement::new(
                                minted.iri.clone(),
                                vocab::NARROWER,
                                child.clone(),
                            ));
                        }
                        None => {
                            target.insert(Statement::new(child.clone(), vocab::BROADER, parent));
                        }
                    }
                    has_parent = true;
                }

                for related in source.object_iris(&node, vocab::RELATED) {
                    if &related == entity {
                        continue;
                    }
                    let object = context
                        .minted(&related)
                        .map_or(related.clone(), |minted| minted.iri.clone());
                    target.insert(Statement::new(child.clone(), vocab::RELATED, object));
                }

                for equivalent in source.object_iris(&node, vocab::EQUIVALENT_CLASS) {
                    if let Some(minted) = context.minted(&equivalent).filter(|_| &equivalent != entity) {
                        target.insert(Statement::new(child.clone(), vocab::EXACT_MATCH, minted.iri.clone()));
                    }
                }
            }

            if !has_parent {
                target.insert(Statement::new(child.clone(), vocab::BROADER, top.clone()));
                target.insert(Statement::new(top.clone(), vocab::NARROWER, child));
            }
        }
    }
}

/// Ontology header of the target namespace importing the sources.
pub struct ImportsRule;

impl ConstructRule for ImportsRule {
    fn name(&self) -> &'static str {
        "imports"
    }

    fn enabled(&self, config: &Owl2SkosConfig) -> bool {
        config.add_imports
    }

    fn apply(&self, _source: &Model, context: &RuleContext<'_>, target: &mut Model) {
        let namespace = context.config.target_namespace.as_str();
        let Ok(header) = Iri::new(namespace.trim_end_matches(['#', '/'])) else {
            return;
        };
        target.insert(Statement::new(header.clone(), vocab::TYPE, vocab::ONTOLOGY));
        for ontology in &context.ontologies {
            if ontology != &header {
                target.insert(Statement::new(header.clone(), vocab::IMPORTS, ontology.clone()));
            }
        }
    }
}

/// OWL, RDFS and RDF vocabulary never becomes a concept or a parent.
fn is_builtin(iri: &Iri) -> bool {
    [
        "http://www.w3.org/2002/07/owl#",
        "http://www.w3.org/2000/01/rdf-schema#",
        "http://www.w3.org/1999/02/22-rdf-syntax-ns#",
        "http://www.w3.org/2004/02/skos/core#",
    ]
    .iter()
    .any(|ns| iri.as_str().starts_with(ns))
}
