use std::collections::{BTreeMap, BTreeSet, VecDeque};

use oxrdf::NamedNodeRef;
use tracing::debug;

use super::config::{DepthBounds, EntityType, MireotConfig};
use crate::ontology::{
    model::{Model, Node, Pattern, Statement, TripleQuery},
    value_objects::Iri,
    vocab,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Extracts the hierarchy neighbourhood of a root entity.
///
/// The result holds the retained entities' declarations, their annotation
/// and data statements, the hierarchy edges and [`vocab::LINKS`] between
/// retained entities, and the source's `owl:Ontology` header. A root absent
/// from the source yields an empty model.
///
/// Individuals walk `rdf:type`, so for them only membership edges are
/// filtered; declarations such as `owl:NamedIndividual` are always kept.
pub struct MireotExtractor<'a, Q>
where
    Q: TripleQuery + ?Sized,
{
    source: &'a Q,
}

impl<'a, Q> MireotExtractor<'a, Q>
where
    Q: TripleQuery + ?Sized,
{
    #[must_use]
    pub fn new(source: &'a Q) -> Self {
        Self { source }
    }

    /// Runs the extraction for `root`.
    #[must_use]
    pub fn extract(&self, root: &Iri, config: &MireotConfig) -> Model {
        let root_node = Node::from(root);
        if self
            .source
            .select(&Pattern::any().subject(root_node.clone()))
            .is_empty()
        {
            debug!(root = %root, "mireot_root_missing");
            return Model::new();
        }

        let bounds = config.bounds();
        let scope = config
            .namespace_scoped
            .then(|| {
                config
                    .base_uri
                    .as_ref()
                    .map_or_else(|| root.namespace().to_string(), |base| base.as_str().to_string())
            });
        let relation = config.entity_type.hierarchy_predicate();

        let mut retained: BTreeSet<Iri> = BTreeSet::new();
        if bounds.contains(0) {
            retained.insert(root.clone());
        }
        for direction in [Direction::Down, Direction::Up] {
            let distances = self.walk(root, relation, direction, bounds, scope.as_deref());
            retained.extend(
                distances
                    .into_iter()
                    .filter(|(_, depth)| *depth > 0 && bounds.contains(*depth))
                    .map(|(iri, _)| iri),
            );
        }

        let mut extracted = Model::new();
        for entity in &retained {
            self.copy_entity(entity, relation, &retained, &mut extracted);
        }
        if !extracted.is_empty() {
            self.copy_ontology_header(&mut extracted);
        }

        debug!(
            root = %root,
            entity_type = ?config.entity_type,
            entities = retained.len(),
            statements = extracted.len(),
            "mireot_extracted"
        );
        extracted
    }

    /// Breadth-first walk recording the shortest hop count to every
    /// reachable entity, stopping once the maximum depth is reached.
    fn walk(
        &self,
        root: &Iri,
        relation: NamedNodeRef<'_>,
        direction: Direction,
        bounds: DepthBounds,
        scope: Option<&str>,
    ) -> BTreeMap<Iri, u32> {
        let mut distances = BTreeMap::from([(root.clone(), 0_u32)]);
        let mut queue = VecDeque::from([(root.clone(), 0_u32)]);

        while let Some((current, depth)) = queue.pop_front() {
            if !bounds.can_descend_past(depth) {
                continue;
            }
            for next in self.neighbours(&current, relation, direction) {
                if is_builtin(&next) {
                    continue;
                }
                if scope.is_some_and(|ns| !next.as_str().starts_with(ns)) {
                    continue;
                }
                if distances.contains_key(&next) {
                    continue;
                }
                distances.insert(next.clone(), depth + 1);
                queue.push_back((next, depth + 1));
            }
        }
        distances
    }

    fn neighbours(&self, entity: &Iri, relation: NamedNodeRef<'_>, direction: Direction) -> Vec<Iri> {
        let node = Node::from(entity);
        match direction {
            Direction::Up => self.source.object_iris(&node, relation),
            Direction::Down => self.source.subject_iris(relation, &node),
        }
    }

    fn copy_entity(
        &self,
        entity: &Iri,
        relation: NamedNodeRef<'_>,
        retained: &BTreeSet<Iri>,
        target: &mut Model,
    ) {
        for statement in self
            .source
            .select(&Pattern::any().subject(Node::from(entity)))
        {
            let keep = match &statement.object {
                Node::Literal(_) => true,
                Node::Blank(_) => false,
                Node::Iri(object) => {
                    let is = |predicates: &[NamedNodeRef<'_>]| {
                        predicates.iter().any(|predicate| statement.predicate == *predicate)
                    };
                    if statement.predicate == relation {
                        retained.contains(object)
                            || (statement.predicate == vocab::TYPE && is_builtin(object))
                    } else if statement.predicate == vocab::TYPE {
                        true
                    } else if is(&vocab::LINKS) {
                        retained.contains(object)
                    } else {
                        is(&vocab::ANNOTATIONS)
                    }
                }
            };
            if keep {
                target.insert(statement);
            }
        }
    }

    fn copy_ontology_header(&self, target: &mut Model) {
        for ontology in self.source.instances_of(vocab::ONTOLOGY) {
            for statement in self
                .source
                .select(&Pattern::any().subject(Node::from(&ontology)))
            {
                if !matches!(statement.object, Node::Blank(_)) {
                    target.insert(statement);
                }
            }
        }
    }
}

/// Top-level OWL and RDFS vocabulary is never part of an extracted hierarchy.
fn is_builtin(iri: &Iri) -> bool {
    [
        "http://www.w3.org/2002/07/owl#",
        "http://www.w3.org/2000/01/rdf-schema#",
        "http://www.w3.org/1999/02/22-rdf-syntax-ns#",
    ]
    .iter()
    .any(|ns| iri.as_str().starts_with(ns))
}

/// Convenience wrapper for the common class-hierarchy case.
#[must_use]
pub fn extract_classes<Q: TripleQuery + ?Sized>(source: &Q, root: &Iri, bounds: DepthBounds) -> Model {
    MireotExtractor::new(source).extract(root, &MireotConfig::new(EntityType::Class).with_depth(bounds))
}

/// Statements declaring `entity` with the entity type's OWL declaration.
#[must_use]
pub fn is_declared<Q: TripleQuery + ?Sized>(source: &Q, entity: &Iri, entity_type: EntityType) -> bool {
    source.contains(&Statement::new(
        entity.clone(),
        vocab::TYPE,
        entity_type.declaration(),
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{extract_classes, MireotExtractor};
    use crate::mireot::config::{DepthBounds, EntityType, MireotConfig};
    use crate::ontology::{
        model::{Literal, Model, Node, Statement, TripleQuery},
        value_objects::Iri,
        vocab,
    };

    const NS: &str = "http://test/chain#";

    fn iri(local: &str) -> Iri {
        Iri::new(format!("{NS}{local}")).expect("valid iri")
    }

    /// A <- B <- C <- D, plus an unrelated X and a foreign parent for A.
    fn chain() -> Model {
        let mut model = Model::new();
        for name in ["A", "B", "C", "D", "X"] {
            model.insert(Statement::new(iri(name), vocab::TYPE, vocab::CLASS));
            model.insert(Statement::new(
                iri(name),
                vocab::LABEL,
                Literal::new_simple(name),
            ));
        }
        let foreign = Iri::new("http://elsewhere/Root").expect("iri");
        model.insert(Statement::new(foreign.clone(), vocab::TYPE, vocab::CLASS));
        model.insert(Statement::new(iri("A"), vocab::SUB_CLASS_OF, foreign));
        model.insert(Statement::new(iri("B"), vocab::SUB_CLASS_OF, iri("A")));
        model.insert(Statement::new(iri("C"), vocab::SUB_CLASS_OF, iri("B")));
        model.insert(Statement::new(iri("D"), vocab::SUB_CLASS_OF, iri("C")));
        model.insert(Statement::new(
            iri("D"),
            vocab::SUB_CLASS_OF,
            Node::Blank("restriction".into()),
        ));
        model
    }

    fn entities(model: &Model) -> BTreeSet<String> {
        model
            .instances_of(vocab::CLASS)
            .into_iter()
            .map(|iri| iri.local_name().to_string())
            .collect()
    }

    #[test]
    fn missing_root_yields_empty_model() {
        let model = chain();
        let extracted = extract_classes(&model, &iri("Nope"), DepthBounds::unbounded());
        assert!(extracted.is_empty());
    }

    #[test]
    fn unbounded_walks_both_directions() {
        let model = chain();
        let extracted = extract_classes(&model, &iri("B"), DepthBounds::unbounded());
        assert_eq!(
            entities(&extracted),
            BTreeSet::from(["A", "B", "C", "D", "Root"].map(String::from))
        );
        assert!(!extracted.contains(&Statement::new(
            iri("D"),
            vocab::SUB_CLASS_OF,
            Node::Blank("restriction".into())
        )));
    }

    #[test]
    fn depth_window_excludes_near_and_far_nodes() {
        let model = chain();
        let extracted = extract_classes(&model, &iri("A"), DepthBounds::between(1, 2));
        assert_eq!(
            entities(&extracted),
            BTreeSet::from(["B", "C", "Root"].map(String::from))
        );
        // induced subgraph: C -> B is kept, D -> C is not
        assert!(extracted.contains(&Statement::new(iri("C"), vocab::SUB_CLASS_OF, iri("B"))));
        assert!(extracted
            .object_iris(&Node::from(iri("D")), vocab::SUB_CLASS_OF)
            .is_empty());
    }

    #[test]
    fn namespace_scope_stops_at_foreign_entities() {
        let model = chain();
        let config = MireotConfig::new(EntityType::Class).namespace_scoped(true);
        let extracted = MireotExtractor::new(&model).extract(&iri("B"), &config);
        assert_eq!(
            entities(&extracted),
            BTreeSet::from(["A", "B", "C", "D"].map(String::from))
        );
    }

    #[test]
    fn links_between_retained_entities_survive() {
        let mut model = chain();
        model.insert(Statement::new(iri("C"), vocab::EQUIVALENT_CLASS, iri("B")));
        model.insert(Statement::new(iri("C"), vocab::RELATED, iri("X")));
        model.insert(Statement::new(iri("D"), vocab::RELATED, iri("B")));

        let extracted = extract_classes(&model, &iri("A"), DepthBounds::unbounded());
        assert!(extracted.contains(&Statement::new(iri("C"), vocab::EQUIVALENT_CLASS, iri("B"))));
        assert!(extracted.contains(&Statement::new(iri("D"), vocab::RELATED, iri("B"))));
        assert!(!extracted.contains(&Statement::new(iri("C"), vocab::RELATED, iri("X"))));
    }

    #[test]
    fn individuals_keep_their_declarations() {
        let mut model = chain();
        for (name, class) in [("red", "A"), ("blue", "A"), ("square", "X")] {
            model.insert(Statement::new(iri(name), vocab::TYPE, vocab::NAMED_INDIVIDUAL));
            model.insert(Statement::new(iri(name), vocab::TYPE, iri(class)));
        }
        let config = MireotConfig::new(EntityType::Individual);
        let extracted = MireotExtractor::new(&model).extract(&iri("A"), &config);

        let individuals: BTreeSet<String> = extracted
            .instances_of(vocab::NAMED_INDIVIDUAL)
            .into_iter()
            .map(|iri| iri.local_name().to_string())
            .collect();
        assert_eq!(individuals, BTreeSet::from(["blue", "red"].map(String::from)));
        assert_eq!(entities(&extracted), BTreeSet::from(["A".to_string()]));
        assert!(extracted.contains(&Statement::new(iri("red"), vocab::TYPE, iri("A"))));
    }

    #[test]
    fn entity_only_keeps_root_annotations() {
        let model = chain();
        let config = MireotConfig::new(EntityType::Class).entity_only(true);
        let extracted = MireotExtractor::new(&model).extract(&iri("C"), &config);
        assert_eq!(entities(&extracted), BTreeSet::from(["C".to_string()]));
        assert_eq!(
            extracted.literals(&Node::from(iri("C")), vocab::LABEL),
            vec![Literal::new_simple("C")]
        );
    }
}
