use std::collections::BTreeSet;

use oxrdf::NamedNodeRef;
use tracing::debug;

use super::ConversionError;
use crate::ontology::{vocab, Iri, Model, Node, Pattern, Statement, TripleQuery};

/// Relation families and the predicate their escaping edges collapse to.
const FAMILIES: [(&[NamedNodeRef<'static>], NamedNodeRef<'static>); 3] = [
    (&vocab::BROADER_FAMILY, vocab::BROADER),
    (&vocab::NARROWER_FAMILY, vocab::NARROWER),
    (&vocab::RELATED_FAMILY, vocab::RELATED),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealReport {
    pub top: Iri,
    /// Edges redirected to the top concept.
    pub redirected: usize,
    /// Self edges dropped.
    pub dropped: usize,
}

/// Closes a scheme's hierarchy.
///
/// After [`HierarchySealer::close`] every `broader`, `narrower` and `related`
/// edge (transitive variants included) points at a member of the scheme or at
/// its single top concept.
pub struct HierarchySealer<'a> {
    scheme: &'a Iri,
}

impl<'a> HierarchySealer<'a> {
    #[must_use]
    pub fn new(scheme: &'a Iri) -> Self {
        Self { scheme }
    }

    /// The unique top concept of the scheme.
    pub fn top_concept<Q: TripleQuery + ?Sized>(&self, model: &Q) -> Result<Iri, ConversionError> {
        let scheme = Node::from(self.scheme);
        let mut candidates: BTreeSet<Iri> = model
            .object_iris(&scheme, vocab::HAS_TOP_CONCEPT)
            .into_iter()
            .collect();
        candidates.extend(model.subject_iris(vocab::TOP_CONCEPT_OF, &scheme));

        let mut candidates = candidates.into_iter();
        match (candidates.next(), candidates.next()) {
            (None, _) => Err(ConversionError::MissingTopConcept {
                scheme: self.scheme.clone(),
            }),
            (Some(top), None) => Ok(top),
            (Some(first), Some(second)) => Err(ConversionError::AmbiguousTopConcept {
                scheme: self.scheme.clone(),
                candidates: [first, second].into_iter().chain(candidates).collect(),
            }),
        }
    }

    pub fn close(&self, model: &mut Model) -> Result<SealReport, ConversionError> {
        let top = self.top_concept(model)?;
        let members: BTreeSet<Node> = model
            .subjects(vocab::IN_SCHEME, &Node::from(self.scheme))
            .into_iter()
            .chain(std::iter::once(Node::from(&top)))
            .collect();
        let top_node = Node::from(&top);

        let mut report = SealReport {
            top,
            redirected: 0,
            dropped: 0,
        };
        for (family, base) in FAMILIES {
            for predicate in family {
                for statement in model.select(&Pattern::any().predicate(*predicate)) {
                    if statement.subject == statement.object {
                        model.remove(&statement);
                        report.dropped += 1;
                        continue;
                    }
                    if members.contains(&statement.object) {
                        continue;
                    }
                    model.remove(&statement);
                    if statement.subject != top_node {
                        model.insert(Statement::new(statement.subject, base, top_node.clone()));
                    }
                    report.redirected += 1;
                }
            }
        }

        debug!(
            scheme = %self.scheme,
            top = %report.top,
            redirected = report.redirected,
            dropped = report.dropped,
            "skos_hierarchy_sealed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::HierarchySealer;
    use crate::{
        ontology::{vocab, Iri, Model, Node, Pattern, Statement, TripleQuery},
        skos::ConversionError,
    };

    fn iri(local: &str) -> Iri {
        Iri::new(format!("http://my.edu/test#{local}")).expect("iri")
    }

    fn scheme_with_top() -> Model {
        let mut model = Model::new();
        model.insert(Statement::new(iri("S"), vocab::HAS_TOP_CONCEPT, iri("Top")));
        model.insert(Statement::new(iri("Top"), vocab::TOP_CONCEPT_OF, iri("S")));
        for local in ["a", "b"] {
            model.insert(Statement::new(iri(local), vocab::IN_SCHEME, iri("S")));
        }
        model
    }

    #[test]
    fn escaping_edges_are_redirected_to_the_top() {
        let mut model = scheme_with_top();
        let outside = Iri::new("http://elsewhere/Thing").expect("iri");
        model.insert(Statement::new(iri("b"), vocab::BROADER, iri("a")));
        model.insert(Statement::new(iri("a"), vocab::BROADER_TRANSITIVE, outside.clone()));
        model.insert(Statement::new(iri("b"), vocab::RELATED, outside.clone()));
        model.insert(Statement::new(iri("a"), vocab::NARROWER, outside));
        model.insert(Statement::new(iri("a"), vocab::BROADER, iri("a")));

        let report = HierarchySealer::new(&iri("S")).close(&mut model).expect("sealed");
        assert_eq!(report.top, iri("Top"));
        assert_eq!(report.redirected, 3);
        assert_eq!(report.dropped, 1);

        assert!(model.contains(&Statement::new(iri("b"), vocab::BROADER, iri("a"))));
        assert!(model.contains(&Statement::new(iri("a"), vocab::BROADER, iri("Top"))));
        assert!(model.contains(&Statement::new(iri("b"), vocab::RELATED, iri("Top"))));
        assert!(model.contains(&Statement::new(iri("a"), vocab::NARROWER, iri("Top"))));
        assert!(model
            .select(&Pattern::any().predicate(vocab::BROADER_TRANSITIVE))
            .is_empty());

        let members = [iri("a"), iri("b"), iri("Top")].map(Node::from);
        for predicate in [vocab::BROADER, vocab::NARROWER, vocab::RELATED] {
            for statement in model.select(&Pattern::any().predicate(predicate)) {
                assert!(members.contains(&statement.object));
                assert_ne!(statement.subject, statement.object);
            }
        }
    }

    #[test]
    fn top_concept_never_points_at_itself() {
        let mut model = scheme_with_top();
        model.insert(Statement::new(
            iri("Top"),
            vocab::BROADER,
            Iri::new("http://elsewhere/Root").expect("iri"),
        ));
        HierarchySealer::new(&iri("S")).close(&mut model).expect("sealed");
        assert!(model
            .objects(&Node::from(iri("Top")), vocab::BROADER)
            .is_empty());
    }

    #[test]
    fn zero_or_many_top_concepts_are_fatal() {
        let mut empty = Model::new();
        empty.insert(Statement::new(iri("a"), vocab::IN_SCHEME, iri("S")));
        assert!(matches!(
            HierarchySealer::new(&iri("S")).close(&mut empty),
            Err(ConversionError::MissingTopConcept { .. })
        ));

        let mut two = scheme_with_top();
        two.insert(Statement::new(iri("Other"), vocab::TOP_CONCEPT_OF, iri("S")));
        let err = HierarchySealer::new(&iri("S"))
            .close(&mut two)
            .expect_err("ambiguous");
        assert!(matches!(
            err,
            ConversionError::AmbiguousTopConcept { ref candidates, .. } if candidates.len() == 2
        ));
    }
}
