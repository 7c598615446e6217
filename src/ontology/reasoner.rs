use super::{
    model::{Model, Node, Pattern, Statement, TripleQuery},
    vocab,
};

/// Materializes entailments of a model.
///
/// The pipeline treats reasoning as an opaque step: the converter hands the
/// extracted subgraph in and works on whatever comes back.
pub trait Reasoner {
    fn materialize(&self, model: &Model) -> Model;
}

/// Native reasoner covering the hierarchy entailments the converter needs.
///
/// * `owl:equivalentClass` is made symmetric and equivalent classes share
///   their named superclasses. No mutual `rdfs:subClassOf` is asserted, so
///   equivalence never turns into a hierarchy cycle.
/// * `skos:narrower` and `skos:broader` are made inverse of each other.
/// * `skos:related` is made symmetric.
///
/// Self edges are never produced. One pass is made; chains of equivalences
/// are not closed.
#[derive(Clone, Copy, Debug, Default)]
pub struct HierarchyReasoner;

impl Reasoner for HierarchyReasoner {
    fn materialize(&self, model: &Model) -> Model {
        let mut entailed = model.clone();

        let equivalences: Vec<(Node, Node)> = model
            .select(&Pattern::any().predicate(vocab::EQUIVALENT_CLASS))
            .into_iter()
            .filter(|statement| statement.subject != statement.object && !statement.object.is_literal())
            .flat_map(|statement| {
                [
                    (statement.subject.clone(), statement.object.clone()),
                    (statement.object, statement.subject),
                ]
            })
            .collect();
        for (class, equivalent) in equivalences {
            entailed.insert(Statement::new(
                class.clone(),
                vocab::EQUIVALENT_CLASS,
                equivalent.clone(),
            ));
            for parent in model.objects(&equivalent, vocab::SUB_CLASS_OF) {
                if parent != class && !matches!(parent, Node::Literal(_) | Node::Blank(_)) {
                    entailed.insert(Statement::new(class.clone(), vocab::SUB_CLASS_OF, parent));
                }
            }
        }

        entailed.extend(inverse(model, vocab::BROADER, vocab::NARROWER));
        entailed.extend(inverse(model, vocab::NARROWER, vocab::BROADER));
        entailed.extend(inverse(model, vocab::RELATED, vocab::RELATED));
        entailed
    }
}

fn inverse(
    model: &Model,
    predicate: oxrdf::NamedNodeRef<'_>,
    inverse: oxrdf::NamedNodeRef<'_>,
) -> Vec<Statement> {
    model
        .select(&Pattern::any().predicate(predicate))
        .into_iter()
        .filter(|statement| statement.subject != statement.object)
        .filter_map(|statement| match statement.object {
            Node::Iri(_) | Node::Blank(_) => {
                Some(Statement::new(statement.object, inverse, statement.subject))
            }
            Node::Literal(_) => None,
        })
        .collect()
}
