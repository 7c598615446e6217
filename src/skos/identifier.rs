//! Content-derived identifiers for minted concepts.
use uuid::Uuid;

use crate::ontology::{
    model::{Node, TripleQuery},
    value_objects::Iri,
};

/// Namespace for name-based concept identifiers.
pub const CONCEPT_NAMESPACE: Uuid = Uuid::from_u128(0x5d1e_0b7a_3c4f_4e21_9a8b_6f2d_1c0e_7b93);

/// Derives the stable identifier of a natural key.
///
/// Equal keys always map to the same identifier, across runs and releases.
#[must_use]
pub fn derive_identifier(natural_key: &str) -> Uuid {
    Uuid::new_v5(&CONCEPT_NAMESPACE, natural_key.as_bytes())
}

/// Best available natural key of `entity`: the first literal found on any of
/// `code_properties`, else the entity's local name.
#[must_use]
pub fn natural_key<Q: TripleQuery + ?Sized>(source: &Q, entity: &Iri, code_properties: &[Iri]) -> String {
    let node = Node::from(entity);
    code_properties
        .iter()
        .find_map(|property| {
            source
                .literals(&node, property.as_named_node())
                .into_iter()
                .map(|literal| literal.value().trim().to_string())
                .find(|value| !value.is_empty())
        })
        .unwrap_or_else(|| entity.local_name().to_string())
}

#[cfg(test)]
mod tests {
    use super::{derive_identifier, natural_key};
    use crate::ontology::{
        model::{Literal, Model, Statement},
        value_objects::Iri,
        vocab,
    };

    #[test]
    fn identifiers_are_stable_and_distinct() {
        assert_eq!(derive_identifier("Klass"), derive_identifier("Klass"));
        assert_ne!(derive_identifier("Klass"), derive_identifier("klass"));
        assert_eq!(derive_identifier("Klass").get_version_num(), 5);
    }

    #[test]
    fn explicit_codes_win_over_local_names() {
        let entity = Iri::new("http://example.org/onto#Klass").expect("iri");
        let mut model = Model::new();
        let codes = vec![Iri::from(vocab::NOTATION), Iri::from(vocab::IDENTIFIER)];
        assert_eq!(natural_key(&model, &entity, &codes), "Klass");

        model.insert(Statement::new(
            entity.clone(),
            vocab::IDENTIFIER,
            Literal::new_simple(" K-001 "),
        ));
        assert_eq!(natural_key(&model, &entity, &codes), "K-001");
    }
}
