use std::path::PathBuf;

use ontoterm::{
    mireot::{extract_classes, DepthBounds},
    ontology::{document::parse_file, vocab, Iri, Literal, Node, TripleQuery},
    skos::{derive_identifier, ConversionMode, Owl2SkosConfig, Owl2SkosConverter},
    terminology::SkosTerminologyAbstractor,
};

fn single_class() -> ontoterm::ontology::Model {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/ontology/singleClass.owl");
    let source = parse_file(&path).expect("singleClass parses");
    let root = Iri::new("http://example.org/single#Klass").expect("iri");
    extract_classes(&source, &root, DepthBounds::unbounded())
}

fn config() -> Owl2SkosConfig {
    Owl2SkosConfig::new(Iri::new("http://my.edu/test").expect("iri")).with_mode(ConversionMode::Skos)
}

#[test]
fn single_class_becomes_a_single_concept() {
    let conversion = Owl2SkosConverter::new(config())
        .convert(&single_class())
        .expect("converted");
    let model = &conversion.model;

    let concepts: Vec<Iri> = model
        .instances_of(vocab::CONCEPT)
        .into_iter()
        .filter(|concept| concept != &conversion.top_concept)
        .collect();
    assert_eq!(concepts.len(), 1);
    assert_eq!(conversion.concepts, 1);

    let klass = Node::from(&concepts[0]);
    let id = derive_identifier("Klass");
    assert_eq!(concepts[0].as_str(), format!("http://my.edu/test#{id}"));
    assert_eq!(
        model.literals(&klass, vocab::IDENTIFIER),
        vec![Literal::new_simple(id.to_string())]
    );
    assert_eq!(
        model.literals(&klass, vocab::NOTATION),
        vec![Literal::new_simple("Klass")]
    );
    assert_eq!(
        model.object_iris(&klass, vocab::BROADER),
        vec![conversion.top_concept.clone()]
    );
    assert!(conversion.violations.is_empty());
}

#[test]
fn comments_only_travel_with_annotations() {
    let skos = Owl2SkosConverter::new(config())
        .convert(&single_class())
        .expect("converted");
    let full = Owl2SkosConverter::new(config().with_mode(ConversionMode::Full))
        .convert(&single_class())
        .expect("converted");

    let id = derive_identifier("Klass");
    let klass = Node::from(Iri::new(format!("http://my.edu/test#{id}")).expect("iri"));
    assert!(skos.model.literals(&klass, vocab::DEFINITION).is_empty());
    assert_eq!(
        full.model.literals(&klass, vocab::DEFINITION),
        vec![Literal::new_simple("The only class.")]
    );
}

#[test]
fn converted_model_abstracts_back_to_the_same_concept() {
    let conversion = Owl2SkosConverter::new(config())
        .convert(&single_class())
        .expect("converted");
    let graph = SkosTerminologyAbstractor::new(&conversion.model)
        .abstract_graph()
        .expect("abstracted");

    let scheme = graph.scheme(&conversion.scheme).expect("scheme");
    assert_eq!(scheme.tag(), "Test");
    assert_eq!(
        scheme.top_concept().map(|top| top.concept_id()),
        Some(&conversion.top_concept)
    );

    let terms = graph.linearized(&conversion.scheme).expect("linearized");
    assert_eq!(terms.len(), 1);
    let klass = terms[0];
    assert_eq!(klass.uuid(), derive_identifier("Klass"));
    assert_eq!(klass.tag(), "Klass");
    assert_eq!(klass.label(), "Klass");
    assert_eq!(klass.referent().as_str(), "http://example.org/single#Klass");
    assert!(graph.parents_of(&klass.reference()).is_empty());
}
