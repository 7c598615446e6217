use std::{collections::BTreeSet, path::PathBuf};

use ontoterm::{
    mireot::{DepthBounds, EntityType, MireotConfig, MireotExtractor},
    ontology::{
        document::{parse_file, parse_reader},
        vocab, Iri, Model, Statement, TripleQuery,
    },
};
use oxrdfio::RdfFormat;
use rstest::rstest;

const PROPERTIES: &str = r#"
    @prefix owl: <http://www.w3.org/2002/07/owl#> .
    @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
    @prefix ex: <http://test/props#> .
    ex:relatesTo a owl:ObjectProperty ; rdfs:label "relates to"@en .
    ex:partOf a owl:ObjectProperty ; rdfs:subPropertyOf ex:relatesTo .
    ex:memberOf a owl:ObjectProperty ; rdfs:subPropertyOf ex:partOf .
    ex:hasValue a owl:DatatypeProperty .
    ex:hasWeight a owl:DatatypeProperty ; rdfs:subPropertyOf ex:hasValue .
    ex:Colour a owl:Class ; rdfs:label "Colour"@en .
    ex:Shape a owl:Class .
    ex:red a owl:NamedIndividual, ex:Colour ; rdfs:label "red"@en .
    ex:blue a owl:NamedIndividual, ex:Colour .
    ex:square a owl:NamedIndividual, ex:Shape .
"#;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/ontology")
        .join(name)
}

fn deep(local: &str) -> Iri {
    Iri::new(format!("http://test/deep#{local}")).expect("iri")
}

fn classes(model: &Model) -> BTreeSet<String> {
    model
        .instances_of(vocab::CLASS)
        .iter()
        .map(|iri| iri.local_name().to_string())
        .collect()
}

fn names(names: &str) -> BTreeSet<String> {
    names.split(',').filter(|n| !n.is_empty()).map(str::to_string).collect()
}

#[rstest]
#[case::depth_window("A", DepthBounds::between(3, 4), "G,H,I,K")]
#[case::root_only("A", DepthBounds::root_only(), "A")]
#[case::first_level("A", DepthBounds::between(0, 1), "A,B,C,F")]
#[case::everything("A", DepthBounds::unbounded(), "A,B,C,D,E,F,G,H,I,J,K")]
#[case::open_ended("A", DepthBounds { min: Some(5), max: None }, "J")]
#[case::both_directions("G", DepthBounds { min: None, max: Some(1) }, "D,G,H,I,K")]
fn extracts_the_depth_window(#[case] root: &str, #[case] bounds: DepthBounds, #[case] expected: &str) {
    let source = parse_file(&fixture("deepHier.owl")).expect("deepHier parses");
    let config = MireotConfig::new(EntityType::Class).with_depth(bounds);

    let extracted = MireotExtractor::new(&source).extract(&deep(root), &config);
    assert_eq!(classes(&extracted), names(expected));
}

#[rstest]
#[case::object_properties(EntityType::ObjectProperty, "relatesTo", "memberOf,partOf,relatesTo")]
#[case::data_properties(EntityType::DataProperty, "hasValue", "hasValue,hasWeight")]
#[case::individuals(EntityType::Individual, "blue", "blue")]
#[case::members_of_a_class(EntityType::Individual, "Colour", "blue,red")]
fn extracts_each_entity_type(#[case] entity_type: EntityType, #[case] root: &str, #[case] expected: &str) {
    let source = parse_reader(PROPERTIES.as_bytes(), RdfFormat::Turtle, None, "properties")
        .expect("properties parse");
    let root = Iri::new(format!("http://test/props#{root}")).expect("iri");

    let extracted = MireotExtractor::new(&source).extract(&root, &MireotConfig::new(entity_type));
    let declared: BTreeSet<String> = extracted
        .instances_of(entity_type.declaration())
        .iter()
        .map(|iri| iri.local_name().to_string())
        .collect();
    assert_eq!(declared, names(expected));
}

#[test]
fn individuals_keep_membership_and_annotations() {
    let source = parse_reader(PROPERTIES.as_bytes(), RdfFormat::Turtle, None, "properties")
        .expect("properties parse");
    let props = |local: &str| Iri::new(format!("http://test/props#{local}")).expect("iri");

    let extracted = MireotExtractor::new(&source)
        .extract(&props("Colour"), &MireotConfig::new(EntityType::Individual));
    assert!(extracted.contains(&Statement::new(props("red"), vocab::TYPE, props("Colour"))));
    assert!(extracted.contains(&Statement::new(props("Colour"), vocab::TYPE, vocab::CLASS)));
    assert_eq!(
        extracted.literals(&props("red").into(), vocab::LABEL).len(),
        1
    );
    assert!(extracted.instances_of(vocab::OBJECT_PROPERTY).is_empty());
    assert!(!extracted.contains(&Statement::new(props("square"), vocab::TYPE, props("Shape"))));
}

#[test]
fn keeps_only_edges_between_retained_entities() {
    let source = parse_file(&fixture("deepHier.owl")).expect("deepHier parses");
    let config = MireotConfig::new(EntityType::Class).with_depth(DepthBounds::between(3, 4));
    let extracted = MireotExtractor::new(&source).extract(&deep("A"), &config);

    assert!(extracted.contains(&Statement::new(deep("H"), vocab::SUB_CLASS_OF, deep("G"))));
    assert!(!extracted.contains(&Statement::new(deep("G"), vocab::SUB_CLASS_OF, deep("D"))));
    assert!(!extracted.contains(&Statement::new(deep("J"), vocab::SUB_CLASS_OF, deep("H"))));
    assert_eq!(
        extracted.instances_of(vocab::ONTOLOGY),
        vec![Iri::new("http://test/deep").expect("iri")]
    );
}

#[test]
fn bare_root_names_resolve_against_the_base_uri() {
    let source = parse_file(&fixture("deepHier.owl")).expect("deepHier parses");
    let config = MireotConfig::new(EntityType::Class)
        .with_base_uri(Iri::new("http://test/deep").expect("iri"))
        .entity_only(true);
    let root = config.resolve_root("K").expect("resolved");

    let extracted = MireotExtractor::new(&source).extract(&root, &config);
    assert_eq!(classes(&extracted), names("K"));
}

#[test]
fn unknown_root_yields_an_empty_model() {
    let source = parse_file(&fixture("deepHier.owl")).expect("deepHier parses");
    let extracted =
        MireotExtractor::new(&source).extract(&deep("Nope"), &MireotConfig::new(EntityType::Class));
    assert!(extracted.is_empty());
}
