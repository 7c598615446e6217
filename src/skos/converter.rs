use std::borrow::Cow;

use heck::ToUpperCamelCase;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    rules::{standard_rules, ConstructRule, RuleContext},
    sealer::{HierarchySealer, SealReport},
    validator::{SkosValidator, Violation},
    ConversionError,
};
use crate::{
    ontology::{vocab, HierarchyReasoner, Iri, Model, Reasoner},
    terminology::term::LabelKind,
};

/// Which rule groups run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionMode {
    /// Scheme, concepts and hierarchy.
    #[default]
    Skos,
    /// Annotations on minted concept IRIs only.
    Annotations,
    /// OntoLex lexical entries only.
    Lex,
    /// Everything.
    Full,
}

impl ConversionMode {
    #[must_use]
    pub fn includes_concepts(self) -> bool {
        matches!(self, Self::Skos | Self::Full)
    }

    #[must_use]
    pub fn includes_annotations(self) -> bool {
        matches!(self, Self::Annotations | Self::Full)
    }

    #[must_use]
    pub fn includes_lex(self) -> bool {
        matches!(self, Self::Lex | Self::Full)
    }
}

/// What happens to validation findings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationLevel {
    Off,
    /// Log every violation and accept the model.
    #[default]
    Warn,
    /// Reject the model when anything is found.
    Strict,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Owl2SkosConfig {
    pub target_namespace: Iri,
    pub scheme_name: Option<String>,
    pub top_concept_name: Option<String>,
    pub mode: ConversionMode,
    pub validate: ValidationLevel,
    /// Every concept becomes a direct child of the top concept.
    pub flatten: bool,
    /// Emit an ontology header importing the source ontologies.
    pub add_imports: bool,
    /// Materialize hierarchy entailments before conversion.
    pub infer: bool,
    /// Label property used when no preferred label exists.
    pub label_property: Iri,
    /// Label kind that wins over `skos:prefLabel`.
    pub primary_label: Option<LabelKind>,
    /// Properties holding explicit codes, in priority order.
    pub code_properties: Vec<Iri>,
    /// Overrides the source ontology's `owl:versionInfo`.
    pub version_tag: Option<String>,
}

impl Owl2SkosConfig {
    #[must_use]
    pub fn new(target_namespace: Iri) -> Self {
        Self {
            target_namespace,
            scheme_name: None,
            top_concept_name: None,
            mode: ConversionMode::default(),
            validate: ValidationLevel::default(),
            flatten: false,
            add_imports: false,
            infer: false,
            label_property: vocab::LABEL.into(),
            primary_label: None,
            code_properties: vec![vocab::NOTATION.into(), vocab::IDENTIFIER.into()],
            version_tag: None,
        }
    }

    #[must_use]
    pub fn with_scheme_name(mut self, name: impl Into<String>) -> Self {
        self.scheme_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_top_concept_name(mut self, name: impl Into<String>) -> Self {
        self.top_concept_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ConversionMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_validation(mut self, level: ValidationLevel) -> Self {
        self.validate = level;
        self
    }

    #[must_use]
    pub fn flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    #[must_use]
    pub fn add_imports(mut self, add_imports: bool) -> Self {
        self.add_imports = add_imports;
        self
    }

    #[must_use]
    pub fn infer(mut self, infer: bool) -> Self {
        self.infer = infer;
        self
    }

    #[must_use]
    pub fn with_primary_label(mut self, kind: LabelKind) -> Self {
        self.primary_label = Some(kind);
        self
    }

    #[must_use]
    pub fn with_version_tag(mut self, version_tag: Option<String>) -> Self {
        self.version_tag = version_tag;
        self
    }

    /// Explicit scheme name, else the namespace's last segment in upper camel
    /// case, else `Scheme`.
    #[must_use]
    pub fn effective_scheme_name(&self) -> String {
        if let Some(name) = &self.scheme_name {
            return name.clone();
        }
        let trimmed = self.target_namespace.as_str().trim_end_matches(['#', '/', ':']);
        let segment = trimmed
            .rsplit(['#', '/', ':'])
            .next()
            .unwrap_or_default()
            .to_upper_camel_case();
        if segment.is_empty() {
            "Scheme".to_string()
        } else {
            segment
        }
    }

    #[must_use]
    pub fn effective_top_concept_name(&self) -> String {
        self.top_concept_name
            .clone()
            .unwrap_or_else(|| format!("{}Top", self.effective_scheme_name()))
    }

    /// Mints `name` in the target namespace.
    pub fn mint(&self, name: &str) -> Result<Iri, ConversionError> {
        self.target_namespace
            .join(name)
            .map_err(|source| ConversionError::InvalidName {
                name: name.to_string(),
                source,
            })
    }

    /// IRI naming one release of the scheme.
    pub fn version_iri(&self, version_tag: &str) -> Result<Iri, ConversionError> {
        let base = self.target_namespace.as_str().trim_end_matches(['#', '/']);
        let scheme = self.effective_scheme_name();
        Iri::new(format!("{base}/versions/{version_tag}#{scheme}")).map_err(|source| {
            ConversionError::InvalidName {
                name: version_tag.to_string(),
                source,
            }
        })
    }
}

/// Result of one conversion.
#[derive(Clone, Debug)]
pub struct Conversion {
    pub model: Model,
    pub scheme: Iri,
    pub top_concept: Iri,
    pub concepts: usize,
    pub seal: Option<SealReport>,
    /// Findings accepted under [`ValidationLevel::Warn`].
    pub violations: Vec<Violation>,
}

/// Rewrites an extracted OWL subgraph into a sealed SKOS concept scheme.
pub struct Owl2SkosConverter {
    config: Owl2SkosConfig,
    rules: Vec<Box<dyn ConstructRule>>,
    reasoner: Box<dyn Reasoner>,
}

impl Owl2SkosConverter {
    #[must_use]
    pub fn new(config: Owl2SkosConfig) -> Self {
        Self {
            config,
            rules: standard_rules(),
            reasoner: Box::new(HierarchyReasoner),
        }
    }

    /// Replaces the reasoner used when [`Owl2SkosConfig::infer`] is set.
    #[must_use]
    pub fn with_reasoner(mut self, reasoner: Box<dyn Reasoner>) -> Self {
        self.reasoner = reasoner;
        self
    }

    #[must_use]
    pub fn config(&self) -> &Owl2SkosConfig {
        &self.config
    }

    pub fn convert(&self, source: &Model) -> Result<Conversion, ConversionError> {
        let source = if self.config.infer {
            Cow::Owned(self.reasoner.materialize(source))
        } else {
            Cow::Borrowed(source)
        };

        let context = RuleContext::mint(&source, &self.config)?;
        let mut model = Model::new();
        for rule in self.rules.iter().filter(|rule| rule.enabled(&self.config)) {
            let before = model.len();
            rule.apply(&source, &context, &mut model);
            debug!(
                rule = rule.name(),
                added = model.len() - before,
                "skos_rule_applied"
            );
        }

        let seal = if self.config.mode.includes_concepts() {
            Some(HierarchySealer::new(&context.scheme).close(&mut model)?)
        } else {
            None
        };

        let violations = match self.config.validate {
            ValidationLevel::Off => Vec::new(),
            ValidationLevel::Warn => {
                let violations = SkosValidator.validate(&model);
                for violation in &violations {
                    warn!(violation = %violation, "skos_validation_violation");
                }
                violations
            }
            ValidationLevel::Strict => {
                let violations = SkosValidator.validate(&model);
                if !violations.is_empty() {
                    return Err(ConversionError::Validation { violations });
                }
                violations
            }
        };

        debug!(
            scheme = %context.scheme,
            concepts = context.concepts.len(),
            statements = model.len(),
            "skos_converted"
        );
        Ok(Conversion {
            concepts: context.concepts.len(),
            scheme: context.scheme,
            top_concept: context.top,
            model,
            seal,
            violations,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{ConversionMode, Owl2SkosConfig, Owl2SkosConverter, ValidationLevel};
    use crate::{
        ontology::{vocab, Iri, Literal, Model, Node, Statement, TripleQuery},
        skos::{derive_identifier, ConversionError},
        terminology::term::LabelKind,
    };

    const SRC: &str = "http://src.org/onto#";

    fn src(local: &str) -> Iri {
        Iri::new(format!("{SRC}{local}")).expect("iri")
    }

    fn config() -> Owl2SkosConfig {
        Owl2SkosConfig::new(Iri::new("http://my.edu/test").expect("iri"))
    }

    /// Animal <- Dog, Dog has an outside parent and a blank-free label set.
    fn source() -> Model {
        let mut model = Model::new();
        for local in ["Animal", "Dog"] {
            model.insert(Statement::new(src(local), vocab::TYPE, vocab::CLASS));
        }
        model.insert(Statement::new(src("Dog"), vocab::SUB_CLASS_OF, src("Animal")));
        model.insert(Statement::new(
            src("Dog"),
            vocab::SUB_CLASS_OF,
            Iri::new("http://elsewhere/Pet").expect("iri"),
        ));
        model.insert(Statement::new(src("Animal"), vocab::SUB_CLASS_OF, vocab::THING));
        model.insert(Statement::new(
            src("Dog"),
            vocab::LABEL,
            Literal::new_language_tagged("dog", "en"),
        ));
        model.insert(Statement::new(
            src("Dog"),
            vocab::COMMENT,
            Literal::new_simple("Barks."),
        ));
        model
    }

    fn minted(local: &str) -> Node {
        Node::from(
            Iri::new(format!("http://my.edu/test#{}", derive_identifier(local))).expect("iri"),
        )
    }

    #[rstest]
    #[case("http://my.edu/test", "Test", "TestTop")]
    #[case("http://my.edu/blood-pressure/", "BloodPressure", "BloodPressureTop")]
    #[case("urn:x:", "X", "XTop")]
    fn default_names_come_from_the_namespace(#[case] ns: &str, #[case] scheme: &str, #[case] top: &str) {
        let config = Owl2SkosConfig::new(Iri::new(ns).expect("iri"));
        assert_eq!(config.effective_scheme_name(), scheme);
        assert_eq!(config.effective_top_concept_name(), top);
    }

    #[test]
    fn converts_classes_into_a_sealed_scheme() {
        let conversion = Owl2SkosConverter::new(config()).convert(&source()).expect("converted");
        let model = &conversion.model;

        assert_eq!(conversion.scheme.as_str(), "http://my.edu/test#Test");
        assert_eq!(conversion.top_concept.as_str(), "http://my.edu/test#TestTop");
        assert_eq!(conversion.concepts, 2);

        let dog = minted("Dog");
        let animal = minted("Animal");
        let top = Node::from(&conversion.top_concept);
        assert!(model.has_type(&dog, vocab::CONCEPT));
        assert_eq!(
            model.literals(&dog, vocab::NOTATION),
            vec![Literal::new_simple("Dog")]
        );
        assert_eq!(
            model.literals(&dog, vocab::PREF_LABEL),
            vec![Literal::new_language_tagged("dog", "en")]
        );
        assert_eq!(
            model.literals(&animal, vocab::PREF_LABEL),
            vec![Literal::new_simple("Animal")]
        );
        assert_eq!(model.object_iris(&dog, vocab::SOURCE), vec![src("Dog")]);

        let mut parents = model.objects(&dog, vocab::BROADER);
        parents.sort();
        let mut expected = vec![animal.clone(), top.clone()];
        expected.sort();
        assert_eq!(parents, expected);
        assert_eq!(model.objects(&animal, vocab::BROADER), vec![top]);
        assert!(model.objects(&animal, vocab::NARROWER).contains(&dog));
        // annotations only run in annotation modes
        assert!(model.literals(&dog, vocab::DEFINITION).is_empty());
        assert!(conversion.violations.is_empty());
    }

    #[test]
    fn full_mode_adds_annotations_and_lexical_entries() {
        let conversion = Owl2SkosConverter::new(config().with_mode(ConversionMode::Full))
            .convert(&source())
            .expect("converted");
        let model = &conversion.model;
        let dog = minted("Dog");
        assert_eq!(
            model.literals(&dog, vocab::DEFINITION),
            vec![Literal::new_simple("Barks.")]
        );
        assert!(model.has_type(&dog, vocab::LEXICAL_CONCEPT));
        let entries = model.subjects(vocab::EVOKES, &dog);
        assert_eq!(entries.len(), 1);
        assert!(model.has_type(&entries[0], vocab::LEXICAL_ENTRY));
    }

    #[test]
    fn lex_mode_skips_the_scheme() {
        let conversion = Owl2SkosConverter::new(config().with_mode(ConversionMode::Lex))
            .convert(&source())
            .expect("converted");
        assert!(conversion.seal.is_none());
        assert!(conversion.model.instances_of(vocab::CONCEPT_SCHEME).is_empty());
        assert_eq!(conversion.model.instances_of(vocab::LEXICAL_ENTRY).len(), 2);
    }

    #[test]
    fn flatten_hangs_everything_off_the_top() {
        let conversion = Owl2SkosConverter::new(config().flatten(true))
            .convert(&source())
            .expect("converted");
        let top = Node::from(&conversion.top_concept);
        assert_eq!(conversion.model.objects(&minted("Dog"), vocab::BROADER), vec![top]);
    }

    #[test]
    fn primary_label_kind_wins() {
        let mut source = source();
        source.insert(Statement::new(
            src("Dog"),
            vocab::HIDDEN_LABEL,
            Literal::new_simple("canis"),
        ));
        let conversion = Owl2SkosConverter::new(config().with_primary_label(LabelKind::Hidden))
            .convert(&source)
            .expect("converted");
        assert_eq!(
            conversion.model.literals(&minted("Dog"), vocab::PREF_LABEL),
            vec![Literal::new_simple("canis")]
        );
    }

    #[test]
    fn strict_validation_rejects_label_clashes() {
        let mut source = source();
        source.insert(Statement::new(
            src("Dog"),
            vocab::PREF_LABEL,
            Literal::new_language_tagged("hound", "en"),
        ));
        source.insert(Statement::new(
            src("Dog"),
            vocab::PREF_LABEL,
            Literal::new_language_tagged("doggo", "en"),
        ));
        let converter = Owl2SkosConverter::new(
            config()
                .with_mode(ConversionMode::Full)
                .with_validation(ValidationLevel::Strict),
        );
        // the label policy keeps one preferred label per language
        assert!(converter.convert(&source).is_ok());

        source.insert(Statement::new(
            src("Dog"),
            vocab::RELATED,
            src("Animal"),
        ));
        let err = converter.convert(&source).expect_err("related clashes with broader");
        assert!(matches!(err, ConversionError::Validation { ref violations } if violations.len() == 1));
    }

    #[test]
    fn versions_and_imports_follow_the_source_ontology() {
        let mut source = source();
        let ontology = Iri::new("http://src.org/onto").expect("iri");
        source.insert(Statement::new(ontology.clone(), vocab::TYPE, vocab::ONTOLOGY));
        source.insert(Statement::new(
            ontology.clone(),
            vocab::VERSION_INFO,
            Literal::new_simple("3.0"),
        ));
        source.insert(Statement::new(
            ontology.clone(),
            vocab::ISSUED,
            Literal::new_typed("2023-05-01", vocab::XSD_DATE),
        ));

        let conversion = Owl2SkosConverter::new(config().add_imports(true))
            .convert(&source)
            .expect("converted");
        let model = &conversion.model;
        let scheme = Node::from(&conversion.scheme);
        assert_eq!(
            model.literals(&scheme, vocab::VERSION_INFO),
            vec![Literal::new_simple("3.0")]
        );
        assert_eq!(
            model.object_iris(&scheme, vocab::VERSION_IRI),
            vec![Iri::new("http://my.edu/test/versions/3.0#Test").expect("iri")]
        );
        assert_eq!(model.literals(&scheme, vocab::ISSUED).len(), 1);
        assert_eq!(
            model.object_iris(&Node::from(Iri::new("http://my.edu/test").expect("iri")), vocab::IMPORTS),
            vec![ontology]
        );
    }
}
