//! Read model handed to enumeration emitters.
//!
//! One [`EnumerationArtifact`] per unversioned scheme: where the generated
//! type goes, what it is called, and the latest release's concepts as
//! variants in hierarchy order.
use std::{
    collections::BTreeSet,
    path::PathBuf,
    sync::OnceLock,
};

use heck::{ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    term::{LabelKind, Term},
    versioned::{SchemeRelease, VersionedConceptGraph},
    TerminologyError,
};
use crate::ontology::Iri;

/// Where generated artifacts are placed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLayout {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self {
            root: default_root(),
            extension: default_extension(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("generated")
}

fn default_extension() -> String {
    "rs".to_string()
}

impl OutputLayout {
    #[must_use]
    pub fn location(&self, scheme_tag: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", identifier(scheme_tag).to_snake_case(), self.extension))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TerminologyCatalog {
    pub artifacts: Vec<EnumerationArtifact>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnumerationArtifact {
    pub scheme: Iri,
    pub type_name: String,
    pub location: PathBuf,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_concept: Option<String>,
    /// Newest first.
    pub releases: Vec<SchemeRelease>,
    pub variants: Vec<EnumerationVariant>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnumerationVariant {
    pub name: String,
    pub tag: String,
    pub uuid: Uuid,
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alternative_labels: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub referent: Iri,
    pub parents: Vec<String>,
    pub closure: Vec<String>,
}

impl TerminologyCatalog {
    /// Builds the catalog from the latest release of every scheme.
    pub fn build(graph: &VersionedConceptGraph, layout: &OutputLayout) -> Result<Self, TerminologyError> {
        let mut artifacts = Vec::new();
        for distinct in graph.distinct_concept_schemes() {
            let resource = distinct.resource_id();
            let Some(latest) = graph.latest_scheme(resource) else {
                continue;
            };

            let mut taken = BTreeSet::new();
            let mut variants = Vec::with_capacity(latest.len());
            for term in latest.linearize()? {
                let reference = term.reference();
                variants.push(EnumerationVariant {
                    name: unique(term.tag(), &mut taken),
                    tag: term.tag().to_string(),
                    uuid: term.uuid(),
                    label: term.label().to_string(),
                    alternative_labels: term.labels(LabelKind::Alternative).to_vec(),
                    notations: term.notations().to_vec(),
                    comment: term.comment().map(str::to_string),
                    referent: term.referent().clone(),
                    parents: tags(graph.parents_of(&reference)),
                    closure: tags(graph.ancestors_of(&reference)),
                });
            }

            artifacts.push(EnumerationArtifact {
                scheme: resource.clone(),
                type_name: identifier(latest.tag()).to_upper_camel_case(),
                location: layout.location(latest.tag()),
                label: latest.label().to_string(),
                top_concept: latest.top_concept().map(|top| top.tag().to_string()),
                releases: graph.scheme_releases(resource),
                variants,
            });
        }
        Ok(Self { artifacts })
    }

    #[must_use]
    pub fn artifact(&self, scheme: &Iri) -> Option<&EnumerationArtifact> {
        self.artifacts.iter().find(|artifact| &artifact.scheme == scheme)
    }
}

fn tags(terms: Vec<&Term>) -> Vec<String> {
    terms.into_iter().map(|term| term.tag().to_string()).collect()
}

fn separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\p{L}\p{N}]+").expect("separator regex must compile"))
}

/// Turns free text into something the case converters map onto a valid
/// identifier.
fn identifier(text: &str) -> String {
    let cleaned = separator_re().replace_all(text.trim(), "_");
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else if cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        format!("n_{cleaned}")
    } else {
        cleaned.to_string()
    }
}

fn unique(tag: &str, taken: &mut BTreeSet<String>) -> String {
    let base = identifier(tag).to_shouty_snake_case();
    let mut name = base.clone();
    let mut suffix = 2;
    while !taken.insert(name.clone()) {
        name = format!("{base}_{suffix}");
        suffix += 1;
    }
    name
}
