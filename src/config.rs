//! # Configuration
//!
//! A run is described by one YAML document:
//!
//! ```yaml
//! logger:
//!   level: debug
//! catalog:
//!   "http://purl.obolibrary.org/obo/bfo.owl": vendor/bfo.owl
//! mireot:
//!   entity_type: class
//!   max_depth: 4
//! skos:
//!   target_namespace: http://my.edu/terms
//!   validate: strict
//! output:
//!   root: generated
//! sources:
//!   - path: ontology/units.owl
//!     root: http://my.edu/units#Unit
//!     version_tag: "2.1"
//! ```
//!
//! Relative paths (catalog locations, source documents and the output root)
//! are anchored at the directory holding the configuration file.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    logger,
    mireot::MireotConfig,
    ontology::{Catalog, Iri},
    skos::{ConversionMode, Owl2SkosConfig, ValidationLevel},
    terminology::{LabelKind, OutputLayout},
    Error, Result,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logger: Logger,
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub imports: Imports,
    #[serde(default)]
    pub mireot: MireotConfig,
    #[serde(default)]
    pub skos: SkosSettings,
    #[serde(default)]
    pub output: OutputLayout,
    #[serde(default)]
    pub sources: Vec<SourceSettings>,
}

/// Logger configuration
///
/// Example (development):
/// ```yaml
/// logger:
///   enable: true
///   level: debug
///   format: compact
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Logger {
    #[serde(default = "default_true")]
    pub enable: bool,

    #[serde(default)]
    pub level: logger::LogLevel,

    #[serde(default)]
    pub format: logger::Format,

    /// Raw filter directives replacing the level-based default.
    #[serde(default)]
    pub override_filter: Option<String>,
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            enable: true,
            level: logger::LogLevel::default(),
            format: logger::Format::default(),
            override_filter: None,
        }
    }
}

/// How `owl:imports` are followed while loading sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Imports {
    #[serde(default = "default_true")]
    pub follow: bool,
    /// Fail a source whose imports cannot be resolved.
    #[serde(default)]
    pub strict: bool,
}

impl Default for Imports {
    fn default() -> Self {
        Self {
            follow: true,
            strict: false,
        }
    }
}

/// Conversion settings shared by every source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SkosSettings {
    #[serde(default)]
    pub target_namespace: Option<Iri>,
    #[serde(default)]
    pub scheme_name: Option<String>,
    #[serde(default)]
    pub top_concept_name: Option<String>,
    #[serde(default)]
    pub mode: ConversionMode,
    #[serde(default)]
    pub validate: ValidationLevel,
    #[serde(default)]
    pub flatten: bool,
    #[serde(default)]
    pub add_imports: bool,
    #[serde(default)]
    pub infer: bool,
    #[serde(default)]
    pub label_property: Option<Iri>,
    #[serde(default)]
    pub primary_label: Option<LabelKind>,
    #[serde(default)]
    pub code_properties: Option<Vec<Iri>>,
}

impl SkosSettings {
    /// Converter settings for one source. Per-source values win.
    pub fn for_source(&self, source: &SourceSettings) -> Result<Owl2SkosConfig> {
        let namespace = source
            .target_namespace
            .clone()
            .or_else(|| self.target_namespace.clone())
            .ok_or_else(|| {
                Error::Message(format!(
                    "source `{}` has no target_namespace and skos.target_namespace is unset",
                    source.path.display()
                ))
            })?;

        let mut config = Owl2SkosConfig::new(namespace)
            .with_mode(self.mode)
            .with_validation(self.validate)
            .flatten(self.flatten)
            .add_imports(self.add_imports)
            .infer(self.infer)
            .with_version_tag(source.version_tag.clone());
        if let Some(name) = source.scheme_name.as_ref().or(self.scheme_name.as_ref()) {
            config = config.with_scheme_name(name.clone());
        }
        if let Some(name) = &self.top_concept_name {
            config = config.with_top_concept_name(name.clone());
        }
        if let Some(kind) = self.primary_label {
            config = config.with_primary_label(kind);
        }
        if let Some(property) = &self.label_property {
            config.label_property = property.clone();
        }
        if let Some(properties) = &self.code_properties {
            config.code_properties = properties.clone();
        }
        Ok(config)
    }
}

/// One compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceSettings {
    pub path: PathBuf,
    /// Root entity, as an IRI or a local name under `mireot.base_uri`.
    pub root: String,
    #[serde(default)]
    pub version_tag: Option<String>,
    #[serde(default)]
    pub scheme_name: Option<String>,
    #[serde(default)]
    pub target_namespace: Option<Iri>,
}

impl SourceSettings {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, root: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            root: root.into(),
            version_tag: None,
            scheme_name: None,
            target_namespace: None,
        }
    }

    #[must_use]
    pub fn with_version_tag(mut self, version_tag: impl Into<String>) -> Self {
        self.version_tag = Some(version_tag.into());
        self
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Reads and rebases the configuration at `path`.
    ///
    /// # Errors
    ///
    /// [`Error::ConfigIo`] when the file cannot be read, [`Error::ConfigParse`]
    /// when it is not a valid configuration document.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.rebased(base))
    }

    /// Anchors every relative path at `base`.
    #[must_use]
    pub fn rebased(mut self, base: &Path) -> Self {
        self.catalog = self.catalog.rebased(base);
        if self.output.root.is_relative() {
            self.output.root = base.join(&self.output.root);
        }
        for source in &mut self.sources {
            if source.path.is_relative() {
                source.path = base.join(&source.path);
            }
        }
        self
    }
}
