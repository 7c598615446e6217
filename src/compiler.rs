//! Batch pipeline over every configured source.
//!
//! Sources run one after the other. Each one is loaded, extracted,
//! converted and abstracted on its own; only the final merge touches the
//! shared [`VersionedConceptGraph`], in configuration order. A failing source
//! is recorded and skipped, the rest of the run carries on.
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    config::{Config, SourceSettings},
    mireot::{is_declared, MireotExtractor},
    ontology::{Iri, LoadedOntology, Model, OntologyLoader},
    skos::{Conversion, Owl2SkosConverter},
    terminology::{
        ConceptGraph, OutputLayout, SkosTerminologyAbstractor, TerminologyCatalog, TerminologyError,
        VersionedConceptGraph,
    },
    Result,
};

/// State owned by one compilation run. Nothing outlives it.
#[derive(Debug)]
pub struct CompilationContext {
    config: Config,
    loader: OntologyLoader,
    graph: VersionedConceptGraph,
}

impl CompilationContext {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let loader = OntologyLoader::new(config.catalog.clone())
            .follow_imports(config.imports.follow)
            .strict_imports(config.imports.strict);
        Self {
            config,
            loader,
            graph: VersionedConceptGraph::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn graph(&self) -> &VersionedConceptGraph {
        &self.graph
    }

    pub fn load(&self, source: &SourceSettings) -> Result<LoadedOntology> {
        Ok(self.loader.load(&source.path)?)
    }
}

/// Output of the MIREOT stage for one source.
#[derive(Clone, Debug)]
pub struct Extraction {
    pub root: Iri,
    pub model: Model,
}

/// How one source ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Compiled {
        schemes: Vec<Iri>,
        concepts: usize,
        violations: usize,
    },
    /// The root was not found; nothing was merged.
    Empty { root: Iri },
    Failed {
        message: String,
        structural: bool,
        offending: Vec<Iri>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SourceOutcome {
    pub path: PathBuf,
    pub root: String,
    #[serde(flatten)]
    pub status: SourceStatus,
}

impl SourceOutcome {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self.status, SourceStatus::Failed { .. })
    }
}

/// Result of [`TerminologyCompiler::run`].
#[derive(Debug)]
pub struct CompilationReport {
    pub outcomes: Vec<SourceOutcome>,
    pub graph: VersionedConceptGraph,
    output: OutputLayout,
}

impl CompilationReport {
    /// `false` as soon as one source failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.outcomes.iter().any(SourceOutcome::is_failure)
    }

    pub fn failures(&self) -> impl Iterator<Item = &SourceOutcome> + '_ {
        self.outcomes.iter().filter(|outcome| outcome.is_failure())
    }

    /// Emitter read model laid out as configured.
    pub fn catalog(&self) -> Result<TerminologyCatalog, TerminologyError> {
        self.catalog_with(&self.output)
    }

    pub fn catalog_with(&self, layout: &OutputLayout) -> Result<TerminologyCatalog, TerminologyError> {
        TerminologyCatalog::build(&self.graph, layout)
    }
}

/// Drives load, extraction, conversion, abstraction and merge.
#[derive(Debug)]
pub struct TerminologyCompiler {
    context: CompilationContext,
}

impl TerminologyCompiler {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            context: CompilationContext::new(config),
        }
    }

    #[must_use]
    pub fn context(&self) -> &CompilationContext {
        &self.context
    }

    /// Loads `source` and extracts the neighbourhood of its root.
    pub fn extract(&self, source: &SourceSettings) -> Result<Extraction> {
        let loaded = self.context.load(source)?;
        let mireot = &self.context.config.mireot;
        let root = mireot.resolve_root(&source.root)?;
        if !is_declared(&loaded.model, &root, mireot.entity_type) {
            warn!(
                root = %root,
                entity_type = ?mireot.entity_type,
                "mireot_root_undeclared"
            );
        }
        let model = MireotExtractor::new(&loaded.model).extract(&root, mireot);
        Ok(Extraction { root, model })
    }

    /// Extraction followed by SKOS conversion.
    pub fn convert(&self, source: &SourceSettings) -> Result<Conversion> {
        let extraction = self.extract(source)?;
        self.convert_extraction(source, &extraction)
    }

    fn convert_extraction(&self, source: &SourceSettings, extraction: &Extraction) -> Result<Conversion> {
        let config = self.context.config.skos.for_source(source)?;
        Ok(Owl2SkosConverter::new(config).convert(&extraction.model)?)
    }

    /// Abstracts a converted model and checks every scheme linearizes.
    fn abstract_conversion(&self, source: &SourceSettings, conversion: &Conversion) -> Result<ConceptGraph> {
        let graph = SkosTerminologyAbstractor::new(&conversion.model)
            .with_version_tag(source.version_tag.clone())
            .abstract_graph()?;
        for scheme in graph.schemes() {
            graph.linearized(scheme.resource_id())?;
        }
        Ok(graph)
    }

    fn compile_source(&self, source: &SourceSettings) -> Result<(SourceStatus, Option<ConceptGraph>)> {
        let extraction = self.extract(source)?;
        if extraction.model.is_empty() {
            warn!(root = %extraction.root, path = %source.path.display(), "mireot_root_not_found");
            return Ok((
                SourceStatus::Empty {
                    root: extraction.root,
                },
                None,
            ));
        }
        let conversion = self.convert_extraction(source, &extraction)?;
        let graph = self.abstract_conversion(source, &conversion)?;
        let status = SourceStatus::Compiled {
            schemes: graph.schemes().map(|scheme| scheme.version_id().clone()).collect(),
            concepts: graph.len(),
            violations: conversion.violations.len(),
        };
        Ok((status, Some(graph)))
    }

    /// Compiles every configured source and merges the results.
    #[must_use]
    pub fn run(mut self) -> CompilationReport {
        let sources = self.context.config.sources.clone();
        let mut outcomes = Vec::with_capacity(sources.len());

        for source in &sources {
            debug!(path = %source.path.display(), root = %source.root, "compile_source_started");
            let status = match self.compile_source(source) {
                Ok((status, graph)) => {
                    if let Some(graph) = graph {
                        self.context.graph.merge(graph);
                    }
                    info!(path = %source.path.display(), "compile_source_finished");
                    status
                }
                Err(err) => {
                    let offending = err.offending();
                    warn!(
                        path = %source.path.display(),
                        error = %err,
                        structural = err.is_structural(),
                        offending = ?offending.iter().map(Iri::as_str).collect::<Vec<_>>(),
                        "compile_source_failed"
                    );
                    SourceStatus::Failed {
                        message: err.to_string(),
                        structural: err.is_structural(),
                        offending,
                    }
                }
            };
            outcomes.push(SourceOutcome {
                path: source.path.clone(),
                root: source.root.clone(),
                status,
            });
        }

        let report = CompilationReport {
            outcomes,
            graph: self.context.graph,
            output: self.context.config.output,
        };
        info!(
            sources = report.outcomes.len(),
            failed = report.failures().count(),
            "compile_finished"
        );
        report
    }
}
