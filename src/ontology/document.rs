//! Ontology source access.
//!
//! Documents are read fully into a [`Model`] and the underlying file handle is
//! dropped before returning, on success and on parse failure alike.
use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use oxrdf::TripleRef;
use oxrdfio::{RdfFormat, RdfParser};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::{
    model::{Model, Node, Statement, TripleQuery},
    value_objects::Iri,
    vocab,
};

/// Errors raised while creating an ontology document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read ontology document `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse ontology document `{source_name}`: {message}")]
    Parse {
        source_name: String,
        message: String,
    },
    #[error("unsupported ontology document format `{path}`")]
    UnsupportedFormat { path: PathBuf },
    #[error("import `{iri}` cannot be resolved to a document")]
    UnresolvedImport { iri: Iri },
}

/// Maps logical ontology IRIs to physical document locations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    mappings: BTreeMap<String, PathBuf>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a location for `iri`, replacing any previous mapping.
    #[must_use]
    pub fn with_mapping(mut self, iri: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        self.mappings.insert(iri.into(), location.into());
        self
    }

    #[must_use]
    pub fn resolve(&self, iri: &Iri) -> Option<&Path> {
        self.mappings.get(iri.as_str()).map(PathBuf::as_path)
    }

    /// Rewrites relative locations so they are anchored at `base`.
    #[must_use]
    pub fn rebased(mut self, base: &Path) -> Self {
        for location in self.mappings.values_mut() {
            if location.is_relative() {
                *location = base.join(&*location);
            }
        }
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// A document together with everything it transitively imports.
#[derive(Clone, Debug, Default)]
pub struct LoadedOntology {
    pub model: Model,
    /// IRI of the `owl:Ontology` header of the root document, if any.
    pub ontology_iri: Option<Iri>,
    /// Documents read, root first.
    pub documents: Vec<PathBuf>,
}

/// Loads ontology documents and their import closure.
#[derive(Clone, Debug, Default)]
pub struct OntologyLoader {
    catalog: Catalog,
    follow_imports: bool,
    strict_imports: bool,
}

impl OntologyLoader {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            follow_imports: true,
            strict_imports: false,
        }
    }

    /// Disables or enables the `owl:imports` closure.
    #[must_use]
    pub fn follow_imports(mut self, follow: bool) -> Self {
        self.follow_imports = follow;
        self
    }

    /// Fails on imports that cannot be resolved instead of skipping them.
    #[must_use]
    pub fn strict_imports(mut self, strict: bool) -> Self {
        self.strict_imports = strict;
        self
    }

    /// Reads `path` and, unless disabled, every document it imports.
    pub fn load(&self, path: &Path) -> Result<LoadedOntology, DocumentError> {
        let root = parse_file(path)?;
        let ontology_iri = root.instances_of(vocab::ONTOLOGY).into_iter().next();

        let mut loaded = LoadedOntology {
            model: Model::new(),
            ontology_iri,
            documents: vec![path.to_path_buf()],
        };
        let mut seen: BTreeSet<Iri> = loaded.ontology_iri.iter().cloned().collect();
        // import IRI and the directory of the document importing it
        let mut pending: VecDeque<(Iri, PathBuf)> = VecDeque::new();
        if self.follow_imports {
            let base = directory_of(path);
            pending.extend(imports_of(&root).into_iter().map(|iri| (iri, base.clone())));
        }
        loaded.model.merge(&root);

        while let Some((import, base)) = pending.pop_front() {
            if !seen.insert(import.clone()) {
                continue;
            }
            let Some(location) = self.locate(&import, &base) else {
                if self.strict_imports {
                    return Err(DocumentError::UnresolvedImport { iri: import });
                }
                warn!(import = %import, "ontology_import_unresolved");
                continue;
            };
            debug!(import = %import, path = %location.display(), "ontology_import_loading");
            let imported = parse_file(&location)?;
            let base = directory_of(&location);
            pending.extend(imports_of(&imported).into_iter().map(|iri| (iri, base.clone())));
            loaded.model.merge(&imported);
            loaded.documents.push(location);
        }

        debug!(
            path = %path.display(),
            documents = loaded.documents.len(),
            statements = loaded.model.len(),
            "ontology_loaded"
        );
        Ok(loaded)
    }

    /// Resolves an import: the catalog first, then a `file:` IRI, then the
    /// last path segment of the IRI next to the importing document.
    fn locate(&self, iri: &Iri, base: &Path) -> Option<PathBuf> {
        if let Some(location) = self.catalog.resolve(iri) {
            return Some(location.to_path_buf());
        }
        if let Some(path) = file_path(iri) {
            let path = if path.is_relative() { base.join(path) } else { path };
            return path.is_file().then_some(path);
        }
        let segment = iri
            .as_str()
            .split(['#', '?'])
            .next()
            .and_then(|without_fragment| without_fragment.rsplit('/').next())
            .filter(|segment| !segment.is_empty())
            .and_then(percent_decode)?;
        Some(base.join(segment)).filter(|path| path.is_file())
    }
}

/// Local path of a `file:` IRI, percent-decoded.
fn file_path(iri: &Iri) -> Option<PathBuf> {
    let rest = iri.as_str().strip_prefix("file:")?;
    let rest = rest.strip_prefix("//localhost").unwrap_or(rest);
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    percent_decode(rest).map(PathBuf::from)
}

/// `file://` IRI of an absolute path, percent-encoding what IRIs disallow.
fn file_iri(path: &Path) -> String {
    let mut iri = String::from("file://");
    for byte in path.to_string_lossy().bytes() {
        if byte.is_ascii_alphanumeric() || b"/-._~".contains(&byte) {
            iri.push(char::from(byte));
        } else {
            iri.push_str(&format!("%{byte:02X}"));
        }
    }
    iri
}

/// Decodes `%XX` escapes. Malformed escapes or non UTF-8 output yield `None`.
fn percent_decode(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' {
            let hex = text.get(index + 1..index + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            index += 3;
        } else {
            decoded.push(bytes[index]);
            index += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

fn directory_of(path: &Path) -> PathBuf {
    path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Picks a parser from the file extension.
pub fn detect_format(path: &Path) -> Result<RdfFormat, DocumentError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("owl" | "rdf" | "xml") => Ok(RdfFormat::RdfXml),
        Some("ttl") => Ok(RdfFormat::Turtle),
        Some("nt") => Ok(RdfFormat::NTriples),
        Some("nq") => Ok(RdfFormat::NQuads),
        _ => Err(DocumentError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Parses a single document without following imports.
pub fn parse_file(path: &Path) -> Result<Model, DocumentError> {
    let format = detect_format(path)?;
    let file = File::open(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base = std::fs::canonicalize(path).ok().map(|absolute| file_iri(&absolute));
    parse_reader(
        BufReader::new(file),
        format,
        base.as_deref(),
        &path.display().to_string(),
    )
}

/// Parses statements from any reader. Named graphs are flattened.
pub fn parse_reader(
    reader: impl Read,
    format: RdfFormat,
    base_iri: Option<&str>,
    source_name: &str,
) -> Result<Model, DocumentError> {
    let parse_error = |message: String| DocumentError::Parse {
        source_name: source_name.to_string(),
        message,
    };

    let mut parser = RdfParser::from_format(format);
    if let Some(base) = base_iri {
        parser = parser
            .with_base_iri(base)
            .map_err(|err| parse_error(err.to_string()))?;
    }

    let mut model = Model::new();
    for quad in parser.for_reader(reader) {
        let quad = quad.map_err(|err| parse_error(err.to_string()))?;
        if let Some(statement) =
            Statement::from_triple(TripleRef::new(&quad.subject, &quad.predicate, &quad.object))
        {
            model.insert(statement);
        }
    }
    Ok(model)
}

fn imports_of(model: &Model) -> Vec<Iri> {
    model
        .instances_of(vocab::ONTOLOGY)
        .iter()
        .flat_map(|ontology| model.object_iris(&Node::from(ontology), vocab::IMPORTS))
        .collect()
}
