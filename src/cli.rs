//! `ontoterm` command line.
//!
//! ```sh
//! ontoterm --config ontoterm.yaml compile --output catalog.json
//! ontoterm extract ontology/units.owl http://my.edu/units#Unit --max-depth 2
//! ontoterm convert ontology/units.owl Unit --namespace http://my.edu/terms
//! ```
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;

use crate::{
    compiler::{CompilationReport, SourceOutcome, SourceStatus, TerminologyCompiler},
    config::{Config, SourceSettings},
    logger,
    ontology::{Iri, Model},
    terminology::TerminologyCatalog,
    Error, Result,
};

#[derive(Parser, Debug)]
#[command(name = "ontoterm")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile every configured source into a terminology catalog
    Compile {
        /// Write the catalog and per-source outcomes as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run MIREOT extraction only and print N-Triples
    Extract {
        /// Ontology document
        path: PathBuf,
        /// Root entity IRI, or a local name under `mireot.base_uri`
        root: String,
        #[arg(long)]
        min_depth: Option<u32>,
        #[arg(long)]
        max_depth: Option<u32>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run extraction and SKOS conversion and print N-Triples
    Convert {
        /// Ontology document
        path: PathBuf,
        /// Root entity IRI, or a local name under `mireot.base_uri`
        root: String,
        /// Target namespace, overrides `skos.target_namespace`
        #[arg(short, long)]
        namespace: Option<String>,
        #[arg(long)]
        version_tag: Option<String>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct CompileOutput<'a> {
    success: bool,
    sources: &'a [SourceOutcome],
    catalog: TerminologyCatalog,
}

/// Entry point of the `ontoterm` binary.
///
/// # Errors
///
/// Any configuration, I/O or pipeline error, and a summary error when at
/// least one source failed to compile.
pub fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    logger::init(&config.logger)?;

    match cli.command {
        Commands::Compile { output } => {
            if config.sources.is_empty() {
                return Err(Error::string("no sources configured"));
            }
            let report = TerminologyCompiler::new(config).run();
            print_report(&report);
            if let Some(path) = output {
                let out = CompileOutput {
                    success: report.is_success(),
                    sources: &report.outcomes,
                    catalog: report.catalog()?,
                };
                serde_json::to_writer_pretty(BufWriter::new(create(&path)?), &out)?;
            }
            let failed = report.failures().count();
            if failed > 0 {
                return Err(Error::Message(format!("{failed} source(s) failed to compile")));
            }
        }
        Commands::Extract {
            path,
            root,
            min_depth,
            max_depth,
            output,
        } => {
            let mut config = config;
            if min_depth.is_some() {
                config.mireot.min_depth = min_depth;
            }
            if max_depth.is_some() {
                config.mireot.max_depth = max_depth;
            }
            let source = SourceSettings::new(path, root);
            let extraction = TerminologyCompiler::new(config).extract(&source)?;
            write_model(&extraction.model, output.as_deref())?;
        }
        Commands::Convert {
            path,
            root,
            namespace,
            version_tag,
            output,
        } => {
            let mut source = SourceSettings::new(path, root);
            source.version_tag = version_tag;
            source.target_namespace = namespace.map(Iri::new).transpose()?;
            let conversion = TerminologyCompiler::new(config).convert(&source)?;
            write_model(&conversion.model, output.as_deref())?;
        }
    }
    Ok(())
}

fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

fn write_model(model: &Model, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => write_ntriples(model, BufWriter::new(create(path)?))?,
        None => write_ntriples(model, io::stdout().lock())?,
    }
    Ok(())
}

/// Writes `model` as N-Triples, one statement per line.
pub fn write_ntriples(model: &Model, mut writer: impl Write) -> io::Result<()> {
    for statement in model.statements() {
        writeln!(writer, "{statement}")?;
    }
    writer.flush()
}

fn print_report(report: &CompilationReport) {
    for outcome in &report.outcomes {
        let path = outcome.path.display();
        match &outcome.status {
            SourceStatus::Compiled {
                schemes,
                concepts,
                violations,
            } => {
                println!(
                    "{:>8} {path} ({} scheme(s), {concepts} concept(s))",
                    "ok".green(),
                    schemes.len()
                );
                if *violations > 0 {
                    println!("{:>8} {violations} validation warning(s)", "");
                }
            }
            SourceStatus::Empty { root } => {
                println!("{:>8} {path} (root `{root}` not found)", "empty".yellow());
            }
            SourceStatus::Failed {
                message,
                structural,
                offending,
            } => {
                println!("{:>8} {path}: {message}", "failed".red().bold());
                if *structural {
                    for iri in offending {
                        println!("{:>8}   - {iri}", "");
                    }
                }
            }
        }
    }
    let failed = report.failures().count();
    let summary = format!(
        "{} source(s), {} failed",
        report.outcomes.len(),
        failed
    );
    if failed == 0 {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.red());
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{write_ntriples, Cli, Commands};
    use crate::ontology::{vocab, Iri, Literal, Model, Statement};

    #[test]
    fn parses_compile_with_global_config() {
        let cli = Cli::try_parse_from(["ontoterm", "compile", "-c", "ontoterm.yaml", "-o", "out.json"])
            .expect("parsed");
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("ontoterm.yaml")));
        assert!(matches!(cli.command, Commands::Compile { output: Some(_) }));
    }

    #[test]
    fn parses_extract_depth_overrides() {
        let cli = Cli::try_parse_from(["ontoterm", "extract", "a.owl", "A", "--min-depth", "3", "--max-depth", "4"])
            .expect("parsed");
        match cli.command {
            Commands::Extract {
                min_depth,
                max_depth,
                ..
            } => assert_eq!((min_depth, max_depth), (Some(3), Some(4))),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn ntriples_are_written_line_by_line() {
        let mut model = Model::new();
        let subject = Iri::new("http://my.edu/test#a").expect("iri");
        model.insert(Statement::new(subject.clone(), vocab::TYPE, vocab::CONCEPT));
        model.insert(Statement::new(subject, vocab::PREF_LABEL, Literal::new_simple("A")));

        let mut out = Vec::new();
        write_ntriples(&model, &mut out).expect("written");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().all(|line| line.ends_with(" .")));
        assert!(text.contains("<http://www.w3.org/2004/02/skos/core#prefLabel> \"A\" ."));
    }
}
