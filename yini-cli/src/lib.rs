//! The external CLI collaborator (spec.md §6 "CLI surface"). Thin wiring
//! over `yini_config::Document`: each verb below is a few lines of
//! orchestration, with all real behavior living in `yini-config` and its
//! dependencies.

mod json;
mod render;

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use tracing::Level;
use yini_config::{Diagnostic, Document, Options};

/// Exit codes (SPEC_FULL.md §6, supplementing spec.md's plain "non-zero"):
/// 0 success, 1 any diagnostic, 2 a fatal load/argument error.
const EXIT_SUCCESS: u8 = 0;
const EXIT_DIAGNOSTIC: u8 = 1;
const EXIT_FATAL: u8 = 2;

#[derive(Parser)]
#[command(name = "yini", about = "Inspect, validate, and transform YINI configuration files")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Load a file and report whether it is free of diagnostics.
    Check { file: Utf8PathBuf },
    /// Parse and resolve `input`, writing its binary sidecar to `output`.
    Compile { input: Utf8PathBuf, output: Utf8PathBuf },
    /// Decode a binary sidecar and write its canonical YINI text to `output`.
    Decompile { input: Utf8PathBuf, output: Utf8PathBuf },
    /// Load a file and print every accumulated diagnostic.
    Validate { file: Utf8PathBuf },
    /// Print the resolved configuration as JSON.
    ExportJson { file: Utf8PathBuf },
    /// Print the resolved value at `section` or `section.key`.
    Query { file: Utf8PathBuf, path: String },
    /// Load a file and write its binary sidecar next to it (or to `--out`).
    GenerateSidecar {
        file: Utf8PathBuf,
        #[arg(long)]
        out: Option<Utf8PathBuf>,
    },
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_file(false)
        .with_line_number(false)
        .with_max_level(level)
        .init();
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    match execute(cli.command) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn execute(command: Command) -> anyhow::Result<u8> {
    match command {
        Command::Check { file } => check(&file),
        Command::Compile { input, output } => compile(&input, &output),
        Command::Decompile { input, output } => decompile(&input, &output),
        Command::Validate { file } => validate(&file),
        Command::ExportJson { file } => export_json(&file),
        Command::Query { file, path } => query(&file, &path),
        Command::GenerateSidecar { file, out } => generate_sidecar(&file, out.as_deref()),
    }
}

fn load(file: &camino::Utf8Path) -> anyhow::Result<Document> {
    Ok(Document::load(file, Options::default())?)
}

fn report_diagnostics(doc: &Document) -> u8 {
    if doc.diagnostics().is_empty() {
        return EXIT_SUCCESS;
    }
    for diagnostic in doc.diagnostics() {
        match diagnostic {
            Diagnostic::Load(w) => eprintln!("warning: {w}"),
            Diagnostic::Resolve(e) => eprintln!("resolve error: {e}"),
            Diagnostic::Validate(e) => eprintln!("validation error: {e}"),
        }
    }
    EXIT_DIAGNOSTIC
}

fn check(file: &camino::Utf8Path) -> anyhow::Result<u8> {
    let doc = load(file)?;
    let code = report_diagnostics(&doc);
    if code == EXIT_SUCCESS {
        println!("{file}: ok");
    }
    Ok(code)
}

fn validate(file: &camino::Utf8Path) -> anyhow::Result<u8> {
    let doc = load(file)?;
    let code = report_diagnostics(&doc);
    if code == EXIT_SUCCESS {
        println!("{file}: no diagnostics");
    }
    Ok(code)
}

fn compile(input: &camino::Utf8Path, output: &camino::Utf8Path) -> anyhow::Result<u8> {
    let doc = load(input)?;
    write_sidecar(&doc, output)?;
    Ok(report_diagnostics(&doc))
}

fn generate_sidecar(file: &camino::Utf8Path, out: Option<&camino::Utf8Path>) -> anyhow::Result<u8> {
    let doc = load(file)?;
    let default_path = (doc.options().sidecar_path_fn)(file);
    let target = out.unwrap_or(&default_path);
    write_sidecar(&doc, target)?;
    Ok(report_diagnostics(&doc))
}

fn write_sidecar(doc: &Document, output: &camino::Utf8Path) -> anyhow::Result<()> {
    tracing::debug!("writing sidecar for {} to {}", doc.root_file(), output);
    // The façade keeps its merged AST private, so sidecar encoding works
    // against a fresh re-parse of the root file's own text rather than
    // exposing that internal AST publicly. Since `encode` only reads each
    // section's parent list from it (the values come from `resolved()`),
    // re-parsing just the root file - without following `#include` - is
    // sufficient.
    let ast = yini_syntax::parse_str(doc.source_text(), doc.root_file())?;
    let dynamic_state = doc.dynamic_entries();
    let bytes = yini_sidecar::encode::encode(&ast, doc.resolved(), &dynamic_state)?;
    std::fs::write(output, bytes)?;
    Ok(())
}

fn decompile(input: &camino::Utf8Path, output: &camino::Utf8Path) -> anyhow::Result<u8> {
    let bytes = std::fs::read(input)?;
    let sidecar = yini_sidecar::decode::decode(&bytes)?;
    let text = render::decompile_to_text(&sidecar);
    std::fs::write(output, text)?;
    Ok(EXIT_SUCCESS)
}

fn export_json(file: &camino::Utf8Path) -> anyhow::Result<u8> {
    let doc = load(file)?;
    println!("{}", json::document_to_json(doc.resolved()));
    Ok(report_diagnostics(&doc))
}

fn query(file: &camino::Utf8Path, path: &str) -> anyhow::Result<u8> {
    let doc = load(file)?;
    let (section, key) = match path.split_once('.') {
        Some((section, key)) => (section, Some(key)),
        None => (path, None),
    };

    match key {
        Some(key) => match doc.get(section, key) {
            Some(value) => {
                println!("{value}");
                Ok(report_diagnostics(&doc))
            }
            None => {
                eprintln!("error: no such key {section}.{key}");
                Ok(EXIT_DIAGNOSTIC)
            }
        },
        None => match doc.resolved().sections.get(section) {
            Some(resolved_section) => {
                for (key, value) in resolved_section.entries.iter() {
                    println!("{key} = {}", value.unwrap_dynamic());
                }
                Ok(report_diagnostics(&doc))
            }
            None => {
                eprintln!("error: no such section {section}");
                Ok(EXIT_DIAGNOSTIC)
            }
        },
    }
}
