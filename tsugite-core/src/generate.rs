//! # Orchestrator and file writer
//!
//! Runs the whole pipeline over a set of requested inputs:
//!
//! ```text
//! inputs → Loader → DSL Parser → Graph Builder → Scheduler → Emitter → files
//! ```
//!
//! Inputs group into packages by directory; each requested file that
//! declares at least one injector yields one generated sibling file. The
//! run is two-phase: every output is rendered in memory first, and only
//! when the whole run has succeeded are the files written — atomically,
//! via a temp file in the target directory plus rename. A fatal error
//! therefore never leaves partial output behind. The generator holds no
//! state across runs; identical inputs produce byte-identical outputs.

use std::{
    collections::{BTreeMap, HashSet},
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::{
    config::GeneratorConfig,
    dsl, emit,
    error::{Error, Result},
    graph::{TypeKeys, build_graph},
    loader,
    schedule::schedule,
};

/// One rendered output, not yet on disk.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub written: Vec<PathBuf>,
    pub injectors: usize,
}

/// Runs the generator over files and directories.
pub fn generate(inputs: &[PathBuf], config: &GeneratorConfig) -> Result<RunSummary> {
    let outputs = render(inputs, config)?;
    let mut summary = RunSummary {
        written: Vec::new(),
        injectors: outputs.injectors,
    };
    for output in outputs.files {
        write_atomic(&output)?;
        info!(path = %output.path.display(), "generated");
        summary.written.push(output.path);
    }
    Ok(summary)
}

struct Rendered {
    files: Vec<GeneratedFile>,
    injectors: usize,
}

/// Renders every requested file without touching the filesystem.
fn render(inputs: &[PathBuf], config: &GeneratorConfig) -> Result<Rendered> {
    let requested = expand_inputs(inputs, config)?;
    let mut by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for path in requested {
        by_dir.entry(parent_dir(&path)).or_default().push(path);
    }

    let mut files = Vec::new();
    let mut injectors = 0;
    for (dir, members) in &by_dir {
        let package = loader::load_package(dir, &config.gen_suffix)?;
        let mut keys = TypeKeys::new();
        for path in members {
            let Some(source) = package.file(path) else {
                warn!(path = %path.display(), "requested file was not loaded; skipping");
                continue;
            };
            let specs = dsl::extract_injectors(source)?;
            if specs.is_empty() {
                warn!(path = %path.display(), "no injector found in file");
                continue;
            }
            let mut units = Vec::new();
            for spec in &specs {
                let graph = build_graph(spec, &package.symbols, &mut keys, &config.cancel_types)?;
                let planned = schedule(&graph);
                units.push((graph, planned));
            }
            injectors += units.len();
            let content = emit::render_file(source, &units, &package.symbols, config)?;
            let Some(name) = config.generated_name(path) else {
                warn!(path = %path.display(), "source already carries the generated suffix");
                continue;
            };
            debug!(path = %path.display(), injectors = units.len(), "rendered");
            files.push(GeneratedFile {
                path: dir.join(name),
                content,
            });
        }
    }
    Ok(Rendered { files, injectors })
}

/// Expands directories to their package sources and validates file inputs.
/// Order is preserved (first mention wins) with duplicates dropped.
fn expand_inputs(inputs: &[PathBuf], config: &GeneratorConfig) -> Result<Vec<PathBuf>> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut requested = Vec::new();
    for input in inputs {
        let meta = fs::metadata(input).map_err(|e| Error::io(input, e))?;
        if meta.is_dir() {
            let mut members: Vec<PathBuf> = fs::read_dir(input)
                .map_err(|e| Error::io(input, e))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| loader::is_package_source(path, &config.gen_suffix))
                .collect();
            members.sort();
            for member in members {
                if seen.insert(member.clone()) {
                    requested.push(member);
                }
            }
        } else if loader::is_package_source(input, &config.gen_suffix) {
            if seen.insert(input.clone()) {
                requested.push(input.clone());
            }
        } else if input.extension().and_then(|e| e.to_str()) == Some("rs") {
            warn!(path = %input.display(), "skipping generated file passed as input");
        } else {
            return Err(loader::LoadError::NotRustSource {
                path: input.display().to_string(),
            }
            .into());
        }
    }
    Ok(requested)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Temp file in the destination directory plus rename, so readers never
/// observe a half-written output.
fn write_atomic(output: &GeneratedFile) -> Result<()> {
    let dir = parent_dir(&output.path);
    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| Error::io(&output.path, e))?;
    tmp.as_file_mut()
        .write_all(output.content.as_bytes())
        .map_err(|e| Error::io(&output.path, e))?;
    tmp.persist(&output.path)
        .map_err(|e| Error::io(&output.path, e.error))?;
    Ok(())
}
