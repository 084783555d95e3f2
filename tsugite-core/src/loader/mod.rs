//! # Loader
//!
//! First stage of the pipeline: turns a directory of Rust sources into a
//! [`Package`] — one parsed [`SourceFile`] per input plus a merged
//! [`SymbolTable`](symbols::SymbolTable) of everything the later stages need
//! to resolve names against: function signatures, const/static initializers,
//! type declarations with their fields, and the `use` table.
//!
//! A *package* is every non-generated `.rs` file sharing a directory. That
//! scope is what makes providers and set variables declared in sibling files
//! resolvable from an injector declaration, without running full type
//! inference: the declared signatures are the type information.
//!
//! Parse failures surface verbatim with `file:line:column`; the loader never
//! recovers a partially parsed file.

pub mod symbols;

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

use crate::error::Location;
use symbols::SymbolTable;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{location}: {message}")]
    Parse { location: Location, message: String },

    #[error("{path}: not a Rust source file")]
    NotRustSource { path: String },
}

/// One parsed source file of a package.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Module name the file maps to under the conventional `mod <stem>;`
    /// declaration; generated siblings import through it.
    pub module: String,
    pub ast: syn::File,
}

/// A directory's worth of parsed sources plus their merged symbol table.
#[derive(Debug)]
pub struct Package {
    pub dir: PathBuf,
    pub files: Vec<SourceFile>,
    pub symbols: SymbolTable,
}

impl Package {
    /// Finds a member by file name; members share a directory, so the name
    /// identifies the file regardless of how the caller spelled the path.
    pub fn file(&self, path: &Path) -> Option<&SourceFile> {
        self.files
            .iter()
            .find(|f| f.path.file_name() == path.file_name())
    }
}

/// Loads every non-generated `.rs` file in `dir` as one package.
///
/// Files whose stem ends in `gen_suffix` are skipped so a previous run's
/// output never feeds back into resolution. File order is lexicographic,
/// which keeps the symbol table (and every diagnostic derived from it)
/// stable across runs.
pub fn load_package(dir: &Path, gen_suffix: &str) -> Result<Package, LoadError> {
    let entries = fs::read_dir(dir).map_err(|e| LoadError::Read {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_package_source(path, gen_suffix))
        .collect();
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(load_file(&path)?);
    }

    let symbols = SymbolTable::build(&files);
    debug!(
        dir = %dir.display(),
        files = files.len(),
        functions = symbols.fn_count(),
        "package loaded"
    );

    Ok(Package {
        dir: dir.to_path_buf(),
        files,
        symbols,
    })
}

pub fn load_file(path: &Path) -> Result<SourceFile, LoadError> {
    let module = match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => stem.to_string(),
        None => {
            return Err(LoadError::NotRustSource {
                path: path.display().to_string(),
            });
        }
    };
    let source = fs::read_to_string(path).map_err(|e| LoadError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    let ast = syn::parse_file(&source).map_err(|e| LoadError::Parse {
        location: Location::new(path.display().to_string(), e.span()),
        message: e.to_string(),
    })?;
    Ok(SourceFile {
        path: path.to_path_buf(),
        module,
        ast,
    })
}

/// True for `.rs` files that are not a previous run's output.
pub fn is_package_source(path: &Path, gen_suffix: &str) -> bool {
    if path.extension().and_then(|e| e.to_str()) != Some("rs") {
        return false;
    }
    match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => !stem.ends_with(gen_suffix),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_source_filter() {
        assert!(is_package_source(Path::new("app.rs"), "_gen"));
        assert!(!is_package_source(Path::new("app_gen.rs"), "_gen"));
        assert!(!is_package_source(Path::new("app.txt"), "_gen"));
    }

    #[test]
    fn loads_and_parses_sources() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "pub fn one() -> u8 { 1 }\n").unwrap();
        fs::write(dir.path().join("a_gen.rs"), "this is not rust").unwrap();

        let package = load_package(dir.path(), "_gen").unwrap();
        assert_eq!(package.files.len(), 1);
        assert_eq!(package.files[0].module, "a");
        assert!(package.symbols.function("one").is_some());
    }

    #[test]
    fn parse_error_carries_position() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.rs"), "fn broken( {").unwrap();

        let err = load_package(dir.path(), "_gen").unwrap_err();
        match err {
            LoadError::Parse { location, .. } => {
                assert!(location.file.ends_with("bad.rs"));
                assert_eq!(location.line, 1);
            }
            other => panic!("expected parse error, got {other}"),
        }
    }
}
